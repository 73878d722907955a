#![forbid(unsafe_code)]

//! Set changes: one element added or removed per elementary change.

use std::fmt;

use super::Change;
use crate::error::CollectionResult;

/// A single element entering or leaving a set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetElementaryChange<E> {
    Added(E),
    Removed(E),
}

impl<E> SetElementaryChange<E> {
    /// The element that was added, if any.
    #[must_use]
    pub fn element_added(&self) -> Option<&E> {
        match self {
            Self::Added(e) => Some(e),
            Self::Removed(_) => None,
        }
    }

    /// The element that was removed, if any.
    #[must_use]
    pub fn element_removed(&self) -> Option<&E> {
        match self {
            Self::Removed(e) => Some(e),
            Self::Added(_) => None,
        }
    }

    /// The affected element.
    #[must_use]
    pub fn element(&self) -> &E {
        match self {
            Self::Added(e) | Self::Removed(e) => e,
        }
    }
}

impl<E: fmt::Debug> fmt::Display for SetElementaryChange<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Added(e) => write!(f, "Added {e:?}."),
            Self::Removed(e) => write!(f, "Removed {e:?}."),
        }
    }
}

/// Atomic change of an observable set.
pub type SetChange<E> = Change<SetElementaryChange<E>>;

impl<E> Change<SetElementaryChange<E>> {
    /// # Errors
    ///
    /// Fails when the cursor is not positioned.
    pub fn was_added(&self) -> CollectionResult<bool> {
        Ok(matches!(self.current()?, SetElementaryChange::Added(_)))
    }

    /// # Errors
    ///
    /// Fails when the cursor is not positioned.
    pub fn was_removed(&self) -> CollectionResult<bool> {
        Ok(matches!(self.current()?, SetElementaryChange::Removed(_)))
    }

    /// # Errors
    ///
    /// Fails when the cursor is not positioned.
    pub fn element_added(&self) -> CollectionResult<Option<&E>> {
        Ok(self.current()?.element_added())
    }

    /// # Errors
    ///
    /// Fails when the cursor is not positioned.
    pub fn element_removed(&self) -> CollectionResult<Option<&E>> {
        Ok(self.current()?.element_removed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exactly_one_side() {
        let mut change = SetChange::new(vec![
            SetElementaryChange::Added("a"),
            SetElementaryChange::Removed("b"),
        ]);
        assert!(change.was_added().is_err());
        assert!(change.next());
        assert_eq!(change.was_added(), Ok(true));
        assert_eq!(change.element_added(), Ok(Some(&"a")));
        assert_eq!(change.element_removed(), Ok(None));
        assert!(change.next());
        assert_eq!(change.was_removed(), Ok(true));
        assert_eq!(change.element_removed(), Ok(Some(&"b")));
        assert!(!change.next());
    }

    #[test]
    fn display_wording() {
        let change = SetChange::new(vec![
            SetElementaryChange::Added(1),
            SetElementaryChange::Removed(2),
        ]);
        assert_eq!(change.to_string(), "Added 1. Removed 2.");
    }
}
