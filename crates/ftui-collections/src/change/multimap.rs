#![forbid(unsafe_code)]

//! Set-multimap changes: per-key sets of removed and added values.

use std::fmt;

use super::Change;
use crate::error::CollectionResult;

/// Values removed from and added to one key. Both sides may be non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetMultimapElementaryChange<K, V> {
    key: K,
    values_removed: Vec<V>,
    values_added: Vec<V>,
}

impl<K, V> SetMultimapElementaryChange<K, V> {
    #[must_use]
    pub fn new(key: K, values_removed: Vec<V>, values_added: Vec<V>) -> Self {
        Self {
            key,
            values_removed,
            values_added,
        }
    }

    #[must_use]
    pub fn key(&self) -> &K {
        &self.key
    }

    #[must_use]
    pub fn values_removed(&self) -> &[V] {
        &self.values_removed
    }

    #[must_use]
    pub fn values_added(&self) -> &[V] {
        &self.values_added
    }

    #[must_use]
    pub fn was_added(&self) -> bool {
        !self.values_added.is_empty()
    }

    #[must_use]
    pub fn was_removed(&self) -> bool {
        !self.values_removed.is_empty()
    }

    #[must_use]
    pub fn was_replaced(&self) -> bool {
        self.was_added() && self.was_removed()
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Display for SetMultimapElementaryChange<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (removed, added) = (&self.values_removed, &self.values_added);
        if self.was_replaced() {
            write!(f, "Replaced {removed:?} by {added:?} for key {:?}.", self.key)
        } else if self.was_removed() {
            write!(f, "Removed {removed:?} for key {:?}.", self.key)
        } else {
            write!(f, "Added {added:?} for key {:?}.", self.key)
        }
    }
}

/// Atomic change of an observable set-multimap.
pub type SetMultimapChange<K, V> = Change<SetMultimapElementaryChange<K, V>>;

impl<K, V> Change<SetMultimapElementaryChange<K, V>> {
    /// # Errors
    ///
    /// Fails when the cursor is not positioned.
    pub fn key(&self) -> CollectionResult<&K> {
        Ok(self.current()?.key())
    }

    /// # Errors
    ///
    /// Fails when the cursor is not positioned.
    pub fn values_removed(&self) -> CollectionResult<&[V]> {
        Ok(self.current()?.values_removed())
    }

    /// # Errors
    ///
    /// Fails when the cursor is not positioned.
    pub fn values_added(&self) -> CollectionResult<&[V]> {
        Ok(self.current()?.values_added())
    }

    /// # Errors
    ///
    /// Fails when the cursor is not positioned.
    pub fn was_added(&self) -> CollectionResult<bool> {
        Ok(self.current()?.was_added())
    }

    /// # Errors
    ///
    /// Fails when the cursor is not positioned.
    pub fn was_removed(&self) -> CollectionResult<bool> {
        Ok(self.current()?.was_removed())
    }
}
