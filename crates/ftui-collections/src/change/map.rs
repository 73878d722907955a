#![forbid(unsafe_code)]

//! Map changes: per-key addition, removal, or value replacement.

use std::fmt;

use super::Change;
use crate::error::CollectionResult;

/// One key's transition. At least one of the two values is present; both
/// present means the value was replaced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapElementaryChange<K, V> {
    key: K,
    removed: Option<V>,
    added: Option<V>,
}

impl<K, V> MapElementaryChange<K, V> {
    /// A new entry.
    #[must_use]
    pub fn added(key: K, value: V) -> Self {
        Self {
            key,
            removed: None,
            added: Some(value),
        }
    }

    /// A removed entry.
    #[must_use]
    pub fn removed(key: K, value: V) -> Self {
        Self {
            key,
            removed: Some(value),
            added: None,
        }
    }

    /// A value replacement.
    #[must_use]
    pub fn replaced(key: K, old: V, new: V) -> Self {
        Self {
            key,
            removed: Some(old),
            added: Some(new),
        }
    }

    /// The affected key.
    #[must_use]
    pub fn key(&self) -> &K {
        &self.key
    }

    /// Value that left the map, if any.
    #[must_use]
    pub fn value_removed(&self) -> Option<&V> {
        self.removed.as_ref()
    }

    /// Value that entered the map, if any.
    #[must_use]
    pub fn value_added(&self) -> Option<&V> {
        self.added.as_ref()
    }

    /// Whether a value was added (also true for replacements).
    #[must_use]
    pub fn was_added(&self) -> bool {
        self.added.is_some()
    }

    /// Whether a value was removed (also true for replacements).
    #[must_use]
    pub fn was_removed(&self) -> bool {
        self.removed.is_some()
    }

    /// Whether the value was replaced.
    #[must_use]
    pub fn was_replaced(&self) -> bool {
        self.was_added() && self.was_removed()
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Display for MapElementaryChange<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.removed, &self.added) {
            (Some(old), Some(new)) => {
                write!(f, "Replaced {old:?} by {new:?} for key {:?}.", self.key)
            }
            (Some(old), None) => write!(f, "Removed {old:?} for key {:?}.", self.key),
            (None, Some(new)) => write!(f, "Added {new:?} for key {:?}.", self.key),
            (None, None) => Ok(()),
        }
    }
}

/// Atomic change of an observable map.
pub type MapChange<K, V> = Change<MapElementaryChange<K, V>>;

impl<K, V> Change<MapElementaryChange<K, V>> {
    /// # Errors
    ///
    /// Fails when the cursor is not positioned.
    pub fn key(&self) -> CollectionResult<&K> {
        Ok(self.current()?.key())
    }

    /// # Errors
    ///
    /// Fails when the cursor is not positioned.
    pub fn value_added(&self) -> CollectionResult<Option<&V>> {
        Ok(self.current()?.value_added())
    }

    /// # Errors
    ///
    /// Fails when the cursor is not positioned.
    pub fn value_removed(&self) -> CollectionResult<Option<&V>> {
        Ok(self.current()?.value_removed())
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

    /// # Errors
    ///
    /// Fails when the cursor is not positioned.
    pub fn was_replaced(&self) -> CollectionResult<bool> {
        Ok(self.current()?.was_replaced())
    }
}
