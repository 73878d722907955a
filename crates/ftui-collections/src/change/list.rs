#![forbid(unsafe_code)]

//! List changes: index ranges of replaced elements or permutations.
//!
//! Ranges are expressed against the list as it stands once all preceding
//! elementary changes of the same atomic change have been applied. For a
//! replace, `to == from + added.len()`; a permutation covers `[from, to)`
//! both before and after the change.

use std::fmt;

use super::Change;
use crate::error::{CollectionError, CollectionResult};

/// The edit carried by a [`ListElementaryChange`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListEdit<E> {
    /// `removed` was replaced by `added`; at most one side is empty.
    Replace { removed: Vec<E>, added: Vec<E> },
    /// `permutation[k]` is the new index of the element previously at
    /// `from + k`.
    Permutation(Vec<usize>),
}

/// One contiguous list edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListElementaryChange<E> {
    from: usize,
    to: usize,
    edit: ListEdit<E>,
}

impl<E> ListElementaryChange<E> {
    /// Replace `removed` (previously at `from`) by `added`.
    #[must_use]
    pub fn replace(from: usize, removed: Vec<E>, added: Vec<E>) -> Self {
        Self {
            from,
            to: from + added.len(),
            edit: ListEdit::Replace { removed, added },
        }
    }

    /// Pure insertion at `from`.
    #[must_use]
    pub fn add(from: usize, added: Vec<E>) -> Self {
        Self::replace(from, Vec::new(), added)
    }

    /// Pure removal at `from`.
    #[must_use]
    pub fn remove(from: usize, removed: Vec<E>) -> Self {
        Self::replace(from, removed, Vec::new())
    }

    /// Reordering of `[from, from + permutation.len())`.
    #[must_use]
    pub fn permutation(from: usize, permutation: Vec<usize>) -> Self {
        Self {
            from,
            to: from + permutation.len(),
            edit: ListEdit::Permutation(permutation),
        }
    }

    /// Start of the affected range.
    #[must_use]
    pub fn from(&self) -> usize {
        self.from
    }

    /// End (exclusive) of the affected range after the change.
    #[must_use]
    pub fn to(&self) -> usize {
        self.to
    }

    /// The underlying edit.
    #[must_use]
    pub fn edit(&self) -> &ListEdit<E> {
        &self.edit
    }

    /// Removed elements (empty for permutations).
    #[must_use]
    pub fn removed(&self) -> &[E] {
        match &self.edit {
            ListEdit::Replace { removed, .. } => removed,
            ListEdit::Permutation(_) => &[],
        }
    }

    /// Added elements (empty for permutations).
    #[must_use]
    pub fn added(&self) -> &[E] {
        match &self.edit {
            ListEdit::Replace { added, .. } => added,
            ListEdit::Permutation(_) => &[],
        }
    }

    /// Permutation indices, if this is a permutation.
    #[must_use]
    pub fn permutation_indices(&self) -> Option<&[usize]> {
        match &self.edit {
            ListEdit::Permutation(perm) => Some(perm),
            ListEdit::Replace { .. } => None,
        }
    }

    /// Whether elements were added.
    #[must_use]
    pub fn was_added(&self) -> bool {
        !self.added().is_empty()
    }

    /// Whether elements were removed.
    #[must_use]
    pub fn was_removed(&self) -> bool {
        !self.removed().is_empty()
    }

    /// Whether elements were both removed and added.
    #[must_use]
    pub fn was_replaced(&self) -> bool {
        self.was_added() && self.was_removed()
    }

    /// Whether this is a permutation.
    #[must_use]
    pub fn was_permutated(&self) -> bool {
        matches!(self.edit, ListEdit::Permutation(_))
    }
}

impl<E: Clone> ListElementaryChange<E> {
    /// Apply this change to `list` (forward direction).
    pub(crate) fn apply_to(&self, list: &mut Vec<E>) {
        match &self.edit {
            ListEdit::Replace { removed, added } => {
                let end = self.from + removed.len();
                list.splice(self.from..end, added.iter().cloned());
            }
            ListEdit::Permutation(perm) => {
                let old: Vec<E> = list[self.from..self.to].to_vec();
                for (k, element) in old.into_iter().enumerate() {
                    list[perm[k]] = element;
                }
            }
        }
    }

    /// Undo this change on `list` (which must reflect the post-change state).
    pub(crate) fn revert_on(&self, list: &mut Vec<E>) {
        match &self.edit {
            ListEdit::Replace { removed, added } => {
                let end = self.from + added.len();
                list.splice(self.from..end, removed.iter().cloned());
            }
            ListEdit::Permutation(perm) => {
                let new: Vec<E> = list[self.from..self.to].to_vec();
                for (k, &target) in perm.iter().enumerate() {
                    list[self.from + k] = new[target - self.from].clone();
                }
            }
        }
    }
}

impl<E: fmt::Debug> fmt::Display for ListElementaryChange<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.edit {
            ListEdit::Permutation(perm) => write!(f, "Permutated by {perm:?}."),
            ListEdit::Replace { removed, added } if !removed.is_empty() && !added.is_empty() => {
                write!(f, "Replaced {removed:?} by {added:?} at {}.", self.from)
            }
            ListEdit::Replace { removed, .. } if !removed.is_empty() => {
                write!(f, "Removed {removed:?} at {}.", self.from)
            }
            ListEdit::Replace { added, .. } => write!(f, "Added {added:?} at {}.", self.from),
        }
    }
}

/// Atomic change of an observable list; context is the post-change list.
pub type ListChange<E> = Change<ListElementaryChange<E>, Vec<E>>;

impl<E: Clone> Change<ListElementaryChange<E>, Vec<E>> {
    /// Start of the current elementary change's range.
    ///
    /// # Errors
    ///
    /// Fails when the cursor is not positioned.
    pub fn from(&self) -> CollectionResult<usize> {
        Ok(self.current()?.from())
    }

    /// End (exclusive) of the current elementary change's range.
    ///
    /// # Errors
    ///
    /// Fails when the cursor is not positioned.
    pub fn to(&self) -> CollectionResult<usize> {
        Ok(self.current()?.to())
    }

    /// Elements removed by the current elementary change.
    ///
    /// # Errors
    ///
    /// Fails when the cursor is not positioned.
    pub fn removed(&self) -> CollectionResult<&[E]> {
        Ok(self.current()?.removed())
    }

    /// Elements added by the current elementary change.
    ///
    /// # Errors
    ///
    /// Fails when the cursor is not positioned.
    pub fn added_sub_list(&self) -> CollectionResult<&[E]> {
        Ok(self.current()?.added())
    }

    /// Number of removed elements.
    ///
    /// # Errors
    ///
    /// Fails when the cursor is not positioned.
    pub fn removed_size(&self) -> CollectionResult<usize> {
        Ok(self.current()?.removed().len())
    }

    /// Number of added elements.
    ///
    /// # Errors
    ///
    /// Fails when the cursor is not positioned.
    pub fn added_size(&self) -> CollectionResult<usize> {
        Ok(self.current()?.added().len())
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

    /// # Errors
    ///
    /// Fails when the cursor is not positioned.
    pub fn was_permutated(&self) -> CollectionResult<bool> {
        Ok(self.current()?.was_permutated())
    }

    /// New index of the element previously at `index`.
    ///
    /// A non-permutation change maps every index to itself.
    ///
    /// # Errors
    ///
    /// Fails when the cursor is not positioned, or when `index` lies outside
    /// the current permutation range.
    pub fn permutation(&self, index: usize) -> CollectionResult<usize> {
        let change = self.current()?;
        match change.permutation_indices() {
            None => Ok(index),
            Some(perm) => {
                if index < change.from() || index >= change.to() {
                    return Err(CollectionError::IndexOutOfBounds {
                        index,
                        len: change.to(),
                    });
                }
                Ok(perm[index - change.from()])
            }
        }
    }

    /// The list after the whole atomic change.
    #[must_use]
    pub fn list(&self) -> &[E] {
        self.context()
    }

    /// The list before the whole atomic change, rebuilt by reverting every
    /// elementary change, newest first.
    #[must_use]
    pub fn previous_contents(&self) -> Vec<E> {
        let mut contents = self.context().clone();
        for change in self.elementary_changes().iter().rev() {
            change.revert_on(&mut contents);
        }
        contents
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::change::CursorState;

    #[test]
    fn replace_reports_ranges() {
        let mut change: ListChange<i32> = Change::with_context(
            vec![ListElementaryChange::replace(0, vec![10, 20, 30], vec![40, 50, 60])],
            vec![40, 50, 60],
        );
        assert!(change.next());
        assert_eq!(change.from(), Ok(0));
        assert_eq!(change.to(), Ok(3));
        assert_eq!(change.removed(), Ok(&[10, 20, 30][..]));
        assert_eq!(change.added_sub_list(), Ok(&[40, 50, 60][..]));
        assert_eq!(change.was_replaced(), Ok(true));
        assert_eq!(change.was_permutated(), Ok(false));
        assert!(!change.next());
    }

    #[test]
    fn accessors_require_positioned_cursor() {
        let change: ListChange<i32> =
            Change::with_context(vec![ListElementaryChange::add(0, vec![1])], vec![1]);
        assert_eq!(
            change.from(),
            Err(CollectionError::CursorNotPositioned {
                state: CursorState::BeforeFirst
            })
        );
    }

    #[test]
    fn permutation_lookup() {
        let mut change: ListChange<char> = Change::with_context(
            vec![ListElementaryChange::permutation(0, vec![2, 0, 1])],
            vec!['a', 'b', 'c'],
        );
        assert!(change.next());
        assert_eq!(change.permutation(0), Ok(2));
        assert_eq!(change.permutation(1), Ok(0));
        assert!(change.permutation(3).is_err());
        // Previously [c, a, b]: c moved to 2, a to 0, b to 1.
        assert_eq!(change.previous_contents(), vec!['c', 'a', 'b']);
    }

    #[test]
    fn previous_contents_reverts_in_order() {
        // [1,2,3,4,5,6] remove 2 and 4 -> [1,3,5,6]
        let change: ListChange<i32> = Change::with_context(
            vec![
                ListElementaryChange::remove(1, vec![2]),
                ListElementaryChange::remove(2, vec![4]),
            ],
            vec![1, 3, 5, 6],
        );
        assert_eq!(change.previous_contents(), vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn apply_then_revert_is_identity() {
        let mut list = vec!['x', 'y', 'z'];
        let change = ListElementaryChange::replace(1, vec!['y'], vec!['p', 'q']);
        change.apply_to(&mut list);
        assert_eq!(list, vec!['x', 'p', 'q', 'z']);
        change.revert_on(&mut list);
        assert_eq!(list, vec!['x', 'y', 'z']);

        let perm = ListElementaryChange::permutation(0, vec![2, 0, 1]);
        perm.apply_to(&mut list);
        assert_eq!(list, vec!['y', 'z', 'x']);
        perm.revert_on(&mut list);
        assert_eq!(list, vec!['x', 'y', 'z']);
    }

    #[test]
    fn display_wording() {
        assert_eq!(
            ListElementaryChange::add(3, vec![7]).to_string(),
            "Added [7] at 3."
        );
        assert_eq!(
            ListElementaryChange::remove(1, vec![2]).to_string(),
            "Removed [2] at 1."
        );
        assert_eq!(
            ListElementaryChange::replace(0, vec![1], vec![2]).to_string(),
            "Replaced [1] by [2] at 0."
        );
        assert_eq!(
            ListElementaryChange::<i32>::permutation(0, vec![1, 0]).to_string(),
            "Permutated by [1, 0]."
        );
        let change: ListChange<i32> = Change::with_context(
            vec![
                ListElementaryChange::remove(1, vec![2]),
                ListElementaryChange::remove(2, vec![4]),
            ],
            vec![1, 3],
        );
        assert_eq!(change.to_string(), "Removed [2] at 1. Removed [4] at 2.");
    }
}
