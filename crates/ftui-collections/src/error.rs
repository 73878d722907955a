#![forbid(unsafe_code)]

//! Errors raised synchronously by collection, change, and property APIs.
//!
//! Listener faults are deliberately absent here: a panicking listener is
//! isolated by the [`ExceptionBoundary`](crate::fault::ExceptionBoundary) and
//! reported to the fault sink, never returned to the mutating caller.

use std::fmt;

use crate::change::CursorState;

/// Broad classification of a [`CollectionError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A forbidden argument (absent, self-referencing, out of range).
    Argument,
    /// The call is not valid in the receiver's current state.
    IllegalState,
    /// The receiver does not support the operation at all.
    Unsupported,
}

/// Errors from collection, change-cursor, and binding operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectionError {
    /// An absent argument was passed where one is required.
    NullArgument { operation: &'static str },
    /// A property was passed to one of its own binding operations.
    SelfReference { operation: &'static str },
    /// An index outside `0..len` (or `0..=len` for insertions).
    IndexOutOfBounds { index: usize, len: usize },
    /// A range that is reversed or exceeds the collection length.
    InvalidRange { from: usize, to: usize, len: usize },
    /// Adding `occurrences` to an element's `count` would overflow.
    CountOverflow { count: usize, occurrences: usize },
    /// A change accessor was called while the cursor was not positioned.
    CursorNotPositioned { state: CursorState },
    /// `set` was called on a reference-bound property.
    BoundValue,
    /// Unbinding content from a peer that was never content-bound.
    NotContentBound,
    /// Reference and content binding were requested against the same peer.
    ConflictingBinding,
    /// Mutation attempted through a read-only view.
    ReadOnly,
}

impl CollectionError {
    /// The taxonomy bucket this error belongs to.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NullArgument { .. }
            | Self::SelfReference { .. }
            | Self::IndexOutOfBounds { .. }
            | Self::InvalidRange { .. }
            | Self::CountOverflow { .. } => ErrorKind::Argument,
            Self::CursorNotPositioned { .. }
            | Self::BoundValue
            | Self::NotContentBound
            | Self::ConflictingBinding => ErrorKind::IllegalState,
            Self::ReadOnly => ErrorKind::Unsupported,
        }
    }
}

impl fmt::Display for CollectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NullArgument { operation } => {
                write!(f, "{operation}: cannot bind to an absent property")
            }
            Self::SelfReference { operation } => {
                write!(f, "{operation}: cannot bind a property to itself")
            }
            Self::IndexOutOfBounds { index, len } => {
                write!(f, "index {index} out of bounds for length {len}")
            }
            Self::InvalidRange { from, to, len } => {
                write!(f, "invalid range {from}..{to} for length {len}")
            }
            Self::CountOverflow { count, occurrences } => {
                write!(f, "adding {occurrences} occurrences to a count of {count} overflows")
            }
            Self::CursorNotPositioned { state } => match state {
                CursorState::BeforeFirst => {
                    write!(f, "change cursor not positioned: call next() first")
                }
                CursorState::AfterLast => {
                    write!(f, "change cursor exhausted: next() already returned false")
                }
                CursorState::At(_) => write!(f, "change cursor not positioned"),
            },
            Self::BoundValue => write!(f, "a bound value cannot be set"),
            Self::NotContentBound => write!(f, "no content binding exists for this peer"),
            Self::ConflictingBinding => {
                write!(f, "cannot reference-bind and content-bind the same peer")
            }
            Self::ReadOnly => write!(f, "collection is read-only"),
        }
    }
}

impl std::error::Error for CollectionError {}

/// Result alias used throughout the crate.
pub type CollectionResult<T> = Result<T, CollectionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_follow_taxonomy() {
        assert_eq!(
            CollectionError::NullArgument { operation: "bind" }.kind(),
            ErrorKind::Argument
        );
        assert_eq!(
            CollectionError::SelfReference { operation: "bind" }.kind(),
            ErrorKind::Argument
        );
        assert_eq!(CollectionError::BoundValue.kind(), ErrorKind::IllegalState);
        assert_eq!(
            CollectionError::CursorNotPositioned {
                state: CursorState::BeforeFirst
            }
            .kind(),
            ErrorKind::IllegalState
        );
        assert_eq!(
            CollectionError::CountOverflow {
                count: usize::MAX,
                occurrences: 1
            }
            .kind(),
            ErrorKind::Argument
        );
        assert_eq!(CollectionError::ReadOnly.kind(), ErrorKind::Unsupported);
    }

    #[test]
    fn bound_value_message() {
        assert_eq!(
            CollectionError::BoundValue.to_string(),
            "a bound value cannot be set"
        );
    }

    #[test]
    fn cursor_messages_name_the_state() {
        let before = CollectionError::CursorNotPositioned {
            state: CursorState::BeforeFirst,
        };
        assert!(before.to_string().contains("next()"));
        let after = CollectionError::CursorNotPositioned {
            state: CursorState::AfterLast,
        };
        assert!(after.to_string().contains("exhausted"));
    }
}
