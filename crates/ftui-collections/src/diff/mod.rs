#![forbid(unsafe_code)]

//! Pure diff computation for every mutating collection operation.
//!
//! # Design
//!
//! Each function takes the current backing store and the operation's
//! arguments and returns the elementary changes the operation would make,
//! without touching the store. The matching `apply` replays those changes
//! onto a store. Collections call `diff` then, only for a non-empty result,
//! `apply` and dispatch; content bindings replay foreign changes through the
//! public mutators instead.
//!
//! # Invariants
//!
//! 1. An operation with no observable effect yields no elementary change.
//! 2. `apply(store, diff(store, op))` equals the store after performing `op`.
//! 3. List changes are ordered by ascending index, each expressed against
//!    the list with all earlier changes of the same batch applied.
//! 4. Keyed kinds emit at most one elementary change per key/element.

pub mod list;
pub mod map;
pub mod multimap;
pub mod multiset;
pub mod set;
