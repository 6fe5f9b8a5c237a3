#![forbid(unsafe_code)]

//! Reactive state containers for component UIs.
//!
//! Two independent containers, both built on
//! [`filament_reactive::StateCell`]:
//!
//! - [`ListContainer`]: an ordered sequence with whole-list replacement,
//!   append, predicate- and index-based partial update/replace/remove, and
//!   clear.
//! - [`RecordContainer`]: a single structured value with whole-value
//!   replacement and single-field update.
//!
//! # Architecture
//!
//! Each container pairs a `StateCell` with a mutator handle set
//! ([`ListMutator`] / [`RecordMutator`]) built **once** at construction.
//! The mutator closes over the cell, never over the value, so the handle
//! set survives every value change unchanged: consumers relying on handle
//! identity (e.g. to skip effect re-registration) are never invalidated by
//! a mutation.
//!
//! Mutation operations enqueue pure derivations; the host scheduler applies
//! them via `commit()` and subscribers observe exactly one notification per
//! commit. Every derivation builds a brand-new value, leaving the previous
//! one untouched for any other holder.
//!
//! # Invariants
//!
//! 1. The mutator handle set is created once per container and shared by
//!    all clones (`ptr_eq` observes identity).
//! 2. Each derivation runs against the most recently published value at
//!    apply time, not a snapshot captured at mutator creation.
//! 3. `update`/`update_at` hand the action a fresh clone of the selected
//!    item; the original is never aliased.
//! 4. Out-of-range index operations and empty appends are silent no-ops.

pub mod list;
pub mod record;

pub use filament_reactive::Subscription;
pub use list::{ListContainer, ListMutator};
pub use record::{RecordContainer, RecordMutator};
