#![forbid(unsafe_code)]

//! Change-notification primitives for Filament.
//!
//! This crate provides the single shared building block for Filament's
//! state containers:
//!
//! - [`StateCell`]: A shared, version-tracked value wrapper with a FIFO
//!   queue of pending derivations and change notification via subscriber
//!   callbacks.
//! - [`Subscription`]: RAII guard that automatically unsubscribes on drop.
//!
//! # Architecture
//!
//! `StateCell<S>` uses `Rc<RefCell<..>>` for single-threaded shared
//! ownership. Mutations never touch the value directly: they enqueue pure
//! derivation functions that an explicit [`commit()`](StateCell::commit)
//! step applies in FIFO order. Subscribers are stored as `Weak` function
//! handles and cleaned up lazily during notification.
//!
//! # Invariants
//!
//! 1. The committed value only changes inside `commit()`.
//! 2. Derivations are applied in the order they were enqueued, and each
//!    receives the result of the immediately preceding one.
//! 3. Version increments exactly once per commit that applied at least one
//!    derivation; subscribers are notified exactly once per such commit, in
//!    registration order.
//! 4. A commit with an empty queue changes nothing and notifies nobody.
//! 5. Dropping a [`Subscription`] makes its callback inert before the next
//!    notification cycle.

pub mod cell;

pub use cell::{StateCell, Subscription};
