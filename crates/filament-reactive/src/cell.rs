#![forbid(unsafe_code)]

//! Committed-value state cell with a FIFO derivation queue.
//!
//! # Design
//!
//! [`StateCell<S>`] wraps a committed value, a queue of pending derivations,
//! and a subscriber registry in shared, reference-counted storage. Callers
//! never mutate the value in place: they enqueue pure functions
//! `FnOnce(&S) -> S` and the host scheduler applies them by calling
//! [`commit()`](StateCell::commit). Each derivation receives the result of
//! the one before it, so a handle captured long before the commit still
//! derives from the most recently published value rather than from a stale
//! snapshot.
//!
//! Cloning a `StateCell` creates a new handle to the **same** inner state.
//!
//! # Invariants
//!
//! 1. `get()` only ever observes committed values, never intermediate
//!    results of a partially drained queue.
//! 2. `version` increments by exactly 1 per commit that applied at least
//!    one derivation.
//! 3. Subscribers are notified exactly once per value-changing commit, in
//!    registration order, after the final value is in place.
//! 4. There is no equality gate: a commit whose derivations reproduce the
//!    previous value still bumps the version and notifies.
//!
//! # Failure Modes
//!
//! - **Derivation panics**: The committed value remains the result of the
//!   last successfully applied derivation; later queue entries are not
//!   applied and no notification fires for the aborted commit.
//! - **Subscription dropped mid-notification**: Callbacks already snapshot
//!   for the running cycle complete; the dead slot is pruned on the next
//!   cycle.
//! - **Re-entrant `commit()` from a subscriber callback**: panics (see
//!   [`commit()`](StateCell::commit)).

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::{Rc, Weak};

/// A queued state transition: pure function from the previous committed
/// value to the next one.
type Derivation<S> = Box<dyn FnOnce(&S) -> S>;

/// Subscriber callback, invoked with the committed value after a commit.
type Listener<S> = Box<dyn Fn(&S)>;

/// Shared interior for [`StateCell<S>`].
struct CellInner<S> {
    /// Most recently committed value.
    value: RefCell<S>,
    /// Pending derivations, drained in FIFO order by `commit()`.
    queue: RefCell<VecDeque<Derivation<S>>>,
    /// Bumped once per commit that applied at least one derivation.
    version: Cell<u64>,
    /// Subscriber registry, in registration order. The cell holds only the
    /// weak side of each callback; the strong side lives in the
    /// [`Subscription`] guard. Dead entries are pruned lazily during
    /// notification.
    subscribers: RefCell<Vec<Weak<Listener<S>>>>,
    /// Source of registration ids (diagnostics only).
    next_slot_id: Cell<u64>,
}

/// A shared cell holding a committed value, pending derivations, and
/// subscribers.
///
/// This is the change-notification primitive behind Filament's containers.
/// It is single-threaded by construction (`Rc` interior, `!Send`); the host
/// scheduler owns the cadence of [`commit()`](StateCell::commit) calls.
pub struct StateCell<S> {
    inner: Rc<CellInner<S>>,
}

impl<S> Clone for StateCell<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<S: std::fmt::Debug> std::fmt::Debug for StateCell<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateCell")
            .field("value", &self.inner.value.borrow())
            .field("version", &self.inner.version.get())
            .field("pending", &self.inner.queue.borrow().len())
            .finish()
    }
}

impl<S: Clone + 'static> StateCell<S> {
    /// Create a cell holding `initial` at version 0 with an empty queue.
    #[must_use]
    pub fn new(initial: S) -> Self {
        Self {
            inner: Rc::new(CellInner {
                value: RefCell::new(initial),
                queue: RefCell::new(VecDeque::new()),
                version: Cell::new(0),
                subscribers: RefCell::new(Vec::new()),
                next_slot_id: Cell::new(0),
            }),
        }
    }

    /// Clone of the committed value.
    ///
    /// Queued-but-uncommitted derivations are never visible here.
    #[must_use]
    pub fn get(&self) -> S {
        self.inner.value.borrow().clone()
    }

    /// Access the committed value by reference without cloning.
    ///
    /// # Panics
    ///
    /// Panics if called while a `commit()` on the same cell is writing the
    /// value (re-entrant borrow).
    pub fn with<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        let value = self.inner.value.borrow();
        f(&*value)
    }

    /// Append a derivation to the FIFO queue.
    ///
    /// Nothing is applied and nobody is notified until the next
    /// [`commit()`](StateCell::commit).
    pub fn enqueue(&self, derivation: impl FnOnce(&S) -> S + 'static) {
        let pending = {
            let mut queue = self.inner.queue.borrow_mut();
            queue.push_back(Box::new(derivation));
            queue.len()
        };
        tracing::trace!(pending, "derivation queued");
    }

    /// Drain the queue, applying each derivation to the result of the one
    /// before it, then publish the final value.
    ///
    /// Returns `true` if at least one derivation was applied, in which case
    /// the version was bumped once and subscribers were notified once. An
    /// empty queue leaves the cell untouched and returns `false`.
    ///
    /// Derivations enqueued *by a derivation* are applied in the same
    /// commit. Derivations enqueued by a *subscriber callback* stay queued
    /// for the next commit: notification happens strictly after the drain.
    ///
    /// # Panics
    ///
    /// Panics if called re-entrantly from a subscriber callback of the same
    /// cell (the committed value is borrowed for the duration of the
    /// notification cycle).
    pub fn commit(&self) -> bool {
        let mut applied = 0usize;
        loop {
            let next_derivation = self.inner.queue.borrow_mut().pop_front();
            let Some(derivation) = next_derivation else {
                break;
            };
            // Clone out, derive, store. No borrow is held while the
            // derivation runs, so it may freely read the cell or enqueue.
            let prev = self.inner.value.borrow().clone();
            let next = derivation(&prev);
            *self.inner.value.borrow_mut() = next;
            applied += 1;
        }
        if applied == 0 {
            return false;
        }
        let version = self.inner.version.get() + 1;
        self.inner.version.set(version);
        tracing::debug!(applied, version, "commit");
        self.notify();
        true
    }

    /// Register a callback invoked with the committed value after each
    /// value-changing commit.
    ///
    /// The returned guard keeps the callback alive; dropping it makes the
    /// registration inert before the next notification cycle.
    #[must_use = "dropping the Subscription unsubscribes immediately"]
    pub fn subscribe(&self, listener: impl Fn(&S) + 'static) -> Subscription {
        let id = self.inner.next_slot_id.get();
        self.inner.next_slot_id.set(id + 1);

        let strong: Rc<Listener<S>> = Rc::new(Box::new(listener));
        self.inner
            .subscribers
            .borrow_mut()
            .push(Rc::downgrade(&strong));
        tracing::trace!(slot = id, "subscribed");

        Subscription { _listener: strong }
    }

    /// Commit-granularity version counter. Starts at 0.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.version.get()
    }

    /// Number of queued, not-yet-committed derivations.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.inner.queue.borrow().len()
    }

    /// Number of live subscriptions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner
            .subscribers
            .borrow()
            .iter()
            .filter(|listener| listener.strong_count() > 0)
            .count()
    }

    /// Whether two handles share the same cell.
    #[must_use]
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Rc::ptr_eq(&a.inner, &b.inner)
    }

    /// Notify live subscribers in registration order, pruning dead entries.
    fn notify(&self) {
        let live: Vec<Rc<Listener<S>>> = {
            let mut subscribers = self.inner.subscribers.borrow_mut();
            subscribers.retain(|listener| listener.strong_count() > 0);
            subscribers
                .iter()
                .filter_map(Weak::upgrade)
                .collect()
        };
        // The value borrow spans the callbacks: listeners may read the cell
        // and enqueue, but must not commit (re-entrant borrow, panics).
        let value = self.inner.value.borrow();
        for listener in live {
            (*listener)(&*value);
        }
    }
}

/// RAII guard for one subscriber registration.
///
/// Holds the strong reference to the callback; the cell only keeps a
/// `Weak`. Dropping the guard (or the cell) makes the other side inert.
/// Type-erased so guards from cells of different value types can live in
/// one collection.
pub struct Subscription {
    _listener: Rc<dyn Any>,
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn get_returns_initial() {
        let cell = StateCell::new(7);
        assert_eq!(cell.get(), 7);
        assert_eq!(cell.version(), 0);
        assert_eq!(cell.pending(), 0);
    }

    #[test]
    fn commit_on_empty_queue_is_noop() {
        let cell = StateCell::new(vec![1, 2]);
        assert!(!cell.commit());
        assert_eq!(cell.get(), vec![1, 2]);
        assert_eq!(cell.version(), 0);
    }

    #[test]
    fn derivations_apply_in_fifo_order() {
        let cell = StateCell::new(0);
        cell.enqueue(|v| v + 1);
        cell.enqueue(|v| v * 10);
        assert_eq!(cell.pending(), 2);

        assert!(cell.commit());
        // (0 + 1) * 10, not (0 * 10) + 1.
        assert_eq!(cell.get(), 10);
        assert_eq!(cell.pending(), 0);
    }

    #[test]
    fn version_bumps_once_per_commit() {
        let cell = StateCell::new(0);
        cell.enqueue(|v| v + 1);
        cell.enqueue(|v| v + 1);
        cell.enqueue(|v| v + 1);
        assert!(cell.commit());
        assert_eq!(cell.get(), 3);
        assert_eq!(cell.version(), 1);

        cell.enqueue(|v| v + 1);
        assert!(cell.commit());
        assert_eq!(cell.version(), 2);
    }

    #[test]
    fn queued_derivations_are_invisible_until_commit() {
        let cell = StateCell::new(1);
        cell.enqueue(|v| v + 99);
        assert_eq!(cell.get(), 1);
        assert_eq!(cell.pending(), 1);

        cell.commit();
        assert_eq!(cell.get(), 100);
    }

    #[test]
    fn subscriber_notified_once_per_commit() {
        let cell = StateCell::new(0);
        let calls = Rc::new(Cell::new(0u32));
        let calls_clone = Rc::clone(&calls);
        let _sub = cell.subscribe(move |_| calls_clone.set(calls_clone.get() + 1));

        cell.enqueue(|v| v + 1);
        cell.enqueue(|v| v + 1);
        cell.commit();
        assert_eq!(calls.get(), 1);

        // Empty commit: no notification.
        cell.commit();
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn subscriber_sees_final_value() {
        let cell = StateCell::new(0);
        let seen = Rc::new(Cell::new(-1));
        let seen_clone = Rc::clone(&seen);
        let _sub = cell.subscribe(move |v| seen_clone.set(*v));

        cell.enqueue(|v| v + 5);
        cell.enqueue(|v| v * 2);
        cell.commit();
        assert_eq!(seen.get(), 10);
    }

    #[test]
    fn subscribers_notified_in_registration_order() {
        let cell = StateCell::new(0);
        let log = Rc::new(RefCell::new(Vec::new()));

        let log_a = Rc::clone(&log);
        let _a = cell.subscribe(move |_| log_a.borrow_mut().push("a"));
        let log_b = Rc::clone(&log);
        let _b = cell.subscribe(move |_| log_b.borrow_mut().push("b"));

        cell.enqueue(|v| v + 1);
        cell.commit();
        assert_eq!(*log.borrow(), vec!["a", "b"]);
    }

    #[test]
    fn dropping_subscription_makes_it_inert() {
        let cell = StateCell::new(0);
        let calls = Rc::new(Cell::new(0u32));
        let calls_clone = Rc::clone(&calls);
        let sub = cell.subscribe(move |_| calls_clone.set(calls_clone.get() + 1));
        assert_eq!(cell.subscriber_count(), 1);

        cell.enqueue(|v| v + 1);
        cell.commit();
        assert_eq!(calls.get(), 1);

        drop(sub);
        assert_eq!(cell.subscriber_count(), 0);

        cell.enqueue(|v| v + 1);
        cell.commit();
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn clone_shares_state() {
        let a = StateCell::new(1);
        let b = a.clone();
        assert!(StateCell::ptr_eq(&a, &b));

        b.enqueue(|v| v + 1);
        a.commit();
        assert_eq!(a.get(), 2);
        assert_eq!(b.get(), 2);

        let unrelated = StateCell::new(1);
        assert!(!StateCell::ptr_eq(&a, &unrelated));
    }

    #[test]
    fn derivation_may_enqueue_into_same_commit() {
        let cell = StateCell::new(0);
        let handle = cell.clone();
        cell.enqueue(move |v| {
            handle.enqueue(|v| v + 100);
            v + 1
        });

        cell.commit();
        assert_eq!(cell.get(), 101);
        assert_eq!(cell.version(), 1);
    }

    #[test]
    fn subscriber_enqueue_is_deferred_to_next_commit() {
        let cell = StateCell::new(0);
        let handle = cell.clone();
        let _sub = cell.subscribe(move |_| handle.enqueue(|v| v + 100));

        cell.enqueue(|v| v + 1);
        cell.commit();
        assert_eq!(cell.get(), 1);
        assert_eq!(cell.pending(), 1);

        cell.commit();
        assert_eq!(cell.get(), 101);
        assert_eq!(cell.version(), 2);
    }

    #[test]
    fn derivation_may_read_cell() {
        let cell = StateCell::new(3);
        let handle = cell.clone();
        cell.enqueue(move |v| v + handle.get());
        cell.commit();
        assert_eq!(cell.get(), 6);
    }

    #[test]
    fn value_equal_commit_still_notifies() {
        let cell = StateCell::new(5);
        let calls = Rc::new(Cell::new(0u32));
        let calls_clone = Rc::clone(&calls);
        let _sub = cell.subscribe(move |_| calls_clone.set(calls_clone.get() + 1));

        // Identity derivation: the value does not change, but there is no
        // equality gate.
        cell.enqueue(|v| *v);
        cell.commit();
        assert_eq!(cell.get(), 5);
        assert_eq!(cell.version(), 1);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn cell_outlives_dropped_handles() {
        let keeper;
        {
            let cell = StateCell::new(vec![1]);
            keeper = cell.clone();
            cell.enqueue(|v: &Vec<i32>| {
                let mut next = v.clone();
                next.push(2);
                next
            });
        }
        keeper.commit();
        assert_eq!(keeper.get(), vec![1, 2]);
    }

    #[test]
    fn debug_format() {
        let cell = StateCell::new(42);
        cell.enqueue(|v| v + 1);
        let dbg = format!("{:?}", cell);
        assert!(dbg.contains("StateCell"));
        assert!(dbg.contains("42"));
        assert!(dbg.contains("pending"));

        let sub = cell.subscribe(|_| {});
        assert!(format!("{:?}", sub).contains("Subscription"));
    }
}
