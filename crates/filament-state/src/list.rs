#![forbid(unsafe_code)]

//! Ordered-sequence container.
//!
//! [`ListContainer<T>`] holds an ordered `Vec<T>` where position is
//! identity; [`ListMutator<T>`] is its stable operation-handle set.
//!
//! Design goals:
//! - Every operation derives a brand-new sequence from the most recently
//!   published one (no in-place mutation, no stale snapshots)
//! - Index-based operations treat an out-of-range index as "nothing at that
//!   position to affect" and publish a value-equal sequence
//! - Appending zero items enqueues nothing, so no spurious re-render

use filament_reactive::{StateCell, Subscription};

/// Reactive container for an ordered sequence of `T`.
///
/// Construction yields the current-value side; [`mutator()`](Self::mutator)
/// yields the operation side. Both are cheap handles onto the same shared
/// cell.
pub struct ListContainer<T> {
    cell: StateCell<Vec<T>>,
    mutator: ListMutator<T>,
}

impl<T: Clone + 'static> ListContainer<T> {
    /// Create a container holding `initial`.
    #[must_use]
    pub fn new(initial: Vec<T>) -> Self {
        let cell = StateCell::new(initial);
        let mutator = ListMutator { cell: cell.clone() };
        Self { cell, mutator }
    }

    /// Clone of the committed sequence.
    #[must_use]
    pub fn get(&self) -> Vec<T> {
        self.cell.get()
    }

    /// Access the committed sequence by reference without cloning.
    pub fn with<R>(&self, f: impl FnOnce(&[T]) -> R) -> R {
        self.cell.with(|v| f(v))
    }

    /// Committed length.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cell.with(Vec::len)
    }

    /// Whether the committed sequence is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cell.with(Vec::is_empty)
    }

    /// The container's mutator.
    ///
    /// Always the same handle set, however many times the value has
    /// changed: the returned clone shares the handles built at container
    /// creation ([`ListMutator::ptr_eq`] observes this).
    #[must_use]
    pub fn mutator(&self) -> ListMutator<T> {
        self.mutator.clone()
    }

    /// Register a listener invoked with the committed sequence after each
    /// commit that applied at least one operation.
    #[must_use = "dropping the Subscription unsubscribes immediately"]
    pub fn subscribe(&self, listener: impl Fn(&[T]) + 'static) -> Subscription {
        self.cell.subscribe(move |v: &Vec<T>| listener(v))
    }

    /// Apply queued operations in FIFO order and notify subscribers once.
    ///
    /// Returns `true` if anything was applied. See
    /// [`StateCell::commit`](filament_reactive::StateCell::commit) for
    /// re-entrancy rules.
    pub fn commit(&self) -> bool {
        self.cell.commit()
    }

    /// Commit-granularity version counter.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.cell.version()
    }

    /// Number of queued, not-yet-committed operations.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.cell.pending()
    }
}

impl<T: Clone + 'static> Default for ListContainer<T> {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for ListContainer<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListContainer")
            .field("cell", &self.cell)
            .finish_non_exhaustive()
    }
}

/// Stable operation-handle set for a [`ListContainer`].
///
/// Cloning shares the handle set; every operation enqueues one pure
/// derivation applied at the next `commit()` against the then-latest
/// sequence.
pub struct ListMutator<T> {
    cell: StateCell<Vec<T>>,
}

impl<T> Clone for ListMutator<T> {
    fn clone(&self) -> Self {
        Self {
            cell: self.cell.clone(),
        }
    }
}

impl<T> std::fmt::Debug for ListMutator<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListMutator").finish_non_exhaustive()
    }
}

impl<T: Clone + 'static> ListMutator<T> {
    /// Replace the entire sequence unconditionally. No validation.
    pub fn set(&self, new_list: Vec<T>) {
        self.cell.enqueue(move |_prev| new_list);
    }

    /// Append one item to the end.
    pub fn push(&self, item: T) {
        self.cell.enqueue(move |prev| {
            let mut next = prev.clone();
            next.push(item);
            next
        });
    }

    /// Append zero or more items to the end, preserving argument order.
    ///
    /// An empty `items` enqueues nothing: no version bump, no
    /// notification.
    pub fn extend(&self, items: impl IntoIterator<Item = T>) {
        let items: Vec<T> = items.into_iter().collect();
        if items.is_empty() {
            return;
        }
        self.cell.enqueue(move |prev| {
            let mut next = prev.clone();
            next.extend(items);
            next
        });
    }

    /// For every item where `predicate` is true, substitute
    /// `action(item.clone())` at that position; other items pass through
    /// unchanged.
    ///
    /// The clone handed to `action` is fresh: the action may mutate or
    /// replace fields without aliasing the published item. Ordering and
    /// length are preserved; `action` returns a full replacement value,
    /// not a delta.
    pub fn update(
        &self,
        predicate: impl Fn(&T) -> bool + 'static,
        action: impl Fn(T) -> T + 'static,
    ) {
        self.cell.enqueue(move |prev| {
            prev.iter()
                .map(|item| {
                    if predicate(item) {
                        action(item.clone())
                    } else {
                        item.clone()
                    }
                })
                .collect()
        });
    }

    /// Same derivation as [`update`](Self::update), selecting by position.
    ///
    /// An out-of-range `index` changes no item; a value-equal sequence is
    /// still published.
    pub fn update_at(&self, index: usize, action: impl FnOnce(T) -> T + 'static) {
        self.cell.enqueue(move |prev| {
            let mut next = prev.clone();
            if let Some(slot) = next.get_mut(index) {
                let fresh = slot.clone();
                *slot = action(fresh);
            }
            next
        });
    }

    /// Substitute every matching item with a clone of `new_item` verbatim
    /// (no per-item transform: all matches become the same value).
    pub fn replace(&self, predicate: impl Fn(&T) -> bool + 'static, new_item: T) {
        self.cell.enqueue(move |prev| {
            prev.iter()
                .map(|item| {
                    if predicate(item) {
                        new_item.clone()
                    } else {
                        item.clone()
                    }
                })
                .collect()
        });
    }

    /// Substitute at a single position; out-of-range is a silent no-op.
    pub fn replace_at(&self, index: usize, new_item: T) {
        self.cell.enqueue(move |prev| {
            let mut next = prev.clone();
            if let Some(slot) = next.get_mut(index) {
                *slot = new_item;
            }
            next
        });
    }

    /// Drop every item for which `predicate` is true; survivors keep their
    /// relative order.
    pub fn remove(&self, predicate: impl Fn(&T) -> bool + 'static) {
        self.cell.enqueue(move |prev| {
            prev.iter()
                .filter(|&item| !predicate(item))
                .cloned()
                .collect()
        });
    }

    /// Drop exactly the item at `index` (position comparison, not value);
    /// out-of-range is a silent no-op.
    pub fn remove_at(&self, index: usize) {
        self.cell.enqueue(move |prev| {
            let mut next = prev.clone();
            if index < next.len() {
                next.remove(index);
            }
            next
        });
    }

    /// Replace the sequence with the empty sequence.
    pub fn clear(&self) {
        self.cell.enqueue(|_prev| Vec::new());
    }

    /// Whether two mutators share the same handle set.
    #[must_use]
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        StateCell::ptr_eq(&a.cell, &b.cell)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
