#![forbid(unsafe_code)]

//! Single-record container.
//!
//! [`RecordContainer<T>`] holds one structured value with a fixed set of
//! named fields; [`RecordMutator<T>`] is its stable operation-handle set,
//! offering whole-value replacement and single-field update.
//!
//! The field update takes a selector closure (`|r| &mut r.field`) plus the
//! new value, so the field name and the value's type are checked at compile
//! time. The derivation clones the previous record, overwrites exactly the
//! selected field, and publishes the clone; every other field is carried
//! over untouched.

use filament_reactive::{StateCell, Subscription};

/// Reactive container for a single structured value.
pub struct RecordContainer<T> {
    cell: StateCell<T>,
    mutator: RecordMutator<T>,
}

impl<T: Clone + 'static> RecordContainer<T> {
    /// Create a container holding `initial`.
    #[must_use]
    pub fn new(initial: T) -> Self {
        let cell = StateCell::new(initial);
        let mutator = RecordMutator { cell: cell.clone() };
        Self { cell, mutator }
    }

    /// Clone of the committed value.
    #[must_use]
    pub fn get(&self) -> T {
        self.cell.get()
    }

    /// Access the committed value by reference without cloning.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.cell.with(f)
    }

    /// The container's mutator: the same handle set for the container's
    /// whole lifetime ([`RecordMutator::ptr_eq`] observes this).
    #[must_use]
    pub fn mutator(&self) -> RecordMutator<T> {
        self.mutator.clone()
    }

    /// Register a listener invoked with the committed value after each
    /// commit that applied at least one operation.
    #[must_use = "dropping the Subscription unsubscribes immediately"]
    pub fn subscribe(&self, listener: impl Fn(&T) + 'static) -> Subscription {
        self.cell.subscribe(listener)
    }

    /// Apply queued operations in FIFO order and notify subscribers once.
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

impl<T: Clone + Default + 'static> Default for RecordContainer<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for RecordContainer<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordContainer")
            .field("cell", &self.cell)
            .finish_non_exhaustive()
    }
}

/// Stable operation-handle set for a [`RecordContainer`].
pub struct RecordMutator<T> {
    cell: StateCell<T>,
}

impl<T> Clone for RecordMutator<T> {
    fn clone(&self) -> Self {
        Self {
            cell: self.cell.clone(),
        }
    }
}

impl<T> std::fmt::Debug for RecordMutator<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordMutator").finish_non_exhaustive()
    }
}

impl<T: Clone + 'static> RecordMutator<T> {
    /// Replace the whole value unconditionally.
    pub fn set(&self, new_value: T) {
        self.cell.enqueue(move |_prev| new_value);
    }

    /// Overwrite exactly one field, carrying every other field over
    /// unchanged.
    ///
    /// `field` selects the target (`|r| &mut r.count`); the selector's
    /// signature ties the field name and `value`'s type together at compile
    /// time. The derivation clones the previous record and overwrites the
    /// selected field on the clone.
    pub fn update<V: 'static>(&self, field: impl FnOnce(&mut T) -> &mut V + 'static, value: V) {
        self.cell.enqueue(move |prev| {
            let mut next = prev.clone();
            *field(&mut next) = value;
            next
        });
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
