#![forbid(unsafe_code)]

//! Read attribution: which computation is evaluating right now, and who
//! depends on what.
//!
//! A [`Tracker`] holds the active-computation marker of one component.
//! [`Tracker::evaluate`] brackets a computation's function with the marker
//! set; any observable read inside that window records the computation in
//! its [`Dependents`]. Reads outside any evaluation record nothing.
//!
//! # Invariants
//!
//! 1. At most one computation is active at a time.
//! 2. The marker is cleared when `evaluate` returns, also on unwind.
//! 3. A computation appears at most once in a `Dependents` set, at the
//!    position of its first read.

use std::cell::{Cell, RefCell};
use std::fmt;

/// Position of a computation in its component's graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComputationId(pub(crate) usize);

impl ComputationId {
    /// Zero-based registration index.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for ComputationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "computation#{}", self.0)
    }
}

/// The active-computation marker of one component.
#[derive(Debug, Default)]
pub struct Tracker {
    active: Cell<Option<ComputationId>>,
}

impl Tracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The computation currently evaluating, if any.
    #[must_use]
    pub fn active(&self) -> Option<ComputationId> {
        self.active.get()
    }

    /// Run `f` with `id` marked active.
    pub fn evaluate<R>(&self, id: ComputationId, f: impl FnOnce() -> R) -> R {
        let _active = ActiveGuard::enter(self, id);
        f()
    }
}

/// Clears the marker on drop.
struct ActiveGuard<'a> {
    tracker: &'a Tracker,
}

impl<'a> ActiveGuard<'a> {
    fn enter(tracker: &'a Tracker, id: ComputationId) -> Self {
        tracker.active.set(Some(id));
        Self { tracker }
    }
}

impl Drop for ActiveGuard<'_> {
    fn drop(&mut self) {
        self.tracker.active.set(None);
    }
}

/// A cell or computation that reads can be attributed to, whatever the
/// type of its value.
pub(crate) trait Observed {
    fn dependents(&self) -> &Dependents;
}

/// Ordered, duplicate-free set of computations to notify on change.
#[derive(Debug, Default)]
pub struct Dependents {
    ids: RefCell<Vec<ComputationId>>,
}

impl Dependents {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the tracker's active computation, if any and not yet present.
    ///
    /// Returns `true` when a new dependent was added.
    pub fn record(&self, tracker: &Tracker) -> bool {
        let Some(active) = tracker.active() else {
            return false;
        };
        let mut ids = self.ids.borrow_mut();
        if ids.contains(&active) {
            return false;
        }
        ids.push(active);
        true
    }

    /// Copy of the current set, in registration order.
    ///
    /// Notification walks a snapshot so dependents recorded while it runs
    /// wait for the next change.
    #[must_use]
    pub fn snapshot(&self) -> Vec<ComputationId> {
        self.ids.borrow().clone()
    }

    #[must_use]
    pub fn contains(&self, id: ComputationId) -> bool {
        self.ids.borrow().contains(&id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.borrow().is_empty()
    }
}
