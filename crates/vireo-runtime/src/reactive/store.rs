#![forbid(unsafe_code)]

//! State cells: the mutable leaves of a component's graph.
//!
//! A component declares its initial state as a [`StateMap`]. Mounting turns
//! every entry into a [`StateCell<T>`] owned by the component's context.
//!
//! # Invariants
//!
//! 1. Reading inside a computation records it as a dependent, once, at the
//!    position of its first read.
//! 2. Writing never records a dependency.
//! 3. Every write notifies every dependent in registration order, even when
//!    the new value equals the old one.
//!
//! # Failure Modes
//!
//! - **Context dropped**: the cell keeps its value; reads no longer record
//!   dependents and writes no longer propagate.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use indexmap::IndexMap;

use super::scope::{CellEntry, ReactiveContext};
use super::tracker::{Dependents, Observed};

/// Shared interior of a [`StateCell<T>`].
pub(crate) struct CellNode<T> {
    name: String,
    value: RefCell<T>,
    dependents: Dependents,
    /// Number of writes so far.
    version: Cell<u64>,
    cx: Weak<ReactiveContext>,
}

impl<T> Observed for CellNode<T> {
    fn dependents(&self) -> &Dependents {
        &self.dependents
    }
}

/// Typed handle to one named state cell.
///
/// Cloning creates a new handle to the **same** cell.
pub struct StateCell<T> {
    node: Rc<CellNode<T>>,
}

impl<T> Clone for StateCell<T> {
    fn clone(&self) -> Self {
        Self {
            node: Rc::clone(&self.node),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for StateCell<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateCell")
            .field("name", &self.node.name)
            .field("value", &self.node.value.borrow())
            .field("dependents", &self.node.dependents.len())
            .field("version", &self.node.version.get())
            .finish()
    }
}

impl<T: 'static> StateCell<T> {
    pub(crate) fn from_node(node: Rc<CellNode<T>>) -> Self {
        Self { node }
    }

    /// Name this cell was declared under.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.node.name
    }

    /// Access the value by reference, recording the active computation.
    ///
    /// # Panics
    ///
    /// Panics if `f` writes to this same cell (re-entrant borrow).
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.track();
        f(&*self.node.value.borrow())
    }

    /// Replace the value and recompute every dependent, synchronously.
    pub fn set(&self, value: T) {
        *self.node.value.borrow_mut() = value;
        self.notify();
    }

    /// Mutate the value in place, then recompute every dependent.
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        f(&mut self.node.value.borrow_mut());
        self.notify();
    }

    /// Number of writes so far.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.node.version.get()
    }

    /// Number of computations that will be recomputed on the next write.
    #[must_use]
    pub fn dependent_count(&self) -> usize {
        self.node.dependents.len()
    }

    fn track(&self) {
        if let Some(cx) = self.node.cx.upgrade() {
            self.node.dependents.record(&cx.tracker);
        }
    }

    fn notify(&self) {
        self.node.version.set(self.node.version.get() + 1);
        if let Some(cx) = self.node.cx.upgrade() {
            tracing::trace!(
                cell = %self.node.name,
                dependents = self.node.dependents.len(),
                "state written"
            );
            ReactiveContext::notify(&cx, &self.node.dependents);
        }
    }
}

impl<T: Clone + 'static> StateCell<T> {
    /// Current value, recording the active computation as a dependent.
    #[must_use]
    pub fn get(&self) -> T {
        self.with(T::clone)
    }
}

// ---------------------------------------------------------------------------
// StateMap
// ---------------------------------------------------------------------------

/// Turns a typed initial value into a cell once the context exists.
pub(crate) trait CellSeed {
    fn plant(self: Box<Self>, name: String, cx: Weak<ReactiveContext>) -> CellEntry;
}

struct Seed<T>(T);

impl<T: 'static> CellSeed for Seed<T> {
    fn plant(self: Box<Self>, name: String, cx: Weak<ReactiveContext>) -> CellEntry {
        let node = Rc::new(CellNode {
            name,
            value: RefCell::new(self.0),
            dependents: Dependents::new(),
            version: Cell::new(0),
            cx,
        });
        CellEntry {
            observed: Rc::clone(&node) as Rc<dyn Observed>,
            any: node as Rc<dyn Any>,
        }
    }
}

/// Ordered name → initial value mapping a component declares its state with.
///
/// Values may have any `'static` type; each becomes a [`StateCell`] of that
/// type. Declaring a name twice keeps the first position and the last value.
#[derive(Default)]
pub struct StateMap {
    seeds: IndexMap<String, Box<dyn CellSeed>>,
}

impl fmt::Debug for StateMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.seeds.keys()).finish()
    }
}

impl StateMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`insert`](Self::insert).
    #[must_use]
    pub fn with<T: 'static>(mut self, name: impl Into<String>, initial: T) -> Self {
        self.insert(name, initial);
        self
    }

    /// Declare a cell named `name` holding `initial`.
    pub fn insert<T: 'static>(&mut self, name: impl Into<String>, initial: T) {
        self.seeds.insert(name.into(), Box::new(Seed(initial)));
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.seeds.contains_key(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.seeds.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.seeds.is_empty()
    }

    pub(crate) fn into_seeds(self) -> impl Iterator<Item = (String, Box<dyn CellSeed>)> {
        self.seeds.into_iter()
    }
}
