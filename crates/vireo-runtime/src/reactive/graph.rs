#![forbid(unsafe_code)]

//! Computed values that recompute eagerly when anything they read changes.
//!
//! # Design
//!
//! Each computation wraps a function of the component's [`Scope`] and its
//! cached result. Updating a computation marks it active, runs the function
//! (every read inside is attributed to it), stores the result, clears the
//! marker and then updates every dependent recorded so far, depth-first.
//!
//! The cache starts unset: reading a computation before its first update
//! yields `None`, and functions reading other computations must tolerate
//! that.
//!
//! # Invariants
//!
//! 1. After an update returns, every transitive dependent has been
//!    recomputed once per path through the graph.
//! 2. `version` increments by exactly 1 per recomputation.
//! 3. Dependents recorded during a propagation are not visited by that same
//!    propagation.
//!
//! # Failure Modes
//!
//! - **Cycle**: a computation that (transitively) reads itself recurses
//!   without bound. Nothing detects it.
//! - **Compute function panics**: the marker is cleared, the cache keeps the
//!   previous value and the panic propagates to the writer.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use indexmap::IndexMap;

use super::scope::{GraphEntry, ReactiveContext, Scope};
use super::tracker::{ComputationId, Dependents, Observed};

/// Type-erased view of a computation used for propagation.
pub(crate) trait Node: Observed {
    fn update(&self, cx: &Rc<ReactiveContext>);
}

/// Shared interior of a [`Computed<T>`].
pub(crate) struct ComputationNode<T> {
    id: ComputationId,
    name: String,
    compute: Box<dyn Fn(&Scope) -> T>,
    /// `None` until the first update.
    cached: RefCell<Option<T>>,
    dependents: Dependents,
    /// Bumped on each recomputation.
    version: Cell<u64>,
    cx: Weak<ReactiveContext>,
}

impl<T> Observed for ComputationNode<T> {
    fn dependents(&self) -> &Dependents {
        &self.dependents
    }
}

impl<T: 'static> Node for ComputationNode<T> {
    fn update(&self, cx: &Rc<ReactiveContext>) {
        let scope = Scope::from_context(Rc::clone(cx));
        let value = cx.tracker.evaluate(self.id, || (self.compute)(&scope));
        *self.cached.borrow_mut() = Some(value);
        let version = self.version.get() + 1;
        self.version.set(version);
        tracing::trace!(
            computation = %self.name,
            version,
            dependents = self.dependents.len(),
            "recomputed"
        );
        ReactiveContext::notify(cx, &self.dependents);
    }
}

/// Typed handle to one named computation.
///
/// Cloning creates a new handle to the **same** computation.
pub struct Computed<T> {
    node: Rc<ComputationNode<T>>,
}

impl<T> Clone for Computed<T> {
    fn clone(&self) -> Self {
        Self {
            node: Rc::clone(&self.node),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Computed<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Computed")
            .field("name", &self.node.name)
            .field("cached", &self.node.cached.borrow())
            .field("version", &self.node.version.get())
            .finish()
    }
}

impl<T: 'static> Computed<T> {
    pub(crate) fn from_node(node: Rc<ComputationNode<T>>) -> Self {
        Self { node }
    }

    #[must_use]
    pub fn id(&self) -> ComputationId {
        self.node.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.node.name
    }

    /// Access the cached value by reference, recording the active
    /// computation. `None` before the first update.
    pub fn with<R>(&self, f: impl FnOnce(Option<&T>) -> R) -> R {
        self.track();
        f(self.node.cached.borrow().as_ref())
    }

    /// Whether the first update has run. Records nothing.
    #[must_use]
    pub fn is_set(&self) -> bool {
        self.node.cached.borrow().is_some()
    }

    /// Number of recomputations so far.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.node.version.get()
    }

    /// Number of computations that read this one.
    #[must_use]
    pub fn dependent_count(&self) -> usize {
        self.node.dependents.len()
    }

    /// Recompute now and propagate to dependents.
    pub fn recompute(&self) {
        if let Some(cx) = self.node.cx.upgrade() {
            self.node.update(&cx);
        }
    }

    fn track(&self) {
        if let Some(cx) = self.node.cx.upgrade() {
            self.node.dependents.record(&cx.tracker);
        }
    }
}

impl<T: Clone + 'static> Computed<T> {
    /// Cached value, recording the active computation as a dependent.
    /// `None` before the first update.
    #[must_use]
    pub fn get(&self) -> Option<T> {
        self.with(|cached| cached.cloned())
    }
}

// ---------------------------------------------------------------------------
// Computations
// ---------------------------------------------------------------------------

/// Turns a compute function into a graph entry once its id is known.
pub(crate) trait ComputationSeed {
    fn plant(self: Box<Self>, id: ComputationId, name: String, cx: Weak<ReactiveContext>)
    -> GraphEntry;
}

struct Seed<T> {
    compute: Box<dyn Fn(&Scope) -> T>,
}

impl<T: 'static> ComputationSeed for Seed<T> {
    fn plant(
        self: Box<Self>,
        id: ComputationId,
        name: String,
        cx: Weak<ReactiveContext>,
    ) -> GraphEntry {
        let node = Rc::new(ComputationNode {
            id,
            name,
            compute: self.compute,
            cached: RefCell::new(None),
            dependents: Dependents::new(),
            version: Cell::new(0),
            cx,
        });
        GraphEntry {
            node: Rc::clone(&node) as Rc<dyn Node>,
            any: node as Rc<dyn Any>,
        }
    }
}

/// Ordered name → compute function mapping a component declares its
/// derived values with.
///
/// Functions receive the component's [`Scope`] and may read any state cell
/// or computation through it. Registration order is evaluation order for the
/// first update. Defining a name twice keeps the first position and the
/// last function.
#[derive(Default)]
pub struct Computations {
    seeds: IndexMap<String, Box<dyn ComputationSeed>>,
}

impl fmt::Debug for Computations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.seeds.keys()).finish()
    }
}

impl Computations {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`insert`](Self::insert).
    #[must_use]
    pub fn define<T: 'static>(
        mut self,
        name: impl Into<String>,
        compute: impl Fn(&Scope) -> T + 'static,
    ) -> Self {
        self.insert(name, compute);
        self
    }

    /// Register `compute` under `name`.
    pub fn insert<T: 'static>(
        &mut self,
        name: impl Into<String>,
        compute: impl Fn(&Scope) -> T + 'static,
    ) {
        self.seeds.insert(
            name.into(),
            Box::new(Seed {
                compute: Box::new(compute),
            }),
        );
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

    pub(crate) fn into_seeds(self) -> impl Iterator<Item = (String, Box<dyn ComputationSeed>)> {
        self.seeds.into_iter()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
