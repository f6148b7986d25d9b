#![forbid(unsafe_code)]

//! A component's reactive namespace.
//!
//! [`ReactiveContext`] owns the cells, the computations and the
//! active-computation marker of exactly one component. [`Scope`] is the
//! public handle computations, hooks and render functions read and write
//! through, by name or through typed handles.
//!
//! Lookups follow missing-property semantics: an unknown name, or a name
//! asked for with the wrong type, reads as `None`. Writes are checked and
//! report a [`ReactiveError`].

use std::any::{Any, type_name};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use vireo_core::Scheduler;

use super::graph::{ComputationNode, Computations, Computed, Node};
use super::store::{CellNode, StateCell, StateMap};
use super::tracker::{ComputationId, Dependents, Observed, Tracker};
use crate::error::{ReactiveError, Result};

/// One registered computation, kept both as a graph node and as `Any` for
/// typed downcasting.
pub(crate) struct GraphEntry {
    pub(crate) node: Rc<dyn Node>,
    pub(crate) any: Rc<dyn Any>,
}

/// One declared state cell, kept both for untyped tracking and as `Any`
/// for typed downcasting.
pub(crate) struct CellEntry {
    pub(crate) observed: Rc<dyn Observed>,
    pub(crate) any: Rc<dyn Any>,
}

/// Shared interior behind a [`Scope`].
pub(crate) struct ReactiveContext {
    pub(crate) tracker: Tracker,
    scheduler: Scheduler,
    cells: RefCell<IndexMap<String, CellEntry>>,
    computations: RefCell<IndexMap<String, GraphEntry>>,
}

impl ReactiveContext {
    fn new(scheduler: Scheduler) -> Rc<Self> {
        Rc::new(Self {
            tracker: Tracker::new(),
            scheduler,
            cells: RefCell::new(IndexMap::new()),
            computations: RefCell::new(IndexMap::new()),
        })
    }

    fn install_state(cx: &Rc<Self>, state: StateMap) {
        let mut cells = cx.cells.borrow_mut();
        for (name, seed) in state.into_seeds() {
            let cell = seed.plant(name.clone(), Rc::downgrade(cx));
            cells.insert(name, cell);
        }
    }

    fn install_computations(cx: &Rc<Self>, computations: Computations) -> Result<()> {
        let cells = cx.cells.borrow();
        let mut graph = cx.computations.borrow_mut();
        for (index, (name, seed)) in computations.into_seeds().enumerate() {
            if cells.contains_key(&name) {
                return Err(ReactiveError::DuplicateName { name });
            }
            let entry = seed.plant(ComputationId(index), name.clone(), Rc::downgrade(cx));
            graph.insert(name, entry);
        }
        Ok(())
    }

    /// Recompute one computation and, through it, everything downstream.
    pub(crate) fn update(cx: &Rc<Self>, id: ComputationId) {
        let node = cx
            .computations
            .borrow()
            .get_index(id.0)
            .map(|(_, entry)| Rc::clone(&entry.node));
        if let Some(node) = node {
            node.update(cx);
        }
    }

    /// Recompute every dependent in registration order, depth-first.
    pub(crate) fn notify(cx: &Rc<Self>, dependents: &Dependents) {
        for id in dependents.snapshot() {
            Self::update(cx, id);
        }
    }

    fn cell_any(&self, name: &str) -> Option<Rc<dyn Any>> {
        self.cells
            .borrow()
            .get(name)
            .map(|entry| Rc::clone(&entry.any))
    }

    /// Attribute a read of `name` to the active computation without looking
    /// at the value's type.
    fn track(&self, name: &str) {
        if let Some(entry) = self.cells.borrow().get(name) {
            entry.observed.dependents().record(&self.tracker);
            return;
        }
        if let Some(entry) = self.computations.borrow().get(name) {
            entry.node.dependents().record(&self.tracker);
        }
    }

    fn computation_any(&self, name: &str) -> Option<Rc<dyn Any>> {
        self.computations
            .borrow()
            .get(name)
            .map(|entry| Rc::clone(&entry.any))
    }
}

/// Handle to a component's namespace.
///
/// Cloning creates a new handle to the **same** namespace.
#[derive(Clone)]
pub struct Scope {
    cx: Rc<ReactiveContext>,
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scope")
            .field("state", &self.state_names())
            .field("computations", &self.computation_names())
            .field("active", &self.cx.tracker.active())
            .finish()
    }
}

impl Scope {
    /// Build the store and graph. Computations stay unset until
    /// [`update_all`](Self::update_all) or an individual update runs.
    pub(crate) fn install(
        scheduler: Scheduler,
        state: StateMap,
        computations: Computations,
    ) -> Result<Self> {
        let cx = ReactiveContext::new(scheduler);
        ReactiveContext::install_state(&cx, state);
        ReactiveContext::install_computations(&cx, computations)?;
        Ok(Self { cx })
    }

    pub(crate) fn from_context(cx: Rc<ReactiveContext>) -> Self {
        Self { cx }
    }

    pub(crate) fn context(&self) -> &Rc<ReactiveContext> {
        &self.cx
    }

    /// Ids of every computation, in registration order.
    pub(crate) fn computation_ids(&self) -> Vec<ComputationId> {
        (0..self.cx.computations.borrow().len())
            .map(ComputationId)
            .collect()
    }

    /// Run every computation's update once, in registration order.
    pub(crate) fn update_all(&self) {
        for id in self.computation_ids() {
            ReactiveContext::update(&self.cx, id);
        }
    }

    /// The event loop this component runs on.
    #[must_use]
    pub fn scheduler(&self) -> &Scheduler {
        &self.cx.scheduler
    }

    /// The computation currently evaluating, if any.
    #[must_use]
    pub fn active(&self) -> Option<ComputationId> {
        self.cx.tracker.active()
    }

    /// Typed handle to the state cell `name`.
    #[must_use]
    pub fn cell<T: 'static>(&self, name: &str) -> Option<StateCell<T>> {
        let any = self.cx.cell_any(name)?;
        Rc::downcast::<CellNode<T>>(any)
            .ok()
            .map(StateCell::from_node)
    }

    /// Typed handle to the computation `name`.
    #[must_use]
    pub fn computed<T: 'static>(&self, name: &str) -> Option<Computed<T>> {
        let any = self.cx.computation_any(name)?;
        Rc::downcast::<ComputationNode<T>>(any)
            .ok()
            .map(Computed::from_node)
    }

    /// Read a cell or computation by name, recording the active computation
    /// as a dependent.
    ///
    /// `None` for unknown names, for a type other than the declared one, and
    /// for computations that have not been evaluated yet. A read of an
    /// existing name with the wrong type is still recorded.
    #[must_use]
    pub fn read<T: Clone + 'static>(&self, name: &str) -> Option<T> {
        if let Some(cell) = self.cell::<T>(name) {
            return Some(cell.get());
        }
        if let Some(computed) = self.computed::<T>(name) {
            return computed.get();
        }
        self.cx.track(name);
        None
    }

    /// Write the state cell `name`, recomputing its dependents.
    ///
    /// # Errors
    ///
    /// - [`ReactiveError::ReadOnly`] if `name` is a computation.
    /// - [`ReactiveError::TypeMismatch`] if the cell holds another type.
    /// - [`ReactiveError::UnknownState`] if nothing is declared as `name`.
    pub fn write<T: 'static>(&self, name: &str, value: T) -> Result<()> {
        match self.cx.cell_any(name) {
            Some(any) => {
                let node = Rc::downcast::<CellNode<T>>(any).map_err(|_| {
                    ReactiveError::TypeMismatch {
                        name: name.to_owned(),
                        written: type_name::<T>(),
                    }
                })?;
                StateCell::from_node(node).set(value);
                Ok(())
            }
            None if self.cx.computations.borrow().contains_key(name) => {
                Err(ReactiveError::ReadOnly {
                    name: name.to_owned(),
                })
            }
            None => Err(ReactiveError::UnknownState {
                name: name.to_owned(),
            }),
        }
    }

    /// Declared state names, in declaration order.
    #[must_use]
    pub fn state_names(&self) -> Vec<String> {
        self.cx.cells.borrow().keys().cloned().collect()
    }

    /// Registered computation names, in registration order.
    #[must_use]
    pub fn computation_names(&self) -> Vec<String> {
        self.cx.computations.borrow().keys().cloned().collect()
    }
}
