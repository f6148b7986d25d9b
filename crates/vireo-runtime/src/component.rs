#![forbid(unsafe_code)]

//! Components and their lifecycle.
//!
//! A concrete component implements [`Component`]: it names its output
//! target, declares state and computations, and supplies a `created` hook and
//! a `render` function. [`Mounted`] wires it up in two explicit phases.
//!
//! # Lifecycle
//!
//! 1. [`Mounted::mount`] builds the store from
//!    [`initial_state`](Component::initial_state), the graph from
//!    [`computations`](Component::computations) plus the synthesized
//!    `render` computation, and returns. Every computation is still unset.
//! 2. [`Mounted::start`] updates every computation once in registration
//!    order, then calls [`created`](Component::created).
//!
//! [`Mounted::start_deferred`] performs step 2 on the event loop instead:
//! one microtask per computation update, queued in registration order,
//! followed by one microtask for the hook. FIFO microtask order gives the
//! same guarantee: `created` always sees every computation populated.
//!
//! # Example
//!
//! ```
//! use std::rc::Rc;
//! use vireo_core::{Document, MemoryTarget, Scheduler};
//! use vireo_runtime::{Component, Computations, Mounted, Scope, StateMap};
//!
//! struct Counter;
//!
//! impl Component for Counter {
//!     fn target(&self) -> &str {
//!         "#counter"
//!     }
//!     fn initial_state(&self) -> StateMap {
//!         StateMap::new().with("count", 0i64)
//!     }
//!     fn computations(&self) -> Computations {
//!         Computations::new().define("doubled", |s: &Scope| {
//!             s.read::<i64>("count").unwrap_or_default() * 2
//!         })
//!     }
//!     fn created(&self, _scope: &Scope) {}
//!     fn render(&self, s: &Scope) -> String {
//!         format!("<b>{}</b>", s.read::<i64>("doubled").unwrap_or_default())
//!     }
//! }
//!
//! let (scheduler, _clock) = Scheduler::lab();
//! let doc = Document::new();
//! let target = Rc::new(MemoryTarget::new());
//! doc.attach("#counter", target.clone());
//!
//! let counter = Mounted::mount(Counter, &scheduler, Rc::new(doc)).unwrap();
//! counter.start().unwrap();
//! counter.scope().write("count", 21i64).unwrap();
//! scheduler.run_until_idle();
//!
//! assert_eq!(target.content().as_deref(), Some("<b>42</b>"));
//! ```

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use vireo_core::{Scheduler, TargetLocator};

use crate::error::{ReactiveError, Result};
use crate::reactive::scope::ReactiveContext;
use crate::reactive::{Computations, Computed, Scope, StateMap};
use crate::render::RenderScheduler;

/// Name of the synthesized render computation.
pub const RENDER: &str = "render";

/// A reactive component.
///
/// Only the core calls these methods; application code talks to the
/// component through its [`Scope`].
pub trait Component: 'static {
    /// Selector of the output target. Resolved at publish time.
    fn target(&self) -> &str;

    /// Named initial values, one state cell each.
    fn initial_state(&self) -> StateMap;

    /// Named derived values.
    ///
    /// A computation named [`RENDER`] is replaced by the synthesized one,
    /// keeping its position.
    fn computations(&self) -> Computations;

    /// Runs once, after every computation has been evaluated. The usual
    /// place to start timers that write state.
    fn created(&self, scope: &Scope);

    /// Markup for the current state. Called through the render computation
    /// only.
    fn render(&self, scope: &Scope) -> String;
}

/// Where a mounted component is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Store and graph built; nothing evaluated yet.
    Mounted,
    /// First evaluation and hook queued as microtasks.
    Starting,
    /// Hook has run.
    Started,
}

/// A component wired to its store, graph and render scheduler.
pub struct Mounted<C: Component> {
    component: Rc<C>,
    scope: Scope,
    render: Rc<RenderScheduler>,
    phase: Rc<Cell<Phase>>,
}

impl<C: Component> fmt::Debug for Mounted<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mounted")
            .field("phase", &self.phase.get())
            .field("scope", &self.scope)
            .field("render", &self.render)
            .finish()
    }
}

impl<C: Component> Mounted<C> {
    /// Build the store and the graph for `component`.
    ///
    /// Output is published through `locator` on `scheduler`'s timer queue.
    ///
    /// # Errors
    ///
    /// [`ReactiveError::DuplicateName`] if a name is declared both as state
    /// and as a computation.
    pub fn mount(
        component: C,
        scheduler: &Scheduler,
        locator: Rc<dyn TargetLocator>,
    ) -> Result<Self> {
        let component = Rc::new(component);
        let state = component.initial_state();
        let mut computations = component.computations();

        let render = Rc::new(RenderScheduler::new(
            component.target(),
            locator,
            scheduler.clone(),
        ));
        computations.insert(RENDER, {
            let component = Rc::clone(&component);
            let render = Rc::clone(&render);
            move |scope: &Scope| {
                let output = component.render(scope);
                render.schedule(output.clone());
                output
            }
        });

        let scope = Scope::install(scheduler.clone(), state, computations)?;
        tracing::debug!(
            selector = component.target(),
            state = scope.state_names().len(),
            computations = scope.computation_names().len(),
            "component mounted"
        );

        Ok(Self {
            component,
            scope,
            render,
            phase: Rc::new(Cell::new(Phase::Mounted)),
        })
    }

    /// Evaluate every computation once, then run the `created` hook.
    ///
    /// # Errors
    ///
    /// [`ReactiveError::AlreadyStarted`] on any call after the first
    /// `start` or `start_deferred`.
    pub fn start(&self) -> Result<()> {
        self.begin()?;
        self.scope.update_all();
        self.component.created(&self.scope);
        self.phase.set(Phase::Started);
        tracing::debug!(selector = self.component.target(), "component started");
        Ok(())
    }

    /// Queue the first evaluation and the `created` hook as microtasks on
    /// the component's event loop.
    ///
    /// # Errors
    ///
    /// [`ReactiveError::AlreadyStarted`] on any call after the first
    /// `start` or `start_deferred`.
    pub fn start_deferred(&self) -> Result<()> {
        self.begin()?;
        let scheduler = self.scope.scheduler();

        for id in self.scope.computation_ids() {
            let cx = Rc::clone(self.scope.context());
            scheduler.queue_microtask(move || ReactiveContext::update(&cx, id));
        }

        let component = Rc::clone(&self.component);
        let scope = self.scope.clone();
        let phase = Rc::clone(&self.phase);
        scheduler.queue_microtask(move || {
            component.created(&scope);
            phase.set(Phase::Started);
            tracing::debug!(selector = component.target(), "component started");
        });
        Ok(())
    }

    /// Leave [`Phase::Mounted`], exactly once.
    fn begin(&self) -> Result<()> {
        match self.phase.replace(Phase::Starting) {
            Phase::Mounted => Ok(()),
            previous @ (Phase::Starting | Phase::Started) => {
                self.phase.set(previous);
                Err(ReactiveError::AlreadyStarted)
            }
        }
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase.get()
    }

    /// The component's namespace.
    #[must_use]
    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    #[must_use]
    pub fn component(&self) -> &C {
        &self.component
    }

    /// The component's debounced publisher.
    #[must_use]
    pub fn render_scheduler(&self) -> &RenderScheduler {
        &self.render
    }

    /// Handle to the synthesized render computation.
    #[must_use]
    pub fn render_computation(&self) -> Option<Computed<String>> {
        self.scope.computed::<String>(RENDER)
    }

    /// Latest render output, `None` before the first evaluation.
    #[must_use]
    pub fn output(&self) -> Option<String> {
        self.render_computation()
            .and_then(|render| render.with(|out| out.cloned()))
    }
}
