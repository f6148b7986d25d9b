#![forbid(unsafe_code)]

//! Debounced publishing of render output.
//!
//! Every time a component's render computation runs it hands its output to
//! the component's [`RenderScheduler`]. The scheduler keeps at most one
//! zero-delay timer armed: a new output cancels the pending timer and arms a
//! fresh one carrying the new output.
//!
//! # Coalescing Rules
//!
//! - Renders within one scheduling turn collapse into a single publish of
//!   the **latest** output (intermediate outputs are dropped).
//! - Renders separated by an idle turn each publish.
//! - The target is looked up when the timer fires, not when it is armed.
//!   If nothing is attached under the selector the publish is skipped,
//!   without retry and without error.
//!
//! The pending timer is private to the scheduler; nothing else can cancel
//! or re-arm it.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use vireo_core::{Duration, Scheduler, TargetLocator, TimerId};

/// Owner of one component's pending publish.
pub struct RenderScheduler {
    selector: Rc<str>,
    locator: Rc<dyn TargetLocator>,
    scheduler: Scheduler,
    pending: Rc<Cell<Option<TimerId>>>,
    publishes: Rc<Cell<u64>>,
}

impl fmt::Debug for RenderScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderScheduler")
            .field("selector", &self.selector)
            .field("pending", &self.pending.get())
            .field("publishes", &self.publishes.get())
            .finish()
    }
}

impl RenderScheduler {
    /// Create a scheduler publishing to whatever `locator` finds under
    /// `selector`.
    pub fn new(
        selector: impl Into<Rc<str>>,
        locator: Rc<dyn TargetLocator>,
        scheduler: Scheduler,
    ) -> Self {
        Self {
            selector: selector.into(),
            locator,
            scheduler,
            pending: Rc::new(Cell::new(None)),
            publishes: Rc::new(Cell::new(0)),
        }
    }

    /// Cancel the pending publish, if any, and arm one for `output`.
    pub fn schedule(&self, output: String) {
        if let Some(previous) = self.pending.take() {
            self.scheduler.clear_timer(previous);
        }

        let selector = Rc::clone(&self.selector);
        let locator = Rc::clone(&self.locator);
        let pending = Rc::clone(&self.pending);
        let publishes = Rc::clone(&self.publishes);
        let id = self.scheduler.set_timeout(Duration::ZERO, move || {
            pending.set(None);
            if let Some(target) = locator.locate(&selector) {
                target.replace_content(&output);
                publishes.set(publishes.get() + 1);
                tracing::debug!(
                    selector = %selector,
                    bytes = output.len(),
                    "render published"
                );
            }
        });
        tracing::trace!(selector = %self.selector, %id, "publish armed");
        self.pending.set(Some(id));
    }

    /// Selector the output is published under.
    #[must_use]
    pub fn selector(&self) -> &str {
        &self.selector
    }

    /// Whether a publish is armed and has not fired yet.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending.get().is_some()
    }

    /// Number of publishes that reached a target.
    #[must_use]
    pub fn publishes(&self) -> u64 {
        self.publishes.get()
    }
}
