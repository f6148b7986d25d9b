#![forbid(unsafe_code)]

//! Vireo public facade crate.
//!
//! Components declare named state and computations; writes recompute
//! dependents synchronously and render output is published once per
//! scheduling turn.

pub use vireo_core as core;
pub use vireo_runtime as runtime;

#[cfg(feature = "clock")]
pub use vireo_clock as clock;

pub mod prelude {
    pub use vireo_core::{
        Document, Duration, LabClock, MemoryTarget, OutputTarget, Scheduler, TargetLocator,
        TimerId,
    };
    pub use vireo_runtime::{
        Component, Computations, Computed, Mounted, Phase, ReactiveError, Scope, StateCell,
        StateMap,
    };
}
