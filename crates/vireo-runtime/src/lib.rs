#![forbid(unsafe_code)]

//! Runtime: reactive state, computed values, debounced render publishing and
//! the component lifecycle for Vireo.
//!
//! A component declares state and computations; writes to state recompute
//! everything downstream synchronously, and the synthesized `render`
//! computation publishes its latest output once per scheduling turn.

pub mod component;
pub mod error;
pub mod reactive;
pub mod render;

pub use component::{Component, Mounted, Phase, RENDER};
pub use error::{ReactiveError, Result};
pub use reactive::{ComputationId, Computations, Computed, Scope, StateCell, StateMap};
pub use render::RenderScheduler;
