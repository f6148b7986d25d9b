#![forbid(unsafe_code)]

//! Dependency-tracked state and computed values.
//!
//! - [`StateCell`]: a named mutable value whose reads are attributed to the
//!   computation evaluating at the time.
//! - [`Computed`]: a named derived value, recomputed eagerly whenever
//!   something it read changes.
//! - [`Scope`]: one component's namespace, with name-based and typed access.
//!
//! # Architecture
//!
//! Everything is single-threaded (`Rc`, `RefCell`). Each component owns one
//! context holding its cells, its computations (in an ordered map, whose
//! index is the [`ComputationId`]) and its active-computation [`Tracker`].
//! Nodes point back at the context weakly, so dropping the last [`Scope`]
//! frees the whole graph.
//!
//! # Invariants
//!
//! 1. A dependent is recorded at most once per observable, at its first read.
//! 2. Writes notify dependents in registration order, depth-first, with no
//!    equality check.
//! 3. Only reads made while a computation evaluates record dependencies.
//! 4. Computations read as `None` until their first update.

pub mod graph;
pub mod scope;
pub mod store;
pub mod tracker;

pub use graph::{Computations, Computed};
pub use scope::Scope;
pub use store::{StateCell, StateMap};
pub use tracker::{ComputationId, Dependents, Tracker};
