#![forbid(unsafe_code)]

//! Core: the single-threaded event loop and the output targets rendered
//! markup is published to.

pub mod scheduler;
pub mod target;

pub use scheduler::{LabClock, MIN_INTERVAL, Scheduler, TimerId};
pub use target::{Document, MemoryTarget, OutputTarget, TargetLocator};
pub use web_time::Duration;
