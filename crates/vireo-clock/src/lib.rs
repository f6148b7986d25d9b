#![forbid(unsafe_code)]

//! Analog clock built on the Vireo reactive runtime.
//!
//! [`Clock`] is a [`Component`](vireo_runtime::Component) deriving hand
//! angles from a timestamp refreshed by an interval. The `vireo-clock`
//! binary mounts one on a real-time loop and prints each published frame
//! to stdout.

pub mod cli;
pub mod clock;
pub mod error;
pub mod logging;
pub mod terminal;

pub use cli::{Cli, run, run_from_env, run_on};
pub use clock::{Clock, DEFAULT_SELECTOR, DEFAULT_TICK, WallClock, Zone, system_clock};
pub use error::{ClockError, Result};
pub use terminal::TerminalTarget;
