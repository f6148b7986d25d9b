#![forbid(unsafe_code)]

//! Subscriber setup for the binary.

use tracing_subscriber::EnvFilter;

use crate::error::{ClockError, Result};

/// Environment variable holding the log filter directives.
pub const LOG_ENV: &str = "VIREO_LOG";

/// Directives used when [`LOG_ENV`] is unset or unparsable.
pub const DEFAULT_DIRECTIVES: &str = "warn";

/// Filter from [`LOG_ENV`], falling back to [`DEFAULT_DIRECTIVES`].
#[must_use]
pub fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES))
}

/// Install the global subscriber. Logs go to stderr; stdout is reserved for
/// rendered output.
///
/// # Errors
///
/// [`ClockError::Logging`] if a global subscriber is already installed.
pub fn init(json: bool) -> Result<()> {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr);
    let installed = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|error| ClockError::Logging {
        message: error.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_init_fails() {
        // Whichever test installs first wins; the next attempt must fail.
        let _ = init(false);
        assert!(matches!(init(true), Err(ClockError::Logging { .. })));
    }
}
