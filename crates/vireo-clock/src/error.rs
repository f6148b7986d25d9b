use thiserror::Error;
use vireo_runtime::ReactiveError;

pub type Result<T> = std::result::Result<T, ClockError>;

#[derive(Debug, Error)]
pub enum ClockError {
    #[error("reactive runtime error: {0}")]
    Reactive(#[from] ReactiveError),

    #[error("invalid argument: {message}")]
    InvalidArgument { message: String },

    #[error("logging setup failed: {message}")]
    Logging { message: String },
}

impl ClockError {
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::InvalidArgument { .. } => 2,
            _ => 1,
        }
    }

    #[must_use]
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes() {
        assert_eq!(ClockError::invalid("tick").exit_code(), 2);
        assert_eq!(ClockError::from(ReactiveError::AlreadyStarted).exit_code(), 1);
        assert_eq!(
            ClockError::Logging {
                message: "taken".into()
            }
            .exit_code(),
            1
        );
    }

    #[test]
    fn messages() {
        assert_eq!(
            ClockError::invalid("--tick-ms must be positive").to_string(),
            "invalid argument: --tick-ms must be positive"
        );
    }
}
