use thiserror::Error;

pub type Result<T> = std::result::Result<T, ReactiveError>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReactiveError {
    #[error("unknown state cell: {name}")]
    UnknownState { name: String },

    #[error("`{name}` is a computation and cannot be written")]
    ReadOnly { name: String },

    #[error("state cell `{name}` does not hold values of type {written}")]
    TypeMismatch { name: String, written: &'static str },

    #[error("`{name}` is declared both as state and as a computation")]
    DuplicateName { name: String },

    #[error("component already started")]
    AlreadyStarted,
}
