use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NameError {
    #[error("{context} must not be empty")]
    Empty { context: String },
    #[error("{context} '{name}' must match ^[a-z_][a-z0-9_]*$")]
    InvalidForm { context: String, name: String },
}
