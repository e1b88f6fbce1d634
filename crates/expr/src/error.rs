use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DslError {
    #[error("unsupported DSL expression: {0:?}")]
    Unsupported(String),
    #[error("COALESCE must have exactly 2 arguments, got {0}")]
    CoalesceArity(usize),
}
