use thiserror::Error;

#[derive(Debug, Error)]
pub enum DialectError {
    #[error("unknown dialect short name: {0}")]
    UnknownDialect(String),
    #[error("{op} requires at least one key column")]
    MissingKeyColumns { op: &'static str },
    #[error("missing expr binding for {0} in raw SQL template")]
    MissingExprBinding(String),
    #[error("STRING_AGG requires at least 2 arguments (value, delimiter)")]
    StringAggArity,
    #[error("STRING_AGG with ORDER BY is not supported by the {0} dialect")]
    StringAggOrderByUnsupported(&'static str),
}
