use thiserror::Error;

use elevata_dialect::DialectError;

#[derive(Debug, Error)]
pub enum MaterializeError {
    #[error(transparent)]
    Dialect(#[from] DialectError),
    #[error("introspecting {schema}.{table} failed: {reason}")]
    Introspection { schema: String, table: String, reason: String },
    #[error("executing materialization step failed: {0}")]
    Execution(String),
    #[error("{schema}.{table} has no active columns to materialize")]
    NoActiveColumns { schema: String, table: String },
}
