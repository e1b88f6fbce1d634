#[derive(Debug, thiserror::Error)]
pub enum TypeError {
    #[error("unknown dialect {0:?}")]
    UnknownDialect(String),
}
