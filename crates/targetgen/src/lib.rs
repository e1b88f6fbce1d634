mod bucket;
mod columns;
mod draft;
mod error;
mod hist;
mod rules;
mod service;
mod upsert;

pub use bucket::decide_consolidation_mode;
pub use columns::{
    build_surrogate_key_expression, raw_technical_columns, row_hash_column, source_identity_column,
    surrogate_key_column,
};
pub use draft::{ColumnDraftSource, ConsolidationMode, TargetColumnDraft, TargetDatasetDraft};
pub use error::TargetGenError;
pub use hist::build_hist_draft;
pub use rules::{bucket_key, consolidated_dataset_name, protect_name_conflict, raw_dataset_name, RESERVED_TECHNICAL_NAMES};
pub use service::TargetGenerationService;
pub use upsert::{resolve_upsert, UpsertDecision};
