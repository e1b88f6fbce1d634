mod error;
mod execution_order;
mod executor;
mod fingerprint;
mod ingest;
mod load_plan;
mod placeholders;
mod policy;
mod preflight;
mod run_log;
mod snapshot;

pub use error::OrchestratorError;

pub use execution_order::{reachable_upstream_ids, resolve_execution_order, resolve_execution_order_all};

pub use executor::{execute_plan, run_single_target_dataset, DatasetRunResult, RunDatasetArgs, RunKind};

pub use fingerprint::compute_execution_plan_fingerprint;

pub use ingest::{ConnectionDescriptor, ConnectorKind, IngestMode, IngestionDispatcher, IngestionOutcome, resolve_ingest_mode};

pub use load_plan::{build_load_plan, should_truncate_before_load, LoadMode, LoadPlan};

pub use placeholders::{apply_runtime_placeholders, needs_delta_cutoff};

pub use policy::{ExecutionPolicy, TypeDriftPolicy};

pub use preflight::{cross_system_schemas, is_comment_only_sql, looks_like_cross_system_sql};

pub use run_log::{render_insert_load_run_log, sanitize_sql_string, LoadRunLogRow, LOAD_RUN_LOG_COLUMNS};

pub use snapshot::{
    build_execution_snapshot, diff_execution_snapshots, render_execution_snapshot_diff_text, render_execution_snapshot_json,
    ExecutionSnapshot, SnapshotDiff, SnapshotDiffEntry,
};
