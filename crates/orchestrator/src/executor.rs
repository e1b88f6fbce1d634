use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use elevata_catalog_model::{Catalog, MaterializationKind, TargetDataset};
use elevata_dialect::SqlDialect;
use elevata_materialize::{apply_materialization_plan, build_materialization_plan, ExecutionEngine, MaterializationOp, MaterializationPolicy, TableIntrospector};

use crate::error::OrchestratorError;
use crate::ingest::{resolve_ingest_mode, ConnectionDescriptor, ConnectorKind, IngestMode, IngestionDispatcher};
use crate::load_plan::{build_load_plan, should_truncate_before_load};
use crate::placeholders::{apply_runtime_placeholders, needs_delta_cutoff};
use crate::policy::TypeDriftPolicy;
use crate::preflight::{cross_system_schemas, is_comment_only_sql};
use crate::run_log::sanitize_sql_string;

/// The shape of work a [`DatasetRunResult`] reports on, mirroring the
/// Python result dict's `"kind"` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunKind {
    /// A rendered-SQL dataset (stage/rawcore/bizcore/serving).
    Sql,
    /// A RAW dataset executed via the ingestion dispatcher.
    Ingestion,
    /// Stopped by a preflight guardrail before any engine call.
    Preflight,
    /// Skipped because an upstream dataset in the same run failed.
    Blocked,
    Aborted,
}

/// Outcome of running one dataset once (one attempt), the Rust mirror of
/// the Python `run_single_target_dataset` result dict.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetRunResult {
    pub status: String,
    pub kind: RunKind,
    pub dataset: String,
    pub message: Option<String>,
    pub rows_affected: Option<i64>,
    pub load_run_id: String,
    pub sql_length: i64,
    pub render_ms: f64,
    pub execution_ms: f64,
    pub attempt_no: i32,
    pub status_reason: Option<String>,
    pub blocked_by: Option<String>,
    /// The fully rendered SQL text, when a `RunKind::Sql` dataset got far
    /// enough to render one. Lets a CLI print the statement without the
    /// orchestrator core depending on any particular output format.
    pub rendered_sql: Option<String>,
}

impl DatasetRunResult {
    fn dataset_key(catalog: &dyn Catalog, dataset: &TargetDataset) -> String {
        let schema = catalog.target_schema(dataset.schema).map(|s| s.short_name.as_str()).unwrap_or("?");
        format!("{schema}.{}", dataset.name)
    }

    pub fn blocked(catalog: &dyn Catalog, dataset: &TargetDataset, load_run_id: String, blocked_by: String) -> Self {
        Self {
            status: "skipped".to_string(),
            kind: RunKind::Blocked,
            dataset: Self::dataset_key(catalog, dataset),
            message: Some(format!("blocked: upstream dataset {blocked_by} failed")),
            rows_affected: None,
            load_run_id,
            sql_length: 0,
            render_ms: 0.0,
            execution_ms: 0.0,
            attempt_no: 1,
            status_reason: Some("upstream_failure".to_string()),
            blocked_by: Some(blocked_by),
            rendered_sql: None,
        }
    }
}

/// Everything `run_single_target_dataset` needs beyond the dataset itself.
/// Grouped into one struct so the function signature stays manageable; each
/// field is an external collaborator seam (engine, introspector, dispatcher)
/// except the plain config values.
pub struct RunDatasetArgs<'a> {
    pub catalog: &'a dyn Catalog,
    pub dialect: &'a dyn SqlDialect,
    pub engine: Option<&'a mut dyn ExecutionEngine>,
    pub introspector: Option<&'a dyn TableIntrospector>,
    pub ingestion: Option<&'a mut dyn IngestionDispatcher>,
    pub environment: &'a str,
    pub meta_schema: &'a str,
    pub materialization_policy: &'a MaterializationPolicy,
    pub type_drift_policy: TypeDriftPolicy,
    pub chunk_size: usize,
    pub execute: bool,
    pub batch_run_id: String,
    pub load_run_id: String,
    pub attempt_no: i32,
}

/// Executes one dataset for one attempt: ingestion for RAW, otherwise
/// render + preflight + execute. Grounded on the Python function of the
/// same name (spec §4.10 step list).
pub fn run_single_target_dataset(dataset: &TargetDataset, args: RunDatasetArgs<'_>) -> Result<DatasetRunResult, OrchestratorError> {
    let RunDatasetArgs {
        catalog,
        dialect,
        mut engine,
        introspector,
        mut ingestion,
        environment,
        meta_schema,
        materialization_policy,
        type_drift_policy,
        chunk_size,
        execute,
        batch_run_id,
        load_run_id,
        attempt_no,
    } = args;

    let schema = catalog
        .target_schema(dataset.schema)
        .ok_or_else(|| OrchestratorError::NameValidationError(format!("dataset {} has no target schema", dataset.name)))?;
    let dataset_key = format!("{}.{}", schema.short_name, dataset.name);

    if schema.short_name == "raw" {
        return run_raw_ingestion(catalog, dataset, &dataset_key, load_run_id, attempt_no, ingestion.as_deref_mut(), chunk_size);
    }

    let load_plan = build_load_plan(dataset, &schema.short_name);

    let mut did_provision = false;
    if execute && matches!(schema.materialization, MaterializationKind::Table | MaterializationKind::Incremental) {
        if let (Some(engine_ref), Some(introspector_ref)) = (engine.as_deref_mut(), introspector) {
            let introspected = introspector_ref.introspect_target(&schema.short_name, &dataset.name, &dataset.former_names)?;
            let mut plan = build_materialization_plan(dataset, &schema.short_name, introspected.as_ref(), dialect, materialization_policy)?;

            if type_drift_policy.no_type_changes {
                plan.drop_ops(&[
                    MaterializationOp::AlterColumnType,
                    MaterializationOp::DropTableIfExists,
                    MaterializationOp::CreateTable,
                    MaterializationOp::InsertSelect,
                    MaterializationOp::DropTable,
                    MaterializationOp::RenameTable,
                ]);
            }
            if type_drift_policy.fail_on_type_drift && !plan.warnings.is_empty() && plan.blocking_errors.is_empty() {
                plan.blocking_errors.push(format!("TYPE_DRIFT_STRICT:{dataset_key}"));
            }

            let is_full_refresh = should_truncate_before_load(&load_plan, &schema.short_name, &dataset.name, false);
            if is_full_refresh {
                plan.blocking_errors.retain(|e| !e.starts_with("UNSAFE_TYPE_DRIFT:") && !e.starts_with("UNSUPPORTED_TYPE_EVOLUTION:"));
            }
            if type_drift_policy.allow_lossy_type_drift {
                plan.blocking_errors.retain(|e| !e.starts_with("UNSAFE_TYPE_DRIFT:"));
            }

            if !plan.blocking_errors.is_empty() {
                return Ok(DatasetRunResult {
                    status: "blocked".to_string(),
                    kind: RunKind::Preflight,
                    dataset: dataset_key,
                    message: Some(plan.blocking_errors.join("; ")),
                    rows_affected: None,
                    load_run_id,
                    sql_length: 0,
                    render_ms: 0.0,
                    execution_ms: 0.0,
                    attempt_no,
                    status_reason: Some("type_drift".to_string()),
                    blocked_by: None,
                    rendered_sql: None,
                });
            }

            did_provision = plan.did_provision();
            apply_materialization_plan(&plan, engine_ref)?;
        }
    }

    let render_started_at = Utc::now();
    let plan_node = elevata_planner::compile(catalog, dataset)?;
    let sql = dialect.render_plan(&plan_node)?;
    let render_ms = (Utc::now() - render_started_at).num_microseconds().unwrap_or(0) as f64 / 1000.0;
    let sql_length = sql.len() as i64;

    if !execute {
        return Ok(DatasetRunResult {
            status: "dry_run".to_string(),
            kind: RunKind::Sql,
            dataset: dataset_key,
            message: None,
            rows_affected: None,
            load_run_id,
            sql_length,
            render_ms,
            execution_ms: 0.0,
            attempt_no,
            status_reason: None,
            blocked_by: None,
            rendered_sql: Some(sql.clone()),
        });
    }

    if is_comment_only_sql(&sql) {
        return Ok(preflight_block(dataset_key, load_run_id, attempt_no, format!("non-executable SQL rendered: {sql}"), Some(sql)));
    }

    let cross_system = cross_system_schemas(&sql, &schema.short_name);
    if !cross_system.is_empty() {
        return Ok(preflight_block(
            dataset_key,
            load_run_id,
            attempt_no,
            format!("SQL references disallowed schemas: {}", cross_system.join(", ")),
            Some(sql),
        ));
    }

    let Some(engine_ref) = engine.as_deref_mut() else {
        return Err(OrchestratorError::EngineExecutionError("missing execution engine in execute mode".to_string()));
    };

    if should_truncate_before_load(&load_plan, &schema.short_name, &dataset.name, schema.materialization == MaterializationKind::View)
        && !did_provision
    {
        engine_ref.execute(&dialect.render_truncate_table(&schema.short_name, &dataset.name))?;
    }

    let delta_cutoff = if needs_delta_cutoff(&sql) {
        let source_id = load_plan.incremental_source.ok_or_else(|| OrchestratorError::MissingIncrementPolicy {
            dataset: dataset_key.clone(),
            environment: environment.to_string(),
        })?;
        let source = catalog.source_dataset(source_id).ok_or_else(|| OrchestratorError::MissingIncrementPolicy {
            dataset: dataset_key.clone(),
            environment: environment.to_string(),
        })?;
        let policy = source.active_increment_policy(environment).ok_or_else(|| OrchestratorError::MissingIncrementPolicy {
            dataset: dataset_key.clone(),
            environment: environment.to_string(),
        })?;
        Some(policy.delta_cutoff.clone().ok_or_else(|| OrchestratorError::MissingIncrementPolicy {
            dataset: dataset_key.clone(),
            environment: environment.to_string(),
        })?)
    } else {
        None
    };

    let exec_started_at = Utc::now();
    let exec_ts = Utc::now();
    let sql_exec = apply_runtime_placeholders(&sql, dialect, &load_run_id, exec_ts, delta_cutoff.as_deref());

    let (status, message, rows_affected) = match engine_ref.execute(&sql_exec) {
        Ok(rows) => ("success".to_string(), None, rows.map(|r| r as i64)),
        Err(e) => ("error".to_string(), Some(sanitize_sql_string(&e.to_string(), 1500)), None),
    };
    let execution_ms = (Utc::now() - exec_started_at).num_microseconds().unwrap_or(0) as f64 / 1000.0;

    Ok(DatasetRunResult {
        status,
        kind: RunKind::Sql,
        dataset: dataset_key,
        message,
        rows_affected,
        load_run_id,
        sql_length,
        render_ms,
        execution_ms,
        attempt_no,
        status_reason: None,
        blocked_by: None,
        rendered_sql: Some(sql),
    })
}

fn preflight_block(dataset_key: String, load_run_id: String, attempt_no: i32, message: String, rendered_sql: Option<String>) -> DatasetRunResult {
    DatasetRunResult {
        status: "blocked".to_string(),
        kind: RunKind::Preflight,
        dataset: dataset_key,
        message: Some(message),
        rows_affected: None,
        load_run_id,
        sql_length: 0,
        render_ms: 0.0,
        execution_ms: 0.0,
        attempt_no,
        status_reason: Some("preflight".to_string()),
        blocked_by: None,
        rendered_sql,
    }
}

fn run_raw_ingestion(
    catalog: &dyn Catalog,
    dataset: &TargetDataset,
    dataset_key: &str,
    load_run_id: String,
    attempt_no: i32,
    ingestion: Option<&mut dyn IngestionDispatcher>,
    chunk_size: usize,
) -> Result<DatasetRunResult, OrchestratorError> {
    let source_id = dataset.inputs.iter().find_map(|input| match input.source {
        elevata_catalog_model::DatasetInputSource::Source(id) => Some(id),
        elevata_catalog_model::DatasetInputSource::UpstreamTarget(_) => None,
    });
    let Some(source_id) = source_id else {
        return Ok(skipped_raw(dataset_key, load_run_id, attempt_no, "no SourceDataset input found for this RAW target"));
    };
    let Some(source_dataset) = catalog.source_dataset(source_id) else {
        return Ok(skipped_raw(dataset_key, load_run_id, attempt_no, "referenced SourceDataset is not in the catalog"));
    };
    let Some(source_system) = catalog.source_system(source_dataset.source_system) else {
        return Ok(skipped_raw(dataset_key, load_run_id, attempt_no, "referenced SourceSystem is not in the catalog"));
    };

    match resolve_ingest_mode(source_system, source_dataset) {
        IngestMode::None => Ok(skipped_raw(dataset_key, load_run_id, attempt_no, "include_ingest='none' (no ingestion mode)")),
        IngestMode::External => Ok(DatasetRunResult {
            status: "success".to_string(),
            kind: RunKind::Ingestion,
            dataset: dataset_key.to_string(),
            message: Some("external ingestion: assuming RAW is populated out-of-band".to_string()),
            rows_affected: None,
            load_run_id,
            sql_length: 0,
            render_ms: 0.0,
            execution_ms: 0.0,
            attempt_no,
            status_reason: None,
            blocked_by: None,
            rendered_sql: None,
        }),
        IngestMode::Native => {
            let Some(dispatcher) = ingestion else {
                return Err(OrchestratorError::EngineExecutionError("missing ingestion dispatcher for native RAW ingest".to_string()));
            };
            let connector = ConnectorKind::for_system_kind(&source_system.kind);
            let started_at = Utc::now();
            let outcome = dispatcher.ingest(connector, source_dataset, &ConnectionDescriptor::default(), chunk_size)?;
            let execution_ms = (Utc::now() - started_at).num_microseconds().unwrap_or(0) as f64 / 1000.0;
            Ok(DatasetRunResult {
                status: "success".to_string(),
                kind: RunKind::Ingestion,
                dataset: dataset_key.to_string(),
                message: outcome.cursor_advanced_to,
                rows_affected: Some(outcome.rows_ingested as i64),
                load_run_id,
                sql_length: 0,
                render_ms: 0.0,
                execution_ms,
                attempt_no,
                status_reason: None,
                blocked_by: None,
                rendered_sql: None,
            })
        }
    }
}

fn skipped_raw(dataset_key: &str, load_run_id: String, attempt_no: i32, reason: &str) -> DatasetRunResult {
    DatasetRunResult {
        status: "skipped".to_string(),
        kind: RunKind::Ingestion,
        dataset: dataset_key.to_string(),
        message: Some(reason.to_string()),
        rows_affected: None,
        load_run_id,
        sql_length: 0,
        render_ms: 0.0,
        execution_ms: 0.0,
        attempt_no,
        status_reason: None,
        blocked_by: None,
        rendered_sql: None,
    }
}

/// Runs `execution_order` start to finish against `run_one`, honoring
/// `continue_on_error`/`max_retries`. Returns every dataset's final result
/// plus whether any dataset ended in error or a preflight block.
pub fn execute_plan<'a>(
    execution_order: &[&'a TargetDataset],
    catalog: &dyn Catalog,
    continue_on_error: bool,
    max_retries: u32,
    mut run_one: impl FnMut(&'a TargetDataset, i32) -> Result<DatasetRunResult, OrchestratorError>,
) -> (Vec<DatasetRunResult>, bool) {
    let mut results = Vec::with_capacity(execution_order.len());
    let mut had_error = false;
    let mut blocked_after: Option<String> = None;

    for dataset in execution_order {
        if let Some(upstream) = &blocked_after {
            if !continue_on_error {
                results.push(DatasetRunResult::blocked(catalog, dataset, String::new(), upstream.clone()));
                continue;
            }
        }

        let mut attempt = 1i32;
        let result = loop {
            match run_one(dataset, attempt) {
                Ok(r) => break r,
                Err(e) => {
                    if (attempt as u32) <= max_retries {
                        attempt += 1;
                        continue;
                    }
                    break preflight_block(
                        DatasetRunResult::dataset_key(catalog, dataset),
                        String::new(),
                        attempt,
                        e.to_string(),
                        None,
                    );
                }
            }
        };

        let is_error = result.status == "error" || (result.status == "blocked" && result.kind == RunKind::Preflight);
        if is_error {
            had_error = true;
            blocked_after = Some(result.dataset.clone());
        }
        results.push(result);
    }

    (results, had_error)
}
