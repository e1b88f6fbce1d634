//! Wires the modules built under `crates/elevata-cli/src` into one run of
//! `elevata_load`, the way `crates/flowctl/src/lib.rs` wires its subcommands
//! together: parse once, resolve configuration, dispatch, report.

use std::collections::HashSet;

use anyhow::Context;
use chrono::Utc;
use uuid::Uuid;

use elevata_catalog_model::Catalog;
use elevata_materialize::{ExecutionEngine, MaterializationPolicy, TableIntrospector};
use elevata_orchestrator::{
    build_execution_snapshot, build_load_plan, compute_execution_plan_fingerprint, diff_execution_snapshots, execute_plan,
    render_execution_snapshot_diff_text, render_insert_load_run_log, resolve_execution_order_all, run_single_target_dataset,
    ExecutionPolicy, LoadRunLogRow, OrchestratorError, RunDatasetArgs, TypeDriftPolicy,
};
use elevata_types::Dialect;

use crate::catalog_loader::load_catalog_snapshot;
use crate::cli_args::Cli;
use crate::config::Profile;
use crate::dataset_select::select_roots;
use crate::engine::{try_insert_load_run_log, PostgresEngine};
use crate::{logging, snapshot_io, summary};

/// Runs one `elevata_load` invocation end to end and returns the process exit
/// code: `0` if every dataset succeeded (or was a clean dry run), non-zero if
/// anything errored or was preflight-blocked.
pub async fn run(cli: Cli) -> anyhow::Result<i32> {
    logging::init_logging(&cli.log_args);

    let catalog = load_catalog_snapshot(&cli.config.catalog_path)?;
    let profile = Profile::resolve(&cli.config, cli.dialect)?;
    let dialect_renderer = elevata_dialect::for_dialect(profile.dialect);

    let roots = select_roots(&catalog, cli.target_name.as_deref(), cli.schema.as_deref(), cli.all)?;
    let execution_order = if cli.no_deps { roots.clone() } else { resolve_execution_order_all(&catalog, &roots)? };
    let root_dataset_key = roots.iter().map(|d| d.name.as_str()).collect::<Vec<_>>().join(",");

    let baseline_fingerprint = compute_execution_plan_fingerprint(&catalog, &execution_order);
    let batch_run_id = Uuid::new_v4().to_string();

    let materialization_policy = MaterializationPolicy {
        sync_schema_shorts: ["stage", "rawcore", "bizcore", "serving"].iter().map(|s| s.to_string()).collect::<HashSet<_>>(),
        auto_provision_tables: profile.auto_provision_tables,
        debug_plan: cli.debug_plan,
        allow_lossy_type_drift: cli.allow_lossy_type_drift,
    };
    let type_drift_policy = TypeDriftPolicy {
        no_type_changes: cli.no_type_changes,
        fail_on_type_drift: cli.fail_on_type_drift,
        allow_lossy_type_drift: cli.allow_lossy_type_drift,
    };

    let mut engine_exec: Option<PostgresEngine> = None;
    if cli.execute {
        match profile.dialect {
            Dialect::Postgres => {
                let url = cli
                    .config
                    .database_url
                    .clone()
                    .context("--execute against the postgres dialect requires --database-url or DATABASE_URL")?;
                engine_exec = Some(PostgresEngine::connect(&url).await?);
            }
            other => {
                anyhow::bail!("no execution engine is wired for dialect {other} in this build; omit --execute to render SQL only")
            }
        }
    }
    // A second handle over the same pool: `RunDatasetArgs` needs a `&mut dyn
    // ExecutionEngine` and a `&dyn TableIntrospector` at once, and those
    // can't both borrow from one `Option<PostgresEngine>`.
    let engine_introspect = engine_exec.clone();

    let (results, had_error) = execute_plan(&execution_order, &catalog, cli.continue_on_error, cli.max_retries, |dataset, attempt_no| {
        if !cli.no_plan_guard {
            let current_fingerprint = compute_execution_plan_fingerprint(&catalog, &execution_order);
            if current_fingerprint != baseline_fingerprint {
                return Err(OrchestratorError::ExecutionPlanStale {
                    dataset: dataset.name.clone(),
                    expected: baseline_fingerprint.clone(),
                    actual: current_fingerprint,
                });
            }
        }

        let load_run_id = Uuid::new_v4().to_string();
        let started_at = Utc::now();
        let args = RunDatasetArgs {
            catalog: &catalog,
            dialect: dialect_renderer.as_ref(),
            engine: engine_exec.as_mut().map(|e| e as &mut dyn ExecutionEngine),
            introspector: engine_introspect.as_ref().map(|e| e as &dyn TableIntrospector),
            ingestion: None,
            environment: &profile.name,
            meta_schema: &profile.meta_schema,
            materialization_policy: &materialization_policy,
            type_drift_policy,
            chunk_size: 10_000,
            execute: cli.execute,
            batch_run_id: batch_run_id.clone(),
            load_run_id,
            attempt_no,
        };

        let result = run_single_target_dataset(dataset, args)?;

        if !cli.no_print {
            if let Some(sql) = &result.rendered_sql {
                println!("-- {}\n{sql}\n", result.dataset);
            }
        }

        tracing::info!(
            dataset = %result.dataset,
            status = %result.status,
            batch_run_id = %batch_run_id,
            load_run_id = %result.load_run_id,
            attempt = result.attempt_no,
            "ran target dataset",
        );

        if let Some(engine_ref) = engine_exec.as_mut() {
            let schema_short = catalog.target_schema(dataset.schema).map(|s| s.short_name.clone()).unwrap_or_default();
            let load_plan = build_load_plan(dataset, &schema_short);
            let log_row = LoadRunLogRow {
                batch_run_id: batch_run_id.clone(),
                load_run_id: result.load_run_id.clone(),
                target_schema: schema_short,
                target_dataset: dataset.name.clone(),
                target_system: cli.target_system.clone(),
                profile: profile.name.clone(),
                mode: load_plan.mode.as_str().to_string(),
                handle_deletes: dataset.handle_deletes,
                historize: dataset.historize,
                started_at,
                finished_at: Utc::now(),
                render_ms: result.render_ms,
                execution_ms: result.execution_ms,
                sql_length: result.sql_length,
                rows_affected: result.rows_affected,
                status: result.status.clone(),
                status_reason: result.status_reason.clone(),
                attempt_no: result.attempt_no,
                blocked_by: result.blocked_by.clone(),
                error_message: result.message.clone(),
            };
            let log_sql = render_insert_load_run_log(dialect_renderer.as_ref(), &profile.meta_schema, &log_row);
            try_insert_load_run_log(engine_ref, &log_sql);
        }

        Ok(result)
    });

    summary::print_summary(&results);

    let snapshot = build_execution_snapshot(
        batch_run_id.clone(),
        Utc::now(),
        &ExecutionPolicy { continue_on_error: cli.continue_on_error, max_retries: cli.max_retries },
        cli.execute,
        cli.no_deps,
        profile.name.clone(),
        cli.target_system.clone(),
        profile.dialect.short_name().to_string(),
        dialect_renderer.name().to_string(),
        root_dataset_key,
        results,
        had_error,
    );

    if cli.write_execution_snapshot {
        let path = snapshot_io::write_execution_snapshot(&cli.execution_snapshot_dir, &snapshot)?;
        tracing::info!(path = %path.display(), "wrote execution snapshot");
    }

    if cli.diff_against_snapshot.is_some() || cli.diff_against_batch_run_id.is_some() {
        let other_path = match (&cli.diff_against_snapshot, &cli.diff_against_batch_run_id) {
            (Some(path), _) => path.clone(),
            (None, Some(id)) => snapshot_io::snapshot_file_path(&cli.execution_snapshot_dir, id).to_string_lossy().into_owned(),
            (None, None) => unreachable!("guarded by the enclosing if"),
        };
        let other = snapshot_io::read_execution_snapshot(&other_path)?;
        let diff = diff_execution_snapshots(&other, &snapshot);
        if cli.diff_print {
            println!("{}", render_execution_snapshot_diff_text(&diff, &other.batch_run_id, &snapshot.batch_run_id));
        }
    }

    Ok(if had_error { 1 } else { 0 })
}
