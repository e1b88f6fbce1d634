use elevata_types::Dialect;

use crate::config::Config;
use crate::logging::LogArgs;

/// `elevata_load` — the full CLI surface from spec §6.
#[derive(Debug, clap::Parser)]
#[clap(name = "elevata_load", author, version, about = "Compiles and runs elevata target dataset loads")]
pub struct Cli {
    /// Name of the single target dataset to run; omit with `--all`.
    pub target_name: Option<String>,

    /// Restrict `target_name`/`--all` resolution to datasets in this target schema.
    #[arg(long)]
    pub schema: Option<String>,

    /// Run every target dataset (optionally scoped by `--schema`) in dependency order.
    #[arg(long)]
    pub all: bool,

    /// Overrides the profile/environment-resolved SQL dialect for this run.
    #[arg(long)]
    pub dialect: Option<Dialect>,

    /// Short name of the physical target system this run executes against,
    /// recorded on every `meta.load_run_log` row.
    #[arg(long = "target-system", default_value = "default")]
    pub target_system: String,

    /// Actually run DDL/DML against the execution engine; without this, SQL
    /// is only rendered (and printed unless `--no-print`).
    #[arg(long)]
    pub execute: bool,

    /// Suppress printing rendered SQL to stdout.
    #[arg(long = "no-print")]
    pub no_print: bool,

    /// Restrict execution to the named root dataset(s), ignoring upstream dependencies.
    #[arg(long = "no-deps")]
    pub no_deps: bool,

    #[arg(long = "debug-plan")]
    pub debug_plan: bool,

    #[arg(long = "debug-execution")]
    pub debug_execution: bool,

    #[arg(long = "debug-materialization")]
    pub debug_materialization: bool,

    /// Keep running subsequent datasets after one fails or is blocked.
    #[arg(long = "continue-on-error")]
    pub continue_on_error: bool,

    #[arg(long = "max-retries", default_value_t = 0)]
    pub max_retries: u32,

    /// Strip column-evolution steps from the materialization plan entirely.
    #[arg(long = "no-type-changes")]
    pub no_type_changes: bool,

    /// Block the run on any detected drift, not only narrowing/incompatible drift.
    #[arg(long = "fail-on-type-drift")]
    pub fail_on_type_drift: bool,

    /// Allow narrowing/incompatible drift to proceed via rebuild.
    #[arg(long = "allow-lossy-type-drift")]
    pub allow_lossy_type_drift: bool,

    /// Skip the plan-fingerprint staleness guard (spec §4.10).
    #[arg(long = "no-plan-guard")]
    pub no_plan_guard: bool,

    #[arg(long = "write-execution-snapshot")]
    pub write_execution_snapshot: bool,

    #[arg(long = "execution-snapshot-dir", default_value = "./execution_snapshots")]
    pub execution_snapshot_dir: String,

    /// Diff this run's results against a previously written snapshot file.
    #[arg(long = "diff-against-snapshot")]
    pub diff_against_snapshot: Option<String>,

    /// Diff this run's results against a snapshot written under
    /// `--execution-snapshot-dir` for an earlier `batch_run_id`.
    #[arg(long = "diff-against-batch-run-id")]
    pub diff_against_batch_run_id: Option<String>,

    /// Print the diff computed by either `--diff-against-*` flag.
    #[arg(long = "diff-print")]
    pub diff_print: bool,

    #[clap(flatten)]
    pub config: Config,

    #[clap(flatten)]
    pub log_args: LogArgs,
}
