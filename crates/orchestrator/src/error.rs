use elevata_catalog_model::TargetDatasetId;
use thiserror::Error;

use elevata_dialect::DialectError;
use elevata_materialize::MaterializeError;
use elevata_planner::PlannerError;

/// The orchestrator's error taxonomy. Every run-stopping condition in
/// `run_single_target_dataset` and the surrounding execution loop maps to
/// exactly one of these.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("name validation failed: {0}")]
    NameValidationError(String),
    #[error("surrogate DSL parse error: {0}")]
    DslParseError(#[from] elevata_expr::DslError),
    #[error("type drift blocked for {schema}.{table}: {reason}")]
    TypeDriftBlocked { schema: String, table: String, reason: String },
    #[error("dialect cannot evolve {schema}.{table} and rebuild was not permitted: {reason}")]
    UnsupportedTypeEvolution { schema: String, table: String, reason: String },
    #[error("execution plan is stale: expected fingerprint {expected}, got {actual} at {dataset}")]
    ExecutionPlanStale { dataset: String, expected: String, actual: String },
    #[error("rendered SQL for {dataset} references schemas outside the allowed set: {schemas:?}")]
    PreflightCrossSystemSql { dataset: String, schemas: Vec<String> },
    #[error("rendered SQL for {0} has no executable statement")]
    PreflightCommentOnlySql(String),
    #[error("engine execution failed: {0}")]
    EngineExecutionError(String),
    #[error("SQL for {dataset} contains {{{{DELTA_CUTOFF}}}} but no active increment policy exists for environment '{environment}'")]
    MissingIncrementPolicy { dataset: String, environment: String },
    #[error("introspection failed for {schema}.{table}: {reason}")]
    IntrospectionError { schema: String, table: String, reason: String },
    #[error("dataset {0} was blocked because an upstream dataset failed and continue_on_error=false")]
    OrchestrationBlocked(TargetDatasetId),
    #[error(transparent)]
    Planner(#[from] PlannerError),
    #[error(transparent)]
    Dialect(#[from] DialectError),
    #[error(transparent)]
    Materialize(#[from] MaterializeError),
}
