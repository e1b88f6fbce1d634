use elevata_catalog_model::{SourceDatasetId, TargetColumnId, TargetDatasetId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlannerError {
    #[error("target dataset {0} has no upstream input to build a FROM clause from")]
    NoUpstreamInput(TargetDatasetId),
    #[error("source dataset {0} referenced by an input is not in the catalog")]
    UnknownSourceDataset(SourceDatasetId),
    #[error("dataset {0} declares a query_head but the referenced query node is missing from the catalog")]
    MissingQueryNode(TargetDatasetId),
    #[error("column {0} has no surrogate_expression to compile")]
    MissingSurrogateExpression(TargetColumnId),
    #[error("reference's parent dataset has no active surrogate key column")]
    ParentMissingSurrogateKey,
    #[error("reference has no key components defined")]
    EmptyKeyComponents,
    #[error("dsl error: {0}")]
    Dsl(#[from] elevata_expr::DslError),
    #[error("join #{0} on dataset {1} has no predicates but is not a CROSS join")]
    JoinMissingPredicates(i32, TargetDatasetId),
    #[error("unknown column reference {0:?} while building plan for dataset {1}")]
    UnknownColumn(String, TargetDatasetId),
}
