use thiserror::Error;

use crate::ids::{TargetDatasetId, TargetSchemaId};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("target schema {0} not found")]
    UnknownTargetSchema(TargetSchemaId),
    #[error("target dataset {0} not found")]
    UnknownTargetDataset(TargetDatasetId),
    #[error("dataset {dataset} has no query node {node}")]
    UnknownQueryNode {
        dataset: TargetDatasetId,
        node: crate::ids::QueryNodeId,
    },
}
