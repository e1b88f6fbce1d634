mod catalog;
mod error;
mod ids;
mod query_tree;
mod source;
mod target;

pub use catalog::{Catalog, CatalogSnapshot};
pub use error::CatalogError;
pub use ids::{
    QueryNodeId, SourceColumnId, SourceDatasetGroupId, SourceDatasetId, SourceSystemId,
    TargetColumnId, TargetColumnInputId, TargetDatasetId, TargetDatasetInputId,
    TargetDatasetJoinId, TargetDatasetReferenceId, TargetSchemaId,
};
pub use query_tree::{
    AggregateMode, AggregateNode, Measure, MeasureFunction, QueryNode, QueryNodeOutput,
    QueryOperator, SelectNode, SetOperator, UnionBranch, UnionNode, WindowColumn, WindowNode,
};
pub use source::{
    IncrementPolicy, SourceColumn, SourceDataset, SourceDatasetGroup,
    SourceDatasetGroupMembership, SourceSystem,
};
pub use target::{
    CombinationMode, ColumnInputSource, DatasetInputSource, HashAlgorithm, IncrementalStrategy,
    InputRole, JoinPredicate, JoinType, KeyComponent, MaterializationKind, SurrogateKeyPolicy,
    SystemRole, TargetColumn, TargetColumnInput, TargetDataset, TargetDatasetInput,
    TargetDatasetJoin, TargetDatasetReference, TargetSchema,
};
