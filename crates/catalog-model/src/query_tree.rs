use serde::{Deserialize, Serialize};

use crate::ids::{QueryNodeId, TargetColumnId, TargetDatasetId};

/// One node of a target dataset's explicit query tree. `query_root` is the
/// base select; `query_head` is the node whose output the dataset projects.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryNode {
    pub id: QueryNodeId,
    /// The single TargetDataset that owns this operator node.
    pub owner: TargetDatasetId,
    pub operator: QueryOperator,
    pub outputs: Vec<QueryNodeOutput>,
}

/// A column the node produces, available to whichever node consumes it as input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryNodeOutput {
    pub alias: String,
    pub source_column: Option<TargetColumnId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QueryOperator {
    Select(SelectNode),
    Aggregate(AggregateNode),
    Window(WindowNode),
    Union(UnionNode),
}

impl QueryOperator {
    pub fn kind(&self) -> &'static str {
        match self {
            QueryOperator::Select(_) => "select",
            QueryOperator::Aggregate(_) => "aggregate",
            QueryOperator::Window(_) => "window",
            QueryOperator::Union(_) => "union",
        }
    }
}

/// Reuses the owning dataset's classic definition (§ Logical Plan Builder).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectNode {
    /// Columns this select must expose even if not in the dataset's own
    /// declared column list, propagated down from a consuming operator.
    pub required_columns: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregateMode {
    Grouped,
    Global,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregateNode {
    pub input: QueryNodeId,
    pub mode: AggregateMode,
    pub group_keys: Vec<String>,
    pub measures: Vec<Measure>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Measure {
    pub alias: String,
    pub function: MeasureFunction,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "function", rename_all = "snake_case")]
pub enum MeasureFunction {
    CountStar,
    CountDistinct { expr: String },
    StringAgg { expr: String, delimiter: String, order_by: Vec<String> },
    Sum { expr: String },
    Min { expr: String },
    Max { expr: String },
    Avg { expr: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowNode {
    pub input: QueryNodeId,
    pub functions: Vec<WindowColumn>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowColumn {
    pub alias: String,
    pub function: String,
    pub args: Vec<String>,
    pub partition_by: Vec<String>,
    pub order_by: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SetOperator {
    Union,
    UnionAll,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnionNode {
    pub set_operator: SetOperator,
    pub output_columns: Vec<String>,
    pub branches: Vec<UnionBranch>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnionBranch {
    pub input: QueryNodeId,
    /// Maps each of `UnionNode::output_columns` to the expression (column
    /// name or DSL literal) this branch supplies it from.
    pub branch_mappings: Vec<(String, String)>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operator_kind_matches_variant() {
        let op = QueryOperator::Aggregate(AggregateNode {
            input: QueryNodeId::new(uuid::Uuid::nil()),
            mode: AggregateMode::Grouped,
            group_keys: vec!["customer_key".into()],
            measures: vec![],
        });
        assert_eq!(op.kind(), "aggregate");
    }
}
