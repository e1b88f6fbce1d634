use serde::{Deserialize, Serialize};

use crate::ast::Expr;

/// A physical table in a `FROM` or `JOIN` clause.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceTable {
    pub schema: Option<String>,
    pub name: String,
    pub alias: String,
}

/// A subquery in a `FROM` or `JOIN` clause, e.g. `FROM (SELECT ...) AS u`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubquerySource {
    pub select: Box<PlanNode>,
    pub alias: String,
}

/// Either a plain table or a subquery, wherever a `FROM`/`JOIN` side may appear.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FromSource {
    Table(SourceTable),
    Subquery(SubquerySource),
}

impl FromSource {
    pub fn alias(&self) -> &str {
        match self {
            FromSource::Table(t) => &t.alias,
            FromSource::Subquery(s) => &s.alias,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectItem {
    pub expr: Expr,
    pub alias: Option<String>,
}

impl SelectItem {
    pub fn new(expr: Expr, alias: impl Into<String>) -> Self {
        Self {
            expr,
            alias: Some(alias.into()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinType {
    Inner,
    Left,
    Right,
    Full,
    Cross,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Join {
    pub left_alias: String,
    pub right: FromSource,
    pub on: Option<Expr>,
    pub join_type: JoinType,
}

/// A vendor-neutral logical `SELECT`, the output of the classic plan builder
/// or of a `Select`/`Aggregate`/`Window` query-tree node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogicalSelect {
    pub from: FromSource,
    pub joins: Vec<Join>,
    pub where_: Option<Expr>,
    pub group_by: Vec<Expr>,
    pub order_by: Vec<Expr>,
    pub select_list: Vec<SelectItem>,
    pub distinct: bool,
}

impl LogicalSelect {
    pub fn from_table(from: FromSource) -> Self {
        Self {
            from,
            joins: Vec::new(),
            where_: None,
            group_by: Vec::new(),
            order_by: Vec::new(),
            select_list: Vec::new(),
            distinct: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum UnionType {
    Union,
    All,
}

/// A `UNION`/`UNION ALL` of two or more logical selects, compiled from a
/// target dataset's `Union` query-tree node or multi-source stage bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogicalUnion {
    pub selects: Vec<PlanNode>,
    pub union_type: UnionType,
}

/// The root of a compiled logical plan: either a single select or a union.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PlanNode {
    Select(LogicalSelect),
    Union(LogicalUnion),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_source_alias_resolves_for_both_variants() {
        let table = FromSource::Table(SourceTable {
            schema: Some("raw".into()),
            name: "crm_orders".into(),
            alias: "s".into(),
        });
        assert_eq!(table.alias(), "s");

        let sub = FromSource::Subquery(SubquerySource {
            select: Box::new(PlanNode::Select(LogicalSelect::from_table(table))),
            alias: "u".into(),
        });
        assert_eq!(sub.alias(), "u");
    }
}
