mod ast;
mod dsl;
mod error;
mod plan;

pub use ast::{
    Expr, Literal, OrderByExpr, OrderDirection, RawSql, WindowFunction, WindowSpec,
};
pub use dsl::parse as parse_dsl;
pub use error::DslError;
pub use plan::{
    FromSource, Join, JoinType, LogicalSelect, LogicalUnion, PlanNode, SelectItem, SourceTable,
    SubquerySource, UnionType,
};
