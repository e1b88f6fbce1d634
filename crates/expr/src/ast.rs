use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A vendor-neutral SQL expression tree. Every logical plan column maps to
/// exactly one of these; dialect renderers turn it into concrete SQL text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "node")]
pub enum Expr {
    Literal(Literal),
    ColumnRef {
        table_alias: Option<String>,
        column_name: String,
    },
    FuncCall {
        name: String,
        args: Vec<Expr>,
    },
    Concat(Vec<Expr>),
    Coalesce(Vec<Expr>),
    Cast {
        expr: Box<Expr>,
        target_type: String,
    },
    Window(WindowFunction),
    RawSql(RawSql),
}

impl Expr {
    pub fn col(name: impl Into<String>) -> Self {
        Expr::ColumnRef {
            table_alias: None,
            column_name: name.into(),
        }
    }

    pub fn qualified_col(alias: impl Into<String>, name: impl Into<String>) -> Self {
        Expr::ColumnRef {
            table_alias: Some(alias.into()),
            column_name: name.into(),
        }
    }

    pub fn string_lit(value: impl Into<String>) -> Self {
        Expr::Literal(Literal::String(value.into()))
    }

    pub fn func(name: impl Into<String>, args: Vec<Expr>) -> Self {
        Expr::FuncCall {
            name: name.into(),
            args,
        }
    }

    pub fn hash256(inner: Expr) -> Self {
        Expr::func("HASH256", vec![inner])
    }

    pub fn cast(self, target_type: impl Into<String>) -> Self {
        Expr::Cast {
            expr: Box::new(self),
            target_type: target_type.into(),
        }
    }
}

/// A scalar literal value: string, integer, float, boolean, or null.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value")]
pub enum Literal {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderDirection {
    Asc,
    Desc,
}

/// An `ORDER BY` term inside a window spec or a `STRING_AGG(... ORDER BY ...)` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderByExpr {
    pub expr: Expr,
    pub direction: OrderDirection,
}

impl OrderByExpr {
    pub fn asc(expr: Expr) -> Self {
        Self {
            expr,
            direction: OrderDirection::Asc,
        }
    }

    pub fn desc(expr: Expr) -> Self {
        Self {
            expr,
            direction: OrderDirection::Desc,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WindowSpec {
    pub partition_by: Vec<Expr>,
    pub order_by: Vec<OrderByExpr>,
}

/// A window function call, e.g. `ROW_NUMBER() OVER (PARTITION BY ... ORDER BY ...)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowFunction {
    pub name: String,
    pub args: Vec<Expr>,
    pub window: WindowSpec,
}

impl WindowFunction {
    pub fn row_number(partition_by: Vec<Expr>, order_by: Vec<OrderByExpr>) -> Self {
        Self {
            name: "ROW_NUMBER".to_string(),
            args: Vec::new(),
            window: WindowSpec {
                partition_by,
                order_by,
            },
        }
    }
}

/// An escape hatch for hand-authored SQL coming straight from metadata
/// (`manual_expression`, some `surrogate_expression` forms).
///
/// In template mode, `sql` may contain `{alias}` or `{expr:column_name}`
/// placeholders resolved against `expr_bindings` by the dialect renderer.
/// In non-template mode, `sql` is rendered close to verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSql {
    pub sql: String,
    pub default_table_alias: Option<String>,
    pub is_template: bool,
    pub expr_bindings: BTreeMap<String, Expr>,
}

impl RawSql {
    pub fn verbatim(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            default_table_alias: None,
            is_template: false,
            expr_bindings: BTreeMap::new(),
        }
    }
}
