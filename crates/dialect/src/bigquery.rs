use elevata_expr::{Expr, LogicalUnion, UnionType};
use elevata_types::{CanonicalType, PhysicalType};

use crate::column::ColumnDef;
use crate::error::DialectError;
use crate::params::MergeParams;
use crate::sql_dialect::SqlDialect;

/// BigQuery (GoogleSQL). Backtick identifiers, `INT64`/`FLOAT64`/`BOOL` naming,
/// `MERGE` support, and `UNION DISTINCT` as the non-`ALL` union keyword.
pub struct BigQueryDialect;

impl SqlDialect for BigQueryDialect {
    fn name(&self) -> &'static str {
        "bigquery"
    }

    fn supports_merge(&self) -> bool {
        true
    }

    fn supports_alter_column_type(&self) -> bool {
        true
    }

    fn supports_delete_detection(&self) -> bool {
        true
    }

    fn quote_ident(&self, name: &str) -> String {
        format!("`{}`", name.replace('`', "``"))
    }

    /// BigQuery allows dotted table references like `project`.`dataset`.`INFORMATION_SCHEMA.KEYWORDS`
    /// where the last path segment itself contains a `.`; each dotted component is quoted separately.
    fn render_table_identifier(&self, schema: Option<&str>, name: &str) -> String {
        if let Some(schema) = schema {
            if name.contains('.') {
                let rendered_parts: Vec<String> = name.split('.').filter(|p| !p.is_empty()).map(|p| self.render_identifier(p)).collect();
                return format!("{}.{}", self.render_identifier(schema), rendered_parts.join("."));
            }
        }
        let name_sql = self.render_identifier(name);
        match schema {
            Some(s) => format!("{}.{}", self.render_identifier(s), name_sql),
            None => name_sql,
        }
    }

    fn render_physical_type(&self, physical: &PhysicalType, _strict: bool) -> Result<String, DialectError> {
        Ok(match physical.canonical {
            CanonicalType::String => "STRING".to_string(),
            CanonicalType::Integer | CanonicalType::BigInt => "INT64".to_string(),
            CanonicalType::Decimal => "NUMERIC".to_string(),
            CanonicalType::Float => "FLOAT64".to_string(),
            CanonicalType::Boolean => "BOOL".to_string(),
            CanonicalType::Date => "DATE".to_string(),
            CanonicalType::Time => "TIME".to_string(),
            CanonicalType::Timestamp => "TIMESTAMP".to_string(),
            CanonicalType::Binary => "BYTES".to_string(),
            CanonicalType::Uuid | CanonicalType::Json => "STRING".to_string(),
        })
    }

    fn render_create_schema_if_not_exists(&self, schema: &str) -> String {
        format!("CREATE SCHEMA IF NOT EXISTS {}", self.quote_ident(schema))
    }

    /// BigQuery rejects an explicit `NULL` token in column definitions; only `NOT NULL` is valid.
    fn render_create_table_if_not_exists_from_columns(&self, schema: &str, table: &str, columns: &[ColumnDef]) -> String {
        let target = self.render_table_identifier(Some(schema), table);
        let col_defs = columns
            .iter()
            .map(|c| {
                let name = self.render_identifier(&c.name);
                if c.nullable {
                    format!("{name} {}", c.physical_type)
                } else {
                    format!("{name} {} NOT NULL", c.physical_type)
                }
            })
            .collect::<Vec<_>>()
            .join(",\n  ");
        format!("CREATE TABLE IF NOT EXISTS {target} (\n  {col_defs}\n)")
    }

    fn render_alter_column_type(&self, schema: &str, table: &str, column: &str, new_type: &str) -> Option<String> {
        let tbl = self.render_table_identifier(Some(schema), table);
        let col = self.render_identifier(column);
        Some(format!("ALTER TABLE {tbl} ALTER COLUMN {col} SET DATA TYPE {new_type}"))
    }

    fn render_truncate_table(&self, schema: &str, table: &str) -> String {
        format!("TRUNCATE TABLE {}", self.render_table_identifier(Some(schema), table))
    }

    fn render_merge_statement(&self, p: &MergeParams<'_>) -> Result<String, DialectError> {
        let keys: Vec<&String> = p.key_columns.iter().filter(|c| !c.is_empty()).collect();
        if keys.is_empty() {
            return Err(DialectError::MissingKeyColumns { op: "render_merge_statement" });
        }
        let q = |s: &str| self.render_identifier(s);

        let mut insert_cols: Vec<String> = p.insert_columns.iter().filter(|c| !c.is_empty()).cloned().collect();
        if insert_cols.is_empty() {
            let mut seen = std::collections::HashSet::new();
            for c in keys.iter().map(|s| s.as_str()).chain(p.update_columns.iter().map(|s| s.as_str())) {
                if seen.insert(c) {
                    insert_cols.push(c.to_string());
                }
            }
        }
        let key_set: std::collections::HashSet<&str> = keys.iter().map(|s| s.as_str()).collect();
        let updates: Vec<&String> = p.update_columns.iter().filter(|c| !c.is_empty() && !key_set.contains(c.as_str())).collect();

        let on_pred = keys
            .iter()
            .map(|k| format!("{}.{} = {}.{}", q(p.target_alias), q(k), q(p.source_alias), q(k)))
            .collect::<Vec<_>>()
            .join(" AND ");
        let src = format!("(\n{}\n) AS {}", p.source_select_sql.trim(), q(p.source_alias));

        let mut parts = vec![format!("MERGE {} AS {}\nUSING {src}\nON {on_pred}", p.target_fqn.trim(), q(p.target_alias))];
        if !updates.is_empty() {
            let assignments = updates.iter().map(|c| format!("{} = {}.{}", q(c), q(p.source_alias), q(c))).collect::<Vec<_>>().join(", ");
            parts.push(format!("WHEN MATCHED THEN UPDATE SET {assignments}"));
        }
        let insert_cols_sql = insert_cols.iter().map(|c| q(c)).collect::<Vec<_>>().join(", ");
        let insert_vals_sql = insert_cols.iter().map(|c| format!("{}.{}", q(p.source_alias), q(c))).collect::<Vec<_>>().join(", ");
        parts.push(format!("WHEN NOT MATCHED THEN INSERT ({insert_cols_sql}) VALUES ({insert_vals_sql});"));
        Ok(parts.join("\n"))
    }

    /// Intercept `CONCAT_WS` (no native support) before falling back to the shared renderer.
    fn render_expr(&self, expr: &Expr) -> Result<String, DialectError> {
        if let Expr::FuncCall { name, args } = expr {
            if name == "CONCAT_WS" {
                if args.len() < 2 {
                    return Err(DialectError::MissingKeyColumns { op: "CONCAT_WS" });
                }
                let sep_sql = self.render_expr(&args[0])?;
                let parts = args[1..]
                    .iter()
                    .map(|a| self.render_expr(a).map(|s| format!("CAST({s} AS STRING)")))
                    .collect::<Result<Vec<_>, _>>()?;
                return Ok(format!("ARRAY_TO_STRING([{}], {sep_sql})", parts.join(", ")));
            }
        }
        crate::sql_dialect::render_expr_default(self, expr)
    }

    fn render_union(&self, union: &LogicalUnion) -> Result<String, DialectError> {
        let sep = match union.union_type {
            UnionType::All => "\nUNION ALL\n",
            // BigQuery requires the explicit DISTINCT keyword; bare UNION is invalid.
            UnionType::Union => "\nUNION DISTINCT\n",
        };
        let rendered = union.selects.iter().map(|p| self.render_plan(p)).collect::<Result<Vec<_>, _>>()?;
        Ok(rendered.join(sep))
    }

    fn cast_expression(&self, expr: &str, target_type: &str) -> String {
        let base = target_type.split('(').next().unwrap_or(target_type).trim().to_ascii_lowercase();
        match base.as_str() {
            "string" | "varchar" | "text" => format!("CAST({expr} AS STRING)"),
            "date" => format!("CAST({expr} AS DATE)"),
            _ => format!("CAST({expr} AS {target_type})"),
        }
    }

    fn concat_expression(&self, rendered_parts: &[String]) -> String {
        if rendered_parts.is_empty() {
            return "''".to_string();
        }
        format!("({})", rendered_parts.join(" || "))
    }

    fn hash_expression(&self, expr: &str) -> Result<String, DialectError> {
        Ok(format!("TO_HEX(SHA256(CAST({expr} AS BYTES)))"))
    }
}
