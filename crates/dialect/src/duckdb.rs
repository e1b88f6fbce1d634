use elevata_expr::Expr;
use elevata_types::{CanonicalType, PhysicalType};

use crate::error::DialectError;
use crate::sql_dialect::SqlDialect;

/// DuckDB: double-quoted identifiers, native MERGE, SHA256 built in.
pub struct DuckDbDialect;

impl SqlDialect for DuckDbDialect {
    fn name(&self) -> &'static str {
        "duckdb"
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
        format!("\"{}\"", name.replace('"', "\"\""))
    }

    fn render_physical_type(&self, physical: &PhysicalType, _strict: bool) -> Result<String, DialectError> {
        let p = &physical.params;
        Ok(match physical.canonical {
            CanonicalType::String => match p.length {
                Some(n) => format!("VARCHAR({n})"),
                None => "VARCHAR".to_string(),
            },
            CanonicalType::Integer => "INTEGER".to_string(),
            CanonicalType::BigInt => "BIGINT".to_string(),
            CanonicalType::Decimal => match (p.precision, p.scale) {
                (Some(pr), Some(sc)) => format!("DECIMAL({pr},{sc})"),
                (Some(pr), None) => format!("DECIMAL({pr})"),
                _ => "DECIMAL".to_string(),
            },
            CanonicalType::Float => "DOUBLE".to_string(),
            CanonicalType::Boolean => "BOOLEAN".to_string(),
            CanonicalType::Date => "DATE".to_string(),
            CanonicalType::Time => "TIME".to_string(),
            CanonicalType::Timestamp => "TIMESTAMP".to_string(),
            CanonicalType::Binary => "BLOB".to_string(),
            CanonicalType::Uuid => "UUID".to_string(),
            CanonicalType::Json => "JSON".to_string(),
        })
    }

    fn render_alter_column_type(&self, schema: &str, table: &str, column: &str, new_type: &str) -> Option<String> {
        let tbl = self.render_table_identifier(Some(schema), table);
        let col = self.render_identifier(column);
        Some(format!("ALTER TABLE {tbl} ALTER COLUMN {col} SET DATA TYPE {new_type}"))
    }

    fn concat_expression(&self, rendered_parts: &[String]) -> String {
        if rendered_parts.is_empty() {
            return "''".to_string();
        }
        format!("({})", rendered_parts.join(" || "))
    }

    fn hash_expression(&self, expr: &str) -> Result<String, DialectError> {
        Ok(format!("SHA256({expr})"))
    }

    fn render_string_agg(&self, args: &[Expr]) -> Result<String, DialectError> {
        if args.len() < 2 {
            return Err(DialectError::StringAggArity);
        }
        let value_sql = self.render_expr(&args[0])?;
        let delim_sql = self.render_expr(&args[1])?;
        if let Some(order_by) = args.get(2) {
            let order_sql = self.render_expr(order_by)?;
            return Ok(format!("string_agg({value_sql}, {delim_sql} ORDER BY {order_sql})"));
        }
        Ok(format!("string_agg({value_sql}, {delim_sql})"))
    }
}
