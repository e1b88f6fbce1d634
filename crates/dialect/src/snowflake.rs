use elevata_expr::Expr;
use elevata_types::{CanonicalType, PhysicalType};

use crate::error::DialectError;
use crate::params::MergeParams;
use crate::sql_dialect::SqlDialect;

pub struct SnowflakeDialect;

impl SqlDialect for SnowflakeDialect {
    fn name(&self) -> &'static str {
        "snowflake"
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
            CanonicalType::Decimal => {
                let precision = p.precision.unwrap_or(38);
                let scale = p.scale.unwrap_or(0);
                format!("NUMBER({precision},{scale})")
            }
            CanonicalType::Float => "FLOAT".to_string(),
            CanonicalType::Boolean => "BOOLEAN".to_string(),
            CanonicalType::Date => "DATE".to_string(),
            CanonicalType::Time => "TIME".to_string(),
            // Neutral (no timezone) unless a caller explicitly needs TZ semantics.
            CanonicalType::Timestamp => "TIMESTAMP_NTZ".to_string(),
            CanonicalType::Binary => "BINARY".to_string(),
            CanonicalType::Uuid => "VARCHAR(36)".to_string(),
            CanonicalType::Json => "VARIANT".to_string(),
        })
    }

    fn render_alter_column_type(&self, schema: &str, table: &str, column: &str, new_type: &str) -> Option<String> {
        let tbl = self.render_table_identifier(Some(schema), table);
        let col = self.render_identifier(column);
        Some(format!("ALTER TABLE {tbl} ALTER COLUMN {col} SET DATA TYPE {new_type}"))
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

        let mut parts = vec![format!("MERGE INTO {} AS {}\nUSING {src}\nON {on_pred}", p.target_fqn.trim(), q(p.target_alias))];
        if !updates.is_empty() {
            let assignments = updates.iter().map(|c| format!("{} = {}.{}", q(c), q(p.source_alias), q(c))).collect::<Vec<_>>().join(", ");
            parts.push(format!("WHEN MATCHED THEN UPDATE SET {assignments}"));
        }
        let insert_cols_sql = insert_cols.iter().map(|c| q(c)).collect::<Vec<_>>().join(", ");
        let insert_vals_sql = insert_cols.iter().map(|c| format!("{}.{}", q(p.source_alias), q(c))).collect::<Vec<_>>().join(", ");
        parts.push(format!("WHEN NOT MATCHED THEN INSERT ({insert_cols_sql}) VALUES ({insert_vals_sql});"));
        Ok(parts.join("\n"))
    }

    fn param_placeholder(&self) -> &'static str {
        "%s"
    }

    fn render_string_agg(&self, args: &[Expr]) -> Result<String, DialectError> {
        if args.len() < 2 {
            return Err(DialectError::StringAggArity);
        }
        let value_sql = self.render_expr(&args[0])?;
        let delim_sql = self.render_expr(&args[1])?;
        if let Some(order_by) = args.get(2) {
            let order_sql = self.render_expr(order_by)?;
            return Ok(format!("LISTAGG({value_sql}, {delim_sql}) WITHIN GROUP (ORDER BY {order_sql})"));
        }
        Ok(format!("LISTAGG({value_sql}, {delim_sql})"))
    }

    fn concat_expression(&self, rendered_parts: &[String]) -> String {
        if rendered_parts.is_empty() {
            return "''".to_string();
        }
        format!("({})", rendered_parts.join(" || "))
    }

    fn hash_expression(&self, expr: &str) -> Result<String, DialectError> {
        // SHA2 returns a 64-char hex string already; do not HEX-encode again.
        Ok(format!("SHA2(TO_VARCHAR({expr}), 256)"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decimal_defaults_to_38_0() {
        let d = SnowflakeDialect;
        let physical = PhysicalType { canonical: CanonicalType::Decimal, params: elevata_types::TypeParams::NONE };
        assert_eq!(d.render_physical_type(&physical, false).unwrap(), "NUMBER(38,0)");
    }

    #[test]
    fn json_maps_to_variant() {
        let d = SnowflakeDialect;
        let physical = PhysicalType { canonical: CanonicalType::Json, params: elevata_types::TypeParams::NONE };
        assert_eq!(d.render_physical_type(&physical, false).unwrap(), "VARIANT");
    }

    /// Snowflake has no native STRING_AGG; LISTAGG is the real equivalent.
    #[test]
    fn string_agg_renders_as_listagg() {
        let d = SnowflakeDialect;
        let args = vec![Expr::col("name"), Expr::string_lit(",")];
        assert_eq!(d.render_string_agg(&args).unwrap(), "LISTAGG(name, ',')");
    }

    #[test]
    fn string_agg_with_order_by_uses_within_group() {
        let d = SnowflakeDialect;
        let args = vec![Expr::col("name"), Expr::string_lit(","), Expr::col("sort_key")];
        assert_eq!(d.render_string_agg(&args).unwrap(), "LISTAGG(name, ',') WITHIN GROUP (ORDER BY sort_key)");
    }

    #[test]
    fn hash_expression_does_not_double_hex_encode() {
        let d = SnowflakeDialect;
        assert_eq!(d.hash_expression("x").unwrap(), "SHA2(TO_VARCHAR(x), 256)");
    }
}
