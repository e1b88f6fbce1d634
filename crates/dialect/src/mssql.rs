use elevata_expr::Expr;
use elevata_types::{CanonicalType, PhysicalType};

use crate::error::DialectError;
use crate::params::MergeParams;
use crate::sql_dialect::SqlDialect;

/// SQL Server / T-SQL. Native MERGE, `HASHBYTES` for hashing, booleans as 1/0,
/// and UPDATE/DELETE statements that must read `UPDATE <alias> ... FROM <table> AS <alias>`
/// rather than `UPDATE <table> AS <alias>`.
pub struct MssqlDialect;

impl SqlDialect for MssqlDialect {
    fn name(&self) -> &'static str {
        "mssql"
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
                Some(n) => format!("NVARCHAR({n})"),
                None => "NVARCHAR(MAX)".to_string(),
            },
            CanonicalType::Integer => "INT".to_string(),
            CanonicalType::BigInt => "BIGINT".to_string(),
            CanonicalType::Decimal => match (p.precision, p.scale) {
                (Some(pr), Some(sc)) => format!("DECIMAL({pr},{sc})"),
                (Some(pr), None) => format!("DECIMAL({pr})"),
                _ => "DECIMAL(38,10)".to_string(),
            },
            CanonicalType::Float => "FLOAT".to_string(),
            CanonicalType::Boolean => "BIT".to_string(),
            CanonicalType::Date => "DATE".to_string(),
            CanonicalType::Time => "TIME".to_string(),
            CanonicalType::Timestamp => "DATETIME2".to_string(),
            CanonicalType::Binary => "VARBINARY(MAX)".to_string(),
            CanonicalType::Uuid => "UNIQUEIDENTIFIER".to_string(),
            CanonicalType::Json => "NVARCHAR(MAX)".to_string(),
        })
    }

    fn render_create_schema_if_not_exists(&self, schema: &str) -> String {
        format!(
            "IF NOT EXISTS (SELECT 1 FROM sys.schemas WHERE name = '{schema}')\nBEGIN\n  EXEC('CREATE SCHEMA {});\nEND;",
            self.render_identifier(schema)
        )
    }

    fn render_add_column(&self, schema: &str, table: &str, column: &str, column_type: &str) -> String {
        let tbl = self.render_table_identifier(Some(schema), table);
        let col = self.render_identifier(column);
        format!("ALTER TABLE {tbl} ADD {col} {column_type}")
    }

    fn render_alter_column_type(&self, schema: &str, table: &str, column: &str, new_type: &str) -> Option<String> {
        let tbl = self.render_table_identifier(Some(schema), table);
        let col = self.render_identifier(column);
        Some(format!("ALTER TABLE {tbl} ALTER COLUMN {col} {new_type}"))
    }

    fn render_truncate_table(&self, schema: &str, table: &str) -> String {
        format!("TRUNCATE TABLE {};", self.render_table_identifier(Some(schema), table))
    }

    fn render_rename_table(&self, schema: &str, old_table: &str, new_table: &str) -> String {
        let old_qualified = format!("{}.{}", self.render_identifier(schema), self.render_identifier(old_table));
        format!("EXEC sp_rename N'{old_qualified}', N'{}'", self.render_identifier(new_table))
    }

    fn render_rename_column(&self, schema: &str, table: &str, old: &str, new: &str) -> String {
        let obj = format!(
            "{}.{}.{}",
            self.render_identifier(schema),
            self.render_identifier(table),
            self.render_identifier(old)
        );
        format!("EXEC sp_rename N'{obj}', N'{}', 'COLUMN'", self.render_identifier(new))
    }

    fn render_hist_changed_update_sql(&self, schema_name: &str, hist_table: &str, rawcore_table: &str) -> String {
        let hist_tbl = self.render_table_identifier(Some(schema_name), hist_table);
        let rc_tbl = self.render_table_identifier(Some(schema_name), rawcore_table);
        let sk_name = self.render_identifier(&format!("{rawcore_table}_key"));
        let row_hash = self.render_identifier("row_hash");
        format!(
            "UPDATE h\nSET\n  version_ended_at = {{{{ load_timestamp }}}},\n  version_state    = 'changed',\n  load_run_id      = {{{{ load_run_id }}}}\nFROM {hist_tbl} h\nWHERE h.version_ended_at IS NULL\n  AND EXISTS (\n    SELECT 1\n    FROM {rc_tbl} r\n    WHERE r.{sk_name} = h.{sk_name}\n      AND r.{row_hash} <> h.{row_hash}\n  );"
        )
    }

    fn render_hist_delete_sql(&self, schema_name: &str, hist_table: &str, rawcore_table: &str) -> String {
        let hist_tbl = self.render_table_identifier(Some(schema_name), hist_table);
        let rc_tbl = self.render_table_identifier(Some(schema_name), rawcore_table);
        let sk_name = self.render_identifier(&format!("{rawcore_table}_key"));
        format!(
            "UPDATE h\nSET\n  version_ended_at = {{{{ load_timestamp }}}},\n  version_state    = 'deleted',\n  load_run_id      = {{{{ load_run_id }}}}\nFROM {hist_tbl} h\nWHERE h.version_ended_at IS NULL\n  AND NOT EXISTS (\n    SELECT 1\n    FROM {rc_tbl} r\n    WHERE r.{sk_name} = h.{sk_name}\n  );"
        )
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
            let assignments = updates
                .iter()
                .map(|c| format!("{}.{} = {}.{}", q(p.target_alias), q(c), q(p.source_alias), q(c)))
                .collect::<Vec<_>>()
                .join(", ");
            parts.push(format!("WHEN MATCHED THEN UPDATE SET {assignments}"));
        }
        let insert_cols_sql = insert_cols.iter().map(|c| q(c)).collect::<Vec<_>>().join(", ");
        let insert_vals_sql = insert_cols.iter().map(|c| format!("{}.{}", q(p.source_alias), q(c))).collect::<Vec<_>>().join(", ");
        parts.push(format!("WHEN NOT MATCHED THEN INSERT ({insert_cols_sql}) VALUES ({insert_vals_sql});"));
        Ok(parts.join("\n"))
    }

    fn render_delete_detection_statement(
        &self,
        target_schema: &str,
        target_table: &str,
        stage_schema: &str,
        stage_table: &str,
        join_predicates: &[String],
        scope_filter: Option<&str>,
    ) -> String {
        let target = self.render_table_identifier(Some(target_schema), target_table);
        let stage = self.render_table_identifier(Some(stage_schema), stage_table);
        let join_sql = if join_predicates.is_empty() { "1=1".to_string() } else { join_predicates.join(" AND ") };

        let mut conditions = Vec::new();
        if let Some(scope) = scope_filter {
            conditions.push(format!("({scope})"));
        }
        conditions.push(format!("NOT EXISTS (\n  SELECT 1\n  FROM {stage} AS s\n  WHERE {join_sql}\n)"));

        format!("DELETE t\nFROM {target} AS t\nWHERE {};", conditions.join("\n  AND "))
    }

    fn render_literal(&self, lit: &elevata_expr::Literal) -> String {
        use elevata_expr::Literal;
        match lit {
            Literal::Null => "NULL".to_string(),
            Literal::Bool(b) => if *b { "1".to_string() } else { "0".to_string() },
            Literal::Integer(i) => i.to_string(),
            Literal::Float(f) => f.to_string(),
            Literal::String(s) => format!("'{}'", s.replace('\'', "''")),
        }
    }

    fn render_string_agg(&self, args: &[Expr]) -> Result<String, DialectError> {
        if args.len() < 2 {
            return Err(DialectError::StringAggArity);
        }
        let value_sql = self.render_expr(&args[0])?;
        let delim_sql = self.render_expr(&args[1])?;
        if let Some(order_by) = args.get(2) {
            let order_sql = self.render_expr(order_by)?;
            return Ok(format!("STRING_AGG({value_sql}, {delim_sql}) WITHIN GROUP (ORDER BY {order_sql})"));
        }
        Ok(format!("STRING_AGG({value_sql}, {delim_sql})"))
    }

    fn concat_expression(&self, rendered_parts: &[String]) -> String {
        if rendered_parts.is_empty() {
            return "''".to_string();
        }
        format!("({})", rendered_parts.join(" + "))
    }

    fn hash_expression(&self, expr: &str) -> Result<String, DialectError> {
        Ok(format!("CONVERT(VARCHAR(64), HASHBYTES('SHA2_256', {expr}), 2)"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use elevata_expr::Literal;

    #[test]
    fn booleans_render_as_one_and_zero() {
        let d = MssqlDialect;
        assert_eq!(d.render_literal(&Literal::Bool(true)), "1");
        assert_eq!(d.render_literal(&Literal::Bool(false)), "0");
    }

    #[test]
    fn hist_changed_update_targets_alias_not_table() {
        let d = MssqlDialect;
        let sql = d.render_hist_changed_update_sql("rawcore", "customer_hist", "customer");
        assert!(sql.contains("UPDATE h"));
        assert!(sql.contains("FROM rawcore.customer_hist h"));
        assert!(sql.contains("version_state    = 'changed'"));
    }

    #[test]
    fn delete_detection_uses_delete_alias_from() {
        let d = MssqlDialect;
        let sql = d.render_delete_detection_statement("rawcore", "customer", "stage", "customer", &["t.id = s.id".to_string()], None);
        assert!(sql.starts_with("DELETE t\nFROM"));
    }

    #[test]
    fn rename_table_uses_sp_rename() {
        let d = MssqlDialect;
        let sql = d.render_rename_table("rawcore", "customer_old", "customer");
        assert!(sql.contains("EXEC sp_rename"));
    }

    #[test]
    fn hash_expression_uses_hashbytes() {
        let d = MssqlDialect;
        assert_eq!(d.hash_expression("x").unwrap(), "CONVERT(VARCHAR(64), HASHBYTES('SHA2_256', x), 2)");
    }
}
