use elevata_types::{CanonicalType, PhysicalType};

use crate::error::DialectError;
use crate::params::MergeParams;
use crate::sql_dialect::SqlDialect;

/// Microsoft Fabric Warehouse: T-SQL compatible but no NVARCHAR/MAX — deterministic
/// fixed-length VARCHAR/VARBINARY defaults keep DDL stable across the warehouse engine.
pub struct FabricWarehouseDialect;

impl FabricWarehouseDialect {
    const DEFAULT_VARCHAR_LEN: i32 = 4000;
    const DEFAULT_VARBINARY_LEN: i32 = 4000;
}

impl SqlDialect for FabricWarehouseDialect {
    fn name(&self) -> &'static str {
        "fabric_warehouse"
    }

    fn supports_merge(&self) -> bool {
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
                None => format!("VARCHAR({})", Self::DEFAULT_VARCHAR_LEN),
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
            CanonicalType::Binary => format!("VARBINARY({})", Self::DEFAULT_VARBINARY_LEN),
            // UNIQUEIDENTIFIER stores as binary in Delta Parquet, which can break
            // join semantics across the Warehouse vs SQL analytics endpoint.
            CanonicalType::Uuid => "VARCHAR(36)".to_string(),
            CanonicalType::Json => format!("VARCHAR({})", Self::DEFAULT_VARCHAR_LEN),
        })
    }

    fn render_create_schema_if_not_exists(&self, schema: &str) -> String {
        format!(
            "IF NOT EXISTS (SELECT 1 FROM sys.schemas WHERE name = '{schema}')\nBEGIN\n  EXEC('CREATE SCHEMA {});\nEND;",
            self.quote_ident(schema)
        )
    }

    fn render_add_column(&self, schema: &str, table: &str, column: &str, column_type: &str) -> String {
        let tbl = self.render_table_identifier(Some(schema), table);
        let col = self.render_identifier(column);
        format!("ALTER TABLE {tbl} ADD {col} {column_type};")
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

    fn render_merge_statement(&self, p: &MergeParams<'_>) -> Result<String, DialectError> {
        let keys: Vec<&String> = p.key_columns.iter().filter(|c| !c.is_empty()).collect();
        if keys.is_empty() {
            return Err(DialectError::MissingKeyColumns { op: "render_merge_statement" });
        }
        let q = |s: &str| self.render_identifier(s);
        let key_set: std::collections::HashSet<&str> = keys.iter().map(|s| s.as_str()).collect();
        let mut all_cols: Vec<&String> = keys.clone();
        for c in p.update_columns {
            if !key_set.contains(c.as_str()) {
                all_cols.push(c);
            }
        }

        let on_pred = keys.iter().map(|k| format!("t.{} = s.{}", q(k), q(k))).collect::<Vec<_>>().join(" AND ");
        let update_assignments = p.update_columns.iter().map(|c| format!("t.{} = s.{}", q(c), q(c))).collect::<Vec<_>>().join(", ");
        let insert_cols = all_cols.iter().map(|c| q(c)).collect::<Vec<_>>().join(", ");
        let insert_vals = all_cols.iter().map(|c| format!("s.{}", q(c))).collect::<Vec<_>>().join(", ");

        Ok(format!(
            "MERGE {} AS t\nUSING (\n{}\n) AS s\nON {on_pred}\nWHEN MATCHED THEN\n  UPDATE SET {update_assignments}\nWHEN NOT MATCHED THEN\n  INSERT ({insert_cols}) VALUES ({insert_vals});",
            p.target_fqn.trim(),
            p.source_select_sql.trim()
        ))
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

    fn param_placeholder(&self) -> &'static str {
        "?"
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

    fn concat_expression(&self, rendered_parts: &[String]) -> String {
        if rendered_parts.is_empty() {
            return "''".to_string();
        }
        format!("({})", rendered_parts.join(" + "))
    }

    fn hash_expression(&self, expr: &str) -> Result<String, DialectError> {
        Ok(format!(
            "CONVERT(VARCHAR(64), HASHBYTES('SHA2_256', CAST(({expr}) AS VARCHAR({}))), 2)",
            Self::DEFAULT_VARCHAR_LEN
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unbounded_string_falls_back_to_fixed_default_length() {
        let d = FabricWarehouseDialect;
        let physical = PhysicalType { canonical: CanonicalType::String, params: elevata_types::TypeParams::NONE };
        assert_eq!(d.render_physical_type(&physical, false).unwrap(), "VARCHAR(4000)");
    }

    #[test]
    /// UNIQUEIDENTIFIER stores as binary in Delta Parquet, breaking cross-endpoint
    /// joins; Fabric Warehouse uses a fixed-length VARCHAR instead.
    fn uuid_avoids_uniqueidentifier() {
        let d = FabricWarehouseDialect;
        let physical = PhysicalType { canonical: CanonicalType::Uuid, params: elevata_types::TypeParams::NONE };
        assert_eq!(d.render_physical_type(&physical, false).unwrap(), "VARCHAR(36)");
    }

    #[test]
    fn does_not_support_alter_column_type() {
        let d = FabricWarehouseDialect;
        assert!(!d.supports_alter_column_type());
        assert!(d.render_alter_column_type("rawcore", "customer", "name", "VARCHAR(100)").is_none());
    }

    #[test]
    fn merge_statement_is_full_t_sql_shape() {
        let d = FabricWarehouseDialect;
        let keys = vec!["id".to_string()];
        let updates = vec!["name".to_string()];
        let inserts: Vec<String> = vec![];
        let sql = d
            .render_merge_statement(&MergeParams {
                target_fqn: "rawcore.customer",
                source_select_sql: "SELECT * FROM stage.customer",
                key_columns: &keys,
                update_columns: &updates,
                insert_columns: &inserts,
                target_alias: "t",
                source_alias: "s",
            })
            .unwrap();
        assert!(sql.starts_with("MERGE rawcore.customer AS t"));
        assert!(sql.contains("WHEN MATCHED THEN\n  UPDATE SET"));
    }
}
