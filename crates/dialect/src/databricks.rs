use elevata_types::{CanonicalType, PhysicalType};
use unicode_normalization::UnicodeNormalization;

use crate::column::ColumnDef;
use crate::error::DialectError;
use crate::params::MergeParams;
use crate::sql_dialect::SqlDialect;

/// Databricks (Spark SQL / Delta Lake). Backtick identifiers, Unity Catalog object
/// name normalization, native MERGE INTO, and `SHA2` for hashing.
pub struct DatabricksDialect;

impl DatabricksDialect {
    /// Unity Catalog object names must be alphanumeric + underscore only, even when
    /// quoted. Applied to schema/table/view names, never to column aliases.
    fn normalize_uc_object_name(name: &str) -> String {
        let mut s = name.trim().to_string();
        s = s
            .replace('Ä', "Ae")
            .replace('Ö', "Oe")
            .replace('Ü', "Ue")
            .replace('ä', "ae")
            .replace('ö', "oe")
            .replace('ü', "ue")
            .replace('ß', "ss");

        s = s.nfkd().filter(|c| unicode_normalization::char::canonical_combining_class(*c) == 0).collect();

        s = s.to_lowercase();
        let mut out = String::with_capacity(s.len());
        let mut last_was_underscore = false;
        for ch in s.chars() {
            let mapped = if ch.is_ascii_alphanumeric() || ch == '_' { ch } else { '_' };
            if mapped == '_' {
                if last_was_underscore {
                    continue;
                }
                last_was_underscore = true;
            } else {
                last_was_underscore = false;
            }
            out.push(mapped);
        }
        out.trim_matches('_').to_string()
    }
}

impl SqlDialect for DatabricksDialect {
    fn name(&self) -> &'static str {
        "databricks"
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

    fn render_table_identifier(&self, schema: Option<&str>, name: &str) -> String {
        let obj = Self::normalize_uc_object_name(name);
        match schema {
            Some(s) => format!("{}.{obj}", Self::normalize_uc_object_name(s)),
            None => obj,
        }
    }

    fn render_physical_type(&self, physical: &PhysicalType, _strict: bool) -> Result<String, DialectError> {
        let p = &physical.params;
        Ok(match physical.canonical {
            CanonicalType::String => "STRING".to_string(),
            CanonicalType::Integer => "INT".to_string(),
            CanonicalType::BigInt => "BIGINT".to_string(),
            CanonicalType::Decimal => {
                let precision = p.precision.unwrap_or(38);
                let scale = p.scale.unwrap_or(0);
                format!("DECIMAL({precision},{scale})")
            }
            CanonicalType::Float => "DOUBLE".to_string(),
            CanonicalType::Boolean => "BOOLEAN".to_string(),
            CanonicalType::Date => "DATE".to_string(),
            // Spark SQL TIME support is inconsistent across runtimes; store as STRING.
            CanonicalType::Time => "STRING".to_string(),
            CanonicalType::Timestamp => "TIMESTAMP".to_string(),
            CanonicalType::Binary => "BINARY".to_string(),
            CanonicalType::Uuid => "STRING".to_string(),
            // Spark has no native JSON type.
            CanonicalType::Json => "STRING".to_string(),
        })
    }

    fn render_create_schema_if_not_exists(&self, schema: &str) -> String {
        format!("CREATE SCHEMA IF NOT EXISTS {};", Self::normalize_uc_object_name(schema))
    }

    /// Spark SQL rejects a bare `NULL` token; only `NOT NULL` is ever emitted.
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

    fn render_create_table_from_columns(&self, schema: &str, table: &str, columns: &[ColumnDef]) -> String {
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
        format!("CREATE TABLE {target} (\n  {col_defs}\n)")
    }

    /// Unity Catalog resolves an unqualified rename destination into the current
    /// default schema, which silently duplicates the table under `default`. Always
    /// fully qualify both sides.
    fn render_rename_table(&self, schema: &str, old_table: &str, new_table: &str) -> String {
        let src = self.render_table_identifier(Some(schema), old_table);
        let dst = self.render_table_identifier(Some(schema), new_table);
        format!("ALTER TABLE {src} RENAME TO {dst};")
    }

    /// Delta Lake's RENAME COLUMN requires column mapping mode 'name' to be enabled
    /// first, or the statement fails with DELTA_UNSUPPORTED_RENAME_COLUMN.
    fn render_rename_column(&self, schema: &str, table: &str, old: &str, new: &str) -> String {
        let tbl = self.render_table_identifier(Some(schema), table);
        let old_col = self.render_identifier(old);
        let new_col = self.render_identifier(new);
        format!("ALTER TABLE {tbl} SET TBLPROPERTIES ('delta.columnMapping.mode' = 'name');\nALTER TABLE {tbl} RENAME COLUMN {old_col} TO {new_col};")
    }

    fn render_alter_column_type(&self, schema: &str, table: &str, column: &str, new_type: &str) -> Option<String> {
        let tbl = self.render_table_identifier(Some(schema), table);
        let col = self.render_identifier(column);
        Some(format!("ALTER TABLE {tbl} ALTER COLUMN {col} TYPE {new_type}"))
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

        format!("DELETE FROM {target} AS t\nWHERE {};", conditions.join("\n  AND "))
    }

    fn param_placeholder(&self) -> &'static str {
        "%s"
    }

    fn truncate_string_expression(&self, expr: &str, max_length: i32) -> String {
        format!("SUBSTRING({expr}, 1, {max_length})")
    }

    fn concat_expression(&self, rendered_parts: &[String]) -> String {
        if rendered_parts.is_empty() {
            return "''".to_string();
        }
        format!("({})", rendered_parts.join(" || "))
    }

    fn hash_expression(&self, expr: &str) -> Result<String, DialectError> {
        Ok(format!("SHA2(CAST(({expr}) AS STRING), 256)"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unity_catalog_normalization_transliterates_umlauts_and_strips_spaces() {
        assert_eq!(DatabricksDialect::normalize_uc_object_name("Kündendaten Raw"), "kuendendaten_raw");
        assert_eq!(DatabricksDialect::normalize_uc_object_name("Straße"), "strasse");
        assert_eq!(DatabricksDialect::normalize_uc_object_name("__weird--name__"), "weird_name");
    }

    #[test]
    fn table_identifier_normalizes_both_schema_and_table() {
        let d = DatabricksDialect;
        assert_eq!(d.render_table_identifier(Some("raw schema"), "Müller Orders"), "raw_schema.mueller_orders");
    }

    #[test]
    fn rename_table_fully_qualifies_destination() {
        let d = DatabricksDialect;
        let sql = d.render_rename_table("rawcore", "customer_old", "customer");
        assert_eq!(sql, "ALTER TABLE rawcore.customer_old RENAME TO rawcore.customer;");
    }

    #[test]
    fn rename_column_enables_column_mapping_first() {
        let d = DatabricksDialect;
        let sql = d.render_rename_column("rawcore", "customer", "old_name", "new_name");
        assert!(sql.contains("SET TBLPROPERTIES ('delta.columnMapping.mode' = 'name');"));
        assert!(sql.contains("RENAME COLUMN old_name TO new_name;"));
    }

    #[test]
    fn create_table_omits_bare_null_token() {
        let d = DatabricksDialect;
        let columns = vec![ColumnDef::new("id", "INT", false), ColumnDef::new("name", "STRING", true)];
        let sql = d.render_create_table_if_not_exists_from_columns("rawcore", "customer", &columns);
        assert!(sql.contains("id INT NOT NULL"));
        assert!(!sql.contains("NULL\n"));
    }

    #[test]
    fn truncate_string_expression_uses_substring() {
        let d = DatabricksDialect;
        assert_eq!(d.truncate_string_expression("name", 50), "SUBSTRING(name, 1, 50)");
    }

    #[test]
    fn hash_expression_uses_sha2() {
        let d = DatabricksDialect;
        assert_eq!(d.hash_expression("x").unwrap(), "SHA2(CAST((x) AS STRING), 256)");
    }
}
