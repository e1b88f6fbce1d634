use elevata_types::{CanonicalType, PhysicalType};

use crate::error::DialectError;
use crate::params::MergeParams;
use crate::sql_dialect::SqlDialect;

/// PostgreSQL: `INSERT ... ON CONFLICT` instead of MERGE, `pgcrypto` for hashing.
pub struct PostgresDialect;

impl SqlDialect for PostgresDialect {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn supports_merge(&self) -> bool {
        false
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
                None => "TEXT".to_string(),
            },
            CanonicalType::Integer => "INTEGER".to_string(),
            CanonicalType::BigInt => "BIGINT".to_string(),
            CanonicalType::Decimal => match (p.precision, p.scale) {
                (Some(pr), Some(sc)) => format!("NUMERIC({pr},{sc})"),
                (Some(pr), None) => format!("NUMERIC({pr})"),
                _ => "NUMERIC".to_string(),
            },
            CanonicalType::Float => "DOUBLE PRECISION".to_string(),
            CanonicalType::Boolean => "BOOLEAN".to_string(),
            CanonicalType::Date => "DATE".to_string(),
            CanonicalType::Time => "TIME".to_string(),
            CanonicalType::Timestamp => "TIMESTAMPTZ".to_string(),
            CanonicalType::Binary => "BYTEA".to_string(),
            CanonicalType::Uuid => "UUID".to_string(),
            CanonicalType::Json => "JSONB".to_string(),
        })
    }

    fn render_truncate_table(&self, schema: &str, table: &str) -> String {
        format!("TRUNCATE TABLE {};", self.render_table_identifier(Some(schema), table))
    }

    /// Postgres has no MERGE; upsert via `INSERT ... ON CONFLICT DO UPDATE`.
    fn render_merge_statement(&self, p: &MergeParams<'_>) -> Result<String, DialectError> {
        let keys: Vec<&String> = p.key_columns.iter().filter(|c| !c.is_empty()).collect();
        if keys.is_empty() {
            return Err(DialectError::MissingKeyColumns { op: "render_merge_statement" });
        }
        let q = |s: &str| self.render_identifier(s);

        let key_set: std::collections::HashSet<&str> = keys.iter().map(|s| s.as_str()).collect();
        let mut all_columns: Vec<&String> = keys.clone();
        for c in p.update_columns {
            if !key_set.contains(c.as_str()) {
                all_columns.push(c);
            }
        }

        let key_list = keys.iter().map(|c| q(c)).collect::<Vec<_>>().join(", ");
        let insert_col_list = all_columns.iter().map(|c| q(c)).collect::<Vec<_>>().join(", ");
        let update_assignments = p
            .update_columns
            .iter()
            .map(|c| format!("{} = EXCLUDED.{}", q(c), q(c)))
            .collect::<Vec<_>>()
            .join(", ");

        let target = p.target_fqn.trim();
        let mut sql = format!("INSERT INTO {target} ({insert_col_list})\n{}\n", p.source_select_sql.trim());
        sql.push_str(&format!("ON CONFLICT ({key_list})\n"));
        if update_assignments.is_empty() {
            sql.push_str("DO NOTHING;");
        } else {
            sql.push_str(&format!("DO UPDATE SET {update_assignments};"));
        }
        Ok(sql)
    }

    fn param_placeholder(&self) -> &'static str {
        "%s"
    }

    fn concat_expression(&self, rendered_parts: &[String]) -> String {
        if rendered_parts.is_empty() {
            return "''".to_string();
        }
        format!("({})", rendered_parts.join(" || "))
    }

    fn hash_expression(&self, expr: &str) -> Result<String, DialectError> {
        Ok(format!("encode(digest(convert_to(({expr})::text, 'UTF8'), 'sha256'), 'hex')"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn has_no_native_merge_and_no_alter_column_type() {
        let d = PostgresDialect;
        assert!(!d.supports_merge());
        assert!(!d.supports_alter_column_type());
        assert!(d.render_alter_column_type("rawcore", "customer", "name", "TEXT").is_none());
    }

    #[test]
    fn merge_statement_falls_back_to_on_conflict() {
        let d = PostgresDialect;
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
        assert!(sql.contains("ON CONFLICT (id)"));
        assert!(sql.contains("DO UPDATE SET name = EXCLUDED.name;"));
    }

    #[test]
    fn merge_statement_requires_key_columns() {
        let d = PostgresDialect;
        let keys: Vec<String> = vec![];
        let updates = vec!["name".to_string()];
        let inserts: Vec<String> = vec![];
        let err = d
            .render_merge_statement(&MergeParams {
                target_fqn: "rawcore.customer",
                source_select_sql: "SELECT 1",
                key_columns: &keys,
                update_columns: &updates,
                insert_columns: &inserts,
                target_alias: "t",
                source_alias: "s",
            })
            .unwrap_err();
        assert!(matches!(err, DialectError::MissingKeyColumns { .. }));
    }

    #[test]
    fn hash_expression_uses_pgcrypto() {
        let d = PostgresDialect;
        assert_eq!(d.hash_expression("x").unwrap(), "encode(digest(convert_to((x)::text, 'UTF8'), 'sha256'), 'hex')");
    }
}
