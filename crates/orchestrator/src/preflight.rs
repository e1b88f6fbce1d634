use lazy_static::lazy_static;
use regex::Regex;

/// Schemas a target-only execution is allowed to reference, beyond the
/// dataset's own target schema. `information_schema`/`pg_catalog`/`duckdb`
/// cover dialect-native metadata views; `main` is DuckDB's default schema;
/// `sys`/`dbo` are MSSQL/Fabric system schemas.
const ALLOWED_AUXILIARY_SCHEMAS: &[&str] = &[
    "raw",
    "stage",
    "rawcore",
    "bizcore",
    "meta",
    "information_schema",
    "pg_catalog",
    "duckdb",
    "main",
    "sys",
    "dbo",
];

lazy_static! {
    // Matches `FROM <schema>.<table>` / `JOIN <schema>.<table>`, with the
    // schema optionally quoted (`"schema"`) or bracketed (`[schema]`).
    static ref CROSS_SCHEMA_RE: Regex = Regex::new(
        r#"(?i)\b(?:FROM|JOIN)\s+(?:"([A-Za-z0-9_]+)"|\[([A-Za-z0-9_]+)\]|([A-Za-z0-9_]+))\s*\."#
    ).unwrap();
}

/// True when every non-blank line of `sql` is a `--` comment (or `sql` is
/// blank): a rendered dataset with no executable statement, most often a
/// misconfigured `incremental_strategy`/`materialization_type` combination.
pub fn is_comment_only_sql(sql: &str) -> bool {
    let trimmed = sql.trim();
    if trimmed.is_empty() {
        return true;
    }
    trimmed.lines().all(|line| {
        let t = line.trim();
        t.is_empty() || t.starts_with("--")
    })
}

/// Scans `sql` for `FROM`/`JOIN <schema>.<table>` references outside the
/// dataset's own target schema plus the allowed auxiliary set, and returns
/// the offending schema names (deduplicated, in first-seen order).
pub fn cross_system_schemas(sql: &str, target_schema_short: &str) -> Vec<String> {
    let mut offenders = Vec::new();
    for caps in CROSS_SCHEMA_RE.captures_iter(sql) {
        let schema = caps
            .get(1)
            .or_else(|| caps.get(2))
            .or_else(|| caps.get(3))
            .map(|m| m.as_str().to_string());
        let Some(schema) = schema else { continue };
        let schema_lc = schema.to_lowercase();
        if schema_lc == target_schema_short.to_lowercase() {
            continue;
        }
        if ALLOWED_AUXILIARY_SCHEMAS.contains(&schema_lc.as_str()) {
            continue;
        }
        if !offenders.contains(&schema) {
            offenders.push(schema);
        }
    }
    offenders
}

/// True iff `cross_system_schemas` found anything to block on.
pub fn looks_like_cross_system_sql(sql: &str, target_schema_short: &str) -> bool {
    !cross_system_schemas(sql, target_schema_short).is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pure_comment_sql_is_comment_only() {
        assert!(is_comment_only_sql("-- nothing to do here\n-- really"));
        assert!(is_comment_only_sql(""));
        assert!(is_comment_only_sql("   \n  "));
    }

    #[test]
    fn select_statement_is_not_comment_only() {
        assert!(!is_comment_only_sql("-- a comment\nSELECT 1"));
    }

    #[test]
    fn allowed_schema_references_are_not_cross_system() {
        let sql = "INSERT INTO rawcore.rc_x SELECT * FROM stage.stg_x s LEFT JOIN rawcore.rc_y y ON s.id = y.id";
        assert!(!looks_like_cross_system_sql(sql, "rawcore"));
    }

    #[test]
    fn foreign_schema_reference_is_flagged() {
        let sql = r#"SELECT * FROM "external_db".customers"#;
        let offenders = cross_system_schemas(sql, "rawcore");
        assert_eq!(offenders, vec!["external_db".to_string()]);
    }

    #[test]
    fn bracketed_schema_reference_is_flagged() {
        let sql = "SELECT * FROM [other_system].[customers] c";
        assert!(looks_like_cross_system_sql(sql, "rawcore"));
    }
}
