use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;

use elevata_dialect::SqlDialect;
use elevata_expr::Literal;

lazy_static! {
    static ref LOAD_RUN_ID_RE: Regex = Regex::new(r"\{\{?\s*load_run_id\s*\}?\}").unwrap();
    static ref LOAD_TIMESTAMP_RE: Regex = Regex::new(r"\{\{?\s*load_timestamp\s*\}?\}").unwrap();
    static ref DELTA_CUTOFF_RE: Regex = Regex::new(r"\{\{?\s*DELTA_CUTOFF\s*\}?\}").unwrap();
}

/// Whether `sql` references `{{DELTA_CUTOFF}}` at all, so callers only pay
/// for resolving an increment policy when the rendered SQL actually needs it.
pub fn needs_delta_cutoff(sql: &str) -> bool {
    DELTA_CUTOFF_RE.is_match(sql)
}

/// Substitutes `{{load_run_id}}`, `{{load_timestamp}}`, and (when supplied)
/// `{{DELTA_CUTOFF}}` with dialect-rendered literals. Both the doubled-brace
/// and single-brace spellings are accepted, matching the original Django
/// templating convention.
pub fn apply_runtime_placeholders(
    sql: &str,
    dialect: &dyn SqlDialect,
    load_run_id: &str,
    load_timestamp: DateTime<Utc>,
    delta_cutoff: Option<&str>,
) -> String {
    let run_id_literal = dialect.render_literal(&Literal::String(load_run_id.to_string()));
    let timestamp_literal = dialect.render_literal(&Literal::String(load_timestamp.to_rfc3339()));

    let mut out = LOAD_RUN_ID_RE.replace_all(sql, run_id_literal.as_str()).into_owned();
    out = LOAD_TIMESTAMP_RE.replace_all(&out, timestamp_literal.as_str()).into_owned();

    if let Some(cutoff) = delta_cutoff {
        let cutoff_literal = dialect.render_literal(&Literal::String(cutoff.to_string()));
        out = DELTA_CUTOFF_RE.replace_all(&out, cutoff_literal.as_str()).into_owned();
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use elevata_dialect::DuckDbDialect;

    #[test]
    fn substitutes_both_brace_spellings() {
        let dialect = DuckDbDialect;
        let ts = Utc.with_ymd_and_hms(2026, 7, 30, 12, 0, 0).unwrap();
        let sql = "INSERT INTO t VALUES ({{load_run_id}}, {load_timestamp})";
        let out = apply_runtime_placeholders(sql, &dialect, "abc-123", ts, None);
        assert!(out.contains("'abc-123'"));
        assert!(out.contains("2026-07-30"));
    }

    #[test]
    fn substitutes_delta_cutoff_when_present() {
        let dialect = DuckDbDialect;
        let ts = Utc.with_ymd_and_hms(2026, 7, 30, 12, 0, 0).unwrap();
        let sql = "WHERE loaded_at > {{DELTA_CUTOFF}}";
        assert!(needs_delta_cutoff(sql));
        let out = apply_runtime_placeholders(sql, &dialect, "abc-123", ts, Some("2026-07-01T00:00:00Z"));
        assert!(out.contains("2026-07-01"));
    }

    #[test]
    fn needs_delta_cutoff_is_false_without_placeholder() {
        assert!(!needs_delta_cutoff("SELECT 1"));
    }
}
