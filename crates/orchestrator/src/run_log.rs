use chrono::{DateTime, Utc};

use elevata_dialect::SqlDialect;
use elevata_expr::Literal;

/// One row of `meta.load_run_log`, in the registry column order from spec §6.
#[derive(Debug, Clone)]
pub struct LoadRunLogRow {
    pub batch_run_id: String,
    pub load_run_id: String,
    pub target_schema: String,
    pub target_dataset: String,
    pub target_system: String,
    pub profile: String,
    pub mode: String,
    pub handle_deletes: bool,
    pub historize: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub render_ms: f64,
    pub execution_ms: f64,
    pub sql_length: i64,
    pub rows_affected: Option<i64>,
    pub status: String,
    pub status_reason: Option<String>,
    pub attempt_no: i32,
    pub blocked_by: Option<String>,
    pub error_message: Option<String>,
}

impl LoadRunLogRow {
    /// Rows for the per-SQL-dataset path carry a real load mode; orchestration-only
    /// outcomes (blocked/aborted before any SQL was rendered) use `mode="orchestration"`.
    pub fn orchestration_only(
        batch_run_id: String,
        load_run_id: String,
        target_schema: String,
        target_dataset: String,
        target_system: String,
        profile: String,
        at: DateTime<Utc>,
        message: Option<String>,
        attempt_no: i32,
        status_reason: Option<String>,
        blocked_by: Option<String>,
    ) -> Self {
        Self {
            batch_run_id,
            load_run_id,
            target_schema,
            target_dataset,
            target_system,
            profile,
            mode: "orchestration".to_string(),
            handle_deletes: false,
            historize: false,
            started_at: at,
            finished_at: at,
            render_ms: 0.0,
            execution_ms: 0.0,
            sql_length: 0,
            rows_affected: None,
            status: "skipped".to_string(),
            status_reason,
            attempt_no,
            blocked_by,
            error_message: message,
        }
    }
}

/// Normalizes an engine error message before it becomes a `Literal::String`:
/// newlines collapsed to spaces, runs of whitespace squashed, length-capped.
/// Quote-doubling is `render_literal`'s job, not this function's.
pub fn sanitize_sql_string(value: &str, max_len: usize) -> String {
    let collapsed = value.replace("\r\n", "\n").replace('\r', "\n").replace('\n', " ");
    let normalized: String = collapsed.split_whitespace().collect::<Vec<_>>().join(" ");
    if normalized.chars().count() > max_len {
        let truncated: String = normalized.chars().take(max_len.saturating_sub(3)).collect();
        format!("{truncated}...")
    } else {
        normalized
    }
}

fn lit(value: Option<impl Into<String>>, dialect: &dyn SqlDialect) -> String {
    match value {
        Some(v) => dialect.render_literal(&Literal::String(v.into())),
        None => dialect.render_literal(&Literal::Null),
    }
}

/// Columns in the fixed registry order spec §6 requires.
pub const LOAD_RUN_LOG_COLUMNS: &[&str] = &[
    "batch_run_id",
    "load_run_id",
    "target_schema",
    "target_dataset",
    "target_system",
    "profile",
    "mode",
    "handle_deletes",
    "historize",
    "started_at",
    "finished_at",
    "render_ms",
    "execution_ms",
    "sql_length",
    "rows_affected",
    "status",
    "status_reason",
    "attempt_no",
    "blocked_by",
    "error_message",
];

/// Renders a single-row `INSERT INTO meta.load_run_log (...) VALUES (...)`.
pub fn render_insert_load_run_log(dialect: &dyn SqlDialect, meta_schema: &str, row: &LoadRunLogRow) -> String {
    let table = dialect.render_table_identifier(Some(meta_schema), "load_run_log");
    let columns = LOAD_RUN_LOG_COLUMNS
        .iter()
        .map(|c| dialect.render_identifier(c))
        .collect::<Vec<_>>()
        .join(", ");

    let error_message = row.error_message.as_deref().map(|m| sanitize_sql_string(m, 1500));

    let values = vec![
        lit(Some(row.batch_run_id.clone()), dialect),
        lit(Some(row.load_run_id.clone()), dialect),
        lit(Some(row.target_schema.clone()), dialect),
        lit(Some(row.target_dataset.clone()), dialect),
        lit(Some(row.target_system.clone()), dialect),
        lit(Some(row.profile.clone()), dialect),
        lit(Some(row.mode.clone()), dialect),
        row.handle_deletes.to_string(),
        row.historize.to_string(),
        dialect.render_literal(&Literal::String(row.started_at.to_rfc3339())),
        dialect.render_literal(&Literal::String(row.finished_at.to_rfc3339())),
        dialect.render_literal(&Literal::Float(row.render_ms)),
        dialect.render_literal(&Literal::Float(row.execution_ms)),
        dialect.render_literal(&Literal::Integer(row.sql_length)),
        row.rows_affected.map(|v| dialect.render_literal(&Literal::Integer(v))).unwrap_or_else(|| dialect.render_literal(&Literal::Null)),
        lit(Some(row.status.clone()), dialect),
        lit(row.status_reason.clone(), dialect),
        dialect.render_literal(&Literal::Integer(row.attempt_no as i64)),
        lit(row.blocked_by.clone(), dialect),
        lit(error_message, dialect),
    ]
    .join(", ");

    format!("INSERT INTO {table} ({columns}) VALUES ({values});")
}

#[cfg(test)]
mod tests {
    use super::*;
    use elevata_dialect::DuckDbDialect;

    fn sample_row() -> LoadRunLogRow {
        let now = Utc::now();
        LoadRunLogRow {
            batch_run_id: "batch-1".to_string(),
            load_run_id: "run-1".to_string(),
            target_schema: "rawcore".to_string(),
            target_dataset: "rc_customer".to_string(),
            target_system: "wh1".to_string(),
            profile: "dev".to_string(),
            mode: "merge".to_string(),
            handle_deletes: true,
            historize: false,
            started_at: now,
            finished_at: now,
            render_ms: 12.5,
            execution_ms: 84.0,
            sql_length: 512,
            rows_affected: Some(42),
            status: "success".to_string(),
            status_reason: None,
            attempt_no: 1,
            blocked_by: None,
            error_message: None,
        }
    }

    #[test]
    fn renders_all_columns_in_registry_order() {
        let dialect = DuckDbDialect;
        let sql = render_insert_load_run_log(&dialect, "meta", &sample_row());
        assert!(sql.starts_with("INSERT INTO"));
        for col in LOAD_RUN_LOG_COLUMNS {
            assert!(sql.contains(col), "missing column {col} in {sql}");
        }
        assert!(sql.contains("'success'"));
    }

    #[test]
    fn collapses_newlines_and_whitespace() {
        let s = sanitize_sql_string("line one\r\n  line two\n\nline three", 1500);
        assert_eq!(s, "line one line two line three");
    }

    #[test]
    fn sanitize_truncates_long_messages() {
        let long = "x".repeat(2000);
        let s = sanitize_sql_string(&long, 100);
        assert_eq!(s.chars().count(), 100);
        assert!(s.ends_with("..."));
    }
}
