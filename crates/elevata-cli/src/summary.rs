//! Renders the per-dataset execution summary, one line per dataset with a
//! status glyph, per spec §7's user-visible-behavior paragraph.

use elevata_orchestrator::{DatasetRunResult, RunKind};

fn glyph(result: &DatasetRunResult) -> &'static str {
    match (result.status.as_str(), result.kind) {
        ("success", _) | ("dry_run", _) => "\u{2714}",
        (_, RunKind::Preflight) => "\u{26A0}",
        ("skipped", RunKind::Blocked) | ("aborted", _) => "\u{23F8}",
        ("skipped", _) => "\u{23ED}",
        ("error", _) => "\u{2716}",
        _ => "\u{2716}",
    }
}

pub fn render_summary_line(result: &DatasetRunResult) -> String {
    let mut line = format!("{} {}", glyph(result), result.dataset);
    if let Some(reason) = result.status_reason.as_deref() {
        line.push_str(&format!(" ({reason})"));
    }
    if let Some(message) = result.message.as_deref() {
        line.push_str(&format!(": {message}"));
    }
    if result.status == "blocked" && result.status_reason.as_deref() == Some("type_drift") {
        line.push_str(" — rerun with --allow-lossy-type-drift or --no-type-changes to proceed");
    }
    line
}

pub fn print_summary(results: &[DatasetRunResult]) {
    for result in results {
        println!("{}", render_summary_line(result));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(status: &str, kind: RunKind) -> DatasetRunResult {
        DatasetRunResult {
            status: status.to_string(),
            kind,
            dataset: "rawcore.rc_x".to_string(),
            message: None,
            rows_affected: None,
            load_run_id: "run-1".to_string(),
            sql_length: 0,
            render_ms: 0.0,
            execution_ms: 0.0,
            attempt_no: 1,
            status_reason: None,
            blocked_by: None,
            rendered_sql: None,
        }
    }

    #[test]
    fn success_gets_check_glyph() {
        let line = render_summary_line(&result("success", RunKind::Sql));
        assert!(line.starts_with("\u{2714}"));
    }

    #[test]
    fn preflight_block_gets_warning_glyph() {
        let line = render_summary_line(&result("blocked", RunKind::Preflight));
        assert!(line.starts_with("\u{26A0}"));
    }

    #[test]
    fn engine_error_gets_cross_glyph() {
        let line = render_summary_line(&result("error", RunKind::Sql));
        assert!(line.starts_with("\u{2716}"));
    }
}
