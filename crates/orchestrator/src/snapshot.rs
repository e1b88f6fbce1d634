use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::executor::DatasetRunResult;
use crate::policy::ExecutionPolicy;

/// Run-level JSON snapshot, the Rust mirror of the Python `build_execution_snapshot`
/// dict: enough context to replay or diff a run without re-reading the catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionSnapshot {
    pub batch_run_id: String,
    pub created_at: DateTime<Utc>,
    pub root_dataset_key: String,
    pub execute: bool,
    pub no_deps: bool,
    pub continue_on_error: bool,
    pub max_retries: u32,
    pub profile_name: String,
    pub target_system_short: String,
    pub target_system_type: String,
    pub dialect_name: String,
    pub step_count: usize,
    pub had_error: bool,
    pub results: Vec<DatasetRunResult>,
}

#[allow(clippy::too_many_arguments)]
pub fn build_execution_snapshot(
    batch_run_id: String,
    created_at: DateTime<Utc>,
    policy: &ExecutionPolicy,
    execute: bool,
    no_deps: bool,
    profile_name: String,
    target_system_short: String,
    target_system_type: String,
    dialect_name: String,
    root_dataset_key: String,
    results: Vec<DatasetRunResult>,
    had_error: bool,
) -> ExecutionSnapshot {
    let step_count = results.len();
    ExecutionSnapshot {
        batch_run_id,
        created_at,
        root_dataset_key,
        execute,
        no_deps,
        continue_on_error: policy.continue_on_error,
        max_retries: policy.max_retries,
        profile_name,
        target_system_short,
        target_system_type,
        dialect_name,
        step_count,
        had_error,
        results,
    }
}

pub fn render_execution_snapshot_json(snapshot: &ExecutionSnapshot) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(snapshot)
}

/// Per-dataset delta between two snapshots, keyed by `"schema.dataset"`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotDiffEntry {
    pub dataset: String,
    pub left_status: Option<String>,
    pub right_status: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SnapshotDiff {
    pub only_in_left: Vec<String>,
    pub only_in_right: Vec<String>,
    pub status_changed: Vec<SnapshotDiffEntry>,
}

/// Best-effort diff: datasets present in one snapshot but not the other, and
/// datasets present in both whose `status` changed.
pub fn diff_execution_snapshots(left: &ExecutionSnapshot, right: &ExecutionSnapshot) -> SnapshotDiff {
    let mut diff = SnapshotDiff::default();

    let left_by_key: std::collections::BTreeMap<&str, &DatasetRunResult> =
        left.results.iter().map(|r| (r.dataset.as_str(), r)).collect();
    let right_by_key: std::collections::BTreeMap<&str, &DatasetRunResult> =
        right.results.iter().map(|r| (r.dataset.as_str(), r)).collect();

    for (key, left_result) in &left_by_key {
        match right_by_key.get(key) {
            None => diff.only_in_left.push(key.to_string()),
            Some(right_result) => {
                if left_result.status != right_result.status {
                    diff.status_changed.push(SnapshotDiffEntry {
                        dataset: key.to_string(),
                        left_status: Some(left_result.status.clone()),
                        right_status: Some(right_result.status.clone()),
                    });
                }
            }
        }
    }
    for key in right_by_key.keys() {
        if !left_by_key.contains_key(key) {
            diff.only_in_right.push(key.to_string());
        }
    }

    diff
}

/// Human-readable render of a [`SnapshotDiff`], for `--diff-print`.
pub fn render_execution_snapshot_diff_text(diff: &SnapshotDiff, left_batch_run_id: &str, right_batch_run_id: &str) -> String {
    let mut lines = vec![format!("diff {left_batch_run_id} -> {right_batch_run_id}")];
    for dataset in &diff.only_in_left {
        lines.push(format!("  - {dataset} (present in {left_batch_run_id} only)"));
    }
    for dataset in &diff.only_in_right {
        lines.push(format!("  + {dataset} (present in {right_batch_run_id} only)"));
    }
    for entry in &diff.status_changed {
        lines.push(format!(
            "  ~ {} : {} -> {}",
            entry.dataset,
            entry.left_status.as_deref().unwrap_or("?"),
            entry.right_status.as_deref().unwrap_or("?")
        ));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::RunKind;

    fn result(dataset: &str, status: &str) -> DatasetRunResult {
        DatasetRunResult {
            status: status.to_string(),
            kind: RunKind::Sql,
            dataset: dataset.to_string(),
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
    fn diff_detects_status_change_and_missing_datasets() {
        let left = ExecutionSnapshot {
            batch_run_id: "left".to_string(),
            created_at: Utc::now(),
            root_dataset_key: "rawcore.rc_x".to_string(),
            execute: true,
            no_deps: false,
            continue_on_error: false,
            max_retries: 0,
            profile_name: "dev".to_string(),
            target_system_short: "wh1".to_string(),
            target_system_type: "duckdb".to_string(),
            dialect_name: "DuckDbDialect".to_string(),
            step_count: 2,
            had_error: false,
            results: vec![result("rawcore.rc_x", "success"), result("rawcore.rc_y", "success")],
        };
        let mut right = left.clone();
        right.batch_run_id = "right".to_string();
        right.results = vec![result("rawcore.rc_x", "error")];

        let diff = diff_execution_snapshots(&left, &right);
        assert_eq!(diff.only_in_left, vec!["rawcore.rc_y".to_string()]);
        assert_eq!(diff.status_changed.len(), 1);
        assert_eq!(diff.status_changed[0].left_status.as_deref(), Some("success"));
        assert_eq!(diff.status_changed[0].right_status.as_deref(), Some("error"));
    }
}
