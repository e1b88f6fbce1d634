//! File-system side of `--write-execution-snapshot`/`--diff-against-snapshot`.
//! The orchestrator crate owns the snapshot's shape and diff algorithm; this
//! module only owns where it lives on disk.

use std::path::{Path, PathBuf};

use anyhow::Context;
use elevata_orchestrator::{render_execution_snapshot_json, ExecutionSnapshot};

pub fn snapshot_file_path(dir: &str, batch_run_id: &str) -> PathBuf {
    Path::new(dir).join(format!("{batch_run_id}.json"))
}

pub fn write_execution_snapshot(dir: &str, snapshot: &ExecutionSnapshot) -> anyhow::Result<PathBuf> {
    std::fs::create_dir_all(dir).with_context(|| format!("creating execution snapshot directory {dir}"))?;
    let path = snapshot_file_path(dir, &snapshot.batch_run_id);
    let json = render_execution_snapshot_json(snapshot).context("serializing execution snapshot")?;
    std::fs::write(&path, json).with_context(|| format!("writing execution snapshot to {}", path.display()))?;
    Ok(path)
}

pub fn read_execution_snapshot(path: &str) -> anyhow::Result<ExecutionSnapshot> {
    let raw = std::fs::read_to_string(path).with_context(|| format!("reading execution snapshot from {path}"))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing execution snapshot at {path}"))
}
