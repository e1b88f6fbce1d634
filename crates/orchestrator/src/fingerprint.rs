use sha2::{Digest, Sha256};

use elevata_catalog_model::{Catalog, TargetDataset};

use crate::load_plan::{build_load_plan, LoadMode};

/// One entry per planned dataset: `"schema.name|mode|materialization|timestamp"`.
/// `timestamp` pins the entry to the exact row state at plan time so any
/// later metadata edit (materialization kind, incremental strategy, rename)
/// changes the fingerprint.
fn fingerprint_entry(catalog: &dyn Catalog, dataset: &TargetDataset) -> String {
    let schema = catalog.target_schema(dataset.schema);
    let schema_short = schema.map(|s| s.short_name.as_str()).unwrap_or("?");
    let materialization = schema.map(|s| format!("{:?}", s.materialization)).unwrap_or_else(|| "?".to_string());
    let mode = build_load_plan(dataset, schema_short).mode;
    format!(
        "{}.{}|{}|{}|{}",
        schema_short,
        dataset.name,
        mode_str(mode),
        materialization,
        dataset.lineage_key,
    )
}

fn mode_str(mode: LoadMode) -> &'static str {
    mode.as_str()
}

/// sha256 hex digest of the sorted fingerprint entries for `execution_order`.
/// Recomputed before each dataset's execution; a mismatch against the
/// baseline computed at plan time means metadata changed mid-run.
pub fn compute_execution_plan_fingerprint(catalog: &dyn Catalog, execution_order: &[&TargetDataset]) -> String {
    let mut entries: Vec<String> = execution_order.iter().map(|d| fingerprint_entry(catalog, d)).collect();
    entries.sort();

    let mut hasher = Sha256::new();
    for entry in &entries {
        hasher.update(entry.as_bytes());
        hasher.update(b"\n");
    }
    format!("{:x}", hasher.finalize())
}
