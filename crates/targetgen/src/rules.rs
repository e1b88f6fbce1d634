use elevata_catalog_model::{Catalog, SourceDataset};

use crate::error::TargetGenError;

/// Reserved physical names no source-mapped column may collide with. A
/// colliding source column is renamed `<orig>_src` (see `protect_name_conflict`).
pub const RESERVED_TECHNICAL_NAMES: &[&str] = &[
    "load_run_id",
    "loaded_at",
    "row_hash",
    "version_started_at",
    "version_ended_at",
    "version_state",
];

pub fn raw_dataset_name(
    prefix: &str,
    system_short_name: &str,
    source_dataset_name: &str,
) -> Result<String, TargetGenError> {
    elevata_naming::build_physical_name(&[prefix, system_short_name, source_dataset_name])
        .map_err(Into::into)
}

/// The `(short_name, base_name)` pair a stage/rawcore physical name is built
/// from: the dataset's `SourceDatasetGroupMembership` if it belongs to a
/// consolidation group, otherwise the owning system's business short name
/// plus its own dataset name.
pub fn bucket_key(
    catalog: &dyn Catalog,
    source_dataset: &SourceDataset,
) -> Result<(String, String), TargetGenError> {
    if let Some(group) = catalog.group_for_source_dataset(source_dataset.id) {
        Ok((
            group.target_short_name.clone(),
            group.unified_source_dataset_name.clone(),
        ))
    } else {
        let system = catalog
            .source_system(source_dataset.source_system)
            .ok_or(TargetGenError::UnknownSourceSystem(source_dataset.id))?;
        Ok((
            system.effective_target_short_name().to_string(),
            source_dataset.source_dataset_name.clone(),
        ))
    }
}

pub fn consolidated_dataset_name(
    prefix: &str,
    short_name: &str,
    base_name: &str,
) -> Result<String, TargetGenError> {
    elevata_naming::build_physical_name(&[prefix, short_name, base_name]).map_err(Into::into)
}

/// Renames a source-mapped column's name to `<orig>_src` if it collides with
/// the reserved technical set or the dataset's own surrogate-key column name.
pub fn protect_name_conflict(candidate: &str, surrogate_key_column_name: &str) -> String {
    let collides = RESERVED_TECHNICAL_NAMES.contains(&candidate) || candidate == surrogate_key_column_name;
    if collides {
        format!("{candidate}_src")
    } else {
        candidate.to_string()
    }
}
