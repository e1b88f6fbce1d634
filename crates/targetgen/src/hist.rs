use elevata_catalog_model::{CombinationMode, IncrementalStrategy, SurrogateKeyPolicy, SystemRole, TargetDataset};
use elevata_types::CanonicalType;

use crate::columns::build_surrogate_key_expression;
use crate::draft::{ColumnDraftSource, ConsolidationMode, TargetColumnDraft, TargetDatasetDraft};
use crate::error::TargetGenError;

/// Rebuilds the hist-table draft for a `historize=true` rawcore dataset:
/// `hist_sk`, every mirrored rawcore column (preserving `former_names` so
/// renames propagate as `RENAME_COLUMN` rather than `ADD_COLUMN`), then the
/// SCD2 tech tail. `row_hash` is carried over verbatim from rawcore, never
/// regenerated, per the rawcore dataset's own expression.
pub fn build_hist_draft(
    rawcore: &TargetDataset,
    policy: &SurrogateKeyPolicy,
) -> Result<TargetDatasetDraft, TargetGenError> {
    let rawcore_sk = rawcore
        .active_columns()
        .find(|c| c.system_role == SystemRole::SurrogateKey)
        .ok_or(TargetGenError::MissingSurrogateKeyForHist)?;

    let mut columns = Vec::new();
    let mut ordinal = 1;

    let mut hist_sk = TargetColumnDraft::technical(
        "hist_sk",
        ordinal,
        CanonicalType::String,
        SystemRole::SurrogateKey,
    );
    hist_sk.length = Some(64);
    hist_sk.surrogate_expression = Some(build_surrogate_key_expression(
        &[rawcore_sk.name.as_str(), "version_started_at"],
        policy,
    ));
    columns.push(hist_sk);
    ordinal += 1;

    for rawcore_col in rawcore.active_columns() {
        let mut mirrored = TargetColumnDraft::mapped(
            rawcore_col.name.clone(),
            ordinal,
            rawcore_col.canonical_type,
            rawcore_col.lineage_key.clone(),
            ColumnDraftSource::UpstreamTargetColumn(rawcore_col.id),
        );
        mirrored.length = rawcore_col.length;
        mirrored.precision = rawcore_col.precision;
        mirrored.scale = rawcore_col.scale;
        mirrored.former_names = rawcore_col.former_names.clone();
        match rawcore_col.system_role {
            // the rawcore SK no longer identifies a row once branches are
            // unioned across version rows; it survives into hist as the
            // entity it was minted for, not as hist's own identity column.
            SystemRole::SurrogateKey => mirrored.system_role = SystemRole::EntityKey,
            SystemRole::RowHash => {
                mirrored.system_role = SystemRole::RowHash;
                mirrored.surrogate_expression = rawcore_col.surrogate_expression.clone();
            }
            _ => {}
        }
        columns.push(mirrored);
        ordinal += 1;
    }

    for (name, role, ty) in [
        ("version_started_at", SystemRole::VersionStartedAt, CanonicalType::Timestamp),
        ("version_ended_at", SystemRole::VersionEndedAt, CanonicalType::Timestamp),
        ("version_state", SystemRole::VersionState, CanonicalType::String),
        ("load_run_id", SystemRole::LoadRunId, CanonicalType::String),
        ("loaded_at", SystemRole::LoadedAt, CanonicalType::Timestamp),
    ] {
        columns.push(TargetColumnDraft::technical(name, ordinal, ty, role));
        ordinal += 1;
    }

    Ok(TargetDatasetDraft {
        schema: rawcore.schema,
        name: rawcore.hist_dataset_name(),
        lineage_key: format!("{}_hist", rawcore.lineage_key),
        historize: true,
        incremental_strategy: IncrementalStrategy::Historize,
        incremental_source: None,
        combination_mode: CombinationMode::Single,
        consolidation: ConsolidationMode::None,
        contributing_source_datasets: vec![],
        columns,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use elevata_catalog_model::{
        HashAlgorithm, TargetColumn, TargetColumnId, TargetDatasetId, TargetSchemaId,
    };
    use uuid::Uuid;

    fn policy() -> SurrogateKeyPolicy {
        SurrogateKeyPolicy {
            algorithm: HashAlgorithm::Sha256,
            null_token: "~~NULL~~".into(),
            component_separator: "|".into(),
        }
    }

    fn column(name: &str, role: SystemRole) -> TargetColumn {
        TargetColumn {
            id: TargetColumnId::new(Uuid::new_v4()),
            dataset: TargetDatasetId::new(Uuid::new_v4()),
            name: name.into(),
            ordinal_position: 1,
            canonical_type: CanonicalType::String,
            length: None,
            precision: None,
            scale: None,
            system_role: role,
            surrogate_expression: None,
            manual_expression: None,
            former_names: vec![],
            lineage_key: name.into(),
            active: true,
            inputs: vec![],
        }
    }

    fn rawcore() -> TargetDataset {
        TargetDataset {
            id: TargetDatasetId::new(Uuid::new_v4()),
            schema: TargetSchemaId::new(Uuid::new_v4()),
            name: "rawcore_party_customer".into(),
            lineage_key: "party:customer".into(),
            former_names: vec![],
            historize: true,
            handle_deletes: false,
            incremental_strategy: IncrementalStrategy::Merge,
            incremental_source: None,
            combination_mode: CombinationMode::Single,
            query_root: None,
            query_head: None,
            is_system_managed: true,
            inputs: vec![],
            columns: vec![
                column("rawcore_party_customer_key", SystemRole::SurrogateKey),
                column("name", SystemRole::None),
                column("row_hash", SystemRole::RowHash),
            ],
            references: vec![],
            joins: vec![],
        }
    }

    #[test]
    fn mirrors_rawcore_surrogate_key_as_entity_key() {
        let draft = build_hist_draft(&rawcore(), &policy()).unwrap();
        let mirrored = draft
            .columns
            .iter()
            .find(|c| c.name == "rawcore_party_customer_key")
            .expect("mirrored surrogate key column");
        assert_eq!(mirrored.system_role, SystemRole::EntityKey);
    }

    #[test]
    fn errors_when_rawcore_has_no_active_surrogate_key() {
        let mut rc = rawcore();
        rc.columns.retain(|c| c.system_role != SystemRole::SurrogateKey);
        let err = build_hist_draft(&rc, &policy()).unwrap_err();
        assert!(matches!(err, TargetGenError::MissingSurrogateKeyForHist));
    }
}
