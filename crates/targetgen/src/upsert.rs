use elevata_catalog_model::{Catalog, TargetDataset};

use crate::draft::TargetDatasetDraft;

/// The generation service never mutates the catalog itself (persistence is an
/// external collaborator); it resolves each draft against the current
/// snapshot and hands back a typed decision for the caller to apply.
#[derive(Debug, Clone)]
pub enum UpsertDecision<'a> {
    Create,
    /// Matched an existing dataset; `rename` is set when the draft's name
    /// differs from the existing one, so the caller can push the old name
    /// onto `former_names` before applying the new one.
    Update {
        existing: &'a TargetDataset,
        rename: Option<String>,
    },
}

/// Resolution order: by `lineage_key` first (this is what survives renames),
/// then by current name — mirroring how the service looks up hand-authored
/// datasets that don't yet carry a lineage key matching the draft's.
pub fn resolve_upsert<'a>(catalog: &'a dyn Catalog, draft: &TargetDatasetDraft) -> UpsertDecision<'a> {
    if let Some(existing) = catalog.target_dataset_by_lineage_key(&draft.lineage_key) {
        let rename = (existing.name != draft.name).then(|| existing.name.clone());
        return UpsertDecision::Update { existing, rename };
    }
    if let Some(existing) = catalog
        .target_datasets_in_schema(draft.schema)
        .into_iter()
        .find(|d| d.name == draft.name)
    {
        return UpsertDecision::Update {
            existing,
            rename: None,
        };
    }
    UpsertDecision::Create
}

#[cfg(test)]
mod tests {
    use super::*;
    use elevata_catalog_model::{
        CatalogSnapshot, CombinationMode, HashAlgorithm, IncrementalStrategy, MaterializationKind,
        SurrogateKeyPolicy, TargetSchema, TargetSchemaId,
    };
    use elevata_catalog_model::TargetDatasetId;
    use crate::draft::ConsolidationMode;
    use uuid::Uuid;

    fn schema() -> TargetSchema {
        TargetSchema {
            id: TargetSchemaId::new(Uuid::new_v4()),
            short_name: "raw".into(),
            physical_prefix: "raw".into(),
            materialization: MaterializationKind::Table,
            historization_default: false,
            incremental_strategy_default: IncrementalStrategy::Append,
            surrogate_keys_enabled: false,
            surrogate_key_policy: SurrogateKeyPolicy {
                algorithm: HashAlgorithm::Sha256,
                null_token: "~~NULL~~".into(),
                component_separator: "|".into(),
            },
            consolidate_groups: false,
        }
    }

    fn draft(schema_id: TargetSchemaId, name: &str, lineage_key: &str) -> TargetDatasetDraft {
        TargetDatasetDraft {
            schema: schema_id,
            name: name.into(),
            lineage_key: lineage_key.into(),
            historize: false,
            incremental_strategy: IncrementalStrategy::Append,
            incremental_source: None,
            combination_mode: CombinationMode::Single,
            consolidation: ConsolidationMode::None,
            contributing_source_datasets: vec![],
            columns: vec![],
        }
    }

    #[test]
    fn matches_existing_by_lineage_key_and_flags_rename() {
        let schema = schema();
        let existing = TargetDataset {
            id: TargetDatasetId::new(Uuid::new_v4()),
            schema: schema.id,
            name: "raw_crm_old_orders".into(),
            lineage_key: "crm_orders".into(),
            former_names: vec![],
            historize: false,
            handle_deletes: false,
            incremental_strategy: IncrementalStrategy::Append,
            incremental_source: None,
            combination_mode: CombinationMode::Single,
            query_root: None,
            query_head: None,
            is_system_managed: true,
            inputs: vec![],
            columns: vec![],
            references: vec![],
            joins: vec![],
        };
        let snapshot = CatalogSnapshot {
            target_schemas: vec![schema.clone()],
            target_datasets: vec![existing],
            ..Default::default()
        };
        let draft = draft(schema.id, "raw_crm_orders", "crm_orders");

        match resolve_upsert(&snapshot, &draft) {
            UpsertDecision::Update { rename, .. } => {
                assert_eq!(rename, Some("raw_crm_old_orders".to_string()));
            }
            other => panic!("expected Update, got {other:?}"),
        }
    }

    #[test]
    fn falls_back_to_create_when_nothing_matches() {
        let schema = schema();
        let snapshot = CatalogSnapshot {
            target_schemas: vec![schema.clone()],
            ..Default::default()
        };
        let draft = draft(schema.id, "raw_crm_orders", "crm_orders");
        assert!(matches!(resolve_upsert(&snapshot, &draft), UpsertDecision::Create));
    }
}
