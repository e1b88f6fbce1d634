use std::collections::HashMap;

use elevata_catalog_model::{Catalog, CombinationMode, SourceDataset, SystemRole, TargetSchema};

use crate::bucket::decide_consolidation_mode;
use crate::columns::{raw_technical_columns, row_hash_column, source_identity_column, surrogate_key_column};
use crate::draft::{ColumnDraftSource, ConsolidationMode, TargetColumnDraft, TargetDatasetDraft};
use crate::error::TargetGenError;
use crate::rules::{bucket_key, consolidated_dataset_name, protect_name_conflict, raw_dataset_name};

const RAWCORE_LAYER: &str = "rawcore";

/// Drafts target datasets/columns for every in-scope source dataset against
/// a single `TargetSchema`, per the per-layer rules in the raw vs
/// stage/rawcore branches below. Never mutates the catalog: callers resolve
/// each draft with [`crate::upsert::resolve_upsert`] and apply the result
/// through their own persistence layer.
pub struct TargetGenerationService;

impl TargetGenerationService {
    pub fn generate(catalog: &dyn Catalog, schema: &TargetSchema) -> Result<Vec<TargetDatasetDraft>, TargetGenError> {
        if schema.consolidate_groups {
            Self::generate_consolidated(catalog, schema)
        } else {
            Self::generate_raw(catalog, schema)
        }
    }

    fn generate_raw(catalog: &dyn Catalog, schema: &TargetSchema) -> Result<Vec<TargetDatasetDraft>, TargetGenError> {
        let mut drafts = Vec::new();
        for source_dataset in catalog.source_datasets() {
            if !source_dataset.active || !source_dataset.integrate {
                continue;
            }
            let system = catalog
                .source_system(source_dataset.source_system)
                .ok_or(TargetGenError::UnknownSourceSystem(source_dataset.id))?;
            let name = raw_dataset_name(
                &schema.physical_prefix,
                &system.short_name,
                &source_dataset.source_dataset_name,
            )?;

            let mut columns = mapped_columns_for(catalog, source_dataset, &name)?;
            let next_ordinal = columns.len() as i32 + 1;
            columns.extend(raw_technical_columns(next_ordinal));

            drafts.push(TargetDatasetDraft {
                schema: schema.id,
                lineage_key: format!("{}:{}", system.short_name, source_dataset.source_dataset_name),
                name,
                historize: false,
                incremental_strategy: schema.incremental_strategy_default,
                incremental_source: Some(source_dataset.id),
                combination_mode: CombinationMode::Single,
                consolidation: ConsolidationMode::None,
                contributing_source_datasets: vec![source_dataset.id],
                columns,
            });
        }
        Ok(drafts)
    }

    fn generate_consolidated(
        catalog: &dyn Catalog,
        schema: &TargetSchema,
    ) -> Result<Vec<TargetDatasetDraft>, TargetGenError> {
        let mut buckets: HashMap<(String, String), Vec<&SourceDataset>> = HashMap::new();
        for source_dataset in catalog.source_datasets() {
            if !source_dataset.active || !source_dataset.integrate {
                continue;
            }
            let key = bucket_key(catalog, source_dataset)?;
            buckets.entry(key).or_default().push(source_dataset);
        }

        let mut drafts = Vec::with_capacity(buckets.len());
        for ((short_name, base_name), members) in buckets {
            let name = consolidated_dataset_name(&schema.physical_prefix, &short_name, &base_name)?;

            let memberships: Vec<_> = members
                .iter()
                .filter_map(|sd| {
                    catalog
                        .group_for_source_dataset(sd.id)
                        .and_then(|g| g.memberships.iter().find(|m| m.source_dataset == sd.id))
                })
                .collect();
            let consolidation = decide_consolidation_mode(&memberships);
            let has_identity = memberships.iter().any(|m| m.source_identity_id.is_some());

            let mut columns = mapped_columns_for(catalog, members[0], &name)?;
            let mut next_ordinal = columns.len() as i32 + 1;

            if schema.surrogate_keys_enabled {
                let mut natural_key_cols: Vec<&str> = columns
                    .iter()
                    .filter(|c| c.system_role == SystemRole::BusinessKey)
                    .map(|c| c.name.as_str())
                    .collect();
                if has_identity {
                    natural_key_cols.push("source_identity_id");
                }
                let sk_name = elevata_naming::build_surrogate_key_name(&name);
                columns.push(surrogate_key_column(
                    sk_name,
                    next_ordinal,
                    &natural_key_cols,
                    &schema.surrogate_key_policy,
                ));
                next_ordinal += 1;
            }

            if has_identity {
                columns.push(source_identity_column(next_ordinal));
                next_ordinal += 1;
            }

            if schema.short_name == RAWCORE_LAYER {
                let hashable: Vec<&str> = columns
                    .iter()
                    .filter(|c| !c.system_role.is_key() && !c.system_role.is_technical())
                    .map(|c| c.name.as_str())
                    .collect();
                columns.push(row_hash_column(next_ordinal, &hashable, &schema.surrogate_key_policy));
                next_ordinal += 1;
            }

            columns.extend(raw_technical_columns(next_ordinal));

            let combination_mode = match consolidation {
                ConsolidationMode::None => CombinationMode::Single,
                ConsolidationMode::Identity | ConsolidationMode::Ranked => CombinationMode::Union,
            };

            drafts.push(TargetDatasetDraft {
                schema: schema.id,
                lineage_key: format!("{short_name}:{base_name}"),
                name,
                historize: schema.historization_default,
                incremental_strategy: schema.incremental_strategy_default,
                incremental_source: None,
                combination_mode,
                consolidation,
                contributing_source_datasets: members.iter().map(|sd| sd.id).collect(),
                columns,
            });
        }
        Ok(drafts)
    }
}

/// One-to-one column drafts from a source dataset's integrated columns,
/// protected against reserved-name and surrogate-key-name collisions.
fn mapped_columns_for(
    catalog: &dyn Catalog,
    source_dataset: &SourceDataset,
    dataset_name: &str,
) -> Result<Vec<TargetColumnDraft>, TargetGenError> {
    let sk_name = elevata_naming::build_surrogate_key_name(dataset_name);
    let mut columns = Vec::new();
    for (i, col) in catalog
        .source_columns(source_dataset.id)
        .into_iter()
        .filter(|c| c.integrate)
        .enumerate()
    {
        let name = protect_name_conflict(&col.name, &sk_name);
        let mut draft = TargetColumnDraft::mapped(
            name,
            (i + 1) as i32,
            col.canonical_type,
            col.name.clone(),
            ColumnDraftSource::SourceColumn(col.id),
        );
        if col.primary_key_column {
            draft.system_role = SystemRole::BusinessKey;
        }
        columns.push(draft);
    }
    Ok(columns)
}

#[cfg(test)]
mod tests {
    use super::*;
    use elevata_catalog_model::{
        CatalogSnapshot, HashAlgorithm, IncrementalStrategy, MaterializationKind, SourceColumn,
        SourceColumnId, SourceDatasetGroup, SourceDatasetGroupId, SourceDatasetId, SourceSystem,
        SourceSystemId, SurrogateKeyPolicy, TargetSchemaId,
    };
    use elevata_types::CanonicalType;
    use uuid::Uuid;

    fn policy() -> SurrogateKeyPolicy {
        SurrogateKeyPolicy {
            algorithm: HashAlgorithm::Sha256,
            null_token: "~~NULL~~".into(),
            component_separator: "|".into(),
        }
    }

    fn system(id: Uuid, short_name: &str, target_short_name: Option<&str>) -> SourceSystem {
        SourceSystem {
            id: SourceSystemId::new(id),
            short_name: short_name.into(),
            is_source: true,
            is_target: false,
            kind: "postgres".into(),
            target_short_name: target_short_name.map(str::to_string),
            active: true,
            retired_at: None,
        }
    }

    fn column(dataset: SourceDatasetId, ordinal: i32, name: &str) -> SourceColumn {
        SourceColumn {
            id: SourceColumnId::new(Uuid::new_v4()),
            dataset,
            name: name.into(),
            ordinal_position: ordinal,
            canonical_type: CanonicalType::String,
            length: None,
            precision: None,
            scale: None,
            primary_key_column: false,
            integrate: true,
        }
    }

    #[test]
    fn raw_layer_drafts_one_dataset_per_source_with_technical_columns() {
        let schema = TargetSchema {
            id: TargetSchemaId::new(Uuid::new_v4()),
            short_name: "raw".into(),
            physical_prefix: "raw".into(),
            materialization: MaterializationKind::Table,
            historization_default: false,
            incremental_strategy_default: IncrementalStrategy::Append,
            surrogate_keys_enabled: false,
            surrogate_key_policy: policy(),
            consolidate_groups: false,
        };
        let system_id = Uuid::new_v4();
        let dataset_id = SourceDatasetId::new(Uuid::new_v4());
        let snapshot = CatalogSnapshot {
            source_systems: vec![system(system_id, "crm", None)],
            source_datasets: vec![SourceDataset {
                id: dataset_id,
                source_system: SourceSystemId::new(system_id),
                schema_name: "dbo".into(),
                source_dataset_name: "orders".into(),
                integrate: true,
                incremental: false,
                active: true,
                static_filter: None,
                increment_filter: None,
                increment_policies: vec![],
            }],
            source_columns: vec![column(dataset_id, 1, "order_id"), column(dataset_id, 2, "load_run_id")],
            ..Default::default()
        };

        let drafts = TargetGenerationService::generate(&snapshot, &schema).unwrap();
        assert_eq!(drafts.len(), 1);
        let draft = &drafts[0];
        assert_eq!(draft.name, "raw_crm_orders");
        assert_eq!(draft.lineage_key, "crm:orders");
        // the source column literally named "load_run_id" collides with the
        // reserved technical name and must be protected.
        let mapped_names: Vec<&str> = draft.columns.iter().map(|c| c.name.as_str()).collect();
        assert!(mapped_names.contains(&"load_run_id_src"));
        assert!(mapped_names.contains(&"load_run_id"));
        assert!(mapped_names.contains(&"loaded_at"));
    }

    #[test]
    fn consolidated_layer_buckets_by_group_and_adds_identity_and_row_hash() {
        let schema = TargetSchema {
            id: TargetSchemaId::new(Uuid::new_v4()),
            short_name: "rawcore".into(),
            physical_prefix: "rawcore".into(),
            materialization: MaterializationKind::Table,
            historization_default: true,
            incremental_strategy_default: IncrementalStrategy::Merge,
            surrogate_keys_enabled: true,
            surrogate_key_policy: policy(),
            consolidate_groups: true,
        };

        let sap_system = Uuid::new_v4();
        let crm_system = Uuid::new_v4();
        let sap_dataset_id = SourceDatasetId::new(Uuid::new_v4());
        let crm_dataset_id = SourceDatasetId::new(Uuid::new_v4());

        let group = SourceDatasetGroup {
            id: SourceDatasetGroupId::new(Uuid::new_v4()),
            target_short_name: "party".into(),
            unified_source_dataset_name: "customer".into(),
            memberships: vec![
                elevata_catalog_model::SourceDatasetGroupMembership {
                    source_dataset: sap_dataset_id,
                    is_primary_system: true,
                    source_identity_id: Some("sap_customer_id".into()),
                    source_identity_ordinal: 0,
                },
                elevata_catalog_model::SourceDatasetGroupMembership {
                    source_dataset: crm_dataset_id,
                    is_primary_system: false,
                    source_identity_id: Some("crm_customer_id".into()),
                    source_identity_ordinal: 1,
                },
            ],
        };

        let snapshot = CatalogSnapshot {
            source_systems: vec![
                system(sap_system, "sap", Some("party")),
                system(crm_system, "crm", Some("party")),
            ],
            source_datasets: vec![
                SourceDataset {
                    id: sap_dataset_id,
                    source_system: SourceSystemId::new(sap_system),
                    schema_name: "dbo".into(),
                    source_dataset_name: "kna1".into(),
                    integrate: true,
                    incremental: false,
                    active: true,
                    static_filter: None,
                    increment_filter: None,
                    increment_policies: vec![],
                },
                SourceDataset {
                    id: crm_dataset_id,
                    source_system: SourceSystemId::new(crm_system),
                    schema_name: "dbo".into(),
                    source_dataset_name: "accounts".into(),
                    integrate: true,
                    incremental: false,
                    active: true,
                    static_filter: None,
                    increment_filter: None,
                    increment_policies: vec![],
                },
            ],
            source_columns: vec![column(sap_dataset_id, 1, "name"), column(crm_dataset_id, 1, "name")],
            source_dataset_groups: vec![group],
            ..Default::default()
        };

        let drafts = TargetGenerationService::generate(&snapshot, &schema).unwrap();
        assert_eq!(drafts.len(), 1);
        let draft = &drafts[0];
        assert_eq!(draft.name, "rawcore_party_customer");
        assert_eq!(draft.consolidation, ConsolidationMode::Identity);
        assert_eq!(draft.combination_mode, CombinationMode::Union);
        let names: Vec<&str> = draft.columns.iter().map(|c| c.name.as_str()).collect();
        assert!(names.contains(&"source_identity_id"));
        assert!(names.contains(&"row_hash"));
        let sk = draft
            .columns
            .iter()
            .find(|c| c.name == "rawcore_party_customer_key")
            .expect("surrogate key column");
        assert_eq!(sk.system_role, SystemRole::SurrogateKey);
        assert!(sk.surrogate_expression.as_ref().unwrap().contains("source_identity_id"));
    }
}
