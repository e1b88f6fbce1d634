//! Resolves the root `TargetDataset`(s) for a run from the CLI's
//! `target_name` / `--schema` / `--all` arguments (spec §6).

use elevata_catalog_model::{Catalog, TargetDataset};

pub fn select_roots<'a>(
    catalog: &'a dyn Catalog,
    target_name: Option<&str>,
    schema: Option<&str>,
    all: bool,
) -> anyhow::Result<Vec<&'a TargetDataset>> {
    if all {
        let mut roots: Vec<&TargetDataset> = catalog
            .target_datasets()
            .iter()
            .filter(|d| match schema {
                Some(short) => catalog.target_schema(d.schema).map(|s| s.short_name == short).unwrap_or(false),
                None => true,
            })
            .collect();
        roots.sort_by_key(|d| d.name.clone());
        if roots.is_empty() {
            anyhow::bail!("--all matched no target datasets{}", schema.map(|s| format!(" in schema {s}")).unwrap_or_default());
        }
        return Ok(roots);
    }

    let Some(name) = target_name else {
        anyhow::bail!("a target dataset name is required unless --all is given");
    };

    let matches: Vec<&TargetDataset> = catalog
        .target_datasets()
        .iter()
        .filter(|d| d.name == name)
        .filter(|d| match schema {
            Some(short) => catalog.target_schema(d.schema).map(|s| s.short_name == short).unwrap_or(false),
            None => true,
        })
        .collect();

    match matches.len() {
        0 => anyhow::bail!("no target dataset named '{name}'{} found", schema.map(|s| format!(" in schema {s}")).unwrap_or_default()),
        1 => Ok(matches),
        _ => anyhow::bail!("target dataset name '{name}' is ambiguous across schemas; pass --schema to disambiguate"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use elevata_catalog_model::{
        CatalogSnapshot, CombinationMode, HashAlgorithm, IncrementalStrategy, MaterializationKind, SurrogateKeyPolicy, TargetColumn,
        TargetDatasetId, TargetSchema, TargetSchemaId,
    };
    use uuid::Uuid;

    fn schema(short: &str) -> TargetSchema {
        TargetSchema {
            id: TargetSchemaId::new(Uuid::new_v4()),
            short_name: short.to_string(),
            physical_prefix: short.to_string(),
            materialization: MaterializationKind::Table,
            historization_default: false,
            incremental_strategy_default: IncrementalStrategy::Full,
            surrogate_keys_enabled: false,
            surrogate_key_policy: SurrogateKeyPolicy {
                algorithm: HashAlgorithm::Sha256,
                null_token: "null_replaced".to_string(),
                component_separator: "|".to_string(),
            },
            consolidate_groups: false,
        }
    }

    fn dataset(schema: TargetSchemaId, name: &str) -> TargetDataset {
        TargetDataset {
            id: TargetDatasetId::new(Uuid::new_v4()),
            schema,
            name: name.to_string(),
            lineage_key: name.to_string(),
            former_names: vec![],
            historize: false,
            handle_deletes: false,
            incremental_strategy: IncrementalStrategy::Full,
            incremental_source: None,
            combination_mode: CombinationMode::Single,
            query_root: None,
            query_head: None,
            is_system_managed: false,
            inputs: vec![],
            columns: Vec::<TargetColumn>::new(),
            references: vec![],
            joins: vec![],
        }
    }

    #[test]
    fn single_name_resolves_one_dataset() {
        let sch = schema("rawcore");
        let ds = dataset(sch.id, "rc_customer");
        let snapshot = CatalogSnapshot { target_schemas: vec![sch], target_datasets: vec![ds], ..Default::default() };

        let roots = select_roots(&snapshot, Some("rc_customer"), None, false).unwrap();
        assert_eq!(roots.len(), 1);
    }

    #[test]
    fn all_scoped_by_schema_filters_out_other_schemas() {
        let rawcore = schema("rawcore");
        let bizcore = schema("bizcore");
        let d1 = dataset(rawcore.id, "rc_a");
        let d2 = dataset(bizcore.id, "bc_b");
        let snapshot =
            CatalogSnapshot { target_schemas: vec![rawcore, bizcore], target_datasets: vec![d1, d2], ..Default::default() };

        let roots = select_roots(&snapshot, None, Some("rawcore"), true).unwrap();
        assert_eq!(roots.len(), 1);
        assert_eq!(roots[0].name, "rc_a");
    }

    #[test]
    fn missing_name_without_all_is_an_error() {
        let snapshot = CatalogSnapshot::default();
        assert!(select_roots(&snapshot, None, None, false).is_err());
    }
}
