use std::collections::{BTreeSet, HashSet};

use elevata_catalog_model::{Catalog, DatasetInputSource, TargetDataset, TargetDatasetId};

use crate::error::OrchestratorError;

/// Topologically sorts `root` and every upstream `TargetDatasetInput` it
/// (transitively) depends on, so that every dependency is executed before
/// its dependent. Deterministic: ties are broken by `(schema, name)` so two
/// runs over the same catalog always produce the same order.
pub fn resolve_execution_order<'a>(catalog: &'a dyn Catalog, root: &'a TargetDataset) -> Result<Vec<&'a TargetDataset>, OrchestratorError> {
    resolve_execution_order_all(catalog, &[root])
}

/// Same as [`resolve_execution_order`], but over multiple roots at once
/// (the `--all` / scoped-`--all` case). The resulting order interleaves
/// shared dependencies exactly once, in dependency-first order.
pub fn resolve_execution_order_all<'a>(catalog: &'a dyn Catalog, roots: &[&'a TargetDataset]) -> Result<Vec<&'a TargetDataset>, OrchestratorError> {
    let mut visited: HashSet<TargetDatasetId> = HashSet::new();
    let mut visiting: HashSet<TargetDatasetId> = HashSet::new();
    let mut order: Vec<&TargetDataset> = Vec::new();

    let mut sorted_roots: Vec<&TargetDataset> = roots.to_vec();
    sort_by_key(catalog, &mut sorted_roots);

    for root in sorted_roots {
        visit(catalog, root, &mut visited, &mut visiting, &mut order)?;
    }

    Ok(order)
}

fn visit<'a>(
    catalog: &'a dyn Catalog,
    dataset: &'a TargetDataset,
    visited: &mut HashSet<TargetDatasetId>,
    visiting: &mut HashSet<TargetDatasetId>,
    order: &mut Vec<&'a TargetDataset>,
) -> Result<(), OrchestratorError> {
    if visited.contains(&dataset.id) {
        return Ok(());
    }
    if !visiting.insert(dataset.id) {
        return Err(OrchestratorError::NameValidationError(format!(
            "cyclic TargetDatasetInput dependency detected at dataset {}",
            dataset.name
        )));
    }

    let mut upstream: Vec<&TargetDataset> = dataset
        .inputs
        .iter()
        .filter_map(|input| match input.source {
            DatasetInputSource::UpstreamTarget(id) => catalog.target_dataset(id),
            DatasetInputSource::Source(_) => None,
        })
        .collect();
    sort_by_key(catalog, &mut upstream);

    for up in upstream {
        visit(catalog, up, visited, visiting, order)?;
    }

    visiting.remove(&dataset.id);
    visited.insert(dataset.id);
    order.push(dataset);
    Ok(())
}

fn sort_by_key(catalog: &dyn Catalog, datasets: &mut [&TargetDataset]) {
    datasets.sort_by(|a, b| {
        let schema_a = catalog.target_schema(a.schema).map(|s| s.short_name.as_str()).unwrap_or("");
        let schema_b = catalog.target_schema(b.schema).map(|s| s.short_name.as_str()).unwrap_or("");
        (schema_a, a.name.as_str()).cmp(&(schema_b, b.name.as_str()))
    });
}

/// Every `TargetDatasetId` reachable upstream from `roots`, used by the
/// `--schema` filter when scoping `--all` to datasets whose dependencies
/// may live in other schemas.
pub fn reachable_upstream_ids(catalog: &dyn Catalog, roots: &[&TargetDataset]) -> BTreeSet<TargetDatasetId> {
    let mut seen = BTreeSet::new();
    let mut stack: Vec<TargetDatasetId> = roots.iter().map(|d| d.id).collect();
    while let Some(id) = stack.pop() {
        if !seen.insert(id) {
            continue;
        }
        if let Some(dataset) = catalog.target_dataset(id) {
            for input in &dataset.inputs {
                if let DatasetInputSource::UpstreamTarget(up) = input.source {
                    stack.push(up);
                }
            }
        }
    }
    seen
}

#[cfg(test)]
mod tests {
    use super::*;
    use elevata_catalog_model::{
        CatalogSnapshot, CombinationMode, DatasetInputSource, IncrementalStrategy, InputRole, TargetColumn,
        TargetDatasetInput, TargetDatasetInputId, TargetSchema, TargetSchemaId,
    };
    use elevata_catalog_model::{HashAlgorithm, MaterializationKind, SurrogateKeyPolicy};
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

    fn dataset(schema: TargetSchemaId, name: &str, inputs: Vec<TargetDatasetInput>) -> TargetDataset {
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
            inputs,
            columns: Vec::<TargetColumn>::new(),
            references: vec![],
            joins: vec![],
        }
    }

    #[test]
    fn orders_dependencies_before_dependents() {
        let sch = schema("rawcore");
        let upstream = dataset(sch.id, "rc_a", vec![]);
        let downstream_input = TargetDatasetInput {
            id: TargetDatasetInputId::new(Uuid::new_v4()),
            dataset: TargetDatasetId::new(Uuid::new_v4()),
            source: DatasetInputSource::UpstreamTarget(upstream.id),
            role: InputRole::Primary,
        };
        let downstream = dataset(sch.id, "rc_b", vec![downstream_input]);

        let snapshot = CatalogSnapshot {
            target_schemas: vec![sch],
            target_datasets: vec![upstream.clone(), downstream.clone()],
            ..Default::default()
        };

        let order = resolve_execution_order(&snapshot, snapshot.target_dataset(downstream.id).unwrap()).unwrap();
        let names: Vec<&str> = order.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["rc_a", "rc_b"]);
    }

    #[test]
    fn detects_cycles() {
        let sch = schema("rawcore");
        let a_id = TargetDatasetId::new(Uuid::new_v4());
        let b_id = TargetDatasetId::new(Uuid::new_v4());

        let a = TargetDataset {
            inputs: vec![TargetDatasetInput {
                id: TargetDatasetInputId::new(Uuid::new_v4()),
                dataset: a_id,
                source: DatasetInputSource::UpstreamTarget(b_id),
                role: InputRole::Primary,
            }],
            ..dataset(sch.id, "rc_a", vec![])
        };
        let mut a = a;
        a.id = a_id;

        let b = TargetDataset {
            inputs: vec![TargetDatasetInput {
                id: TargetDatasetInputId::new(Uuid::new_v4()),
                dataset: b_id,
                source: DatasetInputSource::UpstreamTarget(a_id),
                role: InputRole::Primary,
            }],
            ..dataset(sch.id, "rc_b", vec![])
        };
        let mut b = b;
        b.id = b_id;

        let snapshot = CatalogSnapshot {
            target_schemas: vec![sch],
            target_datasets: vec![a.clone(), b],
            ..Default::default()
        };

        let result = resolve_execution_order(&snapshot, snapshot.target_dataset(a_id).unwrap());
        assert!(result.is_err());
    }
}
