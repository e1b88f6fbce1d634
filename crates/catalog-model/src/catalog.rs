use crate::ids::{
    SourceColumnId, SourceDatasetId, SourceSystemId, TargetColumnId, TargetDatasetId,
    TargetSchemaId,
};
use crate::query_tree::QueryNode;
use crate::source::{SourceColumn, SourceDataset, SourceDatasetGroup, SourceSystem};
use crate::target::{TargetColumn, TargetDataset, TargetSchema};

/// Read-only view over the metadata store. CRUD, persistence, and the
/// editor UI are external collaborators; the core only ever reads through
/// this interface.
pub trait Catalog {
    fn source_systems(&self) -> &[SourceSystem];
    fn source_system(&self, id: SourceSystemId) -> Option<&SourceSystem>;

    fn source_datasets(&self) -> &[SourceDataset];
    fn source_dataset(&self, id: SourceDatasetId) -> Option<&SourceDataset>;
    fn source_columns(&self, dataset: SourceDatasetId) -> Vec<&SourceColumn>;
    /// Global lookup by id, independent of which dataset owns the column.
    fn source_column(&self, id: SourceColumnId) -> Option<&SourceColumn> {
        self.source_datasets()
            .iter()
            .flat_map(|d| self.source_columns(d.id))
            .find(|c| c.id == id)
    }

    fn source_dataset_groups(&self) -> &[SourceDatasetGroup];
    /// The group (if any) a given source dataset belongs to, via its memberships.
    fn group_for_source_dataset(&self, dataset: SourceDatasetId) -> Option<&SourceDatasetGroup> {
        self.source_dataset_groups().iter().find(|g| {
            g.memberships
                .iter()
                .any(|m| m.source_dataset == dataset)
        })
    }

    fn target_schemas(&self) -> &[TargetSchema];
    fn target_schema(&self, id: TargetSchemaId) -> Option<&TargetSchema>;

    fn target_datasets(&self) -> &[TargetDataset];
    fn target_dataset(&self, id: TargetDatasetId) -> Option<&TargetDataset>;
    fn target_datasets_in_schema(&self, schema: TargetSchemaId) -> Vec<&TargetDataset> {
        self.target_datasets()
            .iter()
            .filter(|d| d.schema == schema)
            .collect()
    }
    /// Resolution order used by the generation service's upsert: lineage key first.
    fn target_dataset_by_lineage_key(&self, key: &str) -> Option<&TargetDataset> {
        self.target_datasets().iter().find(|d| d.lineage_key == key)
    }
    /// Global lookup by id, independent of which dataset owns the column.
    fn target_column(&self, id: TargetColumnId) -> Option<&TargetColumn> {
        self.target_datasets()
            .iter()
            .find_map(|d| d.find_column_by_id(id))
    }

    fn query_node(&self, id: crate::ids::QueryNodeId) -> Option<&QueryNode>;
}

/// A full point-in-time snapshot of catalog state, held in memory.
///
/// This is the fixture implementation used by core tests and by any caller
/// (e.g. a CLI) that loads the whole catalog upfront rather than querying it
/// incrementally.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct CatalogSnapshot {
    pub source_systems: Vec<SourceSystem>,
    pub source_datasets: Vec<SourceDataset>,
    pub source_columns: Vec<SourceColumn>,
    pub source_dataset_groups: Vec<SourceDatasetGroup>,
    pub target_schemas: Vec<TargetSchema>,
    pub target_datasets: Vec<TargetDataset>,
    pub query_nodes: Vec<QueryNode>,
}

impl Catalog for CatalogSnapshot {
    fn source_systems(&self) -> &[SourceSystem] {
        &self.source_systems
    }

    fn source_system(&self, id: SourceSystemId) -> Option<&SourceSystem> {
        self.source_systems.iter().find(|s| s.id == id)
    }

    fn source_datasets(&self) -> &[SourceDataset] {
        &self.source_datasets
    }

    fn source_dataset(&self, id: SourceDatasetId) -> Option<&SourceDataset> {
        self.source_datasets.iter().find(|d| d.id == id)
    }

    fn source_columns(&self, dataset: SourceDatasetId) -> Vec<&SourceColumn> {
        let mut cols: Vec<&SourceColumn> = self
            .source_columns
            .iter()
            .filter(|c| c.dataset == dataset)
            .collect();
        cols.sort_by_key(|c| c.ordinal_position);
        cols
    }

    fn source_dataset_groups(&self) -> &[SourceDatasetGroup] {
        &self.source_dataset_groups
    }

    fn target_schemas(&self) -> &[TargetSchema] {
        &self.target_schemas
    }

    fn target_schema(&self, id: TargetSchemaId) -> Option<&TargetSchema> {
        self.target_schemas.iter().find(|s| s.id == id)
    }

    fn target_datasets(&self) -> &[TargetDataset] {
        &self.target_datasets
    }

    fn target_dataset(&self, id: TargetDatasetId) -> Option<&TargetDataset> {
        self.target_datasets.iter().find(|d| d.id == id)
    }

    fn query_node(&self, id: crate::ids::QueryNodeId) -> Option<&QueryNode> {
        self.query_nodes.iter().find(|n| n.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::SourceSystem;
    use uuid::Uuid;

    fn system(id: Uuid, short_name: &str) -> SourceSystem {
        SourceSystem {
            id: SourceSystemId::new(id),
            short_name: short_name.to_string(),
            is_source: true,
            is_target: false,
            kind: "postgres".to_string(),
            target_short_name: None,
            active: true,
            retired_at: None,
        }
    }

    #[test]
    fn finds_source_system_by_id() {
        let id = Uuid::new_v4();
        let snapshot = CatalogSnapshot {
            source_systems: vec![system(id, "crm")],
            ..Default::default()
        };
        assert_eq!(
            snapshot.source_system(SourceSystemId::new(id)).unwrap().short_name,
            "crm"
        );
        assert!(snapshot
            .source_system(SourceSystemId::new(Uuid::new_v4()))
            .is_none());
    }

    #[test]
    fn source_columns_are_ordinal_sorted() {
        use crate::source::SourceColumn;
        use elevata_types::CanonicalType;

        let dataset = SourceDatasetId::new(Uuid::new_v4());
        let col = |ordinal: i32, name: &str| SourceColumn {
            id: crate::ids::SourceColumnId::new(Uuid::new_v4()),
            dataset,
            name: name.to_string(),
            ordinal_position: ordinal,
            canonical_type: CanonicalType::String,
            length: None,
            precision: None,
            scale: None,
            primary_key_column: false,
            integrate: true,
        };
        let snapshot = CatalogSnapshot {
            source_columns: vec![col(2, "b"), col(1, "a")],
            ..Default::default()
        };
        let ordered: Vec<&str> = snapshot
            .source_columns(dataset)
            .into_iter()
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(ordered, vec!["a", "b"]);
    }
}
