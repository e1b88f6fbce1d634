use elevata_catalog_model::{
    CombinationMode, IncrementalStrategy, SourceColumnId, SourceDatasetId, SystemRole,
    TargetColumnId, TargetSchemaId,
};
use elevata_types::CanonicalType;

/// How a stage/rawcore bucket's contributing branches are combined when more
/// than one source dataset maps to the same physical name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsolidationMode {
    /// Single contributing source dataset; no union needed.
    None,
    /// Every branch carries its own business-key identity; a plain `UNION ALL`
    /// is enough to disambiguate rows.
    Identity,
    /// At least one branch has no identity id; branches are ranked by
    /// `__src_rank_ord` and deduplicated with `ROW_NUMBER() ... WHERE _rn = 1`.
    Ranked,
}

#[derive(Debug, Clone)]
pub enum ColumnDraftSource {
    SourceColumn(SourceColumnId),
    UpstreamTargetColumn(TargetColumnId),
}

/// A not-yet-persisted column, the unit the generation service proposes for
/// upsert into a `TargetDataset`.
#[derive(Debug, Clone)]
pub struct TargetColumnDraft {
    pub name: String,
    pub ordinal_position: i32,
    pub canonical_type: CanonicalType,
    pub length: Option<i32>,
    pub precision: Option<i32>,
    pub scale: Option<i32>,
    pub system_role: SystemRole,
    pub surrogate_expression: Option<String>,
    pub manual_expression: Option<String>,
    pub lineage_key: String,
    pub former_names: Vec<String>,
    pub source: Option<ColumnDraftSource>,
}

impl TargetColumnDraft {
    pub fn mapped(
        name: impl Into<String>,
        ordinal_position: i32,
        canonical_type: CanonicalType,
        lineage_key: impl Into<String>,
        source: ColumnDraftSource,
    ) -> Self {
        Self {
            name: name.into(),
            ordinal_position,
            canonical_type,
            length: None,
            precision: None,
            scale: None,
            system_role: SystemRole::None,
            surrogate_expression: None,
            manual_expression: None,
            lineage_key: lineage_key.into(),
            former_names: vec![],
            source,
        }
    }

    pub fn technical(
        name: impl Into<String>,
        ordinal_position: i32,
        canonical_type: CanonicalType,
        system_role: SystemRole,
    ) -> Self {
        let name = name.into();
        Self {
            lineage_key: name.clone(),
            name,
            ordinal_position,
            canonical_type,
            length: None,
            precision: None,
            scale: None,
            system_role,
            surrogate_expression: None,
            manual_expression: None,
            former_names: vec![],
            source: None,
        }
    }
}

/// A not-yet-persisted dataset, the unit the generation service proposes for
/// upsert against the catalog's `target_dataset_by_lineage_key` lookup.
#[derive(Debug, Clone)]
pub struct TargetDatasetDraft {
    pub schema: TargetSchemaId,
    pub name: String,
    pub lineage_key: String,
    pub historize: bool,
    pub incremental_strategy: IncrementalStrategy,
    pub incremental_source: Option<SourceDatasetId>,
    pub combination_mode: CombinationMode,
    pub consolidation: ConsolidationMode,
    pub contributing_source_datasets: Vec<SourceDatasetId>,
    pub columns: Vec<TargetColumnDraft>,
}
