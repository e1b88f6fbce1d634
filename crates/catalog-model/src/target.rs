use serde::{Deserialize, Serialize};

use elevata_types::CanonicalType;

use crate::ids::{
    SourceColumnId, SourceDatasetId, TargetColumnId, TargetColumnInputId, TargetDatasetId,
    TargetDatasetInputId, TargetDatasetJoinId, TargetDatasetReferenceId, TargetSchemaId,
};

/// One layer of the `raw -> stage -> rawcore -> bizcore -> serving` chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetSchema {
    pub id: TargetSchemaId,
    pub short_name: String,
    pub physical_prefix: String,
    pub materialization: MaterializationKind,
    pub historization_default: bool,
    pub incremental_strategy_default: IncrementalStrategy,
    pub surrogate_keys_enabled: bool,
    pub surrogate_key_policy: SurrogateKeyPolicy,
    /// When true, like-named datasets across source systems collapse into one
    /// physical dataset per `SourceDatasetGroup`/`target_short_name` bucket.
    pub consolidate_groups: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaterializationKind {
    Table,
    View,
    Incremental,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncrementalStrategy {
    Full,
    Append,
    Merge,
    Snapshot,
    Historize,
}

/// Algorithm and formatting knobs for surrogate-key expression generation,
/// defaulted per `TargetSchema` and inherited by every dataset in it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurrogateKeyPolicy {
    pub algorithm: HashAlgorithm,
    pub null_token: String,
    pub component_separator: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HashAlgorithm {
    Sha256,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CombinationMode {
    Single,
    Union,
}

/// A generated or hand-authored physical dataset within a `TargetSchema`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetDataset {
    pub id: TargetDatasetId,
    pub schema: TargetSchemaId,
    pub name: String,
    /// Stable across renames; the upsert key the generation service looks up by.
    pub lineage_key: String,
    pub former_names: Vec<String>,
    pub historize: bool,
    pub handle_deletes: bool,
    pub incremental_strategy: IncrementalStrategy,
    pub incremental_source: Option<SourceDatasetId>,
    pub combination_mode: CombinationMode,
    pub query_root: Option<crate::ids::QueryNodeId>,
    pub query_head: Option<crate::ids::QueryNodeId>,
    /// Locks mutable attributes so the generation service won't clobber
    /// hand-authored overrides on an otherwise system-managed dataset.
    pub is_system_managed: bool,
    pub inputs: Vec<TargetDatasetInput>,
    pub columns: Vec<TargetColumn>,
    pub references: Vec<TargetDatasetReference>,
    pub joins: Vec<TargetDatasetJoin>,
}

impl TargetDataset {
    pub fn surrogate_key_column_name(&self) -> String {
        elevata_naming::build_surrogate_key_name(&self.name)
    }

    pub fn hist_dataset_name(&self) -> String {
        elevata_naming::build_hist_name(&self.name)
    }

    pub fn active_columns(&self) -> impl Iterator<Item = &TargetColumn> {
        self.columns.iter().filter(|c| c.active)
    }

    pub fn find_column(&self, name: &str) -> Option<&TargetColumn> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn find_column_by_id(&self, id: TargetColumnId) -> Option<&TargetColumn> {
        self.columns.iter().find(|c| c.id == id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SystemRole {
    SurrogateKey,
    ForeignKey,
    BusinessKey,
    EntityKey,
    RowHash,
    LoadRunId,
    LoadedAt,
    VersionStartedAt,
    VersionEndedAt,
    VersionState,
    #[serde(rename = "")]
    None,
}

impl SystemRole {
    pub fn is_technical(&self) -> bool {
        matches!(
            self,
            SystemRole::LoadRunId
                | SystemRole::LoadedAt
                | SystemRole::VersionStartedAt
                | SystemRole::VersionEndedAt
                | SystemRole::VersionState
        )
    }

    pub fn is_key(&self) -> bool {
        matches!(
            self,
            SystemRole::SurrogateKey
                | SystemRole::ForeignKey
                | SystemRole::BusinessKey
                | SystemRole::EntityKey
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetColumn {
    pub id: TargetColumnId,
    pub dataset: TargetDatasetId,
    pub name: String,
    pub ordinal_position: i32,
    pub canonical_type: CanonicalType,
    pub length: Option<i32>,
    pub precision: Option<i32>,
    pub scale: Option<i32>,
    pub system_role: SystemRole,
    /// Surrogate/FK DSL expression, see `elevata_expr::dsl`.
    pub surrogate_expression: Option<String>,
    /// Hand-authored SQL expression for columns with no `input_links` mapping.
    pub manual_expression: Option<String>,
    pub former_names: Vec<String>,
    pub lineage_key: String,
    pub active: bool,
    pub inputs: Vec<TargetColumnInput>,
}

/// Edge from a `TargetDataset` to one of its upstream inputs (source or target).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetDatasetInput {
    pub id: TargetDatasetInputId,
    pub dataset: TargetDatasetId,
    pub source: DatasetInputSource,
    pub role: InputRole,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DatasetInputSource {
    Source(SourceDatasetId),
    UpstreamTarget(TargetDatasetId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputRole {
    Primary,
    Enrichment,
    ReferenceLookup,
    AuditOnly,
}

/// Edge from a `TargetColumn` to the single upstream column it maps from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetColumnInput {
    pub id: TargetColumnInputId,
    pub column: TargetColumnId,
    pub source: ColumnInputSource,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ColumnInputSource {
    SourceColumn(SourceColumnId),
    UpstreamTargetColumn(TargetColumnId),
}

/// A parent-child FK relationship. Generates a system-managed FK column on
/// the child dataset with `lineage_key = "fk:<ref_id>"`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetDatasetReference {
    pub id: TargetDatasetReferenceId,
    pub parent: TargetDatasetId,
    pub child: TargetDatasetId,
    pub key_components: Vec<KeyComponent>,
}

impl TargetDatasetReference {
    pub fn lineage_key(&self) -> String {
        format!("fk:{}", self.id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyComponent {
    /// Parent business-key column this component binds to.
    pub parent_column: TargetColumnId,
    /// Ordinal position within the composite key.
    pub ordinal: i32,
    /// DSL expression, resolved in the child dataset's own scope, that
    /// supplies the value matching `parent_column` on the child side.
    /// Substituted for the parent column's name when the FK surrogate
    /// expression is rewritten from the parent's SK expression.
    pub child_expression: String,
}

/// An explicit multi-input join used by bizcore/serving datasets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetDatasetJoin {
    pub id: TargetDatasetJoinId,
    pub dataset: TargetDatasetId,
    /// Unique per dataset; join #1's `left_input` anchors the FROM clause.
    pub join_order: i32,
    pub left_input: TargetDatasetInputId,
    pub right_input: TargetDatasetInputId,
    pub join_type: JoinType,
    pub predicates: Vec<JoinPredicate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinType {
    Inner,
    Left,
    Right,
    Full,
    Cross,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinPredicate {
    pub left_expr: String,
    pub operator: String,
    pub right_expr: String,
}
