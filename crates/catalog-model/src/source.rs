use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use elevata_types::CanonicalType;

use crate::ids::{SourceColumnId, SourceDatasetGroupId, SourceDatasetId, SourceSystemId};

/// A source system registered in the catalog (an ERP, a file drop, a REST API, ...).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceSystem {
    pub id: SourceSystemId,
    /// Lowercase letter + `[a-z0-9]`, at most 10 chars. Validated by `elevata_naming`.
    pub short_name: String,
    pub is_source: bool,
    pub is_target: bool,
    /// Dialect/kind this system speaks, e.g. "postgres", "sap_hana", "rest".
    pub kind: String,
    /// Business grouping short name used when consolidating stage datasets.
    pub target_short_name: Option<String>,
    pub active: bool,
    pub retired_at: Option<DateTime<Utc>>,
}

impl SourceSystem {
    /// The short name used to bucket this system's datasets into stage/rawcore,
    /// falling back to the system's own identity when no business group applies.
    pub fn effective_target_short_name(&self) -> &str {
        self.target_short_name.as_deref().unwrap_or(&self.short_name)
    }
}

/// A source-side dataset (table, file feed, REST resource) owned by a `SourceSystem`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceDataset {
    pub id: SourceDatasetId,
    pub source_system: SourceSystemId,
    pub schema_name: String,
    pub source_dataset_name: String,
    pub integrate: bool,
    pub incremental: bool,
    pub active: bool,
    /// SQL predicate fragment, always applied (e.g. soft-delete filters).
    pub static_filter: Option<String>,
    /// SQL predicate fragment containing a `{{DELTA_CUTOFF}}` placeholder, applied
    /// only when the dataset is resolved as an incremental source.
    pub increment_filter: Option<String>,
    pub increment_policies: Vec<IncrementPolicy>,
}

impl SourceDataset {
    /// The single `active=true` policy for `environment`, if any.
    ///
    /// The catalog invariant guarantees at most one active row per environment;
    /// this just defends against a caller handing us a stale snapshot.
    pub fn active_increment_policy(&self, environment: &str) -> Option<&IncrementPolicy> {
        self.increment_policies
            .iter()
            .filter(|p| p.environment == environment && p.active)
            .last()
    }
}

/// Per-environment incremental watermark policy for a `SourceDataset`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncrementPolicy {
    pub environment: String,
    pub active: bool,
    /// The cutoff value substituted for `{{DELTA_CUTOFF}}`, already rendered
    /// as a dialect-neutral literal expression (e.g. an ISO timestamp string).
    pub delta_cutoff: Option<String>,
}

/// A single column of a `SourceDataset`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceColumn {
    pub id: SourceColumnId,
    pub dataset: SourceDatasetId,
    pub name: String,
    pub ordinal_position: i32,
    pub canonical_type: CanonicalType,
    pub length: Option<i32>,
    pub precision: Option<i32>,
    pub scale: Option<i32>,
    pub primary_key_column: bool,
    pub integrate: bool,
}

/// Collapses N source systems' equivalent datasets into one logical stage entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceDatasetGroup {
    pub id: SourceDatasetGroupId,
    /// Business short name the group collapses to, e.g. `"sap"`.
    pub target_short_name: String,
    /// The unified dataset name the group collapses to, e.g. `"kna1"`.
    pub unified_source_dataset_name: String,
    pub memberships: Vec<SourceDatasetGroupMembership>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceDatasetGroupMembership {
    pub source_dataset: SourceDatasetId,
    pub is_primary_system: bool,
    /// Business-key column name carrying the contributing system's identity,
    /// added to the stage/rawcore bucket as `source_identity_id` when set on
    /// any membership of the bucket.
    pub source_identity_id: Option<String>,
    /// Tie-break rank among sibling branches in ranked-mode consolidation.
    pub source_identity_ordinal: i32,
}
