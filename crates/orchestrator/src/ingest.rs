use elevata_catalog_model::{SourceDataset, SourceSystem};

use crate::error::OrchestratorError;

/// How a RAW target dataset's source gets data into the target system,
/// resolved once per run from the owning `SourceSystem.kind`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestMode {
    /// Relational pull via a connection descriptor (the common case).
    Native,
    /// RAW is populated by an external tool; ingestion is a no-op.
    External,
    /// `integrate=false`: this source never lands in RAW.
    None,
}

/// `integrate=false` short-circuits to `None` regardless of system kind;
/// otherwise a `"file"`/`"rest"` system kind is still ingested natively by
/// the dispatcher (it just picks a different connector), so only an
/// explicit non-integrating or inactive dataset yields anything but
/// `Native`. Systems marked `is_target` only (not `is_source`) ingest
/// externally: their RAW landing is assumed to be populated out-of-band.
pub fn resolve_ingest_mode(source_system: &SourceSystem, source_dataset: &SourceDataset) -> IngestMode {
    if !source_dataset.integrate || !source_dataset.active {
        return IngestMode::None;
    }
    if !source_system.is_source {
        return IngestMode::External;
    }
    IngestMode::Native
}

/// The kind of connector the ingestion dispatcher picks for a `Native` pull.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectorKind {
    Relational,
    File,
    Rest,
}

impl ConnectorKind {
    pub fn for_system_kind(kind: &str) -> Self {
        match kind {
            "file" => ConnectorKind::File,
            "rest" => ConnectorKind::Rest,
            _ => ConnectorKind::Relational,
        }
    }
}

/// Connection shape handed to an `IngestionDispatcher`. Secret resolution
/// (the Django `DbSecret` equivalent) lives outside the core; this only
/// carries the non-secret coordinates plus an opaque `extra` bag.
#[derive(Debug, Clone, Default)]
pub struct ConnectionDescriptor {
    pub dialect: String,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub database: Option<String>,
    pub schema: Option<String>,
    pub username: Option<String>,
    pub extra: std::collections::BTreeMap<String, String>,
}

/// Outcome of a single ingestion dispatch, independent of connector kind.
#[derive(Debug, Clone, Default)]
pub struct IngestionOutcome {
    pub rows_ingested: u64,
    pub bytes_ingested: u64,
    pub cursor_advanced_to: Option<String>,
}

/// The seam between the orchestrator and a concrete relational/file/REST
/// puller. Implementations are an external collaborator; the core only
/// models the dispatch decision and the typed result.
pub trait IngestionDispatcher {
    fn ingest(
        &mut self,
        connector: ConnectorKind,
        source_dataset: &SourceDataset,
        connection: &ConnectionDescriptor,
        chunk_size: usize,
    ) -> Result<IngestionOutcome, OrchestratorError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use elevata_catalog_model::{SourceDatasetId, SourceSystemId};
    use uuid::Uuid;

    fn system(kind: &str, is_source: bool) -> SourceSystem {
        SourceSystem {
            id: SourceSystemId::new(Uuid::new_v4()),
            short_name: "sap1".to_string(),
            is_source,
            is_target: false,
            kind: kind.to_string(),
            target_short_name: None,
            active: true,
            retired_at: None,
        }
    }

    fn dataset(integrate: bool, active: bool) -> SourceDataset {
        SourceDataset {
            id: SourceDatasetId::new(Uuid::new_v4()),
            source_system: SourceSystemId::new(Uuid::new_v4()),
            schema_name: "dbo".to_string(),
            source_dataset_name: "kna1".to_string(),
            integrate,
            incremental: false,
            active,
            static_filter: None,
            increment_filter: None,
            increment_policies: vec![],
        }
    }

    #[test]
    fn non_integrating_dataset_is_none() {
        let sys = system("postgres", true);
        let ds = dataset(false, true);
        assert_eq!(resolve_ingest_mode(&sys, &ds), IngestMode::None);
    }

    #[test]
    fn source_system_ingests_natively() {
        let sys = system("postgres", true);
        let ds = dataset(true, true);
        assert_eq!(resolve_ingest_mode(&sys, &ds), IngestMode::Native);
    }

    #[test]
    fn target_only_system_ingests_externally() {
        let sys = system("postgres", false);
        let ds = dataset(true, true);
        assert_eq!(resolve_ingest_mode(&sys, &ds), IngestMode::External);
    }

    #[test]
    fn connector_kind_follows_system_kind() {
        assert_eq!(ConnectorKind::for_system_kind("file"), ConnectorKind::File);
        assert_eq!(ConnectorKind::for_system_kind("rest"), ConnectorKind::Rest);
        assert_eq!(ConnectorKind::for_system_kind("sap_hana"), ConnectorKind::Relational);
    }
}
