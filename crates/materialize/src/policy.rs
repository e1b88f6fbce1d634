use std::collections::HashSet;

/// Knobs the orchestrator/CLI fold into the planner call, grounded on the
/// `--no-type-changes`/`--fail-on-type-drift`/`--allow-lossy-type-drift` CLI
/// flags and the `ELEVATA_AUTO_PROVISION_TABLES` environment switch.
#[derive(Debug, Clone)]
pub struct MaterializationPolicy {
    /// Schemas whose tables get DDL auto-provisioning/column-evolution sync.
    pub sync_schema_shorts: HashSet<String>,
    pub auto_provision_tables: bool,
    pub debug_plan: bool,
    /// Suppress blocking on narrowing/incompatible drift; the database may
    /// still reject the DDL, which then surfaces as an execution error.
    pub allow_lossy_type_drift: bool,
}

impl Default for MaterializationPolicy {
    fn default() -> Self {
        Self {
            sync_schema_shorts: ["stage", "rawcore", "bizcore", "serving"].iter().map(|s| s.to_string()).collect(),
            auto_provision_tables: true,
            debug_plan: false,
            allow_lossy_type_drift: false,
        }
    }
}
