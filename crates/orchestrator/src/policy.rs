/// Run-wide retry/failure-tolerance policy, set once from CLI flags.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExecutionPolicy {
    /// Keep running subsequent datasets after one fails; the run still exits
    /// non-zero overall if anything errored.
    pub continue_on_error: bool,
    /// Additional attempts (beyond the first) for a dataset whose execution fails.
    pub max_retries: u32,
}

/// Gating flags that shape how aggressively the materialization planner is
/// allowed to evolve schema, layered on top of `elevata_materialize::MaterializationPolicy`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TypeDriftPolicy {
    /// Strip all column-evolution steps from the materialization plan;
    /// any remaining drift blocks unless `allow_lossy_type_drift` is set.
    pub no_type_changes: bool,
    /// Block the run if any drift at all is detected, not just narrowing/incompatible.
    pub fail_on_type_drift: bool,
    /// Allow narrowing/incompatible drift to proceed via rebuild.
    pub allow_lossy_type_drift: bool,
}
