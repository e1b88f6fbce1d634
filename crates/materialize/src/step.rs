use std::collections::BTreeMap;

/// One typed operation in a materialization plan. Mirrors the step
/// vocabulary a dialect-neutral applier can execute without knowing why the
/// planner chose it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaterializationOp {
    EnsureSchema,
    RenameDataset,
    RenameColumn,
    AddColumn,
    AlterColumnType,
    DropTableIfExists,
    CreateTable,
    InsertSelect,
    DropTable,
    RenameTable,
}

impl MaterializationOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            MaterializationOp::EnsureSchema => "ENSURE_SCHEMA",
            MaterializationOp::RenameDataset => "RENAME_DATASET",
            MaterializationOp::RenameColumn => "RENAME_COLUMN",
            MaterializationOp::AddColumn => "ADD_COLUMN",
            MaterializationOp::AlterColumnType => "ALTER_COLUMN_TYPE",
            MaterializationOp::DropTableIfExists => "DROP_TABLE_IF_EXISTS",
            MaterializationOp::CreateTable => "CREATE_TABLE",
            MaterializationOp::InsertSelect => "INSERT_SELECT",
            MaterializationOp::DropTable => "DROP_TABLE",
            MaterializationOp::RenameTable => "RENAME_TABLE",
        }
    }
}

#[derive(Debug, Clone)]
pub struct MaterializationStep {
    pub op: MaterializationOp,
    pub sql: String,
    pub metadata: BTreeMap<String, String>,
}

impl MaterializationStep {
    pub fn new(op: MaterializationOp, sql: impl Into<String>) -> Self {
        Self { op, sql: sql.into(), metadata: BTreeMap::new() }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// Output of the materialization planner: ordered steps plus deterministic
/// drift findings. `blocking_errors` must stop execution before any step
/// runs; `warnings` are informational (surfaced, never fatal on their own).
#[derive(Debug, Clone, Default)]
pub struct MaterializationPlan {
    pub steps: Vec<MaterializationStep>,
    pub warnings: Vec<String>,
    pub blocking_errors: Vec<String>,
}

impl MaterializationPlan {
    /// True once any step beyond a bare schema-ensure touches the table
    /// itself. `ENSURE_SCHEMA` alone never counts as provisioning.
    pub fn did_provision(&self) -> bool {
        self.steps.iter().any(|s| s.op != MaterializationOp::EnsureSchema)
    }

    pub fn retain_ops(&mut self, keep: &[MaterializationOp]) {
        self.steps.retain(|s| keep.contains(&s.op));
    }

    pub fn drop_ops(&mut self, drop: &[MaterializationOp]) {
        self.steps.retain(|s| !drop.contains(&s.op));
    }
}
