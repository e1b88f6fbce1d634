/// One column of a `CREATE TABLE`/rebuild statement, already resolved to a
/// dialect's physical type string.
#[derive(Debug, Clone)]
pub struct ColumnDef {
    pub name: String,
    pub physical_type: String,
    pub nullable: bool,
}

impl ColumnDef {
    pub fn new(name: impl Into<String>, physical_type: impl Into<String>, nullable: bool) -> Self {
        Self {
            name: name.into(),
            physical_type: physical_type.into(),
            nullable,
        }
    }
}

/// A column participating in an `INSERT ... SELECT` rebuild: the destination
/// name/type plus the physical source column it reads from (normally the
/// same name, different only across a rename), and an optional lossy string
/// truncation length.
#[derive(Debug, Clone)]
pub struct RebuildColumn {
    pub name: String,
    pub physical_type: String,
    pub source_name: Option<String>,
    pub truncate_to_length: Option<i32>,
}

impl RebuildColumn {
    pub fn new(name: impl Into<String>, physical_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            physical_type: physical_type.into(),
            source_name: None,
            truncate_to_length: None,
        }
    }

    pub fn source_column_name(&self) -> &str {
        self.source_name.as_deref().unwrap_or(&self.name)
    }
}
