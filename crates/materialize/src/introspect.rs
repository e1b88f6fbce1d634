use elevata_types::PhysicalType;

use crate::error::MaterializeError;

#[derive(Debug, Clone)]
pub struct IntrospectedColumn {
    pub name: String,
    pub physical_type: PhysicalType,
    pub nullable: bool,
}

#[derive(Debug, Clone)]
pub struct IntrospectedTable {
    /// The table name as it actually exists in the warehouse right now —
    /// may be one of the dataset's `former_names` rather than its current
    /// `name`, if a rename hasn't been applied yet.
    pub actual_name: String,
    pub columns: Vec<IntrospectedColumn>,
}

impl IntrospectedTable {
    pub fn find_column(&self, name: &str) -> Option<&IntrospectedColumn> {
        self.columns.iter().find(|c| c.name == name)
    }
}

/// Reads the physical shape of a target table from the warehouse.
///
/// Implementations vary per engine: SQLAlchemy-style reflection where
/// available, or `SHOW TABLES`/`DESCRIBE` round-trips (Databricks) where the
/// execution engine can only run SQL. Looks up by the dataset's current name
/// first, then each of `former_names`, so the planner can detect a pending
/// rename.
pub trait TableIntrospector {
    fn introspect_table(&self, schema: &str, table: &str) -> Result<Option<IntrospectedTable>, MaterializeError>;

    fn introspect_target(
        &self,
        schema: &str,
        current_name: &str,
        former_names: &[String],
    ) -> Result<Option<IntrospectedTable>, MaterializeError> {
        if let Some(found) = self.introspect_table(schema, current_name)? {
            return Ok(Some(found));
        }
        for former in former_names {
            if let Some(found) = self.introspect_table(schema, former)? {
                return Ok(Some(found));
            }
        }
        Ok(None)
    }
}
