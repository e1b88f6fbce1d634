use std::fmt;

/// The set of SQL engines the renderer and type mapper know about.
///
/// This is the one enum shared by `elevata-types` and `elevata-dialect`: the
/// type mapper needs it to pick a raw-type-name table, the dialect layer
/// needs it to pick a `SqlDialect` implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dialect {
    DuckDb,
    Postgres,
    Mssql,
    FabricWarehouse,
    Snowflake,
    BigQuery,
    Databricks,
}

impl Dialect {
    pub fn all() -> [Dialect; 7] {
        [
            Dialect::DuckDb,
            Dialect::Postgres,
            Dialect::Mssql,
            Dialect::FabricWarehouse,
            Dialect::Snowflake,
            Dialect::BigQuery,
            Dialect::Databricks,
        ]
    }

    pub fn short_name(&self) -> &'static str {
        match self {
            Dialect::DuckDb => "duckdb",
            Dialect::Postgres => "postgres",
            Dialect::Mssql => "mssql",
            Dialect::FabricWarehouse => "fabric_warehouse",
            Dialect::Snowflake => "snowflake",
            Dialect::BigQuery => "bigquery",
            Dialect::Databricks => "databricks",
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

impl std::str::FromStr for Dialect {
    type Err = crate::error::TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "duckdb" => Ok(Dialect::DuckDb),
            "postgres" | "postgresql" => Ok(Dialect::Postgres),
            "mssql" | "sqlserver" => Ok(Dialect::Mssql),
            "fabric_warehouse" | "fabric" => Ok(Dialect::FabricWarehouse),
            "snowflake" => Ok(Dialect::Snowflake),
            "bigquery" => Ok(Dialect::BigQuery),
            "databricks" => Ok(Dialect::Databricks),
            other => Err(crate::error::TypeError::UnknownDialect(other.to_string())),
        }
    }
}
