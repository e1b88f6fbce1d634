mod bigquery;
mod column;
mod databricks;
mod duckdb;
mod error;
mod fabric_warehouse;
mod mssql;
mod params;
mod postgres;
mod snowflake;
mod sql_dialect;

pub use bigquery::BigQueryDialect;
pub use column::{ColumnDef, RebuildColumn};
pub use databricks::DatabricksDialect;
pub use duckdb::DuckDbDialect;
pub use error::DialectError;
pub use fabric_warehouse::FabricWarehouseDialect;
pub use mssql::MssqlDialect;
pub use params::{HistIncrementalParams, HistInsertParams, MergeParams};
pub use postgres::PostgresDialect;
pub use snowflake::SnowflakeDialect;
pub use sql_dialect::{parse_canonical_type_token, simple_params, SqlDialect};

use elevata_types::Dialect;

/// Resolves the shared dialect enum to its concrete `SqlDialect` renderer.
pub fn for_dialect(dialect: Dialect) -> Box<dyn SqlDialect> {
    match dialect {
        Dialect::DuckDb => Box::new(DuckDbDialect),
        Dialect::Postgres => Box::new(PostgresDialect),
        Dialect::Mssql => Box::new(MssqlDialect),
        Dialect::FabricWarehouse => Box::new(FabricWarehouseDialect),
        Dialect::Snowflake => Box::new(SnowflakeDialect),
        Dialect::BigQuery => Box::new(BigQueryDialect),
        Dialect::Databricks => Box::new(DatabricksDialect),
    }
}
