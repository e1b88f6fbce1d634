//! The one concrete [`ExecutionEngine`]/[`TableIntrospector`] backend this
//! reference build ships: a Postgres connection via `sqlx`, the same crate
//! `crates/migrate/src/lib.rs` uses for its `PgPool`. Every other dialect in
//! `Dialect::all()` renders correctly but has no wired connector here — the
//! execution engine is an external collaborator per spec §5, and a real
//! DuckDB/MSSQL/Snowflake/BigQuery/Databricks/Fabric client is a deployment
//! concern outside this core.

use elevata_materialize::{IntrospectedColumn, IntrospectedTable, MaterializeError, TableIntrospector};
use elevata_types::{canonicalize, Dialect};
use sqlx::Row;

/// `Clone` shares the underlying pool (an `Arc` internally), so a caller
/// needing both a `&mut dyn ExecutionEngine` and a `&dyn TableIntrospector`
/// over the same connection can hold two cloned handles instead of fighting
/// the borrow checker over one.
#[derive(Clone)]
pub struct PostgresEngine {
    pool: sqlx::PgPool,
    handle: tokio::runtime::Handle,
}

impl PostgresEngine {
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .acquire_timeout(std::time::Duration::from_secs(30))
            .connect(database_url)
            .await?;
        Ok(Self { pool, handle: tokio::runtime::Handle::current() })
    }

    fn block_on<F: std::future::Future>(&self, fut: F) -> F::Output {
        tokio::task::block_in_place(|| self.handle.block_on(fut))
    }
}

impl elevata_materialize::ExecutionEngine for PostgresEngine {
    fn execute(&mut self, sql: &str) -> Result<Option<u64>, MaterializeError> {
        let pool = self.pool.clone();
        let sql = sql.to_string();
        let result = self.block_on(async move { sqlx::query(&sql).execute(&pool).await });
        result.map(|r| Some(r.rows_affected())).map_err(|e| MaterializeError::Execution(e.to_string()))
    }
}

impl TableIntrospector for PostgresEngine {
    fn introspect_table(&self, schema: &str, table: &str) -> Result<Option<IntrospectedTable>, MaterializeError> {
        let pool = self.pool.clone();
        let (schema_owned, table_owned) = (schema.to_string(), table.to_string());
        let rows = self
            .block_on(async move {
                sqlx::query(
                    "SELECT column_name, data_type, is_nullable, character_maximum_length, \
                     numeric_precision, numeric_scale FROM information_schema.columns \
                     WHERE table_schema = $1 AND table_name = $2 ORDER BY ordinal_position",
                )
                .bind(&schema_owned)
                .bind(&table_owned)
                .fetch_all(&pool)
                .await
            })
            .map_err(|e| MaterializeError::Introspection { schema: schema.to_string(), table: table.to_string(), reason: e.to_string() })?;

        if rows.is_empty() {
            return Ok(None);
        }

        let mut columns = Vec::with_capacity(rows.len());
        for row in &rows {
            let name: String = row.try_get("column_name").map_err(|e| MaterializeError::Introspection {
                schema: schema.to_string(),
                table: table.to_string(),
                reason: e.to_string(),
            })?;
            let data_type: String = row.try_get("data_type").map_err(|e| MaterializeError::Introspection {
                schema: schema.to_string(),
                table: table.to_string(),
                reason: e.to_string(),
            })?;
            let is_nullable: String = row.try_get("is_nullable").map_err(|e| MaterializeError::Introspection {
                schema: schema.to_string(),
                table: table.to_string(),
                reason: e.to_string(),
            })?;
            // information_schema.columns splits length/precision/scale into
            // their own columns rather than embedding them in `data_type`
            // (unlike most dialects' raw type strings), so they're folded
            // back in here before canonicalizing rather than parsed out of
            // a reconstructed "type(params)" string.
            let char_len: Option<i32> = row.try_get("character_maximum_length").ok();
            let num_prec: Option<i32> = row.try_get("numeric_precision").ok();
            let num_scale: Option<i32> = row.try_get("numeric_scale").ok();
            let mut physical_type = canonicalize(Dialect::Postgres, &data_type).map_err(|e| MaterializeError::Introspection {
                schema: schema.to_string(),
                table: table.to_string(),
                reason: e.to_string(),
            })?;
            match physical_type.canonical {
                elevata_types::CanonicalType::String | elevata_types::CanonicalType::Binary => {
                    physical_type.params.length = char_len;
                }
                elevata_types::CanonicalType::Decimal => {
                    physical_type.params.precision = num_prec;
                    physical_type.params.scale = num_scale;
                }
                _ => {}
            }
            columns.push(IntrospectedColumn { name, physical_type, nullable: is_nullable == "YES" });
        }

        Ok(Some(IntrospectedTable { actual_name: table.to_string(), columns }))
    }
}

/// Inserts one `meta.load_run_log` row, best-effort per spec §7: failures
/// here must never abort the data load itself.
pub fn try_insert_load_run_log(engine: &mut PostgresEngine, sql: &str) {
    if let Err(e) = elevata_materialize::ExecutionEngine::execute(engine, sql) {
        tracing::warn!(error = %e, "best-effort meta.load_run_log insert failed");
    }
}
