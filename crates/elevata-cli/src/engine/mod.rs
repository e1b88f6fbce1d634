mod postgres;

pub use postgres::{try_insert_load_run_log, PostgresEngine};
