use crate::error::MaterializeError;
use crate::step::MaterializationPlan;

/// The minimal surface a warehouse connection needs to apply a
/// materialization plan: execute DDL/DML and report an affected-row count
/// where the engine can provide one (DuckDB/Postgres/MSSQL can; some
/// Databricks statement kinds cannot).
pub trait ExecutionEngine {
    fn execute(&mut self, sql: &str) -> Result<Option<u64>, MaterializeError>;
}

/// Runs every step of a plan, in order, against `engine`. Callers are
/// expected to have already rejected a plan with non-empty
/// `blocking_errors` before reaching this point.
pub fn apply_materialization_plan(plan: &MaterializationPlan, engine: &mut dyn ExecutionEngine) -> Result<(), MaterializeError> {
    for step in &plan.steps {
        tracing::debug!(op = step.op.as_str(), sql = %step.sql, "applying materialization step");
        engine.execute(&step.sql)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::step::{MaterializationOp, MaterializationStep};

    struct RecordingEngine {
        executed: Vec<String>,
    }

    impl ExecutionEngine for RecordingEngine {
        fn execute(&mut self, sql: &str) -> Result<Option<u64>, MaterializeError> {
            self.executed.push(sql.to_string());
            Ok(None)
        }
    }

    #[test]
    fn applies_every_step_in_order() {
        let plan = MaterializationPlan {
            steps: vec![
                MaterializationStep::new(MaterializationOp::EnsureSchema, "CREATE SCHEMA IF NOT EXISTS rawcore"),
                MaterializationStep::new(MaterializationOp::CreateTable, "CREATE TABLE rawcore.customer (id INTEGER)"),
            ],
            warnings: vec![],
            blocking_errors: vec![],
        };
        let mut engine = RecordingEngine { executed: vec![] };
        apply_materialization_plan(&plan, &mut engine).unwrap();
        assert_eq!(engine.executed.len(), 2);
        assert!(engine.executed[0].contains("CREATE SCHEMA"));
    }
}
