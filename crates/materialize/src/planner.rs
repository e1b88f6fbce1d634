use elevata_catalog_model::TargetDataset;
use elevata_dialect::{ColumnDef, RebuildColumn, SqlDialect};
use elevata_types::{classify_drift, DriftKind, PhysicalType, TypeParams};

use crate::error::MaterializeError;
use crate::introspect::IntrospectedTable;
use crate::policy::MaterializationPolicy;
use crate::step::{MaterializationOp, MaterializationPlan, MaterializationStep};

fn physical_type_of(column: &elevata_catalog_model::TargetColumn) -> PhysicalType {
    let params = TypeParams {
        length: column.length,
        precision: column.precision,
        scale: column.scale,
        unbounded: false,
    };
    PhysicalType::new(column.canonical_type, params)
}

/// Builds the ordered, typed operations needed to bring a target table's
/// physical shape in line with its catalog definition: schema/table/column
/// provisioning, type-drift evolution (in-place `ALTER` where the dialect
/// supports it, otherwise a full rebuild), and the warnings/blocking errors
/// that drift classification produces along the way.
///
/// `introspected` is `None` when the table doesn't exist yet in the
/// warehouse; the plan then reduces to `ENSURE_SCHEMA` + `CREATE_TABLE`.
pub fn build_materialization_plan(
    target: &TargetDataset,
    schema_short: &str,
    introspected: Option<&IntrospectedTable>,
    dialect: &dyn SqlDialect,
    policy: &MaterializationPolicy,
) -> Result<MaterializationPlan, MaterializeError> {
    let mut plan = MaterializationPlan::default();
    plan.steps.push(MaterializationStep::new(
        MaterializationOp::EnsureSchema,
        dialect.render_create_schema_if_not_exists(schema_short),
    ));

    let mut desired: Vec<&elevata_catalog_model::TargetColumn> = target.active_columns().collect();
    desired.sort_by_key(|c| c.ordinal_position);
    if desired.is_empty() {
        return Err(MaterializeError::NoActiveColumns { schema: schema_short.to_string(), table: target.name.clone() });
    }

    let Some(introspected) = introspected else {
        let columns: Vec<ColumnDef> = desired
            .iter()
            .map(|c| -> Result<ColumnDef, MaterializeError> {
                let physical = dialect.render_physical_type(&physical_type_of(c), false)?;
                Ok(ColumnDef::new(c.name.clone(), physical, !(c.system_role.is_key() || c.system_role.is_technical())))
            })
            .collect::<Result<_, _>>()?;
        plan.steps.push(MaterializationStep::new(
            MaterializationOp::CreateTable,
            dialect.render_create_table_if_not_exists_from_columns(schema_short, &target.name, &columns),
        ));
        return Ok(plan);
    };

    if introspected.actual_name != target.name {
        plan.steps.push(
            MaterializationStep::new(
                MaterializationOp::RenameDataset,
                dialect.render_rename_table(schema_short, &introspected.actual_name, &target.name),
            )
            .with_metadata("former_name", introspected.actual_name.clone()),
        );
    }

    if !policy.sync_schema_shorts.contains(schema_short) {
        return Ok(plan);
    }

    let mut needs_rebuild = false;
    let mut column_steps: Vec<MaterializationStep> = Vec::new();

    for column in &desired {
        let desired_physical = physical_type_of(column);
        let desired_type_sql = dialect.render_physical_type(&desired_physical, false)?;

        let matched = introspected.find_column(&column.name).map(|a| (column.name.as_str(), a)).or_else(|| {
            column.former_names.iter().find_map(|former| introspected.find_column(former).map(|a| (former.as_str(), a)))
        });

        let Some((actual_name, actual)) = matched else {
            column_steps.push(MaterializationStep::new(
                MaterializationOp::AddColumn,
                dialect.render_add_column(schema_short, &target.name, &column.name, &desired_type_sql),
            ));
            continue;
        };

        if actual_name != column.name {
            column_steps.push(
                MaterializationStep::new(
                    MaterializationOp::RenameColumn,
                    dialect.render_rename_column(schema_short, &target.name, actual_name, &column.name),
                )
                .with_metadata("former_name", actual_name.to_string()),
            );
        }

        let drift = classify_drift(&desired_physical, &actual.physical_type);
        if drift.kind == DriftKind::Equivalent {
            continue;
        }

        plan.warnings.push(format!("TYPE_DRIFT:{}.{} kind={:?} reason={}", target.name, column.name, drift.kind, drift.reason));

        let is_unsafe = matches!(drift.kind, DriftKind::Narrowing | DriftKind::Incompatible);
        if is_unsafe && !policy.allow_lossy_type_drift {
            plan.blocking_errors.push(format!("UNSAFE_TYPE_DRIFT:{}.{} kind={:?} reason={}", target.name, column.name, drift.kind, drift.reason));
        }

        if dialect.supports_alter_column_type() {
            if let Some(sql) = dialect.render_alter_column_type(schema_short, &target.name, &column.name, &desired_type_sql) {
                column_steps.push(MaterializationStep::new(MaterializationOp::AlterColumnType, sql));
                continue;
            }
        }
        needs_rebuild = true;
    }

    if needs_rebuild {
        let rebuild_table = format!("{}__rebuild", target.name);
        let create_columns: Vec<ColumnDef> = desired
            .iter()
            .map(|c| -> Result<ColumnDef, MaterializeError> {
                let physical = dialect.render_physical_type(&physical_type_of(c), false)?;
                Ok(ColumnDef::new(c.name.clone(), physical, !(c.system_role.is_key() || c.system_role.is_technical())))
            })
            .collect::<Result<_, _>>()?;
        let rebuild_columns: Vec<RebuildColumn> = desired
            .iter()
            .map(|c| -> Result<RebuildColumn, MaterializeError> {
                let physical = dialect.render_physical_type(&physical_type_of(c), false)?;
                let mut rc = RebuildColumn::new(c.name.clone(), physical);
                if let Some(actual_name) = introspected
                    .find_column(&c.name)
                    .map(|_| c.name.clone())
                    .or_else(|| c.former_names.iter().find(|f| introspected.find_column(f).is_some()).cloned())
                {
                    if actual_name != c.name {
                        rc.source_name = Some(actual_name);
                    }
                }
                Ok(rc)
            })
            .collect::<Result<_, _>>()?;

        plan.steps.push(MaterializationStep::new(MaterializationOp::DropTableIfExists, dialect.render_drop_table_if_exists(schema_short, &rebuild_table)));
        plan.steps.push(MaterializationStep::new(MaterializationOp::CreateTable, dialect.render_create_table_from_columns(schema_short, &rebuild_table, &create_columns)));
        plan.steps.push(MaterializationStep::new(
            MaterializationOp::InsertSelect,
            dialect.render_insert_select_for_rebuild(schema_short, &introspected.actual_name, &rebuild_table, &rebuild_columns, true, true),
        ));
        plan.steps.push(MaterializationStep::new(MaterializationOp::DropTable, dialect.render_drop_table(schema_short, &introspected.actual_name)));
        plan.steps.push(MaterializationStep::new(MaterializationOp::RenameTable, dialect.render_rename_table(schema_short, &rebuild_table, &target.name)));
    } else {
        plan.steps.extend(column_steps);
    }

    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use elevata_catalog_model::{CombinationMode, IncrementalStrategy, SystemRole, TargetColumn, TargetDatasetId, TargetSchemaId};
    use elevata_dialect::{DuckDbDialect, PostgresDialect};
    use elevata_types::CanonicalType;

    use crate::introspect::IntrospectedColumn;

    fn target_column(name: &str, ordinal: i32, canonical: CanonicalType, length: Option<i32>) -> TargetColumn {
        TargetColumn {
            id: elevata_catalog_model::TargetColumnId::new(uuid::Uuid::new_v4()),
            dataset: TargetDatasetId::new(uuid::Uuid::new_v4()),
            name: name.to_string(),
            ordinal_position: ordinal,
            canonical_type: canonical,
            length,
            precision: None,
            scale: None,
            system_role: SystemRole::None,
            surrogate_expression: None,
            manual_expression: None,
            former_names: vec![],
            lineage_key: name.to_string(),
            active: true,
            inputs: vec![],
        }
    }

    fn sample_target(columns: Vec<TargetColumn>) -> TargetDataset {
        TargetDataset {
            id: TargetDatasetId::new(uuid::Uuid::new_v4()),
            schema: TargetSchemaId::new(uuid::Uuid::new_v4()),
            name: "customer".to_string(),
            lineage_key: "customer".to_string(),
            former_names: vec![],
            historize: false,
            handle_deletes: true,
            incremental_strategy: IncrementalStrategy::Merge,
            incremental_source: None,
            combination_mode: CombinationMode::Single,
            query_root: None,
            query_head: None,
            is_system_managed: true,
            inputs: vec![],
            columns,
            references: vec![],
            joins: vec![],
        }
    }

    #[test]
    fn creates_table_when_absent() {
        let target = sample_target(vec![target_column("id", 1, CanonicalType::Integer, None)]);
        let policy = MaterializationPolicy::default();
        let plan = build_materialization_plan(&target, "rawcore", None, &DuckDbDialect, &policy).unwrap();
        assert_eq!(plan.steps.len(), 2);
        assert_eq!(plan.steps[1].op, MaterializationOp::CreateTable);
        assert!(plan.did_provision());
    }

    #[test]
    fn alters_column_type_in_place_when_widening_and_supported() {
        let target = sample_target(vec![target_column("name", 1, CanonicalType::String, Some(100))]);
        let introspected = IntrospectedTable {
            actual_name: "customer".to_string(),
            columns: vec![IntrospectedColumn {
                name: "name".to_string(),
                physical_type: PhysicalType::new(CanonicalType::String, TypeParams::length(50)),
                nullable: true,
            }],
        };
        let policy = MaterializationPolicy::default();
        let plan = build_materialization_plan(&target, "rawcore", Some(&introspected), &DuckDbDialect, &policy).unwrap();
        assert!(plan.steps.iter().any(|s| s.op == MaterializationOp::AlterColumnType));
        assert!(plan.blocking_errors.is_empty());
        assert!(plan.warnings.iter().any(|w| w.starts_with("TYPE_DRIFT:")));
    }

    #[test]
    fn rebuilds_when_alter_unsupported() {
        let target = sample_target(vec![target_column("name", 1, CanonicalType::String, Some(100))]);
        let introspected = IntrospectedTable {
            actual_name: "customer".to_string(),
            columns: vec![IntrospectedColumn {
                name: "name".to_string(),
                physical_type: PhysicalType::new(CanonicalType::String, TypeParams::length(50)),
                nullable: true,
            }],
        };
        let policy = MaterializationPolicy::default();
        let plan = build_materialization_plan(&target, "rawcore", Some(&introspected), &PostgresDialect, &policy).unwrap();
        let ops: Vec<_> = plan.steps.iter().map(|s| s.op).collect();
        assert!(ops.contains(&MaterializationOp::CreateTable));
        assert!(ops.contains(&MaterializationOp::InsertSelect));
        assert!(ops.contains(&MaterializationOp::RenameTable));
    }

    #[test]
    fn blocks_on_narrowing_drift_unless_allowed() {
        let target = sample_target(vec![target_column("name", 1, CanonicalType::String, Some(10))]);
        let introspected = IntrospectedTable {
            actual_name: "customer".to_string(),
            columns: vec![IntrospectedColumn {
                name: "name".to_string(),
                physical_type: PhysicalType::new(CanonicalType::String, TypeParams::length(100)),
                nullable: true,
            }],
        };
        let policy = MaterializationPolicy::default();
        let plan = build_materialization_plan(&target, "rawcore", Some(&introspected), &DuckDbDialect, &policy).unwrap();
        assert!(plan.blocking_errors.iter().any(|e| e.starts_with("UNSAFE_TYPE_DRIFT:")));

        let lossy_policy = MaterializationPolicy { allow_lossy_type_drift: true, ..MaterializationPolicy::default() };
        let plan2 = build_materialization_plan(&target, "rawcore", Some(&introspected), &DuckDbDialect, &lossy_policy).unwrap();
        assert!(plan2.blocking_errors.is_empty());
    }

    #[test]
    fn renames_dataset_when_actual_name_differs() {
        let target = sample_target(vec![target_column("id", 1, CanonicalType::Integer, None)]);
        let introspected = IntrospectedTable {
            actual_name: "customer_old".to_string(),
            columns: vec![IntrospectedColumn { name: "id".to_string(), physical_type: PhysicalType::simple(CanonicalType::Integer), nullable: false }],
        };
        let policy = MaterializationPolicy::default();
        let plan = build_materialization_plan(&target, "rawcore", Some(&introspected), &DuckDbDialect, &policy).unwrap();
        assert!(plan.steps.iter().any(|s| s.op == MaterializationOp::RenameDataset));
    }
}
