use std::collections::HashMap;

use elevata_catalog_model::{Catalog, SystemRole, TargetDatasetReference};
use elevata_expr::{Expr, OrderByExpr, RawSql, WindowFunction, WindowSpec};

use crate::error::PlannerError;

/// Derives the surrogate FK expression for a single `TargetDatasetReference`
/// from the parent dataset's surrogate-key expression, substituting the
/// parent's business-key column references with the matching child-side
/// expressions supplied by its `KeyComponent`s.
///
/// The parent's SK expression typically names a business-key column twice:
/// once bare (the value itself) and once more deeply nested (e.g. inside the
/// hash concatenation). We keep the first occurrence as-is — it still
/// resolves against the FK column's own alias scope — and rewrite every
/// later occurrence to the child-side expression, mirroring how the
/// generation service keeps SK and FK hashing in lockstep.
pub fn build_surrogate_fk_expression(
    reference: &TargetDatasetReference,
    catalog: &dyn Catalog,
    child_alias: Option<&str>,
) -> Result<Expr, PlannerError> {
    let parent_ds = catalog
        .target_dataset(reference.parent)
        .ok_or(PlannerError::NoUpstreamInput(reference.child))?;

    let mut sk_candidates: Vec<_> = parent_ds
        .active_columns()
        .filter(|c| c.system_role == SystemRole::SurrogateKey)
        .collect();
    sk_candidates.sort_by_key(|c| c.ordinal_position);
    let parent_sk = sk_candidates
        .first()
        .ok_or(PlannerError::ParentMissingSurrogateKey)?;
    let parent_expr_dsl = parent_sk
        .surrogate_expression
        .as_deref()
        .ok_or(PlannerError::MissingSurrogateExpression(parent_sk.id))?;
    let parent_expr = elevata_expr::parse_dsl(parent_expr_dsl, None)?;

    if reference.key_components.is_empty() {
        return Err(PlannerError::EmptyKeyComponents);
    }

    let mut mapping: HashMap<String, Expr> = HashMap::new();
    for component in &reference.key_components {
        let parent_col = parent_ds
            .find_column_by_id(component.parent_column)
            .ok_or(PlannerError::ParentMissingSurrogateKey)?;
        let child_expr = elevata_expr::parse_dsl(&component.child_expression, child_alias)?;
        mapping.insert(parent_col.name.clone(), child_expr);
    }

    let mut seen = HashMap::new();
    Ok(rewrite_parent_sk_expr(&parent_expr, &mapping, &mut seen))
}

fn rewrite_parent_sk_expr(
    expr: &Expr,
    mapping: &HashMap<String, Expr>,
    seen: &mut HashMap<String, i32>,
) -> Expr {
    match expr {
        Expr::Literal(_) => expr.clone(),
        Expr::ColumnRef {
            table_alias,
            column_name,
        } => match mapping.get(column_name) {
            None => expr.clone(),
            Some(child_expr) => {
                let count = seen.entry(column_name.clone()).or_insert(0);
                *count += 1;
                if *count == 1 {
                    Expr::ColumnRef {
                        table_alias: table_alias.clone(),
                        column_name: column_name.clone(),
                    }
                } else {
                    child_expr.clone()
                }
            }
        },
        Expr::FuncCall { name, args } => Expr::FuncCall {
            name: name.clone(),
            args: args
                .iter()
                .map(|a| rewrite_parent_sk_expr(a, mapping, seen))
                .collect(),
        },
        Expr::Concat(parts) => Expr::Concat(
            parts
                .iter()
                .map(|p| rewrite_parent_sk_expr(p, mapping, seen))
                .collect(),
        ),
        Expr::Coalesce(parts) => Expr::Coalesce(
            parts
                .iter()
                .map(|p| rewrite_parent_sk_expr(p, mapping, seen))
                .collect(),
        ),
        Expr::Cast { expr, target_type } => Expr::Cast {
            expr: Box::new(rewrite_parent_sk_expr(expr, mapping, seen)),
            target_type: target_type.clone(),
        },
        Expr::Window(w) => Expr::Window(WindowFunction {
            name: w.name.clone(),
            args: w
                .args
                .iter()
                .map(|a| rewrite_parent_sk_expr(a, mapping, seen))
                .collect(),
            window: WindowSpec {
                partition_by: w
                    .window
                    .partition_by
                    .iter()
                    .map(|a| rewrite_parent_sk_expr(a, mapping, seen))
                    .collect(),
                order_by: w
                    .window
                    .order_by
                    .iter()
                    .map(|o| OrderByExpr {
                        expr: rewrite_parent_sk_expr(&o.expr, mapping, seen),
                        direction: o.direction,
                    })
                    .collect(),
            },
        }),
        Expr::RawSql(raw) => Expr::RawSql(RawSql {
            sql: raw.sql.clone(),
            default_table_alias: raw.default_table_alias.clone(),
            is_template: raw.is_template,
            expr_bindings: raw
                .expr_bindings
                .iter()
                .map(|(k, v)| (k.clone(), rewrite_parent_sk_expr(v, mapping, seen)))
                .collect(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use elevata_catalog_model::{
        CatalogSnapshot, HashAlgorithm, IncrementalStrategy, KeyComponent, MaterializationKind,
        SurrogateKeyPolicy, TargetColumn, TargetDataset, TargetSchema, TargetSchemaId,
    };
    use elevata_types::CanonicalType;
    use uuid::Uuid;

    fn schema() -> TargetSchema {
        TargetSchema {
            id: TargetSchemaId::new(Uuid::new_v4()),
            short_name: "rawcore".into(),
            physical_prefix: "rawcore".into(),
            materialization: MaterializationKind::Table,
            historization_default: true,
            incremental_strategy_default: IncrementalStrategy::Merge,
            surrogate_keys_enabled: true,
            surrogate_key_policy: SurrogateKeyPolicy {
                algorithm: HashAlgorithm::Sha256,
                null_token: "~~NULL~~".into(),
                component_separator: "|".into(),
            },
            consolidate_groups: true,
        }
    }

    #[test]
    fn keeps_first_occurrence_and_rewrites_second() {
        use elevata_catalog_model::{
            CombinationMode, SystemRole, TargetColumnId, TargetDatasetId,
            TargetDatasetReferenceId,
        };

        let schema = schema();
        let parent_id = TargetDatasetId::new(Uuid::new_v4());
        let child_id = TargetDatasetId::new(Uuid::new_v4());
        let parent_sk_id = TargetColumnId::new(Uuid::new_v4());
        let parent_bk_id = TargetColumnId::new(Uuid::new_v4());

        let parent = TargetDataset {
            id: parent_id,
            schema: schema.id,
            name: "customer".into(),
            lineage_key: "customer".into(),
            former_names: vec![],
            historize: true,
            handle_deletes: false,
            incremental_strategy: IncrementalStrategy::Merge,
            incremental_source: None,
            combination_mode: CombinationMode::Single,
            query_root: None,
            query_head: None,
            is_system_managed: true,
            inputs: vec![],
            columns: vec![
                TargetColumn {
                    id: parent_sk_id,
                    dataset: parent_id,
                    name: "customer_key".into(),
                    ordinal_position: 1,
                    canonical_type: CanonicalType::String,
                    length: Some(64),
                    precision: None,
                    scale: None,
                    system_role: SystemRole::SurrogateKey,
                    surrogate_expression: Some(
                        "HASH256(CONCAT_WS('|', COL(customer_id), COL(customer_id)))".into(),
                    ),
                    manual_expression: None,
                    former_names: vec![],
                    lineage_key: "customer_key".into(),
                    active: true,
                    inputs: vec![],
                },
                TargetColumn {
                    id: parent_bk_id,
                    dataset: parent_id,
                    name: "customer_id".into(),
                    ordinal_position: 2,
                    canonical_type: CanonicalType::String,
                    length: None,
                    precision: None,
                    scale: None,
                    system_role: SystemRole::BusinessKey,
                    surrogate_expression: None,
                    manual_expression: None,
                    former_names: vec![],
                    lineage_key: "customer_id".into(),
                    active: true,
                    inputs: vec![],
                },
            ],
            references: vec![],
            joins: vec![],
        };

        let reference = TargetDatasetReference {
            id: TargetDatasetReferenceId::new(Uuid::new_v4()),
            parent: parent_id,
            child: child_id,
            key_components: vec![KeyComponent {
                parent_column: parent_bk_id,
                ordinal: 1,
                child_expression: "COL(customer_id)".into(),
            }],
        };

        let snapshot = CatalogSnapshot {
            target_schemas: vec![schema],
            target_datasets: vec![parent],
            ..Default::default()
        };

        let fk_expr = build_surrogate_fk_expression(&reference, &snapshot, Some("s")).unwrap();
        match fk_expr {
            Expr::FuncCall { name, args } => {
                assert_eq!(name, "HASH256");
                match &args[0] {
                    Expr::FuncCall { name, args } => {
                        assert_eq!(name, "CONCAT_WS");
                        assert_eq!(args[0], Expr::string_lit("|"));
                        assert_eq!(args[1], Expr::col("customer_id"));
                        assert_eq!(args[2], Expr::qualified_col("s", "customer_id"));
                    }
                    other => panic!("unexpected: {other:?}"),
                }
            }
            other => panic!("unexpected: {other:?}"),
        }
    }
}
