use elevata_catalog_model::{
    AggregateMode, Catalog, MeasureFunction, QueryNodeId, QueryOperator, SetOperator,
    TargetDataset,
};
use elevata_expr::{
    Expr, FromSource, LogicalSelect, LogicalUnion, OrderByExpr, PlanNode, RawSql, SelectItem,
    SubquerySource, UnionType, WindowFunction, WindowSpec,
};

use crate::classic::build_classic_select;
use crate::error::PlannerError;

/// Compiles a target dataset into a vendor-neutral plan: its classic
/// definition if it has no `query_head`, otherwise the query tree rooted
/// at `query_head`.
pub fn compile(catalog: &dyn Catalog, dataset: &TargetDataset) -> Result<PlanNode, PlannerError> {
    match dataset.query_head {
        Some(head) => compile_node(catalog, dataset, head),
        None => Ok(PlanNode::Select(build_classic_select(catalog, dataset)?)),
    }
}

fn compile_node(
    catalog: &dyn Catalog,
    dataset: &TargetDataset,
    node_id: QueryNodeId,
) -> Result<PlanNode, PlannerError> {
    let node = catalog
        .query_node(node_id)
        .ok_or(PlannerError::MissingQueryNode(dataset.id))?;

    match &node.operator {
        QueryOperator::Select(select_node) => {
            let mut select = build_classic_select(catalog, dataset)?;
            for required in &select_node.required_columns {
                let already_present = select
                    .select_list
                    .iter()
                    .any(|item| item.alias.as_deref() == Some(required.as_str()));
                if !already_present {
                    select
                        .select_list
                        .push(SelectItem::new(Expr::qualified_col("s", required.clone()), required.clone()));
                }
            }
            Ok(PlanNode::Select(select))
        }
        QueryOperator::Aggregate(agg) => {
            let input_plan = compile_node(catalog, dataset, agg.input)?;
            let mut select = LogicalSelect::from_table(FromSource::Subquery(SubquerySource {
                select: Box::new(input_plan),
                alias: "u".to_string(),
            }));

            for key in &agg.group_keys {
                select
                    .select_list
                    .push(SelectItem::new(Expr::qualified_col("u", key.clone()), key.clone()));
                if agg.mode == AggregateMode::Grouped {
                    select.group_by.push(Expr::qualified_col("u", key.clone()));
                }
            }
            for measure in &agg.measures {
                let expr = render_measure(&measure.function);
                select
                    .select_list
                    .push(SelectItem::new(expr, measure.alias.clone()));
            }
            Ok(PlanNode::Select(select))
        }
        QueryOperator::Window(win) => {
            let input_node = catalog
                .query_node(win.input)
                .ok_or(PlannerError::MissingQueryNode(dataset.id))?;
            let input_plan = compile_node(catalog, dataset, win.input)?;
            let mut select = LogicalSelect::from_table(FromSource::Subquery(SubquerySource {
                select: Box::new(input_plan),
                alias: "u".to_string(),
            }));

            for output in &input_node.outputs {
                select.select_list.push(SelectItem::new(
                    Expr::qualified_col("u", output.alias.clone()),
                    output.alias.clone(),
                ));
            }

            for wcol in &win.functions {
                let collides = select
                    .select_list
                    .iter()
                    .any(|item| item.alias.as_deref() == Some(wcol.alias.as_str()));
                if collides {
                    return Err(PlannerError::UnknownColumn(wcol.alias.clone(), dataset.id));
                }
                let window_fn = WindowFunction {
                    name: wcol.function.clone(),
                    args: wcol
                        .args
                        .iter()
                        .map(|a| Expr::qualified_col("u", a.clone()))
                        .collect(),
                    window: WindowSpec {
                        partition_by: wcol
                            .partition_by
                            .iter()
                            .map(|p| Expr::qualified_col("u", p.clone()))
                            .collect(),
                        order_by: wcol
                            .order_by
                            .iter()
                            .map(|o| OrderByExpr::asc(Expr::qualified_col("u", o.clone())))
                            .collect(),
                    },
                };
                select
                    .select_list
                    .push(SelectItem::new(Expr::Window(window_fn), wcol.alias.clone()));
            }
            Ok(PlanNode::Select(select))
        }
        QueryOperator::Union(union) => {
            let mut selects = Vec::with_capacity(union.branches.len());
            for branch in &union.branches {
                let input_plan = compile_node(catalog, dataset, branch.input)?;
                let mut select = LogicalSelect::from_table(FromSource::Subquery(SubquerySource {
                    select: Box::new(input_plan),
                    alias: "u".to_string(),
                }));
                for output_column in &union.output_columns {
                    let mapped = branch
                        .branch_mappings
                        .iter()
                        .find(|(k, _)| k == output_column)
                        .map(|(_, v)| v.clone());
                    let expr = match mapped {
                        Some(dsl) => elevata_expr::parse_dsl(&dsl, Some("u"))?,
                        None => Expr::qualified_col("u", output_column.clone()),
                    };
                    select
                        .select_list
                        .push(SelectItem::new(expr, output_column.clone()));
                }
                selects.push(PlanNode::Select(select));
            }
            let union_type = match union.set_operator {
                SetOperator::Union => UnionType::Union,
                SetOperator::UnionAll => UnionType::All,
            };
            Ok(PlanNode::Union(LogicalUnion {
                selects,
                union_type,
            }))
        }
    }
}

/// Renders an aggregate measure. `STRING_AGG`'s trailing args beyond the
/// separator literal are, by convention, the `ORDER BY` key list — the `expr`
/// AST has no dedicated node for an in-function order-by, and dialect
/// renderers special-case this function name.
fn render_measure(function: &MeasureFunction) -> Expr {
    match function {
        MeasureFunction::CountStar => {
            Expr::func("COUNT", vec![Expr::RawSql(RawSql::verbatim("*"))])
        }
        MeasureFunction::CountDistinct { expr } => {
            Expr::func("COUNT_DISTINCT", vec![Expr::qualified_col("u", expr.clone())])
        }
        MeasureFunction::StringAgg {
            expr,
            delimiter,
            order_by,
        } => {
            let mut args = vec![Expr::qualified_col("u", expr.clone()), Expr::string_lit(delimiter.clone())];
            args.extend(order_by.iter().map(|o| Expr::qualified_col("u", o.clone())));
            Expr::func("STRING_AGG", args)
        }
        MeasureFunction::Sum { expr } => Expr::func("SUM", vec![Expr::qualified_col("u", expr.clone())]),
        MeasureFunction::Min { expr } => Expr::func("MIN", vec![Expr::qualified_col("u", expr.clone())]),
        MeasureFunction::Max { expr } => Expr::func("MAX", vec![Expr::qualified_col("u", expr.clone())]),
        MeasureFunction::Avg { expr } => Expr::func("AVG", vec![Expr::qualified_col("u", expr.clone())]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use elevata_catalog_model::{
        CatalogSnapshot, CombinationMode, HashAlgorithm, IncrementalStrategy, Measure,
        MeasureFunction as MF, QueryNode, QueryNodeOutput, QueryOperator as Op, SelectNode,
        SurrogateKeyPolicy, TargetSchema, TargetSchemaId,
    };
    use elevata_catalog_model::{AggregateNode, TargetDatasetId};
    use elevata_catalog_model::MaterializationKind;
    use uuid::Uuid;

    fn schema(consolidate: bool) -> TargetSchema {
        TargetSchema {
            id: TargetSchemaId::new(Uuid::new_v4()),
            short_name: "bizcore".into(),
            physical_prefix: "bizcore".into(),
            materialization: MaterializationKind::View,
            historization_default: false,
            incremental_strategy_default: IncrementalStrategy::Full,
            surrogate_keys_enabled: false,
            surrogate_key_policy: SurrogateKeyPolicy {
                algorithm: HashAlgorithm::Sha256,
                null_token: "~~NULL~~".into(),
                component_separator: "|".into(),
            },
            consolidate_groups: consolidate,
        }
    }

    #[test]
    fn compiles_aggregate_over_select_into_subquery_wrapped_plan() {
        let schema = schema(false);
        let dataset_id = TargetDatasetId::new(Uuid::new_v4());
        let select_node_id = QueryNodeId::new(Uuid::new_v4());
        let agg_node_id = QueryNodeId::new(Uuid::new_v4());

        let dataset = TargetDataset {
            id: dataset_id,
            schema: schema.id,
            name: "order_totals".into(),
            lineage_key: "order_totals".into(),
            former_names: vec![],
            historize: false,
            handle_deletes: false,
            incremental_strategy: IncrementalStrategy::Full,
            incremental_source: None,
            combination_mode: CombinationMode::Single,
            query_root: Some(select_node_id),
            query_head: Some(agg_node_id),
            is_system_managed: true,
            inputs: vec![],
            columns: vec![],
            references: vec![],
            joins: vec![],
        };

        let select_node = QueryNode {
            id: select_node_id,
            owner: dataset_id,
            operator: Op::Select(SelectNode {
                required_columns: vec![],
            }),
            outputs: vec![QueryNodeOutput {
                alias: "customer_key".into(),
                source_column: None,
            }],
        };
        let agg_node = QueryNode {
            id: agg_node_id,
            owner: dataset_id,
            operator: Op::Aggregate(AggregateNode {
                input: select_node_id,
                mode: AggregateMode::Grouped,
                group_keys: vec!["customer_key".into()],
                measures: vec![Measure {
                    alias: "order_count".into(),
                    function: MF::CountStar,
                }],
            }),
            outputs: vec![],
        };

        let snapshot = CatalogSnapshot {
            target_schemas: vec![schema],
            target_datasets: vec![dataset.clone()],
            query_nodes: vec![select_node, agg_node],
            ..Default::default()
        };

        let plan = compile(&snapshot, &dataset).unwrap();
        match plan {
            PlanNode::Select(select) => {
                assert_eq!(select.select_list.len(), 2);
                assert_eq!(select.group_by.len(), 1);
                assert!(matches!(select.from, FromSource::Subquery(_)));
            }
            other => panic!("expected Select, got {other:?}"),
        }
    }
}
