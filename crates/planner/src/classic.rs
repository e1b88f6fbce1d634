use std::collections::HashMap;

use elevata_catalog_model::{
    Catalog, ColumnInputSource, DatasetInputSource, InputRole, SystemRole, TargetColumn,
    TargetDataset, TargetDatasetInputId, TargetDatasetReference,
};
use elevata_expr::{
    FromSource, Join, JoinType as PlanJoinType, LogicalSelect, RawSql, SelectItem, SourceTable,
};
use elevata_catalog_model::JoinType as ModelJoinType;

use crate::error::PlannerError;
use crate::fk::build_surrogate_fk_expression;
use crate::filter::build_source_dataset_where;

const TECHNICAL_PLACEHOLDERS: &[(&str, &str)] =
    &[("load_run_id", "{{load_run_id}}"), ("loaded_at", "{{load_timestamp}}")];

/// Builds the classic (non-query-tree) logical plan for a target dataset,
/// per the layer-specific FROM resolution and column projection rules.
pub fn build_classic_select(
    catalog: &dyn Catalog,
    dataset: &TargetDataset,
) -> Result<LogicalSelect, PlannerError> {
    let schema = catalog
        .target_schema(dataset.schema)
        .ok_or(PlannerError::NoUpstreamInput(dataset.id))?;

    let mut alias_of: HashMap<TargetDatasetInputId, String> = HashMap::new();
    let (from, primary_alias, where_) = if dataset.joins.is_empty() {
        let primary = dataset
            .inputs
            .iter()
            .find(|i| i.role == InputRole::Primary)
            .ok_or(PlannerError::NoUpstreamInput(dataset.id))?;
        alias_of.insert(primary.id, "s".to_string());
        let from = resolve_input_table(catalog, &primary.source, "s")?;

        let where_ = match &primary.source {
            DatasetInputSource::Source(sd_id) => {
                let source_dataset = catalog
                    .source_dataset(*sd_id)
                    .ok_or(PlannerError::NoUpstreamInput(dataset.id))?;
                build_source_dataset_where(catalog, source_dataset, "s", source_dataset.incremental)
            }
            DatasetInputSource::UpstreamTarget(_) => None,
        };

        (from, "s".to_string(), where_)
    } else {
        let mut joins_sorted = dataset.joins.clone();
        joins_sorted.sort_by_key(|j| j.join_order);

        let anchor_input = find_input(dataset, joins_sorted[0].left_input)?;
        alias_of.insert(anchor_input.id, "s".to_string());
        let from = resolve_input_table(catalog, &anchor_input.source, "s")?;

        let mut plan_joins = Vec::with_capacity(joins_sorted.len());
        for join in &joins_sorted {
            let left_alias = alias_of
                .get(&join.left_input)
                .cloned()
                .unwrap_or_else(|| "s".to_string());
            let right_input = find_input(dataset, join.right_input)?;
            let right_alias = format!("j{}", join.join_order);
            alias_of.insert(right_input.id, right_alias.clone());
            let right_from = resolve_input_table(catalog, &right_input.source, &right_alias)?;

            if join.predicates.is_empty() && join.join_type != ModelJoinType::Cross {
                return Err(PlannerError::JoinMissingPredicates(
                    join.join_order,
                    dataset.id,
                ));
            }

            let on = if join.predicates.is_empty() {
                None
            } else {
                let rendered = join
                    .predicates
                    .iter()
                    .map(|p| format!("{} {} {}", p.left_expr, p.operator, p.right_expr))
                    .collect::<Vec<_>>()
                    .join(" AND ");
                Some(elevata_expr::Expr::RawSql(RawSql::verbatim(rendered)))
            };

            plan_joins.push(Join {
                left_alias,
                right: right_from,
                on,
                join_type: map_join_type(join.join_type),
            });
        }

        let mut select = LogicalSelect::from_table(from);
        select.joins = plan_joins;
        return project_columns(catalog, dataset, schema.short_name.as_str(), select, &alias_of, "s");
    };

    let mut select = LogicalSelect::from_table(from);
    select.where_ = where_;
    project_columns(
        catalog,
        dataset,
        schema.short_name.as_str(),
        select,
        &alias_of,
        &primary_alias,
    )
}

fn find_input(
    dataset: &TargetDataset,
    id: TargetDatasetInputId,
) -> Result<&elevata_catalog_model::TargetDatasetInput, PlannerError> {
    dataset
        .inputs
        .iter()
        .find(|i| i.id == id)
        .ok_or(PlannerError::NoUpstreamInput(dataset.id))
}

fn resolve_input_table(
    catalog: &dyn Catalog,
    source: &DatasetInputSource,
    alias: &str,
) -> Result<FromSource, PlannerError> {
    match source {
        DatasetInputSource::Source(sd_id) => {
            let sd = catalog
                .source_dataset(*sd_id)
                .ok_or(PlannerError::UnknownSourceDataset(*sd_id))?;
            Ok(FromSource::Table(SourceTable {
                schema: Some(sd.schema_name.clone()),
                name: sd.source_dataset_name.clone(),
                alias: alias.to_string(),
            }))
        }
        DatasetInputSource::UpstreamTarget(td_id) => {
            let td = catalog
                .target_dataset(*td_id)
                .ok_or_else(|| PlannerError::NoUpstreamInput(*td_id))?;
            let schema = catalog
                .target_schema(td.schema)
                .ok_or(PlannerError::NoUpstreamInput(*td_id))?;
            Ok(FromSource::Table(SourceTable {
                schema: Some(schema.physical_prefix.clone()),
                name: td.name.clone(),
                alias: alias.to_string(),
            }))
        }
    }
}

fn map_join_type(t: ModelJoinType) -> PlanJoinType {
    match t {
        ModelJoinType::Inner => PlanJoinType::Inner,
        ModelJoinType::Left => PlanJoinType::Left,
        ModelJoinType::Right => PlanJoinType::Right,
        ModelJoinType::Full => PlanJoinType::Full,
        ModelJoinType::Cross => PlanJoinType::Cross,
    }
}

fn project_columns(
    catalog: &dyn Catalog,
    dataset: &TargetDataset,
    layer: &str,
    mut select: LogicalSelect,
    alias_of: &HashMap<TargetDatasetInputId, String>,
    primary_alias: &str,
) -> Result<LogicalSelect, PlannerError> {
    let mut columns: Vec<&TargetColumn> = dataset.active_columns().collect();
    columns.sort_by_key(|c| c.ordinal_position);

    for column in columns {
        let expr = project_single_column(catalog, dataset, layer, column, alias_of, primary_alias)?;
        select.select_list.push(SelectItem::new(expr, column.name.clone()));
    }

    Ok(select)
}

fn project_single_column(
    catalog: &dyn Catalog,
    dataset: &TargetDataset,
    layer: &str,
    column: &TargetColumn,
    alias_of: &HashMap<TargetDatasetInputId, String>,
    primary_alias: &str,
) -> Result<elevata_expr::Expr, PlannerError> {
    use elevata_expr::Expr;

    if matches!(column.system_role, SystemRole::SurrogateKey | SystemRole::RowHash) {
        if let Some(dsl) = column.surrogate_expression.as_deref() {
            return Ok(elevata_expr::parse_dsl(dsl, Some(primary_alias))?);
        }
    }

    if layer == "raw" {
        if let Some((_, placeholder)) = TECHNICAL_PLACEHOLDERS
            .iter()
            .find(|(name, _)| *name == column.name)
        {
            return Ok(Expr::RawSql(RawSql::verbatim(*placeholder)));
        }
    }

    if column.system_role == SystemRole::ForeignKey {
        if let Some(reference) = find_reference_for_column(dataset, column) {
            return Ok(build_surrogate_fk_expression(
                reference,
                catalog,
                Some(primary_alias),
            )?);
        }
    }

    if column.system_role.is_technical() {
        if let Some(dsl) = column.surrogate_expression.as_deref() {
            return Ok(elevata_expr::parse_dsl(dsl, Some(primary_alias))?);
        }
        let placeholder = match column.system_role {
            SystemRole::LoadRunId => Some("{{load_run_id}}"),
            SystemRole::LoadedAt => Some("{{load_timestamp}}"),
            _ => None,
        };
        if let Some(p) = placeholder {
            return Ok(Expr::RawSql(RawSql::verbatim(p)));
        }
    }

    if let Some(manual) = column.manual_expression.as_deref() {
        return Ok(Expr::RawSql(RawSql::verbatim(manual.to_string())));
    }

    if let Some(input) = column.inputs.first() {
        match &input.source {
            ColumnInputSource::SourceColumn(sc_id) => {
                if let Some(sc) = catalog.source_column(*sc_id) {
                    let alias = dataset
                        .inputs
                        .iter()
                        .find(|i| matches!(i.source, DatasetInputSource::Source(sd) if sd == sc.dataset))
                        .and_then(|i| alias_of.get(&i.id))
                        .cloned()
                        .unwrap_or_else(|| primary_alias.to_string());
                    return Ok(Expr::qualified_col(alias, sc.name.clone()));
                }
            }
            ColumnInputSource::UpstreamTargetColumn(tc_id) => {
                if let Some(tc) = catalog.target_column(*tc_id) {
                    let alias = dataset
                        .inputs
                        .iter()
                        .find(|i| matches!(i.source, DatasetInputSource::UpstreamTarget(td) if td == tc.dataset))
                        .and_then(|i| alias_of.get(&i.id))
                        .cloned()
                        .unwrap_or_else(|| primary_alias.to_string());
                    return Ok(Expr::qualified_col(alias, tc.name.clone()));
                }
            }
        }
    }

    Ok(Expr::qualified_col(primary_alias, column.name.clone()))
}

fn find_reference_for_column<'a>(
    dataset: &'a TargetDataset,
    column: &TargetColumn,
) -> Option<&'a TargetDatasetReference> {
    dataset
        .references
        .iter()
        .find(|r| r.lineage_key() == column.lineage_key)
}
