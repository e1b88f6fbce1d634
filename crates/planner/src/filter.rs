use std::collections::HashSet;

use elevata_catalog_model::{Catalog, SourceDataset};
use elevata_expr::{Expr, RawSql};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref IDENT_RE: Regex = Regex::new(r"[A-Za-z_][A-Za-z0-9_]*").unwrap();
}

/// Qualifies bare column-name tokens in a source-side filter fragment with
/// `<alias>.`, leaving the `{{DELTA_CUTOFF}}` placeholder and any
/// already-qualified token (preceded by `.`) untouched.
pub fn qualify_source_filter(
    catalog: &dyn Catalog,
    source_dataset: &SourceDataset,
    filter_sql: &str,
    source_alias: &str,
) -> String {
    if filter_sql.is_empty() {
        return String::new();
    }

    let known: HashSet<String> = catalog
        .source_columns(source_dataset.id)
        .into_iter()
        .map(|c| c.name.to_lowercase())
        .collect();
    if known.is_empty() {
        return filter_sql.to_string();
    }

    let mut out = String::with_capacity(filter_sql.len());
    let mut last_end = 0usize;
    for m in IDENT_RE.find_iter(filter_sql) {
        out.push_str(&filter_sql[last_end..m.start()]);
        let tok = m.as_str();
        let preceded_by_dot = m.start() > 0 && filter_sql.as_bytes()[m.start() - 1] == b'.';
        if tok.eq_ignore_ascii_case("DELTA_CUTOFF") || preceded_by_dot {
            out.push_str(tok);
        } else if known.contains(&tok.to_lowercase()) {
            out.push_str(source_alias);
            out.push('.');
            out.push_str(tok);
        } else {
            out.push_str(tok);
        }
        last_end = m.end();
    }
    out.push_str(&filter_sql[last_end..]);
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Composes the WHERE clause for a raw/stage extraction from a `SourceDataset`:
/// `static_filter` always applies; `increment_filter` only when the dataset
/// is resolved as an incremental source.
pub fn build_source_dataset_where(
    catalog: &dyn Catalog,
    source_dataset: &SourceDataset,
    source_alias: &str,
    as_incremental: bool,
) -> Option<Expr> {
    let mut parts = Vec::new();

    if let Some(static_filter) = source_dataset.static_filter.as_deref() {
        let trimmed = static_filter.trim();
        if !trimmed.is_empty() {
            parts.push(qualify_source_filter(
                catalog,
                source_dataset,
                trimmed,
                source_alias,
            ));
        }
    }

    if as_incremental && source_dataset.incremental {
        if let Some(increment_filter) = source_dataset.increment_filter.as_deref() {
            let trimmed = increment_filter.trim();
            if !trimmed.is_empty() {
                parts.push(qualify_source_filter(
                    catalog,
                    source_dataset,
                    trimmed,
                    source_alias,
                ));
            }
        }
    }

    if parts.is_empty() {
        return None;
    }
    if parts.len() == 1 {
        return Some(Expr::RawSql(RawSql::verbatim(parts.remove(0))));
    }

    let joined = parts
        .iter()
        .map(|p| format!("({p})"))
        .collect::<Vec<_>>()
        .join(" AND ");
    Some(Expr::RawSql(RawSql::verbatim(joined)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use elevata_catalog_model::{CatalogSnapshot, SourceColumn, SourceDatasetId, SourceSystemId};
    use elevata_types::CanonicalType;
    use uuid::Uuid;

    fn dataset_with_columns(col_names: &[&str]) -> (SourceDataset, CatalogSnapshot) {
        let dataset_id = SourceDatasetId::new(Uuid::new_v4());
        let dataset = SourceDataset {
            id: dataset_id,
            source_system: SourceSystemId::new(Uuid::new_v4()),
            schema_name: "dbo".into(),
            source_dataset_name: "orders".into(),
            integrate: true,
            incremental: true,
            active: true,
            static_filter: Some("is_deleted = 0".into()),
            increment_filter: Some("modified_date > {{DELTA_CUTOFF}}".into()),
            increment_policies: vec![],
        };
        let columns = col_names
            .iter()
            .enumerate()
            .map(|(i, name)| SourceColumn {
                id: elevata_catalog_model::SourceColumnId::new(Uuid::new_v4()),
                dataset: dataset_id,
                name: name.to_string(),
                ordinal_position: i as i32,
                canonical_type: CanonicalType::String,
                length: None,
                precision: None,
                scale: None,
                primary_key_column: false,
                integrate: true,
            })
            .collect();
        let snapshot = CatalogSnapshot {
            source_columns: columns,
            ..Default::default()
        };
        (dataset, snapshot)
    }

    #[test]
    fn qualifies_known_columns_and_preserves_placeholder() {
        let (dataset, snapshot) = dataset_with_columns(&["is_deleted", "modified_date"]);
        let qualified = qualify_source_filter(
            &snapshot,
            &dataset,
            "is_deleted = 0 AND modified_date > {{DELTA_CUTOFF}}",
            "s",
        );
        assert_eq!(
            qualified,
            "s.is_deleted = 0 AND s.modified_date > {{DELTA_CUTOFF}}"
        );
    }

    #[test]
    fn combines_static_and_increment_filters_when_incremental() {
        let (dataset, snapshot) = dataset_with_columns(&["is_deleted", "modified_date"]);
        let expr = build_source_dataset_where(&snapshot, &dataset, "s", true).unwrap();
        match expr {
            Expr::RawSql(raw) => assert_eq!(
                raw.sql,
                "(s.is_deleted = 0) AND (s.modified_date > {{DELTA_CUTOFF}})"
            ),
            other => panic!("expected RawSql, got {other:?}"),
        }
    }

    #[test]
    fn skips_increment_filter_when_not_resolved_as_incremental() {
        let (dataset, snapshot) = dataset_with_columns(&["is_deleted", "modified_date"]);
        let expr = build_source_dataset_where(&snapshot, &dataset, "s", false).unwrap();
        match expr {
            Expr::RawSql(raw) => assert_eq!(raw.sql, "s.is_deleted = 0"),
            other => panic!("expected RawSql, got {other:?}"),
        }
    }
}
