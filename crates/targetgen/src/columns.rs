use elevata_catalog_model::{SurrogateKeyPolicy, SystemRole};
use elevata_types::CanonicalType;

use crate::draft::TargetColumnDraft;

/// `load_run_id`/`loaded_at` technical columns appended to every raw dataset.
pub fn raw_technical_columns(start_ordinal: i32) -> Vec<TargetColumnDraft> {
    vec![
        TargetColumnDraft::technical(
            "load_run_id",
            start_ordinal,
            CanonicalType::String,
            SystemRole::LoadRunId,
        ),
        TargetColumnDraft::technical(
            "loaded_at",
            start_ordinal + 1,
            CanonicalType::Timestamp,
            SystemRole::LoadedAt,
        ),
    ]
}

/// The synthetic `source_identity_id` business-key column added to a
/// stage/rawcore bucket when any contributing membership carries one.
pub fn source_identity_column(ordinal: i32) -> TargetColumnDraft {
    TargetColumnDraft::technical(
        "source_identity_id",
        ordinal,
        CanonicalType::String,
        SystemRole::BusinessKey,
    )
}

/// Builds the rawcore `row_hash` column: a DSL expression over every
/// non-key/non-technical active column plus a runtime pepper literal.
///
/// `COL(__pepper__)` is a reserved DSL column name: it parses like any other
/// `COL(...)` reference, but the dialect renderer substitutes the run's
/// resolved pepper value in its place instead of qualifying it against a
/// table alias — the same seam `{{load_run_id}}` uses for other runtime-only
/// values.
pub fn row_hash_column(
    ordinal: i32,
    hashable_column_names: &[&str],
    policy: &SurrogateKeyPolicy,
) -> TargetColumnDraft {
    let mut draft = TargetColumnDraft::technical(
        "row_hash",
        ordinal,
        CanonicalType::String,
        SystemRole::RowHash,
    );
    draft.length = Some(64);
    draft.surrogate_expression = Some(build_row_hash_expression(hashable_column_names, policy));
    draft
}

fn build_row_hash_expression(hashable_column_names: &[&str], policy: &SurrogateKeyPolicy) -> String {
    let mut parts: Vec<String> = hashable_column_names
        .iter()
        .map(|name| format!("COALESCE(COL({name}), '{}')", policy.null_token))
        .collect();
    parts.push("COL(__pepper__)".to_string());
    format!(
        "HASH256(CONCAT_WS('{}', {}))",
        policy.component_separator,
        parts.join(", ")
    )
}

/// Builds the SK column for a stage/rawcore dataset: a hash expression over
/// its natural-key (business-key) component columns, unconditionally present
/// whenever the owning `TargetSchema` has `surrogate_keys_enabled`.
pub fn surrogate_key_column(
    name: String,
    ordinal: i32,
    component_column_names: &[&str],
    policy: &SurrogateKeyPolicy,
) -> TargetColumnDraft {
    let mut draft = TargetColumnDraft::technical(
        name,
        ordinal,
        CanonicalType::String,
        SystemRole::SurrogateKey,
    );
    draft.length = Some(64);
    draft.surrogate_expression = Some(build_surrogate_key_expression(component_column_names, policy));
    draft
}

/// Builds a plain surrogate-key DSL expression over the given component
/// columns (no pepper component — that's specific to `row_hash`).
pub fn build_surrogate_key_expression(component_column_names: &[&str], policy: &SurrogateKeyPolicy) -> String {
    let parts: Vec<String> = component_column_names
        .iter()
        .map(|name| format!("COALESCE(COL({name}), '{}')", policy.null_token))
        .collect();
    format!(
        "HASH256(CONCAT_WS('{}', {}))",
        policy.component_separator,
        parts.join(", ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use elevata_catalog_model::HashAlgorithm;

    #[test]
    fn builds_row_hash_expression_with_pepper_tail() {
        let policy = SurrogateKeyPolicy {
            algorithm: HashAlgorithm::Sha256,
            null_token: "~~NULL~~".into(),
            component_separator: "|".into(),
        };
        let expr = build_row_hash_expression(&["name", "email"], &policy);
        assert_eq!(
            expr,
            "HASH256(CONCAT_WS('|', COALESCE(COL(name), '~~NULL~~'), COALESCE(COL(email), '~~NULL~~'), COL(__pepper__)))"
        );
    }
}
