use elevata_catalog_model::SourceDatasetGroupMembership;

use crate::draft::ConsolidationMode;

/// Chooses identity vs ranked consolidation for a multi-source stage/rawcore
/// bucket. A single contributor needs no combination at all.
pub fn decide_consolidation_mode(memberships: &[&SourceDatasetGroupMembership]) -> ConsolidationMode {
    match memberships.len() {
        0 | 1 => ConsolidationMode::None,
        _ if memberships.iter().all(|m| m.source_identity_id.is_some()) => ConsolidationMode::Identity,
        _ => ConsolidationMode::Ranked,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use elevata_catalog_model::SourceDatasetId;
    use uuid::Uuid;

    fn membership(identity: Option<&str>, ordinal: i32) -> SourceDatasetGroupMembership {
        SourceDatasetGroupMembership {
            source_dataset: SourceDatasetId::new(Uuid::new_v4()),
            is_primary_system: ordinal == 0,
            source_identity_id: identity.map(str::to_string),
            source_identity_ordinal: ordinal,
        }
    }

    #[test]
    fn single_contributor_needs_no_combination() {
        let m = membership(Some("sap_id"), 0);
        assert_eq!(decide_consolidation_mode(&[&m]), ConsolidationMode::None);
    }

    #[test]
    fn every_branch_with_identity_is_identity_mode() {
        let a = membership(Some("sap_id"), 0);
        let b = membership(Some("crm_id"), 1);
        assert_eq!(decide_consolidation_mode(&[&a, &b]), ConsolidationMode::Identity);
    }

    #[test]
    fn missing_identity_on_any_branch_forces_ranked_mode() {
        let a = membership(Some("sap_id"), 0);
        let b = membership(None, 1);
        assert_eq!(decide_consolidation_mode(&[&a, &b]), ConsolidationMode::Ranked);
    }
}
