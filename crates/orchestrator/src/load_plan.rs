use elevata_catalog_model::{IncrementalStrategy, SourceDatasetId, TargetDataset};

/// The load mode a dataset executes under this run, mirroring
/// `TargetDataset::incremental_strategy` one-to-one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadMode {
    Full,
    Append,
    Merge,
    Snapshot,
    Historize,
}

impl LoadMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoadMode::Full => "full",
            LoadMode::Append => "append",
            LoadMode::Merge => "merge",
            LoadMode::Snapshot => "snapshot",
            LoadMode::Historize => "historize",
        }
    }

    fn from_strategy(strategy: IncrementalStrategy) -> Self {
        match strategy {
            IncrementalStrategy::Full => LoadMode::Full,
            IncrementalStrategy::Append => LoadMode::Append,
            IncrementalStrategy::Merge => LoadMode::Merge,
            IncrementalStrategy::Snapshot => LoadMode::Snapshot,
            IncrementalStrategy::Historize => LoadMode::Historize,
        }
    }
}

/// Resolved load semantics for one `TargetDataset` in this run.
#[derive(Debug, Clone)]
pub struct LoadPlan {
    pub mode: LoadMode,
    pub handle_deletes: bool,
    pub historize: bool,
    pub delete_detection_enabled: bool,
    /// Cleared (`None`) for `mode == Full`, since a full refresh ignores the
    /// incremental watermark and it would be misleading in logs.
    pub incremental_source: Option<SourceDatasetId>,
}

/// Builds the `{mode, handle_deletes, historize, delete_detection_enabled}`
/// tuple for a target dataset, per spec §4.9.
pub fn build_load_plan(dataset: &TargetDataset, schema_short: &str) -> LoadPlan {
    let mode = LoadMode::from_strategy(dataset.incremental_strategy);
    let delete_detection_enabled = mode == LoadMode::Merge && dataset.handle_deletes && schema_short == "rawcore";

    let incremental_source = if mode == LoadMode::Full { None } else { dataset.incremental_source };

    LoadPlan {
        mode,
        handle_deletes: dataset.handle_deletes,
        historize: dataset.historize,
        delete_detection_enabled,
        incremental_source,
    }
}

/// Whether a full refresh should drop-and-recreate (or truncate) before
/// loading. Views and `rawcore.*_hist` datasets are never truncated; only
/// `table`/`incremental` materializations under `mode == full` are.
pub fn should_truncate_before_load(load_plan: &LoadPlan, schema_short: &str, dataset_name: &str, is_view: bool) -> bool {
    if is_view {
        return false;
    }
    if schema_short == "raw" {
        return false;
    }
    if schema_short == "rawcore" && dataset_name.ends_with("_hist") {
        return false;
    }
    load_plan.mode == LoadMode::Full
}

#[cfg(test)]
mod tests {
    use super::*;
    use elevata_catalog_model::{CombinationMode, TargetColumn, TargetDataset, TargetDatasetId, TargetSchemaId};
    use uuid::Uuid;

    fn dataset(strategy: IncrementalStrategy, handle_deletes: bool, historize: bool) -> TargetDataset {
        TargetDataset {
            id: TargetDatasetId::new(Uuid::new_v4()),
            schema: TargetSchemaId::new(Uuid::new_v4()),
            name: "rc_x".to_string(),
            lineage_key: "rc_x".to_string(),
            former_names: vec![],
            historize,
            handle_deletes,
            incremental_strategy: strategy,
            incremental_source: Some(SourceDatasetId::new(Uuid::new_v4())),
            combination_mode: CombinationMode::Single,
            query_root: None,
            query_head: None,
            is_system_managed: false,
            inputs: vec![],
            columns: Vec::<TargetColumn>::new(),
            references: vec![],
            joins: vec![],
        }
    }

    #[test]
    fn merge_with_handle_deletes_in_rawcore_enables_delete_detection() {
        let ds = dataset(IncrementalStrategy::Merge, true, false);
        let plan = build_load_plan(&ds, "rawcore");
        assert!(plan.delete_detection_enabled);
        assert!(plan.incremental_source.is_some());
    }

    #[test]
    fn merge_outside_rawcore_does_not_enable_delete_detection() {
        let ds = dataset(IncrementalStrategy::Merge, true, false);
        let plan = build_load_plan(&ds, "bizcore");
        assert!(!plan.delete_detection_enabled);
    }

    #[test]
    fn full_mode_clears_incremental_source() {
        let ds = dataset(IncrementalStrategy::Full, false, false);
        let plan = build_load_plan(&ds, "rawcore");
        assert_eq!(plan.mode, LoadMode::Full);
        assert!(plan.incremental_source.is_none());
    }

    #[test]
    fn full_refresh_truncates_table_but_not_view_or_hist() {
        let ds = dataset(IncrementalStrategy::Full, false, false);
        let plan = build_load_plan(&ds, "rawcore");
        assert!(should_truncate_before_load(&plan, "rawcore", "rc_x", false));
        assert!(!should_truncate_before_load(&plan, "rawcore", "rc_x", true));
        assert!(!should_truncate_before_load(&plan, "rawcore", "rc_x_hist", false));
        assert!(!should_truncate_before_load(&plan, "raw", "raw_sap1_kna1", false));
    }
}
