use elevata_catalog_model::SourceDatasetId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TargetGenError {
    #[error("source dataset {0} has no owning source system")]
    UnknownSourceSystem(SourceDatasetId),
    #[error("naming error building physical name: {0}")]
    Naming(#[from] elevata_naming::NameError),
    #[error("hist rebuild requested for a dataset with no active surrogate key column")]
    MissingSurrogateKeyForHist,
}
