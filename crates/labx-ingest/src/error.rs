use thiserror::Error;

use labx_model::{CustomerId, ModelError};

#[derive(Debug, Error)]
pub enum IngestError {
    #[error(
        "customer {customer}: {analysis_alias}/{component_alias} maps to unknown analysis {analysis}"
    )]
    UnknownAnalysis {
        customer: CustomerId,
        analysis: String,
        analysis_alias: String,
        component_alias: String,
    },
    #[error(transparent)]
    Model(#[from] ModelError),
}

pub type Result<T> = std::result::Result<T, IngestError>;
