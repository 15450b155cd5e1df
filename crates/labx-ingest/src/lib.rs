//! Lab exchange ingestion.
//!
//! Reads external request feeds, groups requests by customer and converts each
//! group into one job with samples and replicate tests sized from the customer's
//! component map.

#![deny(unsafe_code)]

pub mod error;
pub mod feed;
pub mod ingestor;
pub mod plan;
pub mod prompt;

pub use error::{IngestError, Result};
pub use feed::{read_requests, read_requests_csv, read_requests_json};
pub use ingestor::{
    DEFAULT_HOUSE_CUSTOMER, IngestOptions, IngestOutcome, Ingestor, UnmappedItem, apply_fields,
};
pub use plan::{ModalComponent, PlannedAnalysis, TestDefinition, TestPlan};
pub use prompt::{CustomerPrompt, FixedCustomer};
