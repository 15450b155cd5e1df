//! Customer-facing documents for the lab exchange engine.
//!
//! - **Transactions**: result deliveries built from resolved sample exports
//! - **Templates**: output and inbound examples for customer onboarding
//! - **Acknowledgements**: reader for returned entity/field documents

#![deny(unsafe_code)]

mod common;

pub mod acknowledgement;
pub mod export;
pub mod template;
pub mod transaction;

pub use acknowledgement::{EntityRecord, read_acknowledgement, read_acknowledgement_file};
pub use export::{export_job, export_sample};
pub use template::{inbound_template, output_template};
pub use transaction::{SampleExport, Transaction, TransactionBuilder};
