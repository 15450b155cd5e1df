//! Result resolution for customer exports.
//!
//! The [`resolver`] decides which physical results on a sample are reported
//! under a customer's export policy. The [`translate`] module turns one
//! selected result into the text the customer sees.

#![deny(unsafe_code)]

pub mod resolver;
pub mod translate;

pub use resolver::{ResolvedExport, ResolvedTest, ResultRef, Selection, resolve};
pub use translate::{synthesize_item, translate_result};
