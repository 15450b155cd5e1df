//! Error types for mapping configuration.

use std::fmt;

/// Errors raised while editing a customer profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MappingError {
    /// The customer identity node is fixed and cannot be remapped.
    CustomerFieldRemapped { kind: String },
    /// Node name that cannot be written as a document element.
    InvalidNodeName { kind: String, node: String },
    /// Analysis order must start at 1.
    InvalidAnalysisOrder { analysis: String, order: u32 },
    /// A second primary entry for the same alias pair.
    DuplicatePrimary {
        analysis_alias: String,
        component_alias: String,
    },
}

impl fmt::Display for MappingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CustomerFieldRemapped { kind } => {
                write!(f, "CUSTOMER_ID cannot be remapped at {kind} level")
            }
            Self::InvalidNodeName { kind, node } => {
                write!(f, "Node name '{node}' at {kind} level is not a valid element name")
            }
            Self::InvalidAnalysisOrder { analysis, order } => {
                write!(f, "Invalid analysis order {order} for {analysis}")
            }
            Self::DuplicatePrimary {
                analysis_alias,
                component_alias,
            } => write!(
                f,
                "Alias pair '{analysis_alias}'/'{component_alias}' already has a primary entry"
            ),
        }
    }
}

impl std::error::Error for MappingError {}
