use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("invalid customer identifier: {0:?}")]
    InvalidCustomerId(String),
    #[error("unknown export policy: {0}")]
    UnknownPolicy(String),
    #[error("unknown record kind: {0}")]
    UnknownRecordKind(String),
    #[error("unknown sample status: {0}")]
    UnknownStatus(String),
}

pub type Result<T> = std::result::Result<T, ModelError>;

/// Failure to read or write a single named field on one record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("{record} has no field {field}")]
    UnknownField { record: &'static str, field: String },
    #[error("{record}.{field} is read-only")]
    ReadOnly { record: &'static str, field: String },
    #[error("invalid value {value:?} for {record}.{field}")]
    InvalidValue {
        record: &'static str,
        field: String,
        value: String,
    },
}

impl FieldError {
    pub(crate) fn unknown(record: &'static str, field: &str) -> Self {
        Self::UnknownField {
            record,
            field: field.to_string(),
        }
    }

    pub(crate) fn read_only(record: &'static str, field: &str) -> Self {
        Self::ReadOnly {
            record,
            field: field.to_string(),
        }
    }

    pub(crate) fn invalid(record: &'static str, field: &str, value: &str) -> Self {
        Self::InvalidValue {
            record,
            field: field.to_string(),
            value: value.to_string(),
        }
    }
}
