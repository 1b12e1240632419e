use crate::value::{NativeType, Value};
use thiserror::Error;

/// Descriptor errors. These are raised before any statement reaches the database.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    #[error("Unsupported field type {native} for field '{field}' in record {record}")]
    UnsupportedFieldType {
        record: &'static str,
        field: &'static str,
        native: NativeType,
    },

    #[error("Record {0} does not have a field for the ID column")]
    MissingIdField(&'static str),

    #[error("Record {0} has no fields mapped to SQL columns")]
    NoColumns(&'static str),

    #[error("Record {record} has no SQL field named '{field}'")]
    UnknownField { record: &'static str, field: String },

    #[error("Field '{field}' in record {record} expects {expected}, found {found:?}")]
    TypeMismatch {
        record: &'static str,
        field: &'static str,
        expected: NativeType,
        found: Value,
    },
}
