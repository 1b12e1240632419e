// Lets `#[derive(Record)]` output, which names `::core_types`, resolve inside this crate's own tests.
extern crate self as core_types;

pub mod dataforms;
pub mod descriptor;
pub mod error;
pub mod type_mapper;
pub mod value;

// Re-export the core types to provide a clean public API.
pub use dataforms::{ColumnHeader, Entry, SqlType};
pub use descriptor::{
    AUTO_INCREMENT_MARKER, FieldDescriptor, FieldSpec, ID_COLUMN, Record, RecordDescriptor,
    describe,
};
pub use error::CoreError;
pub use record_derive::Record;
pub use type_mapper::derive_column_type;
pub use value::{NativeType, SqlField, Value};
