use crate::descriptor::FieldDescriptor;
use crate::error::CoreError;
use crate::value::NativeType;

impl NativeType {
    /// The PostgreSQL keyword for this native type, if it has one.
    pub fn keyword(self) -> Option<&'static str> {
        let keyword = match self {
            NativeType::Bool => "BOOL",
            NativeType::Int16 => "INT2",
            NativeType::Int32 => "INT4",
            NativeType::Int64 => "INT8",
            NativeType::Float32 => "FLOAT4",
            NativeType::Float64 => "FLOAT8",
            NativeType::Text => "TEXT",
            NativeType::Bytes => "BYTEA",
            NativeType::Timestamp => "TIMESTAMP",
            NativeType::Unsupported(_) => return None,
        };
        Some(keyword)
    }
}

/// Derives the SQL column type of a field.
///
/// An explicit `sql_type` always wins and is passed through untouched, so
/// dialect-specific types such as `SERIAL` or `NUMERIC(10, 2)` work without any
/// support here.
pub fn derive_column_type(field: &FieldDescriptor) -> Result<&'static str, CoreError> {
    if let Some(sql_type) = field.sql_type {
        return Ok(sql_type);
    }

    field
        .native
        .keyword()
        .ok_or(CoreError::UnsupportedFieldType {
            record: field.record,
            field: field.field,
            native: field.native,
        })
}
