use chrono::NaiveDateTime;
use std::fmt;

/// The semantic type of a record field, independent of any SQL dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NativeType {
    Bool,
    Int16,
    Int32,
    Int64,
    Float32,
    Float64,
    Text,
    Bytes,
    Timestamp,
    /// Any other Rust type (collections, maps, boxes, nested structs). Carries
    /// the type as written in the record declaration.
    Unsupported(&'static str),
}

impl fmt::Display for NativeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NativeType::Bool => f.write_str("bool"),
            NativeType::Int16 => f.write_str("int16"),
            NativeType::Int32 => f.write_str("int32"),
            NativeType::Int64 => f.write_str("int64"),
            NativeType::Float32 => f.write_str("float32"),
            NativeType::Float64 => f.write_str("float64"),
            NativeType::Text => f.write_str("text"),
            NativeType::Bytes => f.write_str("bytes"),
            NativeType::Timestamp => f.write_str("timestamp"),
            NativeType::Unsupported(ty) => write!(f, "`{ty}`"),
        }
    }
}

/// A single field value on its way to or from the database.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// SQL NULL. Keeps the native type so the driver can declare the parameter.
    Null(NativeType),
    Bool(bool),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Float32(f32),
    Float64(f64),
    Text(String),
    Bytes(Vec<u8>),
    Timestamp(NaiveDateTime),
}

impl Value {
    pub fn native_type(&self) -> NativeType {
        match self {
            Value::Null(native) => *native,
            Value::Bool(_) => NativeType::Bool,
            Value::Int16(_) => NativeType::Int16,
            Value::Int32(_) => NativeType::Int32,
            Value::Int64(_) => NativeType::Int64,
            Value::Float32(_) => NativeType::Float32,
            Value::Float64(_) => NativeType::Float64,
            Value::Text(_) => NativeType::Text,
            Value::Bytes(_) => NativeType::Bytes,
            Value::Timestamp(_) => NativeType::Timestamp,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null(_))
    }
}

/// A Rust type that can live in a record field mapped to a SQL column.
///
/// Conversions out of a [`Value`] accept lossless widening (an `INT2` column can
/// fill an `i64` field) and hand the value back unchanged when they cannot.
pub trait SqlField: Sized {
    const NATIVE: NativeType;

    fn to_value(&self) -> Value;

    fn from_value(value: Value) -> Result<Self, Value>;
}

macro_rules! sql_field {
    ($ty:ty, $variant:ident $(, $wider:ident)*) => {
        impl SqlField for $ty {
            const NATIVE: NativeType = NativeType::$variant;

            fn to_value(&self) -> Value {
                Value::$variant(self.clone())
            }

            fn from_value(value: Value) -> Result<Self, Value> {
                match value {
                    Value::$variant(v) => Ok(v),
                    $(Value::$wider(v) => Ok(<$ty>::from(v)),)*
                    other => Err(other),
                }
            }
        }
    };
}

sql_field!(bool, Bool);
sql_field!(i16, Int16);
sql_field!(i32, Int32, Int16);
sql_field!(i64, Int64, Int16, Int32);
sql_field!(f32, Float32);
sql_field!(f64, Float64, Float32);
sql_field!(String, Text);
sql_field!(Vec<u8>, Bytes);
sql_field!(NaiveDateTime, Timestamp);

impl<T: SqlField> SqlField for Option<T> {
    const NATIVE: NativeType = T::NATIVE;

    fn to_value(&self) -> Value {
        match self {
            Some(inner) => inner.to_value(),
            None => Value::Null(T::NATIVE),
        }
    }

    fn from_value(value: Value) -> Result<Self, Value> {
        match value {
            Value::Null(_) => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}
