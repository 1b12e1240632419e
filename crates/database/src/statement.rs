use chrono::NaiveDateTime;
use core_types::{NativeType, Value};
use sqlx::postgres::{PgArguments, Postgres};
use sqlx::query::Query;

/// SQL text plus the values bound to its `$n` placeholders, in order.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub values: Vec<Value>,
}

impl Statement {
    /// A statement without parameters.
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            values: Vec::new(),
        }
    }

    pub fn with_values(sql: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            sql: sql.into(),
            values,
        }
    }

    /// Builds the driver query with every value bound in placeholder order.
    pub(crate) fn query(&self) -> Query<'_, Postgres, PgArguments> {
        self.values
            .iter()
            .fold(sqlx::query(&self.sql), |query, value| bind_value(query, value))
    }
}

fn bind_value<'q>(
    query: Query<'q, Postgres, PgArguments>,
    value: &Value,
) -> Query<'q, Postgres, PgArguments> {
    match value.clone() {
        Value::Null(native) => bind_null(query, native),
        Value::Bool(v) => query.bind(v),
        Value::Int16(v) => query.bind(v),
        Value::Int32(v) => query.bind(v),
        Value::Int64(v) => query.bind(v),
        Value::Float32(v) => query.bind(v),
        Value::Float64(v) => query.bind(v),
        Value::Text(v) => query.bind(v),
        Value::Bytes(v) => query.bind(v),
        Value::Timestamp(v) => query.bind(v),
    }
}

// A typed NULL, so PostgreSQL sees the parameter type the column expects.
fn bind_null<'q>(
    query: Query<'q, Postgres, PgArguments>,
    native: NativeType,
) -> Query<'q, Postgres, PgArguments> {
    match native {
        NativeType::Bool => query.bind(None::<bool>),
        NativeType::Int16 => query.bind(None::<i16>),
        NativeType::Int32 => query.bind(None::<i32>),
        NativeType::Int64 => query.bind(None::<i64>),
        NativeType::Float32 => query.bind(None::<f32>),
        NativeType::Float64 => query.bind(None::<f64>),
        NativeType::Bytes => query.bind(None::<Vec<u8>>),
        NativeType::Timestamp => query.bind(None::<NaiveDateTime>),
        NativeType::Text | NativeType::Unsupported(_) => query.bind(None::<String>),
    }
}
