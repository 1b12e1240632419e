//! Turns result sets back into typed records.

use crate::error::DbError;
use chrono::NaiveDateTime;
use core_types::{NativeType, Record, Value, describe};
use sqlx::postgres::PgRow;
use sqlx::{Column, Row, TypeInfo};
use std::collections::HashSet;

/// A result-set column as reported by the driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMeta {
    pub name: String,
    pub type_name: String,
}

impl ColumnMeta {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
        }
    }
}

/// A rectangular result set the materializer can read.
pub trait RowSource {
    /// Column names and types, identical for every row.
    fn columns(&self) -> Vec<ColumnMeta>;

    fn row_count(&self) -> usize;

    /// Decodes one cell into a value holder of type `holder`. SQL NULL becomes
    /// `Value::Null(holder)`.
    fn decode(&self, row: usize, column: usize, holder: NativeType) -> Result<Value, DbError>;
}

impl RowSource for [PgRow] {
    fn columns(&self) -> Vec<ColumnMeta> {
        self.first()
            .map(|row| {
                row.columns()
                    .iter()
                    .map(|column| ColumnMeta::new(column.name(), column.type_info().name()))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn row_count(&self) -> usize {
        self.len()
    }

    fn decode(&self, row: usize, column: usize, holder: NativeType) -> Result<Value, DbError> {
        let row = &self[row];
        let decoded = match holder {
            NativeType::Bool => row.try_get::<Option<bool>, _>(column).map(|v| v.map(Value::Bool)),
            NativeType::Int16 => row.try_get::<Option<i16>, _>(column).map(|v| v.map(Value::Int16)),
            NativeType::Int32 => row.try_get::<Option<i32>, _>(column).map(|v| v.map(Value::Int32)),
            NativeType::Int64 => row.try_get::<Option<i64>, _>(column).map(|v| v.map(Value::Int64)),
            NativeType::Float32 => {
                row.try_get::<Option<f32>, _>(column).map(|v| v.map(Value::Float32))
            }
            NativeType::Float64 => {
                row.try_get::<Option<f64>, _>(column).map(|v| v.map(Value::Float64))
            }
            NativeType::Text => row.try_get::<Option<String>, _>(column).map(|v| v.map(Value::Text)),
            NativeType::Bytes => {
                row.try_get::<Option<Vec<u8>>, _>(column).map(|v| v.map(Value::Bytes))
            }
            NativeType::Timestamp => row
                .try_get::<Option<NaiveDateTime>, _>(column)
                .map(|v| v.map(Value::Timestamp)),
            NativeType::Unsupported(type_name) => {
                return Err(DbError::UnsupportedColumnType {
                    column: row.columns()[column].name().to_string(),
                    type_name: type_name.to_string(),
                });
            }
        };

        decoded
            .map(|value| value.unwrap_or(Value::Null(holder)))
            .map_err(|source| DbError::Decode {
                column: row.columns()[column].name().to_string(),
                source,
            })
    }
}

/// The value holder used to decode a column of the given driver type.
///
/// Floating point columns are pinned to the matching float width instead of
/// trusting the reported scan type.
pub fn scan_type(type_name: &str) -> Option<NativeType> {
    let holder = match type_name.to_ascii_uppercase().as_str() {
        "FLOAT4" | "REAL" => NativeType::Float32,
        "FLOAT8" | "DOUBLE PRECISION" => NativeType::Float64,
        "BOOL" | "BOOLEAN" => NativeType::Bool,
        "INT2" | "SMALLINT" | "SMALLSERIAL" => NativeType::Int16,
        "INT4" | "INT" | "INTEGER" | "SERIAL" => NativeType::Int32,
        "INT8" | "BIGINT" | "BIGSERIAL" => NativeType::Int64,
        "TEXT" | "VARCHAR" | "BPCHAR" | "CHAR" | "NAME" => NativeType::Text,
        "BYTEA" => NativeType::Bytes,
        "TIMESTAMP" => NativeType::Timestamp,
        _ => return None,
    };
    Some(holder)
}

/// One column that feeds a record field.
struct Slot {
    index: usize,
    field: &'static str,
    holder: NativeType,
}

/// Materializes every row of `rows` into a fresh `R`, in result-set order.
///
/// Columns that match no field are skipped with one warning per column. A row
/// is fully decoded before its record is allocated, and any decode failure
/// aborts the whole read.
pub fn materialize<R: Record, S: RowSource + ?Sized>(rows: &S) -> Result<Vec<R>, DbError> {
    let count = rows.row_count();
    if count == 0 {
        return Ok(Vec::new());
    }

    let descriptor = describe::<R>();
    let mut warned = HashSet::new();
    let mut slots = Vec::new();

    for (index, column) in rows.columns().into_iter().enumerate() {
        let Some(field) = descriptor.by_column(&column.name) else {
            if warned.insert(column.name.clone()) {
                tracing::warn!(
                    record = R::NAME,
                    column = %column.name,
                    "Result column does not match any record field; skipping it."
                );
            }
            continue;
        };

        let holder = scan_type(&column.type_name).ok_or_else(|| DbError::UnsupportedColumnType {
            column: column.name.clone(),
            type_name: column.type_name.clone(),
        })?;

        slots.push(Slot {
            index,
            field: field.field,
            holder,
        });
    }

    let mut records = Vec::with_capacity(count);
    for row in 0..count {
        let decoded = slots
            .iter()
            .map(|slot| Ok((slot.field, rows.decode(row, slot.index, slot.holder)?)))
            .collect::<Result<Vec<_>, DbError>>()?;

        let mut record = R::default();
        for (field, value) in decoded {
            record.set_value(field, value)?;
        }
        records.push(record);
    }

    tracing::debug!(record = R::NAME, rows = records.len(), "Materialized result set.");
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::CoreError;

    /// An in-memory result set. Cells are returned as stored; a cell whose kind
    /// differs from the requested holder fails to decode.
    struct MemoryRows {
        columns: Vec<ColumnMeta>,
        rows: Vec<Vec<Value>>,
    }

    impl RowSource for MemoryRows {
        fn columns(&self) -> Vec<ColumnMeta> {
            self.columns.clone()
        }

        fn row_count(&self) -> usize {
            self.rows.len()
        }

        fn decode(&self, row: usize, column: usize, holder: NativeType) -> Result<Value, DbError> {
            match &self.rows[row][column] {
                Value::Null(_) => Ok(Value::Null(holder)),
                value if value.native_type() == holder => Ok(value.clone()),
                value => Err(DbError::Decode {
                    column: self.columns[column].name.clone(),
                    source: sqlx::Error::Decode(
                        format!("cannot read {value:?} as {holder}").into(),
                    ),
                }),
            }
        }
    }

    #[derive(Debug, Default, Clone, PartialEq, Record)]
    struct Person {
        #[sql(column = "id", sql_type = "SERIAL")]
        id: i32,
        #[sql(column = "name")]
        name: String,
        #[sql(column = "age")]
        age: Option<i64>,
        #[sql(column = "score")]
        score: f64,
    }

    fn people(rows: Vec<Vec<Value>>) -> MemoryRows {
        MemoryRows {
            columns: vec![
                ColumnMeta::new("id", "INT4"),
                ColumnMeta::new("name", "TEXT"),
                ColumnMeta::new("age", "INT4"),
                ColumnMeta::new("score", "FLOAT4"),
            ],
            rows,
        }
    }

    #[test]
    fn rows_become_records_in_order() {
        let source = people(vec![
            vec![
                Value::Int32(1),
                Value::Text("Ana".into()),
                Value::Int32(30),
                Value::Float32(1.5),
            ],
            vec![
                Value::Int32(2),
                Value::Text("Ben".into()),
                Value::Null(NativeType::Int32),
                Value::Float32(2.0),
            ],
        ]);

        let records: Vec<Person> = materialize(&source).unwrap();

        assert_eq!(
            records,
            vec![
                Person {
                    id: 1,
                    name: "Ana".into(),
                    age: Some(30),
                    score: 1.5
                },
                Person {
                    id: 2,
                    name: "Ben".into(),
                    age: None,
                    score: 2.0
                },
            ]
        );
    }

    #[test]
    fn empty_result_sets_are_not_errors() {
        let records: Vec<Person> = materialize(&people(Vec::new())).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn unmatched_columns_are_skipped() {
        let source = MemoryRows {
            columns: vec![
                ColumnMeta::new("name", "VARCHAR"),
                ColumnMeta::new("debug", "JSONB"),
            ],
            rows: vec![vec![Value::Text("Cid".into()), Value::Text("{}".into())]],
        };

        let records: Vec<Person> = materialize(&source).unwrap();
        assert_eq!(
            records,
            vec![Person {
                name: "Cid".into(),
                ..Person::default()
            }]
        );
    }

    #[test]
    fn a_bad_cell_aborts_the_read() {
        let source = people(vec![
            vec![
                Value::Int32(1),
                Value::Text("Ana".into()),
                Value::Int32(30),
                Value::Float32(1.5),
            ],
            vec![
                Value::Int32(2),
                Value::Int32(7),
                Value::Int32(31),
                Value::Float32(2.0),
            ],
        ]);

        let err = materialize::<Person, _>(&source).unwrap_err();
        assert!(matches!(err, DbError::Decode { ref column, .. } if column == "name"));
    }

    #[test]
    fn null_into_a_required_field_is_a_type_mismatch() {
        let source = people(vec![vec![
            Value::Int32(1),
            Value::Null(NativeType::Text),
            Value::Int32(1),
            Value::Float32(0.0),
        ]]);

        let err = materialize::<Person, _>(&source).unwrap_err();
        assert!(matches!(
            err,
            DbError::Descriptor(CoreError::TypeMismatch { field: "name", .. })
        ));
    }

    #[test]
    fn mapped_columns_need_a_known_driver_type() {
        let source = MemoryRows {
            columns: vec![ColumnMeta::new("name", "JSONB")],
            rows: vec![vec![Value::Text("{}".into())]],
        };

        assert!(matches!(
            materialize::<Person, _>(&source),
            Err(DbError::UnsupportedColumnType { ref type_name, .. }) if type_name == "JSONB"
        ));
    }

    #[test]
    fn float_columns_are_pinned_to_their_width() {
        assert_eq!(scan_type("FLOAT4"), Some(NativeType::Float32));
        assert_eq!(scan_type("float8"), Some(NativeType::Float64));
        assert_eq!(scan_type("INT8"), Some(NativeType::Int64));
        assert_eq!(scan_type("BPCHAR"), Some(NativeType::Text));
        assert_eq!(scan_type("NUMERIC"), None);
    }
}
