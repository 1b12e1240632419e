use crate::error::CoreError;
use crate::type_mapper::derive_column_type;
use crate::value::{NativeType, Value};

/// The reserved column that identifies a row for update and delete.
pub const ID_COLUMN: &str = "id";

/// Explicit column types containing this marker are generated by the server on insert.
pub const AUTO_INCREMENT_MARKER: &str = "SERIAL";

/// One declared field of a record, exactly as written in its declaration.
///
/// `#[derive(Record)]` emits a `const` table of these for every record type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub field: &'static str,
    pub column: Option<&'static str>,
    pub native: NativeType,
    pub sql_type: Option<&'static str>,
    pub constraint: Option<&'static str>,
}

impl FieldSpec {
    /// A field with no column annotation.
    pub const fn new(field: &'static str, native: NativeType) -> Self {
        Self {
            field,
            column: None,
            native,
            sql_type: None,
            constraint: None,
        }
    }

    pub const fn column(mut self, column: &'static str) -> Self {
        self.column = Some(column);
        self
    }

    pub const fn sql_type(mut self, sql_type: &'static str) -> Self {
        self.sql_type = Some(sql_type);
        self
    }

    pub const fn constraint(mut self, constraint: &'static str) -> Self {
        self.constraint = Some(constraint);
        self
    }
}

/// A type whose values can be stored as rows of a SQL table.
///
/// Implemented by `#[derive(Record)]`:
///
/// ```ignore
/// #[derive(Debug, Default, Record)]
/// pub struct Person {
///     #[sql(column = "id", sql_type = "SERIAL")]
///     pub id: i32,
///     #[sql(column = "name")]
///     pub name: String,
/// }
/// ```
pub trait Record: Default + Send + 'static {
    /// The record's type name, used in diagnostics.
    const NAME: &'static str;

    /// Every declared field in declaration order, annotated or not.
    fn fields() -> &'static [FieldSpec];

    /// The current value of an annotated field, looked up by field name.
    fn value_of(&self, field: &str) -> Option<Value>;

    /// Overwrites an annotated field with a decoded value.
    fn set_value(&mut self, field: &str, value: Value) -> Result<(), CoreError>;
}

/// A field that takes part in persistence: it carries a non-empty column name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub record: &'static str,
    pub field: &'static str,
    pub column: &'static str,
    pub native: NativeType,
    pub sql_type: Option<&'static str>,
    pub constraint: Option<&'static str>,
}

impl FieldDescriptor {
    pub fn is_id(&self) -> bool {
        self.column == ID_COLUMN
    }

    pub fn is_auto_increment(&self) -> bool {
        self.sql_type
            .is_some_and(|ty| ty.to_ascii_uppercase().contains(AUTO_INCREMENT_MARKER))
    }

    /// `<column> <type> <constraint>`. The trailing separator is kept when the
    /// constraint is empty so the generated DDL stays stable.
    pub fn definition(&self) -> Result<String, CoreError> {
        let column_type = derive_column_type(self)?;
        Ok(format!(
            "{} {} {}",
            self.column,
            column_type,
            self.constraint.unwrap_or_default()
        ))
    }
}

/// The ordered persistence view of a record type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordDescriptor {
    pub record: &'static str,
    pub fields: Vec<FieldDescriptor>,
}

impl RecordDescriptor {
    pub fn columns(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(|field| field.column)
    }

    /// Comma-separated column list in declaration order.
    pub fn column_list(&self) -> Result<String, CoreError> {
        if self.fields.is_empty() {
            return Err(CoreError::NoColumns(self.record));
        }
        Ok(self.columns().collect::<Vec<_>>().join(", "))
    }

    pub fn id_field(&self) -> Result<&FieldDescriptor, CoreError> {
        self.fields
            .iter()
            .find(|field| field.is_id())
            .ok_or(CoreError::MissingIdField(self.record))
    }

    pub fn by_column(&self, column: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|field| field.column == column)
    }

    /// The current value of `field` in `record`.
    pub fn value<R: Record>(&self, record: &R, field: &FieldDescriptor) -> Result<Value, CoreError> {
        record
            .value_of(field.field)
            .ok_or_else(|| CoreError::UnknownField {
                record: self.record,
                field: field.field.to_string(),
            })
    }
}

/// Derives the persistence descriptor of `R` from its declared field table.
///
/// Fields without a column annotation are left out and reported with a warning.
/// There is no cache: every call walks the declaration again, and the result
/// only depends on the type.
pub fn describe<R: Record>() -> RecordDescriptor {
    let mut fields = Vec::with_capacity(R::fields().len());

    for spec in R::fields() {
        let Some(column) = spec.column.filter(|column| !column.is_empty()) else {
            tracing::warn!(
                record = R::NAME,
                field = spec.field,
                "Field does not have an SQL column annotation; skipping it."
            );
            continue;
        };

        fields.push(FieldDescriptor {
            record: R::NAME,
            field: spec.field,
            column,
            native: spec.native,
            sql_type: spec.sql_type,
            constraint: spec.constraint,
        });
    }

    RecordDescriptor {
        record: R::NAME,
        fields,
    }
}
