/// Named PostgreSQL column types used by the loose entry path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlType {
    Int,
    Int64,
    Float,
    Double,
    String,
    Time,
    Json,
    Bool,
    Serial,
}

impl SqlType {
    /// The PostgreSQL spelling of the type.
    pub fn format(&self) -> &'static str {
        match self {
            SqlType::Int => "INTEGER",
            SqlType::Int64 => "BIGINT",
            SqlType::Float => "REAL",
            SqlType::Double => "DOUBLE PRECISION",
            SqlType::String => "TEXT",
            SqlType::Time => "TIMESTAMP",
            SqlType::Json => "JSON",
            SqlType::Bool => "BOOLEAN",
            SqlType::Serial => "SERIAL",
        }
    }

    /// The type a text parameter is cast to when written into this column.
    /// `SERIAL` is only a column default, so values are cast to its storage type.
    pub fn cast_target(&self) -> &'static str {
        match self {
            SqlType::Serial => "INTEGER",
            other => other.format(),
        }
    }
}

/// A column header in a SQL table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnHeader {
    pub name: String,
    pub sql_type: SqlType,
}

impl ColumnHeader {
    pub fn new(name: impl Into<String>, sql_type: SqlType) -> Self {
        Self {
            name: name.into(),
            sql_type,
        }
    }
}

/// A loose column/value pair. Values are not checked against any record type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub column_name: String,
    pub value: String,
}

impl Entry {
    pub fn new(column_name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            column_name: column_name.into(),
            value: value.into(),
        }
    }
}
