use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Invalid database settings: {0}")]
    ConnectionConfigError(String),

    #[error("Failed to load database settings: {0}")]
    Settings(#[from] configuration::error::ConfigError),

    #[error("Failed to connect to the database: {0}")]
    ConnectionError(#[source] sqlx::Error),

    #[error("Record descriptor error: {0}")]
    Descriptor(#[from] core_types::CoreError),

    #[error("Failed to execute SQL statement {statement:?}: {source}")]
    Execution {
        statement: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("Failed to decode column '{column}': {source}")]
    Decode {
        column: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("Column '{column}' has type {type_name}, which cannot be read into a record field")]
    UnsupportedColumnType { column: String, type_name: String },

    #[error("Filter {filter:?} has {placeholders} placeholders but {arguments} arguments")]
    FilterArity {
        filter: String,
        placeholders: usize,
        arguments: usize,
    },

    #[error("The requested data was not found in the database.")]
    NotFound,
}

impl DbError {
    pub(crate) fn execution(statement: &str, source: sqlx::Error) -> Self {
        DbError::Execution {
            statement: statement.to_string(),
            source,
        }
    }
}
