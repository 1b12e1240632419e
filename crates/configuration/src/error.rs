use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load database settings: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Database settings validation error: {0}")]
    ValidationError(String),
}
