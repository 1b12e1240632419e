use crate::error::ConfigError;
use serde::Deserialize;
use std::fmt;

/// The SQL drivers a settings file may name. Only PostgreSQL is implemented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Driver {
    #[default]
    Postgres,
    Mysql,
}

/// Everything needed to open a single database connection.
#[derive(Clone, Deserialize)]
pub struct DatabaseSettings {
    #[serde(default)]
    pub driver: Driver,
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub database: String,
    /// libpq `sslmode` value (`disable`, `prefer`, `require`, ...).
    pub ssl_mode: String,
    /// A full connection URL. When present it takes precedence over the discrete fields.
    #[serde(default)]
    pub url: Option<String>,
}

impl DatabaseSettings {
    /// Checks the settings before any connection attempt is made.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.driver != Driver::Postgres {
            return Err(ConfigError::ValidationError(format!(
                "driver {:?} is not supported; only postgres is",
                self.driver
            )));
        }

        if self.url.is_some() {
            return Ok(());
        }

        if self.user.is_empty() {
            return Err(ConfigError::ValidationError(
                "a database user must be set".to_string(),
            ));
        }
        if self.database.is_empty() {
            return Err(ConfigError::ValidationError(
                "a database name must be set".to_string(),
            ));
        }
        Ok(())
    }
}

// Hand-written so the password never reaches a log line.
impl fmt::Debug for DatabaseSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseSettings")
            .field("driver", &self.driver)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("database", &self.database)
            .field("ssl_mode", &self.ssl_mode)
            .field("url", &self.url.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Command-line overrides for the connection settings.
#[cfg(feature = "clap")]
#[derive(Debug, Clone, Default, clap::Args)]
pub struct ConnectionArgs {
    /// Database host (overrides ROWMAP_HOST).
    #[arg(long, global = true)]
    pub host: Option<String>,

    /// Database port (overrides ROWMAP_PORT).
    #[arg(long, global = true)]
    pub port: Option<u16>,

    /// Database user (overrides ROWMAP_USER).
    #[arg(long, global = true)]
    pub user: Option<String>,

    /// Database name (overrides ROWMAP_DATABASE).
    #[arg(long, global = true)]
    pub database: Option<String>,
}

#[cfg(feature = "clap")]
impl DatabaseSettings {
    /// Applies command-line overrides and re-validates the result.
    pub fn with_overrides(mut self, args: ConnectionArgs) -> Result<Self, ConfigError> {
        if let Some(host) = args.host {
            self.host = host;
        }
        if let Some(port) = args.port {
            self.port = port;
        }
        if let Some(user) = args.user {
            self.user = user;
        }
        if let Some(database) = args.database {
            self.database = database;
        }
        self.validate()?;
        Ok(self)
    }
}
