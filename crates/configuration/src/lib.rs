use crate::error::ConfigError;
use config::Environment;

// Declare the modules that make up this crate.
pub mod error;
pub mod settings;

// Re-export the core types to provide a clean public API.
#[cfg(feature = "clap")]
pub use settings::ConnectionArgs;
pub use settings::{DatabaseSettings, Driver};

/// Base name of the optional settings file (`rowmap.toml`).
pub const SETTINGS_FILE: &str = "rowmap";

/// Prefix of the environment variables that override the settings file.
pub const ENV_PREFIX: &str = "ROWMAP";

/// Loads the database settings from `rowmap.toml` (if present) and the environment.
///
/// Precedence, lowest to highest: built-in defaults, the settings file,
/// `ROWMAP_*` variables, and finally `DATABASE_URL`.
pub fn load_settings() -> Result<DatabaseSettings, ConfigError> {
    build_settings(
        config::File::with_name(SETTINGS_FILE).required(false),
        Environment::with_prefix(ENV_PREFIX),
        std::env::var("DATABASE_URL").ok(),
    )
}

/// Like [`load_settings`], with every source supplied by the caller.
///
/// `env` is layered over `file` and `database_url` over both.
pub fn build_settings<S>(
    file: S,
    env: Environment,
    database_url: Option<String>,
) -> Result<DatabaseSettings, ConfigError>
where
    S: config::Source + Send + Sync + 'static,
{
    let builder = config::Config::builder()
        .set_default("driver", "postgres")?
        .set_default("host", "localhost")?
        .set_default("port", 5432)?
        .set_default("ssl_mode", "disable")?
        .add_source(file)
        .add_source(env.try_parsing(true))
        .set_override_option("url", database_url)?
        .build()?;

    let settings = builder.try_deserialize::<DatabaseSettings>()?;
    settings.validate()?;

    tracing::debug!(?settings, "Loaded database settings.");
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::{File, FileFormat, Map};

    /// An environment holding only `vars`, so the caller's shell cannot leak in.
    fn environment(vars: &[(&str, &str)]) -> Environment {
        let map: Map<String, String> = vars
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        Environment::with_prefix(ENV_PREFIX).source(Some(map))
    }

    fn from_toml(toml: &str) -> Result<DatabaseSettings, ConfigError> {
        build_settings(File::from_str(toml, FileFormat::Toml), environment(&[]), None)
    }

    #[test]
    fn defaults_fill_in_missing_fields() {
        let settings = from_toml(
            r#"
            user = "inventory"
            database = "inventory"
            "#,
        )
        .unwrap();

        assert_eq!(settings.driver, Driver::Postgres);
        assert_eq!(settings.host, "localhost");
        assert_eq!(settings.port, 5432);
        assert_eq!(settings.ssl_mode, "disable");
        assert_eq!(settings.password, "");
    }

    #[test]
    fn file_values_replace_defaults() {
        let settings = from_toml(
            r#"
            host = "db.internal"
            port = 6543
            user = "svc"
            password = "hunter2"
            database = "ledger"
            ssl_mode = "require"
            "#,
        )
        .unwrap();

        assert_eq!(settings.host, "db.internal");
        assert_eq!(settings.port, 6543);
        assert_eq!(settings.ssl_mode, "require");
        assert!(!format!("{settings:?}").contains("hunter2"));
    }

    #[test]
    fn unsupported_drivers_fail_validation() {
        let err = from_toml(
            r#"
            driver = "mysql"
            user = "svc"
            database = "ledger"
            "#,
        )
        .unwrap_err();

        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn discrete_settings_require_user_and_database() {
        let settings = DatabaseSettings {
            driver: Driver::Postgres,
            host: "localhost".into(),
            port: 5432,
            user: String::new(),
            password: String::new(),
            database: "ledger".into(),
            ssl_mode: "disable".into(),
            url: None,
        };
        assert!(settings.validate().is_err());

        let with_url = DatabaseSettings {
            url: Some("postgres://svc@localhost/ledger".into()),
            ..settings
        };
        assert!(with_url.validate().is_ok());
    }

    #[test]
    fn environment_and_url_override_the_file() {
        let settings = build_settings(
            File::from_str(
                r#"
                host = "db.internal"
                user = "svc"
                database = "ledger"
                "#,
                FileFormat::Toml,
            ),
            environment(&[("ROWMAP_HOST", "elsewhere"), ("ROWMAP_PORT", "6000")]),
            Some("postgres://reader@replica/archive".into()),
        )
        .unwrap();

        assert_eq!(settings.host, "elsewhere");
        assert_eq!(settings.port, 6000);
        assert_eq!(settings.user, "svc");
        assert_eq!(settings.url.as_deref(), Some("postgres://reader@replica/archive"));
    }
}
