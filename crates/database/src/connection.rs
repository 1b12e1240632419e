use crate::error::DbError;
use crate::statement::Statement;
use crate::transaction::Transaction;
use configuration::DatabaseSettings;
use sqlx::Connection as _;
use sqlx::postgres::{PgConnectOptions, PgConnection, PgQueryResult, PgRow, PgSslMode};
use std::str::FromStr;

/// A single PostgreSQL session.
///
/// Every operation borrows the connection mutably, so one `Connection` serves
/// one caller at a time. Open one connection per concurrent task.
#[derive(Debug)]
pub struct Connection {
    conn: PgConnection,
    name: String,
}

impl Connection {
    /// Opens and verifies a connection described by `settings`.
    pub async fn connect(settings: &DatabaseSettings) -> Result<Self, DbError> {
        settings.validate()?;
        let options = connect_options(settings)?;
        Self::connect_with(&options).await
    }

    /// Opens and verifies a connection from a `postgres://` URL.
    pub async fn connect_url(url: &str) -> Result<Self, DbError> {
        let options = PgConnectOptions::from_str(url)
            .map_err(|e| DbError::ConnectionConfigError(e.to_string()))?;
        Self::connect_with(&options).await
    }

    async fn connect_with(options: &PgConnectOptions) -> Result<Self, DbError> {
        let name = options.get_database().unwrap_or_default().to_string();

        let mut conn = PgConnection::connect_with(options).await.map_err(|e| {
            tracing::error!(database = %name, error = %e, "Failed to connect to SQL database.");
            DbError::ConnectionError(e)
        })?;
        conn.ping().await.map_err(DbError::ConnectionError)?;

        tracing::info!(database = %name, "Successfully connected to SQL database.");
        Ok(Self { conn, name })
    }

    /// The name of the database this connection was opened against.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub async fn ping(&mut self) -> Result<(), DbError> {
        self.conn.ping().await.map_err(DbError::ConnectionError)
    }

    /// Closes the session cleanly.
    pub async fn close(self) -> Result<(), DbError> {
        let name = self.name;
        self.conn.close().await.map_err(DbError::ConnectionError)?;
        tracing::info!(database = %name, "Successfully closed connection to SQL database.");
        Ok(())
    }

    /// Executes a statement that returns no rows.
    pub async fn execute(&mut self, statement: &Statement) -> Result<PgQueryResult, DbError> {
        execute_on(&mut self.conn, statement).await
    }

    pub async fn fetch_all(&mut self, statement: &Statement) -> Result<Vec<PgRow>, DbError> {
        fetch_all_on(&mut self.conn, statement).await
    }

    pub async fn fetch_optional(&mut self, statement: &Statement) -> Result<Option<PgRow>, DbError> {
        fetch_optional_on(&mut self.conn, statement).await
    }

    /// Starts a transaction. It rolls back when dropped without `commit`.
    pub async fn begin(&mut self) -> Result<Transaction<'_>, DbError> {
        tracing::debug!("BEGIN");
        let tx = self
            .conn
            .begin()
            .await
            .map_err(|e| DbError::execution("BEGIN", e))?;
        Ok(Transaction::new(tx))
    }

    pub(crate) fn raw(&mut self) -> &mut PgConnection {
        &mut self.conn
    }
}

/// Translates settings into driver connect options. `url` wins when present.
pub fn connect_options(settings: &DatabaseSettings) -> Result<PgConnectOptions, DbError> {
    if let Some(url) = &settings.url {
        return PgConnectOptions::from_str(url)
            .map_err(|e| DbError::ConnectionConfigError(e.to_string()));
    }

    let ssl_mode = PgSslMode::from_str(&settings.ssl_mode)
        .map_err(|e| DbError::ConnectionConfigError(e.to_string()))?;

    Ok(PgConnectOptions::new()
        .host(&settings.host)
        .port(settings.port)
        .username(&settings.user)
        .password(&settings.password)
        .database(&settings.database)
        .ssl_mode(ssl_mode))
}

pub(crate) async fn execute_on(
    conn: &mut PgConnection,
    statement: &Statement,
) -> Result<PgQueryResult, DbError> {
    tracing::debug!(sql = %statement.sql, params = statement.values.len(), "Executing statement.");
    statement
        .query()
        .execute(conn)
        .await
        .map_err(|e| DbError::execution(&statement.sql, e))
}

pub(crate) async fn fetch_all_on(
    conn: &mut PgConnection,
    statement: &Statement,
) -> Result<Vec<PgRow>, DbError> {
    tracing::debug!(sql = %statement.sql, params = statement.values.len(), "Executing query.");
    statement
        .query()
        .fetch_all(conn)
        .await
        .map_err(|e| DbError::execution(&statement.sql, e))
}

pub(crate) async fn fetch_optional_on(
    conn: &mut PgConnection,
    statement: &Statement,
) -> Result<Option<PgRow>, DbError> {
    tracing::debug!(sql = %statement.sql, params = statement.values.len(), "Executing query.");
    statement
        .query()
        .fetch_optional(conn)
        .await
        .map_err(|e| DbError::execution(&statement.sql, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use configuration::Driver;

    fn settings() -> DatabaseSettings {
        DatabaseSettings {
            driver: Driver::Postgres,
            host: "db.internal".into(),
            port: 6543,
            user: "svc".into(),
            password: "secret".into(),
            database: "ledger".into(),
            ssl_mode: "disable".into(),
            url: None,
        }
    }

    #[test]
    fn discrete_settings_become_connect_options() {
        let options = connect_options(&settings()).unwrap();

        assert_eq!(options.get_host(), "db.internal");
        assert_eq!(options.get_port(), 6543);
        assert_eq!(options.get_username(), "svc");
        assert_eq!(options.get_database(), Some("ledger"));
    }

    #[test]
    fn url_takes_precedence() {
        let settings = DatabaseSettings {
            url: Some("postgres://reader@replica:5433/archive".into()),
            ..settings()
        };
        let options = connect_options(&settings).unwrap();

        assert_eq!(options.get_host(), "replica");
        assert_eq!(options.get_port(), 5433);
        assert_eq!(options.get_database(), Some("archive"));
    }

    #[test]
    fn unknown_ssl_modes_are_configuration_errors() {
        let settings = DatabaseSettings {
            ssl_mode: "sometimes".into(),
            ..settings()
        };
        assert!(matches!(
            connect_options(&settings),
            Err(DbError::ConnectionConfigError(_))
        ));
    }
}
