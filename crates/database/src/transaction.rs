use crate::connection::execute_on;
use crate::error::DbError;
use crate::filter::Filter;
use crate::lock::{LockMode, lock_table_statement};
use crate::operations::{delete_on, insert_on, select_on, update_on};
use crate::query;
use crate::statement::Statement;
use core_types::Record;
use sqlx::postgres::{PgQueryResult, Postgres};

/// An open transaction on a [`Connection`](crate::Connection).
///
/// Row locks taken with [`select_for_update`](Self::select_for_update) and
/// table locks taken with [`lock_table`](Self::lock_table) are held until the
/// transaction ends. Dropping the handle without calling [`commit`](Self::commit)
/// rolls the transaction back.
pub struct Transaction<'c> {
    tx: sqlx::Transaction<'c, Postgres>,
}

impl<'c> Transaction<'c> {
    pub(crate) fn new(tx: sqlx::Transaction<'c, Postgres>) -> Self {
        Self { tx }
    }

    pub async fn select_from_where<R: Record>(
        &mut self,
        table: &str,
        filter: impl Into<Filter>,
    ) -> Result<Vec<R>, DbError> {
        let statement = query::select_where::<R>(table, &filter.into())?;
        select_on(&mut self.tx, &statement).await
    }

    /// Reads the matching rows and locks them against concurrent writers.
    pub async fn select_for_update<R: Record>(
        &mut self,
        table: &str,
        filter: impl Into<Filter>,
    ) -> Result<Vec<R>, DbError> {
        let statement = query::select_for_update::<R>(table, &filter.into())?;
        select_on(&mut self.tx, &statement).await
    }

    pub async fn insert_object<R: Record>(&mut self, record: &R, table: &str) -> Result<i64, DbError> {
        insert_on(&mut self.tx, record, table).await
    }

    pub async fn update_object<R: Record>(&mut self, record: &R, table: &str) -> Result<u64, DbError> {
        update_on(&mut self.tx, record, table).await
    }

    pub async fn delete_object<R: Record>(&mut self, record: &R, table: &str) -> Result<u64, DbError> {
        delete_on(&mut self.tx, record, table).await
    }

    pub async fn lock_table(&mut self, table: &str, mode: LockMode) -> Result<(), DbError> {
        execute_on(&mut self.tx, &lock_table_statement(table, mode)).await?;
        tracing::debug!(table, %mode, "Locked table.");
        Ok(())
    }

    pub async fn execute(&mut self, statement: &Statement) -> Result<PgQueryResult, DbError> {
        execute_on(&mut self.tx, statement).await
    }

    pub async fn commit(self) -> Result<(), DbError> {
        tracing::debug!("COMMIT");
        self.tx
            .commit()
            .await
            .map_err(|e| DbError::execution("COMMIT", e))
    }

    pub async fn rollback(self) -> Result<(), DbError> {
        tracing::debug!("ROLLBACK");
        self.tx
            .rollback()
            .await
            .map_err(|e| DbError::execution("ROLLBACK", e))
    }
}
