use crate::connection::{Connection, execute_on, fetch_all_on, fetch_optional_on};
use crate::error::DbError;
use crate::filter::Filter;
use crate::materialize::materialize;
use crate::statement::Statement;
use crate::{query, schema};
use core_types::{ColumnHeader, Entry, Record};
use sqlx::postgres::PgConnection;

/// The single column returned by `SELECT COUNT(*)`.
#[derive(Debug, Default, Record)]
struct Count {
    #[sql(column = "count")]
    count: i64,
}

/// The `RETURNING id` column of an insert. Integer ids of any width widen into it.
#[derive(Debug, Default, Record)]
struct ReturnedId {
    #[sql(column = "id")]
    id: i64,
}

impl Connection {
    /// Creates `table` with one column per annotated field of `R`, unless it already exists.
    pub async fn create_table<R: Record>(&mut self, table: &str) -> Result<(), DbError> {
        let statement = schema::create_table_statement::<R>(table)?;
        self.execute(&statement).await?;
        tracing::info!(table, record = R::NAME, "Ensured table exists.");
        Ok(())
    }

    /// Drops `table` if it exists.
    pub async fn drop_table(&mut self, table: &str) -> Result<(), DbError> {
        self.execute(&schema::drop_table_statement(table)).await?;
        tracing::info!(table, "Dropped table if it existed.");
        Ok(())
    }

    /// Fetches every row of `table` as an `R`.
    pub async fn select_from<R: Record>(&mut self, table: &str) -> Result<Vec<R>, DbError> {
        let statement = query::select_all::<R>(table)?;
        select_on(self.raw(), &statement).await
    }

    /// Fetches the rows of `table` matching `filter`.
    ///
    /// ```ignore
    /// let people: Vec<Person> = conn
    ///     .select_from_where("People", Fragment::new("id = %d").arg(3))
    ///     .await?;
    /// ```
    pub async fn select_from_where<R: Record>(
        &mut self,
        table: &str,
        filter: impl Into<Filter>,
    ) -> Result<Vec<R>, DbError> {
        let statement = query::select_where::<R>(table, &filter.into())?;
        select_on(self.raw(), &statement).await
    }

    /// Inserts `record` and returns the id the database assigned to it.
    ///
    /// A conflicting row is left untouched and the returned id is `0`.
    pub async fn insert_object<R: Record>(&mut self, record: &R, table: &str) -> Result<i64, DbError> {
        insert_on(self.raw(), record, table).await
    }

    /// Overwrites the row whose `id` matches `record`. Returns the number of rows changed.
    pub async fn update_object<R: Record>(&mut self, record: &R, table: &str) -> Result<u64, DbError> {
        update_on(self.raw(), record, table).await
    }

    /// Deletes the row whose `id` matches `record`. Returns the number of rows removed.
    pub async fn delete_object<R: Record>(&mut self, record: &R, table: &str) -> Result<u64, DbError> {
        delete_on(self.raw(), record, table).await
    }

    pub async fn count_rows(&mut self, table: &str) -> Result<i64, DbError> {
        count_on(self.raw(), &query::count(table, None)?).await
    }

    pub async fn count_rows_where(
        &mut self,
        table: &str,
        filter: impl Into<Filter>,
    ) -> Result<i64, DbError> {
        let filter = filter.into();
        count_on(self.raw(), &query::count(table, Some(&filter))?).await
    }

    /// The first row of `table` when ordered by `order_column`.
    pub async fn oldest_entry<R: Record>(
        &mut self,
        table: &str,
        order_column: &str,
    ) -> Result<R, DbError> {
        let statement = query::oldest::<R>(table, order_column)?;
        select_on::<R>(self.raw(), &statement)
            .await?
            .into_iter()
            .next()
            .ok_or(DbError::NotFound)
    }

    /// Inserts loose column/value pairs without a record type.
    #[deprecated(note = "use `insert_object` with a `Record` type instead")]
    pub async fn insert_entries(
        &mut self,
        table: &str,
        headers: &[ColumnHeader],
        entries: &[Entry],
    ) -> Result<u64, DbError> {
        let statement = query::insert_entries(table, headers, entries);
        Ok(self.execute(&statement).await?.rows_affected())
    }
}

pub(crate) async fn select_on<R: Record>(
    conn: &mut PgConnection,
    statement: &Statement,
) -> Result<Vec<R>, DbError> {
    let rows = fetch_all_on(conn, statement).await?;
    materialize(&rows[..])
}

pub(crate) async fn insert_on<R: Record>(
    conn: &mut PgConnection,
    record: &R,
    table: &str,
) -> Result<i64, DbError> {
    let statement = query::insert(record, table)?;
    let Some(row) = fetch_optional_on(conn, &statement).await? else {
        tracing::debug!(table, record = R::NAME, "Insert conflicted with an existing row.");
        return Ok(0);
    };

    let returned = materialize::<ReturnedId, _>(std::slice::from_ref(&row))?;
    Ok(returned.first().map_or(0, |returned| returned.id))
}

pub(crate) async fn update_on<R: Record>(
    conn: &mut PgConnection,
    record: &R,
    table: &str,
) -> Result<u64, DbError> {
    let statement = query::update(record, table)?;
    Ok(execute_on(conn, &statement).await?.rows_affected())
}

pub(crate) async fn delete_on<R: Record>(
    conn: &mut PgConnection,
    record: &R,
    table: &str,
) -> Result<u64, DbError> {
    let statement = query::delete(record, table)?;
    Ok(execute_on(conn, &statement).await?.rows_affected())
}

async fn count_on(conn: &mut PgConnection, statement: &Statement) -> Result<i64, DbError> {
    select_on::<Count>(conn, statement)
        .await?
        .first()
        .map(|count| count.count)
        .ok_or(DbError::NotFound)
}
