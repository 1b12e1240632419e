//! Statement builders. These are pure: they only read the record descriptor
//! (and, for writes, the record's current values) and never touch a connection.

use crate::error::DbError;
use crate::filter::Filter;
use crate::statement::Statement;
use core_types::{ColumnHeader, Entry, Record, Value, describe};

/// `SELECT <cols> FROM <table>;`
pub fn select_all<R: Record>(table: &str) -> Result<Statement, DbError> {
    let columns = describe::<R>().column_list()?;
    Ok(Statement::new(format!("SELECT {columns} FROM {table};")))
}

/// `SELECT <cols> FROM <table> WHERE <filter>;`
pub fn select_where<R: Record>(table: &str, filter: &Filter) -> Result<Statement, DbError> {
    select_filtered::<R>(table, filter, "")
}

/// `SELECT <cols> FROM <table> WHERE <filter> FOR UPDATE;`
///
/// The row locks last until the enclosing transaction ends.
pub fn select_for_update<R: Record>(table: &str, filter: &Filter) -> Result<Statement, DbError> {
    select_filtered::<R>(table, filter, " FOR UPDATE")
}

fn select_filtered<R: Record>(
    table: &str,
    filter: &Filter,
    suffix: &str,
) -> Result<Statement, DbError> {
    let columns = describe::<R>().column_list()?;
    let mut values = Vec::new();
    let predicate = filter.compile(&mut values)?;
    Ok(Statement::with_values(
        format!("SELECT {columns} FROM {table} WHERE {predicate}{suffix};"),
        values,
    ))
}

/// `INSERT INTO <table> (<cols>) VALUES ($1, ...) ON CONFLICT DO NOTHING RETURNING id;`
///
/// Auto-increment columns are left to the server.
pub fn insert<R: Record>(record: &R, table: &str) -> Result<Statement, DbError> {
    let descriptor = describe::<R>();
    descriptor.id_field()?;

    let mut columns = Vec::with_capacity(descriptor.fields.len());
    let mut refs = Vec::with_capacity(descriptor.fields.len());
    let mut values = Vec::with_capacity(descriptor.fields.len());

    for field in descriptor.fields.iter().filter(|field| !field.is_auto_increment()) {
        values.push(descriptor.value(record, field)?);
        columns.push(field.column);
        refs.push(format!("${}", values.len()));
    }

    let sql = if columns.is_empty() {
        format!("INSERT INTO {table} DEFAULT VALUES ON CONFLICT DO NOTHING RETURNING id;")
    } else {
        format!(
            "INSERT INTO {table} ({}) VALUES ({}) ON CONFLICT DO NOTHING RETURNING id;",
            columns.join(", "),
            refs.join(", ")
        )
    };
    Ok(Statement::with_values(sql, values))
}

/// `UPDATE <table> SET <col> = $1, ... WHERE id = $k;`
///
/// `$k` is the placeholder of the `id` column's own SET entry. Auto-increment
/// columns other than `id` are not written.
pub fn update<R: Record>(record: &R, table: &str) -> Result<Statement, DbError> {
    let descriptor = describe::<R>();
    descriptor.id_field()?;

    let mut sets = Vec::with_capacity(descriptor.fields.len());
    let mut values = Vec::with_capacity(descriptor.fields.len());
    let mut id_ref = 0;

    for field in descriptor
        .fields
        .iter()
        .filter(|field| field.is_id() || !field.is_auto_increment())
    {
        values.push(descriptor.value(record, field)?);
        sets.push(format!("{} = ${}", field.column, values.len()));
        if field.is_id() {
            id_ref = values.len();
        }
    }

    Ok(Statement::with_values(
        format!("UPDATE {table} SET {} WHERE id = ${id_ref};", sets.join(", ")),
        values,
    ))
}

/// `DELETE FROM <table> WHERE id = $1;`
pub fn delete<R: Record>(record: &R, table: &str) -> Result<Statement, DbError> {
    let descriptor = describe::<R>();
    let id = descriptor.value(record, descriptor.id_field()?)?;
    Ok(Statement::with_values(
        format!("DELETE FROM {table} WHERE id = $1;"),
        vec![id],
    ))
}

/// `SELECT COUNT(*) FROM <table>[ WHERE <filter>];`
pub fn count(table: &str, filter: Option<&Filter>) -> Result<Statement, DbError> {
    let Some(filter) = filter else {
        return Ok(Statement::new(format!("SELECT COUNT(*) FROM {table};")));
    };

    let mut values = Vec::new();
    let predicate = filter.compile(&mut values)?;
    Ok(Statement::with_values(
        format!("SELECT COUNT(*) FROM {table} WHERE {predicate};"),
        values,
    ))
}

/// `SELECT <cols> FROM <table> ORDER BY <column> LIMIT 1;`
pub fn oldest<R: Record>(table: &str, order_column: &str) -> Result<Statement, DbError> {
    let columns = describe::<R>().column_list()?;
    Ok(Statement::new(format!(
        "SELECT {columns} FROM {table} ORDER BY {order_column} LIMIT 1;"
    )))
}

/// Insert of loose entries. Values are bound as text; an entry whose column has
/// a header is cast to that header's type.
pub fn insert_entries(
    table: &str,
    headers: &[ColumnHeader],
    entries: &[Entry],
) -> Statement {
    if entries.is_empty() {
        return Statement::new(format!(
            "INSERT INTO {table} DEFAULT VALUES ON CONFLICT DO NOTHING;"
        ));
    }

    let mut columns = Vec::with_capacity(entries.len());
    let mut refs = Vec::with_capacity(entries.len());
    let mut values = Vec::with_capacity(entries.len());

    for entry in entries {
        values.push(Value::Text(entry.value.clone()));
        let placeholder = format!("${}", values.len());
        let header = headers.iter().find(|header| header.name == entry.column_name);

        columns.push(entry.column_name.as_str());
        refs.push(match header {
            Some(header) => format!("CAST({placeholder} AS {})", header.sql_type.cast_target()),
            None => placeholder,
        });
    }

    Statement::with_values(
        format!(
            "INSERT INTO {table} ({}) VALUES ({}) ON CONFLICT DO NOTHING;",
            columns.join(", "),
            refs.join(", ")
        ),
        values,
    )
}
