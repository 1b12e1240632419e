//! DDL generation from record descriptors.

use crate::error::DbError;
use crate::statement::Statement;
use core_types::{Record, describe};

/// `CREATE TABLE IF NOT EXISTS <table> (<definitions>);`
///
/// Each annotated field contributes `<column> <type> <constraint>` in declaration
/// order. The record must map an `id` column, and every mapped field must have a
/// known SQL type (either from its native type or an explicit override).
pub fn create_table_statement<R: Record>(table: &str) -> Result<Statement, DbError> {
    let descriptor = describe::<R>();
    descriptor.id_field()?;

    let definitions = descriptor
        .fields
        .iter()
        .map(|field| field.definition())
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Statement::new(format!(
        "CREATE TABLE IF NOT EXISTS {table} ({});",
        definitions.join(", ")
    )))
}

/// `DROP TABLE IF EXISTS <table>;`
pub fn drop_table_statement(table: &str) -> Statement {
    Statement::new(format!("DROP TABLE IF EXISTS {table};"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;
    use core_types::{CoreError, NativeType};
    use std::collections::HashMap;

    #[derive(Debug, Default, Record)]
    struct Person {
        #[sql(column = "id", sql_type = "SERIAL")]
        id: i32,
        #[sql(column = "name")]
        name: String,
        #[sql(column = "age")]
        age: i32,
    }

    #[derive(Debug, Default, Record)]
    struct Pizza {
        #[sql(column = "id", constraint = "PRIMARY KEY")]
        id: i32,
        #[sql(column = "topping", sql_type = "VARCHAR(64)", constraint = "NOT NULL")]
        topping: String,
        #[sql(column = "baked_at")]
        baked_at: Option<NaiveDateTime>,
        #[sql(column = "price")]
        price: f64,
        extras: HashMap<String, String>,
    }

    #[test]
    fn create_table_lists_definitions_in_order() {
        assert_eq!(
            create_table_statement::<Person>("People").unwrap().sql,
            "CREATE TABLE IF NOT EXISTS People (id SERIAL , name TEXT , age INT4 );"
        );
    }

    #[test]
    fn overrides_and_constraints_are_copied_verbatim() {
        assert_eq!(
            create_table_statement::<Pizza>("Pizza").unwrap().sql,
            "CREATE TABLE IF NOT EXISTS Pizza (id INT4 PRIMARY KEY, topping VARCHAR(64) NOT NULL, \
             baked_at TIMESTAMP , price FLOAT8 );"
        );
    }

    #[test]
    fn records_without_an_id_cannot_be_created() {
        #[derive(Debug, Default, Record)]
        struct Note {
            #[sql(column = "body")]
            body: String,
        }

        assert!(matches!(
            create_table_statement::<Note>("Notes"),
            Err(DbError::Descriptor(CoreError::MissingIdField("Note")))
        ));
    }

    #[test]
    fn unmapped_native_types_are_rejected() {
        #[derive(Debug, Default)]
        struct Odd;

        impl Record for Odd {
            const NAME: &'static str = "Odd";

            fn fields() -> &'static [core_types::FieldSpec] {
                const FIELDS: &[core_types::FieldSpec] = &[
                    core_types::FieldSpec::new("id", NativeType::Int32).column("id"),
                    core_types::FieldSpec::new("tags", NativeType::Unsupported("Vec<String>"))
                        .column("tags"),
                ];
                FIELDS
            }

            fn value_of(&self, _field: &str) -> Option<core_types::Value> {
                None
            }

            fn set_value(&mut self, field: &str, _value: core_types::Value) -> Result<(), CoreError> {
                Err(CoreError::UnknownField {
                    record: Self::NAME,
                    field: field.to_string(),
                })
            }
        }

        assert!(matches!(
            create_table_statement::<Odd>("Odd"),
            Err(DbError::Descriptor(CoreError::UnsupportedFieldType { field: "tags", .. }))
        ));
    }

    #[test]
    fn drop_is_idempotent_sql() {
        assert_eq!(drop_table_statement("People").sql, "DROP TABLE IF EXISTS People;");
    }
}
