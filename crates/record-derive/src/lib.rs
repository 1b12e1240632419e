use proc_macro::TokenStream;

mod attrs;
mod record;

/// Derives `core_types::Record` for a struct with named fields.
///
/// Fields opt into persistence with `#[sql(column = "...")]` and may override
/// the column type (`sql_type = "SERIAL"`) or append a constraint
/// (`constraint = "PRIMARY KEY"`). Fields without a column are kept out of
/// every statement.
#[proc_macro_derive(Record, attributes(sql))]
pub fn derive_record(input: TokenStream) -> TokenStream {
    record::derive_record(input.into()).into()
}
