use syn::{Attribute, LitStr};

/// The contents of the `#[sql(...)]` attributes on one field.
#[derive(Default)]
pub struct SqlAttrs {
    pub column: Option<LitStr>,
    pub sql_type: Option<LitStr>,
    pub constraint: Option<LitStr>,
}

impl SqlAttrs {
    pub fn parse(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut parsed = Self::default();

        for attr in attrs.iter().filter(|attr| attr.path().is_ident("sql")) {
            attr.parse_nested_meta(|meta| {
                let slot = if meta.path.is_ident("column") {
                    &mut parsed.column
                } else if meta.path.is_ident("sql_type") {
                    &mut parsed.sql_type
                } else if meta.path.is_ident("constraint") {
                    &mut parsed.constraint
                } else {
                    return Err(meta.error(
                        "unsupported sql attribute; expected `column`, `sql_type` or `constraint`",
                    ));
                };

                if slot.is_some() {
                    return Err(meta.error("duplicate sql attribute"));
                }
                *slot = Some(meta.value()?.parse()?);
                Ok(())
            })?;
        }

        Ok(parsed)
    }
}
