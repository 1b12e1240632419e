use crate::attrs::SqlAttrs;
use proc_macro2::TokenStream;
use quote::{ToTokens, quote};
use syn::ext::IdentExt;
use syn::{Data, DeriveInput, Error, Fields};

// derive_record
pub fn derive_record(input: TokenStream) -> TokenStream {
    let input: DeriveInput = match syn::parse2(input) {
        Ok(input) => input,
        Err(err) => return err.to_compile_error(),
    };

    match expand(&input) {
        Ok(tokens) => tokens,
        Err(err) => err.to_compile_error(),
    }
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream> {
    let ident = &input.ident;
    let record_name = ident.unraw().to_string();

    let named = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(named) => &named.named,
            other => {
                return Err(Error::new_spanned(
                    other,
                    format!("type {record_name} is not a structure with named fields"),
                ));
            }
        },
        _ => {
            return Err(Error::new_spanned(
                ident,
                format!("type {record_name} is not a structure"),
            ));
        }
    };

    if !input.generics.params.is_empty() {
        return Err(Error::new_spanned(
            &input.generics,
            "generic records are not supported",
        ));
    }

    let mut specs = Vec::with_capacity(named.len());
    let mut getters = Vec::new();
    let mut setters = Vec::new();

    for field in named {
        let field_ident = field.ident.as_ref().expect("named field");
        let field_name = field_ident.unraw().to_string();
        let ty = &field.ty;
        let attrs = SqlAttrs::parse(&field.attrs)?;

        let Some(column) = attrs.column else {
            // Unmapped fields may hold any type, so only its spelling is recorded.
            let type_name = ty.to_token_stream().to_string().replace(' ', "");
            specs.push(quote! {
                ::core_types::FieldSpec::new(
                    #field_name,
                    ::core_types::NativeType::Unsupported(#type_name),
                )
            });
            continue;
        };

        let sql_type = attrs.sql_type.map(|lit| quote!(.sql_type(#lit)));
        let constraint = attrs.constraint.map(|lit| quote!(.constraint(#lit)));
        specs.push(quote! {
            ::core_types::FieldSpec::new(
                #field_name,
                <#ty as ::core_types::SqlField>::NATIVE,
            )
            .column(#column)
            #sql_type
            #constraint
        });

        getters.push(quote! {
            #field_name => ::core::option::Option::Some(
                ::core_types::SqlField::to_value(&self.#field_ident),
            ),
        });

        setters.push(quote! {
            #field_name => {
                self.#field_ident = <#ty as ::core_types::SqlField>::from_value(value).map_err(
                    |found| ::core_types::CoreError::TypeMismatch {
                        record: #record_name,
                        field: #field_name,
                        expected: <#ty as ::core_types::SqlField>::NATIVE,
                        found,
                    },
                )?;
                ::core::result::Result::Ok(())
            }
        });
    }

    Ok(quote! {
        impl ::core_types::Record for #ident {
            const NAME: &'static str = #record_name;

            fn fields() -> &'static [::core_types::FieldSpec] {
                const FIELDS: &[::core_types::FieldSpec] = &[#(#specs),*];
                FIELDS
            }

            fn value_of(&self, field: &str) -> ::core::option::Option<::core_types::Value> {
                match field {
                    #(#getters)*
                    _ => ::core::option::Option::None,
                }
            }

            #[allow(unused_variables)]
            fn set_value(
                &mut self,
                field: &str,
                value: ::core_types::Value,
            ) -> ::core::result::Result<(), ::core_types::CoreError> {
                match field {
                    #(#setters)*
                    other => ::core::result::Result::Err(::core_types::CoreError::UnknownField {
                        record: #record_name,
                        field: ::std::string::ToString::to_string(other),
                    }),
                }
            }
        }
    })
}
