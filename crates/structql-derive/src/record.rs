//! Record derive macro implementation

use crate::attrs::{field_tag, table_name};
use proc_macro2::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, Fields, Result};

pub fn expand(input: DeriveInput) -> Result<TokenStream> {
    let name = &input.ident;

    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "Record cannot be derived for generic structs",
        ));
    }

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    &input,
                    "Record can only be derived for structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                &input,
                "Record can only be derived for structs",
            ));
        }
    };

    let type_name = name.to_string();

    let descriptors = fields
        .iter()
        .map(|field| {
            let ident = field.ident.as_ref().expect("named field");
            let ty = &field.ty;
            let field_name = ident.to_string();
            let tag = field_tag(field)?;

            Ok(quote! {
                // SAFETY: offset_of! and the type argument are both taken from this field.
                unsafe {
                    ::structql::FieldDescriptor::new::<#ty>(
                        #field_name,
                        #tag,
                        ::core::mem::offset_of!(#name, #ident),
                        |record| {
                            record
                                .downcast_ref::<#name>()
                                .map(|r| ::structql::FieldValue::to_value(&r.#ident))
                        },
                        |record, value| {
                            let record = record
                                .downcast_mut::<#name>()
                                .ok_or_else(|| ::structql::wrong_record(#type_name))?;
                            record.#ident = ::structql::FieldValue::from_value(value)?;
                            ::core::result::Result::Ok(())
                        },
                    )
                }
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let table_name_fn = table_name(&input)?.map(|table| {
        quote! {
            fn table_name() -> ::core::option::Option<::std::string::String> {
                ::core::option::Option::Some(::std::string::String::from(#table))
            }
        }
    });

    Ok(quote! {
        impl ::structql::Record for #name {
            fn type_name() -> &'static str {
                #type_name
            }

            fn fields() -> ::std::vec::Vec<::structql::FieldDescriptor> {
                ::std::vec![#(#descriptors),*]
            }

            #table_name_fn
        }
    })
}
