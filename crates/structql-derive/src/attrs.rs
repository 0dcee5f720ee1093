//! Attribute parsing for the Record derive macro.
//!
//! Handles struct-level `#[orm(table = "...")]` and field-level `#[orm(...)]` tags.

use syn::{DeriveInput, Result};

/// One `key` or `key = "value"` entry of a field attribute.
struct TagEntry {
    key: String,
    value: Option<String>,
}

/// Parsed contents of a field-level `#[orm(...)]`.
struct FieldTag {
    entries: Vec<TagEntry>,
}

impl syn::parse::Parse for FieldTag {
    fn parse(input: syn::parse::ParseStream) -> Result<Self> {
        let mut entries = Vec::new();

        loop {
            if input.is_empty() {
                break;
            }

            let ident: syn::Ident = input.parse()?;
            let value = if input.peek(syn::Token![=]) {
                let _: syn::Token![=] = input.parse()?;
                let lit: syn::LitStr = input.parse()?;
                let value = lit.value();
                if value.contains([',', '=']) {
                    return Err(syn::Error::new_spanned(
                        &lit,
                        "tag values cannot contain ',' or '='",
                    ));
                }
                Some(value)
            } else {
                None
            };
            entries.push(TagEntry {
                key: ident.to_string(),
                value,
            });

            if input.peek(syn::Token![,]) {
                let _: syn::Token![,] = input.parse()?;
            } else {
                break;
            }
        }

        Ok(FieldTag { entries })
    }
}

/// Render all `#[orm(...)]` attributes of a field as a `key=value,key` tag string.
pub(crate) fn field_tag(field: &syn::Field) -> Result<String> {
    let mut parts = Vec::new();
    for attr in &field.attrs {
        if !attr.path().is_ident("orm") {
            continue;
        }
        let parsed: FieldTag = attr.parse_args()?;
        for entry in parsed.entries {
            match entry.value {
                Some(value) => parts.push(format!("{}={}", entry.key, value)),
                None => parts.push(entry.key),
            }
        }
    }
    Ok(parts.join(","))
}

/// Extract the table name from a struct-level `#[orm(table = "...")]`, if any.
pub(crate) fn table_name(input: &DeriveInput) -> Result<Option<String>> {
    for attr in &input.attrs {
        if !attr.path().is_ident("orm") {
            continue;
        }
        let nested = attr.parse_args::<syn::MetaNameValue>()?;
        if !nested.path.is_ident("table") {
            return Err(syn::Error::new_spanned(
                &nested.path,
                "unsupported struct attribute, expected #[orm(table = \"...\")]",
            ));
        }
        if let syn::Expr::Lit(syn::ExprLit {
            lit: syn::Lit::Str(lit),
            ..
        }) = &nested.value
        {
            return Ok(Some(lit.value()));
        }
        return Err(syn::Error::new_spanned(
            &nested.value,
            "table name must be a string literal",
        ));
    }
    Ok(None)
}
