//! Derive macros for structql
//!
//! Provides `#[derive(Record)]`, which emits the field descriptor table the model
//! registry parses once per type.

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

mod attrs;
mod record;

/// Derive `Record` for a struct with named fields.
///
/// # Example
///
/// ```ignore
/// use structql::Record;
///
/// #[derive(Debug, Default, Record)]
/// #[orm(table = "users")]
/// struct User {
///     id: i64,
///     #[orm(column = "user_name")]
///     name: String,
///     email: Option<String>,
/// }
/// ```
///
/// # Attributes
///
/// - `#[orm(table = "name")]` on the struct - custom table name (default: snake case type name)
/// - `#[orm(column = "name")]` on a field - map the field to a different column
///
/// Any other `key = "value"` pair or bare key on a field is carried into the field tag
/// and ignored by structql.
#[proc_macro_derive(Record, attributes(orm))]
pub fn derive_record(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    record::expand(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
