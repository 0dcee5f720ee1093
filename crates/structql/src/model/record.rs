//! The record trait and the per-field descriptor table it hands to the registry.

use crate::value::{ConversionError, FieldType, FieldValue, Value};
use std::any::Any;
use std::fmt;

/// Reads a field out of a type-erased record.
///
/// Returns `None` when the record is not of the type the descriptor belongs to.
pub type FieldGetter = fn(&dyn Any) -> Option<Value>;

/// Converts a value and stores it into a field of a type-erased record.
pub type FieldSetter = fn(&mut dyn Any, Value) -> Result<(), ConversionError>;

/// A struct that maps onto a table.
///
/// Implemented by `#[derive(Record)]`. The registry calls [`Record::fields`] once
/// per type and caches the resulting [`Model`](crate::Model).
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
pub trait Record: Any + Send + Sync + Sized {
    /// The Rust identifier of the type; the default table name is derived from it.
    fn type_name() -> &'static str;

    /// Field descriptors in declaration order.
    fn fields() -> Vec<FieldDescriptor>;

    /// Custom table name. Takes precedence over the derived name when `Some`.
    fn table_name() -> Option<String> {
        None
    }
}

/// Describes one field of a [`Record`]: its name, raw tag, declared type, byte offset and
/// safe accessors.
#[derive(Clone, Copy)]
pub struct FieldDescriptor {
    pub(crate) name: &'static str,
    pub(crate) tag: &'static str,
    pub(crate) ty: FieldType,
    pub(crate) offset: usize,
    pub(crate) get: FieldGetter,
    pub(crate) set: FieldSetter,
}

impl FieldDescriptor {
    /// Create a descriptor for a field of type `F`.
    ///
    /// `tag` holds comma separated `key=value` pairs (`"column=user_name"`), or `""`.
    ///
    /// # Safety
    ///
    /// `offset` must be the byte offset (as returned by [`core::mem::offset_of!`]) of a
    /// field of type exactly `F` inside the record type whose [`Record::fields`] returns
    /// this descriptor. The unsafe valuer writes an `F` at that offset.
    pub unsafe fn new<F: FieldValue>(
        name: &'static str,
        tag: &'static str,
        offset: usize,
        get: FieldGetter,
        set: FieldSetter,
    ) -> Self {
        Self {
            name,
            tag,
            ty: F::FIELD_TYPE,
            offset,
            get,
            set,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn tag(&self) -> &'static str {
        self.tag
    }

    pub fn field_type(&self) -> FieldType {
        self.ty
    }
}

impl fmt::Debug for FieldDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("name", &self.name)
            .field("tag", &self.tag)
            .field("ty", &self.ty)
            .field("offset", &self.offset)
            .finish_non_exhaustive()
    }
}

/// Build the error a setter reports when handed a record of another type.
pub fn wrong_record(expected: &'static str) -> ConversionError {
    ConversionError {
        expected,
        found: "a different record type".to_string(),
    }
}
