//! Offset based writes. This is the only module in the crate that dereferences raw
//! pointers.

use super::{check_target, read_row, Valuer};
use crate::error::{OrmError, OrmResult};
use crate::model::{FieldMeta, Model};
use crate::rows::Rows;
use crate::value::{ConversionError, FieldValue, ScalarKind, Value};
use chrono::{DateTime, Utc};
use std::any::Any;
use uuid::Uuid;

/// Valuer that writes each cell at `record address + field offset`.
///
/// Field offsets and types come from the record's descriptor table, which the
/// derive builds with `offset_of!` and which [`FieldDescriptor::new`] requires to be
/// exact. The target's type is checked against the model on construction.
///
/// [`FieldDescriptor::new`]: crate::FieldDescriptor::new
pub struct UnsafeValue<'a> {
    model: &'a Model,
    target: &'a mut dyn Any,
}

impl<'a> UnsafeValue<'a> {
    /// Bind to `target`, which must be the record type `model` was built from.
    pub fn new(model: &'a Model, target: &'a mut dyn Any) -> OrmResult<Self> {
        check_target(model, &*target)?;
        Ok(Self { model, target })
    }
}

impl Valuer for UnsafeValue<'_> {
    fn set_columns(&mut self, rows: &mut dyn Rows) -> OrmResult<()> {
        let cells = read_row(self.model, rows)?;
        let base = (&mut *self.target as *mut dyn Any).cast::<u8>();
        for (meta, value) in cells {
            // SAFETY: `check_target` proved `base` points at the record type the model
            // was built from, and `meta` belongs to that model. We hold the unique
            // borrow of the record for the duration of the write.
            unsafe { write_field(base, meta, value) }
                .map_err(|e| OrmError::decode(meta.column(), e))?;
        }
        Ok(())
    }
}

/// Convert `value` to the field's declared type and store it at `base + offset`,
/// dropping the previous field value.
///
/// # Safety
///
/// `base` must point to a live, exclusively borrowed record of the type `meta`
/// was built from.
unsafe fn write_field(base: *mut u8, meta: &FieldMeta, value: Value) -> Result<(), ConversionError> {
    // SAFETY: guaranteed by the caller.
    let ptr = unsafe { base.add(meta.offset) };

    macro_rules! store {
        ($ty:ty) => {{
            let converted = <$ty as FieldValue>::from_value(value)?;
            // SAFETY: the descriptor declared a field of type `$ty` at this offset.
            unsafe { *ptr.cast::<$ty>() = converted };
        }};
    }

    macro_rules! store_kind {
        ($ty:ty) => {
            if meta.ty.nullable {
                store!(Option<$ty>)
            } else {
                store!($ty)
            }
        };
    }

    match meta.ty.kind {
        ScalarKind::Bool => store_kind!(bool),
        ScalarKind::I8 => store_kind!(i8),
        ScalarKind::I16 => store_kind!(i16),
        ScalarKind::I32 => store_kind!(i32),
        ScalarKind::I64 => store_kind!(i64),
        ScalarKind::U32 => store_kind!(u32),
        ScalarKind::F32 => store_kind!(f32),
        ScalarKind::F64 => store_kind!(f64),
        ScalarKind::Text => store_kind!(String),
        ScalarKind::Bytes => store_kind!(Vec<u8>),
        ScalarKind::Uuid => store_kind!(Uuid),
        ScalarKind::Timestamp => store_kind!(DateTime<Utc>),
        ScalarKind::Json => store_kind!(serde_json::Value),
    }
    Ok(())
}
