//! Row materialization: copy the current row of a [`Rows`] cursor into a record.
//!
//! Two implementations share one contract and one conversion routine
//! ([`FieldValue::from_value`](crate::FieldValue::from_value)):
//!
//! - [`ReflectValue`] writes through the per-field setter generated by the derive.
//! - [`UnsafeValue`] writes straight to `base + offset` with a typed pointer.
//!
//! The session core picks one through a [`ValuerCreator`]; the raw valuer is the default.

mod reflect_value;
mod unsafe_value;

pub use reflect_value::ReflectValue;
pub use unsafe_value::UnsafeValue;

use crate::error::{OrmError, OrmResult};
use crate::model::{FieldMeta, Model};
use crate::rows::Rows;
use crate::value::Value;
use std::any::Any;

/// Fills one record from the next row of a cursor.
pub trait Valuer {
    /// Advance `rows` and write every returned column into the target record.
    ///
    /// Fails with [`OrmError::NoRows`] when the cursor is exhausted,
    /// [`OrmError::TooManyColumns`] when the row is wider than the model,
    /// [`OrmError::UnknownColumn`] for a column no field maps to, and
    /// [`OrmError::Decode`] when a cell does not convert to its field type.
    /// Cells are all decoded before the first write, but a conversion failure can
    /// leave earlier fields already written.
    fn set_columns(&mut self, rows: &mut dyn Rows) -> OrmResult<()>;
}

/// Factory that binds a valuer to a model and a target record.
pub type ValuerCreator =
    for<'a> fn(&'a Model, &'a mut dyn Any) -> OrmResult<Box<dyn Valuer + 'a>>;

/// Build a [`ReflectValue`].
pub fn reflect_creator<'a>(
    model: &'a Model,
    target: &'a mut dyn Any,
) -> OrmResult<Box<dyn Valuer + 'a>> {
    Ok(Box::new(ReflectValue::new(model, target)?))
}

/// Build an [`UnsafeValue`].
pub fn unsafe_creator<'a>(
    model: &'a Model,
    target: &'a mut dyn Any,
) -> OrmResult<Box<dyn Valuer + 'a>> {
    Ok(Box::new(UnsafeValue::new(model, target)?))
}

fn check_target(model: &Model, target: &dyn Any) -> OrmResult<()> {
    if target.type_id() == model.type_id {
        Ok(())
    } else {
        Err(OrmError::ModelMismatch {
            expected: model.type_name(),
            found: "a value of another type",
        })
    }
}

/// Advance the cursor, map its columns onto fields and decode every cell.
fn read_row<'m>(model: &'m Model, rows: &mut dyn Rows) -> OrmResult<Vec<(&'m FieldMeta, Value)>> {
    if !rows.next_row() {
        return Err(OrmError::NoRows);
    }

    let columns = rows.columns()?;
    if columns.len() > model.fields().len() {
        return Err(OrmError::TooManyColumns {
            got: columns.len(),
            max: model.fields().len(),
        });
    }

    columns
        .iter()
        .enumerate()
        .map(|(i, column)| {
            let meta = model
                .column(column)
                .ok_or_else(|| OrmError::unknown_column(column.as_str()))?;
            let value = rows.scan(i, meta.field_type())?;
            Ok((meta, value))
        })
        .collect()
}

#[cfg(test)]
mod tests;
