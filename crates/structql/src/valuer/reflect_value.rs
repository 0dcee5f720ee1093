use super::{check_target, read_row, Valuer};
use crate::error::{OrmError, OrmResult};
use crate::model::Model;
use crate::rows::Rows;
use std::any::Any;

/// Valuer that writes through the safe per-field setters.
pub struct ReflectValue<'a> {
    model: &'a Model,
    target: &'a mut dyn Any,
}

impl<'a> ReflectValue<'a> {
    /// Bind to `target`, which must be the record type `model` was built from.
    pub fn new(model: &'a Model, target: &'a mut dyn Any) -> OrmResult<Self> {
        check_target(model, &*target)?;
        Ok(Self { model, target })
    }
}

impl Valuer for ReflectValue<'_> {
    fn set_columns(&mut self, rows: &mut dyn Rows) -> OrmResult<()> {
        for (meta, value) in read_row(self.model, rows)? {
            (meta.set)(&mut *self.target, value).map_err(|e| OrmError::decode(meta.column(), e))?;
        }
        Ok(())
    }
}
