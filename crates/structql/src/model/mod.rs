//! Table metadata derived from record types.
//!
//! A [`Model`] is built once per [`Record`] type by the [`Registry`] and shared by every
//! builder and valuer afterwards. It maps field names and column names to the same
//! [`FieldMeta`], which carries everything both valuers need: the safe accessors and
//! the byte offset.

mod record;
mod registry;

pub use record::{wrong_record, FieldDescriptor, FieldGetter, FieldSetter, Record};
pub use registry::{parse_tag, underscore_name, Registry};

use crate::value::{FieldType, Value};
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;

/// Registration-time override applied by [`Registry::register`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelOpt {
    /// Replace the table name.
    TableName(String),
    /// Replace the column a field maps to.
    ColumnName { field: String, column: String },
}

/// Override the table name of a model.
pub fn with_table_name(name: impl Into<String>) -> ModelOpt {
    ModelOpt::TableName(name.into())
}

/// Override the column name of a single field.
pub fn with_column_name(field: impl Into<String>, column: impl Into<String>) -> ModelOpt {
    ModelOpt::ColumnName {
        field: field.into(),
        column: column.into(),
    }
}

/// Metadata for one record field.
#[derive(Clone)]
pub struct FieldMeta {
    pub(crate) name: &'static str,
    pub(crate) column: String,
    pub(crate) ty: FieldType,
    pub(crate) offset: usize,
    pub(crate) tags: HashMap<String, String>,
    pub(crate) get: FieldGetter,
    pub(crate) set: FieldSetter,
}

impl FieldMeta {
    /// Field name as declared on the struct.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Column the field maps to.
    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn field_type(&self) -> FieldType {
        self.ty
    }

    /// Byte offset of the field inside the record.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Every tag key parsed from the field annotation, including the ones structql ignores.
    pub fn tags(&self) -> &HashMap<String, String> {
        &self.tags
    }

    /// Read the field out of a record; `None` if `record` is of another type.
    pub fn value_of(&self, record: &dyn Any) -> Option<Value> {
        (self.get)(record)
    }
}

impl fmt::Debug for FieldMeta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldMeta")
            .field("name", &self.name)
            .field("column", &self.column)
            .field("ty", &self.ty)
            .field("offset", &self.offset)
            .finish_non_exhaustive()
    }
}

/// Table metadata for a record type.
#[derive(Debug, Clone)]
pub struct Model {
    pub(crate) type_id: TypeId,
    pub(crate) type_name: &'static str,
    pub(crate) table_name: String,
    /// Declaration order.
    pub(crate) fields: Vec<FieldMeta>,
    pub(crate) field_index: HashMap<&'static str, usize>,
    pub(crate) column_index: HashMap<String, usize>,
}

impl Model {
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Rust type name of the record this model describes.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Whether the model was built for `T`.
    pub fn is_for<T: Any>(&self) -> bool {
        self.type_id == TypeId::of::<T>()
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> &[FieldMeta] {
        &self.fields
    }

    /// Look up a field by its struct name.
    pub fn field(&self, name: &str) -> Option<&FieldMeta> {
        self.field_index.get(name).map(|&i| &self.fields[i])
    }

    /// Look up a field by its column name.
    pub fn column(&self, column: &str) -> Option<&FieldMeta> {
        self.column_index.get(column).map(|&i| &self.fields[i])
    }

    pub(crate) fn apply(&mut self, opt: ModelOpt) -> crate::OrmResult<()> {
        match opt {
            ModelOpt::TableName(name) => self.table_name = name,
            ModelOpt::ColumnName { field, column } => {
                let index = *self
                    .field_index
                    .get(field.as_str())
                    .ok_or(crate::OrmError::UnknownColumn(field))?;
                self.fields[index].column = column;
            }
        }
        Ok(())
    }

    pub(crate) fn rebuild_column_index(&mut self) -> crate::OrmResult<()> {
        let mut column_index = HashMap::with_capacity(self.fields.len());
        for (i, field) in self.fields.iter().enumerate() {
            if column_index.insert(field.column.clone(), i).is_some() {
                return Err(crate::OrmError::validation(format!(
                    "column {} is mapped by more than one field of {}",
                    field.column, self.type_name
                )));
            }
        }
        self.column_index = column_index;
        Ok(())
    }
}
