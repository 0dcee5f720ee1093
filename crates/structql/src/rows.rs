//! Result cursors consumed by the valuers.

use crate::error::{OrmError, OrmResult};
use crate::value::{FieldType, Value};
use std::collections::VecDeque;

/// A forward-only cursor over a result set.
pub trait Rows: Send {
    /// Advance to the next row. Returns `false` once the cursor is exhausted.
    fn next_row(&mut self) -> bool;

    /// Column names of the result set, in select order.
    fn columns(&self) -> OrmResult<Vec<String>>;

    /// Decode cell `index` of the current row, guided by the declared field type.
    fn scan(&self, index: usize, ty: FieldType) -> OrmResult<Value>;
}

/// Rows held in memory. Used by tests and by executors that buffer results.
///
/// ```ignore
/// let rows = MemoryRows::new(["id", "first_name"])
///     .row([Value::I64(1), Value::from("Tom")]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryRows {
    columns: Vec<String>,
    pending: VecDeque<Vec<Value>>,
    current: Option<Vec<Value>>,
}

impl MemoryRows {
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            pending: VecDeque::new(),
            current: None,
        }
    }

    /// Append a row.
    pub fn row(mut self, values: impl IntoIterator<Item = Value>) -> Self {
        self.pending.push_back(values.into_iter().collect());
        self
    }

    /// Rows not yet consumed, including the current one.
    pub fn remaining(&self) -> usize {
        self.pending.len() + usize::from(self.current.is_some())
    }
}

impl Rows for MemoryRows {
    fn next_row(&mut self) -> bool {
        self.current = self.pending.pop_front();
        self.current.is_some()
    }

    fn columns(&self) -> OrmResult<Vec<String>> {
        Ok(self.columns.clone())
    }

    fn scan(&self, index: usize, _ty: FieldType) -> OrmResult<Value> {
        let column = self.columns.get(index).map_or("?", String::as_str);
        let row = self
            .current
            .as_ref()
            .ok_or_else(|| OrmError::decode(column, "scan called before next_row"))?;
        row.get(index)
            .cloned()
            .ok_or_else(|| OrmError::decode(column, format!("row has no cell {index}")))
    }
}
