//! Fixtures shared by unit tests.

use crate::builder::Query;
use crate::error::{OrmError, OrmResult};
use crate::rows::{MemoryRows, Rows};
use crate::session::Executor;
use crate::value::Value;
use crate::Record;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

#[derive(Debug, Default, Clone, PartialEq, Record)]
pub struct TestModel {
    pub id: i64,
    pub first_name: String,
    pub age: i8,
    pub last_name: Option<String>,
}

impl TestModel {
    pub fn tom() -> Self {
        Self {
            id: 12,
            first_name: "Tom".to_string(),
            age: 18,
            last_name: Some("Jerry".to_string()),
        }
    }
}

/// Executor that records every statement and replays canned results.
#[derive(Default)]
pub struct MockExecutor {
    seen: Mutex<Vec<Query>>,
    results: Mutex<VecDeque<OrmResult<MemoryRows>>>,
    rows_affected: u64,
}

impl MockExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows(self, rows: MemoryRows) -> Self {
        self.push(Ok(rows));
        self
    }

    pub fn with_error(self, err: OrmError) -> Self {
        self.push(Err(err));
        self
    }

    pub fn with_rows_affected(mut self, n: u64) -> Self {
        self.rows_affected = n;
        self
    }

    fn push(&self, result: OrmResult<MemoryRows>) {
        self.results.lock().unwrap().push_back(result);
    }

    pub fn seen(&self) -> Vec<Query> {
        self.seen.lock().unwrap().clone()
    }

    fn record(&self, sql: &str, args: &[Value]) {
        self.seen
            .lock()
            .unwrap()
            .push(Query::new(sql, args.to_vec()));
    }
}

#[async_trait]
impl Executor for MockExecutor {
    async fn query(&self, sql: &str, args: &[Value]) -> OrmResult<Box<dyn Rows>> {
        self.record(sql, args);
        let next = self.results.lock().unwrap().pop_front();
        match next {
            Some(Ok(rows)) => Ok(Box::new(rows)),
            Some(Err(e)) => Err(e),
            None => Ok(Box::new(MemoryRows::default())),
        }
    }

    async fn execute(&self, sql: &str, args: &[Value]) -> OrmResult<u64> {
        self.record(sql, args);
        let next = self.results.lock().unwrap().pop_front();
        match next {
            Some(Err(e)) => Err(e),
            _ => Ok(self.rows_affected),
        }
    }
}

/// Rows for `TestModel` in column order `id, first_name, age, last_name`.
pub fn test_model_rows(models: &[TestModel]) -> MemoryRows {
    models.iter().fold(
        MemoryRows::new(["id", "first_name", "age", "last_name"]),
        |rows, m| {
            rows.row([
                Value::I64(m.id),
                Value::from(m.first_name.as_str()),
                Value::I8(m.age),
                Value::from(m.last_name.clone()),
            ])
        },
    )
}
