//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use structql::{Executor, MemoryRows, OrmError, OrmResult, Query, Record, Rows, Value};

#[derive(Debug, Default, Clone, PartialEq, Record)]
pub struct TestModel {
    pub id: i64,
    pub first_name: String,
    pub age: i8,
    pub last_name: Option<String>,
}

pub fn tom() -> TestModel {
    TestModel {
        id: 12,
        first_name: "Tom".to_string(),
        age: 18,
        last_name: Some("Jerry".to_string()),
    }
}

pub fn rows_of(models: &[TestModel]) -> MemoryRows {
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

/// In-memory executor: records statements, replays queued results.
#[derive(Default)]
pub struct MemExecutor {
    seen: Mutex<Vec<Query>>,
    results: Mutex<VecDeque<OrmResult<MemoryRows>>>,
    rows_affected: u64,
}

impl MemExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rows(self, rows: MemoryRows) -> Self {
        self.results.lock().unwrap().push_back(Ok(rows));
        self
    }

    pub fn fail(self, err: OrmError) -> Self {
        self.results.lock().unwrap().push_back(Err(err));
        self
    }

    pub fn rows_affected(mut self, n: u64) -> Self {
        self.rows_affected = n;
        self
    }

    pub fn seen(&self) -> Vec<Query> {
        self.seen.lock().unwrap().clone()
    }

    fn next(&self, sql: &str, args: &[Value]) -> Option<OrmResult<MemoryRows>> {
        self.seen
            .lock()
            .unwrap()
            .push(Query::new(sql, args.to_vec()));
        self.results.lock().unwrap().pop_front()
    }
}

#[async_trait]
impl Executor for MemExecutor {
    async fn query(&self, sql: &str, args: &[Value]) -> OrmResult<Box<dyn Rows>> {
        match self.next(sql, args) {
            Some(Ok(rows)) => Ok(Box::new(rows)),
            Some(Err(e)) => Err(e),
            None => Ok(Box::new(MemoryRows::default())),
        }
    }

    async fn execute(&self, sql: &str, args: &[Value]) -> OrmResult<u64> {
        match self.next(sql, args) {
            Some(Err(e)) => Err(e),
            _ => Ok(self.rows_affected),
        }
    }
}

/// A driver error stand-in.
#[derive(Debug, thiserror::Error)]
#[error("connection reset by peer")]
pub struct ConnectionReset;
