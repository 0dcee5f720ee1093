//! `tokio-postgres` executor adapter.
//!
//! Pair it with the [`Postgres`](crate::Postgres) dialect so placeholders render as `$n`:
//!
//! ```ignore
//! let (client, connection) = tokio_postgres::connect(&url, NoTls).await?;
//! tokio::spawn(connection);
//! let db = Db::new(client).with_dialect(Postgres);
//! ```

use crate::error::{OrmError, OrmResult};
use crate::rows::Rows;
use crate::session::Executor;
use crate::value::{FieldType, ScalarKind, Value};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use tokio_postgres::types::{FromSql, ToSql, Type};
use tokio_postgres::{Client, Row, Transaction};
use uuid::Uuid;

fn params(args: &[Value]) -> Vec<&(dyn ToSql + Sync)> {
    args.iter().map(|v| v as &(dyn ToSql + Sync)).collect()
}

#[async_trait]
impl Executor for Client {
    async fn query(&self, sql: &str, args: &[Value]) -> OrmResult<Box<dyn Rows>> {
        let rows = Client::query(self, sql, &params(args)).await?;
        Ok(Box::new(PgRows::new(rows)))
    }

    async fn execute(&self, sql: &str, args: &[Value]) -> OrmResult<u64> {
        Ok(Client::execute(self, sql, &params(args)).await?)
    }
}

#[async_trait]
impl<'t> Executor for Transaction<'t> {
    async fn query(&self, sql: &str, args: &[Value]) -> OrmResult<Box<dyn Rows>> {
        let rows = Transaction::query(self, sql, &params(args)).await?;
        Ok(Box::new(PgRows::new(rows)))
    }

    async fn execute(&self, sql: &str, args: &[Value]) -> OrmResult<u64> {
        Ok(Transaction::execute(self, sql, &params(args)).await?)
    }
}

/// Cursor over rows fetched by `tokio-postgres`.
pub struct PgRows {
    rows: std::vec::IntoIter<Row>,
    current: Option<Row>,
    columns: Vec<String>,
}

impl PgRows {
    pub fn new(rows: Vec<Row>) -> Self {
        let columns = rows
            .first()
            .map(|row| row.columns().iter().map(|c| c.name().to_string()).collect())
            .unwrap_or_default();
        Self {
            rows: rows.into_iter(),
            current: None,
            columns,
        }
    }
}

impl Rows for PgRows {
    fn next_row(&mut self) -> bool {
        self.current = self.rows.next();
        self.current.is_some()
    }

    fn columns(&self) -> OrmResult<Vec<String>> {
        Ok(self.columns.clone())
    }

    fn scan(&self, index: usize, ty: FieldType) -> OrmResult<Value> {
        let row = self
            .current
            .as_ref()
            .ok_or_else(|| OrmError::decode(index.to_string(), "scan called before next_row"))?;
        let column = row
            .columns()
            .get(index)
            .ok_or_else(|| OrmError::decode(index.to_string(), "no such column"))?;
        decode(row, index, column.type_(), ty).map_err(|e| OrmError::decode(column.name(), e))
    }
}

/// Decode by the column's wire type where it is known, so an `i8` field can read an
/// `int2` column; fall back to the declared field type otherwise.
fn decode(
    row: &Row,
    index: usize,
    wire: &Type,
    ty: FieldType,
) -> Result<Value, tokio_postgres::Error> {
    if *wire == Type::BOOL {
        cell::<bool>(row, index)
    } else if *wire == Type::CHAR {
        cell::<i8>(row, index)
    } else if *wire == Type::INT2 {
        cell::<i16>(row, index)
    } else if *wire == Type::INT4 {
        cell::<i32>(row, index)
    } else if *wire == Type::INT8 {
        cell::<i64>(row, index)
    } else if *wire == Type::OID {
        cell::<u32>(row, index)
    } else if *wire == Type::FLOAT4 {
        cell::<f32>(row, index)
    } else if *wire == Type::FLOAT8 {
        cell::<f64>(row, index)
    } else if *wire == Type::TEXT
        || *wire == Type::VARCHAR
        || *wire == Type::BPCHAR
        || *wire == Type::NAME
    {
        cell::<String>(row, index)
    } else if *wire == Type::BYTEA {
        cell::<Vec<u8>>(row, index)
    } else if *wire == Type::UUID {
        cell::<Uuid>(row, index)
    } else if *wire == Type::TIMESTAMPTZ {
        cell::<DateTime<Utc>>(row, index)
    } else if *wire == Type::TIMESTAMP {
        let naive: Option<NaiveDateTime> = row.try_get(index)?;
        Ok(naive.map(|n| n.and_utc()).into())
    } else if *wire == Type::JSON || *wire == Type::JSONB {
        cell::<serde_json::Value>(row, index)
    } else {
        by_kind(row, index, ty.kind)
    }
}

fn by_kind(row: &Row, index: usize, kind: ScalarKind) -> Result<Value, tokio_postgres::Error> {
    match kind {
        ScalarKind::Bool => cell::<bool>(row, index),
        ScalarKind::I8 => cell::<i8>(row, index),
        ScalarKind::I16 => cell::<i16>(row, index),
        ScalarKind::I32 => cell::<i32>(row, index),
        ScalarKind::I64 => cell::<i64>(row, index),
        ScalarKind::U32 => cell::<u32>(row, index),
        ScalarKind::F32 => cell::<f32>(row, index),
        ScalarKind::F64 => cell::<f64>(row, index),
        ScalarKind::Text => cell::<String>(row, index),
        ScalarKind::Bytes => cell::<Vec<u8>>(row, index),
        ScalarKind::Uuid => cell::<Uuid>(row, index),
        ScalarKind::Timestamp => cell::<DateTime<Utc>>(row, index),
        ScalarKind::Json => cell::<serde_json::Value>(row, index),
    }
}

fn cell<'r, T>(row: &'r Row, index: usize) -> Result<Value, tokio_postgres::Error>
where
    T: FromSql<'r>,
    Value: From<Option<T>>,
{
    row.try_get::<_, Option<T>>(index).map(Value::from)
}
