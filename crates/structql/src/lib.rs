//! # structql
//!
//! Struct-to-SQL mapping: typed records in, parameterized SQL out, rows back into records.
//!
//! ## Features
//!
//! - **Records**: `#[derive(Record)]` describes a struct once; the [`Registry`] turns it
//!   into a cached [`Model`] (table name, column names, field types, offsets)
//! - **Expressions**: columns, predicates, aggregates and raw fragments as plain data,
//!   validated against the model when the statement is built
//! - **Builders**: [`Selector`] and [`Inserter`] (with upserts) render a [`Query`]
//!   through the session's [`Dialect`]
//! - **Materializers**: rows are copied back into records by a safe setter based
//!   valuer or an offset based one
//! - **Middleware**: every statement runs through a handler chain; query logging and
//!   slow query detection are built in
//!
//! ## Example
//!
//! ```ignore
//! use structql::{col, Db, Inserter, Postgres, Record, Selector};
//!
//! #[derive(Debug, Default, Record)]
//! struct User {
//!     id: i64,
//!     first_name: String,
//!     age: i8,
//!     last_name: Option<String>,
//! }
//!
//! let db = Db::new(client).with_dialect(Postgres);
//!
//! let user: User = Selector::new(&db).and_where(col("id").eq(1i64)).get().await?;
//!
//! Inserter::new(&db).values([&user]).exec().await?;
//! ```

extern crate self as structql;

pub mod builder;
pub mod dialect;
pub mod error;
pub mod expr;
pub mod insert;
pub mod middleware;
pub mod model;
pub mod pg;
pub mod rows;
pub mod select;
pub mod session;
pub mod value;
pub mod valuer;

#[cfg(test)]
mod test_util;

pub use builder::{Builder, Query, QueryBuilder};
pub use dialect::{Dialect, MySql, Postgres, Sqlite};
pub use error::{OrmError, OrmResult};
pub use expr::{
    asc, assign, avg, col, count, desc, max, min, not, raw, sum, Aggregate, Assignment, Column,
    Expr, Op, OrderBy, Predicate, RawExpr,
};
pub use insert::{Assignable, ExecResult, Inserter, OnDuplicateKey, OnDuplicateKeyBuilder};
pub use middleware::{Handler, Middleware, QueryContext, QueryOutcome, QueryResult, QueryType};
pub use model::{
    underscore_name, with_column_name, with_table_name, wrong_record, FieldDescriptor,
    FieldMeta, Model, ModelOpt, Record, Registry,
};
pub use pg::PgRows;
pub use rows::{MemoryRows, Rows};
pub use select::Selector;
pub use session::{Core, Db, Executor, Session, Tx};
pub use value::{ConversionError, FieldType, FieldValue, ScalarKind, Value};
pub use valuer::{ReflectValue, UnsafeValue, Valuer, ValuerCreator};

#[cfg(feature = "derive")]
pub use structql_derive::Record;
