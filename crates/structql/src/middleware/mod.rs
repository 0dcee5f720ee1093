//! Middleware chain around statement execution.
//!
//! Every `get`, `get_multi` and `exec` call runs a [`Handler`]: a terminal handler that
//! builds the query, calls the executor and materializes the result, wrapped by the
//! middleware registered on the session. Middleware see the [`QueryContext`] before the
//! inner handler runs and the [`QueryResult`] after it returns, and may short-circuit by
//! not calling `next` at all.
//!
//! ```ignore
//! use structql::middleware::{handler, middleware};
//!
//! let reject_inserts = middleware(|next| {
//!     handler(move |qc| {
//!         let next = next.clone();
//!         Box::pin(async move {
//!             if qc.query_type == QueryType::Insert {
//!                 return Err(OrmError::validation("read only"));
//!             }
//!             next(qc).await
//!         })
//!     })
//! });
//! ```

pub mod querylog;

use crate::builder::QueryBuilder;
use crate::error::OrmResult;
use crate::insert::ExecResult;
use crate::session::Session;
use futures_util::future::BoxFuture;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// The kind of statement flowing through the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryType {
    Select,
    Insert,
}

impl QueryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryType::Select => "SELECT",
            QueryType::Insert => "INSERT",
        }
    }
}

impl fmt::Display for QueryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a handler sees: the statement kind, its builder and the session running it.
pub struct QueryContext<'a> {
    pub query_type: QueryType,
    pub builder: &'a dyn QueryBuilder,
    pub session: &'a dyn Session,
}

impl fmt::Debug for QueryContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryContext")
            .field("query_type", &self.query_type)
            .finish_non_exhaustive()
    }
}

/// Successful handler output.
pub enum QueryOutcome {
    /// One materialized record, boxed as the selector's `T`.
    Record(Box<dyn Any + Send>),
    /// Every materialized record, each boxed as the selector's `T`.
    Records(Vec<Box<dyn Any + Send>>),
    Exec(ExecResult),
}

impl fmt::Debug for QueryOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryOutcome::Record(_) => f.write_str("Record(..)"),
            QueryOutcome::Records(records) => write!(f, "Records({})", records.len()),
            QueryOutcome::Exec(res) => f.debug_tuple("Exec").field(res).finish(),
        }
    }
}

pub type QueryResult = OrmResult<QueryOutcome>;

/// One link of the chain.
pub type Handler =
    Arc<dyn for<'a> Fn(&'a QueryContext<'a>) -> BoxFuture<'a, QueryResult> + Send + Sync>;

/// Wraps a handler into another handler.
pub type Middleware = Arc<dyn Fn(Handler) -> Handler + Send + Sync>;

/// Turn a closure or function into a [`Handler`].
///
/// Passing the closure through this function pins its signature to the higher ranked
/// one the chain needs.
pub fn handler<F>(f: F) -> Handler
where
    F: for<'a> Fn(&'a QueryContext<'a>) -> BoxFuture<'a, QueryResult> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Turn a closure into a [`Middleware`].
pub fn middleware<F>(f: F) -> Middleware
where
    F: Fn(Handler) -> Handler + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Wrap `terminal` with `middlewares`. The last registered middleware ends up outermost.
pub fn chain(middlewares: &[Middleware], terminal: Handler) -> Handler {
    middlewares
        .iter()
        .fold(terminal, |next, middleware| middleware(next))
}

#[cfg(test)]
mod tests;
