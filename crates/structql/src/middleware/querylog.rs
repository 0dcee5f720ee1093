//! Query logging middleware with slow query detection.
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use structql::middleware::querylog::MiddlewareBuilder;
//!
//! let db = Db::new(client).with_middleware(
//!     MiddlewareBuilder::new()
//!         .slow_threshold(Duration::from_millis(100))
//!         .build(),
//! );
//! ```

use super::{handler, middleware, Handler, Middleware};
use crate::value::Value;
use futures_util::FutureExt;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Receives every statement before it runs.
pub type LogFn = Arc<dyn Fn(&str, &[Value]) + Send + Sync>;

/// Receives statements that ran longer than the threshold.
pub type SlowFn = Arc<dyn Fn(&str, Duration) + Send + Sync>;

/// Configures and builds the query log middleware.
///
/// The middleware builds the query itself, hands it to the log function, then times the
/// rest of the chain. A build error is returned without calling the inner handler.
#[derive(Clone, Default)]
pub struct MiddlewareBuilder {
    threshold: Option<Duration>,
    max_sql_length: Option<usize>,
    log_fn: Option<LogFn>,
    slow_fn: Option<SlowFn>,
}

impl MiddlewareBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report statements whose inner call takes longer than `threshold`.
    pub fn slow_threshold(mut self, threshold: Duration) -> Self {
        self.threshold = Some(threshold);
        self
    }

    /// Truncate SQL in the default log output (in bytes).
    pub fn max_sql_length(mut self, len: usize) -> Self {
        self.max_sql_length = Some(len);
        self
    }

    /// Replace the default `tracing` output for every statement.
    pub fn log_fn(mut self, f: impl Fn(&str, &[Value]) + Send + Sync + 'static) -> Self {
        self.log_fn = Some(Arc::new(f));
        self
    }

    /// Replace the default `tracing` warning for slow statements.
    pub fn slow_fn(mut self, f: impl Fn(&str, Duration) + Send + Sync + 'static) -> Self {
        self.slow_fn = Some(Arc::new(f));
        self
    }

    pub fn build(self) -> Middleware {
        let this = Arc::new(self);
        middleware(move |next: Handler| {
            let this = Arc::clone(&this);
            handler(move |qc| {
                let this = Arc::clone(&this);
                let next = Arc::clone(&next);
                async move {
                    let query = qc.builder.build()?;
                    match &this.log_fn {
                        Some(log) => log(&query.sql, &query.args),
                        None => tracing::debug!(
                            target: "structql.sql",
                            query_type = %qc.query_type,
                            param_count = query.args.len(),
                            sql = %this.truncate(&query.sql),
                            args = ?query.args,
                            "query"
                        ),
                    }

                    let start = Instant::now();
                    let result = next(qc).await;
                    let elapsed = start.elapsed();

                    if this.threshold.is_some_and(|threshold| elapsed > threshold) {
                        match &this.slow_fn {
                            Some(slow) => slow(&query.sql, elapsed),
                            None => tracing::warn!(
                                target: "structql.sql",
                                query_type = %qc.query_type,
                                elapsed_us = elapsed.as_micros() as u64,
                                sql = %this.truncate(&query.sql),
                                "slow query"
                            ),
                        }
                    }
                    result
                }
                .boxed()
            })
        })
    }

    fn truncate<'s>(&self, sql: &'s str) -> &'s str {
        match self.max_sql_length {
            Some(max) if sql.len() > max => {
                let mut end = max;
                while !sql.is_char_boundary(end) {
                    end -= 1;
                }
                &sql[..end]
            }
            _ => sql,
        }
    }
}

impl fmt::Debug for MiddlewareBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MiddlewareBuilder")
            .field("threshold", &self.threshold)
            .field("max_sql_length", &self.max_sql_length)
            .field("log_fn", &self.log_fn.is_some())
            .field("slow_fn", &self.slow_fn.is_some())
            .finish()
    }
}
