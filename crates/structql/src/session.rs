//! Sessions: an executor plus the shared core every builder reads.

use crate::dialect::{Dialect, MySql};
use crate::error::OrmResult;
use crate::middleware::Middleware;
use crate::model::Registry;
use crate::rows::Rows;
use crate::valuer::{reflect_creator, unsafe_creator, ValuerCreator};
use crate::value::Value;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

/// Runs SQL on behalf of a session.
///
/// Implemented for `tokio_postgres::Client` and `tokio_postgres::Transaction`; tests use
/// in-memory implementations. Errors are returned as the driver reported them, wrapped
/// in [`OrmError::Storage`](crate::OrmError::Storage).
#[async_trait]
pub trait Executor: Send + Sync {
    /// Run a statement that returns rows.
    async fn query(&self, sql: &str, args: &[Value]) -> OrmResult<Box<dyn Rows>>;

    /// Run a statement and return the number of affected rows.
    async fn execute(&self, sql: &str, args: &[Value]) -> OrmResult<u64>;
}

/// State shared by every statement of a session.
#[derive(Clone)]
pub struct Core {
    pub(crate) registry: Arc<Registry>,
    pub(crate) dialect: Arc<dyn Dialect>,
    pub(crate) valuer: ValuerCreator,
    pub(crate) middlewares: Vec<Middleware>,
}

impl Core {
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn dialect(&self) -> &dyn Dialect {
        self.dialect.as_ref()
    }

    pub fn valuer(&self) -> ValuerCreator {
        self.valuer
    }

    pub fn middlewares(&self) -> &[Middleware] {
        &self.middlewares
    }
}

impl Default for Core {
    fn default() -> Self {
        Self {
            registry: Arc::new(Registry::new()),
            dialect: Arc::new(MySql),
            valuer: unsafe_creator,
            middlewares: Vec::new(),
        }
    }
}

impl fmt::Debug for Core {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Core")
            .field("models", &self.registry.len())
            .field("dialect", &self.dialect.name())
            .field("middlewares", &self.middlewares.len())
            .finish_non_exhaustive()
    }
}

/// Something statements can run against: a [`Db`] or a [`Tx`].
pub trait Session: Send + Sync {
    fn core(&self) -> &Core;

    fn executor(&self) -> &dyn Executor;
}

/// A session that owns its executor.
///
/// Defaults: MySQL dialect, a fresh registry, the unsafe valuer, no middleware.
///
/// # Example
///
/// ```ignore
/// use structql::{Db, Postgres};
/// use structql::middleware::querylog::MiddlewareBuilder;
///
/// let db = Db::new(client)
///     .with_dialect(Postgres)
///     .with_middleware(MiddlewareBuilder::new().build());
/// ```
pub struct Db {
    core: Core,
    executor: Arc<dyn Executor>,
}

impl Db {
    pub fn new(executor: impl Executor + 'static) -> Self {
        Self::from_arc(Arc::new(executor))
    }

    /// Use an executor that is already shared.
    pub fn from_arc(executor: Arc<dyn Executor>) -> Self {
        Self {
            core: Core::default(),
            executor,
        }
    }

    pub fn with_dialect(mut self, dialect: impl Dialect + 'static) -> Self {
        self.core.dialect = Arc::new(dialect);
        self
    }

    /// Share a registry between sessions.
    pub fn with_registry(mut self, registry: Arc<Registry>) -> Self {
        self.core.registry = registry;
        self
    }

    pub fn with_valuer(mut self, creator: ValuerCreator) -> Self {
        self.core.valuer = creator;
        self
    }

    /// Materialize rows through the safe setters instead of offset writes.
    pub fn use_reflect(self) -> Self {
        self.with_valuer(reflect_creator)
    }

    /// Append a middleware. Later middleware wrap earlier ones.
    pub fn with_middleware(mut self, middleware: Middleware) -> Self {
        self.core.middlewares.push(middleware);
        self
    }

    /// A session running on `executor` (typically an open transaction) with this
    /// database's core.
    pub fn tx<'e>(&self, executor: &'e dyn Executor) -> Tx<'e> {
        Tx {
            core: self.core.clone(),
            executor,
        }
    }
}

impl Session for Db {
    fn core(&self) -> &Core {
        &self.core
    }

    fn executor(&self) -> &dyn Executor {
        self.executor.as_ref()
    }
}

impl fmt::Debug for Db {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Db").field("core", &self.core).finish_non_exhaustive()
    }
}

/// A session borrowing an executor, usually a transaction. Commit and rollback stay
/// with the caller.
pub struct Tx<'e> {
    core: Core,
    executor: &'e dyn Executor,
}

impl Session for Tx<'_> {
    fn core(&self) -> &Core {
        &self.core
    }

    fn executor(&self) -> &dyn Executor {
        self.executor
    }
}

impl fmt::Debug for Tx<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tx").field("core", &self.core).finish_non_exhaustive()
    }
}
