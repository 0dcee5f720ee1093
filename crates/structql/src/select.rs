//! SELECT builder and typed fetching.

use crate::builder::{Builder, Query, QueryBuilder};
use crate::error::{OrmError, OrmResult};
use crate::expr::{Expr, OrderBy, Predicate};
use crate::middleware::{
    chain, handler, Handler, QueryContext, QueryOutcome, QueryResult, QueryType,
};
use crate::model::{Model, Record};
use crate::rows::Rows;
use crate::session::{Core, Session};
use crate::value::Value;
use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use std::any::Any;
use std::marker::PhantomData;

/// Builds a `SELECT` over the table of `T` and decodes rows into `T`.
///
/// # Example
///
/// ```ignore
/// use structql::{asc, col, Selector};
///
/// let users: Vec<User> = Selector::<User>::new(&db)
///     .and_where(col("age").gt(18))
///     .order_by(asc("id"))
///     .limit(10)
///     .get_multi()
///     .await?;
/// ```
pub struct Selector<'a, T: Record> {
    sess: &'a dyn Session,
    table: Option<String>,
    columns: Vec<Expr>,
    wheres: Vec<Predicate>,
    group_by: Vec<String>,
    havings: Vec<Predicate>,
    order_by: Vec<OrderBy>,
    limit: i64,
    offset: i64,
    _record: PhantomData<fn() -> T>,
}

impl<'a, T: Record> Selector<'a, T> {
    pub fn new(sess: &'a dyn Session) -> Self {
        Self {
            sess,
            table: None,
            columns: Vec::new(),
            wheres: Vec::new(),
            group_by: Vec::new(),
            havings: Vec::new(),
            order_by: Vec::new(),
            limit: 0,
            offset: 0,
            _record: PhantomData,
        }
    }

    /// Override the table. `schema.table` is quoted as two identifiers.
    pub fn from(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    /// Projection list. Empty selects `*`.
    pub fn select(mut self, columns: impl IntoIterator<Item = Expr>) -> Self {
        self.columns = columns.into_iter().collect();
        self
    }

    /// Add a WHERE predicate; multiple predicates are joined with AND.
    pub fn and_where(mut self, pred: Predicate) -> Self {
        self.wheres.push(pred);
        self
    }

    pub fn group_by<S: Into<String>>(mut self, fields: impl IntoIterator<Item = S>) -> Self {
        self.group_by = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Add a HAVING predicate; multiple predicates are joined with AND.
    pub fn and_having(mut self, pred: Predicate) -> Self {
        self.havings.push(pred);
        self
    }

    pub fn order_by(mut self, order: OrderBy) -> Self {
        self.order_by.push(order);
        self
    }

    /// Ignored unless positive.
    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = limit;
        self
    }

    /// Ignored unless positive.
    pub fn offset(mut self, offset: i64) -> Self {
        self.offset = offset;
        self
    }

    /// Fetch the first row.
    ///
    /// Returns [`OrmError::NoRows`] when the result set is empty.
    pub async fn get(&self) -> OrmResult<T>
    where
        T: Default,
    {
        match self.run(handler(get_terminal::<T>)).await? {
            QueryOutcome::Record(record) => downcast::<T>(record),
            _ => Err(unexpected_outcome()),
        }
    }

    /// Fetch every row.
    pub async fn get_multi(&self) -> OrmResult<Vec<T>>
    where
        T: Default,
    {
        match self.run(handler(get_multi_terminal::<T>)).await? {
            QueryOutcome::Records(records) => records.into_iter().map(downcast::<T>).collect(),
            _ => Err(unexpected_outcome()),
        }
    }

    async fn run(&self, terminal: Handler) -> QueryResult {
        let root = chain(&self.sess.core().middlewares, terminal);
        let qc = QueryContext {
            query_type: QueryType::Select,
            builder: self,
            session: self.sess,
        };
        root(&qc).await
    }

    fn push_group_by(&self, b: &mut Builder<'_>) -> OrmResult<()> {
        b.push_str(" GROUP BY ");
        for (i, field) in self.group_by.iter().enumerate() {
            if i > 0 {
                b.push_char(',');
            }
            b.push_column(field)?;
        }
        Ok(())
    }

    fn push_order_by(&self, b: &mut Builder<'_>) -> OrmResult<()> {
        b.push_str(" ORDER BY ");
        for (i, order) in self.order_by.iter().enumerate() {
            if i > 0 {
                b.push_char(',');
            }
            b.push_column(&order.column)?;
            b.push_str(if order.desc { " DESC" } else { " ASC" });
        }
        Ok(())
    }
}

impl<T: Record> QueryBuilder for Selector<'_, T> {
    fn build(&self) -> OrmResult<Query> {
        let core = self.sess.core();
        let model = core.registry.get::<T>()?;
        let mut b = Builder::new(&model, core.dialect.as_ref());

        b.push_str("SELECT ");
        if self.columns.is_empty() {
            b.push_char('*');
        } else {
            for (i, column) in self.columns.iter().enumerate() {
                if i > 0 {
                    b.push_char(',');
                }
                b.push_projection(column)?;
            }
        }

        b.push_str(" FROM ");
        b.push_table(self.table.as_deref());

        if let Some(pred) = Predicate::all(&self.wheres) {
            b.push_str(" WHERE ");
            b.push_predicate(&pred)?;
        }
        if !self.group_by.is_empty() {
            self.push_group_by(&mut b)?;
        }
        if let Some(pred) = Predicate::all(&self.havings) {
            b.push_str(" HAVING ");
            b.push_predicate(&pred)?;
        }
        if !self.order_by.is_empty() {
            self.push_order_by(&mut b)?;
        }
        if self.limit > 0 {
            b.push_str(" LIMIT ");
            b.push_arg(Value::I64(self.limit));
        }
        if self.offset > 0 {
            b.push_str(" OFFSET ");
            b.push_arg(Value::I64(self.offset));
        }

        Ok(b.finish())
    }
}

fn get_terminal<'a, T: Record + Default>(qc: &'a QueryContext<'a>) -> BoxFuture<'a, QueryResult> {
    async move {
        let query = qc.builder.build()?;
        let mut rows = qc.session.executor().query(&query.sql, &query.args).await?;
        let core = qc.session.core();
        let model = core.registry.get::<T>()?;
        let record = materialize::<T>(core, &model, rows.as_mut())?;
        Ok(QueryOutcome::Record(Box::new(record)))
    }
    .boxed()
}

fn get_multi_terminal<'a, T: Record + Default>(
    qc: &'a QueryContext<'a>,
) -> BoxFuture<'a, QueryResult> {
    async move {
        let query = qc.builder.build()?;
        let mut rows = qc.session.executor().query(&query.sql, &query.args).await?;
        let core = qc.session.core();
        let model = core.registry.get::<T>()?;
        let mut records: Vec<Box<dyn Any + Send>> = Vec::new();
        loop {
            match materialize::<T>(core, &model, rows.as_mut()) {
                Ok(record) => records.push(Box::new(record)),
                Err(OrmError::NoRows) => break,
                Err(e) => return Err(e),
            }
        }
        Ok(QueryOutcome::Records(records))
    }
    .boxed()
}

fn materialize<T: Record + Default>(core: &Core, model: &Model, rows: &mut dyn Rows) -> OrmResult<T> {
    let mut record = T::default();
    let mut valuer = (core.valuer)(model, &mut record)?;
    valuer.set_columns(rows)?;
    drop(valuer);
    Ok(record)
}

fn downcast<T: Any>(record: Box<dyn Any + Send>) -> OrmResult<T> {
    record
        .downcast::<T>()
        .map(|r| *r)
        .map_err(|_| unexpected_outcome())
}

fn unexpected_outcome() -> OrmError {
    OrmError::Other("select handler returned an unexpected outcome".to_string())
}
