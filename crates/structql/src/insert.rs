//! INSERT builder with dialect rendered upserts.

use crate::builder::{Builder, Query, QueryBuilder};
use crate::error::{OrmError, OrmResult};
use crate::expr::{Assignment, Column};
use crate::middleware::{chain, handler, QueryContext, QueryOutcome, QueryResult, QueryType};
use crate::model::{FieldMeta, Model, Record};
use crate::session::Session;
use futures_util::future::BoxFuture;
use futures_util::FutureExt;

/// Result of a statement run through [`Executor::execute`](crate::Executor::execute).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExecResult {
    pub rows_affected: u64,
}

/// One entry of an upsert's update list.
#[derive(Debug, Clone)]
pub enum Assignable {
    /// Set the column to a bound value.
    Assignment(Assignment),
    /// Set the column to the value the conflicting insert carried.
    Column(Column),
}

impl From<Assignment> for Assignable {
    fn from(a: Assignment) -> Self {
        Assignable::Assignment(a)
    }
}

impl From<Column> for Assignable {
    fn from(c: Column) -> Self {
        Assignable::Column(c)
    }
}

/// The upsert clause of an INSERT, rendered by the session's dialect.
#[derive(Debug, Clone, Default)]
pub struct OnDuplicateKey {
    conflict_columns: Vec<String>,
    assigns: Vec<Assignable>,
}

impl OnDuplicateKey {
    /// Field names forming the conflict target. Empty means "any".
    pub fn conflict_columns(&self) -> &[String] {
        &self.conflict_columns
    }

    pub fn assigns(&self) -> &[Assignable] {
        &self.assigns
    }
}

/// Builds `INSERT INTO ... VALUES ...` for one or more records of `T`.
///
/// # Example
///
/// ```ignore
/// use structql::{assign, col, Inserter};
///
/// let query = Inserter::new(&db)
///     .values([&user])
///     .on_duplicate_key()
///     .update([assign("age", 19).into(), col("first_name").into()])
///     .build()?;
/// ```
pub struct Inserter<'a, T: Record> {
    sess: &'a dyn Session,
    values: Vec<&'a T>,
    columns: Vec<String>,
    on_duplicate: Option<OnDuplicateKey>,
}

impl<'a, T: Record> Inserter<'a, T> {
    pub fn new(sess: &'a dyn Session) -> Self {
        Self {
            sess,
            values: Vec::new(),
            columns: Vec::new(),
            on_duplicate: None,
        }
    }

    /// Records to insert, one VALUES row each.
    pub fn values(mut self, values: impl IntoIterator<Item = &'a T>) -> Self {
        self.values = values.into_iter().collect();
        self
    }

    /// Restrict the insert to these fields (struct names). Defaults to every field.
    pub fn columns<S: Into<String>>(mut self, columns: impl IntoIterator<Item = S>) -> Self {
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Start an upsert clause.
    pub fn on_duplicate_key(self) -> OnDuplicateKeyBuilder<'a, T> {
        OnDuplicateKeyBuilder {
            inserter: self,
            conflict_columns: Vec::new(),
        }
    }

    /// Build and run the statement through the session's middleware.
    pub async fn exec(&self) -> OrmResult<ExecResult> {
        let root = chain(&self.sess.core().middlewares, handler(exec_terminal));
        let qc = QueryContext {
            query_type: QueryType::Insert,
            builder: self,
            session: self.sess,
        };
        match root(&qc).await? {
            QueryOutcome::Exec(res) => Ok(res),
            _ => Err(OrmError::Other("insert handler returned rows".to_string())),
        }
    }
}

impl<T: Record> QueryBuilder for Inserter<'_, T> {
    fn build(&self) -> OrmResult<Query> {
        if self.values.is_empty() {
            return Err(OrmError::NoValues);
        }

        let core = self.sess.core();
        let model = core.registry.get::<T>()?;
        let mut b = Builder::new(&model, core.dialect.as_ref());

        b.push_str("INSERT INTO ");
        b.push_table(None);
        b.push_str(" (");
        let fields = header(&model, &self.columns)?;
        for (i, field) in fields.iter().enumerate() {
            if i > 0 {
                b.push_char(',');
            }
            b.quote(field.column());
        }
        b.push_str(") VALUES ");

        for (row, record) in self.values.iter().enumerate() {
            if row > 0 {
                b.push_char(',');
            }
            b.push_char('(');
            for (i, field) in fields.iter().enumerate() {
                if i > 0 {
                    b.push_char(',');
                }
                let value = field.value_of(*record).ok_or(OrmError::ModelMismatch {
                    expected: model.type_name(),
                    found: T::type_name(),
                })?;
                b.push_arg(value);
            }
            b.push_char(')');
        }

        if let Some(upsert) = &self.on_duplicate {
            if upsert.assigns.is_empty() {
                return Err(OrmError::validation(
                    "upsert requires at least one assignment",
                ));
            }
            core.dialect.build_upsert(&mut b, upsert)?;
        }

        Ok(b.finish())
    }
}

/// Collects the upsert clause, then hands the inserter back.
pub struct OnDuplicateKeyBuilder<'a, T: Record> {
    inserter: Inserter<'a, T>,
    conflict_columns: Vec<String>,
}

impl<'a, T: Record> OnDuplicateKeyBuilder<'a, T> {
    /// Conflict target fields, for dialects with `ON CONFLICT (...)`.
    pub fn conflict_columns<S: Into<String>>(mut self, fields: impl IntoIterator<Item = S>) -> Self {
        self.conflict_columns = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Columns to update on conflict.
    pub fn update(mut self, assigns: impl IntoIterator<Item = Assignable>) -> Inserter<'a, T> {
        self.inserter.on_duplicate = Some(OnDuplicateKey {
            conflict_columns: self.conflict_columns,
            assigns: assigns.into_iter().collect(),
        });
        self.inserter
    }
}

/// Fields written by the insert: the selected ones, or all of them in declaration order.
fn header<'m>(model: &'m Model, columns: &[String]) -> OrmResult<Vec<&'m FieldMeta>> {
    if columns.is_empty() {
        return Ok(model.fields().iter().collect());
    }
    columns
        .iter()
        .map(|name| {
            model
                .field(name)
                .ok_or_else(|| OrmError::unknown_column(name.as_str()))
        })
        .collect()
}

fn exec_terminal<'a>(qc: &'a QueryContext<'a>) -> BoxFuture<'a, QueryResult> {
    async move {
        let query = qc.builder.build()?;
        let rows_affected = qc
            .session
            .executor()
            .execute(&query.sql, &query.args)
            .await?;
        Ok(QueryOutcome::Exec(ExecResult { rows_affected }))
    }
    .boxed()
}
