//! Shared statement renderer.
//!
//! [`Builder`] owns the SQL buffer and the argument list for a single `build()` call.
//! SELECT, INSERT and the dialect upsert hooks all write through it, so quoting,
//! placeholder numbering and column resolution behave the same everywhere.

use crate::dialect::Dialect;
use crate::error::{OrmError, OrmResult};
use crate::expr::{Aggregate, Expr, Op, Predicate};
use crate::model::Model;
use crate::value::Value;

/// A rendered statement and its positional arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub sql: String,
    pub args: Vec<Value>,
}

impl Query {
    pub fn new(sql: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            sql: sql.into(),
            args,
        }
    }
}

/// Anything that can render itself into a [`Query`].
///
/// `build` never mutates the builder: calling it twice yields equal queries.
pub trait QueryBuilder: Send + Sync {
    fn build(&self) -> OrmResult<Query>;
}

/// Append-only SQL buffer bound to one model and one dialect.
pub struct Builder<'a> {
    sql: String,
    args: Vec<Value>,
    model: &'a Model,
    dialect: &'a dyn Dialect,
}

impl<'a> Builder<'a> {
    pub(crate) fn new(model: &'a Model, dialect: &'a dyn Dialect) -> Self {
        Self {
            sql: String::with_capacity(128),
            args: Vec::new(),
            model,
            dialect,
        }
    }

    pub fn model(&self) -> &'a Model {
        self.model
    }

    pub fn dialect(&self) -> &'a dyn Dialect {
        self.dialect
    }

    /// SQL written so far.
    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn push_str(&mut self, s: &str) {
        self.sql.push_str(s);
    }

    pub fn push_char(&mut self, c: char) {
        self.sql.push(c);
    }

    /// Write `name` wrapped in the dialect quote character, doubling any embedded quote.
    pub fn quote(&mut self, name: &str) {
        let q = self.dialect.quoter();
        self.sql.push(q);
        for c in name.chars() {
            if c == q {
                self.sql.push(q);
            }
            self.sql.push(c);
        }
        self.sql.push(q);
    }

    /// Bind `value` and write its placeholder.
    pub fn push_arg(&mut self, value: Value) {
        self.args.push(value);
        self.dialect.write_placeholder(&mut self.sql, self.args.len());
    }

    /// Resolve a field name to its column.
    pub fn column_of(&self, field: &str) -> OrmResult<&'a str> {
        self.model
            .field(field)
            .map(|meta| meta.column())
            .ok_or_else(|| OrmError::unknown_column(field))
    }

    /// Resolve a field name and write its quoted column.
    pub fn push_column(&mut self, field: &str) -> OrmResult<()> {
        let column = self.column_of(field)?;
        self.quote(column);
        Ok(())
    }

    /// Write `table`, or the model's table when `None`. A `schema.table` name is quoted
    /// part by part.
    pub(crate) fn push_table(&mut self, table: Option<&str>) {
        let table = table.unwrap_or(self.model.table_name());
        match table.split_once('.') {
            Some((schema, name)) => {
                self.quote(schema);
                self.sql.push('.');
                self.quote(name);
            }
            None => self.quote(table),
        }
    }

    /// Render an expression in predicate position (WHERE, HAVING).
    pub(crate) fn push_expr(&mut self, expr: &Expr) -> OrmResult<()> {
        match expr {
            Expr::Column(c) => self.push_column(&c.name),
            Expr::Value(v) => {
                self.push_arg(v.clone());
                Ok(())
            }
            Expr::Predicate(p) => self.push_predicate(p),
            Expr::Aggregate(a) => self.push_aggregate(a),
            Expr::Raw(r) => {
                self.sql.push_str(&r.text);
                self.args.extend(r.args.iter().cloned());
                Ok(())
            }
            Expr::Assignment(_) => Err(OrmError::UnsupportedExpression(format!(
                "{} is not allowed in a predicate",
                expr.kind()
            ))),
        }
    }

    /// Render `left OP right`, parenthesizing nested predicates. `NOT` has no left side;
    /// a raw predicate renders its fragment alone.
    pub(crate) fn push_predicate(&mut self, pred: &Predicate) -> OrmResult<()> {
        if pred.op == Op::Raw {
            return match &pred.right {
                Some(right) => self.push_expr(right),
                None => Ok(()),
            };
        }
        if let Some(left) = &pred.left {
            self.push_operand(left)?;
            self.sql.push(' ');
        }
        self.sql.push_str(pred.op.as_str());
        self.sql.push(' ');
        if let Some(right) = &pred.right {
            self.push_operand(right)?;
        }
        Ok(())
    }

    fn push_operand(&mut self, expr: &Expr) -> OrmResult<()> {
        if let Expr::Predicate(p) = expr {
            self.sql.push('(');
            self.push_predicate(p)?;
            self.sql.push(')');
            Ok(())
        } else {
            self.push_expr(expr)
        }
    }

    fn push_aggregate(&mut self, agg: &Aggregate) -> OrmResult<()> {
        self.sql.push_str(agg.function);
        self.sql.push('(');
        self.push_column(&agg.arg)?;
        self.sql.push(')');
        Ok(())
    }

    /// Render an expression in a SELECT list, where aliases apply.
    pub(crate) fn push_projection(&mut self, expr: &Expr) -> OrmResult<()> {
        let alias = match expr {
            Expr::Column(c) => {
                self.push_column(&c.name)?;
                c.alias.as_deref()
            }
            Expr::Aggregate(a) => {
                self.push_aggregate(a)?;
                a.alias.as_deref()
            }
            Expr::Raw(_) => return self.push_expr(expr),
            Expr::Value(_) | Expr::Predicate(_) | Expr::Assignment(_) => {
                return Err(OrmError::UnsupportedExpression(format!(
                    "{} is not allowed in a select list",
                    expr.kind()
                )));
            }
        };
        if let Some(alias) = alias {
            self.sql.push_str(" as ");
            self.quote(alias);
        }
        Ok(())
    }

    pub(crate) fn finish(mut self) -> Query {
        self.sql.push(';');
        Query {
            sql: self.sql,
            args: self.args,
        }
    }
}
