//! SQL dialects: identifier quoting, placeholder syntax and the upsert clause.

use crate::builder::Builder;
use crate::error::{OrmError, OrmResult};
use crate::insert::{Assignable, OnDuplicateKey};
use std::fmt;

/// Vendor specific rendering hooks.
///
/// Implement this to support another database; everything else in the builders is
/// dialect independent.
pub trait Dialect: fmt::Debug + Send + Sync {
    fn name(&self) -> &'static str;

    /// Identifier quote character.
    fn quoter(&self) -> char;

    /// Write the placeholder for the `index`-th argument (1-based).
    fn write_placeholder(&self, sql: &mut String, _index: usize) {
        sql.push('?');
    }

    /// Append the upsert clause to an `INSERT ... VALUES (...)` statement.
    fn build_upsert(&self, b: &mut Builder<'_>, upsert: &OnDuplicateKey) -> OrmResult<()>;
}

/// MySQL: backticks, `?`, `ON DUPLICATE KEY UPDATE`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MySql;

impl Dialect for MySql {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn quoter(&self) -> char {
        '`'
    }

    fn build_upsert(&self, b: &mut Builder<'_>, upsert: &OnDuplicateKey) -> OrmResult<()> {
        b.push_str(" ON DUPLICATE KEY UPDATE ");
        for (i, item) in upsert.assigns().iter().enumerate() {
            if i > 0 {
                b.push_char(',');
            }
            match item {
                Assignable::Assignment(a) => {
                    b.push_column(a.column())?;
                    b.push_char('=');
                    b.push_arg(a.value().clone());
                }
                Assignable::Column(c) => {
                    b.push_column(c.name())?;
                    b.push_str("=VALUES(");
                    b.push_column(c.name())?;
                    b.push_char(')');
                }
            }
        }
        Ok(())
    }
}

/// SQLite: double quotes, `?`, `ON CONFLICT ... DO UPDATE SET`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sqlite;

impl Dialect for Sqlite {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn quoter(&self) -> char {
        '"'
    }

    fn build_upsert(&self, b: &mut Builder<'_>, upsert: &OnDuplicateKey) -> OrmResult<()> {
        build_on_conflict(b, upsert, "excluded")
    }
}

/// PostgreSQL: double quotes, `$n`, `ON CONFLICT (...) DO UPDATE SET`.
///
/// Postgres requires a conflict target, so an upsert without
/// [`conflict_columns`](crate::OnDuplicateKeyBuilder::conflict_columns) is rejected.
#[derive(Debug, Clone, Copy, Default)]
pub struct Postgres;

impl Dialect for Postgres {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn quoter(&self) -> char {
        '"'
    }

    fn write_placeholder(&self, sql: &mut String, index: usize) {
        sql.push('$');
        sql.push_str(&index.to_string());
    }

    fn build_upsert(&self, b: &mut Builder<'_>, upsert: &OnDuplicateKey) -> OrmResult<()> {
        if upsert.conflict_columns().is_empty() {
            return Err(OrmError::validation(
                "postgres upsert requires at least one conflict column",
            ));
        }
        build_on_conflict(b, upsert, "EXCLUDED")
    }
}

fn build_on_conflict(b: &mut Builder<'_>, upsert: &OnDuplicateKey, excluded: &str) -> OrmResult<()> {
    b.push_str(" ON CONFLICT");
    if !upsert.conflict_columns().is_empty() {
        b.push_char('(');
        for (i, field) in upsert.conflict_columns().iter().enumerate() {
            if i > 0 {
                b.push_char(',');
            }
            b.push_column(field)?;
        }
        b.push_char(')');
    }
    b.push_str(" DO UPDATE SET ");
    for (i, item) in upsert.assigns().iter().enumerate() {
        if i > 0 {
            b.push_char(',');
        }
        match item {
            Assignable::Assignment(a) => {
                b.push_column(a.column())?;
                b.push_char('=');
                b.push_arg(a.value().clone());
            }
            Assignable::Column(c) => {
                b.push_column(c.name())?;
                b.push_char('=');
                b.push_str(excluded);
                b.push_char('.');
                b.push_column(c.name())?;
            }
        }
    }
    Ok(())
}
