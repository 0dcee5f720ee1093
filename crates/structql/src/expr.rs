//! Expression AST for projections, WHERE/HAVING predicates and upsert assignments.
//!
//! Nodes are plain data: constructing them never fails and never touches SQL text.
//! Field names are resolved against the model only when a builder renders them, so an
//! unknown name surfaces as [`OrmError::UnknownColumn`](crate::OrmError) from `build()`.
//!
//! ```ignore
//! use structql::{avg, col, not};
//!
//! let adults = col("age").gt(18).and(col("age").lt(35));
//! let not_bob = not(col("first_name").eq("bob"));
//! let avg_age = avg("age").alias("a");
//! ```

use crate::value::Value;

/// A node of the query AST.
#[derive(Debug, Clone)]
pub enum Expr {
    Column(Column),
    Value(Value),
    Predicate(Predicate),
    Aggregate(Aggregate),
    Raw(RawExpr),
    Assignment(Assignment),
}

impl Expr {
    /// Node kind, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Expr::Column(_) => "column",
            Expr::Value(_) => "value",
            Expr::Predicate(_) => "predicate",
            Expr::Aggregate(_) => "aggregate",
            Expr::Raw(_) => "raw expression",
            Expr::Assignment(_) => "assignment",
        }
    }
}

impl From<Column> for Expr {
    fn from(c: Column) -> Self {
        Expr::Column(c)
    }
}

impl From<Value> for Expr {
    fn from(v: Value) -> Self {
        Expr::Value(v)
    }
}

impl From<Predicate> for Expr {
    fn from(p: Predicate) -> Self {
        Expr::Predicate(p)
    }
}

impl From<Aggregate> for Expr {
    fn from(a: Aggregate) -> Self {
        Expr::Aggregate(a)
    }
}

impl From<RawExpr> for Expr {
    fn from(r: RawExpr) -> Self {
        Expr::Raw(r)
    }
}

impl From<Assignment> for Expr {
    fn from(a: Assignment) -> Self {
        Expr::Assignment(a)
    }
}

/// Predicate operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Eq,
    Lt,
    Gt,
    Not,
    And,
    Or,
    /// A raw fragment used as a predicate; only its text is rendered.
    Raw,
}

impl Op {
    pub fn as_str(&self) -> &'static str {
        match self {
            Op::Eq => "=",
            Op::Lt => "<",
            Op::Gt => ">",
            Op::Not => "NOT",
            Op::And => "AND",
            Op::Or => "OR",
            Op::Raw => "",
        }
    }
}

/// A field reference, optionally aliased in a projection.
#[derive(Debug, Clone)]
pub struct Column {
    pub(crate) name: String,
    pub(crate) alias: Option<String>,
}

/// Reference a record field by its struct name.
pub fn col(name: impl Into<String>) -> Column {
    Column {
        name: name.into(),
        alias: None,
    }
}

impl Column {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Alias used when the column appears in a SELECT list.
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// `column = value`
    pub fn eq(self, value: impl Into<Value>) -> Predicate {
        Predicate::binary(Expr::Column(self), Op::Eq, Expr::Value(value.into()))
    }

    /// `column > value`
    pub fn gt(self, value: impl Into<Value>) -> Predicate {
        Predicate::binary(Expr::Column(self), Op::Gt, Expr::Value(value.into()))
    }

    /// `column < value`
    pub fn lt(self, value: impl Into<Value>) -> Predicate {
        Predicate::binary(Expr::Column(self), Op::Lt, Expr::Value(value.into()))
    }
}

/// A boolean node. `Not` has only a right side; every other operator has both.
#[derive(Debug, Clone)]
pub struct Predicate {
    pub(crate) left: Option<Box<Expr>>,
    pub(crate) op: Op,
    pub(crate) right: Option<Box<Expr>>,
}

impl Predicate {
    fn binary(left: Expr, op: Op, right: Expr) -> Self {
        Self {
            left: Some(Box::new(left)),
            op,
            right: Some(Box::new(right)),
        }
    }

    pub fn op(&self) -> Op {
        self.op
    }

    /// `(self) AND (other)`
    pub fn and(self, other: Predicate) -> Predicate {
        Self::binary(Expr::Predicate(self), Op::And, Expr::Predicate(other))
    }

    /// `(self) OR (other)`
    pub fn or(self, other: Predicate) -> Predicate {
        Self::binary(Expr::Predicate(self), Op::Or, Expr::Predicate(other))
    }

    /// Fold predicates left to right with AND; `None` when there are none.
    pub(crate) fn all(preds: &[Predicate]) -> Option<Predicate> {
        let (first, rest) = preds.split_first()?;
        Some(
            rest.iter()
                .cloned()
                .fold(first.clone(), |acc, next| acc.and(next)),
        )
    }
}

/// `NOT (pred)`
pub fn not(pred: Predicate) -> Predicate {
    Predicate {
        left: None,
        op: Op::Not,
        right: Some(Box::new(Expr::Predicate(pred))),
    }
}

/// An aggregate function over one column.
#[derive(Debug, Clone)]
pub struct Aggregate {
    pub(crate) arg: String,
    pub(crate) function: &'static str,
    pub(crate) alias: Option<String>,
}

macro_rules! aggregate_fn {
    ($(#[$doc:meta])* $name:ident, $sql:literal) => {
        $(#[$doc])*
        pub fn $name(column: impl Into<String>) -> Aggregate {
            Aggregate {
                arg: column.into(),
                function: $sql,
                alias: None,
            }
        }
    };
}

aggregate_fn!(
    /// `AVG(column)`
    avg,
    "AVG"
);
aggregate_fn!(
    /// `SUM(column)`
    sum,
    "SUM"
);
aggregate_fn!(
    /// `COUNT(column)`
    count,
    "COUNT"
);
aggregate_fn!(
    /// `MIN(column)`
    min,
    "MIN"
);
aggregate_fn!(
    /// `MAX(column)`
    max,
    "MAX"
);

impl Aggregate {
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// `FN(column) = value`, for HAVING.
    pub fn eq(self, value: impl Into<Value>) -> Predicate {
        Predicate::binary(Expr::Aggregate(self), Op::Eq, Expr::Value(value.into()))
    }

    /// `FN(column) > value`
    pub fn gt(self, value: impl Into<Value>) -> Predicate {
        Predicate::binary(Expr::Aggregate(self), Op::Gt, Expr::Value(value.into()))
    }

    /// `FN(column) < value`
    pub fn lt(self, value: impl Into<Value>) -> Predicate {
        Predicate::binary(Expr::Aggregate(self), Op::Lt, Expr::Value(value.into()))
    }
}

/// SQL text emitted verbatim, with its own arguments.
///
/// Placeholders inside the text are the caller's responsibility.
#[derive(Debug, Clone)]
pub struct RawExpr {
    pub(crate) text: String,
    pub(crate) args: Vec<Value>,
}

/// Raw SQL fragment. Bind its arguments with [`RawExpr::bind`].
pub fn raw(text: impl Into<String>) -> RawExpr {
    RawExpr {
        text: text.into(),
        args: Vec::new(),
    }
}

impl RawExpr {
    pub fn bind(mut self, value: impl Into<Value>) -> Self {
        self.args.push(value.into());
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn args(&self) -> &[Value] {
        &self.args
    }

    /// Use the fragment in WHERE or HAVING. It renders verbatim, parenthesized when
    /// combined with other predicates, and its arguments keep their position.
    pub fn as_predicate(self) -> Predicate {
        Predicate {
            left: None,
            op: Op::Raw,
            right: Some(Box::new(Expr::Raw(self))),
        }
    }
}

/// `column = value` in an upsert clause.
#[derive(Debug, Clone)]
pub struct Assignment {
    pub(crate) column: String,
    pub(crate) value: Value,
}

pub fn assign(column: impl Into<String>, value: impl Into<Value>) -> Assignment {
    Assignment {
        column: column.into(),
        value: value.into(),
    }
}

impl Assignment {
    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn value(&self) -> &Value {
        &self.value
    }
}

/// One ORDER BY entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub(crate) column: String,
    pub(crate) desc: bool,
}

/// `column ASC`
pub fn asc(column: impl Into<String>) -> OrderBy {
    OrderBy {
        column: column.into(),
        desc: false,
    }
}

/// `column DESC`
pub fn desc(column: impl Into<String>) -> OrderBy {
    OrderBy {
        column: column.into(),
        desc: true,
    }
}
