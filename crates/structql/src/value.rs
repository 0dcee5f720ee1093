//! Bound arguments, decoded cells and the field types records may declare.
//!
//! [`Value`] is the single currency between the builders, the executor and the
//! valuers: builders push it into [`Query::args`](crate::Query), executors bind it
//! (it implements [`ToSql`]), rows hand it back, and [`FieldValue`] converts it
//! into the concrete Rust type of a record field.

use bytes::BytesMut;
use chrono::{DateTime, Utc};
use std::error::Error;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tokio_postgres::types::{IsNull, ToSql, Type};
use uuid::Uuid;

/// A single SQL value, either bound as an argument or read from a row.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    U32(u32),
    F32(f32),
    F64(f64),
    Text(String),
    Bytes(Vec<u8>),
    Uuid(Uuid),
    Timestamp(DateTime<Utc>),
    Json(serde_json::Value),
}

impl Value {
    /// Short type name used in conversion errors.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "NULL",
            Value::Bool(_) => "bool",
            Value::I8(_) => "i8",
            Value::I16(_) => "i16",
            Value::I32(_) => "i32",
            Value::I64(_) => "i64",
            Value::U32(_) => "u32",
            Value::F32(_) => "f32",
            Value::F64(_) => "f64",
            Value::Text(_) => "text",
            Value::Bytes(_) => "bytes",
            Value::Uuid(_) => "uuid",
            Value::Timestamp(_) => "timestamp",
            Value::Json(_) => "json",
        }
    }

    fn as_i64(&self) -> Option<i64> {
        match self {
            Value::I8(v) => Some(i64::from(*v)),
            Value::I16(v) => Some(i64::from(*v)),
            Value::I32(v) => Some(i64::from(*v)),
            Value::I64(v) => Some(*v),
            Value::U32(v) => Some(i64::from(*v)),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::I8(v) => write!(f, "{v}"),
            Value::I16(v) => write!(f, "{v}"),
            Value::I32(v) => write!(f, "{v}"),
            Value::I64(v) => write!(f, "{v}"),
            Value::U32(v) => write!(f, "{v}"),
            Value::F32(v) => write!(f, "{v}"),
            Value::F64(v) => write!(f, "{v}"),
            Value::Text(v) => write!(f, "{v:?}"),
            Value::Bytes(v) => write!(f, "<{} bytes>", v.len()),
            Value::Uuid(v) => write!(f, "{v}"),
            Value::Timestamp(v) => write!(f, "{}", v.to_rfc3339()),
            Value::Json(v) => write!(f, "{v}"),
        }
    }
}

impl ToSql for Value {
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> Result<IsNull, Box<dyn Error + Sync + Send>> {
        if let Some(wide) = self.as_i64() {
            if *ty == Type::INT2 {
                return narrow::<i16>(wide, ty)?.to_sql(ty, out);
            } else if *ty == Type::INT4 {
                return narrow::<i32>(wide, ty)?.to_sql(ty, out);
            } else if *ty == Type::INT8 {
                return wide.to_sql(ty, out);
            } else if *ty == Type::CHAR {
                return narrow::<i8>(wide, ty)?.to_sql(ty, out);
            } else if *ty == Type::OID {
                return narrow::<u32>(wide, ty)?.to_sql(ty, out);
            }
        }
        match self {
            Value::F32(v) if *ty == Type::FLOAT8 => return f64::from(*v).to_sql(ty, out),
            Value::F64(v) if *ty == Type::FLOAT4 => {
                let narrowed = *v as f32;
                if v.is_finite() && !narrowed.is_finite() {
                    return Err(format!("{v} is out of range for {ty}").into());
                }
                return narrowed.to_sql(ty, out);
            }
            _ => {}
        }
        match self {
            Value::Null => Ok(IsNull::Yes),
            Value::Bool(v) => v.to_sql_checked(ty, out),
            Value::I8(v) => v.to_sql_checked(ty, out),
            Value::I16(v) => v.to_sql_checked(ty, out),
            Value::I32(v) => v.to_sql_checked(ty, out),
            Value::I64(v) => v.to_sql_checked(ty, out),
            Value::U32(v) => v.to_sql_checked(ty, out),
            Value::F32(v) => v.to_sql_checked(ty, out),
            Value::F64(v) => v.to_sql_checked(ty, out),
            Value::Text(v) => v.to_sql_checked(ty, out),
            Value::Bytes(v) => v.to_sql_checked(ty, out),
            Value::Uuid(v) => v.to_sql_checked(ty, out),
            Value::Timestamp(v) => v.to_sql_checked(ty, out),
            Value::Json(v) => v.to_sql_checked(ty, out),
        }
    }

    // Each variant checks its own type in `to_sql`.
    fn accepts(_ty: &Type) -> bool {
        true
    }

    fn to_sql_checked(
        &self,
        ty: &Type,
        out: &mut BytesMut,
    ) -> Result<IsNull, Box<dyn Error + Sync + Send>> {
        self.to_sql(ty, out)
    }
}

/// Fit an integer argument into the width of the column it is bound to.
fn narrow<T: TryFrom<i64>>(wide: i64, ty: &Type) -> Result<T, Box<dyn Error + Sync + Send>> {
    T::try_from(wide).map_err(|_| format!("{wide} is out of range for {ty}").into())
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

/// The scalar kind of a record field, independent of nullability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    Bool,
    I8,
    I16,
    I32,
    I64,
    U32,
    F32,
    F64,
    Text,
    Bytes,
    Uuid,
    Timestamp,
    Json,
}

/// Declared type of a record field: a scalar kind, optionally wrapped in `Option`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldType {
    pub kind: ScalarKind,
    pub nullable: bool,
}

impl FieldType {
    pub const fn scalar(kind: ScalarKind) -> Self {
        Self {
            kind,
            nullable: false,
        }
    }

    pub const fn nullable(kind: ScalarKind) -> Self {
        Self {
            kind,
            nullable: true,
        }
    }
}

/// A value could not be converted into the requested Rust type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("expected {expected}, found {found}")]
pub struct ConversionError {
    pub expected: &'static str,
    pub found: String,
}

impl ConversionError {
    fn new(expected: &'static str, found: &Value) -> Self {
        Self {
            expected,
            found: found.type_name().to_string(),
        }
    }

    fn unparsable(expected: &'static str, raw: &str) -> Self {
        Self {
            expected,
            found: format!("unparsable text {raw:?}"),
        }
    }
}

mod sealed {
    pub trait Sealed {}
}

/// A Rust type that can be stored in a record field.
///
/// This trait is sealed: the raw valuer writes through pointers typed by
/// [`FieldValue::FIELD_TYPE`], so every implementation must be one it knows about.
pub trait FieldValue: sealed::Sealed + Sized + Send + 'static {
    const FIELD_TYPE: FieldType;

    fn to_value(&self) -> Value;

    fn from_value(value: Value) -> Result<Self, ConversionError>;
}

fn parse_text<T: FromStr>(raw: &str, expected: &'static str) -> Result<T, ConversionError> {
    raw.trim()
        .parse()
        .map_err(|_| ConversionError::unparsable(expected, raw))
}

fn text_of(value: &Value) -> Option<&str> {
    match value {
        Value::Text(s) => Some(s),
        Value::Bytes(b) => std::str::from_utf8(b).ok(),
        _ => None,
    }
}

fn int_from_value<T>(value: Value, expected: &'static str) -> Result<T, ConversionError>
where
    T: TryFrom<i64> + FromStr,
{
    let wide = match &value {
        Value::I8(v) => i64::from(*v),
        Value::I16(v) => i64::from(*v),
        Value::I32(v) => i64::from(*v),
        Value::I64(v) => *v,
        Value::U32(v) => i64::from(*v),
        other => {
            return match text_of(other) {
                Some(raw) => parse_text(raw, expected),
                None => Err(ConversionError::new(expected, other)),
            };
        }
    };
    T::try_from(wide).map_err(|_| ConversionError {
        expected,
        found: format!("out of range integer {wide}"),
    })
}

fn f64_from_value(value: Value) -> Result<f64, ConversionError> {
    match value {
        Value::F32(v) => Ok(f64::from(v)),
        Value::F64(v) => Ok(v),
        Value::I8(v) => Ok(f64::from(v)),
        Value::I16(v) => Ok(f64::from(v)),
        Value::I32(v) => Ok(f64::from(v)),
        Value::U32(v) => Ok(f64::from(v)),
        Value::I64(v) => Ok(v as f64),
        other => match text_of(&other) {
            Some(raw) => parse_text(raw, "f64"),
            None => Err(ConversionError::new("f64", &other)),
        },
    }
}

fn f32_from_value(value: Value) -> Result<f32, ConversionError> {
    match value {
        Value::F32(v) => Ok(v),
        Value::Text(_) | Value::Bytes(_) => match text_of(&value) {
            Some(raw) => parse_text(raw, "f32"),
            None => Err(ConversionError::new("f32", &value)),
        },
        other => f64_from_value(other).map(|v| v as f32),
    }
}

fn bool_from_value(value: Value) -> Result<bool, ConversionError> {
    match &value {
        Value::Bool(v) => Ok(*v),
        Value::I8(v) => Ok(*v != 0),
        Value::I16(v) => Ok(*v != 0),
        Value::I32(v) => Ok(*v != 0),
        Value::I64(v) => Ok(*v != 0),
        other => match text_of(other).map(str::trim) {
            Some("1" | "t" | "true" | "TRUE") => Ok(true),
            Some("0" | "f" | "false" | "FALSE") => Ok(false),
            Some(raw) => Err(ConversionError::unparsable("bool", raw)),
            None => Err(ConversionError::new("bool", other)),
        },
    }
}

fn string_from_value(value: Value) -> Result<String, ConversionError> {
    match value {
        Value::Text(v) => Ok(v),
        Value::Bytes(v) => String::from_utf8(v).map_err(|_| ConversionError {
            expected: "text",
            found: "non utf-8 bytes".to_string(),
        }),
        other => Err(ConversionError::new("text", &other)),
    }
}

fn bytes_from_value(value: Value) -> Result<Vec<u8>, ConversionError> {
    match value {
        Value::Bytes(v) => Ok(v),
        Value::Text(v) => Ok(v.into_bytes()),
        other => Err(ConversionError::new("bytes", &other)),
    }
}

fn uuid_from_value(value: Value) -> Result<Uuid, ConversionError> {
    match value {
        Value::Uuid(v) => Ok(v),
        other => match text_of(&other) {
            Some(raw) => parse_text(raw, "uuid"),
            None => Err(ConversionError::new("uuid", &other)),
        },
    }
}

fn timestamp_from_value(value: Value) -> Result<DateTime<Utc>, ConversionError> {
    match value {
        Value::Timestamp(v) => Ok(v),
        other => match text_of(&other) {
            Some(raw) => DateTime::parse_from_rfc3339(raw.trim())
                .map(|t| t.with_timezone(&Utc))
                .map_err(|_| ConversionError::unparsable("timestamp", raw)),
            None => Err(ConversionError::new("timestamp", &other)),
        },
    }
}

fn json_from_value(value: Value) -> Result<serde_json::Value, ConversionError> {
    match value {
        Value::Json(v) => Ok(v),
        other => match text_of(&other) {
            Some(raw) => {
                serde_json::from_str(raw).map_err(|_| ConversionError::unparsable("json", raw))
            }
            None => Err(ConversionError::new("json", &other)),
        },
    }
}

/// Implements `FieldValue` for a scalar type and its `Option` wrapper, plus the
/// matching `From` conversions into `Value`.
macro_rules! field_value {
    ($ty:ty, $kind:ident, $variant:ident, |$v:ident| $to:expr, $from:expr) => {
        impl sealed::Sealed for $ty {}
        impl sealed::Sealed for Option<$ty> {}

        impl FieldValue for $ty {
            const FIELD_TYPE: FieldType = FieldType::scalar(ScalarKind::$kind);

            fn to_value(&self) -> Value {
                let $v = self;
                Value::$variant($to)
            }

            fn from_value(value: Value) -> Result<Self, ConversionError> {
                if value.is_null() {
                    return Err(ConversionError::new(stringify!($ty), &value));
                }
                $from(value)
            }
        }

        impl FieldValue for Option<$ty> {
            const FIELD_TYPE: FieldType = FieldType::nullable(ScalarKind::$kind);

            fn to_value(&self) -> Value {
                match self {
                    Some(inner) => inner.to_value(),
                    None => Value::Null,
                }
            }

            fn from_value(value: Value) -> Result<Self, ConversionError> {
                match value {
                    Value::Null => Ok(None),
                    other => <$ty as FieldValue>::from_value(other).map(Some),
                }
            }
        }

        impl From<$ty> for Value {
            fn from(v: $ty) -> Self {
                let $v = &v;
                Value::$variant($to)
            }
        }

        impl From<Option<$ty>> for Value {
            fn from(v: Option<$ty>) -> Self {
                v.map_or(Value::Null, Value::from)
            }
        }
    };
}

field_value!(bool, Bool, Bool, |v| *v, bool_from_value);
field_value!(i8, I8, I8, |v| *v, |v| int_from_value(v, "i8"));
field_value!(i16, I16, I16, |v| *v, |v| int_from_value(v, "i16"));
field_value!(i32, I32, I32, |v| *v, |v| int_from_value(v, "i32"));
field_value!(i64, I64, I64, |v| *v, |v| int_from_value(v, "i64"));
field_value!(u32, U32, U32, |v| *v, |v| int_from_value(v, "u32"));
field_value!(f32, F32, F32, |v| *v, f32_from_value);
field_value!(f64, F64, F64, |v| *v, f64_from_value);
field_value!(String, Text, Text, |v| v.clone(), string_from_value);
field_value!(Vec<u8>, Bytes, Bytes, |v| v.clone(), bytes_from_value);
field_value!(Uuid, Uuid, Uuid, |v| *v, uuid_from_value);
field_value!(DateTime<Utc>, Timestamp, Timestamp, |v| *v, timestamp_from_value);
field_value!(serde_json::Value, Json, Json, |v| v.clone(), json_from_value);
