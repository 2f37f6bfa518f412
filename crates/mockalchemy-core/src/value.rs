//! Dynamic SQL values.

use crate::error::{Error, TypeError};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Write as _};

/// A column value, bound parameter or primary-key component.
///
/// Every integer width is stored as [`Value::Int`], so `1_i32` and `1_i64`
/// compare and hash the same when used as identity-map keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Double(f64),
    Text(String),
    Bytes(Vec<u8>),
    /// Nested document kept as-is.
    Json(serde_json::Value),
    Array(Vec<Value>),
}

impl Value {
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// SQL type label, reported in conversion errors.
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "NULL",
            Self::Bool(_) => "BOOLEAN",
            Self::Int(_) => "INTEGER",
            Self::Double(_) => "DOUBLE",
            Self::Text(_) => "TEXT",
            Self::Bytes(_) => "BLOB",
            Self::Json(_) => "JSON",
            Self::Array(_) => "ARRAY",
        }
    }

    /// Booleans, or integers read as C-style truth values.
    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            Self::Bool(flag) => Some(flag),
            Self::Int(n) => Some(n != 0),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Self::Int(n) => Some(n),
            Self::Bool(flag) => Some(i64::from(flag)),
            _ => None,
        }
    }

    /// Doubles, widening integers.
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Self::Double(x) => Some(x),
            Self::Int(n) => Some(n as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        if let Self::Text(text) = self {
            Some(text)
        } else {
            None
        }
    }

    /// Convert a JSON document into a value.
    ///
    /// Scalars map onto the matching variant, arrays map element-wise, and
    /// objects are kept as [`Value::Json`].
    pub fn from_json(json: &serde_json::Value) -> Self {
        use serde_json::Value as Json;
        match json {
            Json::Null => Self::Null,
            Json::Bool(flag) => Self::Bool(*flag),
            Json::Number(n) => n
                .as_i64()
                .map(Self::Int)
                .or_else(|| n.as_f64().map(Self::Double))
                .unwrap_or(Self::Null),
            Json::String(text) => Self::Text(text.clone()),
            Json::Array(items) => Self::Array(items.iter().map(Self::from_json).collect()),
            Json::Object(_) => Self::Json(json.clone()),
        }
    }
}

/// Literal rendering used inside canonical expression forms.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("NULL"),
            Self::Bool(flag) => write!(f, "{flag}"),
            Self::Int(n) => write!(f, "{n}"),
            Self::Double(x) => write!(f, "{x:?}"),
            Self::Text(text) => write!(f, "'{}'", text.replace('\'', "''")),
            Self::Bytes(bytes) => {
                let hex = bytes.iter().fold(String::new(), |mut acc, b| {
                    let _ = write!(acc, "{b:02x}");
                    acc
                });
                write!(f, "x'{hex}'")
            }
            Self::Json(doc) => write!(f, "{doc}"),
            Self::Array(items) => {
                let inner: Vec<String> = items.iter().map(ToString::to_string).collect();
                write!(f, "[{}]", inner.join(", "))
            }
        }
    }
}

macro_rules! value_from {
    ($variant:ident: $($ty:ty),+ => |$v:ident| $conv:expr) => {
        $(
            impl From<$ty> for Value {
                fn from($v: $ty) -> Self {
                    Value::$variant($conv)
                }
            }
        )+
    };
}

value_from!(Bool: bool => |v| v);
value_from!(Int: i8, i16, i32, u8, u16, u32 => |v| i64::from(v));
value_from!(Int: i64 => |v| v);
value_from!(Double: f32 => |v| f64::from(v));
value_from!(Double: f64 => |v| v);
value_from!(Text: String => |v| v);
value_from!(Text: &str => |v| v.to_owned());
value_from!(Bytes: Vec<u8> => |v| v);
value_from!(Bytes: &[u8] => |v| v.to_vec());
value_from!(Array: Vec<Value> => |v| v);

impl TryFrom<u64> for Value {
    type Error = Error;

    fn try_from(n: u64) -> Result<Self, Self::Error> {
        i64::try_from(n)
            .map(Value::Int)
            .map_err(|_| out_of_range("i64", format!("u64 {n}")))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map_or(Value::Null, Into::into)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        Value::from_json(&json)
    }
}

fn mismatch(expected: &'static str, found: &Value) -> Error {
    Error::Type(TypeError {
        expected,
        actual: found.type_name().to_owned(),
        column: None,
    })
}

fn out_of_range(expected: &'static str, found: String) -> Error {
    Error::Type(TypeError {
        expected,
        actual: format!("{found} out of range"),
        column: None,
    })
}

macro_rules! value_into {
    ($($ty:ty => $extract:expr),+ $(,)?) => {
        $(
            impl TryFrom<Value> for $ty {
                type Error = Error;

                fn try_from(value: Value) -> Result<Self, Self::Error> {
                    let extract: fn(Value) -> Result<$ty, Value> = $extract;
                    extract(value).map_err(|rejected| mismatch(stringify!($ty), &rejected))
                }
            }
        )+
    };
}

value_into! {
    bool => |v| v.as_bool().ok_or(v),
    i64 => |v| v.as_i64().ok_or(v),
    f64 => |v| v.as_f64().ok_or(v),
    String => |v| match v {
        Value::Text(text) => Ok(text),
        other => Err(other),
    },
    Vec<u8> => |v| match v {
        Value::Bytes(bytes) => Ok(bytes),
        Value::Text(text) => Ok(text.into_bytes()),
        other => Err(other),
    },
}

impl TryFrom<Value> for i32 {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        let wide = i64::try_from(value).map_err(|e| match e {
            Error::Type(mut err) => {
                err.expected = "i32";
                Error::Type(err)
            }
            other => other,
        })?;
        i32::try_from(wide).map_err(|_| out_of_range("i32", format!("integer {wide}")))
    }
}

/// NULL reads as `None`; anything else must convert to `T`.
impl<T> TryFrom<Value> for Option<T>
where
    T: TryFrom<Value, Error = Error>,
{
    type Error = Error;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        if value.is_null() {
            Ok(None)
        } else {
            T::try_from(value).map(Some)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_integer_widths_collapse() {
        assert_eq!(Value::from(42i8), Value::Int(42));
        assert_eq!(Value::from(42i32), Value::from(42i64));
        assert_eq!(Value::from(42u32), Value::Int(42));
        assert!(Value::try_from(u64::MAX).is_err());
        assert_eq!(Value::try_from(7u64).unwrap(), Value::Int(7));
    }

    #[test]
    fn test_optional_columns() {
        assert_eq!(Value::from(Some("test")), Value::from("test"));
        assert_eq!(Value::from(None::<String>), Value::Null);
    }

    #[test]
    fn test_display_literals() {
        assert_eq!(Value::from("one").to_string(), "'one'");
        assert_eq!(Value::from("it's").to_string(), "'it''s'");
        assert_eq!(Value::from(13.0).to_string(), "13.0");
        assert_eq!(Value::from(13).to_string(), "13");
        assert_eq!(Value::Null.to_string(), "NULL");
        assert_eq!(Value::Bytes(vec![0xab, 0x01]).to_string(), "x'ab01'");
        assert_eq!(
            Value::Array(vec![Value::from(1), Value::from("a")]).to_string(),
            "[1, 'a']"
        );
    }

    #[test]
    fn test_from_json() {
        let doc = json!({"pk1": 1});
        assert_eq!(Value::from_json(&json!(8)), Value::Int(8));
        assert_eq!(Value::from_json(&json!(2.5)), Value::Double(2.5));
        assert_eq!(Value::from_json(&json!("x")), Value::from("x"));
        assert_eq!(
            Value::from_json(&json!([1, null])),
            Value::Array(vec![Value::Int(1), Value::Null])
        );
        assert_eq!(Value::from_json(&doc), Value::Json(doc));
    }

    #[test]
    fn test_typed_extraction() {
        assert!(bool::try_from(Value::Int(1)).unwrap());
        assert_eq!(i64::try_from(Value::Int(42)).unwrap(), 42);
        assert_eq!(f64::try_from(Value::Int(2)).unwrap(), 2.0);
        assert_eq!(i32::try_from(Value::Int(7)).unwrap(), 7);
        assert!(i32::try_from(Value::Int(i64::MAX)).is_err());
        assert_eq!(String::try_from(Value::from("x")).unwrap(), "x");
        assert_eq!(Option::<i64>::try_from(Value::Null).unwrap(), None);
        assert_eq!(Option::<i64>::try_from(Value::Int(3)).unwrap(), Some(3));
    }

    #[test]
    fn test_mismatch_names_both_types() {
        match i64::try_from(Value::from("42")) {
            Err(Error::Type(err)) => {
                assert_eq!(err.expected, "i64");
                assert_eq!(err.actual, "TEXT");
            }
            other => panic!("expected a type error, got {other:?}"),
        }
    }
}
