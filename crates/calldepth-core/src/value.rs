use std::fmt;
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};

/// Key used for arguments that could not be paired with a key.
pub const BAD_KEY: &str = "!BADKEY";

/// The value half of an attribute.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// UTF-8 text.
    String(String),
    /// Signed integer.
    Int(i64),
    /// Unsigned integer.
    Uint(u64),
    /// Floating point. Non-finite values render as strings in JSON.
    Float(f64),
    /// Boolean.
    Bool(bool),
    /// Elapsed time, nanoseconds in JSON.
    Duration(Duration),
    /// Timestamp, RFC 3339 in JSON.
    Time(DateTime<Utc>),
    /// Arbitrary JSON, passed through as-is.
    Json(serde_json::Value),
    /// Nested attributes. An empty key inlines them into the parent.
    Group(Vec<Attr>),
}

impl Value {
    /// The string payload, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// JSON rendering used by handlers. Durations become nanoseconds, times RFC 3339.
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value as Json;
        match self {
            Self::String(s) => Json::String(s.clone()),
            Self::Int(n) => Json::from(*n),
            Self::Uint(n) => Json::from(*n),
            Self::Float(f) => serde_json::Number::from_f64(*f)
                .map_or_else(|| Json::String(f.to_string()), Json::Number),
            Self::Bool(b) => Json::Bool(*b),
            Self::Duration(d) => Json::from(u64::try_from(d.as_nanos()).unwrap_or(u64::MAX)),
            Self::Time(t) => Json::String(t.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            Self::Json(v) => v.clone(),
            Self::Group(attrs) => Json::Object(
                attrs
                    .iter()
                    .map(|attr| (attr.key.clone(), attr.value.to_json()))
                    .collect(),
            ),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => f.write_str(s),
            Self::Int(n) => write!(f, "{n}"),
            Self::Uint(n) => write!(f, "{n}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Duration(d) => write!(f, "{d:?}"),
            Self::Time(t) => f.write_str(&t.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            Self::Json(v) => write!(f, "{v}"),
            Self::Group(attrs) => {
                f.write_str("[")?;
                for (i, attr) in attrs.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{attr}")?;
                }
                f.write_str("]")
            }
        }
    }
}

macro_rules! value_from {
    ($($ty:ty => |$v:ident| $body:expr),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from($v: $ty) -> Self {
                    $body
                }
            }

            impl From<$ty> for Arg {
                fn from(v: $ty) -> Self {
                    Arg::Value(Value::from(v))
                }
            }
        )*
    };
}

value_from! {
    &str => |v| Value::String(v.to_string()),
    String => |v| Value::String(v),
    &String => |v| Value::String(v.clone()),
    i64 => |v| Value::Int(v),
    i32 => |v| Value::Int(i64::from(v)),
    u64 => |v| Value::Uint(v),
    u32 => |v| Value::Uint(u64::from(v)),
    usize => |v| Value::Uint(u64::try_from(v).unwrap_or(u64::MAX)),
    f64 => |v| Value::Float(v),
    f32 => |v| Value::Float(f64::from(v)),
    bool => |v| Value::Bool(v),
    Duration => |v| Value::Duration(v),
    DateTime<Utc> => |v| Value::Time(v),
    serde_json::Value => |v| Value::Json(v),
    Vec<Attr> => |v| Value::Group(v),
}

/// A key/value pair attached to a record.
#[derive(Clone, Debug, PartialEq)]
pub struct Attr {
    /// Attribute name. Group members are qualified by their group.
    pub key: String,
    /// Attribute value.
    pub value: Value,
}

impl Attr {
    /// Attribute from anything convertible into a [`Value`].
    pub fn new(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// String attribute.
    pub fn string(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(key, Value::String(value.into()))
    }

    /// Signed integer attribute.
    pub fn int(key: impl Into<String>, value: i64) -> Self {
        Self::new(key, Value::Int(value))
    }

    /// Unsigned integer attribute.
    pub fn uint(key: impl Into<String>, value: u64) -> Self {
        Self::new(key, Value::Uint(value))
    }

    /// Float attribute.
    pub fn float(key: impl Into<String>, value: f64) -> Self {
        Self::new(key, Value::Float(value))
    }

    /// Boolean attribute.
    pub fn bool(key: impl Into<String>, value: bool) -> Self {
        Self::new(key, Value::Bool(value))
    }

    /// Duration attribute.
    pub fn duration(key: impl Into<String>, value: Duration) -> Self {
        Self::new(key, Value::Duration(value))
    }

    /// Timestamp attribute.
    pub fn time(key: impl Into<String>, value: DateTime<Utc>) -> Self {
        Self::new(key, Value::Time(value))
    }

    /// Raw JSON attribute.
    pub fn json(key: impl Into<String>, value: serde_json::Value) -> Self {
        Self::new(key, Value::Json(value))
    }

    /// Group attribute nesting `attrs` under `key`.
    pub fn group(key: impl Into<String>, attrs: Vec<Attr>) -> Self {
        Self::new(key, Value::Group(attrs))
    }

    /// A group with no members carries nothing and is dropped by handlers.
    pub fn is_empty_group(&self) -> bool {
        matches!(&self.value, Value::Group(attrs) if attrs.is_empty())
    }
}

impl fmt::Display for Attr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.key, self.value)
    }
}

/// One element of a free-form argument list: either half of a key/value pair
/// or an already complete attribute.
#[derive(Clone, Debug, PartialEq)]
pub enum Arg {
    /// A bare value: a key, or the value following one.
    Value(Value),
    /// A complete attribute.
    Attr(Attr),
}

impl Arg {
    fn into_value(self) -> Value {
        match self {
            Self::Value(value) => value,
            Self::Attr(attr) => Value::Group(vec![attr]),
        }
    }
}

impl From<Value> for Arg {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl From<Attr> for Arg {
    fn from(attr: Attr) -> Self {
        Self::Attr(attr)
    }
}

/// Builds an array of [`Arg`] from heterogeneous expressions.
///
/// ```
/// use calldepth_core::{args, Attr};
///
/// let args = args!["user", "ada", "attempt", 3, Attr::bool("retry", true)];
/// assert_eq!(args.len(), 5);
/// ```
#[macro_export]
macro_rules! args {
    () => {{
        let empty: [$crate::Arg; 0] = [];
        empty
    }};
    ($($arg:expr),+ $(,)?) => {
        [$($crate::Arg::from($arg)),+]
    };
}

/// Pairs alternating key/value arguments into attributes, appending to `out`.
///
/// Complete attributes pass through. A string followed by anything becomes the
/// key for that next element. A trailing string or a non-string value lands
/// under [`BAD_KEY`].
pub fn merge_args(args: &[Arg], out: &mut Vec<Attr>) {
    let mut rest = args;
    while let Some((first, tail)) = rest.split_first() {
        rest = tail;
        match first {
            Arg::Attr(attr) => out.push(attr.clone()),
            Arg::Value(Value::String(key)) => match rest.split_first() {
                Some((next, tail)) => {
                    out.push(Attr::new(key.clone(), next.clone().into_value()));
                    rest = tail;
                }
                None => out.push(Attr::new(BAD_KEY, key.clone())),
            },
            Arg::Value(value) => out.push(Attr::new(BAD_KEY, value.clone())),
        }
    }
}
