use chrono::{DateTime, FixedOffset, Local, Utc};
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use std::error::Error;
use std::fmt;
use std::sync::Arc;

/// An object the caller hands over without a fixed shape.
///
/// The normalizer asks it to decompose itself into plain fields when it is
/// logged. Implementations may hand out other objects (including ones already
/// being normalized); back-references are broken by the normalizer.
pub trait LogObject: fmt::Debug + Send + Sync {
    fn decompose(&self) -> anyhow::Result<Field>;
}

/// Adapter logging any serde-serializable value by its serialized form.
#[derive(Debug, Clone)]
pub struct Serialized<T>(pub T);

impl<T> LogObject for Serialized<T>
where
    T: Serialize + fmt::Debug + Send + Sync,
{
    fn decompose(&self) -> anyhow::Result<Field> {
        Ok(Field::Value(serde_json::to_value(&self.0)?))
    }
}

/// A raw attribute value as supplied by the logging caller
#[derive(Debug, Clone)]
pub enum Field {
    /// Plain JSON-safe data
    Value(Value),
    /// Floating point, kept raw so non-finite values survive until normalization
    Float(f64),
    Timestamp(DateTime<FixedOffset>),
    Error(Arc<dyn Error + Send + Sync>),
    Object(Arc<dyn LogObject>),
    List(Vec<Field>),
    Map(IndexMap<String, Field>),
}

impl Field {
    pub fn null() -> Self {
        Field::Value(Value::Null)
    }

    pub fn error<E>(err: E) -> Self
    where
        E: Error + Send + Sync + 'static,
    {
        Field::Error(Arc::new(err))
    }

    pub fn object<O>(object: O) -> Self
    where
        O: LogObject + 'static,
    {
        Field::Object(Arc::new(object))
    }

    /// Log a serializable value, decomposed through its serde representation
    pub fn serialized<T>(value: T) -> Self
    where
        T: Serialize + fmt::Debug + Send + Sync + 'static,
    {
        Field::object(Serialized(value))
    }
}

impl From<Value> for Field {
    fn from(value: Value) -> Self {
        Field::Value(value)
    }
}

impl From<&str> for Field {
    fn from(s: &str) -> Self {
        Field::Value(Value::String(s.to_string()))
    }
}

impl From<String> for Field {
    fn from(s: String) -> Self {
        Field::Value(Value::String(s))
    }
}

impl From<bool> for Field {
    fn from(b: bool) -> Self {
        Field::Value(Value::Bool(b))
    }
}

macro_rules! integer_fields {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Field {
                fn from(n: $t) -> Self {
                    Field::Value(Value::from(n))
                }
            }
        )*
    };
}

integer_fields!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl From<f32> for Field {
    fn from(n: f32) -> Self {
        Field::Float(n as f64)
    }
}

impl From<f64> for Field {
    fn from(n: f64) -> Self {
        Field::Float(n)
    }
}

impl From<DateTime<FixedOffset>> for Field {
    fn from(dt: DateTime<FixedOffset>) -> Self {
        Field::Timestamp(dt)
    }
}

impl From<DateTime<Utc>> for Field {
    fn from(dt: DateTime<Utc>) -> Self {
        Field::Timestamp(dt.into())
    }
}

impl From<DateTime<Local>> for Field {
    fn from(dt: DateTime<Local>) -> Self {
        Field::Timestamp(dt.into())
    }
}

impl<T: Into<Field>> From<Option<T>> for Field {
    fn from(value: Option<T>) -> Self {
        value.map_or_else(Field::null, Into::into)
    }
}

impl<T: Into<Field>> From<Vec<T>> for Field {
    fn from(items: Vec<T>) -> Self {
        Field::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Field>> From<IndexMap<String, T>> for Field {
    fn from(members: IndexMap<String, T>) -> Self {
        Field::Map(members.into_iter().map(|(k, v)| (k, v.into())).collect())
    }
}

/// A single log event as produced by the logging caller
#[derive(Debug, Clone)]
pub struct LogRecord {
    pub datetime: DateTime<FixedOffset>,
    pub level_name: String,
    pub channel: String,
    pub message: Field,
    pub context: IndexMap<String, Field>,
    pub extra: IndexMap<String, Field>,
}

impl LogRecord {
    /// Create a record stamped with the current UTC time
    pub fn new(
        level: impl Into<String>,
        channel: impl Into<String>,
        message: impl Into<Field>,
    ) -> Self {
        LogRecord {
            datetime: Utc::now().into(),
            level_name: level.into(),
            channel: channel.into(),
            message: message.into(),
            context: IndexMap::new(),
            extra: IndexMap::new(),
        }
    }

    pub fn with_datetime(mut self, datetime: impl Into<DateTime<FixedOffset>>) -> Self {
        self.datetime = datetime.into();
        self
    }

    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<Field>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<Field>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }
}
