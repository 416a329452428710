//! Conversion of raw record fields into JSON-safe values.
//!
//! The logfmt formatter never inspects caller data directly: timestamps,
//! errors, opaque objects and nested collections all pass through a
//! [`Normalizer`] first, which also guards against runaway depth, huge
//! collections and cyclic object graphs.

use crate::error::NormalizeError;
use crate::record::{Field, LogObject, LogRecord};
use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, FixedOffset};
use indexmap::IndexMap;
use serde_json::{Map, Number, Value};
use std::error::Error;
use std::fmt::Write;

pub const DEFAULT_MAX_DEPTH: usize = 9;
pub const DEFAULT_MAX_ITEMS: usize = 1000;

/// Placeholder logged in place of an object that could not be decomposed
pub const CONVERSION_ERROR: &str = "[object conversion error]";

/// Key under which a truncated map records how much was dropped
pub const TRUNCATION_KEY: &str = "...";

/// A record with every value reduced to plain data
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRecord {
    pub datetime: String,
    pub level_name: String,
    pub channel: Value,
    pub message: Value,
    pub context: Map<String, Value>,
    pub extra: Map<String, Value>,
}

/// Converts raw record data into values the encoder can render
pub trait Normalizer: Send + Sync {
    /// Render a timestamp with a strftime-style pattern
    fn format_timestamp(&self, datetime: &DateTime<FixedOffset>, format: &str) -> String;

    fn normalize_record(&self, record: &LogRecord, timestamp_format: &str) -> NormalizedRecord;

    /// Compact JSON text of a normalized value
    fn to_json_text(&self, value: &Value) -> String {
        serde_json::to_string(value).unwrap_or_else(|_| "null".to_string())
    }

    /// Decompose an opaque object into its members, without any type wrapper
    ///
    /// Entry point for callers holding a single object. The formatter itself
    /// only calls [`Normalizer::normalize_record`], which is expected to apply
    /// the same decomposition to objects nested anywhere in the record.
    fn normalize_opaque(
        &self,
        object: &dyn LogObject,
        timestamp_format: &str,
    ) -> Result<Value, NormalizeError>;

    /// Textual form of a null value outside of JSON text
    fn null_token(&self) -> &str {
        "NULL"
    }
}

/// Check a strftime pattern without rendering anything
pub fn is_valid_timestamp_format(format: &str) -> bool {
    !StrftimeItems::new(format).any(|item| matches!(item, Item::Error))
}

/// The stock normalizer, with configurable depth and collection-size limits
#[derive(Debug, Clone)]
pub struct DefaultNormalizer {
    max_depth: usize,
    max_items: usize,
}

impl Default for DefaultNormalizer {
    fn default() -> Self {
        DefaultNormalizer {
            max_depth: DEFAULT_MAX_DEPTH,
            max_items: DEFAULT_MAX_ITEMS,
        }
    }
}

impl DefaultNormalizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_max_items(mut self, max_items: usize) -> Self {
        self.max_items = max_items;
        self
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn max_items(&self) -> usize {
        self.max_items
    }
}

impl Normalizer for DefaultNormalizer {
    fn format_timestamp(&self, datetime: &DateTime<FixedOffset>, format: &str) -> String {
        let mut out = String::new();
        // chrono reports unrenderable patterns as fmt errors
        if write!(out, "{}", datetime.format(format)).is_err() {
            return datetime.to_rfc3339();
        }
        out
    }

    fn normalize_record(&self, record: &LogRecord, timestamp_format: &str) -> NormalizedRecord {
        let mut walk = Walk::new(self, timestamp_format);
        NormalizedRecord {
            datetime: self.format_timestamp(&record.datetime, timestamp_format),
            level_name: record.level_name.clone(),
            channel: Value::String(record.channel.clone()),
            message: walk.field(&record.message, 1),
            context: walk.fields(&record.context, 0),
            extra: walk.fields(&record.extra, 0),
        }
    }

    fn normalize_opaque(
        &self,
        object: &dyn LogObject,
        timestamp_format: &str,
    ) -> Result<Value, NormalizeError> {
        Walk::new(self, timestamp_format).object(object, 1)
    }
}

/// One normalization pass, tracking the objects currently being decomposed
struct Walk<'a> {
    normalizer: &'a DefaultNormalizer,
    timestamp_format: &'a str,
    path: Vec<*const ()>,
}

impl<'a> Walk<'a> {
    fn new(normalizer: &'a DefaultNormalizer, timestamp_format: &'a str) -> Self {
        Walk {
            normalizer,
            timestamp_format,
            path: Vec::new(),
        }
    }

    fn too_deep(&self, depth: usize) -> Option<Value> {
        (depth > self.normalizer.max_depth).then(|| {
            Value::String(format!(
                "Over {} levels deep, aborting normalization",
                self.normalizer.max_depth
            ))
        })
    }

    fn truncation_notice(&self, total: usize) -> Value {
        Value::String(format!(
            "Over {} items ({} total), aborting normalization",
            self.normalizer.max_items, total
        ))
    }

    fn field(&mut self, field: &Field, depth: usize) -> Value {
        if let Some(placeholder) = self.too_deep(depth) {
            return placeholder;
        }

        match field {
            Field::Value(value) => self.value(value, depth),
            Field::Float(n) => float_value(*n),
            Field::Timestamp(dt) => {
                Value::String(self.normalizer.format_timestamp(dt, self.timestamp_format))
            }
            Field::Error(err) => self.error(&**err, depth),
            Field::Object(object) => self.object(&**object, depth).unwrap_or_else(|err| {
                tracing::debug!(error = %err, "substituting unconvertible object");
                Value::String(CONVERSION_ERROR.to_string())
            }),
            Field::List(items) => Value::Array(self.list(items, depth, Self::field)),
            Field::Map(members) => Value::Object(self.fields(members, depth)),
        }
    }

    fn fields(&mut self, members: &IndexMap<String, Field>, depth: usize) -> Map<String, Value> {
        self.map(members.iter(), members.len(), depth, Self::field)
    }

    fn value(&mut self, value: &Value, depth: usize) -> Value {
        if let Some(placeholder) = self.too_deep(depth) {
            return placeholder;
        }

        match value {
            Value::Array(items) => Value::Array(self.list(items, depth, Self::value)),
            Value::Object(members) => {
                Value::Object(self.map(members.iter(), members.len(), depth, Self::value))
            }
            scalar => scalar.clone(),
        }
    }

    fn list<T>(
        &mut self,
        items: &[T],
        depth: usize,
        each: fn(&mut Self, &T, usize) -> Value,
    ) -> Vec<Value> {
        let limit = self.normalizer.max_items;
        let mut out = Vec::with_capacity(items.len().min(limit) + 1);
        for item in items.iter().take(limit) {
            out.push(each(self, item, depth + 1));
        }
        if items.len() > limit {
            out.push(self.truncation_notice(items.len()));
        }
        out
    }

    fn map<'m, T: 'm>(
        &mut self,
        members: impl Iterator<Item = (&'m String, &'m T)>,
        total: usize,
        depth: usize,
        each: fn(&mut Self, &T, usize) -> Value,
    ) -> Map<String, Value> {
        let limit = self.normalizer.max_items;
        let mut out = Map::new();
        for (key, member) in members.take(limit) {
            let value = each(self, member, depth + 1);
            out.insert(key.clone(), value);
        }
        if total > limit {
            out.insert(TRUNCATION_KEY.to_string(), self.truncation_notice(total));
        }
        out
    }

    fn error(&mut self, err: &(dyn Error + 'static), depth: usize) -> Value {
        if let Some(placeholder) = self.too_deep(depth) {
            return placeholder;
        }

        let mut out = Map::new();
        out.insert("message".to_string(), Value::String(err.to_string()));
        if let Some(source) = err.source() {
            out.insert("source".to_string(), self.error(source, depth + 1));
        }
        Value::Object(out)
    }

    fn object(&mut self, object: &dyn LogObject, depth: usize) -> Result<Value, NormalizeError> {
        let id = std::ptr::from_ref(object).cast::<()>();
        // back-reference to an object still being decomposed
        if self.path.contains(&id) {
            return Ok(Value::Null);
        }

        let decomposed = object.decompose()?;
        self.path.push(id);
        // each decomposition is one level, so object-to-object chains stay bounded
        let value = self.field(&decomposed, depth + 1);
        self.path.pop();
        Ok(value)
    }
}

fn float_value(n: f64) -> Value {
    if n.is_nan() {
        Value::String("NaN".to_string())
    } else if n.is_infinite() {
        Value::String(if n > 0.0 { "INF" } else { "-INF" }.to_string())
    } else {
        Number::from_f64(n).map_or(Value::Null, Value::Number)
    }
}
