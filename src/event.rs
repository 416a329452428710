//! Build log records from `tracing` events.
//!
//! The event's level becomes the record level, its target the channel and its
//! `message` field the message. Every other field lands in the record context
//! in the order the event recorded it.

use crate::level::Level;
use crate::record::{Field, LogRecord};
use indexmap::IndexMap;
use serde_json::{Map, Value};
use std::error::Error;
use std::fmt::Debug;
use tracing::field::{Field as EventField, Visit};
use tracing::Event;

impl LogRecord {
    pub fn from_event(event: &Event<'_>) -> Self {
        let meta = event.metadata();
        let mut visitor = RecordVisitor::default();
        event.record(&mut visitor);

        let message = visitor.message.map_or_else(Field::null, Field::from);
        let mut record = LogRecord::new(Level::from(*meta.level()), meta.target(), message);
        record.context = visitor.fields;
        record
    }
}

#[derive(Default)]
struct RecordVisitor {
    /// Captured `message` field, if present.
    message: Option<String>,
    fields: IndexMap<String, Field>,
}

impl RecordVisitor {
    fn add(&mut self, field: &EventField, value: Field) {
        self.fields.insert(field.name().to_string(), value);
    }
}

impl Visit for RecordVisitor {
    fn record_f64(&mut self, field: &EventField, value: f64) {
        self.add(field, Field::from(value));
    }

    fn record_i64(&mut self, field: &EventField, value: i64) {
        self.add(field, Field::from(value));
    }

    fn record_u64(&mut self, field: &EventField, value: u64) {
        self.add(field, Field::from(value));
    }

    fn record_bool(&mut self, field: &EventField, value: bool) {
        self.add(field, Field::from(value));
    }

    fn record_str(&mut self, field: &EventField, value: &str) {
        if field.name() == "message" {
            self.message = Some(value.to_string());
        } else {
            self.add(field, Field::from(value));
        }
    }

    fn record_error(&mut self, field: &EventField, value: &(dyn Error + 'static)) {
        self.add(field, Field::Value(error_chain(value)));
    }

    fn record_debug(&mut self, field: &EventField, value: &dyn Debug) {
        if field.name() == "message" {
            self.message = Some(format!("{:?}", value));
        } else {
            self.add(field, Field::from(format!("{:?}", value)));
        }
    }
}

/// Borrowed errors cannot be kept, so capture their message chain now
fn error_chain(err: &(dyn Error + 'static)) -> Value {
    let mut out = Map::new();
    out.insert("message".to_string(), Value::String(err.to_string()));
    if let Some(source) = err.source() {
        out.insert("source".to_string(), error_chain(source));
    }
    Value::Object(out)
}
