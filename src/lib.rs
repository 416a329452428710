//! Encode structured log records as logfmt lines.
//!
//! ```
//! use logline::{LogRecord, LogfmtFormatter};
//!
//! let formatter = LogfmtFormatter::default();
//! let record = LogRecord::new("INFO", "app", "Hi there").with_context("foo", "bar");
//! let line = formatter.encode(&record);
//! assert!(line.ends_with("lvl=INFO chan=app msg=\"Hi there\" foo=bar\n"));
//! ```

pub mod config;
pub mod error;
pub mod event;
pub mod flatten;
pub mod formatters;
pub mod level;
pub mod normalizer;
pub mod record;

pub use error::*;

pub use config::{EncoderConfig, RFC3339_FORMAT};
pub use formatters::logfmt::{is_bare, is_valid_ident, LogfmtFormatter, Pair};
pub use formatters::RecordFormatter;
pub use level::Level;
pub use normalizer::{DefaultNormalizer, NormalizedRecord, Normalizer};
pub use record::{Field, LogObject, LogRecord, Serialized};
pub use serde_json::Value;
