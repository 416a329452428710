use crate::config::EncoderConfig;
use crate::error::ConfigError;
use crate::flatten::flatten_value;
use crate::formatters::RecordFormatter;
use crate::normalizer::{is_valid_timestamp_format, DefaultNormalizer, Normalizer};
use crate::record::LogRecord;
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

/// Control characters, DEL, double quote, `=` and whitespace
static INVALID_IDENT_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[\x00-\x1F\x7F"=\s]"#).expect("identifier pattern compiles"));

/// Check whether a string may appear unquoted as a logfmt key or value
pub fn is_valid_ident(s: &str) -> bool {
    !s.is_empty() && !INVALID_IDENT_CHARS.is_match(s)
}

/// Check whether a normalized value renders as a bare token
///
/// Numbers are always bare. Booleans, null and composites never are.
pub fn is_bare(value: &Value) -> bool {
    match value {
        Value::String(s) => is_valid_ident(s),
        Value::Number(_) => true,
        Value::Null | Value::Bool(_) | Value::Array(_) | Value::Object(_) => false,
    }
}

/// One rendered `key=value` token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pair {
    pub key: String,
    pub rendered: String,
}

/// Keys for the standard fields, trimmed and validated once.
/// `None` means the field is never emitted.
#[derive(Debug, Clone, Default)]
struct StandardKeys {
    time: Option<String>,
    level: Option<String>,
    channel: Option<String>,
    message: Option<String>,
}

impl StandardKeys {
    fn from_config(config: &EncoderConfig) -> Self {
        StandardKeys {
            time: usable_key(config.time_key.as_deref()),
            level: usable_key(config.level_key.as_deref()),
            channel: usable_key(config.channel_key.as_deref()),
            message: usable_key(config.message_key.as_deref()),
        }
    }
}

fn usable_key(key: Option<&str>) -> Option<String> {
    let key = key?.trim();
    is_valid_ident(key).then(|| key.to_string())
}

/// Pairs keyed by name; the first writer of a key wins
#[derive(Debug, Default)]
struct PairSet {
    pairs: IndexMap<String, String>,
}

impl PairSet {
    fn contains(&self, key: &str) -> bool {
        self.pairs.contains_key(key)
    }

    fn insert(&mut self, pair: Pair) {
        if self.contains(&pair.key) {
            tracing::trace!(key = %pair.key, "dropping pair shadowed by an earlier key");
            return;
        }
        self.pairs.insert(pair.key, pair.rendered);
    }

    fn into_pairs(self) -> Vec<Pair> {
        self.pairs
            .into_iter()
            .map(|(key, rendered)| Pair { key, rendered })
            .collect()
    }
}

/// Formats log records as single logfmt lines
///
/// Standard fields come first (time, level, channel, message), followed by
/// context then extra attributes in their original order. A key is written
/// at most once: standard fields shadow attributes and context shadows extra.
#[derive(Debug, Clone)]
pub struct LogfmtFormatter<N = DefaultNormalizer> {
    normalizer: N,
    keys: StandardKeys,
    timestamp_format: String,
    line_terminator: String,
    flatten: bool,
}

impl LogfmtFormatter<DefaultNormalizer> {
    pub fn new(config: EncoderConfig) -> Result<Self, ConfigError> {
        Self::with_normalizer(config, DefaultNormalizer::default())
    }
}

impl Default for LogfmtFormatter<DefaultNormalizer> {
    fn default() -> Self {
        Self::build(EncoderConfig::default(), DefaultNormalizer::default())
    }
}

impl<N: Normalizer> LogfmtFormatter<N> {
    pub fn with_normalizer(config: EncoderConfig, normalizer: N) -> Result<Self, ConfigError> {
        if !is_valid_timestamp_format(&config.timestamp_format) {
            return Err(ConfigError::InvalidTimestampFormat {
                format: config.timestamp_format,
            });
        }

        Ok(Self::build(config, normalizer))
    }

    /// Assemble a formatter from a config whose timestamp pattern is known good
    fn build(config: EncoderConfig, normalizer: N) -> Self {
        LogfmtFormatter {
            normalizer,
            keys: StandardKeys::from_config(&config),
            timestamp_format: config.timestamp_format,
            line_terminator: config.line_terminator.unwrap_or_default(),
            flatten: config.flatten,
        }
    }

    pub fn normalizer(&self) -> &N {
        &self.normalizer
    }

    /// Encode one record as a line, including the configured terminator
    pub fn encode(&self, record: &LogRecord) -> String {
        let rendered: Vec<String> = self
            .select(record)
            .into_iter()
            .map(|pair| pair.rendered)
            .collect();

        let mut line = rendered.join(" ");
        line.push_str(&self.line_terminator);
        line
    }

    /// Encode records independently and concatenate the lines
    pub fn encode_batch(&self, records: &[LogRecord]) -> String {
        records.iter().map(|record| self.encode(record)).collect()
    }

    /// Choose and render the pairs of one record, in output order
    pub fn select(&self, record: &LogRecord) -> Vec<Pair> {
        let vars = self.normalizer.normalize_record(record, &self.timestamp_format);
        let mut pairs = PairSet::default();

        let standard = [
            (&self.keys.time, Value::String(vars.datetime)),
            (&self.keys.level, Value::String(vars.level_name)),
            (&self.keys.channel, vars.channel),
            (&self.keys.message, vars.message),
        ];
        for (key, value) in standard {
            if let Some(key) = key {
                pairs.insert(self.pair(key.clone(), &value));
            }
        }

        for (key, value) in vars.context.iter().chain(vars.extra.iter()) {
            if pairs.contains(key) {
                tracing::trace!(key = %key, "dropping attribute shadowed by an earlier field");
                continue;
            }
            if !is_valid_ident(key) {
                tracing::trace!(key = ?key, "dropping attribute with invalid key");
                continue;
            }

            for pair in self.encode_value(key, value) {
                pairs.insert(pair);
            }
        }

        pairs.into_pairs()
    }

    /// Render a single attribute, flattening composites when configured
    pub fn encode_value(&self, key: &str, value: &Value) -> Vec<Pair> {
        if !self.flatten {
            return vec![self.pair(key.to_string(), value)];
        }

        flatten_value(key, value)
            .into_iter()
            .filter(|(leaf_key, _)| {
                let valid = is_valid_ident(leaf_key);
                if !valid {
                    tracing::debug!(key = ?leaf_key, "dropping flattened member with invalid key");
                }
                valid
            })
            .map(|(leaf_key, leaf)| self.pair(leaf_key, leaf))
            .collect()
    }

    /// Render a value as a bare token, the null token, or JSON text
    pub fn render_value(&self, value: &Value) -> String {
        match value {
            Value::String(s) if is_valid_ident(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            Value::Null => self.normalizer.null_token().to_string(),
            other => self.normalizer.to_json_text(other),
        }
    }

    fn pair(&self, key: String, value: &Value) -> Pair {
        let rendered = format!("{}={}", key, self.render_value(value));
        Pair { key, rendered }
    }
}

impl<N: Normalizer> RecordFormatter for LogfmtFormatter<N> {
    fn format_record(&self, record: &LogRecord) -> String {
        self.encode(record)
    }

    fn format_batch(&self, records: &[LogRecord]) -> String {
        self.encode_batch(records)
    }
}
