use serde::Deserialize;

/// RFC 3339 with a `+00:00` style offset
pub const RFC3339_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%:z";

/// Configuration for the logfmt formatter
///
/// A `None` (or blank) key leaves that standard field out of every line.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EncoderConfig {
    pub time_key: Option<String>,
    pub level_key: Option<String>,
    pub channel_key: Option<String>,
    pub message_key: Option<String>,
    pub timestamp_format: String,
    pub line_terminator: Option<String>,
    pub flatten: bool,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        EncoderConfig {
            time_key: Some("ts".to_string()),
            level_key: Some("lvl".to_string()),
            channel_key: Some("chan".to_string()),
            message_key: Some("msg".to_string()),
            timestamp_format: RFC3339_FORMAT.to_string(),
            line_terminator: Some("\n".to_string()),
            flatten: false,
        }
    }
}

impl EncoderConfig {
    pub fn time_key(mut self, key: Option<&str>) -> Self {
        self.time_key = key.map(str::to_string);
        self
    }

    pub fn level_key(mut self, key: Option<&str>) -> Self {
        self.level_key = key.map(str::to_string);
        self
    }

    pub fn channel_key(mut self, key: Option<&str>) -> Self {
        self.channel_key = key.map(str::to_string);
        self
    }

    pub fn message_key(mut self, key: Option<&str>) -> Self {
        self.message_key = key.map(str::to_string);
        self
    }

    pub fn timestamp_format(mut self, format: &str) -> Self {
        self.timestamp_format = format.to_string();
        self
    }

    pub fn line_terminator(mut self, terminator: Option<&str>) -> Self {
        self.line_terminator = terminator.map(str::to_string);
        self
    }

    pub fn flatten(mut self, flatten: bool) -> Self {
        self.flatten = flatten;
        self
    }
}
