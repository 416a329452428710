use chrono::{DateTime, FixedOffset, TimeZone, Utc};
use logline::{
    DefaultNormalizer, EncoderConfig, Field, LogObject, LogRecord, LogfmtFormatter,
    NormalizeError, NormalizedRecord, Normalizer, Value,
};

fn record(message: impl Into<Field>) -> LogRecord {
    LogRecord::new("INFO", "app", message)
        .with_datetime(Utc.with_ymd_and_hms(2017, 11, 19, 19, 0, 0).unwrap())
}

/// Delegates to the stock normalizer but spells null in lowercase
/// and renders every timestamp as unix seconds.
struct LowercaseNull(DefaultNormalizer);

impl Normalizer for LowercaseNull {
    fn format_timestamp(&self, datetime: &DateTime<FixedOffset>, _format: &str) -> String {
        datetime.timestamp().to_string()
    }

    fn normalize_record(&self, record: &LogRecord, timestamp_format: &str) -> NormalizedRecord {
        let mut normalized = self.0.normalize_record(record, timestamp_format);
        normalized.datetime = self.format_timestamp(&record.datetime, timestamp_format);
        normalized
    }

    fn normalize_opaque(
        &self,
        object: &dyn LogObject,
        timestamp_format: &str,
    ) -> Result<Value, NormalizeError> {
        self.0.normalize_opaque(object, timestamp_format)
    }

    fn null_token(&self) -> &str {
        "null"
    }
}

#[test]
fn test_custom_normalizer_is_used() {
    let formatter =
        LogfmtFormatter::with_normalizer(EncoderConfig::default(), LowercaseNull(DefaultNormalizer::new()))
            .unwrap();
    let record = record(Field::null()).with_context("gone", None::<String>);

    assert_eq!(
        formatter.encode(&record),
        "ts=1511118000 lvl=INFO chan=app msg=null gone=null\n"
    );
}

#[test]
fn test_depth_limit_flows_into_output() {
    let formatter = LogfmtFormatter::with_normalizer(
        EncoderConfig::default(),
        DefaultNormalizer::new().with_max_depth(1),
    )
    .unwrap();
    let record = record("Message").with_context("deep", serde_json::json!({"a": {"b": 1}}));

    assert!(formatter
        .encode(&record)
        .ends_with("deep={\"a\":\"Over 1 levels deep, aborting normalization\"}\n"));
}

#[test]
fn test_non_finite_floats_render_as_tokens() {
    let formatter = LogfmtFormatter::default();
    let record = record(f64::NAN).with_context("up", f64::INFINITY);
    assert!(formatter.encode(&record).ends_with("msg=NaN up=INF\n"));
}

/// Decomposes into a fresh, deeper link every time
#[derive(Debug)]
struct Link(u32);

impl LogObject for Link {
    fn decompose(&self) -> anyhow::Result<Field> {
        Ok(Field::object(Link(self.0 + 1)))
    }
}

#[test]
fn test_object_chains_stop_at_depth_limit() {
    let formatter = LogfmtFormatter::with_normalizer(
        EncoderConfig::default(),
        DefaultNormalizer::new().with_max_depth(2),
    )
    .unwrap();
    let record = record("Message").with_context("chain", Field::object(Link(0)));

    assert!(formatter
        .encode(&record)
        .ends_with("msg=Message chain=\"Over 2 levels deep, aborting normalization\"\n"));
}

#[test]
fn test_object_chains_terminate_when_flattening() {
    let formatter = LogfmtFormatter::new(EncoderConfig::default().flatten(true)).unwrap();
    let record = record("Message").with_context("chain", Field::object(Link(0)));

    assert!(formatter
        .encode(&record)
        .ends_with("chain=\"Over 9 levels deep, aborting normalization\"\n"));
}
