use crate::record::LogRecord;

/// Trait for formatting log records to strings
pub trait RecordFormatter {
    fn format_record(&self, record: &LogRecord) -> String;

    /// Format records in order, concatenating each record's output
    fn format_batch(&self, records: &[LogRecord]) -> String {
        records.iter().map(|record| self.format_record(record)).collect()
    }
}

pub mod logfmt;
