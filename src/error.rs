#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid timestamp format '{format}'")]
    InvalidTimestampFormat { format: String },
}

#[derive(Debug, thiserror::Error)]
pub enum NormalizeError {
    #[error("Object conversion failed: {source}")]
    Conversion {
        #[source]
        source: anyhow::Error,
    },
}

impl From<anyhow::Error> for NormalizeError {
    fn from(err: anyhow::Error) -> Self {
        NormalizeError::Conversion { source: err }
    }
}
