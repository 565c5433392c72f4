use thiserror::Error;

#[derive(Error, Debug)]
pub enum TranscovError {
    #[error("Can't read file: {0}")]
    FileReadError(String),

    #[error("Error parsing record: {0}")]
    RecordParseError(String),

    #[error("Invalid parameter {name}: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("Can't parse configuration: {0}")]
    ConfigError(#[from] toml::de::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
