use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    // Handoff errors
    #[error("Scan channel closed")]
    ChannelClosed,

    // Data model errors
    #[error("Invalid scan id: {0}")]
    InvalidScanId(String),

    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Missing configuration key: {0}")]
    MissingConfig(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
