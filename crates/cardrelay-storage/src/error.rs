use thiserror::Error;

/// Storage-specific error types for the cardrelay backlog.
///
/// Every variant is fatal to the delivery worker: a backlog that cannot be
/// written or read no longer guarantees that undelivered scans survive.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Database connection or query execution failed
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Migration execution failed
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Stored row cannot be turned back into a scan
    #[error("Corrupt backlog row {scan_id}: {reason}")]
    Corrupt { scan_id: String, reason: String },

    /// Scan channel failed underneath the delivery worker
    #[error("Scan channel error: {0}")]
    Channel(#[from] cardrelay_core::Error),
}

impl StorageError {
    pub fn corrupt(scan_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Corrupt {
            scan_id: scan_id.into(),
            reason: reason.into(),
        }
    }
}

/// Specialized result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;
