use saleseed_core::ConfigError;
use thiserror::Error;

/// Errors emitted by the storage layer.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error(
        "identifier allocation mismatch on {table}: expected {expected} new rows, got {actual}"
    )]
    Integrity {
        table: &'static str,
        expected: usize,
        actual: usize,
    },
}

impl StoreError {
    /// True for allocation anomalies that must abort a run without retry.
    pub fn is_integrity(&self) -> bool {
        matches!(self, StoreError::Integrity { .. })
    }
}

/// Result type for storage operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;
