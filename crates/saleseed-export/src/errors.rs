use saleseed_core::ConfigError;
use thiserror::Error;

/// Errors emitted while exporting the sales report.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("sale {sale_id} has unreadable timestamp `{value}`")]
    Timestamp { sale_id: i64, value: String },
}

impl ExportError {
    /// True when the output sink failed rather than the store.
    pub fn is_output(&self) -> bool {
        match self {
            ExportError::Io(_) => true,
            ExportError::Csv(err) => err.is_io_error(),
            _ => false,
        }
    }
}
