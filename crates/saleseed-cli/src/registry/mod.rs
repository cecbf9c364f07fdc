mod files;
mod logging;

pub use files::{StagedFile, write_json_atomic};
pub use logging::init_logging;

use thiserror::Error;

/// Errors raised while writing run artifacts or installing logging.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("logging error: {0}")]
    Logging(String),
    #[error("invalid output path: {0}")]
    InvalidPath(String),
}

pub type RegistryResult<T> = std::result::Result<T, RegistryError>;
