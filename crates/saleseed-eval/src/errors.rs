use saleseed_store::StoreError;
use thiserror::Error;

/// Errors emitted by dataset verification.
#[derive(Debug, Error)]
pub enum EvalError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("storage error: {0}")]
    Store(#[from] StoreError),
    #[error("validation failed with {0} violation(s)")]
    Violations(u64),
}
