use saleseed_core::ConfigError;
use saleseed_store::StoreError;
use thiserror::Error;

use crate::model::SeedReport;

/// Errors emitted by the generation engine.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("storage error: {0}")]
    Store(#[from] StoreError),
    #[error("no {0} available to reference")]
    EmptyPool(&'static str),
    #[error("seed run failed after {} completed sale chunk(s): {source}", .report.chunks_completed)]
    Failed {
        report: Box<SeedReport>,
        #[source]
        source: Box<GenerationError>,
    },
}

impl From<sqlx::Error> for GenerationError {
    fn from(err: sqlx::Error) -> Self {
        GenerationError::Store(StoreError::Database(err))
    }
}

impl GenerationError {
    /// Progress made before the run aborted, if it got that far.
    pub fn report(&self) -> Option<&SeedReport> {
        match self {
            GenerationError::Failed { report, .. } => Some(report),
            _ => None,
        }
    }

    /// The failure behind a [`GenerationError::Failed`] wrapper.
    pub fn root(&self) -> &GenerationError {
        match self {
            GenerationError::Failed { source, .. } => source.root(),
            other => other,
        }
    }

    pub fn is_integrity(&self) -> bool {
        matches!(self.root(), GenerationError::Store(err) if err.is_integrity())
    }
}
