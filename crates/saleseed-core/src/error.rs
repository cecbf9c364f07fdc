use thiserror::Error;

/// Invalid run parameters. Raised before any storage mutation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("min-items-per-sale ({min}) cannot be greater than max-items-per-sale ({max})")]
    ItemsRange { min: u32, max: u32 },
    #[error("quantity range {min}..={max} is invalid (quantities start at 1)")]
    QuantityRange { min: u32, max: u32 },
    #[error("stock range {min}..={max} is invalid")]
    StockRange { min: u32, max: u32 },
    #[error("price range {min}..={max} is invalid")]
    PriceRange { min: f64, max: f64 },
    #[error("chunk size must be greater than zero")]
    ZeroChunkSize,
    #[error("sales require at least one {0}")]
    MissingPool(&'static str),
}

/// Convenience alias for parameter validation results.
pub type Result<T> = std::result::Result<T, ConfigError>;
