//! Denormalized CSV export of sale lines.
//!
//! Two strategies produce byte-identical reports: a per-row lookup baseline
//! and a single joined query streamed in bounded pages.

pub mod errors;
pub mod naive;
pub mod output;
pub mod row;
pub mod streaming;

use std::io::Write;

use serde::{Deserialize, Serialize};

use saleseed_store::Store;

pub use errors::ExportError;
pub use naive::export_naive;
pub use row::{HEADER, ReportRow, SaleDate};
pub use streaming::{export_optimized, report_pages, report_rows};

pub const CONTENT_TYPE: &str = "text/csv; charset=utf-8";
pub const NAIVE_FILE_NAME: &str = "unoptimized_sales_report.csv";
pub const OPTIMIZED_FILE_NAME: &str = "optimized_sales_report.csv";
pub const DEFAULT_CHUNK_SIZE: usize = 5000;

/// Counters collected while exporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportStats {
    pub rows: u64,
    pub pages: u64,
    /// Most report rows held in memory at once: one page for the streamed
    /// export, one sale's lines for the naive one.
    pub peak_buffered_rows: usize,
    /// Queries issued against the store.
    pub round_trips: u64,
    pub bytes_written: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportStrategy {
    Naive,
    Optimized,
}

impl ExportStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportStrategy::Naive => "naive",
            ExportStrategy::Optimized => "optimized",
        }
    }

    /// Suggested download name for the report.
    pub fn file_name(&self) -> &'static str {
        match self {
            ExportStrategy::Naive => NAIVE_FILE_NAME,
            ExportStrategy::Optimized => OPTIMIZED_FILE_NAME,
        }
    }
}

/// Export with the given strategy. `chunk_size` only applies to the
/// optimized path.
pub async fn export<W: Write>(
    store: &Store,
    strategy: ExportStrategy,
    out: W,
    chunk_size: usize,
) -> Result<ExportStats, ExportError> {
    match strategy {
        ExportStrategy::Naive => export_naive(store, out).await,
        ExportStrategy::Optimized => export_optimized(store, out, chunk_size).await,
    }
}
