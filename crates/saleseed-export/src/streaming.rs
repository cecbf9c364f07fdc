use std::io::Write;
use std::pin::pin;

use futures::stream::{Stream, StreamExt, TryChunksError, TryStreamExt};
use saleseed_core::ConfigError;
use saleseed_store::Store;
use sqlx::SqlitePool;
use tracing::info;

use crate::ExportStats;
use crate::errors::ExportError;
use crate::output::csv::CsvSink;
use crate::row::{JoinedRow, ReportRow};

const REPORT_QUERY: &str = r"
SELECT
  s.id AS sale_id,
  s.sold_at AS sold_at,
  a.username AS reseller_username,
  p.sku AS product_sku,
  p.name AS product_name,
  c.name AS item_category,
  si.quantity AS quantity,
  si.unit_price_cents AS unit_price_cents,
  si.line_total_cents AS line_total_cents
FROM sale_items si
JOIN sales s ON s.id = si.sale_id
JOIN resellers r ON r.id = s.reseller_id
JOIN accounts a ON a.id = r.account_id
JOIN products p ON p.id = si.product_id
JOIN categories c ON c.id = si.category_id
ORDER BY s.id, si.id
";

/// Every report row from one joined query, read as a cursor.
pub fn report_rows(pool: &SqlitePool) -> impl Stream<Item = Result<ReportRow, ExportError>> + '_ {
    sqlx::query_as::<_, JoinedRow>(REPORT_QUERY)
        .fetch(pool)
        .map(|row| row.map_err(ExportError::from).and_then(ReportRow::try_from))
}

/// Report rows grouped into pages of at most `chunk_size`. The cursor is
/// only advanced when the next page is pulled.
pub fn report_pages(
    pool: &SqlitePool,
    chunk_size: usize,
) -> Result<impl Stream<Item = Result<Vec<ReportRow>, ExportError>> + '_, ExportError> {
    if chunk_size == 0 {
        return Err(ConfigError::ZeroChunkSize.into());
    }
    Ok(report_rows(pool)
        .try_chunks(chunk_size)
        .map_err(|TryChunksError(_, err)| err))
}

/// Streams the report into `out`, one flushed page at a time.
pub async fn export_optimized<W: Write>(
    store: &Store,
    out: W,
    chunk_size: usize,
) -> Result<ExportStats, ExportError> {
    let mut pages = pin!(report_pages(store.pool(), chunk_size)?);
    let mut sink = CsvSink::new(out)?;
    let mut stats = ExportStats {
        round_trips: 1,
        ..ExportStats::default()
    };

    while let Some(page) = pages.try_next().await? {
        stats.peak_buffered_rows = stats.peak_buffered_rows.max(page.len());
        for row in &page {
            sink.write_row(row)?;
        }
        sink.flush()?;
        stats.rows += page.len() as u64;
        stats.pages += 1;
    }

    stats.bytes_written = sink.finish()?;
    info!(
        event = "export_finished",
        strategy = "optimized",
        rows = stats.rows,
        pages = stats.pages,
        peak_buffered_rows = stats.peak_buffered_rows,
        bytes_written = stats.bytes_written
    );
    Ok(stats)
}
