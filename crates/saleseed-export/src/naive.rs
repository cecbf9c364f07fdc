use std::io::Write;

use saleseed_core::Money;
use saleseed_store::Store;
use sqlx::SqlitePool;
use tracing::info;

use crate::ExportStats;
use crate::errors::ExportError;
use crate::output::csv::CsvSink;
use crate::row::{ReportRow, parse_sale_date};

#[derive(Debug, sqlx::FromRow)]
struct SaleRecord {
    id: i64,
    reseller_id: i64,
    sold_at: String,
}

#[derive(Debug, sqlx::FromRow)]
struct ItemRecord {
    product_id: i64,
    category_id: i64,
    quantity: i64,
    unit_price_cents: i64,
    line_total_cents: i64,
}

/// Per-row lookups, each one a separate query.
struct Lookups<'a> {
    pool: &'a SqlitePool,
    round_trips: u64,
}

impl Lookups<'_> {
    async fn sales(&mut self) -> Result<Vec<SaleRecord>, ExportError> {
        self.round_trips += 1;
        Ok(sqlx::query_as::<_, SaleRecord>(
            "SELECT id, reseller_id, sold_at FROM sales ORDER BY id",
        )
        .fetch_all(self.pool)
        .await?)
    }

    async fn reseller_username(&mut self, reseller_id: i64) -> Result<String, ExportError> {
        self.round_trips += 1;
        let account_id =
            sqlx::query_scalar::<_, i64>("SELECT account_id FROM resellers WHERE id = ?")
                .bind(reseller_id)
                .fetch_one(self.pool)
                .await?;
        self.round_trips += 1;
        Ok(
            sqlx::query_scalar::<_, String>("SELECT username FROM accounts WHERE id = ?")
                .bind(account_id)
                .fetch_one(self.pool)
                .await?,
        )
    }

    async fn items(&mut self, sale_id: i64) -> Result<Vec<ItemRecord>, ExportError> {
        self.round_trips += 1;
        Ok(sqlx::query_as::<_, ItemRecord>(
            r"
            SELECT product_id, category_id, quantity, unit_price_cents, line_total_cents
            FROM sale_items
            WHERE sale_id = ?
            ORDER BY id
            ",
        )
        .bind(sale_id)
        .fetch_all(self.pool)
        .await?)
    }

    async fn product(&mut self, product_id: i64) -> Result<(String, String), ExportError> {
        self.round_trips += 1;
        Ok(
            sqlx::query_as::<_, (String, String)>("SELECT sku, name FROM products WHERE id = ?")
                .bind(product_id)
                .fetch_one(self.pool)
                .await?,
        )
    }

    async fn category_name(&mut self, category_id: i64) -> Result<String, ExportError> {
        self.round_trips += 1;
        Ok(
            sqlx::query_scalar::<_, String>("SELECT name FROM categories WHERE id = ?")
                .bind(category_id)
                .fetch_one(self.pool)
                .await?,
        )
    }
}

/// Baseline export resolving every relation with its own query.
///
/// All sales are loaded up front; round trips grow with the number of
/// lines. Output is identical to [`crate::export_optimized`].
pub async fn export_naive<W: Write>(store: &Store, out: W) -> Result<ExportStats, ExportError> {
    let mut lookups = Lookups {
        pool: store.pool(),
        round_trips: 0,
    };
    let mut sink = CsvSink::new(out)?;
    let mut stats = ExportStats::default();

    let sales = lookups.sales().await?;

    for sale in &sales {
        let sale_date = parse_sale_date(sale.id, &sale.sold_at)?;
        let reseller_username = lookups.reseller_username(sale.reseller_id).await?;
        let items = lookups.items(sale.id).await?;
        stats.peak_buffered_rows = stats.peak_buffered_rows.max(items.len());
        for item in items {
            let (product_sku, product_name) = lookups.product(item.product_id).await?;
            let item_category = lookups.category_name(item.category_id).await?;
            sink.write_row(&ReportRow {
                sale_id: sale.id,
                sale_date,
                reseller_username: reseller_username.clone(),
                product_sku,
                product_name,
                item_category,
                quantity: item.quantity,
                unit_price: Money::from_cents(item.unit_price_cents),
                line_total: Money::from_cents(item.line_total_cents),
            })?;
            stats.rows += 1;
        }
    }

    stats.pages = 1;
    stats.round_trips = lookups.round_trips;
    stats.bytes_written = sink.finish()?;
    info!(
        event = "export_finished",
        strategy = "naive",
        rows = stats.rows,
        round_trips = stats.round_trips,
        bytes_written = stats.bytes_written
    );
    Ok(stats)
}
