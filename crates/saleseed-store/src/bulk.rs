//! Chunked insert-if-absent writer.

use saleseed_core::{
    ConfigError, NewAccount, NewCategory, NewProduct, NewReseller, NewSale, NewSaleItem,
    ProductCategoryLink,
};
use serde::Serialize;
use sqlx::query_builder::Separated;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};
use tracing::debug;

use crate::errors::StoreResult;
use crate::schema;
use crate::timestamp::encode_timestamp;

/// Highest number of bound parameters SQLite accepts in one statement.
pub const MAX_BIND_PARAMS: usize = 32_766;

/// A record that can be written by [`insert_chunked`].
pub trait Insertable {
    const TABLE: &'static str;
    const COLUMNS: &'static [&'static str];

    /// Push one bound value per entry of `COLUMNS`, in order.
    fn bind_row<'args>(&'args self, row: Separated<'_, 'args, Sqlite, &'static str>);
}

/// Row counts for one call to [`insert_chunked`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct InsertOutcome {
    pub chunks: u64,
    pub attempted: u64,
    pub inserted: u64,
    /// Rows dropped by a unique-key collision.
    pub skipped: u64,
}

/// Insert `rows` in contiguous chunks of `chunk_size`, one bulk statement per
/// chunk, silently skipping rows that collide with a unique key.
///
/// Outside a transaction every statement commits on its own, so a failure
/// keeps the chunks written before it. A chunk wider than SQLite's bind limit
/// is split into the fewest statements that fit.
pub async fn insert_chunked<R: Insertable>(
    conn: &mut SqliteConnection,
    rows: &[R],
    chunk_size: usize,
) -> StoreResult<InsertOutcome> {
    if chunk_size == 0 {
        return Err(ConfigError::ZeroChunkSize.into());
    }

    let statement_rows = (MAX_BIND_PARAMS / R::COLUMNS.len().max(1)).max(1);
    let mut outcome = InsertOutcome::default();

    for chunk in rows.chunks(chunk_size) {
        let mut inserted = 0_u64;
        for batch in chunk.chunks(statement_rows) {
            let mut builder: QueryBuilder<'_, Sqlite> = QueryBuilder::new(format!(
                "INSERT INTO {} ({}) ",
                R::TABLE,
                R::COLUMNS.join(", ")
            ));
            builder.push_values(batch, |row, record| record.bind_row(row));
            builder.push(" ON CONFLICT DO NOTHING");
            inserted += builder.build().execute(&mut *conn).await?.rows_affected();
        }

        let attempted = chunk.len() as u64;
        outcome.chunks += 1;
        outcome.attempted += attempted;
        outcome.inserted += inserted;
        outcome.skipped += attempted.saturating_sub(inserted);
    }

    debug!(
        event = "bulk_insert",
        table = R::TABLE,
        chunks = outcome.chunks,
        inserted = outcome.inserted,
        skipped = outcome.skipped
    );
    Ok(outcome)
}

impl Insertable for NewAccount {
    const TABLE: &'static str = schema::ACCOUNTS;
    const COLUMNS: &'static [&'static str] = &["username", "email", "first_name", "last_name"];

    fn bind_row<'args>(&'args self, mut row: Separated<'_, 'args, Sqlite, &'static str>) {
        row.push_bind(self.username.as_str())
            .push_bind(self.email.as_str())
            .push_bind(self.first_name.as_str())
            .push_bind(self.last_name.as_str());
    }
}

impl Insertable for NewReseller {
    const TABLE: &'static str = schema::RESELLERS;
    const COLUMNS: &'static [&'static str] = &["account_id", "company_name", "region"];

    fn bind_row<'args>(&'args self, mut row: Separated<'_, 'args, Sqlite, &'static str>) {
        row.push_bind(self.account_id)
            .push_bind(self.company_name.as_str())
            .push_bind(self.region.as_str());
    }
}

impl Insertable for NewCategory {
    const TABLE: &'static str = schema::CATEGORIES;
    const COLUMNS: &'static [&'static str] = &["name"];

    fn bind_row<'args>(&'args self, mut row: Separated<'_, 'args, Sqlite, &'static str>) {
        row.push_bind(self.name.as_str());
    }
}

impl Insertable for NewProduct {
    const TABLE: &'static str = schema::PRODUCTS;
    const COLUMNS: &'static [&'static str] = &[
        "sku",
        "name",
        "description",
        "base_price_cents",
        "stock_quantity",
    ];

    fn bind_row<'args>(&'args self, mut row: Separated<'_, 'args, Sqlite, &'static str>) {
        row.push_bind(self.sku.as_str())
            .push_bind(self.name.as_str())
            .push_bind(self.description.as_str())
            .push_bind(self.base_price.cents())
            .push_bind(i64::from(self.stock_quantity));
    }
}

impl Insertable for ProductCategoryLink {
    const TABLE: &'static str = schema::PRODUCT_CATEGORIES;
    const COLUMNS: &'static [&'static str] = &["product_id", "category_id"];

    fn bind_row<'args>(&'args self, mut row: Separated<'_, 'args, Sqlite, &'static str>) {
        row.push_bind(self.product_id).push_bind(self.category_id);
    }
}

impl Insertable for NewSale {
    const TABLE: &'static str = schema::SALES;
    const COLUMNS: &'static [&'static str] = &["reseller_id", "sold_at"];

    fn bind_row<'args>(&'args self, mut row: Separated<'_, 'args, Sqlite, &'static str>) {
        row.push_bind(self.reseller_id)
            .push_bind(encode_timestamp(&self.sold_at));
    }
}

impl Insertable for NewSaleItem {
    const TABLE: &'static str = schema::SALE_ITEMS;
    const COLUMNS: &'static [&'static str] = &[
        "sale_id",
        "product_id",
        "category_id",
        "quantity",
        "unit_price_cents",
        "line_total_cents",
    ];

    fn bind_row<'args>(&'args self, mut row: Separated<'_, 'args, Sqlite, &'static str>) {
        row.push_bind(self.sale_id)
            .push_bind(self.product_id)
            .push_bind(self.category_id)
            .push_bind(i64::from(self.quantity))
            .push_bind(self.unit_price.cents())
            .push_bind(self.line_total.cents());
    }
}
