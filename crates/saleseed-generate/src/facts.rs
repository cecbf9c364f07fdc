use std::collections::HashMap;

use chrono::{DateTime, Duration, SubsecRound, Utc};
use rand::{Rng, RngCore};
use rand_chacha::ChaCha8Rng;
use rust_decimal::Decimal;
use saleseed_core::{Money, NewSale, NewSaleItem, SeedParams};
use saleseed_store::{ProductRef, insert_and_allocate, insert_chunked, queries, schema};
use sqlx::SqlitePool;
use tracing::info;

use crate::errors::GenerationError;
use crate::model::{SeedReport, StageReport};
use crate::stages::StageDecision;

/// Price multiplier bounds in basis points (0.8500 to 1.2000).
pub const MULTIPLIER_BASIS_POINTS: std::ops::RangeInclusive<i64> = 8_500..=12_000;
/// Sales are spread over this many days before the run clock.
pub const SALE_WINDOW_DAYS: i64 = 365;
const MINUTES_PER_DAY: i64 = 1_440;

/// Reference data every generated sale draws from.
#[derive(Debug, Clone, Default)]
pub struct ReferencePools {
    reseller_ids: Vec<i64>,
    products: Vec<(i64, Money)>,
    category_ids: Vec<i64>,
    product_categories: HashMap<i64, Vec<i64>>,
}

impl ReferencePools {
    pub fn new(
        reseller_ids: Vec<i64>,
        products: &[ProductRef],
        category_ids: Vec<i64>,
        product_categories: HashMap<i64, Vec<i64>>,
    ) -> Self {
        Self {
            reseller_ids,
            products: products
                .iter()
                .map(|product| (product.id, product.base_price))
                .collect(),
            category_ids,
            product_categories,
        }
    }

    /// Fails when a pool a sale needs is empty.
    pub fn ensure_ready(&self, params: &SeedParams) -> Result<(), GenerationError> {
        if self.reseller_ids.is_empty() {
            return Err(GenerationError::EmptyPool("resellers"));
        }
        if params.max_items_per_sale > 0 {
            if self.products.is_empty() {
                return Err(GenerationError::EmptyPool("products"));
            }
            if self.category_ids.is_empty() {
                return Err(GenerationError::EmptyPool("categories"));
            }
        }
        Ok(())
    }

    /// Categories a line for `product_id` may reference. Products without
    /// links fall back to every category.
    pub fn categories_for(&self, product_id: i64) -> &[i64] {
        match self.product_categories.get(&product_id) {
            Some(ids) if !ids.is_empty() => ids,
            _ => &self.category_ids,
        }
    }
}

fn pick<'a, T>(rng: &mut dyn RngCore, values: &'a [T]) -> &'a T {
    &values[rng.random_range(0..values.len())]
}

pub fn sample_multiplier(rng: &mut dyn RngCore) -> Decimal {
    Decimal::new(rng.random_range(MULTIPLIER_BASIS_POINTS), 4)
}

/// A sale for a random reseller, sold within the year before `now`.
pub fn build_sale(rng: &mut dyn RngCore, pools: &ReferencePools, now: DateTime<Utc>) -> NewSale {
    let days = rng.random_range(0..=SALE_WINDOW_DAYS);
    let minutes = rng.random_range(0..MINUTES_PER_DAY);
    NewSale {
        reseller_id: *pick(rng, &pools.reseller_ids),
        sold_at: now - Duration::days(days) - Duration::minutes(minutes),
    }
}

pub fn build_item(
    rng: &mut dyn RngCore,
    pools: &ReferencePools,
    params: &SeedParams,
    sale_id: i64,
) -> NewSaleItem {
    let (product_id, base_price) = *pick(rng, &pools.products);
    let category_id = *pick(rng, pools.categories_for(product_id));
    let quantity = rng.random_range(params.quantity_range());
    let unit_price = base_price.scale_by(sample_multiplier(rng));
    NewSaleItem::new(sale_id, product_id, category_id, quantity, unit_price)
}

/// Between `min_items_per_sale` and `max_items_per_sale` lines for each sale.
pub fn build_items(
    rng: &mut dyn RngCore,
    pools: &ReferencePools,
    params: &SeedParams,
    sale_ids: &[i64],
) -> Vec<NewSaleItem> {
    let mut items = Vec::with_capacity(sale_ids.len() * params.max_items_per_sale as usize);
    for &sale_id in sale_ids {
        let count = rng.random_range(params.items_range());
        for _ in 0..count {
            items.push(build_item(rng, pools, params, sale_id));
        }
    }
    items
}

/// Writes one chunk of sales with their lines in a single transaction and
/// returns the number of lines written. Any failure rolls the chunk back.
async fn write_chunk(
    pool: &SqlitePool,
    sales: &[NewSale],
    pools: &ReferencePools,
    params: &SeedParams,
    rng: &mut ChaCha8Rng,
) -> Result<u64, GenerationError> {
    let mut tx = pool.begin().await?;
    let sale_ids = insert_and_allocate(&mut *tx, sales, params.chunk_size).await?;
    let items = build_items(rng, pools, params, &sale_ids);
    let outcome = insert_chunked(&mut *tx, &items, params.chunk_size).await?;
    tx.commit().await?;
    Ok(outcome.inserted)
}

/// Generates sales until the store holds `sale_count` of them.
pub async fn seed_sales(
    pool: &SqlitePool,
    pools: &ReferencePools,
    params: &SeedParams,
    now: DateTime<Utc>,
    rng: &mut ChaCha8Rng,
    report: &mut SeedReport,
) -> Result<(), GenerationError> {
    let target = params.sale_count;
    let existing = queries::count_sales(pool).await?;
    match StageDecision::for_counts(existing, target) {
        StageDecision::Reuse => {
            info!(event = "stage_reused", stage = schema::SALES, existing, target);
            report
                .stages
                .push(StageReport::reused(schema::SALES, target, existing));
            return Ok(());
        }
        StageDecision::Generate => {}
    }
    pools.ensure_ready(params)?;

    let now = now.trunc_subsecs(6);
    let remaining = target - existing;
    let chunk_size = params.chunk_size as u64;
    let mut created = 0u64;
    while created < remaining {
        let current = (remaining - created).min(chunk_size);
        let sales: Vec<NewSale> = (0..current).map(|_| build_sale(rng, pools, now)).collect();
        let lines = write_chunk(pool, &sales, pools, params, rng).await?;

        created += current;
        report.chunks_completed += 1;
        report.sales_created += current;
        report.sale_items_created += lines;
        info!(
            event = "sales_progress",
            created = existing + created,
            target,
            chunk = report.chunks_completed
        );
    }

    report.stages.push(StageReport {
        stage: schema::SALES.to_string(),
        target,
        existing,
        created,
        skipped: 0,
        reused: false,
    });
    Ok(())
}
