//! Seed-marker counts, pool fetches and reset.

use std::collections::HashMap;

use saleseed_core::{Money, SEED_ACCOUNT_PREFIX, SEED_CATEGORY_PREFIX, SEED_SKU_PREFIX};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::info;

use crate::errors::StoreResult;
use crate::records::{AccountRef, CategoryRef, ProductRef, ResellerRef};
use crate::schema;

/// Row counts of every entity table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityCounts {
    pub accounts: u64,
    pub resellers: u64,
    pub categories: u64,
    pub products: u64,
    pub product_categories: u64,
    pub sales: u64,
    pub sale_items: u64,
}

impl EntityCounts {
    pub fn is_empty(&self) -> bool {
        *self == EntityCounts::default()
    }
}

/// Rows removed by [`reset`], per table.
pub type ResetSummary = EntityCounts;

fn prefix_pattern(prefix: &str) -> String {
    let mut pattern = String::with_capacity(prefix.len() + 1);
    for ch in prefix.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

fn limit(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn count(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}

pub async fn count_seed_accounts(pool: &SqlitePool) -> StoreResult<u64> {
    let value = sqlx::query_scalar::<_, i64>(
        r"SELECT COUNT(*) FROM accounts WHERE username LIKE ? ESCAPE '\'",
    )
    .bind(prefix_pattern(SEED_ACCOUNT_PREFIX))
    .fetch_one(pool)
    .await?;
    Ok(count(value))
}

/// First `max` seed accounts in creation order.
pub async fn fetch_seed_accounts(pool: &SqlitePool, max: u64) -> StoreResult<Vec<AccountRef>> {
    let rows = sqlx::query_as::<_, AccountRef>(
        r"SELECT id, username FROM accounts WHERE username LIKE ? ESCAPE '\' ORDER BY id LIMIT ?",
    )
    .bind(prefix_pattern(SEED_ACCOUNT_PREFIX))
    .bind(limit(max))
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn count_seed_resellers(pool: &SqlitePool) -> StoreResult<u64> {
    let value = sqlx::query_scalar::<_, i64>(
        r"
        SELECT COUNT(*)
        FROM resellers r
        JOIN accounts a ON a.id = r.account_id
        WHERE a.username LIKE ? ESCAPE '\'
        ",
    )
    .bind(prefix_pattern(SEED_ACCOUNT_PREFIX))
    .fetch_one(pool)
    .await?;
    Ok(count(value))
}

pub async fn fetch_seed_resellers(pool: &SqlitePool, max: u64) -> StoreResult<Vec<ResellerRef>> {
    let rows = sqlx::query_as::<_, ResellerRef>(
        r"
        SELECT r.id, r.account_id
        FROM resellers r
        JOIN accounts a ON a.id = r.account_id
        WHERE a.username LIKE ? ESCAPE '\'
        ORDER BY r.id
        LIMIT ?
        ",
    )
    .bind(prefix_pattern(SEED_ACCOUNT_PREFIX))
    .bind(limit(max))
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn count_seed_categories(pool: &SqlitePool) -> StoreResult<u64> {
    let value = sqlx::query_scalar::<_, i64>(
        r"SELECT COUNT(*) FROM categories WHERE name LIKE ? ESCAPE '\'",
    )
    .bind(prefix_pattern(SEED_CATEGORY_PREFIX))
    .fetch_one(pool)
    .await?;
    Ok(count(value))
}

pub async fn fetch_seed_categories(pool: &SqlitePool, max: u64) -> StoreResult<Vec<CategoryRef>> {
    let rows = sqlx::query_as::<_, CategoryRef>(
        r"SELECT id, name FROM categories WHERE name LIKE ? ESCAPE '\' ORDER BY id LIMIT ?",
    )
    .bind(prefix_pattern(SEED_CATEGORY_PREFIX))
    .bind(limit(max))
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn count_seed_products(pool: &SqlitePool) -> StoreResult<u64> {
    let value =
        sqlx::query_scalar::<_, i64>(r"SELECT COUNT(*) FROM products WHERE sku LIKE ? ESCAPE '\'")
            .bind(prefix_pattern(SEED_SKU_PREFIX))
            .fetch_one(pool)
            .await?;
    Ok(count(value))
}

pub async fn fetch_seed_products(pool: &SqlitePool, max: u64) -> StoreResult<Vec<ProductRef>> {
    let rows = sqlx::query_as::<_, (i64, String, i64)>(
        r"
        SELECT id, sku, base_price_cents
        FROM products
        WHERE sku LIKE ? ESCAPE '\'
        ORDER BY id
        LIMIT ?
        ",
    )
    .bind(prefix_pattern(SEED_SKU_PREFIX))
    .bind(limit(max))
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(id, sku, cents)| ProductRef {
            id,
            sku,
            base_price: Money::from_cents(cents),
        })
        .collect())
}

pub async fn count_links(pool: &SqlitePool) -> StoreResult<u64> {
    let value = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM product_categories")
        .fetch_one(pool)
        .await?;
    Ok(count(value))
}

/// Category ids linked to each product, in link creation order.
pub async fn fetch_link_map(pool: &SqlitePool) -> StoreResult<HashMap<i64, Vec<i64>>> {
    let rows = sqlx::query_as::<_, (i64, i64)>(
        "SELECT product_id, category_id FROM product_categories ORDER BY id",
    )
    .fetch_all(pool)
    .await?;

    let mut mapping: HashMap<i64, Vec<i64>> = HashMap::new();
    for (product_id, category_id) in rows {
        mapping.entry(product_id).or_default().push(category_id);
    }
    Ok(mapping)
}

pub async fn count_sales(pool: &SqlitePool) -> StoreResult<u64> {
    let value = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM sales")
        .fetch_one(pool)
        .await?;
    Ok(count(value))
}

pub async fn entity_counts(pool: &SqlitePool) -> StoreResult<EntityCounts> {
    let (accounts, resellers, categories, products, product_categories, sales, sale_items) =
        sqlx::query_as::<_, (i64, i64, i64, i64, i64, i64, i64)>(
            r"
            SELECT
              (SELECT COUNT(*) FROM accounts),
              (SELECT COUNT(*) FROM resellers),
              (SELECT COUNT(*) FROM categories),
              (SELECT COUNT(*) FROM products),
              (SELECT COUNT(*) FROM product_categories),
              (SELECT COUNT(*) FROM sales),
              (SELECT COUNT(*) FROM sale_items)
            ",
        )
        .fetch_one(pool)
        .await?;

    Ok(EntityCounts {
        accounts: count(accounts),
        resellers: count(resellers),
        categories: count(categories),
        products: count(products),
        product_categories: count(product_categories),
        sales: count(sales),
        sale_items: count(sale_items),
    })
}

/// Delete every generated row, children before parents, in one transaction.
///
/// Only accounts carrying the seed prefix are removed; other accounts survive
/// unless a reseller row referenced them.
pub async fn reset(pool: &SqlitePool) -> StoreResult<ResetSummary> {
    let mut tx = pool.begin().await?;
    let mut summary = ResetSummary::default();

    for (table, slot) in [
        (schema::SALE_ITEMS, &mut summary.sale_items),
        (schema::SALES, &mut summary.sales),
        (schema::PRODUCT_CATEGORIES, &mut summary.product_categories),
        (schema::PRODUCTS, &mut summary.products),
        (schema::CATEGORIES, &mut summary.categories),
        (schema::RESELLERS, &mut summary.resellers),
    ] {
        *slot = sqlx::query(&format!("DELETE FROM {table}"))
            .execute(&mut *tx)
            .await?
            .rows_affected();
    }

    summary.accounts = sqlx::query(r"DELETE FROM accounts WHERE username LIKE ? ESCAPE '\'")
        .bind(prefix_pattern(SEED_ACCOUNT_PREFIX))
        .execute(&mut *tx)
        .await?
        .rows_affected();

    tx.commit().await?;
    info!(
        event = "reset_finished",
        sale_items = summary.sale_items,
        sales = summary.sales,
        products = summary.products,
        accounts = summary.accounts
    );
    Ok(summary)
}
