use std::collections::HashMap;

use rand::seq::IndexedRandom;
use rand::{Rng, RngCore};
use rand_chacha::ChaCha8Rng;
use saleseed_core::{
    Money, NewAccount, NewCategory, NewProduct, NewReseller, ProductCategoryLink, Region,
    SeedParams,
};
use saleseed_store::{queries, schema};
use saleseed_store::{
    AccountRef, CategoryRef, InsertOutcome, Insertable, ProductRef, ResellerRef, insert_chunked,
};
use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::errors::GenerationError;
use crate::model::{SeedReport, StageReport};
use crate::naming::{
    CATEGORY_NAMES, COMPANY_NAMES, LAST_NAMES, PRODUCT_DESCRIPTIONS, PRODUCT_NAMES, SKUS,
    USERNAMES,
};

/// Most categories a product is linked to.
pub const MAX_CATEGORIES_PER_PRODUCT: usize = 3;

/// What a stage does given the rows already stored.
///
/// A short stage regenerates the whole `0..target` sequence; rows that
/// already exist are dropped by the unique keys, so gaps left by deleted
/// rows are filled again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageDecision {
    Reuse,
    Generate,
}

impl StageDecision {
    pub fn for_counts(existing: u64, target: u64) -> Self {
        if existing >= target {
            StageDecision::Reuse
        } else {
            StageDecision::Generate
        }
    }
}

async fn write_rows<R: Insertable>(
    pool: &SqlitePool,
    rows: &[R],
    chunk_size: usize,
) -> Result<InsertOutcome, GenerationError> {
    let mut conn = pool.acquire().await?;
    Ok(insert_chunked(&mut conn, rows, chunk_size).await?)
}

fn record(report: &mut SeedReport, stage: StageReport) {
    if stage.reused {
        info!(
            event = "stage_reused",
            stage = %stage.stage,
            existing = stage.existing,
            target = stage.target
        );
    } else {
        info!(
            event = "stage_generated",
            stage = %stage.stage,
            existing = stage.existing,
            target = stage.target,
            created = stage.created,
            skipped = stage.skipped
        );
    }
    report.stages.push(stage);
}

fn warn_if_short(stage: &'static str, available: usize, target: u64) {
    if (available as u64) < target {
        warn!(event = "stage_short", stage, available, target);
    }
}

pub fn build_account(index: u64) -> NewAccount {
    let username = USERNAMES.name(index);
    NewAccount {
        email: format!("{username}@example.com"),
        first_name: "Seed".to_string(),
        last_name: LAST_NAMES.name(index),
        username,
    }
}

pub async fn seed_accounts(
    pool: &SqlitePool,
    params: &SeedParams,
    report: &mut SeedReport,
) -> Result<Vec<AccountRef>, GenerationError> {
    let target = params.account_count;
    let existing = queries::count_seed_accounts(pool).await?;
    let stage = match StageDecision::for_counts(existing, target) {
        StageDecision::Reuse => StageReport::reused(schema::ACCOUNTS, target, existing),
        StageDecision::Generate => {
            let rows: Vec<NewAccount> = (0..target).map(build_account).collect();
            let outcome = write_rows(pool, &rows, params.chunk_size).await?;
            StageReport::generated(schema::ACCOUNTS, target, existing, outcome)
        }
    };
    record(report, stage);

    let accounts = queries::fetch_seed_accounts(pool, target).await?;
    warn_if_short(schema::ACCOUNTS, accounts.len(), target);
    Ok(accounts)
}

/// One reseller per seed account, each in a uniformly drawn region.
pub async fn seed_resellers(
    pool: &SqlitePool,
    accounts: &[AccountRef],
    rng: &mut ChaCha8Rng,
    params: &SeedParams,
    report: &mut SeedReport,
) -> Result<Vec<ResellerRef>, GenerationError> {
    let target = accounts.len() as u64;
    let existing = queries::count_seed_resellers(pool).await?;
    let stage = match StageDecision::for_counts(existing, target) {
        StageDecision::Reuse => StageReport::reused(schema::RESELLERS, target, existing),
        StageDecision::Generate => {
            // Rows for accounts that already own a reseller are dropped by the
            // unique account constraint.
            let rows: Vec<NewReseller> = accounts
                .iter()
                .enumerate()
                .map(|(index, account)| NewReseller {
                    account_id: account.id,
                    company_name: COMPANY_NAMES.name(index as u64),
                    region: Region::ALL[rng.random_range(0..Region::ALL.len())],
                })
                .collect();
            let outcome = write_rows(pool, &rows, params.chunk_size).await?;
            StageReport::generated(schema::RESELLERS, target, existing, outcome)
        }
    };
    record(report, stage);

    let resellers = queries::fetch_seed_resellers(pool, target).await?;
    warn_if_short(schema::RESELLERS, resellers.len(), target);
    Ok(resellers)
}

pub async fn seed_categories(
    pool: &SqlitePool,
    params: &SeedParams,
    report: &mut SeedReport,
) -> Result<Vec<CategoryRef>, GenerationError> {
    let target = params.category_count;
    let existing = queries::count_seed_categories(pool).await?;
    let stage = match StageDecision::for_counts(existing, target) {
        StageDecision::Reuse => StageReport::reused(schema::CATEGORIES, target, existing),
        StageDecision::Generate => {
            let rows: Vec<NewCategory> = (0..target)
                .map(|index| NewCategory {
                    name: CATEGORY_NAMES.name(index),
                })
                .collect();
            let outcome = write_rows(pool, &rows, params.chunk_size).await?;
            StageReport::generated(schema::CATEGORIES, target, existing, outcome)
        }
    };
    record(report, stage);

    let categories = queries::fetch_seed_categories(pool, target).await?;
    warn_if_short(schema::CATEGORIES, categories.len(), target);
    Ok(categories)
}

pub fn build_product(index: u64, rng: &mut dyn RngCore, params: &SeedParams) -> NewProduct {
    NewProduct {
        sku: SKUS.name(index),
        name: PRODUCT_NAMES.name(index),
        description: PRODUCT_DESCRIPTIONS.name(index),
        base_price: Money::from_cents(rng.random_range(params.price_range_cents())),
        stock_quantity: rng.random_range(params.stock_range()),
    }
}

pub async fn seed_products(
    pool: &SqlitePool,
    rng: &mut ChaCha8Rng,
    params: &SeedParams,
    report: &mut SeedReport,
) -> Result<Vec<ProductRef>, GenerationError> {
    let target = params.product_count;
    let existing = queries::count_seed_products(pool).await?;
    let stage = match StageDecision::for_counts(existing, target) {
        StageDecision::Reuse => StageReport::reused(schema::PRODUCTS, target, existing),
        StageDecision::Generate => {
            let rows: Vec<NewProduct> = (0..target)
                .map(|index| build_product(index, rng, params))
                .collect();
            let outcome = write_rows(pool, &rows, params.chunk_size).await?;
            StageReport::generated(schema::PRODUCTS, target, existing, outcome)
        }
    };
    record(report, stage);

    let products = queries::fetch_seed_products(pool, target).await?;
    warn_if_short(schema::PRODUCTS, products.len(), target);
    Ok(products)
}

/// Distinct random subset of one to three category ids.
pub fn sample_categories(rng: &mut dyn RngCore, category_ids: &[i64]) -> Vec<i64> {
    let upper = category_ids.len().min(MAX_CATEGORIES_PER_PRODUCT);
    if upper == 0 {
        return Vec::new();
    }
    let amount = rng.random_range(1..=upper);
    category_ids.choose_multiple(rng, amount).copied().collect()
}

/// Links every product lacking categories and returns the full
/// product → categories mapping.
///
/// On a fresh store the mapping is built in memory from the rows just
/// written. When links already exist the stored mapping is read once and
/// only the gaps are filled.
pub async fn link_products(
    pool: &SqlitePool,
    products: &[ProductRef],
    categories: &[CategoryRef],
    rng: &mut ChaCha8Rng,
    params: &SeedParams,
    report: &mut SeedReport,
) -> Result<HashMap<i64, Vec<i64>>, GenerationError> {
    let existing_links = queries::count_links(pool).await?;
    let mut mapping = if existing_links > 0 {
        queries::fetch_link_map(pool).await?
    } else {
        HashMap::new()
    };

    let target = products.len() as u64;
    let linked = products
        .iter()
        .filter(|product| mapping.get(&product.id).is_some_and(|ids| !ids.is_empty()))
        .count() as u64;

    let category_ids: Vec<i64> = categories.iter().map(|category| category.id).collect();
    let mut rows = Vec::new();
    if !category_ids.is_empty() {
        for product in products {
            if mapping.get(&product.id).is_some_and(|ids| !ids.is_empty()) {
                continue;
            }
            let selected = sample_categories(rng, &category_ids);
            rows.extend(selected.iter().map(|&category_id| ProductCategoryLink {
                product_id: product.id,
                category_id,
            }));
            mapping.insert(product.id, selected);
        }
    }

    let stage = if rows.is_empty() {
        StageReport::reused(schema::PRODUCT_CATEGORIES, target, linked)
    } else {
        let outcome = write_rows(pool, &rows, params.chunk_size).await?;
        StageReport::generated(schema::PRODUCT_CATEGORIES, target, linked, outcome)
    };
    record(report, stage);

    Ok(mapping)
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;

    use super::*;

    #[test]
    fn decides_reuse_when_target_met() {
        assert_eq!(StageDecision::for_counts(10, 10), StageDecision::Reuse);
        assert_eq!(StageDecision::for_counts(12, 10), StageDecision::Reuse);
        assert_eq!(StageDecision::for_counts(0, 0), StageDecision::Reuse);
        assert_eq!(StageDecision::for_counts(4, 10), StageDecision::Generate);
    }

    #[test]
    fn account_fields_follow_the_index() {
        let account = build_account(3);
        assert_eq!(account.username, "seed_user_00003");
        assert_eq!(account.email, "seed_user_00003@example.com");
        assert_eq!(account.first_name, "Seed");
        assert_eq!(account.last_name, "User00003");
    }

    #[test]
    fn product_price_and_stock_stay_in_bounds() {
        let params = SeedParams::default();
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for index in 0..500 {
            let product = build_product(index, &mut rng, &params);
            assert!((1_000..=100_000).contains(&product.base_price.cents()));
            assert!((5..=1000).contains(&product.stock_quantity));
            assert_eq!(product.sku, SKUS.name(index));
        }
    }

    #[test]
    fn samples_distinct_categories() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let ids: Vec<i64> = (1..=10).collect();
        for _ in 0..200 {
            let mut picked = sample_categories(&mut rng, &ids);
            assert!((1..=3).contains(&picked.len()));
            picked.sort_unstable();
            picked.dedup();
            assert!((1..=3).contains(&picked.len()));
            assert!(picked.iter().all(|id| ids.contains(id)));
        }
    }

    #[test]
    fn small_category_pools_cap_the_sample() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        assert_eq!(sample_categories(&mut rng, &[9]), vec![9]);
        assert!(sample_categories(&mut rng, &[]).is_empty());
    }
}
