use std::collections::{HashMap, HashSet};

use anyhow::{Context, Result};
use chrono::{DateTime, TimeZone, Utc};
use saleseed_core::{ConfigError, SeedParams};
use saleseed_generate::{GenerationError, SeedEngine};
use saleseed_store::Store;
use saleseed_store::queries::entity_counts;

async fn temp_store(label: &str) -> Result<Store> {
    let mut path = std::env::temp_dir();
    path.push(format!("saleseed_generate_{label}_{}.db", uuid::Uuid::new_v4()));
    let url = format!("sqlite://{}", path.display());
    Store::connect(&url, 2).await.context("opening temp store")
}

fn clock() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 15, 9, 30, 0)
        .single()
        .expect("valid clock")
}

fn small_params() -> SeedParams {
    SeedParams {
        account_count: 3,
        category_count: 2,
        product_count: 4,
        sale_count: 5,
        min_items_per_sale: 2,
        max_items_per_sale: 2,
        chunk_size: 2,
        seed: 42,
        ..SeedParams::default()
    }
}

async fn link_map(store: &Store) -> Result<HashMap<i64, HashSet<i64>>> {
    let rows = sqlx::query_as::<_, (i64, i64)>(
        "SELECT product_id, category_id FROM product_categories",
    )
    .fetch_all(store.pool())
    .await?;
    let mut mapping: HashMap<i64, HashSet<i64>> = HashMap::new();
    for (product_id, category_id) in rows {
        mapping.entry(product_id).or_default().insert(category_id);
    }
    Ok(mapping)
}

#[tokio::test]
async fn small_run_builds_a_consistent_dataset() -> Result<()> {
    let store = temp_store("small").await?;
    let report = SeedEngine::new(small_params())
        .with_clock(clock())
        .run(&store)
        .await?;

    let counts = entity_counts(store.pool()).await?;
    assert_eq!(counts.accounts, 3);
    assert_eq!(counts.resellers, 3);
    assert_eq!(counts.categories, 2);
    assert_eq!(counts.products, 4);
    assert_eq!(counts.sales, 5);
    assert_eq!(counts.sale_items, 10);
    assert_eq!(report.chunks_completed, 3);
    assert_eq!(report.sales_created, 5);
    assert_eq!(report.sale_items_created, 10);

    let links = link_map(&store).await?;
    assert_eq!(links.len(), 4);
    assert!(links.values().all(|ids| (1..=2).contains(&ids.len())));

    let items = sqlx::query_as::<_, (i64, i64)>("SELECT product_id, category_id FROM sale_items")
        .fetch_all(store.pool())
        .await?;
    for (product_id, category_id) in items {
        assert!(links[&product_id].contains(&category_id));
    }

    let regions = sqlx::query_scalar::<_, String>("SELECT region FROM resellers")
        .fetch_all(store.pool())
        .await?;
    assert!(
        regions
            .iter()
            .all(|region| ["North", "South", "East", "West", "Central"].contains(&region.as_str()))
    );
    Ok(())
}

#[tokio::test]
async fn second_run_creates_nothing() -> Result<()> {
    let store = temp_store("idempotent").await?;
    let engine = SeedEngine::new(small_params()).with_clock(clock());
    engine.run(&store).await?;
    let before = entity_counts(store.pool()).await?;

    let report = engine.run(&store).await?;
    assert_eq!(report.rows_created(), 0);
    assert_eq!(report.chunks_completed, 0);
    assert!(report.stages.iter().all(|stage| stage.reused));
    assert_eq!(entity_counts(store.pool()).await?, before);
    Ok(())
}

#[tokio::test]
async fn raising_targets_tops_up_missing_rows() -> Result<()> {
    let store = temp_store("resume").await?;
    SeedEngine::new(small_params())
        .with_clock(clock())
        .run(&store)
        .await?;

    let params = SeedParams {
        account_count: 5,
        product_count: 6,
        sale_count: 8,
        ..small_params()
    };
    let report = SeedEngine::new(params).with_clock(clock()).run(&store).await?;

    let counts = entity_counts(store.pool()).await?;
    assert_eq!(counts.accounts, 5);
    assert_eq!(counts.resellers, 5);
    assert_eq!(counts.products, 6);
    assert_eq!(counts.sales, 8);
    assert_eq!(report.sales_created, 3);
    assert_eq!(report.stage("accounts").map(|stage| stage.created), Some(2));
    assert_eq!(report.stage("categories").map(|stage| stage.reused), Some(true));

    let links = link_map(&store).await?;
    assert_eq!(links.len(), 6);
    Ok(())
}

#[tokio::test]
async fn line_amounts_are_rounded_consistently() -> Result<()> {
    let store = temp_store("money").await?;
    let params = SeedParams {
        sale_count: 40,
        min_items_per_sale: 1,
        max_items_per_sale: 4,
        chunk_size: 16,
        ..small_params()
    };
    SeedEngine::new(params).with_clock(clock()).run(&store).await?;

    let rows = sqlx::query_as::<_, (i64, i64, i64, i64)>(
        r"
        SELECT si.quantity, si.unit_price_cents, si.line_total_cents, p.base_price_cents
        FROM sale_items si
        JOIN products p ON p.id = si.product_id
        ",
    )
    .fetch_all(store.pool())
    .await?;
    assert!(!rows.is_empty());
    for (quantity, unit, total, base) in rows {
        assert!((1..=8).contains(&quantity));
        assert_eq!(total, unit * quantity);
        let low = (base * 85 + 50) / 100;
        let high = (base * 120 + 50) / 100;
        assert!(unit >= low && unit <= high, "{unit} outside [{low}, {high}]");
    }
    Ok(())
}

#[tokio::test]
async fn same_seed_and_clock_reproduce_the_dataset() -> Result<()> {
    async fn snapshot(store: &Store) -> Result<Vec<(String, i64, i64, i64, i64)>> {
        Ok(sqlx::query_as::<_, (String, i64, i64, i64, i64)>(
            r"
            SELECT s.sold_at, si.product_id, si.category_id, si.quantity, si.unit_price_cents
            FROM sale_items si
            JOIN sales s ON s.id = si.sale_id
            ORDER BY si.id
            ",
        )
        .fetch_all(store.pool())
        .await?)
    }

    let first = temp_store("determinism_a").await?;
    let second = temp_store("determinism_b").await?;
    SeedEngine::new(small_params()).with_clock(clock()).run(&first).await?;
    SeedEngine::new(small_params()).with_clock(clock()).run(&second).await?;

    assert_eq!(snapshot(&first).await?, snapshot(&second).await?);
    Ok(())
}

#[tokio::test]
async fn reset_rebuilds_from_scratch() -> Result<()> {
    let store = temp_store("reset").await?;
    SeedEngine::new(small_params()).with_clock(clock()).run(&store).await?;

    let params = SeedParams {
        reset: true,
        ..small_params()
    };
    let report = SeedEngine::new(params).with_clock(clock()).run(&store).await?;

    let summary = report.reset.context("reset summary missing")?;
    assert_eq!(summary.sales, 5);
    assert_eq!(summary.accounts, 3);
    assert_eq!(report.sales_created, 5);
    assert_eq!(entity_counts(store.pool()).await?.sale_items, 10);
    Ok(())
}

#[tokio::test]
async fn invalid_parameters_fail_before_writing() -> Result<()> {
    let store = temp_store("invalid").await?;
    let params = SeedParams {
        min_items_per_sale: 5,
        max_items_per_sale: 2,
        ..small_params()
    };
    let err = SeedEngine::new(params)
        .run(&store)
        .await
        .expect_err("items range must be rejected");
    assert!(matches!(
        err,
        GenerationError::Config(ConfigError::ItemsRange { min: 5, max: 2 })
    ));
    assert!(entity_counts(store.pool()).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn allocation_mismatch_aborts_without_partial_chunk() -> Result<()> {
    let store = temp_store("integrity").await?;
    // A foreign writer slipping a row into the second sale chunk.
    sqlx::query(
        r"
        CREATE TRIGGER intruder AFTER INSERT ON sales
        WHEN NEW.id = 3
        BEGIN
          INSERT INTO sales (reseller_id, sold_at) VALUES (NEW.reseller_id, NEW.sold_at);
        END
        ",
    )
    .execute(store.pool())
    .await?;

    let err = SeedEngine::new(small_params())
        .with_clock(clock())
        .run(&store)
        .await
        .expect_err("mismatch must abort the run");
    assert!(err.is_integrity());
    let report = err.report().context("progress missing")?;
    assert_eq!(report.chunks_completed, 1);
    assert_eq!(report.sales_created, 2);

    let counts = entity_counts(store.pool()).await?;
    assert_eq!(counts.sales, 2);
    assert_eq!(counts.sale_items, 4);
    let orphans = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM sales s WHERE NOT EXISTS (SELECT 1 FROM sale_items si WHERE si.sale_id = s.id)",
    )
    .fetch_one(store.pool())
    .await?;
    assert_eq!(orphans, 0);
    Ok(())
}

#[tokio::test]
async fn rerun_fills_gaps_left_by_deleted_rows() -> Result<()> {
    let store = temp_store("gaps").await?;
    let params = SeedParams {
        account_count: 4,
        ..small_params()
    };
    let engine = SeedEngine::new(params).with_clock(clock());
    engine.run(&store).await?;

    sqlx::query("DELETE FROM sale_items").execute(store.pool()).await?;
    sqlx::query("DELETE FROM sales").execute(store.pool()).await?;
    sqlx::query("DELETE FROM accounts WHERE username = 'seed_user_00001'")
        .execute(store.pool())
        .await?;
    let counts = entity_counts(store.pool()).await?;
    assert_eq!(counts.accounts, 3);
    assert_eq!(counts.resellers, 3);

    let report = engine.run(&store).await?;
    assert_eq!(report.stage("accounts").map(|stage| stage.created), Some(1));
    assert_eq!(report.stage("resellers").map(|stage| stage.created), Some(1));

    let counts = entity_counts(store.pool()).await?;
    assert_eq!(counts.accounts, 4);
    assert_eq!(counts.resellers, 4);
    assert_eq!(counts.sales, 5);
    let restored = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM accounts WHERE username = 'seed_user_00001'",
    )
    .fetch_one(store.pool())
    .await?;
    assert_eq!(restored, 1);
    Ok(())
}

#[tokio::test]
async fn run_can_be_spawned_on_the_runtime() -> Result<()> {
    let store = temp_store("spawned").await?;
    let task_store = store.clone();
    let handle = tokio::spawn(async move {
        SeedEngine::new(small_params())
            .with_clock(clock())
            .run(&task_store)
            .await
    });
    let report = handle.await??;
    assert_eq!(report.sales_created, 5);
    assert_eq!(entity_counts(store.pool()).await?.sales, 5);
    Ok(())
}
