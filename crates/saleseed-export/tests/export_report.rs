use std::io::{self, Write};

use anyhow::{Context, Result};
use chrono::{TimeZone, Utc};
use saleseed_core::SeedParams;
use saleseed_export::{
    ExportError, ExportStrategy, HEADER, export, export_naive, export_optimized,
};
use saleseed_generate::SeedEngine;
use saleseed_store::Store;

async fn temp_store(label: &str) -> Result<Store> {
    let mut path = std::env::temp_dir();
    path.push(format!("saleseed_export_{label}_{}.db", uuid::Uuid::new_v4()));
    let url = format!("sqlite://{}", path.display());
    Store::connect(&url, 2).await.context("opening temp store")
}

fn example_params() -> SeedParams {
    SeedParams {
        account_count: 10,
        category_count: 5,
        product_count: 20,
        sale_count: 50,
        min_items_per_sale: 2,
        max_items_per_sale: 3,
        chunk_size: 10,
        seed: 1,
        ..SeedParams::default()
    }
}

async fn seeded_store(label: &str) -> Result<Store> {
    let store = temp_store(label).await?;
    let clock = Utc
        .with_ymd_and_hms(2024, 5, 1, 10, 20, 30)
        .single()
        .context("clock")?;
    let engine = SeedEngine::new(example_params()).with_clock(clock);
    engine.run(&store).await?;
    let rerun = engine.run(&store).await?;
    assert_eq!(rerun.rows_created(), 0);
    Ok(store)
}

/// Accepts `limit` bytes, then fails like a closed pipe.
struct ClosingPipe {
    accepted: usize,
    limit: usize,
}

impl Write for ClosingPipe {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.accepted + buf.len() > self.limit {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "reader went away"));
        }
        self.accepted += buf.len();
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[tokio::test]
async fn strategies_produce_identical_bytes() -> Result<()> {
    let store = seeded_store("identical").await?;

    let mut naive = Vec::new();
    let naive_stats = export_naive(&store, &mut naive).await?;
    let mut optimized = Vec::new();
    let optimized_stats = export_optimized(&store, &mut optimized, 5000).await?;

    assert_eq!(naive, optimized);
    assert_eq!(naive_stats.rows, optimized_stats.rows);
    assert_eq!(naive_stats.bytes_written, naive.len() as u64);
    assert_eq!(optimized_stats.bytes_written, optimized.len() as u64);
    assert!((100..=150).contains(&optimized_stats.rows));

    assert_eq!(optimized_stats.round_trips, 1);
    assert_eq!(naive_stats.round_trips, 1 + 3 * 50 + 2 * naive_stats.rows);
    assert!((2..=3).contains(&naive_stats.peak_buffered_rows));
    assert!(naive.ends_with(b"\r\n"));
    Ok(())
}

#[tokio::test]
async fn report_rows_are_ordered_and_priced() -> Result<()> {
    let store = seeded_store("ordered").await?;
    let mut buffer = Vec::new();
    export_optimized(&store, &mut buffer, 5000).await?;

    let mut reader = csv::Reader::from_reader(buffer.as_slice());
    let header: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    assert_eq!(header, HEADER);

    let mut last_sale = 0i64;
    let mut rows = 0;
    for record in reader.records() {
        let record = record?;
        let sale_id: i64 = record[0].parse()?;
        assert!(sale_id >= last_sale);
        last_sale = sale_id;
        assert!(record[1].ends_with("+00:00"));
        assert!(record[2].starts_with("seed_user_"));
        assert!(record[3].starts_with("SKU-"));
        assert!(record[5].starts_with("Category "));

        let quantity: i64 = record[6].parse()?;
        let unit: f64 = record[7].parse()?;
        let total: f64 = record[8].parse()?;
        assert!((8.50..=1200.00).contains(&unit), "unit price {unit}");
        assert_eq!(record[7].split('.').nth(1).map(str::len), Some(2));
        assert!((total - unit * quantity as f64).abs() < 0.005);
        rows += 1;
    }
    assert!((100..=150).contains(&rows));
    Ok(())
}

#[tokio::test]
async fn pages_never_exceed_chunk_size() -> Result<()> {
    let store = seeded_store("paged").await?;
    let mut small = Vec::new();
    let stats = export_optimized(&store, &mut small, 7).await?;

    assert!(stats.peak_buffered_rows <= 7);
    assert_eq!(stats.pages, stats.rows.div_ceil(7));

    let mut whole = Vec::new();
    export_optimized(&store, &mut whole, 5000).await?;
    assert_eq!(small, whole);
    Ok(())
}

#[tokio::test]
async fn naive_timestamps_render_without_offset() -> Result<()> {
    let store = seeded_store("naive_ts").await?;
    sqlx::query("UPDATE sales SET sold_at = '2024-02-03 04:05:06' WHERE id = 1")
        .execute(store.pool())
        .await?;

    let mut naive = Vec::new();
    export(&store, ExportStrategy::Naive, &mut naive, 5000).await?;
    let mut optimized = Vec::new();
    export(&store, ExportStrategy::Optimized, &mut optimized, 5000).await?;
    assert_eq!(naive, optimized);

    let text = String::from_utf8(optimized)?;
    let first = text.lines().nth(1).context("no data rows")?;
    assert!(first.starts_with("1,2024-02-03T04:05:06,"), "{first}");
    Ok(())
}

#[tokio::test]
async fn empty_store_exports_only_the_header() -> Result<()> {
    let store = temp_store("empty").await?;
    let mut naive = Vec::new();
    let stats = export_naive(&store, &mut naive).await?;
    let mut optimized = Vec::new();
    export_optimized(&store, &mut optimized, 10).await?;

    assert_eq!(stats.rows, 0);
    assert_eq!(naive, optimized);
    assert_eq!(String::from_utf8(naive)?.trim_end(), HEADER.join(","));
    Ok(())
}

#[tokio::test]
async fn failing_writer_stops_the_export() -> Result<()> {
    let store = seeded_store("closed_pipe").await?;

    let err = export_optimized(&store, ClosingPipe { accepted: 0, limit: 512 }, 5)
        .await
        .expect_err("closed pipe must fail the export");
    assert!(err.is_output(), "{err}");

    let err = export_naive(&store, ClosingPipe { accepted: 0, limit: 512 })
        .await
        .expect_err("closed pipe must fail the export");
    assert!(err.is_output(), "{err}");
    Ok(())
}

#[tokio::test]
async fn zero_chunk_size_is_rejected() -> Result<()> {
    let store = temp_store("zero_chunk").await?;
    let err = export_optimized(&store, Vec::new(), 0)
        .await
        .expect_err("zero chunk size");
    assert!(matches!(err, ExportError::Config(_)));
    Ok(())
}
