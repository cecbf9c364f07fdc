use std::time::Instant;

use chrono::{DateTime, Utc};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use saleseed_core::SeedParams;
use saleseed_store::{Store, queries};
use tracing::{info, warn};

use crate::errors::GenerationError;
use crate::facts::{ReferencePools, seed_sales};
use crate::model::SeedReport;
use crate::stages;

/// Entry point for seeding a store.
#[derive(Debug, Clone)]
pub struct SeedEngine {
    params: SeedParams,
    now: Option<DateTime<Utc>>,
}

impl SeedEngine {
    pub fn new(params: SeedParams) -> Self {
        Self { params, now: None }
    }

    /// Pin the clock sale timestamps are drawn back from.
    pub fn with_clock(mut self, now: DateTime<Utc>) -> Self {
        self.now = Some(now);
        self
    }

    /// Runs every stage in dependency order.
    ///
    /// Parameters are validated before anything is written. Sale chunks that
    /// committed before a failure stay in the store; the returned
    /// [`GenerationError::Failed`] carries the progress made.
    pub async fn run(&self, store: &Store) -> Result<SeedReport, GenerationError> {
        self.params.validate()?;

        let start = Instant::now();
        let run_id = uuid::Uuid::new_v4().to_string();
        let mut report = SeedReport::new(run_id.clone(), self.params.seed);
        let mut rng = ChaCha8Rng::seed_from_u64(self.params.seed);

        info!(
            event = "seed_started",
            run_id = %run_id,
            seed = self.params.seed,
            accounts = self.params.account_count,
            products = self.params.product_count,
            sales = self.params.sale_count,
            chunk_size = self.params.chunk_size,
            reset = self.params.reset
        );

        let outcome = self.run_stages(store, &mut rng, &mut report).await;
        report.duration_ms = start.elapsed().as_millis() as u64;

        match outcome {
            Ok(()) => {
                info!(
                    event = "seed_finished",
                    run_id = %run_id,
                    chunks = report.chunks_completed,
                    sales_created = report.sales_created,
                    sale_items_created = report.sale_items_created,
                    duration_ms = report.duration_ms
                );
                Ok(report)
            }
            Err(err) => {
                warn!(
                    event = "seed_failed",
                    run_id = %run_id,
                    chunks = report.chunks_completed,
                    error = %err
                );
                Err(GenerationError::Failed {
                    report: Box::new(report),
                    source: Box::new(err),
                })
            }
        }
    }

    async fn run_stages(
        &self,
        store: &Store,
        rng: &mut ChaCha8Rng,
        report: &mut SeedReport,
    ) -> Result<(), GenerationError> {
        let pool = store.pool();
        let params = &self.params;

        if params.reset {
            report.reset = Some(queries::reset(pool).await?);
        }

        let accounts = stages::seed_accounts(pool, params, report).await?;
        let resellers = stages::seed_resellers(pool, &accounts, rng, params, report).await?;
        let categories = stages::seed_categories(pool, params, report).await?;
        let products = stages::seed_products(pool, rng, params, report).await?;
        let links =
            stages::link_products(pool, &products, &categories, rng, params, report).await?;

        let pools = ReferencePools::new(
            resellers.iter().map(|reseller| reseller.id).collect(),
            &products,
            categories.iter().map(|category| category.id).collect(),
            links,
        );
        let now = self.now.unwrap_or_else(Utc::now);
        seed_sales(pool, &pools, params, now, rng, report).await
    }
}
