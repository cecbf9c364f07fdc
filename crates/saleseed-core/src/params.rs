use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// Parameters for one seeding run.
///
/// Defaults match the volumes used for the ORM performance comparison:
/// 1000 resellers, 80 categories, 10k products and 100k sales.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeedParams {
    pub account_count: u64,
    pub category_count: u64,
    pub product_count: u64,
    pub sale_count: u64,
    pub min_items_per_sale: u32,
    pub max_items_per_sale: u32,
    pub chunk_size: usize,
    pub seed: u64,
    /// Delete every generated row before generating.
    pub reset: bool,
    pub price_min: f64,
    pub price_max: f64,
    pub stock_min: u32,
    pub stock_max: u32,
    pub quantity_min: u32,
    pub quantity_max: u32,
}

impl Default for SeedParams {
    fn default() -> Self {
        Self {
            account_count: 1000,
            category_count: 80,
            product_count: 10_000,
            sale_count: 100_000,
            min_items_per_sale: 2,
            max_items_per_sale: 4,
            chunk_size: 5000,
            seed: 42,
            reset: false,
            price_min: 10.0,
            price_max: 1000.0,
            stock_min: 5,
            stock_max: 1000,
            quantity_min: 1,
            quantity_max: 8,
        }
    }
}

impl SeedParams {
    pub fn validate(&self) -> Result<()> {
        if self.min_items_per_sale > self.max_items_per_sale {
            return Err(ConfigError::ItemsRange {
                min: self.min_items_per_sale,
                max: self.max_items_per_sale,
            });
        }
        if self.chunk_size == 0 {
            return Err(ConfigError::ZeroChunkSize);
        }
        if self.quantity_min == 0 || self.quantity_min > self.quantity_max {
            return Err(ConfigError::QuantityRange {
                min: self.quantity_min,
                max: self.quantity_max,
            });
        }
        if self.stock_min > self.stock_max {
            return Err(ConfigError::StockRange {
                min: self.stock_min,
                max: self.stock_max,
            });
        }
        if !self.price_min.is_finite()
            || !self.price_max.is_finite()
            || self.price_min < 0.0
            || self.price_min > self.price_max
        {
            return Err(ConfigError::PriceRange {
                min: self.price_min,
                max: self.price_max,
            });
        }
        if self.sale_count > 0 {
            if self.account_count == 0 {
                return Err(ConfigError::MissingPool("reseller"));
            }
            if self.product_count == 0 && self.max_items_per_sale > 0 {
                return Err(ConfigError::MissingPool("product"));
            }
            if self.category_count == 0 && self.max_items_per_sale > 0 {
                return Err(ConfigError::MissingPool("category"));
            }
        }
        Ok(())
    }

    /// Base price bounds in cents, rounded half-up.
    pub fn price_range_cents(&self) -> RangeInclusive<i64> {
        to_cents(self.price_min)..=to_cents(self.price_max)
    }

    pub fn items_range(&self) -> RangeInclusive<u32> {
        self.min_items_per_sale..=self.max_items_per_sale
    }

    pub fn quantity_range(&self) -> RangeInclusive<u32> {
        self.quantity_min..=self.quantity_max
    }

    pub fn stock_range(&self) -> RangeInclusive<u32> {
        self.stock_min..=self.stock_max
    }
}

fn to_cents(value: f64) -> i64 {
    (value * 100.0).round() as i64
}
