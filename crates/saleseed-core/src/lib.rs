//! Core contracts for saleseed.
//!
//! This crate defines the entity records written by the generator, the
//! fixed-point money type, and the validated run parameters shared by the
//! store, generator, export and CLI crates.

pub mod error;
pub mod model;
pub mod money;
pub mod params;

pub use error::{ConfigError, Result};
pub use model::{
    NewAccount, NewCategory, NewProduct, NewReseller, NewSale, NewSaleItem, ProductCategoryLink,
    Region,
};
pub use money::{Money, round_half_up};
pub use params::SeedParams;

/// Username prefix that marks accounts owned by the seeder.
pub const SEED_ACCOUNT_PREFIX: &str = "seed_user_";
/// Name prefix of generated categories.
pub const SEED_CATEGORY_PREFIX: &str = "Category ";
/// SKU prefix of generated products.
pub const SEED_SKU_PREFIX: &str = "SKU-";
