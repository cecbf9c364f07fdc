use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;

/// Sales region assigned to a reseller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Region {
    North,
    South,
    East,
    West,
    Central,
}

impl Region {
    pub const ALL: [Region; 5] = [
        Region::North,
        Region::South,
        Region::East,
        Region::West,
        Region::Central,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Region::North => "North",
            Region::South => "South",
            Region::East => "East",
            Region::West => "West",
            Region::Central => "Central",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Login account backing a reseller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAccount {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewReseller {
    pub account_id: i64,
    pub company_name: String,
    pub region: Region,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCategory {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProduct {
    pub sku: String,
    pub name: String,
    pub description: String,
    pub base_price: Money,
    pub stock_quantity: u32,
}

/// One row of the product/category association.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProductCategoryLink {
    pub product_id: i64,
    pub category_id: i64,
}

/// A sale event recorded by one reseller. Immutable after insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSale {
    pub reseller_id: i64,
    pub sold_at: DateTime<Utc>,
}

/// One product line of a sale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSaleItem {
    pub sale_id: i64,
    pub product_id: i64,
    pub category_id: i64,
    pub quantity: u32,
    pub unit_price: Money,
    pub line_total: Money,
}

impl NewSaleItem {
    /// Build a line whose total is `unit_price × quantity`.
    pub fn new(
        sale_id: i64,
        product_id: i64,
        category_id: i64,
        quantity: u32,
        unit_price: Money,
    ) -> Self {
        Self::with_line_total(sale_id, product_id, category_id, quantity, unit_price, Money::ZERO)
    }

    /// Build a line with an explicit total. A zero total is treated as
    /// missing and derived from the unit price.
    pub fn with_line_total(
        sale_id: i64,
        product_id: i64,
        category_id: i64,
        quantity: u32,
        unit_price: Money,
        line_total: Money,
    ) -> Self {
        let line_total = if line_total.is_zero() {
            unit_price.times(quantity)
        } else {
            line_total
        };
        Self {
            sale_id,
            product_id,
            category_id,
            quantity,
            unit_price,
            line_total,
        }
    }
}
