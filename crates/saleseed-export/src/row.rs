use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDateTime, Timelike};
use saleseed_core::Money;

use crate::errors::ExportError;

pub const HEADER: [&str; 9] = [
    "sale_id",
    "sale_date",
    "reseller_username",
    "product_sku",
    "product_name",
    "item_category",
    "quantity",
    "unit_price",
    "line_total",
];

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Sale timestamp as stored, with or without an offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaleDate {
    Aware(DateTime<FixedOffset>),
    Naive(NaiveDateTime),
}

impl SaleDate {
    pub fn parse(value: &str) -> Option<Self> {
        if let Ok(aware) = DateTime::parse_from_rfc3339(value) {
            return Some(SaleDate::Aware(aware));
        }
        NAIVE_FORMATS
            .iter()
            .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
            .map(SaleDate::Naive)
    }

    /// ISO 8601, microseconds only when non-zero.
    pub fn render(&self) -> String {
        match self {
            SaleDate::Aware(value) if value.nanosecond() == 0 => {
                value.format("%Y-%m-%dT%H:%M:%S%:z").to_string()
            }
            SaleDate::Aware(value) => value.format("%Y-%m-%dT%H:%M:%S%.6f%:z").to_string(),
            SaleDate::Naive(value) if value.nanosecond() == 0 => {
                value.format("%Y-%m-%dT%H:%M:%S").to_string()
            }
            SaleDate::Naive(value) => value.format("%Y-%m-%dT%H:%M:%S%.6f").to_string(),
        }
    }
}

impl fmt::Display for SaleDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// One line of the denormalized report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRow {
    pub sale_id: i64,
    pub sale_date: SaleDate,
    pub reseller_username: String,
    pub product_sku: String,
    pub product_name: String,
    pub item_category: String,
    pub quantity: i64,
    pub unit_price: Money,
    pub line_total: Money,
}

/// Joined columns as read from the store.
#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct JoinedRow {
    pub sale_id: i64,
    pub sold_at: String,
    pub reseller_username: String,
    pub product_sku: String,
    pub product_name: String,
    pub item_category: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub line_total_cents: i64,
}

impl ReportRow {
    pub fn to_record(&self) -> [String; 9] {
        [
            self.sale_id.to_string(),
            self.sale_date.render(),
            self.reseller_username.clone(),
            self.product_sku.clone(),
            self.product_name.clone(),
            self.item_category.clone(),
            self.quantity.to_string(),
            self.unit_price.to_string(),
            self.line_total.to_string(),
        ]
    }
}

pub(crate) fn parse_sale_date(sale_id: i64, value: &str) -> Result<SaleDate, ExportError> {
    SaleDate::parse(value).ok_or_else(|| ExportError::Timestamp {
        sale_id,
        value: value.to_string(),
    })
}

impl TryFrom<JoinedRow> for ReportRow {
    type Error = ExportError;

    fn try_from(row: JoinedRow) -> Result<Self, Self::Error> {
        Ok(ReportRow {
            sale_id: row.sale_id,
            sale_date: parse_sale_date(row.sale_id, &row.sold_at)?,
            reseller_username: row.reseller_username,
            product_sku: row.product_sku,
            product_name: row.product_name,
            item_category: row.item_category,
            quantity: row.quantity,
            unit_price: Money::from_cents(row.unit_price_cents),
            line_total: Money::from_cents(row.line_total_cents),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(value: &str) -> String {
        SaleDate::parse(value).map(|date| date.render()).unwrap_or_default()
    }

    #[test]
    fn aware_timestamps_keep_offset() {
        assert_eq!(
            render("2024-05-01T10:20:30.123456+00:00"),
            "2024-05-01T10:20:30.123456+00:00"
        );
        assert_eq!(render("2024-05-01T10:20:30+02:00"), "2024-05-01T10:20:30+02:00");
        assert_eq!(render("2024-05-01T10:20:30.000000+00:00"), "2024-05-01T10:20:30+00:00");
        assert_eq!(render("2024-05-01T10:20:30Z"), "2024-05-01T10:20:30+00:00");
    }

    #[test]
    fn naive_timestamps_have_no_offset() {
        assert_eq!(render("2024-05-01 10:20:30"), "2024-05-01T10:20:30");
        assert_eq!(render("2024-05-01T10:20:30.5"), "2024-05-01T10:20:30.500000");
    }

    #[test]
    fn unreadable_timestamps_are_rejected() {
        assert!(SaleDate::parse("yesterday").is_none());
        assert!(matches!(
            parse_sale_date(4, "yesterday"),
            Err(ExportError::Timestamp { sale_id: 4, .. })
        ));
    }

    #[test]
    fn record_renders_money_with_two_places() {
        let row = ReportRow {
            sale_id: 12,
            sale_date: SaleDate::parse("2024-01-02T03:04:05+00:00").unwrap(),
            reseller_username: "seed_user_00001".to_string(),
            product_sku: "SKU-000003".to_string(),
            product_name: "Product 000003".to_string(),
            item_category: "Category 002".to_string(),
            quantity: 3,
            unit_price: Money::from_cents(1_000),
            line_total: Money::from_cents(3_000),
        };
        assert_eq!(
            row.to_record(),
            [
                "12",
                "2024-01-02T03:04:05+00:00",
                "seed_user_00001",
                "SKU-000003",
                "Product 000003",
                "Category 002",
                "3",
                "10.00",
                "30.00",
            ]
        );
    }
}
