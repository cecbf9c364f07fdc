use saleseed_store::EntityCounts;
use serde::{Deserialize, Serialize};

use crate::errors::EvalError;

/// Violation counts per check.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckSummary {
    /// Lines whose category is not linked to their product. Products without
    /// any link accept every category.
    pub lines_outside_product_categories: u64,
    pub line_total_mismatches: u64,
    pub non_positive_quantities: u64,
    pub orphan_sale_items: u64,
    /// Unit prices outside `[base × 0.85, base × 1.20]`.
    pub unit_price_outside_band: u64,
}

impl CheckSummary {
    pub fn entries(&self) -> [(&'static str, u64); 5] {
        [
            (
                "lines_outside_product_categories",
                self.lines_outside_product_categories,
            ),
            ("line_total_mismatches", self.line_total_mismatches),
            ("non_positive_quantities", self.non_positive_quantities),
            ("orphan_sale_items", self.orphan_sale_items),
            ("unit_price_outside_band", self.unit_price_outside_band),
        ]
    }

    pub fn total(&self) -> u64 {
        self.entries().iter().map(|(_, count)| count).sum()
    }
}

/// Example of an offending sale line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    pub code: String,
    pub sale_item_id: i64,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetReport {
    pub counts: EntityCounts,
    pub checks: CheckSummary,
    pub sale_items_checked: u64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub examples: Vec<Violation>,
}

impl DatasetReport {
    pub fn violations(&self) -> u64 {
        self.checks.total()
    }

    pub fn is_clean(&self) -> bool {
        self.violations() == 0
    }

    /// Turn a report with violations into an error.
    pub fn ensure_clean(&self) -> Result<(), EvalError> {
        match self.violations() {
            0 => Ok(()),
            count => Err(EvalError::Violations(count)),
        }
    }
}
