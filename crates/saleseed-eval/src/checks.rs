use futures::TryStreamExt;
use rust_decimal::Decimal;
use saleseed_core::Money;
use saleseed_store::Store;
use saleseed_store::queries::entity_counts;
use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::errors::EvalError;
use crate::model::{CheckSummary, DatasetReport, Violation};

/// Offending lines kept per check for the report.
pub const MAX_EXAMPLES: usize = 5;

const LINES_OUTSIDE_PRODUCT_CATEGORIES: &str = r"
SELECT si.id
FROM sale_items si
WHERE EXISTS (SELECT 1 FROM product_categories pc WHERE pc.product_id = si.product_id)
  AND NOT EXISTS (
    SELECT 1 FROM product_categories pc
    WHERE pc.product_id = si.product_id AND pc.category_id = si.category_id
  )
ORDER BY si.id
";

const LINE_TOTAL_MISMATCHES: &str = r"
SELECT id FROM sale_items
WHERE line_total_cents <> unit_price_cents * quantity
ORDER BY id
";

const NON_POSITIVE_QUANTITIES: &str = "SELECT id FROM sale_items WHERE quantity < 1 ORDER BY id";

const ORPHAN_SALE_ITEMS: &str = r"
SELECT si.id
FROM sale_items si
LEFT JOIN sales s ON s.id = si.sale_id
LEFT JOIN products p ON p.id = si.product_id
LEFT JOIN categories c ON c.id = si.category_id
WHERE s.id IS NULL OR p.id IS NULL OR c.id IS NULL
ORDER BY si.id
";

const PRICED_LINES: &str = r"
SELECT si.id, si.unit_price_cents, p.base_price_cents
FROM sale_items si
JOIN products p ON p.id = si.product_id
ORDER BY si.id
";

fn lower_multiplier() -> Decimal {
    Decimal::new(8_500, 4)
}

fn upper_multiplier() -> Decimal {
    Decimal::new(12_000, 4)
}

/// Whether `unit` lies in the band a sale line may be priced at.
pub fn within_band(base: Money, unit: Money) -> bool {
    unit >= base.scale_by(lower_multiplier()) && unit <= base.scale_by(upper_multiplier())
}

/// Counts rows returned by `query`, keeping the first few ids as examples.
async fn count_offenders(
    pool: &SqlitePool,
    code: &str,
    message: &str,
    query: &'static str,
    examples: &mut Vec<Violation>,
) -> Result<u64, EvalError> {
    let mut rows = sqlx::query_scalar::<_, i64>(query).fetch(pool);
    let mut count = 0u64;
    while let Some(sale_item_id) = rows.try_next().await? {
        if (count as usize) < MAX_EXAMPLES {
            examples.push(Violation {
                code: code.to_string(),
                sale_item_id,
                message: message.to_string(),
            });
        }
        count += 1;
    }
    Ok(count)
}

async fn price_band_offenders(
    pool: &SqlitePool,
    examples: &mut Vec<Violation>,
) -> Result<(u64, u64), EvalError> {
    let mut rows = sqlx::query_as::<_, (i64, i64, i64)>(PRICED_LINES).fetch(pool);
    let mut checked = 0u64;
    let mut outside = 0u64;
    while let Some((sale_item_id, unit_cents, base_cents)) = rows.try_next().await? {
        checked += 1;
        let base = Money::from_cents(base_cents);
        let unit = Money::from_cents(unit_cents);
        if within_band(base, unit) {
            continue;
        }
        if (outside as usize) < MAX_EXAMPLES {
            examples.push(Violation {
                code: "unit_price_outside_band".to_string(),
                sale_item_id,
                message: format!("unit price {unit} outside band of base price {base}"),
            });
        }
        outside += 1;
    }
    Ok((checked, outside))
}

/// Runs every consistency check against `store`.
pub async fn evaluate(store: &Store) -> Result<DatasetReport, EvalError> {
    let pool = store.pool();
    let counts = entity_counts(pool).await?;
    let mut examples = Vec::new();

    let mut checks = CheckSummary {
        lines_outside_product_categories: count_offenders(
            pool,
            "lines_outside_product_categories",
            "category not linked to product",
            LINES_OUTSIDE_PRODUCT_CATEGORIES,
            &mut examples,
        )
        .await?,
        line_total_mismatches: count_offenders(
            pool,
            "line_total_mismatches",
            "line total differs from unit price times quantity",
            LINE_TOTAL_MISMATCHES,
            &mut examples,
        )
        .await?,
        non_positive_quantities: count_offenders(
            pool,
            "non_positive_quantities",
            "quantity below one",
            NON_POSITIVE_QUANTITIES,
            &mut examples,
        )
        .await?,
        orphan_sale_items: count_offenders(
            pool,
            "orphan_sale_items",
            "missing sale, product or category",
            ORPHAN_SALE_ITEMS,
            &mut examples,
        )
        .await?,
        unit_price_outside_band: 0,
    };
    let (sale_items_checked, outside) = price_band_offenders(pool, &mut examples).await?;
    checks.unit_price_outside_band = outside;

    let report = DatasetReport {
        counts,
        checks,
        sale_items_checked,
        examples,
    };
    if report.is_clean() {
        info!(
            event = "verify_finished",
            sale_items = report.sale_items_checked,
            violations = 0
        );
    } else {
        warn!(
            event = "verify_finished",
            sale_items = report.sale_items_checked,
            violations = report.violations()
        );
    }
    Ok(report)
}
