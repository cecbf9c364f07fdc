use crate::model::DatasetReport;

/// Render a deterministic markdown summary of a verification run.
pub fn render_report(report: &DatasetReport, max_examples: usize) -> String {
    let mut lines = Vec::new();

    lines.push("# Saleseed Verification Report".to_string());
    lines.push(String::new());
    lines.push("## Row counts".to_string());
    lines.push("| table | rows |".to_string());
    lines.push("| --- | --- |".to_string());
    let counts = &report.counts;
    for (table, rows) in [
        ("accounts", counts.accounts),
        ("resellers", counts.resellers),
        ("categories", counts.categories),
        ("products", counts.products),
        ("product_categories", counts.product_categories),
        ("sales", counts.sales),
        ("sale_items", counts.sale_items),
    ] {
        lines.push(format!("| {table} | {rows} |"));
    }
    lines.push(String::new());

    lines.push("## Checks".to_string());
    lines.push(format!("- sale_items checked: {}", report.sale_items_checked));
    lines.push("| check | violations |".to_string());
    lines.push("| --- | --- |".to_string());
    for (name, count) in report.checks.entries() {
        lines.push(format!("| {name} | {count} |"));
    }
    lines.push(String::new());

    if !report.examples.is_empty() {
        lines.push("## Top violations".to_string());
        for violation in report.examples.iter().take(max_examples) {
            lines.push(format!(
                "- {} sale_item {}: {}",
                violation.code, violation.sale_item_id, violation.message
            ));
        }
        lines.push(String::new());
    }

    lines.push("## Result".to_string());
    if report.is_clean() {
        lines.push("- no violations detected.".to_string());
    } else {
        lines.push(format!("- {} violation(s) detected.", report.violations()));
    }
    lines.join("\n")
}
