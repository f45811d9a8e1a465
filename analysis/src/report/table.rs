//! Text tables for the terminal report.

use comfy_table::{presets::UTF8_FULL, CellAlignment, Table};

use super::{format_count, format_value, Summary};
use crate::lookup::UnmatchedLabel;
use crate::models::MetricTable;

fn right_align(table: &mut Table, columns: &[usize]) {
    for &index in columns {
        if let Some(column) = table.column_mut(index) {
            column.set_cell_alignment(CellAlignment::Right);
        }
    }
}

/// Dataset overview plus one line per metric.
pub fn render_summary_table(summary: &Summary) -> String {
    let mut overview = Table::new();
    overview.load_preset(UTF8_FULL);
    overview.set_header(["ITEM", "VALUE"]);

    let years = format!("{}-{}", summary.first_year, summary.last_year);
    let events = format_count(summary.events as f64);
    let categorized = format_count(summary.categorized_events as f64);
    let uncategorized = format_count(summary.uncategorized_events as f64);
    let unmatched = summary.unmatched_labels.to_string();
    let lookup = format!("{} ({} labels)", summary.lookup_version, summary.lookup_entries);
    let base_year = summary.base_year.to_string();

    overview.add_row(["Events", events.as_str()]);
    overview.add_row(["Years", years.as_str()]);
    overview.add_row(["Categorized", categorized.as_str()]);
    overview.add_row(["Uncategorized", uncategorized.as_str()]);
    overview.add_row(["Unmatched labels", unmatched.as_str()]);
    overview.add_row(["Lookup", lookup.as_str()]);
    overview.add_row(["CPI series", summary.cpi_series.as_str()]);
    overview.add_row(["Dollars of", base_year.as_str()]);

    let mut metrics = Table::new();
    metrics.load_preset(UTF8_FULL);
    metrics.set_header(["METRIC", "TOTAL", "CATEGORIZED", "MEAN", "MAX", "NON-ZERO"]);
    for stats in &summary.metrics {
        let mean = if stats.metric.is_monetary() {
            format_value(stats.metric, stats.mean)
        } else {
            format!("{:.3}", stats.mean)
        };
        metrics.add_row([
            stats.metric.title().to_string(),
            format_value(stats.metric, stats.total),
            format_value(stats.metric, stats.categorized_total),
            mean,
            format_value(stats.metric, stats.max),
            format_count(stats.nonzero_events as f64),
        ]);
    }
    right_align(&mut metrics, &[1, 2, 3, 4, 5]);

    format!("{overview}\n{metrics}")
}

/// Ranked categories for one metric, with each row's share of the table.
pub fn render_metric_table(table: &MetricTable) -> String {
    let mut out = Table::new();
    out.load_preset(UTF8_FULL);
    out.set_header(["#", "EVENT TYPE", table.metric.title().to_uppercase().as_str(), "SHARE"]);

    let sum: f64 = table.rows.iter().map(|r| r.total).sum();
    for (i, row) in table.rows.iter().enumerate() {
        let share = if sum > 0.0 {
            format!("{:.1}%", row.total / sum * 100.0)
        } else {
            "-".to_string()
        };
        out.add_row([
            (i + 1).to_string(),
            row.category.label().to_string(),
            format_value(table.metric, row.total),
            share,
        ]);
    }
    right_align(&mut out, &[0, 2, 3]);

    out.to_string()
}

/// Labels without a lookup entry, up to `limit` rows.
pub fn render_unmatched_table(unmatched: &[UnmatchedLabel], limit: usize) -> String {
    let mut out = Table::new();
    out.load_preset(UTF8_FULL);
    out.set_header(["LABEL", "ROWS"]);

    for entry in unmatched.iter().take(limit) {
        out.add_row([entry.label.clone(), format_count(entry.rows as f64)]);
    }
    right_align(&mut out, &[1]);

    let mut text = out.to_string();
    if unmatched.len() > limit {
        text.push_str(&format!("\n  ... and {} more", unmatched.len() - limit));
    }
    text
}
