//! Descriptive statistics and report rendering.
//!
//! - [`summarize`] - dataset-level statistics
//! - [`table`] - aligned text tables
//! - [`chart`] - horizontal bar charts
//! - [`to_json`] - machine-readable dump

pub mod chart;
pub mod table;

use serde::Serialize;

use crate::logs::LogEntry;
use crate::lookup::{LookupTable, UnmatchedLabel};
use crate::models::Metric;
use crate::transform::pipeline::{AnalysisResult, TidySet};

pub use chart::{render_bar_chart, DEFAULT_CHART_WIDTH};
pub use table::{render_metric_table, render_summary_table, render_unmatched_table};

/// Dataset-level statistics
#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub events: usize,
    pub first_year: i32,
    pub last_year: i32,
    /// Year with inflation ratio 1.0
    pub base_year: i32,
    pub categorized_events: usize,
    pub uncategorized_events: usize,
    /// Distinct labels with no lookup entry
    pub unmatched_labels: usize,
    pub lookup_version: String,
    pub lookup_entries: usize,
    pub cpi_series: String,
    pub metrics: Vec<MetricStats>,
}

/// Per-metric statistics over all tidy events
#[derive(Debug, Clone, Serialize)]
pub struct MetricStats {
    pub metric: Metric,
    pub total: f64,
    /// Part of the total carried by categorized events
    pub categorized_total: f64,
    pub mean: f64,
    pub max: f64,
    /// Events with a non-zero value
    pub nonzero_events: usize,
}

/// Compute the summary for a tidy set.
pub fn summarize(
    tidy: &TidySet,
    lookup: &LookupTable,
    cpi_series: &str,
    unmatched: &[UnmatchedLabel],
) -> Summary {
    let events = &tidy.events;
    let categorized_events = events.iter().filter(|e| e.category.is_some()).count();
    let first_year = events.iter().map(|e| e.year).min().unwrap_or_default();
    let last_year = events.iter().map(|e| e.year).max().unwrap_or_default();

    let metrics = Metric::ALL
        .iter()
        .map(|&metric| {
            let mut stats = MetricStats {
                metric,
                total: 0.0,
                categorized_total: 0.0,
                mean: 0.0,
                max: 0.0,
                nonzero_events: 0,
            };
            for event in events {
                let value = metric.value(event);
                stats.total += value;
                if event.category.is_some() {
                    stats.categorized_total += value;
                }
                if value > stats.max {
                    stats.max = value;
                }
                if value != 0.0 {
                    stats.nonzero_events += 1;
                }
            }
            if !events.is_empty() {
                stats.mean = stats.total / events.len() as f64;
            }
            stats
        })
        .collect();

    Summary {
        events: events.len(),
        first_year,
        last_year,
        base_year: tidy.inflation.base_year(),
        categorized_events,
        uncategorized_events: events.len() - categorized_events,
        unmatched_labels: unmatched.len(),
        lookup_version: lookup.version().to_string(),
        lookup_entries: lookup.len(),
        cpi_series: cpi_series.to_string(),
        metrics,
    }
}

/// Full text report: summary, then one table and chart per metric.
pub fn render_report(result: &AnalysisResult) -> String {
    let mut out = String::new();

    out.push_str("Storm events summary\n");
    out.push_str(&render_summary_table(&result.summary));
    out.push('\n');

    for table in &result.tables {
        out.push('\n');
        out.push_str(&format!("Top event types by {}\n", table.metric.title().to_lowercase()));
        out.push_str(&render_metric_table(table));
        out.push('\n');
        out.push_str(&render_bar_chart(table, DEFAULT_CHART_WIDTH));
    }

    out
}

/// Value formatted for its metric: dollars or a count.
pub fn format_value(metric: Metric, value: f64) -> String {
    if metric.is_monetary() {
        format_dollars(value)
    } else {
        format_count(value)
    }
}

/// `$1.23B`, `$4.50M`, `$12.00K`, `$7.00`
pub fn format_dollars(value: f64) -> String {
    let abs = value.abs();
    let sign = if value < 0.0 { "-" } else { "" };
    if abs >= 1e9 {
        format!("{}${:.2}B", sign, abs / 1e9)
    } else if abs >= 1e6 {
        format!("{}${:.2}M", sign, abs / 1e6)
    } else if abs >= 1e3 {
        format!("{}${:.2}K", sign, abs / 1e3)
    } else {
        format!("{}${:.2}", sign, abs)
    }
}

/// Rounded, with thousands separators
pub fn format_count(value: f64) -> String {
    let rounded = value.round() as i64;
    let digits = rounded.unsigned_abs().to_string();

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if rounded < 0 {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

#[derive(Serialize)]
struct JsonReport<'a> {
    generated_at: String,
    #[serde(flatten)]
    result: &'a AnalysisResult,
    log: &'a [LogEntry],
}

/// Serialize the result (and the run log) as pretty JSON.
pub fn to_json(result: &AnalysisResult, log: &[LogEntry]) -> serde_json::Result<String> {
    let report = JsonReport {
        generated_at: chrono::Utc::now().to_rfc3339(),
        result,
        log,
    };
    serde_json::to_string_pretty(&report)
}
