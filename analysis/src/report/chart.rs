//! Horizontal bar charts drawn with block characters.
//!
//! ```text
//! FLOOD             ████████████████████████████████  $150.32B
//! HURRICANE (TYPHO… █████████████████████            $98.10B
//! ```

use super::format_value;
use crate::models::MetricTable;

/// Width of the longest bar, in cells
pub const DEFAULT_CHART_WIDTH: usize = 40;

const LABEL_WIDTH: usize = 24;
const FULL: char = '█';
const EIGHTHS: [char; 8] = [' ', '▏', '▎', '▍', '▌', '▋', '▊', '▉'];

/// Bar of `value / max` over `width` cells, with eighth-cell resolution.
fn bar(value: f64, max: f64, width: usize) -> String {
    if max <= 0.0 || value <= 0.0 {
        return String::new();
    }
    let eighths = ((value / max).min(1.0) * (width * 8) as f64).round() as usize;
    let mut out: String = std::iter::repeat(FULL).take(eighths / 8).collect();
    if eighths % 8 != 0 {
        out.push(EIGHTHS[eighths % 8]);
    }
    out
}

fn fit_label(label: &str) -> String {
    if label.chars().count() <= LABEL_WIDTH {
        return label.to_string();
    }
    let mut short: String = label.chars().take(LABEL_WIDTH - 1).collect();
    short.push('…');
    short
}

/// One line per row, scaled to the largest total.
pub fn render_bar_chart(table: &MetricTable, width: usize) -> String {
    if table.rows.is_empty() {
        return "(no categorized events)\n".to_string();
    }

    let max = table.rows.iter().map(|r| r.total).fold(0.0_f64, f64::max);
    let mut out = String::new();
    for row in &table.rows {
        out.push_str(&format!(
            "{:<label$} {:<bar$}  {}\n",
            fit_label(row.category.label()),
            bar(row.total, max, width),
            format_value(table.metric, row.total),
            label = LABEL_WIDTH,
            bar = width,
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AggregateRow, EventCategory, Metric};

    #[test]
    fn test_bar_scaling() {
        assert_eq!(bar(10.0, 10.0, 4), "████");
        assert_eq!(bar(5.0, 10.0, 4), "██");
        assert_eq!(bar(1.0, 10.0, 4).chars().count(), 1);
        assert_eq!(bar(0.0, 10.0, 4), "");
        assert_eq!(bar(3.0, 0.0, 4), "");
    }

    #[test]
    fn test_long_labels_truncated() {
        let fitted = fit_label("HEAVY SNOW/HIGH WINDS/FREEZING RAIN");
        assert_eq!(fitted.chars().count(), LABEL_WIDTH);
        assert!(fitted.ends_with('…'));
        assert_eq!(fit_label(EventCategory::MarineThunderstormWind.label()), "MARINE THUNDERSTORM WIND");
    }

    #[test]
    fn test_chart_lines() {
        let table = MetricTable {
            metric: Metric::Injuries,
            rows: vec![
                AggregateRow { category: EventCategory::Tornado, total: 91_346.0 },
                AggregateRow { category: EventCategory::Flood, total: 45_673.0 },
            ],
        };
        let chart = render_bar_chart(&table, 20);
        let lines: Vec<&str> = chart.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("TORNADO"));
        assert!(lines[0].contains(&"█".repeat(20)));
        assert!(lines[0].ends_with("91,346"));
        assert!(lines[1].contains(&"█".repeat(10)));
        assert!(!lines[1].contains(&"█".repeat(11)));
    }

    #[test]
    fn test_empty_chart() {
        let table = MetricTable { metric: Metric::Fatalities, rows: Vec::new() };
        assert!(render_bar_chart(&table, 10).contains("no categorized events"));
    }
}
