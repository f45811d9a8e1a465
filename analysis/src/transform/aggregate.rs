//! Group tidy events by canonical category and rank the totals.
//!
//! ```text
//! Tidy events                         →  Ranked totals (one metric)
//! ┌──────────────────────────────┐      ┌──────────────────────┐
//! │ TORNADO      fatalities: 1   │      │ FLOOD        5       │
//! │ TORNADO      fatalities: 2   │  →   │ TORNADO      3       │
//! │ FLOOD        fatalities: 5   │      └──────────────────────┘
//! │ (unmatched)  fatalities: 9   │        unmatched rows dropped
//! └──────────────────────────────┘
//! ```
//!
//! Rows are ranked by total (descending), then by category label so equal
//! totals come out in a stable order. Truncation keeps every group tied
//! with the last kept value, so a table can be longer than requested.

use std::collections::HashMap;

use crate::models::{AggregateRow, EventCategory, Metric, MetricTable, TidyEvent};

/// Default number of categories per table
pub const DEFAULT_TOP_N: usize = 10;

/// Sum a metric per category, ranked. Uncategorized events are skipped.
pub fn aggregate(events: &[TidyEvent], metric: Metric) -> Vec<AggregateRow> {
    let mut totals: HashMap<EventCategory, f64> = HashMap::new();

    for event in events {
        if let Some(category) = event.category {
            *totals.entry(category).or_insert(0.0) += metric.value(event);
        }
    }

    let mut rows: Vec<AggregateRow> = totals
        .into_iter()
        .map(|(category, total)| AggregateRow { category, total })
        .collect();

    rows.sort_by(|a, b| {
        b.total
            .total_cmp(&a.total)
            .then_with(|| a.category.label().cmp(b.category.label()))
    });
    rows
}

/// Keep the first `n` ranked rows plus any rows tied with the n-th.
pub fn truncate_with_ties(mut rows: Vec<AggregateRow>, n: usize) -> Vec<AggregateRow> {
    if n == 0 {
        rows.clear();
        return rows;
    }
    if rows.len() <= n {
        return rows;
    }

    let cutoff = rows[n - 1].total;
    let keep = n + rows[n..].iter().take_while(|r| r.total == cutoff).count();
    rows.truncate(keep);
    rows
}

/// Ranked top-`n` table for one metric.
pub fn top_categories(events: &[TidyEvent], metric: Metric, n: usize) -> MetricTable {
    MetricTable {
        metric,
        rows: truncate_with_ties(aggregate(events, metric), n),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn event(category: Option<EventCategory>, fatalities: f64, property: f64) -> TidyEvent {
        TidyEvent {
            refnum: 0,
            evtype: String::new(),
            category,
            state: String::new(),
            county: String::new(),
            begin: NaiveDate::from_ymd_opt(2000, 1, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            end: None,
            year: 2000,
            fatalities,
            injuries: 1.0,
            property_damage: property,
            crop_damage: 0.0,
        }
    }

    #[test]
    fn test_sums_per_category() {
        let events = vec![
            event(Some(EventCategory::Tornado), 1.0, 0.0),
            event(Some(EventCategory::Tornado), 2.0, 0.0),
            event(Some(EventCategory::Flood), 5.0, 0.0),
        ];

        let rows = aggregate(&events, Metric::Fatalities);
        assert_eq!(
            rows,
            vec![
                AggregateRow { category: EventCategory::Flood, total: 5.0 },
                AggregateRow { category: EventCategory::Tornado, total: 3.0 },
            ]
        );
    }

    #[test]
    fn test_uncategorized_rows_excluded() {
        let events = vec![
            event(None, 100.0, 0.0),
            event(Some(EventCategory::Hail), 1.0, 0.0),
        ];

        let rows = aggregate(&events, Metric::Fatalities);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].total, 1.0);
    }

    #[test]
    fn test_derived_metrics() {
        let events = vec![
            event(Some(EventCategory::Heat), 2.0, 10.0),
            event(Some(EventCategory::Heat), 3.0, 5.0),
        ];
        assert_eq!(aggregate(&events, Metric::HealthTotal)[0].total, 7.0);
        assert_eq!(aggregate(&events, Metric::EconomicTotal)[0].total, 15.0);
    }

    #[test]
    fn test_top_ten_without_ties() {
        let events: Vec<TidyEvent> = EventCategory::ALL
            .iter()
            .enumerate()
            .map(|(i, c)| event(Some(*c), i as f64, 0.0))
            .collect();

        let table = top_categories(&events, Metric::Fatalities, 10);
        assert_eq!(table.rows.len(), 10);
        assert_eq!(table.rows[0].category, EventCategory::WinterWeather);
        assert!(table.rows.windows(2).all(|w| w[0].total >= w[1].total));
    }

    #[test]
    fn test_ties_at_cutoff_included() {
        let mut events: Vec<TidyEvent> = EventCategory::ALL[..9]
            .iter()
            .enumerate()
            .map(|(i, c)| event(Some(*c), 100.0 - i as f64, 0.0))
            .collect();
        // three categories share the 10th value
        for c in &EventCategory::ALL[9..12] {
            events.push(event(Some(*c), 1.0, 0.0));
        }
        events.push(event(Some(EventCategory::ALL[12]), 0.5, 0.0));

        let table = top_categories(&events, Metric::Fatalities, 10);
        assert_eq!(table.rows.len(), 12);
        assert!(table.rows[9..].iter().all(|r| r.total == 1.0));
    }

    #[test]
    fn test_fewer_groups_than_requested() {
        let events = vec![event(Some(EventCategory::Flood), 1.0, 0.0)];
        assert_eq!(top_categories(&events, Metric::Fatalities, 10).rows.len(), 1);
        assert!(top_categories(&events, Metric::Fatalities, 0).rows.is_empty());
    }

    #[test]
    fn test_total_never_exceeds_raw_sum() {
        let events: Vec<TidyEvent> = (0..60)
            .map(|i| {
                let category = if i % 7 == 0 {
                    None
                } else {
                    Some(EventCategory::ALL[i % 48])
                };
                event(category, (i % 5) as f64, 0.0)
            })
            .collect();

        let raw: f64 = events.iter().map(|e| e.fatalities).sum();
        let table = top_categories(&events, Metric::Fatalities, 10);
        let aggregated: f64 = table.rows.iter().map(|r| r.total).sum();
        assert!(aggregated <= raw);
    }

    #[test]
    fn test_equal_totals_ordered_by_label() {
        let events = vec![
            event(Some(EventCategory::Tornado), 1.0, 0.0),
            event(Some(EventCategory::Avalanche), 1.0, 0.0),
        ];
        let rows = aggregate(&events, Metric::Fatalities);
        assert_eq!(rows[0].category, EventCategory::Avalanche);
    }
}
