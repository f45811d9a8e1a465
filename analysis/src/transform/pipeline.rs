//! High-level pipeline API for the storm impact analysis.
//!
//! The driver loads every input exactly once and hands the loaded data to
//! each stage by reference:
//!
//! 1. Load storm events and lookup asset, then resolve the CPI series
//! 2. Validate raw events
//! 3. Build the tidy set (dates, base year, inflation ratios, damage
//!    normalization, canonical categories)
//! 4. Aggregate per metric
//! 5. Summarize
//!
//! # Example
//!
//! ```rust,ignore
//! use stormdata::{run_analysis, AnalysisOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let result = run_analysis(&AnalysisOptions::from_env()).await?;
//!     println!("{} events analyzed", result.summary.events);
//!     Ok(())
//! }
//! ```

use chrono::{Datelike, NaiveDateTime};
use serde::Serialize;

use super::aggregate::top_categories;
use super::canonical::canonicalize;
use super::inflation::InflationTable;
use super::normalize::normalize_damage;
use crate::cache::CpiCache;
use crate::config::AnalysisOptions;
use crate::cpi::{resolve_series, CpiSeries, FredClient};
use crate::error::{PipelineError, PipelineResult, TransformError, TransformResult};
use crate::logs::{log_info, log_info_indent, log_success, log_warning};
use crate::lookup::{LookupTable, UnmatchedLabel};
use crate::models::{InflationRatio, Metric, MetricTable, RawEvent, TidyEvent};
use crate::parser::{ensure_exists, load_storm_data, parse_timestamp, StormData};
use crate::report::{summarize, Summary};
use crate::validation::validate_events;

/// Everything the analysis reads, loaded once
#[derive(Debug, Clone)]
pub struct AnalysisInputs {
    pub storm: StormData,
    pub lookup: LookupTable,
    pub cpi: CpiSeries,
}

/// Tidy events and the ratio table used to build them
#[derive(Debug, Clone)]
pub struct TidySet {
    pub events: Vec<TidyEvent>,
    pub inflation: InflationTable,
}

/// Result of a complete analysis run
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisResult {
    /// Descriptive statistics
    pub summary: Summary,

    /// One ranked table per metric
    pub tables: Vec<MetricTable>,

    /// Labels without a lookup entry, most frequent first
    pub unmatched: Vec<UnmatchedLabel>,

    /// Yearly CPI averages and ratios
    pub inflation: Vec<InflationRatio>,
}

impl AnalysisResult {
    /// Table for one metric
    pub fn table(&self, metric: Metric) -> Option<&MetricTable> {
        self.tables.iter().find(|t| t.metric == metric)
    }
}

/// Load, validate, transform and aggregate.
///
/// This is the main entry point of the pipeline.
pub async fn run_analysis(options: &AnalysisOptions) -> PipelineResult<AnalysisResult> {
    let inputs = load_inputs(options).await?;
    analyze(&inputs, options.top_n)
}

/// Load the three inputs.
///
/// Storm data and lookup asset are checked for existence before anything is
/// read or fetched.
pub async fn load_inputs(options: &AnalysisOptions) -> PipelineResult<AnalysisInputs> {
    let (storm, lookup) = load_events_and_lookup(options)?;

    log_info("💵 Resolving CPI series...");
    let mut cache = CpiCache::with_dir(&options.cache_dir);
    let cpi = resolve_series(&options.cpi, &mut cache, &FredClient::new(), options.refresh_cpi).await?;
    if let Some((first, last)) = cpi.year_range() {
        log_success(format!(
            "CPI {}: {} observations ({}-{})",
            cpi.id,
            cpi.observations.len(),
            first,
            last
        ));
    }

    Ok(AnalysisInputs { storm, lookup, cpi })
}

/// Load the storm events and the lookup asset, leaving the CPI series alone.
///
/// Enough for lookup coverage checks, which never need dollar amounts.
pub fn load_events_and_lookup(options: &AnalysisOptions) -> PipelineResult<(StormData, LookupTable)> {
    ensure_exists(&options.storm_data)?;
    ensure_exists(&options.lookup)?;

    log_info("📖 Reading storm events...");
    let storm = load_storm_data(&options.storm_data)?;
    log_success(format!("Detected encoding: {}", storm.encoding));
    log_success(format!("Read {} events ({} columns)", storm.events.len(), storm.headers.len()));

    log_info("📋 Loading event-type lookup...");
    let lookup = LookupTable::load(&options.lookup)?;
    if lookup.is_empty() {
        log_warning(format!("Lookup {} has no entries, every event is unmatched", lookup.version()));
    } else {
        log_success(format!(
            "Lookup {}: {} labels → {} categories",
            lookup.version(),
            lookup.len(),
            lookup.categories_covered()
        ));
    }

    Ok((storm, lookup))
}

/// Run every stage after loading.
pub fn analyze(inputs: &AnalysisInputs, top_n: usize) -> PipelineResult<AnalysisResult> {
    let events = &inputs.storm.events;

    log_info("✔️  Validating events...");
    validate_events(events)?;
    log_success(format!("{} events valid", events.len()));

    log_info("⚙️  Building tidy set...");
    let tidy = build_tidy(events, &inputs.lookup, &inputs.cpi)?;

    let unmatched = inputs.lookup.unmatched_labels(events);
    report_unmatched(&unmatched);

    log_info("📊 Aggregating...");
    let tables: Vec<MetricTable> = Metric::ALL
        .iter()
        .map(|&metric| top_categories(&tidy.events, metric, top_n))
        .collect();
    for table in &tables {
        if table.rows.len() > top_n {
            log_info_indent(
                format!("{}: {} rows (ties at rank {})", table.metric, table.rows.len(), top_n),
                1,
            );
        }
    }

    let summary = summarize(&tidy, &inputs.lookup, &inputs.cpi.id, &unmatched);
    log_success("Analysis complete");

    Ok(AnalysisResult {
        summary,
        tables,
        unmatched,
        inflation: tidy.inflation.records(),
    })
}

/// Build tidy records from validated raw events.
///
/// The base year is the earliest begin year; any event year the CPI series
/// does not cover aborts the run.
pub fn build_tidy(
    events: &[RawEvent],
    lookup: &LookupTable,
    cpi: &CpiSeries,
) -> PipelineResult<TidySet> {
    if events.is_empty() {
        return Err(PipelineError::EmptyInput);
    }

    let times = events
        .iter()
        .map(event_times)
        .collect::<Result<Vec<_>, _>>()?;

    let base_year = times
        .iter()
        .map(|(begin, _)| begin.year())
        .min()
        .ok_or(PipelineError::EmptyInput)?;
    log_info_indent(format!("Base year: {}", base_year), 1);

    let inflation = InflationTable::from_observations(&cpi.observations, base_year)?;

    let mut tidy = Vec::with_capacity(events.len());
    for (event, (begin, end)) in events.iter().zip(times) {
        let year = begin.year();
        let ratio = inflation
            .ratio(year)
            .map_err(|source| TransformError::Inflation {
                refnum: event.refnum,
                source,
            })?;

        let property_damage =
            normalize_damage(event.property_magnitude, &event.property_exponent, ratio).map_err(
                |source| TransformError::Exponent {
                    refnum: event.refnum,
                    column: "PROPDMGEXP",
                    source,
                },
            )?;
        let crop_damage = normalize_damage(event.crop_magnitude, &event.crop_exponent, ratio)
            .map_err(|source| TransformError::Exponent {
                refnum: event.refnum,
                column: "CROPDMGEXP",
                source,
            })?;

        tidy.push(TidyEvent {
            refnum: event.refnum,
            evtype: event.evtype.clone(),
            category: canonicalize(&event.evtype, lookup),
            state: event.state.clone(),
            county: event.county.clone(),
            begin,
            end,
            year,
            fatalities: event.fatalities,
            injuries: event.injuries,
            property_damage,
            crop_damage,
        });
    }

    let categorized = tidy.iter().filter(|e| e.category.is_some()).count();
    log_success(format!(
        "{} tidy events ({} categorized, {} uncategorized)",
        tidy.len(),
        categorized,
        tidy.len() - categorized
    ));

    Ok(TidySet { events: tidy, inflation })
}

/// Begin (required) and end (optional) timestamps of an event
fn event_times(event: &RawEvent) -> TransformResult<(NaiveDateTime, Option<NaiveDateTime>)> {
    let invalid = |value: &str| TransformError::InvalidDate {
        refnum: event.refnum,
        value: value.to_string(),
    };

    let begin = parse_timestamp(&event.begin_date).ok_or_else(|| invalid(&event.begin_date))?;
    let end = if event.end_date.trim().is_empty() {
        None
    } else {
        Some(parse_timestamp(&event.end_date).ok_or_else(|| invalid(&event.end_date))?)
    };

    Ok((begin, end))
}

/// Log lookup coverage
fn report_unmatched(unmatched: &[UnmatchedLabel]) {
    if unmatched.is_empty() {
        log_success("All event types matched the lookup");
        return;
    }

    let rows: usize = unmatched.iter().map(|u| u.rows).sum();
    log_warning(format!(
        "{} distinct labels ({} events) have no canonical event type",
        unmatched.len(),
        rows
    ));
    for label in unmatched.iter().take(5) {
        log_warning(format!("• {} ({} events)", label.label, label.rows));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpi::{parse_series_csv, CpiObservation};
    use crate::error::InflationError;
    use crate::models::EventCategory;
    use crate::parser::parse_storm_bytes;
    use chrono::NaiveDate;

    const LOOKUP_CSV: &str = "EVTYPE,EVENT\nTORNADO,TORNADO\nFLOOD,FLOOD\nTSTM WIND,THUNDERSTORM WIND\n";

    fn lookup() -> LookupTable {
        LookupTable::from_reader(LOOKUP_CSV.as_bytes(), "test").unwrap()
    }

    fn cpi(years: &[(i32, f64)]) -> CpiSeries {
        CpiSeries {
            id: "CPIAUCSL".into(),
            observations: years
                .iter()
                .map(|&(year, value)| CpiObservation {
                    date: NaiveDate::from_ymd_opt(year, 1, 1).unwrap(),
                    value,
                })
                .collect(),
        }
    }

    fn raw(refnum: u64, evtype: &str, date: &str, fatalities: f64) -> RawEvent {
        RawEvent {
            refnum,
            evtype: evtype.to_string(),
            state: "AL".into(),
            county: String::new(),
            begin_date: date.to_string(),
            end_date: String::new(),
            fatalities,
            injuries: 0.0,
            property_magnitude: 0.0,
            property_exponent: String::new(),
            crop_magnitude: 0.0,
            crop_exponent: String::new(),
        }
    }

    fn inputs(events: Vec<RawEvent>, series: CpiSeries) -> AnalysisInputs {
        AnalysisInputs {
            storm: StormData {
                events,
                encoding: "utf-8".into(),
                delimiter: ',',
                headers: Vec::new(),
            },
            lookup: lookup(),
            cpi: series,
        }
    }

    #[test]
    fn test_end_to_end_example() {
        let events = vec![
            raw(1, " tornado ", "4/18/1950 0:00:00", 1.0),
            raw(2, "TORNADO", "4/18/1950 0:00:00", 2.0),
            raw(3, "FLOOD", "4/18/1950 0:00:00", 5.0),
        ];

        let result = analyze(&inputs(events, cpi(&[(1950, 24.0)])), 10).unwrap();
        let table = result.table(Metric::Fatalities).unwrap();

        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0].category, EventCategory::Flood);
        assert_eq!(table.rows[0].total, 5.0);
        assert_eq!(table.rows[1].category, EventCategory::Tornado);
        assert_eq!(table.rows[1].total, 3.0);
        assert!(result.unmatched.is_empty());
    }

    #[test]
    fn test_damage_normalized_with_inflation() {
        let mut late = raw(2, "FLOOD", "6/1/1951 0:00:00", 0.0);
        late.property_magnitude = 2.5;
        late.property_exponent = "M".into();
        late.crop_magnitude = 10.0;
        late.crop_exponent = "k".into();
        let mut early = raw(1, "TORNADO", "4/18/1950 0:00:00", 0.0);
        early.property_magnitude = 25.0;
        early.property_exponent = "K".into();

        let tidy = build_tidy(&[early, late], &lookup(), &cpi(&[(1950, 20.0), (1951, 30.0)])).unwrap();

        assert_eq!(tidy.inflation.base_year(), 1950);
        assert_eq!(tidy.events[0].property_damage, 25_000.0);
        assert_eq!(tidy.events[1].property_damage, 2.5e6 * 1.5);
        assert_eq!(tidy.events[1].crop_damage, 10_000.0 * 1.5);
        assert_eq!(tidy.events[1].economic_total(), 2.5e6 * 1.5 + 15_000.0);
    }

    #[test]
    fn test_unmatched_rows_kept() {
        let events = vec![
            raw(1, "TORNADO", "4/18/1950 0:00:00", 1.0),
            raw(2, "Summary of May 9", "4/18/1950 0:00:00", 7.0),
        ];
        let tidy = build_tidy(&events, &lookup(), &cpi(&[(1950, 24.0)])).unwrap();
        assert_eq!(tidy.events.len(), 2);
        assert_eq!(tidy.events[1].category, None);

        let result = analyze(&inputs(events, cpi(&[(1950, 24.0)])), 10).unwrap();
        assert_eq!(result.unmatched.len(), 1);
        assert_eq!(result.table(Metric::Fatalities).unwrap().rows.len(), 1);
    }

    #[test]
    fn test_invalid_exponent_is_fatal() {
        let mut event = raw(9, "TORNADO", "4/18/1950 0:00:00", 0.0);
        event.crop_exponent = "x".into();
        let err = build_tidy(&[event], &lookup(), &cpi(&[(1950, 24.0)])).unwrap_err();
        match err {
            PipelineError::Transform(TransformError::Exponent { refnum, column, .. }) => {
                assert_eq!(refnum, 9);
                assert_eq!(column, "CROPDMGEXP");
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_base_year_missing_from_cpi() {
        let events = vec![raw(1, "TORNADO", "4/18/1950 0:00:00", 0.0)];
        let err = build_tidy(&events, &lookup(), &cpi(&[(1951, 24.0)])).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Inflation(InflationError::MissingBaseYear(1950))
        ));
    }

    #[test]
    fn test_year_beyond_cpi_is_fatal() {
        let events = vec![
            raw(1, "TORNADO", "4/18/1950 0:00:00", 0.0),
            raw(2, "TORNADO", "4/18/2011 0:00:00", 0.0),
        ];
        let err = build_tidy(&events, &lookup(), &cpi(&[(1950, 24.0)])).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Transform(TransformError::Inflation { refnum: 2, .. })
        ));
    }

    #[test]
    fn test_bad_date_is_fatal() {
        let events = vec![raw(4, "TORNADO", "sometime in 1950", 0.0)];
        let err = build_tidy(&events, &lookup(), &cpi(&[(1950, 24.0)])).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Transform(TransformError::InvalidDate { refnum: 4, .. })
        ));
    }

    #[test]
    fn test_empty_input() {
        let err = build_tidy(&[], &lookup(), &cpi(&[(1950, 24.0)])).unwrap_err();
        assert!(matches!(err, PipelineError::EmptyInput));
    }

    #[test]
    fn test_duplicate_refnum_rejected() {
        let events = vec![
            raw(1, "TORNADO", "4/18/1950 0:00:00", 0.0),
            raw(1, "FLOOD", "4/18/1950 0:00:00", 0.0),
        ];
        let err = analyze(&inputs(events, cpi(&[(1950, 24.0)])), 10).unwrap_err();
        assert!(matches!(err, PipelineError::Validation(_)));
    }

    #[tokio::test]
    async fn test_run_analysis_from_files() {
        let dir = tempfile::tempdir().unwrap();
        let storm = dir.path().join("StormData.csv");
        let lookup_path = dir.path().join("evtype_lookup.v3.csv");
        let cpi_path = dir.path().join("cpi.csv");

        std::fs::write(
            &storm,
            "REFNUM,EVTYPE,BGN_DATE,END_DATE,FATALITIES,INJURIES,PROPDMG,PROPDMGEXP,CROPDMG,CROPDMGEXP\n\
             1.00,TSTM WIND,1/3/1996 0:00:00,1/3/1996 0:00:00,0.00,2.00,5.00,K,0.00,\n\
             2.00,FLOOD,2/7/1997 0:00:00,,1.00,0.00,1.00,M,3.00,K\n",
        )
        .unwrap();
        std::fs::write(&lookup_path, LOOKUP_CSV).unwrap();
        std::fs::write(&cpi_path, "DATE,CPIAUCSL\n1996-01-01,150.0\n1997-01-01,160.0\n").unwrap();

        let options = AnalysisOptions {
            storm_data: storm,
            lookup: lookup_path,
            cpi: crate::config::CpiSource::File { path: cpi_path },
            cache_dir: dir.path().join("cache"),
            refresh_cpi: false,
            top_n: 10,
        };

        let result = run_analysis(&options).await.unwrap();
        assert_eq!(result.summary.events, 2);
        assert_eq!(result.summary.base_year, 1996);
        assert_eq!(result.summary.lookup_version, "v3");

        let economic = result.table(Metric::EconomicTotal).unwrap();
        assert_eq!(economic.rows[0].category, EventCategory::Flood);
        let ratio = 160.0 / 150.0;
        assert_eq!(economic.rows[0].total, 1e6 * ratio + 3_000.0 * ratio);
    }

    #[tokio::test]
    async fn test_missing_storm_file() {
        let dir = tempfile::tempdir().unwrap();
        let options = AnalysisOptions {
            storm_data: dir.path().join("absent.csv"),
            ..AnalysisOptions::default()
        };
        let err = run_analysis(&options).await.unwrap_err();
        assert!(matches!(err, PipelineError::Load(_)));
    }

    #[test]
    fn test_events_and_lookup_load_without_cpi() {
        let dir = tempfile::tempdir().unwrap();
        let storm = dir.path().join("StormData.csv");
        let lookup_path = dir.path().join("evtype_lookup.v2.csv");
        std::fs::write(
            &storm,
            "REFNUM,EVTYPE,BGN_DATE,FATALITIES,INJURIES,PROPDMG,PROPDMGEXP,CROPDMG,CROPDMGEXP\n\
             1,TSTM WIND,1/3/1996 0:00:00,0,0,0,,0,\n\
             2,WINTRY MIX,1/4/1996 0:00:00,0,0,0,,0,\n",
        )
        .unwrap();
        std::fs::write(&lookup_path, LOOKUP_CSV).unwrap();

        let options = AnalysisOptions {
            storm_data: storm,
            lookup: lookup_path,
            cpi: crate::config::CpiSource::File { path: dir.path().join("absent_cpi.csv") },
            cache_dir: dir.path().join("cache"),
            refresh_cpi: false,
            top_n: 10,
        };

        let (storm, lookup) = load_events_and_lookup(&options).unwrap();
        assert_eq!(storm.events.len(), 2);
        assert_eq!(lookup.version(), "v2");
        let unmatched = lookup.unmatched_labels(&storm.events);
        assert_eq!(unmatched.len(), 1);
        assert_eq!(unmatched[0].label, "WINTRY MIX");
        assert!(!options.cache_dir.exists());
    }

    #[test]
    fn test_empty_lookup_still_loads() {
        let dir = tempfile::tempdir().unwrap();
        let storm = dir.path().join("StormData.csv");
        let lookup_path = dir.path().join("evtype_lookup.v1.csv");
        std::fs::write(
            &storm,
            "REFNUM,EVTYPE,BGN_DATE,FATALITIES,INJURIES,PROPDMG,PROPDMGEXP,CROPDMG,CROPDMGEXP\n\
             1,FLOOD,1/3/1996 0:00:00,0,0,0,,0,\n",
        )
        .unwrap();
        std::fs::write(&lookup_path, "EVTYPE,EVENT\n").unwrap();

        let options = AnalysisOptions {
            storm_data: storm,
            lookup: lookup_path,
            ..AnalysisOptions::default()
        };
        let (storm, lookup) = load_events_and_lookup(&options).unwrap();
        assert!(lookup.is_empty());
        assert_eq!(lookup.unmatched_labels(&storm.events)[0].rows, 1);
    }

    #[test]
    fn test_parsed_rows_flow_through() {
        let csv = "REFNUM,EVTYPE,BGN_DATE,FATALITIES,INJURIES,PROPDMG,PROPDMGEXP,CROPDMG,CROPDMGEXP\n\
                   1,FLOOD,1/1/2000 0:00:00,0,0,1,B,0,\n";
        let storm = parse_storm_bytes(csv.as_bytes()).unwrap();
        let series = parse_series_csv("DATE,CPIAUCSL\n2000-01-01,170\n", "x").unwrap();
        let tidy = build_tidy(&storm.events, &lookup(), &series).unwrap();
        assert_eq!(tidy.events[0].property_damage, 1e9);
    }
}
