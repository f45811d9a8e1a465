//! Monthly CPI series: FRED CSV parsing, remote fetch, cached resolution.
//!
//! FRED serves series as two-column CSV:
//!
//! ```text
//! observation_date,CPIAUCSL
//! 1947-01-01,21.48
//! 1947-02-01,21.62
//! ```
//!
//! Older exports use `DATE` for the first header. A `.` value marks a missing
//! observation and is skipped.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::cache::CpiCache;
use crate::config::CpiSource;
use crate::error::{CpiError, CpiResult};
use crate::logs::{log_error, log_info, log_success, log_warning};

/// Default FRED series (CPI for all urban consumers, seasonally adjusted)
pub const DEFAULT_SERIES: &str = "CPIAUCSL";

/// FRED CSV endpoint
pub const FRED_BASE_URL: &str = "https://fred.stlouisfed.org/graph/fredgraph.csv";

/// Default number of retries
const DEFAULT_MAX_RETRIES: u32 = 3;

/// Delay between retries in milliseconds
const RETRY_DELAY_MS: u64 = 1000;

/// One monthly observation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CpiObservation {
    pub date: NaiveDate,
    pub value: f64,
}

/// A CPI series in date order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CpiSeries {
    pub id: String,
    pub observations: Vec<CpiObservation>,
}

impl CpiSeries {
    /// First and last observation years
    pub fn year_range(&self) -> Option<(i32, i32)> {
        use chrono::Datelike;
        let first = self.observations.first()?.date.year();
        let last = self.observations.last()?.date.year();
        Some((first, last))
    }
}

/// Parse a FRED CSV export.
///
/// The series id is taken from the second header; `fallback_id` is used when
/// that header is blank.
pub fn parse_series_csv(content: &str, fallback_id: &str) -> CpiResult<CpiSeries> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| CpiError::MalformedSeries { line: 1, message: e.to_string() })?
        .clone();
    if headers.len() < 2 {
        return Err(CpiError::MalformedSeries {
            line: 1,
            message: format!("expected 2 columns, found {}", headers.len()),
        });
    }
    let id = match headers.get(1) {
        Some(h) if !h.is_empty() => h.to_string(),
        _ => fallback_id.to_string(),
    };

    let mut observations = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        let line = idx + 2;
        let record = record.map_err(|e| CpiError::MalformedSeries {
            line,
            message: e.to_string(),
        })?;

        let raw_date = record.get(0).unwrap_or("");
        let raw_value = record.get(1).unwrap_or("");
        if raw_value == "." || raw_value.is_empty() {
            continue;
        }

        let date = NaiveDate::parse_from_str(raw_date, "%Y-%m-%d").map_err(|_| {
            CpiError::MalformedSeries {
                line,
                message: format!("invalid date '{}'", raw_date),
            }
        })?;
        let value: f64 = raw_value.parse().map_err(|_| CpiError::MalformedSeries {
            line,
            message: format!("invalid value '{}'", raw_value),
        })?;

        observations.push(CpiObservation { date, value });
    }

    if observations.is_empty() {
        return Err(CpiError::NoObservations(id));
    }
    observations.sort_by_key(|o| o.date);

    Ok(CpiSeries { id, observations })
}

/// Load a FRED-layout CSV from disk.
pub fn load_series_file(path: &Path) -> CpiResult<CpiSeries> {
    let content = std::fs::read_to_string(path)?;
    let fallback = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(DEFAULT_SERIES);
    parse_series_csv(&content, fallback)
}

/// FRED HTTP client
#[derive(Clone)]
pub struct FredClient {
    base_url: String,
    max_retries: u32,
}

impl FredClient {
    pub fn new() -> Self {
        Self {
            base_url: FRED_BASE_URL.to_string(),
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    /// Point the client at another endpoint
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.to_string();
        self
    }

    /// Set the number of attempts
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries.max(1);
        self
    }

    /// CSV download URL for a series
    pub fn series_url(&self, series: &str) -> String {
        format!("{}?id={}", self.base_url, series)
    }

    /// Fetch a series (with retries)
    pub async fn fetch(&self, series: &str) -> CpiResult<CpiSeries> {
        let mut last_error = None;

        for attempt in 1..=self.max_retries {
            match self.try_fetch(series).await {
                Ok(parsed) => return Ok(parsed),
                Err(e) => {
                    log_warning(format!("Attempt {}/{} failed: {}", attempt, self.max_retries, e));
                    last_error = Some(e);

                    if attempt < self.max_retries {
                        log_info(format!("↻ Retrying in {}ms...", RETRY_DELAY_MS));
                        tokio::time::sleep(tokio::time::Duration::from_millis(RETRY_DELAY_MS)).await;
                    }
                }
            }
        }

        log_error(format!("Could not fetch CPI series {} after {} attempts", series, self.max_retries));
        Err(last_error.unwrap_or_else(|| CpiError::HttpError("Unknown error".to_string())))
    }

    /// Single attempt
    async fn try_fetch(&self, series: &str) -> CpiResult<CpiSeries> {
        let url = self.series_url(series);
        log_info(format!("📡 Fetching {}", url));

        let response = reqwest::get(&url)
            .await
            .map_err(|e| CpiError::HttpError(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| CpiError::HttpError(e.to_string()))?;

        if !status.is_success() {
            let excerpt: String = body.chars().take(200).collect();
            return Err(CpiError::HttpError(format!("HTTP {}: {}", status, excerpt)));
        }

        parse_series_csv(&body, series)
    }
}

impl Default for FredClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolve the configured source into a series.
///
/// FRED series are served from the cache unless `refresh` is set; a fresh
/// fetch is written back to the cache.
pub async fn resolve_series(
    source: &CpiSource,
    cache: &mut CpiCache,
    client: &FredClient,
    refresh: bool,
) -> CpiResult<CpiSeries> {
    match source {
        CpiSource::File { path } => {
            log_info(format!("Reading CPI series from {}", path.display()));
            load_series_file(path)
        }
        CpiSource::Fred { series } => {
            if !refresh {
                if let Some(stored) = cache.get(series) {
                    log_success(format!(
                        "Using cached CPI series {} (fetched {})",
                        series, stored.fetched_at
                    ));
                    return Ok(stored.series.clone());
                }
            }

            let mut fetched = client.fetch(series).await?;
            // Cache under the requested id, whatever the CSV header says
            fetched.id = series.to_uppercase();
            match cache.save(&fetched, &client.series_url(series)) {
                Ok(path) => log_success(format!("Cached CPI series at {}", path.display())),
                Err(e) => log_warning(format!("Could not cache CPI series: {}", e)),
            }
            Ok(fetched)
        }
    }
}
