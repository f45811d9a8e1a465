//! # Stormdata - health and economic impact of U.S. severe weather
//!
//! Stormdata reads the NOAA Storm Events database, puts every damage figure
//! in constant dollars, maps free-text event labels onto the 48 official
//! event types, and ranks the types by harm to people and to the economy.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │ Storm       │────▶│   Parser    │────▶│  Transform  │────▶│   Report    │
//! │ events CSV  │     │ (auto-enc)  │     │ (tidy set)  │     │ (top N)     │
//! └─────────────┘     └─────────────┘     └──────▲──────┘     └─────────────┘
//!                                                │
//!                         ┌─────────────┐        │
//!                         │ Lookup +    │────────┘
//!                         │ CPI (cache) │
//!                         └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use stormdata::{run_analysis, AnalysisOptions, Metric};
//!
//! #[tokio::main]
//! async fn main() {
//!     let result = run_analysis(&AnalysisOptions::default()).await.unwrap();
//!     let table = result.table(Metric::EconomicTotal).unwrap();
//!     println!("Costliest event type: {}", table.rows[0].category);
//! }
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`models`] - Domain models (RawEvent, TidyEvent, EventCategory, Metric)
//! - [`parser`] - Storm data CSV parsing with auto-detection
//! - [`lookup`] - Curated event-type lookup asset
//! - [`cpi`] - CPI series loading and FRED download
//! - [`cache`] - On-disk CPI cache
//! - [`validation`] - Raw event checks
//! - [`transform`] - Decoding, inflation, canonicalization, aggregation
//! - [`report`] - Summary statistics, tables and charts
//! - [`config`] - Options from defaults and environment
//! - [`logs`] - Run log

// Core modules
pub mod error;
pub mod models;

// Ambient
pub mod config;
pub mod logs;

// Inputs
pub mod cache;
pub mod cpi;
pub mod lookup;
pub mod parser;

// Validation
pub mod validation;

// Transformation
pub mod transform;

// Output
pub mod report;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    CpiError,
    DecodeError,
    InflationError,
    LoadError,
    LookupError,
    PipelineError,
    PipelineResult,
    TransformError,
    ValidationError,
};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{
    AggregateRow,
    EventCategory,
    InflationRatio,
    Metric,
    MetricTable,
    RawEvent,
    TidyEvent,
};

// =============================================================================
// Re-exports - Inputs
// =============================================================================

pub use parser::{
    decode_content,
    detect_delimiter,
    detect_encoding,
    load_storm_data,
    parse_storm_bytes,
    parse_timestamp,
    StormData,
};

pub use lookup::{LookupTable, UnmatchedLabel, DEFAULT_LOOKUP_PATH};

pub use cpi::{load_series_file, parse_series_csv, resolve_series, CpiObservation, CpiSeries, FredClient};

pub use cache::{CpiCache, StoredSeries};

pub use config::{AnalysisOptions, CpiSource};

// =============================================================================
// Re-exports - Validation
// =============================================================================

pub use validation::{check_event, is_valid_event, validate_events};

// =============================================================================
// Re-exports - Transform
// =============================================================================

pub use transform::{
    aggregate,
    canonicalize,
    decode_exponent,
    normalize_damage,
    top_categories,
    InflationTable,
    DEFAULT_TOP_N,
};

// =============================================================================
// Re-exports - Pipeline
// =============================================================================

pub use transform::pipeline::{
    analyze,
    build_tidy,
    load_events_and_lookup,
    load_inputs,
    run_analysis,
    AnalysisInputs,
    AnalysisResult,
    TidySet,
};

// =============================================================================
// Re-exports - Report
// =============================================================================

pub use report::{render_report, summarize, to_json, MetricStats, Summary};
