//! Error types for the storm data analysis pipeline.
//!
//! One error enum per stage:
//!
//! - [`LoadError`] - Input files and CSV parsing
//! - [`DecodeError`] - Damage exponent codes
//! - [`InflationError`] - CPI ratio table construction and lookup
//! - [`LookupError`] - Event-type lookup asset
//! - [`CpiError`] - CPI series parsing, fetching and caching
//! - [`ValidationError`] - Raw event checks
//! - [`TransformError`] - Row-level failures while building the tidy set
//! - [`PipelineError`] - Top-level orchestration errors
//!
//! Every stage error converts into [`PipelineError`] via `From`,
//! so `?` works across stage boundaries.

use std::path::PathBuf;
use thiserror::Error;

// =============================================================================
// Loading Errors
// =============================================================================

/// Errors while reading an input file.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The input file does not exist.
    #[error("Input file not found: {} (download and decompress it first)", .0.display())]
    MissingInput(PathBuf),

    /// Failed to read file.
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    /// Invalid CSV format.
    #[error("Invalid CSV format: {0}")]
    ParseError(#[from] csv::Error),

    /// A required column is absent from the header row.
    #[error("Missing required column: {0}")]
    MissingColumn(String),

    /// Empty file.
    #[error("CSV file is empty")]
    EmptyFile,
}

// =============================================================================
// Exponent Decoding Errors
// =============================================================================

/// Errors while decoding a damage exponent code.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeError {
    /// Code outside the known letter set that is not a number either.
    #[error("Invalid exponent code '{0}'")]
    InvalidExponent(String),

    /// Magnitude scaled by its exponent and ratio is not a finite number.
    #[error("Damage {magnitude} with exponent code '{code}' is not finite")]
    NonFinite { magnitude: f64, code: String },
}

// =============================================================================
// Inflation Errors
// =============================================================================

/// Errors from the inflation ratio table.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InflationError {
    /// The CPI series has no observation in the base year.
    #[error("Base year {0} is not covered by the CPI series")]
    MissingBaseYear(i32),

    /// An event year outside the CPI series.
    #[error("Year {year} is outside the CPI series ({first}-{last})")]
    YearNotCovered { year: i32, first: i32, last: i32 },

    /// The base year average is zero or negative.
    #[error("CPI average for base year {0} is not positive")]
    NonPositiveBase(i32),

    /// No observations at all.
    #[error("CPI series is empty")]
    EmptySeries,
}

// =============================================================================
// Lookup Asset Errors
// =============================================================================

/// Errors from the event-type lookup asset.
#[derive(Debug, Error)]
pub enum LookupError {
    /// IO error.
    #[error("Lookup IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// CSV error.
    #[error("Lookup CSV error: {0}")]
    CsvError(#[from] csv::Error),

    /// Canonical label that is not one of the 48 categories.
    #[error("Line {line}: unknown canonical event type '{label}'")]
    UnknownCategory { line: u64, label: String },

    /// The same historical label maps to two categories.
    #[error("Label '{label}' maps to both '{first}' and '{second}'")]
    ConflictingEntry {
        label: String,
        first: String,
        second: String,
    },
}

// =============================================================================
// CPI Source Errors
// =============================================================================

/// Errors from the CPI series source.
#[derive(Debug, Error)]
pub enum CpiError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    HttpError(String),

    /// Series CSV is not in the expected shape.
    #[error("Malformed CPI series at line {line}: {message}")]
    MalformedSeries { line: usize, message: String },

    /// Series has no usable observation.
    #[error("CPI series '{0}' has no observations")]
    NoObservations(String),

    /// Local file IO error.
    #[error("CPI IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Cache JSON error.
    #[error("CPI cache JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

// =============================================================================
// Validation Errors
// =============================================================================

/// Errors from raw event validation.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// Identifier seen twice.
    #[error("Duplicate event identifier {0}")]
    DuplicateId(u64),

    /// Rows with invalid counts or magnitudes.
    #[error("{count} events failed validation: {errors:?}")]
    InvalidValues { count: usize, errors: Vec<String> },
}

// =============================================================================
// Transformation Errors
// =============================================================================

/// Row-level errors while building tidy records.
#[derive(Debug, Error)]
pub enum TransformError {
    /// Damage exponent could not be decoded.
    #[error("Event {refnum}, column '{column}': {source}")]
    Exponent {
        refnum: u64,
        column: &'static str,
        #[source]
        source: DecodeError,
    },

    /// Year has no inflation ratio.
    #[error("Event {refnum}: {source}")]
    Inflation {
        refnum: u64,
        #[source]
        source: InflationError,
    },

    /// Begin or end timestamp could not be parsed.
    #[error("Event {refnum}: unparseable date '{value}'")]
    InvalidDate { refnum: u64, value: String },
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level pipeline orchestration errors.
///
/// This is the error type returned by [`crate::transform::pipeline::run_analysis`].
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Input loading error.
    #[error("Load error: {0}")]
    Load(#[from] LoadError),

    /// Lookup asset error.
    #[error("Lookup error: {0}")]
    Lookup(#[from] LookupError),

    /// CPI source error.
    #[error("CPI error: {0}")]
    Cpi(#[from] CpiError),

    /// Inflation table error.
    #[error("Inflation error: {0}")]
    Inflation(#[from] InflationError),

    /// Validation error.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Transformation error.
    #[error("Transform error: {0}")]
    Transform(#[from] TransformError),

    /// No events to analyze.
    #[error("No events to analyze")]
    EmptyInput,
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for loading operations.
pub type LoadResult<T> = Result<T, LoadError>;

/// Result type for exponent decoding.
pub type DecodeResult<T> = Result<T, DecodeError>;

/// Result type for inflation operations.
pub type InflationResult<T> = Result<T, InflationError>;

/// Result type for lookup operations.
pub type LookupResult<T> = Result<T, LookupError>;

/// Result type for CPI operations.
pub type CpiResult<T> = Result<T, CpiError>;

/// Result type for validation.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Result type for transformation operations.
pub type TransformResult<T> = Result<T, TransformError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;
