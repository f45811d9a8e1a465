//! Transformation module.
//!
//! This module turns raw storm events into ranked aggregates:
//! - Exponent: damage exponent codes to powers of ten
//! - Inflation: CPI yearly averages and ratios to the base year
//! - Normalize: magnitude × 10^exponent × ratio
//! - Canonical: free-text labels to the 48 official event types
//! - Aggregate: per-category totals, top N with ties
//! - Pipeline: load, validate, tidy, aggregate, summarize

pub mod aggregate;
pub mod canonical;
pub mod exponent;
pub mod inflation;
pub mod normalize;
pub mod pipeline;

pub use aggregate::{aggregate, top_categories, truncate_with_ties, DEFAULT_TOP_N};
pub use canonical::{canonicalize, normalize_label};
pub use exponent::{decode_exponent, multiplier};
pub use inflation::{yearly_averages, InflationTable};
pub use normalize::{normalize, normalize_damage};
pub use pipeline::*;
