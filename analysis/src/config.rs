//! Analysis options.
//!
//! Defaults can be overridden from the environment (a `.env` file is read if
//! present) and then from CLI flags.
//!
//! | Variable               | Field            |
//! |------------------------|------------------|
//! | `STORMDATA_DATA`       | `storm_data`     |
//! | `STORMDATA_LOOKUP`     | `lookup`         |
//! | `STORMDATA_CPI_FILE`   | `cpi` (file)     |
//! | `STORMDATA_CPI_SERIES` | `cpi` (FRED id)  |
//! | `STORMDATA_CACHE_DIR`  | `cache_dir`      |
//! | `STORMDATA_TOP`        | `top_n`          |

use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

use crate::cache::DEFAULT_CACHE_DIR;
use crate::cpi::DEFAULT_SERIES;
use crate::lookup::DEFAULT_LOOKUP_PATH;
use crate::transform::aggregate::DEFAULT_TOP_N;

/// Default location of the storm events file (relative to current dir)
pub const DEFAULT_STORM_DATA_PATH: &str = "data/repdata_data_StormData.csv";

/// Where the monthly CPI series comes from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CpiSource {
    /// Local CSV in FRED layout
    File { path: PathBuf },
    /// FRED series, fetched and cached
    Fred { series: String },
}

impl Default for CpiSource {
    fn default() -> Self {
        CpiSource::Fred {
            series: DEFAULT_SERIES.to_string(),
        }
    }
}

/// Options for the analysis pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisOptions {
    /// Storm events CSV
    pub storm_data: PathBuf,

    /// Event-type lookup asset
    pub lookup: PathBuf,

    /// CPI series source
    pub cpi: CpiSource,

    /// Directory for the CPI cache
    pub cache_dir: PathBuf,

    /// Ignore the cached CPI series and fetch again
    pub refresh_cpi: bool,

    /// Rows kept per aggregate table (before ties)
    pub top_n: usize,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            storm_data: PathBuf::from(DEFAULT_STORM_DATA_PATH),
            lookup: PathBuf::from(DEFAULT_LOOKUP_PATH),
            cpi: CpiSource::default(),
            cache_dir: PathBuf::from(DEFAULT_CACHE_DIR),
            refresh_cpi: false,
            top_n: DEFAULT_TOP_N,
        }
    }
}

impl AnalysisOptions {
    /// Defaults overridden by `STORMDATA_*` variables
    pub fn from_env() -> Self {
        // Try loading .env file
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`AnalysisOptions::from_env`] with an explicit variable source
    pub fn from_lookup<F>(var: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut options = Self::default();
        let var = |key: &str| var(key).filter(|v| !v.trim().is_empty());

        if let Some(path) = var("STORMDATA_DATA") {
            options.storm_data = PathBuf::from(path);
        }
        if let Some(path) = var("STORMDATA_LOOKUP") {
            options.lookup = PathBuf::from(path);
        }
        if let Some(series) = var("STORMDATA_CPI_SERIES") {
            options.cpi = CpiSource::Fred { series };
        }
        // A local file wins over a series id
        if let Some(path) = var("STORMDATA_CPI_FILE") {
            options.cpi = CpiSource::File {
                path: PathBuf::from(path),
            };
        }
        if let Some(dir) = var("STORMDATA_CACHE_DIR") {
            options.cache_dir = PathBuf::from(dir);
        }
        if let Some(top) = var("STORMDATA_TOP").and_then(|v| v.trim().parse().ok()) {
            options.top_n = top;
        }

        options
    }
}
