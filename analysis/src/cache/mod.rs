//! CPI series cache - keep fetched series on disk
//!
//! One JSON file per series id, holding the observations and fetch metadata.
//! Series ids are case-insensitive (FRED ids are upper-case).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::cpi::CpiSeries;
use crate::error::CpiResult;

/// Directory where series are stored (relative to current dir)
pub const DEFAULT_CACHE_DIR: &str = ".stormdata/cpi";

/// A cached series with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredSeries {
    /// The series itself
    pub series: CpiSeries,
    /// Fetch timestamp (RFC 3339)
    pub fetched_at: String,
    /// Where it was fetched from
    pub source_url: String,
}

/// On-disk cache of CPI series
pub struct CpiCache {
    /// Directory where series are stored
    cache_dir: PathBuf,
    /// Loaded series (id -> stored series)
    series: HashMap<String, StoredSeries>,
}

impl CpiCache {
    /// Create a cache in the default directory, loading existing entries
    pub fn new() -> Self {
        Self::with_dir(DEFAULT_CACHE_DIR)
    }

    /// Create a cache with a custom directory
    pub fn with_dir(dir: impl AsRef<Path>) -> Self {
        let mut cache = Self {
            cache_dir: PathBuf::from(dir.as_ref()),
            series: HashMap::new(),
        };
        cache.load_all();
        cache
    }

    /// Load every cached series; unreadable files are skipped
    fn load_all(&mut self) {
        let entries = match fs::read_dir(&self.cache_dir) {
            Ok(e) => e,
            Err(_) => return,
        };

        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().is_some_and(|e| e == "json") {
                if let Ok(content) = fs::read_to_string(&path) {
                    if let Ok(stored) = serde_json::from_str::<StoredSeries>(&content) {
                        self.series.insert(stored.series.id.to_uppercase(), stored);
                    }
                }
            }
        }
    }

    /// All cached series, by id
    pub fn list(&self) -> Vec<&StoredSeries> {
        let mut stored: Vec<&StoredSeries> = self.series.values().collect();
        stored.sort_by(|a, b| a.series.id.cmp(&b.series.id));
        stored
    }

    /// Get a series by id
    pub fn get(&self, id: &str) -> Option<&StoredSeries> {
        self.series.get(&id.to_uppercase())
    }

    /// Store a series, replacing any previous copy
    pub fn save(&mut self, series: &CpiSeries, source_url: &str) -> CpiResult<PathBuf> {
        fs::create_dir_all(&self.cache_dir)?;

        let stored = StoredSeries {
            series: series.clone(),
            fetched_at: chrono::Utc::now().to_rfc3339(),
            source_url: source_url.to_string(),
        };

        let path = self.path_for(&series.id);
        let content = serde_json::to_string_pretty(&stored)?;
        fs::write(&path, content)?;

        self.series.insert(series.id.to_uppercase(), stored);
        Ok(path)
    }

    /// File that holds a series
    fn path_for(&self, id: &str) -> PathBuf {
        let slug: String = id
            .to_lowercase()
            .chars()
            .map(|c| if c.is_alphanumeric() { c } else { '-' })
            .collect::<String>()
            .split('-')
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("-");

        self.cache_dir.join(format!("{}.json", slug))
    }
}

impl Default for CpiCache {
    fn default() -> Self {
        Self::new()
    }
}
