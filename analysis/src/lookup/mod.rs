//! Curated event-type lookup table.
//!
//! The table is a static, versioned asset (`data/evtype_lookup.v1.csv`)
//! mapping historical `EVTYPE` labels to one of the 48 canonical categories.
//! It is loaded once at startup and never modified.
//!
//! Format: a header row, then `historical label,canonical label`.
//! Lines starting with `#` are comments.

use serde::Serialize;
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::{LookupError, LookupResult};
use crate::models::{EventCategory, RawEvent};
use crate::transform::canonical::normalize_label;

/// Default location of the lookup asset (relative to current dir)
pub const DEFAULT_LOOKUP_PATH: &str = "data/evtype_lookup.v1.csv";

/// Historical label -> canonical category
#[derive(Debug, Clone)]
pub struct LookupTable {
    version: String,
    entries: HashMap<String, EventCategory>,
}

/// A label with no lookup entry and how many rows carry it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnmatchedLabel {
    pub label: String,
    pub rows: usize,
}

impl LookupTable {
    /// Load the asset from disk; the version comes from the file name.
    pub fn load(path: impl AsRef<Path>) -> LookupResult<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        Self::from_reader(file, version_from_path(path))
    }

    /// Parse a lookup table from any reader.
    pub fn from_reader<R: Read>(reader: R, version: impl Into<String>) -> LookupResult<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .comment(Some(b'#'))
            .flexible(false)
            .from_reader(reader);

        let mut entries: HashMap<String, EventCategory> = HashMap::new();

        for record in csv_reader.records() {
            let record = record?;
            let line = record.position().map(|p| p.line()).unwrap_or(0);
            let historical = normalize_label(record.get(0).unwrap_or(""));
            let canonical = record.get(1).unwrap_or("");

            let category = EventCategory::from_label(canonical).ok_or_else(|| {
                LookupError::UnknownCategory {
                    line,
                    label: canonical.to_string(),
                }
            })?;

            if let Some(existing) = entries.get(&historical) {
                if *existing != category {
                    return Err(LookupError::ConflictingEntry {
                        label: historical,
                        first: existing.label().to_string(),
                        second: category.label().to_string(),
                    });
                }
                continue;
            }
            entries.insert(historical, category);
        }

        Ok(Self {
            version: version.into(),
            entries,
        })
    }

    /// Category for an already-normalized label
    pub fn get(&self, normalized: &str) -> Option<EventCategory> {
        self.entries.get(normalized).copied()
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of distinct categories the table maps to
    pub fn categories_covered(&self) -> usize {
        let mut categories: Vec<EventCategory> = self.entries.values().copied().collect();
        categories.sort();
        categories.dedup();
        categories.len()
    }

    /// Distinct normalized labels with no entry, most frequent first.
    pub fn unmatched_labels(&self, events: &[RawEvent]) -> Vec<UnmatchedLabel> {
        let mut counts: HashMap<String, usize> = HashMap::new();
        for event in events {
            let label = normalize_label(&event.evtype);
            if !self.entries.contains_key(&label) {
                *counts.entry(label).or_default() += 1;
            }
        }

        let mut unmatched: Vec<UnmatchedLabel> = counts
            .into_iter()
            .map(|(label, rows)| UnmatchedLabel { label, rows })
            .collect();
        unmatched.sort_by(|a, b| b.rows.cmp(&a.rows).then_with(|| a.label.cmp(&b.label)));
        unmatched
    }
}

/// `evtype_lookup.v1.csv` -> `v1`
pub fn version_from_path(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .and_then(|stem| stem.rsplit_once('.'))
        .map(|(_, suffix)| suffix)
        .filter(|suffix| {
            suffix.len() > 1
                && suffix.starts_with('v')
                && suffix[1..].chars().all(|c| c.is_ascii_digit())
        })
        .unwrap_or("unversioned")
        .to_string()
}
