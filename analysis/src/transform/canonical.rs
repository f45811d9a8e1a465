//! Event-type canonicalization.
//!
//! Historical `EVTYPE` labels are normalized (uppercase, trimmed) and looked
//! up in the curated table. There is no fuzzy matching: a label missing from
//! the table stays uncategorized.

use crate::lookup::LookupTable;
use crate::models::EventCategory;

/// Uppercase and strip surrounding whitespace.
pub fn normalize_label(label: &str) -> String {
    label.trim().to_uppercase()
}

/// Canonical category for a raw label, `None` when unmatched.
pub fn canonicalize(label: &str, lookup: &LookupTable) -> Option<EventCategory> {
    lookup.get(&normalize_label(label))
}
