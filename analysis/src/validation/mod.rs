//! Raw event validation.
//!
//! Runs before any transformation:
//!
//! - identifiers are unique (`REFNUM`)
//! - counts and damage magnitudes are finite and non-negative
//!
//! Any failure aborts the run; there is no partial result.

use std::collections::HashSet;

use crate::error::{ValidationError, ValidationResult};
use crate::models::RawEvent;

/// Messages kept in [`ValidationError::InvalidValues`]
const MAX_REPORTED_ERRORS: usize = 10;

/// Check the value columns of one event.
///
/// # Returns
/// * `Ok(())` if valid
/// * `Err(Vec<String>)` with one message per offending column
pub fn check_event(event: &RawEvent) -> Result<(), Vec<String>> {
    let columns = [
        ("FATALITIES", event.fatalities),
        ("INJURIES", event.injuries),
        ("PROPDMG", event.property_magnitude),
        ("CROPDMG", event.crop_magnitude),
    ];

    let errors: Vec<String> = columns
        .iter()
        .filter(|(_, value)| !value.is_finite() || *value < 0.0)
        .map(|(column, value)| format!("event {}: {} = {}", event.refnum, column, value))
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Quick check for one event.
pub fn is_valid_event(event: &RawEvent) -> bool {
    check_event(event).is_ok()
}

/// Validate every event; the first duplicate identifier wins over value errors.
pub fn validate_events(events: &[RawEvent]) -> ValidationResult<()> {
    let mut seen: HashSet<u64> = HashSet::with_capacity(events.len());
    for event in events {
        if !seen.insert(event.refnum) {
            return Err(ValidationError::DuplicateId(event.refnum));
        }
    }

    let mut count = 0;
    let mut errors = Vec::new();
    for event in events {
        if let Err(errs) = check_event(event) {
            count += 1;
            for err in errs {
                if errors.len() < MAX_REPORTED_ERRORS {
                    errors.push(err);
                }
            }
        }
    }

    if count == 0 {
        Ok(())
    } else {
        Err(ValidationError::InvalidValues { count, errors })
    }
}
