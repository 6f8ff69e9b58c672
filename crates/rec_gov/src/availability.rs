use std::collections::HashSet;

use chrono::NaiveDate;
use log::warn;
use serde_json::Value;

/// Collect every date in a monthly permit payload that has at least one
/// permit remaining, across all divisions.
///
/// The payload shape is
/// `payload.availability.<division>.date_availability.<date>.remaining`.
/// Missing levels count as empty, and a missing or non-numeric `remaining`
/// counts as zero. Date keys are read from their first 10 characters
/// (`YYYY-MM-DD`); keys that don't parse are logged and skipped.
pub fn extract_available_dates(payload: &Value) -> HashSet<NaiveDate> {
    let mut available = HashSet::new();

    let Some(divisions) = payload
        .get("payload")
        .and_then(|p| p.get("availability"))
        .and_then(Value::as_object)
    else {
        return available;
    };

    for (division_id, division) in divisions {
        let Some(date_map) = division
            .get("date_availability")
            .and_then(Value::as_object)
        else {
            continue;
        };

        for (date_str, slot) in date_map {
            let Some(date) = parse_date_key(date_str) else {
                warn!(
                    "Skipping unparseable date key {:?} in division {}",
                    date_str, division_id
                );
                continue;
            };

            if has_remaining(slot) {
                available.insert(date);
            }
        }
    }

    available
}

/// Parse the leading `YYYY-MM-DD` of a key such as `2026-06-15T00:00:00Z`
fn parse_date_key(key: &str) -> Option<NaiveDate> {
    let prefix = key.get(..10)?;
    NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok()
}

/// Any positive JSON number counts; integers past `i64` and floats included
fn has_remaining(slot: &Value) -> bool {
    slot.get("remaining")
        .and_then(Value::as_f64)
        .is_some_and(|n| n > 0.0)
}
