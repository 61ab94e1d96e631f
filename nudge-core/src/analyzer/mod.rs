//! Behavioral pattern analyzer
//!
//! Pure, deterministic detection over a time-ordered event window. One
//! analysis pass runs four independent detectors and returns every pattern
//! whose evidence clears both a minimum-occurrence floor and the shared
//! confidence floor:
//!
//! | Detector | Evidence | Emits |
//! |----------|----------|-------|
//! | [`time`] | 3+ events in a 30-minute slot / weekday / month-day bucket | `PatternKind::Time` |
//! | [`sequence`] | An ordered run of actions recurring 3+ times inside a window | `PatternKind::Sequence` |
//! | [`frequency`] | 5+ events of one type at a steady per-unit rate | `PatternKind::Frequency` |
//! | [`location`] | 3+ events of one type at one place | `PatternKind::Location` |
//!
//! Sparse data is the expected steady state, not a failure: detectors
//! return fewer (possibly zero) patterns and never error. Input is sorted
//! defensively at the entry point: sequence windowing silently corrupts
//! on unordered input, so the sort is mandatory rather than an optimization.

mod frequency;
mod location;
mod sequence;
mod time;

use crate::types::{Metadata, Pattern, TrackingEvent};
use std::collections::BTreeMap;

/// Patterns below this confidence are discarded before return.
pub const MIN_CONFIDENCE_THRESHOLD: f64 = 0.6;
/// Minimum events of one type before time detection considers the group.
pub const TIME_PATTERN_MIN_OCCURRENCES: usize = 3;
/// Minimum recurrences of an ordered run to count as a sequence.
pub const SEQUENCE_PATTERN_MIN_OCCURRENCES: usize = 3;
/// Minimum events of one type before frequency detection considers the group.
pub const FREQUENCY_PATTERN_MIN_OCCURRENCES: usize = 5;
/// Minimum events at one place before location detection considers the group.
pub const LOCATION_PATTERN_MIN_OCCURRENCES: usize = 3;

pub(crate) type EventGroups<'a> = BTreeMap<&'a crate::types::EventType, Vec<&'a TrackingEvent>>;

/// Detect all qualifying patterns in one user's event window.
///
/// Deterministic: identical input (including tie order) yields identical
/// output. The same underlying behavior may legitimately surface through
/// more than one detector, or at more than one sequence-window granularity;
/// nothing is deduplicated here.
pub fn detect_patterns(events: &[TrackingEvent]) -> Vec<Pattern> {
    let mut sorted: Vec<TrackingEvent> = events.to_vec();
    // Stable sort preserves recorded order for identical timestamps.
    sorted.sort_by_key(|e| e.timestamp);

    let groups = group_by_type(&sorted);

    tracing::debug!(
        events = sorted.len(),
        event_types = groups.len(),
        "Running pattern detection pass"
    );

    let mut patterns = Vec::new();
    patterns.extend(time::detect(&groups));
    patterns.extend(sequence::detect(&sorted));
    patterns.extend(frequency::detect(&groups, sorted.len()));
    patterns.extend(location::detect(&sorted));

    patterns.retain(|p| p.confidence >= MIN_CONFIDENCE_THRESHOLD);

    tracing::debug!(patterns = patterns.len(), "Pattern detection pass complete");
    patterns
}

/// Group events by type, preserving per-group timestamp order.
///
/// `BTreeMap` keys keep cross-group iteration order deterministic.
fn group_by_type(events: &[TrackingEvent]) -> EventGroups<'_> {
    let mut groups: EventGroups<'_> = BTreeMap::new();
    for event in events {
        groups.entry(&event.event_type).or_default().push(event);
    }
    groups
}

/// Metadata keys whose JSON value is identical across every event.
///
/// Keys with any divergence are dropped. Order-independent: values compare
/// structurally, and `Metadata` is a sorted map.
pub(crate) fn common_metadata(events: &[&TrackingEvent]) -> Metadata {
    let Some((first, rest)) = events.split_first() else {
        return Metadata::new();
    };
    first
        .metadata
        .iter()
        .filter(|(key, value)| rest.iter().all(|e| e.metadata.get(*key) == Some(value)))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

/// Population standard deviation.
pub(crate) fn std_deviation(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    let variance = values
        .iter()
        .map(|v| (v - mean) * (v - mean))
        .sum::<f64>()
        / values.len() as f64;
    variance.sqrt()
}


#[cfg(test)]
mod tests {
    use super::testutil::{at, event, event_with_metadata};
    use super::*;
    use crate::types::EventType;
    use serde_json::json;

    #[test]
    fn test_empty_input_yields_no_patterns() {
        assert!(detect_patterns(&[]).is_empty());
    }

    #[test]
    fn test_single_event_yields_no_patterns() {
        let events = vec![event(EventType::AppOpened, at(2025, 3, 1, 9, 0))];
        assert!(detect_patterns(&events).is_empty());
    }

    #[test]
    fn test_unsorted_input_is_sorted_defensively() {
        // Same five lunches, deliberately shuffled: detection must match
        // the sorted run exactly.
        let mut events = vec![
            event(EventType::FoodOrdered, at(2025, 3, 3, 12, 10)),
            event(EventType::FoodOrdered, at(2025, 3, 1, 12, 0)),
            event(EventType::FoodOrdered, at(2025, 3, 5, 12, 15)),
            event(EventType::FoodOrdered, at(2025, 3, 2, 12, 5)),
            event(EventType::FoodOrdered, at(2025, 3, 4, 11, 55)),
        ];
        let shuffled = detect_patterns(&events);
        events.sort_by_key(|e| e.timestamp);
        let sorted = detect_patterns(&events);
        assert_eq!(shuffled, sorted);
        assert!(!sorted.is_empty());
    }

    #[test]
    fn test_all_confidences_within_bounds() {
        let mut events = Vec::new();
        for day in 1..=14 {
            events.push(event(EventType::AppOpened, at(2025, 3, day, 8, 0)));
            events.push(event(EventType::MessageSent, at(2025, 3, day, 8, 5)));
            events.push(event(EventType::FoodOrdered, at(2025, 3, day, 12, 30)));
        }
        for p in detect_patterns(&events) {
            assert!(
                (0.0..=1.0).contains(&p.confidence),
                "confidence out of bounds: {}",
                p.confidence
            );
        }
    }

    #[test]
    fn test_common_metadata_keeps_identical_keys_only() {
        let a = event_with_metadata(
            EventType::FoodOrdered,
            at(2025, 3, 1, 12, 0),
            &[
                ("restaurant", json!("Luigi's")),
                ("total", json!(18.5)),
            ],
        );
        let b = event_with_metadata(
            EventType::FoodOrdered,
            at(2025, 3, 2, 12, 0),
            &[
                ("restaurant", json!("Luigi's")),
                ("total", json!(22.0)),
            ],
        );
        let common = common_metadata(&[&a, &b]);
        assert_eq!(common.get("restaurant"), Some(&json!("Luigi's")));
        assert!(!common.contains_key("total"));
    }

    #[test]
    fn test_common_metadata_missing_key_counts_as_divergence() {
        let a = event_with_metadata(
            EventType::FoodOrdered,
            at(2025, 3, 1, 12, 0),
            &[("restaurant", json!("Luigi's"))],
        );
        let b = event(EventType::FoodOrdered, at(2025, 3, 2, 12, 0));
        assert!(common_metadata(&[&a, &b]).is_empty());
    }

    #[test]
    fn test_std_deviation() {
        assert_eq!(std_deviation(&[]), 0.0);
        assert_eq!(std_deviation(&[5.0]), 0.0);
        assert_eq!(std_deviation(&[2.0, 2.0, 2.0]), 0.0);
        let sd = std_deviation(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        assert!((sd - 2.0).abs() < 1e-9);
    }
}
