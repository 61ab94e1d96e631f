//! Frequency ("N times per unit") detection.
//!
//! For each event-type group with enough evidence, four fixed unit sizes
//! are evaluated independently. A unit qualifies when the group's span is
//! long enough to observe it at least three times and the per-unit rate is
//! at least one. Confidence combines rate consistency (coefficient of
//! variation across non-empty unit slots, inverted) with coverage (the
//! share of unit slots that saw any activity at all).

use super::{common_metadata, std_deviation, EventGroups, FREQUENCY_PATTERN_MIN_OCCURRENCES};
use crate::types::{EventType, FrequencyPattern, Pattern, PatternKind, TimeUnit, TrackingEvent};
use std::collections::BTreeMap;

/// A group spanning less than this has too little history for rate claims.
const MIN_SPAN_MS: i64 = 86_400_000; // 1 day
/// A unit is only evaluated when the span covers it at least this often.
const MIN_UNITS_IN_SPAN: i64 = 3;
/// Weight of rate consistency vs. slot coverage in the confidence score.
const CONSISTENCY_WEIGHT: f64 = 0.7;
const COVERAGE_WEIGHT: f64 = 0.3;

const UNITS: [TimeUnit; 4] = [TimeUnit::Hour, TimeUnit::Day, TimeUnit::Week, TimeUnit::Month];

pub(super) fn detect(groups: &EventGroups, total_events: usize) -> Vec<Pattern> {
    if total_events < FREQUENCY_PATTERN_MIN_OCCURRENCES {
        return Vec::new();
    }

    let mut patterns = Vec::new();
    for (event_type, events) in groups {
        if events.len() < FREQUENCY_PATTERN_MIN_OCCURRENCES {
            continue;
        }
        let first = events[0].timestamp;
        let last = events[events.len() - 1].timestamp;
        let span_ms = (last - first).num_milliseconds();
        if span_ms < MIN_SPAN_MS {
            continue;
        }
        for unit in UNITS {
            if let Some(pattern) = evaluate_unit(event_type, events, span_ms, unit) {
                patterns.push(pattern);
            }
        }
    }
    patterns
}

fn evaluate_unit(
    event_type: &EventType,
    events: &[&TrackingEvent],
    span_ms: i64,
    unit: TimeUnit,
) -> Option<Pattern> {
    let unit_ms = unit.unit_ms();
    if span_ms < MIN_UNITS_IN_SPAN * unit_ms {
        return None;
    }

    let total_slots = (span_ms as f64 / unit_ms as f64).ceil() as i64;
    let events_per_unit = events.len() as f64 / total_slots as f64;
    if events_per_unit < 1.0 {
        return None;
    }

    // Per-slot counts, slot 0 anchored at the group's first event.
    let first = events[0].timestamp;
    let mut slot_counts: BTreeMap<i64, usize> = BTreeMap::new();
    for event in events {
        let slot = (event.timestamp - first).num_milliseconds() / unit_ms;
        *slot_counts.entry(slot).or_insert(0) += 1;
    }

    let counts: Vec<f64> = slot_counts.values().map(|c| *c as f64).collect();
    let mean = counts.iter().sum::<f64>() / counts.len() as f64;
    let cv = std_deviation(&counts) / mean;
    // An event exactly at the span boundary falls into one slot past
    // ceil(span/unit); clamp so coverage stays a ratio.
    let coverage = (counts.len() as f64 / total_slots as f64).min(1.0);
    let confidence = (1.0 - cv).max(0.0) * CONSISTENCY_WEIGHT + coverage * COVERAGE_WEIGHT;

    Some(Pattern {
        event_type: event_type.clone(),
        confidence,
        metadata: common_metadata(events),
        kind: PatternKind::Frequency(FrequencyPattern {
            count: events_per_unit.round() as u32,
            time_unit: unit,
            duration: 1,
        }),
    })
}

#[cfg(test)]
mod tests {
    use super::super::testutil::{at, event};
    use super::super::group_by_type;
    use super::*;

    fn detect_for(events: &[TrackingEvent]) -> Vec<Pattern> {
        let groups = group_by_type(events);
        detect(&groups, events.len())
    }

    #[test]
    fn test_daily_rate_detected() {
        // Two messages every day for a week: 2/day, perfectly consistent.
        let mut events = Vec::new();
        for day in 1..=7 {
            events.push(event(EventType::MessageSent, at(2025, 3, day, 9, 0)));
            events.push(event(EventType::MessageSent, at(2025, 3, day, 18, 0)));
        }
        let patterns = detect_for(&events);
        let daily = patterns
            .iter()
            .find_map(|p| match &p.kind {
                PatternKind::Frequency(f) if f.time_unit == TimeUnit::Day => Some((p, f)),
                _ => None,
            })
            .expect("expected a per-day frequency pattern");
        assert_eq!(daily.1.count, 2);
        assert_eq!(daily.1.duration, 1);
        assert!(daily.0.confidence >= 0.6);
    }

    #[test]
    fn test_single_event_never_synthesizes_frequency() {
        let events = vec![event(EventType::MessageSent, at(2025, 3, 1, 9, 0))];
        assert!(detect_for(&events).is_empty());
    }

    #[test]
    fn test_below_occurrence_floor_is_skipped() {
        // Four events across four days: under the floor of five, no
        // frequency pattern regardless of span.
        let events: Vec<TrackingEvent> = (1..=4)
            .map(|day| event(EventType::MessageSent, at(2025, 3, day, 9, 0)))
            .collect();
        assert!(detect_for(&events).is_empty());
    }

    #[test]
    fn test_sub_day_span_is_skipped() {
        // Five events inside one afternoon: span under a day.
        let events: Vec<TrackingEvent> = (0..5)
            .map(|i| event(EventType::MessageSent, at(2025, 3, 1, 13 + i, 0)))
            .collect();
        assert!(detect_for(&events).is_empty());
    }

    #[test]
    fn test_unit_skipped_when_span_too_short_for_it() {
        // Six days of data: day qualifies, week and month do not
        // (span < 3 units), hour rate is far below 1/unit.
        let mut events = Vec::new();
        for day in 1..=6 {
            events.push(event(EventType::MessageSent, at(2025, 3, day, 9, 0)));
        }
        let patterns = detect_for(&events);
        assert!(!patterns.is_empty());
        for p in &patterns {
            match &p.kind {
                PatternKind::Frequency(f) => assert_eq!(f.time_unit, TimeUnit::Day),
                other => panic!("unexpected pattern {other:?}"),
            }
        }
    }

    #[test]
    fn test_bursty_rate_scores_below_steady_rate() {
        // Steady: one event per day for ten days.
        let steady: Vec<TrackingEvent> = (1..=10)
            .map(|day| event(EventType::AppOpened, at(2025, 3, day, 9, 0)))
            .collect();
        // Bursty: same count, crammed into two days at the span's edges.
        let mut bursty = Vec::new();
        for i in 0..5 {
            bursty.push(event(EventType::AppOpened, at(2025, 3, 1, 8 + i, 0)));
        }
        for i in 0..5 {
            bursty.push(event(EventType::AppOpened, at(2025, 3, 10, 8 + i, 0)));
        }

        let steady_conf = detect_for(&steady)
            .iter()
            .filter(|p| matches!(&p.kind, PatternKind::Frequency(f) if f.time_unit == TimeUnit::Day))
            .map(|p| p.confidence)
            .next();
        let bursty_conf = detect_for(&bursty)
            .iter()
            .filter(|p| matches!(&p.kind, PatternKind::Frequency(f) if f.time_unit == TimeUnit::Day))
            .map(|p| p.confidence)
            .next();

        let steady_conf = steady_conf.expect("steady rate should be detected");
        if let Some(bursty_conf) = bursty_conf {
            assert!(steady_conf > bursty_conf);
        }
    }
}
