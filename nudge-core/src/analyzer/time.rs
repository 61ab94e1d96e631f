//! Time-of-day, day-of-week, and day-of-month detection.
//!
//! Each detector buckets one event-type group along a single calendar
//! dimension and emits one single-dimension `TimePattern` per qualifying
//! bucket. Daily confidence measures how tightly events cluster inside
//! their slot; weekly and monthly confidence measures how much of the
//! observed span the bucket covers.

use super::{common_metadata, std_deviation, EventGroups, TIME_PATTERN_MIN_OCCURRENCES};
use crate::types::{EventType, Pattern, PatternKind, TimeOfDay, TimePattern, TrackingEvent};
use chrono::{Datelike, Timelike};
use std::collections::BTreeMap;

/// Width of a time-of-day slot.
const SLOT_MINUTES: u32 = 30;
/// Minimum events inside one bucket for it to qualify.
const MIN_BUCKET_SIZE: usize = 3;
/// Ceiling on the minutes-into-day spread; at or beyond this the
/// consistency score bottoms out at zero.
const MAX_SPREAD_MINUTES: f64 = 180.0;

pub(super) fn detect(groups: &EventGroups) -> Vec<Pattern> {
    let mut patterns = Vec::new();
    for (event_type, events) in groups {
        if events.len() < TIME_PATTERN_MIN_OCCURRENCES {
            continue;
        }
        patterns.extend(detect_daily(event_type, events));
        patterns.extend(detect_weekly(event_type, events));
        patterns.extend(detect_monthly(event_type, events));
    }
    patterns
}

/// Bucket events into 30-minute time-of-day slots.
///
/// Confidence is the standard deviation of minutes-since-midnight across
/// the slot's events, clamped to a 3-hour ceiling and inverted to a [0,1]
/// consistency score.
fn detect_daily(event_type: &EventType, events: &[&TrackingEvent]) -> Vec<Pattern> {
    let mut slots: BTreeMap<(u32, u32), Vec<&TrackingEvent>> = BTreeMap::new();
    for event in events {
        let hour = event.timestamp.hour();
        let slot_minute = event.timestamp.minute() / SLOT_MINUTES * SLOT_MINUTES;
        slots.entry((hour, slot_minute)).or_default().push(event);
    }

    let mut patterns = Vec::new();
    for ((hour, minute), slot_events) in &slots {
        if slot_events.len() < MIN_BUCKET_SIZE {
            continue;
        }
        let minutes_into_day: Vec<f64> = slot_events
            .iter()
            .map(|e| (e.timestamp.hour() * 60 + e.timestamp.minute()) as f64)
            .collect();
        let spread = std_deviation(&minutes_into_day).min(MAX_SPREAD_MINUTES);
        let confidence = 1.0 - spread / MAX_SPREAD_MINUTES;

        patterns.push(Pattern {
            event_type: event_type.clone(),
            confidence,
            metadata: common_metadata(slot_events),
            kind: PatternKind::Time(TimePattern {
                time_of_day: Some(TimeOfDay {
                    hour: *hour,
                    minute: *minute,
                    tolerance_minutes: SLOT_MINUTES,
                }),
                ..TimePattern::default()
            }),
        });
    }
    patterns
}

/// Bucket events by day of week (0 = Sunday).
///
/// Coverage is bucket size over the number of weeks the whole group spans,
/// so three Mondays out of three observed weeks scores higher than three
/// Mondays out of twelve.
fn detect_weekly(event_type: &EventType, events: &[&TrackingEvent]) -> Vec<Pattern> {
    let span_days = match group_span_days(events) {
        Some(days) => days,
        None => return Vec::new(),
    };
    let total_weeks = (span_days as f64 / 7.0).ceil().max(1.0);

    let mut buckets: BTreeMap<u32, Vec<&TrackingEvent>> = BTreeMap::new();
    for event in events {
        let day = event.timestamp.weekday().num_days_from_sunday();
        buckets.entry(day).or_default().push(event);
    }

    let mut patterns = Vec::new();
    for (day, bucket) in &buckets {
        if bucket.len() < MIN_BUCKET_SIZE {
            continue;
        }
        let coverage = (bucket.len() as f64 / total_weeks).min(1.0);
        let confidence = coverage * 0.9 + 0.1;

        patterns.push(Pattern {
            event_type: event_type.clone(),
            confidence,
            metadata: common_metadata(bucket),
            kind: PatternKind::Time(TimePattern {
                days_of_week: vec![*day],
                ..TimePattern::default()
            }),
        });
    }
    patterns
}

/// Bucket events by day of month (1-31); same logic as weekly with the
/// span measured in calendar months.
fn detect_monthly(event_type: &EventType, events: &[&TrackingEvent]) -> Vec<Pattern> {
    if group_span_days(events).is_none() {
        return Vec::new();
    }
    let first = events[0].timestamp;
    let last = events[events.len() - 1].timestamp;
    let month_diff =
        (last.year() - first.year()) * 12 + (last.month() as i32 - first.month() as i32);
    let total_months = f64::from(month_diff + 1).max(1.0);

    let mut buckets: BTreeMap<u32, Vec<&TrackingEvent>> = BTreeMap::new();
    for event in events {
        buckets.entry(event.timestamp.day()).or_default().push(event);
    }

    let mut patterns = Vec::new();
    for (day, bucket) in &buckets {
        if bucket.len() < MIN_BUCKET_SIZE {
            continue;
        }
        let coverage = (bucket.len() as f64 / total_months).min(1.0);
        let confidence = coverage * 0.9 + 0.1;

        patterns.push(Pattern {
            event_type: event_type.clone(),
            confidence,
            metadata: common_metadata(bucket),
            kind: PatternKind::Time(TimePattern {
                days_of_month: vec![*day],
                ..TimePattern::default()
            }),
        });
    }
    patterns
}

/// Whole days between the group's first and last event.
///
/// `None` when the group spans zero duration (a single instant): that is
/// insufficient evidence for any calendar-recurrence dimension.
fn group_span_days(events: &[&TrackingEvent]) -> Option<i64> {
    let first = events.first()?.timestamp;
    let last = events.last()?.timestamp;
    let days = (last - first).num_days();
    if last <= first {
        return None;
    }
    Some(days)
}

#[cfg(test)]
mod tests {
    use super::super::testutil::{at, event, event_with_metadata};
    use super::super::{detect_patterns, group_by_type};
    use super::*;
    use serde_json::json;

    fn time_of_day_patterns(patterns: &[Pattern]) -> Vec<&Pattern> {
        patterns
            .iter()
            .filter(|p| {
                matches!(&p.kind, PatternKind::Time(t) if t.time_of_day.is_some())
            })
            .collect()
    }

    #[test]
    fn test_daily_lunch_pattern() {
        // Five lunches on five days; four land in the 12:00 slot with a
        // minutes-into-day spread of ~5.6, one in the 11:30 slot.
        let events = vec![
            event(EventType::FoodOrdered, at(2025, 3, 1, 12, 0)),
            event(EventType::FoodOrdered, at(2025, 3, 2, 12, 10)),
            event(EventType::FoodOrdered, at(2025, 3, 3, 12, 5)),
            event(EventType::FoodOrdered, at(2025, 3, 4, 11, 55)),
            event(EventType::FoodOrdered, at(2025, 3, 5, 12, 15)),
        ];
        let patterns = detect_patterns(&events);
        let daily = time_of_day_patterns(&patterns);
        assert_eq!(daily.len(), 1);

        let pattern = daily[0];
        assert_eq!(pattern.event_type, EventType::FoodOrdered);
        match &pattern.kind {
            PatternKind::Time(t) => {
                let tod = t.time_of_day.unwrap();
                assert_eq!(tod.hour, 12);
                assert_eq!(tod.minute, 0);
                assert_eq!(tod.tolerance_minutes, 30);
            }
            other => panic!("expected time pattern, got {other:?}"),
        }
        assert!(pattern.confidence >= 0.6);
        assert!(pattern.confidence > 0.95, "tight cluster should score high");
    }

    #[test]
    fn test_two_events_is_insufficient() {
        let events = vec![
            event(EventType::FoodOrdered, at(2025, 3, 1, 12, 0)),
            event(EventType::FoodOrdered, at(2025, 3, 2, 12, 0)),
        ];
        let patterns = detect_patterns(&events);
        assert!(patterns
            .iter()
            .all(|p| !matches!(p.kind, PatternKind::Time(_))));
    }

    #[test]
    fn test_weekly_pattern_coverage() {
        // Three consecutive Mondays, nothing else: coverage 3/3 = 1.0,
        // confidence 1.0*0.9 + 0.1 = 1.0.
        let events = vec![
            event(EventType::CalendarEventCreated, at(2025, 3, 3, 9, 0)),
            event(EventType::CalendarEventCreated, at(2025, 3, 10, 14, 0)),
            event(EventType::CalendarEventCreated, at(2025, 3, 17, 19, 0)),
        ];
        let groups = group_by_type(&events);
        let group = groups.values().next().unwrap();
        let patterns = detect_weekly(&EventType::CalendarEventCreated, group);
        assert_eq!(patterns.len(), 1);
        match &patterns[0].kind {
            PatternKind::Time(t) => assert_eq!(t.days_of_week, vec![1]), // Monday
            other => panic!("expected time pattern, got {other:?}"),
        }
        assert!((patterns[0].confidence - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_weekly_sparse_coverage_scores_low() {
        // Three Mondays spread over ~12 weeks: coverage 3/12 = 0.25,
        // confidence 0.325, below the pass-level floor.
        let events = vec![
            event(EventType::CalendarEventCreated, at(2025, 1, 6, 9, 0)),
            event(EventType::CalendarEventCreated, at(2025, 2, 10, 13, 0)),
            event(EventType::CalendarEventCreated, at(2025, 3, 24, 18, 0)),
        ];
        let groups = group_by_type(&events);
        let group = groups.values().next().unwrap();
        let patterns = detect_weekly(&EventType::CalendarEventCreated, group);
        assert_eq!(patterns.len(), 1);
        assert!(patterns[0].confidence < 0.6);
        // And the full pass drops it.
        assert!(detect_patterns(&events).is_empty());
    }

    #[test]
    fn test_monthly_pattern() {
        // The 1st of three consecutive months.
        let events = vec![
            event(EventType::TransportationBooked, at(2025, 1, 1, 8, 0)),
            event(EventType::TransportationBooked, at(2025, 2, 1, 8, 30)),
            event(EventType::TransportationBooked, at(2025, 3, 1, 7, 45)),
        ];
        let groups = group_by_type(&events);
        let group = groups.values().next().unwrap();
        let patterns = detect_monthly(&EventType::TransportationBooked, group);
        assert_eq!(patterns.len(), 1);
        match &patterns[0].kind {
            PatternKind::Time(t) => assert_eq!(t.days_of_month, vec![1]),
            other => panic!("expected time pattern, got {other:?}"),
        }
        assert!((patterns[0].confidence - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_span_yields_no_calendar_patterns() {
        // Three events at the same instant: no weekly or monthly evidence.
        let ts = at(2025, 3, 3, 9, 0);
        let events = vec![
            event(EventType::AppOpened, ts),
            event(EventType::AppOpened, ts),
            event(EventType::AppOpened, ts),
        ];
        let groups = group_by_type(&events);
        let group = groups.values().next().unwrap();
        assert!(detect_weekly(&EventType::AppOpened, group).is_empty());
        assert!(detect_monthly(&EventType::AppOpened, group).is_empty());
    }

    #[test]
    fn test_slot_metadata_intersection() {
        let events = vec![
            event_with_metadata(
                EventType::FoodOrdered,
                at(2025, 3, 1, 12, 0),
                &[("restaurant", json!("Luigi's")), ("total", json!(18))],
            ),
            event_with_metadata(
                EventType::FoodOrdered,
                at(2025, 3, 2, 12, 5),
                &[("restaurant", json!("Luigi's")), ("total", json!(21))],
            ),
            event_with_metadata(
                EventType::FoodOrdered,
                at(2025, 3, 3, 12, 10),
                &[("restaurant", json!("Luigi's")), ("total", json!(18))],
            ),
        ];
        let patterns = detect_patterns(&events);
        let daily = time_of_day_patterns(&patterns);
        assert_eq!(daily.len(), 1);
        assert_eq!(daily[0].metadata.get("restaurant"), Some(&json!("Luigi's")));
        assert!(!daily[0].metadata.contains_key("total"));
    }
}
