//! Action-sequence detection.
//!
//! For each fixed time window, one walk over the sorted event list
//! accumulates runs of events whose consecutive gaps stay inside the
//! window; a larger gap closes the current run. Runs of two or more steps
//! are counted by their ordered event-type labels, and labels recurring
//! often enough become `SequencePattern`s.
//!
//! The same underlying behavior may surface at several window
//! granularities. That is intentional and not deduplicated: a 5-minute
//! morning routine is also a 15-minute one, and the engine weighs them
//! independently.

use super::SEQUENCE_PATTERN_MIN_OCCURRENCES;
use crate::types::{EventType, Pattern, PatternKind, SequencePattern, SequenceStep, TrackingEvent};
use std::collections::BTreeMap;

/// Window granularities, in minutes.
const SEQUENCE_WINDOWS_MINUTES: [i64; 4] = [5, 15, 30, 60];
/// Confidence is capped below certainty; recurrence alone never proves
/// intent.
const MAX_SEQUENCE_CONFIDENCE: f64 = 0.95;

pub(super) fn detect(events: &[TrackingEvent]) -> Vec<Pattern> {
    if events.len() < 2 * SEQUENCE_PATTERN_MIN_OCCURRENCES {
        return Vec::new();
    }

    let mut patterns = Vec::new();
    for window_minutes in SEQUENCE_WINDOWS_MINUTES {
        let window_ms = window_minutes * 60_000;
        patterns.extend(detect_in_window(events, window_ms));
    }
    patterns
}

fn detect_in_window(events: &[TrackingEvent], window_ms: i64) -> Vec<Pattern> {
    // Ordered label tuple -> (steps, occurrence count). BTreeMap keyed by
    // the joined label keeps emission order deterministic.
    let mut occurrences: BTreeMap<String, (Vec<EventType>, usize)> = BTreeMap::new();

    let mut run: Vec<&TrackingEvent> = Vec::new();
    for event in events {
        if let Some(prev) = run.last() {
            let gap_ms = (event.timestamp - prev.timestamp).num_milliseconds();
            if gap_ms > window_ms {
                close_run(&run, &mut occurrences);
                run.clear();
            }
        }
        run.push(event);
    }
    close_run(&run, &mut occurrences);

    let total_events = events.len();
    let mut patterns = Vec::new();
    for (_, (steps, count)) in occurrences {
        if count < SEQUENCE_PATTERN_MIN_OCCURRENCES {
            continue;
        }
        let expected = total_events as f64 / steps.len() as f64;
        let confidence = (count as f64 / expected * 0.8 + 0.2).min(MAX_SEQUENCE_CONFIDENCE);

        patterns.push(Pattern {
            event_type: steps[0].clone(),
            confidence,
            metadata: Default::default(),
            kind: PatternKind::Sequence(SequencePattern {
                steps: steps
                    .into_iter()
                    .map(|event_type| SequenceStep {
                        event_type,
                        metadata: None,
                    })
                    .collect(),
                time_window_ms: window_ms,
            }),
        });
    }
    patterns
}

/// Record a closed run if it has at least two steps.
fn close_run(run: &[&TrackingEvent], occurrences: &mut BTreeMap<String, (Vec<EventType>, usize)>) {
    if run.len() < 2 {
        return;
    }
    let labels: Vec<EventType> = run.iter().map(|e| e.event_type.clone()).collect();
    let key = labels
        .iter()
        .map(|l| l.as_str())
        .collect::<Vec<_>>()
        .join(">");
    occurrences
        .entry(key)
        .or_insert_with(|| (labels, 0))
        .1 += 1;
}
