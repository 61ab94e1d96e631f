//! Candidate suggestion generation.
//!
//! Each pattern variant has its own generator and its own minimum
//! confidence gate; below the gate the pattern is skipped entirely. Copy
//! comes from a fixed per-event-type template table with a generic
//! fallback for unrecognized kinds.
//!
//! Suggestion ids are deterministic functions of the pattern's
//! discriminating fields so that a dismissal recorded in one pass still
//! matches the "same" suggestion regenerated in the next.

use crate::types::{
    EventType, FactorKind, Pattern, PatternKind, PatternSource, RelevanceFactor, SequencePattern,
    Suggestion, SuggestionCategory, SuggestionPreferences, SuggestionType, TimePattern,
};
use chrono::{DateTime, Duration, Utc};
use serde_json::json;

/// Minimum pattern confidence per variant before a suggestion is synthesized.
pub const TIME_SUGGESTION_MIN_CONFIDENCE: f64 = 0.65;
pub const FREQUENCY_SUGGESTION_MIN_CONFIDENCE: f64 = 0.65;
pub const SEQUENCE_SUGGESTION_MIN_CONFIDENCE: f64 = 0.70;
pub const LOCATION_SUGGESTION_MIN_CONFIDENCE: f64 = 0.70;

/// Factor seed for the non-confidence slot of each variant.
const TIME_FREQUENCY_SEED: f64 = 0.7;
const SEQUENCE_CONTEXT_SEED: f64 = 0.8;
const FREQUENCY_IMPORTANCE_SEED: f64 = 0.6;
const LOCATION_CONTEXT_SEED: f64 = 0.75;

/// Suggestions tied to a specific time of day go stale fast.
const TIME_SENSITIVE_TTL_HOURS: i64 = 1;

/// Convert every qualifying pattern into a candidate suggestion.
///
/// Empty when suggestions are disabled or snoozed. Candidates come back
/// unscored (`relevance_score == 0.0`); run scoring before filtering.
pub fn generate(
    patterns: &[Pattern],
    prefs: &SuggestionPreferences,
    now: DateTime<Utc>,
) -> Vec<Suggestion> {
    if !prefs.enabled {
        return Vec::new();
    }
    if prefs.disabled_until.is_some_and(|until| until > now) {
        return Vec::new();
    }
    patterns.iter().filter_map(|p| from_pattern(p, now)).collect()
}

fn from_pattern(pattern: &Pattern, now: DateTime<Utc>) -> Option<Suggestion> {
    match &pattern.kind {
        PatternKind::Time(time) => from_time(pattern, time, now),
        PatternKind::Sequence(sequence) => from_sequence(pattern, sequence, now),
        PatternKind::Frequency(_) => from_frequency(pattern, now),
        PatternKind::Location(_) => from_location(pattern, now),
    }
}

fn from_time(pattern: &Pattern, time: &TimePattern, now: DateTime<Utc>) -> Option<Suggestion> {
    if pattern.confidence < TIME_SUGGESTION_MIN_CONFIDENCE {
        return None;
    }
    let template = template_for(&pattern.event_type);

    let (id_suffix, when, expires) = if let Some(tod) = time.time_of_day {
        (
            format!("{:02}{:02}", tod.hour, tod.minute),
            format!("around {:02}:{:02}", tod.hour, tod.minute),
            Some(now + Duration::hours(TIME_SENSITIVE_TTL_HOURS)),
        )
    } else if let Some(day) = time.days_of_week.first() {
        (
            format!("dow{day}"),
            format!("on {}s", weekday_name(*day)),
            None,
        )
    } else if let Some(day) = time.days_of_month.first() {
        (
            format!("dom{day}"),
            format!("on day {day} of the month"),
            None,
        )
    } else {
        return None;
    };

    Some(Suggestion {
        id: format!("time-{}-{}", pattern.event_type.as_str(), id_suffix),
        title: template.title.to_string(),
        description: format!(
            "You usually {} {}. Want to set this up ahead of time?",
            template.activity, when
        ),
        suggestion_type: template.suggestion_type,
        category: template.category,
        source: source_of(pattern),
        relevance_score: 0.0,
        relevance_factors: vec![
            RelevanceFactor {
                factor: FactorKind::Time,
                score: pattern.confidence,
            },
            RelevanceFactor {
                factor: FactorKind::Frequency,
                score: TIME_FREQUENCY_SEED,
            },
        ],
        created: now,
        expires,
        action_params: json!({
            "pattern_type": "time",
            "event_type": pattern.event_type.as_str(),
            "time": time,
            "metadata": pattern.metadata,
        }),
        dismissed: false,
        implemented: false,
        feedback_provided: false,
    })
}

fn from_sequence(
    pattern: &Pattern,
    sequence: &SequencePattern,
    now: DateTime<Utc>,
) -> Option<Suggestion> {
    if pattern.confidence < SEQUENCE_SUGGESTION_MIN_CONFIDENCE {
        return None;
    }
    let template = template_for(&pattern.event_type);
    let labels: Vec<&str> = sequence
        .steps
        .iter()
        .map(|s| s.event_type.as_str())
        .collect();

    Some(Suggestion {
        id: format!("seq-{}-{}", labels.join("+"), sequence.time_window_ms),
        title: "Turn this routine into an automation".to_string(),
        description: format!(
            "You often follow {} within {} minutes. One tap could run the whole routine.",
            labels.join(" then "),
            sequence.time_window_ms / 60_000
        ),
        suggestion_type: SuggestionType::Automation,
        category: template.category,
        source: source_of(pattern),
        relevance_score: 0.0,
        relevance_factors: vec![
            RelevanceFactor {
                factor: FactorKind::Frequency,
                score: pattern.confidence,
            },
            RelevanceFactor {
                factor: FactorKind::Context,
                score: SEQUENCE_CONTEXT_SEED,
            },
        ],
        created: now,
        expires: None,
        action_params: json!({
            "pattern_type": "sequence",
            "steps": labels,
            "time_window_ms": sequence.time_window_ms,
        }),
        dismissed: false,
        implemented: false,
        feedback_provided: false,
    })
}

fn from_frequency(pattern: &Pattern, now: DateTime<Utc>) -> Option<Suggestion> {
    if pattern.confidence < FREQUENCY_SUGGESTION_MIN_CONFIDENCE {
        return None;
    }
    let PatternKind::Frequency(freq) = &pattern.kind else {
        return None;
    };
    let template = template_for(&pattern.event_type);

    Some(Suggestion {
        id: format!(
            "freq-{}-{}",
            pattern.event_type.as_str(),
            freq.time_unit.as_str()
        ),
        title: template.title.to_string(),
        description: format!(
            "You {} about {} time(s) per {}. A shortcut could save you the repetition.",
            template.activity, freq.count, freq.time_unit
        ),
        suggestion_type: template.suggestion_type,
        category: template.category,
        source: source_of(pattern),
        relevance_score: 0.0,
        relevance_factors: vec![
            RelevanceFactor {
                factor: FactorKind::Frequency,
                score: pattern.confidence,
            },
            RelevanceFactor {
                factor: FactorKind::Importance,
                score: FREQUENCY_IMPORTANCE_SEED,
            },
        ],
        created: now,
        expires: None,
        action_params: json!({
            "pattern_type": "frequency",
            "event_type": pattern.event_type.as_str(),
            "count": freq.count,
            "time_unit": freq.time_unit.as_str(),
            "metadata": pattern.metadata,
        }),
        dismissed: false,
        implemented: false,
        feedback_provided: false,
    })
}

fn from_location(pattern: &Pattern, now: DateTime<Utc>) -> Option<Suggestion> {
    if pattern.confidence < LOCATION_SUGGESTION_MIN_CONFIDENCE {
        return None;
    }
    let PatternKind::Location(location) = &pattern.kind else {
        return None;
    };
    let template = template_for(&pattern.event_type);

    let place = location
        .location_name
        .clone()
        .unwrap_or_else(|| format!("{:.3}, {:.3}", location.latitude, location.longitude));

    Some(Suggestion {
        id: format!(
            "loc-{}-{:.3}_{:.3}",
            pattern.event_type.as_str(),
            location.latitude,
            location.longitude
        ),
        title: template.title.to_string(),
        description: format!(
            "You tend to {} when you're at {}. Want this ready next time you arrive?",
            template.activity, place
        ),
        suggestion_type: template.suggestion_type,
        category: template.category,
        source: source_of(pattern),
        relevance_score: 0.0,
        relevance_factors: vec![
            RelevanceFactor {
                factor: FactorKind::Location,
                score: pattern.confidence,
            },
            RelevanceFactor {
                factor: FactorKind::Context,
                score: LOCATION_CONTEXT_SEED,
            },
        ],
        created: now,
        expires: None,
        action_params: json!({
            "pattern_type": "location",
            "event_type": pattern.event_type.as_str(),
            "latitude": location.latitude,
            "longitude": location.longitude,
            "radius_meters": location.radius_meters,
            "location_name": location.location_name,
        }),
        dismissed: false,
        implemented: false,
        feedback_provided: false,
    })
}

fn source_of(pattern: &Pattern) -> PatternSource {
    PatternSource {
        pattern_type: pattern.kind.pattern_type(),
        confidence: pattern.confidence,
    }
}

// ============================================
// Copy templates
// ============================================

struct Template {
    title: &'static str,
    /// Verb phrase slotted into descriptions ("you usually {activity} ...").
    activity: &'static str,
    category: SuggestionCategory,
    suggestion_type: SuggestionType,
}

/// Fixed lookup from event type to suggestion copy.
///
/// Unrecognized event types get a generic fallback rather than being
/// dropped; detection upstream is type-agnostic.
fn template_for(event_type: &EventType) -> Template {
    match event_type {
        EventType::TransportationBooked => Template {
            title: "Automate your ride",
            activity: "book a ride",
            category: SuggestionCategory::Transportation,
            suggestion_type: SuggestionType::Automation,
        },
        EventType::FoodOrdered => Template {
            title: "Order your usual",
            activity: "order food",
            category: SuggestionCategory::Food,
            suggestion_type: SuggestionType::Automation,
        },
        EventType::CalendarEventCreated => Template {
            title: "Schedule it for you",
            activity: "create calendar events",
            category: SuggestionCategory::Productivity,
            suggestion_type: SuggestionType::Reminder,
        },
        EventType::MessageSent => Template {
            title: "Draft your check-in",
            activity: "send messages",
            category: SuggestionCategory::Communication,
            suggestion_type: SuggestionType::Action,
        },
        EventType::AppOpened => Template {
            title: "Your daily briefing",
            activity: "open the app",
            category: SuggestionCategory::Productivity,
            suggestion_type: SuggestionType::Feature,
        },
        EventType::ReminderSet => Template {
            title: "Set reminders automatically",
            activity: "set reminders",
            category: SuggestionCategory::Productivity,
            suggestion_type: SuggestionType::Reminder,
        },
        EventType::AutomationCreated => Template {
            title: "Explore advanced automations",
            activity: "build automations",
            category: SuggestionCategory::System,
            suggestion_type: SuggestionType::Feature,
        },
        EventType::TemplateShared => Template {
            title: "Share with your circle",
            activity: "share templates",
            category: SuggestionCategory::Communication,
            suggestion_type: SuggestionType::Connection,
        },
        EventType::Other(_) => Template {
            title: "Streamline a routine",
            activity: "repeat this action",
            category: SuggestionCategory::System,
            suggestion_type: SuggestionType::Action,
        },
    }
}

fn weekday_name(day: u32) -> &'static str {
    match day {
        0 => "Sunday",
        1 => "Monday",
        2 => "Tuesday",
        3 => "Wednesday",
        4 => "Thursday",
        5 => "Friday",
        6 => "Saturday",
        _ => "Unknown",
    }
}
