//! Core domain types for nudge
//!
//! These types form the data contract between the instrumentation that
//! records user actions, the pattern analyzer, and the suggestion engine.
//!
//! ## Terminology
//!
//! | Term | Definition |
//! |------|------------|
//! | **TrackingEvent** | One observed user action, recorded by external instrumentation |
//! | **Pattern** | A statistically supported regularity detected in a user's event history |
//! | **Confidence** | A [0,1] score for how well-supported a detected Pattern is |
//! | **Suggestion** | A candidate proactive recommendation derived from one Pattern |
//! | **Relevance score** | A [0,1] weighted combination of confidence, recency, preference, and urgency |
//! | **Preferences** | Per-user configuration gating which suggestions are shown |
//! | **Feedback** | Explicit user signal (relevant/helpful + reason) used to adapt suggestion volume |
//!
//! Events are read-only to this crate. Suggestions are recomputed on every
//! analysis pass; their ids are deterministic functions of the originating
//! pattern so that dismissals survive regeneration.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Open key/value metadata attached to events and patterns.
///
/// Semantically opaque to the analyzer except for equality comparison.
/// A `BTreeMap` keeps iteration order deterministic across passes.
pub type Metadata = BTreeMap<String, serde_json::Value>;

// ============================================
// Events
// ============================================

/// Known user action kinds.
///
/// The set of instrumented actions is closed, but logs may contain kinds
/// this build does not know about; those round-trip through
/// [`EventType::Other`] without losing the raw label.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventType {
    TransportationBooked,
    FoodOrdered,
    CalendarEventCreated,
    MessageSent,
    AppOpened,
    ReminderSet,
    AutomationCreated,
    TemplateShared,
    /// An event kind with no dedicated variant; carries the raw label.
    Other(String),
}

impl EventType {
    /// Returns the identifier used in logs and storage.
    pub fn as_str(&self) -> &str {
        match self {
            EventType::TransportationBooked => "transportation_booked",
            EventType::FoodOrdered => "food_ordered",
            EventType::CalendarEventCreated => "calendar_event_created",
            EventType::MessageSent => "message_sent",
            EventType::AppOpened => "app_opened",
            EventType::ReminderSet => "reminder_set",
            EventType::AutomationCreated => "automation_created",
            EventType::TemplateShared => "template_shared",
            EventType::Other(s) => s.as_str(),
        }
    }
}

impl From<&str> for EventType {
    fn from(s: &str) -> Self {
        match s {
            "transportation_booked" => EventType::TransportationBooked,
            "food_ordered" => EventType::FoodOrdered,
            "calendar_event_created" => EventType::CalendarEventCreated,
            "message_sent" => EventType::MessageSent,
            "app_opened" => EventType::AppOpened,
            "reminder_set" => EventType::ReminderSet,
            "automation_created" => EventType::AutomationCreated,
            "template_shared" => EventType::TemplateShared,
            other => EventType::Other(other.to_string()),
        }
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for EventType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for EventType {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(EventType::from(s.as_str()))
    }
}

/// Coordinates attached to an event by the recording device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationInfo {
    pub latitude: f64,
    pub longitude: f64,
    /// Resolved place name, if reverse geocoding ran at record time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// One observed user action.
///
/// Produced by external instrumentation at action time; read-only here.
/// The analyzer tolerates a partial, windowed view of history; eviction
/// of old events is a collaborator concern.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingEvent {
    /// Owner of this event; every event belongs to exactly one user.
    pub user_id: String,
    /// What kind of action this was.
    pub event_type: EventType,
    /// When the action happened. Analysis sorts ascending by this field.
    pub timestamp: DateTime<Utc>,
    /// Opaque action details; compared only for equality.
    #[serde(default)]
    pub metadata: Metadata,
    /// Descriptive device attributes, if recorded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_info: Option<BTreeMap<String, String>>,
    /// Where the action happened, if recorded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_info: Option<LocationInfo>,
}

// ============================================
// Patterns
// ============================================

/// Discriminant of a [`PatternKind`], used for provenance back-links.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternType {
    Time,
    Sequence,
    Frequency,
    Location,
}

impl PatternType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PatternType::Time => "time",
            PatternType::Sequence => "sequence",
            PatternType::Frequency => "frequency",
            PatternType::Location => "location",
        }
    }
}

impl std::fmt::Display for PatternType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A recurring time of day, extracted from a 30-minute slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeOfDay {
    /// Hour of day, 0-23.
    pub hour: u32,
    /// Minute anchor of the slot (0 or 30).
    pub minute: u32,
    /// Width of the slot in minutes.
    pub tolerance_minutes: u32,
}

/// A time-based regularity.
///
/// Any subset of the dimensions may be populated on one instance, but each
/// detector emits single-dimension instances: the daily detector fills
/// `time_of_day`, the weekly detector `days_of_week`, the monthly detector
/// `days_of_month`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimePattern {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_of_day: Option<TimeOfDay>,
    /// Days of week, 0 (Sunday) through 6 (Saturday).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub days_of_week: Vec<u32>,
    /// Days of month, 1-31.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub days_of_month: Vec<u32>,
    /// Months of year, 0-11.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub months_of_year: Vec<u32>,
}

/// One step of a detected action sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequenceStep {
    pub event_type: EventType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
}

/// An ordered run of actions observed to co-occur within a time window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequencePattern {
    pub steps: Vec<SequenceStep>,
    /// Maximum gap between consecutive steps, in milliseconds.
    pub time_window_ms: i64,
}

/// Calendar unit for frequency patterns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeUnit {
    Hour,
    Day,
    Week,
    Month,
}

impl TimeUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeUnit::Hour => "hour",
            TimeUnit::Day => "day",
            TimeUnit::Week => "week",
            TimeUnit::Month => "month",
        }
    }

    /// Fixed millisecond equivalent; a month is approximated as 30 days.
    pub fn unit_ms(&self) -> i64 {
        match self {
            TimeUnit::Hour => 3_600_000,
            TimeUnit::Day => 86_400_000,
            TimeUnit::Week => 604_800_000,
            TimeUnit::Month => 2_592_000_000,
        }
    }
}

impl std::fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// "N times per unit" regularity for one event type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrequencyPattern {
    /// Occurrences per unit, rounded.
    pub count: u32,
    pub time_unit: TimeUnit,
    /// Number of units the rate is expressed over.
    pub duration: u32,
}

/// A place the user repeatedly performs an action at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationPattern {
    pub latitude: f64,
    pub longitude: f64,
    pub radius_meters: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_name: Option<String>,
}

/// Variant payload of a detected [`Pattern`].
///
/// A closed union: adding a pattern kind is a compile-checked extension,
/// every consumer matches exhaustively.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PatternKind {
    Time(TimePattern),
    Sequence(SequencePattern),
    Frequency(FrequencyPattern),
    Location(LocationPattern),
}

impl PatternKind {
    pub fn pattern_type(&self) -> PatternType {
        match self {
            PatternKind::Time(_) => PatternType::Time,
            PatternKind::Sequence(_) => PatternType::Sequence,
            PatternKind::Frequency(_) => PatternType::Frequency,
            PatternKind::Location(_) => PatternType::Location,
        }
    }
}

/// A detected regularity in one user's event history.
///
/// Patterns are recomputed on every analysis pass and never persisted by
/// this crate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pattern {
    /// The event type this pattern is about (for sequences, the first step).
    pub event_type: EventType,
    /// How statistically well-supported the pattern is, in [0,1].
    pub confidence: f64,
    /// Metadata keys whose value was identical across every contributing event.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: Metadata,
    pub kind: PatternKind,
}

// ============================================
// Suggestions
// ============================================

/// What acting on a suggestion would do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionType {
    Automation,
    Action,
    Reminder,
    Connection,
    Feature,
}

impl SuggestionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SuggestionType::Automation => "automation",
            SuggestionType::Action => "action",
            SuggestionType::Reminder => "reminder",
            SuggestionType::Connection => "connection",
            SuggestionType::Feature => "feature",
        }
    }
}

/// Topical category a suggestion belongs to; preferences gate per category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionCategory {
    Productivity,
    Communication,
    Transportation,
    Food,
    Entertainment,
    System,
}

impl SuggestionCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            SuggestionCategory::Productivity => "productivity",
            SuggestionCategory::Communication => "communication",
            SuggestionCategory::Transportation => "transportation",
            SuggestionCategory::Food => "food",
            SuggestionCategory::Entertainment => "entertainment",
            SuggestionCategory::System => "system",
        }
    }

    /// All categories, for building complete preference maps.
    pub const ALL: [SuggestionCategory; 6] = [
        SuggestionCategory::Productivity,
        SuggestionCategory::Communication,
        SuggestionCategory::Transportation,
        SuggestionCategory::Food,
        SuggestionCategory::Entertainment,
        SuggestionCategory::System,
    ];
}

impl std::fmt::Display for SuggestionCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Named contributor to a relevance score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactorKind {
    Time,
    Frequency,
    Context,
    Importance,
    Location,
    UserPreference,
    Feedback,
    Urgency,
}

impl FactorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FactorKind::Time => "time",
            FactorKind::Frequency => "frequency",
            FactorKind::Context => "context",
            FactorKind::Importance => "importance",
            FactorKind::Location => "location",
            FactorKind::UserPreference => "user_preference",
            FactorKind::Feedback => "feedback",
            FactorKind::Urgency => "urgency",
        }
    }
}

/// One entry of a suggestion's relevance breakdown.
///
/// Retained after scoring for explainability.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RelevanceFactor {
    pub factor: FactorKind,
    pub score: f64,
}

/// Provenance back-link from a suggestion to its originating pattern.
///
/// A value, not an object reference: suggestions stay decoupled from the
/// pattern instances they were derived from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PatternSource {
    pub pattern_type: PatternType,
    pub confidence: f64,
}

/// A candidate proactive recommendation derived from one pattern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    /// Deterministic id derived from the originating pattern's
    /// discriminating fields; stable across regeneration passes.
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    pub suggestion_type: SuggestionType,
    pub category: SuggestionCategory,
    pub source: PatternSource,
    /// Computed by scoring; 0.0 until then.
    pub relevance_score: f64,
    pub relevance_factors: Vec<RelevanceFactor>,
    pub created: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires: Option<DateTime<Utc>>,
    /// Payload a downstream executor needs to act on the suggestion
    /// without re-deriving the source pattern.
    pub action_params: serde_json::Value,
    pub dismissed: bool,
    pub implemented: bool,
    pub feedback_provided: bool,
}

// ============================================
// Preferences
// ============================================

/// How surfaced suggestions are presented by the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayMode {
    Banner,
    Feed,
    Quiet,
}

/// How aggressively suggestions are surfaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensitivityLevel {
    Low,
    Medium,
    High,
}

/// Per-user suggestion configuration.
///
/// Mutated only by explicit preference updates ([`PreferencesPatch`]) or by
/// the feedback-adaptation routine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestionPreferences {
    pub enabled: bool,
    /// Per-category gate. Categories absent from the map count as enabled.
    pub categories_enabled: BTreeMap<SuggestionCategory, bool>,
    pub min_relevance_threshold: f64,
    pub max_suggestions_per_day: u32,
    pub max_suggestions_visible: usize,
    pub suggestions_display_mode: DisplayMode,
    pub sensitivity_level: SensitivityLevel,
    /// Suggestions are suppressed entirely until this instant, if set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disabled_until: Option<DateTime<Utc>>,
}

impl Default for SuggestionPreferences {
    fn default() -> Self {
        let categories_enabled = SuggestionCategory::ALL
            .iter()
            .map(|c| (*c, true))
            .collect();
        Self {
            enabled: true,
            categories_enabled,
            min_relevance_threshold: 0.5,
            max_suggestions_per_day: 10,
            max_suggestions_visible: 3,
            suggestions_display_mode: DisplayMode::Feed,
            sensitivity_level: SensitivityLevel::Medium,
            disabled_until: None,
        }
    }
}

impl SuggestionPreferences {
    /// Whether a category is enabled. Absent entries default to enabled.
    pub fn category_enabled(&self, category: SuggestionCategory) -> bool {
        self.categories_enabled.get(&category).copied().unwrap_or(true)
    }

    /// Merge a partial update over this record, field by field.
    ///
    /// Shallow by design: a patched `categories_enabled` replaces the whole
    /// map. Merging cannot conflict; partial updates always succeed.
    pub fn apply_patch(&mut self, patch: PreferencesPatch) {
        if let Some(enabled) = patch.enabled {
            self.enabled = enabled;
        }
        if let Some(categories) = patch.categories_enabled {
            self.categories_enabled = categories;
        }
        if let Some(threshold) = patch.min_relevance_threshold {
            self.min_relevance_threshold = threshold;
        }
        if let Some(per_day) = patch.max_suggestions_per_day {
            self.max_suggestions_per_day = per_day;
        }
        if let Some(visible) = patch.max_suggestions_visible {
            self.max_suggestions_visible = visible;
        }
        if let Some(mode) = patch.suggestions_display_mode {
            self.suggestions_display_mode = mode;
        }
        if let Some(level) = patch.sensitivity_level {
            self.sensitivity_level = level;
        }
        if let Some(disabled_until) = patch.disabled_until {
            self.disabled_until = disabled_until;
        }
    }
}

/// Partial [`SuggestionPreferences`] update.
///
/// `disabled_until` is doubly optional so a patch can distinguish
/// "leave as is" (`None`) from "clear the suppression" (`Some(None)`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PreferencesPatch {
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(default)]
    pub categories_enabled: Option<BTreeMap<SuggestionCategory, bool>>,
    #[serde(default)]
    pub min_relevance_threshold: Option<f64>,
    #[serde(default)]
    pub max_suggestions_per_day: Option<u32>,
    #[serde(default)]
    pub max_suggestions_visible: Option<usize>,
    #[serde(default)]
    pub suggestions_display_mode: Option<DisplayMode>,
    #[serde(default)]
    pub sensitivity_level: Option<SensitivityLevel>,
    #[serde(default, with = "double_option")]
    pub disabled_until: Option<Option<DateTime<Utc>>>,
}

mod double_option {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Option<Option<DateTime<Utc>>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(inner) => inner.serialize(serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Option<DateTime<Utc>>>, D::Error> {
        Ok(Some(Option::deserialize(deserializer)?))
    }
}

// ============================================
// Feedback
// ============================================

/// Why a suggestion was judged irrelevant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IrrelevanceReason {
    Frequency,
    Timing,
    Category,
    NotInterested,
}

impl IrrelevanceReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            IrrelevanceReason::Frequency => "frequency",
            IrrelevanceReason::Timing => "timing",
            IrrelevanceReason::Category => "category",
            IrrelevanceReason::NotInterested => "not_interested",
        }
    }
}

/// Explicit user signal about one issued suggestion.
///
/// Write-once per submission; read by the adaptation routine, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestionFeedback {
    pub suggestion_id: String,
    pub relevant: bool,
    pub helpful: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason_if_irrelevant: Option<IrrelevanceReason>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    pub timestamp: DateTime<Utc>,
}
