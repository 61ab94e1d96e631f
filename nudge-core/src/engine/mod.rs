//! Suggestion engine
//!
//! Turns detected patterns into a ranked, capped list of suggestions and
//! owns the per-user session state around it.
//!
//! ## Architecture
//!
//! The pipeline is four pure stages; each returns new values and takes
//! every input explicitly:
//!
//! ```text
//! detect(events)                 -> patterns      (analyzer module)
//! generate(patterns, prefs, now) -> candidates
//! score(candidates, prefs, now)  -> scored
//! filter(scored, prefs, excl, now) -> visible
//! ```
//!
//! [`SuggestionSession`] wraps the pipeline with the state one user's
//! session needs: preferences, the dismissed/implemented exclusion sets,
//! and feedback history. Sessions are plain constructible values, one per
//! user, built and torn down by the caller, with no global instances and
//! no cross-user sharing. Within one user, mutating entry points perform
//! read-modify-write and must be serialized by the host.
//!
//! A suggestion's lifecycle: generated, then visible or filtered, then
//! dismissed, implemented, or expired. The terminal states are permanent:
//! exclusion is by id-set membership, and ids are deterministic, so a
//! dismissal outlives regeneration.

mod generate;
mod score;

pub use generate::{
    generate, FREQUENCY_SUGGESTION_MIN_CONFIDENCE, LOCATION_SUGGESTION_MIN_CONFIDENCE,
    SEQUENCE_SUGGESTION_MIN_CONFIDENCE, TIME_SUGGESTION_MIN_CONFIDENCE,
};
pub use score::{factor_weight, score, WEIGHT_AGE, WEIGHT_CATEGORY};

use crate::types::{
    IrrelevanceReason, Pattern, Suggestion, SuggestionFeedback, SuggestionPreferences,
    PreferencesPatch,
};
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;

/// Floor below which feedback adaptation never pushes the daily cap.
pub const MIN_SUGGESTIONS_PER_DAY: u32 = 2;
/// How much one "too frequent" complaint lowers the daily cap.
pub const SUGGESTIONS_PER_DAY_STEP: u32 = 2;

// ============================================
// Filtering
// ============================================

/// Ids a user has permanently acted on.
///
/// Held separately from the suggestions themselves: candidates are rebuilt
/// every pass, exclusions persist for the session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExclusionSet {
    dismissed: BTreeSet<String>,
    implemented: BTreeSet<String>,
}

impl ExclusionSet {
    pub fn contains(&self, id: &str) -> bool {
        self.dismissed.contains(id) || self.implemented.contains(id)
    }

    pub fn dismiss(&mut self, id: &str) {
        self.dismissed.insert(id.to_string());
    }

    pub fn implement(&mut self, id: &str) {
        self.implemented.insert(id.to_string());
    }

    pub fn is_dismissed(&self, id: &str) -> bool {
        self.dismissed.contains(id)
    }

    pub fn is_implemented(&self, id: &str) -> bool {
        self.implemented.contains(id)
    }
}

/// Reduce a scored candidate set to what the user should see.
///
/// Drops disabled categories, sub-threshold scores, excluded ids, and
/// expired suggestions; sorts by score descending (stable, so generation
/// order breaks ties); caps at `max_suggestions_visible`.
pub fn filter(
    suggestions: &[Suggestion],
    prefs: &SuggestionPreferences,
    exclusions: &ExclusionSet,
    now: DateTime<Utc>,
) -> Vec<Suggestion> {
    let mut visible: Vec<Suggestion> = suggestions
        .iter()
        .filter(|s| prefs.category_enabled(s.category))
        .filter(|s| s.relevance_score >= prefs.min_relevance_threshold)
        .filter(|s| !exclusions.contains(&s.id))
        .filter(|s| !s.dismissed && !s.implemented)
        .filter(|s| s.expires.map_or(true, |expires| expires > now))
        .cloned()
        .collect();

    visible.sort_by(|a, b| {
        b.relevance_score
            .partial_cmp(&a.relevance_score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    visible.truncate(prefs.max_suggestions_visible);
    visible
}

// ============================================
// Feedback adaptation
// ============================================

/// Derive updated preferences from one piece of feedback, if warranted.
///
/// Pure with respect to preferences: returns `None` when nothing changes.
/// Only the "too frequent" complaint adapts anything today: it lowers the
/// daily cap by [`SUGGESTIONS_PER_DAY_STEP`] down to
/// [`MIN_SUGGESTIONS_PER_DAY`]. The other irrelevance reasons are recorded
/// as future-scoring signals but deliberately change no weights.
pub fn adapt_preferences(
    prefs: &SuggestionPreferences,
    feedback: &SuggestionFeedback,
) -> Option<SuggestionPreferences> {
    if feedback.relevant {
        return None;
    }
    match feedback.reason_if_irrelevant {
        Some(IrrelevanceReason::Frequency) => {
            let lowered = prefs
                .max_suggestions_per_day
                .saturating_sub(SUGGESTIONS_PER_DAY_STEP)
                .max(MIN_SUGGESTIONS_PER_DAY);
            if lowered == prefs.max_suggestions_per_day {
                return None;
            }
            let mut updated = prefs.clone();
            updated.max_suggestions_per_day = lowered;
            Some(updated)
        }
        Some(reason) => {
            tracing::debug!(
                reason = reason.as_str(),
                suggestion_id = %feedback.suggestion_id,
                "Irrelevance reason recorded; no scoring adjustment for this reason yet"
            );
            None
        }
        None => None,
    }
}

// ============================================
// Per-user session
// ============================================

/// One user's suggestion state for the lifetime of a session.
///
/// Holds preferences, exclusions, feedback history, and the scored
/// candidates of the most recent pass. Authoritative persistence of all of
/// these is the caller's concern; the session is the in-memory working
/// copy.
#[derive(Debug, Clone)]
pub struct SuggestionSession {
    user_id: String,
    preferences: SuggestionPreferences,
    exclusions: ExclusionSet,
    feedback: Vec<SuggestionFeedback>,
    /// Scored candidates from the most recent [`run`](Self::run).
    suggestions: Vec<Suggestion>,
}

impl SuggestionSession {
    pub fn new(user_id: impl Into<String>, preferences: SuggestionPreferences) -> Self {
        Self {
            user_id: user_id.into(),
            preferences,
            exclusions: ExclusionSet::default(),
            feedback: Vec::new(),
            suggestions: Vec::new(),
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn preferences(&self) -> &SuggestionPreferences {
        &self.preferences
    }

    /// Scored candidates from the most recent pass, including ones the
    /// filter hides.
    pub fn suggestions(&self) -> &[Suggestion] {
        &self.suggestions
    }

    pub fn feedback_history(&self) -> &[SuggestionFeedback] {
        &self.feedback
    }

    pub fn exclusions(&self) -> &ExclusionSet {
        &self.exclusions
    }

    /// Run one generate → score pass over freshly detected patterns and
    /// return the filtered, ranked result.
    pub fn run(&mut self, patterns: &[Pattern], now: DateTime<Utc>) -> Vec<Suggestion> {
        let candidates = generate(patterns, &self.preferences, now);
        let mut scored = score(candidates, &self.preferences, now);

        // Regenerated candidates that were already acted on keep their
        // terminal flags.
        for suggestion in &mut scored {
            if self.exclusions.is_dismissed(&suggestion.id) {
                suggestion.dismissed = true;
            }
            if self.exclusions.is_implemented(&suggestion.id) {
                suggestion.implemented = true;
            }
        }

        tracing::debug!(
            user_id = %self.user_id,
            patterns = patterns.len(),
            candidates = scored.len(),
            "Suggestion pass complete"
        );

        self.suggestions = scored;
        self.visible(now)
    }

    /// The filtered view of the current candidates.
    pub fn visible(&self, now: DateTime<Utc>) -> Vec<Suggestion> {
        filter(&self.suggestions, &self.preferences, &self.exclusions, now)
    }

    /// Permanently exclude a suggestion the user waved off.
    ///
    /// Idempotent; unknown ids are a no-op (callers race with expiry and
    /// filtering).
    pub fn mark_dismissed(&mut self, id: &str) {
        let Some(suggestion) = self.suggestions.iter_mut().find(|s| s.id == id) else {
            tracing::debug!(user_id = %self.user_id, id, "Dismiss for unknown suggestion ignored");
            return;
        };
        suggestion.dismissed = true;
        self.exclusions.dismiss(id);
        tracing::debug!(user_id = %self.user_id, id, "Suggestion dismissed");
    }

    /// Permanently exclude a suggestion the user acted on.
    ///
    /// Idempotent; unknown ids are a no-op.
    pub fn mark_implemented(&mut self, id: &str) {
        let Some(suggestion) = self.suggestions.iter_mut().find(|s| s.id == id) else {
            tracing::debug!(user_id = %self.user_id, id, "Implement for unknown suggestion ignored");
            return;
        };
        suggestion.implemented = true;
        self.exclusions.implement(id);
        tracing::debug!(user_id = %self.user_id, id, "Suggestion implemented");
    }

    /// Record user feedback and apply any preference adaptation it
    /// warrants. Unknown suggestion ids are a no-op.
    pub fn record_feedback(&mut self, feedback: SuggestionFeedback) {
        let Some(suggestion) = self
            .suggestions
            .iter_mut()
            .find(|s| s.id == feedback.suggestion_id)
        else {
            tracing::debug!(
                user_id = %self.user_id,
                id = %feedback.suggestion_id,
                "Feedback for unknown suggestion ignored"
            );
            return;
        };
        suggestion.feedback_provided = true;

        if let Some(updated) = adapt_preferences(&self.preferences, &feedback) {
            tracing::info!(
                user_id = %self.user_id,
                max_suggestions_per_day = updated.max_suggestions_per_day,
                "Preferences adapted from feedback"
            );
            self.preferences = updated;
        }
        self.feedback.push(feedback);
    }

    /// Merge a partial preferences update over the session's record.
    pub fn apply_preferences_patch(&mut self, patch: PreferencesPatch) {
        self.preferences.apply_patch(patch);
    }
}
