//! Relevance scoring.
//!
//! The scoring model is a weighted mean over a suggestion's relevance
//! factors plus two synthesized terms (age decay, category preference),
//! adjusted by the user's sensitivity level. All weights live here as
//! named constants so the model can be audited and tested in isolation
//! from detection and generation.

use crate::types::{
    FactorKind, RelevanceFactor, SensitivityLevel, Suggestion, SuggestionPreferences,
};
use chrono::{DateTime, Duration, Utc};

/// Per-factor weights in the relevance mean.
pub const WEIGHT_TIME: f64 = 1.5;
pub const WEIGHT_LOCATION: f64 = 1.3;
pub const WEIGHT_USER_PREFERENCE: f64 = 2.0;
pub const WEIGHT_FEEDBACK: f64 = 1.8;
pub const WEIGHT_URGENCY: f64 = 1.7;
pub const WEIGHT_IMPORTANCE: f64 = 1.6;
pub const WEIGHT_DEFAULT: f64 = 1.0;

/// Weights of the two terms folded into the mean alongside the factors.
pub const WEIGHT_AGE: f64 = 1.2;
pub const WEIGHT_CATEGORY: f64 = 2.0;

/// Hours over which a fresh suggestion's age factor decays to zero.
pub const AGE_DECAY_HOURS: f64 = 24.0;

/// Global sensitivity multipliers.
pub const SENSITIVITY_LOW_MULTIPLIER: f64 = 0.8;
pub const SENSITIVITY_HIGH_MULTIPLIER: f64 = 1.2;

/// Urgency tiers by time remaining until expiry.
const URGENCY_IMMINENT: f64 = 0.9;
const URGENCY_SOON: f64 = 0.7;
const URGENCY_DISTANT: f64 = 0.3;

pub fn factor_weight(kind: FactorKind) -> f64 {
    match kind {
        FactorKind::Time => WEIGHT_TIME,
        FactorKind::Location => WEIGHT_LOCATION,
        FactorKind::UserPreference => WEIGHT_USER_PREFERENCE,
        FactorKind::Feedback => WEIGHT_FEEDBACK,
        FactorKind::Urgency => WEIGHT_URGENCY,
        FactorKind::Importance => WEIGHT_IMPORTANCE,
        FactorKind::Frequency | FactorKind::Context => WEIGHT_DEFAULT,
    }
}

/// Compute relevance scores for a freshly generated candidate set.
///
/// Appends an urgency factor to expiring suggestions (retained for
/// explainability), then writes each suggestion's `relevance_score`.
/// Deterministic and order-preserving.
pub fn score(
    mut suggestions: Vec<Suggestion>,
    prefs: &SuggestionPreferences,
    now: DateTime<Utc>,
) -> Vec<Suggestion> {
    for suggestion in &mut suggestions {
        score_one(suggestion, prefs, now);
    }
    suggestions
}

fn score_one(suggestion: &mut Suggestion, prefs: &SuggestionPreferences, now: DateTime<Utc>) {
    let age_hours = (now - suggestion.created).num_minutes() as f64 / 60.0;
    let age_factor = (1.0 - age_hours / AGE_DECAY_HOURS).max(0.0);

    let category_preference = if prefs.category_enabled(suggestion.category) {
        1.0
    } else {
        0.0
    };

    if let Some(expires) = suggestion.expires {
        suggestion.relevance_factors.push(RelevanceFactor {
            factor: FactorKind::Urgency,
            score: urgency_factor(expires, now),
        });
    }

    let mut weighted_sum = 0.0;
    let mut total_weight = 0.0;
    for factor in &suggestion.relevance_factors {
        let weight = factor_weight(factor.factor);
        weighted_sum += factor.score * weight;
        total_weight += weight;
    }
    weighted_sum += age_factor * WEIGHT_AGE;
    total_weight += WEIGHT_AGE;
    weighted_sum += category_preference * WEIGHT_CATEGORY;
    total_weight += WEIGHT_CATEGORY;

    let base = weighted_sum / total_weight;
    let adjusted = match prefs.sensitivity_level {
        SensitivityLevel::Low => base * SENSITIVITY_LOW_MULTIPLIER,
        SensitivityLevel::Medium => base,
        SensitivityLevel::High => (base * SENSITIVITY_HIGH_MULTIPLIER).min(1.0),
    };

    suggestion.relevance_score = adjusted.clamp(0.0, 1.0);
}

fn urgency_factor(expires: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    let remaining = expires - now;
    if remaining < Duration::hours(1) {
        URGENCY_IMMINENT
    } else if remaining < Duration::hours(3) {
        URGENCY_SOON
    } else {
        URGENCY_DISTANT
    }
}
