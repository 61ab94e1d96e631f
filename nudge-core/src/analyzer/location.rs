//! Location detection.
//!
//! Events carrying coordinates are grouped by event type and a location
//! key: the resolved place name when the recorder provided one, otherwise
//! coordinates rounded to three decimal places (cells of roughly 110 m).
//! A group of three or more visits becomes a `LocationPattern` centered on
//! the group's centroid; confidence combines spatial tightness (mean
//! distance from the centroid, inverted against a 500 m ceiling) with
//! occurrence support.

use super::{common_metadata, LOCATION_PATTERN_MIN_OCCURRENCES};
use crate::types::{LocationPattern, Pattern, PatternKind, TrackingEvent};
use std::collections::BTreeMap;

/// Mean centroid distance at or beyond this scores zero spatial
/// consistency.
const MAX_SPREAD_METERS: f64 = 500.0;
/// Visit count at which occurrence support saturates.
const SUPPORT_SATURATION: f64 = 10.0;
/// Weight of spatial tightness vs. occurrence support.
const SPATIAL_WEIGHT: f64 = 0.7;
const SUPPORT_WEIGHT: f64 = 0.3;
/// Emitted radius never shrinks below this, whatever the spread.
const MIN_RADIUS_METERS: f64 = 100.0;

const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

pub(super) fn detect(events: &[TrackingEvent]) -> Vec<Pattern> {
    // (event type, location key) -> located events, in timestamp order.
    let mut groups: BTreeMap<(String, String), Vec<&TrackingEvent>> = BTreeMap::new();
    for event in events {
        let Some(location) = &event.location_info else {
            continue;
        };
        let key = match &location.name {
            Some(name) => name.clone(),
            None => format!("{:.3},{:.3}", location.latitude, location.longitude),
        };
        groups
            .entry((event.event_type.as_str().to_string(), key))
            .or_default()
            .push(event);
    }

    let mut patterns = Vec::new();
    for group in groups.values() {
        if group.len() < LOCATION_PATTERN_MIN_OCCURRENCES {
            continue;
        }

        let points: Vec<(f64, f64)> = group
            .iter()
            .filter_map(|e| e.location_info.as_ref())
            .map(|l| (l.latitude, l.longitude))
            .collect();
        let centroid = centroid(&points);
        let mean_distance = points
            .iter()
            .map(|p| haversine_meters(*p, centroid))
            .sum::<f64>()
            / points.len() as f64;

        let spatial = 1.0 - mean_distance.min(MAX_SPREAD_METERS) / MAX_SPREAD_METERS;
        let support = (group.len() as f64 / SUPPORT_SATURATION).min(1.0);
        let confidence = spatial * SPATIAL_WEIGHT + support * SUPPORT_WEIGHT;

        let location_name = group
            .iter()
            .find_map(|e| e.location_info.as_ref().and_then(|l| l.name.clone()));

        patterns.push(Pattern {
            event_type: group[0].event_type.clone(),
            confidence,
            metadata: common_metadata(group),
            kind: PatternKind::Location(LocationPattern {
                latitude: centroid.0,
                longitude: centroid.1,
                radius_meters: (2.0 * mean_distance).max(MIN_RADIUS_METERS),
                location_name,
            }),
        });
    }
    patterns
}

fn centroid(points: &[(f64, f64)]) -> (f64, f64) {
    let n = points.len() as f64;
    let lat = points.iter().map(|p| p.0).sum::<f64>() / n;
    let lon = points.iter().map(|p| p.1).sum::<f64>() / n;
    (lat, lon)
}

/// Great-circle distance between two (latitude, longitude) pairs.
fn haversine_meters(a: (f64, f64), b: (f64, f64)) -> f64 {
    let (lat1, lon1) = (a.0.to_radians(), a.1.to_radians());
    let (lat2, lon2) = (b.0.to_radians(), b.1.to_radians());
    let dlat = lat2 - lat1;
    let dlon = lon2 - lon1;
    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_METERS * h.sqrt().asin()
}

#[cfg(test)]
mod tests {
    use super::super::testutil::{at, event};
    use super::*;
    use crate::types::{EventType, LocationInfo};
    use chrono::{DateTime, Utc};

    fn located(
        event_type: EventType,
        timestamp: DateTime<Utc>,
        lat: f64,
        lon: f64,
        name: Option<&str>,
    ) -> TrackingEvent {
        let mut e = event(event_type, timestamp);
        e.location_info = Some(LocationInfo {
            latitude: lat,
            longitude: lon,
            name: name.map(|n| n.to_string()),
        });
        e
    }

    #[test]
    fn test_repeated_place_detected() {
        // Four coffee orders at (nearly) the same corner.
        let events = vec![
            located(EventType::FoodOrdered, at(2025, 3, 1, 8, 0), 40.7484, -73.9857, None),
            located(EventType::FoodOrdered, at(2025, 3, 2, 8, 5), 40.7485, -73.9856, None),
            located(EventType::FoodOrdered, at(2025, 3, 3, 8, 2), 40.7484, -73.9858, None),
            located(EventType::FoodOrdered, at(2025, 3, 4, 8, 1), 40.7485, -73.9857, None),
        ];
        let patterns = detect(&events);
        assert_eq!(patterns.len(), 1);
        let p = &patterns[0];
        assert!(p.confidence >= 0.6, "confidence {}", p.confidence);
        match &p.kind {
            PatternKind::Location(l) => {
                assert!((l.latitude - 40.74845).abs() < 0.001);
                assert!(l.radius_meters >= 100.0);
                assert!(l.location_name.is_none());
            }
            other => panic!("expected location pattern, got {other:?}"),
        }
    }

    #[test]
    fn test_named_place_groups_despite_coordinate_jitter() {
        // GPS jitter puts readings in different rounding cells, but the
        // resolved name ties them together.
        let events = vec![
            located(EventType::AppOpened, at(2025, 3, 1, 9, 0), 40.748, -73.985, Some("Office")),
            located(EventType::AppOpened, at(2025, 3, 2, 9, 0), 40.750, -73.987, Some("Office")),
            located(EventType::AppOpened, at(2025, 3, 3, 9, 0), 40.749, -73.986, Some("Office")),
        ];
        let patterns = detect(&events);
        assert_eq!(patterns.len(), 1);
        match &patterns[0].kind {
            PatternKind::Location(l) => {
                assert_eq!(l.location_name.as_deref(), Some("Office"))
            }
            other => panic!("expected location pattern, got {other:?}"),
        }
    }

    #[test]
    fn test_two_visits_insufficient() {
        let events = vec![
            located(EventType::FoodOrdered, at(2025, 3, 1, 8, 0), 40.7484, -73.9857, None),
            located(EventType::FoodOrdered, at(2025, 3, 2, 8, 0), 40.7484, -73.9857, None),
        ];
        assert!(detect(&events).is_empty());
    }

    #[test]
    fn test_events_without_location_are_ignored() {
        let events = vec![
            event(EventType::FoodOrdered, at(2025, 3, 1, 8, 0)),
            event(EventType::FoodOrdered, at(2025, 3, 2, 8, 0)),
            event(EventType::FoodOrdered, at(2025, 3, 3, 8, 0)),
        ];
        assert!(detect(&events).is_empty());
    }

    #[test]
    fn test_haversine_known_distance() {
        // Empire State Building to Grand Central, roughly 1.1 km.
        let d = haversine_meters((40.7484, -73.9857), (40.7527, -73.9772));
        assert!((900.0..1400.0).contains(&d), "distance {d}");
    }
}
