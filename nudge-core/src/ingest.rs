//! Tracking event ingestion.
//!
//! Events arrive as JSON Lines exports from the recording layer, one
//! `TrackingEvent` object per line. Ingestion is tolerant: a malformed
//! line is skipped with a warning rather than failing the whole file,
//! since one corrupt record in a large export should not stop analysis.
//! Events are returned sorted by timestamp ascending, the order the
//! analyzer expects.

use crate::error::Result;
use crate::types::TrackingEvent;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Outcome of parsing one export file.
#[derive(Debug, Default)]
pub struct IngestResult {
    /// Successfully parsed events, sorted by timestamp ascending.
    pub events: Vec<TrackingEvent>,
    /// One entry per skipped line.
    pub warnings: Vec<String>,
}

/// Read a JSONL event export from disk.
pub fn read_events(path: &Path) -> Result<IngestResult> {
    let file = std::fs::File::open(path)?;
    let reader = BufReader::new(file);
    let mut result = read_events_from(reader)?;

    for warning in &result.warnings {
        tracing::warn!(path = %path.display(), "{}", warning);
    }
    tracing::debug!(
        path = %path.display(),
        events = result.events.len(),
        skipped = result.warnings.len(),
        "Event export parsed"
    );

    result.events.sort_by_key(|e| e.timestamp);
    Ok(result)
}

fn read_events_from<R: BufRead>(reader: R) -> Result<IngestResult> {
    let mut result = IngestResult::default();
    let mut line_number = 0usize;

    for line_result in reader.lines() {
        line_number += 1;

        let line = match line_result {
            Ok(l) => l,
            Err(e) => {
                result
                    .warnings
                    .push(format!("Line {}: read error: {}", line_number, e));
                continue;
            }
        };

        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str::<TrackingEvent>(&line) {
            Ok(event) => result.events.push(event),
            Err(e) => {
                result
                    .warnings
                    .push(format!("Line {}: JSON parse error: {}", line_number, e));
            }
        }
    }

    Ok(result)
}
