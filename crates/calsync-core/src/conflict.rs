//! Detect overlapping events between two calendars.
//!
//! Performs pairwise comparison between two event lists to find time overlaps.
//! Adjacent events (where one ends exactly when another starts) are NOT conflicts,
//! and two records with the same UID are the same logical event, never a conflict.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::event::Event;

/// A detected conflict between two events.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Conflict {
    pub event_a: Event,
    pub event_b: Event,
    pub overlap_minutes: i64,
}

/// Strict half-open overlap: `a.start < b.end && a.end > b.start`.
pub fn overlaps(a: &Event, b: &Event) -> bool {
    a.start < b.end && a.end > b.start
}

/// Find all pairwise conflicts between two event lists.
///
/// Report order is `events_a` outer, `events_b` inner. Records repeated within one
/// list (same UID, start and end) are compared once; the first occurrence is the one
/// reported. Inputs are not modified.
pub fn detect_conflicts(events_a: &[Event], events_b: &[Event]) -> Vec<Conflict> {
    let a_unique = first_occurrences(events_a);
    let b_unique = first_occurrences(events_b);

    let mut conflicts = Vec::new();
    for a in &a_unique {
        for b in &b_unique {
            if a.uid == b.uid || !overlaps(a, b) {
                continue;
            }
            let overlap_start = a.start.max(b.start);
            let overlap_end = a.end.min(b.end);

            conflicts.push(Conflict {
                event_a: (*a).clone(),
                event_b: (*b).clone(),
                overlap_minutes: (overlap_end - overlap_start).num_minutes(),
            });
        }
    }

    conflicts
}

fn first_occurrences(events: &[Event]) -> Vec<&Event> {
    let mut seen: HashSet<(&str, DateTime<Utc>, DateTime<Utc>)> = HashSet::new();
    events
        .iter()
        .filter(|e| seen.insert((e.uid.as_str(), e.start, e.end)))
        .collect()
}
