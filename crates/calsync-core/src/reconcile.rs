//! Merge a source event set into a destination event set.
//!
//! Reconcile starts from a copy of the destination and walks the source once, in
//! order. Each source event ends in exactly one [`Disposition`]:
//!
//! ```text
//! new UID      -> Inserted | Filtered | Removed (cancelled, nothing to cancel)
//! existing UID -> Replaced | Kept (reschedule conflict) | Removed (cancelled) | Filtered
//! ```
//!
//! Destination-only events pass through unchanged, including cancelled ones. The
//! result holds every UID at most once, and re-running reconcile on its own output
//! returns the same set.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::Result;
use crate::event::{Event, EventSet, EventStatus};
use crate::prefix::{apply_prefix, is_filtered};

/// Reconcile settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileOptions {
    /// Source events whose title starts with this are left out entirely.
    pub filter_prefix: Option<String>,
    /// Prepended to the title of source events that are new to the destination.
    pub add_prefix: Option<String>,
    /// When set, a rescheduled event keeps its destination version and a warning is
    /// reported. When unset, the source version replaces it silently.
    pub check_conflicts: bool,
}

/// What reconcile did with one source event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Disposition {
    Inserted,
    Filtered,
    Replaced,
    Kept,
    Removed,
}

/// Same UID on both sides with different times, reported while conflict checking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConflictWarning {
    pub uid: String,
    pub title: String,
    pub source_start: DateTime<Utc>,
    pub source_end: DateTime<Utc>,
    pub destination_start: DateTime<Utc>,
    pub destination_end: DateTime<Utc>,
}

impl ConflictWarning {
    fn new(source: &Event, destination: &Event) -> Self {
        Self {
            uid: source.uid.clone(),
            title: destination.title.clone(),
            source_start: source.start,
            source_end: source.end,
            destination_start: destination.start,
            destination_end: destination.end,
        }
    }
}

impl fmt::Display for ConflictWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "'{}' ({}) rescheduled: source {} - {}, destination {} - {}; keeping destination",
            self.title,
            self.uid,
            self.source_start,
            self.source_end,
            self.destination_start,
            self.destination_end
        )
    }
}

/// Per-disposition counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileSummary {
    pub inserted: usize,
    pub filtered: usize,
    pub replaced: usize,
    pub kept: usize,
    pub removed: usize,
}

/// The merged set plus what happened along the way.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReconcileOutcome {
    pub events: EventSet,
    pub warnings: Vec<ConflictWarning>,
    /// One entry per source event, in source order.
    pub dispositions: Vec<(String, Disposition)>,
}

impl ReconcileOutcome {
    pub fn summary(&self) -> ReconcileSummary {
        let mut summary = ReconcileSummary::default();
        for (_, disposition) in &self.dispositions {
            match disposition {
                Disposition::Inserted => summary.inserted += 1,
                Disposition::Filtered => summary.filtered += 1,
                Disposition::Replaced => summary.replaced += 1,
                Disposition::Kept => summary.kept += 1,
                Disposition::Removed => summary.removed += 1,
            }
        }
        summary
    }

    /// Disposition recorded for `uid`, if it appeared in the source.
    pub fn disposition(&self, uid: &str) -> Option<Disposition> {
        self.dispositions
            .iter()
            .find(|(u, _)| u == uid)
            .map(|(_, d)| *d)
    }
}

/// Reconcile `source` into a copy of `destination`.
pub fn reconcile(
    source: &EventSet,
    destination: &EventSet,
    options: &ReconcileOptions,
) -> ReconcileOutcome {
    let mut merged = destination.clone();
    let mut warnings = Vec::new();
    let mut dispositions = Vec::with_capacity(source.len());

    for event in source {
        let disposition = if is_filtered(&event.title, options.filter_prefix.as_deref()) {
            Disposition::Filtered
        } else {
            match merged.get(&event.uid).cloned() {
                Some(existing) => {
                    reconcile_existing(event, existing, &mut merged, &mut warnings, options)
                }
                None if event.status == EventStatus::Cancelled => Disposition::Removed,
                None => {
                    let mut event = event.clone();
                    if let Some(prefix) = options.add_prefix.as_deref() {
                        if let Some(title) = apply_prefix(&event.title, prefix) {
                            event.set_title(title);
                        }
                    }
                    merged.insert(event);
                    Disposition::Inserted
                }
            }
        };
        tracing::debug!(uid = %event.uid, ?disposition, "reconciled source event");
        dispositions.push((event.uid.clone(), disposition));
    }

    ReconcileOutcome {
        events: merged,
        warnings,
        dispositions,
    }
}

fn reconcile_existing(
    event: &Event,
    existing: Event,
    merged: &mut EventSet,
    warnings: &mut Vec<ConflictWarning>,
    options: &ReconcileOptions,
) -> Disposition {
    if event.status == EventStatus::Cancelled {
        // Already cancelled on the destination side: nothing left to apply.
        if existing.status == EventStatus::Cancelled {
            return Disposition::Kept;
        }
        merged.remove(&event.uid);
        return Disposition::Removed;
    }

    if !event.same_times(&existing) && options.check_conflicts {
        let warning = ConflictWarning::new(event, &existing);
        tracing::warn!(uid = %warning.uid, "{}", warning);
        warnings.push(warning);
        return Disposition::Kept;
    }

    merged.insert(event.clone());
    Disposition::Replaced
}

/// Build event sets from plain lists and reconcile them.
///
/// # Errors
/// `MissingUid` if any event on either side has an empty UID.
pub fn reconcile_events(
    source: Vec<Event>,
    destination: Vec<Event>,
    options: &ReconcileOptions,
) -> Result<ReconcileOutcome> {
    let source = EventSet::from_events(source)?;
    let destination = EventSet::from_events(destination)?;
    Ok(reconcile(&source, &destination, options))
}
