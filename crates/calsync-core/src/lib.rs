//! # calsync-core
//!
//! Overlap detection and UID-based reconciliation for two iCalendar (`.ics`) event sets.
//!
//! Calendars are parsed into normalized [`Event`] records (UTC start/end, title, status)
//! that still carry their parsed `VEVENT`, so properties the engine does not model
//! survive a merge untouched.
//!
//! ## Quick start
//!
//! ```rust
//! use calsync_core::{detect_conflicts, Event};
//! use chrono::{TimeZone, Utc};
//!
//! let at = |h| Utc.with_ymd_and_hms(2026, 3, 1, h, 0, 0).unwrap();
//! let a = vec![Event::new("a@example.com", "Standup", at(9), at(10)).unwrap()];
//! let b = vec![Event::new("b@example.com", "Review", at(9), at(11)).unwrap()];
//!
//! let conflicts = detect_conflicts(&a, &b);
//! assert_eq!(conflicts.len(), 1);
//! assert_eq!(conflicts[0].overlap_minutes, 60);
//! ```
//!
//! ## Modules
//!
//! - [`extract`] - calendar text → [`Event`] list, time windows, missing-field policies
//! - [`conflict`] - pairwise overlap report between two event lists
//! - [`reconcile`] - merge a source set into a destination set (filter/prefix/reschedule rules)
//! - [`writer`] - [`CalendarDocument`] → calendar text
//! - [`prefix`] - title prefix predicates
//! - [`event`] - `Event`, `EventStatus`, `EventSet`
//! - [`error`] - Error types

pub mod conflict;
pub mod error;
pub mod event;
pub mod extract;
pub mod prefix;
pub mod reconcile;
pub mod writer;

pub use conflict::{detect_conflicts, Conflict};
pub use error::SyncError;
pub use event::{Event, EventSet, EventStatus};
pub use extract::{
    extract_events, load_events, parse_document, read_document, CalendarDocument,
    ExtractOptions, FieldPolicy, TimeWindow,
};
pub use reconcile::{
    reconcile, reconcile_events, ConflictWarning, Disposition, ReconcileOptions,
    ReconcileOutcome,
};
