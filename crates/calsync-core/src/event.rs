//! Normalized event records and UID-keyed event sets.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use icalendar::{Component, EventLike};
use serde::Serialize;

use crate::error::{Result, SyncError};

/// Lifecycle status of an event. Only `CANCELLED` is distinguished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    #[default]
    Active,
    Cancelled,
}

impl EventStatus {
    /// Map a `STATUS` property value. Anything other than `CANCELLED` is active.
    pub fn from_ics_str(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("CANCELLED") {
            EventStatus::Cancelled
        } else {
            EventStatus::Active
        }
    }
}

/// One calendar event, normalized to UTC.
///
/// The parsed `VEVENT` is carried along so that properties the engine does not
/// interpret (attendees, alarms, `X-` fields) are written back untouched.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Event {
    pub uid: String,
    pub title: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub status: EventStatus,
    #[serde(skip)]
    vevent: icalendar::Event,
}

impl Event {
    /// Build a fresh event with a minimal `VEVENT` component.
    ///
    /// # Errors
    /// `MissingUid` for an empty UID, `InvalidRange` when `end < start`.
    pub fn new(
        uid: impl Into<String>,
        title: impl Into<String>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Self> {
        let uid = uid.into();
        let title = title.into();
        if uid.is_empty() {
            return Err(SyncError::MissingUid { position: 1 });
        }
        if end < start {
            return Err(SyncError::InvalidRange { uid });
        }

        let vevent = icalendar::Event::new()
            .uid(&uid)
            .summary(&title)
            .starts(start)
            .ends(end)
            .done();

        Ok(Self {
            uid,
            title,
            start,
            end,
            status: EventStatus::Active,
            vevent,
        })
    }

    /// Assemble an event from already-validated fields and its parsed `VEVENT`.
    pub(crate) fn from_parts(
        uid: String,
        title: String,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        status: EventStatus,
        vevent: icalendar::Event,
    ) -> Self {
        Self {
            uid,
            title,
            start,
            end,
            status,
            vevent,
        }
    }

    /// Mark the event cancelled (`STATUS:CANCELLED`).
    pub fn cancelled(mut self) -> Self {
        self.status = EventStatus::Cancelled;
        self.vevent.status(icalendar::EventStatus::Cancelled);
        self
    }

    /// Change the title, keeping the underlying `SUMMARY` in step.
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
        self.vevent.summary(&self.title);
    }

    /// Same start and end instants.
    pub fn same_times(&self, other: &Event) -> bool {
        self.start == other.start && self.end == other.end
    }

    /// The underlying `VEVENT`, including fields the engine does not model.
    pub fn vevent(&self) -> &icalendar::Event {
        &self.vevent
    }
}

/// A UID-keyed collection of events that remembers insertion order.
///
/// Replacing an existing UID keeps its position; new UIDs are appended.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventSet {
    events: Vec<Event>,
    index: HashMap<String, usize>,
}

impl EventSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from a list of events. The first occurrence of a UID wins.
    ///
    /// # Errors
    /// `MissingUid` if any event has an empty UID.
    pub fn from_events(events: impl IntoIterator<Item = Event>) -> Result<Self> {
        let mut set = Self::new();
        for (i, event) in events.into_iter().enumerate() {
            if event.uid.is_empty() {
                return Err(SyncError::MissingUid { position: i + 1 });
            }
            if set.contains(&event.uid) {
                tracing::debug!(uid = %event.uid, "duplicate UID in event set, keeping first");
                continue;
            }
            set.insert(event);
        }
        Ok(set)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn contains(&self, uid: &str) -> bool {
        self.index.contains_key(uid)
    }

    pub fn get(&self, uid: &str) -> Option<&Event> {
        self.index.get(uid).map(|&i| &self.events[i])
    }

    /// Insert or replace by UID. Returns the previous event for that UID.
    pub fn insert(&mut self, event: Event) -> Option<Event> {
        match self.index.get(&event.uid) {
            Some(&i) => Some(std::mem::replace(&mut self.events[i], event)),
            None => {
                self.index.insert(event.uid.clone(), self.events.len());
                self.events.push(event);
                None
            }
        }
    }

    pub fn remove(&mut self, uid: &str) -> Option<Event> {
        let pos = self.index.remove(uid)?;
        let removed = self.events.remove(pos);
        for slot in self.index.values_mut() {
            if *slot > pos {
                *slot -= 1;
            }
        }
        Some(removed)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Event> {
        self.events.iter()
    }

    pub fn uids(&self) -> impl Iterator<Item = &str> {
        self.events.iter().map(|e| e.uid.as_str())
    }

    pub fn as_slice(&self) -> &[Event] {
        &self.events
    }

    pub fn into_vec(self) -> Vec<Event> {
        self.events
    }
}

impl<'a> IntoIterator for &'a EventSet {
    type Item = &'a Event;
    type IntoIter = std::slice::Iter<'a, Event>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}

impl IntoIterator for EventSet {
    type Item = Event;
    type IntoIter = std::vec::IntoIter<Event>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.into_iter()
    }
}
