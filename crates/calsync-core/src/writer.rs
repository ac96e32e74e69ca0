//! Serialize events back into calendar text.
//!
//! Rendering is done by `icalendar::Calendar`'s `Display`, which escapes TEXT
//! values and folds lines at 75 octets.

use std::path::Path;

use icalendar::{Calendar, CalendarComponent, Component};

use crate::error::{Result, SyncError};
use crate::event::Event;
use crate::extract::CalendarDocument;

pub const PRODID: &str = "-//calsync//calsync//EN";

impl CalendarDocument {
    /// Build a document from events plus the non-event components they depend on.
    pub fn new(events: Vec<Event>, components: Vec<CalendarComponent>) -> Self {
        Self { events, components }
    }

    /// Append `other`'s `VTIMEZONE` components whose `TZID` is not already present.
    pub fn merge_timezones(&mut self, other: &CalendarDocument) {
        for tz in &other.components {
            let Some(tzid) = timezone_id(tz) else {
                continue;
            };
            let known = self.components.iter().any(|c| timezone_id(c) == Some(tzid));
            if !known {
                self.components.push(tz.clone());
            }
        }
    }

    /// Non-event components followed by events inside one `VCALENDAR`.
    pub fn to_calendar(&self) -> Calendar {
        let mut calendar = Calendar::empty();
        calendar
            .append_property(("VERSION", "2.0"))
            .append_property(("PRODID", PRODID))
            .append_property(("CALSCALE", "GREGORIAN"));
        calendar.extend(self.components.iter().cloned());
        calendar.extend(self.events.iter().map(|e| e.vevent().clone()));
        calendar
    }

    /// Render as a `VCALENDAR` with CRLF line endings.
    pub fn to_ics(&self) -> String {
        self.to_calendar().to_string()
    }

    /// Render and write to `path`. The whole document is rendered before the file is opened.
    pub fn write_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        std::fs::write(path, self.to_ics()).map_err(|source| SyncError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// `TZID` of a `VTIMEZONE` component.
fn timezone_id(component: &CalendarComponent) -> Option<&str> {
    match component {
        CalendarComponent::Other(other) if other.component_kind() == "VTIMEZONE" => {
            other.property_value("TZID")
        }
        _ => None,
    }
}
