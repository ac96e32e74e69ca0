//! Event extraction -- calendar text into normalized [`Event`] records.
//!
//! Parsing goes through the `icalendar` crate: its parser output is converted into
//! owned `icalendar::Calendar` components. Every timestamp is normalized to UTC:
//!
//! - `...Z` values are taken as is
//! - floating (timezone-less) values are read as UTC
//! - `TZID=` values are converted with `chrono-tz`; an unknown TZID falls back to UTC
//! - all-day `DATE` values become midnight UTC
//!
//! Without `DTEND` the end comes from `DURATION`. With neither, an all-day event
//! lasts one day and a timed event ends at its start (RFC 5545 section 3.6.1).
//!
//! Events that lack a usable start/end, or that start outside the requested
//! [`TimeWindow`], are dropped according to [`ExtractOptions`].

use std::path::Path;

use chrono::{DateTime, Duration, NaiveDateTime, TimeZone, Utc};
use icalendar::parser::{read_calendar, unfold};
use icalendar::{Calendar, CalendarComponent, CalendarDateTime, Component, DatePerhapsTime};

use crate::error::{Result, SyncError};
use crate::event::{Event, EventStatus};

/// An inclusive `[start, end]` range of instants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// `[now, now + days]`. A horizon past the last representable instant is clamped to it.
    pub fn days_ahead(now: DateTime<Utc>, days: u32) -> Self {
        let end = Duration::try_days(i64::from(days))
            .and_then(|horizon| now.checked_add_signed(horizon))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        Self { start: now, end }
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant <= self.end
    }
}

/// What to do with an event that fails a field check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldPolicy {
    /// Drop the event and keep going.
    Exclude,
    /// Abort extraction with an error.
    Reject,
}

/// Extraction settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractOptions {
    /// Keep only events starting inside this window. `None` keeps everything.
    pub window: Option<TimeWindow>,
    /// Missing/unparseable DTSTART, unparseable DTEND or DURATION, or an end before the start.
    pub missing_times: FieldPolicy,
    /// Missing or empty UID.
    pub missing_uid: FieldPolicy,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            window: None,
            missing_times: FieldPolicy::Exclude,
            missing_uid: FieldPolicy::Reject,
        }
    }
}

impl ExtractOptions {
    /// Default policies restricted to `window`.
    pub fn within(window: TimeWindow) -> Self {
        Self {
            window: Some(window),
            ..Self::default()
        }
    }
}

/// A parsed calendar: its events plus every non-event component (e.g. `VTIMEZONE`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CalendarDocument {
    pub events: Vec<Event>,
    pub components: Vec<CalendarComponent>,
}

/// Parse calendar text into a [`CalendarDocument`].
///
/// # Errors
/// - `MalformedInput` if the text is not a `VCALENDAR` document
/// - `MissingUid` / `MissingField` / `InvalidRange` when the matching policy is `Reject`
pub fn parse_document(content: &str, options: &ExtractOptions) -> Result<CalendarDocument> {
    let trimmed = content.trim_start_matches('\u{feff}').trim_start();
    if !trimmed
        .get(..15)
        .is_some_and(|head| head.eq_ignore_ascii_case("BEGIN:VCALENDAR"))
    {
        return Err(SyncError::MalformedInput(
            "document does not start with BEGIN:VCALENDAR".to_string(),
        ));
    }

    let unfolded = unfold(trimmed);
    let calendar = Calendar::from(read_calendar(&unfolded).map_err(SyncError::MalformedInput)?);

    let mut document = CalendarDocument::default();
    let mut position = 0;
    for component in calendar.components {
        match component {
            CalendarComponent::Event(vevent) => {
                position += 1;
                if let Some(event) = extract_event(vevent, position, options)? {
                    document.events.push(event);
                }
            }
            other => document.components.push(other),
        }
    }

    Ok(document)
}

/// Parse calendar text and return only its events.
pub fn extract_events(content: &str, options: &ExtractOptions) -> Result<Vec<Event>> {
    parse_document(content, options).map(|doc| doc.events)
}

/// Read and parse a calendar file.
pub fn read_document(
    path: impl AsRef<Path>,
    options: &ExtractOptions,
) -> Result<CalendarDocument> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|source| SyncError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_document(&content, options)
}

/// Load the events of `path` that start within the next `days` days.
pub fn load_events(path: impl AsRef<Path>, days: u32) -> Result<Vec<Event>> {
    let window = TimeWindow::days_ahead(Utc::now(), days);
    read_document(path, &ExtractOptions::within(window)).map(|doc| doc.events)
}

fn extract_event(
    vevent: icalendar::Event,
    position: usize,
    options: &ExtractOptions,
) -> Result<Option<Event>> {
    let Some(uid) = vevent
        .get_uid()
        .filter(|uid| !uid.is_empty())
        .map(str::to_string)
    else {
        return match options.missing_uid {
            FieldPolicy::Reject => Err(SyncError::MissingUid { position }),
            FieldPolicy::Exclude => {
                tracing::warn!(position, "skipping event without UID");
                Ok(None)
            }
        };
    };

    let (start, end) = match event_times(&vevent, &uid) {
        Ok(times) => times,
        Err(err) => return excluded(options, &uid, err),
    };

    if let Some(window) = options.window {
        if !window.contains(start) {
            tracing::debug!(%uid, %start, "event outside extraction window");
            return Ok(None);
        }
    }

    let title = vevent.get_summary().unwrap_or_default().to_string();
    let status = vevent
        .property_value("STATUS")
        .map(EventStatus::from_ics_str)
        .unwrap_or_default();

    Ok(Some(Event::from_parts(uid, title, start, end, status, vevent)))
}

/// Resolve the UTC start and end of a `VEVENT`.
fn event_times(vevent: &icalendar::Event, uid: &str) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
    let missing = |field| SyncError::MissingField {
        uid: uid.to_string(),
        field,
    };

    let start_value = vevent.get_start().ok_or_else(|| missing("DTSTART"))?;
    let all_day = matches!(start_value, DatePerhapsTime::Date(_));
    let start = to_utc(start_value).ok_or_else(|| missing("DTSTART"))?;

    let end = if vevent.properties().contains_key("DTEND") {
        vevent
            .get_end()
            .and_then(to_utc)
            .ok_or_else(|| missing("DTEND"))?
    } else if let Some(value) = vevent.property_value("DURATION") {
        parse_duration(value)
            .and_then(|duration| start.checked_add_signed(duration))
            .ok_or_else(|| missing("DURATION"))?
    } else if all_day {
        start
            .checked_add_signed(Duration::days(1))
            .ok_or_else(|| missing("DTEND"))?
    } else {
        start
    };

    if end < start {
        return Err(SyncError::InvalidRange {
            uid: uid.to_string(),
        });
    }
    Ok((start, end))
}

/// Parse an iCalendar `DURATION` value such as `PT1H30M`, `P1D`, `P2W` or `-PT15M`.
fn parse_duration(value: &str) -> Option<Duration> {
    let value = value.trim();
    let (negative, rest) = match value.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, value.strip_prefix('+').unwrap_or(value)),
    };

    let parsed: std::time::Duration = iso8601::duration(rest).ok()?.into();
    let duration = Duration::from_std(parsed).ok()?;
    Some(if negative { -duration } else { duration })
}

fn excluded(options: &ExtractOptions, uid: &str, err: SyncError) -> Result<Option<Event>> {
    match options.missing_times {
        FieldPolicy::Reject => Err(err),
        FieldPolicy::Exclude => {
            tracing::debug!(%uid, reason = %err, "excluding event");
            Ok(None)
        }
    }
}

/// Normalize any iCalendar date or date-time to a UTC instant.
pub fn to_utc(value: DatePerhapsTime) -> Option<DateTime<Utc>> {
    match value {
        DatePerhapsTime::Date(date) => date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc()),
        DatePerhapsTime::DateTime(CalendarDateTime::Utc(dt)) => Some(dt),
        DatePerhapsTime::DateTime(CalendarDateTime::Floating(naive)) => Some(naive.and_utc()),
        DatePerhapsTime::DateTime(CalendarDateTime::WithTimezone { date_time, tzid }) => {
            Some(zoned_to_utc(date_time, &tzid))
        }
    }
}

fn zoned_to_utc(local: NaiveDateTime, tzid: &str) -> DateTime<Utc> {
    let Ok(tz) = tzid.parse::<chrono_tz::Tz>() else {
        tracing::debug!(tzid, "unknown TZID, reading wall time as UTC");
        return local.and_utc();
    };
    // Ambiguous times take the earlier offset; times in a DST gap shift forward.
    tz.from_local_datetime(&local)
        .earliest()
        .or_else(|| tz.from_local_datetime(&(local + Duration::hours(1))).earliest())
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| local.and_utc())
}
