//! Tests for reconcile: filter/prefix rules, reschedules, cancellations and idempotence.

use calsync_core::{
    read_document, reconcile, reconcile_events, CalendarDocument, Disposition, Event, EventSet,
    EventStatus, ExtractOptions, ReconcileOptions, SyncError,
};
use chrono::{TimeZone, Utc};
use icalendar::Component;

fn event(uid: &str, title: &str, start: (u32, u32), end: (u32, u32)) -> Event {
    Event::new(
        uid,
        title,
        Utc.with_ymd_and_hms(2026, 3, 2, start.0, start.1, 0).unwrap(),
        Utc.with_ymd_and_hms(2026, 3, 2, end.0, end.1, 0).unwrap(),
    )
    .unwrap()
}

fn set(events: Vec<Event>) -> EventSet {
    EventSet::from_events(events).unwrap()
}

fn fixture_set(name: &str) -> EventSet {
    let path = format!("{}/tests/fixtures/{}", env!("CARGO_MANIFEST_DIR"), name);
    set(read_document(path, &ExtractOptions::default()).unwrap().events)
}

fn titles(events: &EventSet) -> Vec<&str> {
    events.iter().map(|e| e.title.as_str()).collect()
}

#[test]
fn identical_event_keeps_one_record_without_warning() {
    let source = set(vec![event("U1", "Foo", (10, 0), (11, 0))]);
    let destination = set(vec![event("U1", "Foo", (10, 0), (11, 0))]);
    let options = ReconcileOptions {
        check_conflicts: true,
        ..ReconcileOptions::default()
    };

    let outcome = reconcile(&source, &destination, &options);

    assert_eq!(outcome.events.len(), 1);
    assert!(outcome.warnings.is_empty());
    assert_eq!(outcome.disposition("U1"), Some(Disposition::Replaced));
}

#[test]
fn reschedule_with_conflict_check_keeps_destination() {
    let source = set(vec![event("U2", "Sync", (10, 0), (11, 0))]);
    let destination = set(vec![event("U2", "Sync", (10, 30), (11, 30))]);
    let options = ReconcileOptions {
        check_conflicts: true,
        ..ReconcileOptions::default()
    };

    let outcome = reconcile(&source, &destination, &options);

    assert_eq!(outcome.warnings.len(), 1);
    let warning = &outcome.warnings[0];
    assert_eq!(warning.uid, "U2");
    assert_eq!(warning.source_start, source.get("U2").unwrap().start);
    assert_eq!(warning.destination_start, destination.get("U2").unwrap().start);
    assert!(warning.to_string().contains("keeping destination"));

    let kept = outcome.events.get("U2").unwrap();
    assert_eq!(kept, destination.get("U2").unwrap());
    assert_eq!(outcome.disposition("U2"), Some(Disposition::Kept));
}

#[test]
fn reschedule_without_conflict_check_takes_source() {
    let source = set(vec![event("U2", "Sync (moved)", (10, 0), (11, 0))]);
    let destination = set(vec![event("U2", "Sync", (10, 30), (11, 30))]);

    let outcome = reconcile(&source, &destination, &ReconcileOptions::default());

    assert!(outcome.warnings.is_empty());
    assert_eq!(outcome.events.len(), 1);
    assert_eq!(outcome.events.get("U2").unwrap(), source.get("U2").unwrap());
    assert_eq!(outcome.disposition("U2"), Some(Disposition::Replaced));
}

#[test]
fn filter_prefix_excludes_source_event() {
    let source = set(vec![
        event("A1", "ATP: standup", (9, 0), (9, 15)),
        event("A2", "Design review", (13, 0), (14, 0)),
    ]);
    let options = ReconcileOptions {
        filter_prefix: Some("ATP:".to_string()),
        ..ReconcileOptions::default()
    };

    let outcome = reconcile(&source, &EventSet::new(), &options);

    assert!(!outcome.events.contains("A1"));
    assert!(outcome.events.contains("A2"));
    assert_eq!(outcome.disposition("A1"), Some(Disposition::Filtered));
}

#[test]
fn filter_prefix_is_case_sensitive() {
    let source = set(vec![event("A1", "atp: standup", (9, 0), (9, 15))]);
    let options = ReconcileOptions {
        filter_prefix: Some("ATP:".to_string()),
        ..ReconcileOptions::default()
    };

    let outcome = reconcile(&source, &EventSet::new(), &options);
    assert!(outcome.events.contains("A1"));
}

#[test]
fn filtered_source_event_leaves_destination_copy_alone() {
    // The echo of an event we synced the other way must not clobber the original.
    let source = set(vec![event("E1", "ATP: Planning", (9, 0), (10, 0))]);
    let destination = set(vec![event("E1", "Planning", (9, 0), (10, 0))]);
    let options = ReconcileOptions {
        filter_prefix: Some("ATP:".to_string()),
        ..ReconcileOptions::default()
    };

    let outcome = reconcile(&source, &destination, &options);
    assert_eq!(titles(&outcome.events), vec!["Planning"]);
}

#[test]
fn add_prefix_applies_to_new_events_only() {
    let source = set(vec![
        event("N1", "Lunch", (12, 0), (13, 0)),
        event("X1", "Existing", (9, 0), (10, 0)),
    ]);
    let destination = set(vec![event("X1", "Existing", (9, 0), (10, 0))]);
    let options = ReconcileOptions {
        add_prefix: Some("[Synced] ".to_string()),
        ..ReconcileOptions::default()
    };

    let outcome = reconcile(&source, &destination, &options);

    assert_eq!(outcome.events.get("N1").unwrap().title, "[Synced] Lunch");
    assert_eq!(outcome.events.get("X1").unwrap().title, "Existing");
    assert_eq!(outcome.disposition("N1"), Some(Disposition::Inserted));
}

#[test]
fn add_prefix_is_not_doubled_on_repeated_sync() {
    let source = set(vec![event("N1", "Lunch", (12, 0), (13, 0))]);
    let options = ReconcileOptions {
        add_prefix: Some("[Synced] ".to_string()),
        ..ReconcileOptions::default()
    };

    let first = reconcile(&source, &EventSet::new(), &options);
    // Feed the synced copy back in as a brand-new event.
    let second = reconcile(&first.events, &EventSet::new(), &options);

    assert_eq!(second.events.get("N1").unwrap().title, "[Synced] Lunch");
}

#[test]
fn add_prefix_updates_summary_in_vevent() {
    let source = set(vec![event("N1", "Lunch, team", (12, 0), (13, 0))]);
    let options = ReconcileOptions {
        add_prefix: Some("[Synced] ".to_string()),
        ..ReconcileOptions::default()
    };

    let outcome = reconcile(&source, &EventSet::new(), &options);
    let inserted = outcome.events.get("N1").unwrap();
    assert_eq!(inserted.vevent().get_summary(), Some("[Synced] Lunch, team"));

    let ics = CalendarDocument::new(outcome.events.into_vec(), Vec::new()).to_ics();
    assert!(ics.contains("SUMMARY:[Synced] Lunch\\, team\r\n"));
}

#[test]
fn cancelled_source_event_removes_destination_copy() {
    let source = set(vec![event("C1", "Dentist", (9, 0), (10, 0)).cancelled()]);
    let destination = set(vec![
        event("C1", "Dentist", (9, 0), (10, 0)),
        event("K1", "Keep", (11, 0), (12, 0)),
    ]);

    for check_conflicts in [false, true] {
        let options = ReconcileOptions {
            check_conflicts,
            ..ReconcileOptions::default()
        };
        let outcome = reconcile(&source, &destination, &options);
        assert!(!outcome.events.contains("C1"));
        assert!(outcome.events.contains("K1"));
        assert_eq!(outcome.disposition("C1"), Some(Disposition::Removed));
    }
}

#[test]
fn cancelled_reschedule_is_still_removed_under_conflict_check() {
    let source = set(vec![event("C1", "Dentist", (14, 0), (15, 0)).cancelled()]);
    let destination = set(vec![event("C1", "Dentist", (9, 0), (10, 0))]);
    let options = ReconcileOptions {
        check_conflicts: true,
        ..ReconcileOptions::default()
    };

    let outcome = reconcile(&source, &destination, &options);
    assert!(outcome.events.is_empty());
    assert!(outcome.warnings.is_empty());
}

#[test]
fn cancelled_new_event_is_not_inserted() {
    let source = set(vec![event("C2", "Gone", (9, 0), (10, 0)).cancelled()]);

    let outcome = reconcile(&source, &EventSet::new(), &ReconcileOptions::default());
    assert!(outcome.events.is_empty());
    assert_eq!(outcome.disposition("C2"), Some(Disposition::Removed));
}

#[test]
fn cancelled_destination_only_event_passes_through() {
    let destination = set(vec![event("D1", "Old", (9, 0), (10, 0)).cancelled()]);

    let outcome = reconcile(&EventSet::new(), &destination, &ReconcileOptions::default());
    assert_eq!(
        outcome.events.get("D1").unwrap().status,
        EventStatus::Cancelled
    );
}

#[test]
fn destination_order_is_kept_and_new_events_appended() {
    let source = set(vec![
        event("N2", "New two", (15, 0), (16, 0)),
        event("D2", "Dest two v2", (11, 0), (12, 0)),
        event("N1", "New one", (14, 0), (15, 0)),
    ]);
    let destination = set(vec![
        event("D1", "Dest one", (9, 0), (10, 0)),
        event("D2", "Dest two", (11, 0), (12, 0)),
        event("D3", "Dest three", (13, 0), (14, 0)),
    ]);

    let outcome = reconcile(&source, &destination, &ReconcileOptions::default());

    let uids: Vec<&str> = outcome.events.uids().collect();
    assert_eq!(uids, vec!["D1", "D2", "D3", "N2", "N1"]);
    assert_eq!(outcome.events.get("D2").unwrap().title, "Dest two v2");
}

#[test]
fn inputs_are_not_modified() {
    let source = set(vec![event("N1", "Lunch", (12, 0), (13, 0))]);
    let destination = set(vec![event("D1", "Dest", (9, 0), (10, 0))]);
    let (source_before, destination_before) = (source.clone(), destination.clone());
    let options = ReconcileOptions {
        add_prefix: Some("[Synced] ".to_string()),
        ..ReconcileOptions::default()
    };

    let _ = reconcile(&source, &destination, &options);

    assert_eq!(source, source_before);
    assert_eq!(destination, destination_before);
}

#[test]
fn reconcile_is_idempotent_on_its_own_output() {
    let source = fixture_set("sync_source.ics");
    let destination = fixture_set("sync_destination.ics");
    let options = ReconcileOptions {
        filter_prefix: Some("ATP:".to_string()),
        add_prefix: Some("[Synced] ".to_string()),
        check_conflicts: true,
    };

    let first = reconcile(&source, &destination, &options);
    let again = reconcile(&first.events, &first.events, &options);

    assert_eq!(again.events, first.events);
    assert!(again.warnings.is_empty());
}

#[test]
fn fixture_sync_applies_every_rule() {
    let source = fixture_set("sync_source.ics");
    let destination = fixture_set("sync_destination.ics");
    let options = ReconcileOptions {
        filter_prefix: Some("ATP:".to_string()),
        add_prefix: Some("[Synced] ".to_string()),
        check_conflicts: true,
    };

    let outcome = reconcile(&source, &destination, &options);

    let uids: Vec<&str> = outcome.events.uids().collect();
    assert_eq!(
        uids,
        vec![
            "u1@example.com",
            "u2@example.com",
            "u6@example.com",
            "u4@example.com",
        ]
    );
    assert_eq!(outcome.warnings.len(), 1);
    assert_eq!(outcome.warnings[0].uid, "u2@example.com");
    assert_eq!(
        outcome.events.get("u4@example.com").unwrap().title,
        "[Synced] Lunch, with team"
    );

    let summary = outcome.summary();
    assert_eq!(summary.inserted, 1);
    assert_eq!(summary.replaced, 1);
    assert_eq!(summary.kept, 1);
    assert_eq!(summary.removed, 1);
    assert_eq!(summary.filtered, 1);
}

#[test]
fn reconcile_events_rejects_identity_less_events() {
    let mut anonymous = event("tmp", "Anonymous", (9, 0), (10, 0));
    anonymous.uid.clear();

    let err = reconcile_events(vec![anonymous], Vec::new(), &ReconcileOptions::default())
        .unwrap_err();
    assert!(matches!(err, SyncError::MissingUid { position: 1 }));
    assert!(err.is_malformed_input());
}

#[test]
fn duplicate_uids_in_one_input_collapse_to_first() {
    let outcome = reconcile_events(
        vec![
            event("D", "First", (9, 0), (10, 0)),
            event("D", "Second", (11, 0), (12, 0)),
        ],
        Vec::new(),
        &ReconcileOptions::default(),
    )
    .unwrap();

    assert_eq!(titles(&outcome.events), vec!["First"]);
}
