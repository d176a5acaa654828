//! Integration tests for geoattendd
//!
//! These tests drive the engine the way the daemon wires it: configuration
//! parsed from TOML, seeded into a store, notifications captured by a sink.

use chrono::{DateTime, Local, NaiveTime, TimeZone};
use geoattend_api::{AttendanceStatus, NotificationPayload, Point, StatusTag};
use geoattend_config::parse_config;
use geoattend_core::{AttendanceEngine, AttendanceError};
use geoattend_notify::{ChannelSink, RecordingSink, SessionRegistry};
use geoattend_store::{SqliteStore, Store};
use geoattend_util::{EmployeeId, TeamId};
use std::sync::Arc;
use std::thread;

const CONFIG: &str = r#"
config_version = 1

[service]
late_threshold = "09:15"

[[zones]]
id = "hq"
name = "Headquarters"
shape = { type = "circle", center = { lat = 12.9716, lng = 77.5946 }, radius_meters = 150 }

[[zones]]
id = "depot"
name = "Depot"
shape = { type = "polygon", vertices = [
    { lat = 0.0, lng = 0.0 },
    { lat = 0.0, lng = 10.0 },
    { lat = 10.0, lng = 10.0 },
    { lat = 10.0, lng = 0.0 },
] }

[[teams]]
id = "ops"
name = "Operations"
manager_id = "m1"
employees = ["alice", "bob", "carol"]
zone_id = "hq"

[teams.work_hours]
start = "09:00"
end = "18:00"
check_in_deadline = "10:00"
check_in_buffer_minutes = 15

[[teams]]
id = "field"
name = "Field"
employees = ["dave"]
"#;

const HQ: Point = Point { lat: 12.9716, lng: 77.5946 };
const DEPOT: Point = Point { lat: 5.0, lng: 5.0 };
const NOWHERE: Point = Point { lat: 20.0, lng: 20.0 };

fn at(h: u32, m: u32) -> DateTime<Local> {
    Local.with_ymd_and_hms(2025, 6, 2, h, m, 0).unwrap()
}

fn emp(id: &str) -> EmployeeId {
    EmployeeId::new(id)
}

fn setup() -> (AttendanceEngine, Arc<SqliteStore>, RecordingSink) {
    let config = parse_config(CONFIG).unwrap();
    let store = Arc::new(SqliteStore::in_memory().unwrap());
    let sink = RecordingSink::new();
    let engine = AttendanceEngine::new(store.clone(), Arc::new(sink.clone())).unwrap();
    engine.seed(&config.zones, &config.teams, at(0, 0)).unwrap();
    (engine, store, sink)
}

#[test]
fn test_policy_window_scenario() {
    let (engine, store, _) = setup();
    let day = at(0, 0).date_naive();

    let err = engine.manual_check_in(&emp("alice"), HQ, None, at(8, 40)).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Too early to check in. Earliest check-in time is 08:45"
    );
    assert!(store.get_record(&emp("alice"), day).unwrap().is_none());

    let outcome = engine.manual_check_in(&emp("alice"), HQ, None, at(8, 50)).unwrap();
    assert_eq!(outcome.status, StatusTag::CheckedIn);
    assert_eq!(outcome.zone_name.as_deref(), Some("Headquarters"));

    let err = engine.manual_check_in(&emp("bob"), HQ, None, at(10, 5)).unwrap_err();
    assert!(matches!(err, AttendanceError::DeadlinePassed { .. }));
    let bob = store.get_record(&emp("bob"), day).unwrap().unwrap();
    assert_eq!(bob.status, AttendanceStatus::Absent);
}

#[test]
fn test_forced_check_out_uses_policy_time() {
    let (engine, store, _) = setup();

    engine.manual_check_in(&emp("alice"), HQ, None, at(9, 0)).unwrap();
    let report = engine.auto_check_out_past_work_hours(at(18, 5)).unwrap();
    assert_eq!(report.changed, 1);

    let record = store.get_record(&emp("alice"), at(0, 0).date_naive()).unwrap().unwrap();
    assert_eq!(record.status, AttendanceStatus::CheckedOut);
    assert_eq!(record.check_out_time, Some(at(18, 0)));
}

#[test]
fn test_unconstrained_employee_any_time() {
    let (engine, _, _) = setup();

    // No work hours on the field team
    let outcome = engine.manual_check_in(&emp("dave"), DEPOT, None, at(5, 0)).unwrap();
    assert_eq!(outcome.zone_name.as_deref(), Some("Depot"));
    let outcome = engine.manual_check_out(&emp("dave"), DEPOT, None, at(5, 10)).unwrap();
    assert_eq!(outcome.status, StatusTag::CheckedOut);

    // An employee outside any team is unconstrained too
    engine.manual_check_in(&emp("stranger"), HQ, None, at(23, 0)).unwrap();
}

#[test]
fn test_outside_zone_never_mutates() {
    let (engine, store, sink) = setup();

    for h in [8, 9, 12] {
        let err = engine.manual_check_in(&emp("alice"), NOWHERE, None, at(h, 0)).unwrap_err();
        assert!(err.is_policy_violation());
    }
    assert!(store.get_record(&emp("alice"), at(0, 0).date_naive()).unwrap().is_none());
    assert!(sink.sent().is_empty());
}

#[test]
fn test_passive_day() {
    let (engine, store, sink) = setup();
    let alice = emp("alice");

    // A ping never performs the first check-in
    let outcome = engine.process_location_update(&alice, HQ, None, at(8, 30)).unwrap();
    assert_eq!(outcome.status, StatusTag::AwaitingFirstCheckin);

    engine.manual_check_in(&alice, HQ, Some(8.0), at(9, 0)).unwrap();
    engine.process_location_update(&alice, NOWHERE, None, at(12, 0)).unwrap();
    engine.process_location_update(&alice, NOWHERE, None, at(12, 5)).unwrap();

    let first = engine.process_location_update(&alice, HQ, None, at(13, 0)).unwrap();
    let second = engine.process_location_update(&alice, HQ, None, at(13, 1)).unwrap();
    assert_eq!(first.status, StatusTag::AutoCheckedIn);
    assert_eq!(second.status, StatusTag::CheckedIn);

    assert_eq!(
        sink.payloads(),
        vec![
            NotificationPayload::CheckIn { zone_name: "Headquarters".into() },
            NotificationPayload::CheckOut,
            NotificationPayload::CheckIn { zone_name: "Headquarters".into() },
        ]
    );

    // Still one record for the day
    let records = store.list_records_for_day(at(0, 0).date_naive()).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].check_in_time, Some(at(9, 0)));
}

#[test]
fn test_absent_is_terminal_for_the_day() {
    let (engine, store, _) = setup();
    let carol = emp("carol");

    let report = engine.mark_absent_sweep(at(10, 30)).unwrap();
    assert_eq!(report.changed, 3);

    for point in [HQ, NOWHERE] {
        let outcome = engine.process_location_update(&carol, point, None, at(11, 0)).unwrap();
        assert_eq!(outcome.status, StatusTag::Absent);
    }
    assert!(matches!(
        engine.manual_check_in(&carol, HQ, None, at(11, 0)),
        Err(AttendanceError::MarkedAbsent)
    ));
    assert!(matches!(
        engine.manual_check_out(&carol, HQ, None, at(18, 30)),
        Err(AttendanceError::NoActiveCheckIn)
    ));

    let record = store.get_record(&carol, at(0, 0).date_naive()).unwrap().unwrap();
    assert_eq!(record.status, AttendanceStatus::Absent);
    assert_eq!(engine.mark_absent_sweep(at(11, 0)).unwrap().changed, 0);
}

#[test]
fn test_late_sweep_after_policy_check_in() {
    let (engine, store, sink) = setup();
    let threshold = NaiveTime::from_hms_opt(9, 15, 0).unwrap();

    engine.manual_check_in(&emp("alice"), HQ, None, at(9, 0)).unwrap();
    engine.manual_check_in(&emp("bob"), HQ, None, at(9, 40)).unwrap();
    sink.clear();

    let report = engine.detect_late_arrivals(threshold, at(10, 0)).unwrap();
    assert_eq!(report.changed, 1);
    assert_eq!(sink.payloads(), vec![NotificationPayload::LateArrival]);

    // LATE still counts as checked in for the rest of the day
    let bob = store.get_record(&emp("bob"), at(0, 0).date_naive()).unwrap().unwrap();
    assert_eq!(bob.status, AttendanceStatus::Late);
    assert!(matches!(
        engine.manual_check_in(&emp("bob"), HQ, None, at(10, 5)),
        Err(AttendanceError::AlreadyCheckedIn)
    ));

    let statuses = engine.team_status(&emp("m1"), at(10, 0)).unwrap();
    assert_eq!(statuses.len(), 3);
    assert_eq!(statuses[2].status, AttendanceStatus::Absent);
}

#[test]
fn test_notification_failure_is_swallowed() {
    let (engine, store, sink) = setup();
    sink.set_failing(true);

    engine.manual_check_in(&emp("alice"), HQ, None, at(9, 0)).unwrap();
    let outcome = engine.process_location_update(&emp("alice"), NOWHERE, None, at(12, 0)).unwrap();
    assert_eq!(outcome.status, StatusTag::AutoCheckedOut);

    let record = store.get_record(&emp("alice"), at(0, 0).date_naive()).unwrap().unwrap();
    assert_eq!(record.status, AttendanceStatus::CheckedOut);
}

#[test]
fn test_concurrent_pings_converge() {
    let config = parse_config(CONFIG).unwrap();
    let store = Arc::new(SqliteStore::in_memory().unwrap());
    let sink = RecordingSink::new();
    let engine = Arc::new(AttendanceEngine::new(store.clone(), Arc::new(sink.clone())).unwrap());
    engine.seed(&config.zones, &config.teams, at(0, 0)).unwrap();

    engine.manual_check_in(&emp("alice"), HQ, None, at(9, 0)).unwrap();
    sink.clear();

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let engine = engine.clone();
            thread::spawn(move || {
                engine
                    .process_location_update(&emp("alice"), NOWHERE, None, at(12, i))
                    .unwrap()
                    .status
            })
        })
        .collect();
    let statuses: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    // Exactly one ping performs the transition
    assert_eq!(statuses.iter().filter(|s| **s == StatusTag::AutoCheckedOut).count(), 1);
    assert_eq!(sink.sent().len(), 1);

    let record = store.get_record(&emp("alice"), at(0, 0).date_naive()).unwrap().unwrap();
    assert_eq!(record.status, AttendanceStatus::CheckedOut);
    assert!(record.check_out_time.is_some());
}

#[test]
fn test_statistics_over_range() {
    let (engine, _, _) = setup();
    let alice = emp("alice");

    for d in 2..=4 {
        let morning = Local.with_ymd_and_hms(2025, 6, d, 9, 0, 0).unwrap();
        engine.manual_check_in(&alice, HQ, None, morning).unwrap();
    }

    let start = at(0, 0).date_naive();
    let end = start + chrono::Duration::days(4);
    let stats = engine.statistics(&alice, start, end).unwrap();
    assert_eq!(stats.total_days, 5);
    assert_eq!(stats.present_days, 3);
    assert_eq!(stats.absent_days, 2);
    assert!((stats.attendance_percentage - 60.0).abs() < 1e-9);
}

#[test]
fn test_work_hours_change_applies_to_next_operation() {
    let (engine, _, _) = setup();

    let mut hours = engine.get_team(&TeamId::new("ops")).unwrap().work_hours;
    hours.start = Some(NaiveTime::from_hms_opt(7, 0, 0).unwrap());
    engine.set_work_hours(&TeamId::new("ops"), hours, at(6, 0)).unwrap();

    engine.manual_check_in(&emp("alice"), HQ, None, at(6, 50)).unwrap();
}

#[tokio::test]
async fn test_channel_sink_feeds_registry() {
    let config = parse_config(CONFIG).unwrap();
    let store = Arc::new(SqliteStore::in_memory().unwrap());
    let (sink, mut rx) = ChannelSink::new();
    let engine = AttendanceEngine::new(store, Arc::new(sink)).unwrap();
    engine.seed(&config.zones, &config.teams, at(0, 0)).unwrap();

    let registry = SessionRegistry::new();
    let mut alice_session = registry.subscribe(emp("alice"));
    let mut manager = registry.subscribe_all();

    engine.manual_check_in(&emp("alice"), HQ, None, at(9, 0)).unwrap();

    let notification = rx.recv().await.unwrap();
    assert_eq!(registry.deliver(&notification), 2);

    let received = alice_session.recv().await.unwrap();
    assert_eq!(received.title(), "New Check-In");
    assert!(received.message().contains("Headquarters"));
    assert_eq!(manager.recv().await.unwrap().employee_id, emp("alice"));
}

#[test]
fn test_store_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("geoattend.db");
    let config = parse_config(CONFIG).unwrap();

    {
        let store = Arc::new(SqliteStore::open(&path).unwrap());
        let engine = AttendanceEngine::new(store, Arc::new(RecordingSink::new())).unwrap();
        engine.seed(&config.zones, &config.teams, at(0, 0)).unwrap();
        engine.manual_check_in(&emp("alice"), HQ, None, at(9, 0)).unwrap();
    }

    let store = Arc::new(SqliteStore::open(&path).unwrap());
    let engine = AttendanceEngine::new(store, Arc::new(RecordingSink::new())).unwrap();
    assert!(matches!(
        engine.manual_check_in(&emp("alice"), HQ, None, at(9, 30)),
        Err(AttendanceError::AlreadyCheckedIn)
    ));
    assert!(!engine.recent_audits(10).unwrap().is_empty());
}
