use calsync_core::adapter::{MemoryAdapter, StoredEvent};
use calsync_core::sync::{ActionKind, ActionState, EngineOptions, SyncEngine};
use calsync_core::{
    Availability, CalSyncError, CalendarRef, ParticipantStatus, SyncConfig, TimeWindow,
};
use chrono::{DateTime, TimeZone, Utc};

fn at(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 16, hour, minute, 0).unwrap()
}

fn sync_window() -> TimeWindow {
    TimeWindow::upcoming(Utc.with_ymd_and_hms(2026, 3, 16, 0, 0, 0).unwrap(), 30)
}

fn options(ids: &[&str]) -> EngineOptions {
    EngineOptions {
        calendar_ids: ids.iter().map(|id| id.to_string()).collect(),
        placeholder_title: "Not available".to_string(),
    }
}

fn store(ids: &[&str]) -> MemoryAdapter {
    ids.iter().fold(MemoryAdapter::new(), |adapter, id| {
        adapter.with_calendar(id, &id.to_uppercase(), true)
    })
}

fn engine(ids: &[&str]) -> SyncEngine<MemoryAdapter> {
    SyncEngine::new(store(ids), options(ids)).unwrap()
}

#[tokio::test]
async fn accepted_event_lifecycle() {
    let engine = engine(&["a", "b"]);
    let e1 = engine.adapter().add_event(
        "a",
        "Design review",
        TimeWindow::new(at(9, 0), at(10, 0)),
        Availability::Unset,
        ParticipantStatus::Accepted,
    );

    let summary = engine.run(&sync_window(), false).await.unwrap();
    assert_eq!((summary.created, summary.updated, summary.deleted), (1, 0, 0));

    let placeholders = engine.adapter().placeholders("b");
    assert_eq!(placeholders.len(), 1);
    let placeholder = &placeholders[0];
    assert_eq!(placeholder.title, "Not available");
    assert_eq!(placeholder.window, TimeWindow::new(at(9, 0), at(10, 0)));
    assert_eq!(placeholder.availability, Availability::Busy);
    assert!(engine.adapter().placeholders("a").is_empty());

    // Nothing to do on a second pass
    let writes = engine.adapter().write_count();
    let summary = engine.run(&sync_window(), false).await.unwrap();
    assert_eq!(summary.total_changes(), 0);
    assert_eq!(summary.unchanged, 1);
    assert_eq!(engine.adapter().write_count(), writes);

    assert!(engine.adapter().reschedule(&e1, at(9, 0), at(10, 30)));
    let summary = engine.run(&sync_window(), false).await.unwrap();
    assert_eq!((summary.created, summary.updated, summary.deleted), (0, 1, 0));

    let updated = engine.adapter().get(&placeholder.id).unwrap();
    assert_eq!(updated.window, TimeWindow::new(at(9, 0), at(10, 30)));

    engine.adapter().remove(&e1);
    let summary = engine.run(&sync_window(), false).await.unwrap();
    assert_eq!((summary.created, summary.updated, summary.deleted), (0, 0, 1));
    assert!(engine.adapter().placeholders("b").is_empty());
}

#[tokio::test]
async fn update_keeps_tracking_id() {
    let engine = engine(&["a", "b"]);
    let e1 = engine.adapter().add_event(
        "a",
        "Standup",
        TimeWindow::new(at(9, 0), at(9, 15)),
        Availability::Busy,
        ParticipantStatus::None,
    );
    engine.run(&sync_window(), false).await.unwrap();
    let before = engine.adapter().placeholders("b").remove(0);

    engine.adapter().reschedule(&e1, at(9, 1), at(9, 16));
    engine.run(&sync_window(), false).await.unwrap();
    let after = engine.adapter().placeholders("b").remove(0);

    let marker = |notes: &Option<String>| {
        calsync_core::tracker::decode(notes.as_deref().unwrap()).unwrap()
    };
    assert_eq!(before.id, after.id);
    assert_eq!(marker(&before.notes).tracking_id, marker(&after.notes).tracking_id);
    assert_eq!(marker(&after.notes).occurrence_start, at(9, 1));
}

#[tokio::test]
async fn dry_run_reports_without_writing() {
    let engine = engine(&["a", "b", "c"]);
    engine.adapter().add_event(
        "a",
        "1:1",
        TimeWindow::new(at(13, 0), at(13, 30)),
        Availability::Busy,
        ParticipantStatus::None,
    );

    let dry = engine.run(&sync_window(), true).await.unwrap();
    assert!(dry.dry_run);
    assert_eq!(dry.created, 2);
    assert_eq!(engine.adapter().write_count(), 0);
    assert!(engine.adapter().placeholders("b").is_empty());
    assert!(dry.records.iter().all(|r| r.state == ActionState::Planned));

    let real = engine.run(&sync_window(), false).await.unwrap();
    assert_eq!(real.created, dry.created);
    assert_eq!(real.pairs(), dry.pairs());
}

#[tokio::test]
async fn fans_out_to_every_other_calendar() {
    let engine = engine(&["a", "b", "c"]);
    engine.adapter().add_event(
        "a",
        "Dentist",
        TimeWindow::new(at(8, 0), at(9, 0)),
        Availability::Busy,
        ParticipantStatus::None,
    );
    engine.adapter().add_event(
        "b",
        "Offsite",
        TimeWindow::new(at(11, 0), at(17, 0)),
        Availability::Unavailable,
        ParticipantStatus::None,
    );

    let summary = engine.run(&sync_window(), false).await.unwrap();
    assert_eq!(summary.created, 4);

    assert_eq!(engine.adapter().placeholders("a").len(), 1);
    assert_eq!(engine.adapter().placeholders("b").len(), 1);
    assert_eq!(engine.adapter().placeholders("c").len(), 2);

    let out_of_office = engine.adapter().placeholders("a").remove(0);
    assert_eq!(out_of_office.availability, Availability::Unavailable);

    let pairs = summary.pairs();
    assert_eq!(pairs.len(), 4);
    assert!(pairs.iter().all(|p| p.created == 1));
    assert!(pairs.iter().all(|p| p.source_calendar_id != p.target_calendar_id));

    // Placeholders are never mirrored onward
    let summary = engine.run(&sync_window(), false).await.unwrap();
    assert_eq!(summary.total_changes(), 0);
    assert_eq!(summary.unchanged, 4);
}

#[tokio::test]
async fn declining_removes_the_placeholder() {
    let engine = engine(&["a", "b"]);
    let e1 = engine.adapter().add_event(
        "a",
        "Invite",
        TimeWindow::new(at(15, 0), at(16, 0)),
        Availability::Unset,
        ParticipantStatus::Accepted,
    );
    engine.run(&sync_window(), false).await.unwrap();

    engine
        .adapter()
        .set_status(&e1, Availability::Unset, ParticipantStatus::Tentative);
    let summary = engine.run(&sync_window(), false).await.unwrap();
    assert_eq!(summary.updated, 1);
    assert_eq!(
        engine.adapter().placeholders("b")[0].availability,
        Availability::Tentative
    );

    engine
        .adapter()
        .set_status(&e1, Availability::Unset, ParticipantStatus::Declined);
    let summary = engine.run(&sync_window(), false).await.unwrap();
    assert_eq!(summary.deleted, 1);
    assert_eq!(summary.skipped, 1);
    assert!(engine.adapter().placeholders("b").is_empty());
}

#[tokio::test]
async fn write_failure_is_isolated_and_heals_on_rerun() {
    let engine = engine(&["a", "b", "c"]);
    engine.adapter().add_event(
        "a",
        "Planning",
        TimeWindow::new(at(10, 0), at(11, 0)),
        Availability::Busy,
        ParticipantStatus::None,
    );
    engine.adapter().set_failing("b", true);

    let summary = engine.run(&sync_window(), false).await.unwrap();
    assert!(summary.has_failures());
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.created, 1);
    assert!(summary.failures[0].cause.contains("rejected"));
    assert!(engine.adapter().placeholders("b").is_empty());
    assert_eq!(engine.adapter().placeholders("c").len(), 1);

    let failed = summary.records.iter().find(|r| r.is_failed()).unwrap();
    assert_eq!(failed.action.target_calendar_id(), "b");
    assert_eq!(failed.action.kind(), ActionKind::Create);

    engine.adapter().set_failing("b", false);
    let summary = engine.run(&sync_window(), false).await.unwrap();
    assert!(!summary.has_failures());
    assert_eq!(summary.created, 1);
    assert_eq!(summary.unchanged, 1);

    let summary = engine.run(&sync_window(), false).await.unwrap();
    assert_eq!(summary.total_changes(), 0);
}

#[tokio::test]
async fn denied_access_fails_before_any_write() {
    let engine = engine(&["a", "b"]);
    engine.adapter().add_event(
        "a",
        "Busy",
        TimeWindow::new(at(9, 0), at(10, 0)),
        Availability::Busy,
        ParticipantStatus::None,
    );
    engine.adapter().deny_access();

    let err = engine.run(&sync_window(), false).await.unwrap_err();
    assert!(matches!(err, CalSyncError::AccessDenied(_)));
    assert!(err.is_fatal());
    assert_eq!(engine.adapter().write_count(), 0);
}

#[tokio::test]
async fn missing_calendar_is_fatal() {
    let engine = SyncEngine::new(store(&["a", "b"]), options(&["a", "b", "gone"])).unwrap();
    engine.adapter().add_event(
        "a",
        "Busy",
        TimeWindow::new(at(9, 0), at(10, 0)),
        Availability::Busy,
        ParticipantStatus::None,
    );

    let err = engine.run(&sync_window(), false).await.unwrap_err();
    assert!(matches!(err, CalSyncError::CalendarNotFound(id) if id == "gone"));
    assert_eq!(engine.adapter().write_count(), 0);
}

#[tokio::test]
async fn read_only_calendar_is_fatal() {
    let adapter = MemoryAdapter::new()
        .with_calendar("a", "Work", true)
        .with_calendar("holidays", "Holidays", false);
    let engine = SyncEngine::new(adapter, options(&["a", "holidays"])).unwrap();

    let err = engine.run(&sync_window(), true).await.unwrap_err();
    assert!(matches!(err, CalSyncError::AccessDenied(msg) if msg.contains("Holidays")));
}

#[tokio::test]
async fn unmanaged_events_are_left_alone() {
    let engine = engine(&["a", "b"]);
    let lunch = engine.adapter().add_event(
        "b",
        "Lunch",
        TimeWindow::new(at(12, 0), at(13, 0)),
        Availability::Free,
        ParticipantStatus::None,
    );
    let before = engine.adapter().get(&lunch).unwrap();

    let summary = engine.run(&sync_window(), false).await.unwrap();
    assert_eq!(summary.total_changes(), 0);
    assert_eq!(summary.skipped, 1);
    assert_eq!(engine.adapter().get(&lunch), Some(before));
    assert!(engine.adapter().placeholders("a").is_empty());
}

#[tokio::test]
async fn placeholders_with_undecodable_markers_are_never_mirrored() {
    let engine = engine(&["a", "b"]);
    // Written before markers carried the occurrence start
    let legacy = StoredEvent {
        id: "old-ph".to_string(),
        series_id: None,
        calendar_id: "b".to_string(),
        title: "Nicht verfügbar".to_string(),
        window: TimeWindow::new(at(9, 0), at(10, 0)),
        notes: Some(
            r#"[CALSYNC:{"tid": "ab12cd34", "src": "e1", "scal": "a", "hash": "0123456789abcdef"}]"#
                .to_string(),
        ),
        availability: Availability::Busy,
        self_status: ParticipantStatus::None,
    };
    engine.adapter().insert(legacy.clone());

    let summary = engine.run(&sync_window(), false).await.unwrap();
    assert_eq!(summary.total_changes(), 0);
    assert_eq!(summary.skipped, 0);
    assert!(engine.adapter().events("a").is_empty());
    assert_eq!(engine.adapter().get("old-ph"), Some(legacy));
    assert_eq!(engine.adapter().write_count(), 0);
}

#[tokio::test]
async fn events_outside_the_window_are_not_mirrored() {
    let engine = engine(&["a", "b"]);
    let late = Utc.with_ymd_and_hms(2026, 5, 1, 9, 0, 0).unwrap();
    engine.adapter().add_event(
        "a",
        "Far away",
        TimeWindow::new(late, late + chrono::Duration::hours(1)),
        Availability::Busy,
        ParticipantStatus::None,
    );

    let summary = engine.run(&sync_window(), false).await.unwrap();
    assert_eq!(summary.total_changes(), 0);
}

#[tokio::test]
async fn options_come_from_config() {
    let config = SyncConfig {
        calendars: vec![
            CalendarRef {
                id: "a".into(),
                name: "Work".into(),
            },
            CalendarRef {
                id: "b".into(),
                name: "Home".into(),
            },
        ],
        placeholder_title: "Blocked".into(),
        ..SyncConfig::default()
    };
    let engine = SyncEngine::new(store(&["a", "b"]), EngineOptions::from(&config)).unwrap();
    engine.adapter().add_event(
        "b",
        "School run",
        TimeWindow::new(at(8, 0), at(8, 30)),
        Availability::Busy,
        ParticipantStatus::None,
    );

    engine.run(&sync_window(), false).await.unwrap();
    assert_eq!(engine.adapter().placeholders("a")[0].title, "Blocked");
}

#[test]
fn engine_needs_two_distinct_calendars() {
    let result = SyncEngine::new(store(&["a"]), options(&["a", "a"]));
    assert!(matches!(result, Err(CalSyncError::NotEnoughCalendars(1))));
}
