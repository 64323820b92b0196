use chrono::{NaiveDate, Weekday};
use school_days::{
    Calendar, CoverageKind, DayScope, EventDraft, EventType, PersistenceError, SchoolWeek, Step,
    export_events_to_csv, import_events_from_csv, load_calendar_from_json, save_calendar_to_json,
};
use std::io::Write;
use tempfile::NamedTempFile;

fn d(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn build_sample_calendar() -> Calendar {
    let mut calendar = Calendar::new(4, 2021, 12)
        .with_steps(vec![
            Step::new(1, d(2021, 2, 1), d(2021, 6, 30))
                .with_posting_window(d(2021, 2, 1), d(2021, 7, 9)),
            Step::new(2, d(2021, 8, 2), d(2021, 12, 17)),
        ])
        .unwrap();
    calendar.set_number_of_classes(5);
    calendar.set_school_week(
        SchoolWeek::new([
            Weekday::Mon,
            Weekday::Tue,
            Weekday::Wed,
            Weekday::Thu,
            Weekday::Fri,
            Weekday::Sat,
        ])
        .unwrap(),
    );
    calendar
        .set_classroom_steps(30, vec![Step::new(1, d(2021, 2, 8), d(2021, 12, 10))])
        .unwrap();
    calendar
        .add_event(
            &EventDraft::new("Carnival", EventType::Holiday, d(2021, 2, 15), CoverageKind::ByUnity)
                .with_legend("H"),
        )
        .unwrap();
    calendar
        .add_event(
            &EventDraft::new(
                "Reading week, block A",
                EventType::Recess,
                d(2021, 7, 12),
                CoverageKind::ByGrade,
            )
            .with_grade(3)
            .with_periods([1, 2])
            .with_legend("R"),
        )
        .unwrap();
    calendar
        .add_event(
            &EventDraft::new(
                "Replacement class",
                EventType::ExtraSchool,
                d(2021, 3, 7),
                CoverageKind::ByClassroom,
            )
            .with_grade(3)
            .with_classroom(30)
            .with_periods([2]),
        )
        .unwrap();
    calendar
}

#[test]
fn json_round_trip_preserves_calendar() {
    let calendar = build_sample_calendar();
    let tmp = NamedTempFile::new().unwrap();
    save_calendar_to_json(&calendar, tmp.path()).unwrap();

    let loaded = load_calendar_from_json(tmp.path()).unwrap();
    assert_eq!(loaded, calendar);
    assert_eq!(loaded.classroom_step(30, d(2021, 7, 1)).map(Step::to_number), Some(1));
    assert!(loaded.is_school_day(d(2021, 3, 6), DayScope::unity()));
}

#[test]
fn json_snapshot_with_bad_steps_is_rejected() {
    let mut tmp = NamedTempFile::new().unwrap();
    write!(
        tmp,
        r#"{{"id": 1, "year": 2021, "unity_id": 1, "steps": [
            {{"step_number": 1, "start_at": "2021-02-01", "end_at": "2021-05-01",
              "start_date_for_posting": "2021-02-01", "end_date_for_posting": "2021-05-01"}},
            {{"step_number": 2, "start_at": "2021-04-01", "end_at": "2021-06-30",
              "start_date_for_posting": "2021-04-01", "end_date_for_posting": "2021-06-30"}}
        ]}}"#
    )
    .unwrap();

    let err = load_calendar_from_json(tmp.path()).unwrap_err();
    assert!(matches!(err, PersistenceError::Calendar(_)));
}

#[test]
fn json_snapshot_with_empty_school_week_is_rejected() {
    let mut tmp = NamedTempFile::new().unwrap();
    write!(
        tmp,
        r#"{{"id": 1, "year": 2021, "unity_id": 1, "school_week": {{"weekdays": []}}}}"#
    )
    .unwrap();
    assert!(matches!(
        load_calendar_from_json(tmp.path()),
        Err(PersistenceError::Calendar(_))
    ));
}

#[test]
fn csv_export_then_import_into_empty_calendar() {
    let calendar = build_sample_calendar();
    let tmp = NamedTempFile::new().unwrap();
    export_events_to_csv(&calendar, tmp.path()).unwrap();

    let contents = std::fs::read_to_string(tmp.path()).unwrap();
    let mut lines = contents.lines();
    assert_eq!(
        lines.next(),
        Some("id,description,event_type,event_date,coverage,periods,grade_id,classroom_id,legend")
    );
    assert!(contents.contains("\"Reading week, block A\""));
    assert!(contents.contains("by_classroom"));

    let mut target = Calendar::new(9, 2021, 12);
    let created = import_events_from_csv(&mut target, tmp.path()).unwrap();
    assert_eq!(created, 3);

    let imported: Vec<_> = target.events().map(|event| event.to_draft()).collect();
    let original: Vec<_> = calendar.events().map(|event| event.to_draft()).collect();
    assert_eq!(imported, original);
}

#[test]
fn csv_import_is_all_or_nothing() {
    let mut calendar = build_sample_calendar();
    let before = calendar.clone();

    let mut tmp = NamedTempFile::new().unwrap();
    writeln!(
        tmp,
        "id,description,event_type,event_date,coverage,periods,grade_id,classroom_id,legend"
    )
    .unwrap();
    writeln!(tmp, ",Teacher training,recess,2021-03-10,by_unity,,,,T").unwrap();
    // conflicts with the stored grade 3 recess on the same date
    writeln!(tmp, ",Makeup,extra_school,2021-07-12,by_grade,,3,,").unwrap();

    let err = import_events_from_csv(&mut calendar, tmp.path()).unwrap_err();
    assert!(matches!(err, PersistenceError::Calendar(_)));
    assert_eq!(calendar, before);
}

#[test]
fn csv_import_reports_malformed_values() {
    let mut calendar = Calendar::new(1, 2021, 1);
    let mut tmp = NamedTempFile::new().unwrap();
    writeln!(
        tmp,
        "id,description,event_type,event_date,coverage,periods,grade_id,classroom_id,legend"
    )
    .unwrap();
    writeln!(tmp, ",Party,festival,2021-03-10,by_unity,,,,P").unwrap();

    match import_events_from_csv(&mut calendar, tmp.path()) {
        Err(PersistenceError::InvalidData(message)) => assert!(message.contains("festival")),
        other => panic!("expected invalid data, got {other:?}"),
    }
    assert_eq!(calendar.event_count(), 0);
}
