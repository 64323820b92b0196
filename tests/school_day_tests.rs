use chrono::{Datelike, NaiveDate};
use school_days::checker::is_school_day_by_id;
use school_days::{
    Calendar, Classroom, CoverageKind, DayScope, DecisionReason, EventDraft, EventType,
    LookupError, SchoolDayChecker, SchoolWeek, Step, Tier, is_school_day,
};
use std::collections::HashMap;

fn d(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn calendar_2021() -> Calendar {
    Calendar::new(1, 2021, 10)
        .with_steps(vec![Step::new(1, d(2021, 1, 1), d(2021, 6, 30))])
        .unwrap()
}

#[test]
fn unity_holiday_suspends_classes() {
    let mut calendar = calendar_2021();
    calendar
        .add_event(
            &EventDraft::new("Carnival", EventType::Holiday, d(2021, 2, 15), CoverageKind::ByUnity)
                .with_legend("H"),
        )
        .unwrap();

    assert!(!is_school_day(&calendar, d(2021, 2, 15), None, None));
    assert!(is_school_day(&calendar, d(2021, 2, 16), None, None));
    assert!(!is_school_day(&calendar, d(2021, 2, 15), Some(3), None));
}

#[test]
fn dates_outside_every_step_are_never_school_days() {
    let calendar = calendar_2021();
    let decision = calendar.decide(d(2020, 12, 31), DayScope::unity());
    assert!(!decision.is_school_day);
    assert_eq!(decision.reason, DecisionReason::OutsideCalendar);
    assert!(!calendar.is_school_day(d(2021, 7, 1), DayScope::unity()));
}

#[test]
fn default_rule_uses_weekdays() {
    let calendar = calendar_2021();
    // 2021-03-05 is a Friday, 2021-03-06 a Saturday
    let friday = calendar.decide(d(2021, 3, 5), DayScope::unity());
    assert_eq!(friday.reason, DecisionReason::SchoolWeekday);
    assert!(friday.is_school_day);

    let saturday = calendar.decide(d(2021, 3, 6), DayScope::unity());
    assert_eq!(saturday.reason, DecisionReason::RestDay);
    assert!(!saturday.is_school_day);
}

#[test]
fn custom_school_week_includes_saturday() {
    let mut calendar = calendar_2021();
    calendar.set_school_week(
        SchoolWeek::new([
            chrono::Weekday::Mon,
            chrono::Weekday::Tue,
            chrono::Weekday::Wed,
            chrono::Weekday::Thu,
            chrono::Weekday::Fri,
            chrono::Weekday::Sat,
        ])
        .unwrap(),
    );
    assert!(calendar.is_school_day(d(2021, 3, 6), DayScope::unity()));
    assert!(!calendar.is_school_day(d(2021, 3, 7), DayScope::unity()));
}

#[test]
fn grade_extra_school_day_overrides_weekend() {
    let mut calendar = calendar_2021();
    calendar
        .add_event(
            &EventDraft::new(
                "Saturday makeup",
                EventType::ExtraSchool,
                d(2021, 3, 6),
                CoverageKind::ByGrade,
            )
            .with_grade(7)
            .with_periods([1, 2]),
        )
        .unwrap();
    let classroom = Classroom::new(70, 7, 1);

    assert!(is_school_day(&calendar, d(2021, 3, 6), Some(7), None));
    assert!(is_school_day(&calendar, d(2021, 3, 6), Some(7), Some(&classroom)));
    assert!(!is_school_day(&calendar, d(2021, 3, 6), Some(8), None));
    assert!(!is_school_day(&calendar, d(2021, 3, 6), None, None));
}

#[test]
fn classroom_extra_school_day_beats_unity_holiday() {
    let mut calendar = calendar_2021();
    calendar
        .add_event(
            &EventDraft::new("Holiday", EventType::Holiday, d(2021, 4, 21), CoverageKind::ByUnity)
                .with_legend("H"),
        )
        .unwrap();
    let makeup = calendar
        .add_event(
            &EventDraft::new(
                "Replacement class",
                EventType::ExtraSchool,
                d(2021, 4, 21),
                CoverageKind::ByClassroom,
            )
            .with_grade(7)
            .with_classroom(71)
            .with_periods([2]),
        )
        .unwrap()
        .id();

    let classroom = Classroom::new(71, 7, 2);
    let other = Classroom::new(72, 7, 2);

    let decision = SchoolDayChecker::new(&calendar, d(2021, 4, 21))
        .for_grade(7)
        .for_classroom(&classroom)
        .decide();
    assert!(decision.is_school_day);
    assert_eq!(
        decision.reason,
        DecisionReason::Event {
            event_id: makeup,
            event_type: EventType::ExtraSchool,
            tier: Tier::Classroom,
        }
    );
    assert!(!is_school_day(&calendar, d(2021, 4, 21), Some(7), Some(&other)));
}

#[test]
fn grade_defaults_to_classroom_grade() {
    let mut calendar = calendar_2021();
    calendar
        .add_event(
            &EventDraft::new(
                "Field trip",
                EventType::ExtraSchoolWithoutFrequency,
                d(2021, 5, 4),
                CoverageKind::ByClassroom,
            )
            .with_grade(4)
            .with_classroom(40)
            .with_periods([1])
            .with_legend("T"),
        )
        .unwrap();
    let classroom = Classroom::new(40, 4, 1);
    assert!(!calendar.is_school_day(d(2021, 5, 4), DayScope::classroom(&classroom)));
    assert!(!is_school_day(&calendar, d(2021, 5, 4), None, Some(&classroom)));
}

#[test]
fn unknown_classroom_id_is_reported() {
    let calendar = calendar_2021();
    let directory: HashMap<i32, Classroom> = HashMap::from([(1, Classroom::new(1, 2, 1))]);

    assert_eq!(
        is_school_day_by_id(&calendar, &directory, d(2021, 3, 1), Some(2), Some(1)),
        Ok(true)
    );
    assert_eq!(
        is_school_day_by_id(&calendar, &directory, d(2021, 3, 1), Some(2), Some(99)),
        Err(LookupError::ClassroomNotFound(99))
    );
}

#[test]
fn range_helpers_walk_the_calendar() {
    let mut calendar = calendar_2021();
    calendar
        .add_event(
            &EventDraft::new("Holiday", EventType::Holiday, d(2021, 3, 3), CoverageKind::ByUnity)
                .with_legend("H"),
        )
        .unwrap();
    let scope = DayScope::unity();

    // Mon 2021-03-01 .. Sun 2021-03-07 minus the Wednesday holiday
    let days = calendar.school_days_in_range(scope, d(2021, 3, 1), d(2021, 3, 7));
    assert_eq!(
        days,
        vec![d(2021, 3, 1), d(2021, 3, 2), d(2021, 3, 4), d(2021, 3, 5)]
    );
    assert_eq!(calendar.count_school_days(scope, d(2021, 3, 1), d(2021, 3, 7)), 4);
    assert_eq!(calendar.next_school_day(scope, d(2021, 3, 2)), Some(d(2021, 3, 4)));
    assert_eq!(calendar.next_school_day(scope, d(2021, 3, 5)), Some(d(2021, 3, 8)));
    assert_eq!(calendar.previous_school_day(scope, d(2021, 3, 4)), Some(d(2021, 3, 2)));
    assert_eq!(calendar.next_school_day(scope, d(2021, 6, 30)), None);
    assert_eq!(calendar.previous_school_day(scope, d(2021, 1, 1)), None);
}

#[test]
fn calendar_without_steps_or_events_has_no_school_days() {
    let calendar = Calendar::new(2, 2021, 10);
    assert!(!calendar.is_school_day(d(2021, 3, 1), DayScope::unity()));
    assert_eq!(calendar.next_school_day(DayScope::unity(), d(2021, 3, 1)), None);
}

#[test]
fn batch_by_classroom_matches_single_decisions() {
    let mut calendar = calendar_2021();
    calendar
        .add_event(
            &EventDraft::new(
                "Morning shift meeting",
                EventType::Recess,
                d(2021, 3, 2),
                CoverageKind::ByGrade,
            )
            .with_grade(1)
            .with_periods([1])
            .with_legend("R"),
        )
        .unwrap();
    let classrooms = vec![
        Classroom::new(10, 1, 1),
        Classroom::new(11, 1, 2),
        Classroom::new(20, 2, 1),
    ];

    let batch = calendar.school_days_by_classroom(&classrooms, d(2021, 3, 1), d(2021, 3, 5));
    assert_eq!(batch.len(), 3);
    assert_eq!(batch[&10].len(), 4);
    assert_eq!(batch[&11].len(), 5);
    assert_eq!(batch[&20].len(), 5);
    for classroom in &classrooms {
        assert_eq!(
            batch[&classroom.id],
            calendar.school_days_in_range(DayScope::classroom(classroom), d(2021, 3, 1), d(2021, 3, 5))
        );
    }
}

#[test]
fn range_helpers_stop_at_the_last_representable_date() {
    let max = NaiveDate::MAX;
    let week_before = max - chrono::Duration::days(6);
    let calendar = Calendar::new(3, max.year(), 10)
        .with_steps(vec![Step::new(1, max - chrono::Duration::days(30), max)])
        .unwrap();
    let scope = DayScope::unity();

    assert_eq!(calendar.next_school_day(scope, max), None);
    assert_eq!(calendar.school_days_in_range(scope, week_before, max).len(), 5);
    assert_eq!(calendar.count_school_days(scope, week_before, max), 5);
    assert!(calendar.previous_school_day(scope, max).is_some());
}

#[test]
fn range_helpers_stop_at_the_first_representable_date() {
    let min = NaiveDate::MIN;
    let week_after = min + chrono::Duration::days(6);
    let calendar = Calendar::new(4, min.year(), 10)
        .with_steps(vec![Step::new(1, min, min + chrono::Duration::days(30))])
        .unwrap();
    let scope = DayScope::unity();

    assert_eq!(calendar.previous_school_day(scope, min), None);
    assert_eq!(calendar.school_days_in_range(scope, min, week_after).len(), 5);
    assert!(calendar.next_school_day(scope, min).is_some());
}
