use chrono::{Datelike, Duration, NaiveDate, Weekday};
use proptest::prelude::*;
use school_days::{
    Calendar, Classroom, CoverageKind, DayScope, EventDraft, EventType, Step, is_school_day,
};

fn d(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn first_half_2021() -> Calendar {
    Calendar::new(1, 2021, 10)
        .with_steps(vec![Step::new(1, d(2021, 1, 1), d(2021, 6, 30))])
        .unwrap()
}

fn any_day_of_2021() -> impl Strategy<Value = NaiveDate> {
    (0i64..365).prop_map(|offset| d(2021, 1, 1) + Duration::days(offset))
}

fn any_classroom() -> impl Strategy<Value = Classroom> {
    (1i32..50, 1i32..6, 1i32..4).prop_map(|(id, grade, period)| Classroom::new(id, grade, period))
}

proptest! {
    #[test]
    fn without_events_weekdays_inside_steps_are_school_days(date in any_day_of_2021()) {
        let calendar = first_half_2021();
        let inside = date <= d(2021, 6, 30);
        let weekday = !matches!(date.weekday(), Weekday::Sat | Weekday::Sun);
        prop_assert_eq!(is_school_day(&calendar, date, None, None), inside && weekday);
    }

    #[test]
    fn dates_outside_steps_are_never_school_days(
        offset in 1i64..400,
        classroom in any_classroom(),
    ) {
        let calendar = first_half_2021();
        let after = d(2021, 6, 30) + Duration::days(offset);
        let before = d(2021, 1, 1) - Duration::days(offset);
        let scope = DayScope::classroom(&classroom);
        prop_assert!(!calendar.is_school_day(after, scope));
        prop_assert!(!calendar.is_school_day(before, scope));
    }

    #[test]
    fn unity_holiday_closes_every_scope(
        offset in 0i64..181,
        classroom in any_classroom(),
    ) {
        let date = d(2021, 1, 1) + Duration::days(offset);
        let mut calendar = first_half_2021();
        calendar
            .add_event(
                &EventDraft::new("Holiday", EventType::Holiday, date, CoverageKind::ByUnity)
                    .with_legend("H"),
            )
            .unwrap();
        prop_assert!(!is_school_day(&calendar, date, None, None));
        prop_assert!(!is_school_day(&calendar, date, Some(classroom.grade_id), None));
        prop_assert!(!is_school_day(&calendar, date, Some(classroom.grade_id), Some(&classroom)));
    }

    #[test]
    fn classroom_makeup_day_overrides_unity_holiday(
        offset in 0i64..181,
        classroom in any_classroom(),
    ) {
        let date = d(2021, 1, 1) + Duration::days(offset);
        let mut calendar = first_half_2021();
        calendar
            .add_event(
                &EventDraft::new("Holiday", EventType::Holiday, date, CoverageKind::ByUnity)
                    .with_legend("H"),
            )
            .unwrap();
        calendar
            .add_event(
                &EventDraft::new("Makeup", EventType::ExtraSchool, date, CoverageKind::ByClassroom)
                    .with_grade(classroom.grade_id)
                    .with_classroom(classroom.id)
                    .with_periods([classroom.period]),
            )
            .unwrap();
        prop_assert!(is_school_day(&calendar, date, Some(classroom.grade_id), Some(&classroom)));
    }

    #[test]
    fn range_count_matches_daily_decisions(start in any_day_of_2021(), len in 0i64..60) {
        let calendar = first_half_2021();
        let end = start + Duration::days(len);
        let scope = DayScope::unity();
        let days = calendar.school_days_in_range(scope, start, end);
        prop_assert_eq!(days.len() as i64, calendar.count_school_days(scope, start, end));
        prop_assert!(days.iter().all(|day| calendar.is_school_day(*day, scope)));
    }
}
