use chrono::{Datelike, NaiveDate};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::iter::successors;
use tracing::debug;

use crate::calendar::{Calendar, CalendarWindow};
use crate::classroom::{Classroom, ClassroomDirectory};
use crate::error::LookupError;
use crate::event::EventType;
use crate::precedence::{EventPrecedenceResolver, Tier};
use crate::step::find_step;
use crate::{ClassroomId, EventId, GradeId};

/// Why a date was or was not counted as a school day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DecisionReason {
    Event {
        event_id: EventId,
        event_type: EventType,
        tier: Tier,
    },
    OutsideCalendar,
    SchoolWeekday,
    RestDay,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchoolDayDecision {
    pub date: NaiveDate,
    pub is_school_day: bool,
    pub reason: DecisionReason,
}

/// Who the question is asked for: the whole unity, a grade, or a classroom.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DayScope<'a> {
    pub grade_id: Option<GradeId>,
    pub classroom: Option<&'a Classroom>,
}

impl<'a> DayScope<'a> {
    pub fn unity() -> Self {
        Self::default()
    }

    pub fn grade(grade_id: GradeId) -> Self {
        Self {
            grade_id: Some(grade_id),
            classroom: None,
        }
    }

    pub fn classroom(classroom: &'a Classroom) -> Self {
        Self {
            grade_id: Some(classroom.grade_id),
            classroom: Some(classroom),
        }
    }
}

/// Decides whether one date is an instructional day.
///
/// The calendar and date are required by construction; grade and classroom
/// narrow which events apply.
pub struct SchoolDayChecker<'a> {
    calendar: &'a Calendar,
    date: NaiveDate,
    grade_id: Option<GradeId>,
    classroom: Option<&'a Classroom>,
}

impl<'a> SchoolDayChecker<'a> {
    pub fn new(calendar: &'a Calendar, date: NaiveDate) -> Self {
        Self {
            calendar,
            date,
            grade_id: None,
            classroom: None,
        }
    }

    pub fn for_grade(mut self, grade_id: GradeId) -> Self {
        self.grade_id = Some(grade_id);
        self
    }

    pub fn for_classroom(mut self, classroom: &'a Classroom) -> Self {
        self.classroom = Some(classroom);
        self
    }

    pub fn with_scope(mut self, scope: DayScope<'a>) -> Self {
        self.grade_id = scope.grade_id;
        self.classroom = scope.classroom;
        self
    }

    pub fn decide(&self) -> SchoolDayDecision {
        let resolver = EventPrecedenceResolver::new(self.calendar);
        if let Some(found) = resolver.resolve(self.date, self.grade_id, self.classroom) {
            return SchoolDayDecision {
                date: self.date,
                is_school_day: found.verdict.is_school_day(),
                reason: DecisionReason::Event {
                    event_id: found.event.id(),
                    event_type: found.event.event_type(),
                    tier: found.tier,
                },
            };
        }

        if find_step(self.calendar, self.date).is_none() {
            debug!(date = %self.date, calendar_id = self.calendar.id(), "date outside every step");
            return SchoolDayDecision {
                date: self.date,
                is_school_day: false,
                reason: DecisionReason::OutsideCalendar,
            };
        }

        let is_school_day = self
            .calendar
            .school_week()
            .is_school_weekday(self.date.weekday());
        SchoolDayDecision {
            date: self.date,
            is_school_day,
            reason: if is_school_day {
                DecisionReason::SchoolWeekday
            } else {
                DecisionReason::RestDay
            },
        }
    }

    pub fn is_school_day(&self) -> bool {
        self.decide().is_school_day
    }
}

pub fn is_school_day(
    calendar: &Calendar,
    date: NaiveDate,
    grade_id: Option<GradeId>,
    classroom: Option<&Classroom>,
) -> bool {
    SchoolDayChecker::new(calendar, date)
        .with_scope(DayScope {
            grade_id,
            classroom,
        })
        .is_school_day()
}

/// Id-based entry point: resolves the classroom through `directory` first.
/// An unknown classroom is reported, never replaced by a default.
pub fn is_school_day_by_id<D>(
    calendar: &Calendar,
    directory: &D,
    date: NaiveDate,
    grade_id: Option<GradeId>,
    classroom_id: Option<ClassroomId>,
) -> Result<bool, LookupError>
where
    D: ClassroomDirectory + ?Sized,
{
    let classroom = match classroom_id {
        Some(id) => Some(
            directory
                .classroom(id)
                .ok_or(LookupError::ClassroomNotFound(id))?,
        ),
        None => None,
    };
    Ok(is_school_day(calendar, date, grade_id, classroom.as_ref()))
}

impl Calendar {
    pub fn decide(&self, date: NaiveDate, scope: DayScope<'_>) -> SchoolDayDecision {
        SchoolDayChecker::new(self, date).with_scope(scope).decide()
    }

    pub fn is_school_day(&self, date: NaiveDate, scope: DayScope<'_>) -> bool {
        self.decide(date, scope).is_school_day
    }

    /// School days in `[start, end]`, in order.
    pub fn school_days_in_range(
        &self,
        scope: DayScope<'_>,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Vec<NaiveDate> {
        days_between(start, end)
            .filter(|day| self.is_school_day(*day, scope))
            .collect()
    }

    pub fn count_school_days(&self, scope: DayScope<'_>, start: NaiveDate, end: NaiveDate) -> i64 {
        days_between(start, end)
            .filter(|day| self.is_school_day(*day, scope))
            .count() as i64
    }

    /// Next school day after `from`. Extra-school events may fall outside the
    /// steps, so the search runs up to the later of the last step end and the
    /// last event date.
    pub fn next_school_day(&self, scope: DayScope<'_>, from: NaiveDate) -> Option<NaiveDate> {
        let limit = self.search_limit()?.1;
        successors(from.succ_opt(), |day| day.succ_opt())
            .take_while(|day| *day <= limit)
            .find(|day| self.is_school_day(*day, scope))
    }

    pub fn previous_school_day(&self, scope: DayScope<'_>, from: NaiveDate) -> Option<NaiveDate> {
        let limit = self.search_limit()?.0;
        successors(from.pred_opt(), |day| day.pred_opt())
            .take_while(|day| *day >= limit)
            .find(|day| self.is_school_day(*day, scope))
    }

    /// School days of every classroom over `[start, end]`, evaluated in
    /// parallel against this calendar.
    pub fn school_days_by_classroom(
        &self,
        classrooms: &[Classroom],
        start: NaiveDate,
        end: NaiveDate,
    ) -> HashMap<ClassroomId, Vec<NaiveDate>> {
        classrooms
            .par_iter()
            .map(|classroom| {
                (
                    classroom.id,
                    self.school_days_in_range(DayScope::classroom(classroom), start, end),
                )
            })
            .collect()
    }

    fn search_limit(&self) -> Option<(NaiveDate, NaiveDate)> {
        let first_event = self.events().next().map(|event| event.event_date());
        let last_event = self.events().last().map(|event| event.event_date());
        let (step_start, step_end) = match self.span() {
            Some((start, end)) => (Some(start), Some(end)),
            None => (None, None),
        };
        let start = [step_start, first_event].into_iter().flatten().min()?;
        let end = [step_end, last_event].into_iter().flatten().max()?;
        Some((start, end))
    }
}

/// Every date of `[start, end]`, stopping at the last representable date.
fn days_between(start: NaiveDate, end: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    successors(Some(start), |day| day.succ_opt()).take_while(move |day| *day <= end)
}

impl CalendarWindow {
    /// Decision for `date`, or `None` when the date lies outside the window.
    pub fn decide(&self, date: NaiveDate, scope: DayScope<'_>) -> Option<SchoolDayDecision> {
        self.contains(date).then(|| self.calendar.decide(date, scope))
    }

    pub fn is_school_day(&self, date: NaiveDate, scope: DayScope<'_>) -> Option<bool> {
        self.decide(date, scope).map(|decision| decision.is_school_day)
    }

    /// School days of the whole window, in order.
    pub fn school_days(&self, scope: DayScope<'_>) -> Vec<NaiveDate> {
        self.calendar.school_days_in_range(scope, self.start(), self.end())
    }

    pub fn count_school_days(&self, scope: DayScope<'_>) -> i64 {
        self.calendar.count_school_days(scope, self.start(), self.end())
    }

    /// School days of every classroom over the window, evaluated in parallel.
    pub fn school_days_by_classroom(
        &self,
        classrooms: &[Classroom],
    ) -> HashMap<ClassroomId, Vec<NaiveDate>> {
        self.calendar
            .school_days_by_classroom(classrooms, self.start(), self.end())
    }
}
