use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use tracing::{debug, warn};

use crate::calendar::Calendar;
use crate::classroom::Classroom;
use crate::event::{CalendarEvent, Coverage};
use crate::GradeId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Classroom,
    Grade,
    Unity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    SchoolDay,
    NoSchool,
}

impl Verdict {
    pub fn is_school_day(self) -> bool {
        self == Verdict::SchoolDay
    }
}

/// The controlling event of a date and what it means for the day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution<'a> {
    pub event: &'a CalendarEvent,
    pub tier: Tier,
    pub verdict: Verdict,
}

/// Chooses the one event that controls a date.
///
/// Events are scanned tier by tier, from the narrowest coverage that can
/// reach the caller (classroom) to the widest (unity). Inside a tier, an
/// event that suspends classes beats a frequency-bearing one. The first tier
/// holding any matching event decides the day.
pub struct EventPrecedenceResolver<'a> {
    calendar: &'a Calendar,
}

impl<'a> EventPrecedenceResolver<'a> {
    pub fn new(calendar: &'a Calendar) -> Self {
        Self { calendar }
    }

    /// Controlling event for `date` as seen by `grade_id` and `classroom`, or
    /// `None` when no event reaches them.
    ///
    /// With a classroom, grade- and unity-wide events only count when they
    /// list the classroom's period; a unity-wide event of any period is still
    /// consulted last. A missing `grade_id` falls back to the classroom's grade.
    pub fn resolve(
        &self,
        date: NaiveDate,
        grade_id: Option<GradeId>,
        classroom: Option<&Classroom>,
    ) -> Option<Resolution<'a>> {
        let events = self.calendar.events_on(date);
        if events.is_empty() {
            return None;
        }

        let resolution = match classroom {
            Some(classroom) => {
                let grade_id = grade_id.or(Some(classroom.grade_id));
                let period = classroom.period;
                scan(events, Tier::Classroom, |event| {
                    event.classroom_id() == Some(classroom.id) && event.grade_id() == grade_id
                })
                .or_else(|| {
                    scan(events, Tier::Grade, |event| {
                        is_grade_wide(event, grade_id) && event.applies_to_period(period)
                    })
                })
                .or_else(|| {
                    scan(events, Tier::Unity, |event| {
                        is_unity_wide(event) && event.applies_to_period(period)
                    })
                })
            }
            None => grade_id.and_then(|grade_id| {
                scan(events, Tier::Grade, |event| is_grade_wide(event, Some(grade_id)))
            }),
        }
        .or_else(|| scan(events, Tier::Unity, is_unity_wide));

        match &resolution {
            Some(found) => debug!(
                %date,
                event_id = found.event.id(),
                tier = ?found.tier,
                verdict = ?found.verdict,
                "controlling event resolved"
            ),
            None => debug!(%date, "no event controls date"),
        }
        resolution
    }
}

fn is_grade_wide(event: &CalendarEvent, grade_id: Option<GradeId>) -> bool {
    matches!(event.coverage(), Coverage::ByGrade { .. }) && event.grade_id() == grade_id
}

fn is_unity_wide(event: &CalendarEvent) -> bool {
    event.grade_id().is_none() && event.classroom_id().is_none()
}

/// One tier: suspending events first, then frequency-bearing ones.
fn scan<'a, F>(events: &'a [CalendarEvent], tier: Tier, matches: F) -> Option<Resolution<'a>>
where
    F: Fn(&CalendarEvent) -> bool,
{
    let (bearing, suspending): (Vec<&CalendarEvent>, Vec<&CalendarEvent>) = events
        .iter()
        .filter(|event| matches(event))
        .partition(|event| event.is_frequency_bearing());

    let (candidates, verdict) = if !suspending.is_empty() {
        (suspending, Verdict::NoSchool)
    } else {
        (bearing, Verdict::SchoolDay)
    };
    if candidates.len() > 1 {
        warn!(
            date = %candidates[0].event_date(),
            tier = ?tier,
            candidates = candidates.len(),
            "several events compete for the same slot, keeping the most specific"
        );
    }
    most_specific(candidates).map(|event| Resolution {
        event,
        tier,
        verdict,
    })
}

/// Tie-break among events competing for the same slot: the highest classroom
/// id wins (events without a classroom rank last), then the lowest event id.
pub fn most_specific<'a, I>(events: I) -> Option<&'a CalendarEvent>
where
    I: IntoIterator<Item = &'a CalendarEvent>,
{
    events
        .into_iter()
        .max_by_key(|event| (event.classroom_id(), Reverse(event.id())))
}
