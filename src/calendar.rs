use chrono::{NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::classroom::Classroom;
use crate::error::{CalendarError, CalendarResult};
use crate::event::{CalendarEvent, EventDraft, EventType, FrequencyClass};
use crate::event_validation;
use crate::precedence;
use crate::step::{self, ClassroomSteps, Step};
use crate::{CalendarId, ClassroomId, EventId, GradeId, Period, UnityId};

/// Weekdays on which classes are held when no event says otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchoolWeek {
    weekdays: Vec<Weekday>,
}

impl SchoolWeek {
    const ALL_WEEKDAYS: [Weekday; 7] = [
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
        Weekday::Sat,
        Weekday::Sun,
    ];

    pub fn new<I>(weekdays: I) -> CalendarResult<Self>
    where
        I: IntoIterator<Item = Weekday>,
    {
        let mut weekdays: Vec<Weekday> = weekdays.into_iter().collect();
        if weekdays.is_empty() {
            return Err(CalendarError::EmptySchoolWeek);
        }
        weekdays.sort_by_key(|wd| wd.num_days_from_monday());
        weekdays.dedup();
        Ok(Self { weekdays })
    }

    pub fn weekdays(&self) -> &[Weekday] {
        &self.weekdays
    }

    pub fn is_school_weekday(&self, weekday: Weekday) -> bool {
        self.weekdays.contains(&weekday)
    }

    /// Weekdays outside the school week, Monday first.
    pub fn rest_days(&self) -> Vec<Weekday> {
        Self::ALL_WEEKDAYS
            .into_iter()
            .filter(|wd| !self.is_school_weekday(*wd))
            .collect()
    }
}

impl Default for SchoolWeek {
    fn default() -> Self {
        Self {
            weekdays: Self::ALL_WEEKDAYS[..5].to_vec(),
        }
    }
}

/// Composable event query, mirroring the filters administrative screens and
/// synchronizers use. Unset criteria match everything.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    description: Option<String>,
    event_type: Option<EventType>,
    frequency: Option<FrequencyClass>,
    grade_id: Option<GradeId>,
    classroom_id: Option<ClassroomId>,
    period: Option<Period>,
    without_grade: bool,
    without_classroom: bool,
}

impl EventFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(self, date: NaiveDate) -> Self {
        self.between(date, date)
    }

    pub fn between(mut self, start: NaiveDate, end: NaiveDate) -> Self {
        self.from = Some(start);
        self.to = Some(end);
        self
    }

    /// Case-insensitive substring match on the description.
    pub fn description_contains(mut self, text: impl Into<String>) -> Self {
        self.description = Some(text.into().to_lowercase());
        self
    }

    pub fn of_type(mut self, event_type: EventType) -> Self {
        self.event_type = Some(event_type);
        self
    }

    pub fn extra_school_without_frequency(self) -> Self {
        self.of_type(EventType::ExtraSchoolWithoutFrequency)
    }

    pub fn with_frequency(mut self) -> Self {
        self.frequency = Some(FrequencyClass::WithFrequency);
        self
    }

    pub fn without_frequency(mut self) -> Self {
        self.frequency = Some(FrequencyClass::WithoutFrequency);
        self
    }

    pub fn by_grade(mut self, grade_id: GradeId) -> Self {
        self.grade_id = Some(grade_id);
        self
    }

    pub fn by_classroom(mut self, classroom_id: ClassroomId) -> Self {
        self.classroom_id = Some(classroom_id);
        self
    }

    pub fn by_period(mut self, period: Period) -> Self {
        self.period = Some(period);
        self
    }

    pub fn without_grade(mut self) -> Self {
        self.without_grade = true;
        self
    }

    pub fn without_classroom(mut self) -> Self {
        self.without_classroom = true;
        self
    }

    pub fn matches(&self, event: &CalendarEvent) -> bool {
        let date = event.event_date();
        if self.from.is_some_and(|from| date < from) || self.to.is_some_and(|to| date > to) {
            return false;
        }
        if let Some(text) = &self.description {
            if !event.description().to_lowercase().contains(text) {
                return false;
            }
        }
        if self.event_type.is_some_and(|kind| event.event_type() != kind) {
            return false;
        }
        if self
            .frequency
            .is_some_and(|class| event.frequency_class() != class)
        {
            return false;
        }
        if self.grade_id.is_some() && event.grade_id() != self.grade_id {
            return false;
        }
        if self.classroom_id.is_some() && event.classroom_id() != self.classroom_id {
            return false;
        }
        if self.period.is_some_and(|period| !event.applies_to_period(period)) {
            return false;
        }
        if self.without_grade && event.grade_id().is_some() {
            return false;
        }
        if self.without_classroom && event.classroom_id().is_some() {
            return false;
        }
        true
    }
}

/// Academic-year container: steps, per-classroom steps and dated events.
///
/// Events are indexed by date so a decision only touches the events of the
/// day it is asked about.
#[derive(Debug, Clone, PartialEq)]
pub struct Calendar {
    id: CalendarId,
    year: i32,
    unity_id: UnityId,
    number_of_classes: u32,
    school_week: SchoolWeek,
    steps: Vec<Step>,
    classroom_steps: BTreeMap<ClassroomId, Vec<Step>>,
    events: BTreeMap<NaiveDate, Vec<CalendarEvent>>,
}

impl Calendar {
    pub fn new(id: CalendarId, year: i32, unity_id: UnityId) -> Self {
        Self {
            id,
            year,
            unity_id,
            number_of_classes: 0,
            school_week: SchoolWeek::default(),
            steps: Vec::new(),
            classroom_steps: BTreeMap::new(),
            events: BTreeMap::new(),
        }
    }

    pub fn with_steps(mut self, steps: Vec<Step>) -> CalendarResult<Self> {
        self.set_steps(steps)?;
        Ok(self)
    }

    pub fn id(&self) -> CalendarId {
        self.id
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn unity_id(&self) -> UnityId {
        self.unity_id
    }

    /// Daily class target consumed by downstream scheduling.
    pub fn number_of_classes(&self) -> u32 {
        self.number_of_classes
    }

    pub fn set_number_of_classes(&mut self, number_of_classes: u32) {
        self.number_of_classes = number_of_classes;
    }

    pub fn school_week(&self) -> &SchoolWeek {
        &self.school_week
    }

    pub fn set_school_week(&mut self, school_week: SchoolWeek) {
        self.school_week = school_week;
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Replaces the calendar-wide steps. Steps are kept in chronological order.
    pub fn set_steps(&mut self, mut steps: Vec<Step>) -> CalendarResult<()> {
        step::normalize_steps(&mut steps)?;
        self.steps = steps;
        Ok(())
    }

    pub fn step(&self, date: NaiveDate) -> Option<&Step> {
        step::find_in(&self.steps, date)
    }

    pub fn step_by_number(&self, step_number: u32) -> Option<&Step> {
        self.steps
            .iter()
            .find(|step| step.step_number == step_number)
    }

    /// First and last day covered by the calendar-wide steps.
    pub fn span(&self) -> Option<(NaiveDate, NaiveDate)> {
        match (self.steps.first(), self.steps.last()) {
            (Some(first), Some(last)) => Some((first.start_at, last.end_at)),
            _ => None,
        }
    }

    pub fn set_classroom_steps(
        &mut self,
        classroom_id: ClassroomId,
        mut steps: Vec<Step>,
    ) -> CalendarResult<()> {
        step::normalize_steps(&mut steps)?;
        self.classroom_steps.insert(classroom_id, steps);
        Ok(())
    }

    pub fn remove_classroom_steps(&mut self, classroom_id: ClassroomId) -> Option<Vec<Step>> {
        self.classroom_steps.remove(&classroom_id)
    }

    pub fn classroom_steps(&self) -> Vec<ClassroomSteps> {
        self.classroom_steps
            .iter()
            .map(|(classroom_id, steps)| ClassroomSteps {
                classroom_id: *classroom_id,
                steps: steps.clone(),
            })
            .collect()
    }

    /// Steps a classroom follows: its own sequence when configured, otherwise
    /// the calendar-wide one.
    pub fn steps_for_classroom(&self, classroom_id: ClassroomId) -> &[Step] {
        self.classroom_steps
            .get(&classroom_id)
            .map(Vec::as_slice)
            .unwrap_or(self.steps.as_slice())
    }

    pub fn classroom_step(&self, classroom_id: ClassroomId, date: NaiveDate) -> Option<&Step> {
        step::find_in(self.steps_for_classroom(classroom_id), date)
    }

    pub fn classroom_step_by_number(
        &self,
        classroom_id: ClassroomId,
        step_number: u32,
    ) -> Option<&Step> {
        self.steps_for_classroom(classroom_id)
            .iter()
            .find(|step| step.step_number == step_number)
    }

    /// Every event, ordered by date then id.
    pub fn events(&self) -> impl Iterator<Item = &CalendarEvent> {
        self.events.values().flatten()
    }

    pub fn event_count(&self) -> usize {
        self.events.values().map(Vec::len).sum()
    }

    pub fn events_on(&self, date: NaiveDate) -> &[CalendarEvent] {
        self.events.get(&date).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn events_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> impl Iterator<Item = &CalendarEvent> {
        let range = if start <= end {
            Some(self.events.range(start..=end))
        } else {
            None
        };
        range.into_iter().flatten().flat_map(|(_, events)| events)
    }

    pub fn find_event(&self, id: EventId) -> Option<&CalendarEvent> {
        self.events().find(|event| event.id() == id)
    }

    pub fn query(&self, filter: &EventFilter) -> Vec<&CalendarEvent> {
        match (filter.from, filter.to) {
            (Some(from), Some(to)) => self
                .events_between(from, to)
                .filter(|event| filter.matches(event))
                .collect(),
            _ => self.events().filter(|event| filter.matches(event)).collect(),
        }
    }

    /// Creates an event after checking every attribute rule and the
    /// one-event-type-per-date rule for its grade or classroom.
    pub fn add_event(&mut self, draft: &EventDraft) -> CalendarResult<&CalendarEvent> {
        let id = self.next_event_id()?;
        let existing = draft
            .event_date
            .map(|date| self.events_on(date))
            .unwrap_or(&[]);
        let event = event_validation::build_event(id, draft, existing)?;
        info!(
            calendar_id = self.id,
            event_id = id,
            date = %event.event_date(),
            event_type = %event.event_type(),
            "calendar event created"
        );
        Ok(self.insert(event))
    }

    /// Replaces an event's attributes, re-running every write-path rule.
    pub fn update_event(&mut self, id: EventId, draft: &EventDraft) -> CalendarResult<&CalendarEvent> {
        if self.find_event(id).is_none() {
            return Err(CalendarError::EventNotFound(id));
        }
        let existing = draft
            .event_date
            .map(|date| self.events_on(date))
            .unwrap_or(&[]);
        let event = event_validation::build_event(id, draft, existing)?;
        self.take(id);
        info!(calendar_id = self.id, event_id = id, "calendar event updated");
        Ok(self.insert(event))
    }

    pub fn remove_event(&mut self, id: EventId) -> CalendarResult<CalendarEvent> {
        let removed = self.take(id).ok_or(CalendarError::EventNotFound(id))?;
        info!(calendar_id = self.id, event_id = id, "calendar event removed");
        Ok(removed)
    }

    /// Puts back an event read from storage. Attribute rules are checked, the
    /// uniqueness rule is not: stored history is read as it was written.
    pub fn restore_event(&mut self, event: CalendarEvent) -> CalendarResult<()> {
        event_validation::validate_event_shape(&event)?;
        if self.find_event(event.id()).is_some() {
            return Err(CalendarError::DuplicateEventId(event.id()));
        }
        debug!(calendar_id = self.id, event_id = event.id(), "calendar event restored");
        self.insert(event);
        Ok(())
    }

    /// For every date, the single event that labels the day for `classroom`:
    /// among events reaching the classroom by period or by id, and belonging
    /// to no grade or to the classroom's grade, the most specific one.
    pub fn events_for_classroom(&self, classroom: &Classroom) -> Vec<&CalendarEvent> {
        self.events
            .values()
            .filter_map(|events| {
                precedence::most_specific(events.iter().filter(|event| {
                    (event.applies_to_period(classroom.period)
                        || event.classroom_id() == Some(classroom.id))
                        && event
                            .grade_id()
                            .is_none_or(|grade_id| grade_id == classroom.grade_id)
                }))
            })
            .collect()
    }

    fn next_event_id(&self) -> CalendarResult<EventId> {
        match self.events().map(CalendarEvent::id).max() {
            None => Ok(1),
            Some(max) => max.checked_add(1).ok_or(CalendarError::EventIdsExhausted),
        }
    }

    fn insert(&mut self, event: CalendarEvent) -> &CalendarEvent {
        let date = event.event_date();
        let id = event.id();
        let bucket = self.events.entry(date).or_default();
        let idx = bucket.partition_point(|existing| existing.id() < id);
        bucket.insert(idx, event);
        &bucket[idx]
    }

    fn take(&mut self, id: EventId) -> Option<CalendarEvent> {
        let date = self.find_event(id)?.event_date();
        let bucket = self.events.get_mut(&date)?;
        let idx = bucket.iter().position(|event| event.id() == id)?;
        let removed = bucket.remove(idx);
        if bucket.is_empty() {
            self.events.remove(&date);
        }
        Some(removed)
    }
}

/// A calendar holding only the events dated inside `[start, end]`.
///
/// Steps and settings are complete but the events outside the window are
/// missing, so a window answers questions about its own dates and can be
/// neither edited nor stored back.
#[derive(Debug, Clone, PartialEq)]
pub struct CalendarWindow {
    pub(crate) calendar: Calendar,
    start: NaiveDate,
    end: NaiveDate,
}

impl CalendarWindow {
    pub(crate) fn new(calendar: Calendar, start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            calendar,
            start,
            end,
        }
    }

    pub fn id(&self) -> CalendarId {
        self.calendar.id()
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    pub fn steps(&self) -> &[Step] {
        self.calendar.steps()
    }

    pub fn school_week(&self) -> &SchoolWeek {
        self.calendar.school_week()
    }

    pub fn events(&self) -> impl Iterator<Item = &CalendarEvent> {
        self.calendar.events()
    }

    pub fn event_count(&self) -> usize {
        self.calendar.event_count()
    }

    /// Events of `date`, or `None` when the date lies outside the window.
    pub fn events_on(&self, date: NaiveDate) -> Option<&[CalendarEvent]> {
        self.contains(date).then(|| self.calendar.events_on(date))
    }
}
