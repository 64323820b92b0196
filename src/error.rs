use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::{CalendarId, ClassroomId, EventId};

/// Event attribute a validation failure is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventField {
    Description,
    EventType,
    EventDate,
    Coverage,
    Periods,
    Grade,
    Classroom,
    Legend,
}

impl EventField {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventField::Description => "description",
            EventField::EventType => "event_type",
            EventField::EventDate => "event_date",
            EventField::Coverage => "coverage",
            EventField::Periods => "periods",
            EventField::Grade => "grade",
            EventField::Classroom => "classroom",
            EventField::Legend => "legend",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasonCode {
    Blank,
    /// Legend is one of the markers printed for regular attendance.
    Reserved,
    /// Value could not be interpreted (unknown event type, malformed period list).
    Invalid,
    AlreadyExistsEventInThisDate,
}

impl ReasonCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReasonCode::Blank => "blank",
            ReasonCode::Reserved => "reserved",
            ReasonCode::Invalid => "invalid",
            ReasonCode::AlreadyExistsEventInThisDate => "already_exists_event_in_this_date",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: EventField,
    pub reason: ReasonCode,
}

impl FieldError {
    pub fn new(field: EventField, reason: ReasonCode) -> Self {
        Self { field, reason }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field.as_str(), self.reason.as_str())
    }
}

/// Every rule an event draft broke. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("event is invalid: {}", join_errors(.errors))]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

fn join_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl ValidationErrors {
    pub(crate) fn new(errors: Vec<FieldError>) -> Self {
        Self { errors }
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    pub fn has(&self, field: EventField, reason: ReasonCode) -> bool {
        self.errors
            .iter()
            .any(|err| err.field == field && err.reason == reason)
    }

    pub fn on(&self, field: EventField) -> impl Iterator<Item = ReasonCode> + '_ {
        self.errors
            .iter()
            .filter(move |err| err.field == field)
            .map(|err| err.reason)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CalendarError {
    #[error("step {step_number} starts on {start} after it ends on {end}")]
    StepStartAfterEnd {
        step_number: u32,
        start: NaiveDate,
        end: NaiveDate,
    },
    #[error("step {step_number} posting window starts on {start} after it ends on {end}")]
    PostingWindowInverted {
        step_number: u32,
        start: NaiveDate,
        end: NaiveDate,
    },
    #[error("steps {first} and {second} overlap")]
    StepsOverlap { first: u32, second: u32 },
    #[error("step number {0} is used more than once")]
    DuplicateStepNumber(u32),
    #[error("school week requires at least one instructional weekday")]
    EmptySchoolWeek,
    #[error("event {0} not found")]
    EventNotFound(EventId),
    #[error("event id {0} is already in use")]
    DuplicateEventId(EventId),
    #[error("no event id left after the highest stored one")]
    EventIdsExhausted,
    #[error(transparent)]
    Validation(#[from] ValidationErrors),
}

pub type CalendarResult<T> = Result<T, CalendarError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error("classroom {0} not found")]
    ClassroomNotFound(ClassroomId),
    #[error("calendar {0} not found")]
    CalendarNotFound(CalendarId),
}
