use crate::calendar::{Calendar, SchoolWeek};
use crate::error::{CalendarError, LookupError};
use crate::event::CalendarEvent;
use crate::step::{ClassroomSteps, Step};
use crate::{CalendarId, UnityId};
use serde::{Deserialize, Serialize};
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[cfg(feature = "sqlite")]
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("invalid data: {0}")]
    InvalidData(String),
    #[error(transparent)]
    Calendar(#[from] CalendarError),
    #[error(transparent)]
    Lookup(#[from] LookupError),
}

pub type PersistenceResult<T> = Result<T, PersistenceError>;

/// Where calendars are kept between decision runs.
pub trait CalendarStore {
    fn save_calendar(&self, calendar: &Calendar) -> PersistenceResult<()>;
    fn load_calendar(&self, id: CalendarId) -> PersistenceResult<Option<Calendar>>;
    fn calendar_ids(&self) -> PersistenceResult<Vec<CalendarId>>;
}

/// Serialized form of a calendar, as exchanged with the external
/// synchronizer and written to disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarSnapshot {
    pub id: CalendarId,
    pub year: i32,
    pub unity_id: UnityId,
    #[serde(default)]
    pub number_of_classes: u32,
    #[serde(default)]
    pub school_week: SchoolWeek,
    #[serde(default)]
    pub steps: Vec<Step>,
    #[serde(default)]
    pub classroom_steps: Vec<ClassroomSteps>,
    #[serde(default)]
    pub events: Vec<CalendarEvent>,
}

impl From<&Calendar> for CalendarSnapshot {
    fn from(calendar: &Calendar) -> Self {
        Self {
            id: calendar.id(),
            year: calendar.year(),
            unity_id: calendar.unity_id(),
            number_of_classes: calendar.number_of_classes(),
            school_week: calendar.school_week().clone(),
            steps: calendar.steps().to_vec(),
            classroom_steps: calendar.classroom_steps(),
            events: calendar.events().cloned().collect(),
        }
    }
}

impl CalendarSnapshot {
    /// Rebuilds the calendar, re-checking step ordering, the school week and
    /// each event's attributes.
    pub fn into_calendar(self) -> Result<Calendar, CalendarError> {
        let mut calendar = Calendar::new(self.id, self.year, self.unity_id);
        calendar.set_number_of_classes(self.number_of_classes);
        calendar.set_school_week(SchoolWeek::new(self.school_week.weekdays().iter().copied())?);
        calendar.set_steps(self.steps)?;
        for entry in self.classroom_steps {
            calendar.set_classroom_steps(entry.classroom_id, entry.steps)?;
        }
        for event in self.events {
            calendar.restore_event(event)?;
        }
        Ok(calendar)
    }
}

pub mod file;
pub mod memory;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use file::{
    export_events_to_csv, import_events_from_csv, load_calendar_from_json, save_calendar_to_json,
};
pub use memory::InMemoryCalendarStore;
