pub mod calendar;
pub mod checker;
pub mod classroom;
pub mod error;
pub mod event;
pub(crate) mod event_validation;
pub mod persistence;
pub mod precedence;
pub mod step;

pub type CalendarId = i32;
pub type UnityId = i32;
pub type GradeId = i32;
pub type ClassroomId = i32;
pub type EventId = i32;
/// Shift code (morning, afternoon, night, full-time).
pub type Period = i32;

pub use calendar::{Calendar, CalendarWindow, EventFilter, SchoolWeek};
pub use checker::{DayScope, DecisionReason, SchoolDayChecker, SchoolDayDecision, is_school_day};
pub use classroom::{Classroom, ClassroomDirectory};
pub use error::{
    CalendarError, CalendarResult, EventField, FieldError, LookupError, ReasonCode,
    ValidationErrors,
};
pub use event::{CalendarEvent, Coverage, CoverageKind, EventDraft, EventType, FrequencyClass};
#[cfg(feature = "sqlite")]
pub use persistence::sqlite::SqliteCalendarStore;
pub use persistence::{
    CalendarSnapshot, CalendarStore, InMemoryCalendarStore, PersistenceError,
    export_events_to_csv, import_events_from_csv, load_calendar_from_json, save_calendar_to_json,
};
pub use precedence::{EventPrecedenceResolver, Resolution, Tier, Verdict};
pub use step::{ClassroomSteps, Step, find_step};
