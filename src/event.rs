use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::{ClassroomId, EventId, GradeId, Period};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Holiday,
    Recess,
    /// Makeup day: attendance is posted even if the date would not be a school day.
    ExtraSchool,
    /// School activity on which no attendance is posted.
    ExtraSchoolWithoutFrequency,
}

/// Whether an event makes its date count for attendance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrequencyClass {
    WithFrequency,
    WithoutFrequency,
}

impl EventType {
    pub const ALL: [EventType; 4] = [
        EventType::Holiday,
        EventType::Recess,
        EventType::ExtraSchool,
        EventType::ExtraSchoolWithoutFrequency,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Holiday => "holiday",
            EventType::Recess => "recess",
            EventType::ExtraSchool => "extra_school",
            EventType::ExtraSchoolWithoutFrequency => "extra_school_without_frequency",
        }
    }

    pub fn frequency_class(&self) -> FrequencyClass {
        match self {
            EventType::ExtraSchool => FrequencyClass::WithFrequency,
            _ => FrequencyClass::WithoutFrequency,
        }
    }

    pub fn is_frequency_bearing(&self) -> bool {
        self.frequency_class() == FrequencyClass::WithFrequency
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EventType::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown event type '{s}'"))
    }
}

/// Breadth at which an event applies, carrying the references each breadth needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "coverage", rename_all = "snake_case")]
pub enum Coverage {
    ByUnity,
    ByGrade {
        grade_id: GradeId,
    },
    ByClassroom {
        grade_id: GradeId,
        classroom_id: ClassroomId,
    },
}

/// Coverage as it arrives from forms and synchronizers, before references are checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoverageKind {
    ByUnity,
    ByGrade,
    ByClassroom,
}

impl CoverageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CoverageKind::ByUnity => "by_unity",
            CoverageKind::ByGrade => "by_grade",
            CoverageKind::ByClassroom => "by_classroom",
        }
    }
}

impl FromStr for CoverageKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "by_unity" => Ok(CoverageKind::ByUnity),
            "by_grade" => Ok(CoverageKind::ByGrade),
            "by_classroom" => Ok(CoverageKind::ByClassroom),
            other => Err(format!("unknown coverage '{other}'")),
        }
    }
}

impl Coverage {
    pub fn kind(&self) -> CoverageKind {
        match self {
            Coverage::ByUnity => CoverageKind::ByUnity,
            Coverage::ByGrade { .. } => CoverageKind::ByGrade,
            Coverage::ByClassroom { .. } => CoverageKind::ByClassroom,
        }
    }

    pub fn grade_id(&self) -> Option<GradeId> {
        match *self {
            Coverage::ByUnity => None,
            Coverage::ByGrade { grade_id } | Coverage::ByClassroom { grade_id, .. } => {
                Some(grade_id)
            }
        }
    }

    pub fn classroom_id(&self) -> Option<ClassroomId> {
        match *self {
            Coverage::ByClassroom { classroom_id, .. } => Some(classroom_id),
            _ => None,
        }
    }
}

/// A validated calendar entry. Only built through the calendar's write path
/// or restored from a stored snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub(crate) id: EventId,
    pub(crate) description: String,
    pub(crate) event_type: EventType,
    pub(crate) event_date: NaiveDate,
    #[serde(flatten)]
    pub(crate) coverage: Coverage,
    #[serde(default)]
    pub(crate) periods: BTreeSet<Period>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) legend: Option<String>,
}

impl CalendarEvent {
    pub fn id(&self) -> EventId {
        self.id
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn event_type(&self) -> EventType {
        self.event_type
    }

    pub fn event_date(&self) -> NaiveDate {
        self.event_date
    }

    pub fn coverage(&self) -> Coverage {
        self.coverage
    }

    pub fn periods(&self) -> &BTreeSet<Period> {
        &self.periods
    }

    pub fn legend(&self) -> Option<&str> {
        self.legend.as_deref()
    }

    pub fn grade_id(&self) -> Option<GradeId> {
        self.coverage.grade_id()
    }

    pub fn classroom_id(&self) -> Option<ClassroomId> {
        self.coverage.classroom_id()
    }

    pub fn frequency_class(&self) -> FrequencyClass {
        self.event_type.frequency_class()
    }

    pub fn is_frequency_bearing(&self) -> bool {
        self.event_type.is_frequency_bearing()
    }

    pub fn applies_to_period(&self, period: Period) -> bool {
        self.periods.contains(&period)
    }

    /// Draft carrying this event's current values, for edits.
    pub fn to_draft(&self) -> EventDraft {
        EventDraft {
            description: Some(self.description.clone()),
            event_type: Some(self.event_type),
            event_date: Some(self.event_date),
            coverage: Some(self.coverage.kind()),
            periods: self.periods.iter().copied().collect(),
            grade_id: self.grade_id(),
            classroom_id: self.classroom_id(),
            legend: self.legend.clone(),
        }
    }
}

impl fmt::Display for CalendarEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.description)
    }
}

/// Unvalidated event input. Every field may be missing; the calendar's write
/// path reports each problem against the field it belongs to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventDraft {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub event_type: Option<EventType>,
    #[serde(default)]
    pub event_date: Option<NaiveDate>,
    #[serde(default)]
    pub coverage: Option<CoverageKind>,
    #[serde(default)]
    pub periods: Vec<Period>,
    #[serde(default)]
    pub grade_id: Option<GradeId>,
    #[serde(default)]
    pub classroom_id: Option<ClassroomId>,
    #[serde(default)]
    pub legend: Option<String>,
}

impl EventDraft {
    pub fn new(
        description: impl Into<String>,
        event_type: EventType,
        event_date: NaiveDate,
        coverage: CoverageKind,
    ) -> Self {
        Self {
            description: Some(description.into()),
            event_type: Some(event_type),
            event_date: Some(event_date),
            coverage: Some(coverage),
            ..Self::default()
        }
    }

    pub fn with_grade(mut self, grade_id: GradeId) -> Self {
        self.grade_id = Some(grade_id);
        self
    }

    pub fn with_classroom(mut self, classroom_id: ClassroomId) -> Self {
        self.classroom_id = Some(classroom_id);
        self
    }

    pub fn with_periods<I>(mut self, periods: I) -> Self
    where
        I: IntoIterator<Item = Period>,
    {
        self.periods = periods.into_iter().collect();
        self
    }

    pub fn with_legend(mut self, legend: impl Into<String>) -> Self {
        self.legend = Some(legend.into());
        self
    }

    /// Parses a comma separated period list such as `"2,1"`.
    pub fn set_periods_csv(&mut self, input: &str) -> Result<(), String> {
        self.periods = parse_periods(input)?;
        Ok(())
    }
}

pub(crate) fn parse_periods(input: &str) -> Result<Vec<Period>, String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<Period>()
                .map_err(|err| format!("invalid period '{part}': {err}"))
        })
        .collect()
}

pub(crate) fn join_periods(periods: &BTreeSet<Period>) -> String {
    periods
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}
