use super::{CalendarSnapshot, PersistenceError, PersistenceResult};
use crate::calendar::Calendar;
use crate::event::{self, CalendarEvent, CoverageKind, EventDraft, EventType};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;
use std::str::FromStr;
use tracing::{info, warn};

pub fn save_calendar_to_json<P: AsRef<Path>>(
    calendar: &Calendar,
    path: P,
) -> PersistenceResult<()> {
    let snapshot = CalendarSnapshot::from(calendar);
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, &snapshot)?;
    Ok(())
}

pub fn load_calendar_from_json<P: AsRef<Path>>(path: P) -> PersistenceResult<Calendar> {
    let file = File::open(path)?;
    let snapshot: CalendarSnapshot = serde_json::from_reader(file)?;
    snapshot.into_calendar().map_err(|err| {
        warn!(error = %err, "rejected calendar snapshot");
        PersistenceError::from(err)
    })
}

#[derive(Default, Serialize, Deserialize)]
struct EventCsvRecord {
    #[serde(default)]
    id: String,
    description: String,
    event_type: String,
    event_date: String,
    coverage: String,
    #[serde(default)]
    periods: String,
    #[serde(default)]
    grade_id: String,
    #[serde(default)]
    classroom_id: String,
    #[serde(default)]
    legend: String,
}

impl From<&CalendarEvent> for EventCsvRecord {
    fn from(event: &CalendarEvent) -> Self {
        Self {
            id: event.id().to_string(),
            description: event.description().to_string(),
            event_type: event.event_type().as_str().to_string(),
            event_date: format_date(Some(event.event_date())),
            coverage: event.coverage().kind().as_str().to_string(),
            periods: event::join_periods(event.periods()),
            grade_id: format_option_i32(event.grade_id()),
            classroom_id: format_option_i32(event.classroom_id()),
            legend: event.legend().unwrap_or_default().to_string(),
        }
    }
}

impl EventCsvRecord {
    fn into_draft(self) -> PersistenceResult<EventDraft> {
        let mut draft = EventDraft {
            description: parse_string_option(self.description),
            event_type: parse_enum::<EventType>(&self.event_type)?,
            event_date: parse_date(&self.event_date)?,
            coverage: parse_enum::<CoverageKind>(&self.coverage)?,
            grade_id: parse_i32(&self.grade_id)?,
            classroom_id: parse_i32(&self.classroom_id)?,
            legend: parse_string_option(self.legend),
            ..EventDraft::default()
        };
        draft
            .set_periods_csv(&self.periods)
            .map_err(PersistenceError::InvalidData)?;
        Ok(draft)
    }
}

pub fn export_events_to_csv<P: AsRef<Path>>(
    calendar: &Calendar,
    path: P,
) -> PersistenceResult<()> {
    let file = File::create(path)?;
    let mut writer = csv::Writer::from_writer(file);
    for event in calendar.events() {
        writer.serialize(EventCsvRecord::from(event))?;
    }
    writer.flush()?;
    Ok(())
}

/// Creates one event per CSV row through the calendar's write path. Ids in
/// the file are ignored. The calendar is only changed when every row is
/// accepted; returns the number of events created.
pub fn import_events_from_csv<P: AsRef<Path>>(
    calendar: &mut Calendar,
    path: P,
) -> PersistenceResult<usize> {
    let file = File::open(path)?;
    let mut reader = csv::Reader::from_reader(file);
    let mut staged = calendar.clone();
    let mut created = 0;
    for (row, record) in reader.deserialize::<EventCsvRecord>().enumerate() {
        let draft = record?.into_draft()?;
        staged.add_event(&draft).map_err(|err| {
            warn!(row = row + 1, error = %err, "event import rejected");
            PersistenceError::from(err)
        })?;
        created += 1;
    }
    *calendar = staged;
    info!(calendar_id = calendar.id(), created, "events imported");
    Ok(created)
}

fn format_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

fn parse_date(input: &str) -> PersistenceResult<Option<NaiveDate>> {
    if input.trim().is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d")
        .map(Some)
        .map_err(|e| PersistenceError::InvalidData(format!("invalid date '{input}': {e}")))
}

fn format_option_i32(value: Option<i32>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn parse_i32(input: &str) -> PersistenceResult<Option<i32>> {
    if input.trim().is_empty() {
        return Ok(None);
    }
    input
        .trim()
        .parse::<i32>()
        .map(Some)
        .map_err(|e| PersistenceError::InvalidData(format!("invalid integer '{input}': {e}")))
}

fn parse_enum<T>(input: &str) -> PersistenceResult<Option<T>>
where
    T: FromStr<Err = String>,
{
    if input.trim().is_empty() {
        return Ok(None);
    }
    T::from_str(input).map(Some).map_err(PersistenceError::InvalidData)
}

fn parse_string_option(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}
