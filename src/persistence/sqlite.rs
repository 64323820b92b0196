use super::{CalendarSnapshot, CalendarStore, PersistenceResult};
use crate::calendar::{Calendar, CalendarWindow};
use crate::event::CalendarEvent;
use crate::CalendarId;
use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension, params};
use std::sync::Mutex;
use tracing::info;

const DATE_FORMAT: &str = "%Y-%m-%d";

pub struct SqliteCalendarStore {
    connection: Mutex<Connection>,
}

impl SqliteCalendarStore {
    pub fn new<P: AsRef<std::path::Path>>(path: P) -> PersistenceResult<Self> {
        let connection = Connection::open(path)?;
        Self::initialize_schema(&connection)?;
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    fn initialize_schema(connection: &Connection) -> PersistenceResult<()> {
        let ddl = r#"
            PRAGMA foreign_keys = ON;
            CREATE TABLE IF NOT EXISTS school_calendars (
                id INTEGER PRIMARY KEY,
                calendar_json TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS school_calendar_events (
                calendar_id INTEGER NOT NULL
                    REFERENCES school_calendars (id) ON DELETE CASCADE,
                id INTEGER NOT NULL,
                event_date TEXT NOT NULL,
                event_json TEXT NOT NULL,
                PRIMARY KEY (calendar_id, id)
            );
            CREATE INDEX IF NOT EXISTS school_calendar_events_by_date
                ON school_calendar_events (calendar_id, event_date);
        "#;
        connection.execute_batch(ddl)?;
        Ok(())
    }

    fn save_header(
        &self,
        tx: &rusqlite::Transaction,
        calendar: &Calendar,
    ) -> PersistenceResult<()> {
        let mut header = CalendarSnapshot::from(calendar);
        header.events.clear();
        let json = serde_json::to_string(&header)?;
        tx.execute(
            "INSERT INTO school_calendars (id, calendar_json) VALUES (?1, ?2)
             ON CONFLICT (id) DO UPDATE SET calendar_json = excluded.calendar_json",
            params![calendar.id(), json],
        )?;
        Ok(())
    }

    fn save_events(&self, tx: &rusqlite::Transaction, calendar: &Calendar) -> PersistenceResult<()> {
        tx.execute(
            "DELETE FROM school_calendar_events WHERE calendar_id = ?1",
            params![calendar.id()],
        )?;
        let mut stmt = tx.prepare(
            "INSERT INTO school_calendar_events (calendar_id, id, event_date, event_json)
             VALUES (?1, ?2, ?3, ?4)",
        )?;
        for event in calendar.events() {
            let json = serde_json::to_string(event)?;
            stmt.execute(params![
                calendar.id(),
                event.id(),
                event.event_date().format(DATE_FORMAT).to_string(),
                json
            ])?;
        }
        Ok(())
    }

    fn load_header(&self, conn: &Connection, id: CalendarId) -> PersistenceResult<Option<CalendarSnapshot>> {
        let mut stmt = conn.prepare("SELECT calendar_json FROM school_calendars WHERE id = ?1")?;
        let json: Option<String> = stmt.query_row(params![id], |row| row.get(0)).optional()?;
        match json {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    fn load_events(
        &self,
        conn: &Connection,
        id: CalendarId,
        window: Option<(NaiveDate, NaiveDate)>,
    ) -> PersistenceResult<Vec<CalendarEvent>> {
        let mut events = Vec::new();
        let mut push = |json: rusqlite::Result<String>| -> PersistenceResult<()> {
            events.push(serde_json::from_str::<CalendarEvent>(&json?)?);
            Ok(())
        };
        match window {
            Some((start, end)) => {
                let mut stmt = conn.prepare(
                    "SELECT event_json FROM school_calendar_events
                     WHERE calendar_id = ?1 AND event_date >= ?2 AND event_date <= ?3
                     ORDER BY event_date ASC, id ASC",
                )?;
                let rows = stmt.query_map(
                    params![
                        id,
                        start.format(DATE_FORMAT).to_string(),
                        end.format(DATE_FORMAT).to_string()
                    ],
                    |row| row.get::<_, String>(0),
                )?;
                for json in rows {
                    push(json)?;
                }
            }
            None => {
                let mut stmt = conn.prepare(
                    "SELECT event_json FROM school_calendar_events
                     WHERE calendar_id = ?1 ORDER BY event_date ASC, id ASC",
                )?;
                let rows = stmt.query_map(params![id], |row| row.get::<_, String>(0))?;
                for json in rows {
                    push(json)?;
                }
            }
        }
        Ok(events)
    }

    /// Loads a read-only view holding only the events dated inside
    /// `[start, end]`, for callers deciding many days of one period in a
    /// single pass. The view cannot be saved back, so rows outside the
    /// window are never touched.
    pub fn load_calendar_window(
        &self,
        id: CalendarId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> PersistenceResult<Option<CalendarWindow>> {
        let conn = self.connection.lock().expect("sqlite mutex poisoned");
        let Some(mut snapshot) = self.load_header(&conn, id)? else {
            return Ok(None);
        };
        snapshot.events = self.load_events(&conn, id, Some((start, end)))?;
        let calendar = snapshot.into_calendar()?;
        Ok(Some(CalendarWindow::new(calendar, start, end)))
    }

    pub fn delete_calendar(&self, id: CalendarId) -> PersistenceResult<bool> {
        let conn = self.connection.lock().expect("sqlite mutex poisoned");
        let removed = conn.execute("DELETE FROM school_calendars WHERE id = ?1", params![id])?;
        Ok(removed > 0)
    }
}

impl CalendarStore for SqliteCalendarStore {
    fn save_calendar(&self, calendar: &Calendar) -> PersistenceResult<()> {
        let mut conn = self.connection.lock().expect("sqlite mutex poisoned");
        let tx = conn.transaction()?;
        self.save_header(&tx, calendar)?;
        self.save_events(&tx, calendar)?;
        tx.commit()?;
        info!(
            calendar_id = calendar.id(),
            events = calendar.event_count(),
            "calendar saved to sqlite"
        );
        Ok(())
    }

    fn load_calendar(&self, id: CalendarId) -> PersistenceResult<Option<Calendar>> {
        let conn = self.connection.lock().expect("sqlite mutex poisoned");
        let Some(mut snapshot) = self.load_header(&conn, id)? else {
            return Ok(None);
        };
        snapshot.events = self.load_events(&conn, id, None)?;
        Ok(Some(snapshot.into_calendar()?))
    }

    fn calendar_ids(&self) -> PersistenceResult<Vec<CalendarId>> {
        let conn = self.connection.lock().expect("sqlite mutex poisoned");
        let mut stmt = conn.prepare("SELECT id FROM school_calendars ORDER BY id ASC")?;
        let rows = stmt.query_map([], |row| row.get::<_, CalendarId>(0))?;
        let mut ids = Vec::new();
        for id in rows {
            ids.push(id?);
        }
        Ok(ids)
    }
}
