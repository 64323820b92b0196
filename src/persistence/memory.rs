use super::{CalendarStore, PersistenceResult};
use crate::calendar::Calendar;
use crate::checker;
use crate::classroom::ClassroomDirectory;
use crate::error::{CalendarResult, LookupError};
use crate::{CalendarId, ClassroomId, GradeId};
use chrono::NaiveDate;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

/// Calendars held as immutable snapshots.
///
/// Readers clone an `Arc` and decide against it without holding the lock.
/// Writers are serialized by the write lock and publish a modified copy, so a
/// decision run never observes a half-applied edit.
#[derive(Default)]
pub struct InMemoryCalendarStore {
    calendars: RwLock<HashMap<CalendarId, Arc<Calendar>>>,
}

impl InMemoryCalendarStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self, id: CalendarId) -> Option<Arc<Calendar>> {
        self.calendars.read().get(&id).cloned()
    }

    /// Applies `edit` to a copy of the calendar and publishes it only when the
    /// edit succeeds; a rejected write leaves the stored calendar untouched.
    pub fn update<T, F>(&self, id: CalendarId, edit: F) -> PersistenceResult<T>
    where
        F: FnOnce(&mut Calendar) -> CalendarResult<T>,
    {
        let mut calendars = self.calendars.write();
        let current = calendars
            .get(&id)
            .ok_or(LookupError::CalendarNotFound(id))?;
        let mut draft = Calendar::clone(current);
        let output = edit(&mut draft)?;
        calendars.insert(id, Arc::new(draft));
        info!(calendar_id = id, "calendar snapshot published");
        Ok(output)
    }

    pub fn remove(&self, id: CalendarId) -> Option<Arc<Calendar>> {
        self.calendars.write().remove(&id)
    }

    pub fn is_school_day<D>(
        &self,
        calendar_id: CalendarId,
        directory: &D,
        date: NaiveDate,
        grade_id: Option<GradeId>,
        classroom_id: Option<ClassroomId>,
    ) -> Result<bool, LookupError>
    where
        D: ClassroomDirectory + ?Sized,
    {
        let calendar = self
            .snapshot(calendar_id)
            .ok_or(LookupError::CalendarNotFound(calendar_id))?;
        checker::is_school_day_by_id(&calendar, directory, date, grade_id, classroom_id)
    }
}

impl CalendarStore for InMemoryCalendarStore {
    fn save_calendar(&self, calendar: &Calendar) -> PersistenceResult<()> {
        self.calendars
            .write()
            .insert(calendar.id(), Arc::new(calendar.clone()));
        Ok(())
    }

    fn load_calendar(&self, id: CalendarId) -> PersistenceResult<Option<Calendar>> {
        Ok(self.snapshot(id).map(|calendar| Calendar::clone(&calendar)))
    }

    fn calendar_ids(&self) -> PersistenceResult<Vec<CalendarId>> {
        let mut ids: Vec<CalendarId> = self.calendars.read().keys().copied().collect();
        ids.sort_unstable();
        Ok(ids)
    }
}
