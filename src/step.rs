use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::calendar::Calendar;
use crate::error::{CalendarError, CalendarResult};
use crate::ClassroomId;

/// A sub-period of the academic year (bimester, trimester) with its own
/// posting window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    pub step_number: u32,
    pub start_at: NaiveDate,
    pub end_at: NaiveDate,
    pub start_date_for_posting: NaiveDate,
    pub end_date_for_posting: NaiveDate,
}

impl Step {
    /// Step whose posting window equals its date range.
    pub fn new(step_number: u32, start_at: NaiveDate, end_at: NaiveDate) -> Self {
        Self {
            step_number,
            start_at,
            end_at,
            start_date_for_posting: start_at,
            end_date_for_posting: end_at,
        }
    }

    pub fn with_posting_window(mut self, start: NaiveDate, end: NaiveDate) -> Self {
        self.start_date_for_posting = start;
        self.end_date_for_posting = end;
        self
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start_at <= date && date <= self.end_at
    }

    /// Whether grades and attendance for this step may still be posted on `date`.
    pub fn posting_open(&self, date: NaiveDate) -> bool {
        self.start_date_for_posting <= date && date <= self.end_date_for_posting
    }

    pub fn to_number(&self) -> u32 {
        self.step_number
    }
}

/// Step sequence a classroom follows instead of the calendar-wide one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassroomSteps {
    pub classroom_id: ClassroomId,
    pub steps: Vec<Step>,
}

/// The step of `calendar` enclosing `date`, or `None` when the date lies
/// outside the academic year or in an unconfigured gap.
pub fn find_step(calendar: &Calendar, date: NaiveDate) -> Option<&Step> {
    find_in(calendar.steps(), date)
}

/// Binary search over steps sorted by start date.
pub(crate) fn find_in(steps: &[Step], date: NaiveDate) -> Option<&Step> {
    let idx = steps.partition_point(|step| step.start_at <= date);
    if idx == 0 {
        return None;
    }
    let candidate = &steps[idx - 1];
    candidate.contains(date).then_some(candidate)
}

/// Sorts `steps` chronologically and rejects inverted ranges, repeated step
/// numbers and overlaps.
pub(crate) fn normalize_steps(steps: &mut [Step]) -> CalendarResult<()> {
    let mut numbers = HashSet::with_capacity(steps.len());
    for step in steps.iter() {
        if step.start_at > step.end_at {
            return Err(CalendarError::StepStartAfterEnd {
                step_number: step.step_number,
                start: step.start_at,
                end: step.end_at,
            });
        }
        if step.start_date_for_posting > step.end_date_for_posting {
            return Err(CalendarError::PostingWindowInverted {
                step_number: step.step_number,
                start: step.start_date_for_posting,
                end: step.end_date_for_posting,
            });
        }
        if !numbers.insert(step.step_number) {
            return Err(CalendarError::DuplicateStepNumber(step.step_number));
        }
    }

    steps.sort_by_key(|step| step.start_at);
    for pair in steps.windows(2) {
        if pair[1].start_at <= pair[0].end_at {
            return Err(CalendarError::StepsOverlap {
                first: pair[0].step_number,
                second: pair[1].step_number,
            });
        }
    }
    Ok(())
}
