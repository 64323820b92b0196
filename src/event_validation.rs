use crate::error::{EventField, FieldError, ReasonCode, ValidationErrors};
use crate::event::{CalendarEvent, Coverage, CoverageKind, EventDraft, EventType};
use crate::EventId;
use std::collections::BTreeSet;

/// Legends printed for regular attendance marks; an event may not reuse them.
const RESERVED_LEGENDS: [&str; 5] = ["F", "f", "N", "n", "."];

fn is_blank(value: Option<&str>) -> bool {
    value.is_none_or(|v| v.trim().is_empty())
}

pub(crate) fn legend_is_required(event_type: Option<EventType>) -> bool {
    event_type != Some(EventType::ExtraSchool)
}

/// Builds an event from a draft, checking every attribute rule plus the
/// one-event-type-per-date rule against `existing`. `id` is the identity the
/// event will take; an existing event with that id is not a conflict.
pub(crate) fn build_event<'a, I>(
    id: EventId,
    draft: &EventDraft,
    existing: I,
) -> Result<CalendarEvent, ValidationErrors>
where
    I: IntoIterator<Item = &'a CalendarEvent>,
{
    let mut errors = Vec::new();

    if is_blank(draft.description.as_deref()) {
        errors.push(FieldError::new(EventField::Description, ReasonCode::Blank));
    }
    if draft.event_type.is_none() {
        errors.push(FieldError::new(EventField::EventType, ReasonCode::Blank));
    }
    if draft.event_date.is_none() {
        errors.push(FieldError::new(EventField::EventDate, ReasonCode::Blank));
    }

    let coverage = match draft.coverage {
        None => {
            errors.push(FieldError::new(EventField::Coverage, ReasonCode::Blank));
            None
        }
        Some(CoverageKind::ByUnity) => Some(Coverage::ByUnity),
        Some(CoverageKind::ByGrade) => match draft.grade_id {
            Some(grade_id) => Some(Coverage::ByGrade { grade_id }),
            None => {
                errors.push(FieldError::new(EventField::Grade, ReasonCode::Blank));
                None
            }
        },
        Some(CoverageKind::ByClassroom) => {
            if draft.periods.is_empty() {
                errors.push(FieldError::new(EventField::Periods, ReasonCode::Blank));
            }
            if draft.grade_id.is_none() {
                errors.push(FieldError::new(EventField::Grade, ReasonCode::Blank));
            }
            if draft.classroom_id.is_none() {
                errors.push(FieldError::new(EventField::Classroom, ReasonCode::Blank));
            }
            match (draft.grade_id, draft.classroom_id) {
                (Some(grade_id), Some(classroom_id)) => Some(Coverage::ByClassroom {
                    grade_id,
                    classroom_id,
                }),
                _ => None,
            }
        }
    };

    if let Some(reason) = legend_problem(draft.event_type, draft.legend.as_deref()) {
        errors.push(FieldError::new(EventField::Legend, reason));
    }

    let parts = match (draft.event_type, draft.event_date, coverage) {
        (Some(event_type), Some(event_date), Some(coverage)) => {
            Some((event_type, event_date, coverage))
        }
        _ => None,
    };

    if let Some((event_type, event_date, coverage)) = parts {
        let conflict = existing.into_iter().any(|other| {
            other.id != id
                && other.event_type != event_type
                && other.event_date == event_date
                && conflicts_in_scope(&coverage, other)
        });
        if conflict {
            errors.push(FieldError::new(
                EventField::EventDate,
                ReasonCode::AlreadyExistsEventInThisDate,
            ));
        }
    }

    // missing parts always leave a field error behind
    match parts {
        Some((event_type, event_date, coverage)) if errors.is_empty() => Ok(CalendarEvent {
            id,
            description: draft.description.as_deref().unwrap_or_default().trim().to_string(),
            event_type,
            event_date,
            coverage,
            periods: draft.periods.iter().copied().collect::<BTreeSet<_>>(),
            legend: draft
                .legend
                .as_deref()
                .map(str::trim)
                .filter(|legend| !legend.is_empty())
                .map(ToOwned::to_owned),
        }),
        _ => Err(ValidationErrors::new(errors)),
    }
}

fn legend_problem(event_type: Option<EventType>, legend: Option<&str>) -> Option<ReasonCode> {
    if !legend_is_required(event_type) {
        return None;
    }
    match legend.map(str::trim) {
        None | Some("") => Some(ReasonCode::Blank),
        Some(value) if RESERVED_LEGENDS.contains(&value) => Some(ReasonCode::Reserved),
        Some(_) => None,
    }
}

/// Grade-wide events conflict with other grade-wide events of the same grade;
/// classroom events conflict with anything stored against the same classroom.
fn conflicts_in_scope(coverage: &Coverage, other: &CalendarEvent) -> bool {
    match *coverage {
        Coverage::ByUnity => false,
        Coverage::ByGrade { grade_id } => {
            other.grade_id() == Some(grade_id) && other.classroom_id().is_none()
        }
        Coverage::ByClassroom { classroom_id, .. } => other.classroom_id() == Some(classroom_id),
    }
}

/// Attribute rules for events that arrive already typed (stored snapshots).
/// The uniqueness rule is not re-checked: historical data is kept as stored.
pub(crate) fn validate_event_shape(event: &CalendarEvent) -> Result<(), ValidationErrors> {
    let mut errors = Vec::new();
    if event.description.trim().is_empty() {
        errors.push(FieldError::new(EventField::Description, ReasonCode::Blank));
    }
    if matches!(event.coverage, Coverage::ByClassroom { .. }) && event.periods.is_empty() {
        errors.push(FieldError::new(EventField::Periods, ReasonCode::Blank));
    }
    if let Some(reason) = legend_problem(Some(event.event_type), event.legend.as_deref()) {
        errors.push(FieldError::new(EventField::Legend, reason));
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidationErrors::new(errors))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legend_not_required_for_extra_school() {
        assert_eq!(legend_problem(Some(EventType::ExtraSchool), None), None);
        assert_eq!(
            legend_problem(Some(EventType::Holiday), None),
            Some(ReasonCode::Blank)
        );
        assert_eq!(
            legend_problem(Some(EventType::Holiday), Some("  ")),
            Some(ReasonCode::Blank)
        );
    }

    #[test]
    fn reserved_legends_rejected_for_every_other_type() {
        for legend in RESERVED_LEGENDS {
            assert_eq!(
                legend_problem(Some(EventType::ExtraSchoolWithoutFrequency), Some(legend)),
                Some(ReasonCode::Reserved)
            );
        }
        assert_eq!(legend_problem(Some(EventType::ExtraSchool), Some("F")), None);
        assert_eq!(legend_problem(Some(EventType::Recess), Some("R")), None);
    }
}
