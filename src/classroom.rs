use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::{ClassroomId, GradeId, Period};

/// The parts of a classroom the school-day decision depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Classroom {
    pub id: ClassroomId,
    pub grade_id: GradeId,
    pub period: Period,
}

impl Classroom {
    pub fn new(id: ClassroomId, grade_id: GradeId, period: Period) -> Self {
        Self {
            id,
            grade_id,
            period,
        }
    }
}

/// Source of classroom records, keyed by id.
pub trait ClassroomDirectory {
    fn classroom(&self, id: ClassroomId) -> Option<Classroom>;
}

impl ClassroomDirectory for HashMap<ClassroomId, Classroom> {
    fn classroom(&self, id: ClassroomId) -> Option<Classroom> {
        self.get(&id).copied()
    }
}

impl ClassroomDirectory for BTreeMap<ClassroomId, Classroom> {
    fn classroom(&self, id: ClassroomId) -> Option<Classroom> {
        self.get(&id).copied()
    }
}

impl ClassroomDirectory for [Classroom] {
    fn classroom(&self, id: ClassroomId) -> Option<Classroom> {
        self.iter().find(|classroom| classroom.id == id).copied()
    }
}

impl ClassroomDirectory for Vec<Classroom> {
    fn classroom(&self, id: ClassroomId) -> Option<Classroom> {
        self.as_slice().classroom(id)
    }
}
