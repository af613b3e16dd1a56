//! Enrollments and disenrollment history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Course, Grade};

/// A student's participation in one course with one grade.
///
/// Enrollments live inside a student's slots and have no identity of their
/// own; they are addressed by slot number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enrollment {
    course: Course,
    grade: Grade,
}

impl Enrollment {
    pub(crate) fn new(course: Course, grade: Grade) -> Self {
        Self { course, grade }
    }

    /// Returns the enrolled course.
    pub fn course(&self) -> &Course {
        &self.course
    }

    /// Returns the grade.
    pub fn grade(&self) -> Grade {
        self.grade
    }

    /// Replaces course and grade in place.
    pub(crate) fn update(&mut self, course: Course, grade: Grade) {
        self.course = course;
        self.grade = grade;
    }
}

/// Record of an enrollment removed from a student.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Disenrollment {
    /// Course the student left.
    pub course: Course,

    /// Grade held at the time of removal.
    pub grade: Grade,

    /// Why the enrollment was removed.
    pub comment: String,

    /// When the enrollment was removed.
    pub disenrolled_at: DateTime<Utc>,
}

impl Disenrollment {
    pub(crate) fn from_enrollment(enrollment: Enrollment, comment: impl Into<String>) -> Self {
        Self {
            course: enrollment.course,
            grade: enrollment.grade,
            comment: comment.into(),
            disenrolled_at: Utc::now(),
        }
    }
}
