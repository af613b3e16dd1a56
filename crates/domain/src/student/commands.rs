//! Student commands.

use common::EntityId;
use serde::{Deserialize, Serialize};

use crate::command::Command;

/// Command to register a new student, optionally with up to two enrollments.
///
/// An enrollment is only created when both its course and grade are present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Register {
    pub name: String,
    pub email: String,
    pub course1: Option<String>,
    pub course1_grade: Option<String>,
    pub course2: Option<String>,
    pub course2_grade: Option<String>,
}

impl Register {
    /// Creates a Register command without enrollments.
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            ..Self::default()
        }
    }

    /// Adds the first enrollment.
    pub fn with_course1(mut self, course: impl Into<String>, grade: impl Into<String>) -> Self {
        self.course1 = Some(course.into());
        self.course1_grade = Some(grade.into());
        self
    }

    /// Adds the second enrollment.
    pub fn with_course2(mut self, course: impl Into<String>, grade: impl Into<String>) -> Self {
        self.course2 = Some(course.into());
        self.course2_grade = Some(grade.into());
        self
    }

    /// Returns the (course, grade) pairs that are fully specified, in order.
    pub fn enrollments(&self) -> impl Iterator<Item = (&str, &str)> {
        [
            (self.course1.as_deref(), self.course1_grade.as_deref()),
            (self.course2.as_deref(), self.course2_grade.as_deref()),
        ]
        .into_iter()
        .filter_map(|pair| match pair {
            (Some(course), Some(grade)) => Some((course, grade)),
            _ => None,
        })
    }
}

impl Command for Register {
    fn command_type() -> &'static str {
        "Register"
    }
}

/// Command to delete a student.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unregister {
    pub id: EntityId,
}

impl Unregister {
    /// Creates a new Unregister command.
    pub fn new(id: EntityId) -> Self {
        Self { id }
    }
}

impl Command for Unregister {
    fn command_type() -> &'static str {
        "Unregister"
    }
}

/// Command to change a student's name and email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditPersonalInfo {
    pub id: EntityId,
    pub name: String,
    pub email: String,
}

impl EditPersonalInfo {
    /// Creates a new EditPersonalInfo command.
    pub fn new(id: EntityId, name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            email: email.into(),
        }
    }
}

impl Command for EditPersonalInfo {
    fn command_type() -> &'static str {
        "EditPersonalInfo"
    }
}

/// Command to enroll a student in a course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enroll {
    pub id: EntityId,
    pub course: String,
    pub grade: String,
}

impl Enroll {
    /// Creates a new Enroll command.
    pub fn new(id: EntityId, course: impl Into<String>, grade: impl Into<String>) -> Self {
        Self {
            id,
            course: course.into(),
            grade: grade.into(),
        }
    }
}

impl Command for Enroll {
    fn command_type() -> &'static str {
        "Enroll"
    }
}

/// Command to replace the course and grade of an existing enrollment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    pub id: EntityId,
    pub enrollment_number: i32,
    pub course: String,
    pub grade: String,
}

impl Transfer {
    /// Creates a new Transfer command.
    pub fn new(
        id: EntityId,
        enrollment_number: i32,
        course: impl Into<String>,
        grade: impl Into<String>,
    ) -> Self {
        Self {
            id,
            enrollment_number,
            course: course.into(),
            grade: grade.into(),
        }
    }
}

impl Command for Transfer {
    fn command_type() -> &'static str {
        "Transfer"
    }
}

/// Command to remove an enrollment, with a comment explaining why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Disenroll {
    pub id: EntityId,
    pub enrollment_number: i32,
    pub comment: String,
}

impl Disenroll {
    /// Creates a new Disenroll command.
    pub fn new(id: EntityId, enrollment_number: i32, comment: impl Into<String>) -> Self {
        Self {
            id,
            enrollment_number,
            comment: comment.into(),
        }
    }
}

impl Command for Disenroll {
    fn command_type() -> &'static str {
        "Disenroll"
    }
}
