//! Student aggregate, its value objects and the operations on it.

mod aggregate;
mod commands;
mod enrollment;
mod handlers;
mod queries;
mod repository;
mod value_objects;

pub use aggregate::{MAX_ENROLLMENTS, Student};
pub use commands::*;
pub use enrollment::{Disenrollment, Enrollment};
pub use handlers::{
    DisenrollHandler, EditPersonalInfoHandler, EnrollHandler, RegisterHandler, TransferHandler,
    UnregisterHandler,
};
pub use queries::{GetList, GetListHandler, StudentRow};
pub use repository::{COURSES, CourseRepository, STUDENTS, StudentRepository};
pub use value_objects::{Course, Grade};

use common::EntityId;
use thiserror::Error;

/// Errors that can occur during student operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StudentError {
    /// No student exists with the given identity.
    #[error("No student found for Id {0}")]
    StudentNotFound(EntityId),

    /// The course is not in the catalog.
    #[error("Course is incorrect: '{0}'")]
    InvalidCourse(String),

    /// The grade is not a recognized letter.
    #[error("Grade is incorrect: '{0}'")]
    InvalidGrade(String),

    /// No enrollment occupies the given slot.
    #[error("No enrollment found with number '{0}'")]
    EnrollmentNotFound(i32),

    /// Disenrolling requires a non-blank comment.
    #[error("Disenrollment comment is required")]
    CommentRequired,

    /// Both enrollment slots are taken.
    #[error("Cannot have more than 2 enrollments")]
    CapacityExceeded,

    /// Students must have a non-blank name.
    #[error("Name is required")]
    NameRequired,
}
