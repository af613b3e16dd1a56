//! Student aggregate implementation.

use common::EntityId;
use document_store::Version;
use serde::{Deserialize, Serialize};

use super::{Course, Disenrollment, Enrollment, Grade, StudentError};

/// Maximum number of concurrent enrollments per student.
pub const MAX_ENROLLMENTS: usize = 2;

/// Student aggregate root.
///
/// A student owns two enrollment slots addressed by a 1-based enrollment
/// number. New enrollments take the first empty slot, and a slot freed by a
/// disenrollment stays empty until the next enroll fills it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Student {
    /// Identity assigned by the store, absent until first commit.
    #[serde(skip)]
    id: Option<EntityId>,

    /// Version the aggregate was loaded at.
    #[serde(skip)]
    version: Version,

    name: String,

    email: String,

    /// Enrollment slots, first then second.
    enrollments: [Option<Enrollment>; MAX_ENROLLMENTS],

    /// Enrollments removed from this student, oldest first.
    #[serde(default)]
    disenrollments: Vec<Disenrollment>,
}

impl Student {
    /// Creates an unpersisted student with no enrollments.
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Result<Self, StudentError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(StudentError::NameRequired);
        }

        Ok(Self {
            id: None,
            version: Version::initial(),
            name,
            email: email.into(),
            enrollments: [None, None],
            disenrollments: Vec::new(),
        })
    }

    /// Returns the identity, if the student has been persisted.
    pub fn id(&self) -> Option<EntityId> {
        self.id
    }

    /// Returns the version the aggregate was loaded at.
    pub fn version(&self) -> Version {
        self.version
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    /// Returns the occupied enrollments in slot order.
    pub fn enrollments(&self) -> impl Iterator<Item = &Enrollment> {
        self.enrollments.iter().flatten()
    }

    /// Returns the number of occupied slots.
    pub fn enrollment_count(&self) -> usize {
        self.enrollments().count()
    }

    /// Returns true if any slot holds the named course.
    pub fn is_enrolled_in(&self, course_name: &str) -> bool {
        self.enrollments()
            .any(|enrollment| enrollment.course().name() == course_name)
    }

    /// Returns the removed enrollments, oldest first.
    pub fn disenrollments(&self) -> &[Disenrollment] {
        &self.disenrollments
    }

    /// Returns the enrollment in slot `number`.
    ///
    /// Numbers outside 1..=2 and empty slots both yield `None`.
    pub fn get_enrollment(&self, number: i32) -> Option<&Enrollment> {
        slot_index(number).and_then(|index| self.enrollments[index].as_ref())
    }

    /// Enrolls the student in a course, taking the first empty slot.
    pub fn enroll(&mut self, course: Course, grade: Grade) -> Result<(), StudentError> {
        let slot = self
            .enrollments
            .iter_mut()
            .find(|slot| slot.is_none())
            .ok_or(StudentError::CapacityExceeded)?;

        *slot = Some(Enrollment::new(course, grade));
        Ok(())
    }

    /// Replaces course and grade of the enrollment in slot `number`.
    pub fn transfer(&mut self, number: i32, course: Course, grade: Grade) -> Result<(), StudentError> {
        let enrollment = slot_index(number)
            .and_then(|index| self.enrollments[index].as_mut())
            .ok_or(StudentError::EnrollmentNotFound(number))?;

        enrollment.update(course, grade);
        Ok(())
    }

    /// Frees slot `number`, keeping the removed enrollment as history.
    pub fn remove_enrollment(&mut self, number: i32, comment: &str) -> Result<(), StudentError> {
        if comment.trim().is_empty() {
            return Err(StudentError::CommentRequired);
        }

        let enrollment = slot_index(number)
            .and_then(|index| self.enrollments[index].take())
            .ok_or(StudentError::EnrollmentNotFound(number))?;

        self.disenrollments
            .push(Disenrollment::from_enrollment(enrollment, comment));
        Ok(())
    }

    /// Replaces name and email.
    pub fn edit_personal_info(
        &mut self,
        name: impl Into<String>,
        email: impl Into<String>,
    ) -> Result<(), StudentError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(StudentError::NameRequired);
        }

        self.name = name;
        self.email = email.into();
        Ok(())
    }

    /// Attaches the stored identity and version after a load.
    pub(crate) fn set_identity(&mut self, id: EntityId, version: Version) {
        self.id = Some(id);
        self.version = version;
    }
}

fn slot_index(number: i32) -> Option<usize> {
    usize::try_from(number)
        .ok()
        .filter(|n| (1..=MAX_ENROLLMENTS).contains(n))
        .map(|n| n - 1)
}
