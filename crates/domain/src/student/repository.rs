//! Repositories mapping aggregates onto documents.
//!
//! Repositories hold no state; every call takes the unit of work it operates
//! in, so a handler's reads and writes always share one scope.

use common::EntityId;
use document_store::{DocumentStore, StorageError, UnitOfWork};

use crate::error::ServiceError;

use super::{Course, Student};

/// Collection holding student documents.
pub const STUDENTS: &str = "students";

/// Collection holding course documents, keyed by course name.
pub const COURSES: &str = "courses";

/// Loads and stages student aggregates.
pub struct StudentRepository;

impl StudentRepository {
    /// Loads a student by identity.
    pub async fn get_by_id<S: DocumentStore>(
        uow: &UnitOfWork<S>,
        id: EntityId,
    ) -> Result<Option<Student>, ServiceError> {
        let Some(document) = uow.get(STUDENTS, id).await? else {
            return Ok(None);
        };

        let mut student: Student = document.decode()?;
        student.set_identity(document.id, document.version);
        Ok(Some(student))
    }

    /// Loads every student, ordered by identity.
    pub async fn list<S: DocumentStore>(uow: &UnitOfWork<S>) -> Result<Vec<Student>, ServiceError> {
        let documents = uow.list(STUDENTS).await?;

        documents
            .into_iter()
            .map(|document| -> Result<Student, ServiceError> {
                let mut student: Student = document.decode()?;
                student.set_identity(document.id, document.version);
                Ok(student)
            })
            .collect()
    }

    /// Stages a new student. The identity is assigned on commit.
    pub fn save<S: DocumentStore>(
        uow: &mut UnitOfWork<S>,
        student: &Student,
    ) -> Result<(), ServiceError> {
        uow.insert(STUDENTS, None, serde_json::to_value(student)?);
        Ok(())
    }

    /// Stages the current state of a loaded student.
    pub fn update<S: DocumentStore>(
        uow: &mut UnitOfWork<S>,
        student: &Student,
    ) -> Result<(), ServiceError> {
        let id = persisted_id(student)?;
        uow.update(STUDENTS, id, student.version(), serde_json::to_value(student)?);
        Ok(())
    }

    /// Stages removal of a loaded student.
    pub fn delete<S: DocumentStore>(
        uow: &mut UnitOfWork<S>,
        student: &Student,
    ) -> Result<(), ServiceError> {
        let id = persisted_id(student)?;
        uow.delete(STUDENTS, id, student.version());
        Ok(())
    }
}

fn persisted_id(student: &Student) -> Result<EntityId, ServiceError> {
    student.id().ok_or_else(|| {
        ServiceError::Storage(StorageError::InvalidChange(
            "student has not been persisted".to_string(),
        ))
    })
}

/// Reads catalog courses.
pub struct CourseRepository;

impl CourseRepository {
    /// Looks a course up by its exact name.
    pub async fn get_by_name<S: DocumentStore>(
        uow: &UnitOfWork<S>,
        name: &str,
    ) -> Result<Option<Course>, ServiceError> {
        match uow.find_by_key(COURSES, name).await? {
            Some(document) => Ok(Some(document.decode()?)),
            None => Ok(None),
        }
    }

    /// Stages a catalog entry keyed by the course name.
    pub fn add<S: DocumentStore>(
        uow: &mut UnitOfWork<S>,
        course: &Course,
    ) -> Result<(), ServiceError> {
        uow.insert(
            COURSES,
            Some(course.name().to_string()),
            serde_json::to_value(course)?,
        );
        Ok(())
    }
}
