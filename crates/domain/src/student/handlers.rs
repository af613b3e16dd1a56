//! Command handlers for the student aggregate.
//!
//! Each invocation opens its own unit of work and reloads everything it
//! needs, so a handler can be re-run safely after a failed commit.

use async_trait::async_trait;
use common::EntityId;
use document_store::{DocumentStore, UnitOfWork};

use crate::command::CommandHandler;
use crate::error::ServiceError;

use super::{
    Course, CourseRepository, Disenroll, EditPersonalInfo, Enroll, Grade, Register, Student,
    StudentError, StudentRepository, Transfer, Unregister,
};

async fn load_student<S: DocumentStore>(
    uow: &UnitOfWork<S>,
    id: EntityId,
) -> Result<Student, ServiceError> {
    StudentRepository::get_by_id(uow, id)
        .await?
        .ok_or(ServiceError::Rejected(StudentError::StudentNotFound(id)))
}

async fn load_course<S: DocumentStore>(
    uow: &UnitOfWork<S>,
    name: &str,
) -> Result<Course, ServiceError> {
    CourseRepository::get_by_name(uow, name)
        .await?
        .ok_or_else(|| ServiceError::Rejected(StudentError::InvalidCourse(name.to_string())))
}

/// Handles [`Register`].
pub struct RegisterHandler<S> {
    store: S,
}

impl<S> RegisterHandler<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }
}

#[async_trait]
impl<S: DocumentStore + Clone + 'static> CommandHandler<Register> for RegisterHandler<S> {
    #[tracing::instrument(skip(self, command), fields(email = %command.email))]
    async fn handle(&self, command: &Register) -> Result<(), ServiceError> {
        let mut uow = UnitOfWork::begin(self.store.clone());
        let mut student = Student::new(&command.name, &command.email)?;

        for (course_name, grade) in command.enrollments() {
            let course = load_course(&uow, course_name).await?;
            let grade: Grade = grade.parse()?;
            student.enroll(course, grade)?;
        }

        StudentRepository::save(&mut uow, &student)?;
        let receipt = uow.commit().await?;

        tracing::info!(student_id = ?receipt.first_inserted(), "student registered");
        Ok(())
    }
}

/// Handles [`Unregister`].
pub struct UnregisterHandler<S> {
    store: S,
}

impl<S> UnregisterHandler<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }
}

#[async_trait]
impl<S: DocumentStore + Clone + 'static> CommandHandler<Unregister> for UnregisterHandler<S> {
    #[tracing::instrument(skip(self, command), fields(student_id = %command.id))]
    async fn handle(&self, command: &Unregister) -> Result<(), ServiceError> {
        let mut uow = UnitOfWork::begin(self.store.clone());
        let student = load_student(&uow, command.id).await?;

        StudentRepository::delete(&mut uow, &student)?;
        uow.commit().await?;
        Ok(())
    }
}

/// Handles [`EditPersonalInfo`].
pub struct EditPersonalInfoHandler<S> {
    store: S,
}

impl<S> EditPersonalInfoHandler<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }
}

#[async_trait]
impl<S: DocumentStore + Clone + 'static> CommandHandler<EditPersonalInfo>
    for EditPersonalInfoHandler<S>
{
    #[tracing::instrument(skip(self, command), fields(student_id = %command.id))]
    async fn handle(&self, command: &EditPersonalInfo) -> Result<(), ServiceError> {
        let mut uow = UnitOfWork::begin(self.store.clone());
        let mut student = load_student(&uow, command.id).await?;

        student.edit_personal_info(&command.name, &command.email)?;

        StudentRepository::update(&mut uow, &student)?;
        uow.commit().await?;
        Ok(())
    }
}

/// Handles [`Enroll`].
pub struct EnrollHandler<S> {
    store: S,
}

impl<S> EnrollHandler<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }
}

#[async_trait]
impl<S: DocumentStore + Clone + 'static> CommandHandler<Enroll> for EnrollHandler<S> {
    #[tracing::instrument(skip(self, command), fields(student_id = %command.id, course = %command.course))]
    async fn handle(&self, command: &Enroll) -> Result<(), ServiceError> {
        let mut uow = UnitOfWork::begin(self.store.clone());
        let mut student = load_student(&uow, command.id).await?;
        let course = load_course(&uow, &command.course).await?;
        let grade: Grade = command.grade.parse()?;

        student.enroll(course, grade)?;

        StudentRepository::update(&mut uow, &student)?;
        uow.commit().await?;
        Ok(())
    }
}

/// Handles [`Transfer`].
pub struct TransferHandler<S> {
    store: S,
}

impl<S> TransferHandler<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }
}

#[async_trait]
impl<S: DocumentStore + Clone + 'static> CommandHandler<Transfer> for TransferHandler<S> {
    #[tracing::instrument(
        skip(self, command),
        fields(student_id = %command.id, enrollment = command.enrollment_number)
    )]
    async fn handle(&self, command: &Transfer) -> Result<(), ServiceError> {
        let mut uow = UnitOfWork::begin(self.store.clone());
        let mut student = load_student(&uow, command.id).await?;
        let course = load_course(&uow, &command.course).await?;
        let grade: Grade = command.grade.parse()?;

        student.transfer(command.enrollment_number, course, grade)?;

        StudentRepository::update(&mut uow, &student)?;
        uow.commit().await?;
        Ok(())
    }
}

/// Handles [`Disenroll`].
pub struct DisenrollHandler<S> {
    store: S,
}

impl<S> DisenrollHandler<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }
}

#[async_trait]
impl<S: DocumentStore + Clone + 'static> CommandHandler<Disenroll> for DisenrollHandler<S> {
    #[tracing::instrument(
        skip(self, command),
        fields(student_id = %command.id, enrollment = command.enrollment_number)
    )]
    async fn handle(&self, command: &Disenroll) -> Result<(), ServiceError> {
        let mut uow = UnitOfWork::begin(self.store.clone());
        let mut student = load_student(&uow, command.id).await?;

        student.remove_enrollment(command.enrollment_number, &command.comment)?;

        StudentRepository::update(&mut uow, &student)?;
        uow.commit().await?;
        Ok(())
    }
}
