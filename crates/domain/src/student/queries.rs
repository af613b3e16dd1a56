//! Read side: the flattened student listing.

use async_trait::async_trait;
use common::EntityId;
use document_store::{DocumentStore, UnitOfWork};
use serde::{Deserialize, Serialize};

use crate::command::{Query, QueryHandler};
use crate::error::ServiceError;

use super::{Enrollment, Student, StudentRepository};

/// Lists students, optionally filtered by course and by enrollment count.
///
/// A missing or blank course name matches every student. The count filter
/// matches the exact number of occupied slots.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetList {
    pub enrolled_in: Option<String>,
    pub number_of_courses: Option<usize>,
}

impl GetList {
    /// Creates an unfiltered listing.
    pub fn all() -> Self {
        Self::default()
    }

    fn matches(&self, student: &Student) -> bool {
        let course_matches = match self.enrolled_in.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => student.is_enrolled_in(name),
            _ => true,
        };

        course_matches
            && self
                .number_of_courses
                .is_none_or(|count| student.enrollment_count() == count)
    }
}

impl Query for GetList {
    type Output = Vec<StudentRow>;

    fn query_type() -> &'static str {
        "GetList"
    }
}

/// One student flattened with both enrollment slots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentRow {
    pub id: EntityId,
    pub name: String,
    pub email: String,
    pub course1: Option<String>,
    pub course1_grade: Option<String>,
    pub course1_credits: Option<u32>,
    pub course2: Option<String>,
    pub course2_grade: Option<String>,
    pub course2_credits: Option<u32>,
}

impl StudentRow {
    fn from_student(id: EntityId, student: &Student) -> Self {
        let slot = |number| {
            let enrollment: Option<&Enrollment> = student.get_enrollment(number);
            (
                enrollment.map(|e| e.course().name().to_string()),
                enrollment.map(|e| e.grade().to_string()),
                enrollment.map(|e| e.course().credits()),
            )
        };
        let (course1, course1_grade, course1_credits) = slot(1);
        let (course2, course2_grade, course2_credits) = slot(2);

        Self {
            id,
            name: student.name().to_string(),
            email: student.email().to_string(),
            course1,
            course1_grade,
            course1_credits,
            course2,
            course2_grade,
            course2_credits,
        }
    }
}

/// Handles [`GetList`].
pub struct GetListHandler<S> {
    store: S,
}

impl<S> GetListHandler<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }
}

#[async_trait]
impl<S: DocumentStore + Clone + 'static> QueryHandler<GetList> for GetListHandler<S> {
    #[tracing::instrument(skip(self))]
    async fn handle(&self, query: &GetList) -> Result<Vec<StudentRow>, ServiceError> {
        let uow = UnitOfWork::begin(self.store.clone());
        let students = StudentRepository::list(&uow).await?;

        let rows = students
            .iter()
            .filter(|student| query.matches(student))
            .filter_map(|student| {
                student
                    .id()
                    .map(|id| StudentRow::from_student(id, student))
            })
            .collect();

        Ok(rows)
    }
}
