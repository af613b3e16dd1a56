//! Student roster endpoints.
//!
//! Every handler translates its request into a command or query and hands it
//! to the dispatcher; responses are wrapped in an [`Envelope`].

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use common::EntityId;
use domain::{
    Disenroll, Dispatcher, EditPersonalInfo, Enroll, GetList, Register, StudentRow, Transfer,
    Unregister,
};
use serde::Deserialize;

use crate::error::{ApiError, Envelope};
use crate::extract::ApiJson;

/// Shared application state accessible from all handlers.
pub struct AppState {
    pub dispatcher: Dispatcher,
}

impl AppState {
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self { dispatcher }
    }
}

// -- Request types --

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub enrolled: Option<String>,
    pub number: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub course1: Option<String>,
    pub course1_grade: Option<String>,
    pub course2: Option<String>,
    pub course2_grade: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct EditPersonalInfoRequest {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct EnrollmentRequest {
    pub course: String,
    pub grade: String,
}

#[derive(Debug, Deserialize)]
pub struct DisenrollmentRequest {
    pub comment: String,
}

type Outcome = Result<Json<Envelope<()>>, ApiError>;

// -- Handlers --

/// GET /api/students?enrolled=&number=: list students with their enrollments.
#[tracing::instrument(skip(state))]
pub async fn list(
    State(state): State<Arc<AppState>>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<Envelope<Vec<StudentRow>>>, ApiError> {
    let Query(params) = params?;
    let rows = state
        .dispatcher
        .query(GetList {
            enrolled_in: params.enrolled,
            number_of_courses: params.number,
        })
        .await?;

    Ok(Json(Envelope::ok(rows)))
}

/// POST /api/students: register a student.
#[tracing::instrument(skip(state, req))]
pub async fn register(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> Outcome {
    let cmd = Register {
        name: req.name,
        email: req.email,
        course1: req.course1,
        course1_grade: req.course1_grade,
        course2: req.course2,
        course2_grade: req.course2_grade,
    };

    state.dispatcher.dispatch(cmd).await?;
    Ok(Json(Envelope::empty()))
}

/// DELETE /api/students/{id}: unregister a student.
#[tracing::instrument(skip(state))]
pub async fn unregister(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> Outcome {
    let id = parse_student_id(&id)?;
    state.dispatcher.dispatch(Unregister::new(id)).await?;
    Ok(Json(Envelope::empty()))
}

/// PUT /api/students/{id}: edit name and email.
#[tracing::instrument(skip(state, req))]
pub async fn edit_personal_info(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<EditPersonalInfoRequest>,
) -> Outcome {
    let id = parse_student_id(&id)?;
    state
        .dispatcher
        .dispatch(EditPersonalInfo::new(id, req.name, req.email))
        .await?;
    Ok(Json(Envelope::empty()))
}

/// POST /api/students/{id}/enrollments: enroll in a course.
#[tracing::instrument(skip(state, req))]
pub async fn enroll(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<EnrollmentRequest>,
) -> Outcome {
    let id = parse_student_id(&id)?;
    state
        .dispatcher
        .dispatch(Enroll::new(id, req.course, req.grade))
        .await?;
    Ok(Json(Envelope::empty()))
}

/// PUT /api/students/{id}/enrollments/{number}: transfer an enrollment.
#[tracing::instrument(skip(state, req))]
pub async fn transfer(
    State(state): State<Arc<AppState>>,
    Path((id, number)): Path<(String, String)>,
    ApiJson(req): ApiJson<EnrollmentRequest>,
) -> Outcome {
    let id = parse_student_id(&id)?;
    let number = parse_enrollment_number(&number)?;
    state
        .dispatcher
        .dispatch(Transfer::new(id, number, req.course, req.grade))
        .await?;
    Ok(Json(Envelope::empty()))
}

/// POST /api/students/{id}/enrollments/{number}/deletion: disenroll.
#[tracing::instrument(skip(state, req))]
pub async fn disenroll(
    State(state): State<Arc<AppState>>,
    Path((id, number)): Path<(String, String)>,
    ApiJson(req): ApiJson<DisenrollmentRequest>,
) -> Outcome {
    let id = parse_student_id(&id)?;
    let number = parse_enrollment_number(&number)?;
    state
        .dispatcher
        .dispatch(Disenroll::new(id, number, req.comment))
        .await?;
    Ok(Json(Envelope::empty()))
}

fn parse_student_id(id: &str) -> Result<EntityId, ApiError> {
    let value = id
        .parse::<i64>()
        .map_err(|e| ApiError::BadRequest(format!("Invalid ID format: {e}")))?;
    Ok(EntityId::new(value))
}

fn parse_enrollment_number(number: &str) -> Result<i32, ApiError> {
    number
        .parse::<i32>()
        .map_err(|e| ApiError::BadRequest(format!("Invalid enrollment number: {e}")))
}
