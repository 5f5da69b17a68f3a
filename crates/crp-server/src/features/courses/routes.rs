//! Course API routes
//!
//! Wires the course commands and queries to Axum handlers.
//!
//! # Route Structure
//!
//! - `POST /api/v1/courses` - Create a course (response carries advisory conflicts)
//! - `GET /api/v1/courses` - List courses with filters and pagination
//! - `POST /api/v1/courses/check-conflicts` - Standalone advisory conflict check
//! - `GET /api/v1/courses/:id` - Get a single course
//! - `PUT /api/v1/courses/:id` - Partially update a course (allow-listed fields)
//! - `DELETE /api/v1/courses/:id` - Delete a course with cascade
//! - `POST /api/v1/courses/:id/subscribe` - Subscribe to seat notifications

use axum::{
    extract::rejection::JsonRejection,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Json, Router,
};
use uuid::Uuid;

use crate::api::response::{ApiResponse, ErrorResponse};
use crate::store::DynStore;

use super::commands::{
    CreateCourseCommand, CreateCourseError, DeleteCourseCommand, DeleteCourseError,
    SubscribeCommand, SubscribeError, UpdateCourseCommand, UpdateCourseError,
};
use super::queries::{
    CheckConflictsError, CheckConflictsQuery, GetCourseError, GetCourseQuery, ListCoursesError,
    ListCoursesQuery,
};

/// Creates the courses router with all routes configured
pub fn courses_routes() -> Router<DynStore> {
    Router::new()
        .route("/", post(create_course))
        .route("/", get(list_courses))
        .route("/check-conflicts", post(check_conflicts))
        .route("/:id", get(get_course))
        .route("/:id", put(update_course))
        .route("/:id", delete(delete_course))
        .route("/:id/subscribe", post(subscribe))
}

#[tracing::instrument(skip(store, command), fields(code = %command.code))]
async fn create_course(
    State(store): State<DynStore>,
    Json(command): Json<CreateCourseCommand>,
) -> Result<Response, CoursesApiError> {
    let response = super::commands::create::handle(store, command).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(response))).into_response())
}

#[tracing::instrument(skip(store, query))]
async fn list_courses(
    State(store): State<DynStore>,
    Query(query): Query<ListCoursesQuery>,
) -> Result<Response, CoursesApiError> {
    let response = super::queries::list::handle(store, query).await?;
    Ok((StatusCode::OK, Json(ApiResponse::success(response))).into_response())
}

#[tracing::instrument(skip(store, query))]
async fn check_conflicts(
    State(store): State<DynStore>,
    Json(query): Json<CheckConflictsQuery>,
) -> Result<Response, CoursesApiError> {
    let response = super::queries::check_conflicts::handle(store, query).await?;
    Ok((StatusCode::OK, Json(ApiResponse::success(response))).into_response())
}

#[tracing::instrument(skip(store), fields(course_id = %id))]
async fn get_course(
    State(store): State<DynStore>,
    Path(id): Path<Uuid>,
) -> Result<Response, CoursesApiError> {
    let response = super::queries::get::handle(store, GetCourseQuery { id }).await?;
    Ok((StatusCode::OK, Json(ApiResponse::success(response))).into_response())
}

/// The update body is deserialized manually so an unknown or malformed field
/// comes back as a structured validation error rather than a bare rejection.
#[tracing::instrument(skip(store, payload), fields(course_id = %id))]
async fn update_course(
    State(store): State<DynStore>,
    Path(id): Path<Uuid>,
    payload: Result<Json<UpdateCourseCommand>, JsonRejection>,
) -> Result<Response, CoursesApiError> {
    let Json(mut command) = payload.map_err(CoursesApiError::BadBody)?;
    command.id = id;

    let response = super::commands::update::handle(store, command).await?;
    Ok((StatusCode::OK, Json(ApiResponse::success(response))).into_response())
}

#[tracing::instrument(skip(store), fields(course_id = %id))]
async fn delete_course(
    State(store): State<DynStore>,
    Path(id): Path<Uuid>,
) -> Result<Response, CoursesApiError> {
    let response = super::commands::delete::handle(store, DeleteCourseCommand { id }).await?;
    Ok((StatusCode::OK, Json(ApiResponse::success(response))).into_response())
}

#[tracing::instrument(skip(store, command), fields(course_id = %id))]
async fn subscribe(
    State(store): State<DynStore>,
    Path(id): Path<Uuid>,
    Json(mut command): Json<SubscribeCommand>,
) -> Result<Response, CoursesApiError> {
    command.course_id = id;
    let response = super::commands::subscribe::handle(store, command).await?;
    Ok((StatusCode::OK, Json(ApiResponse::success(response))).into_response())
}

// ============================================================================
// Error Handling
// ============================================================================

/// Unified error type for course API endpoints
#[derive(Debug)]
enum CoursesApiError {
    Create(CreateCourseError),
    Update(UpdateCourseError),
    Delete(DeleteCourseError),
    Subscribe(SubscribeError),
    Get(GetCourseError),
    List(ListCoursesError),
    CheckConflicts(CheckConflictsError),
    BadBody(JsonRejection),
}

impl From<CreateCourseError> for CoursesApiError {
    fn from(err: CreateCourseError) -> Self {
        Self::Create(err)
    }
}

impl From<UpdateCourseError> for CoursesApiError {
    fn from(err: UpdateCourseError) -> Self {
        Self::Update(err)
    }
}

impl From<DeleteCourseError> for CoursesApiError {
    fn from(err: DeleteCourseError) -> Self {
        Self::Delete(err)
    }
}

impl From<SubscribeError> for CoursesApiError {
    fn from(err: SubscribeError) -> Self {
        Self::Subscribe(err)
    }
}

impl From<GetCourseError> for CoursesApiError {
    fn from(err: GetCourseError) -> Self {
        Self::Get(err)
    }
}

impl From<ListCoursesError> for CoursesApiError {
    fn from(err: ListCoursesError) -> Self {
        Self::List(err)
    }
}

impl From<CheckConflictsError> for CoursesApiError {
    fn from(err: CheckConflictsError) -> Self {
        Self::CheckConflicts(err)
    }
}

fn internal_error(context: &str, err: &dyn std::fmt::Display) -> Response {
    tracing::error!("{context}: {err}");
    let error = ErrorResponse::new("INTERNAL_ERROR", "A storage error occurred");
    (StatusCode::INTERNAL_SERVER_ERROR, Json(error)).into_response()
}

fn validation_error(err: &dyn std::fmt::Display) -> Response {
    let error = ErrorResponse::new("VALIDATION_ERROR", err.to_string());
    (StatusCode::BAD_REQUEST, Json(error)).into_response()
}

fn not_found(message: String) -> Response {
    let error = ErrorResponse::new("NOT_FOUND", message);
    (StatusCode::NOT_FOUND, Json(error)).into_response()
}

impl IntoResponse for CoursesApiError {
    fn into_response(self) -> Response {
        match self {
            // Create errors
            CoursesApiError::Create(CreateCourseError::Validation(ref e)) => validation_error(e),
            CoursesApiError::Create(CreateCourseError::DuplicateCode(code)) => {
                let error = ErrorResponse::new(
                    "CONFLICT",
                    format!("A course with code '{code}' already exists"),
                );
                (StatusCode::CONFLICT, Json(error)).into_response()
            }
            CoursesApiError::Create(CreateCourseError::Store(ref e)) => {
                internal_error("Storage error during course creation", e)
            }

            // Update errors
            CoursesApiError::Update(UpdateCourseError::Validation(ref e)) => validation_error(e),
            CoursesApiError::Update(UpdateCourseError::NotFound(id)) => {
                not_found(format!("Course {id} not found"))
            }
            CoursesApiError::Update(UpdateCourseError::Store(ref e)) => {
                internal_error("Storage error during course update", e)
            }

            // Delete errors
            CoursesApiError::Delete(DeleteCourseError::NotFound(id)) => {
                not_found(format!("Course {id} not found"))
            }
            CoursesApiError::Delete(ref e @ DeleteCourseError::DeletionFailed(_)) => {
                internal_error("Course deletion cascade failed", e)
            }

            // Subscribe errors
            CoursesApiError::Subscribe(SubscribeError::CourseNotFound(id)) => {
                not_found(format!("Course {id} not found"))
            }
            CoursesApiError::Subscribe(SubscribeError::UserNotFound(id)) => {
                not_found(format!("User {id} not found"))
            }
            CoursesApiError::Subscribe(SubscribeError::AlreadySubscribed) => {
                let error = ErrorResponse::new("CONFLICT", "Already subscribed to this course");
                (StatusCode::CONFLICT, Json(error)).into_response()
            }
            CoursesApiError::Subscribe(SubscribeError::Store(ref e)) => {
                internal_error("Storage error during subscription", e)
            }

            // Get errors
            CoursesApiError::Get(GetCourseError::NotFound(id)) => {
                not_found(format!("Course {id} not found"))
            }
            CoursesApiError::Get(GetCourseError::Store(ref e)) => {
                internal_error("Storage error during course retrieval", e)
            }

            // List errors
            CoursesApiError::List(ListCoursesError::InvalidPagination(message)) => {
                let error = ErrorResponse::new("VALIDATION_ERROR", message);
                (StatusCode::BAD_REQUEST, Json(error)).into_response()
            }
            CoursesApiError::List(ListCoursesError::Validation(ref e)) => validation_error(e),
            CoursesApiError::List(ListCoursesError::Store(ref e)) => {
                internal_error("Storage error during course listing", e)
            }

            // Conflict-check errors
            CoursesApiError::CheckConflicts(CheckConflictsError::Validation(ref e)) => {
                validation_error(e)
            }

            // Body rejections (unknown fields, malformed JSON)
            CoursesApiError::BadBody(ref rejection) => validation_error(rejection),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn routes_construct() {
        let router = courses_routes();
        assert!(format!("{:?}", router).contains("Router"));
    }
}
