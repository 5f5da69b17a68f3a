//! Student API routes
//!
//! # Route Structure
//!
//! - `POST /api/v1/students` - Create a user account (admin)
//! - `GET /api/v1/students/:id` - Profile with registrations populated

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;

use crate::api::response::{ApiResponse, ErrorResponse};
use crate::store::DynStore;

use super::commands::{CreateStudentCommand, CreateStudentError};
use super::queries::{GetStudentError, GetStudentQuery};

/// Creates the students router with all routes configured
pub fn students_routes() -> Router<DynStore> {
    Router::new()
        .route("/", post(create_student))
        .route("/:id", get(get_student))
}

#[tracing::instrument(skip(store, command), fields(roll_number = %command.roll_number))]
async fn create_student(
    State(store): State<DynStore>,
    Json(command): Json<CreateStudentCommand>,
) -> Result<Response, StudentsApiError> {
    let response = super::commands::create::handle(store, command).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(response))).into_response())
}

#[tracing::instrument(skip(store), fields(user_id = %id))]
async fn get_student(
    State(store): State<DynStore>,
    Path(id): Path<Uuid>,
) -> Result<Response, StudentsApiError> {
    let response = super::queries::get::handle(store, GetStudentQuery { id }).await?;
    Ok((StatusCode::OK, Json(ApiResponse::success(response))).into_response())
}

// ============================================================================
// Error Handling
// ============================================================================

/// Unified error type for student API endpoints
#[derive(Debug)]
enum StudentsApiError {
    Create(CreateStudentError),
    Get(GetStudentError),
}

impl From<CreateStudentError> for StudentsApiError {
    fn from(err: CreateStudentError) -> Self {
        Self::Create(err)
    }
}

impl From<GetStudentError> for StudentsApiError {
    fn from(err: GetStudentError) -> Self {
        Self::Get(err)
    }
}

impl IntoResponse for StudentsApiError {
    fn into_response(self) -> Response {
        match self {
            StudentsApiError::Create(CreateStudentError::RollNumberRequired)
            | StudentsApiError::Create(CreateStudentError::NameRequired)
            | StudentsApiError::Create(CreateStudentError::PasswordTooShort) => {
                let error = ErrorResponse::new("VALIDATION_ERROR", self_message(&self));
                (StatusCode::BAD_REQUEST, Json(error)).into_response()
            }
            StudentsApiError::Create(CreateStudentError::DuplicateRollNumber(roll)) => {
                let error = ErrorResponse::new(
                    "CONFLICT",
                    format!("A user with roll number '{roll}' already exists"),
                );
                (StatusCode::CONFLICT, Json(error)).into_response()
            }
            StudentsApiError::Create(ref e @ CreateStudentError::Hashing(_))
            | StudentsApiError::Create(ref e @ CreateStudentError::Store(_)) => {
                tracing::error!("Account creation failed: {e}");
                let error = ErrorResponse::new("INTERNAL_ERROR", "Account creation failed");
                (StatusCode::INTERNAL_SERVER_ERROR, Json(error)).into_response()
            }
            StudentsApiError::Get(GetStudentError::NotFound(id)) => {
                let error = ErrorResponse::new("NOT_FOUND", format!("User {id} not found"));
                (StatusCode::NOT_FOUND, Json(error)).into_response()
            }
            StudentsApiError::Get(GetStudentError::Store(ref e)) => {
                tracing::error!("Storage error during profile retrieval: {e}");
                let error = ErrorResponse::new("INTERNAL_ERROR", "A storage error occurred");
                (StatusCode::INTERNAL_SERVER_ERROR, Json(error)).into_response()
            }
        }
    }
}

fn self_message(err: &StudentsApiError) -> String {
    match err {
        StudentsApiError::Create(e) => e.to_string(),
        StudentsApiError::Get(e) => e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn routes_construct() {
        let router = students_routes();
        assert!(format!("{:?}", router).contains("Router"));
    }
}
