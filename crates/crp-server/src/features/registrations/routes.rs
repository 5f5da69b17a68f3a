//! Registration API routes
//!
//! # Route Structure
//!
//! - `POST /api/v1/registrations` - Register for a course
//! - `GET /api/v1/registrations` - List registrations (optionally `?student_id=`)
//! - `PUT /api/v1/registrations/:id` - Update registration status (admin)
//! - `DELETE /api/v1/registrations/:id?acting_user_id=` - Cancel a registration
//!
//! Business-rule rejections keep their structured detail: a schedule conflict
//! carries the offending course, day, and both time ranges; unmet
//! prerequisites carry the missing course summaries.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::api::response::{ApiResponse, ErrorResponse};
use crate::features::registrations::eligibility::EligibilityError;
use crate::store::DynStore;

use super::commands::{
    CancelRegistrationCommand, CancelRegistrationError, RegisterCommand, RegisterError,
    UpdateRegistrationStatusCommand, UpdateRegistrationStatusError,
};
use super::queries::{ListRegistrationsError, ListRegistrationsQuery};

/// Creates the registrations router with all routes configured
pub fn registrations_routes() -> Router<DynStore> {
    Router::new()
        .route("/", post(register))
        .route("/", get(list_registrations))
        .route("/:id", put(update_status))
        .route("/:id", delete(cancel))
}

#[tracing::instrument(
    skip(store, command),
    fields(student_id = %command.student_id, course_id = %command.course_id)
)]
async fn register(
    State(store): State<DynStore>,
    Json(command): Json<RegisterCommand>,
) -> Result<Response, RegistrationsApiError> {
    let response = super::commands::register::handle(store, command).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(response))).into_response())
}

#[tracing::instrument(skip(store, query))]
async fn list_registrations(
    State(store): State<DynStore>,
    Query(query): Query<ListRegistrationsQuery>,
) -> Result<Response, RegistrationsApiError> {
    let response = super::queries::list::handle(store, query).await?;
    Ok((StatusCode::OK, Json(ApiResponse::success(response))).into_response())
}

#[tracing::instrument(skip(store, command), fields(registration_id = %id))]
async fn update_status(
    State(store): State<DynStore>,
    Path(id): Path<Uuid>,
    Json(mut command): Json<UpdateRegistrationStatusCommand>,
) -> Result<Response, RegistrationsApiError> {
    command.registration_id = id;
    let response = super::commands::update_status::handle(store, command).await?;
    Ok((StatusCode::OK, Json(ApiResponse::success(response))).into_response())
}

#[derive(Debug, Deserialize)]
struct CancelParams {
    acting_user_id: Uuid,
}

#[tracing::instrument(skip(store, params), fields(registration_id = %id))]
async fn cancel(
    State(store): State<DynStore>,
    Path(id): Path<Uuid>,
    Query(params): Query<CancelParams>,
) -> Result<Response, RegistrationsApiError> {
    let command = CancelRegistrationCommand {
        registration_id: id,
        acting_user_id: params.acting_user_id,
    };
    let response = super::commands::cancel::handle(store, command).await?;
    Ok((StatusCode::OK, Json(ApiResponse::success(response))).into_response())
}

// ============================================================================
// Error Handling
// ============================================================================

/// Unified error type for registration API endpoints
#[derive(Debug)]
enum RegistrationsApiError {
    Register(RegisterError),
    UpdateStatus(UpdateRegistrationStatusError),
    Cancel(CancelRegistrationError),
    List(ListRegistrationsError),
}

impl From<RegisterError> for RegistrationsApiError {
    fn from(err: RegisterError) -> Self {
        Self::Register(err)
    }
}

impl From<UpdateRegistrationStatusError> for RegistrationsApiError {
    fn from(err: UpdateRegistrationStatusError) -> Self {
        Self::UpdateStatus(err)
    }
}

impl From<CancelRegistrationError> for RegistrationsApiError {
    fn from(err: CancelRegistrationError) -> Self {
        Self::Cancel(err)
    }
}

impl From<ListRegistrationsError> for RegistrationsApiError {
    fn from(err: ListRegistrationsError) -> Self {
        Self::List(err)
    }
}

fn not_found(message: String) -> Response {
    let error = ErrorResponse::new("NOT_FOUND", message);
    (StatusCode::NOT_FOUND, Json(error)).into_response()
}

fn internal_error(context: &str, err: &dyn std::fmt::Display) -> Response {
    tracing::error!("{context}: {err}");
    let error = ErrorResponse::new("INTERNAL_ERROR", "A storage error occurred");
    (StatusCode::INTERNAL_SERVER_ERROR, Json(error)).into_response()
}

fn ineligible(err: EligibilityError) -> Response {
    let (message, details) = match &err {
        EligibilityError::NoSeatsAvailable | EligibilityError::AlreadyRegistered => {
            (err.to_string(), None)
        }
        EligibilityError::ScheduleConflict(detail) => (
            err.to_string(),
            serde_json::to_value(detail).ok(),
        ),
        EligibilityError::PrerequisitesNotMet { unmet } => (
            err.to_string(),
            Some(json!({ "prerequisites": unmet })),
        ),
    };

    let error = match details {
        Some(details) => ErrorResponse::with_details("CONFLICT", message, details),
        None => ErrorResponse::new("CONFLICT", message),
    };
    (StatusCode::CONFLICT, Json(error)).into_response()
}

impl IntoResponse for RegistrationsApiError {
    fn into_response(self) -> Response {
        match self {
            // Register errors
            RegistrationsApiError::Register(RegisterError::StudentNotFound(id)) => {
                not_found(format!("Student {id} not found"))
            }
            RegistrationsApiError::Register(RegisterError::CourseNotFound(id)) => {
                not_found(format!("Course {id} not found"))
            }
            RegistrationsApiError::Register(RegisterError::Ineligible(err)) => ineligible(err),
            RegistrationsApiError::Register(RegisterError::Store(ref e)) => {
                internal_error("Storage error during registration", e)
            }

            // Status update errors
            RegistrationsApiError::UpdateStatus(UpdateRegistrationStatusError::NotFound(id)) => {
                not_found(format!("Registration {id} not found"))
            }
            RegistrationsApiError::UpdateStatus(UpdateRegistrationStatusError::Store(ref e)) => {
                internal_error("Storage error during status update", e)
            }

            // Cancel errors
            RegistrationsApiError::Cancel(CancelRegistrationError::NotFound(id)) => {
                not_found(format!("Registration {id} not found"))
            }
            RegistrationsApiError::Cancel(CancelRegistrationError::UserNotFound(id)) => {
                not_found(format!("User {id} not found"))
            }
            RegistrationsApiError::Cancel(CancelRegistrationError::Forbidden) => {
                let error =
                    ErrorResponse::new("FORBIDDEN", "Not authorized to cancel this registration");
                (StatusCode::FORBIDDEN, Json(error)).into_response()
            }
            RegistrationsApiError::Cancel(CancelRegistrationError::Store(ref e)) => {
                internal_error("Storage error during cancellation", e)
            }

            // List errors
            RegistrationsApiError::List(ListRegistrationsError::Store(ref e)) => {
                internal_error("Storage error during registration listing", e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn routes_construct() {
        let router = registrations_routes();
        assert!(format!("{:?}", router).contains("Router"));
    }
}
