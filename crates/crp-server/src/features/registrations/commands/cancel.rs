//! Cancel registration command
//!
//! Students may cancel their own registrations; admins may cancel any.
//! Cancelling an approved registration frees its seat; the registration id is
//! pulled from the student's list either way.

use mediator::Request;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::registration::release_on_delete;
use crate::store::{DynStore, RegistryStore, StoreError};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelRegistrationCommand {
    pub registration_id: Uuid,
    /// The authenticated principal requesting the cancellation.
    pub acting_user_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelRegistrationResponse {
    pub id: Uuid,
    pub cancelled: bool,
    /// Whether a seat went back to the course
    pub seat_released: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum CancelRegistrationError {
    #[error("Registration {0} not found")]
    NotFound(Uuid),

    #[error("Acting user {0} not found")]
    UserNotFound(Uuid),

    #[error("Not authorized to cancel this registration")]
    Forbidden,

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}

impl Request<Result<CancelRegistrationResponse, CancelRegistrationError>>
    for CancelRegistrationCommand
{
}

impl crate::cqrs::middleware::Command for CancelRegistrationCommand {}

/// Handler for cancellations
#[tracing::instrument(
    skip(store),
    fields(registration_id = %command.registration_id, acting_user_id = %command.acting_user_id)
)]
pub async fn handle(
    store: DynStore,
    command: CancelRegistrationCommand,
) -> Result<CancelRegistrationResponse, CancelRegistrationError> {
    let registration = store
        .registration(command.registration_id)
        .await?
        .ok_or(CancelRegistrationError::NotFound(command.registration_id))?;

    let acting_user = store
        .user(command.acting_user_id)
        .await?
        .ok_or(CancelRegistrationError::UserNotFound(command.acting_user_id))?;

    if registration.student_id != acting_user.id && !acting_user.role.is_admin() {
        return Err(CancelRegistrationError::Forbidden);
    }

    let removed = store
        .remove_registration(registration.id)
        .await
        .map_err(|e| match e {
            StoreError::RegistrationNotFound(id) => CancelRegistrationError::NotFound(id),
            other => other.into(),
        })?;

    let seat_released = release_on_delete(removed.status) > 0;
    tracing::info!(seat_released, "Registration cancelled");

    Ok(CancelRegistrationResponse {
        id: removed.id,
        cancelled: true,
        seat_released,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewCourse, NewUser, RegistrationStatus, Role};
    use crate::store::memory::MemoryStore;
    use std::sync::Arc;

    struct Fixture {
        store: DynStore,
        course_id: Uuid,
        student_id: Uuid,
        registration_id: Uuid,
    }

    async fn fixture() -> Fixture {
        let store: DynStore = Arc::new(MemoryStore::new());
        let course = store
            .insert_course(NewCourse {
                code: "CS-101".to_string(),
                title: "Intro".to_string(),
                department: "CS".to_string(),
                level: 100,
                description: None,
                credit_hours: 3,
                total_seats: 2,
                available_seats: 2,
                schedule: vec![],
                prerequisites: vec![],
            })
            .await
            .unwrap();
        let student = store
            .insert_user(NewUser {
                roll_number: "21L-0001".to_string(),
                name: "Student".to_string(),
                password_hash: "$argon2id$test".to_string(),
                role: Role::Student,
            })
            .await
            .unwrap();
        let registration = store.admit(student.id, course.id).await.unwrap();
        Fixture {
            store,
            course_id: course.id,
            student_id: student.id,
            registration_id: registration.id,
        }
    }

    #[tokio::test]
    async fn student_cancels_own_registration_and_frees_the_seat() {
        let fx = fixture().await;

        let response = handle(
            fx.store.clone(),
            CancelRegistrationCommand {
                registration_id: fx.registration_id,
                acting_user_id: fx.student_id,
            },
        )
        .await
        .unwrap();

        assert!(response.cancelled);
        assert!(response.seat_released);
        assert_eq!(
            fx.store
                .course(fx.course_id)
                .await
                .unwrap()
                .unwrap()
                .available_seats,
            2
        );
        let student = fx.store.user(fx.student_id).await.unwrap().unwrap();
        assert!(student.registered_courses.is_empty());
    }

    #[tokio::test]
    async fn another_student_is_forbidden() {
        let fx = fixture().await;
        let other = fx
            .store
            .insert_user(NewUser {
                roll_number: "21L-0002".to_string(),
                name: "Other".to_string(),
                password_hash: "$argon2id$test".to_string(),
                role: Role::Student,
            })
            .await
            .unwrap();

        let result = handle(
            fx.store.clone(),
            CancelRegistrationCommand {
                registration_id: fx.registration_id,
                acting_user_id: other.id,
            },
        )
        .await;

        assert!(matches!(result, Err(CancelRegistrationError::Forbidden)));
        assert!(fx
            .store
            .registration(fx.registration_id)
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn admin_cancels_any_registration() {
        let fx = fixture().await;
        let admin = fx
            .store
            .insert_user(NewUser {
                roll_number: "admin".to_string(),
                name: "Admin".to_string(),
                password_hash: "$argon2id$test".to_string(),
                role: Role::Admin,
            })
            .await
            .unwrap();

        let response = handle(
            fx.store.clone(),
            CancelRegistrationCommand {
                registration_id: fx.registration_id,
                acting_user_id: admin.id,
            },
        )
        .await
        .unwrap();
        assert!(response.cancelled);
    }

    #[tokio::test]
    async fn cancelling_a_rejected_registration_keeps_seats() {
        let fx = fixture().await;
        fx.store
            .transition_status(fx.registration_id, RegistrationStatus::Rejected)
            .await
            .unwrap();
        let seats_before = fx
            .store
            .course(fx.course_id)
            .await
            .unwrap()
            .unwrap()
            .available_seats;

        let response = handle(
            fx.store.clone(),
            CancelRegistrationCommand {
                registration_id: fx.registration_id,
                acting_user_id: fx.student_id,
            },
        )
        .await
        .unwrap();

        assert!(!response.seat_released);
        assert_eq!(
            fx.store
                .course(fx.course_id)
                .await
                .unwrap()
                .unwrap()
                .available_seats,
            seats_before
        );
    }
}
