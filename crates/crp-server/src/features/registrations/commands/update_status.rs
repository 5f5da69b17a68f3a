//! Update registration status command (admin)
//!
//! Drives the state machine's admin transitions. The store captures the
//! status before overwriting it and applies the compensating seat adjustment
//! from that prior value: re-approving a rejected registration takes a seat,
//! rejecting an approved one frees it, everything else leaves seats alone.

use mediator::Request;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::registration::seat_delta;
use crate::models::RegistrationStatus;
use crate::store::{DynStore, RegistryStore, StoreError};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateRegistrationStatusCommand {
    /// Set from the request path, not the body.
    #[serde(skip)]
    pub registration_id: Uuid,
    pub status: RegistrationStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateRegistrationStatusResponse {
    pub id: Uuid,
    pub status: RegistrationStatus,
    pub previous_status: RegistrationStatus,
    /// Seat adjustment applied to the course (−1, 0, or +1)
    pub seat_adjustment: i32,
}

#[derive(Debug, thiserror::Error)]
pub enum UpdateRegistrationStatusError {
    #[error("Registration {0} not found")]
    NotFound(Uuid),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}

impl Request<Result<UpdateRegistrationStatusResponse, UpdateRegistrationStatusError>>
    for UpdateRegistrationStatusCommand
{
}

impl crate::cqrs::middleware::Command for UpdateRegistrationStatusCommand {}

/// Handler for admin status changes
#[tracing::instrument(
    skip(store),
    fields(registration_id = %command.registration_id, status = %command.status)
)]
pub async fn handle(
    store: DynStore,
    command: UpdateRegistrationStatusCommand,
) -> Result<UpdateRegistrationStatusResponse, UpdateRegistrationStatusError> {
    let outcome = store
        .transition_status(command.registration_id, command.status)
        .await
        .map_err(|e| match e {
            StoreError::RegistrationNotFound(id) => UpdateRegistrationStatusError::NotFound(id),
            other => other.into(),
        })?;

    let seat_adjustment = seat_delta(outcome.previous_status, outcome.registration.status);
    tracing::info!(
        previous_status = %outcome.previous_status,
        seat_adjustment,
        "Registration status updated"
    );

    Ok(UpdateRegistrationStatusResponse {
        id: outcome.registration.id,
        status: outcome.registration.status,
        previous_status: outcome.previous_status,
        seat_adjustment,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewCourse, NewUser, Role};
    use crate::store::memory::MemoryStore;
    use std::sync::Arc;

    async fn admitted_registration(store: &DynStore) -> (Uuid, Uuid) {
        let course = store
            .insert_course(NewCourse {
                code: "CS-101".to_string(),
                title: "Intro".to_string(),
                department: "CS".to_string(),
                level: 100,
                description: None,
                credit_hours: 3,
                total_seats: 1,
                available_seats: 1,
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
        (registration.id, course.id)
    }

    #[tokio::test]
    async fn reject_then_reapprove_moves_the_seat_both_ways() {
        let store: DynStore = Arc::new(MemoryStore::new());
        let (registration_id, course_id) = admitted_registration(&store).await;

        let rejected = handle(
            store.clone(),
            UpdateRegistrationStatusCommand {
                registration_id,
                status: RegistrationStatus::Rejected,
            },
        )
        .await
        .unwrap();
        assert_eq!(rejected.previous_status, RegistrationStatus::Approved);
        assert_eq!(rejected.seat_adjustment, 1);
        assert_eq!(
            store.course(course_id).await.unwrap().unwrap().available_seats,
            1
        );

        let approved = handle(
            store.clone(),
            UpdateRegistrationStatusCommand {
                registration_id,
                status: RegistrationStatus::Approved,
            },
        )
        .await
        .unwrap();
        assert_eq!(approved.seat_adjustment, -1);
        assert_eq!(
            store.course(course_id).await.unwrap().unwrap().available_seats,
            0
        );
    }

    #[tokio::test]
    async fn rewriting_the_same_status_is_neutral() {
        let store: DynStore = Arc::new(MemoryStore::new());
        let (registration_id, course_id) = admitted_registration(&store).await;

        let outcome = handle(
            store.clone(),
            UpdateRegistrationStatusCommand {
                registration_id,
                status: RegistrationStatus::Approved,
            },
        )
        .await
        .unwrap();

        assert_eq!(outcome.seat_adjustment, 0);
        assert_eq!(
            store.course(course_id).await.unwrap().unwrap().available_seats,
            0
        );
    }

    #[tokio::test]
    async fn missing_registration_reports_not_found() {
        let store: DynStore = Arc::new(MemoryStore::new());
        let result = handle(
            store,
            UpdateRegistrationStatusCommand {
                registration_id: Uuid::new_v4(),
                status: RegistrationStatus::Approved,
            },
        )
        .await;
        assert!(matches!(
            result,
            Err(UpdateRegistrationStatusError::NotFound(_))
        ));
    }
}
