//! Subscribe-to-course command
//!
//! Adds a user to a course's subscriber list once. Subscribers are cleared
//! when the last seat goes (the notification mark); no delivery happens here.

use mediator::Request;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::store::{DynStore, RegistryStore, StoreError};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscribeCommand {
    /// Set from the request path, not the body.
    #[serde(skip)]
    pub course_id: Uuid,
    pub user_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscribeResponse {
    pub course_id: Uuid,
    pub subscribed: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum SubscribeError {
    #[error("Course {0} not found")]
    CourseNotFound(Uuid),

    #[error("User {0} not found")]
    UserNotFound(Uuid),

    #[error("Already subscribed to this course")]
    AlreadySubscribed,

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}

impl Request<Result<SubscribeResponse, SubscribeError>> for SubscribeCommand {}

impl crate::cqrs::middleware::Command for SubscribeCommand {}

/// Handler for course subscriptions
#[tracing::instrument(skip(store), fields(course_id = %command.course_id, user_id = %command.user_id))]
pub async fn handle(
    store: DynStore,
    command: SubscribeCommand,
) -> Result<SubscribeResponse, SubscribeError> {
    store
        .subscribe(command.course_id, command.user_id)
        .await
        .map_err(|e| match e {
            StoreError::CourseNotFound(id) => SubscribeError::CourseNotFound(id),
            StoreError::UserNotFound(id) => SubscribeError::UserNotFound(id),
            StoreError::AlreadySubscribed => SubscribeError::AlreadySubscribed,
            other => other.into(),
        })?;

    Ok(SubscribeResponse {
        course_id: command.course_id,
        subscribed: true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewCourse, NewUser, Role};
    use crate::store::memory::MemoryStore;
    use crp_common::schedule::{TimeSlot, Weekday};
    use std::sync::Arc;

    async fn setup(store: &DynStore) -> (Uuid, Uuid) {
        let course = store
            .insert_course(NewCourse {
                code: "CS-101".to_string(),
                title: "Intro".to_string(),
                department: "CS".to_string(),
                level: 100,
                description: None,
                credit_hours: 3,
                total_seats: 1,
                available_seats: 0,
                schedule: vec![TimeSlot::new(Weekday::Mon, "10:00", "11:00", "A-1").unwrap()],
                prerequisites: vec![],
            })
            .await
            .unwrap();
        let user = store
            .insert_user(NewUser {
                roll_number: "21L-0001".to_string(),
                name: "Student".to_string(),
                password_hash: "$argon2id$test".to_string(),
                role: Role::Student,
            })
            .await
            .unwrap();
        (course.id, user.id)
    }

    #[tokio::test]
    async fn subscribes_once() {
        let store: DynStore = Arc::new(MemoryStore::new());
        let (course_id, user_id) = setup(&store).await;

        let response = handle(store.clone(), SubscribeCommand { course_id, user_id })
            .await
            .unwrap();
        assert!(response.subscribed);

        let again = handle(store, SubscribeCommand { course_id, user_id }).await;
        assert!(matches!(again, Err(SubscribeError::AlreadySubscribed)));
    }

    #[tokio::test]
    async fn unknown_course_or_user_is_reported() {
        let store: DynStore = Arc::new(MemoryStore::new());
        let (course_id, user_id) = setup(&store).await;

        assert!(matches!(
            handle(
                store.clone(),
                SubscribeCommand {
                    course_id: Uuid::new_v4(),
                    user_id
                }
            )
            .await,
            Err(SubscribeError::CourseNotFound(_))
        ));
        assert!(matches!(
            handle(
                store,
                SubscribeCommand {
                    course_id,
                    user_id: Uuid::new_v4()
                }
            )
            .await,
            Err(SubscribeError::UserNotFound(_))
        ));
    }
}
