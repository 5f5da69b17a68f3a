//! Delete course command
//!
//! Course deletion cascades in one atomic store operation: registrations
//! referencing the course are removed (and pulled from their students'
//! lists), the course disappears from other courses' prerequisite lists, and
//! the course row itself goes last. A failure anywhere rolls the whole
//! cascade back.

use mediator::Request;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::store::{DynStore, RegistryStore, StoreError};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteCourseCommand {
    pub id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteCourseResponse {
    pub id: Uuid,
    pub deleted: bool,
    pub registrations_removed: u64,
    pub prerequisite_links_removed: u64,
}

#[derive(Debug, thiserror::Error)]
pub enum DeleteCourseError {
    #[error("Course {0} not found")]
    NotFound(Uuid),

    #[error("Course deletion failed and was rolled back")]
    DeletionFailed(#[source] StoreError),
}

impl Request<Result<DeleteCourseResponse, DeleteCourseError>> for DeleteCourseCommand {}

impl crate::cqrs::middleware::Command for DeleteCourseCommand {}

/// Handler for deleting courses
#[tracing::instrument(skip(store))]
pub async fn handle(
    store: DynStore,
    command: DeleteCourseCommand,
) -> Result<DeleteCourseResponse, DeleteCourseError> {
    let summary = store.delete_course(command.id).await.map_err(|e| match e {
        StoreError::CourseNotFound(id) => DeleteCourseError::NotFound(id),
        other => DeleteCourseError::DeletionFailed(other),
    })?;

    tracing::info!(
        course_id = %command.id,
        registrations_removed = summary.registrations_removed,
        prerequisite_links_removed = summary.prerequisite_links_removed,
        "Course deleted with cascade"
    );

    Ok(DeleteCourseResponse {
        id: command.id,
        deleted: true,
        registrations_removed: summary.registrations_removed,
        prerequisite_links_removed: summary.prerequisite_links_removed,
    })
}
