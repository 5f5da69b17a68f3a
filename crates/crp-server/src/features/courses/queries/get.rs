//! Get course query

use mediator::Request;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::features::courses::types::{course_detail, CourseDetail};
use crate::store::{DynStore, RegistryStore, StoreError};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetCourseQuery {
    pub id: Uuid,
}

#[derive(Debug, thiserror::Error)]
pub enum GetCourseError {
    #[error("Course {0} not found")]
    NotFound(Uuid),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}

impl Request<Result<CourseDetail, GetCourseError>> for GetCourseQuery {}

impl crate::cqrs::middleware::Query for GetCourseQuery {}

/// Handler for fetching one course with prerequisites resolved
#[tracing::instrument(skip(store))]
pub async fn handle(store: DynStore, query: GetCourseQuery) -> Result<CourseDetail, GetCourseError> {
    let course = store
        .course(query.id)
        .await?
        .ok_or(GetCourseError::NotFound(query.id))?;
    Ok(course_detail(&store, course).await?)
}
