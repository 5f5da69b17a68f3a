//! Student profile query
//!
//! Profile with registrations populated. Goes through the same
//! orphan-filtering path as the registration listings, so a profile read also
//! triggers the background sweep.

use chrono::{DateTime, Utc};
use mediator::Request;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::features::registrations::sweep;
use crate::models::{CourseSummary, RegistrationStatus, Role};
use crate::store::{DynStore, RegistrationScope, RegistryStore, StoreError};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetStudentQuery {
    pub id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentRegistrationItem {
    pub id: Uuid,
    pub status: RegistrationStatus,
    pub registered_at: DateTime<Utc>,
    pub course: CourseSummary,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentProfile {
    pub id: Uuid,
    pub roll_number: String,
    pub name: String,
    pub role: Role,
    pub registrations: Vec<StudentRegistrationItem>,
}

#[derive(Debug, thiserror::Error)]
pub enum GetStudentError {
    #[error("User {0} not found")]
    NotFound(Uuid),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}

impl Request<Result<StudentProfile, GetStudentError>> for GetStudentQuery {}

impl crate::cqrs::middleware::Query for GetStudentQuery {}

/// Handler for the student profile
#[tracing::instrument(skip(store))]
pub async fn handle(store: DynStore, query: GetStudentQuery) -> Result<StudentProfile, GetStudentError> {
    let user = store
        .user(query.id)
        .await?
        .ok_or(GetStudentError::NotFound(query.id))?;

    let records = store
        .list_registrations(RegistrationScope::Student(user.id))
        .await?;
    let (resolvable, orphans) = sweep::partition_orphans(records);
    sweep::spawn_orphan_sweep(store.clone(), orphans);

    let registrations = resolvable
        .into_iter()
        .filter_map(|record| {
            let course = record.course?;
            Some(StudentRegistrationItem {
                id: record.registration.id,
                status: record.registration.status,
                registered_at: record.registration.registered_at,
                course,
            })
        })
        .collect();

    Ok(StudentProfile {
        id: user.id,
        roll_number: user.roll_number,
        name: user.name,
        role: user.role,
        registrations,
    })
}
