//! List registrations query
//!
//! Admin-wide or per-student listings with student and course summaries
//! attached. Rows whose course no longer resolves are filtered out of the
//! response and swept in the background — the self-healing pass for
//! registrations orphaned outside the deletion cascade.

use chrono::{DateTime, Utc};
use mediator::Request;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::features::registrations::sweep;
use crate::models::{CourseSummary, RegistrationStatus};
use crate::store::{DynStore, RegistrationScope, RegistryStore, StoreError, StudentSummary};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListRegistrationsQuery {
    /// Restrict to one student's registrations.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrationListItem {
    pub id: Uuid,
    pub status: RegistrationStatus,
    pub registered_at: DateTime<Utc>,
    pub student: StudentSummary,
    pub course: CourseSummary,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListRegistrationsResponse {
    pub items: Vec<RegistrationListItem>,
}

#[derive(Debug, thiserror::Error)]
pub enum ListRegistrationsError {
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}

impl Request<Result<ListRegistrationsResponse, ListRegistrationsError>>
    for ListRegistrationsQuery
{
}

impl crate::cqrs::middleware::Query for ListRegistrationsQuery {}

/// Handler for registration listings
#[tracing::instrument(skip(store), fields(student_id = ?query.student_id))]
pub async fn handle(
    store: DynStore,
    query: ListRegistrationsQuery,
) -> Result<ListRegistrationsResponse, ListRegistrationsError> {
    let scope = match query.student_id {
        Some(student_id) => RegistrationScope::Student(student_id),
        None => RegistrationScope::All,
    };

    let records = store.list_registrations(scope).await?;
    let (resolvable, orphans) = sweep::partition_orphans(records);
    sweep::spawn_orphan_sweep(store.clone(), orphans);

    let items = resolvable
        .into_iter()
        .filter_map(|record| {
            let course = record.course?;
            Some(RegistrationListItem {
                id: record.registration.id,
                status: record.registration.status,
                registered_at: record.registration.registered_at,
                student: record.student,
                course,
            })
        })
        .collect();

    Ok(ListRegistrationsResponse { items })
}
