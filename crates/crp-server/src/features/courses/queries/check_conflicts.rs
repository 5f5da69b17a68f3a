//! Standalone schedule-conflict check
//!
//! Read-only preview of the advisory conflict scan: admins submit a proposed
//! schedule before saving and get back exactly the conflicts the save would
//! report. No side effects.

use mediator::Request;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::features::courses::conflicts;
use crate::features::courses::types::{parse_schedule, ConflictReport, SlotInput};
use crate::features::shared::ValidationError;
use crate::store::DynStore;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckConflictsQuery {
    pub schedule: Vec<SlotInput>,
    /// Skip this course when scanning (edit-in-place checks).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclude_course_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckConflictsResponse {
    pub conflicts: Vec<ConflictReport>,
}

#[derive(Debug, thiserror::Error)]
pub enum CheckConflictsError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl Request<Result<CheckConflictsResponse, CheckConflictsError>> for CheckConflictsQuery {}

impl crate::cqrs::middleware::Query for CheckConflictsQuery {}

/// Handler for the standalone conflict check
#[tracing::instrument(skip(store, query), fields(slot_count = query.schedule.len()))]
pub async fn handle(
    store: DynStore,
    query: CheckConflictsQuery,
) -> Result<CheckConflictsResponse, CheckConflictsError> {
    let slots = parse_schedule(&query.schedule)?;

    // Same soft-fail semantics as the embedded scan at create/update time.
    let conflicts = conflicts::advisory(&store, &slots, query.exclude_course_id).await;

    Ok(CheckConflictsResponse { conflicts })
}
