//! Update course command
//!
//! Applies an allow-listed partial update. The request body rejects unknown
//! fields, so the dynamic assign-anything edit pattern is impossible by
//! construction: `code` is immutable identity and `available_seats` can only
//! move through registration transitions or the `total_seats` delta rule.

use crp_common::schedule::TimeSlot;
use mediator::Request;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::features::courses::conflicts;
use crate::features::courses::types::{
    course_detail, parse_schedule, ConflictReport, CourseDetail, SlotInput,
};
use crate::features::shared::{validate_positive, ValidationError};
use crate::models::CoursePatch;
use crate::store::{DynStore, RegistryStore, StoreError};

/// Command to partially update an existing course
///
/// Unknown fields fail deserialization; only the fields below may change.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateCourseCommand {
    /// Set from the request path, not the body.
    #[serde(skip)]
    pub id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credit_hours: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_seats: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schedule: Option<Vec<SlotInput>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prerequisites: Option<Vec<Uuid>>,
}

/// Response from updating a course
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateCourseResponse {
    pub course: CourseDetail,
    /// Advisory conflicts for a changed schedule, excluding the course itself
    pub conflicts: Vec<ConflictReport>,
}

/// Errors that can occur when updating a course
#[derive(Debug, thiserror::Error)]
pub enum UpdateCourseError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Course {0} not found")]
    NotFound(Uuid),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}

impl Request<Result<UpdateCourseResponse, UpdateCourseError>> for UpdateCourseCommand {}

impl crate::cqrs::middleware::Command for UpdateCourseCommand {}

impl UpdateCourseCommand {
    /// Validates the command and returns the parsed schedule, if one was
    /// submitted
    ///
    /// # Errors
    ///
    /// - `NoFieldsToUpdate` - every patchable field was absent
    /// - `Required` - a provided text field was empty
    /// - `NonPositive` - a provided numeric field was not positive
    /// - `SelfPrerequisite` - the course listed itself as a prerequisite
    /// - `SlotIncomplete` / `UnknownDay` / `Slot` - malformed schedule entry
    pub fn validate(&self) -> Result<Option<Vec<TimeSlot>>, ValidationError> {
        if self.title.is_none()
            && self.department.is_none()
            && self.level.is_none()
            && self.description.is_none()
            && self.credit_hours.is_none()
            && self.total_seats.is_none()
            && self.schedule.is_none()
            && self.prerequisites.is_none()
        {
            return Err(ValidationError::NoFieldsToUpdate);
        }

        if let Some(ref title) = self.title {
            crate::features::shared::validate_required("Title", title)?;
        }
        if let Some(ref department) = self.department {
            crate::features::shared::validate_required("Department", department)?;
        }
        if let Some(level) = self.level {
            validate_positive("Level", level)?;
        }
        if let Some(credit_hours) = self.credit_hours {
            validate_positive("Credit hours", credit_hours)?;
        }
        if let Some(total_seats) = self.total_seats {
            validate_positive("Total seats", total_seats)?;
        }
        if let Some(ref prerequisites) = self.prerequisites {
            if prerequisites.contains(&self.id) {
                return Err(ValidationError::SelfPrerequisite);
            }
        }

        match self.schedule {
            Some(ref slots) => Ok(Some(parse_schedule(slots)?)),
            None => Ok(None),
        }
    }
}

/// Handler for updating courses
#[tracing::instrument(skip(store, command), fields(course_id = %command.id))]
pub async fn handle(
    store: DynStore,
    command: UpdateCourseCommand,
) -> Result<UpdateCourseResponse, UpdateCourseError> {
    let schedule = command.validate()?;

    // A schedule change gets the advisory scan, excluding this course so its
    // current slots cannot conflict with their own replacement.
    let conflicts = match schedule {
        Some(ref slots) => conflicts::advisory(&store, slots, Some(command.id)).await,
        None => Vec::new(),
    };

    let patch = CoursePatch {
        title: command.title,
        department: command.department,
        level: command.level,
        description: command.description,
        credit_hours: command.credit_hours,
        total_seats: command.total_seats,
        schedule,
        prerequisites: command.prerequisites,
    };

    let course = store
        .update_course(command.id, patch)
        .await
        .map_err(|e| match e {
            StoreError::CourseNotFound(id) => UpdateCourseError::NotFound(id),
            other => other.into(),
        })?;

    tracing::info!(course_code = %course.code, "Course updated");

    let course = course_detail(&store, course).await?;
    Ok(UpdateCourseResponse { course, conflicts })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::courses::commands::create::{self, CreateCourseCommand};
    use crate::store::memory::MemoryStore;
    use std::sync::Arc;

    fn create_fixture(code: &str, total_seats: i32) -> CreateCourseCommand {
        CreateCourseCommand {
            code: code.to_string(),
            title: format!("{code} title"),
            department: "CS".to_string(),
            level: 100,
            description: None,
            credit_hours: 3,
            total_seats,
            available_seats: None,
            schedule: vec![SlotInput {
                day: "Mon".to_string(),
                start_time: "10:00".to_string(),
                end_time: "11:00".to_string(),
                room: "A-1".to_string(),
            }],
            prerequisites: vec![],
        }
    }

    fn empty_patch(id: Uuid) -> UpdateCourseCommand {
        UpdateCourseCommand {
            id,
            title: None,
            department: None,
            level: None,
            description: None,
            credit_hours: None,
            total_seats: None,
            schedule: None,
            prerequisites: None,
        }
    }

    #[test]
    fn empty_patch_is_rejected() {
        assert!(matches!(
            empty_patch(Uuid::new_v4()).validate(),
            Err(ValidationError::NoFieldsToUpdate)
        ));
    }

    #[test]
    fn self_prerequisite_is_rejected() {
        let id = Uuid::new_v4();
        let mut cmd = empty_patch(id);
        cmd.prerequisites = Some(vec![id]);
        assert!(matches!(
            cmd.validate(),
            Err(ValidationError::SelfPrerequisite)
        ));
    }

    #[test]
    fn unknown_fields_fail_deserialization() {
        let result: Result<UpdateCourseCommand, _> =
            serde_json::from_value(serde_json::json!({ "available_seats": 99 }));
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn capacity_change_rederives_available_seats() {
        let store: DynStore = Arc::new(MemoryStore::new());
        let created = create::handle(store.clone(), create_fixture("CS-101", 10))
            .await
            .unwrap();

        let mut cmd = empty_patch(created.course.id);
        cmd.total_seats = Some(12);
        let response = handle(store, cmd).await.unwrap();

        assert_eq!(response.course.total_seats, 12);
        assert_eq!(response.course.available_seats, 12);
    }

    #[tokio::test]
    async fn schedule_change_reports_conflicts_excluding_self() {
        let store: DynStore = Arc::new(MemoryStore::new());
        let first = create::handle(store.clone(), create_fixture("CS-101", 10))
            .await
            .unwrap();
        let second = create::handle(store.clone(), {
            let mut cmd = create_fixture("CS-102", 10);
            cmd.schedule[0].day = "Tue".to_string();
            cmd
        })
        .await
        .unwrap();

        // Move CS-102 onto CS-101's Monday slot; its own old slot must not
        // count against it.
        let mut cmd = empty_patch(second.course.id);
        cmd.schedule = Some(vec![SlotInput {
            day: "Mon".to_string(),
            start_time: "10:30".to_string(),
            end_time: "11:30".to_string(),
            room: "A-1".to_string(),
        }]);
        let response = handle(store, cmd).await.unwrap();

        assert_eq!(response.conflicts.len(), 1);
        assert_eq!(response.conflicts[0].course.id, first.course.id);
        assert_eq!(response.course.schedule[0].day, crp_common::schedule::Weekday::Mon);
    }

    #[tokio::test]
    async fn missing_course_reports_not_found() {
        let store: DynStore = Arc::new(MemoryStore::new());
        let mut cmd = empty_patch(Uuid::new_v4());
        cmd.title = Some("New title".to_string());
        assert!(matches!(
            handle(store, cmd).await,
            Err(UpdateCourseError::NotFound(_))
        ));
    }
}
