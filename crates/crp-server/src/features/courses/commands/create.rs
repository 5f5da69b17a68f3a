//! Create course command
//!
//! Validates the submitted course, runs the advisory schedule-conflict scan,
//! and writes the course. Conflicts are reported in the response but never
//! block the write; the admin decides whether a double-booked room is
//! intentional.

use crp_common::schedule::TimeSlot;
use mediator::Request;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::features::courses::conflicts;
use crate::features::courses::types::{
    course_detail, parse_schedule, ConflictReport, CourseDetail, SlotInput,
};
use crate::features::shared::{
    validate_course_code, validate_positive, validate_required, ValidationError,
};
use crate::models::NewCourse;
use crate::store::{DynStore, RegistryStore, StoreError};

/// Command to create a new course
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCourseCommand {
    /// Unique code in `DEPT-NNN` form
    pub code: String,
    pub title: String,
    pub department: String,
    pub level: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub credit_hours: i32,
    pub total_seats: i32,
    /// Defaults to `total_seats` when omitted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available_seats: Option<i32>,
    #[serde(default)]
    pub schedule: Vec<SlotInput>,
    #[serde(default)]
    pub prerequisites: Vec<Uuid>,
}

/// Response from creating a course
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCourseResponse {
    pub course: CourseDetail,
    /// Advisory room conflicts detected against the existing catalog
    pub conflicts: Vec<ConflictReport>,
}

/// Errors that can occur when creating a course
#[derive(Debug, thiserror::Error)]
pub enum CreateCourseError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("A course with code '{0}' already exists")]
    DuplicateCode(String),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}

impl Request<Result<CreateCourseResponse, CreateCourseError>> for CreateCourseCommand {}

impl crate::cqrs::middleware::Command for CreateCourseCommand {}

impl CreateCourseCommand {
    /// Validates the command and returns the parsed canonical schedule
    ///
    /// # Errors
    ///
    /// - `Required` - code, title, or department missing
    /// - `CodeFormat` - code does not match `DEPT-NNN`
    /// - `NonPositive` - level, credit hours, or total seats not positive
    /// - `AvailableNegative` / `AvailableExceedsTotal` - explicit seat count
    ///   outside `[0, total_seats]`
    /// - `SlotIncomplete` / `UnknownDay` / `Slot` - malformed schedule entry
    pub fn validate(&self) -> Result<Vec<TimeSlot>, ValidationError> {
        validate_course_code(&self.code)?;
        validate_required("Title", &self.title)?;
        validate_required("Department", &self.department)?;
        validate_positive("Level", self.level)?;
        validate_positive("Credit hours", self.credit_hours)?;
        validate_positive("Total seats", self.total_seats)?;

        if let Some(available) = self.available_seats {
            if available < 0 {
                return Err(ValidationError::AvailableNegative);
            }
            if available > self.total_seats {
                return Err(ValidationError::AvailableExceedsTotal);
            }
        }

        parse_schedule(&self.schedule)
    }
}

/// Handler for creating courses
#[tracing::instrument(
    skip(store, command),
    fields(code = %command.code, title = %command.title)
)]
pub async fn handle(
    store: DynStore,
    command: CreateCourseCommand,
) -> Result<CreateCourseResponse, CreateCourseError> {
    let schedule = command.validate()?;

    // Advisory only: detected conflicts ride along in the response.
    let conflicts = conflicts::advisory(&store, &schedule, None).await;
    if !conflicts.is_empty() {
        tracing::info!(
            conflict_count = conflicts.len(),
            "Course creation proceeding with schedule conflicts"
        );
    }

    let course = store
        .insert_course(NewCourse {
            code: command.code.clone(),
            title: command.title,
            department: command.department,
            level: command.level,
            description: command.description,
            credit_hours: command.credit_hours,
            total_seats: command.total_seats,
            available_seats: command.available_seats.unwrap_or(command.total_seats),
            schedule,
            prerequisites: command.prerequisites,
        })
        .await
        .map_err(|e| match e {
            StoreError::DuplicateCourseCode(code) => CreateCourseError::DuplicateCode(code),
            other => other.into(),
        })?;

    tracing::info!(course_id = %course.id, course_code = %course.code, "Course created");

    let course = course_detail(&store, course).await?;
    Ok(CreateCourseResponse { course, conflicts })
}
