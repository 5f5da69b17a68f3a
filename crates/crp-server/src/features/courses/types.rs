//! Wire types shared by the course commands and queries

use chrono::{DateTime, Utc};
use crp_common::schedule::{SlotError, TimeSlot, Weekday};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::features::shared::ValidationError;
use crate::models::{Course, CourseSummary};
use crate::store::{DynStore, RegistryStore, StoreError};

/// A schedule slot as submitted by clients
///
/// Times arrive as `"HH:MM"` strings and the day as a name; parsing into the
/// canonical [`TimeSlot`] happens at validation time so malformed input
/// surfaces as a [`ValidationError`], not a deserialization failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotInput {
    #[serde(default)]
    pub day: String,
    #[serde(default)]
    pub start_time: String,
    #[serde(default)]
    pub end_time: String,
    #[serde(default)]
    pub room: String,
}

impl SlotInput {
    pub fn parse(&self) -> Result<TimeSlot, ValidationError> {
        if self.day.trim().is_empty()
            || self.start_time.trim().is_empty()
            || self.end_time.trim().is_empty()
            || self.room.trim().is_empty()
        {
            return Err(ValidationError::SlotIncomplete);
        }

        let day: Weekday = self
            .day
            .parse()
            .map_err(|_| ValidationError::UnknownDay(self.day.clone()))?;

        TimeSlot::new(day, &self.start_time, &self.end_time, &self.room).map_err(|e| match e {
            SlotError::RoomRequired => ValidationError::SlotIncomplete,
            other => ValidationError::Slot(other.to_string()),
        })
    }
}

/// Parse a submitted schedule into canonical slots
pub fn parse_schedule(slots: &[SlotInput]) -> Result<Vec<TimeSlot>, ValidationError> {
    slots.iter().map(SlotInput::parse).collect()
}

/// Full course representation returned by the API, with prerequisite
/// references resolved to summaries
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseDetail {
    pub id: Uuid,
    pub code: String,
    pub title: String,
    pub department: String,
    pub level: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub credit_hours: i32,
    pub total_seats: i32,
    pub available_seats: i32,
    pub schedule: Vec<TimeSlot>,
    pub prerequisites: Vec<CourseSummary>,
    pub subscriber_count: usize,
    pub created_at: DateTime<Utc>,
}

/// Resolve a course's prerequisite summaries and build its API detail
pub async fn course_detail(store: &DynStore, course: Course) -> Result<CourseDetail, StoreError> {
    let prerequisites = if course.prerequisites.is_empty() {
        Vec::new()
    } else {
        store
            .courses_by_ids(&course.prerequisites)
            .await?
            .iter()
            .map(Course::summary)
            .collect()
    };

    Ok(CourseDetail {
        id: course.id,
        code: course.code,
        title: course.title,
        department: course.department,
        level: course.level,
        description: course.description,
        credit_hours: course.credit_hours,
        total_seats: course.total_seats,
        available_seats: course.available_seats,
        schedule: course.schedule,
        prerequisites,
        subscriber_count: course.subscribers.len(),
        created_at: course.created_at,
    })
}

/// One advisory conflict: an existing course slot sharing day and room with a
/// candidate slot, with overlapping times
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConflictReport {
    pub course: CourseSummary,
    pub day: Weekday,
    pub room: String,
    /// Time range of the existing course's slot (`"HH:MM-HH:MM"`)
    pub existing_time: String,
    /// Time range of the submitted slot
    pub candidate_time: String,
}
