//! Course catalog model
//!
//! A course owns its weekly schedule, its prerequisite references, and the
//! seat counters the registration state machine maintains. `available_seats`
//! is never written directly by callers; it moves through registration
//! transitions or through the admin total-seats edit, which re-derives it by
//! the delta rule in [`rederive_available_seats`].

use chrono::{DateTime, Utc};
use crp_common::schedule::TimeSlot;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A catalog course
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Course {
    pub id: Uuid,
    /// Unique code in `DEPT-NNN` form (e.g. `CS-101`)
    pub code: String,
    pub title: String,
    pub department: String,
    pub level: i32,
    pub description: Option<String>,
    pub credit_hours: i32,
    pub total_seats: i32,
    /// Invariant: `0 <= available_seats <= total_seats`
    pub available_seats: i32,
    pub schedule: Vec<TimeSlot>,
    pub prerequisites: Vec<Uuid>,
    pub subscribers: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl Course {
    pub fn summary(&self) -> CourseSummary {
        CourseSummary {
            id: self.id,
            code: self.code.clone(),
            title: self.title.clone(),
        }
    }

    /// Apply an allow-listed patch in place
    ///
    /// A `total_seats` change re-derives `available_seats` from the capacity
    /// delta, clamped into `[0, new_total]`. Both storage backends apply
    /// patches through this one function so the rule cannot drift.
    pub fn apply_patch(&mut self, patch: CoursePatch) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(department) = patch.department {
            self.department = department;
        }
        if let Some(level) = patch.level {
            self.level = level;
        }
        if let Some(description) = patch.description {
            self.description = Some(description);
        }
        if let Some(credit_hours) = patch.credit_hours {
            self.credit_hours = credit_hours;
        }
        if let Some(new_total) = patch.total_seats {
            self.available_seats =
                rederive_available_seats(self.available_seats, self.total_seats, new_total);
            self.total_seats = new_total;
        }
        if let Some(schedule) = patch.schedule {
            self.schedule = schedule;
        }
        if let Some(prerequisites) = patch.prerequisites {
            self.prerequisites = prerequisites;
        }
    }
}

/// Compact course reference used in listings, prerequisite detail, and
/// conflict reports
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseSummary {
    pub id: Uuid,
    pub code: String,
    pub title: String,
}

/// Input for creating a course (already validated by the command layer)
#[derive(Debug, Clone)]
pub struct NewCourse {
    pub code: String,
    pub title: String,
    pub department: String,
    pub level: i32,
    pub description: Option<String>,
    pub credit_hours: i32,
    pub total_seats: i32,
    pub available_seats: i32,
    pub schedule: Vec<TimeSlot>,
    pub prerequisites: Vec<Uuid>,
}

/// Allow-listed course patch
///
/// `code` and `available_seats` are deliberately absent: codes are immutable
/// identity and seat counters only move through registration transitions or
/// the `total_seats` delta rule.
#[derive(Debug, Clone, Default)]
pub struct CoursePatch {
    pub title: Option<String>,
    pub department: Option<String>,
    pub level: Option<i32>,
    pub description: Option<String>,
    pub credit_hours: Option<i32>,
    pub total_seats: Option<i32>,
    pub schedule: Option<Vec<TimeSlot>>,
    pub prerequisites: Option<Vec<Uuid>>,
}

impl CoursePatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.department.is_none()
            && self.level.is_none()
            && self.description.is_none()
            && self.credit_hours.is_none()
            && self.total_seats.is_none()
            && self.schedule.is_none()
            && self.prerequisites.is_none()
    }
}

/// Re-derive `available_seats` after an admin capacity edit
///
/// The new value follows the capacity delta (`new_total - old_total`) and is
/// clamped into `[0, new_total]` so the seat invariant holds even when
/// capacity shrinks below the currently taken seats.
pub fn rederive_available_seats(available: i32, old_total: i32, new_total: i32) -> i32 {
    (available + (new_total - old_total)).clamp(0, new_total)
}
