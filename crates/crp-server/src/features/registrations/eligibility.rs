//! Eligibility engine
//!
//! Pure decision logic for a registration attempt. The command layer loads a
//! snapshot of everything the decision needs, [`evaluate`] runs the checks in
//! a fixed order with no side effects, and only a fully eligible attempt
//! proceeds to the store's atomic admit operation (which re-enforces the
//! seat and duplicate rules at commit).
//!
//! Check order, first failure wins:
//!
//! 1. seats available
//! 2. not already registered for the course
//! 3. no overlap with the student's own approved schedule — day and time
//!    only; unlike the room-level admin check, two courses conflict for a
//!    student regardless of where they meet
//! 4. all prerequisites completed (approved registration for each)

use std::collections::HashSet;

use crp_common::schedule::Weekday;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Course, CourseSummary};
use crate::store::Enrollment;

/// Everything the eligibility decision reads, loaded up front
#[derive(Debug)]
pub struct EligibilitySnapshot {
    /// The course the student wants to register for.
    pub course: Course,
    /// Whether a registration for (student, course) already exists in any
    /// status.
    pub already_registered: bool,
    /// The student's approved registrations with their courses populated.
    pub enrollments: Vec<Enrollment>,
    /// Summaries for the candidate course's prerequisites that still resolve.
    pub prerequisite_courses: Vec<CourseSummary>,
}

/// Detail of a personal schedule clash
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConflictDetail {
    /// The already-enrolled course the attempt collides with.
    pub course: CourseSummary,
    pub day: Weekday,
    /// Time range of the enrolled course's slot (`"HH:MM-HH:MM"`)
    pub existing_time: String,
    /// Time range of the candidate course's slot
    pub candidate_time: String,
}

/// Why a registration attempt is ineligible
#[derive(Debug, thiserror::Error)]
pub enum EligibilityError {
    #[error("No seats available for this course")]
    NoSeatsAvailable,

    #[error("Already registered for this course")]
    AlreadyRegistered,

    #[error("Schedule conflict with {} on {}", .0.course.code, .0.day)]
    ScheduleConflict(ScheduleConflictDetail),

    #[error("Prerequisite requirements not met")]
    PrerequisitesNotMet { unmet: Vec<CourseSummary> },
}

/// Run the eligibility checks over a snapshot
pub fn evaluate(snapshot: &EligibilitySnapshot) -> Result<(), EligibilityError> {
    if snapshot.course.available_seats <= 0 {
        return Err(EligibilityError::NoSeatsAvailable);
    }

    if snapshot.already_registered {
        return Err(EligibilityError::AlreadyRegistered);
    }

    for enrollment in &snapshot.enrollments {
        for candidate in &snapshot.course.schedule {
            for existing in &enrollment.course.schedule {
                if candidate.clashes_with(existing) {
                    return Err(EligibilityError::ScheduleConflict(ScheduleConflictDetail {
                        course: enrollment.course.summary(),
                        day: candidate.day,
                        existing_time: existing.time_range(),
                        candidate_time: candidate.time_range(),
                    }));
                }
            }
        }
    }

    if !snapshot.course.prerequisites.is_empty() {
        let completed: HashSet<Uuid> = snapshot
            .enrollments
            .iter()
            .map(|e| e.course.id)
            .collect();

        let unmet_ids: Vec<Uuid> = snapshot
            .course
            .prerequisites
            .iter()
            .copied()
            .filter(|prereq| !completed.contains(prereq))
            .collect();

        if !unmet_ids.is_empty() {
            // Summaries exist only for prerequisites that still resolve; an
            // unresolvable prerequisite still gates the attempt.
            let unmet = snapshot
                .prerequisite_courses
                .iter()
                .filter(|summary| unmet_ids.contains(&summary.id))
                .cloned()
                .collect();
            return Err(EligibilityError::PrerequisitesNotMet { unmet });
        }
    }

    Ok(())
}
