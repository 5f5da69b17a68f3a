//! Register-for-course command
//!
//! Loads the eligibility snapshot, runs the engine, and on success performs
//! the atomic admission: approved registration created, one seat taken, the
//! registration mirrored into the student's list — all or nothing. The store
//! re-enforces the seat and duplicate rules at commit, so a race that slips
//! past the snapshot still comes back as the right business error instead of
//! an oversold course.

use mediator::Request;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::features::registrations::eligibility::{
    self, EligibilityError, EligibilitySnapshot,
};
use crate::models::{Course, RegistrationStatus};
use crate::store::{DynStore, RegistryStore, StoreError};

/// Command for a student registering for a course
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterCommand {
    pub student_id: Uuid,
    pub course_id: Uuid,
}

/// Response from a successful registration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub id: Uuid,
    pub student_id: Uuid,
    pub course_id: Uuid,
    pub status: RegistrationStatus,
    pub registered_at: chrono::DateTime<chrono::Utc>,
}

/// Errors that can occur when registering
#[derive(Debug, thiserror::Error)]
pub enum RegisterError {
    #[error("Student {0} not found")]
    StudentNotFound(Uuid),

    #[error("Course {0} not found")]
    CourseNotFound(Uuid),

    #[error(transparent)]
    Ineligible(#[from] EligibilityError),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}

impl Request<Result<RegisterResponse, RegisterError>> for RegisterCommand {}

impl crate::cqrs::middleware::Command for RegisterCommand {}

/// Handler for registration attempts
#[tracing::instrument(
    skip(store),
    fields(student_id = %command.student_id, course_id = %command.course_id)
)]
pub async fn handle(
    store: DynStore,
    command: RegisterCommand,
) -> Result<RegisterResponse, RegisterError> {
    let student = store
        .user(command.student_id)
        .await?
        .ok_or(RegisterError::StudentNotFound(command.student_id))?;
    let course = store
        .course(command.course_id)
        .await?
        .ok_or(RegisterError::CourseNotFound(command.course_id))?;

    let snapshot = load_snapshot(&store, student.id, course).await?;
    eligibility::evaluate(&snapshot)?;

    let registration = store
        .admit(student.id, snapshot.course.id)
        .await
        .map_err(|e| match e {
            // Lost a race between the snapshot and the commit; report the
            // same business error the snapshot check would have.
            StoreError::SeatsExhausted => EligibilityError::NoSeatsAvailable.into(),
            StoreError::DuplicateRegistration => EligibilityError::AlreadyRegistered.into(),
            StoreError::CourseNotFound(id) => RegisterError::CourseNotFound(id),
            StoreError::UserNotFound(id) => RegisterError::StudentNotFound(id),
            other => other.into(),
        })?;

    tracing::info!(
        registration_id = %registration.id,
        course_code = %snapshot.course.code,
        "Registration admitted"
    );

    Ok(RegisterResponse {
        id: registration.id,
        student_id: registration.student_id,
        course_id: registration.course_id,
        status: registration.status,
        registered_at: registration.registered_at,
    })
}

async fn load_snapshot(
    store: &DynStore,
    student_id: Uuid,
    course: Course,
) -> Result<EligibilitySnapshot, StoreError> {
    let already_registered = store.registration_exists(student_id, course.id).await?;
    let enrollments = store.approved_enrollments(student_id).await?;
    let prerequisite_courses = if course.prerequisites.is_empty() {
        Vec::new()
    } else {
        store
            .courses_by_ids(&course.prerequisites)
            .await?
            .iter()
            .map(Course::summary)
            .collect()
    };

    Ok(EligibilitySnapshot {
        course,
        already_registered,
        enrollments,
        prerequisite_courses,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewCourse, NewUser, Role};
    use crate::store::memory::MemoryStore;
    use crp_common::schedule::{TimeSlot, Weekday};
    use std::sync::Arc;

    fn new_course(code: &str, seats: i32, slots: Vec<TimeSlot>, prereqs: Vec<Uuid>) -> NewCourse {
        NewCourse {
            code: code.to_string(),
            title: format!("{code} title"),
            department: "CS".to_string(),
            level: 100,
            description: None,
            credit_hours: 3,
            total_seats: seats.max(1),
            available_seats: seats,
            schedule: slots,
            prerequisites: prereqs,
        }
    }

    async fn student(store: &DynStore, roll: &str) -> Uuid {
        store
            .insert_user(NewUser {
                roll_number: roll.to_string(),
                name: format!("Student {roll}"),
                password_hash: "$argon2id$test".to_string(),
                role: Role::Student,
            })
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn admits_and_decrements_seats() {
        let store: DynStore = Arc::new(MemoryStore::new());
        let course = store
            .insert_course(new_course("CS-101", 2, vec![], vec![]))
            .await
            .unwrap();
        let student_id = student(&store, "21L-0001").await;

        let response = handle(
            store.clone(),
            RegisterCommand {
                student_id,
                course_id: course.id,
            },
        )
        .await
        .unwrap();

        assert_eq!(response.status, RegistrationStatus::Approved);
        assert_eq!(
            store.course(course.id).await.unwrap().unwrap().available_seats,
            1
        );
    }

    #[tokio::test]
    async fn second_attempt_is_a_duplicate() {
        let store: DynStore = Arc::new(MemoryStore::new());
        let course = store
            .insert_course(new_course("CS-101", 5, vec![], vec![]))
            .await
            .unwrap();
        let student_id = student(&store, "21L-0001").await;
        let command = RegisterCommand {
            student_id,
            course_id: course.id,
        };

        handle(store.clone(), command.clone()).await.unwrap();
        let second = handle(store.clone(), command).await;

        assert!(matches!(
            second,
            Err(RegisterError::Ineligible(
                EligibilityError::AlreadyRegistered
            ))
        ));
        // Exactly one registration exists.
        assert_eq!(
            store.course(course.id).await.unwrap().unwrap().available_seats,
            4
        );
    }

    #[tokio::test]
    async fn full_course_never_creates_a_registration() {
        let store: DynStore = Arc::new(MemoryStore::new());
        let course = store
            .insert_course(new_course("CS-101", 0, vec![], vec![]))
            .await
            .unwrap();
        let student_id = student(&store, "21L-0001").await;

        let result = handle(
            store.clone(),
            RegisterCommand {
                student_id,
                course_id: course.id,
            },
        )
        .await;

        assert!(matches!(
            result,
            Err(RegisterError::Ineligible(EligibilityError::NoSeatsAvailable))
        ));
        assert!(!store
            .registration_exists(student_id, course.id)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn personal_schedule_conflict_blocks_across_rooms() {
        let store: DynStore = Arc::new(MemoryStore::new());
        let first = store
            .insert_course(new_course(
                "CS-100",
                5,
                vec![TimeSlot::new(Weekday::Mon, "09:00", "10:30", "A-1").unwrap()],
                vec![],
            ))
            .await
            .unwrap();
        let second = store
            .insert_course(new_course(
                "CS-101",
                5,
                vec![TimeSlot::new(Weekday::Mon, "10:00", "11:00", "B-7").unwrap()],
                vec![],
            ))
            .await
            .unwrap();
        let student_id = student(&store, "21L-0001").await;

        handle(
            store.clone(),
            RegisterCommand {
                student_id,
                course_id: first.id,
            },
        )
        .await
        .unwrap();

        let result = handle(
            store,
            RegisterCommand {
                student_id,
                course_id: second.id,
            },
        )
        .await;

        match result {
            Err(RegisterError::Ineligible(EligibilityError::ScheduleConflict(detail))) => {
                assert_eq!(detail.course.code, "CS-100");
            }
            other => panic!("expected schedule conflict, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn prerequisites_gate_until_completed() {
        let store: DynStore = Arc::new(MemoryStore::new());
        let basic = store
            .insert_course(new_course("CS-100", 5, vec![], vec![]))
            .await
            .unwrap();
        let advanced = store
            .insert_course(new_course("CS-201", 5, vec![], vec![basic.id]))
            .await
            .unwrap();
        let student_id = student(&store, "21L-0001").await;

        let gated = handle(
            store.clone(),
            RegisterCommand {
                student_id,
                course_id: advanced.id,
            },
        )
        .await;
        match gated {
            Err(RegisterError::Ineligible(EligibilityError::PrerequisitesNotMet { unmet })) => {
                assert_eq!(unmet.len(), 1);
                assert_eq!(unmet[0].code, "CS-100");
            }
            other => panic!("expected unmet prerequisites, got {other:?}"),
        }

        handle(
            store.clone(),
            RegisterCommand {
                student_id,
                course_id: basic.id,
            },
        )
        .await
        .unwrap();

        assert!(handle(
            store,
            RegisterCommand {
                student_id,
                course_id: advanced.id,
            },
        )
        .await
        .is_ok());
    }

    #[tokio::test]
    async fn unknown_student_or_course_reports_not_found() {
        let store: DynStore = Arc::new(MemoryStore::new());
        let course = store
            .insert_course(new_course("CS-101", 5, vec![], vec![]))
            .await
            .unwrap();
        let student_id = student(&store, "21L-0001").await;

        assert!(matches!(
            handle(
                store.clone(),
                RegisterCommand {
                    student_id: Uuid::new_v4(),
                    course_id: course.id,
                },
            )
            .await,
            Err(RegisterError::StudentNotFound(_))
        ));
        assert!(matches!(
            handle(
                store,
                RegisterCommand {
                    student_id,
                    course_id: Uuid::new_v4(),
                },
            )
            .await,
            Err(RegisterError::CourseNotFound(_))
        ));
    }
}
