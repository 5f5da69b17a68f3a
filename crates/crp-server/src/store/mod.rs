//! Storage port for the registration platform
//!
//! Feature handlers depend on [`RegistryStore`], never on a concrete database
//! handle. Two backends implement it: [`memory::MemoryStore`] (tests,
//! zero-dependency development) and [`postgres::PgStore`] (production).
//!
//! Multi-step mutations — admitting a registration, status transitions,
//! cancellation, the course-deletion cascade, the orphan purge — are single
//! trait operations so each backend can make them atomic: one SQL transaction
//! in Postgres, one write-lock section in memory. Partial application of a
//! seat adjustment or a cross-reference update is impossible by construction.
//!
//! Seat accounting is serializable per course: the Postgres backend guards the
//! decrement with `available_seats > 0` compare-and-swap inside the admit
//! transaction, the memory backend serializes all writers. Two concurrent
//! attempts at the last seat cannot both succeed.

pub mod memory;
pub mod postgres;

use std::sync::Arc;

use async_trait::async_trait;
use crp_common::schedule::Weekday;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::config::{Config, StorageBackend};
use crate::models::{
    Course, CoursePatch, CourseSummary, NewCourse, NewUser, Registration, RegistrationStatus, User,
};

/// Shared handle to the configured storage backend
pub type DynStore = Arc<dyn RegistryStore>;

/// Errors surfaced by storage operations
///
/// Row-level conditions (`*NotFound`, duplicates, seat exhaustion) are
/// business facts the feature layer maps to specific API errors; `Backend`
/// wraps infrastructure failures and surfaces generically.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Course {0} not found")]
    CourseNotFound(Uuid),

    #[error("User {0} not found")]
    UserNotFound(Uuid),

    #[error("Registration {0} not found")]
    RegistrationNotFound(Uuid),

    #[error("A course with code '{0}' already exists")]
    DuplicateCourseCode(String),

    #[error("A user with roll number '{0}' already exists")]
    DuplicateRollNumber(String),

    #[error("Student is already registered for this course")]
    DuplicateRegistration,

    #[error("No seats available for this course")]
    SeatsExhausted,

    #[error("Already subscribed to this course")]
    AlreadySubscribed,

    #[error("Storage backend error: {0}")]
    Backend(#[source] anyhow::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Backend(err.into())
    }
}

/// Catalog listing filter
#[derive(Debug, Clone, Default)]
pub struct CourseFilter {
    pub department: Option<String>,
    pub level: Option<i32>,
    /// Keep only courses with at least one slot on this day.
    pub day: Option<Weekday>,
    pub min_seats: Option<i32>,
    /// `None` returns the full catalog (used by the conflict scanner).
    pub limit: Option<i64>,
    pub offset: i64,
}

/// Scope for registration listings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationScope {
    All,
    Student(Uuid),
}

/// Compact student reference attached to registration listings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentSummary {
    pub id: Uuid,
    pub roll_number: String,
    pub name: String,
}

/// A registration listing row with its references resolved
///
/// `course` is `None` when the referenced course no longer exists — the
/// orphan case the integrity sweep removes.
#[derive(Debug, Clone)]
pub struct RegistrationRecord {
    pub registration: Registration,
    pub student: StudentSummary,
    pub course: Option<CourseSummary>,
}

/// An approved registration together with its populated course, as consumed
/// by the eligibility engine's personal-conflict and prerequisite checks.
#[derive(Debug, Clone)]
pub struct Enrollment {
    pub registration: Registration,
    pub course: Course,
}

/// Result of a status transition, carrying the status captured before the
/// update so callers can report the compensating seat adjustment.
#[derive(Debug, Clone)]
pub struct TransitionOutcome {
    pub registration: Registration,
    pub previous_status: RegistrationStatus,
}

/// Result of a course-deletion cascade
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CascadeSummary {
    pub registrations_removed: u64,
    pub prerequisite_links_removed: u64,
}

/// The storage port
#[async_trait]
pub trait RegistryStore: Send + Sync {
    // ------------------------------------------------------------------
    // Courses
    // ------------------------------------------------------------------

    async fn insert_course(&self, new: NewCourse) -> Result<Course, StoreError>;

    async fn course(&self, id: Uuid) -> Result<Option<Course>, StoreError>;

    async fn courses_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Course>, StoreError>;

    async fn list_courses(&self, filter: &CourseFilter) -> Result<Vec<Course>, StoreError>;

    async fn count_courses(&self, filter: &CourseFilter) -> Result<i64, StoreError>;

    /// Apply an allow-listed patch; a `total_seats` change re-derives
    /// `available_seats` by the delta rule.
    async fn update_course(&self, id: Uuid, patch: CoursePatch) -> Result<Course, StoreError>;

    /// Delete a course and cascade: remove every registration referencing it
    /// (pulling each from its student's list) and strip it from other
    /// courses' prerequisite lists. Atomic; any failure rolls back the whole
    /// cascade.
    async fn delete_course(&self, id: Uuid) -> Result<CascadeSummary, StoreError>;

    /// Add a user to a course's subscriber list once.
    async fn subscribe(&self, course_id: Uuid, user_id: Uuid) -> Result<(), StoreError>;

    // ------------------------------------------------------------------
    // Users
    // ------------------------------------------------------------------

    async fn insert_user(&self, new: NewUser) -> Result<User, StoreError>;

    async fn user(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    // ------------------------------------------------------------------
    // Registrations
    // ------------------------------------------------------------------

    async fn registration(&self, id: Uuid) -> Result<Option<Registration>, StoreError>;

    async fn registration_exists(
        &self,
        student_id: Uuid,
        course_id: Uuid,
    ) -> Result<bool, StoreError>;

    /// The student's approved registrations with their courses populated.
    async fn approved_enrollments(&self, student_id: Uuid) -> Result<Vec<Enrollment>, StoreError>;

    async fn list_registrations(
        &self,
        scope: RegistrationScope,
    ) -> Result<Vec<RegistrationRecord>, StoreError>;

    // ------------------------------------------------------------------
    // Transactional units
    // ------------------------------------------------------------------

    /// Admit a student: create an approved registration, take one seat, and
    /// append the registration to the student's list, atomically. The seat
    /// decrement is guarded by `available_seats > 0`; the unique
    /// (student, course) constraint closes the duplicate race.
    ///
    /// When the admitted seat was the last one and the course has
    /// subscribers, the subscriber list is cleared (notification mark).
    async fn admit(&self, student_id: Uuid, course_id: Uuid) -> Result<Registration, StoreError>;

    /// Write a new status, applying the compensating seat adjustment decided
    /// from the pre-update status (see [`crate::models::registration::seat_delta`]).
    async fn transition_status(
        &self,
        id: Uuid,
        new_status: RegistrationStatus,
    ) -> Result<TransitionOutcome, StoreError>;

    /// Delete a registration, freeing its seat if it was approved and pulling
    /// it from the student's list.
    async fn remove_registration(&self, id: Uuid) -> Result<Registration, StoreError>;

    /// Delete the given registrations if (and only if) their course no longer
    /// resolves, pulling each from its student's list. Returns the number
    /// removed.
    async fn purge_orphans(&self, ids: &[Uuid]) -> Result<u64, StoreError>;
}

/// Build the storage backend selected by configuration
pub async fn init(config: &Config) -> anyhow::Result<DynStore> {
    match config.storage.backend {
        StorageBackend::Memory => {
            tracing::info!("Using in-memory storage backend");
            Ok(Arc::new(memory::MemoryStore::new()))
        }
        StorageBackend::Postgres => {
            let store = postgres::PgStore::connect(&config.storage.database).await?;
            store.run_migrations().await?;
            tracing::info!("Connected to PostgreSQL storage backend");
            Ok(Arc::new(store))
        }
    }
}
