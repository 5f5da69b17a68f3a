//! PostgreSQL storage backend
//!
//! Every composite operation runs inside one transaction. The course row is
//! taken `FOR UPDATE` at the top of each seat-moving operation, which
//! serializes seat accounting per course; the seat decrement additionally
//! keeps its `available_seats > 0` compare-and-swap guard, and the
//! (student, course) unique index closes the duplicate-registration race.
//!
//! Queries use the runtime-checked sqlx API rather than the `query!` macros
//! so the workspace builds without a live `DATABASE_URL`.

use anyhow::anyhow;
use chrono::{DateTime, Utc};
use crp_common::schedule::TimeSlot;
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;
use sqlx::PgPool;
use std::time::Duration;
use uuid::Uuid;

use super::{
    CascadeSummary, CourseFilter, Enrollment, RegistrationRecord, RegistrationScope, RegistryStore,
    StoreError, StudentSummary, TransitionOutcome,
};
use crate::config::DatabaseConfig;
use crate::models::registration::{release_on_delete, seat_delta};
use crate::models::{
    Course, CoursePatch, CourseSummary, NewCourse, NewUser, Registration, RegistrationStatus, Role,
    User,
};
use async_trait::async_trait;

/// See module docs.
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Open a connection pool against the configured database
    pub async fn connect(config: &DatabaseConfig) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
            .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
            .connect(&config.url)
            .await?;
        Ok(Self { pool })
    }

    /// Run embedded migrations
    pub async fn run_migrations(&self) -> anyhow::Result<()> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| anyhow!("Failed to run migrations: {e}"))?;
        Ok(())
    }
}

const COURSE_COLUMNS: &str = "id, code, title, department, level, description, credit_hours, \
     total_seats, available_seats, schedule, prerequisites, subscribers, created_at";

#[derive(Debug, sqlx::FromRow)]
struct CourseRow {
    id: Uuid,
    code: String,
    title: String,
    department: String,
    level: i32,
    description: Option<String>,
    credit_hours: i32,
    total_seats: i32,
    available_seats: i32,
    schedule: Json<Vec<TimeSlot>>,
    prerequisites: Vec<Uuid>,
    subscribers: Vec<Uuid>,
    created_at: DateTime<Utc>,
}

impl From<CourseRow> for Course {
    fn from(row: CourseRow) -> Self {
        Course {
            id: row.id,
            code: row.code,
            title: row.title,
            department: row.department,
            level: row.level,
            description: row.description,
            credit_hours: row.credit_hours,
            total_seats: row.total_seats,
            available_seats: row.available_seats,
            schedule: row.schedule.0,
            prerequisites: row.prerequisites,
            subscribers: row.subscribers,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct RegistrationRow {
    id: Uuid,
    student_id: Uuid,
    course_id: Uuid,
    status: String,
    registered_at: DateTime<Utc>,
}

impl RegistrationRow {
    fn into_registration(self) -> Result<Registration, StoreError> {
        Ok(Registration {
            id: self.id,
            student_id: self.student_id,
            course_id: self.course_id,
            status: parse_status(&self.status)?,
            registered_at: self.registered_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    roll_number: String,
    name: String,
    password_hash: String,
    role: String,
    registered_courses: Vec<Uuid>,
    created_at: DateTime<Utc>,
}

impl UserRow {
    fn into_user(self) -> Result<User, StoreError> {
        let role: Role = self
            .role
            .parse()
            .map_err(|e: String| StoreError::Backend(anyhow!(e)))?;
        Ok(User {
            id: self.id,
            roll_number: self.roll_number,
            name: self.name,
            password_hash: self.password_hash,
            role,
            registered_courses: self.registered_courses,
            created_at: self.created_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct RegistrationListRow {
    id: Uuid,
    student_id: Uuid,
    course_id: Uuid,
    status: String,
    registered_at: DateTime<Utc>,
    roll_number: String,
    student_name: String,
    course_code: Option<String>,
    course_title: Option<String>,
}

fn parse_status(raw: &str) -> Result<RegistrationStatus, StoreError> {
    raw.parse()
        .map_err(|e: String| StoreError::Backend(anyhow!(e)))
}

#[async_trait]
impl RegistryStore for PgStore {
    async fn insert_course(&self, new: NewCourse) -> Result<Course, StoreError> {
        let row: CourseRow = sqlx::query_as(
            "INSERT INTO courses (code, title, department, level, description, credit_hours, \
             total_seats, available_seats, schedule, prerequisites) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             RETURNING id, code, title, department, level, description, credit_hours, \
             total_seats, available_seats, schedule, prerequisites, subscribers, created_at",
        )
        .bind(&new.code)
        .bind(&new.title)
        .bind(&new.department)
        .bind(new.level)
        .bind(&new.description)
        .bind(new.credit_hours)
        .bind(new.total_seats)
        .bind(new.available_seats)
        .bind(Json(&new.schedule))
        .bind(&new.prerequisites)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                StoreError::DuplicateCourseCode(new.code.clone())
            }
            _ => e.into(),
        })?;

        Ok(row.into())
    }

    async fn course(&self, id: Uuid) -> Result<Option<Course>, StoreError> {
        let row: Option<CourseRow> =
            sqlx::query_as(&format!("SELECT {COURSE_COLUMNS} FROM courses WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(Course::from))
    }

    async fn courses_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Course>, StoreError> {
        let rows: Vec<CourseRow> = sqlx::query_as(&format!(
            "SELECT {COURSE_COLUMNS} FROM courses WHERE id = ANY($1) ORDER BY code"
        ))
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Course::from).collect())
    }

    async fn list_courses(&self, filter: &CourseFilter) -> Result<Vec<Course>, StoreError> {
        let rows: Vec<CourseRow> = sqlx::query_as(&format!(
            "SELECT {COURSE_COLUMNS} FROM courses \
             WHERE ($1::TEXT IS NULL OR department = $1) \
               AND ($2::INT4 IS NULL OR level = $2) \
               AND ($3::INT4 IS NULL OR available_seats >= $3) \
               AND ($4::TEXT IS NULL OR EXISTS ( \
                     SELECT 1 FROM jsonb_array_elements(schedule) AS slot \
                     WHERE slot->>'day' = $4)) \
             ORDER BY code \
             LIMIT $5 OFFSET $6"
        ))
        .bind(filter.department.as_deref())
        .bind(filter.level)
        .bind(filter.min_seats)
        .bind(filter.day.map(|d| d.as_str()))
        .bind(filter.limit)
        .bind(filter.offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Course::from).collect())
    }

    async fn count_courses(&self, filter: &CourseFilter) -> Result<i64, StoreError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM courses \
             WHERE ($1::TEXT IS NULL OR department = $1) \
               AND ($2::INT4 IS NULL OR level = $2) \
               AND ($3::INT4 IS NULL OR available_seats >= $3) \
               AND ($4::TEXT IS NULL OR EXISTS ( \
                     SELECT 1 FROM jsonb_array_elements(schedule) AS slot \
                     WHERE slot->>'day' = $4))",
        )
        .bind(filter.department.as_deref())
        .bind(filter.level)
        .bind(filter.min_seats)
        .bind(filter.day.map(|d| d.as_str()))
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    async fn update_course(&self, id: Uuid, patch: CoursePatch) -> Result<Course, StoreError> {
        let mut tx = self.pool.begin().await?;

        let row: Option<CourseRow> = sqlx::query_as(&format!(
            "SELECT {COURSE_COLUMNS} FROM courses WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;
        let mut course: Course = row.ok_or(StoreError::CourseNotFound(id))?.into();

        course.apply_patch(patch);

        sqlx::query(
            "UPDATE courses SET title = $2, department = $3, level = $4, description = $5, \
             credit_hours = $6, total_seats = $7, available_seats = $8, schedule = $9, \
             prerequisites = $10 WHERE id = $1",
        )
        .bind(id)
        .bind(&course.title)
        .bind(&course.department)
        .bind(course.level)
        .bind(&course.description)
        .bind(course.credit_hours)
        .bind(course.total_seats)
        .bind(course.available_seats)
        .bind(Json(&course.schedule))
        .bind(&course.prerequisites)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(course)
    }

    async fn delete_course(&self, id: Uuid) -> Result<CascadeSummary, StoreError> {
        let mut tx = self.pool.begin().await?;

        let exists: Option<Uuid> = sqlx::query_scalar("SELECT id FROM courses WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_none() {
            return Err(StoreError::CourseNotFound(id));
        }

        let doomed: Vec<(Uuid, Uuid)> =
            sqlx::query_as("SELECT id, student_id FROM registrations WHERE course_id = $1")
                .bind(id)
                .fetch_all(&mut *tx)
                .await?;
        for (registration_id, student_id) in &doomed {
            sqlx::query(
                "UPDATE users SET registered_courses = array_remove(registered_courses, $2) \
                 WHERE id = $1",
            )
            .bind(student_id)
            .bind(registration_id)
            .execute(&mut *tx)
            .await?;
        }

        let registrations_removed = sqlx::query("DELETE FROM registrations WHERE course_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let prerequisite_links_removed = sqlx::query(
            "UPDATE courses SET prerequisites = array_remove(prerequisites, $1) \
             WHERE $1 = ANY(prerequisites)",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        sqlx::query("DELETE FROM courses WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(CascadeSummary {
            registrations_removed,
            prerequisite_links_removed,
        })
    }

    async fn subscribe(&self, course_id: Uuid, user_id: Uuid) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        let user_exists: Option<Uuid> = sqlx::query_scalar("SELECT id FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await?;
        if user_exists.is_none() {
            return Err(StoreError::UserNotFound(user_id));
        }

        let subscribers: Option<Vec<Uuid>> =
            sqlx::query_scalar("SELECT subscribers FROM courses WHERE id = $1 FOR UPDATE")
                .bind(course_id)
                .fetch_optional(&mut *tx)
                .await?;
        let subscribers = subscribers.ok_or(StoreError::CourseNotFound(course_id))?;
        if subscribers.contains(&user_id) {
            return Err(StoreError::AlreadySubscribed);
        }

        sqlx::query("UPDATE courses SET subscribers = array_append(subscribers, $2) WHERE id = $1")
            .bind(course_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn insert_user(&self, new: NewUser) -> Result<User, StoreError> {
        let row: UserRow = sqlx::query_as(
            "INSERT INTO users (roll_number, name, password_hash, role) \
             VALUES ($1, $2, $3, $4) \
             RETURNING id, roll_number, name, password_hash, role, registered_courses, created_at",
        )
        .bind(&new.roll_number)
        .bind(&new.name)
        .bind(&new.password_hash)
        .bind(new.role.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                StoreError::DuplicateRollNumber(new.roll_number.clone())
            }
            _ => e.into(),
        })?;

        row.into_user()
    }

    async fn user(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let row: Option<UserRow> = sqlx::query_as(
            "SELECT id, roll_number, name, password_hash, role, registered_courses, created_at \
             FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(UserRow::into_user).transpose()
    }

    async fn registration(&self, id: Uuid) -> Result<Option<Registration>, StoreError> {
        let row: Option<RegistrationRow> = sqlx::query_as(
            "SELECT id, student_id, course_id, status, registered_at \
             FROM registrations WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(RegistrationRow::into_registration).transpose()
    }

    async fn registration_exists(
        &self,
        student_id: Uuid,
        course_id: Uuid,
    ) -> Result<bool, StoreError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM registrations WHERE student_id = $1 AND course_id = $2)",
        )
        .bind(student_id)
        .bind(course_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn approved_enrollments(&self, student_id: Uuid) -> Result<Vec<Enrollment>, StoreError> {
        let rows: Vec<RegistrationRow> = sqlx::query_as(
            "SELECT id, student_id, course_id, status, registered_at \
             FROM registrations \
             WHERE student_id = $1 AND status = 'approved' \
             ORDER BY registered_at",
        )
        .bind(student_id)
        .fetch_all(&self.pool)
        .await?;

        let course_ids: Vec<Uuid> = rows.iter().map(|r| r.course_id).collect();
        let courses = self.courses_by_ids(&course_ids).await?;

        let mut enrollments = Vec::with_capacity(rows.len());
        for row in rows {
            let registration = row.into_registration()?;
            // Courses deleted out-of-band simply drop out here; the listing
            // path sweeps the orphaned rows.
            if let Some(course) = courses.iter().find(|c| c.id == registration.course_id) {
                enrollments.push(Enrollment {
                    registration,
                    course: course.clone(),
                });
            }
        }
        Ok(enrollments)
    }

    async fn list_registrations(
        &self,
        scope: RegistrationScope,
    ) -> Result<Vec<RegistrationRecord>, StoreError> {
        let student_filter = match scope {
            RegistrationScope::All => None,
            RegistrationScope::Student(id) => Some(id),
        };

        let rows: Vec<RegistrationListRow> = sqlx::query_as(
            "SELECT r.id, r.student_id, r.course_id, r.status, r.registered_at, \
                    u.roll_number, u.name AS student_name, \
                    c.code AS course_code, c.title AS course_title \
             FROM registrations r \
             JOIN users u ON u.id = r.student_id \
             LEFT JOIN courses c ON c.id = r.course_id \
             WHERE ($1::UUID IS NULL OR r.student_id = $1) \
             ORDER BY r.registered_at, r.id",
        )
        .bind(student_filter)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                let course = match (row.course_code, row.course_title) {
                    (Some(code), Some(title)) => Some(CourseSummary {
                        id: row.course_id,
                        code,
                        title,
                    }),
                    _ => None,
                };
                Ok(RegistrationRecord {
                    registration: Registration {
                        id: row.id,
                        student_id: row.student_id,
                        course_id: row.course_id,
                        status: parse_status(&row.status)?,
                        registered_at: row.registered_at,
                    },
                    student: StudentSummary {
                        id: row.student_id,
                        roll_number: row.roll_number,
                        name: row.student_name,
                    },
                    course,
                })
            })
            .collect()
    }

    async fn admit(&self, student_id: Uuid, course_id: Uuid) -> Result<Registration, StoreError> {
        let mut tx = self.pool.begin().await?;

        // Lock the course row for the whole admission.
        let seats: Option<i32> =
            sqlx::query_scalar("SELECT available_seats FROM courses WHERE id = $1 FOR UPDATE")
                .bind(course_id)
                .fetch_optional(&mut *tx)
                .await?;
        match seats {
            None => return Err(StoreError::CourseNotFound(course_id)),
            Some(seats) if seats <= 0 => return Err(StoreError::SeatsExhausted),
            Some(_) => {}
        }

        let row: RegistrationRow = sqlx::query_as(
            "INSERT INTO registrations (student_id, course_id, status) \
             VALUES ($1, $2, 'approved') \
             RETURNING id, student_id, course_id, status, registered_at",
        )
        .bind(student_id)
        .bind(course_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                StoreError::DuplicateRegistration
            }
            _ => e.into(),
        })?;
        let registration = row.into_registration()?;

        // CAS guard kept on top of the row lock.
        let remaining: Option<i32> = sqlx::query_scalar(
            "UPDATE courses SET available_seats = available_seats - 1 \
             WHERE id = $1 AND available_seats > 0 \
             RETURNING available_seats",
        )
        .bind(course_id)
        .fetch_optional(&mut *tx)
        .await?;
        let remaining = remaining.ok_or(StoreError::SeatsExhausted)?;

        if remaining == 0 {
            sqlx::query(
                "UPDATE courses SET subscribers = '{}' \
                 WHERE id = $1 AND cardinality(subscribers) > 0",
            )
            .bind(course_id)
            .execute(&mut *tx)
            .await?;
        }

        let student: Option<Uuid> = sqlx::query_scalar(
            "UPDATE users SET registered_courses = array_append(registered_courses, $2) \
             WHERE id = $1 RETURNING id",
        )
        .bind(student_id)
        .bind(registration.id)
        .fetch_optional(&mut *tx)
        .await?;
        if student.is_none() {
            return Err(StoreError::UserNotFound(student_id));
        }

        tx.commit().await?;
        Ok(registration)
    }

    async fn transition_status(
        &self,
        id: Uuid,
        new_status: RegistrationStatus,
    ) -> Result<TransitionOutcome, StoreError> {
        let mut tx = self.pool.begin().await?;

        let row: Option<RegistrationRow> = sqlx::query_as(
            "SELECT id, student_id, course_id, status, registered_at \
             FROM registrations WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;
        let mut registration = row
            .ok_or(StoreError::RegistrationNotFound(id))?
            .into_registration()?;

        // Decide the seat adjustment from the pre-update status.
        let previous_status = registration.status;
        registration.status = new_status;

        sqlx::query("UPDATE registrations SET status = $2 WHERE id = $1")
            .bind(id)
            .bind(new_status.as_str())
            .execute(&mut *tx)
            .await?;

        let delta = seat_delta(previous_status, new_status);
        if delta != 0 {
            sqlx::query(
                "UPDATE courses \
                 SET available_seats = LEAST(GREATEST(available_seats + $2, 0), total_seats) \
                 WHERE id = $1",
            )
            .bind(registration.course_id)
            .bind(delta)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(TransitionOutcome {
            registration,
            previous_status,
        })
    }

    async fn remove_registration(&self, id: Uuid) -> Result<Registration, StoreError> {
        let mut tx = self.pool.begin().await?;

        let row: Option<RegistrationRow> = sqlx::query_as(
            "SELECT id, student_id, course_id, status, registered_at \
             FROM registrations WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;
        let registration = row
            .ok_or(StoreError::RegistrationNotFound(id))?
            .into_registration()?;

        sqlx::query("DELETE FROM registrations WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if release_on_delete(registration.status) > 0 {
            sqlx::query(
                "UPDATE courses \
                 SET available_seats = LEAST(available_seats + 1, total_seats) \
                 WHERE id = $1",
            )
            .bind(registration.course_id)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query(
            "UPDATE users SET registered_courses = array_remove(registered_courses, $2) \
             WHERE id = $1",
        )
        .bind(registration.student_id)
        .bind(registration.id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(registration)
    }

    async fn purge_orphans(&self, ids: &[Uuid]) -> Result<u64, StoreError> {
        let mut tx = self.pool.begin().await?;

        let removed: Vec<(Uuid, Uuid)> = sqlx::query_as(
            "DELETE FROM registrations r \
             WHERE r.id = ANY($1) \
               AND NOT EXISTS (SELECT 1 FROM courses c WHERE c.id = r.course_id) \
             RETURNING r.id, r.student_id",
        )
        .bind(ids)
        .fetch_all(&mut *tx)
        .await?;

        for (registration_id, student_id) in &removed {
            sqlx::query(
                "UPDATE users SET registered_courses = array_remove(registered_courses, $2) \
                 WHERE id = $1",
            )
            .bind(student_id)
            .bind(registration_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(removed.len() as u64)
    }
}
