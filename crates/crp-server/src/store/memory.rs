//! In-memory storage backend
//!
//! Backs the test suite and zero-dependency development runs. All state sits
//! behind one `tokio::sync::RwLock`; write operations take the write lock for
//! their full critical section, which is what makes every composite operation
//! atomic and seat accounting serializable per course.

use std::collections::HashMap;

use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    CascadeSummary, CourseFilter, Enrollment, RegistrationRecord, RegistrationScope, RegistryStore,
    StoreError, StudentSummary, TransitionOutcome,
};
use crate::models::registration::{release_on_delete, seat_delta};
use crate::models::{
    Course, CoursePatch, NewCourse, NewUser, Registration, RegistrationStatus, User,
};
use async_trait::async_trait;

#[derive(Default)]
struct State {
    courses: HashMap<Uuid, Course>,
    users: HashMap<Uuid, User>,
    registrations: HashMap<Uuid, Registration>,
}

/// See module docs.
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl State {
    fn matches(&self, course: &Course, filter: &CourseFilter) -> bool {
        if let Some(ref department) = filter.department {
            if &course.department != department {
                return false;
            }
        }
        if let Some(level) = filter.level {
            if course.level != level {
                return false;
            }
        }
        if let Some(day) = filter.day {
            if !course.schedule.iter().any(|slot| slot.day == day) {
                return false;
            }
        }
        if let Some(min_seats) = filter.min_seats {
            if course.available_seats < min_seats {
                return false;
            }
        }
        true
    }

    fn filtered_courses(&self, filter: &CourseFilter) -> Vec<&Course> {
        let mut courses: Vec<&Course> = self
            .courses
            .values()
            .filter(|course| self.matches(course, filter))
            .collect();
        courses.sort_by(|a, b| a.code.cmp(&b.code));
        courses
    }

    /// Adjust a course's free-seat counter, keeping the invariant
    /// `0 <= available <= total`. Missing courses are ignored; the caller is
    /// cleaning up after them elsewhere.
    fn adjust_seats(&mut self, course_id: Uuid, delta: i32) {
        if let Some(course) = self.courses.get_mut(&course_id) {
            course.available_seats =
                (course.available_seats + delta).clamp(0, course.total_seats);
        }
    }

    fn pull_from_student(&mut self, student_id: Uuid, registration_id: Uuid) {
        if let Some(user) = self.users.get_mut(&student_id) {
            user.registered_courses.retain(|id| *id != registration_id);
        }
    }

    /// Remove one registration and its cross-references. Returns the removed
    /// record.
    fn remove_registration_entry(&mut self, id: Uuid) -> Option<Registration> {
        let registration = self.registrations.remove(&id)?;
        self.adjust_seats(
            registration.course_id,
            release_on_delete(registration.status),
        );
        self.pull_from_student(registration.student_id, registration.id);
        Some(registration)
    }
}

#[async_trait]
impl RegistryStore for MemoryStore {
    async fn insert_course(&self, new: NewCourse) -> Result<Course, StoreError> {
        let mut state = self.state.write().await;

        if state.courses.values().any(|c| c.code == new.code) {
            return Err(StoreError::DuplicateCourseCode(new.code));
        }

        let course = Course {
            id: Uuid::new_v4(),
            code: new.code,
            title: new.title,
            department: new.department,
            level: new.level,
            description: new.description,
            credit_hours: new.credit_hours,
            total_seats: new.total_seats,
            available_seats: new.available_seats,
            schedule: new.schedule,
            prerequisites: new.prerequisites,
            subscribers: Vec::new(),
            created_at: Utc::now(),
        };
        state.courses.insert(course.id, course.clone());
        Ok(course)
    }

    async fn course(&self, id: Uuid) -> Result<Option<Course>, StoreError> {
        Ok(self.state.read().await.courses.get(&id).cloned())
    }

    async fn courses_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Course>, StoreError> {
        let state = self.state.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| state.courses.get(id).cloned())
            .collect())
    }

    async fn list_courses(&self, filter: &CourseFilter) -> Result<Vec<Course>, StoreError> {
        let state = self.state.read().await;
        let courses = state.filtered_courses(filter);

        let offset = filter.offset.max(0) as usize;
        let limited: Vec<Course> = match filter.limit {
            Some(limit) => courses
                .into_iter()
                .skip(offset)
                .take(limit.max(0) as usize)
                .cloned()
                .collect(),
            None => courses.into_iter().skip(offset).cloned().collect(),
        };
        Ok(limited)
    }

    async fn count_courses(&self, filter: &CourseFilter) -> Result<i64, StoreError> {
        let state = self.state.read().await;
        Ok(state.filtered_courses(filter).len() as i64)
    }

    async fn update_course(&self, id: Uuid, patch: CoursePatch) -> Result<Course, StoreError> {
        let mut state = self.state.write().await;
        let course = state
            .courses
            .get_mut(&id)
            .ok_or(StoreError::CourseNotFound(id))?;
        course.apply_patch(patch);
        Ok(course.clone())
    }

    async fn delete_course(&self, id: Uuid) -> Result<CascadeSummary, StoreError> {
        let mut state = self.state.write().await;

        if !state.courses.contains_key(&id) {
            return Err(StoreError::CourseNotFound(id));
        }

        let doomed: Vec<Uuid> = state
            .registrations
            .values()
            .filter(|reg| reg.course_id == id)
            .map(|reg| reg.id)
            .collect();
        for reg_id in &doomed {
            if let Some(registration) = state.registrations.remove(reg_id) {
                state.pull_from_student(registration.student_id, registration.id);
            }
        }

        let mut links_removed = 0;
        for course in state.courses.values_mut() {
            let before = course.prerequisites.len();
            course.prerequisites.retain(|prereq| *prereq != id);
            if course.prerequisites.len() < before {
                links_removed += 1;
            }
        }

        state.courses.remove(&id);

        Ok(CascadeSummary {
            registrations_removed: doomed.len() as u64,
            prerequisite_links_removed: links_removed,
        })
    }

    async fn subscribe(&self, course_id: Uuid, user_id: Uuid) -> Result<(), StoreError> {
        let mut state = self.state.write().await;

        if !state.users.contains_key(&user_id) {
            return Err(StoreError::UserNotFound(user_id));
        }
        let course = state
            .courses
            .get_mut(&course_id)
            .ok_or(StoreError::CourseNotFound(course_id))?;
        if course.subscribers.contains(&user_id) {
            return Err(StoreError::AlreadySubscribed);
        }
        course.subscribers.push(user_id);
        Ok(())
    }

    async fn insert_user(&self, new: NewUser) -> Result<User, StoreError> {
        let mut state = self.state.write().await;

        if state.users.values().any(|u| u.roll_number == new.roll_number) {
            return Err(StoreError::DuplicateRollNumber(new.roll_number));
        }

        let user = User {
            id: Uuid::new_v4(),
            roll_number: new.roll_number,
            name: new.name,
            password_hash: new.password_hash,
            role: new.role,
            registered_courses: Vec::new(),
            created_at: Utc::now(),
        };
        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn user(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.state.read().await.users.get(&id).cloned())
    }

    async fn registration(&self, id: Uuid) -> Result<Option<Registration>, StoreError> {
        Ok(self.state.read().await.registrations.get(&id).cloned())
    }

    async fn registration_exists(
        &self,
        student_id: Uuid,
        course_id: Uuid,
    ) -> Result<bool, StoreError> {
        let state = self.state.read().await;
        Ok(state
            .registrations
            .values()
            .any(|reg| reg.student_id == student_id && reg.course_id == course_id))
    }

    async fn approved_enrollments(&self, student_id: Uuid) -> Result<Vec<Enrollment>, StoreError> {
        let state = self.state.read().await;
        let mut enrollments: Vec<Enrollment> = state
            .registrations
            .values()
            .filter(|reg| {
                reg.student_id == student_id && reg.status == RegistrationStatus::Approved
            })
            .filter_map(|reg| {
                state.courses.get(&reg.course_id).map(|course| Enrollment {
                    registration: reg.clone(),
                    course: course.clone(),
                })
            })
            .collect();
        enrollments.sort_by_key(|e| e.registration.registered_at);
        Ok(enrollments)
    }

    async fn list_registrations(
        &self,
        scope: RegistrationScope,
    ) -> Result<Vec<RegistrationRecord>, StoreError> {
        let state = self.state.read().await;
        let mut records: Vec<RegistrationRecord> = state
            .registrations
            .values()
            .filter(|reg| match scope {
                RegistrationScope::All => true,
                RegistrationScope::Student(student_id) => reg.student_id == student_id,
            })
            .filter_map(|reg| {
                let user = state.users.get(&reg.student_id)?;
                Some(RegistrationRecord {
                    registration: reg.clone(),
                    student: StudentSummary {
                        id: user.id,
                        roll_number: user.roll_number.clone(),
                        name: user.name.clone(),
                    },
                    course: state.courses.get(&reg.course_id).map(Course::summary),
                })
            })
            .collect();
        records.sort_by_key(|r| (r.registration.registered_at, r.registration.id));
        Ok(records)
    }

    async fn admit(&self, student_id: Uuid, course_id: Uuid) -> Result<Registration, StoreError> {
        let mut state = self.state.write().await;

        if !state.users.contains_key(&student_id) {
            return Err(StoreError::UserNotFound(student_id));
        }
        let course = state
            .courses
            .get(&course_id)
            .ok_or(StoreError::CourseNotFound(course_id))?;
        if course.available_seats <= 0 {
            return Err(StoreError::SeatsExhausted);
        }
        if state
            .registrations
            .values()
            .any(|reg| reg.student_id == student_id && reg.course_id == course_id)
        {
            return Err(StoreError::DuplicateRegistration);
        }

        let registration = Registration {
            id: Uuid::new_v4(),
            student_id,
            course_id,
            status: RegistrationStatus::Approved,
            registered_at: Utc::now(),
        };
        state
            .registrations
            .insert(registration.id, registration.clone());

        let course = state
            .courses
            .get_mut(&course_id)
            .ok_or(StoreError::CourseNotFound(course_id))?;
        course.available_seats -= 1;
        if course.available_seats == 0 && !course.subscribers.is_empty() {
            course.subscribers.clear();
        }

        if let Some(user) = state.users.get_mut(&student_id) {
            user.registered_courses.push(registration.id);
        }

        Ok(registration)
    }

    async fn transition_status(
        &self,
        id: Uuid,
        new_status: RegistrationStatus,
    ) -> Result<TransitionOutcome, StoreError> {
        let mut state = self.state.write().await;

        let registration = state
            .registrations
            .get_mut(&id)
            .ok_or(StoreError::RegistrationNotFound(id))?;

        let previous_status = registration.status;
        registration.status = new_status;
        let registration = registration.clone();

        state.adjust_seats(
            registration.course_id,
            seat_delta(previous_status, new_status),
        );

        Ok(TransitionOutcome {
            registration,
            previous_status,
        })
    }

    async fn remove_registration(&self, id: Uuid) -> Result<Registration, StoreError> {
        let mut state = self.state.write().await;
        state
            .remove_registration_entry(id)
            .ok_or(StoreError::RegistrationNotFound(id))
    }

    async fn purge_orphans(&self, ids: &[Uuid]) -> Result<u64, StoreError> {
        let mut state = self.state.write().await;
        let mut removed = 0;

        for id in ids {
            let orphaned = match state.registrations.get(id) {
                Some(reg) => !state.courses.contains_key(&reg.course_id),
                None => false,
            };
            if orphaned {
                state.remove_registration_entry(*id);
                removed += 1;
            }
        }

        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crp_common::schedule::{TimeSlot, Weekday};
    use std::sync::Arc;

    fn course_fixture(code: &str, seats: i32) -> NewCourse {
        NewCourse {
            code: code.to_string(),
            title: format!("{code} title"),
            department: "CS".to_string(),
            level: 100,
            description: None,
            credit_hours: 3,
            total_seats: seats,
            available_seats: seats,
            schedule: vec![TimeSlot::new(Weekday::Mon, "10:00", "11:00", "A-1").unwrap()],
            prerequisites: vec![],
        }
    }

    fn student_fixture(roll: &str) -> NewUser {
        NewUser {
            roll_number: roll.to_string(),
            name: format!("Student {roll}"),
            password_hash: "$argon2id$test".to_string(),
            role: crate::models::Role::Student,
        }
    }

    #[tokio::test]
    async fn admit_takes_a_seat_and_mirrors_the_student_list() {
        let store = MemoryStore::new();
        let course = store.insert_course(course_fixture("CS-101", 2)).await.unwrap();
        let student = store.insert_user(student_fixture("21L-0001")).await.unwrap();

        let registration = store.admit(student.id, course.id).await.unwrap();

        assert_eq!(registration.status, RegistrationStatus::Approved);
        let course = store.course(course.id).await.unwrap().unwrap();
        assert_eq!(course.available_seats, 1);
        let student = store.user(student.id).await.unwrap().unwrap();
        assert_eq!(student.registered_courses, vec![registration.id]);
    }

    #[tokio::test]
    async fn admit_rejects_duplicates_and_exhaustion() {
        let store = MemoryStore::new();
        let course = store.insert_course(course_fixture("CS-101", 1)).await.unwrap();
        let a = store.insert_user(student_fixture("21L-0001")).await.unwrap();
        let b = store.insert_user(student_fixture("21L-0002")).await.unwrap();

        store.admit(a.id, course.id).await.unwrap();
        assert!(matches!(
            store.admit(a.id, course.id).await,
            Err(StoreError::DuplicateRegistration)
        ));
        assert!(matches!(
            store.admit(b.id, course.id).await,
            Err(StoreError::SeatsExhausted)
        ));
    }

    #[tokio::test]
    async fn last_seat_clears_subscribers() {
        let store = MemoryStore::new();
        let course = store.insert_course(course_fixture("CS-101", 1)).await.unwrap();
        let student = store.insert_user(student_fixture("21L-0001")).await.unwrap();
        let watcher = store.insert_user(student_fixture("21L-0002")).await.unwrap();

        store.subscribe(course.id, watcher.id).await.unwrap();
        store.admit(student.id, course.id).await.unwrap();

        let course = store.course(course.id).await.unwrap().unwrap();
        assert_eq!(course.available_seats, 0);
        assert!(course.subscribers.is_empty());
    }

    #[tokio::test]
    async fn concurrent_admits_cannot_oversell_the_last_seat() {
        let store = Arc::new(MemoryStore::new());
        let course = store.insert_course(course_fixture("CS-101", 1)).await.unwrap();
        let a = store.insert_user(student_fixture("21L-0001")).await.unwrap();
        let b = store.insert_user(student_fixture("21L-0002")).await.unwrap();

        let (ra, rb) = tokio::join!(
            {
                let store = store.clone();
                async move { store.admit(a.id, course.id).await }
            },
            {
                let store = store.clone();
                async move { store.admit(b.id, course.id).await }
            }
        );

        assert_eq!(ra.is_ok() as u8 + rb.is_ok() as u8, 1);
        let course = store.course(course.id).await.unwrap().unwrap();
        assert_eq!(course.available_seats, 0);
    }

    #[tokio::test]
    async fn transition_applies_the_compensating_delta_once() {
        let store = MemoryStore::new();
        let course = store.insert_course(course_fixture("CS-101", 1)).await.unwrap();
        let student = store.insert_user(student_fixture("21L-0001")).await.unwrap();
        let registration = store.admit(student.id, course.id).await.unwrap();

        let outcome = store
            .transition_status(registration.id, RegistrationStatus::Rejected)
            .await
            .unwrap();
        assert_eq!(outcome.previous_status, RegistrationStatus::Approved);
        assert_eq!(
            store.course(course.id).await.unwrap().unwrap().available_seats,
            1
        );

        // Writing the same status again must not move the counter.
        store
            .transition_status(registration.id, RegistrationStatus::Rejected)
            .await
            .unwrap();
        assert_eq!(
            store.course(course.id).await.unwrap().unwrap().available_seats,
            1
        );

        let outcome = store
            .transition_status(registration.id, RegistrationStatus::Approved)
            .await
            .unwrap();
        assert_eq!(outcome.previous_status, RegistrationStatus::Rejected);
        assert_eq!(
            store.course(course.id).await.unwrap().unwrap().available_seats,
            0
        );
    }

    #[tokio::test]
    async fn seats_track_the_approved_count_through_any_replay() {
        let store = MemoryStore::new();
        let course = store.insert_course(course_fixture("CS-101", 3)).await.unwrap();
        let mut registrations = Vec::new();
        for roll in ["21L-0001", "21L-0002", "21L-0003"] {
            let student = store.insert_user(student_fixture(roll)).await.unwrap();
            registrations.push(store.admit(student.id, course.id).await.unwrap().id);
        }

        use RegistrationStatus::{Approved, Rejected};
        let replay = [
            (0, Rejected),
            (1, Rejected),
            (0, Approved),
            (2, Rejected),
            (2, Rejected),
            (1, Approved),
            (2, Approved),
        ];

        for (idx, status) in replay {
            store.transition_status(registrations[idx], status).await.unwrap();

            let approved = {
                let state = store.state.read().await;
                state
                    .registrations
                    .values()
                    .filter(|r| r.status == Approved)
                    .count() as i32
            };
            let course = store.course(course.id).await.unwrap().unwrap();
            assert_eq!(
                course.available_seats,
                course.total_seats - approved,
                "conservation broke after setting registration {idx} to {status}"
            );
        }
    }

    #[tokio::test]
    async fn delete_course_cascades_registrations_and_prerequisites() {
        let store = MemoryStore::new();
        let basic = store.insert_course(course_fixture("CS-101", 5)).await.unwrap();
        let mut advanced = course_fixture("CS-201", 5);
        advanced.prerequisites = vec![basic.id];
        advanced.schedule =
            vec![TimeSlot::new(Weekday::Tue, "10:00", "11:00", "A-2").unwrap()];
        let advanced = store.insert_course(advanced).await.unwrap();
        let student = store.insert_user(student_fixture("21L-0001")).await.unwrap();
        store.admit(student.id, basic.id).await.unwrap();

        let summary = store.delete_course(basic.id).await.unwrap();

        assert_eq!(summary.registrations_removed, 1);
        assert_eq!(summary.prerequisite_links_removed, 1);
        assert!(store.course(basic.id).await.unwrap().is_none());
        let advanced = store.course(advanced.id).await.unwrap().unwrap();
        assert!(advanced.prerequisites.is_empty());
        let student = store.user(student.id).await.unwrap().unwrap();
        assert!(student.registered_courses.is_empty());
        assert!(store
            .list_registrations(RegistrationScope::All)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn purge_removes_only_orphans() {
        let store = MemoryStore::new();
        let course = store.insert_course(course_fixture("CS-101", 5)).await.unwrap();
        let student = store.insert_user(student_fixture("21L-0001")).await.unwrap();
        let registration = store.admit(student.id, course.id).await.unwrap();

        // Still resolvable: nothing to purge.
        assert_eq!(store.purge_orphans(&[registration.id]).await.unwrap(), 0);

        // Drop the course behind the registration's back, bypassing the
        // cascade, then purge.
        store.state.write().await.courses.remove(&course.id);
        assert_eq!(store.purge_orphans(&[registration.id]).await.unwrap(), 1);
        assert!(store.registration(registration.id).await.unwrap().is_none());
        let student = store.user(student.id).await.unwrap().unwrap();
        assert!(student.registered_courses.is_empty());
    }
}
