//! Room-level schedule conflict scanner
//!
//! Finds existing course slots that share a day *and a room* with a candidate
//! slot and overlap it in time. This is the administrative double-booking
//! check; it is advisory everywhere it is used — course create/update report
//! conflicts without blocking the write, and the standalone endpoint is
//! read-only.
//!
//! The per-student conflict check is different: it ignores rooms and lives in
//! the registration feature's eligibility engine.

use crp_common::schedule::{overlaps, TimeSlot};
use uuid::Uuid;

use super::types::ConflictReport;
use crate::store::{CourseFilter, DynStore, RegistryStore, StoreError};

/// Scan the catalog for same-day same-room overlaps with the candidate slots
///
/// `exclude` skips one course, for edit-in-place checks against the course's
/// own slots.
pub async fn scan(
    store: &DynStore,
    candidate_slots: &[TimeSlot],
    exclude: Option<Uuid>,
) -> Result<Vec<ConflictReport>, StoreError> {
    let courses = store.list_courses(&CourseFilter::default()).await?;

    let mut conflicts = Vec::new();
    for course in &courses {
        if exclude == Some(course.id) {
            continue;
        }
        for existing in &course.schedule {
            for candidate in candidate_slots {
                if existing.day == candidate.day
                    && existing.room == candidate.room
                    && overlaps(existing.start, existing.end, candidate.start, candidate.end)
                {
                    conflicts.push(ConflictReport {
                        course: course.summary(),
                        day: candidate.day,
                        room: candidate.room.clone(),
                        existing_time: existing.time_range(),
                        candidate_time: candidate.time_range(),
                    });
                }
            }
        }
    }
    Ok(conflicts)
}

/// Advisory variant: a failed scan is logged and reported as "no conflicts"
/// so it can never block an admin write or a preview request.
pub async fn advisory(
    store: &DynStore,
    candidate_slots: &[TimeSlot],
    exclude: Option<Uuid>,
) -> Vec<ConflictReport> {
    match scan(store, candidate_slots, exclude).await {
        Ok(conflicts) => conflicts,
        Err(error) => {
            tracing::warn!(%error, "Schedule conflict scan failed; reporting no conflicts");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewCourse;
    use crate::store::memory::MemoryStore;
    use crp_common::schedule::Weekday;
    use std::sync::Arc;

    fn course_with_slot(code: &str, slot: TimeSlot) -> NewCourse {
        NewCourse {
            code: code.to_string(),
            title: format!("{code} title"),
            department: "CS".to_string(),
            level: 100,
            description: None,
            credit_hours: 3,
            total_seats: 30,
            available_seats: 30,
            schedule: vec![slot],
            prerequisites: vec![],
        }
    }

    #[tokio::test]
    async fn reports_same_day_same_room_overlap() {
        let store: DynStore = Arc::new(MemoryStore::new());
        let existing = store
            .insert_course(course_with_slot(
                "CS-101",
                TimeSlot::new(Weekday::Mon, "10:00", "11:30", "A-1").unwrap(),
            ))
            .await
            .unwrap();

        let candidate = [TimeSlot::new(Weekday::Mon, "11:00", "12:00", "A-1").unwrap()];
        let conflicts = scan(&store, &candidate, None).await.unwrap();

        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].course.id, existing.id);
        assert_eq!(conflicts[0].existing_time, "10:00-11:30");
        assert_eq!(conflicts[0].candidate_time, "11:00-12:00");
    }

    #[tokio::test]
    async fn different_room_or_day_is_not_a_conflict() {
        let store: DynStore = Arc::new(MemoryStore::new());
        store
            .insert_course(course_with_slot(
                "CS-101",
                TimeSlot::new(Weekday::Mon, "10:00", "11:30", "A-1").unwrap(),
            ))
            .await
            .unwrap();

        let other_room = [TimeSlot::new(Weekday::Mon, "10:30", "11:00", "B-2").unwrap()];
        assert!(scan(&store, &other_room, None).await.unwrap().is_empty());

        let other_day = [TimeSlot::new(Weekday::Tue, "10:30", "11:00", "A-1").unwrap()];
        assert!(scan(&store, &other_day, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn touching_slots_do_not_conflict() {
        let store: DynStore = Arc::new(MemoryStore::new());
        store
            .insert_course(course_with_slot(
                "CS-101",
                TimeSlot::new(Weekday::Mon, "09:00", "10:00", "A-1").unwrap(),
            ))
            .await
            .unwrap();

        let candidate = [TimeSlot::new(Weekday::Mon, "10:00", "11:00", "A-1").unwrap()];
        assert!(scan(&store, &candidate, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn excluded_course_is_skipped() {
        let store: DynStore = Arc::new(MemoryStore::new());
        let course = store
            .insert_course(course_with_slot(
                "CS-101",
                TimeSlot::new(Weekday::Mon, "10:00", "11:00", "A-1").unwrap(),
            ))
            .await
            .unwrap();

        // The course's own slot would otherwise conflict with itself.
        let candidate = [TimeSlot::new(Weekday::Mon, "10:00", "11:00", "A-1").unwrap()];
        assert!(scan(&store, &candidate, Some(course.id))
            .await
            .unwrap()
            .is_empty());
        assert_eq!(scan(&store, &candidate, None).await.unwrap().len(), 1);
    }
}
