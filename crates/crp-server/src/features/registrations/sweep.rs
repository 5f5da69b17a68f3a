//! Orphaned-registration sweep
//!
//! Listing paths resolve every registration's course reference; rows whose
//! course no longer exists are filtered out of the response and handed here
//! for fire-and-forget deletion. Cleanup failures are logged and contained —
//! they must never fail the read that triggered them.

use uuid::Uuid;

use crate::store::{DynStore, RegistrationRecord, RegistryStore};

/// Split listing records into resolvable rows and orphan ids
pub fn partition_orphans(
    records: Vec<RegistrationRecord>,
) -> (Vec<RegistrationRecord>, Vec<Uuid>) {
    let mut resolvable = Vec::with_capacity(records.len());
    let mut orphans = Vec::new();

    for record in records {
        if record.course.is_some() {
            resolvable.push(record);
        } else {
            orphans.push(record.registration.id);
        }
    }

    (resolvable, orphans)
}

/// Delete orphaned registrations in the background
pub fn spawn_orphan_sweep(store: DynStore, orphan_ids: Vec<Uuid>) {
    if orphan_ids.is_empty() {
        return;
    }

    tracing::debug!(count = orphan_ids.len(), "Sweeping orphaned registrations");
    tokio::spawn(async move {
        match store.purge_orphans(&orphan_ids).await {
            Ok(removed) => {
                tracing::info!(removed, "Orphaned registrations removed");
            }
            Err(error) => {
                tracing::warn!(%error, "Orphaned-registration cleanup failed");
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Registration, RegistrationStatus};
    use crate::store::StudentSummary;
    use chrono::Utc;

    fn record(course: Option<crate::models::CourseSummary>) -> RegistrationRecord {
        RegistrationRecord {
            registration: Registration {
                id: Uuid::new_v4(),
                student_id: Uuid::new_v4(),
                course_id: Uuid::new_v4(),
                status: RegistrationStatus::Approved,
                registered_at: Utc::now(),
            },
            student: StudentSummary {
                id: Uuid::new_v4(),
                roll_number: "21L-0001".to_string(),
                name: "Student".to_string(),
            },
            course,
        }
    }

    #[test]
    fn partitions_by_course_resolution() {
        let resolvable = record(Some(crate::models::CourseSummary {
            id: Uuid::new_v4(),
            code: "CS-101".to_string(),
            title: "Intro".to_string(),
        }));
        let orphan = record(None);
        let orphan_id = orphan.registration.id;

        let (kept, orphans) = partition_orphans(vec![resolvable, orphan]);

        assert_eq!(kept.len(), 1);
        assert_eq!(orphans, vec![orphan_id]);
    }
}
