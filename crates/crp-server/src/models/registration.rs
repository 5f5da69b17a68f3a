//! Registration model and the seat-accounting state machine
//!
//! A registration moves through `pending`, `approved`, `rejected`, and
//! deletion. Seat counters compensate specific transitions only; the rules
//! live here as pure functions so both storage backends apply identical
//! arithmetic inside their atomic sections.
//!
//! The adjustment is decided from the status *before* the update is applied.
//! Capture the prior value first; comparing against the already-written field
//! always sees the new status on both sides and never compensates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Registration lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistrationStatus {
    Pending,
    Approved,
    Rejected,
}

impl RegistrationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RegistrationStatus::Pending => "pending",
            RegistrationStatus::Approved => "approved",
            RegistrationStatus::Rejected => "rejected",
        }
    }
}

impl std::fmt::Display for RegistrationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RegistrationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(RegistrationStatus::Pending),
            "approved" => Ok(RegistrationStatus::Approved),
            "rejected" => Ok(RegistrationStatus::Rejected),
            other => Err(format!("unknown registration status: {other}")),
        }
    }
}

/// A student's registration for one course
///
/// At most one registration exists per (student, course) pair.
/// `registered_at` is set at creation and never changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Registration {
    pub id: Uuid,
    pub student_id: Uuid,
    pub course_id: Uuid,
    pub status: RegistrationStatus,
    pub registered_at: DateTime<Utc>,
}

/// Seat adjustment for an admin status change
///
/// Only two transitions move seats: re-approving a rejected registration
/// takes a seat back (−1), rejecting an approved registration frees one (+1).
/// Everything else, including writing the same status again, is neutral.
pub fn seat_delta(previous: RegistrationStatus, next: RegistrationStatus) -> i32 {
    use RegistrationStatus::{Approved, Rejected};

    match (previous, next) {
        (Rejected, Approved) => -1,
        (Approved, Rejected) => 1,
        _ => 0,
    }
}

/// Seat adjustment for deleting a registration
///
/// Cancelling an approved registration frees its seat; pending and rejected
/// registrations never held one.
pub fn release_on_delete(status: RegistrationStatus) -> i32 {
    match status {
        RegistrationStatus::Approved => 1,
        RegistrationStatus::Pending | RegistrationStatus::Rejected => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use RegistrationStatus::{Approved, Pending, Rejected};

    #[test]
    fn reapproval_takes_a_seat() {
        assert_eq!(seat_delta(Rejected, Approved), -1);
    }

    #[test]
    fn rejection_of_approved_frees_a_seat() {
        assert_eq!(seat_delta(Approved, Rejected), 1);
    }

    #[test]
    fn neutral_transitions_do_not_move_seats() {
        assert_eq!(seat_delta(Pending, Approved), 0);
        assert_eq!(seat_delta(Pending, Rejected), 0);
        assert_eq!(seat_delta(Approved, Pending), 0);
        assert_eq!(seat_delta(Rejected, Pending), 0);
        for status in [Pending, Approved, Rejected] {
            assert_eq!(seat_delta(status, status), 0);
        }
    }

    #[test]
    fn only_approved_registrations_release_a_seat_on_delete() {
        assert_eq!(release_on_delete(Approved), 1);
        assert_eq!(release_on_delete(Pending), 0);
        assert_eq!(release_on_delete(Rejected), 0);
    }

    #[test]
    fn reject_then_reapprove_round_trips_to_zero() {
        // The compensating pair from the admin workflow: reject (+1) then
        // re-approve (-1) leaves the counter where it started.
        assert_eq!(seat_delta(Approved, Rejected) + seat_delta(Rejected, Approved), 0);
    }

    #[test]
    fn status_round_trips_through_strings() {
        for status in [Pending, Approved, Rejected] {
            assert_eq!(status.as_str().parse::<RegistrationStatus>().unwrap(), status);
        }
        assert!("cancelled".parse::<RegistrationStatus>().is_err());
    }
}
