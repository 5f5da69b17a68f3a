//! User model
//!
//! Students and administrators share one account type. A user's
//! `registered_courses` list is the exact inverse of `Registration.student_id`
//! and is only written inside the store operations that create or delete
//! registrations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Admin => "admin",
        }
    }

    pub fn is_admin(self) -> bool {
        matches!(self, Role::Admin)
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "student" => Ok(Role::Student),
            "admin" => Ok(Role::Admin),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub roll_number: String,
    pub name: String,
    /// Argon2id PHC string; never serialized into API responses.
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub registered_courses: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Input for creating a user; the password is already hashed by the command
/// layer.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub roll_number: String,
    pub name: String,
    pub password_hash: String,
    pub role: Role,
}
