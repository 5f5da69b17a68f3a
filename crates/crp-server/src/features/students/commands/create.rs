//! Create student command
//!
//! Passwords are hashed with Argon2id before they reach the store; the raw
//! password never leaves this handler.

use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHasher};
use mediator::Request;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{NewUser, Role};
use crate::store::{DynStore, RegistryStore, StoreError};

/// Command to create a user account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateStudentCommand {
    pub roll_number: String,
    pub name: String,
    /// Raw password; hashed before storage and never echoed back.
    pub password: String,
    /// Defaults to `student`; admin accounts are created the same way.
    #[serde(default)]
    pub role: Option<Role>,
}

/// Response from creating a user account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateStudentResponse {
    pub id: Uuid,
    pub roll_number: String,
    pub name: String,
    pub role: Role,
}

/// Errors that can occur when creating an account
#[derive(Debug, thiserror::Error)]
pub enum CreateStudentError {
    #[error("Roll number is required and cannot be empty")]
    RollNumberRequired,

    #[error("Name is required and cannot be empty")]
    NameRequired,

    #[error("Password must be at least 6 characters")]
    PasswordTooShort,

    #[error("A user with roll number '{0}' already exists")]
    DuplicateRollNumber(String),

    #[error("Password hashing failed: {0}")]
    Hashing(String),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}

impl Request<Result<CreateStudentResponse, CreateStudentError>> for CreateStudentCommand {}

impl crate::cqrs::middleware::Command for CreateStudentCommand {}

impl CreateStudentCommand {
    /// Validates the command parameters
    ///
    /// # Errors
    ///
    /// - `RollNumberRequired` - roll number empty or whitespace
    /// - `NameRequired` - name empty or whitespace
    /// - `PasswordTooShort` - fewer than 6 characters
    pub fn validate(&self) -> Result<(), CreateStudentError> {
        if self.roll_number.trim().is_empty() {
            return Err(CreateStudentError::RollNumberRequired);
        }
        if self.name.trim().is_empty() {
            return Err(CreateStudentError::NameRequired);
        }
        if self.password.chars().count() < 6 {
            return Err(CreateStudentError::PasswordTooShort);
        }
        Ok(())
    }
}

fn hash_password(password: &str) -> Result<String, CreateStudentError> {
    let salt = SaltString::generate(&mut argon2::password_hash::rand_core::OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| CreateStudentError::Hashing(e.to_string()))
}

/// Handler for account creation
#[tracing::instrument(skip(store, command), fields(roll_number = %command.roll_number))]
pub async fn handle(
    store: DynStore,
    command: CreateStudentCommand,
) -> Result<CreateStudentResponse, CreateStudentError> {
    command.validate()?;

    let password_hash = hash_password(&command.password)?;

    let user = store
        .insert_user(NewUser {
            roll_number: command.roll_number.trim().to_string(),
            name: command.name.trim().to_string(),
            password_hash,
            role: command.role.unwrap_or(Role::Student),
        })
        .await
        .map_err(|e| match e {
            StoreError::DuplicateRollNumber(roll) => {
                CreateStudentError::DuplicateRollNumber(roll)
            }
            other => other.into(),
        })?;

    tracing::info!(user_id = %user.id, role = %user.role.as_str(), "User account created");

    Ok(CreateStudentResponse {
        id: user.id,
        roll_number: user.roll_number,
        name: user.name,
        role: user.role,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;
    use std::sync::Arc;

    fn command_fixture() -> CreateStudentCommand {
        CreateStudentCommand {
            roll_number: "21L-0001".to_string(),
            name: "Ada Lovelace".to_string(),
            password: "correct-horse".to_string(),
            role: None,
        }
    }

    #[test]
    fn validation_rejects_blank_fields_and_short_passwords() {
        let mut cmd = command_fixture();
        cmd.roll_number = "  ".to_string();
        assert!(matches!(
            cmd.validate(),
            Err(CreateStudentError::RollNumberRequired)
        ));

        let mut cmd = command_fixture();
        cmd.password = "abc".to_string();
        assert!(matches!(
            cmd.validate(),
            Err(CreateStudentError::PasswordTooShort)
        ));
    }

    #[tokio::test]
    async fn creates_a_student_with_hashed_password() {
        let store: DynStore = Arc::new(MemoryStore::new());

        let response = handle(store.clone(), command_fixture()).await.unwrap();

        assert_eq!(response.role, Role::Student);
        let user = store.user(response.id).await.unwrap().unwrap();
        assert!(user.password_hash.starts_with("$argon2"));
        assert_ne!(user.password_hash, "correct-horse");
    }

    #[tokio::test]
    async fn duplicate_roll_number_is_rejected() {
        let store: DynStore = Arc::new(MemoryStore::new());
        handle(store.clone(), command_fixture()).await.unwrap();

        let result = handle(store, command_fixture()).await;
        assert!(matches!(
            result,
            Err(CreateStudentError::DuplicateRollNumber(_))
        ));
    }
}
