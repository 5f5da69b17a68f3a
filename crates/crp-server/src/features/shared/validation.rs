//! Shared validation utilities
//!
//! Field-level checks used by the course and student commands. Schedule-slot
//! validation builds on the primitives in [`crp_common::schedule`].

use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;

/// Errors produced by input validation
///
/// Every variant maps to a 400 response with its message rendered verbatim,
/// so the wording is user-facing.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{field} is required and cannot be empty")]
    Required { field: &'static str },

    #[error("{field} must be a positive number")]
    NonPositive { field: &'static str },

    #[error("Course code should be in format DEPT-NNN (e.g., CS-101)")]
    CodeFormat,

    #[error("Available seats cannot be negative")]
    AvailableNegative,

    #[error("Available seats cannot exceed total seats")]
    AvailableExceedsTotal,

    #[error("Each schedule entry must have day, start time, end time, and room")]
    SlotIncomplete,

    #[error("Unknown day '{0}': expected Mon-Fri")]
    UnknownDay(String),

    #[error("Invalid schedule entry: {0}")]
    Slot(String),

    #[error("A course cannot be its own prerequisite")]
    SelfPrerequisite,

    #[error("At least one field must be provided for update")]
    NoFieldsToUpdate,
}

fn course_code_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Z]{2,4}-\d{3,4}$").expect("course code pattern is valid")
    })
}

/// Validate a course code against the `DEPT-NNN` format
///
/// 2-4 uppercase letters, a hyphen, then 3-4 digits (e.g. `CS-101`,
/// `MATH-2001`).
pub fn validate_course_code(code: &str) -> Result<(), ValidationError> {
    if code.is_empty() {
        return Err(ValidationError::Required {
            field: "Course code",
        });
    }
    if !course_code_pattern().is_match(code) {
        return Err(ValidationError::CodeFormat);
    }
    Ok(())
}

/// Require a non-empty, non-whitespace string field
pub fn validate_required(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required { field });
    }
    Ok(())
}

/// Require a strictly positive integer field
pub fn validate_positive(field: &'static str, value: i32) -> Result<(), ValidationError> {
    if value <= 0 {
        return Err(ValidationError::NonPositive { field });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_valid_course_codes() {
        for code in ["CS-101", "EE-2301", "MATH-101", "SE-1001"] {
            assert!(validate_course_code(code).is_ok(), "rejected {code}");
        }
    }

    #[test]
    fn rejects_malformed_course_codes() {
        for code in ["cs-101", "C-101", "TOOLONG-101", "CS101", "CS-12", "CS-12345", "CS-1a1"] {
            assert!(validate_course_code(code).is_err(), "accepted {code}");
        }
    }

    #[test]
    fn empty_code_reports_required() {
        assert_eq!(
            validate_course_code(""),
            Err(ValidationError::Required {
                field: "Course code"
            })
        );
    }

    #[test]
    fn required_rejects_whitespace_only() {
        assert!(validate_required("Title", "   ").is_err());
        assert!(validate_required("Title", "Algorithms").is_ok());
    }

    #[test]
    fn positive_rejects_zero_and_negative() {
        assert!(validate_positive("Level", 0).is_err());
        assert!(validate_positive("Level", -3).is_err());
        assert!(validate_positive("Level", 1).is_ok());
    }
}
