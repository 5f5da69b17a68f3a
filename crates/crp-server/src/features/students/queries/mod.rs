//! Student read operations

pub mod get;

pub use get::{GetStudentError, GetStudentQuery, StudentProfile};
