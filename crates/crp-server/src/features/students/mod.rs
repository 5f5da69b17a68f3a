//! Student account feature
//!
//! Admin-created accounts and the profile view with registrations populated.
//! Credential verification and token issuance live outside this service; the
//! only credential concern here is storing an Argon2id hash.

pub mod commands;
pub mod queries;
pub mod routes;

pub use routes::students_routes;
