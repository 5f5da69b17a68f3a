//! Course catalog feature
//!
//! Commands cover admin course management (create, update, delete,
//! subscribe); queries cover the public catalog plus the standalone advisory
//! schedule-conflict check.

pub mod commands;
pub mod conflicts;
pub mod queries;
pub mod routes;
pub mod types;

pub use routes::courses_routes;
