//! Registration read operations

pub mod list;

pub use list::{ListRegistrationsError, ListRegistrationsQuery, ListRegistrationsResponse};
