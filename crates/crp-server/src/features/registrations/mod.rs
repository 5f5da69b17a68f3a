//! Registration feature
//!
//! The core of the platform: the eligibility engine that decides
//! admit/reject, the state machine driving admin status changes and
//! cancellations, and the listing path that sweeps orphaned registrations.

pub mod commands;
pub mod eligibility;
pub mod queries;
pub mod routes;
pub mod sweep;

pub use routes::registrations_routes;
