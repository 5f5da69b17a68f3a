//! CQRS marker traits
//!
//! Commands are write operations; queries are reads. The markers document
//! intent on every request type and give cross-cutting concerns (auditing,
//! metrics) a single seam to hang off.

/// Marker for state-changing requests
pub trait Command {}

/// Marker for read-only requests
pub trait Query {}
