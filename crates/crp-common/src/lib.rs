//! CRP Common Library
//!
//! Shared types and utilities for the CRP workspace.
//!
//! # Overview
//!
//! This crate provides the pieces every CRP component needs:
//!
//! - **Logging**: Centralized tracing initialization with console/file/JSON output
//! - **Schedule**: Weekly time-slot primitives and the interval-overlap predicate
//!   used by every conflict check in the platform
//!
//! # Example
//!
//! ```
//! use crp_common::schedule::{overlaps, to_minutes};
//!
//! let a_start = to_minutes("10:00").unwrap();
//! let a_end = to_minutes("11:00").unwrap();
//! let b_start = to_minutes("11:00").unwrap();
//! let b_end = to_minutes("12:00").unwrap();
//!
//! // Touching intervals do not overlap
//! assert!(!overlaps(a_start, a_end, b_start, b_end));
//! ```

pub mod logging;
pub mod schedule;

// Re-export commonly used types
pub use schedule::{TimeParseError, TimeSlot, Weekday};
