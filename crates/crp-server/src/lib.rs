//! CRP Server Library
//!
//! HTTP service for a university course-registration platform.
//!
//! # Overview
//!
//! - **Courses**: admin-managed catalog with weekly schedules, prerequisites,
//!   and seat capacity; advisory room-conflict checking on create/update
//! - **Registrations**: the eligibility engine (seats, duplicates, personal
//!   schedule conflicts, prerequisites), admin status transitions with
//!   compensating seat accounting, cancellations, and the orphan sweep
//! - **Students**: accounts and profiles
//!
//! # Architecture
//!
//! The server follows a **CQRS (Command Query Responsibility Segregation)**
//! layout: every operation is a vertical slice under `features/` with its own
//! request type, validation, error enum, and handler function. Handlers
//! depend on the [`store::RegistryStore`] port, never on a concrete database
//! handle; the port ships with PostgreSQL (sqlx) and in-memory backends, and
//! every multi-step mutation is a single atomic store operation.
//!
//! ## Framework Stack
//!
//! - **Axum**: HTTP routing and extraction
//! - **SQLx**: PostgreSQL access behind the storage port
//! - **Tower / tower-http**: middleware (request tracing)
//! - **mediator**: dispatch surface over the same command/query handlers
//!
//! # Example
//!
//! ```no_run
//! use crp_server::{api, config::Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load()?;
//!     api::serve(config).await?;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod config;
pub mod cqrs;
pub mod features;
pub mod models;
pub mod store;
