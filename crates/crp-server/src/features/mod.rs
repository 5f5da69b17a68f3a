//! Feature modules implementing the CRP API
//!
//! Every feature is a vertical slice following the CQRS (Command Query
//! Responsibility Segregation) pattern:
//!
//! - `commands/` - Write operations (create, update, delete, register, cancel)
//! - `queries/` - Read operations (get, list, conflict preview)
//! - `routes.rs` - HTTP route definitions and error mapping
//! - `types.rs` - Shared wire types (where needed)
//!
//! # Features
//!
//! - **courses**: Catalog management, advisory conflict checking, deletion
//!   cascade, seat-notification subscriptions
//! - **registrations**: The eligibility engine, status transitions,
//!   cancellations, listings with the orphan sweep
//! - **students**: Account creation and profiles
//!
//! Commands and queries implement the mediator pattern using the `mediator`
//! crate; HTTP routes call the same handler functions directly.

pub mod courses;
pub mod registrations;
pub mod shared;
pub mod students;

use axum::Router;

use crate::store::DynStore;

/// Shared state for all feature routes
#[derive(Clone)]
pub struct FeatureState {
    /// Storage port handle shared by every handler
    pub store: DynStore,
}

/// Creates the main API router with all feature routes mounted
///
/// Each feature is mounted under its own path prefix:
/// - `/courses` - Catalog management and conflict checks
/// - `/registrations` - Registration lifecycle
/// - `/students` - Accounts and profiles
pub fn router(state: FeatureState) -> Router<()> {
    Router::new()
        .nest("/courses", courses::courses_routes().with_state(state.store.clone()))
        .nest(
            "/registrations",
            registrations::registrations_routes().with_state(state.store.clone()),
        )
        .nest("/students", students::students_routes().with_state(state.store.clone()))
}
