//! Mediator wiring for every command and query handler
//!
//! HTTP routes call the handler functions directly; the mediator exposes the
//! same handlers behind one dispatch surface for programmatic composition.

pub use mediator::DefaultAsyncMediator;

pub mod middleware;

use crate::store::DynStore;

pub type AppMediator = DefaultAsyncMediator;

pub fn build_mediator(store: DynStore) -> AppMediator {
    DefaultAsyncMediator::builder()
        // Courses
        .add_handler({
            let store = store.clone();
            move |cmd| {
                let store = store.clone();
                async move { crate::features::courses::commands::create::handle(store, cmd).await }
            }
        })
        .add_handler({
            let store = store.clone();
            move |cmd| {
                let store = store.clone();
                async move { crate::features::courses::commands::update::handle(store, cmd).await }
            }
        })
        .add_handler({
            let store = store.clone();
            move |cmd| {
                let store = store.clone();
                async move { crate::features::courses::commands::delete::handle(store, cmd).await }
            }
        })
        .add_handler({
            let store = store.clone();
            move |cmd| {
                let store = store.clone();
                async move { crate::features::courses::commands::subscribe::handle(store, cmd).await }
            }
        })
        .add_handler({
            let store = store.clone();
            move |query| {
                let store = store.clone();
                async move { crate::features::courses::queries::get::handle(store, query).await }
            }
        })
        .add_handler({
            let store = store.clone();
            move |query| {
                let store = store.clone();
                async move { crate::features::courses::queries::list::handle(store, query).await }
            }
        })
        .add_handler({
            let store = store.clone();
            move |query| {
                let store = store.clone();
                async move {
                    crate::features::courses::queries::check_conflicts::handle(store, query).await
                }
            }
        })
        // Registrations
        .add_handler({
            let store = store.clone();
            move |cmd| {
                let store = store.clone();
                async move {
                    crate::features::registrations::commands::register::handle(store, cmd).await
                }
            }
        })
        .add_handler({
            let store = store.clone();
            move |cmd| {
                let store = store.clone();
                async move {
                    crate::features::registrations::commands::update_status::handle(store, cmd)
                        .await
                }
            }
        })
        .add_handler({
            let store = store.clone();
            move |cmd| {
                let store = store.clone();
                async move {
                    crate::features::registrations::commands::cancel::handle(store, cmd).await
                }
            }
        })
        .add_handler({
            let store = store.clone();
            move |query| {
                let store = store.clone();
                async move {
                    crate::features::registrations::queries::list::handle(store, query).await
                }
            }
        })
        // Students
        .add_handler({
            let store = store.clone();
            move |cmd| {
                let store = store.clone();
                async move { crate::features::students::commands::create::handle(store, cmd).await }
            }
        })
        .add_handler({
            let store = store.clone();
            move |query| {
                let store = store.clone();
                async move { crate::features::students::queries::get::handle(store, query).await }
            }
        })
        .build()
}
