//! Course write operations

pub mod create;
pub mod delete;
pub mod subscribe;
pub mod update;

pub use create::{CreateCourseCommand, CreateCourseError, CreateCourseResponse};
pub use delete::{DeleteCourseCommand, DeleteCourseError, DeleteCourseResponse};
pub use subscribe::{SubscribeCommand, SubscribeError, SubscribeResponse};
pub use update::{UpdateCourseCommand, UpdateCourseError, UpdateCourseResponse};
