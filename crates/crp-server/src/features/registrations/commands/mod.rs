//! Registration write operations

pub mod cancel;
pub mod register;
pub mod update_status;

pub use cancel::{CancelRegistrationCommand, CancelRegistrationError, CancelRegistrationResponse};
pub use register::{RegisterCommand, RegisterError, RegisterResponse};
pub use update_status::{
    UpdateRegistrationStatusCommand, UpdateRegistrationStatusError,
    UpdateRegistrationStatusResponse,
};
