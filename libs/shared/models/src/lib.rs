pub mod api;
pub mod auth;
pub mod error;

pub use api::{DataEnvelope, ErrorBody, SuccessEnvelope};
pub use auth::{Session, UserIdentity, UserRole};
pub use error::{AppError, ErrorCategory, Redirect};
