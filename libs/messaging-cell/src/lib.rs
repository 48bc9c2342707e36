pub mod error;
pub mod models;
pub mod services;

pub use error::MessagingError;
pub use models::*;
pub use services::{MessageService, UnreadPoller};
