pub mod error;
pub mod models;
pub mod services;

pub use error::SlotError;
pub use models::*;
pub use services::{SlotDirectory, SlotRepositoryClient};
