pub mod error;
pub mod models;
pub mod services;

pub use error::{BookingError, SlotRejection};
pub use models::*;
pub use services::{AppointmentViews, BookingOrchestrator, BookingService};
