pub mod booking;
pub mod orchestrator;
pub mod views;

pub use booking::BookingService;
pub use orchestrator::BookingOrchestrator;
pub use views::AppointmentViews;
