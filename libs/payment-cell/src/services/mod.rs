pub mod history;
pub mod initiator;
pub mod phone;

pub use history::PaymentHistory;
pub use initiator::{PaymentInitiator, PendingRedirect};
pub use phone::normalize_phone;
