pub mod messages;
pub mod poller;

pub use messages::MessageService;
pub use poller::UnreadPoller;
