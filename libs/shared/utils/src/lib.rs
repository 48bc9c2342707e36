pub mod session;
pub mod tasks;
pub mod test_utils;

pub use session::{FileSessionStore, MemorySessionStore, SessionContext, SessionStore, SessionStoreError};
pub use tasks::ScheduledTask;
