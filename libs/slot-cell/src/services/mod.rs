pub mod directory;
pub mod repository;

pub use directory::{SlotDirectory, TherapistSchedule};
pub use repository::{group_by_therapist, normalize_date, normalize_time, SlotRepositoryClient};
