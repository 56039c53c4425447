pub mod organizer;
pub mod recycle_bin;

pub use organizer::{FileOrganizer, ReplaceOutcome, ReplacedFile};
pub use recycle_bin::{RecycleBin, RecycleEntry};
