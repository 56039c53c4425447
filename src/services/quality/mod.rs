pub mod comparator;
pub mod models;

pub use comparator::{compare_for_upgrade, NotUpgradeReason, QualitySnapshot, UpgradeVerdict};
pub use models::*;
