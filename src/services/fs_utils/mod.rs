pub mod disk;
pub mod file_utils;
pub mod path_utils;

pub use disk::{DiskProvider, LocalDiskProvider};
