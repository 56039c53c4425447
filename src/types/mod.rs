pub mod errors;
pub mod import;
pub mod library;

pub use errors::{ImportError, ImportResult, RecycleBinError};
pub use import::*;
pub use library::*;
