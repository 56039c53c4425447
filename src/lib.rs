pub mod services;
pub mod types;
#[cfg(test)]
pub mod test_utils;

pub use services::config::{ConfigService, ImportSettings};
pub use services::import::{DownloadedImportService, ImportServices};
pub use types::{ImportError, ImportMode, ImportOutcome, ImportResult, Rejection, RejectionReason};
