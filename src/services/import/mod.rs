//! Import decision engine: decide what a finished download is and move it
//! into the library.

pub mod approved;
pub mod decision_maker;
pub mod naming;
pub mod orchestrator;
pub mod ports;
pub mod specifications;

pub use approved::ImportApprovedTitles;
pub use decision_maker::{DecisionRequest, ImportDecisionMaker};
pub use naming::StandardNamingBuilder;
pub use orchestrator::{DownloadedImportService, ImportServices};
pub use ports::{HistoryProvider, MediaFileIndex, MediaInfoReader, NamingBuilder, TitleCatalog};
pub use specifications::{default_specifications, ImportSpecification, SpecDecision};
