pub mod detector;

pub use detector::{SampleClassification, SampleDetector};
