pub mod fingerprints;
pub mod structure_validator;

pub use structure_validator::{ReleaseStructureValidator, StructureConfidence, StructureValidation};
