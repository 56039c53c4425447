pub mod normalizer;
pub mod release_name;

pub use normalizer::{clean_title, group_key, strip_download_markers};
pub use release_name::{parse_path, parse_release_name, ParsedReleaseInfo};
