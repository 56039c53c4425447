//! Text normalization for release and folder names.

use deunicode::deunicode;
use regex::Regex;
use std::sync::LazyLock;

/// Compiled regex for stripping non-alphanumeric characters.
static RE_NON_ALNUM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-zA-Z0-9]").expect("Invalid regex"));

/// Separators used by scene and repack names in place of spaces.
static RE_SEPARATORS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\._]+").expect("Invalid regex"));

/// Prefixes download clients put on folders that are still unpacking or failed.
const DOWNLOAD_MARKERS: &[&str] = &["_UNPACK_", "_FAILED_"];

/// Strip in-progress/failed download markers from a folder name.
pub fn strip_download_markers(name: &str) -> &str {
    let mut current = name;
    loop {
        let before = current;
        for marker in DOWNLOAD_MARKERS {
            if let Some(rest) = current.strip_prefix(marker) {
                current = rest;
            }
        }
        if before == current {
            return current;
        }
    }
}

/// Comparable key for a title.
///
/// Pipeline:
/// 1. Transliterate non-Latin characters via deunicode
/// 2. Strip everything that is not a letter or digit
/// 3. Lowercase
pub fn clean_title(text: &str) -> String {
    let latin = deunicode(text);
    RE_NON_ALNUM.replace_all(&latin, "").to_lowercase()
}

/// Turn dotted/underscored release words back into a spaced title.
pub fn separators_to_spaces(text: &str) -> String {
    RE_SEPARATORS
        .replace_all(text, " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Uppercase key for release group names: `FitGirl Repacks` and `FITGIRL` compare equal.
pub fn group_key(group: &str) -> String {
    let key = clean_title(group).to_uppercase();
    match key.as_str() {
        "FITGIRLREPACK" | "FITGIRLREPACKS" => "FITGIRL".to_string(),
        "DODIREPACK" | "DODIREPACKS" => "DODI".to_string(),
        _ => key,
    }
}
