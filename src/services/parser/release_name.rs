//! Release-name parsing: title, year, group, quality and revision.
//!
//! Works on scene style (`Some.Game.PROPER-CODEX`) and repack style
//! (`Some Game [FitGirl Repack]`) names. Pure and deterministic.

use super::normalizer::{clean_title, group_key, separators_to_spaces};
use crate::services::quality::{Quality, QualityModel, Revision};
use crate::services::scanner::walker;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::LazyLock;

static RE_BRACKET_GROUP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\[\s*(FitGirl|DODI|ElAmigos|XATAB|R\.?\s?G\.?\s?Mechanics|KaOs|Darck)(?:[\s\.]+Repacks?)?\s*\]",
    )
    .expect("Invalid regex")
});

static RE_GROUP_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-([A-Za-z0-9]{2,})\s*$").expect("Invalid regex"));

static RE_YEAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b((?:19|20)\d{2})\b").expect("Invalid regex"));

static RE_TITLE_END: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)[\s\._\-\(\[](?:(?:19|20)\d{2}\b|v\d+(?:\.\d+)*\b|build[\s\._]?\d+|update\b|proper\b|repack\b|rerip\b|real\b|multi\d*\b|gog\b|steam(?:rip)?\b|epic\b|origin\b|uplay\b|portable\b|preload\b|retail\b|iso\b|crack(?:ed|fix|only)?\b|incl\b|all[\s\._]?dlcs?\b)",
    )
    .expect("Invalid regex")
});

static RE_PROPER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:proper|rerip)\b").expect("Invalid regex"));
static RE_REPACK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\brepack\b").expect("Invalid regex"));
static RE_REAL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\bREAL\b").expect("Invalid regex"));

static RE_UPDATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bupdate\b").expect("Invalid regex"));
static RE_PRELOAD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bpreload\b").expect("Invalid regex"));
static RE_ALL_DLC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\ball[\s\-]?dlcs?\b").expect("Invalid regex"));
static RE_GOG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bgog\b").expect("Invalid regex"));
static RE_STEAM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bsteam(?:rip)?\b").expect("Invalid regex"));
static RE_EPIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bepic(?:\s?games)?\b").expect("Invalid regex"));
static RE_ORIGIN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\borigin\b").expect("Invalid regex"));
static RE_UPLAY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:uplay|ubisoft\s?connect)\b").expect("Invalid regex"));
static RE_PORTABLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bportable\b").expect("Invalid regex"));
static RE_CRACK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bcrack(?:ed|fix|only)?\b").expect("Invalid regex"));
static RE_ISO: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\biso\b").expect("Invalid regex"));
static RE_RETAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bretail\b").expect("Invalid regex"));
static RE_MULTI: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bmulti\d*\b").expect("Invalid regex"));

/// Repack groups, as `group_key` output.
const REPACK_GROUPS: &[&str] = &[
    "FITGIRL", "DODI", "ELAMIGOS", "XATAB", "RGMECHANICS", "KAOS", "DARCK",
];

/// Scene groups, as `group_key` output.
const SCENE_GROUPS: &[&str] = &[
    "CODEX", "PLAZA", "SKIDROW", "EMPRESS", "RUNE", "DARKSIDERS", "TINYISO", "CHRONOS", "CPY",
    "HOODLUM", "RAZOR1911", "RELOADED", "PROPHET", "FLT", "HI2U", "DOGE", "TENOKE",
];

/// Metadata recovered from a release, folder or file name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedReleaseInfo {
    /// The name as given.
    pub release_title: String,
    pub title: String,
    pub clean_title: String,
    pub year: Option<u32>,
    pub release_group: Option<String>,
    pub quality: QualityModel,
}

/// Parse a release name. Returns `None` when no title survives parsing.
pub fn parse_release_name(name: &str) -> Option<ParsedReleaseInfo> {
    let name = name.trim();
    if name.is_empty() {
        return None;
    }

    let (remainder, release_group) = split_release_group(name);
    let spaced = separators_to_spaces(name);

    let title_part = match RE_TITLE_END.find(&remainder) {
        Some(m) if m.start() > 0 => &remainder[..m.start()],
        _ => remainder.as_str(),
    };
    let title = separators_to_spaces(title_part)
        .trim_matches(|c: char| c == '-' || c.is_whitespace())
        .to_string();
    let clean = clean_title(&title);
    if clean.is_empty() {
        return None;
    }

    let year = RE_YEAR
        .captures_iter(&separators_to_spaces(&remainder))
        .filter(|c| c.get(0).map(|m| m.start() > 0).unwrap_or(false))
        .find_map(|c| c.get(1).and_then(|m| m.as_str().parse::<u32>().ok()));

    let key = release_group.as_deref().map(group_key);
    let quality = detect_quality(&spaced, key.as_deref());
    let revision = detect_revision(&spaced, quality);

    Some(ParsedReleaseInfo {
        release_title: name.to_string(),
        title,
        clean_title: clean,
        year,
        release_group,
        quality: QualityModel { quality, revision },
    })
}

/// Parse the last component of a path, dropping a known file extension.
pub fn parse_path(path: &Path) -> Option<ParsedReleaseInfo> {
    let name = path.file_name()?.to_string_lossy().to_string();
    let has_known_extension = path
        .extension()
        .map(|ext| walker::is_known_extension(&ext.to_string_lossy()))
        .unwrap_or(false);

    if has_known_extension {
        let stem = path.file_stem()?.to_string_lossy().to_string();
        parse_release_name(&stem)
    } else {
        parse_release_name(&name)
    }
}

fn split_release_group(name: &str) -> (String, Option<String>) {
    if let Some(caps) = RE_BRACKET_GROUP.captures(name) {
        if let (Some(whole), Some(group)) = (caps.get(0), caps.get(1)) {
            let mut remainder = String::with_capacity(name.len());
            remainder.push_str(&name[..whole.start()]);
            remainder.push_str(&name[whole.end()..]);
            return (remainder.trim().to_string(), Some(group.as_str().to_string()));
        }
    }

    if let Some(caps) = RE_GROUP_SUFFIX.captures(name) {
        if let (Some(whole), Some(group)) = (caps.get(0), caps.get(1)) {
            let prefix = &name[..whole.start()];
            let group = group.as_str();
            // `Half-Life` is a title, `Some.Game-CODEX` is a release
            let looks_like_release = prefix.contains('.')
                || prefix.contains('_')
                || group.chars().filter(|c| c.is_ascii_uppercase()).count() * 2
                    >= group.chars().filter(|c| c.is_ascii_alphabetic()).count().max(1);
            if looks_like_release && !prefix.trim().is_empty() {
                return (prefix.trim().to_string(), Some(group.to_string()));
            }
        }
    }

    (name.to_string(), None)
}

fn detect_quality(spaced: &str, group: Option<&str>) -> Quality {
    let repacker = group.map(|g| REPACK_GROUPS.contains(&g)).unwrap_or(false);
    let scene = group.map(|g| SCENE_GROUPS.contains(&g)).unwrap_or(false);

    if RE_UPDATE.is_match(spaced) {
        Quality::UpdateOnly
    } else if RE_PRELOAD.is_match(spaced) {
        Quality::Preload
    } else if repacker || (!scene && RE_REPACK.is_match(spaced)) {
        if RE_ALL_DLC.is_match(spaced) {
            Quality::RepackAllDLC
        } else {
            Quality::Repack
        }
    } else if RE_GOG.is_match(spaced) {
        Quality::GOG
    } else if RE_STEAM.is_match(spaced) {
        Quality::Steam
    } else if RE_EPIC.is_match(spaced) {
        Quality::Epic
    } else if RE_ORIGIN.is_match(spaced) {
        Quality::Origin
    } else if RE_UPLAY.is_match(spaced) {
        Quality::Uplay
    } else if RE_PORTABLE.is_match(spaced) {
        Quality::Portable
    } else if RE_CRACK.is_match(spaced) {
        Quality::SceneCracked
    } else if scene {
        Quality::Scene
    } else if RE_ISO.is_match(spaced) {
        Quality::ISO
    } else if RE_RETAIL.is_match(spaced) {
        Quality::Retail
    } else if RE_MULTI.is_match(spaced) {
        Quality::MultiLang
    } else {
        Quality::Unknown
    }
}

fn detect_revision(spaced: &str, quality: Quality) -> Revision {
    let repack_is_quality = matches!(quality, Quality::Repack | Quality::RepackAllDLC);
    let is_repack = !repack_is_quality && RE_REPACK.is_match(spaced);
    let is_proper = RE_PROPER.is_match(spaced);

    Revision {
        version: if is_proper || is_repack { 2 } else { 1 },
        real: RE_REAL.find_iter(spaced).count() as u32,
        is_repack,
    }
}

#[cfg(test)]
#[path = "tests/release_name_tests.rs"]
mod tests;
