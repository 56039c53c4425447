//! Known release-group packaging fingerprints.
//!
//! Patterns are case-insensitive and tested against paths relative to the
//! release root, with `/` separators.

use crate::services::parser::group_key;
use regex::{Regex, RegexBuilder};
use std::sync::LazyLock;

#[derive(Debug)]
pub struct ReleaseFingerprint {
    pub group: &'static str,
    pub description: &'static str,
    /// Each pattern must match at least one file.
    pub required: &'static [&'static str],
    /// Extra evidence; used to rank fingerprints that all match.
    pub optional: &'static [&'static str],
    /// Any match disqualifies the fingerprint.
    pub forbidden: &'static [&'static str],
    pub min_bin_files: usize,
}

pub const KNOWN_FINGERPRINTS: &[ReleaseFingerprint] = &[
    ReleaseFingerprint {
        group: "FitGirl",
        description: "FitGirl Repack",
        required: &[r"^setup.*\.exe$", r"^fg-.*\.bin$"],
        optional: &[
            r"^MD5$",
            r"^MD5[\\/]",
            r"perfecthash\.md5$",
            r"^Verify BIN files before installation\.bat$",
        ],
        forbidden: &[r"^crack[\\/]", r"^codex\.", r"^plaza\."],
        min_bin_files: 1,
    },
    ReleaseFingerprint {
        group: "DODI",
        description: "DODI Repack",
        required: &[r"^setup.*\.exe$"],
        optional: &[r"^dodi-.*\.bin$", r"DODi Repacks\.url$", r"^Data[\\/]"],
        forbidden: &[r"^fg-.*\.bin$"],
        min_bin_files: 0,
    },
    ReleaseFingerprint {
        group: "CODEX",
        description: "CODEX Scene Release",
        required: &[r"codex\.nfo$"],
        optional: &[r"^codex-.*\.(iso|bin|r\d{2})$", r"^crack[\\/]"],
        forbidden: &[r"^fg-", r"^dodi-", r"^setup.*\.exe$"],
        min_bin_files: 0,
    },
    ReleaseFingerprint {
        group: "PLAZA",
        description: "PLAZA Scene Release",
        required: &[r"plaza\.nfo$"],
        optional: &[r"^crack[\\/]"],
        forbidden: &[r"^fg-", r"^codex\."],
        min_bin_files: 0,
    },
    ReleaseFingerprint {
        group: "SKIDROW",
        description: "SKIDROW Scene Release",
        required: &[r"skidrow\.nfo$"],
        optional: &[r"^crack[\\/]", r"^skidrow-.*\.(iso|bin|r\d{2})$"],
        forbidden: &[r"^fg-", r"^setup.*\.exe$"],
        min_bin_files: 0,
    },
    ReleaseFingerprint {
        group: "EMPRESS",
        description: "EMPRESS Crack Release",
        required: &[r"empress\.nfo$"],
        optional: &[r"^crack[\\/]", r"EMPRESS"],
        forbidden: &[r"^fg-", r"^setup.*\.exe$"],
        min_bin_files: 0,
    },
    ReleaseFingerprint {
        group: "GOG",
        description: "GOG Installer",
        required: &[r"^setup_.*\.exe$|^gog.*\.exe$"],
        optional: &[r"goggame-\d+\.info$", r"\.bin$"],
        forbidden: &[r"^crack[\\/]", r"\.nfo$"],
        min_bin_files: 0,
    },
    ReleaseFingerprint {
        group: "RUNE",
        description: "RUNE Scene Release",
        required: &[r"rune\.nfo$"],
        optional: &[r"^rune-.*\.(iso|bin|r\d{2})$"],
        forbidden: &[r"^fg-", r"^setup.*\.exe$"],
        min_bin_files: 0,
    },
    ReleaseFingerprint {
        group: "DARKSiDERS",
        description: "DARKSiDERS Scene Release",
        required: &[r"darksiders\.nfo$|dks\.nfo$"],
        optional: &[r"^crack[\\/]"],
        forbidden: &[r"^fg-", r"^setup.*\.exe$"],
        min_bin_files: 0,
    },
    ReleaseFingerprint {
        group: "TiNYiSO",
        description: "TiNYiSO Scene Release",
        required: &[r"tinyiso\.nfo$"],
        optional: &[r"^crack[\\/]"],
        forbidden: &[r"^fg-", r"^setup.*\.exe$"],
        min_bin_files: 0,
    },
    ReleaseFingerprint {
        group: "CHRONOS",
        description: "CHRONOS Scene Release",
        required: &[r"chronos\.nfo$"],
        optional: &[r"^crack[\\/]"],
        forbidden: &[r"^fg-", r"^setup.*\.exe$"],
        min_bin_files: 0,
    },
    ReleaseFingerprint {
        group: "ElAmigos",
        description: "ElAmigos Repack",
        required: &[r"^setup.*\.exe$"],
        optional: &[r"elamigos", r"\.bin$"],
        forbidden: &[r"^fg-", r"codex\.nfo$"],
        min_bin_files: 0,
    },
    ReleaseFingerprint {
        group: "XATAB",
        description: "XATAB Repack",
        required: &[r"^setup.*\.exe$|^autorun\.exe$"],
        optional: &[r"xatab"],
        forbidden: &[r"^fg-", r"codex\.nfo$"],
        min_bin_files: 0,
    },
    ReleaseFingerprint {
        group: "RG.Mechanics",
        description: "R.G. Mechanics Repack",
        required: &[r"^setup.*\.exe$"],
        optional: &[r"R\.G\. ?Mechanics", r"rg.mechanics"],
        forbidden: &[r"^fg-", r"codex\.nfo$"],
        min_bin_files: 0,
    },
    ReleaseFingerprint {
        group: "CPY",
        description: "CPY Scene Release",
        required: &[r"cpy\.nfo$"],
        optional: &[r"^cpy-.*\.(iso|bin|r\d{2})$", r"^crack[\\/]"],
        forbidden: &[r"^fg-", r"^setup.*\.exe$"],
        min_bin_files: 0,
    },
    ReleaseFingerprint {
        group: "HOODLUM",
        description: "HOODLUM Scene Release",
        required: &[r"hoodlum\.nfo$"],
        optional: &[r"^crack[\\/]"],
        forbidden: &[r"^fg-", r"^setup.*\.exe$"],
        min_bin_files: 0,
    },
    ReleaseFingerprint {
        group: "RAZOR1911",
        description: "RAZOR1911 Scene Release",
        required: &[r"razor1911\.nfo$|rzr\.nfo$"],
        optional: &[r"^crack[\\/]"],
        forbidden: &[r"^fg-", r"^setup.*\.exe$"],
        min_bin_files: 0,
    },
];

fn compile(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .map(|p| {
            RegexBuilder::new(p)
                .case_insensitive(true)
                .build()
                .expect("Invalid regex")
        })
        .collect()
}

fn any_file_matches(re: &Regex, files: &[String]) -> bool {
    files.iter().any(|f| re.is_match(f))
}

pub struct CompiledFingerprint {
    pub fingerprint: &'static ReleaseFingerprint,
    required: Vec<Regex>,
    optional: Vec<Regex>,
    forbidden: Vec<Regex>,
}

impl CompiledFingerprint {
    fn new(fingerprint: &'static ReleaseFingerprint) -> Self {
        Self {
            fingerprint,
            required: compile(fingerprint.required),
            optional: compile(fingerprint.optional),
            forbidden: compile(fingerprint.forbidden),
        }
    }

    pub fn group(&self) -> &'static str {
        self.fingerprint.group
    }

    /// `Ok(message)` when the file set fits this fingerprint, `Err(reason)` otherwise.
    pub fn check(&self, files: &[String]) -> Result<String, String> {
        let fp = self.fingerprint;

        if self.required.iter().any(|re| !any_file_matches(re, files)) {
            return Err(format!(
                "Missing expected files for {}: structure does not match known {} pattern",
                fp.group, fp.description
            ));
        }

        for re in &self.forbidden {
            if let Some(file) = files.iter().find(|f| re.is_match(f)) {
                return Err(format!(
                    "Found unexpected file '{}' that should not be in a {}",
                    file, fp.description
                ));
            }
        }

        if fp.min_bin_files > 0 {
            let bin_count = files
                .iter()
                .filter(|f| f.to_lowercase().ends_with(".bin"))
                .count();
            if bin_count < fp.min_bin_files {
                return Err(format!(
                    "Expected at least {} .bin files for {}, found {}",
                    fp.min_bin_files, fp.description, bin_count
                ));
            }
        }

        Ok(format!(
            "Release structure matches expected {} pattern",
            fp.description
        ))
    }

    pub fn optional_hits(&self, files: &[String]) -> usize {
        self.optional
            .iter()
            .filter(|re| any_file_matches(re, files))
            .count()
    }
}

pub static COMPILED_FINGERPRINTS: LazyLock<Vec<CompiledFingerprint>> =
    LazyLock::new(|| KNOWN_FINGERPRINTS.iter().map(CompiledFingerprint::new).collect());

/// Fingerprint for a claimed group name, tolerant of spelling variants.
pub fn find_fingerprint(group: &str) -> Option<&'static CompiledFingerprint> {
    let key = group_key(group);
    COMPILED_FINGERPRINTS
        .iter()
        .find(|fp| group_key(fp.group()) == key)
}

/// Fingerprint fitting the file set with the most optional evidence.
/// Ties go to the earlier table entry.
pub fn best_match(files: &[String]) -> Option<&'static CompiledFingerprint> {
    let mut best: Option<(&'static CompiledFingerprint, usize)> = None;
    for fp in COMPILED_FINGERPRINTS.iter() {
        if fp.check(files).is_err() {
            continue;
        }
        let hits = fp.optional_hits(files);
        if best.map(|(_, top)| hits > top).unwrap_or(true) {
            best = Some((fp, hits));
        }
    }
    best.map(|(fp, _)| fp)
}
