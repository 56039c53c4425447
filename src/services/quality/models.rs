use regex::RegexBuilder;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Release quality of a game download. Ids are stable and persisted by callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Quality {
    #[default]
    Unknown,
    Scene,
    SceneCracked,
    GOG,
    Steam,
    Epic,
    Origin,
    Uplay,
    Repack,
    RepackAllDLC,
    ISO,
    Retail,
    Portable,
    Preload,
    UpdateOnly,
    MultiLang,
}

impl Quality {
    pub const ALL: [Quality; 16] = [
        Quality::Unknown,
        Quality::Scene,
        Quality::SceneCracked,
        Quality::GOG,
        Quality::Steam,
        Quality::Epic,
        Quality::Origin,
        Quality::Uplay,
        Quality::Repack,
        Quality::RepackAllDLC,
        Quality::ISO,
        Quality::Retail,
        Quality::Portable,
        Quality::Preload,
        Quality::UpdateOnly,
        Quality::MultiLang,
    ];

    pub fn id(&self) -> u8 {
        match self {
            Quality::Unknown => 0,
            Quality::Scene => 1,
            Quality::SceneCracked => 2,
            Quality::GOG => 3,
            Quality::Steam => 4,
            Quality::Epic => 5,
            Quality::Origin => 6,
            Quality::Uplay => 7,
            Quality::Repack => 8,
            Quality::RepackAllDLC => 9,
            Quality::ISO => 10,
            Quality::Retail => 11,
            Quality::Portable => 12,
            Quality::Preload => 13,
            Quality::UpdateOnly => 14,
            Quality::MultiLang => 15,
        }
    }

    pub fn from_id(id: u8) -> Option<Self> {
        Self::ALL.iter().copied().find(|q| q.id() == id)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Quality::Unknown => "Unknown",
            Quality::Scene => "Scene",
            Quality::SceneCracked => "Scene Cracked",
            Quality::GOG => "GOG",
            Quality::Steam => "Steam",
            Quality::Epic => "Epic",
            Quality::Origin => "Origin",
            Quality::Uplay => "Uplay",
            Quality::Repack => "Repack",
            Quality::RepackAllDLC => "Repack All DLC",
            Quality::ISO => "ISO",
            Quality::Retail => "Retail",
            Quality::Portable => "Portable",
            Quality::Preload => "Preload",
            Quality::UpdateOnly => "Update Only",
            Quality::MultiLang => "Multi Language",
        }
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Quality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|q| {
                let name: String = q
                    .name()
                    .chars()
                    .filter(|c| c.is_ascii_alphanumeric())
                    .collect();
                name.to_lowercase() == wanted
            })
            .ok_or_else(|| format!("Unknown quality: {s}"))
    }
}

/// Proper/repack re-release marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Revision {
    pub version: u32,
    pub real: u32,
    pub is_repack: bool,
}

impl Default for Revision {
    fn default() -> Self {
        Self {
            version: 1,
            real: 0,
            is_repack: false,
        }
    }
}

impl Revision {
    /// Orders by version, then by REAL count. The repack flag does not rank.
    pub fn compare(&self, other: &Revision) -> Ordering {
        self.version
            .cmp(&other.version)
            .then(self.real.cmp(&other.real))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct QualityModel {
    pub quality: Quality,
    pub revision: Revision,
}

impl QualityModel {
    pub fn new(quality: Quality) -> Self {
        Self {
            quality,
            revision: Revision::default(),
        }
    }

    pub fn with_revision(quality: Quality, version: u32) -> Self {
        Self {
            quality,
            revision: Revision {
                version,
                ..Revision::default()
            },
        }
    }
}

impl fmt::Display for QualityModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} v{}", self.quality, self.revision.version)?;
        if self.revision.real > 0 {
            write!(f, " REAL")?;
        }
        Ok(())
    }
}

/// How proper and repack revisions take part in upgrades.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ProperDownloadTypes {
    #[default]
    PreferAndUpgrade,
    DoNotUpgrade,
    DoNotPrefer,
}

/// Tagging rule scored against a release name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomFormat {
    pub name: String,
    /// Case-insensitive regex tested against the release name.
    pub pattern: String,
    pub weight: i32,
}

impl CustomFormat {
    pub fn new(name: &str, pattern: &str, weight: i32) -> Self {
        Self {
            name: name.to_string(),
            pattern: pattern.to_string(),
            weight,
        }
    }

    pub fn matches(&self, release_name: &str) -> bool {
        match RegexBuilder::new(&self.pattern)
            .case_insensitive(true)
            .build()
        {
            Ok(re) => re.is_match(release_name),
            Err(e) => {
                log::warn!("Ignoring custom format '{}': invalid pattern: {e}", self.name);
                false
            }
        }
    }
}

/// Per-title quality preferences.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityProfile {
    pub id: i64,
    pub name: String,
    /// Allowed qualities, least preferred first.
    pub items: Vec<Quality>,
    pub cutoff: Quality,
    pub upgrade_allowed: bool,
    pub format_items: Vec<CustomFormat>,
}

impl Default for QualityProfile {
    fn default() -> Self {
        Self {
            id: 1,
            name: "Any".into(),
            items: Quality::ALL.to_vec(),
            cutoff: Quality::Retail,
            upgrade_allowed: true,
            format_items: Vec::new(),
        }
    }
}

impl QualityProfile {
    /// Position in the profile ordering, `None` when the quality is not allowed.
    pub fn rank(&self, quality: Quality) -> Option<usize> {
        self.items.iter().position(|q| *q == quality)
    }

    /// Qualities missing from the profile sort below every allowed one.
    pub fn compare_quality(&self, left: Quality, right: Quality) -> Ordering {
        self.rank(left).cmp(&self.rank(right))
    }

    pub fn compare_models(&self, left: &QualityModel, right: &QualityModel) -> Ordering {
        self.compare_quality(left.quality, right.quality)
            .then_with(|| left.revision.compare(&right.revision))
    }

    pub fn matched_formats(&self, release_name: &str) -> Vec<&CustomFormat> {
        self.format_items
            .iter()
            .filter(|cf| cf.matches(release_name))
            .collect()
    }

    pub fn format_score(&self, release_name: &str) -> i32 {
        self.matched_formats(release_name)
            .iter()
            .map(|cf| cf.weight)
            .sum()
    }
}
