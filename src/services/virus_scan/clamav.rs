//! `clamscan` command-line adapter with a small result cache.

use super::{InfectedFile, VirusScanResult, VirusScanner};
use crate::services::config::ImportSettings;
use lru::LruCache;
use regex::Regex;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::{LazyLock, Mutex};
use std::time::{Duration, Instant, SystemTime};

const CACHE_CAPACITY: usize = 256;
const CACHE_TTL: Duration = Duration::from_secs(60 * 60);

const KNOWN_LOCATIONS: &[&str] = &[
    "/usr/bin/clamscan",
    "/usr/local/bin/clamscan",
    "/opt/homebrew/bin/clamscan",
    r"C:\Program Files\ClamAV\clamscan.exe",
    r"C:\Program Files (x86)\ClamAV\clamscan.exe",
];

static FOUND_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.+?):\s+(.+?)\s+FOUND$").expect("Invalid regex"));
static SCANNED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Scanned files:\s*(\d+)").expect("Invalid regex"));

struct CachedScan {
    result: VirusScanResult,
    modified: Option<SystemTime>,
    cached_at: Instant,
}

pub struct ClamAvScanner {
    enabled: bool,
    executable: Option<PathBuf>,
    extra_args: Vec<String>,
    cache: Mutex<LruCache<PathBuf, CachedScan>>,
}

impl ClamAvScanner {
    pub fn new(enabled: bool, configured_path: Option<&Path>, arguments: Option<&str>) -> Self {
        let executable = if enabled {
            resolve_executable(configured_path)
        } else {
            None
        };
        if enabled && executable.is_none() {
            log::warn!("Virus scanning enabled but clamscan was not found");
        }

        Self {
            enabled,
            executable,
            extra_args: arguments
                .map(|a| a.split_whitespace().map(str::to_string).collect())
                .unwrap_or_default(),
            cache: Mutex::new(LruCache::new(
                NonZeroUsize::new(CACHE_CAPACITY).unwrap_or(NonZeroUsize::MIN),
            )),
        }
    }

    pub fn from_settings(settings: &ImportSettings) -> Self {
        Self::new(
            settings.virus_scan_enabled,
            settings.virus_scanner_path.as_deref(),
            settings.virus_scanner_arguments.as_deref(),
        )
    }

    pub fn executable(&self) -> Option<&Path> {
        self.executable.as_deref()
    }

    fn cached(&self, path: &Path, modified: Option<SystemTime>) -> Option<VirusScanResult> {
        let mut cache = self
            .cache
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(entry) = cache.get(path) {
            if entry.cached_at.elapsed() < CACHE_TTL && entry.modified == modified {
                return Some(entry.result.clone());
            }
            cache.pop(path);
        }
        None
    }

    fn remember(&self, path: &Path, modified: Option<SystemTime>, result: &VirusScanResult) {
        // Incomplete scans are retried next time
        if !result.completed {
            return;
        }
        self.cache
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .put(
                path.to_path_buf(),
                CachedScan {
                    result: result.clone(),
                    modified,
                    cached_at: Instant::now(),
                },
            );
    }
}

impl VirusScanner for ClamAvScanner {
    fn is_available(&self) -> bool {
        self.enabled && self.executable.is_some()
    }

    fn scan(&self, path: &Path) -> VirusScanResult {
        let Some(executable) = self.executable.as_deref().filter(|_| self.enabled) else {
            return VirusScanResult::incomplete("ClamAV is not available");
        };

        let modified = std::fs::metadata(path).and_then(|m| m.modified()).ok();
        if let Some(hit) = self.cached(path, modified) {
            log::debug!("Virus scan cache hit for {}", path.display());
            return hit;
        }

        log::info!("Scanning {} with {}", path.display(), executable.display());
        let output = Command::new(executable)
            .arg("--recursive")
            .arg("--infected")
            .args(&self.extra_args)
            .arg(path)
            .output();

        let result = match output {
            Ok(output) => {
                let stdout = String::from_utf8_lossy(&output.stdout);
                let code = output.status.code().unwrap_or(-1);
                let mut result = parse_clamscan_output(&stdout, code);
                if !result.completed {
                    let stderr = String::from_utf8_lossy(&output.stderr);
                    if !stderr.trim().is_empty() {
                        result.error = Some(stderr.trim().to_string());
                    }
                }
                result
            }
            Err(e) => VirusScanResult::incomplete(format!("Failed to run clamscan: {e}")),
        };

        if !result.is_clean {
            log::warn!(
                "Infected files in {}: {}",
                path.display(),
                result.threat_summary()
            );
        }

        self.remember(path, modified, &result);
        result
    }
}

fn resolve_executable(configured: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = configured {
        if path.is_file() {
            return Some(path.to_path_buf());
        }
        log::warn!("Configured clamscan not found: {}", path.display());
    }

    KNOWN_LOCATIONS
        .iter()
        .map(PathBuf::from)
        .find(|p| p.is_file())
        .or_else(|| {
            let path_var = std::env::var_os("PATH")?;
            std::env::split_paths(&path_var)
                .flat_map(|dir| [dir.join("clamscan"), dir.join("clamscan.exe")])
                .find(|p| p.is_file())
        })
}

/// Interpret `clamscan` output: exit 0 clean, 1 infected, anything else incomplete.
pub fn parse_clamscan_output(stdout: &str, exit_code: i32) -> VirusScanResult {
    let infected_files: Vec<InfectedFile> = stdout
        .lines()
        .filter_map(|line| FOUND_RE.captures(line.trim()))
        .map(|caps| InfectedFile {
            path: PathBuf::from(&caps[1]),
            threat: caps[2].to_string(),
        })
        .collect();

    let scanned_files = SCANNED_RE
        .captures(stdout)
        .and_then(|caps| caps[1].parse().ok())
        .unwrap_or(0);

    match exit_code {
        0 | 1 => VirusScanResult {
            completed: true,
            is_clean: exit_code == 0 && infected_files.is_empty(),
            infected_files,
            scanned_files,
            error: None,
        },
        code => VirusScanResult {
            completed: false,
            is_clean: infected_files.is_empty(),
            infected_files,
            scanned_files,
            error: Some(format!("clamscan exited with code {code}")),
        },
    }
}
