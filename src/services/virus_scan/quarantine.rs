use crate::services::fs_utils::file_utils;
use chrono::Local;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Move infected content out of the download folder into `quarantine_dir`.
/// The item is renamed `<name>_<timestamp>`, with a counter on collision.
pub fn quarantine(path: &Path, quarantine_dir: &Path) -> io::Result<PathBuf> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("Cannot quarantine {}", path.display()),
            )
        })?;

    fs::create_dir_all(quarantine_dir)?;

    let stamp = Local::now().format("%Y%m%d%H%M%S");
    let mut target = quarantine_dir.join(format!("{name}_{stamp}"));
    let mut counter = 1;
    while target.exists() {
        target = quarantine_dir.join(format!("{name}_{stamp}_{counter}"));
        counter += 1;
    }

    file_utils::rename_cross_drive_fallback(path, &target)?;
    log::warn!(
        "Quarantined {} to {}",
        path.display(),
        target.display()
    );
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_quarantine_folder() {
        let tmp = TempDir::new().unwrap();
        let release = tmp.path().join("Some.Game-CODEX");
        fs::create_dir_all(&release).unwrap();
        fs::write(release.join("setup.exe"), b"MZ").unwrap();
        let qdir = tmp.path().join(".quarantine");

        let target = quarantine(&release, &qdir).unwrap();

        assert!(!release.exists());
        assert!(target.join("setup.exe").exists());
        let name = target.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("Some.Game-CODEX_"));
    }

    #[test]
    fn test_quarantine_twice_does_not_collide() {
        let tmp = TempDir::new().unwrap();
        let qdir = tmp.path().join(".quarantine");

        let first = tmp.path().join("bad.iso");
        fs::write(&first, b"1").unwrap();
        let a = quarantine(&first, &qdir).unwrap();

        fs::write(&first, b"2").unwrap();
        let b = quarantine(&first, &qdir).unwrap();

        assert_ne!(a, b);
        assert!(a.exists() && b.exists());
    }
}
