//! Disk access used by the import engine.
//!
//! `DiskProvider` is the seam tests fake; `LocalDiskProvider` is the real
//! filesystem, with `sysinfo` for free space and `fs_extra` for cross-device moves.

use super::file_utils;
use crate::services::scanner::walker;
use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

pub trait DiskProvider: Send + Sync {
    fn file_exists(&self, path: &Path) -> bool;
    fn folder_exists(&self, path: &Path) -> bool;
    fn get_files(&self, folder: &Path, recursive: bool) -> io::Result<Vec<PathBuf>>;
    fn get_directories(&self, folder: &Path) -> io::Result<Vec<PathBuf>>;
    fn get_file_size(&self, path: &Path) -> io::Result<u64>;
    fn get_folder_size(&self, path: &Path) -> io::Result<u64>;
    /// Free bytes on the volume holding `path`. `Ok(None)` when the volume is unknown.
    fn free_space(&self, path: &Path) -> anyhow::Result<Option<u64>>;
    fn is_file_locked(&self, path: &Path) -> bool;
    fn create_folder(&self, path: &Path) -> io::Result<()>;
    fn move_path(&self, from: &Path, to: &Path) -> io::Result<()>;
    fn copy_path(&self, from: &Path, to: &Path) -> io::Result<()>;
    fn delete_file(&self, path: &Path) -> io::Result<()>;
    fn delete_folder(&self, path: &Path, recursive: bool) -> io::Result<()>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct LocalDiskProvider;

impl DiskProvider for LocalDiskProvider {
    fn file_exists(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn folder_exists(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn get_files(&self, folder: &Path, recursive: bool) -> io::Result<Vec<PathBuf>> {
        walker::list_files(folder, recursive)
    }

    fn get_directories(&self, folder: &Path) -> io::Result<Vec<PathBuf>> {
        walker::list_directories(folder)
    }

    fn get_file_size(&self, path: &Path) -> io::Result<u64> {
        Ok(fs::metadata(path)?.len())
    }

    fn get_folder_size(&self, path: &Path) -> io::Result<u64> {
        file_utils::path_size(path)
    }

    fn free_space(&self, path: &Path) -> anyhow::Result<Option<u64>> {
        let disks = sysinfo::Disks::new_with_refreshed_list();
        let search_path = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());

        let mut available_space = None;
        let mut matched_len = 0;
        for disk in disks.list() {
            let mount = disk.mount_point();
            if search_path.starts_with(mount) {
                let mount_len = mount.as_os_str().len();
                if mount_len >= matched_len {
                    matched_len = mount_len;
                    available_space = Some(disk.available_space());
                }
            }
        }

        Ok(available_space)
    }

    fn is_file_locked(&self, path: &Path) -> bool {
        match OpenOptions::new().read(true).open(path) {
            Ok(_) => false,
            Err(e) if e.kind() == io::ErrorKind::NotFound => false,
            Err(e) => {
                log::debug!("File {} is not readable: {e}", path.display());
                true
            }
        }
    }

    fn create_folder(&self, path: &Path) -> io::Result<()> {
        fs::create_dir_all(path)
    }

    fn move_path(&self, from: &Path, to: &Path) -> io::Result<()> {
        if let Some(parent) = to.parent() {
            fs::create_dir_all(parent)?;
        }
        file_utils::rename_cross_drive_fallback(from, to)
    }

    fn copy_path(&self, from: &Path, to: &Path) -> io::Result<()> {
        file_utils::copy_path(from, to)
    }

    fn delete_file(&self, path: &Path) -> io::Result<()> {
        fs::remove_file(path)
    }

    fn delete_folder(&self, path: &Path, recursive: bool) -> io::Result<()> {
        if recursive {
            fs::remove_dir_all(path)
        } else {
            fs::remove_dir(path)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_free_space_for_temp_dir_is_known() {
        let dir = TempDir::new().unwrap();
        let disk = LocalDiskProvider;
        // Containers may hide mounts from sysinfo; only the Ok shape is guaranteed.
        assert!(disk.free_space(dir.path()).is_ok());
    }

    #[test]
    fn test_move_creates_parent() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("game.iso");
        fs::write(&src, "iso").unwrap();
        let dest = dir.path().join("library/Some Game/Some Game.iso");

        let disk = LocalDiskProvider;
        disk.move_path(&src, &dest).unwrap();

        assert!(!disk.file_exists(&src));
        assert!(disk.file_exists(&dest));
    }

    #[test]
    fn test_unlocked_file_is_not_locked() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("game.iso");
        fs::write(&file, "iso").unwrap();

        let disk = LocalDiskProvider;
        assert!(!disk.is_file_locked(&file));
        assert!(!disk.is_file_locked(&dir.path().join("missing.iso")));
    }

    #[test]
    fn test_delete_folder_non_recursive_requires_empty() {
        let dir = TempDir::new().unwrap();
        let folder = dir.path().join("release");
        fs::create_dir(&folder).unwrap();
        fs::write(folder.join("left.nfo"), "nfo").unwrap();

        let disk = LocalDiskProvider;
        assert!(disk.delete_folder(&folder, false).is_err());
        disk.delete_folder(&folder, true).unwrap();
        assert!(!disk.folder_exists(&folder));
    }
}
