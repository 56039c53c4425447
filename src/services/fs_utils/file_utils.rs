use std::fs;
use std::io;
use std::path::Path;
use walkdir::WalkDir;

/// Move `from` to `to`. When the rename fails across volumes the content
/// is copied and the source removed.
pub fn rename_cross_drive_fallback(from: &Path, to: &Path) -> io::Result<()> {
    let rename_err = match fs::rename(from, to) {
        Ok(()) => return Ok(()),
        Err(e) if !from.exists() || to.exists() => return Err(e),
        Err(e) => e,
    };

    log::warn!(
        "Rename of {} failed ({}), copying instead",
        from.display(),
        rename_err
    );
    copy_path(from, to)?;

    if from.is_dir() {
        fs::remove_dir_all(from)
    } else {
        fs::remove_file(from)
    }
}

/// Copy a file or a whole directory tree to `to`. `to` must not exist yet.
pub fn copy_path(from: &Path, to: &Path) -> io::Result<()> {
    if !from.exists() {
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("Source path does not exist: {}", from.display()),
        ));
    }
    if to.exists() {
        return Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("Destination already exists: {}", to.display()),
        ));
    }

    if let Some(parent) = to.parent() {
        fs::create_dir_all(parent)?;
    }

    let copied = if from.is_dir() {
        fs::create_dir_all(to)?;
        let mut options = fs_extra::dir::CopyOptions::new();
        options.content_only = true;
        fs_extra::dir::copy(from, to, &options).map(|_| ())
    } else {
        let mut options = fs_extra::file::CopyOptions::new();
        options.overwrite = false;
        fs_extra::file::copy(from, to, &options).map(|_| ())
    };

    if let Err(err) = copied {
        // `to` did not exist before, so whatever is there now is partial
        if let Err(cleanup) = remove_path(to) {
            log::error!(
                "Failed to remove partial copy {}: {}",
                to.display(),
                cleanup
            );
        }
        return Err(io::Error::other(err.to_string()));
    }
    Ok(())
}

/// Delete a file or directory tree. A missing path is not an error.
pub fn remove_path(path: &Path) -> io::Result<()> {
    match fs::symlink_metadata(path) {
        Ok(meta) if meta.is_dir() => fs::remove_dir_all(path),
        Ok(_) => fs::remove_file(path),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

/// Total size in bytes of a file, or of every file below a directory.
pub fn path_size(path: &Path) -> io::Result<u64> {
    let meta = fs::metadata(path)?;
    if meta.is_file() {
        return Ok(meta.len());
    }

    Ok(WalkDir::new(path)
        .follow_links(false)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| e.metadata().ok())
        .map(|m| m.len())
        .sum())
}
