//! File system walker and content classification for download folders.
//! Uses `walkdir` for recursive traversal; symlinks are never followed.

use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Optical-disc images. These never carry an embedded runtime.
pub const DISC_IMAGE_EXTENSIONS: &[&str] = &["iso", "img", "mdf", "nrg", "chd", "cso"];

/// Console ROM and package containers.
pub const ROM_EXTENSIONS: &[&str] = &[
    "nsp", "xci", "wbfs", "rvz", "wud", "wux", "cia", "3ds", "pkg", "xex",
];

/// Video containers (trailers, cinematics, samples).
pub const VIDEO_EXTENSIONS: &[&str] = &[
    "mkv", "mp4", "m4v", "avi", "wmv", "mov", "webm", "flv", "m2ts", "ts", "strm",
];

/// Archive extensions that usually still need extracting.
pub const ARCHIVE_EXTENSIONS: &[&str] = &["rar", "zip", "7z", "tar", "gz", "bz2", "xz"];

/// Release metadata and leftovers that never decide how a folder is imported.
pub const JUNK_EXTENSIONS: &[&str] = &[
    "nfo", "sfv", "md5", "sha1", "txt", "url", "jpg", "jpeg", "png", "gif", "nzb", "par2", "srr",
    "srs", "diz",
];

/// Script and dropper types with no legitimate use in a game release.
pub const DANGEROUS_EXTENSIONS: &[&str] = &[
    "scr", "pif", "hta", "cpl", "vbs", "vbe", "ps1", "wsf", "jse",
];

/// Installer payloads; listed so name parsing can drop them as extensions.
const INSTALLER_EXTENSIONS: &[&str] = &["exe", "msi", "bin", "cab", "bat", "cmd", "dll"];

/// Folder names whose contents are never game media.
const EXCLUDED_FOLDERS: &[&str] = &[
    "sample",
    "samples",
    "extras",
    "extrafanart",
    "@eadir",
    ".@__thumb",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Media,
    Archive,
    Junk,
    Dangerous,
    Other,
}

fn extension_of(path: &Path) -> String {
    path.extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

/// Multi-part rar volumes: `.r00` .. `.r99`.
fn is_rar_volume(ext: &str) -> bool {
    ext.len() == 3 && ext.starts_with('r') && ext[1..].chars().all(|c| c.is_ascii_digit())
}

pub fn is_known_extension(ext: &str) -> bool {
    let ext = ext.to_lowercase();
    [
        DISC_IMAGE_EXTENSIONS,
        ROM_EXTENSIONS,
        VIDEO_EXTENSIONS,
        ARCHIVE_EXTENSIONS,
        JUNK_EXTENSIONS,
        DANGEROUS_EXTENSIONS,
        INSTALLER_EXTENSIONS,
    ]
    .iter()
    .any(|list| list.contains(&ext.as_str()))
        || is_rar_volume(&ext)
}

pub fn is_media_file(path: &Path) -> bool {
    let ext = extension_of(path);
    DISC_IMAGE_EXTENSIONS.contains(&ext.as_str())
        || ROM_EXTENSIONS.contains(&ext.as_str())
        || VIDEO_EXTENSIONS.contains(&ext.as_str())
}

pub fn is_video_file(path: &Path) -> bool {
    VIDEO_EXTENSIONS.contains(&extension_of(path).as_str())
}

/// OS and tool droppings: `Thumbs.db`, `.DS_Store`, `._foo`, `.unmanic*`.
pub fn is_ignored_name(name: &str) -> bool {
    name.eq_ignore_ascii_case("thumbs.db")
        || name == ".DS_Store"
        || name.starts_with("._")
        || name.starts_with(".unmanic")
}

/// Deny-listed script types, plus executables posing as a readme.
pub fn is_dangerous_file(path: &Path) -> bool {
    let ext = extension_of(path);
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    DANGEROUS_EXTENSIONS.contains(&ext.as_str()) || (name.starts_with("readme") && ext == "exe")
}

pub fn classify_file(path: &Path) -> FileKind {
    let ext = extension_of(path);
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    if is_dangerous_file(path) {
        FileKind::Dangerous
    } else if is_media_file(path) {
        FileKind::Media
    } else if ARCHIVE_EXTENSIONS.contains(&ext.as_str()) || is_rar_volume(&ext) {
        FileKind::Archive
    } else if JUNK_EXTENSIONS.contains(&ext.as_str()) || is_ignored_name(&name) {
        FileKind::Junk
    } else {
        FileKind::Other
    }
}

/// List files under `folder`, recursing when asked. Unreadable entries are skipped.
pub fn list_files(folder: &Path, recursive: bool) -> io::Result<Vec<PathBuf>> {
    if !folder.is_dir() {
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("Folder does not exist: {}", folder.display()),
        ));
    }

    let max_depth = if recursive { usize::MAX } else { 1 };
    let mut files = Vec::new();
    for entry in WalkDir::new(folder)
        .max_depth(max_depth)
        .follow_links(false)
        .sort_by_file_name()
    {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                log::warn!("Skipping unreadable entry: {e}");
                continue;
            }
        };
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

/// Immediate subdirectories of `folder`, sorted by name.
pub fn list_directories(folder: &Path) -> io::Result<Vec<PathBuf>> {
    let mut dirs = Vec::new();
    for entry in std::fs::read_dir(folder)? {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                log::warn!("Skipping unreadable entry: {e}");
                continue;
            }
        };
        if entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
            dirs.push(entry.path());
        }
    }
    dirs.sort();
    Ok(dirs)
}

/// Contents of a download folder split by kind.
#[derive(Debug, Clone, Default)]
pub struct FolderLayout {
    pub media: Vec<PathBuf>,
    pub archives: Vec<PathBuf>,
    pub dangerous: Vec<PathBuf>,
    pub junk: Vec<PathBuf>,
    /// Installers, binaries, game data.
    pub other: Vec<PathBuf>,
}

impl FolderLayout {
    /// Files inside excluded folders (`Sample/`, `Extras/`) count as junk.
    pub fn classify(root: &Path, files: impl IntoIterator<Item = PathBuf>) -> Self {
        let mut layout = FolderLayout::default();
        for file in files {
            let relative = file.strip_prefix(root).unwrap_or(&file);
            let excluded = relative
                .parent()
                .map(|p| {
                    p.components().any(|c| {
                        let part = c.as_os_str().to_string_lossy().to_lowercase();
                        EXCLUDED_FOLDERS.contains(&part.as_str())
                    })
                })
                .unwrap_or(false);

            let kind = match classify_file(&file) {
                FileKind::Dangerous => FileKind::Dangerous,
                _ if excluded => FileKind::Junk,
                kind => kind,
            };

            match kind {
                FileKind::Media => layout.media.push(file),
                FileKind::Archive => layout.archives.push(file),
                FileKind::Dangerous => layout.dangerous.push(file),
                FileKind::Junk => layout.junk.push(file),
                FileKind::Other => layout.other.push(file),
            }
        }
        layout
    }

    /// Installer-style content makes the whole directory the import unit.
    pub fn is_folder_release(&self) -> bool {
        !self.other.is_empty()
    }
}
