use std::path::{Component, Path};

/// True when `target_path` stays inside `base_path`. `..` steps that climb
/// above the base, and absolute paths elsewhere, are refused.
pub fn is_path_safe(base_path: &Path, target_path: &Path) -> bool {
    let relative = if target_path.is_absolute() {
        match target_path.strip_prefix(base_path) {
            Ok(rel) => rel,
            Err(_) => return false,
        }
    } else {
        target_path
    };

    let mut depth = 0i32;
    for component in relative.components() {
        match component {
            Component::ParentDir => {
                depth -= 1;
                if depth < 0 {
                    return false;
                }
            }
            Component::Normal(_) => depth += 1,
            Component::CurDir => {}
            Component::RootDir | Component::Prefix(_) => return false,
        }
    }

    true
}

/// `target` relative to `base` with `/` separators, if it lies inside `base`.
pub fn relative_within(base: &Path, target: &Path) -> Option<String> {
    if !is_path_safe(base, target) {
        return None;
    }
    let rel = target.strip_prefix(base).ok()?;
    Some(
        rel.components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_path_safe() {
        let base = Path::new("/library/Some Game");
        assert!(is_path_safe(base, Path::new("/library/Some Game/game.iso")));
        assert!(is_path_safe(base, Path::new("disc/game.iso")));
        assert!(!is_path_safe(base, Path::new("/library/Other/game.iso")));
        assert!(!is_path_safe(base, Path::new("../Other/game.iso")));
        assert!(!is_path_safe(
            base,
            Path::new("/library/Some Game/../../etc/passwd")
        ));
    }

    #[test]
    fn test_relative_within() {
        let base = Path::new("/library/Some Game");
        assert_eq!(
            relative_within(base, Path::new("/library/Some Game/Disc 1/game.iso")).as_deref(),
            Some("Disc 1/game.iso")
        );
        assert_eq!(relative_within(base, base).as_deref(), Some(""));
        assert_eq!(relative_within(base, Path::new("/elsewhere/game.iso")), None);
    }
}
