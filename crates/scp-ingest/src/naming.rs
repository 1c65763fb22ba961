use std::path::{Path, PathBuf};

use chrono::Utc;
use scp_model::{PortalError, Result};

/// Split a file name at its first `.` so multi-part extensions such as
/// `txt.gz` stay intact.
fn split_file_name(path: &Path) -> (PathBuf, String, Option<String>) {
    let parent = path.parent().map(Path::to_path_buf).unwrap_or_default();
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    match name.split_once('.') {
        Some((base, ext)) => (parent, base.to_string(), Some(ext.to_string())),
        None => (parent, name, None),
    }
}

fn join_file_name(parent: &Path, base: &str, ext: Option<&str>) -> PathBuf {
    match ext {
        Some(ext) => parent.join(format!("{base}.{ext}")),
        None => parent.join(base),
    }
}

/// Insert `tag` between a file's base name and its extension, then make the
/// result collision-safe.
pub fn tag_file_name(path: &Path, tag: &str) -> Result<PathBuf> {
    if tag.is_empty() {
        return Err(PortalError::Config(
            "an output tag is required to derive a file name".to_string(),
        ));
    }
    let (parent, base, ext) = split_file_name(path);
    let tagged = join_file_name(&parent, &format!("{base}{tag}"), ext.as_deref());
    create_safe_file_name(&tagged)
}

/// Return a path that is guaranteed not to clobber an existing file.
///
/// The candidate is used as-is when free. If it exists, a UTC timestamp is
/// appended before the extension and the result re-checked; a second
/// collision fails rather than overwriting anything.
pub fn create_safe_file_name(path: &Path) -> Result<PathBuf> {
    if !path.exists() {
        return Ok(path.to_path_buf());
    }
    let stamp = Utc::now().format("%Y_%m_%d_%H_%M_%S");
    let (parent, base, ext) = split_file_name(path);
    let stamped = join_file_name(&parent, &format!("{base}_{stamp}"), ext.as_deref());
    if stamped.exists() {
        return Err(PortalError::Collision(stamped));
    }
    Ok(stamped)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_lands_before_the_full_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("matrix.txt.gz");
        let tagged = tag_file_name(&path, "_subset").unwrap();
        assert_eq!(tagged, dir.path().join("matrix_subset.txt.gz"));
    }

    #[test]
    fn free_candidate_is_returned_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("meta.txt");
        assert_eq!(create_safe_file_name(&path).unwrap(), path);
    }

    #[test]
    fn existing_candidate_gets_a_timestamp() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("meta.txt");
        std::fs::write(&path, "x").unwrap();
        let safe = create_safe_file_name(&path).unwrap();
        assert_ne!(safe, path);
        let name = safe.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("meta_"));
        assert!(name.ends_with(".txt"));
    }

    #[test]
    fn second_collision_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("meta.txt");
        std::fs::write(&path, "x").unwrap();
        let stamped = create_safe_file_name(&path).unwrap();
        std::fs::write(&stamped, "y").unwrap();
        // Same second, same stamp: the re-check must refuse to overwrite.
        match create_safe_file_name(&path) {
            Err(PortalError::Collision(collided)) => assert_eq!(collided, stamped),
            other => panic!("expected collision, got {other:?}"),
        }
    }

    #[test]
    fn empty_tag_is_rejected() {
        assert!(matches!(
            tag_file_name(Path::new("meta.txt"), ""),
            Err(PortalError::Config(_))
        ));
    }
}
