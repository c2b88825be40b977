//! Media path rewriting between absolute and project-relative form

use crate::error::{IoError, Result};
use std::path::{Component, Path, PathBuf};

/// Express `path` relative to `base`.
///
/// Relative paths are returned unchanged. Returns the absolute path when the
/// two share no root (different drives).
pub fn make_relative(path: &Path, base: &Path) -> PathBuf {
    if !path.is_absolute() || !base.is_absolute() {
        return path.to_path_buf();
    }

    let path_parts: Vec<Component> = path.components().collect();
    let base_parts: Vec<Component> = base.components().collect();
    let common = path_parts
        .iter()
        .zip(&base_parts)
        .take_while(|(a, b)| a == b)
        .count();

    // Not even the root is shared
    if common == 0 {
        return path.to_path_buf();
    }

    let mut relative = PathBuf::new();
    for _ in common..base_parts.len() {
        relative.push("..");
    }
    for part in &path_parts[common..] {
        relative.push(part.as_os_str());
    }
    if relative.as_os_str().is_empty() {
        relative.push(".");
    }
    relative
}

/// Resolve `path` against `base` if it is relative, folding `.` and `..`
pub fn resolve(path: &Path, base: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    normalize_lexically(&base.join(path))
}

fn normalize_lexically(path: &Path) -> PathBuf {
    let mut result = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !result.pop() {
                    result.push(component.as_os_str());
                }
            }
            other => result.push(other.as_os_str()),
        }
    }
    result
}

/// Absolute directory a project file lives in.
///
/// Relative project paths are anchored at the current directory so media
/// paths can always be made relative to the result. A path without a file
/// name is an [`IoError::InvalidPath`].
pub fn project_directory(project_path: &Path) -> Result<PathBuf> {
    if project_path.file_name().is_none() {
        return Err(IoError::InvalidPath(project_path.to_path_buf()));
    }
    let absolute = if project_path.is_absolute() {
        normalize_lexically(project_path)
    } else {
        normalize_lexically(&std::env::current_dir()?.join(project_path))
    };
    absolute
        .parent()
        .map(Path::to_path_buf)
        .ok_or_else(|| IoError::InvalidPath(project_path.to_path_buf()))
}
