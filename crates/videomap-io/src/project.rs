//! Project I/O - High-level API
//!
//! Saving rewrites media paths relative to the project file's directory;
//! loading resolves them back, classifies untyped media and refreshes the
//! media-missing flags before handing the project out.

use crate::error::{IoError, Result};
use crate::paths::{make_relative, project_directory, resolve};
use crate::project_format::{ProjectFile, PROJECT_FILE_VERSION};
use std::path::Path;
use tracing::{info, warn};
use videomap_core::{classify, MediaType, Project};

/// Saves the project to a project file.
pub fn save_project(project: &Project, path: &Path) -> Result<()> {
    let directory = project_directory(path)?;
    let mut stored = project.clone();
    for polygon in &mut stored.polygons {
        if let Some(media) = polygon.media_path() {
            let relative = make_relative(media, &directory);
            let media_type = polygon.media_type();
            polygon.set_media(Some(relative), media_type);
        }
        polygon.take_changes();
    }

    let mut project_file = ProjectFile::new(stored);
    project_file.save(path)?;
    info!(
        "Saved project '{}' ({} polygons) to {}",
        project.name,
        project.polygons.len(),
        path.display()
    );
    Ok(())
}

/// Loads a project file, checking the format version.
pub fn load_project(path: &Path) -> Result<Project> {
    let project_file = ProjectFile::load(path)?;

    if project_file.version != PROJECT_FILE_VERSION {
        return Err(IoError::VersionMismatch {
            expected: PROJECT_FILE_VERSION.to_string(),
            found: project_file.version,
        });
    }

    let directory = project_directory(path)?;
    let mut project = project_file.project;
    for polygon in &mut project.polygons {
        let Some(media) = polygon.media_path() else {
            continue;
        };
        let resolved = resolve(media, &directory);
        let media_type = match polygon.media_type() {
            MediaType::None => classify(&resolved),
            known => known,
        };
        polygon.set_media(Some(resolved), media_type);
    }

    project.normalize();
    for polygon in &mut project.polygons {
        if polygon.is_media_missing() {
            if let Some(media) = polygon.media_path() {
                warn!("Media for '{}' not found: {}", polygon.name(), media.display());
            }
        }
        polygon.take_changes();
    }

    info!(
        "Loaded project '{}' ({} polygons, {} scenes, {} outputs) from {}",
        project.name,
        project.polygons.len(),
        project.scenes.len(),
        project.outputs.len(),
        path.display()
    );
    Ok(project)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn project_ron_roundtrip() {
        let mut original = Project::create_default();
        original.add_polygon();
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("show.vmap");

        save_project(&original, &path).unwrap();
        let loaded = load_project(&path).unwrap();

        assert_eq!(original, loaded);
    }

    #[test]
    fn test_media_paths_saved_relative_and_resolved_on_load() {
        let dir = TempDir::new().unwrap();
        let media_dir = dir.path().join("media");
        fs::create_dir(&media_dir).unwrap();
        let clip = media_dir.join("clip.mp4");
        fs::write(&clip, b"not really a video").unwrap();

        let mut project = Project::create_default();
        let id = project.add_polygon();
        project.polygon_mut(id).unwrap().assign_media(&clip);

        let path = dir.path().join("show.json");
        save_project(&project, &path).unwrap();

        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.contains("media/clip.mp4") || raw.contains("media\\\\clip.mp4"));
        assert!(!raw.contains(&*dir.path().to_string_lossy()));

        let loaded = load_project(&path).unwrap();
        let polygon = loaded.polygon(id).unwrap();
        assert_eq!(polygon.media_path(), Some(clip.as_path()));
        assert_eq!(polygon.media_type(), MediaType::Video);
        assert!(!polygon.is_media_missing());
        assert!(!polygon.has_pending_changes());
    }

    #[test]
    fn test_untyped_media_is_classified_and_missing_flagged() {
        let dir = TempDir::new().unwrap();
        let mut project = Project::create_default();
        let id = project.add_polygon();
        project
            .polygon_mut(id)
            .unwrap()
            .set_media(Some("gone/still.png".into()), MediaType::None);

        let path = dir.path().join("show.ron");
        save_project(&project, &path).unwrap();
        let loaded = load_project(&path).unwrap();

        let polygon = loaded.polygon(id).unwrap();
        assert_eq!(polygon.media_type(), MediaType::Image);
        assert!(polygon.is_media_missing());
        assert_eq!(
            polygon.media_path(),
            Some(dir.path().join("gone").join("still.png").as_path())
        );
    }

    #[test]
    fn test_version_mismatch() {
        let mut project_file = ProjectFile::new(Project::default());
        project_file.version = "0.1.0".to_string();

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("old.ron");
        project_file.save(&path).unwrap();

        let result = load_project(&path);
        if let Err(IoError::VersionMismatch { expected, found }) = result {
            assert_eq!(expected, PROJECT_FILE_VERSION);
            assert_eq!(found, "0.1.0");
        } else {
            panic!("expected VersionMismatch, got {:?}", result);
        }
    }

    #[test]
    fn test_unsupported_format() {
        let dir = TempDir::new().unwrap();
        let result = save_project(&Project::default(), &dir.path().join("show.txt"));
        assert!(matches!(result, Err(IoError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_load_normalizes_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bare.ron");
        // An empty project without outputs or scenes
        save_project(&Project::default(), &path).unwrap();

        let loaded = load_project(&path).unwrap();
        assert_eq!(loaded.outputs.len(), 1);
        assert_eq!(loaded.scenes.len(), 1);
    }
}
