//! Defines the on-disk project file format for VideoMap.
//!
//! A project file wraps the [`Project`] with a format version and timestamps,
//! serialized as JSON (`.json`) or RON (`.ron`, `.vmap`).

use crate::error::{IoError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use videomap_core::Project;

/// The current version of the project file format.
pub const PROJECT_FILE_VERSION: &str = "1.0.0";

/// Maximum allowed project file size (50 MB).
pub const MAX_PROJECT_FILE_SIZE: u64 = 50 * 1024 * 1024;

/// Serialization chosen from the file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Json,
    Ron,
}

impl FileFormat {
    /// Format for `path`; files without an extension are treated as RON
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_else(|| "ron".to_string());

        match extension.as_str() {
            "json" => Ok(FileFormat::Json),
            "ron" | "vmap" => Ok(FileFormat::Ron),
            _ => Err(IoError::UnsupportedFormat(extension)),
        }
    }
}

/// Top-level structure of a saved project file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProjectFile {
    /// The version of the project file format.
    pub version: String,
    /// Metadata about the project.
    pub metadata: ProjectMetadata,
    /// The project itself.
    pub project: Project,
}

impl ProjectFile {
    /// Wrap a project, setting creation and modification times to now.
    pub fn new(project: Project) -> Self {
        let now = Utc::now();
        Self {
            version: PROJECT_FILE_VERSION.to_string(),
            metadata: ProjectMetadata {
                created_at: now,
                modified_at: now,
            },
            project,
        }
    }

    /// Loads a `ProjectFile` from the given path.
    pub fn load(path: &Path) -> Result<Self> {
        Self::load_with_limit(path, MAX_PROJECT_FILE_SIZE)
    }

    fn load_with_limit(path: &Path, limit: u64) -> Result<Self> {
        let format = FileFormat::from_path(path)?;

        let size = fs::metadata(path)?.len();
        if size > limit {
            return Err(IoError::FileTooLarge { size, limit });
        }

        let content = fs::read_to_string(path)?;
        let file = match format {
            FileFormat::Json => serde_json::from_str(&content)?,
            FileFormat::Ron => ron::from_str(&content)?,
        };
        Ok(file)
    }

    /// Saves the `ProjectFile` to the given path, updating `modified_at`.
    ///
    /// The file is written next to its destination and renamed into place, so
    /// a failed save never leaves a truncated project behind.
    pub fn save(&mut self, path: &Path) -> Result<()> {
        let format = FileFormat::from_path(path)?;
        self.metadata.modified_at = Utc::now();

        let content = match format {
            FileFormat::Json => serde_json::to_string_pretty(self)?,
            FileFormat::Ron => {
                ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())?
            }
        };

        let directory = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut staging = NamedTempFile::new_in(directory)?;
        staging.write_all(content.as_bytes())?;
        staging.flush()?;
        staging.persist(path).map_err(|e| IoError::Io(e.error))?;

        Ok(())
    }
}

/// Metadata associated with a project file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProjectMetadata {
    /// Timestamp of when the project was first created.
    pub created_at: DateTime<Utc>,
    /// Timestamp of the last modification.
    pub modified_at: DateTime<Utc>,
}
