//! VideoMap IO - project persistence
//!
//! - versioned project files in JSON or RON
//! - media paths stored relative to the project file
//! - output preset export

pub mod error;
pub mod paths;
pub mod preset;
pub mod project;
pub mod project_format;

pub use error::{IoError, Result};
pub use preset::{export_output_preset, OutputPreset, PresetOutput, PresetPolygon};
pub use project::{load_project, save_project};
pub use project_format::{FileFormat, ProjectFile, ProjectMetadata, MAX_PROJECT_FILE_SIZE, PROJECT_FILE_VERSION};
