//! VideoMap Core - Domain Model and Data Structures
//!
//! This crate contains the core domain model for VideoMap, including:
//! - Polygon geometry (vertices, bounding box, clip path)
//! - Media classification
//! - Scenes and the scene timeline scheduler
//! - Output surfaces
//! - The project container
//! - Application and logging configuration

#![warn(missing_docs)]

pub use glam::Vec2;
use thiserror::Error;

pub mod config;
pub mod geometry;
pub mod logging;
pub mod media;
pub mod output;
pub mod polygon;
pub mod project;
pub mod scene;
pub mod timeline;

// --- Re-exports grouped by category ---

// Geometry
pub use geometry::{ClipPath, FillRule, Rect};
pub use polygon::{Polygon, PolygonChange, PolygonId, PolygonRecord};

// Media
pub use media::{classify, MediaType};

// Scenes & Timeline
pub use scene::{Scene, SceneId};
pub use timeline::{SceneTimeline, TimelineEvent, DEFAULT_TICK_INTERVAL};

// Output & Project
pub use output::{OutputId, OutputSurface};
pub use project::Project;

// Configuration & Logging
pub use config::{AppConfig, CanvasConfig, PlaybackConfig};
pub use logging::LogConfig;

/// Core error types
#[derive(Error, Debug)]
pub enum CoreError {
    /// Reading or writing a configuration file failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file could not be parsed
    #[error("Invalid configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),
}

/// Result type for core operations
pub type Result<T> = std::result::Result<T, CoreError>;
