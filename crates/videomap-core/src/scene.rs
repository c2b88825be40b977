//! Scenes - named, timed visibility presets over the polygon set

use crate::polygon::{Polygon, PolygonId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::time::Duration;
use uuid::Uuid;

/// Unique identifier for a Scene
pub type SceneId = Uuid;

/// Default scene length in seconds
pub const DEFAULT_SCENE_DURATION: f64 = 5.0;

/// Shortest duration the timeline will honour
pub const MIN_SCENE_DURATION: f64 = 0.1;

/// A named visibility preset with a duration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    /// Stable identity
    pub id: SceneId,
    /// Display name
    pub name: String,
    /// Duration in seconds
    pub duration_seconds: f64,
    /// Polygons shown by this scene; empty means all
    #[serde(default)]
    pub active_polygon_ids: BTreeSet<PolygonId>,
}

impl Scene {
    /// Create a scene with no active polygons (shows everything)
    pub fn new(name: impl Into<String>, duration_seconds: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            duration_seconds,
            active_polygon_ids: BTreeSet::new(),
        }
    }

    /// Builder-style helper to set the active polygons
    pub fn with_active(mut self, ids: impl IntoIterator<Item = PolygonId>) -> Self {
        self.active_polygon_ids = ids.into_iter().collect();
        self
    }

    /// Whether the polygon is visible in this scene
    pub fn shows(&self, id: PolygonId) -> bool {
        self.active_polygon_ids.is_empty() || self.active_polygon_ids.contains(&id)
    }

    /// Duration used for scheduling, never below [`MIN_SCENE_DURATION`]
    pub fn effective_duration(&self) -> Duration {
        let seconds = if self.duration_seconds.is_finite() {
            self.duration_seconds.max(MIN_SCENE_DURATION)
        } else {
            DEFAULT_SCENE_DURATION
        };
        Duration::from_secs_f64(seconds)
    }

    /// Set every polygon's scene visibility to membership in this scene.
    ///
    /// Idempotent: applying the same scene twice records no further changes.
    pub fn apply(&self, polygons: &mut [Polygon]) {
        for polygon in polygons {
            let visible = self.shows(polygon.id());
            polygon.set_scene_visible(visible);
        }
    }

    /// Fill in defaults after loading
    pub fn normalize(&mut self) {
        if self.id.is_nil() {
            self.id = Uuid::new_v4();
        }
        if self.name.trim().is_empty() {
            self.name = "Scene".to_string();
        }
        if !self.duration_seconds.is_finite() || self.duration_seconds <= 0.0 {
            self.duration_seconds = DEFAULT_SCENE_DURATION;
        }
    }
}
