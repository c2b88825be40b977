//! Polygon - a mappable region on the canvas
//!
//! A polygon owns an ordered vertex list plus the geometry derived from it
//! (bounding box and clip path), a media reference, and the flags that drive
//! playback (scene visibility, solo, mute, loop).
//!
//! Derived geometry is recomputed inside every vertex mutator, so it is always
//! consistent with the vertex list by the time anyone reads it. Each mutator
//! that actually changes something records a [`PolygonChange`] in the polygon's
//! outbox; the owner drains it with [`Polygon::take_changes`] and forwards the
//! changes to dependents (playback controller, layer renderer) in a fixed order.

use crate::geometry::{ClipPath, Rect};
use crate::media::{classify, MediaType};
use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Unique identifier for a Polygon
pub type PolygonId = Uuid;

/// Name given to polygons that have none
pub const DEFAULT_POLYGON_NAME: &str = "Polygon";

/// Something about a polygon that dependents may need to react to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PolygonChange {
    /// Vertex list changed; bounds and clip path are already recomputed
    Geometry,
    /// Media path or media type changed
    Media,
    /// The media file appeared or disappeared on disk
    MediaMissing,
    /// Scene visibility toggled
    SceneVisibility,
    /// Solo flag toggled
    Solo,
    /// Mute flag toggled
    Mute,
    /// Loop flag toggled
    Loop,
    /// Z-order index changed
    Order,
    /// Display name changed
    Name,
}

/// Persisted form of a polygon; derived state is rebuilt on load
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolygonRecord {
    /// Stable identity
    pub id: PolygonId,
    /// Display name
    pub name: String,
    /// Vertices in order
    pub points: Vec<Vec2>,
    /// Assigned media file
    #[serde(default)]
    pub media_path: Option<PathBuf>,
    /// Assigned media kind
    #[serde(default)]
    pub media_type: MediaType,
    /// Z-order index
    #[serde(default)]
    pub order: usize,
    /// Solo flag
    #[serde(default)]
    pub solo: bool,
    /// Mute flag
    #[serde(default)]
    pub muted: bool,
    /// Loop flag
    #[serde(default)]
    pub looping: bool,
    /// Visible in the current scene
    #[serde(default = "default_scene_visible")]
    pub scene_visible: bool,
}

fn default_scene_visible() -> bool {
    true
}

/// A polygonal region with assigned media
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "PolygonRecord", into = "PolygonRecord")]
pub struct Polygon {
    id: PolygonId,
    name: String,
    points: Vec<Vec2>,
    media_path: Option<PathBuf>,
    media_type: MediaType,
    order: usize,
    solo: bool,
    muted: bool,
    looping: bool,
    scene_visible: bool,

    // Derived
    media_missing: bool,
    bounds: Rect,
    clip: Option<ClipPath>,

    changes: Vec<PolygonChange>,
}

impl Polygon {
    /// Create an empty polygon with a fresh id
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            points: Vec::new(),
            media_path: None,
            media_type: MediaType::None,
            order: 0,
            solo: false,
            muted: false,
            looping: false,
            scene_visible: true,
            media_missing: false,
            bounds: Rect::default(),
            clip: None,
            changes: Vec::new(),
        }
    }

    /// Create a polygon from a vertex list
    pub fn with_points(name: impl Into<String>, points: Vec<Vec2>) -> Self {
        let mut polygon = Self::new(name);
        polygon.points = points;
        polygon.recompute_geometry();
        polygon
    }

    /// The default shape for a newly drawn polygon: a square centered on the
    /// canvas with a side of a quarter of the shorter canvas dimension.
    pub fn centered_square(name: impl Into<String>, canvas_width: f32, canvas_height: f32) -> Self {
        let (width, height) = if canvas_width > 0.0 && canvas_height > 0.0 {
            (canvas_width, canvas_height)
        } else {
            (1920.0, 1080.0)
        };

        let mut size = width.min(height) * 0.25;
        if size <= 0.0 {
            size = 200.0;
        }

        let half = size / 2.0;
        let center = Vec2::new(width / 2.0, height / 2.0);
        Self::with_points(
            name,
            vec![
                center + Vec2::new(-half, -half),
                center + Vec2::new(half, -half),
                center + Vec2::new(half, half),
                center + Vec2::new(-half, half),
            ],
        )
    }

    /// Stable identity
    pub fn id(&self) -> PolygonId {
        self.id
    }

    /// Display name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rename the polygon
    pub fn set_name(&mut self, name: impl Into<String>) {
        let name = name.into();
        if self.name != name {
            self.name = name;
            self.changes.push(PolygonChange::Name);
        }
    }

    // --- Geometry ---

    /// Vertices in order
    pub fn points(&self) -> &[Vec2] {
        &self.points
    }

    /// Number of vertices
    pub fn point_count(&self) -> usize {
        self.points.len()
    }

    /// Axis-aligned bounding box of the vertices (zero-sized when empty)
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    /// Closed outline through the vertices, `None` with fewer than 3 points
    pub fn clip_path(&self) -> Option<&ClipPath> {
        self.clip.as_ref()
    }

    /// Replace the vertex list
    pub fn set_points(&mut self, points: Vec<Vec2>) {
        self.points = points;
        self.recompute();
    }

    /// Append a vertex
    pub fn add_point(&mut self, point: Vec2) {
        self.points.push(point);
        self.recompute();
    }

    /// Move the vertex at `index` to `point`
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range.
    pub fn set_point(&mut self, index: usize, point: Vec2) {
        self.points[index] = point;
        self.recompute();
    }

    /// Offset the vertex at `index` by `(dx, dy)`
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range.
    pub fn move_point(&mut self, index: usize, dx: f32, dy: f32) {
        self.points[index] += Vec2::new(dx, dy);
        self.recompute();
    }

    /// Remove and return the vertex at `index`
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range.
    pub fn remove_point(&mut self, index: usize) -> Vec2 {
        let point = self.points.remove(index);
        self.recompute();
        point
    }

    /// Recompute bounds and clip path, then record the geometry change
    pub fn recompute(&mut self) {
        self.recompute_geometry();
        self.changes.push(PolygonChange::Geometry);
    }

    fn recompute_geometry(&mut self) {
        self.bounds = Rect::from_points(&self.points);
        self.clip = ClipPath::from_points(&self.points);
    }

    // --- Media ---

    /// Assigned media path
    pub fn media_path(&self) -> Option<&Path> {
        self.media_path.as_deref()
    }

    /// Assigned media type
    pub fn media_type(&self) -> MediaType {
        self.media_type
    }

    /// True when a media path is set but does not resolve to an existing file
    pub fn is_media_missing(&self) -> bool {
        self.media_missing
    }

    /// Assign a media path with an explicit type. Empty paths count as no media.
    pub fn set_media(&mut self, path: Option<PathBuf>, media_type: MediaType) {
        let path = path.filter(|p| !p.as_os_str().is_empty());
        if self.media_path != path || self.media_type != media_type {
            self.media_path = path;
            self.media_type = media_type;
            self.changes.push(PolygonChange::Media);
        }
        self.refresh_media_missing();
    }

    /// Assign a media file, classifying it by extension
    pub fn assign_media(&mut self, path: impl Into<PathBuf>) {
        let path = path.into();
        let media_type = classify(&path);
        self.set_media(Some(path), media_type);
    }

    /// Remove the media assignment
    pub fn clear_media(&mut self) {
        self.set_media(None, MediaType::None);
    }

    /// Re-check whether the media file exists on disk
    pub fn refresh_media_missing(&mut self) {
        let missing = match &self.media_path {
            Some(path) => !path.is_file(),
            None => false,
        };
        if self.media_missing != missing {
            self.media_missing = missing;
            self.changes.push(PolygonChange::MediaMissing);
        }
    }

    /// Video assigned, path set, file present
    pub fn has_valid_video(&self) -> bool {
        self.media_type == MediaType::Video && self.media_path.is_some() && !self.media_missing
    }

    /// Image assigned, path set, file present
    pub fn has_valid_image(&self) -> bool {
        self.media_type == MediaType::Image && self.media_path.is_some() && !self.media_missing
    }

    // --- Flags ---

    /// Visible in the current scene
    pub fn is_scene_visible(&self) -> bool {
        self.scene_visible
    }

    /// Set scene visibility
    pub fn set_scene_visible(&mut self, visible: bool) {
        if self.scene_visible != visible {
            self.scene_visible = visible;
            self.changes.push(PolygonChange::SceneVisibility);
        }
    }

    /// Solo flag
    pub fn is_solo(&self) -> bool {
        self.solo
    }

    /// Set the solo flag
    pub fn set_solo(&mut self, solo: bool) {
        if self.solo != solo {
            self.solo = solo;
            self.changes.push(PolygonChange::Solo);
        }
    }

    /// Mute flag
    pub fn is_muted(&self) -> bool {
        self.muted
    }

    /// Set the mute flag
    pub fn set_muted(&mut self, muted: bool) {
        if self.muted != muted {
            self.muted = muted;
            self.changes.push(PolygonChange::Mute);
        }
    }

    /// Loop flag
    pub fn is_looping(&self) -> bool {
        self.looping
    }

    /// Set the loop flag
    pub fn set_looping(&mut self, looping: bool) {
        if self.looping != looping {
            self.looping = looping;
            self.changes.push(PolygonChange::Loop);
        }
    }

    /// Z-order index (0 is drawn first)
    pub fn order(&self) -> usize {
        self.order
    }

    /// Set the z-order index
    pub fn set_order(&mut self, order: usize) {
        if self.order != order {
            self.order = order;
            self.changes.push(PolygonChange::Order);
        }
    }

    // --- Change outbox ---

    /// Drain recorded changes in the order they happened
    pub fn take_changes(&mut self) -> Vec<PolygonChange> {
        std::mem::take(&mut self.changes)
    }

    /// True when changes are waiting to be dispatched
    pub fn has_pending_changes(&self) -> bool {
        !self.changes.is_empty()
    }

    /// Fill in defaults after loading
    pub fn normalize(&mut self) {
        if self.name.trim().is_empty() {
            self.set_name(DEFAULT_POLYGON_NAME);
        }
        self.refresh_media_missing();
    }
}

impl PartialEq for Polygon {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.name == other.name
            && self.points == other.points
            && self.media_path == other.media_path
            && self.media_type == other.media_type
            && self.order == other.order
            && self.solo == other.solo
            && self.muted == other.muted
            && self.looping == other.looping
            && self.scene_visible == other.scene_visible
    }
}

impl From<PolygonRecord> for Polygon {
    fn from(record: PolygonRecord) -> Self {
        let mut polygon = Self {
            id: record.id,
            name: record.name,
            points: record.points,
            media_path: record.media_path.filter(|p| !p.as_os_str().is_empty()),
            media_type: record.media_type,
            order: record.order,
            solo: record.solo,
            muted: record.muted,
            looping: record.looping,
            scene_visible: record.scene_visible,
            media_missing: false,
            bounds: Rect::default(),
            clip: None,
            changes: Vec::new(),
        };
        polygon.recompute_geometry();
        polygon.media_missing = polygon
            .media_path
            .as_deref()
            .is_some_and(|path| !path.is_file());
        polygon
    }
}

impl From<Polygon> for PolygonRecord {
    fn from(polygon: Polygon) -> Self {
        Self {
            id: polygon.id,
            name: polygon.name,
            points: polygon.points,
            media_path: polygon.media_path,
            media_type: polygon.media_type,
            order: polygon.order,
            solo: polygon.solo,
            muted: polygon.muted,
            looping: polygon.looping,
            scene_visible: polygon.scene_visible,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Polygon {
        Polygon::with_points(
            "Square",
            vec![
                Vec2::new(0.0, 0.0),
                Vec2::new(100.0, 0.0),
                Vec2::new(100.0, 100.0),
                Vec2::new(0.0, 100.0),
            ],
        )
    }

    #[test]
    fn test_centered_square() {
        let polygon = Polygon::centered_square("P", 1920.0, 1080.0);
        assert_eq!(polygon.point_count(), 4);
        assert_eq!(polygon.bounds(), Rect::new(825.0, 405.0, 270.0, 270.0));
        assert!(polygon.clip_path().is_some());
    }

    #[test]
    fn test_centered_square_falls_back_on_empty_canvas() {
        let polygon = Polygon::centered_square("P", 0.0, 0.0);
        assert_eq!(polygon.bounds().width, 270.0);
    }

    #[test]
    fn test_move_point_recomputes_bounds() {
        let mut polygon = square();
        polygon.take_changes();

        polygon.move_point(2, 50.0, 20.0);

        assert_eq!(polygon.bounds(), Rect::new(0.0, 0.0, 150.0, 120.0));
        assert_eq!(polygon.clip_path().unwrap().points()[2], Vec2::new(150.0, 120.0));
        assert_eq!(polygon.take_changes(), vec![PolygonChange::Geometry]);
    }

    #[test]
    #[should_panic]
    fn test_move_point_out_of_range_panics() {
        let mut polygon = square();
        polygon.move_point(4, 1.0, 1.0);
    }

    #[test]
    fn test_clip_appears_with_third_point() {
        let mut polygon = Polygon::new("P");
        polygon.add_point(Vec2::new(0.0, 0.0));
        polygon.add_point(Vec2::new(10.0, 0.0));
        assert!(polygon.clip_path().is_none());
        polygon.add_point(Vec2::new(10.0, 10.0));
        assert_eq!(polygon.clip_path().map(|c| c.len()), Some(3));

        polygon.remove_point(0);
        assert!(polygon.clip_path().is_none());
    }

    #[test]
    fn test_flag_changes_only_when_value_changes() {
        let mut polygon = square();
        polygon.take_changes();

        polygon.set_solo(false);
        polygon.set_scene_visible(true);
        assert!(!polygon.has_pending_changes());

        polygon.set_solo(true);
        polygon.set_muted(true);
        polygon.set_looping(true);
        polygon.set_scene_visible(false);
        assert_eq!(
            polygon.take_changes(),
            vec![
                PolygonChange::Solo,
                PolygonChange::Mute,
                PolygonChange::Loop,
                PolygonChange::SceneVisibility
            ]
        );
    }

    #[test]
    fn test_missing_media_detected() {
        let mut polygon = square();
        polygon.assign_media("/definitely/not/here/clip.mp4");

        assert_eq!(polygon.media_type(), MediaType::Video);
        assert!(polygon.is_media_missing());
        assert!(!polygon.has_valid_video());
        assert_eq!(
            polygon.take_changes().last(),
            Some(&PolygonChange::MediaMissing)
        );

        polygon.clear_media();
        assert!(!polygon.is_media_missing());
        assert_eq!(polygon.media_type(), MediaType::None);
    }

    #[test]
    fn test_present_media_is_valid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.mp4");
        std::fs::write(&path, b"not really a video").unwrap();

        let mut polygon = square();
        polygon.assign_media(&path);
        assert!(polygon.has_valid_video());
        assert!(!polygon.has_valid_image());

        std::fs::remove_file(&path).unwrap();
        polygon.refresh_media_missing();
        assert!(polygon.is_media_missing());
        assert!(!polygon.has_valid_video());
    }

    #[test]
    fn test_empty_media_path_is_no_media() {
        let mut polygon = square();
        polygon.set_media(Some(PathBuf::new()), MediaType::Video);
        assert!(polygon.media_path().is_none());
        assert!(!polygon.is_media_missing());
    }

    #[test]
    fn test_serde_rebuilds_derived_state() {
        let mut polygon = square();
        polygon.set_solo(true);
        polygon.set_order(3);

        let json = serde_json::to_string(&polygon).unwrap();
        assert!(!json.contains("bounds"));

        let restored: Polygon = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, polygon);
        assert_eq!(restored.bounds(), polygon.bounds());
        assert!(restored.clip_path().is_some());
        assert!(!restored.has_pending_changes());
    }
}
