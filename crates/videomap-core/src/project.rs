//! Project - the persisted container of polygons, scenes and outputs
//!
//! Polygons are kept sorted by z-order with `order == index`; every operation
//! that reorders or removes polygons re-indexes them.

use crate::config::CanvasConfig;
use crate::output::{OutputId, OutputSurface, DEFAULT_OUTPUT_HEIGHT, DEFAULT_OUTPUT_WIDTH};
use crate::polygon::{Polygon, PolygonId};
use crate::scene::{Scene, SceneId, DEFAULT_SCENE_DURATION};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

/// Default project name
pub const DEFAULT_PROJECT_NAME: &str = "Untitled";

/// Project container
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    /// Display name
    pub name: String,
    /// Canvas width in canvas units (pixels)
    pub canvas_width: f32,
    /// Canvas height in canvas units (pixels)
    pub canvas_height: f32,
    /// Polygons in z-order (index 0 is drawn first)
    #[serde(default)]
    pub polygons: Vec<Polygon>,
    /// Scenes in playback order
    #[serde(default)]
    pub scenes: Vec<Scene>,
    /// Projector and export targets
    #[serde(default)]
    pub outputs: Vec<OutputSurface>,
}

impl Default for Project {
    fn default() -> Self {
        Self::new(
            DEFAULT_PROJECT_NAME,
            DEFAULT_OUTPUT_WIDTH as f32,
            DEFAULT_OUTPUT_HEIGHT as f32,
        )
    }
}

impl Project {
    /// Create an empty project with the given canvas size
    pub fn new(name: impl Into<String>, canvas_width: f32, canvas_height: f32) -> Self {
        Self {
            name: name.into(),
            canvas_width,
            canvas_height,
            polygons: Vec::new(),
            scenes: Vec::new(),
            outputs: Vec::new(),
        }
    }

    /// A project with one output covering the canvas and one 5 second scene
    pub fn create_default() -> Self {
        Self::create_with_canvas(DEFAULT_PROJECT_NAME, &CanvasConfig::default())
    }

    /// Like [`create_default`](Self::create_default), with the configured
    /// canvas size. A zero dimension falls back to 1920x1080.
    pub fn create_with_canvas(name: impl Into<String>, canvas: &CanvasConfig) -> Self {
        let (width, height) = if canvas.default_width > 0 && canvas.default_height > 0 {
            (canvas.default_width, canvas.default_height)
        } else {
            (DEFAULT_OUTPUT_WIDTH, DEFAULT_OUTPUT_HEIGHT)
        };
        let mut project = Self::new(name, width as f32, height as f32);
        project.ensure_defaults();
        project
    }

    /// Canvas size in whole pixels
    pub fn canvas_pixel_size(&self) -> (u32, u32) {
        (
            self.canvas_width.ceil().max(1.0) as u32,
            self.canvas_height.ceil().max(1.0) as u32,
        )
    }

    /// Repair a loaded project: defaults, z-order indices, per-item defaults
    /// and ids that no longer reference a polygon.
    pub fn normalize(&mut self) {
        if self.name.trim().is_empty() {
            self.name = DEFAULT_PROJECT_NAME.to_string();
        }
        if !(self.canvas_width.is_finite() && self.canvas_width > 0.0)
            || !(self.canvas_height.is_finite() && self.canvas_height > 0.0)
        {
            self.canvas_width = DEFAULT_OUTPUT_WIDTH as f32;
            self.canvas_height = DEFAULT_OUTPUT_HEIGHT as f32;
        }

        self.ensure_defaults();

        // Stable sort keeps insertion order among equal indices
        self.polygons.sort_by_key(|p| p.order());
        self.reindex();
        for polygon in &mut self.polygons {
            polygon.normalize();
        }
        for scene in &mut self.scenes {
            scene.normalize();
        }
        for output in &mut self.outputs {
            output.normalize();
        }

        self.prune_dangling_ids();
    }

    fn ensure_defaults(&mut self) {
        if self.outputs.is_empty() {
            let (width, height) = self.canvas_pixel_size();
            self.outputs.push(OutputSurface::new("Output 1", width, height));
        }
        if self.scenes.is_empty() {
            self.scenes
                .push(Scene::new("Scene 1", DEFAULT_SCENE_DURATION));
        }
    }

    fn reindex(&mut self) {
        for (index, polygon) in self.polygons.iter_mut().enumerate() {
            polygon.set_order(index);
        }
    }

    /// Drop scene and output references to polygons that do not exist
    pub fn prune_dangling_ids(&mut self) {
        let known: HashSet<PolygonId> = self.polygons.iter().map(|p| p.id()).collect();
        for scene in &mut self.scenes {
            scene.active_polygon_ids.retain(|id| known.contains(id));
        }
        for output in &mut self.outputs {
            output.polygon_ids.retain(|id| known.contains(id));
        }
    }

    // --- Polygons ---

    /// Look up a polygon
    pub fn polygon(&self, id: PolygonId) -> Option<&Polygon> {
        self.polygons.iter().find(|p| p.id() == id)
    }

    /// Look up a polygon mutably
    pub fn polygon_mut(&mut self, id: PolygonId) -> Option<&mut Polygon> {
        self.polygons.iter_mut().find(|p| p.id() == id)
    }

    /// Z-order index of a polygon
    pub fn polygon_index(&self, id: PolygonId) -> Option<usize> {
        self.polygons.iter().position(|p| p.id() == id)
    }

    /// Add the default centered square on top of the stack. The new polygon is
    /// made active in every scene and assigned to every output.
    pub fn add_polygon(&mut self) -> PolygonId {
        let name = format!("Polygon {}", self.polygons.len() + 1);
        let mut polygon = Polygon::centered_square(name, self.canvas_width, self.canvas_height);
        polygon.set_order(self.polygons.len());
        let id = polygon.id();

        self.insert_polygon(polygon);
        id
    }

    /// Append an existing polygon on top of the stack, registering it with
    /// every scene and output
    pub fn insert_polygon(&mut self, mut polygon: Polygon) {
        let id = polygon.id();
        polygon.set_order(self.polygons.len());
        self.polygons.push(polygon);

        for scene in &mut self.scenes {
            scene.active_polygon_ids.insert(id);
        }
        for output in &mut self.outputs {
            output.assign(id);
        }
        debug!("Added polygon {}", id);
    }

    /// Remove a polygon and every reference to it
    pub fn remove_polygon(&mut self, id: PolygonId) -> Option<Polygon> {
        let index = self.polygon_index(id)?;
        let polygon = self.polygons.remove(index);

        for scene in &mut self.scenes {
            scene.active_polygon_ids.remove(&id);
        }
        for output in &mut self.outputs {
            output.unassign(id);
        }
        self.reindex();
        debug!("Removed polygon {}", id);
        Some(polygon)
    }

    /// Swap a polygon with its neighbour in z-order. Negative `direction` moves
    /// it down (drawn earlier), positive moves it up. Returns false at the ends.
    pub fn move_polygon(&mut self, id: PolygonId, direction: isize) -> bool {
        let Some(index) = self.polygon_index(id) else {
            return false;
        };
        let Some(target) = index.checked_add_signed(direction.signum()) else {
            return false;
        };
        if direction == 0 || target >= self.polygons.len() {
            return false;
        }

        self.polygons.swap(index, target);
        self.reindex();
        true
    }

    /// True when any polygon has the solo flag set
    pub fn solo_active(&self) -> bool {
        self.polygons.iter().any(|p| p.is_solo())
    }

    // --- Scenes ---

    /// Add a scene showing every current polygon
    pub fn add_scene(&mut self) -> SceneId {
        let name = format!("Scene {}", self.scenes.len() + 1);
        let scene = Scene::new(name, DEFAULT_SCENE_DURATION)
            .with_active(self.polygons.iter().map(|p| p.id()));
        let id = scene.id;
        self.scenes.push(scene);
        id
    }

    /// Remove a scene by id
    pub fn remove_scene(&mut self, id: SceneId) -> Option<Scene> {
        let index = self.scenes.iter().position(|s| s.id == id)?;
        Some(self.scenes.remove(index))
    }

    /// Apply the scene at `index` to the polygons. Returns false if out of range.
    pub fn apply_scene(&mut self, index: usize) -> bool {
        match self.scenes.get(index) {
            Some(scene) => {
                scene.apply(&mut self.polygons);
                true
            }
            None => false,
        }
    }

    // --- Outputs ---

    /// Add an output the size of the canvas with every polygon assigned
    pub fn add_output(&mut self) -> OutputId {
        let name = format!("Output {}", self.outputs.len() + 1);
        let (width, height) = self.canvas_pixel_size();
        let mut output = OutputSurface::new(name, width, height);
        output.polygon_ids = self.polygons.iter().map(|p| p.id()).collect();
        let id = output.id;
        self.outputs.push(output);
        id
    }

    /// Remove an output by id
    pub fn remove_output(&mut self, id: OutputId) -> Option<OutputSurface> {
        let index = self.outputs.iter().position(|o| o.id == id)?;
        Some(self.outputs.remove(index))
    }

    /// Look up an output
    pub fn output(&self, id: OutputId) -> Option<&OutputSurface> {
        self.outputs.iter().find(|o| o.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Rect;

    #[test]
    fn test_create_default() {
        let project = Project::create_default();
        assert_eq!(project.outputs.len(), 1);
        assert_eq!(project.outputs[0].name, "Output 1");
        assert_eq!(project.outputs[0].size(), (1920, 1080));
        assert_eq!(project.scenes.len(), 1);
        assert_eq!(project.scenes[0].duration_seconds, 5.0);
        assert!(project.polygons.is_empty());
    }

    #[test]
    fn test_create_with_canvas_sizes_output() {
        let canvas = CanvasConfig {
            default_width: 1280,
            default_height: 720,
        };
        let project = Project::create_with_canvas("Stage", &canvas);
        assert_eq!(project.name, "Stage");
        assert_eq!((project.canvas_width, project.canvas_height), (1280.0, 720.0));
        assert_eq!(project.outputs[0].size(), (1280, 720));

        let zero = CanvasConfig {
            default_width: 0,
            default_height: 720,
        };
        let project = Project::create_with_canvas("Stage", &zero);
        assert_eq!(project.outputs[0].size(), (1920, 1080));
    }

    #[test]
    fn test_add_polygon_registers_everywhere() {
        let mut project = Project::create_default();
        let id = project.add_polygon();

        let polygon = project.polygon(id).unwrap();
        assert_eq!(polygon.name(), "Polygon 1");
        assert_eq!(polygon.bounds(), Rect::new(825.0, 405.0, 270.0, 270.0));
        assert!(project.scenes[0].active_polygon_ids.contains(&id));
        assert!(project.outputs[0].contains(id));
    }

    #[test]
    fn test_remove_polygon_reindexes() {
        let mut project = Project::create_default();
        let a = project.add_polygon();
        let b = project.add_polygon();
        let c = project.add_polygon();

        project.remove_polygon(a).unwrap();

        assert_eq!(project.polygon(b).unwrap().order(), 0);
        assert_eq!(project.polygon(c).unwrap().order(), 1);
        assert!(!project.scenes[0].active_polygon_ids.contains(&a));
        assert!(!project.outputs[0].contains(a));
        assert!(project.remove_polygon(a).is_none());
    }

    #[test]
    fn test_move_polygon() {
        let mut project = Project::create_default();
        let a = project.add_polygon();
        let b = project.add_polygon();

        assert!(!project.move_polygon(a, -1));
        assert!(project.move_polygon(a, 1));
        assert_eq!(project.polygon_index(a), Some(1));
        assert_eq!(project.polygon(b).unwrap().order(), 0);
        assert!(!project.move_polygon(a, 1));
    }

    #[test]
    fn test_normalize_sorts_and_prunes() {
        let mut project = Project::new("", 0.0, 0.0);
        let mut top = Polygon::new("");
        top.set_order(7);
        let mut bottom = Polygon::new("Bottom");
        bottom.set_order(2);
        let (top_id, bottom_id) = (top.id(), bottom.id());
        project.polygons = vec![top, bottom];

        let ghost = uuid::Uuid::new_v4();
        project.scenes.push(Scene::new("S", 0.0).with_active([ghost, top_id]));

        project.normalize();

        assert_eq!(project.name, DEFAULT_PROJECT_NAME);
        assert_eq!(project.polygon_index(bottom_id), Some(0));
        assert_eq!(project.polygon(top_id).unwrap().order(), 1);
        assert_eq!(project.polygon(top_id).unwrap().name(), "Polygon");
        assert_eq!(project.scenes[0].duration_seconds, 5.0);
        assert!(!project.scenes[0].active_polygon_ids.contains(&ghost));
        assert_eq!(project.outputs.len(), 1);
    }

    #[test]
    fn test_add_scene_and_output_include_all_polygons() {
        let mut project = Project::create_default();
        let a = project.add_polygon();
        let b = project.add_polygon();

        let scene = project.add_scene();
        let output = project.add_output();

        let scene = project.scenes.iter().find(|s| s.id == scene).unwrap();
        assert_eq!(scene.name, "Scene 2");
        assert!(scene.shows(a) && scene.shows(b));
        assert_eq!(project.output(output).unwrap().polygon_ids, vec![a, b]);

        assert!(project.remove_output(output).is_some());
        assert_eq!(project.outputs.len(), 1);
    }

    #[test]
    fn test_apply_scene() {
        let mut project = Project::create_default();
        let a = project.add_polygon();
        let b = project.add_polygon();
        project.scenes[0].active_polygon_ids = [a].into_iter().collect();

        assert!(project.apply_scene(0));
        assert!(project.polygon(a).unwrap().is_scene_visible());
        assert!(!project.polygon(b).unwrap().is_scene_visible());
        assert!(!project.apply_scene(3));
    }

    #[test]
    fn test_ron_roundtrip() {
        let mut project = Project::create_default();
        project.add_polygon();

        let text = ron::to_string(&project).unwrap();
        let restored: Project = ron::from_str(&text).unwrap();
        assert_eq!(restored, project);
    }
}
