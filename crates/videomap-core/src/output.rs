//! Output Surfaces - named export targets grouping polygons
//!
//! An output surface is a pixel size plus the list of polygons composed onto it.
//! It is purely a grouping concern; the warp and playback paths never look at it.

use crate::polygon::PolygonId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for an output surface
pub type OutputId = Uuid;

/// Width used when an output has no valid size
pub const DEFAULT_OUTPUT_WIDTH: u32 = 1920;
/// Height used when an output has no valid size
pub const DEFAULT_OUTPUT_HEIGHT: u32 = 1080;

/// A projector / export target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputSurface {
    /// Stable identity
    pub id: OutputId,
    /// Display name
    pub name: String,
    /// Output width in pixels
    pub width: u32,
    /// Output height in pixels
    pub height: u32,
    /// Polygons composed onto this output
    #[serde(default)]
    pub polygon_ids: Vec<PolygonId>,
}

impl OutputSurface {
    /// Create an output with no polygons assigned
    pub fn new(name: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            width,
            height,
            polygon_ids: Vec::new(),
        }
    }

    /// Output resolution
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Whether the polygon is assigned to this output
    pub fn contains(&self, id: PolygonId) -> bool {
        self.polygon_ids.contains(&id)
    }

    /// Assign a polygon; no-op if already assigned
    pub fn assign(&mut self, id: PolygonId) {
        if !self.contains(id) {
            self.polygon_ids.push(id);
        }
    }

    /// Unassign a polygon, returning whether it was assigned
    pub fn unassign(&mut self, id: PolygonId) -> bool {
        let before = self.polygon_ids.len();
        self.polygon_ids.retain(|p| *p != id);
        self.polygon_ids.len() != before
    }

    /// Fill in defaults after loading
    pub fn normalize(&mut self) {
        if self.id.is_nil() {
            self.id = Uuid::new_v4();
        }
        if self.name.trim().is_empty() {
            self.name = "Output".to_string();
        }
        if self.width == 0 || self.height == 0 {
            self.width = DEFAULT_OUTPUT_WIDTH;
            self.height = DEFAULT_OUTPUT_HEIGHT;
        }
    }
}
