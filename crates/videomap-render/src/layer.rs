//! Per-polygon layer rendering
//!
//! A polygon with exactly 4 points is quad-warped; one with 3 or 5+ points
//! gets a flat clipped fill. Fewer than 3 points or a zero-area bounding box
//! renders nothing.

use crate::clip_fill::clip_fill;
use crate::frame::frame_to_image;
use crate::warp::warp_in_bounds;
use glam::Vec2;
use image::RgbaImage;
use std::sync::Arc;
use tracing::{trace, warn};
use videomap_core::{FillRule, Polygon, PolygonChange};
use videomap_media::FrameBuffer;

/// Largest layer edge in pixels; bigger polygons are not rendered
pub const MAX_LAYER_SIZE: u32 = 16_384;

/// A polygon's pixels, positioned on the canvas
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedLayer {
    pub image: RgbaImage,
    /// Canvas position of pixel (0, 0): the bounding-box origin rounded down
    /// to whole pixels
    pub origin: Vec2,
}

impl RenderedLayer {
    /// Whole-pixel canvas offset used when compositing
    pub fn offset(&self) -> (i64, i64) {
        (self.origin.x.floor() as i64, self.origin.y.floor() as i64)
    }
}

/// How a polygon's media reaches the canvas
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    /// Two-triangle quad warp
    Warp,
    /// Source stretched over the bounding box, clipped to the outline
    ClipFill,
}

impl RenderMode {
    /// Mode for the polygon's current geometry, `None` if nothing can be drawn
    pub fn for_polygon(polygon: &Polygon) -> Option<Self> {
        if polygon.clip_path().is_none() || polygon.bounds().is_empty() {
            return None;
        }
        if polygon.point_count() == 4 {
            Some(RenderMode::Warp)
        } else {
            Some(RenderMode::ClipFill)
        }
    }
}

/// Render `source` into the polygon's region.
///
/// The layer covers the bounding box widened to whole pixels, so fractional
/// points keep their canvas position. `None` when nothing can be drawn or the
/// layer would exceed [`MAX_LAYER_SIZE`] on either side.
pub fn render_polygon(
    polygon: &Polygon,
    source: &RgbaImage,
    rule: FillRule,
) -> Option<RenderedLayer> {
    let mode = RenderMode::for_polygon(polygon)?;
    let bounds = polygon.bounds();
    let raster = bounds.pixel_snapped();

    let (width, height) = raster.pixel_size();
    if width > MAX_LAYER_SIZE || height > MAX_LAYER_SIZE {
        warn!(
            "Polygon '{}' needs a {}x{} layer, over the {} pixel limit; not rendered",
            polygon.name(),
            width,
            height,
            MAX_LAYER_SIZE
        );
        return None;
    }

    let image = match mode {
        RenderMode::Warp => {
            let points = polygon.points();
            let quad = [points[0], points[1], points[2], points[3]];
            warp_in_bounds(source, &quad, raster)
        }
        RenderMode::ClipFill => clip_fill(source, polygon.clip_path()?, bounds, rule)?,
    };

    Some(RenderedLayer {
        image,
        origin: raster.origin(),
    })
}

#[derive(Debug, Clone)]
enum SourceKey {
    Still(Arc<RgbaImage>),
    Frame(u64),
}

/// Caches a polygon's rendered layer until its geometry or source changes
#[derive(Debug, Clone)]
pub struct LayerRenderer {
    fill_rule: FillRule,
    layer: Option<Arc<RenderedLayer>>,
    source: Option<SourceKey>,
    dirty: bool,
}

impl Default for LayerRenderer {
    fn default() -> Self {
        Self::new(FillRule::default())
    }
}

impl LayerRenderer {
    pub fn new(fill_rule: FillRule) -> Self {
        Self {
            fill_rule,
            layer: None,
            source: None,
            dirty: true,
        }
    }

    /// React to a polygon change
    pub fn observe(&mut self, change: PolygonChange) {
        match change {
            PolygonChange::Geometry => self.dirty = true,
            PolygonChange::Media | PolygonChange::MediaMissing => self.clear(),
            _ => {}
        }
    }

    /// Drop the cached layer; nothing is shown until the next render
    pub fn clear(&mut self) {
        self.layer = None;
        self.source = None;
        self.dirty = true;
    }

    /// Last rendered layer
    pub fn current(&self) -> Option<Arc<RenderedLayer>> {
        self.layer.clone()
    }

    /// Render a still image, reusing the cached layer when nothing changed
    pub fn render_still(
        &mut self,
        polygon: &Polygon,
        image: &Arc<RgbaImage>,
    ) -> Option<Arc<RenderedLayer>> {
        let unchanged = matches!(&self.source, Some(SourceKey::Still(cached)) if Arc::ptr_eq(cached, image));
        if unchanged && !self.dirty {
            return self.layer.clone();
        }

        trace!("Rendering still layer for '{}'", polygon.name());
        self.store(
            render_polygon(polygon, image, self.fill_rule),
            SourceKey::Still(Arc::clone(image)),
        )
    }

    /// Render a decoded frame, reusing the cached layer when nothing changed
    pub fn render_frame(
        &mut self,
        polygon: &Polygon,
        frame: &FrameBuffer,
    ) -> Option<Arc<RenderedLayer>> {
        let unchanged = matches!(&self.source, Some(SourceKey::Frame(seq)) if *seq == frame.sequence());
        if unchanged && !self.dirty {
            return self.layer.clone();
        }

        let layer = frame_to_image(frame).and_then(|image| render_polygon(polygon, &image, self.fill_rule));
        self.store(layer, SourceKey::Frame(frame.sequence()))
    }

    /// Re-render from the last source after a geometry change
    pub fn refresh(&mut self, polygon: &Polygon) -> Option<Arc<RenderedLayer>> {
        if !self.dirty {
            return self.layer.clone();
        }
        match self.source.clone() {
            Some(SourceKey::Still(image)) => self.render_still(polygon, &image),
            // Frames are not retained; the next frame re-renders
            Some(SourceKey::Frame(_)) | None => self.layer.clone(),
        }
    }

    fn store(
        &mut self,
        layer: Option<RenderedLayer>,
        source: SourceKey,
    ) -> Option<Arc<RenderedLayer>> {
        self.layer = layer.map(Arc::new);
        self.source = Some(source);
        self.dirty = false;
        self.layer.clone()
    }
}
