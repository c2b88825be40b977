//! VideoMap Render - software compositing
//!
//! Turns polygon media into canvas pixels:
//! - bilinear sampling and the two-triangle quad warp
//! - clipped fills for polygons that are not quads
//! - per-polygon layer caching
//! - canvas and per-output composition

pub mod clip_fill;
pub mod compositor;
pub mod frame;
pub mod layer;
pub mod sampler;
pub mod warp;

pub use clip_fill::clip_fill;
pub use compositor::Compositor;
pub use frame::frame_to_image;
pub use layer::{render_polygon, LayerRenderer, RenderMode, RenderedLayer, MAX_LAYER_SIZE};
pub use sampler::sample_bilinear;
pub use warp::{has_coverage, quad_mesh, warp, warp_in_bounds, WarpVertex, QUAD_TRIANGLES, TEXTURE_CORNERS};
