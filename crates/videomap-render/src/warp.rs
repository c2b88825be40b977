//! Quad warp - maps a rectangular source onto 4 destination points
//!
//! The destination quad is split into the triangles `(0,1,2)` and `(0,2,3)`,
//! each textured from the matching source corners (top-left, top-right,
//! bottom-right, bottom-left). The quad is not assumed convex: a twisted quad
//! rasterizes as two overlapping triangles rather than failing.

use crate::sampler::sample_bilinear;
use glam::Vec2;
use image::{Rgba, RgbaImage};
use videomap_core::Rect;

/// Triangle indices into the destination quad
pub const QUAD_TRIANGLES: [[usize; 3]; 2] = [[0, 1, 2], [0, 2, 3]];

/// Normalized source corners matched to destination points 0..4
pub const TEXTURE_CORNERS: [Vec2; 4] = [
    Vec2::new(0.0, 0.0), // top-left
    Vec2::new(1.0, 0.0), // top-right
    Vec2::new(1.0, 1.0), // bottom-right
    Vec2::new(0.0, 1.0), // bottom-left
];

/// Barycentric slack so pixels on a shared edge belong to both triangles
const EDGE_EPSILON: f32 = 1e-4;

/// Destination position paired with a normalized texture coordinate
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WarpVertex {
    pub position: Vec2,
    pub uv: Vec2,
}

impl WarpVertex {
    pub fn new(position: Vec2, uv: Vec2) -> Self {
        Self { position, uv }
    }
}

/// Quad mesh for `quad` with positions relative to `origin`
pub fn quad_mesh(quad: &[Vec2; 4], origin: Vec2) -> [WarpVertex; 4] {
    std::array::from_fn(|i| WarpVertex::new(quad[i] - origin, TEXTURE_CORNERS[i]))
}

/// Warp `source` onto `quad`.
///
/// The result covers the quad's bounding box: `ceil(width) x ceil(height)`
/// pixels, at least 1x1, with pixel (0, 0) at the box origin. Pixels outside
/// both triangles are fully transparent.
pub fn warp(source: &RgbaImage, quad: &[Vec2; 4]) -> RgbaImage {
    let bounds = Rect::from_points(quad);
    warp_in_bounds(source, quad, bounds)
}

/// Like [`warp`], with the output box given explicitly
pub fn warp_in_bounds(source: &RgbaImage, quad: &[Vec2; 4], bounds: Rect) -> RgbaImage {
    let (width, height) = bounds.pixel_size();
    let mut output = RgbaImage::new(width, height);
    if source.width() == 0 || source.height() == 0 {
        return output;
    }

    let mesh = quad_mesh(quad, bounds.origin());
    for [a, b, c] in QUAD_TRIANGLES {
        rasterize_triangle(&mut output, source, mesh[a], mesh[b], mesh[c]);
    }
    output
}

fn rasterize_triangle(
    output: &mut RgbaImage,
    source: &RgbaImage,
    a: WarpVertex,
    b: WarpVertex,
    c: WarpVertex,
) {
    let area = edge(a.position, b.position, c.position);
    if area.abs() <= f32::EPSILON {
        return;
    }

    let (width, height) = output.dimensions();
    let min = a.position.min(b.position).min(c.position);
    let max = a.position.max(b.position).max(c.position);

    let x_start = min.x.floor().max(0.0) as u32;
    let y_start = min.y.floor().max(0.0) as u32;
    let x_end = (max.x.ceil().max(0.0) as u32).min(width);
    let y_end = (max.y.ceil().max(0.0) as u32).min(height);

    for y in y_start..y_end {
        for x in x_start..x_end {
            let p = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);

            let w0 = edge(b.position, c.position, p) / area;
            let w1 = edge(c.position, a.position, p) / area;
            let w2 = edge(a.position, b.position, p) / area;
            if w0 < -EDGE_EPSILON || w1 < -EDGE_EPSILON || w2 < -EDGE_EPSILON {
                continue;
            }

            let uv = a.uv * w0 + b.uv * w1 + c.uv * w2;
            output.put_pixel(x, y, sample_bilinear(source, uv.x, uv.y));
        }
    }
}

/// Twice the signed area of `(a, b, p)`
fn edge(a: Vec2, b: Vec2, p: Vec2) -> f32 {
    (b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x)
}

/// True if any pixel of `image` is not fully transparent
pub fn has_coverage(image: &RgbaImage) -> bool {
    image.pixels().any(|p: &Rgba<u8>| p[3] > 0)
}
