//! Flat clipped fill for polygons that are not quads
//!
//! The source is stretched over the polygon's bounding box and painted
//! through the polygon's outline. No mesh warp is involved.

use image::{Rgba, RgbaImage};
use tiny_skia::{
    ColorU8, FilterQuality, Paint, PathBuilder, Pattern, Pixmap, SpreadMode, Transform,
};
use videomap_core::{ClipPath, FillRule, Rect};

/// Fill `clip` with `source` stretched over `bounds`.
///
/// The result covers `bounds.pixel_snapped()`, so pixel (0, 0) sits at the
/// floor of the box origin. Returns `None` when the box has no area or the
/// outline cannot be built.
pub fn clip_fill(
    source: &RgbaImage,
    clip: &ClipPath,
    bounds: Rect,
    rule: FillRule,
) -> Option<RgbaImage> {
    if bounds.is_empty() || source.width() == 0 || source.height() == 0 {
        return None;
    }

    let raster = bounds.pixel_snapped();
    let (width, height) = raster.pixel_size();
    let mut canvas = Pixmap::new(width, height)?;
    let texture = to_pixmap(source)?;

    let origin = raster.origin();
    let offset = bounds.origin() - origin;
    let mut builder = PathBuilder::new();
    let mut points = clip.points().iter().map(|p| *p - origin);
    let first = points.next()?;
    builder.move_to(first.x, first.y);
    for point in points {
        builder.line_to(point.x, point.y);
    }
    builder.close();
    let path = builder.finish()?;

    let scale_x = bounds.width / source.width() as f32;
    let scale_y = bounds.height / source.height() as f32;

    let paint = Paint {
        shader: Pattern::new(
            texture.as_ref(),
            SpreadMode::Pad,
            FilterQuality::Bilinear,
            1.0,
            Transform::from_row(scale_x, 0.0, 0.0, scale_y, offset.x, offset.y),
        ),
        anti_alias: true,
        ..Default::default()
    };

    canvas.fill_path(
        &path,
        &paint,
        skia_fill_rule(rule),
        Transform::identity(),
        None,
    );

    Some(from_pixmap(&canvas))
}

fn skia_fill_rule(rule: FillRule) -> tiny_skia::FillRule {
    match rule {
        FillRule::EvenOdd => tiny_skia::FillRule::EvenOdd,
        FillRule::NonZero => tiny_skia::FillRule::Winding,
    }
}

/// Straight-alpha RGBA into a premultiplied pixmap
pub fn to_pixmap(image: &RgbaImage) -> Option<Pixmap> {
    let mut pixmap = Pixmap::new(image.width(), image.height())?;
    for (dst, src) in pixmap.pixels_mut().iter_mut().zip(image.pixels()) {
        *dst = ColorU8::from_rgba(src[0], src[1], src[2], src[3]).premultiply();
    }
    Some(pixmap)
}

/// Premultiplied pixmap back into straight-alpha RGBA
pub fn from_pixmap(pixmap: &Pixmap) -> RgbaImage {
    let mut image = RgbaImage::new(pixmap.width(), pixmap.height());
    for (dst, src) in image.pixels_mut().zip(pixmap.pixels()) {
        let color = src.demultiply();
        *dst = Rgba([color.red(), color.green(), color.blue(), color.alpha()]);
    }
    image
}
