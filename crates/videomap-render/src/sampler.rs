//! Texture sampling

use image::{Rgba, RgbaImage};

/// Bilinear sample at normalized texture coordinates with clamp-to-edge.
///
/// Texel `i` is centered at `(i + 0.5) / size`. Channels are interpolated
/// premultiplied so transparent texels do not bleed their color.
pub fn sample_bilinear(image: &RgbaImage, u: f32, v: f32) -> Rgba<u8> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Rgba([0, 0, 0, 0]);
    }

    let x = (u * width as f32 - 0.5).clamp(0.0, (width - 1) as f32);
    let y = (v * height as f32 - 0.5).clamp(0.0, (height - 1) as f32);

    let x0 = x.floor() as u32;
    let y0 = y.floor() as u32;
    let x1 = (x0 + 1).min(width - 1);
    let y1 = (y0 + 1).min(height - 1);
    let fx = x - x0 as f32;
    let fy = y - y0 as f32;

    let weights = [
        ((1.0 - fx) * (1.0 - fy), image.get_pixel(x0, y0)),
        (fx * (1.0 - fy), image.get_pixel(x1, y0)),
        ((1.0 - fx) * fy, image.get_pixel(x0, y1)),
        (fx * fy, image.get_pixel(x1, y1)),
    ];

    let mut acc = [0.0f32; 4];
    for (weight, pixel) in weights {
        let alpha = pixel[3] as f32 / 255.0;
        acc[0] += weight * pixel[0] as f32 * alpha;
        acc[1] += weight * pixel[1] as f32 * alpha;
        acc[2] += weight * pixel[2] as f32 * alpha;
        acc[3] += weight * alpha;
    }

    if acc[3] <= f32::EPSILON {
        return Rgba([0, 0, 0, 0]);
    }
    let alpha = acc[3];
    Rgba([
        to_u8(acc[0] / alpha),
        to_u8(acc[1] / alpha),
        to_u8(acc[2] / alpha),
        to_u8(alpha * 255.0),
    ])
}

fn to_u8(value: f32) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}
