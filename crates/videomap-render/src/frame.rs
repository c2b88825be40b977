//! Decoder frames to images

use image::RgbaImage;
use videomap_media::{FrameBuffer, PixelFormat};

/// Copy a decoded frame into a tightly packed RGBA image, honouring the
/// frame's pitch and channel order. `None` if the frame is empty.
pub fn frame_to_image(frame: &FrameBuffer) -> Option<RgbaImage> {
    let (width, height) = (frame.width(), frame.height());
    if width == 0 || height == 0 {
        return None;
    }

    let row_bytes = width as usize * 4;
    let mut pixels = Vec::with_capacity(row_bytes * height as usize);
    for y in 0..height {
        let row = &frame.row(y)[..row_bytes];
        match frame.pixel_format() {
            PixelFormat::Rgba8 => pixels.extend_from_slice(row),
            PixelFormat::Bgra8 => {
                for bgra in row.chunks_exact(4) {
                    pixels.extend_from_slice(&[bgra[2], bgra[1], bgra[0], bgra[3]]);
                }
            }
        }
    }

    RgbaImage::from_raw(width, height, pixels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;
    use videomap_media::FrameFormat;

    #[test]
    fn test_bgra_is_swizzled() {
        let format = FrameFormat::packed(2, 1, PixelFormat::Bgra8).unwrap();
        let frame = FrameBuffer::from_data(format, vec![1, 2, 3, 4, 5, 6, 7, 8]).unwrap();

        let image = frame_to_image(&frame).unwrap();
        assert_eq!(*image.get_pixel(0, 0), Rgba([3, 2, 1, 4]));
        assert_eq!(*image.get_pixel(1, 0), Rgba([7, 6, 5, 8]));
    }

    #[test]
    fn test_padded_pitch_is_skipped() {
        let format = FrameFormat {
            width: 1,
            height: 2,
            pitch: 8,
            pixel_format: PixelFormat::Rgba8,
        };
        let data = vec![10, 11, 12, 13, 0, 0, 0, 0, 20, 21, 22, 23, 0, 0, 0, 0];
        let frame = FrameBuffer::from_data(format, data).unwrap();

        let image = frame_to_image(&frame).unwrap();
        assert_eq!(image.dimensions(), (1, 2));
        assert_eq!(*image.get_pixel(0, 1), Rgba([20, 21, 22, 23]));
    }
}
