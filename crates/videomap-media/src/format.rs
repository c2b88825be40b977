//! Pixel and frame formats negotiated with the decoder

/// Packed 32-bit pixel layouts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PixelFormat {
    /// Blue, green, red, alpha in memory order (little-endian RV32)
    #[default]
    Bgra8,
    /// Red, green, blue, alpha in memory order
    Rgba8,
}

impl PixelFormat {
    /// Bytes per pixel; every supported format is 32-bit packed
    pub const fn bytes_per_pixel(self) -> usize {
        4
    }

    /// Four-character code used when negotiating with the decoder
    pub const fn fourcc(self) -> &'static str {
        match self {
            PixelFormat::Bgra8 => "RV32",
            PixelFormat::Rgba8 => "RGBA",
        }
    }
}

/// Frame geometry announced by the decoder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameFormat {
    pub width: u32,
    pub height: u32,
    /// Bytes per row
    pub pitch: u32,
    pub pixel_format: PixelFormat,
}

impl FrameFormat {
    /// Tightly packed format (`pitch = width * 4`). `None` if the pitch overflows.
    pub fn packed(width: u32, height: u32, pixel_format: PixelFormat) -> Option<Self> {
        let pitch = width.checked_mul(pixel_format.bytes_per_pixel() as u32)?;
        Some(Self {
            width,
            height,
            pitch,
            pixel_format,
        })
    }

    /// Total buffer size, `height * pitch`. `None` on overflow.
    pub fn byte_len(&self) -> Option<usize> {
        (self.height as usize).checked_mul(self.pitch as usize)
    }

    /// True when the format describes no pixels
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packed_pitch() {
        let format = FrameFormat::packed(1920, 1080, PixelFormat::Bgra8).unwrap();
        assert_eq!(format.pitch, 7680);
        assert_eq!(format.byte_len(), Some(1080 * 7680));
    }

    #[test]
    fn test_pitch_overflow() {
        assert!(FrameFormat::packed(u32::MAX, 1, PixelFormat::Rgba8).is_none());
    }
}
