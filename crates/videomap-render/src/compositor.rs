//! Canvas and output composition
//!
//! Layers are blended source-over in the order given, so callers pass them
//! bottom to top (ascending z-order).

use crate::layer::RenderedLayer;
use image::imageops::{self, FilterType};
use image::RgbaImage;
use tracing::debug;
use videomap_core::OutputSurface;

/// Blends rendered polygon layers onto a transparent canvas
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Compositor {
    width: u32,
    height: u32,
}

impl Compositor {
    /// Canvas of `width x height` pixels, at least 1x1
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
        }
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Blend `layers` bottom to top onto a fresh canvas
    pub fn compose<'a, I>(&self, layers: I) -> RgbaImage
    where
        I: IntoIterator<Item = &'a RenderedLayer>,
    {
        let mut canvas = RgbaImage::new(self.width, self.height);
        for layer in layers {
            let (x, y) = layer.offset();
            imageops::overlay(&mut canvas, &layer.image, x, y);
        }
        canvas
    }

    /// Compose the canvas and scale it to the output's pixel size.
    ///
    /// Choosing which layers belong to the output is the caller's job.
    pub fn compose_output<'a, I>(&self, layers: I, output: &OutputSurface) -> RgbaImage
    where
        I: IntoIterator<Item = &'a RenderedLayer>,
    {
        let canvas = self.compose(layers);
        let (width, height) = output.size();
        if (width, height) == (self.width, self.height) || width == 0 || height == 0 {
            return canvas;
        }

        debug!(
            "Scaling canvas {}x{} to output '{}' {}x{}",
            self.width, self.height, output.name, width, height
        );
        imageops::resize(&canvas, width, height, FilterType::Triangle)
    }
}
