//! Still image loading for image-assigned polygons

use crate::{MediaError, Result};
use image::RgbaImage;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

/// Decode a still image into RGBA8
pub fn load_still_image(path: &Path) -> Result<RgbaImage> {
    if !path.is_file() {
        return Err(MediaError::FileOpen(format!(
            "File not found: {}",
            path.display()
        )));
    }

    let image = image::open(path)
        .map_err(|e| MediaError::DecoderError(format!("Failed to load image: {}", e)))?;
    let rgba = image.to_rgba8();

    info!(
        "Still image loaded: {}x{} from {}",
        rgba.width(),
        rgba.height(),
        path.display()
    );
    Ok(rgba)
}

/// Loads each image once and shares the decoded pixels
#[derive(Debug, Default)]
pub struct StillImageCache {
    images: Mutex<HashMap<PathBuf, Arc<RgbaImage>>>,
}

impl StillImageCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decoded image for `path`, loading it on first use. Failures are logged
    /// and yield `None`; they are retried on the next call.
    pub fn get(&self, path: &Path) -> Option<Arc<RgbaImage>> {
        if let Some(image) = self.images.lock().get(path) {
            return Some(Arc::clone(image));
        }

        match load_still_image(path) {
            Ok(image) => {
                let image = Arc::new(image);
                self.images
                    .lock()
                    .insert(path.to_path_buf(), Arc::clone(&image));
                Some(image)
            }
            Err(e) => {
                warn!("{}", e);
                None
            }
        }
    }

    /// Forget a cached image, e.g. after the file was replaced
    pub fn invalidate(&self, path: &Path) {
        self.images.lock().remove(path);
    }

    pub fn clear(&self) {
        self.images.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.images.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.lock().is_empty()
    }
}
