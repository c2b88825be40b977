//! Media classification by file extension

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Kind of media assigned to a polygon
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MediaType {
    /// Nothing assigned, or an unrecognised file
    #[default]
    None,
    /// Still image (png, jpg, ...)
    Image,
    /// Video clip (mp4, mov, ...)
    Video,
}

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "gif", "tiff", "webp"];
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "mkv", "avi", "webm", "mpeg", "mpg"];

impl MediaType {
    /// Determines the media type from the file path extension (case-insensitive).
    pub fn from_path(path: &Path) -> Self {
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            return MediaType::None;
        };
        let ext = ext.to_lowercase();

        if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
            MediaType::Image
        } else if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
            MediaType::Video
        } else {
            MediaType::None
        }
    }
}

/// Classify a media path: `{none, image, video}` by extension
pub fn classify(path: impl AsRef<Path>) -> MediaType {
    MediaType::from_path(path.as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_known_extensions() {
        assert_eq!(classify("clip.mp4"), MediaType::Video);
        assert_eq!(classify("/media/show/INTRO.MOV"), MediaType::Video);
        assert_eq!(classify("still.jpeg"), MediaType::Image);
        assert_eq!(classify("anim.GIF"), MediaType::Image);
    }

    #[test]
    fn test_classify_unknown() {
        assert_eq!(classify("notes.txt"), MediaType::None);
        assert_eq!(classify("no_extension"), MediaType::None);
        assert_eq!(classify(""), MediaType::None);
    }
}
