//! VideoMap Media - Decoder Intake and Playback
//!
//! This crate sits between the decoder engine and the renderer:
//! - Frame formats and the double-buffered frame buffer manager
//! - The single-slot composite gate that marshals frames to the UI thread
//! - Decoder capability traits and a software test-pattern engine
//! - Native decoder library discovery
//! - Still image loading
//! - The per-polygon playback controller

use thiserror::Error;

pub mod decoder;
pub mod engine;
pub mod format;
pub mod frame_buffer;
pub mod playback;
pub mod still;
pub mod test_pattern;

pub use decoder::{DecoderEngine, DecoderSession, FrameSink, PlayOptions};
pub use engine::{discover, locate, EngineStatus, DECODER_PATH_ENV};
pub use format::{FrameFormat, PixelFormat};
pub use frame_buffer::{
    CompositeNotifier, CompositeQueue, FrameBuffer, FrameBufferManager, FrameGate, FrameStats,
    FrameWriteGuard,
};
pub use playback::{PlaybackController, PlaybackState};
pub use still::StillImageCache;
pub use test_pattern::TestPatternEngine;

/// Media errors
#[derive(Error, Debug)]
pub enum MediaError {
    /// The media file is missing or unreadable
    #[error("Failed to open file: {0}")]
    FileOpen(String),

    /// Decoding or the decoder thread failed
    #[error("Decoder error: {0}")]
    DecoderError(String),

    /// No native decoder library was found
    #[error("Decoder engine unavailable: {0}")]
    EngineUnavailable(String),

    /// A frame buffer for the negotiated format could not be allocated
    #[error("Failed to allocate a {width}x{height} frame buffer")]
    Allocation {
        /// Requested width in pixels
        width: u32,
        /// Requested height in pixels
        height: u32,
    },
}

/// Result type for media operations
pub type Result<T> = std::result::Result<T, MediaError>;
