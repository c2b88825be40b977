//! Decoder capability interfaces
//!
//! A decoder engine pushes frames on a thread it owns. Instead of registering
//! raw callbacks, an engine is handed a [`FrameSink`] when a session is created
//! and calls its hook points from the decoder thread:
//!
//! 1. [`FrameSink::format`] once per format change, before anything else
//! 2. [`FrameSink::lock`] to obtain the buffer for one frame; dropping the
//!    returned guard is the unlock
//! 3. [`FrameSink::display`] once the frame is complete
//! 4. [`FrameSink::cleanup`] when the session ends, whatever the reason

use crate::frame_buffer::FrameWriteGuard;
use crate::Result;
use std::path::Path;
use std::sync::Arc;

/// Receiver of decoder frame-lifecycle calls
pub trait FrameSink: Send + Sync {
    /// Negotiate a `width x height` frame; returns the pitch in bytes, or
    /// `None` if no buffer could be provided (the decoder must not lock).
    fn format(&self, width: u32, height: u32) -> Option<u32>;

    /// Borrow the frame buffer for writing. `None` when no buffer exists.
    fn lock(&self) -> Option<FrameWriteGuard<'_>>;

    /// A complete frame was written and may be shown
    fn display(&self);

    /// The session is over; release everything
    fn cleanup(&self);
}

/// Options for one playback request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlayOptions {
    /// Number of times the input is repeated after the first pass
    pub repeat: Option<u32>,
    /// Start with audio muted
    pub muted: bool,
}

/// One decoding session, bound to a single [`FrameSink`]
pub trait DecoderSession: Send {
    /// Start decoding `path` from the beginning, replacing whatever was playing
    fn play(&mut self, path: &Path, options: &PlayOptions) -> Result<()>;

    /// Pause decoding, keeping the position
    fn pause(&mut self);

    /// Continue after [`pause`](Self::pause)
    fn resume(&mut self);

    /// Stop decoding. When this returns no further sink calls are made.
    fn stop(&mut self);

    /// Jump to a normalized position in `[0, 1]`
    fn seek(&mut self, position: f32);

    /// Mute or unmute audio
    fn set_muted(&mut self, muted: bool);

    /// True between a successful `play` and `stop`/end of stream, excluding pauses
    fn is_playing(&self) -> bool;
}

/// Factory for decoder sessions
pub trait DecoderEngine: Send + Sync {
    /// Engine name for logs and status
    fn name(&self) -> &str;

    /// Create an idle session that will deliver frames to `sink`
    fn create_session(&self, sink: Arc<dyn FrameSink>) -> Result<Box<dyn DecoderSession>>;
}
