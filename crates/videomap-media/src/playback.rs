//! Playback controller - one per polygon
//!
//! Combines the polygon's media, scene-visibility, mute and loop inputs with
//! the stage-wide solo suppression into a single decode decision:
//!
//! `visible = has_valid_video && !suppressed && scene_visible`
//!
//! and decoding is active only while `visible` holds. The controller mirrors
//! the polygon inputs it needs, so it is driven by [`PolygonChange`]
//! notifications and never reaches back into the project.

use crate::decoder::{DecoderEngine, DecoderSession, PlayOptions};
use crate::frame_buffer::FrameBufferManager;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};
use videomap_core::config::DEFAULT_LOOP_REPEAT_COUNT;
use videomap_core::{Polygon, PolygonChange, PolygonId};

/// Observable playback state; suppression is reported separately
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    /// No valid video assigned
    Idle,
    /// Valid video, not decoding
    Ready,
    /// Decoding
    Playing,
    /// Decoding paused mid-stream
    Paused,
}

/// Per-polygon decoder owner
pub struct PlaybackController {
    polygon_id: PolygonId,
    session: Option<Box<dyn DecoderSession>>,
    frames: Arc<FrameBufferManager>,
    loop_repeat_count: u32,

    // Mirrored polygon inputs
    media_path: Option<PathBuf>,
    valid_video: bool,
    scene_visible: bool,
    muted: bool,
    looping: bool,

    suppressed: bool,
    /// Path handed to the running session; `None` when not decoding
    current_path: Option<PathBuf>,
    paused: bool,
}

impl std::fmt::Debug for PlaybackController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackController")
            .field("polygon_id", &self.polygon_id)
            .field("has_session", &self.session.is_some())
            .field("current_path", &self.current_path)
            .field("suppressed", &self.suppressed)
            .field("paused", &self.paused)
            .finish()
    }
}

impl PlaybackController {
    /// Build a controller around an existing session (or none, if the engine
    /// could not provide one) and start decoding if the polygon is visible.
    pub fn new(
        polygon: &Polygon,
        session: Option<Box<dyn DecoderSession>>,
        frames: Arc<FrameBufferManager>,
    ) -> Self {
        Self::build(polygon, session, frames, DEFAULT_LOOP_REPEAT_COUNT)
    }

    fn build(
        polygon: &Polygon,
        session: Option<Box<dyn DecoderSession>>,
        frames: Arc<FrameBufferManager>,
        loop_repeat_count: u32,
    ) -> Self {
        let mut controller = Self {
            polygon_id: polygon.id(),
            session,
            frames,
            loop_repeat_count,
            media_path: None,
            valid_video: false,
            scene_visible: true,
            muted: false,
            looping: false,
            suppressed: false,
            current_path: None,
            paused: false,
        };
        controller.update_from_polygon(polygon);
        controller
    }

    /// Create a session on `engine` bound to `frames`. Session creation
    /// failures are logged and leave the controller without video.
    ///
    /// `loop_repeat_count` is the repeat option for looping polygons,
    /// including the first start.
    pub fn with_engine(
        polygon: &Polygon,
        engine: &dyn DecoderEngine,
        frames: Arc<FrameBufferManager>,
        loop_repeat_count: u32,
    ) -> Self {
        let session = match engine.create_session(frames.clone()) {
            Ok(session) => Some(session),
            Err(e) => {
                warn!(
                    "Decoder session for polygon '{}' unavailable: {}",
                    polygon.name(),
                    e
                );
                None
            }
        };
        Self::build(polygon, session, frames, loop_repeat_count)
    }

    pub fn polygon_id(&self) -> PolygonId {
        self.polygon_id
    }

    /// The frame buffer this controller's session writes into
    pub fn frames(&self) -> &Arc<FrameBufferManager> {
        &self.frames
    }

    /// Valid video assigned and a decoder session available
    pub fn has_video(&self) -> bool {
        self.valid_video && self.session.is_some()
    }

    pub fn is_suppressed(&self) -> bool {
        self.suppressed
    }

    /// `has_video && !suppressed && scene_visible`
    pub fn is_visible(&self) -> bool {
        self.has_video() && !self.suppressed && self.scene_visible
    }

    /// True while a session is decoding (not paused)
    pub fn is_decoding(&self) -> bool {
        self.current_path.is_some() && !self.paused
    }

    pub fn state(&self) -> PlaybackState {
        if !self.has_video() {
            return PlaybackState::Idle;
        }
        match &self.current_path {
            None => PlaybackState::Ready,
            Some(_) if self.paused => PlaybackState::Paused,
            Some(_) if self.session.as_ref().is_some_and(|s| s.is_playing()) => {
                PlaybackState::Playing
            }
            // Stream ended on its own
            Some(_) => PlaybackState::Ready,
        }
    }

    /// React to one change recorded by the polygon
    pub fn observe(&mut self, polygon: &Polygon, change: PolygonChange) {
        match change {
            PolygonChange::Media | PolygonChange::MediaMissing => {
                self.update_from_polygon(polygon);
            }
            PolygonChange::SceneVisibility => {
                self.scene_visible = polygon.is_scene_visible();
                if self.scene_visible {
                    self.update_from_polygon(polygon);
                } else {
                    self.stop_decoding();
                }
            }
            PolygonChange::Mute => {
                self.muted = polygon.is_muted();
                self.apply_mute();
            }
            PolygonChange::Loop => {
                self.looping = polygon.is_looping();
                self.restart_if_needed();
            }
            PolygonChange::Geometry
            | PolygonChange::Solo
            | PolygonChange::Order
            | PolygonChange::Name => {}
        }
    }

    /// Re-read every polygon input and settle the decode decision
    pub fn update_from_polygon(&mut self, polygon: &Polygon) {
        self.media_path = polygon.media_path().map(Path::to_path_buf);
        self.valid_video = polygon.has_valid_video();
        self.scene_visible = polygon.is_scene_visible();
        self.muted = polygon.is_muted();
        self.looping = polygon.is_looping();
        self.refresh();
    }

    fn refresh(&mut self) {
        if !self.is_visible() {
            self.stop_decoding();
            return;
        }

        if self.current_path != self.media_path {
            if let Some(path) = self.media_path.clone() {
                self.start(path);
            }
        }
        self.apply_mute();
    }

    /// Solo suppression from the stage
    pub fn set_suppressed(&mut self, suppressed: bool) {
        if self.suppressed == suppressed {
            return;
        }
        self.suppressed = suppressed;
        debug!(
            "Polygon {} {}",
            self.polygon_id,
            if suppressed { "suppressed" } else { "released" }
        );

        if suppressed {
            self.stop_decoding();
        } else {
            self.refresh();
        }
    }

    /// Start or resume decoding. No-op unless visible.
    pub fn play(&mut self) {
        if !self.is_visible() {
            return;
        }
        let Some(path) = self.media_path.clone() else {
            return;
        };

        let same_path = self.current_path.as_ref() == Some(&path);
        if same_path && self.paused {
            if let Some(session) = self.session.as_mut() {
                session.resume();
            }
            self.paused = false;
        } else if !same_path || !self.session.as_ref().is_some_and(|s| s.is_playing()) {
            self.start(path);
        }
        self.apply_mute();
    }

    /// Pause the running session. A session that already ended stays
    /// stopped so the next [`play`](Self::play) restarts it.
    pub fn pause(&mut self) {
        if self.current_path.is_none() || self.paused {
            return;
        }
        if let Some(session) = self.session.as_mut().filter(|s| s.is_playing()) {
            session.pause();
            self.paused = true;
        }
    }

    /// Stop decoding; a later [`play`](Self::play) restarts from the beginning
    pub fn stop(&mut self) {
        self.stop_decoding();
    }

    /// Seek to a normalized position. No-op unless visible.
    pub fn seek(&mut self, position: f32) {
        if !self.is_visible() || !position.is_finite() {
            return;
        }
        if let Some(session) = self.session.as_mut() {
            session.seek(position.clamp(0.0, 1.0));
        }
    }

    fn start(&mut self, path: PathBuf) {
        // The previous stream is torn down before the next one negotiates
        if self.current_path.is_some() {
            self.stop_decoding();
        }
        let options = PlayOptions {
            repeat: self.looping.then_some(self.loop_repeat_count),
            muted: self.muted,
        };
        let Some(session) = self.session.as_mut() else {
            return;
        };

        match session.play(&path, &options) {
            Ok(()) => {
                info!("Polygon {} playing {}", self.polygon_id, path.display());
                self.current_path = Some(path);
                self.paused = false;
            }
            Err(e) => {
                warn!("Playback of {} failed: {}", path.display(), e);
                self.current_path = None;
                self.paused = false;
                self.valid_video = false;
                self.frames.release();
            }
        }
    }

    fn stop_decoding(&mut self) {
        if self.current_path.is_none() && !self.frames.has_buffer() {
            return;
        }
        if let Some(session) = self.session.as_mut() {
            session.stop();
        }
        self.current_path = None;
        self.paused = false;
        // The session is joined; nothing can write into the buffer any more
        self.frames.release();
        debug!("Polygon {} stopped decoding", self.polygon_id);
    }

    fn restart_if_needed(&mut self) {
        if !self.is_visible() {
            return;
        }
        let Some(path) = self.media_path.clone() else {
            return;
        };
        // Loop is a session option: changing it restarts the clip
        self.stop_decoding();
        self.start(path);
        self.apply_mute();
    }

    fn apply_mute(&mut self) {
        if let Some(session) = self.session.as_mut() {
            session.set_muted(self.muted);
        }
    }
}

impl Drop for PlaybackController {
    fn drop(&mut self) {
        self.stop_decoding();
    }
}
