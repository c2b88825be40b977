//! Scene Timeline - wall-clock scheduler over the scene list
//!
//! The timeline walks an ordered scene list, applying each scene's visibility
//! preset for that scene's duration. It is driven by periodic [`SceneTimeline::tick`]
//! calls at a fixed short interval, independent of the render frame rate.
//! Scene application ([`Scene::apply`]) is the only place it touches polygons.

use crate::polygon::Polygon;
use crate::scene::{Scene, SceneId};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Interval at which the owner is expected to call [`SceneTimeline::tick`]
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(50);

/// Something the timeline did that the owner may want to report
#[derive(Debug, Clone, PartialEq)]
pub enum TimelineEvent {
    /// A scene was applied and its duration started counting
    SceneStarted {
        /// Position in the scene list
        index: usize,
        /// The scene applied
        id: SceneId,
        /// Its display name
        name: String,
    },
    /// The last scene ran out; the timeline is stopped
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum TimelineState {
    Stopped,
    Running {
        index: usize,
        started_at: Instant,
        duration: Duration,
    },
}

/// Scheduler that auto-advances through scenes
#[derive(Debug, Clone)]
pub struct SceneTimeline {
    state: TimelineState,
    progress: f64,
    tick_interval: Duration,
}

impl Default for SceneTimeline {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneTimeline {
    /// Create a stopped timeline with the default tick interval
    pub fn new() -> Self {
        Self::with_tick_interval(DEFAULT_TICK_INTERVAL)
    }

    /// Create a stopped timeline with a custom tick interval
    pub fn with_tick_interval(tick_interval: Duration) -> Self {
        Self {
            state: TimelineState::Stopped,
            progress: 0.0,
            tick_interval,
        }
    }

    /// How often the owner should call [`tick`](Self::tick)
    pub fn tick_interval(&self) -> Duration {
        self.tick_interval
    }

    /// True while scenes are being advanced
    pub fn is_running(&self) -> bool {
        matches!(self.state, TimelineState::Running { .. })
    }

    /// Index of the scene currently counting down
    pub fn current_index(&self) -> Option<usize> {
        match self.state {
            TimelineState::Running { index, .. } => Some(index),
            TimelineState::Stopped => None,
        }
    }

    /// Normalized progress through the current scene, in `[0, 1]`
    pub fn progress(&self) -> f64 {
        self.progress
    }

    /// Start playback at `from_index`. Out-of-range indices start at the first
    /// scene; an empty scene list leaves the timeline stopped.
    pub fn play(
        &mut self,
        from_index: usize,
        scenes: &[Scene],
        polygons: &mut [Polygon],
        now: Instant,
    ) -> Option<TimelineEvent> {
        if scenes.is_empty() {
            return None;
        }

        let index = if from_index < scenes.len() {
            from_index
        } else {
            0
        };
        info!("Scene timeline started at scene {}", index);
        Some(self.start_scene(index, scenes, polygons, now))
    }

    /// Advance the clock. Applies the next scene when the current one has run
    /// its course, or stops after the last scene.
    pub fn tick(
        &mut self,
        now: Instant,
        scenes: &[Scene],
        polygons: &mut [Polygon],
    ) -> Option<TimelineEvent> {
        let TimelineState::Running {
            index,
            started_at,
            duration,
        } = self.state
        else {
            return None;
        };

        // The scene list may have shrunk underneath us
        if index >= scenes.len() {
            self.stop();
            return Some(TimelineEvent::Finished);
        }

        let elapsed = now.saturating_duration_since(started_at);
        self.progress = (elapsed.as_secs_f64() / duration.as_secs_f64()).clamp(0.0, 1.0);

        if elapsed < duration {
            return None;
        }

        let next = index + 1;
        if next >= scenes.len() {
            info!("Scene timeline finished");
            self.stop();
            return Some(TimelineEvent::Finished);
        }

        Some(self.start_scene(next, scenes, polygons, now))
    }

    /// Halt the timeline and reset progress
    pub fn stop(&mut self) {
        self.state = TimelineState::Stopped;
        self.progress = 0.0;
    }

    fn start_scene(
        &mut self,
        index: usize,
        scenes: &[Scene],
        polygons: &mut [Polygon],
        now: Instant,
    ) -> TimelineEvent {
        let scene = &scenes[index];
        scene.apply(polygons);

        let duration = scene.effective_duration();
        debug!(
            "Scene '{}' active for {:.2}s",
            scene.name,
            duration.as_secs_f64()
        );

        self.state = TimelineState::Running {
            index,
            started_at: now,
            duration,
        };
        self.progress = 0.0;

        TimelineEvent::SceneStarted {
            index,
            id: scene.id,
            name: scene.name.clone(),
        }
    }
}
