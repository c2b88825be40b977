//! Stage - owns a project and everything needed to play it
//!
//! The stage is the single writer of polygon state. After every mutation it
//! drains the polygons' change outboxes in z-order and forwards each change to
//! that polygon's playback controller and layer renderer, then settles solo
//! suppression across the whole project.

use image::RgbaImage;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};
use videomap_core::{
    AppConfig, FillRule, MediaType, OutputId, Polygon, PolygonChange, PolygonId, Project,
    SceneTimeline, TimelineEvent, DEFAULT_TICK_INTERVAL,
};
use videomap_core::config::DEFAULT_LOOP_REPEAT_COUNT;
use videomap_media::{
    CompositeQueue, DecoderEngine, FrameBufferManager, PixelFormat, PlaybackController,
    StillImageCache,
};
use videomap_render::{Compositor, LayerRenderer, RenderedLayer};

/// Tunables taken from the application config
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StageOptions {
    pub tick_interval: Duration,
    pub loop_repeat_count: u32,
    pub fill_rule: FillRule,
    pub pixel_format: PixelFormat,
}

impl Default for StageOptions {
    fn default() -> Self {
        Self {
            tick_interval: DEFAULT_TICK_INTERVAL,
            loop_repeat_count: DEFAULT_LOOP_REPEAT_COUNT,
            fill_rule: FillRule::default(),
            pixel_format: PixelFormat::default(),
        }
    }
}

impl From<&AppConfig> for StageOptions {
    fn from(config: &AppConfig) -> Self {
        Self {
            tick_interval: config.playback.tick_interval(),
            loop_repeat_count: config.playback.loop_repeat_count,
            ..Self::default()
        }
    }
}

/// Counts for the status bar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VideoStatus {
    /// Polygons currently visible with live video
    pub active: usize,
    /// Video polygons whose file is missing
    pub missing: usize,
}

struct PolygonSlot {
    playback: PlaybackController,
    layer: LayerRenderer,
}

/// Project plus per-polygon playback, rendering and the scene timeline
pub struct Stage {
    project: Project,
    engine: Arc<dyn DecoderEngine>,
    options: StageOptions,
    slots: HashMap<PolygonId, PolygonSlot>,
    composites: CompositeQueue,
    stills: StillImageCache,
    timeline: SceneTimeline,
}

impl std::fmt::Debug for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stage")
            .field("project", &self.project.name)
            .field("engine", &self.engine.name())
            .field("polygons", &self.slots.len())
            .field("timeline_running", &self.timeline.is_running())
            .finish()
    }
}

impl Stage {
    pub fn new(project: Project, engine: Arc<dyn DecoderEngine>) -> Self {
        Self::with_options(project, engine, StageOptions::default())
    }

    pub fn with_options(
        mut project: Project,
        engine: Arc<dyn DecoderEngine>,
        options: StageOptions,
    ) -> Self {
        // Controllers read the current state; queued changes are redundant
        for polygon in &mut project.polygons {
            polygon.take_changes();
        }

        let mut stage = Self {
            project,
            engine,
            options,
            slots: HashMap::new(),
            composites: CompositeQueue::new(),
            stills: StillImageCache::new(),
            timeline: SceneTimeline::with_tick_interval(options.tick_interval),
        };

        let ids: Vec<PolygonId> = stage.project.polygons.iter().map(|p| p.id()).collect();
        for id in ids {
            stage.create_slot(id);
        }
        stage.update_solo_state();
        info!(
            "Stage ready: '{}' with {} polygons on engine '{}'",
            stage.project.name,
            stage.slots.len(),
            stage.engine.name()
        );
        stage
    }

    fn create_slot(&mut self, id: PolygonId) {
        let Some(polygon) = self.project.polygon(id) else {
            return;
        };
        let frames = Arc::new(FrameBufferManager::with_notifier(
            self.options.pixel_format,
            self.composites.notifier(id),
        ));
        let playback = PlaybackController::with_engine(
            polygon,
            self.engine.as_ref(),
            frames,
            self.options.loop_repeat_count,
        );

        self.slots.insert(
            id,
            PolygonSlot {
                playback,
                layer: LayerRenderer::new(self.options.fill_rule),
            },
        );
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    /// Give the project back, stopping all playback
    pub fn into_project(mut self) -> Project {
        self.timeline.stop();
        self.slots.clear();
        std::mem::take(&mut self.project)
    }

    pub fn timeline(&self) -> &SceneTimeline {
        &self.timeline
    }

    /// Playback controller for a polygon
    pub fn playback(&self, id: PolygonId) -> Option<&PlaybackController> {
        self.slots.get(&id).map(|slot| &slot.playback)
    }

    /// Mutate one polygon, then dispatch whatever it recorded
    pub fn edit_polygon<R>(&mut self, id: PolygonId, edit: impl FnOnce(&mut Polygon) -> R) -> Option<R> {
        let result = edit(self.project.polygon_mut(id)?);
        self.dispatch_changes();
        Some(result)
    }

    /// Forward every pending polygon change to its dependents, in z-order
    pub fn dispatch_changes(&mut self) {
        let mut solo_changed = false;

        for polygon in &mut self.project.polygons {
            let changes = polygon.take_changes();
            if changes.is_empty() {
                continue;
            }
            let Some(slot) = self.slots.get_mut(&polygon.id()) else {
                continue;
            };

            for change in changes {
                match change {
                    PolygonChange::Solo => solo_changed = true,
                    PolygonChange::MediaMissing => {
                        // The file came back or went away: reload on next use
                        if let Some(path) = polygon.media_path() {
                            self.stills.invalidate(path);
                        }
                    }
                    _ => {}
                }
                slot.playback.observe(polygon, change);
                slot.layer.observe(change);
            }
        }

        if solo_changed {
            self.update_solo_state();
        }
    }

    /// Suppress every non-solo polygon while any polygon is solo
    fn update_solo_state(&mut self) {
        let solo_active = self.project.solo_active();
        for polygon in &self.project.polygons {
            if let Some(slot) = self.slots.get_mut(&polygon.id()) {
                slot.playback
                    .set_suppressed(solo_active && !polygon.is_solo());
            }
        }
        debug!("Solo {}", if solo_active { "active" } else { "inactive" });
    }

    // --- Polygons ---

    /// Add the default centered square
    pub fn add_polygon(&mut self) -> PolygonId {
        let id = self.project.add_polygon();
        self.attach(id);
        id
    }

    /// Add an existing polygon on top of the stack
    pub fn insert_polygon(&mut self, polygon: Polygon) -> PolygonId {
        let id = polygon.id();
        self.project.insert_polygon(polygon);
        self.attach(id);
        id
    }

    fn attach(&mut self, id: PolygonId) {
        if let Some(polygon) = self.project.polygon_mut(id) {
            polygon.take_changes();
        }
        self.create_slot(id);
        self.update_solo_state();
    }

    /// Remove a polygon, stopping its decoder first
    pub fn remove_polygon(&mut self, id: PolygonId) -> Option<Polygon> {
        // Dropping the controller joins its decoder
        self.slots.remove(&id);
        let removed = self.project.remove_polygon(id)?;
        self.dispatch_changes();
        if removed.is_solo() {
            self.update_solo_state();
        }
        Some(removed)
    }

    /// Move a polygon one step in z-order
    pub fn move_polygon(&mut self, id: PolygonId, direction: isize) -> bool {
        let moved = self.project.move_polygon(id, direction);
        self.dispatch_changes();
        moved
    }

    // --- Transport ---

    pub fn play_all(&mut self) {
        for slot in self.slots.values_mut() {
            slot.playback.play();
        }
    }

    pub fn pause_all(&mut self) {
        for slot in self.slots.values_mut() {
            slot.playback.pause();
        }
    }

    pub fn stop_all(&mut self) {
        for slot in self.slots.values_mut() {
            slot.playback.stop();
            slot.layer.clear();
        }
    }

    /// Seek every visible polygon to a normalized position
    pub fn seek_all(&mut self, position: f32) {
        let position = position.clamp(0.0, 1.0);
        for slot in self.slots.values_mut() {
            slot.playback.seek(position);
        }
    }

    // --- Scenes ---

    /// Apply one scene immediately, outside the timeline
    pub fn apply_scene(&mut self, index: usize) -> bool {
        let applied = self.project.apply_scene(index);
        self.dispatch_changes();
        applied
    }

    /// Start the scene timeline at `from_index`
    pub fn play_timeline(&mut self, from_index: usize, now: Instant) -> Option<TimelineEvent> {
        let event = self.timeline.play(
            from_index,
            &self.project.scenes,
            &mut self.project.polygons,
            now,
        );
        self.dispatch_changes();
        event
    }

    pub fn stop_timeline(&mut self) {
        self.timeline.stop();
    }

    /// Advance the timeline clock
    pub fn tick(&mut self, now: Instant) -> Option<TimelineEvent> {
        let event = self
            .timeline
            .tick(now, &self.project.scenes, &mut self.project.polygons);
        if event.is_some() {
            self.dispatch_changes();
        }
        event
    }

    // --- Rendering ---

    /// Consume pending composites, re-rendering the layers whose decoder
    /// published a frame. Returns the polygons that were updated.
    pub fn drain_composites(&mut self) -> Vec<PolygonId> {
        let mut seen = HashSet::new();
        let mut updated = Vec::new();

        for id in self.composites.drain() {
            if !seen.insert(id) {
                continue;
            }
            let (Some(slot), Some(polygon)) = (self.slots.get_mut(&id), self.project.polygon(id))
            else {
                continue;
            };

            match slot.playback.frames().take_composite() {
                Some(frame) => {
                    slot.layer.render_frame(polygon, &frame);
                }
                None => slot.layer.clear(),
            }
            updated.push(id);
        }
        updated
    }

    /// Compose every visible polygon onto the project canvas
    pub fn compose_canvas(&mut self) -> RgbaImage {
        let (width, height) = self.project.canvas_pixel_size();
        let layers = self.collect_layers(None);
        Compositor::new(width, height).compose(layers.iter().map(Arc::as_ref))
    }

    /// Compose the polygons assigned to an output at the output's size
    pub fn compose_output(&mut self, output_id: OutputId) -> Option<RgbaImage> {
        let output = self.project.output(output_id)?.clone();
        let (width, height) = self.project.canvas_pixel_size();
        let assigned: HashSet<PolygonId> = output.polygon_ids.iter().copied().collect();
        let layers = self.collect_layers(Some(&assigned));
        Some(Compositor::new(width, height).compose_output(layers.iter().map(Arc::as_ref), &output))
    }

    fn collect_layers(&mut self, only: Option<&HashSet<PolygonId>>) -> Vec<Arc<RenderedLayer>> {
        let mut layers = Vec::new();

        for polygon in &self.project.polygons {
            if only.is_some_and(|ids| !ids.contains(&polygon.id())) {
                continue;
            }
            let Some(slot) = self.slots.get_mut(&polygon.id()) else {
                continue;
            };
            if !polygon.is_scene_visible() {
                continue;
            }

            let layer = match polygon.media_type() {
                MediaType::Image if polygon.has_valid_image() => polygon
                    .media_path()
                    .and_then(|path| self.stills.get(path))
                    .and_then(|image| slot.layer.render_still(polygon, &image)),
                MediaType::Video if slot.playback.is_visible() => {
                    match slot.playback.frames().snapshot() {
                        Some(frame) => slot.layer.render_frame(polygon, &frame),
                        None => None,
                    }
                }
                _ => None,
            };
            layers.extend(layer);
        }
        layers
    }

    // --- Status ---

    pub fn video_status(&self) -> VideoStatus {
        let mut status = VideoStatus::default();
        for polygon in &self.project.polygons {
            if polygon.media_type() == MediaType::Video && polygon.is_media_missing() {
                status.missing += 1;
            }
            if self
                .slots
                .get(&polygon.id())
                .is_some_and(|slot| slot.playback.is_visible())
            {
                status.active += 1;
            }
        }
        status
    }

    /// Any polygon with valid video assigned
    pub fn has_videos(&self) -> bool {
        self.project.polygons.iter().any(|p| p.has_valid_video())
    }
}
