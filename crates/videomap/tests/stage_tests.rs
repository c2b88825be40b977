use glam::Vec2;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tempfile::TempDir;
use videomap::{Stage, StageOptions, VideoStatus};
use videomap_core::{Polygon, PolygonId, Project, Scene};
use videomap_media::{
    DecoderEngine, DecoderSession, FrameSink, PlayOptions, Result as MediaResult,
    TestPatternEngine,
};

fn square(name: &str, x: f32) -> Polygon {
    Polygon::with_points(
        name,
        vec![
            Vec2::new(x, 0.0),
            Vec2::new(x + 10.0, 0.0),
            Vec2::new(x + 10.0, 10.0),
            Vec2::new(x, 10.0),
        ],
    )
}

fn clip(dir: &TempDir, name: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, b"clip").unwrap();
    path
}

/// Project with one video polygon per clip name
fn video_project(dir: &TempDir, names: &[&str]) -> (Project, Vec<PolygonId>) {
    let mut project = Project::new("Test", 64.0, 16.0);
    let mut ids = Vec::new();
    for (i, name) in names.iter().enumerate() {
        let mut polygon = square(name, i as f32 * 12.0);
        polygon.assign_media(clip(dir, &format!("{}.mp4", name)));
        ids.push(polygon.id());
        project.insert_polygon(polygon);
    }
    (project, ids)
}

fn test_engine() -> Arc<dyn DecoderEngine> {
    Arc::new(TestPatternEngine::new(8, 8, 120.0, Duration::from_secs(30)))
}

#[derive(Debug, Clone, PartialEq)]
enum Event {
    Play(PathBuf, PlayOptions),
    Cleanup,
}

/// Engine whose sessions do nothing on their own; the test drives the sink
#[derive(Default)]
struct ManualEngine {
    sinks: Arc<Mutex<Vec<Arc<dyn FrameSink>>>>,
    events: Arc<Mutex<Vec<Event>>>,
}

struct ManualSession {
    sink: Arc<dyn FrameSink>,
    events: Arc<Mutex<Vec<Event>>>,
    playing: bool,
}

impl DecoderEngine for ManualEngine {
    fn name(&self) -> &str {
        "manual"
    }

    fn create_session(&self, sink: Arc<dyn FrameSink>) -> MediaResult<Box<dyn DecoderSession>> {
        self.sinks.lock().unwrap().push(sink.clone());
        Ok(Box::new(ManualSession {
            sink,
            events: self.events.clone(),
            playing: false,
        }))
    }
}

impl DecoderSession for ManualSession {
    fn play(&mut self, path: &Path, options: &PlayOptions) -> MediaResult<()> {
        self.events
            .lock()
            .unwrap()
            .push(Event::Play(path.to_path_buf(), *options));
        self.sink.format(4, 4);
        self.playing = true;
        Ok(())
    }
    fn pause(&mut self) {}
    fn resume(&mut self) {}
    fn stop(&mut self) {
        self.playing = false;
        self.sink.cleanup();
        self.events.lock().unwrap().push(Event::Cleanup);
    }
    fn seek(&mut self, _position: f32) {}
    fn set_muted(&mut self, _muted: bool) {}
    fn is_playing(&self) -> bool {
        self.playing
    }
}

#[test]
fn test_solo_suppresses_and_resumes_others() {
    let dir = TempDir::new().unwrap();
    let (project, ids) = video_project(&dir, &["x", "y", "z"]);
    let (x, y, z) = (ids[0], ids[1], ids[2]);
    let mut stage = Stage::new(project, test_engine());

    for id in &ids {
        assert!(stage.playback(*id).unwrap().is_decoding());
    }

    stage.edit_polygon(x, |p| p.set_solo(true)).unwrap();
    assert!(stage.playback(x).unwrap().is_decoding());
    for id in [y, z] {
        let playback = stage.playback(id).unwrap();
        assert!(playback.is_suppressed());
        assert!(!playback.is_decoding());
        assert!(!playback.frames().has_buffer());
    }
    assert_eq!(
        stage.video_status(),
        VideoStatus {
            active: 1,
            missing: 0
        }
    );

    stage.edit_polygon(x, |p| p.set_solo(false)).unwrap();
    for id in &ids {
        let playback = stage.playback(*id).unwrap();
        assert!(!playback.is_suppressed());
        assert!(playback.is_decoding());
    }
}

#[test]
fn test_removing_solo_polygon_releases_suppression() {
    let dir = TempDir::new().unwrap();
    let (project, ids) = video_project(&dir, &["x", "y"]);
    let mut stage = Stage::new(project, test_engine());

    stage.edit_polygon(ids[0], |p| p.set_solo(true)).unwrap();
    assert!(stage.playback(ids[1]).unwrap().is_suppressed());

    stage.remove_polygon(ids[0]).unwrap();
    assert!(stage.playback(ids[0]).is_none());
    assert!(!stage.playback(ids[1]).unwrap().is_suppressed());
    assert!(stage.playback(ids[1]).unwrap().is_decoding());
}

#[test]
fn test_many_displays_produce_one_composite() {
    let dir = TempDir::new().unwrap();
    let (project, ids) = video_project(&dir, &["only"]);
    let engine = ManualEngine::default();
    let sinks = engine.sinks.clone();
    let mut stage = Stage::new(project, Arc::new(engine));

    let sink = sinks.lock().unwrap()[0].clone();
    for value in 0..5u8 {
        if let Some(mut frame) = sink.lock() {
            for pixel in frame.data_mut().chunks_exact_mut(4) {
                pixel.copy_from_slice(&[0, 0, value * 50, 255]);
            }
        }
        sink.display();
    }

    assert_eq!(stage.drain_composites(), vec![ids[0]]);
    assert!(stage.drain_composites().is_empty());

    let stats = stage.playback(ids[0]).unwrap().frames().stats();
    assert_eq!(stats.scheduled, 1);
    assert_eq!(stats.coalesced, 4);

    // The composite shows the latest frame, not the first
    let canvas = stage.compose_canvas();
    assert_eq!(*canvas.get_pixel(5, 5), image::Rgba([200, 0, 0, 255]));
}

#[test]
fn test_hidden_polygon_stops_decoding() {
    let dir = TempDir::new().unwrap();
    let (project, ids) = video_project(&dir, &["a"]);
    let mut stage = Stage::new(project, test_engine());

    stage.edit_polygon(ids[0], |p| p.set_scene_visible(false)).unwrap();
    assert!(!stage.playback(ids[0]).unwrap().is_decoding());
    assert!(stage.compose_canvas().pixels().all(|p| p[3] == 0));

    stage.edit_polygon(ids[0], |p| p.set_scene_visible(true)).unwrap();
    assert!(stage.playback(ids[0]).unwrap().is_decoding());
}

#[test]
fn test_timeline_applies_scenes_then_stops() {
    let dir = TempDir::new().unwrap();
    let (mut project, ids) = video_project(&dir, &["p1", "p2"]);
    let (p1, p2) = (ids[0], ids[1]);
    project.scenes = vec![
        Scene::new("A", 2.0),
        Scene::new("B", 3.0).with_active([p1]),
    ];
    let mut stage = Stage::new(project, test_engine());
    let start = Instant::now();

    stage.play_timeline(0, start).unwrap();
    assert!(stage.project().polygon(p1).unwrap().is_scene_visible());
    assert!(stage.project().polygon(p2).unwrap().is_scene_visible());

    assert!(stage.tick(start + Duration::from_millis(1950)).is_none());
    assert!(stage.project().polygon(p2).unwrap().is_scene_visible());

    stage.tick(start + Duration::from_millis(2050)).unwrap();
    assert_eq!(stage.timeline().current_index(), Some(1));
    assert!(stage.project().polygon(p1).unwrap().is_scene_visible());
    assert!(!stage.project().polygon(p2).unwrap().is_scene_visible());
    assert!(stage.playback(p1).unwrap().is_decoding());
    assert!(!stage.playback(p2).unwrap().is_decoding());

    assert!(stage.tick(start + Duration::from_millis(5100)).is_some());
    assert!(!stage.timeline().is_running());
    assert_eq!(stage.timeline().progress(), 0.0);
}

#[test]
fn test_still_image_polygon_is_composed() {
    let dir = TempDir::new().unwrap();
    let still = dir.path().join("still.png");
    image::RgbaImage::from_pixel(4, 4, image::Rgba([0, 255, 0, 255]))
        .save(&still)
        .unwrap();

    let mut project = Project::new("Stills", 32.0, 32.0);
    let mut polygon = square("img", 4.0);
    polygon.assign_media(&still);
    project.insert_polygon(polygon);
    project.add_output();
    let output_id = project.outputs[0].id;

    let mut stage = Stage::new(project, test_engine());
    assert!(!stage.has_videos());

    let canvas = stage.compose_canvas();
    assert_eq!(*canvas.get_pixel(8, 5), image::Rgba([0, 255, 0, 255]));
    assert_eq!(canvas.get_pixel(20, 20)[3], 0);

    let output = stage.compose_output(output_id).unwrap();
    assert_eq!(output.dimensions(), (32, 32));
}

#[test]
fn test_looping_polygon_starts_with_configured_repeat() {
    let dir = TempDir::new().unwrap();
    let (mut project, ids) = video_project(&dir, &["loop"]);
    project.polygon_mut(ids[0]).unwrap().set_looping(true);
    let engine = ManualEngine::default();
    let events = engine.events.clone();
    let options = StageOptions {
        loop_repeat_count: 3,
        ..StageOptions::default()
    };

    let _stage = Stage::with_options(project, Arc::new(engine), options);

    let events = events.lock().unwrap();
    let plays: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            Event::Play(_, options) => Some(options.repeat),
            Event::Cleanup => None,
        })
        .collect();
    assert_eq!(plays, vec![Some(3)]);
}

#[test]
fn test_media_reassignment_cleans_up_before_next_play() {
    let dir = TempDir::new().unwrap();
    let (project, ids) = video_project(&dir, &["first"]);
    let engine = ManualEngine::default();
    let events = engine.events.clone();
    let mut stage = Stage::new(project, Arc::new(engine));
    let first = stage.project().polygon(ids[0]).unwrap().media_path().unwrap().to_path_buf();
    let second = clip(&dir, "second.mp4");

    stage
        .edit_polygon(ids[0], |p| p.assign_media(&second))
        .unwrap();

    assert_eq!(
        *events.lock().unwrap(),
        vec![
            Event::Play(first, PlayOptions::default()),
            Event::Cleanup,
            Event::Play(second, PlayOptions::default()),
        ]
    );
    let playback = stage.playback(ids[0]).unwrap();
    assert!(playback.is_decoding());
    assert!(playback.frames().has_buffer());
}

#[test]
fn test_switching_video_to_image_releases_frame_buffer() {
    let dir = TempDir::new().unwrap();
    let (project, ids) = video_project(&dir, &["clip"]);
    let still = dir.path().join("still.png");
    image::RgbaImage::from_pixel(4, 4, image::Rgba([0, 0, 255, 255]))
        .save(&still)
        .unwrap();
    let engine = ManualEngine::default();
    let events = engine.events.clone();
    let mut stage = Stage::new(project, Arc::new(engine));
    assert!(stage.playback(ids[0]).unwrap().frames().has_buffer());

    stage.edit_polygon(ids[0], |p| p.assign_media(&still)).unwrap();

    let playback = stage.playback(ids[0]).unwrap();
    assert!(!playback.is_decoding());
    assert!(!playback.frames().has_buffer());
    assert_eq!(events.lock().unwrap().last(), Some(&Event::Cleanup));

    let canvas = stage.compose_canvas();
    assert_eq!(*canvas.get_pixel(5, 5), image::Rgba([0, 0, 255, 255]));
}
