//! Software test-pattern decoder engine
//!
//! Produces a moving gradient instead of decoding the file, on a real
//! decoder thread that drives the [`FrameSink`] exactly like a native engine
//! would. Used headlessly and in tests.

use crate::decoder::{DecoderEngine, DecoderSession, FrameSink, PlayOptions};
use crate::format::PixelFormat;
use crate::frame_buffer::FrameBuffer;
use crate::{MediaError, Result};
use crossbeam_channel::{unbounded, RecvTimeoutError, Sender};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// How long a paused decoder waits for a command before checking again
const PAUSED_POLL: Duration = Duration::from_millis(100);

/// Engine that renders a synthetic pattern for any existing file
#[derive(Debug, Clone)]
pub struct TestPatternEngine {
    width: u32,
    height: u32,
    fps: f64,
    duration: Duration,
    pixel_format: PixelFormat,
}

impl Default for TestPatternEngine {
    fn default() -> Self {
        Self::new(640, 360, 30.0, Duration::from_secs(10))
    }
}

impl TestPatternEngine {
    /// `duration` is the length of one pass through the "clip"
    pub fn new(width: u32, height: u32, fps: f64, duration: Duration) -> Self {
        Self {
            width,
            height,
            fps: if fps.is_finite() && fps > 0.0 { fps } else { 30.0 },
            duration,
            pixel_format: PixelFormat::Bgra8,
        }
    }

    /// Deliver frames in a different pixel layout
    pub fn with_pixel_format(mut self, pixel_format: PixelFormat) -> Self {
        self.pixel_format = pixel_format;
        self
    }

    fn frames_per_pass(&self) -> u64 {
        ((self.duration.as_secs_f64() * self.fps).round() as u64).max(1)
    }
}

impl DecoderEngine for TestPatternEngine {
    fn name(&self) -> &str {
        "test-pattern"
    }

    fn create_session(&self, sink: Arc<dyn FrameSink>) -> Result<Box<dyn DecoderSession>> {
        Ok(Box::new(TestPatternSession {
            engine: self.clone(),
            sink,
            worker: None,
            muted: false,
        }))
    }
}

enum SessionCommand {
    Pause,
    Resume,
    Seek(f32),
    Stop,
}

struct Worker {
    commands: Sender<SessionCommand>,
    playing: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

struct TestPatternSession {
    engine: TestPatternEngine,
    sink: Arc<dyn FrameSink>,
    worker: Option<Worker>,
    muted: bool,
}

impl TestPatternSession {
    fn send(&self, command: SessionCommand) {
        if let Some(worker) = &self.worker {
            // The thread may already have finished the clip
            let _ = worker.commands.send(command);
        }
    }
}

impl DecoderSession for TestPatternSession {
    fn play(&mut self, path: &Path, options: &PlayOptions) -> Result<()> {
        self.stop();

        if !path.is_file() {
            return Err(MediaError::FileOpen(format!(
                "File not found: {}",
                path.display()
            )));
        }

        self.muted = options.muted;
        let (commands, rx) = unbounded();
        let playing = Arc::new(AtomicBool::new(true));

        let run = DecodeRun {
            engine: self.engine.clone(),
            sink: Arc::clone(&self.sink),
            playing: Arc::clone(&playing),
            repeat: options.repeat.unwrap_or(0),
        };

        let handle = thread::Builder::new()
            .name("test-pattern-decoder".to_string())
            .spawn(move || run.execute(rx))
            .map_err(|e| MediaError::DecoderError(format!("Failed to spawn decoder: {}", e)))?;

        info!("Test pattern playback started for {}", path.display());
        self.worker = Some(Worker {
            commands,
            playing,
            handle,
        });
        Ok(())
    }

    fn pause(&mut self) {
        self.send(SessionCommand::Pause);
    }

    fn resume(&mut self) {
        self.send(SessionCommand::Resume);
    }

    fn stop(&mut self) {
        let Some(worker) = self.worker.take() else {
            return;
        };
        let _ = worker.commands.send(SessionCommand::Stop);
        if worker.handle.join().is_err() {
            error!("Test pattern decoder thread panicked");
        }
        debug!("Test pattern session stopped");
    }

    fn seek(&mut self, position: f32) {
        self.send(SessionCommand::Seek(position.clamp(0.0, 1.0)));
    }

    fn set_muted(&mut self, muted: bool) {
        // Synthetic clips have no audio; only the flag is kept
        self.muted = muted;
    }

    fn is_playing(&self) -> bool {
        self.worker
            .as_ref()
            .is_some_and(|w| w.playing.load(Ordering::Acquire))
    }
}

impl Drop for TestPatternSession {
    fn drop(&mut self) {
        self.stop();
    }
}

/// State owned by the decoder thread
struct DecodeRun {
    engine: TestPatternEngine,
    sink: Arc<dyn FrameSink>,
    playing: Arc<AtomicBool>,
    repeat: u32,
}

impl DecodeRun {
    fn execute(self, commands: crossbeam_channel::Receiver<SessionCommand>) {
        let engine = &self.engine;

        if self.sink.format(engine.width, engine.height).is_none() {
            warn!(
                "Decoder could not negotiate a {}x{} frame",
                engine.width, engine.height
            );
            self.finish();
            return;
        }

        let frame_interval = Duration::from_secs_f64(1.0 / engine.fps);
        let total = engine.frames_per_pass();
        let mut frame_index = 0u64;
        let mut passes_left = self.repeat;
        let mut paused = false;

        loop {
            let timeout = if paused { PAUSED_POLL } else { frame_interval };
            match commands.recv_timeout(timeout) {
                Ok(SessionCommand::Pause) => {
                    paused = true;
                    self.playing.store(false, Ordering::Release);
                }
                Ok(SessionCommand::Resume) => {
                    paused = false;
                    self.playing.store(true, Ordering::Release);
                }
                Ok(SessionCommand::Seek(position)) => {
                    frame_index = ((position as f64) * total as f64) as u64;
                    frame_index = frame_index.min(total - 1);
                }
                Ok(SessionCommand::Stop) | Err(RecvTimeoutError::Disconnected) => break,
                Err(RecvTimeoutError::Timeout) => {
                    if paused {
                        continue;
                    }

                    match self.sink.lock() {
                        Some(mut buffer) => paint_pattern(&mut buffer, frame_index, total),
                        None => {
                            debug!("Frame buffer gone, ending session");
                            break;
                        }
                    }
                    self.sink.display();

                    frame_index += 1;
                    if frame_index >= total {
                        if passes_left == 0 {
                            debug!("Test pattern reached end of stream");
                            break;
                        }
                        passes_left -= 1;
                        frame_index = 0;
                    }
                }
            }
        }

        self.finish();
    }

    fn finish(&self) {
        self.playing.store(false, Ordering::Release);
        self.sink.cleanup();
    }
}

/// Horizontal/vertical gradient with a white bar sweeping across as the clip
/// progresses
fn paint_pattern(buffer: &mut FrameBuffer, frame_index: u64, total: u64) {
    let width = buffer.width();
    let height = buffer.height();
    let pixel_format = buffer.pixel_format();
    let bar_x = ((frame_index as f64 / total as f64) * width as f64) as u32;
    let blue = ((frame_index * 255) / total.max(1)) as u8;

    for y in 0..height {
        let green = ((y as u64 * 255) / height.max(1) as u64) as u8;
        let row = buffer.row_mut(y);
        for (x, pixel) in row.chunks_exact_mut(4).enumerate() {
            let x = x as u32;
            let rgba = if x.abs_diff(bar_x) < 2 {
                [255, 255, 255, 255]
            } else {
                let red = ((x as u64 * 255) / width.max(1) as u64) as u8;
                [red, green, blue, 255]
            };
            match pixel_format {
                PixelFormat::Rgba8 => pixel.copy_from_slice(&rgba),
                PixelFormat::Bgra8 => pixel.copy_from_slice(&[rgba[2], rgba[1], rgba[0], rgba[3]]),
            }
        }
    }
}
