//! VideoMap command line
//!
//! Headless access to projects: create and inspect them, render still
//! compositions, or run the scene timeline and capture each output once per
//! scene.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use image::RgbaImage;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};
use videomap::{logging_setup, Stage, StageOptions};
use videomap_core::project::DEFAULT_PROJECT_NAME;
use videomap_core::{AppConfig, MediaType, OutputSurface, Project, TimelineEvent};
use videomap_io::{load_project, save_project};
use videomap_media::{discover, TestPatternEngine};

#[derive(Parser, Debug)]
#[command(name = "videomap", version, about = "Projection mapping compositor")]
struct Cli {
    /// Configuration file (defaults to the platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a project sized to the configured canvas.
    New {
        /// Project file to write (.json, .ron or .vmap)
        project: PathBuf,
        /// Project name
        #[arg(long, default_value = DEFAULT_PROJECT_NAME)]
        name: String,
    },
    /// Print a project summary and any missing media.
    Inspect {
        /// Project file (.json, .ron or .vmap)
        project: PathBuf,
    },
    /// Compose still images onto every output and write PNGs.
    Render {
        project: PathBuf,
        /// Output directory
        #[arg(long)]
        out: PathBuf,
    },
    /// Run the scene timeline, writing every output once per scene.
    Play {
        project: PathBuf,
        /// Output directory
        #[arg(long)]
        out: PathBuf,
        /// Scene to start from (0-based)
        #[arg(long, default_value_t = 0)]
        from: usize,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load_or_default(cli.config.as_deref())
        .context("Failed to load configuration")?;
    let _log_guard = logging_setup::init(&config.log)?;

    match cli.cmd {
        Command::New { project, name } => cmd_new(&config, &project, &name),
        Command::Inspect { project } => cmd_inspect(&project),
        Command::Render { project, out } => cmd_render(&config, &project, &out),
        Command::Play { project, out, from } => cmd_play(&config, &project, &out, from),
    }
}

fn open_project(path: &Path) -> Result<Project> {
    load_project(path).with_context(|| format!("open project '{}'", path.display()))
}

/// Stage on the software test pattern engine.
///
/// Native decoder discovery is reported but no native engine is built; the
/// headless commands always decode through [`TestPatternEngine`].
fn build_stage(config: &AppConfig, project: Project) -> Stage {
    let status = discover(config.playback.decoder_library_path.as_deref());
    match status.require() {
        Ok(dir) => info!(
            "Native decoder in {}; headless runs use the test pattern engine",
            dir.display()
        ),
        Err(e) => info!("{}; using the test pattern engine", e),
    }
    Stage::with_options(
        project,
        Arc::new(TestPatternEngine::default()),
        StageOptions::from(config),
    )
}

fn cmd_new(config: &AppConfig, path: &Path, name: &str) -> Result<()> {
    if path.exists() {
        bail!("'{}' already exists", path.display());
    }
    let project = Project::create_with_canvas(name, &config.canvas);
    save_project(&project, path)
        .with_context(|| format!("write project '{}'", path.display()))?;
    let (width, height) = project.canvas_pixel_size();
    println!("created {} ({}x{})", path.display(), width, height);
    Ok(())
}

fn cmd_inspect(path: &Path) -> Result<()> {
    let project = open_project(path)?;
    let (width, height) = project.canvas_pixel_size();

    println!("{} ({}x{})", project.name, width, height);
    println!("  polygons: {}", project.polygons.len());
    for polygon in &project.polygons {
        let media = match polygon.media_path() {
            Some(media) => format!("{:?} {}", polygon.media_type(), media.display()),
            None => "no media".to_string(),
        };
        println!(
            "    [{}] {} - {} points, {}{}",
            polygon.order(),
            polygon.name(),
            polygon.point_count(),
            media,
            if polygon.is_media_missing() { " (missing)" } else { "" }
        );
    }
    println!("  scenes: {}", project.scenes.len());
    for scene in &project.scenes {
        println!(
            "    {} - {:.1}s, {} active",
            scene.name,
            scene.duration_seconds,
            if scene.active_polygon_ids.is_empty() {
                "all".to_string()
            } else {
                scene.active_polygon_ids.len().to_string()
            }
        );
    }
    println!("  outputs: {}", project.outputs.len());
    for output in &project.outputs {
        println!(
            "    {} - {}x{}, {} polygons",
            output.name,
            output.width,
            output.height,
            output.polygon_ids.len()
        );
    }

    let missing: Vec<_> = project
        .polygons
        .iter()
        .filter(|p| p.is_media_missing())
        .collect();
    if !missing.is_empty() {
        println!("missing media:");
        for polygon in missing {
            if let Some(media) = polygon.media_path() {
                println!("  {}: {}", polygon.name(), media.display());
            }
        }
    }
    Ok(())
}

fn cmd_render(config: &AppConfig, path: &Path, out: &Path) -> Result<()> {
    let project = open_project(path)?;
    let videos = project
        .polygons
        .iter()
        .filter(|p| p.media_type() == MediaType::Video)
        .count();
    if videos > 0 {
        warn!("{} video polygons are not decoded by render; use play", videos);
    }

    let mut stage = build_stage(config, project);
    stage.stop_all();
    write_outputs(&mut stage, out, None)
}

fn cmd_play(config: &AppConfig, path: &Path, out: &Path, from: usize) -> Result<()> {
    let project = open_project(path)?;
    let mut stage = build_stage(config, project);
    let tick = stage.timeline().tick_interval();

    if stage.play_timeline(from, Instant::now()).is_none() {
        warn!("Project has no scenes");
        return Ok(());
    }
    stage.play_all();

    let mut captured: Option<usize> = None;
    loop {
        std::thread::sleep(tick);
        stage.drain_composites();

        // Capture halfway through so decoders have delivered frames
        if let Some(index) = stage.timeline().current_index() {
            if captured != Some(index) && stage.timeline().progress() >= 0.5 {
                write_outputs(&mut stage, out, Some(index))?;
                captured = Some(index);
            }
        }

        match stage.tick(Instant::now()) {
            Some(TimelineEvent::SceneStarted { index, name, .. }) => {
                info!("Scene {} '{}'", index, name);
                stage.play_all();
            }
            Some(TimelineEvent::Finished) => break,
            None => {}
        }
    }

    let status = stage.video_status();
    info!(
        "Timeline finished ({} live videos, {} missing)",
        status.active, status.missing
    );
    stage.stop_all();
    Ok(())
}

fn write_outputs(stage: &mut Stage, out: &Path, scene: Option<usize>) -> Result<()> {
    std::fs::create_dir_all(out)
        .with_context(|| format!("create output dir '{}'", out.display()))?;

    let outputs: Vec<OutputSurface> = stage.project().outputs.clone();
    for (index, output) in outputs.iter().enumerate() {
        let Some(image) = stage.compose_output(output.id) else {
            continue;
        };
        let file = out.join(output_file_name(index, output, scene));
        save_png(&image, &file)?;
        println!("wrote {}", file.display());
    }
    Ok(())
}

fn output_file_name(index: usize, output: &OutputSurface, scene: Option<usize>) -> String {
    let slug: String = output
        .name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
        .collect();
    match scene {
        Some(scene) => format!("scene{:02}_output{:02}_{}.png", scene, index, slug),
        None => format!("output{:02}_{}.png", index, slug),
    }
}

fn save_png(image: &RgbaImage, path: &Path) -> Result<()> {
    image
        .save_with_format(path, image::ImageFormat::Png)
        .with_context(|| format!("write png '{}'", path.display()))
}
