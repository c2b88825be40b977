//! Output presets: a flat JSON description of the mapping for external players

use crate::error::Result;
use crate::paths::{make_relative, project_directory};
use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;
use videomap_core::{MediaType, OutputId, PolygonId, Project};

/// Root of an exported preset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputPreset {
    pub project_name: String,
    pub canvas_width: f32,
    pub canvas_height: f32,
    pub polygons: Vec<PresetPolygon>,
    pub outputs: Vec<PresetOutput>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresetPolygon {
    pub id: PolygonId,
    pub name: String,
    pub points: Vec<Vec2>,
    /// Relative to the preset file when possible
    pub media_path: Option<PathBuf>,
    pub media_type: MediaType,
    pub order: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresetOutput {
    pub id: OutputId,
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub polygon_ids: Vec<PolygonId>,
}

impl OutputPreset {
    /// Build a preset whose media paths are relative to `directory`
    pub fn from_project(project: &Project, directory: &Path) -> Self {
        let polygons = project
            .polygons
            .iter()
            .map(|polygon| PresetPolygon {
                id: polygon.id(),
                name: polygon.name().to_string(),
                points: polygon.points().to_vec(),
                media_path: polygon
                    .media_path()
                    .map(|media| make_relative(media, directory)),
                media_type: polygon.media_type(),
                order: polygon.order(),
            })
            .collect();

        let outputs = project
            .outputs
            .iter()
            .map(|output| PresetOutput {
                id: output.id,
                name: output.name.clone(),
                width: output.width,
                height: output.height,
                polygon_ids: output.polygon_ids.clone(),
            })
            .collect();

        Self {
            project_name: project.name.clone(),
            canvas_width: project.canvas_width,
            canvas_height: project.canvas_height,
            polygons,
            outputs,
        }
    }
}

/// Write the project's output preset as pretty JSON
pub fn export_output_preset(project: &Project, path: &Path) -> Result<()> {
    let preset = OutputPreset::from_project(project, &project_directory(path)?);
    let json = serde_json::to_string_pretty(&preset)?;
    fs::write(path, json)?;
    info!(
        "Exported output preset ({} outputs) to {}",
        preset.outputs.len(),
        path.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_export_writes_camel_case_json() {
        let dir = TempDir::new().unwrap();
        let mut project = Project::create_default();
        let id = project.add_polygon();
        project
            .polygon_mut(id)
            .unwrap()
            .assign_media(dir.path().join("clips").join("intro.mp4"));

        let path = dir.path().join("preset.json");
        export_output_preset(&project, &path).unwrap();

        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"projectName\""));
        assert!(raw.contains("\"polygonIds\""));

        let preset: OutputPreset = serde_json::from_str(&raw).unwrap();
        assert_eq!(preset.polygons.len(), 1);
        assert_eq!(preset.polygons[0].media_type, MediaType::Video);
        assert_eq!(
            preset.polygons[0].media_path,
            Some(Path::new("clips").join("intro.mp4"))
        );
        assert_eq!(preset.outputs[0].polygon_ids, vec![id]);
    }
}
