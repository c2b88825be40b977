use videomap_core::{AppConfig, MediaType, Polygon, Project, Scene, Vec2};

#[test]
fn test_default_project() {
    let project = Project::create_default();
    assert_eq!(project.name, "Untitled");
    assert_eq!(project.outputs.len(), 1);
    assert_eq!(project.outputs[0].name, "Output 1");
    assert_eq!(project.outputs[0].size(), (1920, 1080));
    assert_eq!(project.scenes.len(), 1);
    assert_eq!(project.scenes[0].duration_seconds, 5.0);
}

#[test]
fn test_project_serialization() {
    let mut project = Project::create_default();
    let id = project.add_polygon();
    project.polygon_mut(id).unwrap().set_looping(true);
    project.add_scene();

    let json = serde_json::to_string(&project).expect("Failed to serialize Project");
    let deserialized: Project = serde_json::from_str(&json).expect("Failed to deserialize Project");

    assert_eq!(project, deserialized);
    let polygon = deserialized.polygon(id).unwrap();
    assert!(polygon.is_looping());
    assert_eq!(polygon.bounds(), project.polygon(id).unwrap().bounds());
}

#[test]
fn test_normalize_repairs_loaded_data() {
    let mut project = Project::new("", 0.0, -5.0);
    let mut late = Polygon::with_points("", vec![Vec2::ZERO, Vec2::X, Vec2::Y]);
    late.set_order(7);
    let early = Polygon::with_points("First", vec![Vec2::ZERO, Vec2::ONE, Vec2::Y]);
    let early_id = early.id();
    project.polygons = vec![late, early];
    let stranger = Polygon::new("stranger").id();
    project.scenes = vec![Scene::new("", -1.0).with_active([stranger, early_id])];

    project.normalize();

    assert_eq!(project.name, "Untitled");
    assert_eq!((project.canvas_width, project.canvas_height), (1920.0, 1080.0));
    assert_eq!(project.polygons[0].id(), early_id);
    assert_eq!(project.polygons[1].name(), "Polygon");
    assert_eq!(project.polygons[1].order(), 1);
    assert_eq!(project.scenes[0].name, "Scene");
    assert_eq!(project.scenes[0].duration_seconds, 5.0);
    assert_eq!(project.outputs.len(), 1);
    let active: Vec<_> = project.scenes[0].active_polygon_ids.iter().copied().collect();
    assert_eq!(active, vec![early_id]);
}

#[test]
fn test_scene_and_output_track_polygon_lifecycle() {
    let mut project = Project::create_default();
    let a = project.add_polygon();
    let b = project.add_polygon();
    assert!(project.scenes[0].active_polygon_ids.contains(&a));
    assert!(project.outputs[0].contains(b));

    project.remove_polygon(a).unwrap();
    assert!(!project.scenes[0].active_polygon_ids.contains(&a));
    assert!(!project.outputs[0].contains(a));
    assert_eq!(project.polygon(b).unwrap().order(), 0);
}

#[test]
fn test_assign_media_classifies() {
    let mut polygon = Polygon::new("P");
    polygon.assign_media("/nowhere/clip.MKV");
    assert_eq!(polygon.media_type(), MediaType::Video);
    assert!(polygon.is_media_missing());
    assert!(!polygon.has_valid_video());
}

#[test]
fn test_configured_canvas_sizes_new_project() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[canvas]\ndefault_width = 1280\ndefault_height = 720\n").unwrap();

    let config = AppConfig::load(&path).unwrap();
    let project = Project::create_with_canvas("Show", &config.canvas);

    assert_eq!(project.canvas_pixel_size(), (1280, 720));
    assert_eq!(project.outputs[0].size(), (1280, 720));
    assert_eq!(project.scenes.len(), 1);
}
