//! Load -> scene -> interaction scenarios, run without a window or GPU

use approx::assert_relative_eq;
use eagleeye_core::{ColorMode, Point3d, ViewerConfig, ViewerParameters};
use eagleeye_visualization::{
    DataLoader, ExportFormat, FocusTarget, InputEvent, InteractionController, KeyInput, LoadSource,
    LoadState, Modifiers, PointerButton, SceneManager,
};
use std::path::PathBuf;
use tokio::runtime::Handle;

fn temp_file(name: &str, contents: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("eagleeye-pipeline-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

fn loader() -> DataLoader {
    DataLoader::new(Handle::current(), ViewerParameters::default())
}

#[tokio::test]
async fn test_load_then_reset_camera_frames_cloud() {
    let path = temp_file("four.txt", "-2 0 0\n2 0 0\n0 1 0 255 0 0\n0 -1 0 0 0 255\n");
    let mut loader = loader();
    assert_eq!(loader.load(LoadSource::File(path)).await, LoadState::Ready);
    assert_eq!(loader.point_count(), Some(4));

    let mut scene = SceneManager::new(ViewerConfig::default(), 800, 600);
    assert!(scene.sync(loader.points(), loader.params()));

    // Farthest point is 2 from the box centre, so the cloud is scaled by 25:
    // x spans [-50, 50], y spans [-25, 25], z is flat.
    let object = scene.object().unwrap();
    let bounds = object.world_bounds();
    assert_relative_eq!(bounds.center(), Point3d::origin(), epsilon = 1e-9);
    assert_relative_eq!(bounds.max_extent(), 100.0, epsilon = 1e-9);

    let state = scene.reset_camera().unwrap();
    assert_relative_eq!(state.position, Point3d::new(0.0, 0.0, 200.0), epsilon = 1e-6);
    assert_relative_eq!(state.target, Point3d::origin(), epsilon = 1e-9);
    assert_eq!(state.fov_deg, 75.0);
}

#[tokio::test]
async fn test_reset_follows_moved_object() {
    let mut loader = loader();
    loader
        .load(LoadSource::Bytes {
            name: "line.txt".to_string(),
            bytes: b"0 0 0\n10 0 0\n".to_vec(),
        })
        .await;

    let mut scene = SceneManager::new(ViewerConfig::default(), 800, 600);
    scene.sync(loader.points(), loader.params());
    scene.object_mut().unwrap().position.x = 30.0;

    let state = scene.reset_camera().unwrap();
    assert_relative_eq!(state.target, Point3d::new(30.0, 0.0, 0.0), epsilon = 1e-9);
    assert_relative_eq!(state.position, Point3d::new(30.0, 0.0, 200.0), epsilon = 1e-6);
}

#[test]
fn test_middle_drag_applies_world_delta() {
    let mut scene = SceneManager::new(ViewerConfig::default(), 800, 600);
    let mut params = ViewerParameters::default();
    let points = eagleeye_io::parse_list("-1 -1 -1\n1 1 1\n");
    scene.sync(&points, &params);

    let mut input = InteractionController::new();
    input.handle(&InputEvent::PointerMove { x: 400.0, y: 300.0 }, &mut scene, &mut params);
    input.handle(
        &InputEvent::PointerDown {
            button: PointerButton::Middle,
            modifiers: Modifiers::default(),
        },
        &mut scene,
        &mut params,
    );
    assert!(!scene.controls().enabled);

    input.handle(&InputEvent::PointerMove { x: 500.0, y: 350.0 }, &mut scene, &mut params);
    input.handle(&InputEvent::PointerUp { button: PointerButton::Middle }, &mut scene, &mut params);

    // Camera sits at (0, 0, 5): visible height is 2 * tan(37.5deg) * 5
    let height = 2.0 * 37.5_f64.to_radians().tan() * 5.0;
    let width = height * 800.0 / 600.0;
    let position = scene.object().unwrap().position;
    assert_relative_eq!(position.x, -100.0 / 800.0 * width, epsilon = 1e-12);
    assert_relative_eq!(position.y, 50.0 / 600.0 * height, epsilon = 1e-12);
    assert_eq!(position.z, 0.0);
    assert!(scene.controls().enabled);

    // Later pointer motion leaves the object alone
    input.handle(&InputEvent::PointerMove { x: 0.0, y: 0.0 }, &mut scene, &mut params);
    assert_eq!(scene.object().unwrap().position, position);
}

#[test]
fn test_space_is_ignored_while_typing() {
    let mut scene = SceneManager::new(ViewerConfig::default(), 800, 600);
    let mut params = ViewerParameters::default();
    let mut input = InteractionController::new();

    let typed = InputEvent::Key {
        key: KeyInput::Space,
        target: FocusTarget::TextInput,
        modifiers: Modifiers::default(),
    };
    input.handle(&typed, &mut scene, &mut params);
    assert!(!params.is_animating);

    let pressed = InputEvent::Key {
        key: KeyInput::Space,
        target: FocusTarget::Canvas,
        modifiers: Modifiers::default(),
    };
    input.handle(&pressed, &mut scene, &mut params);
    assert!(params.is_animating);
}

#[tokio::test]
async fn test_failed_loads_leave_scene_empty() {
    let mut loader = loader();
    let mut scene = SceneManager::new(ViewerConfig::default(), 800, 600);

    loader
        .load(LoadSource::Points(vec![eagleeye_core::CloudPoint::new(1.0, 2.0, 3.0)]))
        .await;
    scene.sync(loader.points(), loader.params());
    assert!(scene.object().is_some());

    let state = loader.load(LoadSource::Url("not a url".to_string())).await;
    assert_eq!(state, LoadState::Failed);
    assert!(loader.error().is_some_and(|m| m.starts_with("Load error")));

    assert!(scene.sync(loader.points(), loader.params()));
    assert!(scene.object().is_none());
    assert!(scene.axes().is_none());

    let state = loader
        .load(LoadSource::File(PathBuf::from("/no/such/dir/cloud.ply")))
        .await;
    assert_eq!(state, LoadState::Failed);
    assert_eq!(loader.point_count(), None);
}

#[tokio::test]
async fn test_appearance_change_rebuilds_without_reload() {
    let mut loader = loader();
    loader
        .load(LoadSource::Bytes {
            name: "cloud.txt".to_string(),
            bytes: b"0 0 0\n0 1 0\n0 2 0\n".to_vec(),
        })
        .await;

    let mut scene = SceneManager::new(ViewerConfig::default(), 800, 600);
    scene.sync(loader.points(), loader.params());
    let revision = scene.revision();
    assert!(!scene.sync(loader.points(), loader.params()));

    loader.params_mut().color_mode = ColorMode::Height;
    assert!(scene.sync(loader.points(), loader.params()));
    assert_eq!(scene.revision(), revision + 1);

    // Lowest point blue, highest red
    let vertices = scene.point_vertices();
    assert!(vertices[0].color[2] > vertices[0].color[0]);
    assert!(vertices[2].color[0] > vertices[2].color[2]);
}

#[tokio::test]
async fn test_export_round_trip() {
    let mut loader = loader();
    assert!(loader.export(ExportFormat::Ply, "pointcloud").is_none());

    loader
        .load(LoadSource::Bytes {
            name: "cloud.txt".to_string(),
            bytes: b"1 2 3 10 20 30\n4 5 6\n".to_vec(),
        })
        .await;

    let artifact = loader.export(ExportFormat::Ply, "pointcloud").unwrap();
    assert_eq!(artifact.file_name, "pointcloud.ply");
    let text = String::from_utf8(artifact.bytes.clone()).unwrap();
    assert!(text.contains("element vertex 2\n"));
    assert!(text.ends_with("1 2 3 10 20 30\n4 5 6 255 255 255"));

    // Loading the exported file yields the same points
    let state = loader
        .load(LoadSource::Bytes {
            name: artifact.file_name.clone(),
            bytes: artifact.bytes,
        })
        .await;
    assert_eq!(state, LoadState::Ready);
    assert_eq!(loader.points()[0].color, [10, 20, 30]);
    assert_eq!(loader.points()[1].position, Point3d::new(4.0, 5.0, 6.0));
}
