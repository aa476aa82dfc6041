//! Windowed viewer
//!
//! Runs the winit event loop. The loop thread owns the scene, the input
//! controller, the loader state and the renderer; loads run on a tokio
//! runtime and are picked up once per frame.

use std::sync::Arc;
use winit::{
    dpi::LogicalSize,
    event::{ElementState, Event, MouseButton, MouseScrollDelta, WindowEvent},
    event_loop::{ControlFlow, EventLoop, EventLoopWindowTarget},
    keyboard::{Key, NamedKey},
    window::{Fullscreen, Window, WindowBuilder},
};

use eagleeye_core::{Error, Result, ViewerConfig, ViewerParameters};
use eagleeye_gpu::PointCloudRenderer;

use crate::interaction::{
    FocusTarget, InputEvent, InteractionController, KeyInput, Modifiers, PointerButton, ViewerCommand,
};
use crate::loader::{DataLoader, ExportFormat, LoadSource, LoadState};
use crate::scene::SceneManager;

const WINDOW_TITLE: &str = "eagleeye";

/// Interactive point cloud viewer window
pub struct Viewer {
    config: ViewerConfig,
    params: ViewerParameters,
    initial_source: Option<LoadSource>,
}

impl Viewer {
    pub fn new(config: ViewerConfig, params: ViewerParameters) -> Self {
        Self {
            config,
            params,
            initial_source: None,
        }
    }

    /// Load `source` as soon as the window is up.
    pub fn with_source(mut self, source: LoadSource) -> Self {
        self.initial_source = Some(source);
        self
    }

    /// Open the window and block until it is closed.
    pub fn run(self) -> Result<()> {
        log::info!("Starting eagleeye viewer");

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()?;

        let event_loop = EventLoop::new()
            .map_err(|e| Error::Resource(format!("Failed to create event loop: {}", e)))?;
        let window = Arc::new(
            WindowBuilder::new()
                .with_title(WINDOW_TITLE)
                .with_inner_size(LogicalSize::new(
                    self.config.window_width as f64,
                    self.config.window_height as f64,
                ))
                .build(&event_loop)
                .map_err(|e| Error::Resource(format!("Failed to create window: {}", e)))?,
        );

        let mut renderer = pollster::block_on(PointCloudRenderer::new(
            window.clone(),
            self.config.background_rgb(),
        ))?;
        let (width, height) = renderer.size();

        let mut scene = SceneManager::new(self.config, width, height);
        let mut input = InteractionController::new();
        let mut loader = DataLoader::new(runtime.handle().clone(), self.params);
        let mut modifiers = Modifiers::default();

        if let Some(source) = self.initial_source {
            loader.request(source);
            update_title(&window, &loader);
        }

        log::info!("Viewer initialized ({}x{})", width, height);

        event_loop
            .run(move |event, target| {
                target.set_control_flow(ControlFlow::Poll);

                match event {
                    Event::WindowEvent { event, .. } => match event {
                        WindowEvent::CloseRequested => target.exit(),
                        WindowEvent::Resized(size) => {
                            renderer.resize(size.width, size.height);
                            scene.resize(size.width, size.height);
                        }
                        WindowEvent::ModifiersChanged(state) => {
                            modifiers = Modifiers {
                                shift: state.state().shift_key(),
                                ctrl: state.state().control_key(),
                            };
                        }
                        WindowEvent::CursorMoved { position, .. } => {
                            let event = InputEvent::PointerMove {
                                x: position.x,
                                y: position.y,
                            };
                            input.handle(&event, &mut scene, loader.params_mut());
                        }
                        WindowEvent::CursorLeft { .. } => {
                            input.handle(&InputEvent::PointerLeave, &mut scene, loader.params_mut());
                        }
                        WindowEvent::MouseInput { state, button, .. } => {
                            let Some(button) = pointer_button(button) else {
                                return;
                            };
                            let event = match state {
                                ElementState::Pressed => InputEvent::PointerDown { button, modifiers },
                                ElementState::Released => InputEvent::PointerUp { button },
                            };
                            input.handle(&event, &mut scene, loader.params_mut());
                        }
                        WindowEvent::MouseWheel { delta, .. } => {
                            let notches = match delta {
                                MouseScrollDelta::LineDelta(_, y) => y as f64,
                                MouseScrollDelta::PixelDelta(pos) => pos.y / 100.0,
                            };
                            input.handle(&InputEvent::Wheel { notches }, &mut scene, loader.params_mut());
                        }
                        WindowEvent::KeyboardInput { event, .. } => {
                            if event.state != ElementState::Pressed {
                                return;
                            }
                            let Some(key) = key_input(&event.logical_key) else {
                                return;
                            };
                            let event = InputEvent::Key {
                                key,
                                target: FocusTarget::Canvas,
                                modifiers,
                            };
                            if let Some(command) = input.handle(&event, &mut scene, loader.params_mut()) {
                                execute(command, &window, &mut loader, &scene, target);
                            }
                        }
                        WindowEvent::RedrawRequested => {
                            if loader.poll() {
                                update_title(&window, &loader);
                            }

                            scene.sync(loader.points(), loader.params());
                            scene.tick(loader.params());

                            if renderer.revision() != Some(scene.revision()) {
                                renderer.upload(scene.revision(), scene.point_vertices(), scene.axis_vertices());
                            }

                            if let Err(e) = renderer.render(&scene.frame_uniforms()) {
                                log::error!("Rendering stopped: {}", e);
                                target.exit();
                            }
                        }
                        _ => {}
                    },
                    Event::AboutToWait => window.request_redraw(),
                    Event::LoopExiting => {
                        scene.teardown();
                        renderer.release_geometry();
                        log::info!("Viewer closed");
                    }
                    _ => {}
                }
            })
            .map_err(|e| Error::Resource(format!("Event loop error: {}", e)))
    }
}

/// Open a viewer window and block until it is closed.
pub fn run_viewer(config: ViewerConfig, params: ViewerParameters, source: Option<LoadSource>) -> Result<()> {
    let viewer = Viewer::new(config, params);
    match source {
        Some(source) => viewer.with_source(source).run(),
        None => viewer.run(),
    }
}

fn pointer_button(button: MouseButton) -> Option<PointerButton> {
    match button {
        MouseButton::Left => Some(PointerButton::Primary),
        MouseButton::Middle => Some(PointerButton::Middle),
        MouseButton::Right => Some(PointerButton::Secondary),
        _ => None,
    }
}

fn key_input(key: &Key) -> Option<KeyInput> {
    match key {
        Key::Named(NamedKey::Space) => Some(KeyInput::Space),
        Key::Named(NamedKey::Escape) => Some(KeyInput::Escape),
        Key::Character(s) => s.chars().next().map(KeyInput::Character),
        _ => None,
    }
}

fn update_title(window: &Window, loader: &DataLoader) {
    let title = match loader.state() {
        LoadState::Empty => WINDOW_TITLE.to_string(),
        LoadState::Loading => format!("{} - loading...", WINDOW_TITLE),
        LoadState::Ready => format!("{} - {} points", WINDOW_TITLE, loader.point_count().unwrap_or(0)),
        LoadState::Failed => format!("{} - {}", WINDOW_TITLE, loader.error().unwrap_or("load failed")),
    };
    window.set_title(&title);
}

fn execute(
    command: ViewerCommand,
    window: &Window,
    loader: &mut DataLoader,
    scene: &SceneManager,
    target: &EventLoopWindowTarget<()>,
) {
    match command {
        ViewerCommand::ToggleFullscreen => {
            let next = match window.fullscreen() {
                Some(_) => None,
                None => Some(Fullscreen::Borderless(None)),
            };
            window.set_fullscreen(next);
        }
        ViewerCommand::OpenFile => {
            let picked = rfd::FileDialog::new()
                .add_filter("Point clouds", &["txt", "ply"])
                .add_filter("All files", &["*"])
                .pick_file();
            if let Some(path) = picked {
                loader.request(LoadSource::File(path));
                update_title(window, loader);
            }
        }
        ViewerCommand::Export(format) => export(format, loader, &scene.config().export_base_name),
        ViewerCommand::Exit => target.exit(),
    }
}

fn export(format: ExportFormat, loader: &DataLoader, base_name: &str) {
    let Some(artifact) = loader.export(format, base_name) else {
        return;
    };
    let Some(path) = rfd::FileDialog::new()
        .set_file_name(&artifact.file_name)
        .add_filter(format.extension(), &[format.extension()])
        .save_file()
    else {
        return;
    };
    if let Err(e) = artifact.save_as(&path) {
        log::error!("Export to {} failed: {}", path.display(), e);
    }
}
