//! Pointer and keyboard handling
//!
//! Input arrives as [`InputEvent`]s, independent of the windowing library, and
//! is applied to the scene and the viewer parameters on the event-loop
//! thread. Actions that need the window (fullscreen, dialogs, exit) come back
//! as [`ViewerCommand`]s.

use crate::loader::ExportFormat;
use crate::scene::SceneManager;
use eagleeye_core::{Vector3d, ViewerParameters};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Middle,
    Secondary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
}

impl Modifiers {
    pub fn any(&self) -> bool {
        self.shift || self.ctrl
    }
}

/// What had keyboard focus when a key was pressed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FocusTarget {
    #[default]
    Canvas,
    TextInput,
    TextArea,
    ContentEditable,
}

impl FocusTarget {
    /// Whether keystrokes belong to a text field rather than the viewer.
    pub fn accepts_text(&self) -> bool {
        !matches!(self, FocusTarget::Canvas)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyInput {
    Space,
    Escape,
    Character(char),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    PointerMove { x: f64, y: f64 },
    PointerDown { button: PointerButton, modifiers: Modifiers },
    PointerUp { button: PointerButton },
    PointerLeave,
    /// Wheel movement in notches; positive is away from the user
    Wheel { notches: f64 },
    Key {
        key: KeyInput,
        target: FocusTarget,
        modifiers: Modifiers,
    },
}

/// Requests that only the window layer can carry out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewerCommand {
    ToggleFullscreen,
    OpenFile,
    Export(ExportFormat),
    Exit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OrbitDrag {
    Rotate,
    Pan,
}

/// State of a middle-button object drag
#[derive(Debug, Clone, Copy, PartialEq)]
struct ObjectDrag {
    origin: (f64, f64),
    /// Object position at drag start; `None` when nothing was rendered
    object_start: Option<Vector3d>,
}

/// World-space offset for a screen drag of `(dx, dy)` pixels.
///
/// The visible frustum height at the camera's distance from the world origin
/// is `2 * tan(fov / 2) * distance`; the drag covers the matching fraction of
/// it. X is inverted and Y follows the screen direction, applied on the
/// object's own axes.
pub fn screen_to_world_delta(dx: f64, dy: f64, fov_deg: f64, distance: f64, width: f64, height: f64) -> Vector3d {
    if width <= 0.0 || height <= 0.0 {
        return Vector3d::zeros();
    }
    let visible_height = 2.0 * (fov_deg.to_radians() / 2.0).tan() * distance;
    let visible_width = visible_height * width / height;
    Vector3d::new(-dx / width * visible_width, dy / height * visible_height, 0.0)
}

/// Routes input to orbit controls, object panning and viewer toggles.
#[derive(Debug, Default)]
pub struct InteractionController {
    cursor: (f64, f64),
    orbit_drag: Option<OrbitDrag>,
    object_drag: Option<ObjectDrag>,
}

impl InteractionController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a middle-button object drag is in progress
    pub fn is_dragging_object(&self) -> bool {
        self.object_drag.is_some()
    }

    pub fn cursor(&self) -> (f64, f64) {
        self.cursor
    }

    pub fn handle(
        &mut self,
        event: &InputEvent,
        scene: &mut SceneManager,
        params: &mut ViewerParameters,
    ) -> Option<ViewerCommand> {
        match *event {
            InputEvent::PointerMove { x, y } => {
                let (dx, dy) = (x - self.cursor.0, y - self.cursor.1);
                self.cursor = (x, y);
                self.pointer_moved(dx, dy, scene);
                None
            }
            InputEvent::PointerDown { button, modifiers } => {
                self.pointer_down(button, modifiers, scene);
                None
            }
            InputEvent::PointerUp { button } => {
                match button {
                    PointerButton::Middle => self.end_object_drag(scene),
                    PointerButton::Primary | PointerButton::Secondary => self.orbit_drag = None,
                }
                None
            }
            InputEvent::PointerLeave => {
                self.end_object_drag(scene);
                self.orbit_drag = None;
                None
            }
            InputEvent::Wheel { notches } => {
                scene.controls_mut().zoom_by_wheel(notches);
                None
            }
            InputEvent::Key {
                key,
                target,
                modifiers,
            } => self.key_pressed(key, target, modifiers, scene, params),
        }
    }

    fn pointer_down(&mut self, button: PointerButton, modifiers: Modifiers, scene: &mut SceneManager) {
        match button {
            PointerButton::Middle => {
                // The drag disables orbiting even when there is nothing to move
                self.orbit_drag = None;
                self.object_drag = Some(ObjectDrag {
                    origin: self.cursor,
                    object_start: scene.object().map(|o| o.position),
                });
                scene.controls_mut().enabled = false;
                log::debug!("Object drag started at {:?}", self.cursor);
            }
            PointerButton::Primary if self.object_drag.is_none() => {
                self.orbit_drag = Some(if modifiers.any() {
                    OrbitDrag::Pan
                } else {
                    OrbitDrag::Rotate
                });
            }
            PointerButton::Secondary if self.object_drag.is_none() => {
                self.orbit_drag = Some(OrbitDrag::Pan);
            }
            _ => {}
        }
    }

    fn pointer_moved(&mut self, dx: f64, dy: f64, scene: &mut SceneManager) {
        if let Some(drag) = self.object_drag {
            let Some(start) = drag.object_start else {
                return;
            };
            let (width, height) = scene.surface_size();
            let camera = scene.camera();
            let delta = screen_to_world_delta(
                self.cursor.0 - drag.origin.0,
                self.cursor.1 - drag.origin.1,
                camera.fov_deg,
                camera.distance_to_origin(),
                width as f64,
                height as f64,
            );
            if let Some(object) = scene.object_mut() {
                object.position.x = start.x + delta.x;
                object.position.y = start.y + delta.y;
            }
            return;
        }

        let height = scene.surface_size().1 as f64;
        match self.orbit_drag {
            Some(OrbitDrag::Rotate) => scene.controls_mut().rotate_by_pixels(dx, dy, height),
            Some(OrbitDrag::Pan) => {
                let (camera, controls) = scene.camera_and_controls();
                controls.pan_by_pixels(camera, dx, dy, height);
            }
            None => {}
        }
    }

    fn end_object_drag(&mut self, scene: &mut SceneManager) {
        if self.object_drag.take().is_some() {
            scene.controls_mut().enabled = true;
            log::debug!("Object drag ended");
        }
    }

    fn key_pressed(
        &mut self,
        key: KeyInput,
        target: FocusTarget,
        modifiers: Modifiers,
        scene: &mut SceneManager,
        params: &mut ViewerParameters,
    ) -> Option<ViewerCommand> {
        if target.accepts_text() {
            return None;
        }

        match key {
            KeyInput::Space => {
                let animating = params.toggle_animation();
                log::debug!("Rotation {}", if animating { "started" } else { "stopped" });
                None
            }
            KeyInput::Escape => Some(ViewerCommand::Exit),
            KeyInput::Character(c) => match c.to_ascii_lowercase() {
                'f' => Some(ViewerCommand::ToggleFullscreen),
                'r' => {
                    scene.reset_camera();
                    None
                }
                'o' => Some(ViewerCommand::OpenFile),
                'e' if modifiers.shift => Some(ViewerCommand::Export(ExportFormat::Ply)),
                'e' => Some(ViewerCommand::Export(ExportFormat::Txt)),
                'c' => {
                    params.color_mode = params.color_mode.next();
                    log::info!("Colour mode: {}", params.color_mode);
                    None
                }
                '+' | '=' => {
                    params.step_point_size(1);
                    None
                }
                '-' | '_' => {
                    params.step_point_size(-1);
                    None
                }
                _ => None,
            },
        }
    }
}
