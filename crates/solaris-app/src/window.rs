//! Main window, event routing and the winit application loop.

use std::sync::Arc;
use std::time::Instant;

use glam::Vec2;
use solaris_config::Config;
use solaris_render::SurfaceWrapper;
use solaris_scene::{BodyDescriptor, RenderSession, Selection, UiBridge, pointer_to_ndc};
use tracing::{debug, error, info, instrument};
use winit::application::ApplicationHandler;
use winit::event::{ElementState, KeyEvent, MouseButton, WindowEvent};
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::keyboard::{Key, NamedKey};
use winit::window::{WindowAttributes, WindowId};

use crate::controls::{OrbitControls, scroll_lines};
use crate::error::AppError;
use crate::main_scene::MainScene;
use crate::overlay::ConsoleOverlay;
use crate::preview::{PreviewScene, WinitPreviewLauncher};
use crate::scheduler::WinitScheduler;

pub type MainSession = RenderSession<MainScene, WinitScheduler>;
pub type Bridge = UiBridge<ConsoleOverlay, PreviewScene, WinitScheduler>;

/// Returns [`WindowAttributes`] based on the given configuration.
pub fn window_attributes_from_config(config: &Config) -> WindowAttributes {
    WindowAttributes::default()
        .with_title(config.window.title.clone())
        .with_inner_size(winit::dpi::LogicalSize::new(
            config.window.width as f64,
            config.window.height as f64,
        ))
}

/// What a key press does, if anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    DismissWelcome,
    CloseDetails,
}

pub fn key_action(key: &Key) -> Option<KeyAction> {
    match key {
        Key::Named(NamedKey::Enter | NamedKey::Space) => Some(KeyAction::DismissWelcome),
        Key::Named(NamedKey::Escape) => Some(KeyAction::CloseDetails),
        _ => None,
    }
}

/// The running orrery: the main scene session, the overlay bridge with its
/// optional preview, and the user's selection.
pub struct SolarApp {
    config: Config,
    manifest: Vec<BodyDescriptor>,
    controls: OrbitControls,
    selection: Selection,
    surface: SurfaceWrapper,
    main: Option<MainSession>,
    bridge: Option<Bridge>,
}

impl SolarApp {
    pub fn new(config: Config, manifest: Vec<BodyDescriptor>) -> Self {
        Self {
            controls: OrbitControls::from_config(&config.camera),
            surface: SurfaceWrapper::new(config.window.width, config.window.height, 1.0),
            config,
            manifest,
            selection: Selection::new(),
            main: None,
            bridge: None,
        }
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    fn main_window_id(&self) -> Option<WindowId> {
        self.main.as_ref()?.task().map(MainScene::window_id)
    }

    fn preview_window_id(&self) -> Option<WindowId> {
        self.bridge.as_ref()?.preview_task().map(PreviewScene::window_id)
    }

    fn sync_camera(&mut self) {
        if let Some(scene) = self.main.as_mut().and_then(|m| m.task_mut()) {
            self.controls.apply(scene.camera_mut());
        }
    }

    fn start(&mut self, event_loop: &ActiveEventLoop) -> Result<(), AppError> {
        let window = Arc::new(event_loop.create_window(window_attributes_from_config(&self.config))?);
        let inner = window.inner_size();
        self.surface = SurfaceWrapper::new(inner.width, inner.height, window.scale_factor());
        info!(
            "Main window created: {}x{} (scale: {:.2})",
            inner.width,
            inner.height,
            self.surface.scale_factor()
        );

        let mut scene = MainScene::new(window.clone(), &self.config, &self.manifest)?;
        self.controls.apply(scene.camera_mut());

        self.bridge = Some(UiBridge::new(ConsoleOverlay::new(
            window.clone(),
            self.config.window.title.clone(),
        )));
        self.main = Some(RenderSession::start(
            "main scene",
            scene,
            WinitScheduler::new(window),
        ));
        Ok(())
    }

    fn handle_key(&mut self, action: KeyAction) {
        let Some(bridge) = self.bridge.as_mut() else {
            return;
        };
        match action {
            KeyAction::DismissWelcome => bridge.dismiss_welcome(),
            KeyAction::CloseDetails => bridge.close(&mut self.selection),
        }
    }

    /// Select whatever body lies under `pointer`, if any.
    fn handle_click(&mut self, event_loop: &ActiveEventLoop, pointer: Vec2) {
        let (Some(bridge), Some(main)) = (self.bridge.as_mut(), self.main.as_ref()) else {
            return;
        };
        if !bridge.picking_enabled() {
            debug!("Click ignored while the welcome overlay is shown");
            return;
        }
        let Some(scene) = main.task() else {
            return;
        };
        let size = self.surface.physical_size();
        let Some(ndc) = pointer_to_ndc(pointer.x, pointer.y, size.width as f32, size.height as f32)
        else {
            return;
        };
        let Some(hit) = scene.pick(ndc) else {
            debug!("Click at {ndc} hit no body");
            return;
        };

        let change = self.selection.select(hit.body);
        let mut launcher = WinitPreviewLauncher {
            event_loop,
            config: &self.config,
        };
        bridge.on_selection(change, &scene.scene().registry, &mut launcher);
    }

    fn main_window_event(&mut self, event_loop: &ActiveEventLoop, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                info!("Main window closed, exiting");
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                if let Some(size) = self.surface.handle_resize(size.width, size.height)
                    && let Some(scene) = self.main.as_mut().and_then(|m| m.task_mut())
                {
                    scene.resize(size.width, size.height);
                }
            }
            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                self.surface.set_scale_factor(scale_factor);
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        logical_key,
                        state: ElementState::Pressed,
                        repeat: false,
                        ..
                    },
                ..
            } => {
                if let Some(action) = key_action(&logical_key) {
                    self.handle_key(action);
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                if self
                    .controls
                    .cursor_moved(Vec2::new(position.x as f32, position.y as f32))
                {
                    self.sync_camera();
                }
            }
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => match state {
                ElementState::Pressed => self.controls.button_pressed(),
                ElementState::Released => {
                    if let Some(pointer) = self.controls.button_released() {
                        self.handle_click(event_loop, pointer);
                    }
                }
            },
            WindowEvent::MouseWheel { delta, .. } => {
                if self.controls.zoom(scroll_lines(delta)) {
                    self.sync_camera();
                }
            }
            WindowEvent::RedrawRequested => {
                let Some(main) = self.main.as_mut() else {
                    return;
                };
                main.pump(Instant::now());
                if main.task().is_some_and(MainScene::out_of_memory) {
                    event_loop.exit();
                }
            }
            _ => {}
        }
    }

    fn preview_window_event(&mut self, event: WindowEvent) {
        let Some(bridge) = self.bridge.as_mut() else {
            return;
        };
        match event {
            WindowEvent::CloseRequested => bridge.close(&mut self.selection),
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        logical_key: Key::Named(NamedKey::Escape),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => bridge.close(&mut self.selection),
            WindowEvent::Resized(size) => {
                if let Some(preview) = bridge.preview_task_mut() {
                    preview.resize(size.width, size.height);
                }
            }
            WindowEvent::RedrawRequested => {
                bridge.pump_preview(Instant::now());
            }
            _ => {}
        }
    }
}

impl ApplicationHandler for SolarApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.main.is_some() {
            return;
        }
        if let Err(e) = self.start(event_loop) {
            error!("Failed to start: {e}");
            event_loop.exit();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        if self.main_window_id() == Some(window_id) {
            self.main_window_event(event_loop, event);
        } else if self.preview_window_id() == Some(window_id) {
            self.preview_window_event(event);
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(bridge) = self.bridge.as_mut() {
            bridge.close(&mut self.selection);
        }
        if let Some(mut main) = self.main.take() {
            main.stop();
        }
    }
}

/// Creates an event loop and runs the orrery until the main window closes.
#[instrument(skip_all)]
pub fn run(config: Config, manifest: Vec<BodyDescriptor>) -> Result<(), AppError> {
    let event_loop = EventLoop::new()?;
    let mut app = SolarApp::new(config, manifest);
    event_loop.run_app(&mut app)?;
    Ok(())
}
