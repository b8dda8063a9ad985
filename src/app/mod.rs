mod egui_host;
mod input;
mod timing;

use crate::config::{
    load_config_from_file, save_config_to_file, startup_config, ViewerConfig, DEFAULT_CONFIG_FILE,
};
use crate::controller::{InputEvent, InteractionController};
use crate::render::{RenderContext, SceneTextures, ScenePainter, BACKGROUND};
use crate::ui::{ControlPanel, PanelAction};
use egui_host::EguiHost;
use input::KeyBinding;
use timing::FrameTiming;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{DeviceEvent, DeviceId, ElementState, MouseButton, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{CursorGrabMode, Window, WindowAttributes, WindowId};

const WINDOW_TITLE: &str = "holoscene";

pub struct App {
    window: Option<Arc<Window>>,
    render: Option<RenderContext>,
    egui: Option<EguiHost>,
    controller: InteractionController,
    panel: ControlPanel,
    scene_textures: SceneTextures,
    config: ViewerConfig,
    timing: FrameTiming,
    target_frame_duration: Duration,
    next_frame_time: Instant,
}

impl App {
    fn new(config: ViewerConfig) -> Self {
        let mut controller = InteractionController::new(&config);
        controller.load_model(config.model_path.clone());
        Self {
            window: None,
            render: None,
            egui: None,
            controller,
            panel: ControlPanel::new(),
            scene_textures: SceneTextures::new(),
            config,
            timing: FrameTiming::new(WINDOW_TITLE.to_string()),
            target_frame_duration: Duration::from_millis(16),
            next_frame_time: Instant::now(),
        }
    }

    fn handle_resize(&mut self, new_size: PhysicalSize<u32>) {
        if let Some(render) = &mut self.render {
            render.resize(new_size);
        }
        self.controller
            .set_viewport(new_size.width as f32, new_size.height as f32);
    }

    fn update_target_frame_duration(&mut self, window: &Window) {
        let mut target = Duration::from_millis(16);
        if let Some(monitor) = window.current_monitor() {
            if let Some(millihz) = monitor.refresh_rate_millihertz() {
                let hz = millihz as f32 / 1000.0;
                if hz > 1.0 {
                    target = Duration::from_secs_f32(1.0 / hz);
                }
            }
        }
        self.target_frame_duration = target;
        self.next_frame_time = Instant::now() + self.target_frame_duration;
    }

    fn apply_pointer_lock(&mut self, window: &Window) {
        let Some(lock) = self.controller.take_lock_request() else {
            return;
        };
        if lock {
            let grabbed = window
                .set_cursor_grab(CursorGrabMode::Locked)
                .or_else(|_| window.set_cursor_grab(CursorGrabMode::Confined));
            match grabbed {
                Ok(()) => {
                    window.set_cursor_visible(false);
                    self.controller.set_pointer_locked(true);
                }
                Err(err) => log::warn!("Pointer lock unavailable: {}", err),
            }
        } else {
            if let Err(err) = window.set_cursor_grab(CursorGrabMode::None) {
                log::warn!("Failed to release pointer: {}", err);
            }
            window.set_cursor_visible(true);
            self.controller.set_pointer_locked(false);
        }
    }

    fn redraw(&mut self) {
        let Some(window) = self.window.clone() else {
            return;
        };
        self.timing.update(&window, Instant::now());
        self.controller.frame();
        self.apply_pointer_lock(&window);

        let (Some(egui), Some(render)) = (&mut self.egui, &mut self.render) else {
            return;
        };
        self.scene_textures
            .sync(egui.context(), self.controller.textures());

        let viewport = self.controller.viewport();
        let scene_textures = &self.scene_textures;
        let controller = &mut self.controller;
        let panel = &mut self.panel;
        let mut action = None;
        let mut triangles = 0;
        let output = egui.run_ui(&window, |ctx| {
            let lookup = |id| scene_textures.egui_id(id);
            let painted = ScenePainter::new(
                controller.camera(),
                viewport,
                ctx.pixels_per_point(),
                controller.settings().lights,
                &lookup,
            )
            .paint(controller.scene());
            triangles = painted.triangles;

            let painter = ctx.layer_painter(egui::LayerId::background());
            painter.rect_filled(ctx.screen_rect(), 0.0, BACKGROUND);
            for mesh in painted.meshes {
                painter.add(egui::Shape::mesh(mesh));
            }
            action = panel.show(ctx, controller);
        });
        self.timing.set_triangles(triangles);

        if let Err(err) = render.render(
            &output.clipped_primitives,
            &output.textures_delta,
            output.pixels_per_point,
        ) {
            log::warn!("Frame dropped: {}", err);
        }

        match action {
            Some(PanelAction::SaveSettings) => self.handle_save_settings_action(),
            Some(PanelAction::LoadSettings) => self.handle_load_settings_action(),
            None => {}
        }
    }

    fn handle_save_settings_action(&mut self) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("Settings", &["json"])
            .set_file_name(DEFAULT_CONFIG_FILE)
            .save_file()
        else {
            return;
        };
        let config = self.controller.snapshot_config(&self.config);
        match save_config_to_file(&config, &path) {
            Ok(()) => {
                log::info!("Settings saved to {:?}", path);
                self.panel.set_status(format!("Saved {}", path.display()));
                self.config = config;
            }
            Err(err) => {
                log::warn!("Failed to save settings: {}", err);
                self.panel.set_status(format!("Save failed: {}", err));
            }
        }
    }

    fn handle_load_settings_action(&mut self) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("Settings", &["json"])
            .pick_file()
        else {
            return;
        };
        match load_config_from_file(&path) {
            Ok(config) => {
                log::info!("Settings loaded from {:?}", path);
                self.controller.apply_config(&config);
                self.panel.set_status(format!("Loaded {}", path.display()));
                self.config = config;
            }
            Err(err) => {
                log::warn!("Failed to load settings: {}", err);
                self.panel.set_status(format!("Load failed: {}", err));
            }
        }
    }

    fn handle_keyboard(&mut self, event: &winit::event::KeyEvent, consumed: bool) {
        let Some(binding) = input::map_key(event.physical_key) else {
            return;
        };
        let pressed = event.state == ElementState::Pressed;
        match binding {
            // Releases always go through so a key never sticks behind the panel.
            KeyBinding::Move(direction) if !pressed => {
                self.controller.push_event(InputEvent::KeyUp(direction));
            }
            KeyBinding::Move(direction) if !consumed => {
                self.controller.push_event(InputEvent::KeyDown(direction));
            }
            KeyBinding::ReleasePointerLock if pressed => {
                self.controller.push_event(InputEvent::ReleasePointerLock);
            }
            _ => {}
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let [width, height] = self.config.window_size;
        let window_attrs = WindowAttributes::default()
            .with_title(WINDOW_TITLE)
            .with_inner_size(PhysicalSize::new(width, height))
            .with_resizable(true);
        let window = match event_loop.create_window(window_attrs) {
            Ok(window) => Arc::new(window),
            Err(err) => {
                log::error!("Failed to create window: {}", err);
                event_loop.exit();
                return;
            }
        };

        match RenderContext::new(window.clone()) {
            Ok(render) => self.render = Some(render),
            Err(err) => {
                log::error!("Failed to initialise rendering: {}", err);
                event_loop.exit();
                return;
            }
        }
        self.egui = Some(EguiHost::new(&window));
        self.handle_resize(window.inner_size());
        self.update_target_frame_duration(&window);
        self.window = Some(window);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let consumed = match (&mut self.egui, &self.window) {
            (Some(egui), Some(window)) => egui.on_window_event(window, &event),
            _ => false,
        };
        let over_ui = self
            .egui
            .as_ref()
            .is_some_and(|egui| egui.wants_pointer_input());

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                self.handle_resize(new_size);
                if let Some(window) = self.window.clone() {
                    self.update_target_frame_duration(&window);
                }
            }
            WindowEvent::Moved(_) => {
                if let Some(window) = self.window.clone() {
                    self.update_target_frame_duration(&window);
                }
            }
            WindowEvent::Focused(false) => {
                self.controller.push_event(InputEvent::PointerUp);
            }
            WindowEvent::KeyboardInput { event, .. } => {
                self.handle_keyboard(&event, consumed);
            }
            WindowEvent::CursorMoved { position, .. } => {
                if over_ui {
                    self.controller.push_event(InputEvent::PointerLeft);
                } else {
                    self.controller.push_event(InputEvent::PointerMoved {
                        x: position.x as f32,
                        y: position.y as f32,
                    });
                }
            }
            WindowEvent::CursorLeft { .. } => {
                self.controller.push_event(InputEvent::PointerLeft);
            }
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => match state {
                ElementState::Pressed if !consumed && !over_ui => {
                    self.controller.push_event(InputEvent::PointerDown);
                    self.controller.push_event(InputEvent::Click);
                }
                ElementState::Released => {
                    self.controller.push_event(InputEvent::PointerUp);
                }
                _ => {}
            },
            WindowEvent::DroppedFile(path) => {
                log::info!("File dropped: {}", path.display());
                self.controller.push_event(InputEvent::FileDropped(path));
            }
            WindowEvent::RedrawRequested => {
                self.redraw();
            }
            _ => {}
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: DeviceId,
        event: DeviceEvent,
    ) {
        if let DeviceEvent::MouseMotion { delta: (dx, dy) } = event {
            self.controller.push_event(InputEvent::PointerMotion {
                dx: dx as f32,
                dy: dy as f32,
            });
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        let now = Instant::now();
        if now >= self.next_frame_time {
            if let Some(window) = &self.window {
                window.request_redraw();
            }
            self.next_frame_time = now + self.target_frame_duration;
        }
        event_loop.set_control_flow(ControlFlow::WaitUntil(self.next_frame_time));
    }
}

pub fn run(model_arg: Option<PathBuf>) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let config = startup_config(model_arg);
    log::info!("holoscene - model {}", config.model_path.display());
    log::info!("   WASD to move, drag to look, drop an image or video on the cube");

    let event_loop = match EventLoop::new() {
        Ok(event_loop) => event_loop,
        Err(err) => {
            log::error!("Failed to create event loop: {}", err);
            return;
        }
    };
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut app = App::new(config);
    if let Err(err) = event_loop.run_app(&mut app) {
        log::error!("Event loop error: {}", err);
    }
}
