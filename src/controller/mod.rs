pub mod events;
pub mod pointer;

pub use events::{Direction, InputEvent, InputQueue};
pub use pointer::PointerState;

use crate::assets::AssetLoader;
use crate::config::{HighlightColor, LightIntensities, ViewerConfig};
use crate::media::{
    DecodedMedia, MediaCompletion, MediaLoader, RetextureRequest, TextureId,
    TextureStore, VideoStream,
};
use crate::render::camera::CameraController;
use crate::render::pick::raycast;
use crate::scene::{Appearance, LoadedModel, ObjectId, SceneGraph};
use glam::{Vec2, Vec3};
use std::collections::HashSet;
use std::path::PathBuf;

/// Distance travelled per movement key event.
pub const MOVE_SPEED: f32 = 10.0;
/// Radians of camera turn per pixel of pointer motion.
pub const LOOK_SENSITIVITY: f32 = 0.01;
/// Radians of model Y rotation per frame while animating.
pub const SPIN_PER_FRAME: f32 = 0.01;

/// Values the control panel edits that are not part of the scene graph.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewerSettings {
    pub lights: LightIntensities,
    pub highlight: HighlightColor,
    pub animate: bool,
}

impl ViewerSettings {
    pub fn from_config(config: &ViewerConfig) -> Self {
        Self {
            lights: config.lights.clamped(),
            highlight: config.highlight,
            animate: config.animate,
        }
    }
}

struct ActiveVideo {
    texture: TextureId,
    // None once playback has finished; the texture keeps the last frame.
    stream: Option<VideoStream>,
}

/// Owns all interaction state and applies queued input once per frame.
pub struct InteractionController {
    camera: CameraController,
    scene: SceneGraph,
    textures: TextureStore,
    settings: ViewerSettings,
    pointer: PointerState,
    held_keys: HashSet<Direction>,
    highlighted: Option<ObjectId>,
    queue: InputQueue,
    media: MediaLoader,
    model_loader: Option<AssetLoader>,
    video: Option<ActiveVideo>,
    // A drop that arrived while the cursor position was unknown.
    pending_drop: Option<RetextureRequest>,
    // Rotation from settings, applied once the model has loaded.
    pending_rotation: Vec3,
    viewport: Vec2,
    pointer_locked: bool,
    lock_request: Option<bool>,
}

impl InteractionController {
    pub fn new(config: &ViewerConfig) -> Self {
        let [rx, ry, rz] = config.rotation;
        Self {
            camera: CameraController::new(Vec3::ZERO, 0.0, 0.0),
            scene: SceneGraph::new(),
            textures: TextureStore::new(),
            settings: ViewerSettings::from_config(config),
            pointer: PointerState::default(),
            held_keys: HashSet::new(),
            highlighted: None,
            queue: InputQueue::new(),
            media: MediaLoader::new(config.ffmpeg_path.clone()),
            model_loader: None,
            video: None,
            pending_drop: None,
            pending_rotation: Vec3::new(rx, ry, rz),
            viewport: Vec2::new(config.window_size[0] as f32, config.window_size[1] as f32),
            pointer_locked: false,
            lock_request: None,
        }
    }

    /// Start importing the model on a background thread.
    pub fn load_model(&mut self, path: PathBuf) {
        log::info!("Loading model {}", path.display());
        self.model_loader = Some(AssetLoader::spawn(path));
    }

    pub fn push_event(&mut self, event: InputEvent) {
        self.queue.push(event);
    }

    /// Advance one frame: input, finished background work, video, spin, highlight.
    pub fn frame(&mut self) {
        for event in self.queue.drain() {
            self.handle_event(event);
        }
        self.poll_model();
        for completion in self.media.poll() {
            self.apply_media(completion);
        }
        self.pump_video();
        self.spin();
        if let Some(position) = self.pointer.position {
            self.update_highlight(position);
        }
    }

    fn handle_event(&mut self, event: InputEvent) {
        match event {
            InputEvent::KeyDown(direction) => {
                self.held_keys.insert(direction);
                self.movement(direction);
            }
            InputEvent::KeyUp(direction) => {
                self.held_keys.remove(&direction);
            }
            InputEvent::PointerDown => self.pointer.press(),
            InputEvent::PointerUp => self.pointer.release(),
            InputEvent::PointerMoved { x, y } => {
                let position = Vec2::new(x, y);
                self.pointer.move_to(position);
                if let Some(request) = self.pending_drop.take() {
                    self.handle_drop(request);
                }
                if self.pointer.dragging_appearance {
                    self.update_highlight(position);
                }
            }
            InputEvent::PointerLeft => {
                self.pointer.leave();
                self.clear_highlight();
                if let Some(request) = self.pending_drop.take() {
                    log::debug!("Discarding drop of {} outside the scene", request.path.display());
                }
            }
            InputEvent::PointerMotion { dx, dy } => {
                self.look(dx, dy);
            }
            InputEvent::Click => {
                if !self.pointer_locked {
                    self.lock_request = Some(true);
                }
            }
            InputEvent::ReleasePointerLock => {
                if self.pointer_locked {
                    self.lock_request = Some(false);
                }
            }
            InputEvent::FileDropped(path) => {
                self.handle_drop(RetextureRequest::from_path(path));
            }
            InputEvent::ToggleRotation => self.toggle_rotation(),
        }
    }

    /// Step the camera in the ground plane. Only acts while `direction` is held.
    pub fn movement(&mut self, direction: Direction) -> bool {
        if !self.held_keys.contains(&direction) {
            return false;
        }
        let (right, forward) = direction.axes();
        self.camera
            .move_horizontal(right * MOVE_SPEED, forward * MOVE_SPEED);
        true
    }

    /// Turn the camera by raw pointer motion. Ignored outside a press.
    pub fn look(&mut self, dx: f32, dy: f32) -> bool {
        if !self.pointer.rotating_camera {
            return false;
        }
        self.camera
            .turn(-dx * LOOK_SENSITIVITY, -dy * LOOK_SENSITIVITY);
        true
    }

    /// Hologram the nearest model mesh under `pointer`, or reset every mesh
    /// on a miss. Returns the highlighted object.
    pub fn update_highlight(&mut self, pointer: Vec2) -> Option<ObjectId> {
        self.scene.model()?;
        let ray = self.camera.ray_through(pointer, self.viewport)?;
        let hit = raycast(&ray, self.scene.model_objects(), true);
        let Some(hit) = hit else {
            self.clear_highlight();
            return None;
        };

        if let Some(previous) = self.highlighted.filter(|id| *id != hit.object) {
            if let Some(object) = self.scene.object_mut(previous) {
                object.appearance = Appearance::default_standard();
            }
        }
        if let Some(object) = self.scene.object_mut(hit.object) {
            if self.highlighted != Some(hit.object) {
                log::debug!("Highlighting {}", object.name);
            }
            object.appearance = Appearance::hologram(self.settings.highlight.rgb());
        }
        self.highlighted = Some(hit.object);
        self.highlighted
    }

    fn clear_highlight(&mut self) {
        if self.scene.model().is_some() {
            self.scene.reset_model_appearance();
        }
        self.highlighted = None;
    }

    /// Start retexturing the target from a dropped file. Returns the decode
    /// request id when the drop is accepted.
    ///
    /// An OS drag reports no cursor position, so a drop that arrives after the
    /// pointer left the window waits for the next pointer move and is hit
    /// tested there.
    pub fn handle_drop(&mut self, request: RetextureRequest) -> Option<u64> {
        if request.kind().is_none() {
            log::debug!(
                "Ignoring drop of {} ({})",
                request.path.display(),
                request.mime
            );
            return None;
        }
        let Some(position) = self.pointer.position else {
            self.pending_drop = Some(request);
            return None;
        };
        let ray = self.camera.ray_through(position, self.viewport)?;
        let interactive = self
            .scene
            .objects()
            .into_iter()
            .filter(|(object, _)| object.interactive);
        raycast(&ray, interactive, false)?;
        self.media.submit(request)
    }

    pub fn toggle_rotation(&mut self) {
        self.settings.animate = !self.settings.animate;
        log::debug!("Animation {}", if self.settings.animate { "on" } else { "off" });
    }

    fn spin(&mut self) {
        if !self.settings.animate {
            return;
        }
        if let Some(model) = self.scene.model_mut() {
            model.rotation.y = wrap_pi(model.rotation.y + SPIN_PER_FRAME);
        }
    }

    fn poll_model(&mut self) {
        let Some(loader) = &mut self.model_loader else {
            return;
        };
        let Some(result) = loader.poll() else {
            return;
        };
        let path = loader.path().display().to_string();
        self.model_loader = None;
        match result {
            Ok(model) => self.install_model(model),
            Err(err) => log::warn!("Failed to load model {}: {}", path, err),
        }
    }

    fn install_model(&mut self, loaded: LoadedModel) {
        let mesh_count = loaded.meshes.len();
        let model = self.scene.set_model(loaded);
        model.center_on_origin();
        let radius = model.world_bounds().bounding_radius();
        model.rotation = self.pending_rotation;
        log::info!(
            "Model {} ready: {} meshes, radius {:.2}",
            model.name,
            mesh_count,
            radius
        );
        self.camera.frame_radius(radius);
        self.highlighted = None;
    }

    fn apply_media(&mut self, completion: MediaCompletion) {
        let label = completion.request.label();
        match completion.result {
            Ok(DecodedMedia::Image(image)) => {
                let texture = self.textures.insert_image(
                    &label,
                    [image.width, image.height],
                    image.pixels,
                    image.hash,
                );
                self.set_target_texture(texture, None);
            }
            Ok(DecodedMedia::Video {
                stream,
                first_frame,
            }) => {
                let texture = self.textures.create_video(&label, stream.size());
                self.textures.write_frame(texture, first_frame);
                self.set_target_texture(texture, Some(stream));
            }
            Err(err) => {
                log::warn!("Retexture request {} failed: {}", completion.request_id, err);
                return;
            }
        }
        log::info!(
            "Target retextured from {} (request {})",
            label,
            completion.request_id
        );
    }

    /// Show `texture` on the target and free whatever texture it replaces.
    /// Replacing the active video drops its stream, which stops ffmpeg.
    fn set_target_texture(&mut self, texture: TextureId, stream: Option<VideoStream>) {
        self.video = stream.map(|stream| ActiveVideo {
            texture,
            stream: Some(stream),
        });
        let target = self.scene.target_mut();
        if let Some(previous) = target.appearance.texture().filter(|id| *id != texture) {
            self.textures.remove(previous);
        }
        target.appearance = Appearance::textured(texture);
    }

    fn pump_video(&mut self) {
        let Some(video) = &mut self.video else {
            return;
        };
        let Some(stream) = &mut video.stream else {
            return;
        };
        if let Some(frame) = stream.latest_frame() {
            self.textures.write_frame(video.texture, frame);
        }
        if stream.has_ended() {
            video.stream = None;
        }
    }

    /// Set by a click or Escape; the window layer grabs or releases the cursor.
    pub fn take_lock_request(&mut self) -> Option<bool> {
        self.lock_request.take()
    }

    pub fn set_pointer_locked(&mut self, locked: bool) {
        self.pointer_locked = locked;
    }

    pub fn set_viewport(&mut self, width: f32, height: f32) {
        self.viewport = Vec2::new(width, height);
    }

    pub fn viewport(&self) -> Vec2 {
        self.viewport
    }

    pub fn camera(&self) -> &CameraController {
        &self.camera
    }

    pub fn scene(&self) -> &SceneGraph {
        &self.scene
    }

    pub fn textures(&self) -> &TextureStore {
        &self.textures
    }

    pub fn settings(&self) -> &ViewerSettings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut ViewerSettings {
        &mut self.settings
    }

    pub fn pointer(&self) -> &PointerState {
        &self.pointer
    }

    pub fn highlighted(&self) -> Option<ObjectId> {
        self.highlighted
    }

    pub fn is_loading(&self) -> bool {
        self.model_loader.as_ref().is_some_and(AssetLoader::is_pending) || self.media.in_flight() > 0
    }

    /// Model rotation offsets, or the pending ones before the model loads.
    pub fn model_rotation(&self) -> Vec3 {
        self.scene
            .model()
            .map(|model| model.rotation)
            .unwrap_or(self.pending_rotation)
    }

    pub fn set_model_rotation(&mut self, rotation: Vec3) {
        let rotation = Vec3::new(wrap_pi(rotation.x), wrap_pi(rotation.y), wrap_pi(rotation.z));
        match self.scene.model_mut() {
            Some(model) => model.rotation = rotation,
            None => self.pending_rotation = rotation,
        }
    }

    /// Apply settings loaded from a file.
    pub fn apply_config(&mut self, config: &ViewerConfig) {
        self.settings = ViewerSettings::from_config(config);
        let [rx, ry, rz] = config.rotation;
        self.set_model_rotation(Vec3::new(rx, ry, rz));
    }

    /// Current panel values merged over `base`.
    pub fn snapshot_config(&self, base: &ViewerConfig) -> ViewerConfig {
        let rotation = self.model_rotation();
        ViewerConfig {
            lights: self.settings.lights,
            highlight: self.settings.highlight,
            animate: self.settings.animate,
            rotation: rotation.to_array(),
            ..base.clone()
        }
    }
}

fn wrap_pi(angle: f32) -> f32 {
    use std::f32::consts::PI;
    if !angle.is_finite() {
        return 0.0;
    }
    if (-PI..=PI).contains(&angle) {
        return angle;
    }
    (angle + PI).rem_euclid(2.0 * PI) - PI
}
