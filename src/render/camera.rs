use crate::render::pick::Ray;
use glam::{Mat4, Vec2, Vec3, Vec4};

pub const FOV_Y_DEG: f32 = 75.0;
pub const NEAR: f32 = 0.1;
pub const FAR: f32 = 1000.0;

const PITCH_LIMIT: f32 = std::f32::consts::FRAC_PI_2 - 1e-3;

/// First-person camera. Yaw 0 looks down -Z; positive yaw turns left.
#[derive(Debug, Clone, Copy)]
pub struct CameraController {
    pub position: Vec3,
    pub yaw: f32,
    pub pitch: f32,
}

impl CameraController {
    pub fn new(position: Vec3, yaw: f32, pitch: f32) -> Self {
        Self {
            position,
            yaw,
            pitch,
        }
    }

    /// Back the camera off along +Z far enough to fit a sphere of `radius`,
    /// keeping the current orientation.
    pub fn frame_radius(&mut self, radius: f32) {
        let half_fov = (FOV_Y_DEG * 0.5).to_radians();
        let distance = radius / half_fov.tan();
        self.position = Vec3::new(0.0, 5.0, distance * 0.7);
    }

    pub fn forward(&self) -> Vec3 {
        let cos_pitch = self.pitch.cos();
        Vec3::new(
            -self.yaw.sin() * cos_pitch,
            self.pitch.sin(),
            -self.yaw.cos() * cos_pitch,
        )
    }

    /// Forward direction flattened onto the ground plane.
    pub fn forward_horizontal(&self) -> Vec3 {
        Vec3::new(-self.yaw.sin(), 0.0, -self.yaw.cos())
    }

    pub fn right_horizontal(&self) -> Vec3 {
        Vec3::new(self.yaw.cos(), 0.0, -self.yaw.sin())
    }

    /// Translate in the ground plane relative to the current yaw. Pitch is ignored.
    pub fn move_horizontal(&mut self, right: f32, forward: f32) {
        self.position += self.right_horizontal() * right + self.forward_horizontal() * forward;
    }

    pub fn turn(&mut self, yaw_delta: f32, pitch_delta: f32) {
        self.yaw += yaw_delta;
        self.pitch = (self.pitch + pitch_delta).clamp(-PITCH_LIMIT, PITCH_LIMIT);
        wrap_angle(&mut self.yaw);
    }

    pub fn view(&self) -> Mat4 {
        Mat4::look_to_rh(self.position, self.forward(), Vec3::Y)
    }

    pub fn projection(&self, aspect: f32) -> Mat4 {
        let aspect = if aspect.is_finite() && aspect > 0.0 {
            aspect
        } else {
            1.0
        };
        Mat4::perspective_rh(FOV_Y_DEG.to_radians(), aspect, NEAR, FAR)
    }

    pub fn view_projection(&self, aspect: f32) -> Mat4 {
        self.projection(aspect) * self.view()
    }

    /// Ray from the camera through a pointer position given in viewport pixels
    /// (top-left origin). `None` for an empty viewport.
    pub fn ray_through(&self, pointer: Vec2, viewport: Vec2) -> Option<Ray> {
        if viewport.x <= 0.0 || viewport.y <= 0.0 {
            return None;
        }
        let ndc_x = (pointer.x / viewport.x) * 2.0 - 1.0;
        let ndc_y = -(pointer.y / viewport.y) * 2.0 + 1.0;
        let inverse = self.view_projection(viewport.x / viewport.y).inverse();
        let far = inverse * Vec4::new(ndc_x, ndc_y, 1.0, 1.0);
        if far.w.abs() < f32::EPSILON {
            return None;
        }
        let far = far.truncate() / far.w;
        let direction = (far - self.position).normalize_or_zero();
        if direction == Vec3::ZERO {
            return None;
        }
        Some(Ray::new(self.position, direction))
    }
}

fn wrap_angle(angle: &mut f32) {
    const TWO_PI: f32 = std::f32::consts::PI * 2.0;
    if angle.is_finite() {
        *angle = (*angle + std::f32::consts::PI).rem_euclid(TWO_PI) - std::f32::consts::PI;
    }
}

#[cfg(test)]
mod tests {
    use super::CameraController;
    use glam::{Vec2, Vec3};

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-4
    }

    #[test]
    fn default_orientation_looks_down_negative_z() {
        let camera = CameraController::new(Vec3::ZERO, 0.0, 0.0);
        assert!(approx(camera.forward(), Vec3::NEG_Z));
        assert!(approx(camera.right_horizontal(), Vec3::X));
    }

    #[test]
    fn horizontal_movement_ignores_pitch() {
        let mut camera = CameraController::new(Vec3::ZERO, 0.0, 0.8);
        camera.move_horizontal(0.0, 10.0);
        assert!(approx(camera.position, Vec3::new(0.0, 0.0, -10.0)));
    }

    #[test]
    fn pitch_is_clamped() {
        let mut camera = CameraController::new(Vec3::ZERO, 0.0, 0.0);
        camera.turn(0.0, 10.0);
        assert!(camera.pitch < std::f32::consts::FRAC_PI_2);
        assert!(camera.forward().is_finite());
    }

    #[test]
    fn yaw_wraps_into_range() {
        let mut camera = CameraController::new(Vec3::ZERO, 3.0, 0.0);
        camera.turn(1.0, 0.0);
        assert!(camera.yaw >= -std::f32::consts::PI && camera.yaw <= std::f32::consts::PI);
    }

    #[test]
    fn center_ray_matches_forward() {
        let camera = CameraController::new(Vec3::new(1.0, 2.0, 3.0), 0.4, -0.2);
        let ray = camera
            .ray_through(Vec2::new(400.0, 300.0), Vec2::new(800.0, 600.0))
            .unwrap();
        assert!(approx(ray.origin, camera.position));
        assert!(approx(ray.direction, camera.forward()));
    }

    #[test]
    fn empty_viewport_has_no_ray() {
        let camera = CameraController::new(Vec3::ZERO, 0.0, 0.0);
        assert!(camera.ray_through(Vec2::ZERO, Vec2::ZERO).is_none());
    }

    #[test]
    fn framing_uses_bounding_radius() {
        let mut camera = CameraController::new(Vec3::ZERO, 0.0, 0.0);
        camera.frame_radius(10.0);
        let expected = 10.0 / (37.5f32).to_radians().tan() * 0.7;
        assert!(approx(camera.position, Vec3::new(0.0, 5.0, expected)));
    }
}
