use glam::{Mat4, Vec3};

/// Camera that circles the origin in the XZ plane at a fixed radius and speed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OrbitCamera {
    pub radius: f32,
    pub angular_speed: f32,
}

impl OrbitCamera {
    pub const DEFAULT: Self = Self {
        radius: 3.0,
        angular_speed: 0.75,
    };

    /// Camera position after `elapsed` seconds.
    pub fn position(&self, elapsed: f32) -> Vec3 {
        let angle = elapsed * self.angular_speed;
        Vec3::new(angle.sin() * self.radius, 0.0, angle.cos() * self.radius)
    }

    /// View matrix looking from the orbit position at the origin with +Y up.
    pub fn view(&self, elapsed: f32) -> Mat4 {
        Mat4::look_at_rh(self.position(elapsed), Vec3::ZERO, Vec3::Y)
    }
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Perspective projection whose aspect ratio follows the framebuffer size.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Projection {
    pub fov_y_degrees: f32,
    pub near: f32,
    pub far: f32,
    aspect: f32,
}

impl Projection {
    pub const FOV_Y_DEGREES: f32 = 50.0;
    pub const NEAR: f32 = 0.1;
    pub const FAR: f32 = 100.0;

    pub fn new(width: u32, height: u32) -> Self {
        let mut projection = Self {
            fov_y_degrees: Self::FOV_Y_DEGREES,
            near: Self::NEAR,
            far: Self::FAR,
            aspect: 1.0,
        };
        projection.resize(width, height);
        projection
    }

    /// Recomputes the aspect ratio. Zero-area sizes (minimised windows) keep
    /// the previous value.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.aspect = width as f32 / height as f32;
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    pub fn matrix(&self) -> Mat4 {
        Mat4::perspective_rh_gl(
            self.fov_y_degrees.to_radians(),
            self.aspect,
            self.near,
            self.far,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-4;

    #[test]
    fn orbit_stays_on_circle() {
        let camera = OrbitCamera::default();
        for step in 0..200 {
            let t = step as f32 * 0.173;
            let position = camera.position(t);
            assert_eq!(position.y, 0.0);
            let radius_sq = position.x * position.x + position.z * position.z;
            assert!((radius_sq - 9.0).abs() < EPSILON, "t={t} r²={radius_sq}");
        }
    }

    #[test]
    fn orbit_starts_on_positive_z() {
        let camera = OrbitCamera::default();
        assert!(camera.position(0.0).abs_diff_eq(Vec3::new(0.0, 0.0, 3.0), EPSILON));
    }

    #[test]
    fn resize_only_changes_aspect() {
        let mut projection = Projection::new(1280, 720);
        projection.resize(1024, 256);
        assert!((projection.aspect() - 4.0).abs() < EPSILON);
        assert_eq!(projection.fov_y_degrees, Projection::FOV_Y_DEGREES);
        assert_eq!(projection.near, Projection::NEAR);
        assert_eq!(projection.far, Projection::FAR);

        // x scale is f / aspect while y scale is f
        let matrix = projection.matrix();
        let aspect_term = matrix.y_axis.y / matrix.x_axis.x;
        assert!((aspect_term - 4.0).abs() < EPSILON);
    }

    #[test]
    fn zero_height_is_ignored() {
        let mut projection = Projection::new(800, 800);
        projection.resize(800, 0);
        assert_eq!(projection.aspect(), 1.0);
    }
}
