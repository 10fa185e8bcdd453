use glam::{Mat4, Vec3};

/// World positions of the ten container cubes.
pub const CUBE_POSITIONS: [Vec3; 10] = [
    Vec3::new(-2.0, 0.0, -3.0),
    Vec3::new(2.0, 0.0, -3.0),
    Vec3::new(2.0, -2.0, 3.0),
    Vec3::new(2.0, -2.5, -3.0),
    Vec3::new(-2.0, 3.0, -4.0),
    Vec3::new(-1.0, 1.0, -5.0),
    Vec3::new(1.0, -1.0, -6.0),
    Vec3::new(-2.0, 3.5, -7.0),
    Vec3::new(-2.0, -1.0, -10.0),
    Vec3::new(0.0, 0.0, -1.0),
];

const INSTANCE_ROTATION_AXIS: Vec3 = Vec3::new(1.0, 0.3, 0.5);
const INSTANCE_ROTATION_STEP_DEGREES: f32 = 20.0;

/// Model matrix for the cube at `index`: translated to its position and
/// rotated by 20° per index around a fixed tilted axis.
pub fn instance_transform(index: usize, position: Vec3) -> Mat4 {
    let angle = (INSTANCE_ROTATION_STEP_DEGREES * index as f32).to_radians();
    Mat4::from_translation(position)
        * Mat4::from_axis_angle(INSTANCE_ROTATION_AXIS.normalize(), angle)
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointLight {
    pub position: Vec3,
    pub color: Vec3,
}

/// Must match the `pointLights` array length declared by the lighting shader.
pub const POINT_LIGHT_COUNT: usize = 4;

pub const POINT_LIGHTS: [PointLight; POINT_LIGHT_COUNT] = [
    PointLight {
        position: Vec3::new(0.7, 0.2, 2.0),
        color: Vec3::new(1.0, 0.25, 0.25),
    },
    PointLight {
        position: Vec3::new(2.3, -3.3, -4.0),
        color: Vec3::new(0.25, 1.0, 0.25),
    },
    PointLight {
        position: Vec3::new(-4.0, 2.0, -12.0),
        color: Vec3::new(0.25, 0.5, 1.0),
    },
    PointLight {
        position: Vec3::new(0.0, 0.0, -3.0),
        color: Vec3::new(1.0, 1.0, 1.0),
    },
];

/// Distance falloff terms: `1 / (constant + linear·d + quadratic·d²)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Attenuation {
    pub constant: f32,
    pub linear: f32,
    pub quadratic: f32,
}

impl Attenuation {
    pub const POINT: Self = Self {
        constant: 1.0,
        linear: 0.14,
        quadratic: 0.07,
    };
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DirectionalLight {
    pub direction: Vec3,
    pub ambient: Vec3,
    pub diffuse: Vec3,
    pub specular: Vec3,
}

impl DirectionalLight {
    pub const SCENE: Self = Self {
        direction: Vec3::new(-0.2, -1.0, -0.3),
        ambient: Vec3::splat(0.08),
        diffuse: Vec3::splat(0.5),
        specular: Vec3::splat(0.5),
    };
}

/// Flashlight attached to the camera.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpotLight {
    pub position: Vec3,
    pub direction: Vec3,
    /// Cosine of the inner cone angle.
    pub inner_cutoff: f32,
    /// Cosine of the outer cone angle.
    pub outer_cutoff: f32,
    pub ambient: Vec3,
    pub diffuse: Vec3,
    pub specular: Vec3,
}

impl SpotLight {
    pub const INNER_CUTOFF_DEGREES: f32 = 5.0;
    pub const OUTER_CUTOFF_DEGREES: f32 = 10.0;

    /// Spotlight placed at the camera and aimed at the origin.
    pub fn following(camera_position: Vec3) -> Self {
        Self {
            position: camera_position,
            direction: -camera_position,
            inner_cutoff: Self::INNER_CUTOFF_DEGREES.to_radians().cos(),
            outer_cutoff: Self::OUTER_CUTOFF_DEGREES.to_radians().cos(),
            ambient: Vec3::ZERO,
            diffuse: Vec3::splat(0.7),
            specular: Vec3::splat(0.7),
        }
    }
}

/// Texture units and shininess of the container material.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Material {
    pub diffuse_unit: i32,
    pub specular_unit: i32,
    pub glossiness: f32,
}

impl Material {
    pub const CONTAINER: Self = Self {
        diffuse_unit: 0,
        specular_unit: 1,
        glossiness: 24.0,
    };
}
