use glam::{Mat4, Vec3};

use crate::camera::OrbitCamera;
use crate::context::RenderContext;
use crate::scene::{Attenuation, DirectionalLight, Material, PointLight, SpotLight, POINT_LIGHTS};
use crate::uniforms::UniformSink;

/// Everything the lighting shader needs for one frame, apart from the
/// per-instance model matrix.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameUniforms {
    pub view: Mat4,
    pub projection: Mat4,
    pub camera_position: Vec3,
    pub material: Material,
    pub directional_light: DirectionalLight,
    pub point_lights: Vec<PointLight>,
    pub attenuation: Attenuation,
    pub spot_light: SpotLight,
}

impl FrameUniforms {
    pub fn compute(elapsed: f32, ctx: &RenderContext) -> Self {
        Self::with_camera(&OrbitCamera::DEFAULT, elapsed, ctx)
    }

    pub fn with_camera(camera: &OrbitCamera, elapsed: f32, ctx: &RenderContext) -> Self {
        let camera_position = camera.position(elapsed);
        Self {
            view: camera.view(elapsed),
            projection: ctx.projection_matrix(),
            camera_position,
            material: Material::CONTAINER,
            directional_light: DirectionalLight::SCENE,
            point_lights: POINT_LIGHTS.to_vec(),
            attenuation: Attenuation::POINT,
            spot_light: SpotLight::following(camera_position),
        }
    }

    /// Sends every uniform, static ones included. Returns the number of
    /// point lights written.
    pub fn push<S: UniformSink + ?Sized>(&self, sink: &mut S) -> usize {
        sink.set_mat4("view", self.view);
        sink.set_mat4("projection", self.projection);
        sink.set_vec3("viewPos", self.camera_position);

        sink.set_int("material.diffuse", self.material.diffuse_unit);
        sink.set_int("material.specular", self.material.specular_unit);
        sink.set_float("material.glossiness", self.material.glossiness);

        let directional = &self.directional_light;
        sink.set_vec3("directionalLight.direction", directional.direction);
        sink.set_vec3("directionalLight.ambient", directional.ambient);
        sink.set_vec3("directionalLight.diffuse", directional.diffuse);
        sink.set_vec3("directionalLight.specular", directional.specular);

        for (index, light) in self.point_lights.iter().enumerate() {
            let prefix = format!("pointLights[{index}]");
            sink.set_vec3(&format!("{prefix}.position"), light.position);
            sink.set_float(&format!("{prefix}.constant"), self.attenuation.constant);
            sink.set_float(&format!("{prefix}.linear"), self.attenuation.linear);
            sink.set_float(&format!("{prefix}.quadratic"), self.attenuation.quadratic);
            sink.set_vec3(&format!("{prefix}.ambient"), Vec3::ZERO);
            sink.set_vec3(&format!("{prefix}.diffuse"), light.color);
            sink.set_vec3(&format!("{prefix}.specular"), light.color);
        }

        let spot = &self.spot_light;
        sink.set_vec3("spotLight.position", spot.position);
        sink.set_vec3("spotLight.direction", spot.direction);
        sink.set_float("spotLight.innerCutoff", spot.inner_cutoff);
        sink.set_float("spotLight.outerCutoff", spot.outer_cutoff);
        sink.set_vec3("spotLight.ambient", spot.ambient);
        sink.set_vec3("spotLight.diffuse", spot.diffuse);
        sink.set_vec3("spotLight.specular", spot.specular);

        self.point_lights.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::POINT_LIGHT_COUNT;
    use crate::shader::LightingBlock;
    use crate::uniforms::{UniformBlock, UniformRecorder, UniformValue};

    fn ctx() -> RenderContext {
        RenderContext::new(1280, 720)
    }

    #[test]
    fn spotlight_follows_camera_every_frame() {
        let mut recorder = UniformRecorder::new();
        for step in 0..50 {
            let t = step as f32 * 0.37;
            FrameUniforms::compute(t, &ctx()).push(&mut recorder);
            let Some(UniformValue::Vec3(camera)) = recorder.get("viewPos") else {
                panic!("viewPos missing");
            };
            assert_eq!(recorder.get("spotLight.position"), Some(UniformValue::Vec3(camera)));
            assert_eq!(recorder.get("spotLight.direction"), Some(UniformValue::Vec3(-camera)));
        }
    }

    #[test]
    fn point_lights_and_attenuation_are_constant() {
        let mut recorder = UniformRecorder::new();
        for step in 0..20 {
            recorder.clear_log();
            let pushed = FrameUniforms::compute(step as f32, &ctx()).push(&mut recorder);
            assert_eq!(pushed, POINT_LIGHT_COUNT);
            assert_eq!(recorder.indices_of("pointLights").len(), POINT_LIGHT_COUNT);
            for index in 0..POINT_LIGHT_COUNT {
                let get = |member: &str| recorder.get(&format!("pointLights[{index}].{member}"));
                assert_eq!(get("constant"), Some(UniformValue::Float(1.0)));
                assert_eq!(get("linear"), Some(UniformValue::Float(0.14)));
                assert_eq!(get("quadratic"), Some(UniformValue::Float(0.07)));
                assert_eq!(get("ambient"), Some(UniformValue::Vec3(Vec3::ZERO)));
                assert_eq!(get("diffuse"), get("specular"));
            }
        }
    }

    #[test]
    fn every_name_is_accepted_by_the_lighting_block() {
        let mut recorder = UniformRecorder::new();
        FrameUniforms::compute(1.25, &ctx()).push(&mut recorder);
        let mut block = LightingBlock::default();
        for (name, value) in recorder.log() {
            block.set(name, *value).unwrap();
        }
        assert_eq!(block.point_lights[3].diffuse, [1.0, 1.0, 1.0]);
        assert_eq!(block.material.specular, 1);
        assert_eq!(block.projection, ctx().projection_matrix().to_cols_array_2d());
    }
}
