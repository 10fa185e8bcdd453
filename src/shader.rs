use bytemuck::{Pod, Zeroable};

use crate::error::UniformError;
use crate::scene::POINT_LIGHT_COUNT;
use crate::uniforms::{PathSegment, UniformBlock, UniformPath, UniformValue};

#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct MaterialBlock {
    pub diffuse: i32,
    pub specular: i32,
    pub glossiness: f32,
    _pad: f32,
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct DirectionalLightBlock {
    pub direction: [f32; 3],
    _pad0: f32,
    pub ambient: [f32; 3],
    _pad1: f32,
    pub diffuse: [f32; 3],
    _pad2: f32,
    pub specular: [f32; 3],
    _pad3: f32,
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct PointLightBlock {
    pub position: [f32; 3],
    pub constant: f32,
    pub ambient: [f32; 3],
    pub linear: f32,
    pub diffuse: [f32; 3],
    pub quadratic: f32,
    pub specular: [f32; 3],
    _pad: f32,
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct SpotLightBlock {
    pub position: [f32; 3],
    pub inner_cutoff: f32,
    pub direction: [f32; 3],
    pub outer_cutoff: f32,
    pub ambient: [f32; 3],
    _pad0: f32,
    pub diffuse: [f32; 3],
    _pad1: f32,
    pub specular: [f32; 3],
    _pad2: f32,
}

/// std140 mirror of the `Lighting` uniform struct in [`LIGHTING_SHADER`].
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct LightingBlock {
    pub model: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
    pub projection: [[f32; 4]; 4],
    pub view_pos: [f32; 3],
    _pad: f32,
    pub material: MaterialBlock,
    pub directional_light: DirectionalLightBlock,
    pub point_lights: [PointLightBlock; POINT_LIGHT_COUNT],
    pub spot_light: SpotLightBlock,
}

fn unknown(path: &UniformPath<'_>) -> UniformError {
    UniformError::Unknown(path.name().to_string())
}

impl UniformBlock for LightingBlock {
    const LABEL: &'static str = "lighting";

    fn apply(&mut self, path: &UniformPath<'_>, value: UniformValue) -> Result<(), UniformError> {
        use PathSegment::{Field, Index};

        let name = path.name();
        match path.segments() {
            [Field("model")] => self.model = value.as_mat4(name)?,
            [Field("view")] => self.view = value.as_mat4(name)?,
            [Field("projection")] => self.projection = value.as_mat4(name)?,
            [Field("viewPos")] => self.view_pos = value.as_vec3(name)?,
            [Field("material"), Field(member)] => {
                let material = &mut self.material;
                match *member {
                    "diffuse" => material.diffuse = value.as_int(name)?,
                    "specular" => material.specular = value.as_int(name)?,
                    "glossiness" => material.glossiness = value.as_float(name)?,
                    _ => return Err(unknown(path)),
                }
            }
            [Field("directionalLight"), Field(member)] => {
                let light = &mut self.directional_light;
                let slot = match *member {
                    "direction" => &mut light.direction,
                    "ambient" => &mut light.ambient,
                    "diffuse" => &mut light.diffuse,
                    "specular" => &mut light.specular,
                    _ => return Err(unknown(path)),
                };
                *slot = value.as_vec3(name)?;
            }
            [Field("pointLights"), Index(index), Field(member)] => {
                let light = self.point_lights.get_mut(*index).ok_or_else(|| {
                    UniformError::IndexOutOfRange {
                        name: name.to_string(),
                        index: *index,
                    }
                })?;
                match *member {
                    "position" => light.position = value.as_vec3(name)?,
                    "ambient" => light.ambient = value.as_vec3(name)?,
                    "diffuse" => light.diffuse = value.as_vec3(name)?,
                    "specular" => light.specular = value.as_vec3(name)?,
                    "constant" => light.constant = value.as_float(name)?,
                    "linear" => light.linear = value.as_float(name)?,
                    "quadratic" => light.quadratic = value.as_float(name)?,
                    _ => return Err(unknown(path)),
                }
            }
            [Field("spotLight"), Field(member)] => {
                let light = &mut self.spot_light;
                match *member {
                    "position" => light.position = value.as_vec3(name)?,
                    "direction" => light.direction = value.as_vec3(name)?,
                    "ambient" => light.ambient = value.as_vec3(name)?,
                    "diffuse" => light.diffuse = value.as_vec3(name)?,
                    "specular" => light.specular = value.as_vec3(name)?,
                    "innerCutoff" => light.inner_cutoff = value.as_float(name)?,
                    "outerCutoff" => light.outer_cutoff = value.as_float(name)?,
                    _ => return Err(unknown(path)),
                }
            }
            _ => return Err(unknown(path)),
        }
        Ok(())
    }
}

/// Texture unit selection for the quad shader.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct QuadBlock {
    pub texture_base: i32,
    pub texture_overlay: i32,
    _pad: [f32; 2],
}

impl UniformBlock for QuadBlock {
    const LABEL: &'static str = "quad";

    fn apply(&mut self, path: &UniformPath<'_>, value: UniformValue) -> Result<(), UniformError> {
        let name = path.name();
        match path.segments() {
            [PathSegment::Field("textureBase")] => self.texture_base = value.as_int(name)?,
            [PathSegment::Field("textureOverlay")] => self.texture_overlay = value.as_int(name)?,
            _ => return Err(unknown(path)),
        }
        Ok(())
    }
}

/// Both shaders read two textures at bindings 0 and 1 of group 1, which stand
/// in for texture units 0 and 1. Clip-space depth is remapped from the GL
/// [-1, 1] range to the [0, 1] range wgpu expects.
pub const LIGHTING_SHADER: &str = r#"
struct Material {
    diffuse: i32,
    specular: i32,
    glossiness: f32,
    _pad: f32,
}

struct DirectionalLight {
    direction: vec3<f32>,
    ambient: vec3<f32>,
    diffuse: vec3<f32>,
    specular: vec3<f32>,
}

struct PointLight {
    position: vec3<f32>,
    constant_term: f32,
    ambient: vec3<f32>,
    linear_term: f32,
    diffuse: vec3<f32>,
    quadratic_term: f32,
    specular: vec3<f32>,
}

struct SpotLight {
    position: vec3<f32>,
    inner_cutoff: f32,
    direction: vec3<f32>,
    outer_cutoff: f32,
    ambient: vec3<f32>,
    diffuse: vec3<f32>,
    specular: vec3<f32>,
}

struct Lighting {
    model: mat4x4<f32>,
    view: mat4x4<f32>,
    projection: mat4x4<f32>,
    view_pos: vec3<f32>,
    _pad: f32,
    material: Material,
    directional_light: DirectionalLight,
    point_lights: array<PointLight, 4>,
    spot_light: SpotLight,
}

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
}

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_pos: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
}

@group(0) @binding(0)
var<uniform> u: Lighting;

@group(1) @binding(0)
var texture_unit0: texture_2d<f32>;
@group(1) @binding(1)
var texture_unit1: texture_2d<f32>;
@group(1) @binding(2)
var texture_sampler: sampler;

@vertex
fn vs_main(input: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    let world = u.model * vec4<f32>(input.position, 1.0);
    var clip = u.projection * u.view * world;
    clip.z = (clip.z + clip.w) * 0.5;
    out.clip_position = clip;
    out.world_pos = world.xyz;
    let normal_matrix = mat3x3<f32>(u.model[0].xyz, u.model[1].xyz, u.model[2].xyz);
    out.normal = normal_matrix * input.normal;
    out.uv = input.uv;
    return out;
}

fn sample_unit(unit: i32, uv: vec2<f32>) -> vec3<f32> {
    let unit0 = textureSample(texture_unit0, texture_sampler, uv);
    let unit1 = textureSample(texture_unit1, texture_sampler, uv);
    return select(unit0, unit1, unit == 1).rgb;
}

fn specular_factor(light_dir: vec3<f32>, normal: vec3<f32>, view_dir: vec3<f32>) -> f32 {
    let reflect_dir = reflect(-light_dir, normal);
    return pow(max(dot(view_dir, reflect_dir), 0.0), u.material.glossiness);
}

fn directional_contribution(light: DirectionalLight, normal: vec3<f32>, view_dir: vec3<f32>, albedo: vec3<f32>, gloss: vec3<f32>) -> vec3<f32> {
    let light_dir = normalize(-light.direction);
    let diff = max(dot(normal, light_dir), 0.0);
    let highlight = specular_factor(light_dir, normal, view_dir);
    return light.ambient * albedo + light.diffuse * diff * albedo + light.specular * highlight * gloss;
}

fn point_contribution(light: PointLight, normal: vec3<f32>, frag_pos: vec3<f32>, view_dir: vec3<f32>, albedo: vec3<f32>, gloss: vec3<f32>) -> vec3<f32> {
    let light_dir = normalize(light.position - frag_pos);
    let diff = max(dot(normal, light_dir), 0.0);
    let highlight = specular_factor(light_dir, normal, view_dir);
    let dist = length(light.position - frag_pos);
    let attenuation = 1.0 / (light.constant_term + light.linear_term * dist + light.quadratic_term * dist * dist);
    return attenuation * (light.ambient * albedo + light.diffuse * diff * albedo + light.specular * highlight * gloss);
}

fn spot_contribution(light: SpotLight, normal: vec3<f32>, frag_pos: vec3<f32>, view_dir: vec3<f32>, albedo: vec3<f32>, gloss: vec3<f32>) -> vec3<f32> {
    let light_dir = normalize(light.position - frag_pos);
    let diff = max(dot(normal, light_dir), 0.0);
    let highlight = specular_factor(light_dir, normal, view_dir);
    let theta = dot(light_dir, normalize(-light.direction));
    let epsilon = light.inner_cutoff - light.outer_cutoff;
    let intensity = clamp((theta - light.outer_cutoff) / epsilon, 0.0, 1.0);
    return light.ambient * albedo + intensity * (light.diffuse * diff * albedo + light.specular * highlight * gloss);
}

@fragment
fn fs_main(input: VertexOutput) -> @location(0) vec4<f32> {
    let normal = normalize(input.normal);
    let view_dir = normalize(u.view_pos - input.world_pos);
    let albedo = sample_unit(u.material.diffuse, input.uv);
    let gloss = sample_unit(u.material.specular, input.uv);

    var color = directional_contribution(u.directional_light, normal, view_dir, albedo, gloss);
    for (var i = 0u; i < 4u; i++) {
        color += point_contribution(u.point_lights[i], normal, input.world_pos, view_dir, albedo, gloss);
    }
    color += spot_contribution(u.spot_light, normal, input.world_pos, view_dir, albedo, gloss);
    return vec4<f32>(color, 1.0);
}
"#;

pub const QUAD_SHADER: &str = r#"
struct Quad {
    texture_base: i32,
    texture_overlay: i32,
    _pad: vec2<f32>,
}

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) color: vec3<f32>,
    @location(2) uv: vec2<f32>,
}

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) color: vec3<f32>,
    @location(1) uv: vec2<f32>,
}

@group(0) @binding(0)
var<uniform> u: Quad;

@group(1) @binding(0)
var texture_unit0: texture_2d<f32>;
@group(1) @binding(1)
var texture_unit1: texture_2d<f32>;
@group(1) @binding(2)
var texture_sampler: sampler;

@vertex
fn vs_main(input: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    out.clip_position = vec4<f32>(input.position, 1.0);
    out.color = input.color;
    out.uv = input.uv;
    return out;
}

fn sample_unit(unit: i32, uv: vec2<f32>) -> vec4<f32> {
    let unit0 = textureSample(texture_unit0, texture_sampler, uv);
    let unit1 = textureSample(texture_unit1, texture_sampler, uv);
    return select(unit0, unit1, unit == 1);
}

@fragment
fn fs_main(input: VertexOutput) -> @location(0) vec4<f32> {
    let base = sample_unit(u.texture_base, input.uv);
    let overlay = sample_unit(u.texture_overlay, input.uv);
    let color = mix(base.rgb, overlay.rgb, overlay.a);
    return vec4<f32>(color * input.color, 1.0);
}
"#;

#[cfg(test)]
mod tests {
    use std::mem::{offset_of, size_of};

    use glam::{Mat4, Vec3};

    use super::*;

    #[test]
    fn lighting_block_matches_wgsl_layout() {
        assert_eq!(size_of::<MaterialBlock>(), 16);
        assert_eq!(size_of::<DirectionalLightBlock>(), 64);
        assert_eq!(size_of::<PointLightBlock>(), 64);
        assert_eq!(size_of::<SpotLightBlock>(), 80);

        assert_eq!(offset_of!(LightingBlock, view_pos), 192);
        assert_eq!(offset_of!(LightingBlock, material), 208);
        assert_eq!(offset_of!(LightingBlock, directional_light), 224);
        assert_eq!(offset_of!(LightingBlock, point_lights), 288);
        assert_eq!(offset_of!(LightingBlock, spot_light), 544);
        assert_eq!(size_of::<LightingBlock>(), 624);
        assert_eq!(size_of::<QuadBlock>(), 16);
    }

    #[test]
    fn shader_array_matches_point_light_count() {
        let declaration = format!("array<PointLight, {POINT_LIGHT_COUNT}>");
        assert!(LIGHTING_SHADER.contains(&declaration));
    }

    #[test]
    fn applies_named_uniforms() {
        let mut block = LightingBlock::default();
        block
            .set("pointLights[2].specular", UniformValue::Vec3(Vec3::new(0.25, 0.5, 1.0)))
            .unwrap();
        block.set("pointLights[2].quadratic", UniformValue::Float(0.07)).unwrap();
        block.set("material.glossiness", UniformValue::Float(24.0)).unwrap();
        block.set("spotLight.innerCutoff", UniformValue::Float(0.99)).unwrap();
        block
            .set("model", UniformValue::Mat4(Mat4::from_translation(Vec3::X)))
            .unwrap();

        assert_eq!(block.point_lights[2].specular, [0.25, 0.5, 1.0]);
        assert_eq!(block.point_lights[2].quadratic, 0.07);
        assert_eq!(block.material.glossiness, 24.0);
        assert_eq!(block.spot_light.inner_cutoff, 0.99);
        assert_eq!(block.model[3], [1.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn rejects_bad_uniforms() {
        let mut block = LightingBlock::default();
        assert!(matches!(
            block.set("pointLights[4].position", UniformValue::Vec3(Vec3::ZERO)),
            Err(UniformError::IndexOutOfRange { index: 4, .. })
        ));
        assert!(matches!(
            block.set("material.roughness", UniformValue::Float(1.0)),
            Err(UniformError::Unknown(_))
        ));
        assert!(matches!(
            block.set("viewPos", UniformValue::Float(1.0)),
            Err(UniformError::KindMismatch { .. })
        ));

        let mut quad = QuadBlock::default();
        quad.set("textureOverlay", UniformValue::Int(1)).unwrap();
        assert_eq!(quad.texture_overlay, 1);
        assert!(quad.set("view", UniformValue::Int(1)).is_err());
    }
}
