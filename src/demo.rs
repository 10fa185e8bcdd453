//! The two programs: a lit, textured cube field and a single textured quad.

use crate::config::DemoConfig;
use crate::context::RenderContext;
use crate::lighting::FrameUniforms;
use crate::render::{RenderBackend, StaticScene};
use crate::scene::{instance_transform, CUBE_POSITIONS};
use crate::shader::{LightingBlock, QuadBlock, LIGHTING_SHADER, QUAD_SHADER};
use crate::texture::DecodeOptions;
use crate::uniforms::{UniformBlock, UniformSink};
use crate::vertex::{ColoredVertex, LitVertex, CUBE_VERTICES, QUAD_INDICES, QUAD_VERTICES};

/// A demo program driven by the render loop.
pub trait Demo {
    /// Uniform layout expected by [`Demo::SHADER`].
    type Block: UniformBlock;

    const SHADER: &'static str;

    fn config(&self) -> DemoConfig;

    /// Geometry and textures uploaded once before the first frame.
    fn scene(&self, config: &DemoConfig) -> StaticScene;

    /// Pushes the uniforms shared by every draw call of the frame. Returns
    /// the number of point lights written.
    fn update(&self, elapsed: f32, ctx: &RenderContext, uniforms: &mut dyn UniformSink) -> usize;

    /// Issues the frame's draw calls and returns how many were issued.
    fn draw(&self, backend: &mut dyn RenderBackend) -> usize;
}

/// Ten rotated containers lit by a directional light, four point lights
/// and a camera-mounted spotlight.
#[derive(Clone, Copy, Debug, Default)]
pub struct MultipleLights;

impl MultipleLights {
    pub const DIFFUSE_MAP: &'static str = "textures/container2_diffuse.png";
    pub const SPECULAR_MAP: &'static str = "textures/container2_specular.png";
}

impl Demo for MultipleLights {
    type Block = LightingBlock;

    const SHADER: &'static str = LIGHTING_SHADER;

    fn config(&self) -> DemoConfig {
        DemoConfig::multiple_lights()
    }

    fn scene(&self, config: &DemoConfig) -> StaticScene {
        let options = DecodeOptions {
            flip_vertically: config.flip_textures,
            mipmaps: true,
        };
        StaticScene::new("cube", &CUBE_VERTICES, LitVertex::layout())
            .with_texture(0, config.asset_path(Self::DIFFUSE_MAP), options)
            .with_texture(1, config.asset_path(Self::SPECULAR_MAP), options)
    }

    fn update(&self, elapsed: f32, ctx: &RenderContext, uniforms: &mut dyn UniformSink) -> usize {
        FrameUniforms::compute(elapsed, ctx).push(uniforms)
    }

    fn draw(&self, backend: &mut dyn RenderBackend) -> usize {
        for (index, position) in CUBE_POSITIONS.iter().enumerate() {
            backend.set_mat4("model", instance_transform(index, *position));
            backend.draw_arrays(0, CUBE_VERTICES.len() as u32);
        }
        CUBE_POSITIONS.len()
    }
}

/// One quad blending two textures over per-vertex colours.
#[derive(Clone, Copy, Debug, Default)]
pub struct BasicTexture;

impl BasicTexture {
    pub const BASE_TEXTURE: &'static str = "textures/container.jpg";
    pub const OVERLAY_TEXTURE: &'static str = "textures/trixiestomp.png";
}

impl Demo for BasicTexture {
    type Block = QuadBlock;

    const SHADER: &'static str = QUAD_SHADER;

    fn config(&self) -> DemoConfig {
        DemoConfig::basic_texture()
    }

    fn scene(&self, config: &DemoConfig) -> StaticScene {
        let options = DecodeOptions {
            flip_vertically: config.flip_textures,
            mipmaps: false,
        };
        StaticScene::new("quad", &QUAD_VERTICES, ColoredVertex::layout())
            .with_indices(&QUAD_INDICES)
            .with_texture(0, config.asset_path(Self::BASE_TEXTURE), options)
            .with_texture(1, config.asset_path(Self::OVERLAY_TEXTURE), options)
    }

    fn update(&self, _elapsed: f32, _ctx: &RenderContext, uniforms: &mut dyn UniformSink) -> usize {
        uniforms.set_int("textureBase", 0);
        uniforms.set_int("textureOverlay", 1);
        0
    }

    fn draw(&self, backend: &mut dyn RenderBackend) -> usize {
        backend.draw_elements(QUAD_INDICES.len() as u32);
        1
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::render::{DrawKind, RecordingBackend};

    #[test]
    fn cube_scene_binds_diffuse_and_specular_maps() {
        let demo = MultipleLights;
        let scene = demo.scene(&demo.config());
        assert_eq!(scene.vertex_count, 36);
        assert_eq!(scene.indices, None);
        assert_eq!(
            scene.texture_for_unit(1).map(|request| request.path.clone()),
            Some(PathBuf::from("../resources/textures/container2_specular.png"))
        );
        assert!(!scene.textures[0].options.flip_vertically);
    }

    #[test]
    fn cube_draws_carry_distinct_models() {
        let demo = MultipleLights;
        let mut backend = RecordingBackend::new(&demo.scene(&demo.config()));
        backend.begin_frame([0.0; 4]);
        assert_eq!(demo.draw(&mut backend), 10);
        backend.present().unwrap();

        let frame = backend.last_frame();
        assert!(frame
            .iter()
            .all(|draw| draw.kind == DrawKind::Arrays { first: 0, count: 36 }));
        for pair in frame.windows(2) {
            assert_ne!(pair[0].model, pair[1].model);
        }
    }

    #[test]
    fn quad_uses_indexed_draw_and_both_units() {
        let demo = BasicTexture;
        let config = demo.config();
        let scene = demo.scene(&config);
        assert!(scene.textures.iter().all(|t| t.options.flip_vertically));

        let mut backend = RecordingBackend::new(&scene);
        let ctx = RenderContext::new(config.width, config.height);
        backend.begin_frame(config.clear_color);
        assert_eq!(demo.update(0.0, &ctx, &mut backend), 0);
        assert_eq!(demo.draw(&mut backend), 1);
        backend.present().unwrap();

        assert_eq!(backend.last_frame()[0].kind, DrawKind::Elements { count: 6 });
        let mut block = QuadBlock::default();
        for (name, value) in backend.uniforms().log() {
            block.set(name, *value).unwrap();
        }
        assert_eq!((block.texture_base, block.texture_overlay), (0, 1));
    }
}
