use glam::Mat4;
use log::debug;

use super::{RenderBackend, StaticScene};
use crate::error::FrameError;
use crate::texture::{load_texture, PixelFormat, TextureRequest, TextureSlot};
use crate::uniforms::{UniformRecorder, UniformSink, UniformValue};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DrawKind {
    Arrays { first: u32, count: u32 },
    Elements { count: u32 },
}

/// One recorded draw call and the `model` uniform current when it was issued.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DrawCall {
    pub kind: DrawKind,
    pub model: Option<Mat4>,
}

/// Size and format of a texture that decoded successfully.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TextureInfo {
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    pub mip_levels: u32,
}

/// Headless backend that records commands instead of submitting them.
#[derive(Debug)]
pub struct RecordingBackend {
    uniforms: UniformRecorder,
    textures: Vec<(TextureRequest, TextureSlot<TextureInfo>)>,
    vertex_count: u32,
    index_count: Option<u32>,
    clear_color: Option<[f64; 4]>,
    pending: Vec<DrawCall>,
    frames: Vec<Vec<DrawCall>>,
}

impl RecordingBackend {
    /// Performs scene setup: decodes every requested texture (soft-failing
    /// to [`TextureSlot::Missing`]) and records the buffer sizes.
    pub fn new(scene: &StaticScene) -> Self {
        let textures = scene
            .textures
            .iter()
            .map(|request| {
                let slot = load_texture(&request.path, request.options).map(|image| TextureInfo {
                    width: image.width,
                    height: image.height,
                    format: image.format,
                    mip_levels: if request.options.mipmaps {
                        image.mip_level_count()
                    } else {
                        1
                    },
                });
                (request.clone(), slot)
            })
            .collect();
        debug!(
            "recorded setup for {}: {} vertices",
            scene.label, scene.vertex_count
        );
        Self {
            uniforms: UniformRecorder::new(),
            textures,
            vertex_count: scene.vertex_count,
            index_count: scene.indices.as_ref().map(|indices| indices.len() as u32),
            clear_color: None,
            pending: Vec::new(),
            frames: Vec::new(),
        }
    }

    pub fn uniforms(&self) -> &UniformRecorder {
        &self.uniforms
    }

    pub fn textures(&self) -> &[(TextureRequest, TextureSlot<TextureInfo>)] {
        &self.textures
    }

    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    pub fn index_count(&self) -> Option<u32> {
        self.index_count
    }

    pub fn clear_color(&self) -> Option<[f64; 4]> {
        self.clear_color
    }

    pub fn frames_presented(&self) -> usize {
        self.frames.len()
    }

    pub fn last_frame(&self) -> &[DrawCall] {
        self.frames.last().map(Vec::as_slice).unwrap_or(&[])
    }

    fn record(&mut self, kind: DrawKind) {
        let model = match self.uniforms.get("model") {
            Some(UniformValue::Mat4(model)) => Some(model),
            _ => None,
        };
        self.pending.push(DrawCall { kind, model });
    }
}

impl UniformSink for RecordingBackend {
    fn set_uniform(&mut self, name: &str, value: UniformValue) {
        self.uniforms.set_uniform(name, value);
    }
}

impl RenderBackend for RecordingBackend {
    fn begin_frame(&mut self, clear_color: [f64; 4]) {
        self.clear_color = Some(clear_color);
        self.pending.clear();
        self.uniforms.clear_log();
    }

    fn draw_arrays(&mut self, first: u32, count: u32) {
        self.record(DrawKind::Arrays { first, count });
    }

    fn draw_elements(&mut self, count: u32) {
        self.record(DrawKind::Elements { count });
    }

    fn present(&mut self) -> Result<(), FrameError> {
        self.frames.push(std::mem::take(&mut self.pending));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;
    use crate::texture::DecodeOptions;
    use crate::vertex::{ColoredVertex, QUAD_INDICES, QUAD_VERTICES};

    fn quad_scene() -> StaticScene {
        StaticScene::new("quad", &QUAD_VERTICES, ColoredVertex::layout())
            .with_indices(&QUAD_INDICES)
            .with_texture(0, "/nonexistent/base.jpg", DecodeOptions::default())
    }

    #[test]
    fn setup_keeps_running_without_textures() {
        let backend = RecordingBackend::new(&quad_scene());
        assert_eq!(backend.vertex_count(), 4);
        assert_eq!(backend.index_count(), Some(6));
        assert_eq!(backend.textures().len(), 1);
        assert_eq!(backend.textures()[0].1, TextureSlot::Missing);
    }

    #[test]
    fn draws_capture_current_model() {
        let mut backend = RecordingBackend::new(&quad_scene());
        backend.begin_frame([0.0, 0.0, 0.0, 1.0]);
        backend.draw_elements(6);
        let model = Mat4::from_translation(Vec3::Y);
        backend.set_mat4("model", model);
        backend.draw_arrays(0, 3);
        backend.present().unwrap();

        let frame = backend.last_frame();
        assert_eq!(frame.len(), 2);
        assert_eq!(frame[0].model, None);
        assert_eq!(frame[1].model, Some(model));
        assert_eq!(frame[1].kind, DrawKind::Arrays { first: 0, count: 3 });
        assert_eq!(backend.frames_presented(), 1);
    }
}
