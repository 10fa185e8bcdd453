use bytemuck::Pod;

use crate::error::FrameError;
use crate::texture::{DecodeOptions, TextureRequest};
use crate::uniforms::UniformSink;
use crate::vertex::VertexLayout;

pub mod native;
pub mod recording;

pub use native::{GpuBackend, GpuContext};
pub use recording::{DrawCall, DrawKind, RecordingBackend};

/// Graphics commands issued by the render loop.
///
/// Uniforms set through the [`UniformSink`] supertrait stay current until they
/// are overwritten; each draw call captures the values current when it is
/// issued.
pub trait RenderBackend: UniformSink {
    fn begin_frame(&mut self, clear_color: [f64; 4]);

    /// Draws `count` non-indexed vertices starting at `first`.
    fn draw_arrays(&mut self, first: u32, count: u32);

    /// Draws the first `count` indices of the element buffer.
    fn draw_elements(&mut self, count: u32);

    fn present(&mut self) -> Result<(), FrameError>;
}

/// Geometry and textures uploaded once during setup.
#[derive(Clone, Debug, PartialEq)]
pub struct StaticScene {
    pub label: &'static str,
    pub vertices: Vec<u8>,
    pub vertex_count: u32,
    pub indices: Option<Vec<u32>>,
    pub layout: VertexLayout,
    pub textures: Vec<TextureRequest>,
}

impl StaticScene {
    pub fn new<V: Pod>(label: &'static str, vertices: &[V], layout: VertexLayout) -> Self {
        Self {
            label,
            vertices: bytemuck::cast_slice(vertices).to_vec(),
            vertex_count: vertices.len() as u32,
            indices: None,
            layout,
            textures: Vec::new(),
        }
    }

    pub fn with_indices(mut self, indices: &[u32]) -> Self {
        self.indices = Some(indices.to_vec());
        self
    }

    pub fn with_texture(
        mut self,
        unit: u32,
        path: impl Into<std::path::PathBuf>,
        options: DecodeOptions,
    ) -> Self {
        self.textures.push(TextureRequest {
            path: path.into(),
            unit,
            options,
        });
        self
    }

    pub fn texture_for_unit(&self, unit: u32) -> Option<&TextureRequest> {
        self.textures.iter().find(|request| request.unit == unit)
    }
}
