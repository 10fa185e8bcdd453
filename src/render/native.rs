use std::collections::HashSet;
use std::sync::Arc;

use log::{debug, info, warn};
use wgpu::util::DeviceExt;
use winit::dpi::PhysicalSize;
use winit::window::{Window, WindowId};

use super::recording::DrawKind;
use super::{RenderBackend, StaticScene};
use crate::error::{BootstrapError, FrameError};
use crate::texture::{load_texture, PixelFormat, TextureImage, TextureSlot};
use crate::uniforms::{UniformBlock, UniformSink, UniformValue};

/// Number of texture units exposed to the shaders.
pub const TEXTURE_UNITS: u32 = 2;

/// Window surface plus the device and queue that render into it.
pub struct GpuContext {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
}

impl GpuContext {
    /// Creates the surface, adapter and device for `window`.
    pub async fn new(window: Arc<Window>) -> Result<Self, BootstrapError> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY | wgpu::Backends::GL,
            ..Default::default()
        });
        let surface = instance
            .create_surface(Arc::clone(&window))
            .map_err(|err| BootstrapError::Surface(err.to_string()))?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(|err| BootstrapError::Adapter(err.to_string()))?;
        info!("using adapter {}", adapter.get_info().name);

        let device_descriptor = wgpu::DeviceDescriptor {
            label: Some("lightbox-device"),
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::downlevel_webgl2_defaults()
                .using_resolution(adapter.limits()),
            experimental_features: Default::default(),
            memory_hints: Default::default(),
            trace: Default::default(),
        };
        let (device, queue) = adapter
            .request_device(&device_descriptor)
            .await
            .map_err(|err| BootstrapError::Device(err.to_string()))?;

        let surface_caps = surface.get_capabilities(&adapter);
        // Colours are written unconverted, like a default GL framebuffer.
        let format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|format| !format.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .ok_or_else(|| BootstrapError::Surface("surface reports no formats".into()))?;
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            desired_maximum_frame_latency: 2,
            alpha_mode,
            view_formats: vec![],
        };
        surface.configure(&device, &config);

        Ok(Self {
            window,
            surface,
            device,
            queue,
            config,
        })
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    pub fn window_id(&self) -> WindowId {
        self.window.id()
    }

    fn resize(&mut self, new_size: PhysicalSize<u32>) -> bool {
        if new_size.width == 0 || new_size.height == 0 {
            return false;
        }
        self.config.width = new_size.width;
        self.config.height = new_size.height;
        self.surface.configure(&self.device, &self.config);
        true
    }

    fn reconfigure(&mut self) {
        self.surface.configure(&self.device, &self.config);
    }
}

/// wgpu implementation of [`RenderBackend`] for a single uniform block type.
pub struct GpuBackend<B: UniformBlock> {
    draws: Vec<(DrawKind, B)>,
    block: B,
    clear_color: wgpu::Color,
    rejected_uniforms: HashSet<String>,
    texture_bind_group: wgpu::BindGroup,
    uniform_layout: wgpu::BindGroupLayout,
    draw_uniforms: DrawUniforms,
    pipeline: wgpu::RenderPipeline,
    mesh: MeshBuffers,
    textures: Vec<GpuTexture>,
    depth: Option<DepthBuffer>,
    gpu: GpuContext,
}

impl<B: UniformBlock> GpuBackend<B> {
    /// Uploads the static scene and builds the pipeline for `shader`.
    pub fn new(gpu: GpuContext, scene: &StaticScene, shader: &str, depth_test: bool) -> Self {
        let device = &gpu.device;
        let depth = depth_test.then(|| DepthBuffer::create(device, gpu.config.width, gpu.config.height));

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(B::LABEL),
            source: wgpu::ShaderSource::Wgsl(shader.into()),
        });

        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("uniform-bind-layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: wgpu::BufferSize::new(block_size::<B>()),
                },
                count: None,
            }],
        });

        let texture_entry = |binding| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable: true },
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            count: None,
        };
        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("texture-bind-layout"),
            entries: &[
                texture_entry(0),
                texture_entry(1),
                wgpu::BindGroupLayoutEntry {
                    binding: TEXTURE_UNITS,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let textures: Vec<GpuTexture> = (0..TEXTURE_UNITS)
            .map(|unit| GpuTexture::for_unit(&gpu, scene, unit))
            .collect();
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("texture-sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });
        let texture_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("texture-bind-group"),
            layout: &texture_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&textures[0].view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&textures[1].view),
                },
                wgpu::BindGroupEntry {
                    binding: TEXTURE_UNITS,
                    resource: wgpu::BindingResource::Sampler(&sampler),
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("pipeline-layout"),
            bind_group_layouts: &[&uniform_layout, &texture_layout],
            push_constant_ranges: &[],
        });

        let attributes = scene.layout.wgpu_attributes();
        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(scene.label),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: u64::from(scene.layout.stride),
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &attributes,
                }],
            },
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                ..Default::default()
            },
            depth_stencil: depth.as_ref().map(|_| wgpu::DepthStencilState {
                format: DepthBuffer::FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: Default::default(),
                bias: Default::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: gpu.config.format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            multiview: None,
            cache: None,
        });

        let mesh = MeshBuffers::from_scene(device, scene);
        let draw_uniforms =
            DrawUniforms::new::<B>(device, &uniform_layout, DrawUniforms::INITIAL_CAPACITY);

        Self {
            draws: Vec::new(),
            block: B::zeroed(),
            clear_color: wgpu::Color::BLACK,
            rejected_uniforms: HashSet::new(),
            texture_bind_group,
            uniform_layout,
            draw_uniforms,
            pipeline,
            mesh,
            textures,
            depth,
            gpu,
        }
    }

    pub fn window_id(&self) -> WindowId {
        self.gpu.window_id()
    }

    pub fn window(&self) -> &Window {
        self.gpu.window()
    }

    /// Resizes the swap chain and depth buffer to match the new dimensions.
    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if !self.gpu.resize(new_size) {
            return;
        }
        if self.depth.is_some() {
            self.depth = Some(DepthBuffer::create(
                &self.gpu.device,
                new_size.width,
                new_size.height,
            ));
        }
    }

    /// Copies every draw's uniform snapshot into the shared buffer, growing
    /// it when the frame issued more draws than it holds.
    fn upload_draw_uniforms(&mut self) {
        if self.draws.len() > self.draw_uniforms.capacity {
            let capacity = self.draws.len().next_power_of_two();
            debug!("growing draw uniform buffer to {capacity} blocks");
            self.draw_uniforms =
                DrawUniforms::new::<B>(&self.gpu.device, &self.uniform_layout, capacity);
        }
        if self.draws.is_empty() {
            return;
        }
        let blocks = self.draws.iter().map(|(_, block)| block);
        let bytes = pack_blocks(blocks, self.draw_uniforms.stride);
        self.gpu
            .queue
            .write_buffer(&self.draw_uniforms.buffer, 0, &bytes);
    }

    fn encode(&self, target: &wgpu::TextureView) -> wgpu::CommandBuffer {
        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("frame-encoder"),
            });

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("main-pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                depth_slice: None,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(self.clear_color),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: self.depth.as_ref().map(|depth| {
                wgpu::RenderPassDepthStencilAttachment {
                    view: &depth.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(1, &self.texture_bind_group, &[]);
        pass.set_vertex_buffer(0, self.mesh.vertex.slice(..));
        if let Some(index) = &self.mesh.index {
            pass.set_index_buffer(index.slice(..), wgpu::IndexFormat::Uint32);
        }

        for (draw, (kind, _)) in self.draws.iter().enumerate() {
            let offset = self.draw_uniforms.offset(draw);
            pass.set_bind_group(0, &self.draw_uniforms.bind_group, &[offset]);
            match *kind {
                DrawKind::Arrays { first, count } => {
                    let end = (first + count).min(self.mesh.vertex_count);
                    pass.draw(first..end, 0..1);
                }
                DrawKind::Elements { count } => {
                    if self.mesh.index.is_some() {
                        pass.draw_indexed(0..count.min(self.mesh.index_count), 0, 0..1);
                    }
                }
            }
        }

        drop(pass);
        encoder.finish()
    }
}

impl<B: UniformBlock> UniformSink for GpuBackend<B> {
    fn set_uniform(&mut self, name: &str, value: UniformValue) {
        if let Err(err) = self.block.set(name, value) {
            // Reported once per name; the write is otherwise ignored, like
            // a uniform location the shader does not declare.
            if self.rejected_uniforms.insert(name.to_string()) {
                warn!("ignoring uniform: {err}");
            }
        }
    }
}

impl<B: UniformBlock> RenderBackend for GpuBackend<B> {
    fn begin_frame(&mut self, clear_color: [f64; 4]) {
        let [r, g, b, a] = clear_color;
        self.clear_color = wgpu::Color { r, g, b, a };
        self.draws.clear();
    }

    fn draw_arrays(&mut self, first: u32, count: u32) {
        self.draws.push((DrawKind::Arrays { first, count }, self.block));
    }

    fn draw_elements(&mut self, count: u32) {
        self.draws.push((DrawKind::Elements { count }, self.block));
    }

    fn present(&mut self) -> Result<(), FrameError> {
        let output = match self.gpu.surface.get_current_texture() {
            Ok(output) => output,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.gpu.reconfigure();
                return Ok(());
            }
            Err(wgpu::SurfaceError::Timeout) => {
                info!("Surface timeout; retrying next frame");
                return Ok(());
            }
            Err(wgpu::SurfaceError::OutOfMemory) => return Err(FrameError::OutOfMemory),
            Err(other) => return Err(FrameError::Surface(other.to_string())),
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        self.upload_draw_uniforms();
        let commands = self.encode(&view);
        self.gpu.queue.submit(std::iter::once(commands));
        self.gpu.window.pre_present_notify();
        output.present();
        Ok(())
    }
}

impl<B: UniformBlock> Drop for GpuBackend<B> {
    fn drop(&mut self) {
        let missing = self.textures.iter().filter(|texture| !texture.loaded).count();
        debug!(
            "releasing pipeline, mesh buffers and {} textures ({missing} defaulted)",
            self.textures.len()
        );
    }
}

fn block_size<B: UniformBlock>() -> u64 {
    std::mem::size_of::<B>() as u64
}

/// Distance between consecutive blocks in a dynamically offset buffer.
fn uniform_stride(block_size: u64, alignment: u64) -> u64 {
    let alignment = alignment.max(1);
    block_size.div_ceil(alignment) * alignment
}

/// Lays `blocks` out back to back, each padded to `stride` bytes.
fn pack_blocks<'a, B: UniformBlock + 'a>(
    blocks: impl IntoIterator<Item = &'a B>,
    stride: u64,
) -> Vec<u8> {
    let mut bytes = Vec::new();
    for block in blocks {
        let start = bytes.len();
        bytes.extend_from_slice(bytemuck::bytes_of(block));
        bytes.resize(start + stride as usize, 0);
    }
    bytes
}

/// One uniform buffer holding a block per draw call, selected with a
/// dynamic offset.
struct DrawUniforms {
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    stride: u64,
    capacity: usize,
}

impl DrawUniforms {
    const INITIAL_CAPACITY: usize = 16;

    fn new<B: UniformBlock>(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        capacity: usize,
    ) -> Self {
        let stride = uniform_stride(
            block_size::<B>(),
            u64::from(device.limits().min_uniform_buffer_offset_alignment),
        );
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("draw-uniforms"),
            size: stride * capacity as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("draw-uniform-bind-group"),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &buffer,
                    offset: 0,
                    size: wgpu::BufferSize::new(block_size::<B>()),
                }),
            }],
        });
        Self {
            buffer,
            bind_group,
            stride,
            capacity,
        }
    }

    fn offset(&self, draw: usize) -> u32 {
        (self.stride * draw as u64) as u32
    }
}

struct MeshBuffers {
    vertex: wgpu::Buffer,
    vertex_count: u32,
    index: Option<wgpu::Buffer>,
    index_count: u32,
}

impl MeshBuffers {
    fn from_scene(device: &wgpu::Device, scene: &StaticScene) -> Self {
        let vertex = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{}-vertices", scene.label)),
            contents: &scene.vertices,
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index = scene.indices.as_ref().map(|indices| {
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{}-indices", scene.label)),
                contents: bytemuck::cast_slice(indices),
                usage: wgpu::BufferUsages::INDEX,
            })
        });
        Self {
            vertex,
            vertex_count: scene.vertex_count,
            index,
            index_count: scene.indices.as_ref().map_or(0, |indices| indices.len() as u32),
        }
    }
}

struct GpuTexture {
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
    loaded: bool,
}

impl GpuTexture {
    /// Loads the texture requested for `unit`, or a 1x1 white texture when
    /// the unit is unused or its image failed to decode.
    fn for_unit(gpu: &GpuContext, scene: &StaticScene, unit: u32) -> Self {
        let slot = match scene.texture_for_unit(unit) {
            Some(request) => load_texture(&request.path, request.options)
                .map(|image| (image, request.options.mipmaps)),
            None => TextureSlot::Missing,
        };
        match slot {
            TextureSlot::Ready((image, mipmaps)) => Self::upload(gpu, &image, mipmaps, true),
            TextureSlot::Missing => {
                let white = TextureImage {
                    width: 1,
                    height: 1,
                    format: PixelFormat::Rgba,
                    pixels: vec![u8::MAX; 4],
                };
                Self::upload(gpu, &white, false, false)
            }
        }
    }

    fn upload(gpu: &GpuContext, image: &TextureImage, mipmaps: bool, loaded: bool) -> Self {
        let levels = if mipmaps {
            image.mip_chain()
        } else {
            vec![image.clone()]
        };
        let format = match image.format {
            PixelFormat::Red => wgpu::TextureFormat::R8Unorm,
            PixelFormat::Rgb | PixelFormat::Rgba => wgpu::TextureFormat::Rgba8Unorm,
        };
        let texture = gpu.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("scene-texture"),
            size: wgpu::Extent3d {
                width: image.width,
                height: image.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: levels.len() as u32,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        for (mip_level, level) in levels.iter().enumerate() {
            let (pixels, bytes_per_pixel) = match level.format {
                PixelFormat::Red => (level.pixels.clone(), 1),
                PixelFormat::Rgb | PixelFormat::Rgba => (level.rgba_pixels(), 4),
            };
            gpu.queue.write_texture(
                wgpu::TexelCopyTextureInfo {
                    texture: &texture,
                    mip_level: mip_level as u32,
                    origin: wgpu::Origin3d::ZERO,
                    aspect: wgpu::TextureAspect::All,
                },
                &pixels,
                wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(level.width * bytes_per_pixel),
                    rows_per_image: Some(level.height),
                },
                wgpu::Extent3d {
                    width: level.width,
                    height: level.height,
                    depth_or_array_layers: 1,
                },
            );
        }

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            _texture: texture,
            view,
            loaded,
        }
    }
}

struct DepthBuffer {
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
}

impl DepthBuffer {
    const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth24Plus;

    fn create(device: &wgpu::Device, width: u32, height: u32) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("depth-texture"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            _texture: texture,
            view,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shader::{LightingBlock, QuadBlock};

    #[test]
    fn stride_rounds_up_to_offset_alignment() {
        assert_eq!(uniform_stride(block_size::<LightingBlock>(), 256), 768);
        assert_eq!(uniform_stride(block_size::<QuadBlock>(), 256), 256);
        assert_eq!(uniform_stride(256, 256), 256);
        assert_eq!(uniform_stride(16, 0), 16);
    }

    #[test]
    fn packed_blocks_start_at_each_draw_offset() {
        let mut first = QuadBlock::default();
        first.set("textureOverlay", UniformValue::Int(1)).unwrap();
        let mut second = QuadBlock::default();
        second.set("textureBase", UniformValue::Int(7)).unwrap();

        let bytes = pack_blocks([&first, &second], 256);
        assert_eq!(bytes.len(), 512);
        assert_eq!(&bytes[..16], bytemuck::bytes_of(&first));
        assert!(bytes[16..256].iter().all(|&byte| byte == 0));
        assert_eq!(&bytes[256..272], bytemuck::bytes_of(&second));
    }
}
