//! Two small real-time rendering programs built on wgpu and winit.
//!
//! `multiple-lights` renders ten textured containers lit by a directional
//! light, four point lights and a spotlight mounted on an orbiting camera.
//! `basic-texture` renders a single quad blending two textures. Both run the
//! same bootstrap, setup, update/render and teardown sequence. Every frame is
//! issued through [`RenderBackend`], so the sequence also runs headless
//! against [`RecordingBackend`].

pub mod app;
pub mod camera;
pub mod config;
pub mod context;
pub mod demo;
pub mod error;
pub mod input;
pub mod lighting;
pub mod render;
pub mod render_loop;
pub mod scene;
pub mod shader;
pub mod texture;
pub mod uniforms;
pub mod vertex;

pub use app::{run_demo, run_headless, run_windowed, HeadlessSummary};
pub use camera::{OrbitCamera, Projection};
pub use config::{CliOptions, DemoConfig};
pub use context::{RenderContext, WindowRequest};
pub use demo::{BasicTexture, Demo, MultipleLights};
pub use error::{BootstrapError, FrameError, TextureError, UniformError};
pub use input::{InputState, Key};
pub use lighting::FrameUniforms;
pub use render::{DrawCall, DrawKind, RecordingBackend, RenderBackend, StaticScene};
pub use render_loop::{LoopState, RenderLoop, TickReport};
pub use texture::{load_texture, DecodeOptions, PixelFormat, TextureImage, TextureSlot};
pub use uniforms::{UniformBlock, UniformRecorder, UniformSink, UniformValue};
