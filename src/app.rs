use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use log::{error, info};
use pollster::block_on;
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{ElementState, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use crate::config::{CliOptions, DemoConfig};
use crate::context::RenderContext;
use crate::demo::Demo;
use crate::error::BootstrapError;
use crate::input::{InputState, Key};
use crate::render::{GpuBackend, GpuContext, RecordingBackend};
use crate::render_loop::RenderLoop;

/// Parses the command line, runs the demo and maps the outcome to a process
/// exit status: 0 after a normal close, -1 when bootstrap fails, 2 on bad
/// arguments and 1 for any other error.
pub fn run_demo<D: Demo>(demo: D) -> i32 {
    let options = match CliOptions::parse() {
        Ok(options) => options,
        Err(err) => {
            eprintln!("{err}");
            return 2;
        }
    };
    let config = demo.config().with_options(&options);

    let result = if options.headless {
        run_headless(&demo, &config, options.frames).map(|summary| print!("{summary}"))
    } else {
        run_windowed(demo, config)
    };

    match result {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("Error: {err:?}");
            if err.downcast_ref::<BootstrapError>().is_some() {
                -1
            } else {
                1
            }
        }
    }
}

/// Opens the demo window and renders until Escape is pressed or the window
/// is closed.
pub fn run_windowed<D: Demo>(demo: D, config: DemoConfig) -> Result<()> {
    let event_loop = EventLoop::new().map_err(|err| {
        let err = BootstrapError::EventLoop(err.to_string());
        error!("{err}");
        err
    })?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = WindowedApp {
        demo,
        config,
        active: None,
        render_loop: RenderLoop::new(),
        input: InputState::new(),
        started: Instant::now(),
        error: None,
    };
    event_loop
        .run_app(&mut app)
        .context("event loop terminated abnormally")?;

    match app.error.take() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

struct ActiveWindow<D: Demo> {
    ctx: RenderContext,
    backend: GpuBackend<D::Block>,
}

struct WindowedApp<D: Demo> {
    demo: D,
    config: DemoConfig,
    active: Option<ActiveWindow<D>>,
    render_loop: RenderLoop,
    input: InputState,
    started: Instant,
    error: Option<anyhow::Error>,
}

impl<D: Demo> WindowedApp<D> {
    fn bootstrap(&self, event_loop: &ActiveEventLoop) -> Result<ActiveWindow<D>, BootstrapError> {
        let request = self.config.window_request();
        let attributes = Window::default_attributes()
            .with_title(request.title.clone())
            .with_inner_size(LogicalSize::new(request.width, request.height));
        let window = Arc::new(
            event_loop
                .create_window(attributes)
                .map_err(|err| BootstrapError::Window(err.to_string()))?,
        );

        let mut ctx = RenderContext::new(request.width, request.height);
        let size = window.inner_size();
        ctx.handle_resize(size.width, size.height);

        let gpu = block_on(GpuContext::new(window))?;
        let scene = self.demo.scene(&self.config);
        let backend = GpuBackend::new(gpu, &scene, D::SHADER, self.config.depth_test);
        info!(
            "{}: {} vertices uploaded, {} textures requested",
            request.title,
            scene.vertex_count,
            scene.textures.len()
        );
        Ok(ActiveWindow { ctx, backend })
    }

    fn teardown(&mut self) {
        // Dropping the backend releases GPU resources before the surface
        // and window it renders into.
        drop(self.active.take());
        info!("teardown complete");
    }
}

impl<D: Demo> ApplicationHandler for WindowedApp<D> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.active.is_some() {
            return;
        }
        match self.bootstrap(event_loop) {
            Ok(active) => {
                active.backend.window().request_redraw();
                self.active = Some(active);
                self.started = Instant::now();
            }
            Err(err) => {
                error!("{err}");
                self.error = Some(err.into());
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, window_id: WindowId, event: WindowEvent) {
        let Some(active) = self.active.as_mut() else {
            return;
        };
        if window_id != active.backend.window_id() {
            return;
        }

        match event {
            WindowEvent::CloseRequested => self.render_loop.request_close(),
            WindowEvent::KeyboardInput { event, .. } => {
                if let Some(key) = Key::from_winit(event.physical_key) {
                    match event.state {
                        ElementState::Pressed => {
                            self.input.set_key_down(key);
                            self.render_loop.handle_key(key);
                        }
                        ElementState::Released => self.input.set_key_up(key),
                    }
                }
            }
            WindowEvent::Resized(size) => {
                active.ctx.handle_resize(size.width, size.height);
                active.backend.resize(size);
            }
            WindowEvent::RedrawRequested => {
                let elapsed = self.started.elapsed().as_secs_f32();
                let frame = self.render_loop.tick(
                    &self.demo,
                    &self.config,
                    elapsed,
                    &active.ctx,
                    &mut active.backend,
                    &self.input,
                );
                if let Err(err) = frame {
                    self.error = Some(err.into());
                    self.render_loop.request_close();
                }
            }
            _ => {}
        }

        if !self.render_loop.is_running() {
            event_loop.exit();
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(active) = &self.active {
            active.backend.window().request_redraw();
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.teardown();
    }
}

/// Outcome of a headless run, printed by the binaries with `--headless`.
#[derive(Clone, Debug, PartialEq)]
pub struct HeadlessSummary {
    pub demo: String,
    pub viewport: (u32, u32),
    pub textures: Vec<(u32, PathBuf, bool)>,
    pub frames: u32,
    pub draw_calls_per_frame: usize,
    pub point_lights: usize,
}

impl HeadlessSummary {
    pub fn textures_ready(&self) -> usize {
        self.textures.iter().filter(|(_, _, ready)| *ready).count()
    }
}

impl fmt::Display for HeadlessSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Demo: {} ({}x{})",
            self.demo, self.viewport.0, self.viewport.1
        )?;
        writeln!(
            f,
            "Textures: {} ready, {} missing",
            self.textures_ready(),
            self.textures.len() - self.textures_ready()
        )?;
        for (unit, path, ready) in &self.textures {
            let state = if *ready { "ready" } else { "missing" };
            writeln!(f, " - unit {unit}: {} ({state})", path.display())?;
        }
        writeln!(f, "Frames rendered: {}", self.frames)?;
        writeln!(f, "Draw calls per frame: {}", self.draw_calls_per_frame)?;
        writeln!(f, "Point lights: {}", self.point_lights)
    }
}

/// Runs `frames` ticks at 60 Hz simulated time against a recording backend.
pub fn run_headless<D: Demo>(demo: &D, config: &DemoConfig, frames: u32) -> Result<HeadlessSummary> {
    let ctx = RenderContext::headless(&config.window_request());
    let scene = demo.scene(config);
    let mut backend = RecordingBackend::new(&scene);
    let mut render_loop = RenderLoop::new();
    let input = InputState::new();

    let mut summary = HeadlessSummary {
        demo: config.title.clone(),
        viewport: ctx.viewport(),
        textures: backend
            .textures()
            .iter()
            .map(|(request, slot)| (request.unit, request.path.clone(), slot.is_ready()))
            .collect(),
        frames: 0,
        draw_calls_per_frame: 0,
        point_lights: 0,
    };

    for frame in 0..frames {
        let elapsed = frame as f32 / 60.0;
        let report = render_loop
            .tick(demo, config, elapsed, &ctx, &mut backend, &input)
            .with_context(|| format!("frame {frame} failed"))?;
        let Some(report) = report else {
            break;
        };
        summary.frames += 1;
        summary.draw_calls_per_frame = report.draw_calls;
        summary.point_lights = report.point_lights;
    }

    drop(backend);
    info!("teardown complete");
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demo::{BasicTexture, MultipleLights};

    #[test]
    fn headless_run_reports_missing_textures() {
        let demo = BasicTexture;
        let mut config = demo.config();
        config.asset_root = PathBuf::from("/nonexistent/resources");

        let summary = run_headless(&demo, &config, 3).unwrap();
        assert_eq!(summary.frames, 3);
        assert_eq!(summary.draw_calls_per_frame, 1);
        assert_eq!(summary.textures_ready(), 0);
        assert_eq!(summary.viewport, (800, 800));
    }

    #[test]
    fn summary_lists_every_section() {
        let demo = MultipleLights;
        let summary = run_headless(&demo, &demo.config(), 0).unwrap();
        let text = summary.to_string();
        assert!(text.starts_with("Demo: Multiple Lights (1280x720)\n"));
        assert!(text.contains("Textures: 0 ready, 2 missing"));
        assert!(text.contains("Frames rendered: 0"));
        assert!(text.contains("Draw calls per frame: 0"));
    }
}
