use log::trace;

use crate::config::DemoConfig;
use crate::context::RenderContext;
use crate::demo::Demo;
use crate::error::FrameError;
use crate::input::{InputState, Key};
use crate::render::RenderBackend;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoopState {
    Running,
    Closing,
}

/// What one frame submitted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TickReport {
    pub draw_calls: usize,
    pub point_lights: usize,
}

/// Two-state frame loop. Once Closing it never returns to Running.
#[derive(Debug)]
pub struct RenderLoop {
    state: LoopState,
    frames: u64,
}

impl Default for RenderLoop {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderLoop {
    pub fn new() -> Self {
        Self {
            state: LoopState::Running,
            frames: 0,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == LoopState::Running
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn handle_key(&mut self, key: Key) {
        match key {
            Key::Escape => self.request_close(),
        }
    }

    pub fn process_input(&mut self, input: &InputState) {
        if input.is_key_down(Key::Escape) {
            self.request_close();
        }
    }

    pub fn request_close(&mut self) {
        self.state = LoopState::Closing;
    }

    /// Polls input, then clears, updates, draws and presents one frame.
    /// Returns `None` without touching the backend once the loop is closing.
    pub fn tick<D, B>(
        &mut self,
        demo: &D,
        config: &DemoConfig,
        elapsed: f32,
        ctx: &RenderContext,
        backend: &mut B,
        input: &InputState,
    ) -> Result<Option<TickReport>, FrameError>
    where
        D: Demo,
        B: RenderBackend,
    {
        self.process_input(input);
        if !self.is_running() {
            return Ok(None);
        }

        backend.begin_frame(config.clear_color);
        let point_lights = demo.update(elapsed, ctx, backend);
        let draw_calls = demo.draw(backend);
        backend.present()?;

        self.frames += 1;
        trace!("frame {} at t={elapsed:.3}: {draw_calls} draw calls", self.frames);
        Ok(Some(TickReport {
            draw_calls,
            point_lights,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demo::{BasicTexture, MultipleLights};
    use crate::render::RecordingBackend;

    #[test]
    fn escape_moves_to_closing() {
        let mut render_loop = RenderLoop::new();
        render_loop.process_input(&InputState::new());
        assert!(render_loop.is_running());
        render_loop.handle_key(Key::Escape);
        assert_eq!(render_loop.state(), LoopState::Closing);
        render_loop.process_input(&InputState::new());
        assert_eq!(render_loop.state(), LoopState::Closing);
    }

    #[test]
    fn tick_clears_draws_and_presents() {
        let demo = MultipleLights;
        let config = demo.config();
        let ctx = RenderContext::new(config.width, config.height);
        let mut backend = RecordingBackend::new(&demo.scene(&config));
        let mut render_loop = RenderLoop::new();

        let report = render_loop
            .tick(&demo, &config, 0.5, &ctx, &mut backend, &InputState::new())
            .unwrap();
        assert_eq!(
            report,
            Some(TickReport {
                draw_calls: 10,
                point_lights: 4
            })
        );
        assert_eq!(backend.clear_color(), Some([0.15, 0.15, 0.15, 1.0]));
        assert_eq!(backend.frames_presented(), 1);
        assert_eq!(render_loop.frames(), 1);
    }

    #[test]
    fn held_escape_stops_before_drawing() {
        let demo = BasicTexture;
        let config = demo.config();
        let ctx = RenderContext::new(config.width, config.height);
        let mut backend = RecordingBackend::new(&demo.scene(&config));
        let mut render_loop = RenderLoop::new();
        let mut input = InputState::new();

        render_loop
            .tick(&demo, &config, 0.0, &ctx, &mut backend, &input)
            .unwrap();
        input.set_key_down(Key::Escape);
        let report = render_loop
            .tick(&demo, &config, 1.0, &ctx, &mut backend, &input)
            .unwrap();

        assert_eq!(report, None);
        assert_eq!(backend.frames_presented(), 1);
        assert_eq!(render_loop.state(), LoopState::Closing);
    }
}
