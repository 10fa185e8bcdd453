use glam::Mat4;
use log::debug;

use crate::camera::Projection;

/// Size and title requested for the demo window.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WindowRequest {
    pub width: u32,
    pub height: u32,
    pub title: String,
}

/// Per-process render state created during bootstrap.
///
/// Owns the projection matrix that the resize handler overwrites and the
/// per-frame update reads.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderContext {
    projection: Projection,
    viewport: (u32, u32),
}

impl RenderContext {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            projection: Projection::new(width, height),
            viewport: (width, height),
        }
    }

    /// Bootstraps without a window, as if the requested window had been created.
    pub fn headless(request: &WindowRequest) -> Self {
        debug!(
            "headless context for \"{}\" ({}x{})",
            request.title, request.width, request.height
        );
        Self::new(request.width, request.height)
    }

    pub fn handle_resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.viewport = (width, height);
        self.projection.resize(width, height);
    }

    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    pub fn projection_matrix(&self) -> Mat4 {
        self.projection.matrix()
    }

    pub fn viewport(&self) -> (u32, u32) {
        self.viewport
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resize_updates_viewport_and_projection() {
        let mut ctx = RenderContext::new(1280, 720);
        ctx.handle_resize(640, 640);
        assert_eq!(ctx.viewport(), (640, 640));
        assert!((ctx.projection().aspect() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn minimised_window_keeps_state() {
        let mut ctx = RenderContext::new(1280, 720);
        let before = ctx.clone();
        ctx.handle_resize(0, 0);
        assert_eq!(ctx, before);
    }
}
