//! Frame requests backed by winit redraws.

use std::sync::Arc;

use solaris_scene::{CancelToken, FrameScheduler};
use winit::window::{Window, WindowId};

/// Asks the window for a redraw; the session runs its frame when the
/// matching `RedrawRequested` arrives.
pub struct WinitScheduler {
    window: Arc<Window>,
}

impl WinitScheduler {
    pub fn new(window: Arc<Window>) -> Self {
        Self { window }
    }

    pub fn window_id(&self) -> WindowId {
        self.window.id()
    }
}

impl FrameScheduler for WinitScheduler {
    fn request_frame(&mut self) -> CancelToken {
        self.window.request_redraw();
        CancelToken::new()
    }
}
