//! Window size bookkeeping shared by the render sessions.
//!
//! Some compositors report 0x0 before a window is mapped and wgpu rejects
//! zero-size surfaces, so sizes are clamped to 1x1 and the tracker remembers
//! whether a real size has arrived yet.

/// Physical pixel dimensions of a surface, never zero.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PhysicalSize {
    pub width: u32,
    pub height: u32,
}

impl PhysicalSize {
    pub fn clamped(width: u32, height: u32) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
        }
    }
}

/// Last known size and DPI scale of one window.
#[derive(Debug, Clone)]
pub struct SurfaceWrapper {
    size: PhysicalSize,
    scale_factor: f64,
    configured: bool,
}

impl SurfaceWrapper {
    pub fn new(physical_width: u32, physical_height: u32, scale_factor: f64) -> Self {
        Self {
            size: PhysicalSize::clamped(physical_width, physical_height),
            scale_factor,
            configured: physical_width > 0 && physical_height > 0,
        }
    }

    /// Record a `Resized` event. `Some(size)` when the surface must be
    /// reconfigured.
    pub fn handle_resize(&mut self, physical_width: u32, physical_height: u32) -> Option<PhysicalSize> {
        let size = PhysicalSize::clamped(physical_width, physical_height);
        let changed = size != self.size || !self.configured;
        self.size = size;
        self.configured = true;
        changed.then_some(size)
    }

    /// Record a `ScaleFactorChanged` event. winit follows it with `Resized`,
    /// which carries the new physical size.
    pub fn set_scale_factor(&mut self, scale_factor: f64) {
        if scale_factor != self.scale_factor {
            log::debug!("Scale factor {:.2} -> {scale_factor:.2}", self.scale_factor);
            self.scale_factor = scale_factor;
        }
    }

    pub fn physical_size(&self) -> PhysicalSize {
        self.size
    }

    pub fn scale_factor(&self) -> f64 {
        self.scale_factor
    }

    /// Whether a non-zero size has been seen.
    pub fn is_configured(&self) -> bool {
        self.configured
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unmapped_window_waits_for_real_size() {
        let mut surface = SurfaceWrapper::new(0, 0, 1.0);
        assert!(!surface.is_configured());
        assert_eq!(surface.physical_size(), PhysicalSize::clamped(0, 0));

        assert_eq!(
            surface.handle_resize(1920, 1080),
            Some(PhysicalSize {
                width: 1920,
                height: 1080
            })
        );
        assert!(surface.is_configured());
    }

    #[test]
    fn test_repeated_size_is_not_reported() {
        let mut surface = SurfaceWrapper::new(800, 600, 1.0);
        assert_eq!(surface.handle_resize(800, 600), None);
        assert!(surface.handle_resize(1024, 600).is_some());
        assert_eq!(surface.handle_resize(1024, 600), None);
    }

    #[test]
    fn test_minimize_clamps_to_one_pixel() {
        let mut surface = SurfaceWrapper::new(800, 600, 1.0);
        let size = surface.handle_resize(0, 0).expect("size changed");
        assert_eq!((size.width, size.height), (1, 1));
    }

    #[test]
    fn test_scale_factor_is_tracked_separately() {
        let mut surface = SurfaceWrapper::new(1280, 720, 1.0);
        surface.set_scale_factor(2.0);
        assert_eq!(surface.scale_factor(), 2.0);
        assert_eq!(surface.physical_size().width, 1280);
    }
}
