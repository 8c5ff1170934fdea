use crate::camera::PerspectiveCamera;

/// Output target whose size follows the window.
pub trait RenderSurface {
    /// Set the logical size in window coordinates.
    fn set_size(&mut self, width: u32, height: u32);
    /// Set how many physical pixels back each logical pixel.
    fn set_pixel_ratio(&mut self, ratio: f32);
}

/// Window size in logical pixels plus the display's pixel density.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
    pub device_pixel_ratio: f32,
}

impl Viewport {
    pub fn new(width: u32, height: u32, device_pixel_ratio: f32) -> Self {
        Self {
            width,
            height,
            device_pixel_ratio,
        }
    }

    /// Build from a physical size and scale factor, as windowing systems report them.
    pub fn from_physical(width: u32, height: u32, scale_factor: f64) -> Self {
        let scale = if scale_factor > 0.0 { scale_factor } else { 1.0 };
        Self {
            width: (width as f64 / scale).round() as u32,
            height: (height as f64 / scale).round() as u32,
            device_pixel_ratio: scale as f32,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Keeps the camera and output surface in step with the window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResizeResponder {
    pub max_pixel_ratio: f32,
}

impl Default for ResizeResponder {
    fn default() -> Self {
        Self { max_pixel_ratio: 2.0 }
    }
}

impl ResizeResponder {
    pub fn new(max_pixel_ratio: f32) -> Self {
        Self { max_pixel_ratio }
    }

    pub fn pixel_ratio(&self, viewport: &Viewport) -> f32 {
        viewport.device_pixel_ratio.min(self.max_pixel_ratio)
    }

    /// Backbuffer size for `viewport`, at least 1x1.
    pub fn physical_size(&self, viewport: &Viewport) -> (u32, u32) {
        let ratio = self.pixel_ratio(viewport);
        (
            ((viewport.width as f32 * ratio).round() as u32).max(1),
            ((viewport.height as f32 * ratio).round() as u32).max(1),
        )
    }

    /// Apply a resize. A zero-sized viewport (minimized window) is skipped.
    pub fn respond(
        &self,
        viewport: Viewport,
        camera: &mut PerspectiveCamera,
        surface: &mut impl RenderSurface,
    ) -> bool {
        if viewport.is_empty() {
            tracing::debug!(?viewport, "ignoring resize to empty viewport");
            return false;
        }
        camera.set_viewport(viewport.width, viewport.height);
        surface.set_size(viewport.width, viewport.height);
        surface.set_pixel_ratio(self.pixel_ratio(&viewport));
        tracing::debug!(
            width = viewport.width,
            height = viewport.height,
            aspect = camera.aspect,
            "viewport resized"
        );
        true
    }
}
