use crate::gpu::WgpuRenderer;
use atrium_render::{PerspectiveCamera, RenderError, RenderSurface, Renderer, Scene};

/// Startup options for [`SurfaceRenderer`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceOptions {
    /// Requested MSAA sample count; falls back to 1 when unsupported.
    pub msaa_samples: u32,
    pub vsync: bool,
}

impl Default for SurfaceOptions {
    fn default() -> Self {
        Self {
            msaa_samples: 4,
            vsync: true,
        }
    }
}

/// A rendered frame not yet presented. Draw overlays (UI) into `view`, then
/// call [`present`](Self::present).
pub struct SurfaceFrame {
    pub texture: wgpu::SurfaceTexture,
    pub view: wgpu::TextureView,
}

impl SurfaceFrame {
    pub fn present(self) {
        self.texture.present();
    }
}

/// Owns the GPU device and window surface and renders scenes into it.
///
/// The surface follows a logical size and a pixel ratio; the backbuffer is
/// their product. Size changes are applied lazily at the next render.
pub struct SurfaceRenderer {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    scene: WgpuRenderer,
    logical_size: (u32, u32),
    pixel_ratio: f32,
    dirty: bool,
    backend: String,
}

impl SurfaceRenderer {
    /// Pick an adapter for `surface`, open a device and configure the surface.
    pub async fn new(
        instance: &wgpu::Instance,
        surface: wgpu::Surface<'static>,
        logical_size: (u32, u32),
        pixel_ratio: f32,
        options: SurfaceOptions,
    ) -> Result<Self, RenderError> {
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or(RenderError::NoAdapter)?;

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("atrium_device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await
            .map_err(|e| RenderError::Device(e.to_string()))?;

        let caps = surface.get_capabilities(&adapter);
        let format = caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| caps.formats.first())
            .copied()
            .ok_or(RenderError::UnsupportedSurface)?;
        let alpha_mode = caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let flags = adapter.get_texture_format_features(format).flags;
        let sample_count = if flags.sample_count_supported(options.msaa_samples) {
            options.msaa_samples
        } else {
            tracing::warn!(
                requested = options.msaa_samples,
                "MSAA sample count unsupported, rendering without antialiasing"
            );
            1
        };

        let (width, height) = physical_size(logical_size, pixel_ratio);
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width,
            height,
            present_mode: if options.vsync {
                wgpu::PresentMode::AutoVsync
            } else {
                wgpu::PresentMode::AutoNoVsync
            },
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let scene = WgpuRenderer::new(&device, &queue, format, sample_count, width, height);
        let backend = adapter.get_info().backend.to_str().to_string();
        tracing::info!(%backend, ?format, sample_count, width, height, "GPU initialized");

        Ok(Self {
            surface,
            device,
            queue,
            config,
            scene,
            logical_size,
            pixel_ratio,
            dirty: false,
            backend,
        })
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    pub fn format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    pub fn backend(&self) -> &str {
        &self.backend
    }

    pub fn pixel_ratio(&self) -> f32 {
        self.pixel_ratio
    }

    pub fn logical_size(&self) -> (u32, u32) {
        self.logical_size
    }

    /// Backbuffer size in pixels.
    pub fn physical_size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    fn reconfigure(&mut self) {
        let (width, height) = physical_size(self.logical_size, self.pixel_ratio);
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
        self.scene.resize(&self.device, width, height);
        self.dirty = false;
        tracing::debug!(width, height, pixel_ratio = self.pixel_ratio, "surface configured");
    }
}

impl RenderSurface for SurfaceRenderer {
    fn set_size(&mut self, width: u32, height: u32) {
        if self.logical_size != (width, height) {
            self.logical_size = (width, height);
            self.dirty = true;
        }
    }

    fn set_pixel_ratio(&mut self, ratio: f32) {
        if self.pixel_ratio != ratio {
            self.pixel_ratio = ratio;
            self.dirty = true;
        }
    }
}

impl Renderer for SurfaceRenderer {
    /// `None` when the surface had to be reconfigured and this frame was skipped.
    type Output = Option<SurfaceFrame>;

    fn render(&mut self, scene: &Scene, camera: &PerspectiveCamera) -> Result<Self::Output, RenderError> {
        if self.dirty {
            self.reconfigure();
        }

        let texture = match self.surface.get_current_texture() {
            Ok(t) => t,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                tracing::debug!("surface lost or outdated, reconfiguring");
                self.reconfigure();
                return Ok(None);
            }
            Err(wgpu::SurfaceError::Timeout) => {
                tracing::warn!("surface frame timed out, skipping frame");
                return Ok(None);
            }
            Err(wgpu::SurfaceError::OutOfMemory) => return Err(RenderError::OutOfMemory),
            Err(e) => return Err(RenderError::Frame(e.to_string())),
        };

        let view = texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        self.scene
            .render(&self.device, &self.queue, &view, scene, camera);
        Ok(Some(SurfaceFrame { texture, view }))
    }
}

fn physical_size(logical: (u32, u32), pixel_ratio: f32) -> (u32, u32) {
    (
        ((logical.0 as f32 * pixel_ratio).round() as u32).max(1),
        ((logical.1 as f32 * pixel_ratio).round() as u32).max(1),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn physical_size_scales_and_clamps() {
        assert_eq!(physical_size((1280, 720), 2.0), (2560, 1440));
        assert_eq!(physical_size((1280, 720), 1.5), (1920, 1080));
        assert_eq!(physical_size((0, 0), 2.0), (1, 1));
    }

    #[test]
    fn default_options_request_msaa() {
        let options = SurfaceOptions::default();
        assert_eq!(options.msaa_samples, 4);
        assert!(options.vsync);
    }
}
