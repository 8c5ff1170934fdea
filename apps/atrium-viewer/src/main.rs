use anyhow::{Context as _, Result};
use atrium_assets::{AssetError, LoadedAsset};
use atrium_overlay::BarAnchor;
use atrium_render::{DragMode, TickOutcome, Viewport};
use atrium_render_wgpu::{SurfaceFrame, SurfaceOptions, SurfaceRenderer};
use atrium_scene::{SceneConfig, SceneContext};
use clap::Parser;
use egui::Context as EguiContext;
use glam::Vec2;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

#[derive(Parser)]
#[command(name = "atrium-viewer", about = "Atrium showcase viewer")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Scene config (YAML); built-in defaults when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Asset root directory, overriding the config
    #[arg(long)]
    assets: Option<PathBuf>,
}

/// A settled asset request, forwarded from its loader thread.
struct AssetSettled {
    url: String,
    result: Result<LoadedAsset, AssetError>,
}

/// Window-bound state, created once the event loop is running.
struct Gfx {
    window: Arc<Window>,
    renderer: SurfaceRenderer,
    egui_winit: egui_winit::State,
    egui_renderer: egui_wgpu::Renderer,
}

struct ViewerApp {
    scene: SceneContext,
    started: Instant,
    gfx: Option<Gfx>,
    egui_ctx: EguiContext,
    cursor: Vec2,
    failure: Option<anyhow::Error>,
}

impl ViewerApp {
    fn new(scene: SceneContext, started: Instant) -> Self {
        Self {
            scene,
            started,
            gfx: None,
            egui_ctx: EguiContext::default(),
            cursor: Vec2::ZERO,
            failure: None,
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        tracing::error!("{err:#}");
        self.failure = Some(err);
        event_loop.exit();
    }

    fn init_gfx(&mut self, event_loop: &ActiveEventLoop) -> Result<Gfx> {
        let cfg = &self.scene.config().renderer;
        let attrs = Window::default_attributes()
            .with_title(cfg.title.clone())
            .with_inner_size(LogicalSize::new(cfg.window_width, cfg.window_height));
        let options = SurfaceOptions {
            msaa_samples: if cfg.antialias { 4 } else { 1 },
            ..SurfaceOptions::default()
        };
        let window = Arc::new(event_loop.create_window(attrs).context("create window")?);

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance
            .create_surface(window.clone())
            .context("create surface")?;

        let size = window.inner_size();
        let viewport = Viewport::from_physical(size.width, size.height, window.scale_factor());
        let pixel_ratio = self.scene.resize_responder().pixel_ratio(&viewport);
        let logical = (viewport.width.max(1), viewport.height.max(1));
        let mut renderer = pollster::block_on(SurfaceRenderer::new(
            &instance,
            surface,
            logical,
            pixel_ratio,
            options,
        ))?;
        self.scene.resize(viewport, &mut renderer);

        let egui_winit = egui_winit::State::new(
            self.egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        let egui_renderer =
            egui_wgpu::Renderer::new(renderer.device(), renderer.format(), None, 1, false);

        tracing::info!(scene = %self.scene.id(), backend = renderer.backend(), "viewer ready");
        Ok(Gfx {
            window,
            renderer,
            egui_winit,
            egui_renderer,
        })
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let now = self.started.elapsed();
        let Some(gfx) = self.gfx.as_mut() else {
            return;
        };
        match self.scene.frame(now, &mut gfx.renderer) {
            Ok(TickOutcome::Rendered(Some(frame))) => {
                paint_ui(&self.egui_ctx, gfx, &mut self.scene, now, frame);
            }
            Ok(TickOutcome::Rendered(None)) => {}
            Ok(TickOutcome::Stopped) => event_loop.exit(),
            Err(e) => self.fail(event_loop, e.into()),
        }
    }
}

impl ApplicationHandler<AssetSettled> for ViewerApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.gfx.is_some() {
            return;
        }
        match self.init_gfx(event_loop) {
            Ok(gfx) => self.gfx = Some(gfx),
            Err(e) => self.fail(event_loop, e),
        }
    }

    fn user_event(&mut self, event_loop: &ActiveEventLoop, event: AssetSettled) {
        let now = self.started.elapsed();
        if let Err(e) = self.scene.on_asset_settled(now, &event.url, event.result) {
            self.fail(event_loop, e.into());
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(gfx) = self.gfx.as_mut() else {
            return;
        };
        if gfx.egui_winit.on_window_event(&gfx.window, &event).consumed {
            return;
        }

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            // A scale factor change is followed by a Resized carrying the new
            // physical size, so both are handled here.
            WindowEvent::Resized(size) => {
                let viewport =
                    Viewport::from_physical(size.width, size.height, gfx.window.scale_factor());
                self.scene.resize(viewport, &mut gfx.renderer);
            }
            WindowEvent::MouseInput { state, button, .. } => {
                let mode = match button {
                    MouseButton::Left => DragMode::Rotate,
                    MouseButton::Right => DragMode::Pan,
                    _ => return,
                };
                let (controls, _) = self.scene.controls_mut();
                match state {
                    ElementState::Pressed => controls.pointer_down(mode, self.cursor),
                    ElementState::Released => controls.pointer_up(),
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                let logical = position.to_logical::<f32>(gfx.window.scale_factor());
                self.cursor = Vec2::new(logical.x, logical.y);
                let (controls, camera) = self.scene.controls_mut();
                controls.pointer_move(camera, self.cursor);
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let dy = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(p) => p.y as f32,
                };
                // Scrolling up reports positive y and moves closer.
                let (controls, _) = self.scene.controls_mut();
                controls.wheel(-dy);
            }
            WindowEvent::RedrawRequested => {
                self.redraw(event_loop);
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(gfx) = &self.gfx {
            gfx.window.request_redraw();
        }
    }
}

fn millis(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

fn draw_ui(ctx: &EguiContext, scene: &mut SceneContext, now: Duration) {
    egui::Window::new("Stats")
        .anchor(egui::Align2::LEFT_TOP, [8.0, 8.0])
        .resizable(false)
        .collapsible(false)
        .show(ctx, |ui| {
            let stats = scene.stats();
            ui.label(format!("{:.0} fps", stats.fps()));
            ui.label(format!(
                "frame {:.2} ms  avg {:.2}  min {:.2}  max {:.2}",
                millis(stats.last()),
                millis(stats.average()),
                millis(stats.min()),
                millis(stats.max())
            ));
        });

    let sun = scene.config().sun.clone();
    let mut intensity = scene.scene().sun.intensity;
    egui::Window::new("Debug")
        .anchor(egui::Align2::RIGHT_TOP, [-8.0, 8.0])
        .resizable(false)
        .show(ctx, |ui| {
            let slider = egui::Slider::new(&mut intensity, sun.intensity_min..=sun.intensity_max)
                .step_by(sun.intensity_step as f64)
                .text("sunLight intensity");
            if ui.add(slider).changed() {
                scene.set_sun_intensity(intensity);
            }
        });

    let screen = scene.screen();
    let painter = ctx.layer_painter(egui::LayerId::new(
        egui::Order::Foreground,
        egui::Id::new("loading_screen"),
    ));
    let rect = ctx.screen_rect();

    let bar = screen.progress_bar().visual(now);
    if bar.scale_x > 0.0 {
        let width = rect.width() * bar.scale_x;
        let (left, right) = match bar.anchor {
            BarAnchor::Left => (rect.left(), rect.left() + width),
            BarAnchor::Right => (rect.right() - width, rect.right()),
        };
        let y = rect.center().y;
        painter.rect_filled(
            egui::Rect::from_min_max(egui::pos2(left, y - 1.0), egui::pos2(right, y + 1.0)),
            0.0,
            egui::Color32::WHITE,
        );
    }

    let text = screen.inform_text();
    if text.is_visible() {
        let alpha = (text.opacity().clamp(0.0, 1.0) * 255.0).round() as u8;
        painter.text(
            rect.center() + egui::vec2(0.0, 32.0),
            egui::Align2::CENTER_CENTER,
            screen.inform_message(),
            egui::FontId::proportional(18.0),
            egui::Color32::from_white_alpha(alpha),
        );
    }
}

/// Lay the UI out in window points but rasterize it at the backbuffer's
/// pixel ratio, which is capped below the window's scale factor on dense
/// displays.
fn pin_pixels_per_point(raw_input: &mut egui::RawInput, pixels_per_point: f32) {
    raw_input
        .viewports
        .entry(egui::ViewportId::ROOT)
        .or_default()
        .native_pixels_per_point = Some(pixels_per_point);
}

/// Run the UI for this frame, draw it over the rendered scene and present.
fn paint_ui(
    egui_ctx: &EguiContext,
    gfx: &mut Gfx,
    scene: &mut SceneContext,
    now: Duration,
    frame: SurfaceFrame,
) {
    // The backbuffer follows the capped pixel ratio, not the window's.
    let pixels_per_point = gfx.renderer.pixel_ratio();
    let mut raw_input = gfx.egui_winit.take_egui_input(&gfx.window);
    pin_pixels_per_point(&mut raw_input, pixels_per_point);
    let full_output = egui_ctx.run(raw_input, |ctx| draw_ui(ctx, scene, now));
    gfx.egui_winit
        .handle_platform_output(&gfx.window, full_output.platform_output);

    let paint_jobs = egui_ctx.tessellate(full_output.shapes, pixels_per_point);
    let (width, height) = gfx.renderer.physical_size();
    let screen_descriptor = egui_wgpu::ScreenDescriptor {
        size_in_pixels: [width, height],
        pixels_per_point,
    };

    let device = gfx.renderer.device();
    let queue = gfx.renderer.queue();
    for (id, image_delta) in &full_output.textures_delta.set {
        gfx.egui_renderer
            .update_texture(device, queue, *id, image_delta);
    }
    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("egui_encoder"),
    });
    let extra = gfx.egui_renderer.update_buffers(
        device,
        queue,
        &mut encoder,
        &paint_jobs,
        &screen_descriptor,
    );
    {
        let mut pass = encoder
            .begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("egui_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &frame.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                ..Default::default()
            })
            .forget_lifetime();
        gfx.egui_renderer
            .render(&mut pass, &paint_jobs, &screen_descriptor);
    }
    queue.submit(extra.into_iter().chain(std::iter::once(encoder.finish())));
    for id in &full_output.textures_delta.free {
        gfx.egui_renderer.free_texture(id);
    }

    frame.present();
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .init();

    tracing::info!("atrium-viewer starting");

    let mut config = match &cli.config {
        Some(path) => SceneConfig::load(path)?,
        None => SceneConfig::default(),
    };
    if let Some(root) = cli.assets {
        config.assets.root = root;
    }
    let mut scene = SceneContext::new(config)?;

    let event_loop = EventLoop::<AssetSettled>::with_user_event().build()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let requests = scene.begin_loading()?;
    let started = Instant::now();
    let proxy = event_loop.create_proxy();
    let _loaders = atrium_assets::dispatch(&scene.asset_root(), &requests, move |request, result| {
        let event = AssetSettled {
            url: request.url,
            result,
        };
        if proxy.send_event(event).is_err() {
            tracing::debug!("event loop closed before the asset settled");
        }
    })?;

    let mut app = ViewerApp::new(scene, started);
    event_loop.run_app(&mut app)?;

    match app.failure.take() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
