use crate::config::{ConfigError, SceneConfig};
use crate::placement::{place_model, TargetResolution};
use atrium_assets::{
    AssetError, AssetPayload, AssetRequest, AssetRoot, AssetStore, CubeMapBuilder, LoadedAsset,
};
use atrium_common::SceneId;
use atrium_loading::{LoadError, LoadPhase, LoadingManager};
use atrium_overlay::LoadingScreen;
use atrium_render::{
    FrameDriver, FrameStats, OrbitControls, PerspectiveCamera, RenderError, RenderSurface,
    Renderer, ResizeResponder, Scene, StopToken, TickOutcome, Viewport,
};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error(transparent)]
    Asset(#[from] AssetError),
    #[error(transparent)]
    Render(#[from] RenderError),
}

/// One showcase scene instance and everything that drives it: the scene
/// graph, camera and controls, the loading coordinator and the frame loop.
///
/// All methods run on the thread that owns the context. Asset results are
/// produced elsewhere and handed in through
/// [`on_asset_settled`](Self::on_asset_settled).
pub struct SceneContext {
    id: SceneId,
    config: SceneConfig,
    scene: Scene,
    camera: PerspectiveCamera,
    controls: OrbitControls,
    loading: LoadingManager<LoadingScreen>,
    cube: CubeMapBuilder,
    store: AssetStore,
    driver: FrameDriver,
    resize: ResizeResponder,
    glass: Vec<TargetResolution>,
}

impl SceneContext {
    pub fn new(config: SceneConfig) -> Result<Self, SceneError> {
        config.validate()?;
        let id = SceneId::new();

        let mut scene = Scene::new();
        scene.fog = config.fog.clone();
        scene.sun = config.sun.light();

        let controls = OrbitControls::new(config.controls.clone());
        let mut camera = config.camera.clone();
        camera.set_viewport(config.renderer.window_width, config.renderer.window_height);

        tracing::info!(scene = %id, root = %config.assets.root.display(), "scene context created");

        Ok(Self {
            id,
            scene,
            camera,
            controls,
            loading: LoadingManager::new(LoadingScreen::new(config.loading.clone())),
            cube: CubeMapBuilder::new(),
            store: AssetStore::new(),
            driver: FrameDriver::new(),
            resize: ResizeResponder::new(config.renderer.max_pixel_ratio),
            glass: Vec::new(),
            config,
        })
    }

    pub fn id(&self) -> SceneId {
        self.id
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    pub fn asset_root(&self) -> AssetRoot {
        self.config.asset_root()
    }

    /// Register every manifest item with the loading coordinator and return
    /// the requests for the caller to dispatch.
    pub fn begin_loading(&mut self) -> Result<Vec<AssetRequest>, SceneError> {
        let _span = tracing::info_span!("begin_loading", scene = %self.id).entered();
        let manifest = self.config.manifest();
        for request in &manifest {
            self.loading.begin(&request.url)?;
        }
        tracing::info!(items = manifest.len(), "loading started");
        Ok(manifest)
    }

    /// Feed one settled request back in. Successful payloads are applied to
    /// the scene before the coordinator counts them, so completion only fires
    /// once the scene holds every asset.
    ///
    /// `now` is the arrival time since the scene started; the clock is
    /// advanced to it first so completion is stamped when it happened,
    /// not at the last frame.
    pub fn on_asset_settled(
        &mut self,
        now: Duration,
        url: &str,
        result: Result<LoadedAsset, AssetError>,
    ) -> Result<(), SceneError> {
        let _span = tracing::debug_span!("asset_settled", scene = %self.id, url).entered();
        self.advance(now);
        let applied = result.and_then(|asset| self.apply(asset));
        match applied {
            Ok(()) => self.loading.item_loaded(url)?,
            Err(err) => {
                tracing::warn!(url, error = %err, "asset failed to load");
                self.loading.item_failed(url)?;
            }
        }
        Ok(())
    }

    fn apply(&mut self, asset: LoadedAsset) -> Result<(), AssetError> {
        if !self.store.record(&asset) {
            tracing::debug!(url = %asset.url, id = %asset.id, "asset bytes already seen");
        }
        match asset.payload {
            AssetPayload::Model(model) => {
                tracing::info!(
                    url = %asset.url,
                    nodes = model.nodes.len(),
                    triangles = model.triangle_count(),
                    "model loaded"
                );
                let (placed, resolutions) = place_model(model, &self.config);
                self.scene.add_model(placed);
                self.glass = resolutions;
            }
            AssetPayload::CubeFace(face, image) => {
                self.cube.insert(face, image)?;
                if self.cube.is_complete() {
                    let cube = std::mem::take(&mut self.cube).build()?;
                    tracing::info!(size = cube.size(), "environment map assembled");
                    self.scene.set_environment(Arc::new(cube));
                }
            }
        }
        Ok(())
    }

    /// Advance the loading screen to `now` (time since the scene started) and
    /// copy its state into the scene.
    pub fn advance(&mut self, now: Duration) {
        let screen = self.loading.observer_mut();
        screen.advance(now);
        self.scene.overlay_alpha = screen.overlay().alpha;
        if let Some(color) = screen.clear_color() {
            self.scene.clear_color = color;
        }
    }

    /// One iteration of the render loop.
    pub fn tick<R>(&mut self, renderer: &mut R) -> Result<TickOutcome<R::Output>, RenderError>
    where
        R: Renderer + ?Sized,
    {
        self.driver
            .tick(&mut self.controls, &mut self.camera, &self.scene, renderer)
    }

    /// [`advance`](Self::advance) then [`tick`](Self::tick).
    pub fn frame<R>(&mut self, now: Duration, renderer: &mut R) -> Result<TickOutcome<R::Output>, RenderError>
    where
        R: Renderer + ?Sized,
    {
        self.advance(now);
        self.tick(renderer)
    }

    pub fn resize(&mut self, viewport: Viewport, surface: &mut impl RenderSurface) -> bool {
        let applied = self.resize.respond(viewport, &mut self.camera, surface);
        if applied {
            self.controls.set_viewport_height(viewport.height);
        }
        applied
    }

    pub fn set_sun_intensity(&mut self, value: f32) {
        self.scene.sun.intensity = self.config.sun.clamp_intensity(value);
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn camera(&self) -> &PerspectiveCamera {
        &self.camera
    }

    pub fn controls(&self) -> &OrbitControls {
        &self.controls
    }

    /// Controls and camera together, for input handlers that need both.
    pub fn controls_mut(&mut self) -> (&mut OrbitControls, &PerspectiveCamera) {
        (&mut self.controls, &self.camera)
    }

    pub fn loading(&self) -> &LoadingManager<LoadingScreen> {
        &self.loading
    }

    pub fn screen(&self) -> &LoadingScreen {
        self.loading.observer()
    }

    pub fn phase(&self) -> LoadPhase {
        self.loading.phase()
    }

    pub fn store(&self) -> &AssetStore {
        &self.store
    }

    pub fn glass_targets(&self) -> &[TargetResolution] {
        &self.glass
    }

    pub fn stats(&self) -> &FrameStats {
        self.driver.stats()
    }

    pub fn stop_token(&self) -> StopToken {
        self.driver.stop_token()
    }

    pub fn resize_responder(&self) -> &ResizeResponder {
        &self.resize
    }
}
