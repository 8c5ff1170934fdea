use atrium_assets::{AssetRequest, AssetRoot, ChildSelector, CubeFace, MaterialData};
use atrium_common::Color;
use atrium_overlay::FadeConfig;
use atrium_render::{DirectionalLight, Fog, OrbitConfig, PerspectiveCamera};
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config YAML: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Where the scene's assets live and which URLs make up the manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetsConfig {
    /// Directory the asset URLs resolve against.
    pub root: PathBuf,
    pub model: String,
    /// URL directory holding the six cube faces, named `px`, `nx`, `py`, `ny`, `pz`, `nz`.
    pub environment_dir: String,
    pub environment_ext: String,
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("./static"),
            model: "/model/model.gltf".into(),
            environment_dir: "/texture/environmentMaps/2".into(),
            environment_ext: "jpg".into(),
        }
    }
}

impl AssetsConfig {
    pub fn face_url(&self, face: CubeFace) -> String {
        format!(
            "{}/{}.{}",
            self.environment_dir.trim_end_matches('/'),
            face.stem(),
            self.environment_ext
        )
    }
}

/// A sub-mesh that receives the glass material: a top-level node found by
/// name, then one of its children.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlassTarget {
    pub root: String,
    pub child: ChildSelector,
    /// Tried when `child` does not resolve.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback: Option<ChildSelector>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub scale: f32,
    pub glass_targets: Vec<GlassTarget>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            scale: 5.0,
            glass_targets: vec![
                GlassTarget {
                    root: "bulding_01".into(),
                    child: ChildSelector::Index(2),
                    fallback: None,
                },
                GlassTarget {
                    root: "bulding_00_whole".into(),
                    child: ChildSelector::Index(13),
                    fallback: None,
                },
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlassConfig {
    pub color: Color,
    pub metalness: f32,
    pub roughness: f32,
    pub opacity: f32,
}

impl Default for GlassConfig {
    fn default() -> Self {
        Self {
            color: Color::WHITE,
            metalness: 0.3,
            roughness: 0.0,
            opacity: 0.3,
        }
    }
}

impl GlassConfig {
    pub fn material(&self) -> MaterialData {
        MaterialData {
            name: "glass".into(),
            base_color: self.color.to_linear(),
            metalness: self.metalness,
            roughness: self.roughness,
            opacity: self.opacity,
            transparent: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SunConfig {
    pub color: Color,
    pub intensity: f32,
    pub position: Vec3,
    /// Range and step of the debug slider.
    pub intensity_min: f32,
    pub intensity_max: f32,
    pub intensity_step: f32,
}

impl Default for SunConfig {
    fn default() -> Self {
        Self {
            color: Color::WHITE,
            intensity: 2.0,
            position: Vec3::new(15.0, 25.0, -20.0),
            intensity_min: 0.0,
            intensity_max: 5.0,
            intensity_step: 0.1,
        }
    }
}

impl SunConfig {
    pub fn light(&self) -> DirectionalLight {
        DirectionalLight {
            color: self.color,
            intensity: self.intensity,
            position: self.position,
        }
    }

    /// Clamp to the slider range and snap to its step.
    pub fn clamp_intensity(&self, value: f32) -> f32 {
        let stepped = if self.intensity_step > 0.0 {
            let steps = ((value - self.intensity_min) / self.intensity_step).round();
            self.intensity_min + steps * self.intensity_step
        } else {
            value
        };
        stepped.clamp(self.intensity_min, self.intensity_max)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    pub antialias: bool,
    pub max_pixel_ratio: f32,
    pub window_width: u32,
    pub window_height: u32,
    pub title: String,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            antialias: true,
            max_pixel_ratio: 2.0,
            window_width: 1280,
            window_height: 720,
            title: "Atrium".into(),
        }
    }
}

/// Every tunable of the scene. Defaults reproduce the showcase as shipped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub assets: AssetsConfig,
    pub model: ModelConfig,
    pub glass: GlassConfig,
    pub sun: SunConfig,
    pub fog: Option<Fog>,
    pub camera: PerspectiveCamera,
    pub controls: OrbitConfig,
    pub loading: FadeConfig,
    pub renderer: RendererConfig,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            assets: AssetsConfig::default(),
            model: ModelConfig::default(),
            glass: GlassConfig::default(),
            sun: SunConfig::default(),
            fog: Some(Fog {
                color: Color::rgb(180.0 / 255.0, 180.0 / 255.0, 180.0 / 255.0),
                near: 45.0,
                far: 80.0,
            }),
            camera: PerspectiveCamera::default(),
            controls: OrbitConfig::default(),
            loading: FadeConfig::default(),
            renderer: RendererConfig::default(),
        }
    }
}

impl SceneConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_yaml(&text)?;
        tracing::info!(path = %path.display(), "loaded scene config");
        Ok(config)
    }

    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| Err(ConfigError::Invalid(msg));
        if self.model.scale <= 0.0 {
            return invalid(format!("model.scale must be positive, got {}", self.model.scale));
        }
        if let Some(fog) = &self.fog {
            if fog.far <= fog.near {
                return invalid(format!("fog.far ({}) must exceed fog.near ({})", fog.far, fog.near));
            }
        }
        if !(0.0..=1.0).contains(&self.glass.opacity) {
            return invalid(format!("glass.opacity must be in [0, 1], got {}", self.glass.opacity));
        }
        let damping = self.controls.damping_factor;
        if self.controls.enable_damping && !(damping > 0.0 && damping <= 1.0) {
            return invalid(format!("controls.damping_factor must be in (0, 1], got {damping}"));
        }
        if self.camera.near <= 0.0 || self.camera.far <= self.camera.near {
            return invalid(format!(
                "camera clip range must satisfy 0 < near < far, got {}..{}",
                self.camera.near, self.camera.far
            ));
        }
        if self.renderer.max_pixel_ratio <= 0.0 {
            return invalid("renderer.max_pixel_ratio must be positive".into());
        }
        if self.sun.intensity_max < self.sun.intensity_min {
            return invalid("sun.intensity_max must not be below sun.intensity_min".into());
        }
        Ok(())
    }

    pub fn asset_root(&self) -> AssetRoot {
        AssetRoot::new(&self.assets.root)
    }

    /// Everything the scene fetches: the model, then the six faces in layer order.
    pub fn manifest(&self) -> Vec<AssetRequest> {
        std::iter::once(AssetRequest::model(&self.assets.model))
            .chain(
                CubeFace::ALL
                    .into_iter()
                    .map(|face| AssetRequest::cube_face(face, self.assets.face_url(face))),
            )
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use atrium_assets::AssetKind;

    #[test]
    fn defaults_match_showcase() {
        let config = SceneConfig::default();
        assert_eq!(config.model.scale, 5.0);
        assert_eq!(config.sun.intensity, 2.0);
        assert_eq!(config.camera.fov_degrees, 75.0);
        assert_eq!(config.controls.damping_factor, 0.05);
        assert_eq!(config.fog.as_ref().unwrap().color.to_hex(), "#b4b4b4");
        assert_eq!(config.loading.total(), std::time::Duration::from_millis(4500));
        config.validate().unwrap();
    }

    #[test]
    fn manifest_lists_model_then_faces() {
        let manifest = SceneConfig::default().manifest();
        let urls: Vec<&str> = manifest.iter().map(|r| r.url.as_str()).collect();
        assert_eq!(
            urls,
            vec![
                "/model/model.gltf",
                "/texture/environmentMaps/2/px.jpg",
                "/texture/environmentMaps/2/nx.jpg",
                "/texture/environmentMaps/2/py.jpg",
                "/texture/environmentMaps/2/ny.jpg",
                "/texture/environmentMaps/2/pz.jpg",
                "/texture/environmentMaps/2/nz.jpg",
            ]
        );
        assert_eq!(manifest[0].kind, AssetKind::Model);
        assert_eq!(manifest[6].kind, AssetKind::CubeFace(CubeFace::Nz));
    }

    #[test]
    fn yaml_round_trip_keeps_defaults() {
        let config = SceneConfig::default();
        let yaml = config.to_yaml().unwrap();
        assert!(yaml.contains("bulding_00_whole"));
        assert_eq!(SceneConfig::from_yaml(&yaml).unwrap(), config);
    }

    #[test]
    fn partial_yaml_fills_defaults() {
        let yaml = r##"
assets:
  root: /srv/atrium
model:
  glass_targets:
    - root: bulding_01
      child: { name: window_glass }
      fallback: { index: 2 }
sun:
  intensity: 3.5
fog: null
"##;
        let config = SceneConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.assets.root, PathBuf::from("/srv/atrium"));
        assert_eq!(config.assets.model, "/model/model.gltf");
        assert_eq!(config.model.scale, 5.0);
        assert_eq!(
            config.model.glass_targets[0].child,
            ChildSelector::Name("window_glass".into())
        );
        assert_eq!(config.model.glass_targets[0].fallback, Some(ChildSelector::Index(2)));
        assert_eq!(config.sun.intensity, 3.5);
        assert!(config.fog.is_none());
    }

    #[test]
    fn invalid_values_are_rejected() {
        let err = SceneConfig::from_yaml("fog: { color: '#000000', near: 80, far: 45 }").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
        let err = SceneConfig::from_yaml("model: { scale: 0 }").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
        let err = SceneConfig::from_yaml("sun: nonsense").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scene.yaml");
        std::fs::write(&path, "camera: { fov_degrees: 60 }\n").unwrap();
        let config = SceneConfig::load(&path).unwrap();
        assert_eq!(config.camera.fov_degrees, 60.0);
        assert_eq!(config.camera.far, 2000.0);
        assert!(matches!(
            SceneConfig::load(&dir.path().join("missing.yaml")),
            Err(ConfigError::Io { .. })
        ));
    }

    #[test]
    fn sun_intensity_snaps_to_slider() {
        let sun = SunConfig::default();
        assert!((sun.clamp_intensity(2.34) - 2.3).abs() < 1e-5);
        assert_eq!(sun.clamp_intensity(9.0), 5.0);
        assert_eq!(sun.clamp_intensity(-1.0), 0.0);
    }
}
