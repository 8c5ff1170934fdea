//! The architectural showcase scene: configuration, the asset manifest,
//! glass material placement, and [`SceneContext`], which ties loading, the
//! loading screen, camera controls and the frame loop together.
//!
//! # Invariants
//! - Every manifest item is registered before any request is dispatched.
//! - A payload is applied to the scene before its item counts as loaded.
//! - The environment map is set once, when all six faces have arrived.
//! - Missing glass targets leave the model untouched.

mod config;
mod context;
mod placement;

pub use config::{
    AssetsConfig, ConfigError, GlassConfig, GlassTarget, ModelConfig, RendererConfig, SceneConfig,
    SunConfig,
};
pub use context::{SceneContext, SceneError};
pub use placement::{place_model, resolve_target, TargetResolution};

pub fn crate_info() -> &'static str {
    "atrium-scene v0.1.0"
}
