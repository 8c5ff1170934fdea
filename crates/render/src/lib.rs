//! Renderer-agnostic scene model and frame loop.
//!
//! # Invariants
//! - Renderers read the scene; they never mutate it.
//! - Within one tick, camera controls update strictly before the render.
//! - Once the stop token is raised, ticks do no work.

mod camera;
mod controls;
mod driver;
mod renderer;
mod resize;
mod scene;
mod stats;

pub use camera::PerspectiveCamera;
pub use controls::{CameraControls, DragMode, OrbitConfig, OrbitControls};
pub use driver::{FrameDriver, StopToken, TickOutcome};
pub use renderer::{DebugTextRenderer, RenderError, Renderer};
pub use resize::{RenderSurface, ResizeResponder, Viewport};
pub use scene::{DirectionalLight, DrawItem, Fog, PlacedModel, Scene};
pub use stats::FrameStats;

pub fn crate_info() -> &'static str {
    "atrium-render v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("render"));
    }
}
