use crate::camera::PerspectiveCamera;
use crate::scene::Scene;
use std::fmt::Write;

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("no suitable GPU adapter found")]
    NoAdapter,
    #[error("failed to create surface: {0}")]
    Surface(String),
    #[error("failed to request device: {0}")]
    Device(String),
    #[error("surface is not supported by the adapter")]
    UnsupportedSurface,
    #[error("GPU out of memory")]
    OutOfMemory,
    #[error("surface frame acquisition failed: {0}")]
    Frame(String),
}

/// Renderer-agnostic interface. All renderers implement this trait.
///
/// A renderer reads the scene and the camera and produces one frame. It
/// never mutates the scene.
pub trait Renderer {
    /// The output type produced by this renderer.
    type Output;

    /// Render one frame of `scene` as seen from `camera`.
    fn render(&mut self, scene: &Scene, camera: &PerspectiveCamera) -> Result<Self::Output, RenderError>;
}

/// Renders the scene as text. Used by the CLI and in tests.
#[derive(Debug, Default)]
pub struct DebugTextRenderer {
    frames: u64,
}

impl DebugTextRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl Renderer for DebugTextRenderer {
    type Output = String;

    fn render(&mut self, scene: &Scene, camera: &PerspectiveCamera) -> Result<String, RenderError> {
        self.frames += 1;
        let items = scene.draw_items();
        let transparent = items.iter().filter(|i| i.is_transparent()).count();

        let mut out = String::new();
        // Writing to a String cannot fail.
        let _ = writeln!(
            out,
            "=== Scene (frame={}, revision={}) ===",
            self.frames,
            scene.revision()
        );
        let _ = writeln!(
            out,
            "Background: {}  Overlay alpha: {:.3}",
            scene.clear_color, scene.overlay_alpha
        );
        let _ = writeln!(
            out,
            "Camera: eye=({:.1}, {:.1}, {:.1}) target=({:.1}, {:.1}, {:.1}) fov={:.0} aspect={:.3}",
            camera.position.x,
            camera.position.y,
            camera.position.z,
            camera.target.x,
            camera.target.y,
            camera.target.z,
            camera.fov_degrees,
            camera.aspect
        );
        let sun = &scene.sun;
        let _ = writeln!(
            out,
            "Sun: {} x{:.1} from ({:.1}, {:.1}, {:.1})",
            sun.color, sun.intensity, sun.position.x, sun.position.y, sun.position.z
        );
        match &scene.fog {
            Some(fog) => {
                let _ = writeln!(out, "Fog: {} {:.0}..{:.0}", fog.color, fog.near, fog.far);
            }
            None => {
                let _ = writeln!(out, "Fog: none");
            }
        }
        match scene.environment() {
            Some(env) => {
                let _ = writeln!(out, "Environment: cube {}px", env.size());
            }
            None => {
                let _ = writeln!(out, "Environment: none");
            }
        }
        let _ = writeln!(
            out,
            "Models: {}  Draw items: {} ({} transparent)",
            scene.models().len(),
            items.len(),
            transparent
        );
        for item in &items {
            let p = item.world.w_axis;
            let _ = writeln!(
                out,
                "  [m{} n{} p{}] {} at ({:.2}, {:.2}, {:.2}) opacity={:.2}",
                item.model,
                item.node,
                item.primitive,
                item.material.name,
                p.x,
                p.y,
                p.z,
                item.material.opacity
            );
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{PlacedModel, tests::building};
    use atrium_common::Transform;
    use std::sync::Arc;

    #[test]
    fn empty_scene() {
        let mut renderer = DebugTextRenderer::new();
        let output = renderer
            .render(&Scene::new(), &PerspectiveCamera::default())
            .unwrap();

        assert!(output.contains("frame=1"));
        assert!(output.contains("Models: 0"));
        assert!(output.contains("Overlay alpha: 1.000"));
        assert!(output.contains("Environment: none"));
    }

    #[test]
    fn lists_draw_items() {
        let mut scene = Scene::new();
        scene.add_model(PlacedModel::new(Arc::new(building()), Transform::uniform_scale(5.0)));
        let mut renderer = DebugTextRenderer::new();
        let output = renderer.render(&scene, &PerspectiveCamera::default()).unwrap();

        assert!(output.contains("Draw items: 2 (0 transparent)"));
        assert!(output.contains("concrete"));
        renderer.render(&scene, &PerspectiveCamera::default()).unwrap();
        assert_eq!(renderer.frames(), 2);
    }
}
