use atrium_assets::{CubeMap, MaterialData, ModelData};
use atrium_common::{Color, Transform};
use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Linear fog between `near` and `far` distances from the camera.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fog {
    pub color: Color,
    pub near: f32,
    pub far: f32,
}

impl Fog {
    /// Fog amount at `distance`, 0 (clear) to 1 (fully fogged).
    pub fn factor(&self, distance: f32) -> f32 {
        if self.far <= self.near {
            return if distance >= self.far { 1.0 } else { 0.0 };
        }
        ((distance - self.near) / (self.far - self.near)).clamp(0.0, 1.0)
    }
}

/// Directional light shining from `position` toward the origin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectionalLight {
    pub color: Color,
    pub intensity: f32,
    pub position: Vec3,
}

impl DirectionalLight {
    /// Unit vector pointing from the lit surface toward the light.
    pub fn direction(&self) -> Vec3 {
        self.position.normalize_or(Vec3::Y)
    }
}

impl Default for DirectionalLight {
    fn default() -> Self {
        Self {
            color: Color::WHITE,
            intensity: 2.0,
            position: Vec3::new(15.0, 25.0, -20.0),
        }
    }
}

/// A model instance in the scene, with per-node material overrides.
#[derive(Debug, Clone)]
pub struct PlacedModel {
    pub model: Arc<ModelData>,
    pub transform: Transform,
    overrides: BTreeMap<usize, MaterialData>,
}

impl PlacedModel {
    pub fn new(model: Arc<ModelData>, transform: Transform) -> Self {
        Self {
            model,
            transform,
            overrides: BTreeMap::new(),
        }
    }

    /// Replace the material of every primitive under `node`, the node itself included.
    pub fn override_material(&mut self, node: usize, material: MaterialData) {
        let mut stack = vec![node];
        while let Some(index) = stack.pop() {
            let Some(n) = self.model.nodes.get(index) else {
                continue;
            };
            self.overrides.insert(index, material.clone());
            stack.extend(n.children.iter().copied());
        }
    }

    pub fn material_override(&self, node: usize) -> Option<&MaterialData> {
        self.overrides.get(&node)
    }
}

/// One primitive to draw, fully resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawItem {
    pub model: usize,
    pub node: usize,
    pub mesh: usize,
    pub primitive: usize,
    pub world: Mat4,
    pub material: MaterialData,
}

impl DrawItem {
    pub fn is_transparent(&self) -> bool {
        self.material.transparent || self.material.opacity < 1.0
    }
}

/// Everything the renderer draws: background, fog, the sun, placed models,
/// the environment map applied to every material, and the loading overlay.
#[derive(Debug, Clone)]
pub struct Scene {
    pub clear_color: Color,
    pub fog: Option<Fog>,
    pub sun: DirectionalLight,
    /// Alpha of the black overlay drawn over everything else.
    pub overlay_alpha: f32,
    models: Vec<PlacedModel>,
    environment: Option<Arc<CubeMap>>,
    revision: u64,
}

impl Default for Scene {
    fn default() -> Self {
        Self {
            clear_color: Color::BLACK,
            fog: None,
            sun: DirectionalLight::default(),
            overlay_alpha: 1.0,
            models: Vec::new(),
            environment: None,
            revision: 0,
        }
    }
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_model(&mut self, placed: PlacedModel) -> usize {
        self.models.push(placed);
        self.revision += 1;
        self.models.len() - 1
    }

    pub fn models(&self) -> &[PlacedModel] {
        &self.models
    }

    pub fn set_environment(&mut self, cube: Arc<CubeMap>) {
        self.environment = Some(cube);
        self.revision += 1;
    }

    pub fn environment(&self) -> Option<&Arc<CubeMap>> {
        self.environment.as_ref()
    }

    /// Bumped whenever models or the environment change, so backends know
    /// when to re-upload GPU resources.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Resolve every primitive in the scene. Opaque items come first, then
    /// transparent ones, each group in scene order.
    pub fn draw_items(&self) -> Vec<DrawItem> {
        let mut opaque = Vec::new();
        let mut transparent = Vec::new();
        for (model_index, placed) in self.models.iter().enumerate() {
            let model = &placed.model;
            model.visit(placed.transform.to_matrix(), |node, world| {
                let Some(mesh_index) = model.nodes.get(node).and_then(|n| n.mesh) else {
                    return;
                };
                let Some(mesh) = model.meshes.get(mesh_index) else {
                    return;
                };
                for (primitive, prim) in mesh.primitives.iter().enumerate() {
                    let material = placed
                        .material_override(node)
                        .or_else(|| model.material(prim.material))
                        .cloned()
                        .unwrap_or_default();
                    let item = DrawItem {
                        model: model_index,
                        node,
                        mesh: mesh_index,
                        primitive,
                        world: *world,
                        material,
                    };
                    if item.is_transparent() {
                        transparent.push(item);
                    } else {
                        opaque.push(item);
                    }
                }
            });
        }
        opaque.extend(transparent);
        opaque
    }
}
