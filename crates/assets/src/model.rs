use crate::AssetError;
use atrium_common::Transform;
use glam::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

/// One triangle list with a single material slot.
#[derive(Debug, Clone, Default)]
pub struct Primitive {
    pub vertices: Vec<MeshVertex>,
    pub indices: Vec<u32>,
    pub material: Option<usize>,
}

#[derive(Debug, Clone, Default)]
pub struct MeshData {
    pub name: Option<String>,
    pub primitives: Vec<Primitive>,
}

/// Physically based surface parameters, metal/rough workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialData {
    pub name: String,
    pub base_color: [f32; 4],
    pub metalness: f32,
    pub roughness: f32,
    pub opacity: f32,
    pub transparent: bool,
}

impl Default for MaterialData {
    fn default() -> Self {
        Self {
            name: "default".into(),
            base_color: [1.0, 1.0, 1.0, 1.0],
            metalness: 0.0,
            roughness: 1.0,
            opacity: 1.0,
            transparent: false,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ModelNode {
    pub name: Option<String>,
    pub transform: Transform,
    pub children: Vec<usize>,
    pub mesh: Option<usize>,
}

/// Picks one child of a node: by its stable name, or by position among the
/// node's children when the asset carries no usable names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChildSelector {
    Name(String),
    Index(usize),
}

impl std::fmt::Display for ChildSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Name(name) => write!(f, "name {name:?}"),
            Self::Index(i) => write!(f, "index {i}"),
        }
    }
}

/// A decoded glTF scene: node hierarchy, meshes and materials.
///
/// Node, mesh and material indices match the source document.
#[derive(Debug, Clone, Default)]
pub struct ModelData {
    pub nodes: Vec<ModelNode>,
    pub roots: Vec<usize>,
    pub meshes: Vec<MeshData>,
    pub materials: Vec<MaterialData>,
}

impl ModelData {
    /// Parse `.gltf` or `.glb` bytes. External buffers resolve against `base_dir`.
    pub fn import(bytes: &[u8], base_dir: Option<&Path>) -> Result<Self, AssetError> {
        let gltf::Gltf { document, blob } = gltf::Gltf::from_slice(bytes)?;
        let buffers = gltf::import_buffers(&document, base_dir, blob)?;
        Self::from_document(&document, &buffers)
    }

    fn from_document(
        document: &gltf::Document,
        buffers: &[gltf::buffer::Data],
    ) -> Result<Self, AssetError> {
        let materials = document
            .materials()
            .map(|material| {
                let pbr = material.pbr_metallic_roughness();
                let base_color = pbr.base_color_factor();
                MaterialData {
                    name: material
                        .name()
                        .map(str::to_string)
                        .unwrap_or_else(|| format!("material_{}", material.index().unwrap_or(0))),
                    base_color,
                    metalness: pbr.metallic_factor(),
                    roughness: pbr.roughness_factor(),
                    opacity: base_color[3],
                    transparent: matches!(material.alpha_mode(), gltf::material::AlphaMode::Blend),
                }
            })
            .collect();

        let mut meshes = Vec::new();
        for mesh in document.meshes() {
            let mut primitives = Vec::new();
            for primitive in mesh.primitives() {
                if !matches!(primitive.mode(), gltf::mesh::Mode::Triangles) {
                    tracing::debug!(mesh = mesh.index(), mode = ?primitive.mode(), "skipping non-triangle primitive");
                    continue;
                }
                let reader = primitive
                    .reader(|buffer| buffers.get(buffer.index()).map(|data| data.0.as_slice()));
                let positions: Vec<[f32; 3]> = reader
                    .read_positions()
                    .map(|iter| iter.collect())
                    .unwrap_or_default();
                if positions.is_empty() {
                    continue;
                }
                let indices: Vec<u32> = reader
                    .read_indices()
                    .map(|read| read.into_u32().collect())
                    .unwrap_or_else(|| (0..positions.len() as u32).collect());
                let normals: Vec<[f32; 3]> = reader
                    .read_normals()
                    .map(|iter| iter.collect())
                    .unwrap_or_else(|| smooth_normals(&positions, &indices));

                let vertices = positions
                    .iter()
                    .enumerate()
                    .map(|(i, position)| MeshVertex {
                        position: *position,
                        normal: normals.get(i).copied().unwrap_or([0.0, 1.0, 0.0]),
                    })
                    .collect();
                primitives.push(Primitive {
                    vertices,
                    indices,
                    material: primitive.material().index(),
                });
            }
            meshes.push(MeshData {
                name: mesh.name().map(str::to_string),
                primitives,
            });
        }

        let nodes = document
            .nodes()
            .map(|node| {
                let (translation, rotation, scale) = node.transform().decomposed();
                ModelNode {
                    name: node.name().map(str::to_string),
                    transform: Transform {
                        position: Vec3::from(translation),
                        rotation: Quat::from_array(rotation),
                        scale: Vec3::from(scale),
                    },
                    children: node.children().map(|child| child.index()).collect(),
                    mesh: node.mesh().map(|mesh| mesh.index()),
                }
            })
            .collect();

        let roots: Vec<usize> = document
            .default_scene()
            .or_else(|| document.scenes().next())
            .map(|scene| scene.nodes().map(|node| node.index()).collect())
            .unwrap_or_default();
        if roots.is_empty() {
            return Err(AssetError::EmptyModel);
        }

        Ok(Self {
            nodes,
            roots,
            meshes,
            materials,
        })
    }

    /// Find a top-level node of the scene by name.
    pub fn find_root(&self, name: &str) -> Option<usize> {
        self.roots
            .iter()
            .copied()
            .find(|&i| self.node_name(i) == Some(name))
    }

    /// Resolve a child of `parent`.
    pub fn child(&self, parent: usize, selector: &ChildSelector) -> Option<usize> {
        let children = &self.nodes.get(parent)?.children;
        match selector {
            ChildSelector::Name(name) => children
                .iter()
                .copied()
                .find(|&i| self.node_name(i) == Some(name.as_str())),
            ChildSelector::Index(i) => children.get(*i).copied(),
        }
    }

    pub fn node_name(&self, index: usize) -> Option<&str> {
        self.nodes.get(index).and_then(|node| node.name.as_deref())
    }

    pub fn material(&self, index: Option<usize>) -> Option<&MaterialData> {
        index.and_then(|i| self.materials.get(i))
    }

    pub fn triangle_count(&self) -> usize {
        self.meshes
            .iter()
            .flat_map(|mesh| &mesh.primitives)
            .map(|p| p.indices.len() / 3)
            .sum()
    }

    /// Walk every node reachable from the scene roots, depth first, passing
    /// its world matrix under `root`.
    pub fn visit(&self, root: Mat4, mut f: impl FnMut(usize, &Mat4)) {
        let mut stack: Vec<(usize, Mat4)> = self.roots.iter().rev().map(|&i| (i, root)).collect();
        while let Some((index, parent)) = stack.pop() {
            let Some(node) = self.nodes.get(index) else {
                continue;
            };
            let world = parent * node.transform.to_matrix();
            f(index, &world);
            for &child in node.children.iter().rev() {
                stack.push((child, world));
            }
        }
    }
}

fn smooth_normals(positions: &[[f32; 3]], indices: &[u32]) -> Vec<[f32; 3]> {
    let mut acc = vec![Vec3::ZERO; positions.len()];
    for tri in indices.chunks_exact(3) {
        let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
        if a >= positions.len() || b >= positions.len() || c >= positions.len() {
            continue;
        }
        let (pa, pb, pc) = (
            Vec3::from(positions[a]),
            Vec3::from(positions[b]),
            Vec3::from(positions[c]),
        );
        let face = (pb - pa).cross(pc - pa);
        acc[a] += face;
        acc[b] += face;
        acc[c] += face;
    }
    acc.into_iter()
        .map(|n| n.try_normalize().unwrap_or(Vec3::Y).to_array())
        .collect()
}
