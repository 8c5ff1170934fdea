//! wgpu render backend for the showcase scene.
//!
//! Draws lit meshes and blended glass with a cube-map environment and linear
//! fog, then the loading overlay on top, in one multisampled pass.
//!
//! # Invariants
//! - The renderer never mutates the scene.
//! - GPU meshes and the environment texture are re-uploaded only when the
//!   scene revision changes.
//! - The overlay is drawn last, over every mesh.

mod gpu;
mod shaders;
mod target;

pub use gpu::WgpuRenderer;
pub use target::{SurfaceFrame, SurfaceOptions, SurfaceRenderer};
