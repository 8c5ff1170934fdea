//! Asset loading for the showcase scene: glTF model import, cube-map faces,
//! a content-addressed registry, and threaded dispatch of load requests.
//!
//! # Invariants
//! - Requests resolve against an [`AssetRoot`]; URLs never escape it.
//! - Each request settles exactly once, on its own worker thread, in any
//!   order relative to the others.
//! - Decoded assets carry the content hash of the bytes they came from.

mod cubemap;
mod model;
mod request;
mod store;

use std::path::PathBuf;

pub use cubemap::{CubeFace, CubeMap, CubeMapBuilder, FaceImage};
pub use model::{ChildSelector, MaterialData, MeshData, MeshVertex, ModelData, ModelNode, Primitive};
pub use request::{dispatch, AssetKind, AssetPayload, AssetRequest, AssetRoot, LoadedAsset};
pub use store::{AssetId, AssetRecord, AssetStore};

/// Errors from asset operations.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("asset url escapes the asset root: {0}")]
    OutsideRoot(String),
    #[error("glTF error: {0}")]
    Gltf(#[from] gltf::Error),
    #[error("image decode error: {0}")]
    Image(#[from] image::ImageError),
    #[error("model has no scene nodes")]
    EmptyModel,
    #[error("cube face {face} is not square ({width}x{height})")]
    CubeFaceNotSquare {
        face: CubeFace,
        width: u32,
        height: u32,
    },
    #[error("cube face {face} is {actual}px, other faces are {expected}px")]
    CubeFaceSizeMismatch {
        face: CubeFace,
        expected: u32,
        actual: u32,
    },
    #[error("cube map is missing faces: {0:?}")]
    MissingCubeFaces(Vec<CubeFace>),
    #[error("failed to spawn loader thread: {0}")]
    Spawn(#[source] std::io::Error),
}

pub fn crate_info() -> &'static str {
    "atrium-assets v0.1.0"
}
