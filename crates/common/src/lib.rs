//! Shared types used across the atrium workspace.

pub mod types;

pub use types::{Color, ColorError, SceneId, Transform};
