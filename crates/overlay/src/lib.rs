//! Loading overlay: the progress bar, the informational text, and the black
//! full-screen overlay that fades out once every asset has loaded.
//!
//! Time is passed in explicitly as the offset since the scene started, so
//! the whole sequence can be replayed deterministically.
//!
//! # Invariants
//! - Overlay alpha only ever decreases, and is never reset.
//! - The fade is scheduled at most once per screen.

mod ease;
mod elements;
mod screen;
mod timers;
mod tween;

pub use ease::Ease;
pub use elements::{BarAnchor, BarVisual, InformText, ProgressBar};
pub use screen::{FadeConfig, LoadingScreen, OverlayState};
pub use timers::Timers;
pub use tween::Tween;

pub fn crate_info() -> &'static str {
    "atrium-overlay v0.1.0"
}
