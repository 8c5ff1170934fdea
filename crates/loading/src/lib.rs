//! Load tracking: aggregate progress over independent resource fetches and a
//! one-shot completion join.
//!
//! # Invariants
//! - `items_loaded` never decreases and never exceeds `items_total`.
//! - The all-loaded notification fires at most once, after the progress
//!   notification of the last item.
//! - Completion depends only on counts, never on which item settled last.

mod manager;
mod progress;

pub use manager::{LoadError, LoadObserver, LoadingManager};
pub use progress::{LoadPhase, LoadProgress};

pub fn crate_info() -> &'static str {
    "atrium-loading v0.1.0"
}
