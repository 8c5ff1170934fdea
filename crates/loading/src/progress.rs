use serde::{Deserialize, Serialize};
use std::fmt;

/// Items settled so far out of the items registered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadProgress {
    pub items_loaded: u32,
    pub items_total: u32,
}

impl LoadProgress {
    pub fn new(items_loaded: u32, items_total: u32) -> Self {
        Self {
            items_loaded,
            items_total,
        }
    }

    /// Fraction loaded in `[0, 1]`; `0` when nothing is registered.
    pub fn ratio(&self) -> f32 {
        if self.items_total == 0 {
            return 0.0;
        }
        (self.items_loaded as f32 / self.items_total as f32).clamp(0.0, 1.0)
    }

    pub fn is_complete(&self) -> bool {
        self.items_total > 0 && self.items_loaded == self.items_total
    }
}

impl fmt::Display for LoadProgress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} ({:.0}%)",
            self.items_loaded,
            self.items_total,
            self.ratio() * 100.0
        )
    }
}

/// Lifecycle of one loading session.
///
/// `Idle -> Loading -> Complete`, or `Loading -> Errored`. Both end states
/// are terminal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoadPhase {
    #[default]
    Idle,
    Loading,
    Complete,
    Errored,
}

impl LoadPhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, LoadPhase::Complete | LoadPhase::Errored)
    }
}

impl fmt::Display for LoadPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LoadPhase::Idle => "idle",
            LoadPhase::Loading => "loading",
            LoadPhase::Complete => "complete",
            LoadPhase::Errored => "errored",
        };
        f.write_str(name)
    }
}
