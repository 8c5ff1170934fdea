use crate::ease::Ease;
use std::time::Duration;

/// Which edge a scaled bar grows from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BarAnchor {
    Left,
    Right,
}

/// How to draw the bar this frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BarVisual {
    pub scale_x: f32,
    pub anchor: BarAnchor,
}

/// Horizontal loading bar.
///
/// While loading, an explicit `scaleX(ratio)` transform overrides the bar's
/// resting style (`scaleX(0)`, anchored left). Once ended, the override is
/// cleared and the bar's ended style takes over: it collapses toward its
/// right edge.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressBar {
    scale_x: Option<f32>,
    ended_at: Option<Duration>,
    collapse: Duration,
    collapse_ease: Ease,
}

impl Default for ProgressBar {
    fn default() -> Self {
        Self::new(Duration::from_millis(1500))
    }
}

impl ProgressBar {
    pub fn new(collapse: Duration) -> Self {
        Self {
            scale_x: None,
            ended_at: None,
            collapse,
            collapse_ease: Ease::SineInOut,
        }
    }

    pub fn set_progress(&mut self, ratio: f32) {
        if self.is_ended() {
            tracing::debug!(ratio, "progress after the bar ended, ignored");
            return;
        }
        self.scale_x = Some(ratio.clamp(0.0, 1.0));
    }

    /// Add the `ended` class and drop the transform override.
    pub fn finish(&mut self, now: Duration) {
        if self.ended_at.is_none() {
            self.ended_at = Some(now);
        }
        self.scale_x = None;
    }

    pub fn is_ended(&self) -> bool {
        self.ended_at.is_some()
    }

    /// Current transform override, empty when none is set.
    pub fn transform(&self) -> String {
        match self.scale_x {
            Some(ratio) => format!("scaleX({ratio})"),
            None => String::new(),
        }
    }

    pub fn scale_x(&self) -> Option<f32> {
        self.scale_x
    }

    pub fn classes(&self) -> Vec<&'static str> {
        if self.is_ended() {
            vec!["loading-bar", "ended"]
        } else {
            vec!["loading-bar"]
        }
    }

    pub fn visual(&self, now: Duration) -> BarVisual {
        match self.ended_at {
            None => BarVisual {
                scale_x: self.scale_x.unwrap_or(0.0),
                anchor: BarAnchor::Left,
            },
            Some(ended_at) => {
                let elapsed = now.saturating_sub(ended_at).as_secs_f32();
                let t = if self.collapse.is_zero() {
                    1.0
                } else {
                    elapsed / self.collapse.as_secs_f32()
                };
                BarVisual {
                    scale_x: 1.0 - self.collapse_ease.apply(t),
                    anchor: BarAnchor::Right,
                }
            }
        }
    }
}

/// Message shown when an asset fails to load. Hidden until revealed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InformText {
    opacity: f32,
}

impl InformText {
    pub fn reveal(&mut self) {
        self.opacity = 1.0;
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    pub fn is_visible(&self) -> bool {
        self.opacity > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn progress_sets_scale_transform() {
        let mut bar = ProgressBar::default();
        assert_eq!(bar.transform(), "");
        bar.set_progress(0.5);
        assert_eq!(bar.transform(), "scaleX(0.5)");
        bar.set_progress(1.0);
        assert_eq!(bar.transform(), "scaleX(1)");
        assert_eq!(bar.visual(ms(0)).anchor, BarAnchor::Left);
    }

    #[test]
    fn progress_is_clamped() {
        let mut bar = ProgressBar::default();
        bar.set_progress(3.0);
        assert_eq!(bar.scale_x(), Some(1.0));
        bar.set_progress(-1.0);
        assert_eq!(bar.scale_x(), Some(0.0));
    }

    #[test]
    fn finish_clears_override_and_marks_ended() {
        let mut bar = ProgressBar::default();
        bar.set_progress(1.0);
        bar.finish(ms(500));
        assert!(bar.is_ended());
        assert_eq!(bar.transform(), "");
        assert_eq!(bar.classes(), vec!["loading-bar", "ended"]);
        bar.set_progress(0.3);
        assert_eq!(bar.scale_x(), None);
    }

    #[test]
    fn ended_bar_collapses_to_the_right() {
        let mut bar = ProgressBar::new(ms(1500));
        bar.finish(ms(1000));
        let start = bar.visual(ms(1000));
        assert_eq!(start.anchor, BarAnchor::Right);
        assert!((start.scale_x - 1.0).abs() < 1e-6);
        assert!(bar.visual(ms(1750)).scale_x < 1.0);
        assert!(bar.visual(ms(2500)).scale_x.abs() < 1e-6);
    }

    #[test]
    fn inform_text_reveal_is_idempotent() {
        let mut text = InformText::default();
        assert!(!text.is_visible());
        text.reveal();
        text.reveal();
        assert_eq!(text.opacity(), 1.0);
    }
}
