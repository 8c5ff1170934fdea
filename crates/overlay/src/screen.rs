use crate::ease::Ease;
use crate::elements::{InformText, ProgressBar};
use crate::timers::Timers;
use crate::tween::Tween;
use atrium_common::Color;
use atrium_loading::{LoadObserver, LoadProgress};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Opacity of the full-screen overlay drawn over the scene.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayState {
    pub alpha: f32,
}

impl Default for OverlayState {
    fn default() -> Self {
        Self { alpha: 1.0 }
    }
}

/// Timing of the transition that follows a completed load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FadeConfig {
    /// Wait after completion before the bar ends and the fade is scheduled.
    pub settle_delay_ms: u64,
    /// Extra delay inside the fade before alpha starts moving.
    pub fade_delay_ms: u64,
    pub fade_duration_ms: u64,
    pub ease: Ease,
    /// How long the ended bar takes to collapse.
    pub bar_collapse_ms: u64,
    /// Scene background once everything has loaded.
    pub clear_color: Color,
    /// Shown when any asset fails.
    pub inform_text: String,
}

impl Default for FadeConfig {
    fn default() -> Self {
        Self {
            settle_delay_ms: 500,
            fade_delay_ms: 1000,
            fade_duration_ms: 3000,
            ease: Ease::Power1Out,
            bar_collapse_ms: 1500,
            clear_color: Color::from_hex("#b4b4b4").unwrap_or(Color::BLACK),
            inform_text: "Some assets could not be loaded.".into(),
        }
    }
}

impl FadeConfig {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn fade_delay(&self) -> Duration {
        Duration::from_millis(self.fade_delay_ms)
    }

    pub fn fade_duration(&self) -> Duration {
        Duration::from_millis(self.fade_duration_ms)
    }

    /// Offset from completion at which the overlay is fully transparent.
    pub fn total(&self) -> Duration {
        self.settle_delay() + self.fade_delay() + self.fade_duration()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScreenAction {
    EndLoading,
}

/// The loading coordinator: turns load notifications into what the user
/// sees while the scene streams in.
///
/// Call [`advance`](Self::advance) once per frame with the time since the
/// scene started; notifications are stamped with the last advanced time.
#[derive(Debug)]
pub struct LoadingScreen {
    config: FadeConfig,
    now: Duration,
    progress_bar: ProgressBar,
    inform_text: InformText,
    overlay: OverlayState,
    fade: Option<Tween>,
    timers: Timers<ScreenAction>,
    clear_color: Option<Color>,
    completed_at: Option<Duration>,
}

impl LoadingScreen {
    pub fn new(config: FadeConfig) -> Self {
        Self {
            progress_bar: ProgressBar::new(Duration::from_millis(config.bar_collapse_ms)),
            config,
            now: Duration::ZERO,
            inform_text: InformText::default(),
            overlay: OverlayState::default(),
            fade: None,
            timers: Timers::new(),
            clear_color: None,
            completed_at: None,
        }
    }

    /// Move the screen's clock forward, fire due timers and resample the fade.
    /// Time never runs backwards; an earlier `now` is treated as the latest seen.
    pub fn advance(&mut self, now: Duration) {
        self.now = self.now.max(now);
        for (at, action) in self.timers.drain_due(self.now) {
            match action {
                ScreenAction::EndLoading => {
                    tracing::debug!(at_ms = at.as_millis() as u64, "ending loading bar, fade scheduled");
                    self.fade = Some(Tween::new(
                        at,
                        0.0,
                        self.config.fade_delay(),
                        self.config.fade_duration(),
                        self.config.ease,
                    ));
                    self.progress_bar.finish(at);
                }
            }
        }
        if let Some(fade) = &mut self.fade {
            let alpha = fade.sample(self.now, self.overlay.alpha);
            self.overlay.alpha = alpha.min(self.overlay.alpha).clamp(0.0, 1.0);
        }
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn overlay(&self) -> OverlayState {
        self.overlay
    }

    pub fn progress_bar(&self) -> &ProgressBar {
        &self.progress_bar
    }

    pub fn inform_text(&self) -> &InformText {
        &self.inform_text
    }

    pub fn inform_message(&self) -> &str {
        &self.config.inform_text
    }

    /// Background color requested by the completion transition, if any.
    pub fn clear_color(&self) -> Option<Color> {
        self.clear_color
    }

    pub fn completed_at(&self) -> Option<Duration> {
        self.completed_at
    }

    /// True once the overlay is fully transparent.
    pub fn is_revealed(&self) -> bool {
        self.overlay.alpha <= 0.0
    }

    pub fn config(&self) -> &FadeConfig {
        &self.config
    }

    /// Stamp the settle time and queue the bar end. Returns false if
    /// loading already settled.
    fn schedule_end_loading(&mut self) -> bool {
        if self.completed_at.is_some() {
            return false;
        }
        self.completed_at = Some(self.now);
        self.timers
            .schedule(self.now + self.config.settle_delay(), ScreenAction::EndLoading);
        true
    }
}

impl LoadObserver for LoadingScreen {
    fn on_progress(&mut self, _url: &str, progress: LoadProgress) {
        self.progress_bar.set_progress(progress.ratio());
    }

    fn on_all_loaded(&mut self) {
        if self.schedule_end_loading() {
            self.clear_color = Some(self.config.clear_color);
        }
    }

    // The background color only changes on a clean completion.
    fn on_all_settled(&mut self, _failed: usize) {
        self.schedule_end_loading();
    }

    fn on_error(&mut self, _url: &str) {
        self.inform_text.reveal();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use atrium_loading::LoadingManager;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    fn completed_screen(at: Duration) -> LoadingScreen {
        let mut screen = LoadingScreen::new(FadeConfig::default());
        screen.advance(at);
        screen.on_progress("/a", LoadProgress::new(1, 1));
        screen.on_all_loaded();
        screen
    }

    #[test]
    fn progress_drives_bar_scale() {
        let mut manager = LoadingManager::new(LoadingScreen::new(FadeConfig::default()));
        let urls: Vec<String> = (0..7).map(|i| format!("/asset/{i}")).collect();
        for url in &urls {
            manager.begin(url).unwrap();
        }
        for (k, url) in urls.iter().enumerate() {
            manager.item_loaded(url).unwrap();
            let scale = manager.observer().progress_bar().scale_x().unwrap();
            assert!((scale - (k + 1) as f32 / 7.0).abs() < 1e-6);
        }
        assert!(manager.observer().completed_at().is_some());
    }

    #[test]
    fn completion_sets_clear_color_immediately() {
        let screen = completed_screen(ms(200));
        assert_eq!(screen.clear_color(), Some(Color::from_hex("#b4b4b4").unwrap()));
        assert_eq!(screen.completed_at(), Some(ms(200)));
        assert!(!screen.progress_bar().is_ended());
    }

    #[test]
    fn bar_ends_after_settle_delay() {
        let mut screen = completed_screen(ms(0));
        screen.advance(ms(499));
        assert!(!screen.progress_bar().is_ended());
        assert_eq!(screen.progress_bar().transform(), "scaleX(1)");
        screen.advance(ms(500));
        assert!(screen.progress_bar().is_ended());
        assert_eq!(screen.progress_bar().transform(), "");
    }

    #[test]
    fn alpha_fades_between_one_and_a_half_and_four_and_a_half_seconds() {
        let start = ms(2000);
        let mut screen = completed_screen(start);

        let mut last = screen.overlay().alpha;
        assert_eq!(last, 1.0);
        for step in 1..=600u64 {
            let offset = ms(step * 10);
            screen.advance(start + offset);
            let alpha = screen.overlay().alpha;
            if offset <= ms(1500) {
                assert_eq!(alpha, 1.0, "alpha moved early at {offset:?}");
            } else if offset < ms(4500) {
                assert!(alpha < last, "alpha not decreasing at {offset:?}");
            } else {
                assert_eq!(alpha, 0.0, "alpha not zero at {offset:?}");
            }
            assert!(alpha <= last);
            last = alpha;
        }
        assert!(screen.is_revealed());
    }

    #[test]
    fn coarse_frames_keep_the_scheduled_timeline() {
        let mut screen = completed_screen(ms(0));
        // A single late frame still places the fade relative to completion.
        screen.advance(ms(3000));
        let expected = 1.0 - Ease::Power1Out.apply(1.5 / 3.0);
        assert!((screen.overlay().alpha - expected).abs() < 1e-5);
        screen.advance(ms(4500));
        assert_eq!(screen.overlay().alpha, 0.0);
    }

    #[test]
    fn alpha_never_increases_after_reveal() {
        let mut screen = completed_screen(ms(0));
        screen.advance(ms(5000));
        screen.advance(ms(1000));
        screen.on_all_loaded();
        screen.advance(ms(9000));
        assert_eq!(screen.overlay().alpha, 0.0);
    }

    #[test]
    fn completion_is_handled_once() {
        let mut screen = completed_screen(ms(0));
        screen.advance(ms(100));
        screen.on_all_loaded();
        assert_eq!(screen.completed_at(), Some(ms(0)));
        screen.advance(ms(600));
        assert_eq!(screen.timers.len(), 0);
    }

    #[test]
    fn error_reveals_inform_text() {
        let mut screen = LoadingScreen::new(FadeConfig::default());
        assert_eq!(screen.inform_text().opacity(), 0.0);
        screen.on_error("/texture/px.jpg");
        screen.on_error("/texture/nx.jpg");
        assert_eq!(screen.inform_text().opacity(), 1.0);
        screen.advance(ms(10_000));
        assert_eq!(screen.overlay().alpha, 1.0);
    }

    #[test]
    fn settling_with_failures_still_fades_but_keeps_background() {
        let mut manager = LoadingManager::new(LoadingScreen::new(FadeConfig::default()));
        for url in ["/model.gltf", "/px.jpg", "/nx.jpg"] {
            manager.begin(url).unwrap();
        }
        manager.observer_mut().advance(ms(100));
        manager.item_failed("/px.jpg").unwrap();
        manager.item_loaded("/model.gltf").unwrap();
        assert_eq!(manager.observer().completed_at(), None);

        manager.observer_mut().advance(ms(700));
        manager.item_loaded("/nx.jpg").unwrap();
        let screen = manager.observer_mut();
        assert_eq!(screen.completed_at(), Some(ms(700)));
        assert_eq!(screen.clear_color(), None);

        screen.advance(ms(1199));
        assert!(!screen.progress_bar().is_ended());
        screen.advance(ms(1200));
        assert!(screen.progress_bar().is_ended());
        screen.advance(ms(2200));
        assert_eq!(screen.overlay().alpha, 1.0);
        screen.advance(ms(5200));
        assert!(screen.is_revealed());
        assert_eq!(screen.inform_text().opacity(), 1.0);
        assert_eq!(screen.clear_color(), None);
    }

    #[test]
    fn fade_config_round_trips_through_yaml() {
        let yaml = "settle_delay_ms: 250\nease: sine-in-out\nclear_color: '#ffffff'\n";
        let config: FadeConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.settle_delay(), ms(250));
        assert_eq!(config.fade_duration(), ms(3000));
        assert_eq!(config.ease, Ease::SineInOut);
        assert_eq!(config.clear_color, Color::WHITE);
        assert_eq!(FadeConfig::default().total(), ms(4500));
    }
}
