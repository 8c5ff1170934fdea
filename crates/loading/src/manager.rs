use crate::progress::{LoadPhase, LoadProgress};
use std::collections::BTreeSet;

/// Receives loading notifications from a [`LoadingManager`].
pub trait LoadObserver {
    /// An item was registered.
    fn on_start(&mut self, _url: &str, _progress: LoadProgress) {}

    /// An item finished loading.
    fn on_progress(&mut self, url: &str, progress: LoadProgress);

    /// Every registered item finished loading. Fires at most once.
    fn on_all_loaded(&mut self);

    /// An item failed to load.
    fn on_error(&mut self, url: &str);

    /// Every registered item settled but `failed` of them failed. Fires at
    /// most once, in place of [`on_all_loaded`](Self::on_all_loaded).
    fn on_all_settled(&mut self, _failed: usize) {}
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoadError {
    #[error("item was never registered: {0}")]
    Unknown(String),
    #[error("item already settled: {0}")]
    AlreadySettled(String),
    #[error("item already registered: {0}")]
    Duplicate(String),
    #[error("cannot register {url}: loading is {phase}")]
    Finished { url: String, phase: LoadPhase },
}

/// Counter-based join over independently loading items.
///
/// Items are registered with [`begin`](Self::begin) and settle exactly once,
/// through [`item_loaded`](Self::item_loaded) or
/// [`item_failed`](Self::item_failed). The observer sees each success as a
/// progress step and, once the success count reaches the registered total,
/// one all-loaded notification. A failure moves the session to
/// [`LoadPhase::Errored`], after which completion never fires; later
/// successes still report progress.
#[derive(Debug)]
pub struct LoadingManager<O> {
    observer: O,
    progress: LoadProgress,
    phase: LoadPhase,
    pending: BTreeSet<String>,
    settled: BTreeSet<String>,
    failed: Vec<String>,
    settled_notified: bool,
}

impl<O: LoadObserver> LoadingManager<O> {
    pub fn new(observer: O) -> Self {
        Self {
            observer,
            progress: LoadProgress::default(),
            phase: LoadPhase::Idle,
            pending: BTreeSet::new(),
            settled: BTreeSet::new(),
            failed: Vec::new(),
            settled_notified: false,
        }
    }

    /// Register an item that is about to be fetched.
    pub fn begin(&mut self, url: &str) -> Result<(), LoadError> {
        if self.phase.is_terminal() {
            return Err(LoadError::Finished {
                url: url.to_string(),
                phase: self.phase,
            });
        }
        if self.pending.contains(url) || self.settled.contains(url) {
            return Err(LoadError::Duplicate(url.to_string()));
        }
        self.pending.insert(url.to_string());
        self.phase = LoadPhase::Loading;
        self.progress.items_total += 1;
        self.observer.on_start(url, self.progress);
        Ok(())
    }

    pub fn item_loaded(&mut self, url: &str) -> Result<(), LoadError> {
        self.settle(url)?;
        self.progress.items_loaded += 1;
        tracing::debug!(url, progress = %self.progress, "item loaded");
        self.observer.on_progress(url, self.progress);

        if self.phase == LoadPhase::Loading && self.progress.is_complete() {
            self.phase = LoadPhase::Complete;
            tracing::info!(items = self.progress.items_total, "all items loaded");
            self.observer.on_all_loaded();
        }
        self.notify_if_settled_with_errors();
        Ok(())
    }

    pub fn item_failed(&mut self, url: &str) -> Result<(), LoadError> {
        self.settle(url)?;
        self.failed.push(url.to_string());
        if self.phase == LoadPhase::Loading {
            self.phase = LoadPhase::Errored;
        }
        tracing::warn!(url, "item failed to load");
        self.observer.on_error(url);
        self.notify_if_settled_with_errors();
        Ok(())
    }

    fn notify_if_settled_with_errors(&mut self) {
        if self.phase == LoadPhase::Errored && self.pending.is_empty() && !self.settled_notified {
            self.settled_notified = true;
            tracing::info!(
                failed = self.failed.len(),
                items = self.progress.items_total,
                "all items settled with failures"
            );
            self.observer.on_all_settled(self.failed.len());
        }
    }

    fn settle(&mut self, url: &str) -> Result<(), LoadError> {
        if self.pending.remove(url) {
            self.settled.insert(url.to_string());
            Ok(())
        } else if self.settled.contains(url) {
            Err(LoadError::AlreadySettled(url.to_string()))
        } else {
            Err(LoadError::Unknown(url.to_string()))
        }
    }

    pub fn progress(&self) -> LoadProgress {
        self.progress
    }

    pub fn phase(&self) -> LoadPhase {
        self.phase
    }

    /// Items registered but not yet settled.
    pub fn pending(&self) -> impl Iterator<Item = &str> {
        self.pending.iter().map(String::as_str)
    }

    pub fn failed(&self) -> &[String] {
        &self.failed
    }

    /// True once every registered item has settled, successfully or not.
    pub fn is_settled(&self) -> bool {
        self.phase != LoadPhase::Idle && self.pending.is_empty()
    }

    pub fn observer(&self) -> &O {
        &self.observer
    }

    pub fn observer_mut(&mut self) -> &mut O {
        &mut self.observer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default)]
    struct Recorder {
        events: Vec<String>,
        ratios: Vec<f32>,
        completions: usize,
        settled_with_errors: Vec<usize>,
    }

    impl LoadObserver for Recorder {
        fn on_start(&mut self, url: &str, _progress: LoadProgress) {
            self.events.push(format!("start {url}"));
        }

        fn on_progress(&mut self, url: &str, progress: LoadProgress) {
            self.events.push(format!("progress {url}"));
            self.ratios.push(progress.ratio());
        }

        fn on_all_loaded(&mut self) {
            self.events.push("loaded".into());
            self.completions += 1;
        }

        fn on_error(&mut self, url: &str) {
            self.events.push(format!("error {url}"));
        }

        fn on_all_settled(&mut self, failed: usize) {
            self.events.push("settled".into());
            self.settled_with_errors.push(failed);
        }
    }

    fn scene_urls() -> Vec<String> {
        let mut urls = vec!["/model/model.gltf".to_string()];
        for face in ["px", "nx", "py", "ny", "pz", "nz"] {
            urls.push(format!("/texture/environmentMaps/2/{face}.jpg"));
        }
        urls
    }

    fn registered() -> LoadingManager<Recorder> {
        let mut manager = LoadingManager::new(Recorder::default());
        for url in scene_urls() {
            manager.begin(&url).unwrap();
        }
        manager
    }

    #[test]
    fn in_order_sequence_reports_k_over_n() {
        let mut manager = registered();
        for url in scene_urls() {
            manager.item_loaded(&url).unwrap();
        }
        let expected: Vec<f32> = (1..=7).map(|k| k as f32 / 7.0).collect();
        assert_eq!(manager.observer().ratios, expected);
        assert_eq!(manager.observer().completions, 1);
        assert_eq!(manager.phase(), LoadPhase::Complete);
        assert_eq!(manager.observer().events.last().unwrap(), "loaded");
    }

    #[test]
    fn any_completion_order_gives_same_ratios() {
        let mut manager = registered();
        let mut urls = scene_urls();
        urls.reverse();
        urls.swap(1, 4);
        for url in &urls {
            manager.item_loaded(url).unwrap();
        }
        let ratios = &manager.observer().ratios;
        for (k, ratio) in ratios.iter().enumerate() {
            assert!((ratio - (k + 1) as f32 / 7.0).abs() < 1e-6);
            assert!((0.0..=1.0).contains(ratio));
        }
        assert_eq!(manager.observer().completions, 1);
    }

    #[test]
    fn completion_follows_exactly_total_progress_calls() {
        let mut manager = registered();
        let urls = scene_urls();
        for url in &urls[..6] {
            manager.item_loaded(url).unwrap();
            assert_eq!(manager.observer().completions, 0);
        }
        manager.item_loaded(&urls[6]).unwrap();
        let events = &manager.observer().events;
        let progress_before = events
            .iter()
            .take_while(|e| *e != "loaded")
            .filter(|e| e.starts_with("progress"))
            .count();
        assert_eq!(progress_before, 7);
    }

    #[test]
    fn settling_twice_is_rejected() {
        let mut manager = registered();
        manager.item_loaded("/model/model.gltf").unwrap();
        assert_eq!(
            manager.item_loaded("/model/model.gltf"),
            Err(LoadError::AlreadySettled("/model/model.gltf".into()))
        );
        assert_eq!(manager.progress().items_loaded, 1);
    }

    #[test]
    fn unknown_item_is_rejected() {
        let mut manager = registered();
        assert!(matches!(
            manager.item_loaded("/nope.jpg"),
            Err(LoadError::Unknown(_))
        ));
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let mut manager = registered();
        assert!(matches!(
            manager.begin("/model/model.gltf"),
            Err(LoadError::Duplicate(_))
        ));
        assert_eq!(manager.progress().items_total, 7);
    }

    #[test]
    fn failure_is_terminal_and_blocks_completion() {
        let mut manager = registered();
        let urls = scene_urls();
        manager.item_failed(&urls[3]).unwrap();
        assert_eq!(manager.phase(), LoadPhase::Errored);
        for (i, url) in urls.iter().enumerate() {
            if i != 3 {
                manager.item_loaded(url).unwrap();
            }
        }
        assert_eq!(manager.phase(), LoadPhase::Errored);
        assert_eq!(manager.observer().completions, 0);
        assert_eq!(manager.observer().ratios.len(), 6);
        assert!(manager.is_settled());
        assert_eq!(manager.failed(), &[urls[3].clone()]);
        assert_eq!(manager.observer().settled_with_errors, vec![1]);
        assert_eq!(manager.observer().events.last().unwrap(), "settled");
    }

    #[test]
    fn settling_with_errors_fires_once_after_last_item() {
        let mut manager = registered();
        let urls = scene_urls();
        for url in &urls[..5] {
            manager.item_loaded(url).unwrap();
        }
        manager.item_failed(&urls[5]).unwrap();
        assert!(manager.observer().settled_with_errors.is_empty());
        manager.item_failed(&urls[6]).unwrap();
        assert_eq!(manager.observer().settled_with_errors, vec![2]);
        assert_eq!(manager.observer().completions, 0);
    }

    #[test]
    fn clean_completion_does_not_report_settled_with_errors() {
        let mut manager = registered();
        for url in scene_urls() {
            manager.item_loaded(&url).unwrap();
        }
        assert!(manager.observer().settled_with_errors.is_empty());
    }

    #[test]
    fn every_failure_notifies() {
        let mut manager = registered();
        let urls = scene_urls();
        manager.item_failed(&urls[0]).unwrap();
        manager.item_failed(&urls[1]).unwrap();
        let errors = manager
            .observer()
            .events
            .iter()
            .filter(|e| e.starts_with("error"))
            .count();
        assert_eq!(errors, 2);
    }

    #[test]
    fn no_registration_after_terminal_phase() {
        let mut manager = LoadingManager::new(Recorder::default());
        manager.begin("/a").unwrap();
        manager.item_loaded("/a").unwrap();
        assert_eq!(
            manager.begin("/b"),
            Err(LoadError::Finished {
                url: "/b".into(),
                phase: LoadPhase::Complete
            })
        );
    }

    #[test]
    fn idle_manager_is_not_settled() {
        let manager = LoadingManager::new(Recorder::default());
        assert_eq!(manager.phase(), LoadPhase::Idle);
        assert!(!manager.is_settled());
        assert_eq!(manager.pending().count(), 0);
    }
}
