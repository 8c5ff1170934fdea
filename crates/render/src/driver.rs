use crate::camera::PerspectiveCamera;
use crate::controls::CameraControls;
use crate::renderer::{RenderError, Renderer};
use crate::scene::Scene;
use crate::stats::FrameStats;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Cloneable flag that stops a [`FrameDriver`].
#[derive(Debug, Clone, Default)]
pub struct StopToken(Arc<AtomicBool>);

impl StopToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome<T> {
    /// One frame was produced.
    Rendered(T),
    /// The driver was stopped; nothing was done.
    Stopped,
}

/// Per-frame loop body: update controls, then render once.
///
/// The host calls [`tick`](Self::tick) from its next-frame callback and
/// schedules the following frame itself.
#[derive(Debug, Default)]
pub struct FrameDriver {
    stats: FrameStats,
    stop: StopToken,
}

impl FrameDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_stats(stats: FrameStats) -> Self {
        Self {
            stats,
            stop: StopToken::new(),
        }
    }

    pub fn stop_token(&self) -> StopToken {
        self.stop.clone()
    }

    pub fn stats(&self) -> &FrameStats {
        &self.stats
    }

    /// Run one frame. A render failure raises the stop token before it is
    /// returned, so later ticks report [`TickOutcome::Stopped`].
    pub fn tick<C, R>(
        &mut self,
        controls: &mut C,
        camera: &mut PerspectiveCamera,
        scene: &Scene,
        renderer: &mut R,
    ) -> Result<TickOutcome<R::Output>, RenderError>
    where
        C: CameraControls + ?Sized,
        R: Renderer + ?Sized,
    {
        if self.stop.is_stopped() {
            return Ok(TickOutcome::Stopped);
        }
        self.stats.begin();
        controls.update(camera);
        let result = renderer.render(scene, camera);
        self.stats.end();

        match result {
            Ok(output) => Ok(TickOutcome::Rendered(output)),
            Err(err) => {
                tracing::error!(error = %err, "render failed, stopping frame loop");
                self.stop.stop();
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    type Log = Rc<RefCell<Vec<&'static str>>>;

    struct LoggingControls(Log);

    impl CameraControls for LoggingControls {
        fn update(&mut self, camera: &mut PerspectiveCamera) -> bool {
            self.0.borrow_mut().push("update");
            camera.position.x += 1.0;
            true
        }
    }

    struct LoggingRenderer {
        log: Log,
        fail: bool,
    }

    impl Renderer for LoggingRenderer {
        type Output = f32;

        fn render(&mut self, _scene: &Scene, camera: &PerspectiveCamera) -> Result<f32, RenderError> {
            self.log.borrow_mut().push("render");
            if self.fail {
                return Err(RenderError::OutOfMemory);
            }
            Ok(camera.position.x)
        }
    }

    fn fixture(fail: bool) -> (Log, LoggingControls, LoggingRenderer) {
        let log: Log = Rc::default();
        (
            log.clone(),
            LoggingControls(log.clone()),
            LoggingRenderer { log, fail },
        )
    }

    #[test]
    fn controls_update_before_render() {
        let (log, mut controls, mut renderer) = fixture(false);
        let mut driver = FrameDriver::new();
        let mut camera = PerspectiveCamera::default();
        let start_x = camera.position.x;

        let outcome = driver
            .tick(&mut controls, &mut camera, &Scene::new(), &mut renderer)
            .unwrap();
        // The renderer saw the camera after this tick's update.
        assert_eq!(outcome, TickOutcome::Rendered(start_x + 1.0));

        driver
            .tick(&mut controls, &mut camera, &Scene::new(), &mut renderer)
            .unwrap();
        assert_eq!(*log.borrow(), vec!["update", "render", "update", "render"]);
        assert_eq!(driver.stats().count(), 2);
        assert!(!driver.stats().is_in_frame());
    }

    #[test]
    fn stop_token_halts_ticks() {
        let (log, mut controls, mut renderer) = fixture(false);
        let mut driver = FrameDriver::new();
        let mut camera = PerspectiveCamera::default();
        let token = driver.stop_token();
        token.clone().stop();

        let outcome = driver
            .tick(&mut controls, &mut camera, &Scene::new(), &mut renderer)
            .unwrap();
        assert_eq!(outcome, TickOutcome::Stopped);
        assert!(log.borrow().is_empty());
        assert_eq!(driver.stats().count(), 0);
    }

    #[test]
    fn render_failure_propagates_and_stops() {
        let (log, mut controls, mut renderer) = fixture(true);
        let mut driver = FrameDriver::new();
        let mut camera = PerspectiveCamera::default();

        let err = driver
            .tick(&mut controls, &mut camera, &Scene::new(), &mut renderer)
            .unwrap_err();
        assert!(matches!(err, RenderError::OutOfMemory));
        assert!(driver.stop_token().is_stopped());
        assert_eq!(driver.stats().count(), 1);

        renderer.fail = false;
        let outcome = driver
            .tick(&mut controls, &mut camera, &Scene::new(), &mut renderer)
            .unwrap();
        assert_eq!(outcome, TickOutcome::Stopped);
        assert_eq!(log.borrow().len(), 2);
    }
}
