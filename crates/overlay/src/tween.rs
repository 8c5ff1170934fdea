use crate::ease::Ease;
use std::time::Duration;

/// Time-driven interpolation of one value toward a target.
///
/// The start value is whatever the animated value holds when the tween
/// begins (after its delay), not when it is created.
#[derive(Debug, Clone, PartialEq)]
pub struct Tween {
    created_at: Duration,
    delay: Duration,
    duration: Duration,
    to: f32,
    ease: Ease,
    from: Option<f32>,
}

impl Tween {
    pub fn new(created_at: Duration, to: f32, delay: Duration, duration: Duration, ease: Ease) -> Self {
        Self {
            created_at,
            delay,
            duration,
            to,
            ease,
            from: None,
        }
    }

    pub fn start_time(&self) -> Duration {
        self.created_at + self.delay
    }

    pub fn end_time(&self) -> Duration {
        self.start_time() + self.duration
    }

    pub fn is_finished(&self, now: Duration) -> bool {
        now >= self.end_time()
    }

    /// Value at `now`, given the animated value's present state.
    pub fn sample(&mut self, now: Duration, current: f32) -> f32 {
        let start = self.start_time();
        if now < start {
            return current;
        }
        let from = *self.from.get_or_insert(current);
        if self.is_finished(now) {
            return self.to;
        }
        let t = (now - start).as_secs_f32() / self.duration.as_secs_f32();
        from + (self.to - from) * self.ease.apply(t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn holds_current_value_during_delay() {
        let mut tween = Tween::new(ms(0), 0.0, ms(1000), ms(3000), Ease::Linear);
        assert_eq!(tween.sample(ms(999), 0.8), 0.8);
        assert_eq!(tween.start_time(), ms(1000));
        assert_eq!(tween.end_time(), ms(4000));
    }

    #[test]
    fn captures_start_value_when_it_begins() {
        let mut tween = Tween::new(ms(0), 0.0, ms(0), ms(1000), Ease::Linear);
        let half = tween.sample(ms(500), 0.6);
        assert!((half - 0.3).abs() < 1e-6);
        // Later samples interpolate from the captured value, not the current one.
        let three_quarters = tween.sample(ms(750), half);
        assert!((three_quarters - 0.15).abs() < 1e-6);
    }

    #[test]
    fn lands_exactly_on_target() {
        let mut tween = Tween::new(ms(100), 0.0, ms(0), ms(50), Ease::Power1Out);
        assert_eq!(tween.sample(ms(150), 1.0), 0.0);
        assert_eq!(tween.sample(ms(10_000), 1.0), 0.0);
        assert!(tween.is_finished(ms(150)));
    }

    #[test]
    fn zero_duration_jumps_to_target() {
        let mut tween = Tween::new(ms(0), 0.25, ms(10), Duration::ZERO, Ease::Linear);
        assert_eq!(tween.sample(ms(5), 1.0), 1.0);
        assert_eq!(tween.sample(ms(10), 1.0), 0.25);
    }
}
