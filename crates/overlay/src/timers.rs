use std::collections::BTreeMap;
use std::time::Duration;

/// Actions scheduled for a point in time, fired in time order.
///
/// Actions due at the same instant fire in the order they were scheduled.
#[derive(Debug)]
pub struct Timers<A> {
    queue: BTreeMap<(Duration, u64), A>,
    next_seq: u64,
}

impl<A> Default for Timers<A> {
    fn default() -> Self {
        Self {
            queue: BTreeMap::new(),
            next_seq: 0,
        }
    }
}

impl<A> Timers<A> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, at: Duration, action: A) {
        self.queue.insert((at, self.next_seq), action);
        self.next_seq += 1;
    }

    /// Remove and return every action due at or before `now`, with its
    /// scheduled time.
    pub fn drain_due(&mut self, now: Duration) -> Vec<(Duration, A)> {
        let mut due = Vec::new();
        while let Some(entry) = self.queue.first_entry() {
            if entry.key().0 > now {
                break;
            }
            let ((at, _), action) = entry.remove_entry();
            due.push((at, action));
        }
        due
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn next_due(&self) -> Option<Duration> {
        self.queue.keys().next().map(|(at, _)| *at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn fires_only_due_actions() {
        let mut timers = Timers::new();
        timers.schedule(ms(500), "fade");
        timers.schedule(ms(100), "early");
        assert_eq!(timers.next_due(), Some(ms(100)));
        assert!(timers.drain_due(ms(99)).is_empty());
        assert_eq!(timers.drain_due(ms(100)), vec![(ms(100), "early")]);
        assert_eq!(timers.len(), 1);
        assert_eq!(timers.drain_due(ms(2000)), vec![(ms(500), "fade")]);
        assert!(timers.is_empty());
    }

    #[test]
    fn same_instant_keeps_schedule_order() {
        let mut timers = Timers::new();
        timers.schedule(ms(10), 1);
        timers.schedule(ms(10), 2);
        timers.schedule(ms(5), 0);
        let fired: Vec<i32> = timers.drain_due(ms(10)).into_iter().map(|(_, a)| a).collect();
        assert_eq!(fired, vec![0, 1, 2]);
    }
}
