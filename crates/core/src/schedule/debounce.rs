//! Commit debouncing policy
//!
//! Deciding whether a key is due is a pure function of the current instant,
//! the key's last edit and the window. Timer wiring is left to the caller.

use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

/// `true` once `window` has elapsed since `last_edit`.
pub fn should_flush(now: Instant, last_edit: Instant, window: Duration) -> bool {
    now.saturating_duration_since(last_edit) >= window
}

/// Last-edit bookkeeping for keys waiting to be committed
#[derive(Debug, Clone)]
pub struct DebounceQueue<K> {
    window: Duration,
    last_edit: HashMap<K, Instant>,
}

impl<K> DebounceQueue<K>
where
    K: Eq + Hash + Clone,
{
    /// Empty queue with a quiet period of `window`
    pub fn new(window: Duration) -> Self {
        Self { window, last_edit: HashMap::new() }
    }

    /// Quiet period a key must see before it is due
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Record an edit, restarting the key's quiet period
    pub fn touch(&mut self, key: K, now: Instant) {
        self.last_edit.insert(key, now);
    }

    /// Forget `key`; `true` if it was waiting
    pub fn cancel(&mut self, key: &K) -> bool {
        self.last_edit.remove(key).is_some()
    }

    /// `true` while `key` waits out its quiet period
    pub fn contains(&self, key: &K) -> bool {
        self.last_edit.contains_key(key)
    }

    /// Remove and return every key whose quiet period has elapsed
    pub fn take_due(&mut self, now: Instant) -> Vec<K> {
        let window = self.window;
        let due: Vec<K> = self
            .last_edit
            .iter()
            .filter(|(_, last)| should_flush(now, **last, window))
            .map(|(key, _)| key.clone())
            .collect();
        for key in &due {
            self.last_edit.remove(key);
        }
        due
    }

    /// Earliest instant at which some key becomes due
    pub fn next_deadline(&self) -> Option<Instant> {
        self.last_edit.values().min().map(|last| *last + self.window)
    }

    /// Number of keys waiting
    pub fn len(&self) -> usize {
        self.last_edit.len()
    }

    pub fn is_empty(&self) -> bool {
        self.last_edit.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_millis(500);

    #[test]
    fn flush_exactly_at_window() {
        let t0 = Instant::now();
        assert!(!should_flush(t0 + Duration::from_millis(499), t0, WINDOW));
        assert!(should_flush(t0 + WINDOW, t0, WINDOW));
        // A clock reading before the edit never flushes
        assert!(!should_flush(t0, t0 + Duration::from_millis(10), WINDOW));
    }

    #[test]
    fn touch_restarts_quiet_period() {
        let t0 = Instant::now();
        let mut queue = DebounceQueue::new(WINDOW);

        queue.touch("a", t0);
        queue.touch("a", t0 + Duration::from_millis(400));

        assert!(queue.take_due(t0 + Duration::from_millis(600)).is_empty());
        assert_eq!(queue.next_deadline(), Some(t0 + Duration::from_millis(900)));
        assert_eq!(queue.take_due(t0 + Duration::from_millis(900)), vec!["a"]);
        assert!(queue.is_empty());
    }

    #[test]
    fn keys_are_independent() {
        let t0 = Instant::now();
        let mut queue = DebounceQueue::new(WINDOW);

        queue.touch(1, t0);
        queue.touch(2, t0 + Duration::from_millis(300));

        assert_eq!(queue.next_deadline(), Some(t0 + WINDOW));
        assert_eq!(queue.take_due(t0 + WINDOW), vec![1]);
        assert!(queue.contains(&2));
        assert!(queue.cancel(&2));
        assert_eq!(queue.next_deadline(), None);
    }
}
