// A committed value plus an optional proposal that only becomes committed
// once input has been quiet for `settle`.
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct Debounced<T> {
    committed: T,
    proposed: Option<(T, Instant)>,
    settle: Duration,
}

impl<T: Clone + PartialEq> Debounced<T> {
    pub fn new(value: T, settle: Duration) -> Self {
        Self { committed: value, proposed: None, settle }
    }

    /// Record a new value; restarts the quiet window.
    pub fn propose(&mut self, value: T, now: Instant) {
        self.proposed = Some((value, now));
    }

    /// Latest value, proposed or committed.
    pub fn latest(&self) -> &T {
        self.proposed.as_ref().map(|(v, _)| v).unwrap_or(&self.committed)
    }

    pub fn committed(&self) -> &T {
        &self.committed
    }

    pub fn is_pending(&self) -> bool {
        self.proposed.is_some()
    }

    /// Commit the proposal if it has settled. Returns the newly committed
    /// value only when it differs from the previous one.
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        let settled = matches!(&self.proposed, Some((_, at)) if now.duration_since(*at) >= self.settle);
        if settled { self.flush() } else { None }
    }

    /// Commit the proposal right away.
    pub fn flush(&mut self) -> Option<T> {
        let (value, _) = self.proposed.take()?;
        if value == self.committed {
            return None;
        }
        self.committed = value.clone();
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SETTLE: Duration = Duration::from_millis(200);

    #[test]
    fn burst_commits_once_with_last_value() {
        let t0 = Instant::now();
        let mut d = Debounced::new(10u32, SETTLE);
        for (i, v) in [15, 20, 25, 30].into_iter().enumerate() {
            let at = t0 + Duration::from_millis(50 * i as u64);
            d.propose(v, at);
            assert_eq!(d.poll(at), None);
        }
        assert_eq!(*d.latest(), 30);
        assert_eq!(*d.committed(), 10);
        assert_eq!(d.poll(t0 + Duration::from_millis(150 + 199)), None);
        assert_eq!(d.poll(t0 + Duration::from_millis(150 + 200)), Some(30));
        assert_eq!(d.poll(t0 + Duration::from_secs(5)), None);
    }

    #[test]
    fn proposing_the_committed_value_commits_nothing() {
        let t0 = Instant::now();
        let mut d = Debounced::new(10u32, SETTLE);
        d.propose(10, t0);
        assert_eq!(d.poll(t0 + SETTLE), None);
        assert!(!d.is_pending());
    }

    #[test]
    fn flush_skips_the_wait() {
        let mut d = Debounced::new(1u32, SETTLE);
        d.propose(2, Instant::now());
        assert_eq!(d.flush(), Some(2));
        assert_eq!(*d.committed(), 2);
    }
}
