use std::time::{Duration, Instant};

/// Coalesces bursts of changes into at most one emission per interval.
///
/// Callers `mark` a change and emit when it returns `true`. Changes that
/// arrive inside the interval stay pending until `poll` observes the interval
/// has elapsed, or until a terminal event calls `force`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoalescingEmitter {
    interval: Duration,
    last_emit: Option<Instant>,
    pending: bool,
}

impl CoalescingEmitter {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_emit: None,
            pending: false,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Record a change. Returns `true` when it should be emitted now.
    pub fn mark(&mut self, now: Instant) -> bool {
        self.pending = true;
        self.poll(now)
    }

    /// Returns `true` when a pending change may be emitted now.
    pub fn poll(&mut self, now: Instant) -> bool {
        if !self.pending || !self.is_due(now) {
            return false;
        }
        self.record(now);
        true
    }

    /// Emit regardless of the interval.
    pub fn force(&mut self, now: Instant) {
        self.record(now);
    }

    /// Drop any pending change without emitting it.
    pub fn reset(&mut self) {
        self.pending = false;
    }

    fn is_due(&self, now: Instant) -> bool {
        self.last_emit
            .map_or(true, |last| now.saturating_duration_since(last) >= self.interval)
    }

    fn record(&mut self, now: Instant) {
        self.last_emit = Some(now);
        self.pending = false;
    }
}

#[cfg(test)]
mod tests {
    use super::CoalescingEmitter;
    use std::time::{Duration, Instant};

    #[test]
    fn first_change_emits_immediately_then_coalesces() {
        let start = Instant::now();
        let mut emitter = CoalescingEmitter::new(Duration::from_millis(100));

        assert!(emitter.mark(start));
        assert!(!emitter.mark(start + Duration::from_millis(10)));
        assert!(!emitter.mark(start + Duration::from_millis(60)));
        assert!(emitter.is_pending());

        assert!(!emitter.poll(start + Duration::from_millis(99)));
        assert!(emitter.poll(start + Duration::from_millis(100)));
        assert!(!emitter.is_pending());
        assert!(!emitter.poll(start + Duration::from_millis(500)));
    }

    #[test]
    fn force_clears_pending_and_restarts_interval() {
        let start = Instant::now();
        let mut emitter = CoalescingEmitter::new(Duration::from_millis(100));
        assert!(emitter.mark(start));
        assert!(!emitter.mark(start + Duration::from_millis(20)));

        emitter.force(start + Duration::from_millis(30));
        assert!(!emitter.is_pending());
        assert!(!emitter.mark(start + Duration::from_millis(90)));
        assert!(emitter.poll(start + Duration::from_millis(130)));
    }
}
