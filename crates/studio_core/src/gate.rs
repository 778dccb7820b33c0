/// Holds back the latest item until the preview surface reports it is ready.
///
/// At most one item is buffered; a newer submission replaces an older one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadinessGate<T> {
    ready: bool,
    pending: Option<T>,
}

impl<T> Default for ReadinessGate<T> {
    fn default() -> Self {
        Self {
            ready: false,
            pending: None,
        }
    }
}

impl<T> ReadinessGate<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Record readiness and release the pending item, if any.
    pub fn mark_ready(&mut self) -> Option<T> {
        self.ready = true;
        self.pending.take()
    }

    /// Offer an item. It is released immediately once the gate is ready.
    pub fn submit(&mut self, item: T) -> Option<T> {
        self.pending = Some(item);
        if self.ready {
            self.pending.take()
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ReadinessGate;

    #[test]
    fn newer_submission_replaces_pending() {
        let mut gate = ReadinessGate::new();
        assert_eq!(gate.submit(1), None);
        assert_eq!(gate.submit(2), None);
        assert_eq!(gate.mark_ready(), Some(2));
        assert!(!gate.has_pending());
    }

    #[test]
    fn ready_gate_passes_items_through() {
        let mut gate = ReadinessGate::new();
        assert_eq!(gate.mark_ready(), None);
        assert_eq!(gate.submit("a"), Some("a"));
        assert!(!gate.has_pending());
    }
}
