use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use crate::emitter::CoalescingEmitter;

/// Normalized file path to full file content.
///
/// Every key starts with a single `/` and uses forward slashes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FileBundle {
    files: BTreeMap<String, String>,
}

impl FileBundle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite a file. Paths that normalize to nothing are ignored.
    pub fn insert(&mut self, path: &str, code: impl Into<String>) -> bool {
        let Some(path) = normalize_path(path) else {
            return false;
        };
        self.files.insert(path, code.into());
        true
    }

    pub fn get(&self, path: &str) -> Option<&str> {
        let path = normalize_path(path)?;
        self.files.get(&path).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.files
            .iter()
            .map(|(path, code)| (path.as_str(), code.as_str()))
    }

    /// Overlay `other` onto this bundle; `other` wins on conflicts.
    pub fn merge(&mut self, other: &FileBundle) {
        for (path, code) in &other.files {
            self.files.insert(path.clone(), code.clone());
        }
    }

    pub fn clear(&mut self) {
        self.files.clear();
    }
}

impl<P: AsRef<str>, C: Into<String>> FromIterator<(P, C)> for FileBundle {
    fn from_iter<I: IntoIterator<Item = (P, C)>>(iter: I) -> Self {
        let mut bundle = FileBundle::new();
        for (path, code) in iter {
            bundle.insert(path.as_ref(), code);
        }
        bundle
    }
}

/// Normalize a bundle path to the `/dir/file.ext` form.
///
/// Returns `None` when nothing but separators remain.
pub fn normalize_path(raw: &str) -> Option<String> {
    let unified = raw.trim().replace('\\', "/");
    let mut rest = unified.as_str();
    while let Some(stripped) = rest.strip_prefix("./") {
        rest = stripped;
    }
    let segments: Vec<&str> = rest
        .split('/')
        .filter(|segment| !segment.is_empty() && *segment != ".")
        .collect();
    if segments.is_empty() {
        return None;
    }
    Some(format!("/{}", segments.join("/")))
}

/// Merges streamed per-file deltas over the last committed bundle.
///
/// Emissions are throttled by a [`CoalescingEmitter`]; `commit` and
/// `flush_pending` bypass the throttle so the final state always goes out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleMerger {
    committed: FileBundle,
    working: FileBundle,
    emitter: CoalescingEmitter,
}

impl BundleMerger {
    pub fn new(interval: Duration) -> Self {
        Self {
            committed: FileBundle::new(),
            working: FileBundle::new(),
            emitter: CoalescingEmitter::new(interval),
        }
    }

    pub fn committed(&self) -> &FileBundle {
        &self.committed
    }

    pub fn working(&self) -> &FileBundle {
        &self.working
    }

    /// Committed bundle overlaid with the working deltas.
    pub fn merged(&self) -> FileBundle {
        let mut merged = self.committed.clone();
        merged.merge(&self.working);
        merged
    }

    /// Apply one file delta; returns the merged bundle if the throttle allows.
    ///
    /// A delta with empty code is dropped.
    pub fn apply_delta(&mut self, path: &str, code: &str, now: Instant) -> Option<FileBundle> {
        if code.is_empty() || !self.working.insert(path, code) {
            return None;
        }
        self.emitter.mark(now).then(|| self.merged())
    }

    /// Emit a coalesced trailing update once the interval has elapsed.
    pub fn poll(&mut self, now: Instant) -> Option<FileBundle> {
        self.emitter.poll(now).then(|| self.merged())
    }

    /// Emit any pending update immediately.
    pub fn flush_pending(&mut self, now: Instant) -> Option<FileBundle> {
        if !self.emitter.is_pending() {
            return None;
        }
        self.emitter.force(now);
        Some(self.merged())
    }

    /// Fold the working deltas into the committed bundle and emit it.
    pub fn commit(&mut self, now: Instant) -> FileBundle {
        let working = std::mem::take(&mut self.working);
        self.committed.merge(&working);
        self.emitter.force(now);
        self.committed.clone()
    }

    /// Discard uncommitted deltas, e.g. when a new artifact begins.
    pub fn begin_artifact(&mut self) {
        self.working.clear();
        self.emitter.reset();
    }

    /// Replace everything with a bundle fetched in full.
    pub fn replace(&mut self, bundle: FileBundle) {
        self.committed = bundle;
        self.working.clear();
        self.emitter.reset();
    }
}
