//! Change events and the blocking, deduplicating event queue

use std::collections::{HashSet, VecDeque};
use std::path::PathBuf;
use std::sync::{Condvar, Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// Kind of filesystem change.
///
/// A rename never appears as its own kind; it is decomposed into a
/// `Deleted` for the old path followed by an `Added` for the new one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    Added,
    Deleted,
    Modified,
}

impl ChangeKind {
    /// Lowercase wire token for this kind.
    pub fn token(&self) -> &'static str {
        match self {
            ChangeKind::Added => "add",
            ChangeKind::Deleted => "delete",
            ChangeKind::Modified => "modify",
        }
    }
}

/// One typed filesystem notification.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChangeEvent {
    pub kind: ChangeKind,
    pub path: PathBuf,
}

impl ChangeEvent {
    pub fn new(kind: ChangeKind, path: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            path: path.into(),
        }
    }
}

/// Unbounded thread-safe FIFO of change events with blocking consumption.
///
/// The watcher thread produces with `put`; the polling caller consumes with
/// `get`, which blocks up to a timeout. `deduplicate` collapses bursts of
/// identical OS notifications (e.g. several "modified" events for one
/// write) before a blocking read.
#[derive(Debug, Default)]
pub struct ChangeQueue {
    events: Mutex<VecDeque<ChangeEvent>>,
    available: Condvar,
}

impl ChangeQueue {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<ChangeEvent>> {
        self.events.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Non-blocking enqueue, callable from the watcher thread.
    pub fn put(&self, event: ChangeEvent) {
        self.lock().push_back(event);
        self.available.notify_one();
    }

    /// Blocks until an event is available or the timeout elapses.
    ///
    /// `None` means the timeout elapsed with nothing pending; it can never
    /// collide with real data.
    pub fn get(&self, timeout: Duration) -> Option<ChangeEvent> {
        let deadline = Instant::now() + timeout;
        let mut events = self.lock();
        loop {
            if let Some(event) = events.pop_front() {
                return Some(event);
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return None;
            }
            let (guard, _timeout_result) = self
                .available
                .wait_timeout(events, remaining)
                .unwrap_or_else(|e| e.into_inner());
            events = guard;
        }
    }

    /// Removes exact duplicate events, keeping the first occurrence of each
    /// in its original position. Runs with exclusive access to the queue.
    pub fn deduplicate(&self) {
        let mut events = self.lock();
        let mut seen = HashSet::new();
        events.retain(|event| seen.insert(event.clone()));
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
