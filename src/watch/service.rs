//! File-watch command service: `watch_start`, `watch_poll`, `watch_stop`
//!
//! Bridges the asynchronous watcher threads to the synchronous polling
//! protocol. Each session owns one watcher plus one queue; polling blocks
//! the calling worker for at most the poll timeout.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::error::SyncResult;
use crate::fingerprint;
use crate::paths;
use crate::types::Value;
use crate::validator::{Binding, CommandHandler, Response};
use crate::watch::queue::ChangeQueue;
use crate::watch::session::{SessionTracker, SESSION_EXPIRY};
use crate::watch::watcher::{DirectoryWatcher, PathFilter};

/// How long `watch_poll` blocks waiting for a change.
pub const POLL_TIMEOUT: Duration = Duration::from_secs(5);

/// Grace period before fingerprinting a changed file, so the writer that
/// triggered the notification has finished its write.
const SETTLE: Duration = Duration::from_millis(100);

/// Sentinel returned when polling a session that no longer exists.
pub const ID_NO_LONGER_VALID: &str = "error ID_NO_LONGER_VALID";

struct WatchSession {
    watcher: DirectoryWatcher,
    queue: Arc<ChangeQueue>,
}

struct Inner {
    root: PathBuf,
    poll_timeout: Duration,
    sessions: Mutex<SessionTracker<WatchSession>>,
}

impl Inner {
    fn sessions(&self) -> MutexGuard<'_, SessionTracker<WatchSession>> {
        self.sessions.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// The command-handler-facing watch API.
#[derive(Clone)]
pub struct FileWatchService {
    inner: Arc<Inner>,
}

impl FileWatchService {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_timeouts(root, POLL_TIMEOUT, SESSION_EXPIRY)
    }

    /// Constructor with explicit timeouts, mainly for tests.
    pub fn with_timeouts(
        root: impl Into<PathBuf>,
        poll_timeout: Duration,
        expiry: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                root: root.into(),
                poll_timeout,
                sessions: Mutex::new(SessionTracker::new(expiry, |session: &mut WatchSession| {
                    session.watcher.kill();
                })),
            }),
        }
    }

    /// Spawns a background thread that periodically expires idle sessions.
    /// The thread exits when the service is dropped.
    pub fn start_sweeper(&self, interval: Duration) {
        let weak = Arc::downgrade(&self.inner);
        thread::spawn(move || loop {
            thread::sleep(interval);
            match weak.upgrade() {
                Some(inner) => inner.sessions().sweep(),
                None => break,
            }
        });
    }

    /// Starts watching `directory` and returns the new session id.
    pub fn watch_start(&self, directory: &Path) -> SyncResult<u64> {
        let queue = Arc::new(ChangeQueue::new());
        let watcher =
            DirectoryWatcher::spawn(directory, Arc::clone(&queue), self.hidden_filter())?;
        let id = self
            .inner
            .sessions()
            .add(WatchSession { watcher, queue });
        info!(id, directory = %directory.display(), "watch session started");
        Ok(id)
    }

    /// Blocks up to the poll timeout waiting for one reportable change.
    ///
    /// Returns the wire-format change line, the empty string on timeout, or
    /// the dead-session sentinel. Hidden paths and files that cannot be
    /// read when the event arrives are silently discarded; waiting resumes
    /// within the same timeout budget.
    pub fn watch_poll(&self, id: i64) -> SyncResult<String> {
        let deadline = Instant::now() + self.inner.poll_timeout;
        let Some(queue) = self.lookup_queue(id) else {
            return Ok(ID_NO_LONGER_VALID.to_string());
        };

        loop {
            queue.deduplicate();
            let remaining = deadline.saturating_duration_since(Instant::now());
            let Some(event) = queue.get(remaining) else {
                return Ok(String::new());
            };

            let relative = paths::to_relative(&event.path, &self.inner.root);
            if paths::has_hidden_component(&relative) {
                debug!(path = %relative, "suppressing change under hidden path");
                continue;
            }

            thread::sleep(SETTLE);
            match fingerprint::fingerprint_file(&event.path) {
                Ok(fp) => {
                    return Ok(format!("{} '{}' {}", event.kind.token(), relative, fp));
                }
                Err(e) => {
                    // Deleted or locked mid-poll; not reported to the client.
                    debug!(path = %relative, error = %e, "discarding unreadable change");
                    continue;
                }
            }
        }
    }

    /// Terminates and removes a session. A dead id is a logged no-op.
    pub fn watch_stop(&self, id: i64) {
        let removed = match u64::try_from(id) {
            Ok(id) => self.inner.sessions().remove(id),
            Err(_) => false,
        };
        if removed {
            info!(id, "watch session stopped");
        } else {
            warn!(id, "watch_stop called on non-existent session");
        }
    }

    /// Number of live sessions (after a sweep).
    pub fn live_sessions(&self) -> usize {
        let mut sessions = self.inner.sessions();
        sessions.sweep();
        sessions.len()
    }

    /// Clones the session's queue handle under a short-lived lock, so the
    /// blocking wait never holds the tracker lock. The lookup refreshes the
    /// session's last-access time.
    fn lookup_queue(&self, id: i64) -> Option<Arc<ChangeQueue>> {
        let id = u64::try_from(id).ok()?;
        let mut sessions = self.inner.sessions();
        sessions.get(id).map(|session| Arc::clone(&session.queue))
    }

    /// Drops anything under a hidden path segment relative to the root.
    fn hidden_filter(&self) -> PathFilter {
        let root = self.inner.root.clone();
        Arc::new(move |path| {
            !paths::has_hidden_component(&paths::to_relative(path, &root))
        })
    }
}

impl CommandHandler for FileWatchService {
    fn bindings(&self) -> Vec<Binding> {
        let start = self.clone();
        let poll = self.clone();
        let stop = self.clone();
        vec![
            Binding::new("watch_start", 1, move |mut args| {
                let directory = args.remove(0).into_path()?;
                let id = start.watch_start(&directory)?;
                Ok(Response::empty().field("ID", Value::Num(id as i64)))
            }),
            Binding::new("watch_poll", 1, move |mut args| {
                let id = args.remove(0).into_num()?;
                let change = poll.watch_poll(id)?;
                Ok(Response::empty().field("FileChange", Value::Str(change)))
            }),
            Binding::new("watch_stop", 1, move |mut args| {
                let id = args.remove(0).into_num()?;
                stop.watch_stop(id);
                Ok(Response::empty())
            }),
        ]
    }
}
