//! Directory watcher: OS notifications in, change events out
//!
//! One watcher per watch session. Construction establishes the OS-level
//! watch immediately (a failure there is fatal to the session) and spawns a
//! background thread that translates `notify` events into [`ChangeEvent`]s,
//! runs them through the session's path filter, and pushes them into the
//! session's queue until killed.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{channel, RecvTimeoutError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use notify::event::{EventKind, ModifyKind, RenameMode};
use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{debug, trace};

use crate::error::SyncResult;
use crate::watch::queue::{ChangeEvent, ChangeKind, ChangeQueue};

/// How long the translation thread waits on the OS channel before checking
/// the termination flag. Bounds how quickly `kill` takes effect.
const NOTIFY_WAIT: Duration = Duration::from_millis(50);

/// Filter applied to each full path before an event is emitted.
pub type PathFilter = Arc<dyn Fn(&Path) -> bool + Send + Sync>;

/// A filter that suppresses nothing.
pub fn accept_all() -> PathFilter {
    Arc::new(|_| true)
}

/// Background thread bound to one directory.
#[derive(Debug)]
pub struct DirectoryWatcher {
    running: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl DirectoryWatcher {
    /// Establishes the OS watch on `directory` and starts translating.
    ///
    /// Events that pass `filter` land in `queue`. Recursive; monitoring
    /// begins before this returns.
    pub fn spawn(
        directory: &Path,
        queue: Arc<ChangeQueue>,
        filter: PathFilter,
    ) -> SyncResult<Self> {
        let (tx, rx) = channel();
        let mut watcher: RecommendedWatcher =
            notify::recommended_watcher(move |result: Result<Event, notify::Error>| {
                if let Ok(event) = result {
                    let _ = tx.send(event);
                }
            })?;
        watcher.watch(directory, RecursiveMode::Recursive)?;
        debug!(directory = %directory.display(), "watch established");

        let running = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&running);
        let thread = thread::spawn(move || {
            // The watcher moves in here so the OS handle lives exactly as
            // long as the thread and is released when it exits.
            let _watcher = watcher;
            while flag.load(Ordering::SeqCst) {
                match rx.recv_timeout(NOTIFY_WAIT) {
                    Ok(event) => {
                        for change in translate(&event) {
                            if filter(&change.path) {
                                trace!(?change, "change event");
                                queue.put(change);
                            }
                        }
                    }
                    Err(RecvTimeoutError::Timeout) => continue,
                    Err(RecvTimeoutError::Disconnected) => break,
                }
            }
        });

        Ok(Self {
            running,
            thread: Some(thread),
        })
    }

    /// Signals termination and waits for the thread to observe it.
    ///
    /// The wait is bounded by one notification-wait cycle.
    pub fn kill(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.thread.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for DirectoryWatcher {
    fn drop(&mut self) {
        self.kill();
    }
}

/// Maps one OS notification to zero or more change events.
///
/// Renames decompose into Deleted(old) then Added(new). A rename with only
/// one known side maps to what that side tells us; an unqualified
/// single-path rename falls back to Modified since we cannot tell which
/// side we saw.
pub fn translate(event: &Event) -> Vec<ChangeEvent> {
    let paths = &event.paths;
    match event.kind {
        EventKind::Create(_) => each(paths, ChangeKind::Added),
        EventKind::Remove(_) => each(paths, ChangeKind::Deleted),
        EventKind::Modify(ModifyKind::Name(mode)) => match mode {
            RenameMode::From => each(paths, ChangeKind::Deleted),
            RenameMode::To => each(paths, ChangeKind::Added),
            RenameMode::Both | RenameMode::Any | RenameMode::Other => {
                if paths.len() >= 2 {
                    vec![
                        ChangeEvent::new(ChangeKind::Deleted, paths[0].clone()),
                        ChangeEvent::new(ChangeKind::Added, paths[1].clone()),
                    ]
                } else {
                    each(paths, ChangeKind::Modified)
                }
            }
        },
        EventKind::Modify(_) => each(paths, ChangeKind::Modified),
        EventKind::Access(_) | EventKind::Any | EventKind::Other => Vec::new(),
    }
}

fn each(paths: &[PathBuf], kind: ChangeKind) -> Vec<ChangeEvent> {
    paths
        .iter()
        .map(|path| ChangeEvent::new(kind, path.clone()))
        .collect()
}
