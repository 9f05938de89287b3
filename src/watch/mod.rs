//! Change-watch service
//!
//! Session-managed bridge between OS filesystem notifications and the
//! synchronous polling protocol:
//! - one background watcher thread per session ([`DirectoryWatcher`])
//! - a deduplicating blocking queue per session ([`ChangeQueue`])
//! - idle-expiring session registry ([`SessionTracker`])
//! - the `watch_start`/`watch_poll`/`watch_stop` handlers
//!   ([`FileWatchService`])

mod queue;
mod service;
mod session;
mod watcher;

pub use queue::{ChangeEvent, ChangeKind, ChangeQueue};
pub use service::{FileWatchService, ID_NO_LONGER_VALID, POLL_TIMEOUT};
pub use session::{SessionTracker, SESSION_EXPIRY};
pub use watcher::{accept_all, translate, DirectoryWatcher, PathFilter};
