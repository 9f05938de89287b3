//! Keyed registry of live sessions with idle expiry
//!
//! Session ids are monotonically increasing and never reused. Every lookup
//! refreshes the session's last-access time (atomically with the lookup,
//! since the caller holds the surrounding lock), and both lookups and
//! inserts lazily sweep expired sessions. The cleanup callback runs before
//! a session is removed so its watcher thread is terminated first.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tracing::warn;

/// Sessions idle longer than this are expired.
pub const SESSION_EXPIRY: Duration = Duration::from_secs(60 * 30);

struct Entry<T> {
    value: T,
    last_access: Instant,
}

/// Registry of active sessions, keyed by id.
pub struct SessionTracker<T> {
    sessions: HashMap<u64, Entry<T>>,
    next_id: u64,
    expiry: Duration,
    cleanup: Box<dyn Fn(&mut T) + Send>,
}

impl<T> SessionTracker<T> {
    pub fn new(expiry: Duration, cleanup: impl Fn(&mut T) + Send + 'static) -> Self {
        Self {
            sessions: HashMap::new(),
            next_id: 0,
            expiry,
            cleanup: Box::new(cleanup),
        }
    }

    /// Adds a session and returns its id.
    pub fn add(&mut self, value: T) -> u64 {
        self.sweep();
        let id = self.next_id;
        self.next_id += 1;
        self.sessions.insert(
            id,
            Entry {
                value,
                last_access: Instant::now(),
            },
        );
        id
    }

    /// Looks up a session, refreshing its last-access time.
    pub fn get(&mut self, id: u64) -> Option<&mut T> {
        self.sweep();
        let entry = self.sessions.get_mut(&id)?;
        entry.last_access = Instant::now();
        Some(&mut entry.value)
    }

    pub fn contains(&self, id: u64) -> bool {
        self.sessions.contains_key(&id)
    }

    /// Removes a session, running the cleanup callback first.
    ///
    /// Returns false if the id was not live.
    pub fn remove(&mut self, id: u64) -> bool {
        match self.sessions.remove(&id) {
            Some(mut entry) => {
                (self.cleanup)(&mut entry.value);
                true
            }
            None => false,
        }
    }

    /// Expires every session idle longer than the threshold.
    pub fn sweep(&mut self) {
        let expiry = self.expiry;
        let expired: Vec<u64> = self
            .sessions
            .iter()
            .filter(|(_, entry)| entry.last_access.elapsed() > expiry)
            .map(|(&id, _)| id)
            .collect();
        for id in expired {
            warn!(id, "watch session expired");
            self.remove(id);
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
