//! Server configuration
//!
//! Loaded from a TOML file when one is given; CLI flags override the file.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::SyncResult;

/// Server-wide settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// Address the HTTP transport binds to
    pub bind: String,
    /// Seconds `watch_poll` blocks waiting for a change
    pub poll_timeout_secs: u64,
    /// Seconds of inactivity before a watch session expires
    pub session_expiry_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:6050".to_string(),
            poll_timeout_secs: 5,
            session_expiry_secs: 60 * 30,
        }
    }
}

impl ServerConfig {
    pub fn load(path: &Path) -> SyncResult<Self> {
        let text = fs::read_to_string(path)?;
        Ok(toml::from_str(&text)?)
    }

    pub fn poll_timeout(&self) -> Duration {
        Duration::from_secs(self.poll_timeout_secs)
    }

    pub fn session_expiry(&self) -> Duration {
        Duration::from_secs(self.session_expiry_secs)
    }

    /// Sweep interval for the idle-session sweeper: a tenth of the expiry
    /// threshold, at least one second.
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs((self.session_expiry_secs / 10).max(1))
    }
}
