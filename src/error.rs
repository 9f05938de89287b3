//! Error types for syncserve
//!
//! Every protocol failure is classified as client-fault (400 class) or
//! server-fault (500 class). Handler failures that are not already
//! classified are assumed to be caller errors; engine contract violations
//! (bad response shapes, missing converters) are always server faults.

use thiserror::Error;

/// Result type alias for syncserve operations
pub type SyncResult<T> = Result<T, SyncError>;

/// Main error type for syncserve operations
#[derive(Error, Debug)]
pub enum SyncError {
    /// Client fault: unknown command, bad argument, forbidden path, etc.
    #[error("bad request: {explain}")]
    BadRequest { explain: String },

    /// Server fault: engine/handler contract violation
    #[error("internal error: {explain}")]
    Internal { explain: String },

    /// IO error raised by a handler
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// OS-level watch could not be established
    #[error("watch error: {0}")]
    Watch(#[from] notify::Error),

    /// Command schema file could not be parsed
    #[error("invalid command schema: {0}")]
    Schema(#[from] serde_json::Error),

    /// Config file could not be parsed
    #[error("invalid config: {0}")]
    Config(#[from] toml::de::Error),
}

impl SyncError {
    pub fn bad_request(explain: impl Into<String>) -> Self {
        SyncError::BadRequest {
            explain: explain.into(),
        }
    }

    pub fn internal(explain: impl Into<String>) -> Self {
        SyncError::Internal {
            explain: explain.into(),
        }
    }

    /// HTTP-style status code for this error
    pub fn code(&self) -> u16 {
        match self {
            SyncError::BadRequest { .. } | SyncError::Io(_) | SyncError::Watch(_) => 400,
            SyncError::Internal { .. } | SyncError::Schema(_) | SyncError::Config(_) => 500,
        }
    }

    /// Reclassifies an error crossing the dispatch boundary.
    ///
    /// Already-classified protocol errors pass through unchanged. Anything
    /// a handler raised (IO, watch setup) is assumed to be a caller error
    /// and becomes a `BadRequest` carrying the original description.
    pub fn classify(self) -> Self {
        match self {
            e @ (SyncError::BadRequest { .. } | SyncError::Internal { .. }) => e,
            SyncError::Io(e) => SyncError::bad_request(format!("error during handler: {e}")),
            SyncError::Watch(e) => SyncError::bad_request(format!("error during handler: {e}")),
            other => SyncError::internal(other.to_string()),
        }
    }
}
