//! syncserve - directory synchronization server
//!
//! Serves a directory tree to remote clients over a small line-oriented
//! request/response protocol: list/fingerprint files, read/write/delete
//! files, and subscribe to live filesystem change notifications through
//! polled watch sessions.

pub mod config;
pub mod error;
pub mod fingerprint;
pub mod handlers;
pub mod paths;
pub mod schema;
pub mod server;
pub mod types;
pub mod validator;
pub mod watch;

// Re-exports for convenience
pub use config::ServerConfig;
pub use error::{SyncError, SyncResult};
pub use handlers::{ReadWriteHandler, TreeHandler};
pub use schema::{ArgumentSpec, CommandSchema, SchemaSet, TypeTag};
pub use types::Value;
pub use validator::{Binding, CommandHandler, CommandValidator, Response};
pub use watch::{ChangeEvent, ChangeKind, ChangeQueue, DirectoryWatcher, FileWatchService, SessionTracker};
