//! Command handler modules
//!
//! Each handler exposes its commands through
//! [`CommandHandler::bindings`](crate::validator::CommandHandler); see the
//! watch module for the `watch_*` handlers.

mod readwrite;
mod tree;

pub use readwrite::ReadWriteHandler;
pub use tree::TreeHandler;
