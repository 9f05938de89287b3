//! Request path validation and conversion
//!
//! Clients address files with `/`-separated paths relative to the served
//! root. Resolution rejects parent-directory traversal and hidden (dot
//! prefixed) segments so a request can never escape the root or touch
//! metadata directories like `.git`.

use std::path::{Path, PathBuf};

use crate::error::{SyncError, SyncResult};

/// Resolves a client-supplied relative path onto the trusted root.
///
/// Empty input and `"."` resolve to the root itself. Empty segments are
/// dropped, so a leading or doubled `/` is harmless.
pub fn resolve(raw: &str, root: &Path) -> SyncResult<PathBuf> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "." {
        return Ok(root.to_path_buf());
    }
    let mut resolved = root.to_path_buf();
    for segment in trimmed.split('/') {
        if segment.is_empty() {
            continue;
        }
        if segment.starts_with("..") {
            return Err(SyncError::bad_request("parent directory operator forbidden"));
        }
        if segment.starts_with('.') {
            return Err(SyncError::bad_request(
                "cannot access hidden files/directories",
            ));
        }
        resolved.push(segment);
    }
    Ok(resolved)
}

/// Converts an absolute path under `root` back into the wire form: a
/// `/`-separated path relative to the root.
pub fn to_relative(path: &Path, root: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// True if any segment of a `/`-separated relative path is hidden.
pub fn has_hidden_component(relative: &str) -> bool {
    relative
        .split('/')
        .any(|segment| segment.len() > 1 && segment.starts_with('.'))
}
