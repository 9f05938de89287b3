//! Tree listing and fingerprint handlers
//!
//! `parse` lists the files under a directory, one per line, optionally
//! with each file's content fingerprint; `hash` fingerprints a raw
//! payload. Hidden files and directories never appear in a listing.

use std::cmp::Ordering;
use std::path::{Path, PathBuf};

use ignore::WalkBuilder;
use tracing::warn;

use crate::error::SyncResult;
use crate::fingerprint;
use crate::paths;
use crate::types::Value;
use crate::validator::{Binding, CommandHandler, Response};

/// Handles the `parse` and `hash` commands.
#[derive(Debug, Clone)]
pub struct TreeHandler {
    root: PathBuf,
}

impl TreeHandler {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Lists files under `directory`: within each directory, its files come
    /// before the contents of its subdirectories, names sorted.
    ///
    /// `depth` limits how many directory levels are visited; zero (or a
    /// negative value) means unlimited. Each output line is the file's
    /// root-relative path, followed by its fingerprint when `hash` is set,
    /// terminated by a line feed.
    pub fn parse(&self, directory: &Path, depth: i64, hash: bool) -> SyncResult<String> {
        let mut walk = WalkBuilder::new(directory);
        walk.standard_filters(false).hidden(true);
        if let Some(limit) = usize::try_from(depth).ok().filter(|&d| d > 0) {
            walk.max_depth(Some(limit));
        }

        let mut found = Vec::new();
        for entry in walk.build() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(error = %e, "skipping unreadable entry");
                    continue;
                }
            };
            if !entry.file_type().is_some_and(|t| t.is_file()) {
                continue;
            }
            found.push(entry.into_path());
        }
        found.sort_by(|a, b| walk_order(a, b));

        let mut listing = String::new();
        for path in found {
            listing.push_str(&paths::to_relative(&path, &self.root));
            if hash {
                listing.push(' ');
                listing.push_str(&fingerprint::fingerprint_file(&path)?);
            }
            listing.push('\n');
        }
        Ok(listing)
    }

    /// Fingerprints a raw payload.
    pub fn hash(&self, contents: &str) -> String {
        fingerprint::fingerprint(contents.as_bytes())
    }
}

/// Orders file paths the way a depth-first directory walk emits them: at
/// the first differing component, a file sorts before a sibling directory's
/// contents, otherwise names compare lexicographically.
fn walk_order(a: &Path, b: &Path) -> Ordering {
    let a_parts: Vec<_> = a.components().collect();
    let b_parts: Vec<_> = b.components().collect();
    let mut i = 0;
    loop {
        match (a_parts.get(i), b_parts.get(i)) {
            (Some(x), Some(y)) if x == y => i += 1,
            (Some(x), Some(y)) => {
                let a_is_file_here = i + 1 == a_parts.len();
                let b_is_file_here = i + 1 == b_parts.len();
                return match (a_is_file_here, b_is_file_here) {
                    (true, false) => Ordering::Less,
                    (false, true) => Ordering::Greater,
                    _ => x.cmp(y),
                };
            }
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
        }
    }
}

impl CommandHandler for TreeHandler {
    fn bindings(&self) -> Vec<Binding> {
        let parse = self.clone();
        let hash = self.clone();
        vec![
            Binding::new("parse", 3, move |mut args| {
                let directory = args.remove(0).into_path()?;
                let depth = args.remove(0).into_num()?;
                let with_hash = args.remove(0).into_bool()?;
                let tree = parse.parse(&directory, depth, with_hash)?;
                Ok(Response::empty().field("Tree", Value::Str(tree)))
            }),
            Binding::new("hash", 1, move |mut args| {
                let contents = args.remove(0).into_str()?;
                Ok(Response::empty().field("Hash", Value::Str(hash.hash(&contents))))
            }),
        ]
    }
}
