//! Common test utilities: canonical test tree + fully wired validator.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tempfile::TempDir;

use syncserve::{
    CommandValidator, FileWatchService, ReadWriteHandler, SchemaSet, TreeHandler,
};

/// Builds the canonical test tree used across the protocol tests:
/// file1.txt (6 bytes), morefiles/{file2,file3}.txt (empty),
/// subdir1/subdir2/file4.txt (empty), and a hidden .git directory.
pub fn testdir() -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("file1.txt"), "foobar").unwrap();
    fs::create_dir_all(dir.path().join("morefiles")).unwrap();
    fs::write(dir.path().join("morefiles/file2.txt"), "").unwrap();
    fs::write(dir.path().join("morefiles/file3.txt"), "").unwrap();
    fs::create_dir_all(dir.path().join("subdir1/subdir2")).unwrap();
    fs::write(dir.path().join("subdir1/subdir2/file4.txt"), "").unwrap();
    fs::create_dir_all(dir.path().join(".git")).unwrap();
    fs::write(dir.path().join(".git/secretfile.txt"), "secret").unwrap();
    let root = dir.path().canonicalize().unwrap();
    (dir, root)
}

/// Wires every handler onto a fresh validator over `root`, using a short
/// poll timeout so watch tests stay fast.
pub fn validator_for(root: &Path) -> CommandValidator {
    let mut validator = CommandValidator::new(SchemaSet::builtin(), root);
    validator.register(&ReadWriteHandler);
    validator.register(&TreeHandler::new(root));
    let watch =
        FileWatchService::with_timeouts(root, Duration::from_secs(2), Duration::from_secs(60));
    validator.register(&watch);
    validator
}
