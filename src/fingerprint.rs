//! Content fingerprint for change detection
//!
//! The fingerprint is the count of bytes excluding line feeds, rendered as
//! a decimal string. It is a cheap change-detection heuristic shared with
//! the client, not a hash in the security sense; clients compare it against
//! their own copy of the file to decide whether a transfer is needed.

use std::fs;
use std::path::Path;

use crate::error::SyncResult;

/// Fingerprint of a byte buffer: byte count minus line-feed count.
pub fn fingerprint(content: &[u8]) -> String {
    content.iter().filter(|&&b| b != b'\n').count().to_string()
}

/// Fingerprint of a file's current contents.
pub fn fingerprint_file(path: &Path) -> SyncResult<String> {
    let content = fs::read(path)?;
    Ok(fingerprint(&content))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_fingerprint_empty() {
        assert_eq!(fingerprint(b""), "0");
    }

    #[test]
    fn test_fingerprint_foobar() {
        assert_eq!(fingerprint(b"foobar"), "6");
    }

    #[test]
    fn test_fingerprint_excludes_line_feeds() {
        assert_eq!(fingerprint(b"foo\nbar\n"), "6");
        assert_eq!(fingerprint(b"\n\n\n"), "0");
        // carriage returns count as content
        assert_eq!(fingerprint(b"a\r\nb"), "3");
    }

    #[test]
    fn test_fingerprint_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("file1.txt");
        fs::write(&path, "foobar").unwrap();
        assert_eq!(fingerprint_file(&path).unwrap(), "6");
    }

    #[test]
    fn test_fingerprint_missing_file_errors() {
        let dir = tempdir().unwrap();
        assert!(fingerprint_file(&dir.path().join("absent")).is_err());
    }

    proptest! {
        #[test]
        fn fingerprint_is_length_minus_line_feeds(content: Vec<u8>) {
            let expected = content.len() - content.iter().filter(|&&b| b == b'\n').count();
            prop_assert_eq!(fingerprint(&content), expected.to_string());
        }
    }
}
