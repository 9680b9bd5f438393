//! Content hashing for duplicate detection.
//!
//! The digest is advisory: it only decides whether a file seen earlier in the
//! same run has identical content. It is never persisted or compared across
//! runs, and collision resistance is not a security requirement here.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Computes the blake3 digest of a file's full content, as a hex string.
///
/// Callers treat an error as "duplicate status unknown" and proceed as if the
/// file were unique; hashing failure never blocks a move.
pub fn hash_file(path: &Path) -> std::io::Result<String> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    let mut hasher = blake3::Hasher::new();
    let mut buffer = [0u8; 8192];

    loop {
        let bytes_read = reader.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hasher.finalize().to_hex().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_identical_content_same_digest() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let a = temp_dir.path().join("a.txt");
        let b = temp_dir.path().join("b.txt");
        fs::write(&a, "same content").expect("Failed to write a");
        fs::write(&b, "same content").expect("Failed to write b");

        let hash_a = hash_file(&a).expect("hash a");
        let hash_b = hash_file(&b).expect("hash b");
        assert_eq!(hash_a, hash_b);
        assert_eq!(hash_a.len(), 64);
    }

    #[test]
    fn test_different_content_different_digest() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let a = temp_dir.path().join("a.txt");
        let b = temp_dir.path().join("b.txt");
        fs::write(&a, "one").expect("Failed to write a");
        fs::write(&b, "two").expect("Failed to write b");

        assert_ne!(
            hash_file(&a).expect("hash a"),
            hash_file(&b).expect("hash b")
        );
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        assert!(hash_file(&temp_dir.path().join("gone.txt")).is_err());
    }
}
