//! The transaction log that makes organization reversible.
//!
//! Every successful move is recorded as `target path -> original path`. The
//! log lives in memory during a run and is persisted in one shot as a flat,
//! pretty-printed JSON object so it stays readable for manual recovery. Each
//! save overwrites the previous persisted state wholesale.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Default persisted location, relative to the process working directory
/// (not the organized directory).
pub const DEFAULT_LEDGER_FILE: &str = "restore_log.json";

/// Errors from loading or persisting the transaction log.
#[derive(Debug)]
pub enum LedgerError {
    /// No persisted log exists at the given path.
    NotFound(PathBuf),
    /// A persisted log exists but records no moves.
    Empty,
    /// The persisted log is not a valid string-to-string JSON object.
    Parse { reason: String },
    /// Read or write failure.
    Io(std::io::Error),
}

impl std::fmt::Display for LedgerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(path) => write!(f, "No restore log found at {}", path.display()),
            Self::Empty => write!(f, "Restore log is empty"),
            Self::Parse { reason } => write!(f, "Invalid restore log format: {}", reason),
            Self::Io(source) => write!(f, "Restore log I/O error: {}", source),
        }
    }
}

impl std::error::Error for LedgerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(source) => Some(source),
            _ => None,
        }
    }
}

/// Mapping from each moved file's new location to its original location.
///
/// Target paths are unique by construction (map keys); recording the same
/// target twice keeps the last original, which cannot happen in a normal run
/// but is deliberately not rejected.
#[derive(Debug, Clone)]
pub struct TransactionLog {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl TransactionLog {
    /// An empty in-memory log that will persist to `path`.
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            entries: BTreeMap::new(),
        }
    }

    /// Where this log persists.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Records a completed move. Last write wins on a repeated target.
    pub fn record(&mut self, target: &Path, original: &Path) {
        self.entries.insert(
            target.to_string_lossy().into_owned(),
            original.to_string_lossy().into_owned(),
        );
    }

    /// Entries as `(target, original)` pairs, in the map's sorted order.
    ///
    /// Note this is the persisted iteration order too; it is not guaranteed
    /// to be the reverse of the original move order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(target, original)| (target.as_str(), original.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Empties the in-memory state. Persisted state is untouched until the
    /// next [`save`](Self::save).
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Persists the full mapping, overwriting any prior persisted state.
    pub fn save(&self) -> Result<(), LedgerError> {
        let json = serde_json::to_string_pretty(&self.entries).map_err(|e| LedgerError::Io(
            std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("JSON serialization failed: {}", e),
            ),
        ))?;
        fs::write(&self.path, json).map_err(LedgerError::Io)
    }

    /// Loads a persisted log.
    ///
    /// Distinguishes a missing log, a corrupt log, and a log with no entries,
    /// so callers can report each precondition failure precisely.
    pub fn load(path: &Path) -> Result<Self, LedgerError> {
        if !path.exists() {
            return Err(LedgerError::NotFound(path.to_path_buf()));
        }
        let raw = fs::read_to_string(path).map_err(LedgerError::Io)?;
        let entries: BTreeMap<String, String> =
            serde_json::from_str(&raw).map_err(|e| LedgerError::Parse {
                reason: e.to_string(),
            })?;
        if entries.is_empty() {
            return Err(LedgerError::Empty);
        }
        Ok(Self {
            path: path.to_path_buf(),
            entries,
        })
    }

    /// Deletes the persisted log file, if present.
    pub fn delete(path: &Path) -> Result<(), LedgerError> {
        if path.exists() {
            fs::remove_file(path).map_err(LedgerError::Io)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn ledger_path(temp_dir: &TempDir) -> PathBuf {
        temp_dir.path().join(DEFAULT_LEDGER_FILE)
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = ledger_path(&temp_dir);

        let mut log = TransactionLog::new(path.clone());
        log.record(Path::new("/base/Documents/a.txt"), Path::new("/base/a.txt"));
        log.record(Path::new("/base/Images/b.png"), Path::new("/base/b.png"));
        log.save().expect("save failed");

        let loaded = TransactionLog::load(&path).expect("load failed");
        assert_eq!(loaded.len(), 2);
        let entries: Vec<_> = loaded.entries().collect();
        assert!(entries.contains(&("/base/Documents/a.txt", "/base/a.txt")));
        assert!(entries.contains(&("/base/Images/b.png", "/base/b.png")));
    }

    #[test]
    fn test_persisted_log_is_readable_text() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = ledger_path(&temp_dir);

        let mut log = TransactionLog::new(path.clone());
        log.record(Path::new("/base/Documents/a.txt"), Path::new("/base/a.txt"));
        log.save().expect("save failed");

        let raw = fs::read_to_string(&path).expect("read failed");
        assert!(raw.contains("/base/Documents/a.txt"));
        assert!(raw.contains("/base/a.txt"));
    }

    #[test]
    fn test_load_missing_log() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let result = TransactionLog::load(&ledger_path(&temp_dir));
        assert!(matches!(result, Err(LedgerError::NotFound(_))));
    }

    #[test]
    fn test_load_empty_log() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = ledger_path(&temp_dir);
        TransactionLog::new(path.clone()).save().expect("save failed");

        let result = TransactionLog::load(&path);
        assert!(matches!(result, Err(LedgerError::Empty)));
    }

    #[test]
    fn test_load_corrupt_log() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = ledger_path(&temp_dir);
        fs::write(&path, "not json at all").expect("write failed");

        let result = TransactionLog::load(&path);
        assert!(matches!(result, Err(LedgerError::Parse { .. })));
    }

    #[test]
    fn test_repeated_target_keeps_last_original() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let mut log = TransactionLog::new(ledger_path(&temp_dir));
        log.record(Path::new("/base/Documents/a.txt"), Path::new("/base/a.txt"));
        log.record(
            Path::new("/base/Documents/a.txt"),
            Path::new("/elsewhere/a.txt"),
        );

        assert_eq!(log.len(), 1);
        let (_, original) = log.entries().next().expect("entry missing");
        assert_eq!(original, "/elsewhere/a.txt");
    }

    #[test]
    fn test_save_overwrites_previous_state() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = ledger_path(&temp_dir);

        let mut first = TransactionLog::new(path.clone());
        first.record(Path::new("/base/Documents/a.txt"), Path::new("/base/a.txt"));
        first.save().expect("save failed");

        let mut second = TransactionLog::new(path.clone());
        second.record(Path::new("/other/Code/b.py"), Path::new("/other/b.py"));
        second.save().expect("save failed");

        let loaded = TransactionLog::load(&path).expect("load failed");
        assert_eq!(loaded.len(), 1);
        assert_eq!(
            loaded.entries().next(),
            Some(("/other/Code/b.py", "/other/b.py"))
        );
    }

    #[test]
    fn test_clear_is_not_durable_until_saved() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = ledger_path(&temp_dir);

        let mut log = TransactionLog::new(path.clone());
        log.record(Path::new("/base/Documents/a.txt"), Path::new("/base/a.txt"));
        log.save().expect("save failed");

        log.clear();
        assert!(log.is_empty());
        // Persisted state still has the entry until the next save.
        assert!(TransactionLog::load(&path).is_ok());

        log.save().expect("save failed");
        assert!(matches!(TransactionLog::load(&path), Err(LedgerError::Empty)));
    }

    #[test]
    fn test_delete_removes_persisted_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = ledger_path(&temp_dir);

        let mut log = TransactionLog::new(path.clone());
        log.record(Path::new("/base/Documents/a.txt"), Path::new("/base/a.txt"));
        log.save().expect("save failed");

        TransactionLog::delete(&path).expect("delete failed");
        assert!(!path.exists());
        // Deleting again is fine.
        TransactionLog::delete(&path).expect("second delete failed");
    }
}
