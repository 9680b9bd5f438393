//! The restore engine: replay the transaction log backwards.
//!
//! Loads the persisted log, moves each recorded file back to its original
//! location, and optionally removes category folders the restore left empty.
//! Targets that vanished since the organize run are skipped with a note;
//! individual failures never stop the remaining entries. Clearing the spent
//! log is the caller's decision, not the engine's.

use crate::ledger::TransactionLog;
use crate::organize::{EngineError, EventSink};
use std::fs;
use std::path::{Path, PathBuf};

/// Options for one restore run.
#[derive(Debug, Clone, Copy)]
pub struct RestoreOptions {
    /// Remove category folders left empty after restoring.
    pub cleanup_empty: bool,
}

impl Default for RestoreOptions {
    fn default() -> Self {
        Self { cleanup_empty: true }
    }
}

/// What a restore run did, in processing order.
#[derive(Debug, Default)]
pub struct RestoreReport {
    /// Files moved back to their original location.
    pub restored: usize,
    /// Entries skipped because the target no longer exists.
    pub skipped: usize,
    /// Entries whose move back failed.
    pub failed: usize,
    /// Empty folders removed during cleanup.
    pub removed_dirs: usize,
    /// One line per processed entry, for display.
    pub messages: Vec<String>,
}

impl RestoreReport {
    /// True when every logged entry was put back.
    ///
    /// The caller uses this to decide whether the persisted log is spent;
    /// a skipped entry means something on disk no longer matches the log.
    pub fn is_complete_success(&self) -> bool {
        self.failed == 0 && self.skipped == 0
    }
}

/// Replays a persisted transaction log.
pub struct RestoreEngine {
    ledger_path: PathBuf,
}

impl RestoreEngine {
    pub fn new(ledger_path: PathBuf) -> Self {
        Self { ledger_path }
    }

    /// Restores every logged file, then optionally cleans up empty folders.
    ///
    /// A missing, empty, or corrupt log aborts before any file operation.
    /// The organize root for cleanup is inferred from the first entry's
    /// original path; that inference only holds when all entries came from
    /// one source directory, which is the supported shape of the log.
    pub fn restore(
        &self,
        options: &RestoreOptions,
        sink: &mut dyn EventSink,
    ) -> Result<RestoreReport, EngineError> {
        let ledger = TransactionLog::load(&self.ledger_path)?;

        sink.emit(&format!("Restoring {} files...", ledger.len()));
        log::info!(
            "Restoring {} files from {}",
            ledger.len(),
            self.ledger_path.display()
        );

        let organize_root: Option<PathBuf> = ledger
            .entries()
            .next()
            .and_then(|(_, original)| Path::new(original).parent().map(Path::to_path_buf));

        let mut report = RestoreReport::default();
        for (target, original) in ledger.entries() {
            let target_path = Path::new(target);
            let original_path = Path::new(original);
            let name = target_path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| target.to_string());

            if !target_path.exists() {
                report.skipped += 1;
                note(&mut report, sink, format!("Skipping {}: file not found", name));
                continue;
            }

            match restore_entry(target_path, original_path) {
                Ok(()) => {
                    report.restored += 1;
                    note(
                        &mut report,
                        sink,
                        format!("Restored {} to {}", name, original_path.display()),
                    );
                }
                Err(reason) => {
                    report.failed += 1;
                    log::error!("Error restoring {}: {}", target_path.display(), reason);
                    note(&mut report, sink, format!("Error restoring {}: {}", name, reason));
                }
            }
        }

        if options.cleanup_empty
            && let Some(root) = organize_root
        {
            cleanup_empty_dirs(&root, &mut report, sink);
        }

        sink.emit("Restore complete.");
        Ok(report)
    }
}

fn note(report: &mut RestoreReport, sink: &mut dyn EventSink, message: String) {
    log::info!("{}", message);
    sink.emit(&message);
    report.messages.push(message);
}

/// Moves one file back to its original location.
///
/// A file already sitting at the original path is backed up first with a
/// timestamp suffix rather than overwritten.
fn restore_entry(target: &Path, original: &Path) -> Result<(), String> {
    if original.exists() {
        let backup = backup_path(original);
        fs::rename(original, &backup)
            .map_err(|e| format!("could not back up conflicting file: {}", e))?;
    }

    fs::rename(target, original).map_err(|e| e.to_string())
}

/// `file.txt` becomes `file.txt.bak.20260830-143052`.
fn backup_path(original: &Path) -> PathBuf {
    let timestamp = chrono::Local::now().format("%Y%m%d-%H%M%S");
    let filename = original
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("file");
    let backup_name = format!("{}.bak.{}", filename, timestamp);

    match original.parent() {
        Some(parent) => parent.join(backup_name),
        None => PathBuf::from(backup_name),
    }
}

/// Removes the immediate subfolders of `root` that are now empty. Failures
/// are reported and not retried.
fn cleanup_empty_dirs(root: &Path, report: &mut RestoreReport, sink: &mut dyn EventSink) {
    let entries = match fs::read_dir(root) {
        Ok(entries) => entries,
        Err(e) => {
            note(
                report,
                sink,
                format!("Could not inspect {} for cleanup: {}", root.display(), e),
            );
            return;
        }
    };

    let mut subdirs: Vec<PathBuf> = entries
        .flatten()
        .filter(|entry| entry.file_type().map(|t| t.is_dir()).unwrap_or(false))
        .map(|entry| entry.path())
        .collect();
    subdirs.sort();

    for dir in subdirs {
        let is_empty = fs::read_dir(&dir)
            .map(|mut it| it.next().is_none())
            .unwrap_or(false);
        if !is_empty {
            continue;
        }
        let dir_name = dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| dir.display().to_string());
        match fs::remove_dir(&dir) {
            Ok(()) => {
                report.removed_dirs += 1;
                note(report, sink, format!("Removed empty folder: {}", dir_name));
            }
            Err(e) => {
                note(
                    report,
                    sink,
                    format!("Error removing {}: {}", dir_name, e),
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{DEFAULT_LEDGER_FILE, LedgerError};
    use std::fs;
    use tempfile::TempDir;

    struct Setup {
        source: TempDir,
        state: TempDir,
    }

    impl Setup {
        fn new() -> Self {
            Self {
                source: TempDir::new().expect("Failed to create source directory"),
                state: TempDir::new().expect("Failed to create state directory"),
            }
        }

        fn ledger_path(&self) -> PathBuf {
            self.state.path().join(DEFAULT_LEDGER_FILE)
        }

        /// Simulates an organize run: plants a file at `<category>/<name>`
        /// and logs it as moved from the source root.
        fn plant_moved_file(&self, ledger: &mut TransactionLog, category: &str, name: &str) {
            let category_dir = self.source.path().join(category);
            if !category_dir.exists() {
                fs::create_dir(&category_dir).expect("Failed to create category dir");
            }
            let target = category_dir.join(name);
            fs::write(&target, format!("content of {}", name)).expect("Failed to write file");
            ledger.record(&target, &self.source.path().join(name));
        }
    }

    fn run(setup: &Setup, options: &RestoreOptions) -> RestoreReport {
        let engine = RestoreEngine::new(setup.ledger_path());
        let mut sink = |_: &str| {};
        engine.restore(options, &mut sink).expect("restore failed")
    }

    #[test]
    fn test_restore_without_log_fails() {
        let setup = Setup::new();
        let engine = RestoreEngine::new(setup.ledger_path());
        let mut sink = |_: &str| {};

        let result = engine.restore(&RestoreOptions::default(), &mut sink);
        assert!(matches!(
            result,
            Err(EngineError::Ledger(LedgerError::NotFound(_)))
        ));
        // And no file operations happened.
        assert_eq!(
            fs::read_dir(setup.source.path()).expect("read_dir").count(),
            0
        );
    }

    #[test]
    fn test_restore_moves_files_back() {
        let setup = Setup::new();
        let mut ledger = TransactionLog::new(setup.ledger_path());
        setup.plant_moved_file(&mut ledger, "Documents", "report.txt");
        setup.plant_moved_file(&mut ledger, "Images", "photo.jpg");
        ledger.save().expect("save failed");

        let report = run(&setup, &RestoreOptions { cleanup_empty: false });

        assert_eq!(report.restored, 2);
        assert!(report.is_complete_success());
        assert!(setup.source.path().join("report.txt").exists());
        assert!(setup.source.path().join("photo.jpg").exists());
        // Without cleanup the emptied folders remain.
        assert!(setup.source.path().join("Documents").is_dir());
    }

    #[test]
    fn test_cleanup_removes_only_empty_folders() {
        let setup = Setup::new();
        let mut ledger = TransactionLog::new(setup.ledger_path());
        setup.plant_moved_file(&mut ledger, "Documents", "report.txt");
        setup.plant_moved_file(&mut ledger, "Images", "photo.jpg");
        ledger.save().expect("save failed");

        // A foreign file keeps Images non-empty.
        fs::write(setup.source.path().join("Images/other.png"), b"keep")
            .expect("Failed to write file");

        let report = run(&setup, &RestoreOptions { cleanup_empty: true });

        assert_eq!(report.restored, 2);
        assert_eq!(report.removed_dirs, 1);
        assert!(!setup.source.path().join("Documents").exists());
        assert!(setup.source.path().join("Images").is_dir());
    }

    #[test]
    fn test_missing_target_is_skipped() {
        let setup = Setup::new();
        let mut ledger = TransactionLog::new(setup.ledger_path());
        ledger.record(
            &setup.source.path().join("Documents/gone.txt"),
            &setup.source.path().join("gone.txt"),
        );
        ledger.save().expect("save failed");

        let report = run(&setup, &RestoreOptions { cleanup_empty: false });

        assert_eq!(report.restored, 0);
        assert_eq!(report.skipped, 1);
        assert!(!report.is_complete_success());
    }

    #[test]
    fn test_conflicting_file_is_backed_up() {
        let setup = Setup::new();
        let mut ledger = TransactionLog::new(setup.ledger_path());
        setup.plant_moved_file(&mut ledger, "Documents", "report.txt");
        ledger.save().expect("save failed");

        // Someone recreated the original in the meantime.
        fs::write(setup.source.path().join("report.txt"), b"newer content")
            .expect("Failed to write file");

        let report = run(&setup, &RestoreOptions { cleanup_empty: false });

        assert_eq!(report.restored, 1);
        let restored =
            fs::read_to_string(setup.source.path().join("report.txt")).expect("read failed");
        assert_eq!(restored, "content of report.txt");

        let backups = fs::read_dir(setup.source.path())
            .expect("read_dir failed")
            .flatten()
            .filter(|e| e.file_name().to_string_lossy().contains(".bak."))
            .count();
        assert_eq!(backups, 1);
    }

    #[test]
    fn test_failures_do_not_stop_remaining_entries() {
        let setup = Setup::new();
        let mut ledger = TransactionLog::new(setup.ledger_path());
        // First entry (sorted order) points at a missing target, the second
        // is fine; both must be processed.
        ledger.record(
            &setup.source.path().join("Aaa/gone.txt"),
            &setup.source.path().join("gone.txt"),
        );
        setup.plant_moved_file(&mut ledger, "Documents", "report.txt");
        ledger.save().expect("save failed");

        let report = run(&setup, &RestoreOptions { cleanup_empty: false });

        assert_eq!(report.skipped, 1);
        assert_eq!(report.restored, 1);
        assert!(setup.source.path().join("report.txt").exists());
    }
}
