//! The organize engine: classify and move a directory's files.
//!
//! Processes the immediate files of a source directory strictly sequentially:
//! optional duplicate check, classification, move into the category
//! subfolder, and a transaction-log entry per successful move. The log is
//! flushed once, after the loop. Per-file failures are recorded and the run
//! continues; only missing preconditions abort a run.

use crate::classify::Classifier;
use crate::config::CompiledFilters;
use crate::hash;
use crate::ledger::{LedgerError, TransactionLog};
use crate::registry::CategoryRegistry;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Receives one message per processed file and per terminal state change.
///
/// Engines treat the sink as fire-and-forget; everything works with a no-op.
/// Any `FnMut(&str)` closure is a sink.
pub trait EventSink {
    fn emit(&mut self, message: &str);
}

impl<F: FnMut(&str)> EventSink for F {
    fn emit(&mut self, message: &str) {
        self(message)
    }
}

/// Whole-run failures. Per-file trouble never surfaces here; it lands in the
/// report instead.
#[derive(Debug)]
pub enum EngineError {
    /// The source directory does not exist (or is not a directory).
    DirectoryNotFound(PathBuf),
    /// Transaction-log failure (missing, empty, corrupt, or unwritable).
    Ledger(LedgerError),
    /// Failed to enumerate the source directory.
    Io(std::io::Error),
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DirectoryNotFound(path) => {
                write!(f, "Directory {} does not exist", path.display())
            }
            Self::Ledger(source) => write!(f, "{}", source),
            Self::Io(source) => write!(f, "I/O error: {}", source),
        }
    }
}

impl std::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Ledger(source) => Some(source),
            Self::Io(source) => Some(source),
            _ => None,
        }
    }
}

impl From<LedgerError> for EngineError {
    fn from(source: LedgerError) -> Self {
        Self::Ledger(source)
    }
}

/// Options for one organize run.
#[derive(Debug, Default)]
pub struct OrganizeOptions {
    /// Skip files whose content hash was already seen earlier in this run.
    pub skip_duplicates: bool,
    /// Classify and report without moving anything or touching the log.
    pub dry_run: bool,
    /// Exclusion filters from configuration.
    pub filters: CompiledFilters,
}

/// What an organize run did, in processing order.
#[derive(Debug, Default)]
pub struct OrganizeReport {
    /// Files moved (or, in a dry run, files that would be moved).
    pub moved: usize,
    /// Files skipped as duplicates.
    pub skipped: usize,
    /// Files whose move failed.
    pub failed: usize,
    /// One line per processed file, for display.
    pub messages: Vec<String>,
    /// Files per category, for the summary.
    pub category_counts: HashMap<String, usize>,
}

/// Organizes a directory's files into category subfolders.
pub struct OrganizeEngine<'a> {
    registry: &'a CategoryRegistry,
    ledger_path: PathBuf,
}

impl<'a> OrganizeEngine<'a> {
    pub fn new(registry: &'a CategoryRegistry, ledger_path: PathBuf) -> Self {
        Self {
            registry,
            ledger_path,
        }
    }

    /// Runs one organize pass over the immediate files of `source_dir`.
    ///
    /// Subdirectories are never entered or moved. Files are processed in
    /// name order; every remaining file is attempted even after earlier
    /// failures. After the loop the transaction log is persisted in full,
    /// overwriting any previous persisted log: organizing a second time
    /// discards the ability to undo moves from earlier runs that are not in
    /// the new log. That trade-off is deliberate; callers who still need the
    /// old log must restore first.
    pub fn organize(
        &self,
        source_dir: &Path,
        options: &OrganizeOptions,
        sink: &mut dyn EventSink,
    ) -> Result<OrganizeReport, EngineError> {
        if !source_dir.is_dir() {
            return Err(EngineError::DirectoryNotFound(source_dir.to_path_buf()));
        }

        let mut files: Vec<PathBuf> = fs::read_dir(source_dir)
            .map_err(EngineError::Io)?
            .flatten()
            .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
            .map(|entry| entry.path())
            .filter(|path| options.filters.should_include(path))
            .collect();
        // read_dir order is filesystem-dependent; sort for stable reports.
        files.sort();

        sink.emit(&format!(
            "Scanning {} ({} files)...",
            source_dir.display(),
            files.len()
        ));
        log::info!(
            "Organizing {} ({} files, skip_duplicates={}, dry_run={})",
            source_dir.display(),
            files.len(),
            options.skip_duplicates,
            options.dry_run
        );

        let classifier = Classifier::new(self.registry);
        let mut ledger = TransactionLog::new(self.ledger_path.clone());
        let mut seen_hashes: HashMap<String, PathBuf> = HashMap::new();
        let mut report = OrganizeReport::default();

        for file_path in &files {
            let name = file_name_of(file_path);

            let file_hash = if options.skip_duplicates {
                match hash::hash_file(file_path) {
                    Ok(digest) => Some(digest),
                    Err(e) => {
                        // Unknown duplicate status; treat as unique.
                        log::warn!("Could not hash {}: {}", file_path.display(), e);
                        None
                    }
                }
            } else {
                None
            };

            if let Some(digest) = &file_hash
                && seen_hashes.contains_key(digest)
            {
                report.skipped += 1;
                note(&mut report, sink, format!("Skipping duplicate: {}", name));
                continue;
            }

            let category = classifier.categorize(file_path);

            if options.dry_run {
                report.moved += 1;
                *report.category_counts.entry(category.clone()).or_insert(0) += 1;
                if let Some(digest) = file_hash {
                    seen_hashes.insert(digest, file_path.clone());
                }
                note(
                    &mut report,
                    sink,
                    format!("Would move {} to {}/", name, category),
                );
                continue;
            }

            match move_into_category(source_dir, file_path, &category) {
                Ok(destination) => {
                    ledger.record(&destination, file_path);
                    if let Some(digest) = file_hash {
                        seen_hashes.insert(digest, destination);
                    }
                    report.moved += 1;
                    *report.category_counts.entry(category.clone()).or_insert(0) += 1;
                    note(&mut report, sink, format!("Moved {} to {}/", name, category));
                }
                Err(reason) => {
                    report.failed += 1;
                    log::error!("Error moving {}: {}", file_path.display(), reason);
                    note(
                        &mut report,
                        sink,
                        format!("Error moving {}: {}", name, reason),
                    );
                }
            }
        }

        if options.dry_run {
            sink.emit("Dry run complete. No files were modified.");
            return Ok(report);
        }

        match ledger.save() {
            Ok(()) => sink.emit("Organization complete. Restore log saved."),
            Err(e) => {
                // Moves already happened; losing the log only costs undo.
                log::error!("Could not save restore log: {}", e);
                note(
                    &mut report,
                    sink,
                    format!("Warning: could not save restore log: {}", e),
                );
            }
        }

        Ok(report)
    }
}

fn note(report: &mut OrganizeReport, sink: &mut dyn EventSink, message: String) {
    log::info!("{}", message);
    sink.emit(&message);
    report.messages.push(message);
}

/// Moves a file into `source_dir/<category>/`, creating the category folder
/// if needed. Returns the destination path on success, or a display-ready
/// reason on failure.
fn move_into_category(
    source_dir: &Path,
    file_path: &Path,
    category: &str,
) -> Result<PathBuf, String> {
    let category_path = source_dir.join(category);
    if !category_path.exists() {
        fs::create_dir(&category_path)
            .map_err(|e| format!("could not create {}: {}", category_path.display(), e))?;
    }

    let file_name = file_path
        .file_name()
        .ok_or_else(|| "file has no name component".to_string())?;
    let destination = category_path.join(file_name);

    if destination.exists() {
        return Err(format!("{} already exists", destination.display()));
    }

    fs::rename(file_path, &destination)
        .map_err(|e| format!("could not move to {}: {}", destination.display(), e))?;

    Ok(destination)
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
