//! Command-line surface.
//!
//! Wires the organize and restore engines to clap, the configuration file,
//! and the terminal output layer. Session-scoped category-rule edits come in
//! as flags; they never persist past the invocation.

use crate::config::RunConfig;
use crate::ledger::TransactionLog;
use crate::organize::{OrganizeEngine, OrganizeOptions};
use crate::output::OutputFormatter;
use crate::registry::{CategoryRegistry, CategoryRule};
use crate::restore::{RestoreEngine, RestoreOptions};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

/// Sort a directory's files into category subfolders, and put them back.
#[derive(Debug, Parser)]
#[command(name = "sortbox", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Path to a configuration file.
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Organize the immediate files of a directory into category subfolders.
    Organize {
        /// The directory to organize.
        dir: PathBuf,

        /// Skip files whose content matches an earlier file in this run.
        #[arg(long)]
        skip_duplicates: bool,

        /// Show what would happen without moving anything.
        #[arg(long)]
        dry_run: bool,

        /// Add a category rule for this session.
        /// Format: name:ext1,ext2[:mime1,mime2[:keyword1,keyword2]]
        #[arg(long = "add-category", value_name = "SPEC")]
        add_categories: Vec<String>,

        /// Remove a stock category rule for this session.
        #[arg(long = "remove-category", value_name = "NAME")]
        remove_categories: Vec<String>,
    },
    /// Move every logged file back to where it came from.
    Restore {
        /// Keep category folders even when the restore leaves them empty.
        #[arg(long)]
        no_cleanup: bool,
    },
}

/// Entry point below `main`: load configuration and dispatch.
pub fn run(cli: Cli) -> Result<(), String> {
    let config = RunConfig::load(cli.config.as_deref())
        .map_err(|e| format!("Error loading configuration: {}", e))?;

    match cli.command {
        Command::Organize {
            dir,
            skip_duplicates,
            dry_run,
            add_categories,
            remove_categories,
        } => run_organize(
            &config,
            &dir,
            skip_duplicates,
            dry_run,
            &add_categories,
            &remove_categories,
        ),
        Command::Restore { no_cleanup } => run_restore(&config, !no_cleanup),
    }
}

fn run_organize(
    config: &RunConfig,
    dir: &Path,
    skip_duplicates: bool,
    dry_run: bool,
    add_categories: &[String],
    remove_categories: &[String],
) -> Result<(), String> {
    let mut registry = CategoryRegistry::default();
    for name in remove_categories {
        registry.remove(name).map_err(|e| format!("Error: {}", e))?;
    }
    for spec in add_categories {
        let rule = parse_rule_spec(spec)?;
        registry.add(rule).map_err(|e| format!("Error: {}", e))?;
    }

    let filters = config
        .compile_filters()
        .map_err(|e| format!("Error compiling filters: {}", e))?;
    let options = OrganizeOptions {
        skip_duplicates,
        dry_run,
        filters,
    };

    if dry_run {
        OutputFormatter::info(&format!("DRY RUN: analyzing contents of {}", dir.display()));
    } else {
        OutputFormatter::info(&format!("Organizing contents of: {}", dir.display()));
    }

    let engine = OrganizeEngine::new(&registry, config.options.restore_log.clone());
    let spinner = OutputFormatter::create_spinner("Organizing...");
    let mut sink = |message: &str| spinner.println(message);
    let result = engine.organize(dir, &options, &mut sink);
    // Stop the spinner before any error surfaces.
    spinner.finish_and_clear();
    let report = result.map_err(|e| format!("Error: {}", e))?;

    OutputFormatter::summary_table(&report.category_counts, report.moved);
    if report.skipped > 0 {
        OutputFormatter::plain(&format!("Skipped duplicates: {}", report.skipped));
    }

    if dry_run {
        OutputFormatter::success("Dry run complete. No files were modified.");
    } else if report.failed > 0 {
        OutputFormatter::warning(&format!(
            "{} file(s) could not be organized. Review the messages above.",
            report.failed
        ));
    } else {
        OutputFormatter::success(
            "Organization complete. Run 'sortbox restore' to undo. \
             Note: the next organize run overwrites the restore log.",
        );
    }

    Ok(())
}

fn run_restore(config: &RunConfig, cleanup_empty: bool) -> Result<(), String> {
    OutputFormatter::info("Restoring previous organization...");

    let engine = RestoreEngine::new(config.options.restore_log.clone());
    let spinner = OutputFormatter::create_spinner("Restoring...");
    let mut sink = |message: &str| spinner.println(message);
    let result = engine.restore(&RestoreOptions { cleanup_empty }, &mut sink);
    spinner.finish_and_clear();
    let report = result.map_err(|e| format!("Error: {}", e))?;

    OutputFormatter::plain(&format!("  Restored: {}", report.restored));
    if report.skipped > 0 {
        OutputFormatter::plain(&format!("  Skipped:  {}", report.skipped));
    }
    if report.failed > 0 {
        OutputFormatter::plain(&format!("  Failed:   {}", report.failed));
    }
    if report.removed_dirs > 0 {
        OutputFormatter::plain(&format!("  Removed empty folders: {}", report.removed_dirs));
    }

    if report.is_complete_success() {
        // The log is spent; make that durable.
        if let Err(e) = TransactionLog::delete(&config.options.restore_log) {
            OutputFormatter::warning(&format!("Could not remove the restore log: {}", e));
        }
        OutputFormatter::success("Restore complete.");
    } else {
        OutputFormatter::warning(
            "Some entries were not restored; the restore log was kept for manual recovery.",
        );
    }

    Ok(())
}

/// Parses `name:ext1,ext2[:mime1,mime2[:keyword1,keyword2]]` into a rule.
///
/// Any criterion list may be empty as long as one is not; the registry
/// rejects fully empty rules.
fn parse_rule_spec(spec: &str) -> Result<CategoryRule, String> {
    let mut parts = spec.splitn(4, ':');
    let name = parts
        .next()
        .filter(|n| !n.is_empty())
        .ok_or_else(|| format!("Invalid category spec '{}': missing name", spec))?;

    fn split_list(segment: Option<&str>) -> Vec<&str> {
        segment
            .unwrap_or("")
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect()
    }

    let extensions = split_list(parts.next());
    let mime_types = split_list(parts.next());
    let keywords = split_list(parts.next());

    let rule = CategoryRule::new(name, &keywords, &extensions, &mime_types);
    if rule.is_empty() {
        return Err(format!(
            "Invalid category spec '{}': needs at least one extension, MIME type, or keyword",
            spec
        ));
    }
    Ok(rule)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rule_spec_full() {
        let rule = parse_rule_spec("Archives:zip,tar:application/zip:backup").expect("parse");
        assert_eq!(rule.name, "Archives");
        assert!(rule.extensions.contains("zip"));
        assert!(rule.extensions.contains("tar"));
        assert!(rule.mime_types.contains("application/zip"));
        assert!(rule.keywords.contains("backup"));
    }

    #[test]
    fn test_parse_rule_spec_extensions_only() {
        let rule = parse_rule_spec("Fonts:ttf,otf").expect("parse");
        assert_eq!(rule.name, "Fonts");
        assert!(rule.mime_types.is_empty());
        assert!(rule.keywords.is_empty());
    }

    #[test]
    fn test_parse_rule_spec_keywords_only() {
        let rule = parse_rule_spec("Finance:::invoice,receipt").expect("parse");
        assert!(rule.extensions.is_empty());
        assert!(rule.keywords.contains("invoice"));
        assert!(rule.keywords.contains("receipt"));
    }

    #[test]
    fn test_parse_rule_spec_rejects_empty() {
        assert!(parse_rule_spec("Nothing").is_err());
        assert!(parse_rule_spec("Nothing::").is_err());
        assert!(parse_rule_spec(":zip").is_err());
    }

    #[test]
    fn test_cli_parses_organize_flags() {
        let cli = Cli::try_parse_from([
            "sortbox",
            "organize",
            "/tmp/downloads",
            "--skip-duplicates",
            "--add-category",
            "Fonts:ttf,otf",
        ])
        .expect("parse failed");

        match cli.command {
            Command::Organize {
                dir,
                skip_duplicates,
                dry_run,
                add_categories,
                ..
            } => {
                assert_eq!(dir, PathBuf::from("/tmp/downloads"));
                assert!(skip_duplicates);
                assert!(!dry_run);
                assert_eq!(add_categories, vec!["Fonts:ttf,otf".to_string()]);
            }
            _ => panic!("expected organize command"),
        }
    }

    #[test]
    fn test_cli_parses_restore() {
        let cli = Cli::try_parse_from(["sortbox", "restore", "--no-cleanup"]).expect("parse");
        match cli.command {
            Command::Restore { no_cleanup } => assert!(no_cleanup),
            _ => panic!("expected restore command"),
        }
    }
}
