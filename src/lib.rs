//! sortbox - sort a directory's files into category subfolders by signature,
//! and undo it.
//!
//! Files are classified by a layered policy (sniffed MIME type, then
//! extension, then content keywords, with a guaranteed fallback), moved into
//! category subfolders, and every move is recorded in a transaction log so
//! the whole operation can be replayed in reverse.

pub mod classify;
pub mod cli;
pub mod config;
pub mod extract;
pub mod hash;
pub mod ledger;
pub mod organize;
pub mod output;
pub mod registry;
pub mod restore;
pub mod sniff;

pub use classify::{Classifier, FALLBACK_CATEGORY, StageOutcome};
pub use config::{CompiledFilters, ConfigError, RunConfig};
pub use ledger::{LedgerError, TransactionLog};
pub use organize::{EngineError, EventSink, OrganizeEngine, OrganizeOptions, OrganizeReport};
pub use registry::{CategoryRegistry, CategoryRule, RegistryError};
pub use restore::{RestoreEngine, RestoreOptions, RestoreReport};

pub use cli::{Cli, run};
