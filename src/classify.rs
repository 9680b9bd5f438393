//! Layered file classification.
//!
//! A file's category is decided by up to three stages, first match wins:
//! sniffed MIME type, then extension, then content keywords. Within a stage,
//! registry insertion order breaks ties. The final stage is an unconditional
//! fallback to [`FALLBACK_CATEGORY`], so classification is total: it never
//! fails and always returns a category name.
//!
//! The MIME stage only ever sees what the content signature says. A MIME
//! type guessed from the extension carries no more information than the
//! extension itself, so it must not outrank the extension stage; it is used
//! solely to gate the content stage for magicless text formats.

use crate::extract;
use crate::registry::CategoryRegistry;
use crate::sniff;
use std::path::Path;

/// The category assigned when no rule matches.
pub const FALLBACK_CATEGORY: &str = "Uncategorized";

/// MIME types worth reading for content analysis. Everything else skips the
/// content stage outright.
const TEXT_BEARING_MIME_TYPES: &[&str] = &["application/pdf", "text/plain"];

/// Content analysis never scans past this many characters.
const CONTENT_SCAN_CHAR_CAP: usize = 2000;

/// The verdict of one classification stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageOutcome {
    /// The stage picked a category.
    Matched(String),
    /// The stage has nothing to say; try the next one.
    NoMatch,
}

/// Assigns categories to files against a borrowed registry.
///
/// Holds no other state, so repeated calls with an unchanged registry are
/// deterministic and side-effect free.
pub struct Classifier<'a> {
    registry: &'a CategoryRegistry,
}

impl<'a> Classifier<'a> {
    pub fn new(registry: &'a CategoryRegistry) -> Self {
        Self { registry }
    }

    /// Returns the category name for a file.
    ///
    /// Sniffing, reading, and extraction errors are absorbed by the stage
    /// that hit them and treated as "no match"; the worst case is the
    /// fallback category, never an error.
    pub fn categorize(&self, path: &Path) -> String {
        let sniffed = sniff::sniff(path);
        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase());

        if let StageOutcome::Matched(category) = self.mime_stage(sniffed.as_deref()) {
            return category;
        }
        if let StageOutcome::Matched(category) = self.extension_stage(extension.as_deref()) {
            return category;
        }
        // Magicless text formats need a nominal type for the content gate;
        // the extension guess is consulted only now, after both real stages.
        let nominal_mime = sniffed.or_else(|| sniff::guess_by_extension(path));
        if let StageOutcome::Matched(category) =
            self.content_stage(path, nominal_mime.as_deref(), extension.as_deref())
        {
            return category;
        }

        FALLBACK_CATEGORY.to_string()
    }

    /// Stage 1: exact sniffed-MIME match against each rule's MIME set.
    fn mime_stage(&self, mime_type: Option<&str>) -> StageOutcome {
        let Some(mime) = mime_type else {
            return StageOutcome::NoMatch;
        };
        let mime = mime.to_lowercase();
        for rule in self.registry.rules() {
            if rule.mime_types.contains(&mime) {
                return StageOutcome::Matched(rule.name.clone());
            }
        }
        StageOutcome::NoMatch
    }

    /// Stage 2: lowercase dot-less extension match.
    fn extension_stage(&self, extension: Option<&str>) -> StageOutcome {
        let Some(ext) = extension else {
            return StageOutcome::NoMatch;
        };
        for rule in self.registry.rules() {
            if rule.extensions.contains(ext) {
                return StageOutcome::Matched(rule.name.clone());
            }
        }
        StageOutcome::NoMatch
    }

    /// Stage 3: keyword intersection with the file's significant terms.
    ///
    /// Only runs for text-bearing MIME types. PDFs go through the document
    /// extractor; anything else is decoded lossily as plain text.
    fn content_stage(
        &self,
        path: &Path,
        mime_type: Option<&str>,
        extension: Option<&str>,
    ) -> StageOutcome {
        let Some(mime) = mime_type else {
            return StageOutcome::NoMatch;
        };
        let mime = mime.to_lowercase();
        if !TEXT_BEARING_MIME_TYPES.contains(&mime.as_str()) {
            return StageOutcome::NoMatch;
        }

        let text = if extension == Some("pdf") {
            extract::document_text(path)
        } else {
            extract::plain_text(path)
        };
        if text.is_empty() {
            return StageOutcome::NoMatch;
        }

        let terms = extract::significant_terms(&text, CONTENT_SCAN_CHAR_CAP);
        for rule in self.registry.rules() {
            if rule.keywords.iter().any(|keyword| terms.contains(keyword)) {
                return StageOutcome::Matched(rule.name.clone());
            }
        }
        StageOutcome::NoMatch
    }
}
