//! Best-effort MIME sniffing.
//!
//! Two deliberately separate lookups: [`sniff`] inspects magic bytes only,
//! and [`guess_by_extension`] consults the extension table. They are not
//! folded into one because an extension-derived MIME guess must never speak
//! for a file's content: classification matches extensions directly, and an
//! extension guess outranking that stage would misroute any text format
//! whose guessed MIME belongs to a different category than its extension
//! (`.py` guesses `text/plain`, but the extension says source code).

use std::path::Path;

/// Returns the MIME type indicated by the file's content signature, or
/// `None` when the signature is unrecognized.
///
/// Never fails: read errors are treated the same as an unknown signature.
/// Formats with no magic number (plain text, source code, CSV, ...) always
/// come back `None` here.
pub fn sniff(path: &Path) -> Option<String> {
    if let Ok(Some(kind)) = infer::get_from_path(path) {
        return Some(kind.mime_type().to_string());
    }
    None
}

/// Returns the MIME type the extension table suggests, or `None` for an
/// unknown or missing extension.
///
/// This is a guess about the name, not the content; use it only where a
/// magicless format needs a nominal type (`.txt` as `text/plain` for the
/// content-analysis gate).
pub fn guess_by_extension(path: &Path) -> Option<String> {
    mime_guess::from_path(path).first_raw().map(str::to_string)
}
