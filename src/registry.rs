//! Category rules and the runtime registry that orders them.
//!
//! A category is a named bucket ("Documents", "Images", ...) defined by three
//! matching criteria: content keywords, file extensions, and MIME types.
//! The registry keeps rules in insertion order, and that order is the match
//! priority when more than one rule would accept a file.
//!
//! Rule edits are in-memory only and scoped to the current session; nothing
//! here is persisted between runs.

use std::collections::HashSet;

/// The matching criteria for one category.
///
/// Extensions are stored lowercase without a leading dot; keywords and MIME
/// types are stored lowercase. A rule with all three sets empty matches
/// nothing and is rejected by [`CategoryRegistry::add`].
#[derive(Debug, Clone)]
pub struct CategoryRule {
    /// Category name, unique within a registry.
    pub name: String,
    /// Content keywords matched against a file's significant terms.
    pub keywords: HashSet<String>,
    /// File extensions, normalized (lowercase, no leading dot).
    pub extensions: HashSet<String>,
    /// MIME types matched against the sniffed content type.
    pub mime_types: HashSet<String>,
}

impl CategoryRule {
    /// Builds a rule, normalizing every criterion.
    pub fn new(name: &str, keywords: &[&str], extensions: &[&str], mime_types: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            keywords: keywords.iter().map(|k| k.to_lowercase()).collect(),
            extensions: extensions
                .iter()
                .map(|e| e.trim_start_matches('.').to_lowercase())
                .collect(),
            mime_types: mime_types.iter().map(|m| m.to_lowercase()).collect(),
        }
    }

    /// True when the rule has no criteria at all.
    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty() && self.extensions.is_empty() && self.mime_types.is_empty()
    }
}

/// Errors from registry edits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// A rule with this name is already registered.
    DuplicateName(String),
    /// The rule has no keywords, extensions, or MIME types.
    EmptyRule(String),
    /// No rule with this name exists.
    NotFound(String),
}

impl std::fmt::Display for RegistryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateName(name) => {
                write!(f, "Category '{}' is already registered", name)
            }
            Self::EmptyRule(name) => {
                write!(
                    f,
                    "Category '{}' needs at least one keyword, extension, or MIME type",
                    name
                )
            }
            Self::NotFound(name) => write!(f, "No category named '{}'", name),
        }
    }
}

impl std::error::Error for RegistryError {}

/// Ordered collection of category rules.
///
/// Insertion order defines match priority: when two rules both accept a file
/// at the same classification stage, the rule registered first wins.
#[derive(Debug, Clone)]
pub struct CategoryRegistry {
    rules: Vec<CategoryRule>,
}

impl CategoryRegistry {
    /// A registry with no rules; every file classifies as the fallback.
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    /// Registers a rule at the end of the priority order.
    ///
    /// Takes effect immediately for subsequent classification calls.
    pub fn add(&mut self, rule: CategoryRule) -> Result<(), RegistryError> {
        if rule.is_empty() {
            return Err(RegistryError::EmptyRule(rule.name));
        }
        if self.rules.iter().any(|r| r.name == rule.name) {
            return Err(RegistryError::DuplicateName(rule.name));
        }
        self.rules.push(rule);
        Ok(())
    }

    /// Removes a rule by name.
    pub fn remove(&mut self, name: &str) -> Result<(), RegistryError> {
        let position = self
            .rules
            .iter()
            .position(|r| r.name == name)
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))?;
        self.rules.remove(position);
        Ok(())
    }

    /// Category names in priority order.
    pub fn names(&self) -> Vec<&str> {
        self.rules.iter().map(|r| r.name.as_str()).collect()
    }

    /// Rules in priority order.
    pub fn rules(&self) -> impl Iterator<Item = &CategoryRule> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl Default for CategoryRegistry {
    /// The stock rule table: Documents, Images, Media, and Code.
    fn default() -> Self {
        let mut registry = Self::empty();
        let defaults = [
            CategoryRule::new(
                "Documents",
                &["report", "invoice", "letter", "contract"],
                &["doc", "docx", "pdf", "txt"],
                &["application/pdf", "text/plain", "application/msword"],
            ),
            CategoryRule::new(
                "Images",
                &["photo", "image", "picture"],
                &["jpg", "png", "jpeg", "gif"],
                &["image/jpeg", "image/png", "image/gif"],
            ),
            CategoryRule::new(
                "Media",
                &["video", "audio", "movie"],
                &["mp4", "mp3", "wav"],
                &["video/mp4", "audio/mpeg", "audio/wav"],
            ),
            CategoryRule::new(
                "Code",
                &["script", "code", "program"],
                &["py", "js", "html", "cpp"],
                &["text/x-python", "application/javascript", "text/html", "text/x-c++"],
            ),
        ];
        for rule in defaults {
            // Stock rules are well-formed and uniquely named.
            let _ = registry.add(rule);
        }
        registry
    }
}
