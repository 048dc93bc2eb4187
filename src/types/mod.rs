//! Records stored in the index and the languages they can be analyzed in.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Text languages with a dedicated analyzed field in the store.
///
/// English doubles as the general field: any tag without a dedicated
/// analyzer is classified as English.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    English,
    Polish,
}

impl Language {
    /// All languages that have their own field.
    pub const ALL: [Language; 2] = [Language::English, Language::Polish];

    /// Parse an ISO 639-1 tag. Returns `None` for unsupported tags.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "en" => Some(Language::English),
            "pl" => Some(Language::Polish),
            _ => None,
        }
    }

    /// Map a detector tag onto a field, falling back to the general field.
    pub fn classify(tag: &str) -> Self {
        Self::from_tag(tag).unwrap_or_default()
    }

    pub fn tag(&self) -> &'static str {
        match self {
            Language::English => "en",
            Language::Polish => "pl",
        }
    }

    /// Name of the analyzed text field holding content in this language.
    pub fn field_name(&self) -> &'static str {
        match self {
            Language::English => "english_text",
            Language::Polish => "polish_text",
        }
    }

    /// Name of the tokenizer registered for this language's field.
    pub fn tokenizer_name(&self) -> &'static str {
        match self {
            Language::English => "en_stem",
            Language::Polish => "pl_text",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// A registered root directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryRecord {
    /// Normalized absolute path; the record key.
    pub root_path: PathBuf,
    /// UTC seconds when the root was first registered.
    pub registered_at: u64,
}

impl DirectoryRecord {
    pub fn new(root_path: impl Into<PathBuf>, registered_at: u64) -> Self {
        Self {
            root_path: root_path.into(),
            registered_at,
        }
    }

    /// Whether `path` lies under this root (component-wise, inclusive).
    pub fn contains(&self, path: &Path) -> bool {
        path.starts_with(&self.root_path)
    }
}

/// An indexed file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRecord {
    /// Normalized absolute path; the record key.
    pub path: PathBuf,
    /// File name component of `path`.
    pub name: String,
    /// Detected language, which selects the text field.
    pub language: Language,
    /// Extracted plain text.
    pub content: String,
}

impl DocumentRecord {
    pub fn new(path: impl Into<PathBuf>, language: Language, content: impl Into<String>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            path,
            name,
            language,
            content: content.into(),
        }
    }

    pub fn text_field(&self) -> &'static str {
        self.language.field_name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_from_tag() {
        assert_eq!(Language::from_tag("pl"), Some(Language::Polish));
        assert_eq!(Language::from_tag(" EN "), Some(Language::English));
        assert_eq!(Language::from_tag("de"), None);
    }

    #[test]
    fn test_unsupported_tag_goes_to_general_field() {
        assert_eq!(Language::classify("fr"), Language::English);
        assert_eq!(Language::classify("pl"), Language::Polish);
        assert_eq!(Language::classify(""), Language::English);
    }

    #[test]
    fn test_document_record_name() {
        let doc = DocumentRecord::new("/docs/notes/a.txt", Language::English, "apple");
        assert_eq!(doc.name, "a.txt");
        assert_eq!(doc.text_field(), "english_text");
    }

    #[test]
    fn test_directory_contains_is_component_wise() {
        let root = DirectoryRecord::new("/docs", 0);
        assert!(root.contains(Path::new("/docs")));
        assert!(root.contains(Path::new("/docs/a.txt")));
        assert!(!root.contains(Path::new("/docs2/a.txt")));
    }
}
