//! Output directory layout.

use std::path::PathBuf;

/// Extension of every generated document.
pub const DOCUMENT_EXTENSION: &str = "qmd";

/// The publication listing an entry is filed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Article,
    Conference,
    Forthcoming,
    Other,
}

impl Category {
    /// Every category, in cleanup order.
    pub const ALL: [Category; 4] = [
        Category::Article,
        Category::Conference,
        Category::Other,
        Category::Forthcoming,
    ];

    /// Maps an entry type to its category. Unknown types land in `Other`.
    pub fn classify(entry_type: &str) -> Self {
        match entry_type.to_ascii_lowercase().as_str() {
            "article" => Category::Article,
            "inproceedings" => Category::Conference,
            "online" | "preprint" => Category::Forthcoming,
            _ => Category::Other,
        }
    }

    /// Directory, relative to the site root.
    pub fn dir(self) -> &'static str {
        match self {
            Category::Article => "publications/article",
            Category::Conference => "publications/conference",
            Category::Forthcoming => "publications/forthcoming",
            Category::Other => "publications/other",
        }
    }

    /// Path of the document for a sanitized identifier.
    pub fn document_path(self, id: &str) -> PathBuf {
        PathBuf::from(self.dir()).join(format!("{}.{}", id, DOCUMENT_EXTENSION))
    }
}
