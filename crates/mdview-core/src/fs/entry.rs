//! File entry representation.

use std::path::{Path, PathBuf};

use serde::Serialize;
use unicode_normalization::UnicodeNormalization;

/// File extensions (lowercase, without the dot) treated as markdown.
pub const MARKDOWN_EXTENSIONS: [&str; 3] = ["md", "markdown", "mdown"];

/// A single file or directory node as known to the tree.
///
/// `Entry` is immutable: a re-listing of the parent directory replaces
/// every entry wholesale instead of patching existing ones. View state such
/// as expansion lives in [`crate::tree::ExpansionState`], never here.
///
/// # Examples
///
/// ```
/// use mdview_core::Entry;
///
/// let entry = Entry::new("/notes/Todo.MD".into(), false);
/// assert_eq!(entry.name(), "Todo.MD");
/// assert!(entry.is_markdown());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Entry {
    name: String,
    path: PathBuf,
    is_dir: bool,
    is_markdown: bool,
}

impl Entry {
    /// Creates an entry for `path`.
    ///
    /// The display name is the NFC-normalised last path component; the
    /// markdown flag is derived from it and is always `false` for directories.
    pub fn new(path: PathBuf, is_dir: bool) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().nfc().collect::<String>())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());
        let is_markdown = !is_dir && is_markdown_name(&name);

        Self {
            name,
            path,
            is_dir,
            is_markdown,
        }
    }

    /// Creates an entry from file-system metadata.
    pub fn from_metadata(path: PathBuf, metadata: &std::fs::Metadata) -> Self {
        Self::new(path, metadata.is_dir())
    }

    /// Returns the display name (last path segment).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the absolute path, the entry's identity within one root.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns `true` if this entry is a directory.
    pub fn is_dir(&self) -> bool {
        self.is_dir
    }

    /// Returns `true` for files with a markdown extension.
    pub fn is_markdown(&self) -> bool {
        self.is_markdown
    }

    /// Returns `true` if the name starts with `.`.
    pub fn is_hidden(&self) -> bool {
        self.name.starts_with('.')
    }
}

/// Returns `true` if `name` ends with a markdown extension (case-insensitive).
pub fn is_markdown_name(name: &str) -> bool {
    Path::new(name)
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .is_some_and(|ext| MARKDOWN_EXTENSIONS.contains(&ext.as_str()))
}
