//! The Directory Service contract consumed by the explorer core.

use std::path::Path;

use async_trait::async_trait;

use crate::error::{CoreError, CoreResult};
use crate::fs::entry::Entry;

/// File-system primitives the explorer is built on.
///
/// Implementations decide where the files live ([`crate::fs::LocalFs`] for
/// the local disk). Every method may suspend; callers never hold explorer
/// locks across a call.
#[async_trait]
pub trait DirectoryService: Send + Sync {
    /// Lists the immediate entries of `path`, sorted for display.
    async fn list(&self, path: &Path) -> CoreResult<Vec<Entry>>;

    /// Creates an empty file. Fails with [`CoreError::AlreadyExists`] if `path` is taken.
    async fn create_file(&self, path: &Path) -> CoreResult<()>;

    /// Creates a directory. Fails with [`CoreError::AlreadyExists`] if `path` is taken.
    async fn create_directory(&self, path: &Path) -> CoreResult<()>;

    /// Deletes a file, or a directory together with its contents.
    async fn delete(&self, path: &Path) -> CoreResult<()>;

    /// Moves or renames `from` to `to`. Never overwrites an existing `to`.
    async fn rename(&self, from: &Path, to: &Path) -> CoreResult<()>;

    /// Reads a file as UTF-8 text.
    async fn read_text(&self, path: &Path) -> CoreResult<String>;

    /// Replaces a file's contents, creating it (and missing parents) if needed.
    async fn write_text(&self, path: &Path, content: &str) -> CoreResult<()>;
}

/// Validates a single path component supplied by the user.
///
/// Rejects empty names, `.`/`..`, and names containing separators or NUL.
///
/// # Errors
///
/// Returns [`CoreError::InvalidName`] describing the offending name.
pub fn validate_name(name: &str) -> CoreResult<()> {
    if is_valid_filename(name) {
        Ok(())
    } else {
        Err(CoreError::InvalidName(name.to_string()))
    }
}

fn is_valid_filename(name: &str) -> bool {
    if name.trim().is_empty() || name == "." || name == ".." {
        return false;
    }
    if name.contains('/') || name.contains('\0') {
        return false;
    }
    #[cfg(windows)]
    if name.contains('\\') || name.contains(':') {
        return false;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_names() {
        assert!(validate_name("notes.md").is_ok());
        assert!(validate_name(".hidden").is_ok());
        assert!(validate_name("with space.md").is_ok());
        assert!(validate_name("한글.md").is_ok());
    }

    #[test]
    fn rejects_empty_and_dots() {
        assert!(matches!(validate_name(""), Err(CoreError::InvalidName(_))));
        assert!(matches!(validate_name("   "), Err(CoreError::InvalidName(_))));
        assert!(matches!(validate_name("."), Err(CoreError::InvalidName(_))));
        assert!(matches!(validate_name(".."), Err(CoreError::InvalidName(_))));
    }

    #[test]
    fn rejects_separators() {
        assert!(matches!(
            validate_name("a/b.md"),
            Err(CoreError::InvalidName(n)) if n == "a/b.md"
        ));
        assert!(validate_name("nul\0byte").is_err());
    }
}
