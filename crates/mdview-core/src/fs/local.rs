//! [`DirectoryService`] backed by the local file system.

use std::path::Path;

use async_trait::async_trait;

use crate::error::{CoreError, CoreResult};
use crate::fs::entry::Entry;
use crate::fs::service::DirectoryService;
use crate::tree::sort::sort_entries;

/// Local-disk implementation of the Directory Service on `tokio::fs`.
///
/// Listings include hidden entries; view filters are applied later by the
/// tree. Symlinked directories are listed as directories.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFs;

impl LocalFs {
    pub fn new() -> Self {
        Self
    }
}

async fn path_exists(path: &Path) -> bool {
    tokio::fs::symlink_metadata(path).await.is_ok()
}

async fn ensure_parent(path: &Path) -> CoreResult<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| CoreError::from_io(parent, e))?;
    }
    Ok(())
}

#[async_trait]
impl DirectoryService for LocalFs {
    async fn list(&self, path: &Path) -> CoreResult<Vec<Entry>> {
        let metadata = tokio::fs::metadata(path)
            .await
            .map_err(|e| CoreError::from_io(path, e))?;
        if !metadata.is_dir() {
            return Err(CoreError::NotADirectory(path.to_path_buf()));
        }

        let mut read_dir = tokio::fs::read_dir(path)
            .await
            .map_err(|e| CoreError::from_io(path, e))?;

        let mut entries = Vec::new();
        while let Some(dir_entry) = read_dir
            .next_entry()
            .await
            .map_err(|e| CoreError::from_io(path, e))?
        {
            let entry_path = dir_entry.path();
            // Follow symlinks; a dangling link still shows up as a file.
            let entry = match tokio::fs::metadata(&entry_path).await {
                Ok(metadata) => Entry::from_metadata(entry_path, &metadata),
                Err(_) => match dir_entry.file_type().await {
                    Ok(ft) => Entry::new(entry_path, ft.is_dir()),
                    Err(e) => {
                        tracing::debug!("skipping {}: {e}", entry_path.display());
                        continue;
                    }
                },
            };
            entries.push(entry);
        }

        Ok(sort_entries(&entries))
    }

    async fn create_file(&self, path: &Path) -> CoreResult<()> {
        if path_exists(path).await {
            return Err(CoreError::AlreadyExists(path.to_path_buf()));
        }
        ensure_parent(path).await?;
        tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .await
            .map_err(|e| CoreError::from_io(path, e))?;
        Ok(())
    }

    async fn create_directory(&self, path: &Path) -> CoreResult<()> {
        if path_exists(path).await {
            return Err(CoreError::AlreadyExists(path.to_path_buf()));
        }
        tokio::fs::create_dir_all(path)
            .await
            .map_err(|e| CoreError::from_io(path, e))
    }

    async fn delete(&self, path: &Path) -> CoreResult<()> {
        // symlink_metadata: a link to a directory is removed, not its target.
        let meta = tokio::fs::symlink_metadata(path)
            .await
            .map_err(|e| CoreError::from_io(path, e))?;

        let removed = if meta.is_dir() {
            tokio::fs::remove_dir_all(path).await
        } else {
            tokio::fs::remove_file(path).await
        };
        removed.map_err(|e| CoreError::from_io(path, e))
    }

    async fn rename(&self, from: &Path, to: &Path) -> CoreResult<()> {
        if !path_exists(from).await {
            return Err(CoreError::NotFound(from.to_path_buf()));
        }
        if path_exists(to).await {
            return Err(CoreError::AlreadyExists(to.to_path_buf()));
        }
        tokio::fs::rename(from, to)
            .await
            .map_err(|e| CoreError::from_io(from, e))
    }

    async fn read_text(&self, path: &Path) -> CoreResult<String> {
        tokio::fs::read_to_string(path)
            .await
            .map_err(|e| CoreError::from_io(path, e))
    }

    async fn write_text(&self, path: &Path, content: &str) -> CoreResult<()> {
        ensure_parent(path).await?;
        tokio::fs::write(path, content)
            .await
            .map_err(|e| CoreError::from_io(path, e))
    }
}
