//! Move, rename, create and delete with cache reconciliation.
//!
//! Every request is checked against the legality rules before the
//! Directory Service is touched; a rejected request changes nothing. After
//! a successful service call the affected directories are refreshed (if
//! shown) or their stale cache entries dropped.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::{CoreResult, MoveRejection};
use crate::fs::service::{validate_name, DirectoryService};
use crate::tree::controller::TreeController;
use crate::tree::state::ExpansionState;

/// A relocation produced by a drag-and-drop release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MoveRequest {
    pub source: PathBuf,
    pub target_dir: PathBuf,
}

/// What a reconciled operation did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reconciled {
    /// The created, deleted or new path.
    pub path: PathBuf,
    /// The old path of a moved or renamed entry.
    pub previous: Option<PathBuf>,
    /// Directories whose listing was fetched again.
    pub refreshed: Vec<PathBuf>,
}

/// Checks whether `target` may receive `source` in a drag.
///
/// Applies the target rules only: the target is a directory, is not the
/// source, and does not lie inside the source. Descendancy is decided per
/// path component, so `/a/bc` is not inside `/a/b`.
pub fn check_drop_target(
    source: &Path,
    target: &Path,
    target_is_dir: bool,
) -> Result<(), MoveRejection> {
    if !target_is_dir {
        return Err(MoveRejection::TargetNotDirectory(target.to_path_buf()));
    }
    if source == target {
        return Err(MoveRejection::SameAsSource(source.to_path_buf()));
    }
    if target.starts_with(source) {
        return Err(MoveRejection::IntoDescendant {
            source_path: source.to_path_buf(),
            target: target.to_path_buf(),
        });
    }
    Ok(())
}

/// Full legality check of moving `source` into `target_dir`.
///
/// Returns the destination path on success.
pub fn validate_move(
    state: &ExpansionState,
    root: &Path,
    source: &Path,
    target_dir: &Path,
) -> Result<PathBuf, MoveRejection> {
    if source == root {
        return Err(MoveRejection::Root(source.to_path_buf()));
    }
    let target_is_dir = target_dir == root || !state.is_known_file(target_dir);
    check_drop_target(source, target_dir, target_is_dir)?;

    if source.parent() == Some(target_dir) {
        return Err(MoveRejection::AlreadyInPlace(source.to_path_buf()));
    }
    let name = source
        .file_name()
        .ok_or_else(|| MoveRejection::Root(source.to_path_buf()))?;
    let destination = target_dir.join(name);
    if state.entry(&destination).is_some() {
        return Err(MoveRejection::Collision(destination));
    }
    Ok(destination)
}

/// Legality check of renaming `source` to `new_name` in place.
///
/// # Errors
///
/// [`crate::CoreError::InvalidName`] for a bad name, otherwise
/// [`crate::CoreError::InvalidOperation`].
pub fn validate_rename(
    state: &ExpansionState,
    root: &Path,
    source: &Path,
    new_name: &str,
) -> CoreResult<PathBuf> {
    validate_name(new_name)?;
    if source == root {
        return Err(MoveRejection::Root(source.to_path_buf()).into());
    }
    let parent = source
        .parent()
        .ok_or_else(|| MoveRejection::Root(source.to_path_buf()))?;
    let destination = parent.join(new_name);
    if destination == source {
        return Err(MoveRejection::SameAsSource(source.to_path_buf()).into());
    }
    if state.entry(&destination).is_some() {
        return Err(MoveRejection::Collision(destination).into());
    }
    Ok(destination)
}

/// Legality check of creating `name` inside `parent`.
pub fn validate_create(state: &ExpansionState, parent: &Path, name: &str) -> CoreResult<PathBuf> {
    validate_name(name)?;
    if state.is_known_file(parent) {
        return Err(MoveRejection::TargetNotDirectory(parent.to_path_buf()).into());
    }
    let destination = parent.join(name);
    if state.entry(&destination).is_some() {
        return Err(MoveRejection::Collision(destination).into());
    }
    Ok(destination)
}

/// Executes file operations for one session root and keeps the tree in sync.
pub struct Reconciler<'a, S> {
    tree: &'a TreeController<S>,
    root: &'a Path,
}

impl<'a, S: DirectoryService> Reconciler<'a, S> {
    pub fn new(tree: &'a TreeController<S>, root: &'a Path) -> Self {
        Self { tree, root }
    }

    /// Moves `source` into `target_dir`.
    ///
    /// # Errors
    ///
    /// [`crate::CoreError::InvalidOperation`] if a legality rule fails (no service
    /// call is made), or the service error, in which case the cache is
    /// untouched.
    pub async fn move_entry(&self, source: &Path, target_dir: &Path) -> CoreResult<Reconciled> {
        let destination = self
            .tree
            .with_state(|state| validate_move(state, self.root, source, target_dir))?;

        tracing::debug!("moving {} -> {}", source.display(), destination.display());
        self.tree.service().rename(source, &destination).await?;

        self.tree.forget(source);
        let mut dirs = Vec::new();
        if let Some(parent) = source.parent() {
            dirs.push(parent.to_path_buf());
        }
        dirs.push(target_dir.to_path_buf());
        let refreshed = self.sync_dirs(&dirs).await;

        Ok(Reconciled {
            path: destination,
            previous: Some(source.to_path_buf()),
            refreshed,
        })
    }

    /// Renames `source` within its parent directory.
    ///
    /// # Errors
    ///
    /// Same as [`Reconciler::move_entry`], plus [`crate::CoreError::InvalidName`].
    pub async fn rename(&self, source: &Path, new_name: &str) -> CoreResult<Reconciled> {
        let destination = self
            .tree
            .with_state(|state| validate_rename(state, self.root, source, new_name))?;

        tracing::debug!("renaming {} -> {}", source.display(), destination.display());
        self.tree.service().rename(source, &destination).await?;

        self.tree.forget(source);
        let dirs: Vec<PathBuf> = source.parent().map(Path::to_path_buf).into_iter().collect();
        let refreshed = self.sync_dirs(&dirs).await;

        Ok(Reconciled {
            path: destination,
            previous: Some(source.to_path_buf()),
            refreshed,
        })
    }

    /// Creates an empty file `name` inside `parent`.
    pub async fn create_file(&self, parent: &Path, name: &str) -> CoreResult<Reconciled> {
        let path = self
            .tree
            .with_state(|state| validate_create(state, parent, name))?;
        self.tree.service().create_file(&path).await?;
        self.created(parent, path).await
    }

    /// Creates a directory `name` inside `parent`.
    pub async fn create_directory(&self, parent: &Path, name: &str) -> CoreResult<Reconciled> {
        let path = self
            .tree
            .with_state(|state| validate_create(state, parent, name))?;
        self.tree.service().create_directory(&path).await?;
        self.created(parent, path).await
    }

    /// Deletes `path` (recursively for directories).
    pub async fn delete(&self, path: &Path) -> CoreResult<Reconciled> {
        if path == self.root {
            return Err(MoveRejection::Root(path.to_path_buf()).into());
        }
        tracing::debug!("deleting {}", path.display());
        self.tree.service().delete(path).await?;

        self.tree.forget(path);
        let dirs: Vec<PathBuf> = path.parent().map(Path::to_path_buf).into_iter().collect();
        let refreshed = self.sync_dirs(&dirs).await;

        Ok(Reconciled {
            path: path.to_path_buf(),
            previous: None,
            refreshed,
        })
    }

    async fn created(&self, parent: &Path, path: PathBuf) -> CoreResult<Reconciled> {
        tracing::debug!("created {}", path.display());
        let refreshed = self.sync_dirs(&[parent.to_path_buf()]).await;
        Ok(Reconciled {
            path,
            previous: None,
            refreshed,
        })
    }

    /// Refreshes shown directories and invalidates hidden ones.
    ///
    /// The operation itself already succeeded, so a failed refresh is only
    /// logged.
    async fn sync_dirs(&self, dirs: &[PathBuf]) -> Vec<PathBuf> {
        let mut refreshed = Vec::new();
        for dir in dirs {
            if refreshed.contains(dir) {
                continue;
            }
            let result = if dir == self.root {
                self.tree.refresh(dir).await.map(|()| true)
            } else {
                self.tree.refresh_or_invalidate(dir).await
            };
            match result {
                Ok(true) => refreshed.push(dir.clone()),
                Ok(false) => {}
                Err(err) => {
                    tracing::warn!("could not refresh {} after change: {err}", dir.display())
                }
            }
        }
        refreshed
    }
}
