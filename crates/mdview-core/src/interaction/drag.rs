//! Drag-and-drop tracking for the tree.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::fs::entry::Entry;
use crate::reconcile::{check_drop_target, MoveRequest};

/// An in-progress drag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DragOperation {
    pub source: Entry,
    /// The hovered directory, set only while it is a legal target.
    pub drop_target: Option<PathBuf>,
}

/// Holds at most one [`DragOperation`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DragState {
    operation: Option<DragOperation>,
}

impl DragState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts dragging `source`, replacing any stale drag.
    pub fn start(&mut self, source: Entry) {
        tracing::debug!("drag start {}", source.path().display());
        self.operation = Some(DragOperation {
            source,
            drop_target: None,
        });
    }

    /// Pointer is over `target`. Returns the resulting drop target.
    pub fn hover(&mut self, target: &Entry) -> Option<&Path> {
        self.hover_path(target.path(), target.is_dir())
    }

    /// Pointer is over the tree background, which stands for the root.
    pub fn hover_root(&mut self, root: &Path) -> Option<&Path> {
        self.hover_path(root, true)
    }

    fn hover_path(&mut self, target: &Path, is_dir: bool) -> Option<&Path> {
        let op = self.operation.as_mut()?;
        op.drop_target = match check_drop_target(op.source.path(), target, is_dir) {
            Ok(()) => Some(target.to_path_buf()),
            Err(_) => None,
        };
        op.drop_target.as_deref()
    }

    /// Pointer left `path`. Clears the drop target only if it was `path`.
    pub fn leave(&mut self, path: &Path) {
        if let Some(op) = self.operation.as_mut() {
            if op.drop_target.as_deref() == Some(path) {
                op.drop_target = None;
            }
        }
    }

    /// Ends the drag. Yields a move request if a legal target was hovered.
    pub fn drop(&mut self) -> Option<MoveRequest> {
        let op = self.operation.take()?;
        let target_dir = op.drop_target?;
        Some(MoveRequest {
            source: op.source.path().to_path_buf(),
            target_dir,
        })
    }

    pub fn cancel(&mut self) {
        self.operation = None;
    }

    pub fn is_active(&self) -> bool {
        self.operation.is_some()
    }

    pub fn operation(&self) -> Option<&DragOperation> {
        self.operation.as_ref()
    }

    pub fn drop_target(&self) -> Option<&Path> {
        self.operation.as_ref()?.drop_target.as_deref()
    }
}
