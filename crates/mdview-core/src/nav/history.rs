//! Navigation history with back/forward support.

use std::path::{Path, PathBuf};

use serde::Serialize;

/// Immutable browser-style history over visited directories.
///
/// Every mutation returns a **new** `History`. The history is a list of
/// visited paths plus a cursor; visiting a path while the cursor is not at
/// the end drops the forward portion first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct History {
    stack: Vec<PathBuf>,
    cursor: usize,
}

impl History {
    /// Creates an empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the path at the cursor, or `None` before the first visit.
    pub fn current(&self) -> Option<&Path> {
        self.stack.get(self.cursor).map(PathBuf::as_path)
    }

    /// Records a visit to `path`.
    ///
    /// Visiting the current path again returns an unchanged history.
    pub fn visit(&self, path: PathBuf) -> Self {
        if self.current() == Some(path.as_path()) {
            return self.clone();
        }
        let mut stack: Vec<PathBuf> = if self.stack.is_empty() {
            Vec::new()
        } else {
            self.stack[..=self.cursor].to_vec()
        };
        stack.push(path);
        let cursor = stack.len() - 1;
        Self { stack, cursor }
    }

    /// Steps back. Returns the new history and the path to show, or `None`
    /// at the start of the history.
    pub fn back(&self) -> Option<(Self, PathBuf)> {
        if !self.can_go_back() {
            return None;
        }
        let cursor = self.cursor - 1;
        let path = self.stack[cursor].clone();
        let history = Self {
            stack: self.stack.clone(),
            cursor,
        };
        Some((history, path))
    }

    /// Steps forward. Returns the new history and the path to show, or
    /// `None` at the end of the history.
    pub fn forward(&self) -> Option<(Self, PathBuf)> {
        if !self.can_go_forward() {
            return None;
        }
        let cursor = self.cursor + 1;
        let path = self.stack[cursor].clone();
        let history = Self {
            stack: self.stack.clone(),
            cursor,
        };
        Some((history, path))
    }

    /// Returns `true` if there is an earlier entry.
    pub fn can_go_back(&self) -> bool {
        !self.stack.is_empty() && self.cursor > 0
    }

    /// Returns `true` if there is a later entry.
    pub fn can_go_forward(&self) -> bool {
        !self.stack.is_empty() && self.cursor < self.stack.len() - 1
    }

    /// Visited paths, oldest first.
    pub fn entries(&self) -> &[PathBuf] {
        &self.stack
    }

    /// Index of the current entry.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Rewrites every entry at or below `from` to live below `to`.
    ///
    /// Used after a directory is moved or renamed so back/forward keep
    /// pointing at the same directories.
    pub fn relocate(&self, from: &Path, to: &Path) -> Self {
        let stack = self
            .stack
            .iter()
            .map(|p| rebase(p, from, to).unwrap_or_else(|| p.clone()))
            .collect();
        Self {
            stack,
            cursor: self.cursor,
        }
    }
}

/// Returns `path` moved from below `from` to below `to`, or `None` if
/// `path` is not `from` or inside it.
pub fn rebase(path: &Path, from: &Path, to: &Path) -> Option<PathBuf> {
    let rest = path.strip_prefix(from).ok()?;
    if rest.as_os_str().is_empty() {
        Some(to.to_path_buf())
    } else {
        Some(to.join(rest))
    }
}
