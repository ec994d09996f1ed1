//! Expansion flags and the children cache, as a plain owned value.
//!
//! [`ExpansionState`] holds no I/O handles: every transition is a
//! synchronous method, so the cache policy can be tested without a
//! Directory Service. [`crate::tree::TreeController`] drives it.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::fs::entry::Entry;
use crate::tree::sort::{filter_hidden, filter_markdown, sort_entries};

/// Which entries [`ExpansionState::visible_rows`] lets through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ViewFilter {
    pub show_hidden: bool,
    pub markdown_only: bool,
}

impl ViewFilter {
    fn apply(&self, entries: &[Entry]) -> Vec<Entry> {
        let visible = filter_hidden(entries, self.show_hidden);
        if self.markdown_only {
            filter_markdown(&visible)
        } else {
            visible
        }
    }
}

/// One line of the flattened tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TreeRow {
    pub entry: Entry,
    /// Nesting level below the root; direct children of the root are `0`.
    pub depth: usize,
    /// `true` for an expanded directory.
    pub expanded: bool,
    /// `true` for an expanded directory whose children are not cached yet.
    pub loading: bool,
}

/// Expanded directory paths plus the last listing fetched for each directory.
///
/// An expanded path may have no cache entry yet (fetch pending or failed),
/// and a collapsed path keeps its cache entry until it is refreshed,
/// invalidated or forgotten.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExpansionState {
    expanded: BTreeSet<PathBuf>,
    children: BTreeMap<PathBuf, Vec<Entry>>,
}

impl ExpansionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if `path` is currently shown expanded.
    pub fn is_expanded(&self, path: &Path) -> bool {
        self.expanded.contains(path)
    }

    /// Returns the cached children of `path`, or an empty slice.
    pub fn children_of(&self, path: &Path) -> &[Entry] {
        self.children.get(path).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Returns `true` if a listing of `path` is cached.
    pub fn is_cached(&self, path: &Path) -> bool {
        self.children.contains_key(path)
    }

    /// Looks `path` up in its parent's cached listing.
    pub fn entry(&self, path: &Path) -> Option<&Entry> {
        let parent = path.parent()?;
        self.children
            .get(parent)?
            .iter()
            .find(|e| e.path() == path)
    }

    /// Returns `true` if `path` is known to be a file.
    pub fn is_known_file(&self, path: &Path) -> bool {
        self.entry(path).is_some_and(|e| !e.is_dir())
    }

    /// Marks `path` expanded. Returns `false` if it already was.
    pub fn mark_expanded(&mut self, path: &Path) -> bool {
        self.expanded.insert(path.to_path_buf())
    }

    /// Removes `path` from the expanded set, keeping its cache entry.
    /// Returns `false` if it was not expanded.
    pub fn collapse(&mut self, path: &Path) -> bool {
        self.expanded.remove(path)
    }

    /// Replaces the cached listing of `dir`.
    ///
    /// Child directories present in the previous listing but missing from
    /// the new one are forgotten together with their subtrees, so no stale
    /// expansion or cache survives an external delete or move.
    pub fn store_children(&mut self, dir: &Path, entries: Vec<Entry>) {
        let sorted = sort_entries(&entries);

        let vanished: Vec<PathBuf> = self
            .children_of(dir)
            .iter()
            .filter(|old| old.is_dir())
            .filter(|old| {
                !sorted
                    .iter()
                    .any(|new| new.is_dir() && new.path() == old.path())
            })
            .map(|old| old.path().to_path_buf())
            .collect();

        for path in vanished {
            tracing::debug!("pruning vanished directory {}", path.display());
            self.forget(&path);
        }

        self.children.insert(dir.to_path_buf(), sorted);
    }

    /// Drops the cached listing of `path` so the next expand refetches it.
    pub fn invalidate(&mut self, path: &Path) -> bool {
        self.children.remove(path).is_some()
    }

    /// Drops expansion and cache state for `path` and everything below it.
    pub fn forget(&mut self, path: &Path) {
        self.expanded.retain(|p| !p.starts_with(path));
        self.children.retain(|p, _| !p.starts_with(path));
    }

    /// Flattens the expanded tree below `root` in display order.
    pub fn visible_rows(&self, root: &Path, filter: ViewFilter) -> Vec<TreeRow> {
        let mut rows = Vec::new();
        self.collect_rows(root, 0, filter, &mut rows);
        rows
    }

    fn collect_rows(&self, dir: &Path, depth: usize, filter: ViewFilter, rows: &mut Vec<TreeRow>) {
        for entry in filter.apply(self.children_of(dir)) {
            let expanded = entry.is_dir() && self.is_expanded(entry.path());
            let loading = expanded && !self.is_cached(entry.path());
            let path = entry.path().to_path_buf();
            rows.push(TreeRow {
                entry,
                depth,
                expanded,
                loading,
            });
            if expanded {
                self.collect_rows(&path, depth + 1, filter, rows);
            }
        }
    }
}
