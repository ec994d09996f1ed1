//! Ordering and view filters for entry lists.

use std::cmp::Ordering;

use crate::fs::entry::Entry;

/// Sorts entries for display: directories first, then case-insensitive by name.
///
/// Returns a **new** sorted `Vec<Entry>`; the input slice is never mutated.
/// Names that compare equal ignoring case fall back to a byte-wise
/// comparison so the order is total and stable across re-listings.
pub fn sort_entries(entries: &[Entry]) -> Vec<Entry> {
    let mut sorted = entries.to_vec();
    sorted.sort_by(compare_entries);
    sorted
}

/// The comparison behind [`sort_entries`].
pub fn compare_entries(a: &Entry, b: &Entry) -> Ordering {
    b.is_dir()
        .cmp(&a.is_dir())
        .then_with(|| a.name().to_lowercase().cmp(&b.name().to_lowercase()))
        .then_with(|| a.name().cmp(b.name()))
}

/// Filters out hidden entries when `show_hidden` is `false`.
pub fn filter_hidden(entries: &[Entry], show_hidden: bool) -> Vec<Entry> {
    if show_hidden {
        return entries.to_vec();
    }
    entries.iter().filter(|e| !e.is_hidden()).cloned().collect()
}

/// Keeps directories and markdown files only.
///
/// Directories always pass so they remain navigable.
pub fn filter_markdown(entries: &[Entry]) -> Vec<Entry> {
    entries
        .iter()
        .filter(|e| e.is_dir() || e.is_markdown())
        .cloned()
        .collect()
}
