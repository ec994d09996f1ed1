//! File system watcher for live refresh of the explorer.
//!
//! Uses [`notify`] with debouncing to detect changes below the session root
//! and forward the changed paths to the event loop, which hands them to
//! [`crate::Session::handle_changes`].

use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use std::time::Duration;

use notify_debouncer_mini::{new_debouncer, DebouncedEvent, DebouncedEventKind, Debouncer};

use crate::error::{CoreError, CoreResult};

/// Default debounce window.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(200);

/// Messages from the watcher to the event loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchMessage {
    /// Paths that changed during one debounce window, deduplicated.
    Changed(Vec<PathBuf>),
    /// An error occurred while watching.
    Error(String),
}

/// Watches one directory tree for changes with debouncing.
///
/// Only one root is watched at a time; [`DirWatcher::watch`] switches.
pub struct DirWatcher {
    debouncer: Debouncer<notify::RecommendedWatcher>,
    current_dir: Option<PathBuf>,
}

impl DirWatcher {
    /// Creates a watcher that sends messages through `tx`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Watch`] if the platform watcher cannot be initialised.
    pub fn new(tx: Sender<WatchMessage>, debounce: Duration) -> CoreResult<Self> {
        let debouncer = new_debouncer(
            debounce,
            move |result: Result<Vec<DebouncedEvent>, notify::Error>| {
                let message = match result {
                    Ok(events) => {
                        let paths = changed_paths(&events);
                        if paths.is_empty() {
                            return;
                        }
                        WatchMessage::Changed(paths)
                    }
                    Err(e) => WatchMessage::Error(e.to_string()),
                };
                let _ = tx.send(message);
            },
        )
        .map_err(|e| CoreError::Watch(e.to_string()))?;

        Ok(Self {
            debouncer,
            current_dir: None,
        })
    }

    /// Watches `dir` recursively, unwatching the previous directory if any.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Watch`] if the directory cannot be watched. The
    /// previous directory is no longer watched in that case.
    pub fn watch(&mut self, dir: &Path) -> CoreResult<()> {
        if let Some(prev) = self.current_dir.take() {
            let _ = self.debouncer.watcher().unwatch(&prev);
        }

        self.debouncer
            .watcher()
            .watch(dir, notify::RecursiveMode::Recursive)
            .map_err(|e| CoreError::Watch(format!("{}: {e}", dir.display())))?;
        tracing::debug!("watching {}", dir.display());
        self.current_dir = Some(dir.to_path_buf());
        Ok(())
    }

    /// Returns the directory currently being watched.
    pub fn current_dir(&self) -> Option<&Path> {
        self.current_dir.as_deref()
    }
}

fn changed_paths(events: &[DebouncedEvent]) -> Vec<PathBuf> {
    let mut paths: Vec<PathBuf> = events
        .iter()
        .filter(|e| matches!(e.kind, DebouncedEventKind::Any | DebouncedEventKind::AnyContinuous))
        .map(|e| e.path.clone())
        .collect();
    paths.sort();
    paths.dedup();
    paths
}
