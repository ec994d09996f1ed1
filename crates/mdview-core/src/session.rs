//! One explorer session over a root directory.
//!
//! [`Session`] owns the tree controller, navigation history, drag state and
//! the open file of a single root, and executes [`Command`]s against them.

use std::collections::BTreeSet;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;

use crate::error::{CoreError, CoreResult};
use crate::event::{Command, Event};
use crate::fs::entry::Entry;
use crate::fs::service::DirectoryService;
use crate::interaction::drag::DragState;
use crate::nav::history::{rebase, History};
use crate::reconcile::{Reconciled, Reconciler};
use crate::tree::controller::{ToggleOutcome, TreeController};
use crate::tree::state::{ExpansionState, TreeRow, ViewFilter};

/// Read-only, serialisable view of a session for presentation layers.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub root: PathBuf,
    pub current_dir: PathBuf,
    pub tree: ExpansionState,
    pub history: History,
    pub drag: DragState,
    pub open_file: Option<PathBuf>,
}

/// Explorer state for one root directory.
///
/// The tree shows `current_dir`, which always lies at or below `root`.
pub struct Session<S> {
    root: PathBuf,
    current_dir: PathBuf,
    tree: TreeController<S>,
    history: History,
    drag: DragState,
    open_file: Option<PathBuf>,
}

impl<S: DirectoryService> Session<S> {
    /// Opens a session and lists `root`.
    ///
    /// # Errors
    ///
    /// Returns the listing error if `root` cannot be read.
    pub async fn open(service: Arc<S>, root: PathBuf) -> CoreResult<Self> {
        let tree = TreeController::new(service);
        tree.expand(&root).await?;
        tracing::info!("session opened at {}", root.display());

        Ok(Self {
            current_dir: root.clone(),
            history: History::new().visit(root.clone()),
            root,
            tree,
            drag: DragState::new(),
            open_file: None,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn current_dir(&self) -> &Path {
        &self.current_dir
    }

    pub fn tree(&self) -> &TreeController<S> {
        &self.tree
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn open_file(&self) -> Option<&Path> {
        self.open_file.as_deref()
    }

    pub fn drag(&self) -> &DragState {
        &self.drag
    }

    /// The cached entry for `path`, if its parent is listed.
    pub fn entry(&self, path: &Path) -> Option<Entry> {
        self.tree.entry(path)
    }

    /// Flattened rows of the tree below the current directory.
    pub fn rows(&self, filter: ViewFilter) -> Vec<TreeRow> {
        self.tree.visible_rows(&self.current_dir, filter)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            root: self.root.clone(),
            current_dir: self.current_dir.clone(),
            tree: self.tree.snapshot(),
            history: self.history.clone(),
            drag: self.drag.clone(),
            open_file: self.open_file.clone(),
        }
    }

    /// Executes `command`, reporting a failure as [`Event::OperationFailed`].
    pub async fn dispatch(&mut self, command: Command) -> Vec<Event> {
        let operation = command.name();
        match self.execute(command).await {
            Ok(events) => events,
            Err(err) => {
                tracing::warn!("{operation} failed: {err}");
                vec![Event::OperationFailed {
                    operation: operation.to_string(),
                    error: err.to_string(),
                }]
            }
        }
    }

    /// Executes `command` and returns what changed.
    ///
    /// # Errors
    ///
    /// Returns the first error; state the command did not get to change is
    /// left intact.
    pub async fn execute(&mut self, command: Command) -> CoreResult<Vec<Event>> {
        match command {
            Command::Toggle(path) => {
                let outcome = self.tree.toggle(&path).await?;
                Ok(self.expansion_events(path, outcome))
            }
            Command::Expand(path) => {
                let outcome = self.tree.expand(&path).await?;
                Ok(self.expansion_events(path, outcome))
            }
            Command::Collapse(path) => {
                if self.tree.collapse(&path) {
                    Ok(vec![Event::Collapsed(path)])
                } else {
                    Ok(Vec::new())
                }
            }
            Command::Refresh(path) => {
                self.tree.refresh(&path).await?;
                Ok(vec![self.loaded(path)])
            }
            Command::Navigate(path) => self.navigate(path).await,
            Command::GoParent => {
                if self.current_dir == self.root {
                    return Ok(Vec::new());
                }
                match self.current_dir.parent().map(Path::to_path_buf) {
                    Some(parent) => self.navigate(parent).await,
                    None => Ok(Vec::new()),
                }
            }
            Command::GoBack => match self.history.back() {
                Some((history, path)) => self.show(history, path).await,
                None => Ok(Vec::new()),
            },
            Command::GoForward => match self.history.forward() {
                Some((history, path)) => self.show(history, path).await,
                None => Ok(Vec::new()),
            },
            Command::Move { source, target_dir } => {
                let done = Reconciler::new(&self.tree, &self.root)
                    .move_entry(&source, &target_dir)
                    .await?;
                Ok(self.relocated(done).await)
            }
            Command::Rename { path, new_name } => {
                let done = Reconciler::new(&self.tree, &self.root)
                    .rename(&path, &new_name)
                    .await?;
                Ok(self.relocated(done).await)
            }
            Command::CreateFile { parent, name } => {
                let done = Reconciler::new(&self.tree, &self.root)
                    .create_file(&parent, &name)
                    .await?;
                Ok(self.created(done))
            }
            Command::CreateDirectory { parent, name } => {
                let done = Reconciler::new(&self.tree, &self.root)
                    .create_directory(&parent, &name)
                    .await?;
                Ok(self.created(done))
            }
            Command::Delete(path) => self.delete(path).await,
            Command::OpenFile(path) => {
                let content = self.tree.service().read_text(&path).await?;
                tracing::debug!("opened {}", path.display());
                self.open_file = Some(path.clone());
                Ok(vec![Event::FileOpened { path, content }])
            }
            Command::SaveFile { path, content } => self.save(path, content).await,
            Command::ExternalChange(paths) => Ok(self.handle_changes(&paths).await),
        }
    }

    /// Starts dragging `source`.
    pub fn drag_start(&mut self, source: Entry) {
        self.drag.start(source);
    }

    /// Pointer over `target` during a drag. Returns the drop target.
    pub fn drag_hover(&mut self, target: &Entry) -> Option<PathBuf> {
        self.drag.hover(target).map(Path::to_path_buf)
    }

    /// Pointer over the tree background, which stands for the current directory.
    pub fn drag_hover_background(&mut self) -> Option<PathBuf> {
        self.drag
            .hover_root(&self.current_dir)
            .map(Path::to_path_buf)
    }

    pub fn drag_leave(&mut self, path: &Path) {
        self.drag.leave(path);
    }

    pub fn drag_cancel(&mut self) {
        self.drag.cancel();
    }

    /// Releases the drag, moving the source if a legal target was hovered.
    ///
    /// # Errors
    ///
    /// Same as [`Command::Move`].
    pub async fn drag_drop(&mut self) -> CoreResult<Vec<Event>> {
        match self.drag.drop() {
            Some(request) => self.execute(request.into()).await,
            None => Ok(Vec::new()),
        }
    }

    fn loaded(&self, path: PathBuf) -> Event {
        let entries = self.tree.children_of(&path);
        Event::DirectoryLoaded { path, entries }
    }

    fn expansion_events(&self, path: PathBuf, outcome: ToggleOutcome) -> Vec<Event> {
        match outcome {
            ToggleOutcome::Ignored => Vec::new(),
            ToggleOutcome::Collapsed => vec![Event::Collapsed(path)],
            ToggleOutcome::Expanded | ToggleOutcome::Joined => vec![Event::Expanded(path)],
            ToggleOutcome::Loaded => vec![self.loaded(path)],
        }
    }

    /// Expands `dir` for display, forgetting it if it no longer exists.
    async fn load_dir(&self, dir: &Path) -> CoreResult<Vec<Event>> {
        match self.tree.expand(dir).await {
            Ok(outcome) => Ok(self.expansion_events(dir.to_path_buf(), outcome)),
            Err(err) => {
                if matches!(err, CoreError::NotFound(_) | CoreError::NotADirectory(_)) {
                    self.tree.forget(dir);
                }
                Err(err)
            }
        }
    }

    async fn navigate(&mut self, path: PathBuf) -> CoreResult<Vec<Event>> {
        let path = normalize(&path);
        if !path.starts_with(&self.root) {
            return Err(CoreError::OutsideRoot(path));
        }
        if self.tree.with_state(|state| state.is_known_file(&path)) {
            return Err(CoreError::NotADirectory(path));
        }
        let history = self.history.visit(path.clone());
        self.show(history, path).await
    }

    /// Loads `dir` and, once that succeeded, makes it current.
    async fn show(&mut self, history: History, dir: PathBuf) -> CoreResult<Vec<Event>> {
        let mut events = self.load_dir(&dir).await?;
        tracing::debug!("navigated to {}", dir.display());
        self.history = history;
        self.current_dir = dir.clone();
        events.push(Event::Navigated(dir));
        Ok(events)
    }

    async fn relocated(&mut self, done: Reconciled) -> Vec<Event> {
        let mut events = Vec::new();
        let mut moved_dir = None;
        if let Some(from) = done.previous {
            self.history = self.history.relocate(&from, &done.path);
            if let Some(dir) = rebase(&self.current_dir, &from, &done.path) {
                self.current_dir = dir.clone();
                moved_dir = Some(dir);
            }
            if let Some(open) = self.open_file.as_deref() {
                if let Some(moved) = rebase(open, &from, &done.path) {
                    self.open_file = Some(moved);
                }
            }
            events.push(Event::EntryMoved {
                from,
                to: done.path,
            });
        }
        events.extend(done.refreshed.into_iter().map(|dir| self.loaded(dir)));
        // The old subtree was forgotten; list the current directory at its new place.
        if let Some(dir) = moved_dir {
            match self.load_dir(&dir).await {
                Ok(loaded) => events.extend(loaded),
                Err(err) => tracing::warn!("could not load {}: {err}", dir.display()),
            }
        }
        events
    }

    fn created(&self, done: Reconciled) -> Vec<Event> {
        let mut events = vec![Event::EntryCreated(done.path)];
        events.extend(done.refreshed.into_iter().map(|dir| self.loaded(dir)));
        events
    }

    async fn delete(&mut self, path: PathBuf) -> CoreResult<Vec<Event>> {
        let done = Reconciler::new(&self.tree, &self.root)
            .delete(&path)
            .await?;

        let mut events = vec![Event::EntryDeleted(done.path)];
        events.extend(done.refreshed.into_iter().map(|dir| self.loaded(dir)));

        if let Some(open) = self.open_file.take() {
            if open.starts_with(&path) {
                events.push(Event::FileClosed(open));
            } else {
                self.open_file = Some(open);
            }
        }
        if self.current_dir.starts_with(&path) {
            let fallback = path
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| self.root.clone());
            events.extend(self.fall_back_to(fallback).await);
        }
        Ok(events)
    }

    async fn save(&mut self, path: PathBuf, content: String) -> CoreResult<Vec<Event>> {
        let existed = self.tree.entry(&path).is_some();
        self.tree.service().write_text(&path, &content).await?;
        tracing::debug!("saved {}", path.display());

        let mut events = vec![Event::FileSaved(path.clone())];
        if !existed {
            if let Some(parent) = path.parent() {
                match self.tree.refresh_or_invalidate(parent).await {
                    Ok(true) => events.push(self.loaded(parent.to_path_buf())),
                    Ok(false) => {}
                    Err(err) => tracing::warn!("could not refresh {}: {err}", parent.display()),
                }
            }
        }
        Ok(events)
    }

    /// Applies a batch of externally changed paths.
    ///
    /// The batch is coalesced into the set of affected cached directories
    /// (a changed path that is itself cached, and the parent of every
    /// changed path), each refreshed once, parents before children. The
    /// open file is re-read if it or one of its ancestors was reported.
    pub async fn handle_changes(&mut self, paths: &[PathBuf]) -> Vec<Event> {
        let mut dirs = BTreeSet::new();
        for path in paths {
            if self.tree.is_cached(path) {
                dirs.insert(path.clone());
            }
            if let Some(parent) = path.parent() {
                if self.tree.is_cached(parent) {
                    dirs.insert(parent.to_path_buf());
                }
            }
        }
        tracing::debug!(
            "{} changed paths touch {} cached directories",
            paths.len(),
            dirs.len()
        );

        let mut events = Vec::new();
        let mut vanished = Vec::new();
        for dir in dirs {
            // An ancestor's refresh may already have pruned this one.
            if !self.tree.is_cached(&dir) {
                continue;
            }
            match self.tree.refresh(&dir).await {
                Ok(()) => events.push(self.loaded(dir)),
                Err(CoreError::NotFound(_) | CoreError::NotADirectory(_)) => vanished.push(dir),
                Err(err) => tracing::warn!("could not refresh {}: {err}", dir.display()),
            }
        }

        if let Some(open) = self.open_file.clone() {
            if paths.iter().any(|p| open.starts_with(p)) {
                match self.tree.service().read_text(&open).await {
                    Ok(content) => events.push(Event::FileReloaded {
                        path: open,
                        content,
                    }),
                    Err(CoreError::NotFound(_)) => {
                        self.open_file = None;
                        events.push(Event::FileClosed(open));
                    }
                    Err(err) => tracing::warn!("could not reload {}: {err}", open.display()),
                }
            }
        }

        if self.current_dir_vanished(&vanished) {
            let fallback = self.nearest_listed_ancestor(&self.current_dir);
            events.extend(self.fall_back_to(fallback).await);
        }
        events
    }

    fn current_dir_vanished(&self, vanished: &[PathBuf]) -> bool {
        if self.current_dir == self.root {
            return false;
        }
        if vanished.iter().any(|dir| self.current_dir.starts_with(dir)) {
            return true;
        }
        // Gone if any ancestor up to the root is missing from a listed parent.
        let mut dir = self.current_dir.as_path();
        while dir != self.root {
            let Some(parent) = dir.parent() else {
                break;
            };
            if self.tree.is_cached(parent) && self.tree.entry(dir).is_none() {
                return true;
            }
            dir = parent;
        }
        false
    }

    fn nearest_listed_ancestor(&self, path: &Path) -> PathBuf {
        let mut dir = path.parent();
        while let Some(candidate) = dir {
            if candidate == self.root || !candidate.starts_with(&self.root) {
                break;
            }
            if self.tree.entry(candidate).is_some() {
                return candidate.to_path_buf();
            }
            dir = candidate.parent();
        }
        self.root.clone()
    }

    /// Makes `dir` current after the current directory disappeared.
    async fn fall_back_to(&mut self, dir: PathBuf) -> Vec<Event> {
        tracing::debug!(
            "{} is gone, falling back to {}",
            self.current_dir.display(),
            dir.display()
        );
        let mut events = match self.load_dir(&dir).await {
            Ok(events) => events,
            Err(err) => {
                tracing::warn!("could not load {}: {err}", dir.display());
                Vec::new()
            }
        };
        self.history = self.history.visit(dir.clone());
        self.current_dir = dir.clone();
        events.push(Event::Navigated(dir));
        events
    }
}

/// Resolves `.` and `..` components without touching the file system.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out
}
