//! In-memory [`DirectoryService`] used by the unit tests.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::error::{CoreError, CoreResult};
use crate::fs::entry::Entry;
use crate::fs::service::DirectoryService;
use crate::tree::sort::sort_entries;

#[derive(Debug, Clone)]
enum Node {
    Dir,
    File(String),
}

#[derive(Default)]
struct State {
    nodes: BTreeMap<PathBuf, Node>,
    list_calls: HashMap<PathBuf, usize>,
    renames: Vec<(PathBuf, PathBuf)>,
    failing_listings: HashSet<PathBuf>,
    fail_mutations: bool,
}

/// A tree of directories and text files that counts `list` calls.
#[derive(Default)]
pub(crate) struct MemoryFs {
    state: Mutex<State>,
    gate: Mutex<Option<Arc<Notify>>>,
}

impl MemoryFs {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn add_dir(&self, path: &str) {
        self.state
            .lock()
            .unwrap()
            .nodes
            .insert(PathBuf::from(path), Node::Dir);
    }

    pub(crate) fn add_file(&self, path: &str, content: &str) {
        self.state
            .lock()
            .unwrap()
            .nodes
            .insert(PathBuf::from(path), Node::File(content.to_string()));
    }

    /// Removes `path` and everything below it, as an external delete would.
    pub(crate) fn remove(&self, path: &str) {
        let path = Path::new(path);
        self.state
            .lock()
            .unwrap()
            .nodes
            .retain(|p, _| !p.starts_with(path));
    }

    pub(crate) fn exists(&self, path: &str) -> bool {
        self.state.lock().unwrap().nodes.contains_key(Path::new(path))
    }

    pub(crate) fn content(&self, path: &str) -> Option<String> {
        match self.state.lock().unwrap().nodes.get(Path::new(path)) {
            Some(Node::File(text)) => Some(text.clone()),
            _ => None,
        }
    }

    pub(crate) fn list_calls(&self, path: &Path) -> usize {
        self.state
            .lock()
            .unwrap()
            .list_calls
            .get(path)
            .copied()
            .unwrap_or(0)
    }

    pub(crate) fn total_list_calls(&self) -> usize {
        self.state.lock().unwrap().list_calls.values().sum()
    }

    pub(crate) fn renames(&self) -> Vec<(PathBuf, PathBuf)> {
        self.state.lock().unwrap().renames.clone()
    }

    /// Makes every listing of `path` fail with `PermissionDenied`.
    pub(crate) fn fail_listing(&self, path: &Path) {
        self.state
            .lock()
            .unwrap()
            .failing_listings
            .insert(path.to_path_buf());
    }

    /// Makes create, delete, rename and write fail with `PermissionDenied`.
    pub(crate) fn fail_mutations(&self) {
        self.state.lock().unwrap().fail_mutations = true;
    }

    pub(crate) fn clear_failures(&self) {
        let mut state = self.state.lock().unwrap();
        state.failing_listings.clear();
        state.fail_mutations = false;
    }

    /// Blocks every later `list` until the returned gate is notified once per call.
    pub(crate) fn hold_listings(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.gate.lock().unwrap() = Some(Arc::clone(&gate));
        gate
    }

    fn check_mutable(&self, path: &Path) -> CoreResult<()> {
        if self.state.lock().unwrap().fail_mutations {
            return Err(CoreError::PermissionDenied(path.to_path_buf()));
        }
        Ok(())
    }

    fn require_parent_dir(state: &State, path: &Path) -> CoreResult<()> {
        match path.parent().and_then(|parent| state.nodes.get(parent)) {
            Some(Node::Dir) => Ok(()),
            Some(Node::File(_)) => Err(CoreError::NotADirectory(path.to_path_buf())),
            None => Err(CoreError::NotFound(path.to_path_buf())),
        }
    }
}

#[async_trait]
impl DirectoryService for MemoryFs {
    async fn list(&self, path: &Path) -> CoreResult<Vec<Entry>> {
        *self
            .state
            .lock()
            .unwrap()
            .list_calls
            .entry(path.to_path_buf())
            .or_default() += 1;

        let gate = self.gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        let state = self.state.lock().unwrap();
        if state.failing_listings.contains(path) {
            return Err(CoreError::PermissionDenied(path.to_path_buf()));
        }
        match state.nodes.get(path) {
            None => Err(CoreError::NotFound(path.to_path_buf())),
            Some(Node::File(_)) => Err(CoreError::NotADirectory(path.to_path_buf())),
            Some(Node::Dir) => {
                let entries: Vec<Entry> = state
                    .nodes
                    .iter()
                    .filter(|(p, _)| p.parent() == Some(path))
                    .map(|(p, node)| Entry::new(p.clone(), matches!(node, Node::Dir)))
                    .collect();
                Ok(sort_entries(&entries))
            }
        }
    }

    async fn create_file(&self, path: &Path) -> CoreResult<()> {
        self.check_mutable(path)?;
        let mut state = self.state.lock().unwrap();
        if state.nodes.contains_key(path) {
            return Err(CoreError::AlreadyExists(path.to_path_buf()));
        }
        Self::require_parent_dir(&state, path)?;
        state
            .nodes
            .insert(path.to_path_buf(), Node::File(String::new()));
        Ok(())
    }

    async fn create_directory(&self, path: &Path) -> CoreResult<()> {
        self.check_mutable(path)?;
        let mut state = self.state.lock().unwrap();
        if state.nodes.contains_key(path) {
            return Err(CoreError::AlreadyExists(path.to_path_buf()));
        }
        Self::require_parent_dir(&state, path)?;
        state.nodes.insert(path.to_path_buf(), Node::Dir);
        Ok(())
    }

    async fn delete(&self, path: &Path) -> CoreResult<()> {
        self.check_mutable(path)?;
        let mut state = self.state.lock().unwrap();
        if !state.nodes.contains_key(path) {
            return Err(CoreError::NotFound(path.to_path_buf()));
        }
        state.nodes.retain(|p, _| !p.starts_with(path));
        Ok(())
    }

    async fn rename(&self, from: &Path, to: &Path) -> CoreResult<()> {
        self.check_mutable(from)?;
        let mut state = self.state.lock().unwrap();
        state.renames.push((from.to_path_buf(), to.to_path_buf()));
        if !state.nodes.contains_key(from) {
            return Err(CoreError::NotFound(from.to_path_buf()));
        }
        if state.nodes.contains_key(to) {
            return Err(CoreError::AlreadyExists(to.to_path_buf()));
        }
        Self::require_parent_dir(&state, to)?;

        let moved: Vec<(PathBuf, Node)> = state
            .nodes
            .iter()
            .filter(|(p, _)| p.starts_with(from))
            .map(|(p, node)| (p.clone(), node.clone()))
            .collect();
        for (old, node) in moved {
            state.nodes.remove(&old);
            let suffix = old.strip_prefix(from).unwrap_or(Path::new(""));
            let new = if suffix.as_os_str().is_empty() {
                to.to_path_buf()
            } else {
                to.join(suffix)
            };
            state.nodes.insert(new, node);
        }
        Ok(())
    }

    async fn read_text(&self, path: &Path) -> CoreResult<String> {
        match self.state.lock().unwrap().nodes.get(path) {
            Some(Node::File(text)) => Ok(text.clone()),
            Some(Node::Dir) => Err(CoreError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                format!("{} is a directory", path.display()),
            ))),
            None => Err(CoreError::NotFound(path.to_path_buf())),
        }
    }

    async fn write_text(&self, path: &Path, content: &str) -> CoreResult<()> {
        self.check_mutable(path)?;
        self.state
            .lock()
            .unwrap()
            .nodes
            .insert(path.to_path_buf(), Node::File(content.to_string()));
        Ok(())
    }
}
