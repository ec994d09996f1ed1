//! Lazy expansion driver between the tree state and the Directory Service.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;

use crate::error::{CoreError, CoreResult};
use crate::fs::entry::Entry;
use crate::fs::service::DirectoryService;
use crate::tree::state::{ExpansionState, TreeRow, ViewFilter};

/// What a `toggle` or `expand` call ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// The path is a file; nothing changed.
    Ignored,
    /// The directory was collapsed; its cache entry is kept.
    Collapsed,
    /// The directory is expanded and its children came from the cache.
    Expanded,
    /// The directory was expanded and its children were fetched.
    Loaded,
    /// A fetch for this path was already in flight; this call waited for it.
    Joined,
}

#[derive(Debug, Clone)]
enum FetchStatus {
    Loaded,
    Failed(String),
    Abandoned,
}

type StatusSender = watch::Sender<Option<FetchStatus>>;
type StatusReceiver = watch::Receiver<Option<FetchStatus>>;

#[derive(Default)]
struct Inner {
    state: ExpansionState,
    in_flight: HashMap<PathBuf, StatusSender>,
}

enum Step {
    Cached,
    Fetch,
    Join(StatusReceiver),
}

/// Owns the [`ExpansionState`] of one session and fetches listings on demand.
///
/// State is kept behind a mutex that is only held for short synchronous
/// steps, never across a Directory Service call, so completions arriving on
/// any task are serialised. At most one expand-triggered `list` per path is
/// in flight; later expand requests for that path wait on its outcome.
pub struct TreeController<S> {
    service: Arc<S>,
    inner: Mutex<Inner>,
}

impl<S: DirectoryService> TreeController<S> {
    pub fn new(service: Arc<S>) -> Self {
        Self {
            service,
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Returns the Directory Service this controller fetches from.
    pub fn service(&self) -> &Arc<S> {
        &self.service
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Collapses an expanded directory, or expands a collapsed one.
    ///
    /// Known files are ignored. Unknown paths are treated as directories and
    /// left to the Directory Service to judge.
    ///
    /// # Errors
    ///
    /// Returns the listing error of a failed fetch. The node stays expanded
    /// (without children) so the user can retry.
    pub async fn toggle(&self, path: &Path) -> CoreResult<ToggleOutcome> {
        {
            let mut inner = self.lock();
            if inner.state.is_known_file(path) {
                return Ok(ToggleOutcome::Ignored);
            }
            if inner.state.collapse(path) {
                tracing::debug!("collapsed {}", path.display());
                return Ok(ToggleOutcome::Collapsed);
            }
        }
        self.expand(path).await
    }

    /// Expands `path`, fetching its children only if they are not cached.
    ///
    /// Idempotent: expanding an expanded, cached directory is a no-op.
    ///
    /// # Errors
    ///
    /// Same as [`TreeController::toggle`]; a joined waiter receives
    /// [`CoreError::FetchFailed`] carrying the original message.
    pub async fn expand(&self, path: &Path) -> CoreResult<ToggleOutcome> {
        loop {
            let step = {
                let mut inner = self.lock();
                if inner.state.is_known_file(path) {
                    return Ok(ToggleOutcome::Ignored);
                }
                inner.state.mark_expanded(path);
                inner.begin_fetch(path)
            };

            match step {
                Step::Cached => return Ok(ToggleOutcome::Expanded),
                Step::Fetch => {
                    self.fetch(path).await?;
                    return Ok(ToggleOutcome::Loaded);
                }
                Step::Join(mut rx) => {
                    tracing::debug!("joining in-flight listing of {}", path.display());
                    let status = rx
                        .wait_for(Option::is_some)
                        .await
                        .ok()
                        .and_then(|status| (*status).clone());
                    match status {
                        Some(FetchStatus::Loaded) => return Ok(ToggleOutcome::Joined),
                        Some(FetchStatus::Failed(message)) => {
                            return Err(CoreError::FetchFailed {
                                path: path.to_path_buf(),
                                message,
                            })
                        }
                        // The fetching task went away; start over.
                        Some(FetchStatus::Abandoned) | None => continue,
                    }
                }
            }
        }
    }

    /// Collapses `path`. Returns `false` if it was not expanded.
    pub fn collapse(&self, path: &Path) -> bool {
        self.lock().state.collapse(path)
    }

    /// Re-fetches the children of `path` and overwrites its cache entry,
    /// whether or not it is expanded.
    ///
    /// # Errors
    ///
    /// Returns the listing error; the existing cache entry is left intact,
    /// except when the directory no longer exists, in which case its whole
    /// subtree is forgotten before [`CoreError::NotFound`] is returned.
    pub async fn refresh(&self, path: &Path) -> CoreResult<()> {
        tracing::debug!("refreshing {}", path.display());
        match self.service.list(path).await {
            Ok(entries) => {
                self.lock().state.store_children(path, entries);
                Ok(())
            }
            Err(err) => {
                if matches!(err, CoreError::NotFound(_) | CoreError::NotADirectory(_)) {
                    self.lock().state.forget(path);
                }
                tracing::warn!("refresh of {} failed: {err}", path.display());
                Err(err)
            }
        }
    }

    /// Refreshes `dir` if it is expanded, otherwise drops its stale cache
    /// entry so the next expand refetches. Returns `true` if a refresh ran.
    ///
    /// # Errors
    ///
    /// Propagates the error of the refresh.
    pub async fn refresh_or_invalidate(&self, dir: &Path) -> CoreResult<bool> {
        if self.is_expanded(dir) {
            self.refresh(dir).await?;
            Ok(true)
        } else {
            self.invalidate(dir);
            Ok(false)
        }
    }

    /// Drops the cached listing of `path`.
    pub fn invalidate(&self, path: &Path) -> bool {
        self.lock().state.invalidate(path)
    }

    /// Drops all expansion and cache state at and below `path`.
    pub fn forget(&self, path: &Path) {
        self.lock().state.forget(path);
    }

    pub fn is_expanded(&self, path: &Path) -> bool {
        self.lock().state.is_expanded(path)
    }

    pub fn is_cached(&self, path: &Path) -> bool {
        self.lock().state.is_cached(path)
    }

    /// Returns the cached children of `path`, or an empty list.
    pub fn children_of(&self, path: &Path) -> Vec<Entry> {
        self.lock().state.children_of(path).to_vec()
    }

    /// Looks up the entry for `path` in its parent's cached listing.
    pub fn entry(&self, path: &Path) -> Option<Entry> {
        self.lock().state.entry(path).cloned()
    }

    /// Returns `true` if a listing of `path` is currently being fetched.
    pub fn is_in_flight(&self, path: &Path) -> bool {
        self.lock().in_flight.contains_key(path)
    }

    /// Flattens the expanded tree below `root` for rendering.
    pub fn visible_rows(&self, root: &Path, filter: ViewFilter) -> Vec<TreeRow> {
        self.lock().state.visible_rows(root, filter)
    }

    /// Returns a copy of the current expansion state.
    pub fn snapshot(&self) -> ExpansionState {
        self.lock().state.clone()
    }

    /// Runs `f` against the current state under the lock.
    pub fn with_state<R>(&self, f: impl FnOnce(&ExpansionState) -> R) -> R {
        f(&self.lock().state)
    }

    async fn fetch(&self, path: &Path) -> CoreResult<()> {
        let mut guard = InFlightGuard {
            inner: &self.inner,
            path,
            armed: true,
        };

        tracing::debug!("listing {}", path.display());
        let result = self.service.list(path).await;

        let mut inner = self.lock();
        guard.armed = false;
        let status = match &result {
            Ok(_) => FetchStatus::Loaded,
            Err(err) => {
                tracing::warn!("listing {} failed: {err}", path.display());
                FetchStatus::Failed(err.to_string())
            }
        };
        // A file never stays expanded, for this caller or any joined one.
        if matches!(result, Err(CoreError::NotADirectory(_))) {
            inner.state.collapse(path);
        }
        if let Some(tx) = inner.in_flight.remove(path) {
            tx.send_replace(Some(status));
        }
        let entries = result?;
        // Stored even if the node was collapsed meanwhile.
        inner.state.store_children(path, entries);
        Ok(())
    }
}

impl Inner {
    fn begin_fetch(&mut self, path: &Path) -> Step {
        if let Some(tx) = self.in_flight.get(path) {
            return Step::Join(tx.subscribe());
        }
        if self.state.is_cached(path) {
            return Step::Cached;
        }
        let (tx, _rx) = watch::channel(None);
        self.in_flight.insert(path.to_path_buf(), tx);
        Step::Fetch
    }
}

/// Clears the in-flight marker if a fetching future is dropped mid-listing.
struct InFlightGuard<'a> {
    inner: &'a Mutex<Inner>,
    path: &'a Path,
    armed: bool,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(tx) = inner.in_flight.remove(self.path) {
            tx.send_replace(Some(FetchStatus::Abandoned));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::memory::MemoryFs;

    fn p(path: &str) -> PathBuf {
        PathBuf::from(path)
    }

    fn project() -> Arc<MemoryFs> {
        let fs = MemoryFs::new();
        fs.add_dir("/proj");
        fs.add_dir("/proj/docs");
        fs.add_file("/proj/readme.md", "# readme");
        fs.add_file("/proj/docs/notes.md", "notes");
        Arc::new(fs)
    }

    async fn loaded(fs: &Arc<MemoryFs>) -> TreeController<MemoryFs> {
        let tree = TreeController::new(Arc::clone(fs));
        tree.refresh(&p("/proj")).await.unwrap();
        tree
    }

    #[tokio::test]
    async fn unvisited_path_is_collapsed_and_empty() {
        let fs = project();
        let tree = TreeController::new(Arc::clone(&fs));
        assert!(!tree.is_expanded(&p("/proj/docs")));
        assert!(tree.children_of(&p("/proj/docs")).is_empty());
        assert_eq!(fs.list_calls(&p("/proj/docs")), 0);
    }

    #[tokio::test]
    async fn toggle_twice_fetches_once() {
        let fs = project();
        let tree = loaded(&fs).await;

        assert_eq!(
            tree.toggle(&p("/proj/docs")).await.unwrap(),
            ToggleOutcome::Loaded
        );
        assert_eq!(
            tree.toggle(&p("/proj/docs")).await.unwrap(),
            ToggleOutcome::Collapsed
        );

        assert_eq!(fs.list_calls(&p("/proj/docs")), 1);
    }

    #[tokio::test]
    async fn reexpand_served_from_cache() {
        let fs = project();
        let tree = loaded(&fs).await;
        let docs = p("/proj/docs");

        tree.toggle(&docs).await.unwrap();
        let names: Vec<String> = tree
            .children_of(&docs)
            .iter()
            .map(|e| e.name().to_string())
            .collect();
        assert_eq!(names, vec!["notes.md"]);

        tree.toggle(&docs).await.unwrap();
        assert!(!tree.is_expanded(&docs));
        assert_eq!(tree.children_of(&docs).len(), 1);

        assert_eq!(tree.toggle(&docs).await.unwrap(), ToggleOutcome::Expanded);
        assert_eq!(fs.list_calls(&docs), 1);
    }

    #[tokio::test]
    async fn refresh_between_toggles_refetches() {
        let fs = project();
        let tree = loaded(&fs).await;
        let docs = p("/proj/docs");

        tree.toggle(&docs).await.unwrap();
        tree.toggle(&docs).await.unwrap();
        fs.add_file("/proj/docs/later.md", "");
        tree.refresh(&docs).await.unwrap();
        tree.toggle(&docs).await.unwrap();

        assert_eq!(fs.list_calls(&docs), 2);
        assert_eq!(tree.children_of(&docs).len(), 2);
    }

    #[tokio::test]
    async fn toggle_on_file_is_noop() {
        let fs = project();
        let tree = loaded(&fs).await;

        let outcome = tree.toggle(&p("/proj/readme.md")).await.unwrap();

        assert_eq!(outcome, ToggleOutcome::Ignored);
        assert!(!tree.is_expanded(&p("/proj/readme.md")));
        assert_eq!(fs.list_calls(&p("/proj/readme.md")), 0);
    }

    #[tokio::test]
    async fn toggle_on_uncached_file_leaves_it_collapsed() {
        let fs = project();
        let tree = TreeController::new(Arc::clone(&fs));
        let notes = p("/proj/docs/notes.md");

        let err = tree.toggle(&notes).await.unwrap_err();

        assert!(matches!(err, CoreError::NotADirectory(_)));
        assert!(!tree.is_expanded(&notes));
        assert!(!tree.snapshot().is_expanded(&notes));
        assert!(!tree.is_in_flight(&notes));
    }

    #[tokio::test]
    async fn joined_expand_of_file_leaves_it_collapsed() {
        let fs = project();
        let tree = Arc::new(TreeController::new(Arc::clone(&fs)));
        let notes = p("/proj/docs/notes.md");
        let gate = fs.hold_listings();

        let first = tokio::spawn({
            let tree = Arc::clone(&tree);
            let notes = notes.clone();
            async move { tree.expand(&notes).await }
        });
        tokio::task::yield_now().await;
        let second = tokio::spawn({
            let tree = Arc::clone(&tree);
            let notes = notes.clone();
            async move { tree.expand(&notes).await }
        });
        tokio::task::yield_now().await;

        gate.notify_one();
        assert!(matches!(
            first.await.unwrap(),
            Err(CoreError::NotADirectory(_))
        ));
        assert!(matches!(
            second.await.unwrap(),
            Err(CoreError::FetchFailed { .. })
        ));
        assert!(!tree.is_expanded(&notes));
        assert_eq!(fs.list_calls(&notes), 1);
    }

    #[tokio::test]
    async fn failed_fetch_stays_expanded_and_childless() {
        let fs = project();
        let tree = loaded(&fs).await;
        let docs = p("/proj/docs");
        fs.fail_listing(&docs);

        let err = tree.toggle(&docs).await.unwrap_err();

        assert!(matches!(err, CoreError::PermissionDenied(_)));
        assert!(tree.is_expanded(&docs));
        assert!(tree.children_of(&docs).is_empty());
        assert!(!tree.is_in_flight(&docs));
    }

    #[tokio::test]
    async fn expand_retries_after_failure() {
        let fs = project();
        let tree = loaded(&fs).await;
        let docs = p("/proj/docs");
        fs.fail_listing(&docs);
        assert!(tree.expand(&docs).await.is_err());

        fs.clear_failures();
        assert_eq!(tree.expand(&docs).await.unwrap(), ToggleOutcome::Loaded);
        assert_eq!(tree.children_of(&docs).len(), 1);
    }

    #[tokio::test]
    async fn expand_is_idempotent() {
        let fs = project();
        let tree = loaded(&fs).await;
        let docs = p("/proj/docs");

        tree.expand(&docs).await.unwrap();
        assert_eq!(tree.expand(&docs).await.unwrap(), ToggleOutcome::Expanded);
        assert!(tree.is_expanded(&docs));
        assert_eq!(fs.list_calls(&docs), 1);
    }

    #[tokio::test]
    async fn pending_expand_is_joined_not_refetched() {
        let fs = project();
        let tree = Arc::new(loaded(&fs).await);
        let docs = p("/proj/docs");
        let gate = fs.hold_listings();

        let first = tokio::spawn({
            let tree = Arc::clone(&tree);
            let docs = docs.clone();
            async move { tree.toggle(&docs).await }
        });
        tokio::task::yield_now().await;
        assert!(tree.is_in_flight(&docs));

        // Collapse while pending, then expand again: must not issue a second list.
        assert_eq!(
            tree.toggle(&docs).await.unwrap(),
            ToggleOutcome::Collapsed
        );
        let second = tokio::spawn({
            let tree = Arc::clone(&tree);
            let docs = docs.clone();
            async move { tree.toggle(&docs).await }
        });
        tokio::task::yield_now().await;

        gate.notify_one();
        assert_eq!(first.await.unwrap().unwrap(), ToggleOutcome::Loaded);
        assert_eq!(second.await.unwrap().unwrap(), ToggleOutcome::Joined);

        assert_eq!(fs.list_calls(&docs), 1);
        assert!(tree.is_expanded(&docs));
        assert_eq!(tree.children_of(&docs).len(), 1);
    }

    #[tokio::test]
    async fn collapse_during_fetch_still_populates_cache() {
        let fs = project();
        let tree = Arc::new(loaded(&fs).await);
        let docs = p("/proj/docs");
        let gate = fs.hold_listings();

        let pending = tokio::spawn({
            let tree = Arc::clone(&tree);
            let docs = docs.clone();
            async move { tree.expand(&docs).await }
        });
        tokio::task::yield_now().await;

        assert!(tree.collapse(&docs));
        gate.notify_one();
        pending.await.unwrap().unwrap();

        assert!(!tree.is_expanded(&docs));
        assert!(tree.is_cached(&docs));
    }

    #[tokio::test]
    async fn dropped_fetch_clears_in_flight() {
        let fs = project();
        let tree = Arc::new(loaded(&fs).await);
        let docs = p("/proj/docs");
        let _gate = fs.hold_listings();

        let pending = tokio::spawn({
            let tree = Arc::clone(&tree);
            let docs = docs.clone();
            async move { tree.expand(&docs).await }
        });
        tokio::task::yield_now().await;
        assert!(tree.is_in_flight(&docs));

        pending.abort();
        let _ = pending.await;

        assert!(!tree.is_in_flight(&docs));
    }

    #[tokio::test]
    async fn refresh_of_deleted_directory_forgets_subtree() {
        let fs = project();
        let tree = loaded(&fs).await;
        let docs = p("/proj/docs");
        tree.expand(&docs).await.unwrap();

        fs.remove("/proj/docs");
        let err = tree.refresh(&docs).await.unwrap_err();

        assert!(matches!(err, CoreError::NotFound(_)));
        assert!(!tree.is_expanded(&docs));
        assert!(!tree.is_cached(&docs));
    }

    #[tokio::test]
    async fn refresh_or_invalidate_depends_on_expansion() {
        let fs = project();
        let tree = loaded(&fs).await;
        let docs = p("/proj/docs");
        tree.toggle(&docs).await.unwrap();
        tree.toggle(&docs).await.unwrap();

        assert!(!tree.refresh_or_invalidate(&docs).await.unwrap());
        assert!(!tree.is_cached(&docs));
        assert_eq!(fs.list_calls(&docs), 1);

        tree.toggle(&docs).await.unwrap();
        assert!(tree.refresh_or_invalidate(&docs).await.unwrap());
        assert_eq!(fs.list_calls(&docs), 3);
    }
}
