//! Event system for communication between UI and Core.
//!
//! The UI translates user input into [`Command`]s, which the
//! [`crate::Session`] processes and answers with [`Event`]s. This
//! decoupling allows any frontend to drive the same core logic.

use std::path::PathBuf;

use crate::fs::entry::Entry;
use crate::interaction::UiAction;
use crate::reconcile::MoveRequest;

/// An action the UI requests the core to perform.
///
/// Commands flow **UI → Core**. The core never creates commands itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Expand a collapsed directory or collapse an expanded one.
    Toggle(PathBuf),
    /// Expand a directory; no-op if already expanded.
    Expand(PathBuf),
    /// Collapse a directory, keeping its cached listing.
    Collapse(PathBuf),
    /// Re-read a directory whether or not it is expanded.
    Refresh(PathBuf),
    /// Make the given directory the current one and record it in history.
    Navigate(PathBuf),
    /// Navigate to the parent of the current directory.
    GoParent,
    /// Navigate backward in history.
    GoBack,
    /// Navigate forward in history.
    GoForward,
    /// Move an entry into another directory.
    Move { source: PathBuf, target_dir: PathBuf },
    /// Rename an entry within its directory.
    Rename { path: PathBuf, new_name: String },
    /// Create an empty file.
    CreateFile { parent: PathBuf, name: String },
    /// Create a directory.
    CreateDirectory { parent: PathBuf, name: String },
    /// Delete a file, or a directory with its contents.
    Delete(PathBuf),
    /// Read a file and make it the open file.
    OpenFile(PathBuf),
    /// Write the given text to a file.
    SaveFile { path: PathBuf, content: String },
    /// The watcher reported changes under these paths.
    ExternalChange(Vec<PathBuf>),
}

impl Command {
    /// Maps a resolved pointer action onto the command it triggers.
    ///
    /// Context menus are handled by the front end and yield `None`.
    pub fn from_ui(action: &UiAction) -> Option<Self> {
        match action {
            UiAction::SelectFile(entry) => Some(Self::OpenFile(entry.path().to_path_buf())),
            UiAction::ToggleFolder(entry) => Some(Self::Toggle(entry.path().to_path_buf())),
            UiAction::NavigateInto(entry) => Some(Self::Navigate(entry.path().to_path_buf())),
            UiAction::ContextMenu { .. } => None,
        }
    }

    /// Short name used in failure reports.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Toggle(_) => "toggle",
            Self::Expand(_) => "expand",
            Self::Collapse(_) => "collapse",
            Self::Refresh(_) => "refresh",
            Self::Navigate(_) => "navigate",
            Self::GoParent => "go parent",
            Self::GoBack => "go back",
            Self::GoForward => "go forward",
            Self::Move { .. } => "move",
            Self::Rename { .. } => "rename",
            Self::CreateFile { .. } => "create file",
            Self::CreateDirectory { .. } => "create directory",
            Self::Delete(_) => "delete",
            Self::OpenFile(_) => "open",
            Self::SaveFile { .. } => "save",
            Self::ExternalChange(_) => "reload",
        }
    }
}

impl From<MoveRequest> for Command {
    fn from(request: MoveRequest) -> Self {
        Self::Move {
            source: request.source,
            target_dir: request.target_dir,
        }
    }
}

/// A notification the core sends back to the UI.
///
/// Events flow **Core → UI**. The UI uses these to update its display state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A directory listing was fetched and cached.
    DirectoryLoaded {
        path: PathBuf,
        entries: Vec<Entry>,
    },
    /// A directory is expanded and its children came from the cache.
    Expanded(PathBuf),
    /// A directory was collapsed.
    Collapsed(PathBuf),
    /// The current directory changed.
    Navigated(PathBuf),
    /// A file was read and is now the open file.
    FileOpened { path: PathBuf, content: String },
    /// The open file changed on disk and was read again.
    FileReloaded { path: PathBuf, content: String },
    /// The open file no longer exists.
    FileClosed(PathBuf),
    /// A file was written.
    FileSaved(PathBuf),
    /// An entry was moved or renamed.
    EntryMoved { from: PathBuf, to: PathBuf },
    /// A file or directory was created.
    EntryCreated(PathBuf),
    /// A file or directory was deleted.
    EntryDeleted(PathBuf),
    /// A command failed; nothing it would have changed was changed.
    OperationFailed { operation: String, error: String },
}
