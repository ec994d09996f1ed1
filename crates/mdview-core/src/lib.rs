//! mdview core library: UI-agnostic directory-tree explorer logic.
//!
//! `mdview-core` provides the explorer behind a markdown viewer: a lazily
//! expanded, cached directory tree that stays consistent under moves,
//! renames and external file-system changes. It is decoupled from any UI
//! framework; the terminal front end (`mdview-tui`) drives it through
//! [`Session`] and [`Command`]s.
//!
//! # Modules
//!
//! - [`fs`]: [`Entry`], the [`DirectoryService`] contract, [`LocalFs`] and the file watcher.
//! - [`tree`]: expansion state, the children cache and the [`TreeController`].
//! - [`interaction`]: single/double click disambiguation and drag-and-drop.
//! - [`reconcile`]: legality checks and cache reconciliation for move, rename, create and delete.
//! - [`nav`]: back/forward [`History`].
//! - [`config`]: TOML settings and keymaps; [`action`] lists the bindable actions.
//! - [`session`] and [`event`]: the command/event facade for front ends.
//! - [`error`]: unified error type ([`CoreError`]) and result alias ([`CoreResult`]).

pub mod action;
pub mod config;
pub mod error;
pub mod event;
pub mod fs;
pub mod interaction;
pub mod nav;
pub mod reconcile;
pub mod session;
pub mod tree;

pub use error::{CoreError, CoreResult, MoveRejection};
pub use event::{Command, Event};
pub use fs::entry::{is_markdown_name, Entry};
pub use fs::{validate_name, DirWatcher, DirectoryService, LocalFs, WatchMessage};
pub use interaction::{
    ClickDispatcher, Clock, DragOperation, DragState, ManualClock, SystemClock, UiAction,
};
pub use nav::History;
pub use reconcile::{MoveRequest, Reconciled, Reconciler};
pub use session::{Session, SessionSnapshot};
pub use tree::{sort_entries, ExpansionState, ToggleOutcome, TreeController, TreeRow, ViewFilter};

pub use action::{Action, ActionCategory, ActionDescriptor, ActionRegistry};
pub use config::keymap::Keymap;
pub use config::settings::Config;
