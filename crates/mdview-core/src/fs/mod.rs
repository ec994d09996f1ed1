//! File system abstractions for mdview.
//!
//! This module provides the [`entry::Entry`] node type, the
//! [`service::DirectoryService`] contract with its local implementation
//! ([`local::LocalFs`]), and the debounced [`watch::DirWatcher`].

pub mod entry;
pub mod local;
pub mod service;
pub mod watch;

#[cfg(test)]
pub(crate) mod memory;

pub use local::LocalFs;
pub use service::{validate_name, DirectoryService};
pub use watch::{DirWatcher, WatchMessage};
