//! The directory tree: expansion state, its children cache and the
//! controller that fills the cache lazily from a Directory Service.

pub mod controller;
pub mod sort;
pub mod state;

pub use controller::{ToggleOutcome, TreeController};
pub use sort::{compare_entries, filter_hidden, filter_markdown, sort_entries};
pub use state::{ExpansionState, TreeRow, ViewFilter};
