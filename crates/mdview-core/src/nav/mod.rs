//! Navigation logic for mdview: the back/forward [`history::History`]
//! over visited directories.

pub mod history;

pub use history::{rebase, History};
