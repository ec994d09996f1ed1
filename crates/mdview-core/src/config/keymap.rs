//! Key binding configuration.
//!
//! Key bindings map key names (e.g. `"j"`, `"gg"`, `"Enter"`, `"Ctrl+r"`)
//! to [`Action`] values. Modifier chords are written `Ctrl+<key>` or
//! `Alt+<key>`; the default bindings follow vim conventions.
//!
//! TOML files use string action identifiers (e.g. `"cursor_down"`), which
//! are resolved through [`ActionRegistry::find_by_id`] at load time.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::action::{Action, ActionRegistry};
use crate::error::{CoreError, CoreResult};

/// Raw TOML representation, deserialized first, then resolved.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct RawKeymap {
    #[serde(default)]
    bindings: HashMap<String, String>,
}

/// Complete set of key bindings.
#[derive(Debug, Clone)]
pub struct Keymap {
    bindings: HashMap<String, Action>,
    /// Action → keys, for the help overlay.
    reverse: HashMap<Action, Vec<String>>,
}

const DEFAULT_BINDINGS: &[(&str, Action)] = &[
    // Navigation
    ("j", Action::CursorDown),
    ("Down", Action::CursorDown),
    ("k", Action::CursorUp),
    ("Up", Action::CursorUp),
    ("gg", Action::CursorTop),
    ("G", Action::CursorBottom),
    ("Space", Action::Toggle),
    ("l", Action::Expand),
    ("Right", Action::Expand),
    ("h", Action::Collapse),
    ("Left", Action::Collapse),
    ("c", Action::EnterDir),
    ("-", Action::GoParent),
    ("Backspace", Action::GoParent),
    ("H", Action::GoBack),
    ("Alt+Left", Action::GoBack),
    ("L", Action::GoForward),
    ("Alt+Right", Action::GoForward),
    ("Ctrl+r", Action::Refresh),
    // File operations
    ("Enter", Action::Open),
    ("a", Action::NewFile),
    ("A", Action::NewDirectory),
    ("r", Action::Rename),
    ("d", Action::Delete),
    ("m", Action::MarkMove),
    ("p", Action::MoveHere),
    // View
    (".", Action::ToggleHidden),
    ("M", Action::ToggleMarkdownOnly),
    ("P", Action::TogglePreview),
    // System
    ("?", Action::Help),
    ("q", Action::Quit),
];

impl Default for Keymap {
    fn default() -> Self {
        let bindings: HashMap<String, Action> = DEFAULT_BINDINGS
            .iter()
            .map(|(key, action)| ((*key).to_string(), *action))
            .collect();
        let reverse = build_reverse(&bindings);
        Self { bindings, reverse }
    }
}

fn build_reverse(bindings: &HashMap<String, Action>) -> HashMap<Action, Vec<String>> {
    let mut reverse: HashMap<Action, Vec<String>> = HashMap::new();
    for (key, action) in bindings {
        reverse.entry(*action).or_default().push(key.clone());
    }
    for keys in reverse.values_mut() {
        keys.sort();
    }
    reverse
}

fn read_raw(path: &Path) -> CoreResult<RawKeymap> {
    let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => CoreError::NotFound(path.to_path_buf()),
        std::io::ErrorKind::PermissionDenied => CoreError::PermissionDenied(path.to_path_buf()),
        _ => CoreError::Io(e),
    })?;
    toml::from_str(&content).map_err(|e| CoreError::ConfigParse(e.to_string()))
}

impl Keymap {
    /// Loads key bindings from a TOML file at `path`, without defaults.
    ///
    /// Unknown action strings are skipped with a warning.
    ///
    /// # Errors
    ///
    /// - [`CoreError::NotFound`] if the file does not exist.
    /// - [`CoreError::PermissionDenied`] if the file is not readable.
    /// - [`CoreError::ConfigParse`] if the TOML is malformed.
    pub fn load(path: &Path) -> CoreResult<Self> {
        let raw = read_raw(path)?;
        Ok(Self::empty().overlay(raw))
    }

    /// Returns these bindings with the ones in `path` layered on top.
    ///
    /// # Errors
    ///
    /// Same as [`Keymap::load`].
    pub fn with_overrides(&self, path: &Path) -> CoreResult<Self> {
        let raw = read_raw(path)?;
        Ok(self.clone().overlay(raw))
    }

    fn empty() -> Self {
        Self {
            bindings: HashMap::new(),
            reverse: HashMap::new(),
        }
    }

    fn overlay(mut self, raw: RawKeymap) -> Self {
        let registry = ActionRegistry::new();
        for (key, action_id) in raw.bindings {
            match registry.find_by_id(&action_id) {
                Some(action) => {
                    self.bindings.insert(key, action);
                }
                None => tracing::warn!("ignoring unknown action {action_id:?} bound to {key:?}"),
            }
        }
        self.reverse = build_reverse(&self.bindings);
        self
    }

    /// Returns the action mapped to `key`, or `None` if unbound.
    pub fn action_for_key(&self, key: &str) -> Option<Action> {
        self.bindings.get(key).copied()
    }

    /// Returns `true` if some binding is longer than `prefix` and starts
    /// with it, so the input layer should wait for another key.
    pub fn is_prefix(&self, prefix: &str) -> bool {
        self.bindings
            .keys()
            .any(|key| key.len() > prefix.len() && key.starts_with(prefix))
    }

    /// Returns the key(s) bound to a given action.
    pub fn keys_for_action(&self, action: Action) -> Option<&[String]> {
        self.reverse.get(&action).map(|v| v.as_slice())
    }

    /// Returns all bindings.
    pub fn bindings(&self) -> &HashMap<String, Action> {
        &self.bindings
    }
}
