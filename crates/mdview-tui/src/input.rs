use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use mdview_core::{Action, Keymap};

use crate::app::AppMode;

/// Actions that can result from a key press.
#[derive(Debug, PartialEq, Eq)]
pub enum InputAction {
    /// Run a keymap action against the tree.
    Run(Action),
    /// Enter a new AppMode.
    EnterMode(AppMode),
    /// Append a character to the text being edited.
    InputChar(char),
    /// Remove the last character of the text being edited.
    InputBackspace,
    /// Submit the text being edited.
    InputConfirm,
    /// User confirmed the pending action.
    ConfirmApproved,
    /// Move the context menu highlight down.
    MenuDown,
    /// Move the context menu highlight up.
    MenuUp,
    /// Run the highlighted context menu entry.
    MenuConfirm,
    Quit,
    /// No action for this key.
    None,
}

/// Keys typed so far towards a multi-key binding such as `gg`.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct InputState {
    pending: String,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> &str {
        &self.pending
    }
}

/// Maps a key event to an InputAction based on the current mode.
/// Returns the action and a new InputState (immutable pattern).
///
/// In Normal mode every key except Ctrl+C is resolved through the
/// [`Keymap`]; modal modes (Rename, Confirm, ...) are hardcoded.
pub fn handle_key(
    key: KeyEvent,
    mode: &AppMode,
    state: &InputState,
    keymap: &Keymap,
) -> (InputAction, InputState) {
    match mode {
        AppMode::Normal => handle_normal_key(key, state, keymap),
        AppMode::Rename(_) | AppMode::NewFile(_) | AppMode::NewDirectory(_) => {
            handle_text_key(key)
        }
        AppMode::Confirm(_) => handle_confirm_key(key),
        AppMode::ContextMenu { .. } => handle_context_menu_key(key),
        AppMode::Help => handle_help_key(key),
    }
}

/// Converts an [`Action`] to the corresponding [`InputAction`].
fn action_to_input_action(action: Action) -> InputAction {
    match action {
        Action::Help => InputAction::EnterMode(AppMode::Help),
        Action::Quit => InputAction::Quit,
        other => InputAction::Run(other),
    }
}

/// Name of a key as written in `keymap.toml`, e.g. `j`, `G`, `Space`,
/// `Ctrl+r`, `Alt+Left`.
pub fn key_name(key: &KeyEvent) -> Option<String> {
    let base = match key.code {
        KeyCode::Char(' ') => "Space".to_string(),
        KeyCode::Char(c) => c.to_string(),
        KeyCode::Enter => "Enter".to_string(),
        KeyCode::Backspace => "Backspace".to_string(),
        KeyCode::Delete => "Delete".to_string(),
        KeyCode::Tab => "Tab".to_string(),
        KeyCode::Esc => "Esc".to_string(),
        KeyCode::Up => "Up".to_string(),
        KeyCode::Down => "Down".to_string(),
        KeyCode::Left => "Left".to_string(),
        KeyCode::Right => "Right".to_string(),
        KeyCode::Home => "Home".to_string(),
        KeyCode::End => "End".to_string(),
        KeyCode::PageUp => "PageUp".to_string(),
        KeyCode::PageDown => "PageDown".to_string(),
        KeyCode::F(n) => format!("F{n}"),
        _ => return None,
    };

    // Shift is already part of an uppercase character.
    let name = if key.modifiers.contains(KeyModifiers::CONTROL) {
        format!("Ctrl+{base}")
    } else if key.modifiers.contains(KeyModifiers::ALT) {
        format!("Alt+{base}")
    } else {
        base
    };
    Some(name)
}

fn handle_normal_key(
    key: KeyEvent,
    state: &InputState,
    keymap: &Keymap,
) -> (InputAction, InputState) {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return (InputAction::Quit, InputState::new());
    }

    let Some(name) = key_name(&key) else {
        return (InputAction::None, InputState::new());
    };

    let sequence = format!("{}{name}", state.pending);
    if let Some(action) = keymap.action_for_key(&sequence) {
        return (action_to_input_action(action), InputState::new());
    }
    if keymap.is_prefix(&sequence) {
        return (InputAction::None, InputState { pending: sequence });
    }
    // A broken sequence is dropped along with the key that broke it.
    (InputAction::None, InputState::new())
}

fn handle_text_key(key: KeyEvent) -> (InputAction, InputState) {
    let new_state = InputState::new();
    let action = match key.code {
        KeyCode::Esc => InputAction::EnterMode(AppMode::Normal),
        KeyCode::Enter => InputAction::InputConfirm,
        KeyCode::Backspace => InputAction::InputBackspace,
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            InputAction::InputChar(c)
        }
        _ => InputAction::None,
    };
    (action, new_state)
}

fn handle_confirm_key(key: KeyEvent) -> (InputAction, InputState) {
    let new_state = InputState::new();
    let action = match key.code {
        KeyCode::Char('y') | KeyCode::Char('Y') => InputAction::ConfirmApproved,
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
            InputAction::EnterMode(AppMode::Normal)
        }
        _ => InputAction::None,
    };
    (action, new_state)
}

fn handle_context_menu_key(key: KeyEvent) -> (InputAction, InputState) {
    let new_state = InputState::new();
    let action = match key.code {
        KeyCode::Esc | KeyCode::Char('q') => InputAction::EnterMode(AppMode::Normal),
        KeyCode::Char('j') | KeyCode::Down => InputAction::MenuDown,
        KeyCode::Char('k') | KeyCode::Up => InputAction::MenuUp,
        KeyCode::Enter => InputAction::MenuConfirm,
        _ => InputAction::None,
    };
    (action, new_state)
}

fn handle_help_key(key: KeyEvent) -> (InputAction, InputState) {
    let new_state = InputState::new();
    let action = match key.code {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('?') => {
            InputAction::EnterMode(AppMode::Normal)
        }
        _ => InputAction::None,
    };
    (action, new_state)
}
