//! Keyboard-triggerable actions of the explorer.
//!
//! Every action a key can be bound to is a variant of [`Action`].
//! [`ActionRegistry`] carries the metadata (id, name, description, category)
//! used by keymap files and the help overlay.

/// Every key-bindable action in mdview.
///
/// Variants carry no parameters: the target is the selected tree row at
/// dispatch time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    // Navigation
    CursorUp,
    CursorDown,
    CursorTop,
    CursorBottom,
    Toggle,
    Expand,
    Collapse,
    EnterDir,
    GoParent,
    GoBack,
    GoForward,
    Refresh,
    // File operations
    Open,
    NewFile,
    NewDirectory,
    Rename,
    Delete,
    MarkMove,
    MoveHere,
    // View
    ToggleHidden,
    ToggleMarkdownOnly,
    TogglePreview,
    // System
    Help,
    Quit,
}

/// Broad category for grouping actions in the help overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionCategory {
    Navigation,
    FileOps,
    View,
    System,
}

impl ActionCategory {
    /// Human-readable label for display.
    pub fn label(self) -> &'static str {
        match self {
            Self::Navigation => "Navigation",
            Self::FileOps => "File",
            Self::View => "View",
            Self::System => "System",
        }
    }
}

/// Metadata for a single action.
#[derive(Debug, Clone)]
pub struct ActionDescriptor {
    pub action: Action,
    /// Snake-case identifier used in `keymap.toml` (e.g. `"cursor_up"`).
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub category: ActionCategory,
}

/// Registry of all available actions.
#[derive(Debug, Clone)]
pub struct ActionRegistry {
    descriptors: Vec<ActionDescriptor>,
}

const fn describe(
    action: Action,
    id: &'static str,
    name: &'static str,
    description: &'static str,
    category: ActionCategory,
) -> ActionDescriptor {
    ActionDescriptor {
        action,
        id,
        name,
        description,
        category,
    }
}

impl ActionRegistry {
    /// Builds the registry containing every known action.
    pub fn new() -> Self {
        use ActionCategory::{FileOps, Navigation, System, View};

        let descriptors = vec![
            describe(Action::CursorUp, "cursor_up", "Cursor Up", "Select the row above", Navigation),
            describe(Action::CursorDown, "cursor_down", "Cursor Down", "Select the row below", Navigation),
            describe(Action::CursorTop, "go_first", "Go to First", "Jump to the first row", Navigation),
            describe(Action::CursorBottom, "go_last", "Go to Last", "Jump to the last row", Navigation),
            describe(Action::Toggle, "toggle", "Toggle Folder", "Expand or collapse the selected folder", Navigation),
            describe(Action::Expand, "expand", "Expand", "Expand the selected folder", Navigation),
            describe(Action::Collapse, "collapse", "Collapse", "Collapse the selected folder or jump to its parent row", Navigation),
            describe(Action::EnterDir, "enter_dir", "Enter Directory", "Make the selected folder the current directory", Navigation),
            describe(Action::GoParent, "go_parent", "Go Parent", "Make the parent of the current directory current", Navigation),
            describe(Action::GoBack, "go_back", "Go Back", "Navigate back in history", Navigation),
            describe(Action::GoForward, "go_forward", "Go Forward", "Navigate forward in history", Navigation),
            describe(Action::Refresh, "refresh", "Refresh", "Re-read the selected folder", Navigation),
            describe(Action::Open, "open", "Open", "Open the selected file or toggle the selected folder", FileOps),
            describe(Action::NewFile, "new_file", "New File", "Create a file in the selected folder", FileOps),
            describe(Action::NewDirectory, "new_directory", "New Folder", "Create a folder in the selected folder", FileOps),
            describe(Action::Rename, "rename", "Rename", "Rename the selected entry", FileOps),
            describe(Action::Delete, "delete", "Delete", "Delete the selected entry", FileOps),
            describe(Action::MarkMove, "mark_move", "Mark for Move", "Remember the selected entry as the move source", FileOps),
            describe(Action::MoveHere, "move_here", "Move Here", "Move the marked entry into the selected folder", FileOps),
            describe(Action::ToggleHidden, "toggle_hidden", "Toggle Hidden", "Show or hide dot files", View),
            describe(Action::ToggleMarkdownOnly, "toggle_markdown_only", "Markdown Only", "Show only folders and markdown files", View),
            describe(Action::TogglePreview, "toggle_preview", "Toggle Preview", "Show or hide the preview pane", View),
            describe(Action::Help, "help", "Help", "Show key bindings", System),
            describe(Action::Quit, "quit", "Quit", "Exit mdview", System),
        ];
        Self { descriptors }
    }

    /// Returns all descriptors.
    pub fn all(&self) -> &[ActionDescriptor] {
        &self.descriptors
    }

    /// Finds an action by its string id (for keymap.toml parsing).
    pub fn find_by_id(&self, id: &str) -> Option<Action> {
        self.descriptors
            .iter()
            .find(|d| d.id == id)
            .map(|d| d.action)
    }

    /// Returns the descriptor for a given action.
    pub fn descriptor_for(&self, action: Action) -> Option<&ActionDescriptor> {
        self.descriptors.iter().find(|d| d.action == action)
    }

    /// Descriptors of one category, in registry order.
    pub fn by_category(&self, category: ActionCategory) -> impl Iterator<Item = &ActionDescriptor> {
        self.descriptors
            .iter()
            .filter(move |d| d.category == category)
    }
}

impl Default for ActionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
