use std::path::{Path, PathBuf};

use mdview_core::nav::rebase;
use mdview_core::{Action, ActionRegistry, Command, Config, Event, Keymap, TreeRow, ViewFilter};

/// Actions awaiting a yes/no answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmAction {
    Delete(PathBuf),
}

/// The current interaction mode of the application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppMode {
    Normal,
    /// Editing the new name of the selected entry.
    Rename(String),
    /// Typing the name of a file to create.
    NewFile(String),
    /// Typing the name of a directory to create.
    NewDirectory(String),
    Confirm(ConfirmAction),
    /// Popup opened by a right click at terminal cell `(x, y)`.
    ContextMenu { x: u16, y: u16, selected: usize },
    Help,
}

/// Entries of the right-click menu, in display order.
pub const CONTEXT_ACTIONS: &[Action] = &[
    Action::Open,
    Action::Rename,
    Action::MarkMove,
    Action::MoveHere,
    Action::NewFile,
    Action::NewDirectory,
    Action::Delete,
];

/// The file shown in the preview pane.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub path: PathBuf,
    pub content: String,
}

/// Top-level UI state. Explorer state lives in the core session; this
/// holds only what the terminal front end adds on top of it.
#[derive(Debug, Clone)]
pub struct App {
    mode: AppMode,
    selected: usize,
    filter: ViewFilter,
    show_preview: bool,
    preview: Option<Document>,
    preview_scroll: u16,
    /// Source picked with "mark for move".
    marked: Option<PathBuf>,
    /// Path the cursor should land on once it shows up in the rows.
    follow: Option<PathBuf>,
    status_message: Option<String>,
    should_quit: bool,
    keymap: Keymap,
    action_registry: ActionRegistry,
    config: Config,
}

impl App {
    pub fn new(config: Config, keymap: Keymap) -> Self {
        Self {
            mode: AppMode::Normal,
            selected: 0,
            filter: config.view_filter(),
            show_preview: config.preview.enabled,
            preview: None,
            preview_scroll: 0,
            marked: None,
            follow: None,
            status_message: None,
            should_quit: false,
            keymap,
            action_registry: ActionRegistry::new(),
            config,
        }
    }

    pub fn mode(&self) -> &AppMode {
        &self.mode
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn filter(&self) -> ViewFilter {
        self.filter
    }

    pub fn show_preview(&self) -> bool {
        self.show_preview
    }

    pub fn preview(&self) -> Option<&Document> {
        self.preview.as_ref()
    }

    pub fn preview_scroll(&self) -> u16 {
        self.preview_scroll
    }

    pub fn marked(&self) -> Option<&Path> {
        self.marked.as_deref()
    }

    pub fn status_message(&self) -> Option<&str> {
        self.status_message.as_deref()
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn keymap(&self) -> &Keymap {
        &self.keymap
    }

    pub fn action_registry(&self) -> &ActionRegistry {
        &self.action_registry
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The row under the cursor.
    pub fn selected_row<'a>(&self, rows: &'a [TreeRow]) -> Option<&'a TreeRow> {
        rows.get(self.selected)
    }

    pub fn with_mode(self, mode: AppMode) -> Self {
        Self { mode, ..self }
    }

    pub fn with_status(self, msg: String) -> Self {
        Self {
            status_message: Some(msg),
            ..self
        }
    }

    pub fn with_clear_status(self) -> Self {
        Self {
            status_message: None,
            ..self
        }
    }

    pub fn with_quit(self) -> Self {
        Self {
            should_quit: true,
            ..self
        }
    }

    pub fn with_selected(self, index: usize) -> Self {
        Self {
            selected: index,
            follow: None,
            ..self
        }
    }

    pub fn with_cursor_down(self, total: usize) -> Self {
        let selected = (self.selected + 1).min(total.saturating_sub(1));
        self.with_selected(selected)
    }

    pub fn with_cursor_up(self) -> Self {
        let selected = self.selected.saturating_sub(1);
        self.with_selected(selected)
    }

    pub fn with_preview_scroll(self, down: bool) -> Self {
        let preview_scroll = if down {
            self.preview_scroll.saturating_add(1)
        } else {
            self.preview_scroll.saturating_sub(1)
        };
        Self {
            preview_scroll,
            ..self
        }
    }

    /// Keeps the cursor on the followed path, or inside `rows`.
    pub fn settle(self, rows: &[TreeRow]) -> Self {
        if let Some(target) = self.follow.as_deref() {
            if let Some(index) = rows.iter().position(|row| row.entry.path() == target) {
                return self.with_selected(index);
            }
        }
        let selected = self.selected.min(rows.len().saturating_sub(1));
        Self { selected, ..self }
    }

    /// Runs a keymap action against the rows on screen.
    ///
    /// Returns the commands the session should execute, in order.
    pub fn run(self, action: Action, rows: &[TreeRow], current_dir: &Path) -> (Self, Vec<Command>) {
        let app = self.with_clear_status();
        let row = app.selected_row(rows).cloned();

        match action {
            Action::CursorDown => (app.with_cursor_down(rows.len()), Vec::new()),
            Action::CursorUp => (app.with_cursor_up(), Vec::new()),
            Action::CursorTop => (app.with_selected(0), Vec::new()),
            Action::CursorBottom => {
                let last = rows.len().saturating_sub(1);
                (app.with_selected(last), Vec::new())
            }
            Action::Toggle | Action::Open => match row {
                Some(row) if row.entry.is_dir() => {
                    (app, vec![Command::Toggle(row.entry.path().to_path_buf())])
                }
                Some(row) => (app, vec![Command::OpenFile(row.entry.path().to_path_buf())]),
                None => (app, Vec::new()),
            },
            Action::Expand => match row {
                Some(row) if row.entry.is_dir() && !row.expanded => {
                    (app, vec![Command::Expand(row.entry.path().to_path_buf())])
                }
                Some(row) if row.entry.is_dir() => (app.with_cursor_down(rows.len()), Vec::new()),
                _ => (app, Vec::new()),
            },
            Action::Collapse => match row {
                Some(row) if row.expanded => {
                    (app, vec![Command::Collapse(row.entry.path().to_path_buf())])
                }
                Some(row) => {
                    let parent = row.entry.path().parent();
                    match rows.iter().position(|r| Some(r.entry.path()) == parent) {
                        Some(index) => (app.with_selected(index), Vec::new()),
                        None => (app, Vec::new()),
                    }
                }
                None => (app, Vec::new()),
            },
            Action::EnterDir => match row {
                Some(row) if row.entry.is_dir() => {
                    (app, vec![Command::Navigate(row.entry.path().to_path_buf())])
                }
                _ => (app, Vec::new()),
            },
            Action::GoParent => (app, vec![Command::GoParent]),
            Action::GoBack => (app, vec![Command::GoBack]),
            Action::GoForward => (app, vec![Command::GoForward]),
            Action::Refresh => {
                let dir = match row {
                    Some(row) if row.entry.is_dir() && row.expanded => row.entry.path().to_path_buf(),
                    _ => current_dir.to_path_buf(),
                };
                (app, vec![Command::Refresh(dir)])
            }
            Action::NewFile => (app.with_mode(AppMode::NewFile(String::new())), Vec::new()),
            Action::NewDirectory => (
                app.with_mode(AppMode::NewDirectory(String::new())),
                Vec::new(),
            ),
            Action::Rename => match row {
                Some(row) => {
                    let name = row.entry.name().to_string();
                    (app.with_mode(AppMode::Rename(name)), Vec::new())
                }
                None => (app, Vec::new()),
            },
            Action::Delete => match row {
                Some(row) if app.config.general.confirm_delete => {
                    let path = row.entry.path().to_path_buf();
                    (
                        app.with_mode(AppMode::Confirm(ConfirmAction::Delete(path))),
                        Vec::new(),
                    )
                }
                Some(row) => (app, vec![Command::Delete(row.entry.path().to_path_buf())]),
                None => (app, Vec::new()),
            },
            Action::MarkMove => match row {
                Some(row) => {
                    let msg = format!("marked {} for move", row.entry.name());
                    let app = Self {
                        marked: Some(row.entry.path().to_path_buf()),
                        ..app
                    };
                    (app.with_status(msg), Vec::new())
                }
                None => (app, Vec::new()),
            },
            Action::MoveHere => match app.marked.clone() {
                Some(source) => {
                    let target_dir = target_dir(row.as_ref(), current_dir);
                    let commands = vec![
                        Command::Move {
                            source,
                            target_dir: target_dir.clone(),
                        },
                        Command::Expand(target_dir),
                    ];
                    (app, commands)
                }
                None => (app.with_status("nothing marked for move".to_string()), Vec::new()),
            },
            Action::ToggleHidden => {
                let filter = ViewFilter {
                    show_hidden: !app.filter.show_hidden,
                    ..app.filter
                };
                (Self { filter, ..app }, Vec::new())
            }
            Action::ToggleMarkdownOnly => {
                let filter = ViewFilter {
                    markdown_only: !app.filter.markdown_only,
                    ..app.filter
                };
                (Self { filter, ..app }, Vec::new())
            }
            Action::TogglePreview => {
                let show_preview = !app.show_preview;
                (Self { show_preview, ..app }, Vec::new())
            }
            Action::Help => (app.with_mode(AppMode::Help), Vec::new()),
            Action::Quit => (app.with_quit(), Vec::new()),
        }
    }

    /// Appends a character to the text being edited.
    pub fn input_char(self, c: char) -> Self {
        let mode = match self.mode {
            AppMode::Rename(mut s) => {
                s.push(c);
                AppMode::Rename(s)
            }
            AppMode::NewFile(mut s) => {
                s.push(c);
                AppMode::NewFile(s)
            }
            AppMode::NewDirectory(mut s) => {
                s.push(c);
                AppMode::NewDirectory(s)
            }
            other => other,
        };
        Self { mode, ..self }
    }

    pub fn input_backspace(self) -> Self {
        let mode = match self.mode {
            AppMode::Rename(mut s) => {
                s.pop();
                AppMode::Rename(s)
            }
            AppMode::NewFile(mut s) => {
                s.pop();
                AppMode::NewFile(s)
            }
            AppMode::NewDirectory(mut s) => {
                s.pop();
                AppMode::NewDirectory(s)
            }
            other => other,
        };
        Self { mode, ..self }
    }

    /// Submits the text being edited.
    pub fn confirm_input(self, rows: &[TreeRow], current_dir: &Path) -> (Self, Vec<Command>) {
        let row = self.selected_row(rows).cloned();
        let mode = self.mode.clone();
        let app = self.with_mode(AppMode::Normal);

        match mode {
            AppMode::Rename(name) => match row {
                Some(row) if !name.is_empty() && name != row.entry.name() => (
                    app,
                    vec![Command::Rename {
                        path: row.entry.path().to_path_buf(),
                        new_name: name,
                    }],
                ),
                _ => (app, Vec::new()),
            },
            AppMode::NewFile(name) if !name.is_empty() => {
                let parent = target_dir(row.as_ref(), current_dir);
                (
                    app,
                    vec![
                        Command::CreateFile {
                            parent: parent.clone(),
                            name,
                        },
                        Command::Expand(parent),
                    ],
                )
            }
            AppMode::NewDirectory(name) if !name.is_empty() => {
                let parent = target_dir(row.as_ref(), current_dir);
                (
                    app,
                    vec![
                        Command::CreateDirectory {
                            parent: parent.clone(),
                            name,
                        },
                        Command::Expand(parent),
                    ],
                )
            }
            _ => (app, Vec::new()),
        }
    }

    /// The user answered "yes" to the pending confirmation.
    pub fn confirm_approved(self) -> (Self, Vec<Command>) {
        match self.mode.clone() {
            AppMode::Confirm(ConfirmAction::Delete(path)) => {
                (self.with_mode(AppMode::Normal), vec![Command::Delete(path)])
            }
            _ => (self.with_mode(AppMode::Normal), Vec::new()),
        }
    }

    pub fn open_context_menu(self, x: u16, y: u16) -> Self {
        self.with_mode(AppMode::ContextMenu { x, y, selected: 0 })
    }

    pub fn context_menu_move(self, down: bool) -> Self {
        match self.mode {
            AppMode::ContextMenu { x, y, selected } => {
                let selected = if down {
                    (selected + 1).min(CONTEXT_ACTIONS.len() - 1)
                } else {
                    selected.saturating_sub(1)
                };
                self.with_mode(AppMode::ContextMenu { x, y, selected })
            }
            _ => self,
        }
    }

    /// Runs the highlighted context menu entry on the selected row.
    pub fn context_menu_confirm(
        self,
        rows: &[TreeRow],
        current_dir: &Path,
    ) -> (Self, Vec<Command>) {
        match self.mode {
            AppMode::ContextMenu { selected, .. } => {
                let action = CONTEXT_ACTIONS[selected.min(CONTEXT_ACTIONS.len() - 1)];
                self.with_mode(AppMode::Normal)
                    .run(action, rows, current_dir)
            }
            _ => (self, Vec::new()),
        }
    }

    /// Folds session events into the UI state.
    pub fn apply_events(self, events: &[Event]) -> Self {
        events.iter().fold(self, Self::apply_event)
    }

    fn apply_event(self, event: &Event) -> Self {
        match event {
            Event::FileOpened { path, content } => Self {
                preview: Some(Document {
                    path: path.clone(),
                    content: content.clone(),
                }),
                preview_scroll: 0,
                ..self
            },
            Event::FileReloaded { path, content } => Self {
                preview: Some(Document {
                    path: path.clone(),
                    content: content.clone(),
                }),
                ..self
            },
            Event::FileClosed(path) => {
                let preview = self.preview.filter(|doc| &doc.path != path);
                Self { preview, ..self }.with_status(format!("{} was removed", path.display()))
            }
            Event::Navigated(_) => Self {
                selected: 0,
                follow: None,
                ..self
            },
            Event::EntryMoved { from, to } => {
                let marked = self.marked.filter(|m| m != from);
                let preview = self.preview.map(|doc| match rebase(&doc.path, from, to) {
                    Some(path) => Document { path, ..doc },
                    None => doc,
                });
                Self {
                    marked,
                    preview,
                    follow: Some(to.clone()),
                    ..self
                }
                .with_status(format!("moved to {}", to.display()))
            }
            Event::EntryCreated(path) => Self {
                follow: Some(path.clone()),
                ..self
            }
            .with_status(format!("created {}", path.display())),
            Event::EntryDeleted(path) => {
                let marked = self.marked.filter(|m| !m.starts_with(path));
                Self { marked, ..self }.with_status(format!("deleted {}", path.display()))
            }
            Event::FileSaved(path) => self.with_status(format!("saved {}", path.display())),
            Event::OperationFailed { operation, error } => {
                self.with_status(format!("{operation} failed: {error}"))
            }
            Event::DirectoryLoaded { .. } | Event::Expanded(_) | Event::Collapsed(_) => self,
        }
    }
}

/// Directory that new entries and moves go into: the selected directory,
/// the parent of the selected file, or the current directory.
fn target_dir(row: Option<&TreeRow>, current_dir: &Path) -> PathBuf {
    match row {
        Some(row) if row.entry.is_dir() => row.entry.path().to_path_buf(),
        Some(row) => row
            .entry
            .path()
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| current_dir.to_path_buf()),
        None => current_dir.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mdview_core::Entry;

    fn row(path: &str, is_dir: bool, depth: usize, expanded: bool) -> TreeRow {
        TreeRow {
            entry: Entry::new(PathBuf::from(path), is_dir),
            depth,
            expanded,
            loading: false,
        }
    }

    /// /proj
    ///   docs/        (expanded)
    ///     api.md
    ///   notes/
    ///   readme.md
    fn rows() -> Vec<TreeRow> {
        vec![
            row("/proj/docs", true, 0, true),
            row("/proj/docs/api.md", false, 1, false),
            row("/proj/notes", true, 0, false),
            row("/proj/readme.md", false, 0, false),
        ]
    }

    fn app() -> App {
        App::new(Config::default(), Keymap::default())
    }

    fn proj() -> &'static Path {
        Path::new("/proj")
    }

    #[test]
    fn new_app_starts_from_config() {
        let mut config = Config::default();
        config.general.show_hidden = true;
        config.preview.enabled = false;

        let app = App::new(config, Keymap::default());

        assert_eq!(app.mode(), &AppMode::Normal);
        assert!(app.filter().show_hidden);
        assert!(!app.show_preview());
        assert_eq!(app.selected(), 0);
        assert!(app.preview().is_none());
    }

    #[test]
    fn cursor_moves_stay_in_bounds() {
        let rows = rows();
        let (app, _) = app().run(Action::CursorUp, &rows, proj());
        assert_eq!(app.selected(), 0);

        let (app, _) = app.run(Action::CursorBottom, &rows, proj());
        assert_eq!(app.selected(), 3);
        let (app, _) = app.run(Action::CursorDown, &rows, proj());
        assert_eq!(app.selected(), 3);

        let (app, _) = app.run(Action::CursorTop, &rows, proj());
        assert_eq!(app.selected(), 0);
    }

    #[test]
    fn open_toggles_folders_and_opens_files() {
        let rows = rows();
        let (app, commands) = app().run(Action::Open, &rows, proj());
        assert_eq!(commands, vec![Command::Toggle(PathBuf::from("/proj/docs"))]);

        let (_, commands) = app.with_selected(3).run(Action::Open, &rows, proj());
        assert_eq!(
            commands,
            vec![Command::OpenFile(PathBuf::from("/proj/readme.md"))]
        );
    }

    #[test]
    fn collapse_on_child_jumps_to_parent_row() {
        let rows = rows();
        let (app, commands) = app().with_selected(1).run(Action::Collapse, &rows, proj());
        assert!(commands.is_empty());
        assert_eq!(app.selected(), 0);

        let (_, commands) = app.run(Action::Collapse, &rows, proj());
        assert_eq!(commands, vec![Command::Collapse(PathBuf::from("/proj/docs"))]);
    }

    #[test]
    fn expand_only_collapsed_folders() {
        let rows = rows();
        let (_, commands) = app().with_selected(2).run(Action::Expand, &rows, proj());
        assert_eq!(commands, vec![Command::Expand(PathBuf::from("/proj/notes"))]);

        let (app, commands) = app().run(Action::Expand, &rows, proj());
        assert!(commands.is_empty());
        assert_eq!(app.selected(), 1);
    }

    #[test]
    fn enter_dir_navigates_only_into_folders() {
        let rows = rows();
        let (_, commands) = app().with_selected(2).run(Action::EnterDir, &rows, proj());
        assert_eq!(commands, vec![Command::Navigate(PathBuf::from("/proj/notes"))]);

        let (_, commands) = app().with_selected(3).run(Action::EnterDir, &rows, proj());
        assert!(commands.is_empty());
    }

    #[test]
    fn delete_asks_for_confirmation_by_default() {
        let rows = rows();
        let (app, commands) = app().with_selected(3).run(Action::Delete, &rows, proj());
        assert!(commands.is_empty());
        assert_eq!(
            app.mode(),
            &AppMode::Confirm(ConfirmAction::Delete(PathBuf::from("/proj/readme.md")))
        );

        let (app, commands) = app.confirm_approved();
        assert_eq!(app.mode(), &AppMode::Normal);
        assert_eq!(commands, vec![Command::Delete(PathBuf::from("/proj/readme.md"))]);
    }

    #[test]
    fn delete_without_confirmation() {
        let mut config = Config::default();
        config.general.confirm_delete = false;
        let app = App::new(config, Keymap::default()).with_selected(3);

        let (app, commands) = app.run(Action::Delete, &rows(), proj());
        assert_eq!(app.mode(), &AppMode::Normal);
        assert_eq!(commands, vec![Command::Delete(PathBuf::from("/proj/readme.md"))]);
    }

    #[test]
    fn rename_prefills_name_and_skips_unchanged() {
        let rows = rows();
        let (app, _) = app().with_selected(3).run(Action::Rename, &rows, proj());
        assert_eq!(app.mode(), &AppMode::Rename("readme.md".to_string()));

        let (unchanged, commands) = app.clone().confirm_input(&rows, proj());
        assert_eq!(unchanged.mode(), &AppMode::Normal);
        assert!(commands.is_empty());

        let app = app
            .input_backspace()
            .input_backspace()
            .input_backspace()
            .input_char('t')
            .input_char('x')
            .input_char('t');
        assert_eq!(app.mode(), &AppMode::Rename("readme.txt".to_string()));

        let (_, commands) = app.confirm_input(&rows, proj());
        assert_eq!(
            commands,
            vec![Command::Rename {
                path: PathBuf::from("/proj/readme.md"),
                new_name: "readme.txt".to_string(),
            }]
        );
    }

    #[test]
    fn new_file_goes_into_selected_folder_or_beside_selected_file() {
        let rows = rows();
        let (app, _) = app().with_selected(2).run(Action::NewFile, &rows, proj());
        let (_, commands) = app.input_char('a').confirm_input(&rows, proj());
        assert_eq!(
            commands,
            vec![
                Command::CreateFile {
                    parent: PathBuf::from("/proj/notes"),
                    name: "a".to_string(),
                },
                Command::Expand(PathBuf::from("/proj/notes")),
            ]
        );

        let (app, _) = app_at(1).run(Action::NewDirectory, &rows, proj());
        let (_, commands) = app.input_char('x').confirm_input(&rows, proj());
        assert_eq!(
            commands[0],
            Command::CreateDirectory {
                parent: PathBuf::from("/proj/docs"),
                name: "x".to_string(),
            }
        );
    }

    fn app_at(index: usize) -> App {
        app().with_selected(index)
    }

    #[test]
    fn empty_name_creates_nothing() {
        let (app, _) = app().run(Action::NewFile, &rows(), proj());
        let (app, commands) = app.confirm_input(&rows(), proj());
        assert!(commands.is_empty());
        assert_eq!(app.mode(), &AppMode::Normal);
    }

    #[test]
    fn mark_then_move_here() {
        let rows = rows();
        let (app, _) = app_at(3).run(Action::MarkMove, &rows, proj());
        assert_eq!(app.marked(), Some(Path::new("/proj/readme.md")));

        let (_, commands) = app.with_selected(2).run(Action::MoveHere, &rows, proj());
        assert_eq!(
            commands,
            vec![
                Command::Move {
                    source: PathBuf::from("/proj/readme.md"),
                    target_dir: PathBuf::from("/proj/notes"),
                },
                Command::Expand(PathBuf::from("/proj/notes")),
            ]
        );
    }

    #[test]
    fn move_here_without_mark_reports() {
        let (app, commands) = app().run(Action::MoveHere, &rows(), proj());
        assert!(commands.is_empty());
        assert_eq!(app.status_message(), Some("nothing marked for move"));
    }

    #[test]
    fn view_toggles_flip_flags() {
        let rows = rows();
        let (app, _) = app().run(Action::ToggleHidden, &rows, proj());
        assert!(app.filter().show_hidden);
        let (app, _) = app.run(Action::ToggleMarkdownOnly, &rows, proj());
        assert!(app.filter().markdown_only);
        let (app, _) = app.run(Action::TogglePreview, &rows, proj());
        assert!(!app.show_preview());
        let (app, _) = app.run(Action::Quit, &rows, proj());
        assert!(app.should_quit());
    }

    #[test]
    fn refresh_targets_expanded_folder_or_current_dir() {
        let rows = rows();
        let (_, commands) = app().run(Action::Refresh, &rows, proj());
        assert_eq!(commands, vec![Command::Refresh(PathBuf::from("/proj/docs"))]);

        let (_, commands) = app_at(3).run(Action::Refresh, &rows, proj());
        assert_eq!(commands, vec![Command::Refresh(PathBuf::from("/proj"))]);
    }

    #[test]
    fn context_menu_runs_highlighted_action() {
        let rows = rows();
        let app = app_at(3).open_context_menu(10, 4);
        assert_eq!(
            app.mode(),
            &AppMode::ContextMenu {
                x: 10,
                y: 4,
                selected: 0
            }
        );

        let app = app.context_menu_move(true);
        let (app, commands) = app.context_menu_confirm(&rows, proj());
        assert!(commands.is_empty());
        assert_eq!(app.mode(), &AppMode::Rename("readme.md".to_string()));
    }

    #[test]
    fn context_menu_selection_is_clamped() {
        let mut app = app().open_context_menu(0, 0);
        for _ in 0..20 {
            app = app.context_menu_move(true);
        }
        assert!(matches!(
            app.mode(),
            AppMode::ContextMenu { selected, .. } if *selected == CONTEXT_ACTIONS.len() - 1
        ));
    }

    #[test]
    fn file_events_drive_the_preview() {
        let app = app().apply_events(&[Event::FileOpened {
            path: PathBuf::from("/proj/docs/api.md"),
            content: "# API".to_string(),
        }]);
        assert_eq!(app.preview().unwrap().content, "# API");

        let app = app.apply_events(&[Event::EntryMoved {
            from: PathBuf::from("/proj/docs"),
            to: PathBuf::from("/proj/notes/docs"),
        }]);
        assert_eq!(
            app.preview().unwrap().path,
            PathBuf::from("/proj/notes/docs/api.md")
        );

        let app = app.apply_events(&[Event::FileReloaded {
            path: PathBuf::from("/proj/notes/docs/api.md"),
            content: "# API v2".to_string(),
        }]);
        assert_eq!(app.preview().unwrap().content, "# API v2");

        let app = app.apply_events(&[Event::FileClosed(PathBuf::from(
            "/proj/notes/docs/api.md",
        ))]);
        assert!(app.preview().is_none());
        assert!(app.status_message().unwrap().contains("removed"));
    }

    #[test]
    fn failure_is_shown_in_status() {
        let app = app().apply_events(&[Event::OperationFailed {
            operation: "move".to_string(),
            error: "cannot move an entry into itself".to_string(),
        }]);
        assert_eq!(
            app.status_message(),
            Some("move failed: cannot move an entry into itself")
        );
    }

    #[test]
    fn cursor_follows_moved_entry() {
        let rows = rows();
        let (app, _) = app_at(3).run(Action::MarkMove, &rows, proj());
        let app = app.apply_events(&[Event::EntryMoved {
            from: PathBuf::from("/proj/readme.md"),
            to: PathBuf::from("/proj/docs/readme.md"),
        }]);
        assert!(app.marked().is_none());

        let mut after = rows.clone();
        after.pop();
        after.insert(2, row("/proj/docs/readme.md", false, 1, false));
        let app = app.settle(&after);
        assert_eq!(app.selected(), 2);
    }

    #[test]
    fn settle_clamps_selection() {
        let app = app_at(3).settle(&rows()[..2]);
        assert_eq!(app.selected(), 1);

        let app = app.settle(&[]);
        assert_eq!(app.selected(), 0);
    }

    #[test]
    fn navigation_resets_cursor() {
        let app = app_at(2).apply_events(&[Event::Navigated(PathBuf::from("/proj/notes"))]);
        assert_eq!(app.selected(), 0);
    }
}
