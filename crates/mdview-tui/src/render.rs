use std::path::Path;

use mdview_core::{ActionCategory, ActionRegistry, DragState, History, Keymap, TreeRow};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    Frame,
};

use crate::app::{App, AppMode, ConfirmAction, CONTEXT_ACTIONS};
use crate::ui::breadcrumb::render_breadcrumb;
use crate::ui::popup::{render_menu, render_popup};
use crate::ui::preview::render_preview;
use crate::ui::statusbar::{render_statusbar, StatusBarProps};
use crate::ui::tree::{render_tree, TreeProps};

/// Session state needed to draw one frame.
pub struct View<'a> {
    pub root: &'a Path,
    pub current_dir: &'a Path,
    pub rows: &'a [TreeRow],
    pub history: &'a History,
    pub drag: &'a DragState,
    pub open_file: Option<&'a Path>,
}

/// Screen regions of the main layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Areas {
    pub breadcrumb: Rect,
    pub tree: Rect,
    pub preview: Option<Rect>,
    pub statusbar: Rect,
}

/// Splits the screen: breadcrumb on top, tree (40%) | preview (60%),
/// status bar at the bottom. Without the preview the tree takes the width.
pub fn layout(area: Rect, show_preview: bool) -> Areas {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(area);

    if !show_preview {
        return Areas {
            breadcrumb: vertical[0],
            tree: vertical[1],
            preview: None,
            statusbar: vertical[2],
        };
    }

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(vertical[1]);

    Areas {
        breadcrumb: vertical[0],
        tree: horizontal[0],
        preview: Some(horizontal[1]),
        statusbar: vertical[2],
    }
}

/// Composes the full UI layout each frame.
pub fn render(f: &mut Frame, app: &App, view: &View<'_>) {
    let areas = layout(f.area(), app.show_preview());
    let config = app.config();

    render_breadcrumb(
        f,
        areas.breadcrumb,
        view.root,
        view.current_dir,
        view.history.can_go_back(),
        view.history.can_go_forward(),
    );

    let title = view
        .current_dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| view.current_dir.display().to_string());
    let drag_source = view.drag.operation().map(|op| op.source.path());
    let tree_props = TreeProps {
        rows: view.rows,
        selected: app.selected(),
        title,
        indent: config.explorer.indent,
        drop_target: view.drag.drop_target(),
        drag_source,
        marked: app.marked(),
        open_file: view.open_file,
    };
    render_tree(f, areas.tree, &tree_props);

    if let Some(area) = areas.preview {
        render_preview(
            f,
            area,
            app.preview(),
            app.preview_scroll(),
            &config.preview,
        );
    }

    let status_props = StatusBarProps {
        row_count: view.rows.len(),
        selected_index: app.selected(),
        selected_entry: app.selected_row(view.rows).map(|row| &row.entry),
        filter: app.filter(),
        marked: app.marked(),
        dragging: drag_source.map(|source| (source, view.drag.drop_target())),
        status_message: app.status_message(),
    };
    render_statusbar(f, areas.statusbar, &status_props);

    // Render modal overlays based on mode
    match app.mode() {
        AppMode::Help => {
            render_popup(f, "Help", &help_lines(app.action_registry(), app.keymap()));
        }
        AppMode::Confirm(ConfirmAction::Delete(path)) => {
            let lines = vec![
                format!("Delete {}?", path.display()),
                String::new(),
                "y - Yes, proceed".to_owned(),
                "n - No, cancel".to_owned(),
            ];
            render_popup(f, "Confirm", &lines);
        }
        AppMode::Rename(name) => render_input_popup(f, "Rename", "New name", name),
        AppMode::NewFile(name) => render_input_popup(f, "New file", "Name", name),
        AppMode::NewDirectory(name) => render_input_popup(f, "New directory", "Name", name),
        AppMode::ContextMenu { x, y, selected } => {
            let items = context_menu_items(app.action_registry());
            render_menu(f, *x, *y, &items, *selected);
        }
        AppMode::Normal => {}
    }
}

fn render_input_popup(f: &mut Frame, title: &str, label: &str, value: &str) {
    let lines = vec![
        format!("{label}: {value}_"),
        String::new(),
        "Enter to confirm, Esc to cancel".to_owned(),
    ];
    render_popup(f, title, &lines);
}

fn context_menu_items(registry: &ActionRegistry) -> Vec<&'static str> {
    CONTEXT_ACTIONS
        .iter()
        .map(|action| {
            registry
                .descriptor_for(*action)
                .map(|d| d.name)
                .unwrap_or("?")
        })
        .collect()
}

/// Help text listing every action with its bound keys, by category.
pub fn help_lines(registry: &ActionRegistry, keymap: &Keymap) -> Vec<String> {
    let categories = [
        ActionCategory::Navigation,
        ActionCategory::FileOps,
        ActionCategory::View,
        ActionCategory::System,
    ];

    let mut lines = Vec::new();
    for category in categories {
        lines.push(format!("{}:", category.label()));
        for descriptor in registry.by_category(category) {
            let keys = keymap
                .keys_for_action(descriptor.action)
                .map(|keys| keys.join("/"))
                .unwrap_or_default();
            lines.push(format!("  {keys:<14} {}", descriptor.name));
        }
        lines.push(String::new());
    }
    lines.push("Mouse: click to select, double-click to enter, drag to move".to_owned());
    lines.push("Press Esc or ? to close".to_owned());
    lines
}
