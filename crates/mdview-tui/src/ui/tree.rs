//! Tree pane rendering and mouse hit testing.
//!
//! Renders the flattened [`TreeRow`]s of the session as a scrollable list:
//! folders get an expand marker, markdown files are highlighted, and the
//! current drop target, the drag source and the entry marked for a move
//! are flagged.

use std::path::Path;

use mdview_core::TreeRow;
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};

/// Data needed to render the tree pane.
pub struct TreeProps<'a> {
    pub rows: &'a [TreeRow],
    pub selected: usize,
    pub title: String,
    /// Columns per nesting level.
    pub indent: u16,
    pub drop_target: Option<&'a Path>,
    pub drag_source: Option<&'a Path>,
    pub marked: Option<&'a Path>,
    pub open_file: Option<&'a Path>,
}

/// What a mouse position inside the tree pane points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hit {
    /// Index into the rows.
    Row(usize),
    /// Inside the pane but below the last row.
    Background,
}

fn tree_block(title: String) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .title(title)
        .border_style(Style::default().fg(Color::Blue))
}

/// Computes the visible window `(start, end)` for a list of `total` items
/// so that `selected` is always in view within `max_visible` lines.
pub fn visible_window(selected: usize, total: usize, max_visible: usize) -> (usize, usize) {
    if total <= max_visible {
        return (0, total);
    }
    let half = max_visible / 2;
    let start = if selected <= half {
        0
    } else if selected + half >= total {
        total.saturating_sub(max_visible)
    } else {
        selected - half
    };
    let end = (start + max_visible).min(total);
    (start, end)
}

/// Maps a terminal cell to the row drawn there by [`render_tree`].
pub fn hit_test(
    area: Rect,
    selected: usize,
    total: usize,
    column: u16,
    row: u16,
) -> Option<Hit> {
    let inner = tree_block(String::new()).inner(area);
    let inside = column >= inner.x
        && column < inner.x + inner.width
        && row >= inner.y
        && row < inner.y + inner.height;
    if !inside {
        return None;
    }
    let (start, end) = visible_window(selected, total, inner.height as usize);
    let index = start + (row - inner.y) as usize;
    if index < end {
        Some(Hit::Row(index))
    } else {
        Some(Hit::Background)
    }
}

/// Renders the tree pane; the selected item is reversed.
pub fn render_tree(f: &mut Frame, area: Rect, props: &TreeProps<'_>) {
    let background_target = props.drop_target.is_some()
        && props
            .rows
            .iter()
            .all(|row| Some(row.entry.path()) != props.drop_target);
    let border = if background_target {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(Color::Blue)
    };
    let block = tree_block(format!(" {} ", props.title)).border_style(border);
    let inner = block.inner(area);

    if props.rows.is_empty() {
        let empty = Paragraph::new(Line::from(Span::styled(
            "(empty)",
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        )))
        .block(block);
        f.render_widget(empty, area);
        return;
    }

    let (start, end) = visible_window(props.selected, props.rows.len(), inner.height as usize);
    let items: Vec<ListItem> = props.rows[start..end]
        .iter()
        .map(|row| ListItem::new(row_line(row, props)))
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));

    let mut state = ListState::default();
    state.select(Some(props.selected.saturating_sub(start)));
    f.render_stateful_widget(list, area, &mut state);
}

/// One rendered tree line: indentation, expand marker and the name.
pub fn row_line(row: &TreeRow, props: &TreeProps<'_>) -> Line<'static> {
    let path = row.entry.path();
    let indent = " ".repeat(row.depth * props.indent as usize);
    let marker = if !row.entry.is_dir() {
        "  "
    } else if row.loading {
        "\u{2026} "
    } else if row.expanded {
        "\u{25be} "
    } else {
        "\u{25b8} "
    };

    let mut style = entry_style(row);
    if props.open_file == Some(path) {
        style = style.add_modifier(Modifier::UNDERLINED);
    }
    if props.drag_source == Some(path) {
        style = style.add_modifier(Modifier::DIM);
    }
    if props.drop_target == Some(path) {
        style = style.bg(Color::Yellow).fg(Color::Black);
    }

    let mut spans = vec![
        Span::raw(indent),
        Span::styled(marker, Style::default().fg(Color::DarkGray)),
        Span::styled(row.entry.name().to_string(), style),
    ];
    if props.marked == Some(path) {
        spans.push(Span::styled(
            " [move]",
            Style::default()
                .fg(Color::Magenta)
                .add_modifier(Modifier::ITALIC),
        ));
    }
    Line::from(spans)
}

fn entry_style(row: &TreeRow) -> Style {
    if row.entry.is_dir() {
        Style::default()
            .fg(Color::Blue)
            .add_modifier(Modifier::BOLD)
    } else if row.entry.is_hidden() {
        Style::default().fg(Color::DarkGray)
    } else if row.entry.is_markdown() {
        Style::default().fg(Color::White)
    } else {
        Style::default().fg(Color::Gray)
    }
}
