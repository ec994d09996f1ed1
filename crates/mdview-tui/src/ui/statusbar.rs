//! Status bar rendering.
//!
//! The status bar occupies a single row at the bottom of the terminal and
//! shows the cursor position, the selected entry, the view filter flags,
//! an ongoing drag or pending move, and an optional status message.

use std::path::Path;

use mdview_core::{Entry, ViewFilter};
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

const BG: Color = Color::DarkGray;

/// Data needed to render the status bar.
pub struct StatusBarProps<'a> {
    pub row_count: usize,
    pub selected_index: usize,
    pub selected_entry: Option<&'a Entry>,
    pub filter: ViewFilter,
    /// Entry marked for "move here".
    pub marked: Option<&'a Path>,
    /// Source and current drop target of a drag in progress.
    pub dragging: Option<(&'a Path, Option<&'a Path>)>,
    pub status_message: Option<&'a str>,
}

/// Renders the bottom status bar.
pub fn render_statusbar(f: &mut Frame, area: Rect, props: &StatusBarProps<'_>) {
    let bar = Paragraph::new(status_line(props)).style(Style::default().bg(BG));
    f.render_widget(bar, area);
}

pub fn status_line(props: &StatusBarProps<'_>) -> Line<'static> {
    let position = if props.row_count > 0 {
        format!(" {}/{}", props.selected_index + 1, props.row_count)
    } else {
        " 0/0".to_owned()
    };

    let entry_info = props
        .selected_entry
        .map(|e| {
            if e.is_dir() {
                format!("  [DIR] {}", e.name())
            } else {
                format!("  {}", e.name())
            }
        })
        .unwrap_or_default();

    let mut flags = String::new();
    if props.filter.show_hidden {
        flags.push_str(" [H]");
    }
    if props.filter.markdown_only {
        flags.push_str(" [MD]");
    }

    let mut spans = vec![
        Span::styled(
            position,
            Style::default()
                .fg(Color::White)
                .bg(BG)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(entry_info, Style::default().fg(Color::White).bg(BG)),
        Span::styled(
            flags,
            Style::default()
                .fg(Color::Yellow)
                .bg(BG)
                .add_modifier(Modifier::BOLD),
        ),
    ];

    if let Some((source, target)) = props.dragging {
        let target = target
            .map(display_name)
            .unwrap_or_else(|| "-".to_string());
        spans.push(Span::styled(
            format!("  drag {} \u{2192} {target}", display_name(source)),
            Style::default().fg(Color::Cyan).bg(BG),
        ));
    } else if let Some(marked) = props.marked {
        spans.push(Span::styled(
            format!("  move: {}", display_name(marked)),
            Style::default().fg(Color::Magenta).bg(BG),
        ));
    }

    if let Some(msg) = props.status_message {
        spans.push(Span::styled(
            format!("  {msg}"),
            Style::default()
                .fg(Color::LightYellow)
                .bg(BG)
                .add_modifier(Modifier::ITALIC),
        ));
    }

    Line::from(spans)
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn props<'a>(entry: Option<&'a Entry>) -> StatusBarProps<'a> {
        StatusBarProps {
            row_count: 3,
            selected_index: 1,
            selected_entry: entry,
            filter: ViewFilter::default(),
            marked: None,
            dragging: None,
            status_message: None,
        }
    }

    fn text(line: &Line<'_>) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn shows_position_and_entry() {
        let entry = Entry::new(PathBuf::from("/proj/docs"), true);
        assert_eq!(text(&status_line(&props(Some(&entry)))), " 2/3  [DIR] docs");
    }

    #[test]
    fn empty_tree_position() {
        let mut props = props(None);
        props.row_count = 0;
        props.selected_index = 0;
        assert_eq!(text(&status_line(&props)), " 0/0");
    }

    #[test]
    fn filter_flags() {
        let mut props = props(None);
        props.filter = ViewFilter {
            show_hidden: true,
            markdown_only: true,
        };
        assert!(text(&status_line(&props)).contains("[H] [MD]"));
    }

    #[test]
    fn drag_wins_over_marked_move() {
        let mut props = props(None);
        props.marked = Some(Path::new("/proj/a.md"));
        props.dragging = Some((Path::new("/proj/b.md"), Some(Path::new("/proj/docs"))));
        let line = text(&status_line(&props));
        assert!(line.contains("drag b.md \u{2192} docs"));
        assert!(!line.contains("move:"));

        props.dragging = None;
        assert!(text(&status_line(&props)).contains("move: a.md"));
    }

    #[test]
    fn status_message_is_appended() {
        let mut props = props(None);
        props.status_message = Some("move failed: collision");
        assert!(text(&status_line(&props)).ends_with("move failed: collision"));
    }
}
