use std::path::Path;

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

/// Renders the current directory as a trail below the root, with
/// back/forward arrows that light up when history allows them.
/// Example: " ◀ ▶  notes / docs / api"
pub fn render_breadcrumb(
    f: &mut Frame,
    area: Rect,
    root: &Path,
    current_dir: &Path,
    can_go_back: bool,
    can_go_forward: bool,
) {
    let line = Line::from(breadcrumb_spans(root, current_dir, can_go_back, can_go_forward));
    let breadcrumb = Paragraph::new(line).style(Style::default().bg(Color::Black));
    f.render_widget(breadcrumb, area);
}

pub fn breadcrumb_spans(
    root: &Path,
    current_dir: &Path,
    can_go_back: bool,
    can_go_forward: bool,
) -> Vec<Span<'static>> {
    let arrow = |enabled: bool, glyph: &'static str| {
        let fg = if enabled { Color::White } else { Color::DarkGray };
        Span::styled(glyph, Style::default().fg(fg))
    };
    let sep = Style::default().fg(Color::DarkGray);
    let comp = Style::default().fg(Color::Gray);

    let root_name = root
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| root.display().to_string());

    let mut parts = vec![
        Span::raw(" "),
        arrow(can_go_back, "\u{25c0}"),
        Span::raw(" "),
        arrow(can_go_forward, "\u{25b6}"),
        Span::raw("  "),
        Span::styled(
            root_name,
            Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
        ),
    ];

    if let Ok(below) = current_dir.strip_prefix(root) {
        for component in below.components() {
            parts.push(Span::styled(" / ", sep));
            parts.push(Span::styled(
                component.as_os_str().to_string_lossy().into_owned(),
                comp,
            ));
        }
    }
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(spans: &[Span<'_>]) -> String {
        spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn trail_is_relative_to_root() {
        let spans = breadcrumb_spans(
            Path::new("/home/me/notes"),
            Path::new("/home/me/notes/docs/api"),
            false,
            false,
        );
        assert_eq!(text(&spans), " \u{25c0} \u{25b6}  notes / docs / api");
    }

    #[test]
    fn root_alone() {
        let spans = breadcrumb_spans(Path::new("/notes"), Path::new("/notes"), false, false);
        assert!(text(&spans).ends_with("notes"));
    }

    #[test]
    fn arrows_reflect_history() {
        let spans = breadcrumb_spans(Path::new("/notes"), Path::new("/notes"), true, false);
        assert_eq!(spans[1].style.fg, Some(Color::White));
        assert_eq!(spans[3].style.fg, Some(Color::DarkGray));
    }
}
