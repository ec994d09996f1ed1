//! Preview panel for the open file.
//!
//! Markdown files are rendered through [`super::markdown`]; other text is
//! shown as source with line numbers, syntax-highlighted by extension.

use std::path::Path;

use mdview_core::config::settings::PreviewConfig;
use mdview_core::is_markdown_name;
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::app::Document;
use crate::ui::highlight::highlight_lines;
use crate::ui::markdown::render_markdown;

/// Renders the preview panel, scrolled down by `scroll` lines.
pub fn render_preview(
    f: &mut Frame,
    area: Rect,
    document: Option<&Document>,
    scroll: u16,
    config: &PreviewConfig,
) {
    let title = document
        .and_then(|doc| doc.path.file_name())
        .map(|n| format!(" {} ", n.to_string_lossy()))
        .unwrap_or_else(|| " Preview ".to_string());

    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .border_style(Style::default().fg(Color::DarkGray));

    let content = match document {
        Some(doc) => preview_lines(doc, config),
        None => vec![Line::from(Span::styled(
            "No file open",
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        ))],
    };

    f.render_widget(Clear, area);
    let paragraph = Paragraph::new(content)
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((scroll, 0));
    f.render_widget(paragraph, area);
}

/// Styled lines for `doc`.
pub fn preview_lines(doc: &Document, config: &PreviewConfig) -> Vec<Line<'static>> {
    let name = doc
        .path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    if config.render_markdown && is_markdown_name(&name) {
        render_markdown(&doc.content, &config.syntax_theme)
    } else {
        source_lines(&doc.path, &doc.content, &config.syntax_theme)
    }
}

fn source_lines(path: &Path, content: &str, syntax_theme: &str) -> Vec<Line<'static>> {
    let lines: Vec<&str> = content.lines().collect();
    let token = path
        .extension()
        .map(|ext| ext.to_string_lossy().into_owned())
        .unwrap_or_default();
    let highlighted = highlight_lines(&token, &lines, syntax_theme);

    let width = lines.len().to_string().len().max(3);
    let number_style = Style::default().fg(Color::DarkGray);
    highlighted
        .into_iter()
        .enumerate()
        .map(|(i, spans)| {
            let mut all = vec![Span::styled(
                format!("{:>width$} ", i + 1),
                number_style,
            )];
            all.extend(spans);
            Line::from(all)
        })
        .collect()
}
