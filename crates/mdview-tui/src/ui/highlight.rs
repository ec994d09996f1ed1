//! Syntax highlighting for source files and fenced code blocks via `syntect`.

use std::sync::OnceLock;

use ratatui::{
    style::{Color, Modifier, Style},
    text::Span,
};
use syntect::easy::HighlightLines;
use syntect::highlighting::{FontStyle, Theme, ThemeSet};
use syntect::parsing::{SyntaxReference, SyntaxSet};

const FALLBACK_THEME: &str = "base16-ocean.dark";

fn syntax_set() -> &'static SyntaxSet {
    static SS: OnceLock<SyntaxSet> = OnceLock::new();
    SS.get_or_init(SyntaxSet::load_defaults_nonewlines)
}

fn theme_set() -> &'static ThemeSet {
    static TS: OnceLock<ThemeSet> = OnceLock::new();
    TS.get_or_init(ThemeSet::load_defaults)
}

fn find_theme(name: &str) -> Option<&'static Theme> {
    let ts = theme_set();
    ts.themes
        .get(name)
        .or_else(|| ts.themes.get(FALLBACK_THEME))
}

/// Looks a syntax up by fence token (`rust`, `sh`) or file extension (`rs`).
fn find_syntax(token: &str) -> &'static SyntaxReference {
    let ss = syntax_set();
    ss.find_syntax_by_token(token)
        .or_else(|| ss.find_syntax_by_extension(token))
        .unwrap_or_else(|| ss.find_syntax_plain_text())
}

/// Highlights `lines`, one span list per input line.
///
/// Lines come back unstyled when the theme cannot be found or a line
/// fails to highlight.
pub fn highlight_lines(token: &str, lines: &[&str], theme_name: &str) -> Vec<Vec<Span<'static>>> {
    let Some(theme) = find_theme(theme_name) else {
        return plain(lines);
    };
    let ss = syntax_set();
    let mut highlighter = HighlightLines::new(find_syntax(token), theme);

    lines
        .iter()
        .map(|line| match highlighter.highlight_line(line, ss) {
            Ok(regions) => regions
                .into_iter()
                .map(|(style, text)| Span::styled(text.to_string(), convert(style)))
                .collect(),
            Err(e) => {
                tracing::debug!("highlighting failed: {e}");
                vec![Span::raw(line.to_string())]
            }
        })
        .collect()
}

fn plain(lines: &[&str]) -> Vec<Vec<Span<'static>>> {
    lines
        .iter()
        .map(|line| vec![Span::raw(line.to_string())])
        .collect()
}

// Foreground only; the terminal background shows through.
fn convert(style: syntect::highlighting::Style) -> Style {
    let fg = Color::Rgb(style.foreground.r, style.foreground.g, style.foreground.b);
    let mut modifier = Modifier::empty();
    if style.font_style.contains(FontStyle::BOLD) {
        modifier |= Modifier::BOLD;
    }
    if style.font_style.contains(FontStyle::ITALIC) {
        modifier |= Modifier::ITALIC;
    }
    if style.font_style.contains(FontStyle::UNDERLINE) {
        modifier |= Modifier::UNDERLINED;
    }
    Style::default().fg(fg).add_modifier(modifier)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(spans: &[Span<'_>]) -> String {
        spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn keeps_line_text() {
        let lines = highlight_lines("rs", &["fn main() {}", "let x = 1;"], FALLBACK_THEME);
        assert_eq!(lines.len(), 2);
        assert_eq!(text(&lines[0]), "fn main() {}");
        assert_eq!(text(&lines[1]), "let x = 1;");
    }

    #[test]
    fn colours_known_languages() {
        let lines = highlight_lines("rust", &["fn main() {}"], FALLBACK_THEME);
        assert!(lines[0].iter().any(|s| matches!(s.style.fg, Some(Color::Rgb(..)))));
    }

    #[test]
    fn unknown_token_and_theme_fall_back() {
        let lines = highlight_lines("no-such-lang", &["plain"], "no-such-theme");
        assert_eq!(text(&lines[0]), "plain");
    }
}
