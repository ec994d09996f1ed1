//! Markdown rendering for the preview panel.
//!
//! Converts markdown text to styled ratatui [`Line`]s using `pulldown-cmark`.
//! Fenced code blocks are highlighted through [`super::highlight`].

use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
};

use super::highlight::highlight_lines;

/// A code block being collected until its end tag.
struct CodeBlock {
    lang: String,
    body: String,
}

/// Renders markdown text as styled ratatui lines.
pub fn render_markdown(text: &str, syntax_theme: &str) -> Vec<Line<'static>> {
    let parser = Parser::new_ext(text, Options::all());

    let mut lines: Vec<Line<'static>> = Vec::new();
    let mut current_spans: Vec<Span<'static>> = Vec::new();
    let mut style_stack: Vec<Style> = vec![Style::default()];
    let mut code_block: Option<CodeBlock> = None;
    let mut quote_depth: usize = 0;
    // One entry per open list: the next number for ordered lists.
    let mut lists: Vec<Option<u64>> = Vec::new();
    let mut link_targets: Vec<String> = Vec::new();

    for event in parser {
        match event {
            Event::Start(tag) => match tag {
                Tag::Heading { level, .. } => {
                    flush_line(&mut lines, &mut current_spans, quote_depth);
                    if level >= HeadingLevel::H3 {
                        current_spans.push(Span::styled(
                            format!("{} ", "#".repeat(level as usize)),
                            Style::default().fg(Color::DarkGray),
                        ));
                    }
                    style_stack.push(heading_style(level));
                }
                Tag::Emphasis => {
                    let base = current_style(&style_stack);
                    style_stack.push(base.add_modifier(Modifier::ITALIC));
                }
                Tag::Strong => {
                    let base = current_style(&style_stack);
                    style_stack.push(base.add_modifier(Modifier::BOLD));
                }
                Tag::Strikethrough => {
                    let base = current_style(&style_stack);
                    style_stack.push(base.add_modifier(Modifier::CROSSED_OUT));
                }
                Tag::Link { dest_url, .. } => {
                    link_targets.push(dest_url.to_string());
                    style_stack.push(
                        Style::default()
                            .fg(Color::Cyan)
                            .add_modifier(Modifier::UNDERLINED),
                    );
                }
                Tag::Image { dest_url, .. } => {
                    link_targets.push(dest_url.to_string());
                    current_spans.push(Span::styled(
                        "[image: ".to_string(),
                        Style::default().fg(Color::Magenta),
                    ));
                    style_stack.push(Style::default().fg(Color::Magenta));
                }
                Tag::CodeBlock(kind) => {
                    flush_line(&mut lines, &mut current_spans, quote_depth);
                    let lang = match kind {
                        CodeBlockKind::Fenced(info) => {
                            info.split_whitespace().next().unwrap_or_default().to_string()
                        }
                        CodeBlockKind::Indented => String::new(),
                    };
                    code_block = Some(CodeBlock {
                        lang,
                        body: String::new(),
                    });
                }
                Tag::BlockQuote(_) => {
                    flush_line(&mut lines, &mut current_spans, quote_depth);
                    quote_depth += 1;
                }
                Tag::List(start) => {
                    flush_line(&mut lines, &mut current_spans, quote_depth);
                    lists.push(start);
                }
                Tag::Item => {
                    let indent = "  ".repeat(lists.len().saturating_sub(1));
                    let marker = match lists.last_mut() {
                        Some(Some(n)) => {
                            let marker = format!("{n}. ");
                            *n += 1;
                            marker
                        }
                        _ => "\u{2022} ".to_string(),
                    };
                    current_spans.push(Span::raw(format!("{indent}{marker}")));
                }
                Tag::TableCell => {
                    if !current_spans.is_empty() {
                        current_spans.push(Span::styled(
                            " \u{2502} ".to_string(),
                            Style::default().fg(Color::DarkGray),
                        ));
                    }
                }
                Tag::TableHead => {
                    style_stack.push(Style::default().add_modifier(Modifier::BOLD));
                }
                _ => {}
            },
            Event::End(tag_end) => match tag_end {
                TagEnd::Heading(_) => {
                    style_stack.pop();
                    flush_line(&mut lines, &mut current_spans, quote_depth);
                    lines.push(Line::from(""));
                }
                TagEnd::Emphasis | TagEnd::Strong | TagEnd::Strikethrough => {
                    style_stack.pop();
                }
                TagEnd::Link => {
                    style_stack.pop();
                    if let Some(url) = link_targets.pop() {
                        current_spans.push(Span::styled(
                            format!(" <{url}>"),
                            Style::default().fg(Color::DarkGray),
                        ));
                    }
                }
                TagEnd::Image => {
                    style_stack.pop();
                    link_targets.pop();
                    current_spans.push(Span::styled(
                        "]".to_string(),
                        Style::default().fg(Color::Magenta),
                    ));
                }
                TagEnd::CodeBlock => {
                    if let Some(block) = code_block.take() {
                        push_code_block(&mut lines, &block, syntax_theme);
                    }
                    lines.push(Line::from(""));
                }
                TagEnd::BlockQuote(_) => {
                    flush_line(&mut lines, &mut current_spans, quote_depth);
                    quote_depth = quote_depth.saturating_sub(1);
                }
                TagEnd::List(_) => {
                    lists.pop();
                    if lists.is_empty() {
                        lines.push(Line::from(""));
                    }
                }
                TagEnd::Item | TagEnd::TableRow => {
                    flush_line(&mut lines, &mut current_spans, quote_depth);
                }
                TagEnd::TableHead => {
                    style_stack.pop();
                    flush_line(&mut lines, &mut current_spans, quote_depth);
                    lines.push(rule_line(24));
                }
                TagEnd::Table => {
                    lines.push(Line::from(""));
                }
                TagEnd::Paragraph => {
                    flush_line(&mut lines, &mut current_spans, quote_depth);
                    if lists.is_empty() {
                        lines.push(Line::from(""));
                    }
                }
                _ => {}
            },
            Event::Text(text) => match code_block.as_mut() {
                Some(block) => block.body.push_str(&text),
                None => {
                    let style = if quote_depth > 0 {
                        current_style(&style_stack).fg(Color::DarkGray)
                    } else {
                        current_style(&style_stack)
                    };
                    current_spans.push(Span::styled(text.to_string(), style));
                }
            },
            Event::Code(code) => {
                current_spans.push(Span::styled(
                    code.to_string(),
                    Style::default().fg(Color::White).bg(Color::DarkGray),
                ));
            }
            Event::TaskListMarker(done) => {
                let marker = if done { "[x] " } else { "[ ] " };
                current_spans.push(Span::styled(
                    marker.to_string(),
                    Style::default().fg(Color::Yellow),
                ));
            }
            Event::SoftBreak => {
                current_spans.push(Span::raw(" "));
            }
            Event::HardBreak => {
                flush_line(&mut lines, &mut current_spans, quote_depth);
            }
            Event::Rule => {
                flush_line(&mut lines, &mut current_spans, quote_depth);
                lines.push(rule_line(40));
            }
            _ => {}
        }
    }

    flush_line(&mut lines, &mut current_spans, quote_depth);
    while lines.last().is_some_and(|l| l.width() == 0) {
        lines.pop();
    }
    lines
}

fn push_code_block(lines: &mut Vec<Line<'static>>, block: &CodeBlock, syntax_theme: &str) {
    let body: Vec<&str> = block.body.lines().collect();
    let highlighted = if block.lang.is_empty() {
        body.iter()
            .map(|line| {
                vec![Span::styled(
                    line.to_string(),
                    Style::default().fg(Color::White),
                )]
            })
            .collect()
    } else {
        highlight_lines(&block.lang, &body, syntax_theme)
    };

    let gutter = Style::default().fg(Color::DarkGray);
    for spans in highlighted {
        let mut line = vec![Span::styled("\u{2503} ".to_string(), gutter)];
        line.extend(spans);
        lines.push(Line::from(line));
    }
}

fn rule_line(width: usize) -> Line<'static> {
    Line::from(Span::styled(
        "\u{2500}".repeat(width),
        Style::default().fg(Color::DarkGray),
    ))
}

fn current_style(stack: &[Style]) -> Style {
    stack.last().copied().unwrap_or_default()
}

fn heading_style(level: HeadingLevel) -> Style {
    match level {
        HeadingLevel::H1 => Style::default()
            .fg(Color::Blue)
            .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
        HeadingLevel::H2 => Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
        _ => Style::default()
            .fg(Color::White)
            .add_modifier(Modifier::BOLD),
    }
}

/// Ends the current line, prefixing one quote bar per open block quote.
fn flush_line(lines: &mut Vec<Line<'static>>, spans: &mut Vec<Span<'static>>, quote_depth: usize) {
    if spans.is_empty() {
        return;
    }
    let mut line = Vec::with_capacity(spans.len() + 1);
    if quote_depth > 0 {
        line.push(Span::styled(
            "\u{2502} ".repeat(quote_depth),
            Style::default().fg(Color::DarkGray),
        ));
    }
    line.append(spans);
    lines.push(Line::from(line));
}
