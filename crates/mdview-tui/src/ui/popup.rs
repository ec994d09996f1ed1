use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::Line,
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph},
    Frame,
};

/// Renders a centered popup dialog with the given title and message lines.
pub fn render_popup(f: &mut Frame, title: &str, lines: &[String]) {
    let area = centered_rect(50, 40, f.area());

    f.render_widget(Clear, area);

    let content: Vec<Line> = lines.iter().map(|l| Line::from(l.as_str())).collect();

    let popup = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::ALL)
            .title(title.to_owned())
            .border_style(Style::default().fg(Color::Cyan)),
    );

    f.render_widget(popup, area);
}

/// Renders a small menu with its top-left corner at `(x, y)`, moved inside
/// the screen if it would overflow.
pub fn render_menu(f: &mut Frame, x: u16, y: u16, items: &[&str], selected: usize) {
    let area = menu_rect(x, y, items, f.area());
    f.render_widget(Clear, area);

    let list = List::new(items.iter().map(|item| ListItem::new(*item)).collect::<Vec<_>>())
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan)),
        )
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));

    let mut state = ListState::default();
    state.select(Some(selected));
    f.render_stateful_widget(list, area, &mut state);
}

fn menu_rect(x: u16, y: u16, items: &[&str], screen: Rect) -> Rect {
    let longest = items.iter().map(|i| i.chars().count()).max().unwrap_or(0) as u16;
    let width = (longest + 2).min(screen.width);
    let height = (items.len() as u16 + 2).min(screen.height);
    let x = x.min(screen.x + screen.width - width);
    let y = y.min(screen.y + screen.height - height);
    Rect::new(x, y, width, height)
}

/// Calculates a centered rectangle of the given percentage size within the parent area.
fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}
