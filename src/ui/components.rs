//! Small layout and text helpers shared by the draw functions

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::Span,
};

/// Rect of `percent_x` by `percent_y` centered in `r`
pub fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

/// Rect of fixed height, `percent_x` wide, vertically centered
pub fn centered_line_rect(percent_x: u16, height: u16, r: Rect) -> Rect {
    let height = height.min(r.height);
    let top = r.y + (r.height - height) / 2;
    let width = (r.width as u32 * percent_x as u32 / 100) as u16;
    let left = r.x + (r.width - width) / 2;
    Rect::new(left, top, width, height)
}

/// `key` in the hint color followed by `label` in the dim color, e.g. `g generate`
pub fn key_hint<'a>(key: &'a str, label: &'a str, key_color: Color, label_color: Color) -> Vec<Span<'a>> {
    vec![
        Span::styled(key, Style::default().fg(key_color)),
        Span::styled(format!(" {} ", label), Style::default().fg(label_color)),
    ]
}
