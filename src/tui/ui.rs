//! Common UI styles and layout utilities

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
};
use serde_json::Value;
use unicode_width::UnicodeWidthStr;

/// Common UI styles
pub struct Styles;

impl Styles {
    pub fn default() -> Style {
        Style::default()
    }

    pub fn selected() -> Style {
        Style::default()
            .bg(Color::Blue)
            .fg(Color::White)
            .add_modifier(Modifier::BOLD)
    }

    pub fn title() -> Style {
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD)
    }

    pub fn header() -> Style {
        Style::default()
            .fg(Color::White)
            .bg(Color::Blue)
            .add_modifier(Modifier::BOLD)
    }

    pub fn error() -> Style {
        Style::default().fg(Color::Red)
    }

    pub fn success() -> Style {
        Style::default().fg(Color::Green)
    }

    pub fn info() -> Style {
        Style::default().fg(Color::Cyan)
    }

    pub fn inactive() -> Style {
        Style::default().fg(Color::Gray)
    }

    pub fn destructive() -> Style {
        Style::default().fg(Color::Red)
    }

    pub fn active_border() -> Style {
        Style::default().fg(Color::Yellow)
    }

    pub fn inactive_border() -> Style {
        Style::default().fg(Color::Gray)
    }
}

/// Center a rectangle within another rectangle
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

/// Text form of a row cell value. Strings render as-is, scalars through
/// their JSON form, nested records and lists as nothing (screens that
/// need them format them explicitly).
pub fn cell_text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

/// Date prefix of a backend timestamp cell (`2024-04-13T…` -> `2024-04-13`).
pub fn cell_date(value: Option<&Value>) -> String {
    let text = cell_text(value);
    text.chars().take(10).collect()
}

/// Truncate to a display width, appending `…` when something was cut.
pub fn truncate(text: &str, max_width: usize) -> String {
    if text.width() <= max_width {
        return text.to_string();
    }
    let mut out = String::new();
    for c in text.chars() {
        if out.width() + 1 >= max_width {
            break;
        }
        out.push(c);
    }
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_cell_text_renders_scalars_only() {
        assert_eq!(cell_text(Some(&json!("Ana"))), "Ana");
        assert_eq!(cell_text(Some(&json!(7))), "7");
        assert_eq!(cell_text(Some(&json!({ "id": 1 }))), "");
        assert_eq!(cell_text(None), "");
    }

    #[test]
    fn test_cell_date_takes_the_date_prefix() {
        assert_eq!(
            cell_date(Some(&json!("2024-04-13T20:11:00+00:00"))),
            "2024-04-13"
        );
        assert_eq!(cell_date(None), "");
    }

    #[test]
    fn test_truncate_appends_ellipsis() {
        assert_eq!(truncate("Pistón Festo", 8), "Pistón …");
        assert_eq!(truncate("corto", 8), "corto");
    }
}
