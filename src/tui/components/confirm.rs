//! Blocking confirmation dialog shown before destructive persistence.

use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::tui::ui::{centered_rect, Styles};

/// A two-option prompt: Esc cancels (no-op), Enter proceeds.
#[derive(Debug, Clone)]
pub struct ConfirmDialog {
    pub title: String,
    pub message: String,
}

impl ConfirmDialog {
    pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
        }
    }

    /// Standard prompt for irreversible deletes.
    pub fn delete(subject: &str) -> Self {
        Self::new(
            format!("¿Estás seguro de borrar {subject}?"),
            "Esta acción no se puede deshacer.",
        )
    }

    pub fn render(&self, f: &mut Frame, area: Rect) {
        let popup = centered_rect(60, 25, area);
        f.render_widget(Clear, popup);

        let lines = vec![
            Line::from(""),
            Line::from(self.message.clone()),
            Line::from(""),
            Line::from(vec![
                Span::styled("[Esc] Cancelar", Styles::inactive()),
                Span::raw("   "),
                Span::styled("[Enter] Confirmar", Styles::destructive()),
            ]),
        ];

        let dialog = Paragraph::new(lines)
            .wrap(Wrap { trim: true })
            .block(
                Block::default()
                    .title(self.title.clone())
                    .borders(Borders::ALL)
                    .border_style(Styles::destructive()),
            );
        f.render_widget(dialog, popup);
    }
}
