//! Sign-in screen

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use tracing::{error, info};

use crate::tui::app::{AppCtx, Route, ScreenAction};
use crate::tui::components::{Form, FormField, Rule, Toast, Toasts};
use crate::tui::screens::TabsScreen;
use crate::tui::ui::{centered_rect, Styles};

pub struct LoginScreen {
    form: Form,
    submitting: bool,
}

impl LoginScreen {
    pub fn new() -> Self {
        Self {
            form: Form::new(vec![
                FormField::text("Correo")
                    .with_placeholder("correo@ejemplo.mx")
                    .with_rules(vec![Rule::Required, Rule::Email]),
                FormField::password("Contraseña").with_rules(vec![Rule::Required]),
            ]),
            submitting: false,
        }
    }

    pub async fn refresh(&mut self, _ctx: &AppCtx, _toasts: &mut Toasts) -> Result<()> {
        Ok(())
    }

    pub async fn handle_key(
        &mut self,
        key: KeyEvent,
        ctx: &AppCtx,
        toasts: &mut Toasts,
    ) -> Result<ScreenAction> {
        if self.form.handle_edit_key(key) {
            return Ok(ScreenAction::None);
        }
        match key.code {
            KeyCode::Tab | KeyCode::Down => self.form.next_field(),
            KeyCode::BackTab | KeyCode::Up => self.form.previous_field(),
            KeyCode::Enter => return self.submit(ctx, toasts).await,
            KeyCode::Esc => return Ok(ScreenAction::Quit),
            _ => {}
        }
        Ok(ScreenAction::None)
    }

    async fn submit(&mut self, ctx: &AppCtx, toasts: &mut Toasts) -> Result<ScreenAction> {
        if self.submitting || !self.form.validate_all() {
            return Ok(ScreenAction::None);
        }

        self.submitting = true;
        let email = self.form.field(0).text_value().to_string();
        let password = self.form.field(1).text_value().to_string();
        let result = ctx.auth.sign_in(&email, &password).await;
        self.submitting = false;

        match result {
            Ok(session) => {
                info!(
                    "Sesión iniciada para {}",
                    session.email.as_deref().unwrap_or("usuario")
                );
                Ok(ScreenAction::Replace(Box::new(Route::Workspace(
                    TabsScreen::new(ctx.rows_per_page),
                ))))
            }
            Err(e) => {
                error!("Login error: {e}");
                toasts.show(Toast::error("No se pudo iniciar sesión."));
                Ok(ScreenAction::None)
            }
        }
    }

    pub fn draw(&mut self, f: &mut Frame, area: Rect) {
        let popup = centered_rect(60, 60, area);
        let block = Block::default()
            .title("gestor - Iniciar Sesión")
            .borders(Borders::ALL)
            .border_style(Styles::active_border());
        let inner = block.inner(popup);
        f.render_widget(block, popup);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(7), Constraint::Length(1)])
            .split(inner);
        self.form.render(f, chunks[0]);

        let footer = if self.submitting {
            "Entrando..."
        } else {
            "Enter para entrar"
        };
        f.render_widget(
            Paragraph::new(footer)
                .style(Styles::inactive())
                .alignment(Alignment::Center),
            chunks[1],
        );
    }

    pub fn hint(&self) -> String {
        "Tab: siguiente campo | Enter: entrar | Esc: salir".to_string()
    }
}
