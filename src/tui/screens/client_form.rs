//! New-client form

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::Rect,
    widgets::{Block, Borders},
    Frame,
};
use tracing::error;

use crate::operations;
use crate::tui::app::{AppCtx, ScreenAction};
use crate::tui::components::{Form, FormField, Rule, Toast, Toasts};
use crate::tui::ui::Styles;

pub struct ClientFormScreen {
    form: Form,
    submitting: bool,
}

impl ClientFormScreen {
    pub fn new() -> Self {
        Self {
            form: Form::new(vec![
                FormField::text("Nombre(s)").with_rules(vec![Rule::Required]),
                FormField::text("Apellido(s)").with_rules(vec![Rule::Required]),
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
            KeyCode::Esc => return Ok(ScreenAction::Pop),
            _ => {}
        }
        Ok(ScreenAction::None)
    }

    async fn submit(&mut self, ctx: &AppCtx, toasts: &mut Toasts) -> Result<ScreenAction> {
        // Validation failure never reaches the network; the submit stays
        // available for the corrected retry.
        if self.submitting || !self.form.validate_all() {
            return Ok(ScreenAction::None);
        }

        self.submitting = true;
        let result = operations::create_client(
            ctx.api.as_ref(),
            self.form.field(0).text_value(),
            self.form.field(1).text_value(),
        )
        .await;
        self.submitting = false;

        match result {
            Ok(()) => {
                toasts.show(Toast::success("El cliente se ha creado."));
                self.form.clear();
                Ok(ScreenAction::Pop)
            }
            Err(e) => {
                error!("Client error: {e}");
                toasts.show(Toast::error("No se pudo crear el cliente."));
                Ok(ScreenAction::None)
            }
        }
    }

    pub fn draw(&mut self, f: &mut Frame, area: Rect) {
        let block = Block::default()
            .title("Nuevo Cliente")
            .borders(Borders::ALL)
            .border_style(Styles::inactive_border());
        let inner = block.inner(area);
        f.render_widget(block, area);
        self.form.render(f, inner);
    }

    pub fn hint(&self) -> String {
        "Enter: crear cliente | Tab: siguiente campo | Esc: cancelar".to_string()
    }
}
