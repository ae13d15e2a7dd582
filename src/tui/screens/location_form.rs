//! New-location form, bound to the client it came from

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

pub struct LocationFormScreen {
    client_id: i64,
    client_name: Option<String>,
    form: Form,
    submitting: bool,
}

impl LocationFormScreen {
    pub fn new(client_id: i64) -> Self {
        Self {
            client_id,
            client_name: None,
            form: Form::new(vec![
                FormField::text("Dirección").with_rules(vec![Rule::Required]),
                FormField::text("Código Postal")
                    .with_rules(vec![Rule::Required, Rule::MinLen(3), Rule::MaxLen(12)]),
                FormField::text("Notas").with_placeholder("Opcional"),
            ]),
            submitting: false,
        }
    }

    pub async fn refresh(&mut self, ctx: &AppCtx, toasts: &mut Toasts) -> Result<()> {
        match operations::load_client_with_locations(ctx.api.as_ref(), self.client_id).await {
            Ok(client) => self.client_name = Some(client.full_name()),
            Err(e) => {
                error!("Error cargando cliente: {e}");
                toasts.show(Toast::error("No se pudo cargar el cliente."));
            }
        }
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
        if self.submitting || !self.form.validate_all() {
            return Ok(ScreenAction::None);
        }

        self.submitting = true;
        let notes = self.form.field(2).text_value().to_string();
        let result = operations::create_location(
            ctx.api.as_ref(),
            self.client_id,
            self.form.field(0).text_value(),
            self.form.field(1).text_value(),
            if notes.is_empty() { None } else { Some(&notes) },
        )
        .await;
        self.submitting = false;

        match result {
            Ok(()) => {
                toasts.show(Toast::success("La ubicación se ha creado."));
                self.form.clear();
                Ok(ScreenAction::Pop)
            }
            Err(e) => {
                error!("Locations error: {e}");
                toasts.show(Toast::error("No se pudo crear la ubicación."));
                Ok(ScreenAction::None)
            }
        }
    }

    pub fn draw(&mut self, f: &mut Frame, area: Rect) {
        let title = match &self.client_name {
            Some(name) => format!("Nueva Ubicación - {name}"),
            None => "Nueva Ubicación".to_string(),
        };
        let block = Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(Styles::inactive_border());
        let inner = block.inner(area);
        f.render_widget(block, area);
        self.form.render(f, inner);
    }

    pub fn hint(&self) -> String {
        "Enter: crear ubicación | Tab: siguiente campo | Esc: cancelar".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock::MemoryApi;
    use crate::tui::screens::test_ctx;
    use serde_json::json;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_short_postal_code_blocks_the_insert() {
        let api = Arc::new(MemoryApi::new());
        let ctx = test_ctx(api.clone());
        let mut toasts = Toasts::new();
        let mut screen = LocationFormScreen::new(3);

        screen.form.field_mut(0).set_value("Av. Juárez 12");
        screen.form.field_mut(1).set_value("06");
        let action = screen.submit(&ctx, &mut toasts).await.unwrap();

        assert!(matches!(action, ScreenAction::None));
        assert!(!api.calls().iter().any(|c| c == "insert locations"));
    }

    #[tokio::test]
    async fn test_empty_notes_are_stored_as_null() {
        let api = Arc::new(MemoryApi::new());
        api.seed(
            "clients",
            vec![json!({ "id": 3, "name": "Ana", "last_name": "Reyes" })],
        );
        let ctx = test_ctx(api.clone());
        let mut toasts = Toasts::new();
        let mut screen = LocationFormScreen::new(3);
        screen.refresh(&ctx, &mut toasts).await.unwrap();
        assert_eq!(screen.client_name.as_deref(), Some("Ana Reyes"));

        screen.form.field_mut(0).set_value("Av. Juárez 12");
        screen.form.field_mut(1).set_value("06000");
        let action = screen.submit(&ctx, &mut toasts).await.unwrap();

        assert!(matches!(action, ScreenAction::Pop));
        let rows = api.rows("locations");
        assert_eq!(rows[0]["client_id"], json!(3));
        assert_eq!(rows[0]["notes"], json!(null));
    }
}
