//! Product create/edit form
//!
//! The edit mode preloads the current values and keeps the save path
//! behind the dirty gate: nothing is written while the form still equals
//! the loaded baseline.

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
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

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProductFormMode {
    Create,
    Edit(i64),
}

pub struct ProductFormScreen {
    mode: ProductFormMode,
    form: Form,
    baseline: Vec<String>,
    submitting: bool,
}

impl ProductFormScreen {
    pub fn new(mode: ProductFormMode) -> Self {
        let form = Form::new(vec![
            FormField::text("Nombre").with_rules(vec![Rule::Required]),
            FormField::text("Contenedor").with_rules(vec![Rule::Required]),
        ]);
        let baseline = form.snapshot();
        Self {
            mode,
            form,
            baseline,
            submitting: false,
        }
    }

    pub async fn refresh(&mut self, ctx: &AppCtx, toasts: &mut Toasts) -> Result<()> {
        if let ProductFormMode::Edit(id) = self.mode {
            match operations::load_product(ctx.api.as_ref(), id).await {
                Ok(product) => {
                    self.form.field_mut(0).set_value(&product.name);
                    self.form.field_mut(1).set_value(&product.container_key);
                    self.baseline = self.form.snapshot();
                }
                Err(e) => {
                    error!("Error cargando producto: {e}");
                    toasts.show(Toast::error("No se pudo cargar el producto."));
                }
            }
        }
        Ok(())
    }

    fn is_dirty(&self) -> bool {
        self.form.is_dirty(&self.baseline)
    }

    pub async fn handle_key(
        &mut self,
        key: KeyEvent,
        ctx: &AppCtx,
        toasts: &mut Toasts,
    ) -> Result<ScreenAction> {
        if key.code == KeyCode::Char('r') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.discard();
            return Ok(ScreenAction::None);
        }
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

    /// Restore the loaded baseline values.
    fn discard(&mut self) {
        let baseline = self.baseline.clone();
        for (i, value) in baseline.iter().enumerate() {
            self.form.field_mut(i).set_value(value);
        }
    }

    async fn submit(&mut self, ctx: &AppCtx, toasts: &mut Toasts) -> Result<ScreenAction> {
        if self.submitting {
            return Ok(ScreenAction::None);
        }
        // Save stays hidden until the values diverge from the baseline.
        if matches!(self.mode, ProductFormMode::Edit(_)) && !self.is_dirty() {
            return Ok(ScreenAction::None);
        }
        if !self.form.validate_all() {
            return Ok(ScreenAction::None);
        }

        self.submitting = true;
        let name = self.form.field(0).text_value().to_string();
        let container_key = self.form.field(1).text_value().to_string();
        let result = match self.mode {
            ProductFormMode::Create => {
                operations::create_product(ctx.api.as_ref(), &name, &container_key).await
            }
            ProductFormMode::Edit(id) => {
                operations::update_product(ctx.api.as_ref(), id, &name, &container_key).await
            }
        };
        self.submitting = false;

        match result {
            Ok(()) => {
                toasts.show(Toast::success(match self.mode {
                    ProductFormMode::Create => "El producto se ha creado.",
                    ProductFormMode::Edit(_) => "El producto se ha modificado.",
                }));
                self.form.clear();
                Ok(ScreenAction::Pop)
            }
            Err(e) => {
                error!("Product error: {e}");
                toasts.show(Toast::error(match self.mode {
                    ProductFormMode::Create => "No se pudo crear el producto.",
                    ProductFormMode::Edit(_) => "No se pudo modificar el producto.",
                }));
                Ok(ScreenAction::None)
            }
        }
    }

    pub fn draw(&mut self, f: &mut Frame, area: Rect) {
        let title = match self.mode {
            ProductFormMode::Create => "Nuevo Producto".to_string(),
            ProductFormMode::Edit(_) if self.is_dirty() => {
                "Producto (cambios sin guardar)".to_string()
            }
            ProductFormMode::Edit(_) => "Producto".to_string(),
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
        match self.mode {
            ProductFormMode::Create => {
                "Enter: crear producto | Tab: siguiente campo | Esc: cancelar".to_string()
            }
            ProductFormMode::Edit(_) if self.is_dirty() => {
                "Enter: guardar | Ctrl+R: descartar | Esc: volver".to_string()
            }
            ProductFormMode::Edit(_) => "Esc: volver".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock::MemoryApi;
    use crate::tui::screens::test_ctx;
    use serde_json::json;
    use std::sync::Arc;

    async fn edit_screen(api: &Arc<MemoryApi>) -> (ProductFormScreen, Toasts) {
        let ctx = test_ctx(api.clone());
        let mut toasts = Toasts::new();
        let mut screen = ProductFormScreen::new(ProductFormMode::Edit(4));
        screen.refresh(&ctx, &mut toasts).await.unwrap();
        (screen, toasts)
    }

    fn seeded_api() -> Arc<MemoryApi> {
        let api = Arc::new(MemoryApi::new());
        api.seed(
            "products",
            vec![json!({ "id": 4, "name": "Válvula", "container_key": "C-3" })],
        );
        api
    }

    #[tokio::test]
    async fn test_edit_preloads_the_current_values() {
        let api = seeded_api();
        let (screen, _) = edit_screen(&api).await;
        assert_eq!(screen.form.field(0).text_value(), "Válvula");
        assert_eq!(screen.form.field(1).text_value(), "C-3");
        assert!(!screen.is_dirty());
    }

    #[tokio::test]
    async fn test_clean_edit_never_writes() {
        let api = seeded_api();
        let (mut screen, mut toasts) = edit_screen(&api).await;
        let ctx = test_ctx(api.clone());

        let action = screen.submit(&ctx, &mut toasts).await.unwrap();
        assert!(matches!(action, ScreenAction::None));
        assert!(!api.calls().iter().any(|c| c == "update products"));
    }

    #[tokio::test]
    async fn test_dirty_edit_updates_and_discard_restores() {
        let api = seeded_api();
        let (mut screen, mut toasts) = edit_screen(&api).await;
        let ctx = test_ctx(api.clone());

        screen
            .form
            .handle_edit_key(KeyEvent::from(KeyCode::Char('s')));
        assert!(screen.is_dirty());

        screen.discard();
        assert!(!screen.is_dirty());
        assert_eq!(screen.form.field(0).text_value(), "Válvula");

        screen.form.field_mut(0).set_value("Válvula 3/4");
        let action = screen.submit(&ctx, &mut toasts).await.unwrap();
        assert!(matches!(action, ScreenAction::Pop));
        assert_eq!(api.rows("products")[0]["name"], json!("Válvula 3/4"));
    }
}
