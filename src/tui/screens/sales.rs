//! Sales list tab
//!
//! Sales carrying the reserved quote status live on the quotes tab
//! instead; the status id is resolved by name on every load.

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{layout::Rect, text::Line, Frame};
use tracing::error;

use crate::models::{to_rows, Sale};
use crate::operations;
use crate::tui::app::{AppCtx, Route, ScreenAction};
use crate::tui::components::{Action, ActionMenu, Column, ConfirmDialog, TableView, Toast, Toasts};
use crate::tui::screens::{client_cell, row_id, RowAction, SaleFormMode, SaleFormScreen};
use crate::tui::ui::{cell_date, cell_text};

fn columns() -> Vec<Column> {
    vec![
        Column::new("Id", "id", 1),
        Column::new("Cliente", "client", 3),
        Column::new("Fecha", "created_at", 3),
        Column::new("Más", "more", 1),
    ]
}

pub struct SalesTab {
    sales: Vec<Sale>,
    table: TableView,
    menu: Option<ActionMenu<RowAction>>,
    pending_delete: Option<i64>,
}

impl SalesTab {
    pub fn new(rows_per_page: usize) -> Self {
        Self {
            sales: Vec::new(),
            table: TableView::new(columns(), rows_per_page),
            menu: None,
            pending_delete: None,
        }
    }

    pub async fn refresh(&mut self, ctx: &AppCtx, toasts: &mut Toasts) -> Result<()> {
        self.table.set_loading();
        let loaded = match operations::quote_status_id(ctx.api.as_ref()).await {
            Ok(quote_status) => operations::load_sales(ctx.api.as_ref(), quote_status).await,
            Err(e) => Err(e),
        };
        match loaded {
            Ok(sales) => {
                self.sales = sales;
                self.table.set_rows(to_rows(&self.sales));
            }
            Err(e) => {
                error!("Error cargando ventas: {e}");
                self.sales.clear();
                self.table.set_rows(Vec::new());
                toasts.show(Toast::error("No se pudieron cargar las ventas."));
            }
        }
        Ok(())
    }

    pub async fn handle_key(
        &mut self,
        key: KeyEvent,
        ctx: &AppCtx,
        _toasts: &mut Toasts,
    ) -> Result<ScreenAction> {
        if let Some(menu) = self.menu.as_mut() {
            match key.code {
                KeyCode::Up => menu.up(),
                KeyCode::Down => menu.down(),
                KeyCode::Enter => {
                    let selected = menu.select();
                    self.menu = None;
                    if let Some(RowAction::Delete(id)) = selected {
                        self.pending_delete = Some(id);
                        return Ok(ScreenAction::Confirm(ConfirmDialog::delete("la venta")));
                    }
                }
                KeyCode::Esc => self.menu = None,
                _ => {}
            }
            return Ok(ScreenAction::None);
        }

        match key.code {
            KeyCode::Up => self.table.cursor_up(),
            KeyCode::Down => self.table.cursor_down(),
            KeyCode::PageUp => self.table.previous_page(),
            KeyCode::PageDown => self.table.next_page(),
            KeyCode::Char('n') => {
                return Ok(ScreenAction::Push(Box::new(Route::SaleForm(
                    SaleFormScreen::new(SaleFormMode::Sale, ctx.rows_per_page),
                ))))
            }
            KeyCode::Enter | KeyCode::Char('m') => self.open_menu(),
            _ => {}
        }
        Ok(ScreenAction::None)
    }

    fn open_menu(&mut self) {
        if let Some(id) = self.table.selected().and_then(row_id) {
            self.menu = Some(ActionMenu::new(
                "Más",
                vec![Action::destructive("delete", "Eliminar", move || {
                    RowAction::Delete(id)
                })],
            ));
        }
    }

    pub async fn on_confirm(&mut self, ctx: &AppCtx, toasts: &mut Toasts) -> Result<ScreenAction> {
        let Some(id) = self.pending_delete.take() else {
            return Ok(ScreenAction::None);
        };
        match operations::delete_by_id(ctx.api.as_ref(), "sales", id).await {
            Ok(()) => {
                self.sales.retain(|s| s.id != id);
                self.table.set_rows(to_rows(&self.sales));
                toasts.show(Toast::success("La venta ha sido eliminada."));
            }
            Err(e) => {
                error!("Error eliminando venta: {e}");
                toasts.show(Toast::error("No se pudo eliminar la venta."));
            }
        }
        Ok(ScreenAction::None)
    }

    pub fn on_cancel(&mut self) {
        self.pending_delete = None;
    }

    pub fn draw(&mut self, f: &mut Frame, area: Rect) {
        self.table.render(f, area, &|row, key| match key {
            "more" => Line::from("⋯"),
            "client" => Line::from(client_cell(row, key)),
            "created_at" | "completed_date" => Line::from(cell_date(row.get(key))),
            _ => Line::from(cell_text(row.get(key))),
        });
        if let Some(menu) = self.menu.as_mut() {
            menu.render(f, area);
        }
    }

    pub fn hint(&self) -> String {
        "n: nueva venta | Enter: acciones | ↑/↓: fila | RePág/AvPág: página".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock::MemoryApi;
    use crate::tui::screens::test_ctx;
    use serde_json::json;
    use std::sync::Arc;

    fn seeded_api() -> Arc<MemoryApi> {
        let api = Arc::new(MemoryApi::new());
        api.seed(
            "sale_statuses",
            vec![
                json!({ "id": 1, "name": "Pendiente" }),
                json!({ "id": 3, "name": "Cotización" }),
            ],
        );
        api.seed(
            "sales",
            vec![
                json!({
                    "id": 1,
                    "sale_status_id": 1,
                    "client_id": 2,
                    "client": { "id": 2, "name": "Ana", "last_name": "Reyes" }
                }),
                json!({ "id": 2, "sale_status_id": 3, "client_id": 2 }),
            ],
        );
        api
    }

    #[tokio::test]
    async fn test_refresh_excludes_quotes() {
        let api = seeded_api();
        let ctx = test_ctx(api.clone());
        let mut toasts = Toasts::new();
        let mut tab = SalesTab::new(10);
        tab.refresh(&ctx, &mut toasts).await.unwrap();

        assert_eq!(tab.sales.len(), 1);
        assert_eq!(tab.sales[0].id, 1);
        assert_eq!(
            tab.sales[0].client.as_ref().unwrap().full_name(),
            "Ana Reyes"
        );
    }

    #[tokio::test]
    async fn test_missing_quote_status_degrades_to_empty() {
        let api = Arc::new(MemoryApi::new());
        api.seed("sale_statuses", vec![json!({ "id": 1, "name": "Pendiente" })]);
        let ctx = test_ctx(api.clone());
        let mut toasts = Toasts::new();
        let mut tab = SalesTab::new(10);
        tab.refresh(&ctx, &mut toasts).await.unwrap();

        assert!(tab.sales.is_empty());
        assert!(toasts.current().is_some());
    }
}
