//! Orders list tab

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{layout::Rect, text::Line, Frame};
use tracing::error;

use crate::models::{to_rows, Order};
use crate::operations;
use crate::tui::app::{AppCtx, Route, ScreenAction};
use crate::tui::components::{Action, ActionMenu, Column, ConfirmDialog, TableView, Toast, Toasts};
use crate::tui::screens::{nested_name, row_id, OrderFormScreen, RowAction};
use crate::tui::ui::{cell_date, cell_text};

fn columns() -> Vec<Column> {
    vec![
        Column::new("Id", "id", 1),
        Column::new("Estatus", "status", 3),
        Column::new("Fecha", "created_at", 3),
        Column::new("Más", "more", 1),
    ]
}

pub struct OrdersTab {
    orders: Vec<Order>,
    table: TableView,
    menu: Option<ActionMenu<RowAction>>,
    pending_delete: Option<i64>,
}

impl OrdersTab {
    pub fn new(rows_per_page: usize) -> Self {
        Self {
            orders: Vec::new(),
            table: TableView::new(columns(), rows_per_page),
            menu: None,
            pending_delete: None,
        }
    }

    pub async fn refresh(&mut self, ctx: &AppCtx, toasts: &mut Toasts) -> Result<()> {
        self.table.set_loading();
        match operations::load_orders(ctx.api.as_ref()).await {
            Ok(orders) => {
                self.orders = orders;
                self.table.set_rows(to_rows(&self.orders));
            }
            Err(e) => {
                error!("Error cargando ordenes: {e}");
                self.orders.clear();
                self.table.set_rows(Vec::new());
                toasts.show(Toast::error("No se pudieron cargar las ordenes."));
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
                        return Ok(ScreenAction::Confirm(ConfirmDialog::delete("la orden")));
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
                return Ok(ScreenAction::Push(Box::new(Route::OrderForm(
                    OrderFormScreen::new(ctx.rows_per_page),
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
        match operations::delete_by_id(ctx.api.as_ref(), "orders", id).await {
            Ok(()) => {
                self.orders.retain(|o| o.id != id);
                self.table.set_rows(to_rows(&self.orders));
                toasts.show(Toast::success("La orden ha sido eliminada."));
            }
            Err(e) => {
                error!("Error eliminando orden: {e}");
                toasts.show(Toast::error("No se pudo eliminar la orden."));
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
            "status" => Line::from(nested_name(row, key)),
            "created_at" => Line::from(cell_date(row.get(key))),
            _ => Line::from(cell_text(row.get(key))),
        });
        if let Some(menu) = self.menu.as_mut() {
            menu.render(f, area);
        }
    }

    pub fn hint(&self) -> String {
        "n: nueva orden | Enter: acciones | ↑/↓: fila | RePág/AvPág: página".to_string()
    }
}
