//! Products list tab

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{layout::Rect, text::Line, Frame};
use tracing::error;

use crate::models::{to_rows, Product};
use crate::operations;
use crate::tui::app::{AppCtx, Route, ScreenAction};
use crate::tui::components::{Action, ActionMenu, Column, ConfirmDialog, TableView, Toast, Toasts};
use crate::tui::screens::{row_id, ProductFormMode, ProductFormScreen, RowAction};
use crate::tui::ui::cell_text;

fn columns() -> Vec<Column> {
    vec![
        Column::new("Id", "id", 1),
        Column::new("Nombre", "name", 5),
        Column::new("Más", "more", 1),
    ]
}

pub struct ProductsTab {
    products: Vec<Product>,
    table: TableView,
    menu: Option<ActionMenu<RowAction>>,
    pending_delete: Option<i64>,
}

impl ProductsTab {
    pub fn new(rows_per_page: usize) -> Self {
        Self {
            products: Vec::new(),
            table: TableView::new(columns(), rows_per_page),
            menu: None,
            pending_delete: None,
        }
    }

    pub async fn refresh(&mut self, ctx: &AppCtx, toasts: &mut Toasts) -> Result<()> {
        self.table.set_loading();
        match operations::load_products(ctx.api.as_ref()).await {
            Ok(products) => {
                self.products = products;
                self.table.set_rows(to_rows(&self.products));
            }
            Err(e) => {
                error!("Error cargando productos: {e}");
                self.products.clear();
                self.table.set_rows(Vec::new());
                toasts.show(Toast::error("No se pudieron cargar los productos."));
            }
        }
        Ok(())
    }

    pub async fn handle_key(
        &mut self,
        key: KeyEvent,
        _ctx: &AppCtx,
        _toasts: &mut Toasts,
    ) -> Result<ScreenAction> {
        if let Some(menu) = self.menu.as_mut() {
            match key.code {
                KeyCode::Up => menu.up(),
                KeyCode::Down => menu.down(),
                KeyCode::Enter => {
                    let selected = menu.select();
                    self.menu = None;
                    if let Some(action) = selected {
                        return Ok(self.on_action(action));
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
                return Ok(ScreenAction::Push(Box::new(Route::ProductForm(
                    ProductFormScreen::new(ProductFormMode::Create),
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
                vec![
                    Action::new("open", "Ver", move || RowAction::Open(id)),
                    Action::destructive("delete", "Eliminar", move || RowAction::Delete(id)),
                ],
            ));
        }
    }

    fn on_action(&mut self, action: RowAction) -> ScreenAction {
        match action {
            RowAction::Open(id) => ScreenAction::Push(Box::new(Route::ProductForm(
                ProductFormScreen::new(ProductFormMode::Edit(id)),
            ))),
            RowAction::Delete(id) => {
                self.pending_delete = Some(id);
                ScreenAction::Confirm(ConfirmDialog::delete("el producto"))
            }
        }
    }

    pub async fn on_confirm(&mut self, ctx: &AppCtx, toasts: &mut Toasts) -> Result<ScreenAction> {
        let Some(id) = self.pending_delete.take() else {
            return Ok(ScreenAction::None);
        };
        match operations::delete_by_id(ctx.api.as_ref(), "products", id).await {
            Ok(()) => {
                self.products.retain(|p| p.id != id);
                self.table.set_rows(to_rows(&self.products));
                toasts.show(Toast::success("El producto ha sido eliminado."));
            }
            Err(e) => {
                error!("Error eliminando producto: {e}");
                toasts.show(Toast::error("No se pudo eliminar el producto."));
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
            _ => Line::from(cell_text(row.get(key))),
        });
        if let Some(menu) = self.menu.as_mut() {
            menu.render(f, area);
        }
    }

    pub fn hint(&self) -> String {
        "n: nuevo producto | Enter: acciones | ↑/↓: fila | RePág/AvPág: página".to_string()
    }
}
