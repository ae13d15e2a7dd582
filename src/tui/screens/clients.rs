//! Clients list tab

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{layout::Rect, text::Line, Frame};
use tracing::error;

use crate::models::to_rows;
use crate::operations;
use crate::tui::app::{AppCtx, Route, ScreenAction};
use crate::tui::components::{Action, ActionMenu, Column, ConfirmDialog, TableView, Toast, Toasts};
use crate::tui::screens::{row_id, ClientDetailScreen, ClientFormScreen, RowAction};
use crate::tui::ui::{cell_date, cell_text};

fn columns() -> Vec<Column> {
    vec![
        Column::new("Id", "id", 1),
        Column::new("Nombre", "name", 3),
        Column::new("Apellido", "last_name", 3),
        Column::new("Más", "more", 1),
    ]
}

pub struct ClientsTab {
    clients: Vec<crate::models::Client>,
    table: TableView,
    menu: Option<ActionMenu<RowAction>>,
    pending_delete: Option<i64>,
}

impl ClientsTab {
    pub fn new(rows_per_page: usize) -> Self {
        Self {
            clients: Vec::new(),
            table: TableView::new(columns(), rows_per_page),
            menu: None,
            pending_delete: None,
        }
    }

    pub async fn refresh(&mut self, ctx: &AppCtx, toasts: &mut Toasts) -> Result<()> {
        self.table.set_loading();
        match operations::load_clients(ctx.api.as_ref()).await {
            Ok(clients) => {
                self.clients = clients;
                self.table.set_rows(to_rows(&self.clients));
            }
            Err(e) => {
                error!("Error cargando clientes: {e}");
                self.clients.clear();
                self.table.set_rows(Vec::new());
                toasts.show(Toast::error("No se pudieron cargar los clientes."));
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
                    if let Some(action) = selected {
                        return Ok(self.on_action(action, ctx));
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
                return Ok(ScreenAction::Push(Box::new(Route::ClientForm(
                    ClientFormScreen::new(),
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

    fn on_action(&mut self, action: RowAction, ctx: &AppCtx) -> ScreenAction {
        match action {
            RowAction::Open(id) => ScreenAction::Push(Box::new(Route::ClientDetail(
                ClientDetailScreen::new(id, ctx.rows_per_page),
            ))),
            RowAction::Delete(id) => {
                self.pending_delete = Some(id);
                ScreenAction::Confirm(ConfirmDialog::delete("el cliente"))
            }
        }
    }

    pub async fn on_confirm(&mut self, ctx: &AppCtx, toasts: &mut Toasts) -> Result<ScreenAction> {
        let Some(id) = self.pending_delete.take() else {
            return Ok(ScreenAction::None);
        };
        match operations::delete_by_id(ctx.api.as_ref(), "clients", id).await {
            Ok(()) => {
                self.clients.retain(|c| c.id != id);
                self.table.set_rows(to_rows(&self.clients));
                toasts.show(Toast::success("El cliente ha sido eliminado."));
            }
            Err(e) => {
                error!("Error eliminando cliente: {e}");
                toasts.show(Toast::error("No se pudo eliminar el cliente."));
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
            "created_at" | "updated_at" => Line::from(cell_date(row.get(key))),
            _ => Line::from(cell_text(row.get(key))),
        });
        if let Some(menu) = self.menu.as_mut() {
            menu.render(f, area);
        }
    }

    pub fn hint(&self) -> String {
        "n: nuevo cliente | Enter: acciones | ↑/↓: fila | RePág/AvPág: página".to_string()
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
            "clients",
            vec![
                json!({ "id": 2, "name": "Berta", "last_name": "Núñez" }),
                json!({ "id": 7, "name": "Ana", "last_name": "Reyes" }),
                json!({ "id": 1, "name": "Luis", "last_name": "Mora" }),
            ],
        );
        api
    }

    async fn loaded_tab(api: &Arc<MemoryApi>) -> ClientsTab {
        let ctx = test_ctx(api.clone());
        let mut toasts = Toasts::new();
        let mut tab = ClientsTab::new(10);
        tab.refresh(&ctx, &mut toasts).await.unwrap();
        tab
    }

    #[tokio::test]
    async fn test_refresh_sorts_rows_by_ascending_id() {
        let api = seeded_api();
        let tab = loaded_tab(&api).await;
        let ids: Vec<i64> = tab.clients.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![1, 2, 7]);
        assert!(!tab.table.is_loading());
    }

    #[tokio::test]
    async fn test_fetch_failure_degrades_to_empty_state() {
        let api = seeded_api();
        api.fail_table("clients");
        let ctx = test_ctx(api.clone());
        let mut toasts = Toasts::new();
        let mut tab = ClientsTab::new(10);
        tab.refresh(&ctx, &mut toasts).await.unwrap();

        assert!(tab.clients.is_empty());
        assert_eq!(tab.table.page_count(), 1);
        assert!(toasts.current().is_some());
        // One attempt, no retry.
        assert_eq!(api.calls().iter().filter(|c| *c == "select clients").count(), 1);
    }

    #[tokio::test]
    async fn test_declined_delete_leaves_the_row_in_place() {
        let api = seeded_api();
        let ctx = test_ctx(api.clone());
        let mut toasts = Toasts::new();
        let mut tab = loaded_tab(&api).await;

        // Open the row menu, move to "Eliminar" and trigger it.
        tab.handle_key(KeyEvent::from(KeyCode::Enter), &ctx, &mut toasts)
            .await
            .unwrap();
        tab.handle_key(KeyEvent::from(KeyCode::Down), &ctx, &mut toasts)
            .await
            .unwrap();
        let action = tab
            .handle_key(KeyEvent::from(KeyCode::Enter), &ctx, &mut toasts)
            .await
            .unwrap();
        assert!(matches!(action, ScreenAction::Confirm(_)));
        assert_eq!(tab.pending_delete, Some(1));

        tab.on_cancel();
        assert_eq!(tab.pending_delete, None);
        assert_eq!(tab.clients.len(), 3);
        // No delete request was ever issued.
        assert!(!api.calls().iter().any(|c| c == "delete clients"));
    }

    #[tokio::test]
    async fn test_confirmed_delete_removes_the_row_by_id() {
        let api = seeded_api();
        let ctx = test_ctx(api.clone());
        let mut toasts = Toasts::new();
        let mut tab = loaded_tab(&api).await;

        tab.pending_delete = Some(7);
        tab.on_confirm(&ctx, &mut toasts).await.unwrap();

        assert_eq!(tab.clients.len(), 2);
        assert!(tab.clients.iter().all(|c| c.id != 7));
        assert_eq!(api.rows("clients").len(), 2);
        assert_eq!(
            toasts.current().unwrap().message,
            "El cliente ha sido eliminado."
        );
    }

    #[tokio::test]
    async fn test_failed_delete_leaves_state_untouched() {
        let api = seeded_api();
        let ctx = test_ctx(api.clone());
        let mut toasts = Toasts::new();
        let mut tab = loaded_tab(&api).await;

        api.fail_table("clients");
        tab.pending_delete = Some(7);
        tab.on_confirm(&ctx, &mut toasts).await.unwrap();

        assert_eq!(tab.clients.len(), 3);
        assert_eq!(
            toasts.current().unwrap().message,
            "No se pudo eliminar el cliente."
        );
    }

    #[tokio::test]
    async fn test_menu_handlers_capture_the_selected_row() {
        let api = seeded_api();
        let ctx = test_ctx(api.clone());
        let mut toasts = Toasts::new();
        let mut tab = loaded_tab(&api).await;

        // Cursor on the second row (id 2 after the ascending sort).
        tab.handle_key(KeyEvent::from(KeyCode::Down), &ctx, &mut toasts)
            .await
            .unwrap();
        tab.open_menu();
        let action = tab.menu.as_ref().unwrap().select_by_id("open").unwrap();
        assert_eq!(action, RowAction::Open(2));
    }
}
