//! Client detail: inline edit plus the client's locations
//!
//! One fetch loads the client row with its locations joined. The edit
//! form sits behind the dirty gate; the locations table carries its own
//! action menu and delete confirmation.

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::Line,
    widgets::{Block, Borders},
    Frame,
};
use tracing::error;

use crate::models::{to_rows, Client};
use crate::operations;
use crate::tui::app::{AppCtx, Route, ScreenAction};
use crate::tui::components::{
    Action, ActionMenu, Column, ConfirmDialog, Form, FormField, Rule, TableView, Toast, Toasts,
};
use crate::tui::screens::{row_id, LocationFormScreen, RowAction};
use crate::tui::ui::{cell_text, truncate, Styles};

fn location_columns() -> Vec<Column> {
    vec![
        Column::new("Id", "id", 1),
        Column::new("Dirección", "address", 3),
        Column::new("Postal", "postal_code", 3),
        Column::new("Más", "more", 1),
    ]
}

#[derive(PartialEq)]
enum DetailFocus {
    Form,
    Locations,
}

pub struct ClientDetailScreen {
    client_id: i64,
    client: Option<Client>,
    form: Form,
    baseline: Vec<String>,
    table: TableView,
    menu: Option<ActionMenu<RowAction>>,
    pending_delete: Option<i64>,
    focus: DetailFocus,
    submitting: bool,
}

impl ClientDetailScreen {
    pub fn new(client_id: i64, rows_per_page: usize) -> Self {
        let form = Form::new(vec![
            FormField::text("Nombre(s)").with_rules(vec![Rule::Required]),
            FormField::text("Apellido(s)").with_rules(vec![Rule::Required]),
        ]);
        let baseline = form.snapshot();
        Self {
            client_id,
            client: None,
            form,
            baseline,
            table: TableView::new(location_columns(), rows_per_page),
            menu: None,
            pending_delete: None,
            focus: DetailFocus::Form,
            submitting: false,
        }
    }

    pub async fn refresh(&mut self, ctx: &AppCtx, toasts: &mut Toasts) -> Result<()> {
        self.table.set_loading();
        match operations::load_client_with_locations(ctx.api.as_ref(), self.client_id).await {
            Ok(client) => {
                self.form.field_mut(0).set_value(&client.name);
                self.form.field_mut(1).set_value(&client.last_name);
                self.baseline = self.form.snapshot();
                self.table
                    .set_rows(to_rows(client.locations.as_deref().unwrap_or_default()));
                self.client = Some(client);
            }
            Err(e) => {
                error!("Error cargando cliente: {e}");
                self.table.set_rows(Vec::new());
                toasts.show(Toast::error("No se pudo cargar el cliente."));
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
        if let Some(menu) = self.menu.as_mut() {
            match key.code {
                KeyCode::Up => menu.up(),
                KeyCode::Down => menu.down(),
                KeyCode::Enter => {
                    let selected = menu.select();
                    self.menu = None;
                    if let Some(RowAction::Delete(id)) = selected {
                        self.pending_delete = Some(id);
                        return Ok(ScreenAction::Confirm(ConfirmDialog::delete("la ubicación")));
                    }
                }
                KeyCode::Esc => self.menu = None,
                _ => {}
            }
            return Ok(ScreenAction::None);
        }

        if key.modifiers.contains(KeyModifiers::CONTROL) {
            match key.code {
                KeyCode::Char('s') => return self.save(ctx, toasts).await,
                KeyCode::Char('r') => {
                    self.discard();
                    return Ok(ScreenAction::None);
                }
                _ => {}
            }
        }

        match self.focus {
            DetailFocus::Form => {
                if self.form.handle_edit_key(key) {
                    return Ok(ScreenAction::None);
                }
                match key.code {
                    KeyCode::Tab => self.focus = DetailFocus::Locations,
                    KeyCode::Down => self.form.next_field(),
                    KeyCode::Up => self.form.previous_field(),
                    KeyCode::Enter => return self.save(ctx, toasts).await,
                    KeyCode::Esc => return Ok(ScreenAction::Pop),
                    _ => {}
                }
            }
            DetailFocus::Locations => match key.code {
                KeyCode::Tab => self.focus = DetailFocus::Form,
                KeyCode::Up => self.table.cursor_up(),
                KeyCode::Down => self.table.cursor_down(),
                KeyCode::PageUp => self.table.previous_page(),
                KeyCode::PageDown => self.table.next_page(),
                KeyCode::Char('n') => {
                    return Ok(ScreenAction::Push(Box::new(Route::LocationForm(
                        LocationFormScreen::new(self.client_id),
                    ))))
                }
                KeyCode::Enter | KeyCode::Char('m') => self.open_menu(),
                KeyCode::Esc => return Ok(ScreenAction::Pop),
                _ => {}
            },
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

    fn discard(&mut self) {
        let baseline = self.baseline.clone();
        for (i, value) in baseline.iter().enumerate() {
            self.form.field_mut(i).set_value(value);
        }
    }

    async fn save(&mut self, ctx: &AppCtx, toasts: &mut Toasts) -> Result<ScreenAction> {
        if self.submitting || !self.is_dirty() || !self.form.validate_all() {
            return Ok(ScreenAction::None);
        }

        self.submitting = true;
        let result = operations::update_client(
            ctx.api.as_ref(),
            self.client_id,
            self.form.field(0).text_value(),
            self.form.field(1).text_value(),
        )
        .await;
        self.submitting = false;

        match result {
            Ok(()) => {
                toasts.show(Toast::success("El cliente se ha modificado."));
                Ok(ScreenAction::Pop)
            }
            Err(e) => {
                error!("Client error: {e}");
                toasts.show(Toast::error("No se pudo modificar el cliente."));
                Ok(ScreenAction::None)
            }
        }
    }

    pub async fn on_confirm(&mut self, ctx: &AppCtx, toasts: &mut Toasts) -> Result<ScreenAction> {
        let Some(id) = self.pending_delete.take() else {
            return Ok(ScreenAction::None);
        };
        match operations::delete_by_id(ctx.api.as_ref(), "locations", id).await {
            Ok(()) => {
                if let Some(client) = self.client.as_mut() {
                    if let Some(locations) = client.locations.as_mut() {
                        locations.retain(|l| l.id != id);
                        self.table.set_rows(to_rows(locations));
                    }
                }
                toasts.show(Toast::success("La ubicación ha sido eliminada."));
            }
            Err(e) => {
                error!("Error eliminando ubicación: {e}");
                toasts.show(Toast::error("No se pudo eliminar la ubicación."));
            }
        }
        Ok(ScreenAction::None)
    }

    pub fn on_cancel(&mut self) {
        self.pending_delete = None;
    }

    pub fn draw(&mut self, f: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(8), Constraint::Min(0)])
            .split(area);

        let title = match (&self.client, self.is_dirty()) {
            (Some(client), true) => format!("Cliente {} (cambios sin guardar)", client.id),
            (Some(client), false) => format!("Cliente {}", client.id),
            (None, _) => "Cliente".to_string(),
        };
        let form_block = Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(if self.focus == DetailFocus::Form {
                Styles::active_border()
            } else {
                Styles::inactive_border()
            });
        let form_area = form_block.inner(chunks[0]);
        f.render_widget(form_block, chunks[0]);
        self.form.render(f, form_area);

        let table_block = Block::default()
            .title("Ubicaciones")
            .borders(Borders::ALL)
            .border_style(if self.focus == DetailFocus::Locations {
                Styles::active_border()
            } else {
                Styles::inactive_border()
            });
        let table_area = table_block.inner(chunks[1]);
        f.render_widget(table_block, chunks[1]);
        self.table.render(f, table_area, &|row, key| match key {
            "more" => Line::from("⋯"),
            "address" => Line::from(truncate(&cell_text(row.get(key)), 48)),
            _ => Line::from(cell_text(row.get(key))),
        });

        if let Some(menu) = self.menu.as_mut() {
            menu.render(f, area);
        }
    }

    pub fn hint(&self) -> String {
        if self.is_dirty() {
            "Ctrl+S: guardar | Ctrl+R: descartar | Tab: ubicaciones | Esc: volver".to_string()
        } else {
            "Tab: formulario/ubicaciones | n: nueva ubicación | Enter: acciones | Esc: volver"
                .to_string()
        }
    }
}
