//! Sale and quote creation
//!
//! Both write a `sales` row plus `product_sale` line items; a quote is a
//! sale whose status is the reserved quote status, resolved by name when
//! the screen loads and never user-selectable.

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::Line,
    widgets::{Block, Borders},
    Frame,
};
use tracing::error;

use crate::api::ApiError;
use crate::models::LineItems;
use crate::operations;
use crate::tui::app::{AppCtx, ScreenAction};
use crate::tui::components::{
    Action, ActionMenu, Column, Form, FormField, Rule, TableView, Toast, Toasts,
};
use crate::tui::ui::{cell_text, truncate, Styles};

fn item_columns() -> Vec<Column> {
    vec![
        Column::new("Producto", "product_name", 3),
        Column::new("Precio p/u", "unit_price", 2),
        Column::new("Cantidad", "quantity", 2),
        Column::new("Más", "more", 1),
    ]
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SaleFormMode {
    Sale,
    Quote,
}

#[derive(PartialEq)]
enum CompositeFocus {
    Fields,
    Items,
}

pub struct SaleFormScreen {
    mode: SaleFormMode,
    form: Form,
    /// Resolved quote status, only used in quote mode.
    quote_status: Option<i64>,
    items: LineItems,
    items_table: TableView,
    focus: CompositeFocus,
    menu: Option<ActionMenu<u64>>,
    submitting: bool,
}

impl SaleFormScreen {
    pub fn new(mode: SaleFormMode, rows_per_page: usize) -> Self {
        let mut fields = Vec::new();
        if mode == SaleFormMode::Sale {
            fields.push(FormField::select("Estatus", Vec::new()).with_rules(vec![Rule::Required]));
        }
        fields.push(FormField::select("Cliente", Vec::new()).with_rules(vec![Rule::Required]));
        fields.push(FormField::select("Producto", Vec::new()).with_rules(vec![Rule::Required]));
        fields.push(
            FormField::decimal("Precio p/u").with_rules(vec![Rule::Required, Rule::NonNegative]),
        );
        fields.push(
            FormField::integer("Cantidad").with_rules(vec![Rule::Required, Rule::Positive]),
        );

        let mut items_table = TableView::new(item_columns(), rows_per_page);
        items_table.set_rows(Vec::new());
        Self {
            mode,
            form: Form::new(fields),
            quote_status: None,
            items: LineItems::default(),
            items_table,
            focus: CompositeFocus::Fields,
            menu: None,
            submitting: false,
        }
    }

    fn field_status(&self) -> usize {
        0
    }

    fn field_client(&self) -> usize {
        match self.mode {
            SaleFormMode::Sale => 1,
            SaleFormMode::Quote => 0,
        }
    }

    fn field_product(&self) -> usize {
        self.field_client() + 1
    }

    fn field_price(&self) -> usize {
        self.field_client() + 2
    }

    fn field_quantity(&self) -> usize {
        self.field_client() + 3
    }

    pub async fn refresh(&mut self, ctx: &AppCtx, toasts: &mut Toasts) -> Result<()> {
        match self.mode {
            SaleFormMode::Sale => {
                match operations::load_sale_statuses(ctx.api.as_ref()).await {
                    Ok(statuses) => {
                        let index = self.field_status();
                        self.form.field_mut(index).set_options(
                            statuses.into_iter().map(|s| (s.id, s.name)).collect(),
                        );
                    }
                    Err(e) => {
                        error!("Error cargando estatus: {e}");
                        toasts.show(Toast::error("No se pudieron cargar los estatus."));
                    }
                }
            }
            SaleFormMode::Quote => match operations::quote_status_id(ctx.api.as_ref()).await {
                Ok(id) => self.quote_status = Some(id),
                Err(e) => {
                    error!("Error cargando estatus de cotización: {e}");
                    toasts.show(Toast::error("No se pudo cargar el estatus de cotización."));
                }
            },
        }

        match operations::load_clients(ctx.api.as_ref()).await {
            Ok(clients) => {
                let index = self.field_client();
                self.form.field_mut(index).set_options(
                    clients.into_iter().map(|c| (c.id, c.full_name())).collect(),
                );
            }
            Err(e) => {
                error!("Error cargando clientes: {e}");
                toasts.show(Toast::error("No se pudieron cargar los clientes."));
            }
        }
        match operations::load_products(ctx.api.as_ref()).await {
            Ok(products) => {
                let index = self.field_product();
                self.form.field_mut(index).set_options(
                    products.into_iter().map(|p| (p.id, p.name)).collect(),
                );
            }
            Err(e) => {
                error!("Error cargando productos: {e}");
                toasts.show(Toast::error("No se pudieron cargar los productos."));
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
        if let Some(menu) = self.menu.as_mut() {
            match key.code {
                KeyCode::Up => menu.up(),
                KeyCode::Down => menu.down(),
                KeyCode::Enter => {
                    let selected = menu.select();
                    self.menu = None;
                    if let Some(item_key) = selected {
                        self.items.remove_by_key(item_key);
                        self.items_table.set_rows(self.items.to_rows());
                    }
                }
                KeyCode::Esc => self.menu = None,
                _ => {}
            }
            return Ok(ScreenAction::None);
        }

        if key.code == KeyCode::Char('s') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return self.submit(ctx, toasts).await;
        }

        match self.focus {
            CompositeFocus::Fields => {
                if self.form.handle_edit_key(key) {
                    return Ok(ScreenAction::None);
                }
                match key.code {
                    KeyCode::Tab => {
                        if self.form.current_index() == self.field_quantity() {
                            self.focus = CompositeFocus::Items;
                        } else {
                            self.form.next_field();
                        }
                    }
                    KeyCode::BackTab | KeyCode::Up => self.form.previous_field(),
                    KeyCode::Down => self.form.next_field(),
                    KeyCode::Enter => self.add_item(),
                    KeyCode::Esc => return Ok(ScreenAction::Pop),
                    _ => {}
                }
            }
            CompositeFocus::Items => match key.code {
                KeyCode::Tab => self.focus = CompositeFocus::Fields,
                KeyCode::Up => self.items_table.cursor_up(),
                KeyCode::Down => self.items_table.cursor_down(),
                KeyCode::PageUp => self.items_table.previous_page(),
                KeyCode::PageDown => self.items_table.next_page(),
                KeyCode::Enter | KeyCode::Char('m') => self.open_menu(),
                KeyCode::Esc => return Ok(ScreenAction::Pop),
                _ => {}
            },
        }
        Ok(ScreenAction::None)
    }

    fn open_menu(&mut self) {
        let Some(item_key) = self
            .items_table
            .selected()
            .and_then(|row| row.get("key").and_then(serde_json::Value::as_u64))
        else {
            return;
        };
        self.menu = Some(ActionMenu::new(
            "Más",
            vec![Action::destructive("delete", "Eliminar", move || item_key)],
        ));
    }

    fn add_item(&mut self) {
        let product = self.field_product();
        let price = self.field_price();
        let quantity = self.field_quantity();

        let product_ok = self.form.field_mut(product).validate();
        let price_ok = self.form.field_mut(price).validate();
        let quantity_ok = self.form.field_mut(quantity).validate();
        if !product_ok || !price_ok || !quantity_ok {
            return;
        }

        let product_id = self.form.field(product).selected_id().unwrap_or(-1);
        let product_name = self
            .form
            .field(product)
            .selected_label()
            .unwrap_or("Sin nombre")
            .to_string();
        let unit_price = self.form.field(price).decimal_value();
        let amount = self.form.field(quantity).integer_value().unwrap_or(0);

        self.items.push(product_id, product_name, amount, unit_price);
        self.items_table.set_rows(self.items.to_rows());
        self.form.field_mut(product).clear();
        self.form.field_mut(price).clear();
        self.form.field_mut(quantity).clear();
    }

    fn status_id(&self) -> Option<i64> {
        match self.mode {
            SaleFormMode::Sale => self.form.field(self.field_status()).selected_id(),
            SaleFormMode::Quote => self.quote_status,
        }
    }

    async fn submit(&mut self, ctx: &AppCtx, toasts: &mut Toasts) -> Result<ScreenAction> {
        if self.submitting {
            return Ok(ScreenAction::None);
        }
        if self.mode == SaleFormMode::Sale {
            let index = self.field_status();
            if !self.form.field_mut(index).validate() {
                return Ok(ScreenAction::None);
            }
        }
        let client_index = self.field_client();
        if !self.form.field_mut(client_index).validate() {
            return Ok(ScreenAction::None);
        }
        let Some(status_id) = self.status_id() else {
            toasts.show(Toast::error("No se pudo cargar el estatus de cotización."));
            return Ok(ScreenAction::None);
        };
        if self.items.is_empty() {
            toasts.show(Toast::error("Agrega al menos un producto."));
            return Ok(ScreenAction::None);
        }

        self.submitting = true;
        let client_id = self.form.field(client_index).selected_id().unwrap_or(-1);
        let result = operations::create_sale_with_items(
            ctx.api.as_ref(),
            status_id,
            client_id,
            self.items.items(),
        )
        .await;
        self.submitting = false;

        match result {
            Ok(_sale_id) => {
                toasts.show(Toast::success(match self.mode {
                    SaleFormMode::Sale => "La venta se ha creado.",
                    SaleFormMode::Quote => "La cotización se ha creado.",
                }));
                Ok(ScreenAction::Pop)
            }
            Err(e @ ApiError::PartialChildren { .. }) => {
                error!("Sale error: {e}");
                toasts.show(Toast::error(
                    "No se pudieron guardar todos los productos; el registro fue descartado.",
                ));
                Ok(ScreenAction::None)
            }
            Err(e) => {
                error!("Sale error: {e}");
                toasts.show(Toast::error(match self.mode {
                    SaleFormMode::Sale => "No se pudo crear la venta.",
                    SaleFormMode::Quote => "No se pudo crear la cotización.",
                }));
                Ok(ScreenAction::None)
            }
        }
    }

    pub fn draw(&mut self, f: &mut Frame, area: Rect) {
        let form_height = 3 * self.form.fields.len() as u16 + 2;
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(form_height), Constraint::Min(0)])
            .split(area);

        let title = match self.mode {
            SaleFormMode::Sale => "Nueva Venta",
            SaleFormMode::Quote => "Nueva Cotización",
        };
        let form_block = Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(if self.focus == CompositeFocus::Fields {
                Styles::active_border()
            } else {
                Styles::inactive_border()
            });
        let form_area = form_block.inner(chunks[0]);
        f.render_widget(form_block, chunks[0]);
        self.form.render(f, form_area);

        let items_block = Block::default()
            .title(format!("Productos ({})", self.items.len()))
            .borders(Borders::ALL)
            .border_style(if self.focus == CompositeFocus::Items {
                Styles::active_border()
            } else {
                Styles::inactive_border()
            });
        let items_area = items_block.inner(chunks[1]);
        f.render_widget(items_block, chunks[1]);
        self.items_table.render(f, items_area, &|row, key| match key {
            "more" => Line::from("⋯"),
            "product_name" => Line::from(truncate(&cell_text(row.get(key)), 32)),
            _ => Line::from(cell_text(row.get(key))),
        });

        if let Some(menu) = self.menu.as_mut() {
            menu.render(f, area);
        }
    }

    pub fn hint(&self) -> String {
        let submit = match self.mode {
            SaleFormMode::Sale => "Ctrl+S: crear venta",
            SaleFormMode::Quote => "Ctrl+S: crear cotización",
        };
        format!("Enter: agregar producto | {submit} | Tab: productos | Esc: cancelar")
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
            "clients",
            vec![json!({ "id": 2, "name": "Ana", "last_name": "Reyes" })],
        );
        api.seed(
            "products",
            vec![json!({ "id": 5, "name": "Pistón", "container_key": "A-1" })],
        );
        api
    }

    async fn loaded(mode: SaleFormMode, api: &Arc<MemoryApi>) -> (SaleFormScreen, Toasts) {
        let ctx = test_ctx(api.clone());
        let mut toasts = Toasts::new();
        let mut screen = SaleFormScreen::new(mode, 10);
        screen.refresh(&ctx, &mut toasts).await.unwrap();
        (screen, toasts)
    }

    fn add_piston(screen: &mut SaleFormScreen, price: &str, quantity: &str) {
        let product = screen.field_product();
        let price_index = screen.field_price();
        let quantity_index = screen.field_quantity();
        screen.form.field_mut(product).select_option_by_id(5);
        screen.form.field_mut(price_index).set_value(price);
        screen.form.field_mut(quantity_index).set_value(quantity);
        screen.add_item();
    }

    #[tokio::test]
    async fn test_sale_statuses_exclude_the_quote_status() {
        let api = seeded_api();
        let (mut screen, _) = loaded(SaleFormMode::Sale, &api).await;
        let index = screen.field_status();
        let field = screen.form.field_mut(index);
        field.select_option_by_id(3);
        // The reserved status is not among the options.
        assert_eq!(field.selected_id(), None);
        field.select_option_by_id(1);
        assert_eq!(field.selected_id(), Some(1));
    }

    #[tokio::test]
    async fn test_quote_mode_fixes_the_resolved_status() {
        let api = seeded_api();
        let (mut screen, mut toasts) = loaded(SaleFormMode::Quote, &api).await;
        let ctx = test_ctx(api.clone());
        assert_eq!(screen.quote_status, Some(3));

        let client_index = screen.field_client();
        screen.form.field_mut(client_index).select_option_by_id(2);
        add_piston(&mut screen, "120.50", "2");

        let action = screen.submit(&ctx, &mut toasts).await.unwrap();
        assert!(matches!(action, ScreenAction::Pop));
        let sales = api.rows("sales");
        assert_eq!(sales[0]["sale_status_id"], json!(3));
        assert_eq!(sales[0]["client_id"], json!(2));
        let children = api.rows("product_sale");
        assert_eq!(children[0]["price_pu"], json!(120.5));
        assert_eq!(children[0]["amount"], json!(2));
    }

    #[tokio::test]
    async fn test_sale_submit_requires_client_and_items() {
        let api = seeded_api();
        let (mut screen, mut toasts) = loaded(SaleFormMode::Sale, &api).await;
        let ctx = test_ctx(api.clone());

        let status_index = screen.field_status();
        screen.form.field_mut(status_index).select_option_by_id(1);
        let action = screen.submit(&ctx, &mut toasts).await.unwrap();
        assert!(matches!(action, ScreenAction::None));
        assert!(!api.calls().iter().any(|c| c == "insert sales"));

        let client_index = screen.field_client();
        screen.form.field_mut(client_index).select_option_by_id(2);
        let action = screen.submit(&ctx, &mut toasts).await.unwrap();
        assert!(matches!(action, ScreenAction::None));
        assert_eq!(
            toasts.current().unwrap().message,
            "Agrega al menos un producto."
        );

        add_piston(&mut screen, "99", "1");
        let action = screen.submit(&ctx, &mut toasts).await.unwrap();
        assert!(matches!(action, ScreenAction::Pop));
        assert_eq!(api.rows("sales").len(), 1);
    }

    #[tokio::test]
    async fn test_items_are_removed_by_stable_key() {
        let api = seeded_api();
        let (mut screen, _) = loaded(SaleFormMode::Sale, &api).await;

        add_piston(&mut screen, "10", "1");
        add_piston(&mut screen, "20", "2");
        add_piston(&mut screen, "30", "3");

        let middle_key = screen.items.items()[1].key;
        screen.items.remove_by_key(middle_key);
        screen.items_table.set_rows(screen.items.to_rows());

        let prices: Vec<f64> = screen
            .items
            .items()
            .iter()
            .filter_map(|i| i.unit_price)
            .collect();
        assert_eq!(prices, vec![10.0, 30.0]);
    }
}
