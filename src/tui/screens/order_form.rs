//! Order creation: status plus a nested line-item form
//!
//! Line items are appended locally and written after the order row; a
//! failed child insert rolls the order back (see operations).

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
        Column::new("Producto", "product_name", 4),
        Column::new("Cantidad", "quantity", 2),
        Column::new("Más", "more", 1),
    ]
}

#[derive(PartialEq)]
enum CompositeFocus {
    Fields,
    Items,
}

pub struct OrderFormScreen {
    form: Form,
    items: LineItems,
    items_table: TableView,
    focus: CompositeFocus,
    menu: Option<ActionMenu<u64>>,
    submitting: bool,
}

const FIELD_STATUS: usize = 0;
const FIELD_PRODUCT: usize = 1;
const FIELD_QUANTITY: usize = 2;

impl OrderFormScreen {
    pub fn new(rows_per_page: usize) -> Self {
        let mut items_table = TableView::new(item_columns(), rows_per_page);
        items_table.set_rows(Vec::new());
        Self {
            form: Form::new(vec![
                FormField::select("Estatus", Vec::new()).with_rules(vec![Rule::Required]),
                FormField::select("Producto", Vec::new()).with_rules(vec![Rule::Required]),
                FormField::integer("Cantidad").with_rules(vec![Rule::Required, Rule::Positive]),
            ]),
            items: LineItems::default(),
            items_table,
            focus: CompositeFocus::Fields,
            menu: None,
            submitting: false,
        }
    }

    pub async fn refresh(&mut self, ctx: &AppCtx, toasts: &mut Toasts) -> Result<()> {
        match operations::load_statuses(ctx.api.as_ref(), "order_statuses").await {
            Ok(statuses) => self.form.field_mut(FIELD_STATUS).set_options(
                statuses.into_iter().map(|s| (s.id, s.name)).collect(),
            ),
            Err(e) => {
                error!("Error cargando estatus: {e}");
                toasts.show(Toast::error("No se pudieron cargar los estatus."));
            }
        }
        match operations::load_products(ctx.api.as_ref()).await {
            Ok(products) => self.form.field_mut(FIELD_PRODUCT).set_options(
                products.into_iter().map(|p| (p.id, p.name)).collect(),
            ),
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
                        if self.form.current_index() == FIELD_QUANTITY {
                            self.focus = CompositeFocus::Items;
                        } else {
                            self.form.next_field();
                        }
                    }
                    KeyCode::BackTab | KeyCode::Up => self.form.previous_field(),
                    KeyCode::Down => self.form.next_field(),
                    KeyCode::Enter => self.add_item(toasts),
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

    /// Validate the item sub-form and append the entry under a fresh
    /// local key; the status field is untouched.
    fn add_item(&mut self, _toasts: &mut Toasts) {
        let product_ok = self.form.field_mut(FIELD_PRODUCT).validate();
        let quantity_ok = self.form.field_mut(FIELD_QUANTITY).validate();
        if !product_ok || !quantity_ok {
            return;
        }

        let product_id = self.form.field(FIELD_PRODUCT).selected_id().unwrap_or(-1);
        let product_name = self
            .form
            .field(FIELD_PRODUCT)
            .selected_label()
            .unwrap_or("Sin nombre")
            .to_string();
        let quantity = self.form.field(FIELD_QUANTITY).integer_value().unwrap_or(0);

        self.items.push(product_id, product_name, quantity, None);
        self.items_table.set_rows(self.items.to_rows());
        self.form.field_mut(FIELD_PRODUCT).clear();
        self.form.field_mut(FIELD_QUANTITY).clear();
    }

    async fn submit(&mut self, ctx: &AppCtx, toasts: &mut Toasts) -> Result<ScreenAction> {
        if self.submitting {
            return Ok(ScreenAction::None);
        }
        if !self.form.field_mut(FIELD_STATUS).validate() {
            return Ok(ScreenAction::None);
        }
        if self.items.is_empty() {
            toasts.show(Toast::error("Agrega al menos un producto."));
            return Ok(ScreenAction::None);
        }

        self.submitting = true;
        let status_id = self.form.field(FIELD_STATUS).selected_id().unwrap_or(-1);
        let result =
            operations::create_order_with_items(ctx.api.as_ref(), status_id, self.items.items())
                .await;
        self.submitting = false;

        match result {
            Ok(_order_id) => {
                toasts.show(Toast::success("La orden se ha creado."));
                Ok(ScreenAction::Pop)
            }
            Err(e @ ApiError::PartialChildren { .. }) => {
                error!("Order error: {e}");
                toasts.show(Toast::error(
                    "No se pudieron guardar todos los productos; la orden fue descartada.",
                ));
                Ok(ScreenAction::None)
            }
            Err(e) => {
                error!("Order error: {e}");
                toasts.show(Toast::error("No se pudo crear la orden."));
                Ok(ScreenAction::None)
            }
        }
    }

    pub fn draw(&mut self, f: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(11), Constraint::Min(0)])
            .split(area);

        let form_block = Block::default()
            .title("Nueva Orden")
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
        "Enter: agregar producto | Ctrl+S: crear orden | Tab: productos | Esc: cancelar"
            .to_string()
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
            "order_statuses",
            vec![
                json!({ "id": 1, "name": "Pendiente" }),
                json!({ "id": 2, "name": "Entregada" }),
            ],
        );
        api.seed(
            "products",
            vec![
                json!({ "id": 1, "name": "Pistón", "container_key": "A-1" }),
                json!({ "id": 2, "name": "Manguera", "container_key": "B-2" }),
            ],
        );
        api
    }

    async fn loaded(api: &Arc<MemoryApi>) -> (OrderFormScreen, Toasts) {
        let ctx = test_ctx(api.clone());
        let mut toasts = Toasts::new();
        let mut screen = OrderFormScreen::new(10);
        screen.refresh(&ctx, &mut toasts).await.unwrap();
        (screen, toasts)
    }

    fn pick_option(screen: &mut OrderFormScreen, field: usize, id: i64) {
        screen.form.field_mut(field).select_option_by_id(id);
    }

    #[tokio::test]
    async fn test_add_item_requires_product_and_positive_quantity() {
        let api = seeded_api();
        let (mut screen, mut toasts) = loaded(&api).await;

        screen.add_item(&mut toasts);
        assert!(screen.items.is_empty());

        pick_option(&mut screen, FIELD_PRODUCT, 1);
        screen.form.field_mut(FIELD_QUANTITY).set_value("0");
        screen.add_item(&mut toasts);
        assert!(screen.items.is_empty());

        screen.form.field_mut(FIELD_QUANTITY).set_value("3");
        screen.add_item(&mut toasts);
        assert_eq!(screen.items.len(), 1);
        assert_eq!(screen.items.items()[0].product_name, "Pistón");
        // The item sub-form resets for the next entry.
        assert_eq!(screen.form.field(FIELD_QUANTITY).text_value(), "");
    }

    #[tokio::test]
    async fn test_item_removal_uses_the_stable_key() {
        let api = seeded_api();
        let (mut screen, mut toasts) = loaded(&api).await;

        for quantity in ["1", "2", "3"] {
            pick_option(&mut screen, FIELD_PRODUCT, 1);
            screen.form.field_mut(FIELD_QUANTITY).set_value(quantity);
            screen.add_item(&mut toasts);
        }
        let middle_key = screen.items.items()[1].key;
        screen.items.remove_by_key(middle_key);
        screen.items_table.set_rows(screen.items.to_rows());

        let quantities: Vec<i64> = screen.items.items().iter().map(|i| i.quantity).collect();
        assert_eq!(quantities, vec![1, 3]);
    }

    #[tokio::test]
    async fn test_submit_without_items_issues_no_insert() {
        let api = seeded_api();
        let (mut screen, mut toasts) = loaded(&api).await;
        let ctx = test_ctx(api.clone());

        pick_option(&mut screen, FIELD_STATUS, 1);
        let action = screen.submit(&ctx, &mut toasts).await.unwrap();
        assert!(matches!(action, ScreenAction::None));
        assert!(!api.calls().iter().any(|c| c == "insert orders"));
        assert_eq!(toasts.current().unwrap().message, "Agrega al menos un producto.");
    }

    #[tokio::test]
    async fn test_submit_writes_order_and_children() {
        let api = seeded_api();
        let (mut screen, mut toasts) = loaded(&api).await;
        let ctx = test_ctx(api.clone());

        pick_option(&mut screen, FIELD_STATUS, 2);
        pick_option(&mut screen, FIELD_PRODUCT, 2);
        screen.form.field_mut(FIELD_QUANTITY).set_value("5");
        screen.add_item(&mut toasts);

        let action = screen.submit(&ctx, &mut toasts).await.unwrap();
        assert!(matches!(action, ScreenAction::Pop));
        assert_eq!(api.rows("orders").len(), 1);
        assert_eq!(api.rows("orders")[0]["order_status_id"], json!(2));
        let children = api.rows("order_product");
        assert_eq!(children.len(), 1);
        assert_eq!(children[0]["amount"], json!(5));
    }

    #[tokio::test]
    async fn test_failed_child_write_surfaces_one_aggregated_error() {
        let api = seeded_api();
        let (mut screen, mut toasts) = loaded(&api).await;
        let ctx = test_ctx(api.clone());
        api.fail_table("order_product");

        pick_option(&mut screen, FIELD_STATUS, 1);
        pick_option(&mut screen, FIELD_PRODUCT, 1);
        screen.form.field_mut(FIELD_QUANTITY).set_value("2");
        screen.add_item(&mut toasts);

        let action = screen.submit(&ctx, &mut toasts).await.unwrap();
        assert!(matches!(action, ScreenAction::None));
        assert!(api.rows("orders").is_empty());
        assert!(toasts
            .current()
            .unwrap()
            .message
            .contains("descartada"));
    }
}
