//! Screens composing the table renderer, action menus and forms

pub mod client_detail;
pub mod client_form;
pub mod clients;
pub mod location_form;
pub mod login;
pub mod order_form;
pub mod orders;
pub mod product_form;
pub mod products;
pub mod quotes;
pub mod sale_form;
pub mod sales;
pub mod tabs;

pub use client_detail::ClientDetailScreen;
pub use client_form::ClientFormScreen;
pub use clients::ClientsTab;
pub use location_form::LocationFormScreen;
pub use login::LoginScreen;
pub use order_form::OrderFormScreen;
pub use orders::OrdersTab;
pub use product_form::{ProductFormMode, ProductFormScreen};
pub use products::ProductsTab;
pub use quotes::QuotesTab;
pub use sale_form::{SaleFormMode, SaleFormScreen};
pub use sales::SalesTab;
pub use tabs::TabsScreen;

use serde_json::Value;

use crate::models::Row;

/// Message emitted by a list row's action menu; the handler closure
/// captured the row id when the menu was built.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RowAction {
    Open(i64),
    Delete(i64),
}

/// Backend-assigned numeric id of a table row.
pub fn row_id(row: &Row) -> Option<i64> {
    row.get("id").and_then(Value::as_i64)
}

/// `name` field of a joined sub-record (e.g. a status).
pub fn nested_name(row: &Row, key: &str) -> String {
    match row.get(key) {
        Some(Value::Object(nested)) => nested
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        _ => String::new(),
    }
}

/// "name last_name" of a joined client sub-record.
pub fn client_cell(row: &Row, key: &str) -> String {
    match row.get(key) {
        Some(Value::Object(client)) => format!(
            "{} {}",
            client.get("name").and_then(Value::as_str).unwrap_or_default(),
            client
                .get("last_name")
                .and_then(Value::as_str)
                .unwrap_or_default()
        ),
        _ => String::new(),
    }
}

/// Screen dependencies over the in-memory backend fake.
#[cfg(test)]
pub fn test_ctx(api: std::sync::Arc<crate::api::mock::MemoryApi>) -> crate::tui::app::AppCtx {
    crate::tui::app::AppCtx {
        api: api.clone(),
        auth: api,
        rows_per_page: 10,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_client_cell_formats_the_joined_record() {
        let row = json!({ "client": { "name": "Ana", "last_name": "Reyes" } });
        let row = row.as_object().unwrap();
        assert_eq!(client_cell(row, "client"), "Ana Reyes");
        assert_eq!(client_cell(row, "missing"), "");
    }
}
