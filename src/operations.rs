//! Typed data operations the screens call.
//!
//! Each function maps one user-visible action onto the minimal
//! data-access interface: list loads sort ascending by id (display
//! stability is not guaranteed by the backend), detail loads join their
//! sub-records, and parent-plus-children creation compensates by
//! deleting the parent when a child write fails.

use serde_json::{json, Value};
use tracing::{error, warn};

use crate::api::{ApiError, Filter, TableApi};
use crate::models::{
    from_rows, Client, LineItem, Order, Product, Row, Sale, Status, QUOTE_STATUS_NAME,
};

fn record(value: Value) -> Row {
    value
        .as_object()
        .cloned()
        .expect("record literals are objects")
}

fn sort_by_id<T>(items: &mut [T], id: impl Fn(&T) -> i64) {
    items.sort_by_key(|item| id(item));
}

pub async fn load_clients(api: &dyn TableApi) -> Result<Vec<Client>, ApiError> {
    let rows = api.select("clients", "*", &[]).await?;
    let mut clients: Vec<Client> = from_rows(rows)?;
    sort_by_id(&mut clients, |c| c.id);
    Ok(clients)
}

pub async fn load_client_with_locations(
    api: &dyn TableApi,
    id: i64,
) -> Result<Client, ApiError> {
    let rows = api
        .select("clients", "*, locations(*)", &[Filter::eq("id", id)])
        .await?;
    let mut clients: Vec<Client> = from_rows(rows)?;
    if clients.is_empty() {
        return Err(ApiError::NotFound("clients".to_string()));
    }
    let mut client = clients.remove(0);
    if let Some(locations) = client.locations.as_mut() {
        sort_by_id(locations, |l| l.id);
    }
    Ok(client)
}

pub async fn create_client(
    api: &dyn TableApi,
    name: &str,
    last_name: &str,
) -> Result<(), ApiError> {
    api.insert(
        "clients",
        vec![record(json!({ "name": name, "last_name": last_name }))],
    )
    .await?;
    Ok(())
}

pub async fn update_client(
    api: &dyn TableApi,
    id: i64,
    name: &str,
    last_name: &str,
) -> Result<(), ApiError> {
    api.update(
        "clients",
        record(json!({ "name": name, "last_name": last_name })),
        &[Filter::eq("id", id)],
    )
    .await?;
    Ok(())
}

pub async fn create_location(
    api: &dyn TableApi,
    client_id: i64,
    address: &str,
    postal_code: &str,
    notes: Option<&str>,
) -> Result<(), ApiError> {
    api.insert(
        "locations",
        vec![record(json!({
            "client_id": client_id,
            "address": address,
            "postal_code": postal_code,
            "notes": notes.filter(|n| !n.is_empty()),
        }))],
    )
    .await?;
    Ok(())
}

pub async fn load_products(api: &dyn TableApi) -> Result<Vec<Product>, ApiError> {
    let rows = api.select("products", "*", &[]).await?;
    let mut products: Vec<Product> = from_rows(rows)?;
    sort_by_id(&mut products, |p| p.id);
    Ok(products)
}

pub async fn load_product(api: &dyn TableApi, id: i64) -> Result<Product, ApiError> {
    let rows = api
        .select("products", "*", &[Filter::eq("id", id)])
        .await?;
    let mut products: Vec<Product> = from_rows(rows)?;
    if products.is_empty() {
        return Err(ApiError::NotFound("products".to_string()));
    }
    Ok(products.remove(0))
}

pub async fn create_product(
    api: &dyn TableApi,
    name: &str,
    container_key: &str,
) -> Result<(), ApiError> {
    api.insert(
        "products",
        vec![record(json!({ "name": name, "container_key": container_key }))],
    )
    .await?;
    Ok(())
}

pub async fn update_product(
    api: &dyn TableApi,
    id: i64,
    name: &str,
    container_key: &str,
) -> Result<(), ApiError> {
    api.update(
        "products",
        record(json!({ "name": name, "container_key": container_key })),
        &[Filter::eq("id", id)],
    )
    .await?;
    Ok(())
}

pub async fn load_orders(api: &dyn TableApi) -> Result<Vec<Order>, ApiError> {
    let rows = api
        .select("orders", "*, status:order_statuses(*)", &[])
        .await?;
    let mut orders: Vec<Order> = from_rows(rows)?;
    sort_by_id(&mut orders, |o| o.id);
    Ok(orders)
}

pub async fn load_statuses(api: &dyn TableApi, table: &str) -> Result<Vec<Status>, ApiError> {
    let rows = api.select(table, "*", &[]).await?;
    let mut statuses: Vec<Status> = from_rows(rows)?;
    sort_by_id(&mut statuses, |s| s.id);
    Ok(statuses)
}

/// Sale statuses a sale may carry; the quote status is reserved.
pub async fn load_sale_statuses(api: &dyn TableApi) -> Result<Vec<Status>, ApiError> {
    let rows = api
        .select(
            "sale_statuses",
            "*",
            &[Filter::neq("name", QUOTE_STATUS_NAME)],
        )
        .await?;
    let mut statuses: Vec<Status> = from_rows(rows)?;
    sort_by_id(&mut statuses, |s| s.id);
    Ok(statuses)
}

/// Resolve the reserved quote status by name.
pub async fn quote_status_id(api: &dyn TableApi) -> Result<i64, ApiError> {
    let rows = api
        .select(
            "sale_statuses",
            "*",
            &[Filter::eq("name", QUOTE_STATUS_NAME)],
        )
        .await?;
    let statuses: Vec<Status> = from_rows(rows)?;
    statuses
        .first()
        .map(|s| s.id)
        .ok_or_else(|| ApiError::NotFound("sale_statuses".to_string()))
}

/// Sales excluding quotes, with the client sub-record joined.
pub async fn load_sales(api: &dyn TableApi, quote_status: i64) -> Result<Vec<Sale>, ApiError> {
    let rows = api
        .select(
            "sales",
            "*, client:clients(*)",
            &[Filter::neq("sale_status_id", quote_status)],
        )
        .await?;
    let mut sales: Vec<Sale> = from_rows(rows)?;
    sort_by_id(&mut sales, |s| s.id);
    Ok(sales)
}

/// Sales carrying the reserved quote status.
pub async fn load_quotes(api: &dyn TableApi, quote_status: i64) -> Result<Vec<Sale>, ApiError> {
    let rows = api
        .select(
            "sales",
            "*, client:clients(*)",
            &[Filter::eq("sale_status_id", quote_status)],
        )
        .await?;
    let mut quotes: Vec<Sale> = from_rows(rows)?;
    sort_by_id(&mut quotes, |s| s.id);
    Ok(quotes)
}

pub async fn delete_by_id(api: &dyn TableApi, table: &str, id: i64) -> Result<(), ApiError> {
    api.delete(table, &[Filter::eq("id", id)]).await
}

/// Create an order and its line items.
///
/// Child inserts are sequential (the backend has no client-reachable
/// transaction); if any fails, the order row is deleted again and one
/// aggregated error is returned.
pub async fn create_order_with_items(
    api: &dyn TableApi,
    order_status_id: i64,
    items: &[LineItem],
) -> Result<i64, ApiError> {
    let written = api
        .insert(
            "orders",
            vec![record(json!({ "order_status_id": order_status_id }))],
        )
        .await?;
    let order_id = written
        .first()
        .and_then(|row| row.get("id").and_then(Value::as_i64))
        .ok_or_else(|| ApiError::NotFound("orders".to_string()))?;

    let children = items
        .iter()
        .map(|item| {
            record(json!({
                "order_id": order_id,
                "product_id": item.product_id,
                "amount": item.quantity,
            }))
        })
        .collect();
    insert_children(api, "order_product", "orders", order_id, children).await?;
    Ok(order_id)
}

/// Create a sale (or quote) and its line items, compensating like
/// [`create_order_with_items`].
pub async fn create_sale_with_items(
    api: &dyn TableApi,
    sale_status_id: i64,
    client_id: i64,
    items: &[LineItem],
) -> Result<i64, ApiError> {
    let written = api
        .insert(
            "sales",
            vec![record(
                json!({ "sale_status_id": sale_status_id, "client_id": client_id }),
            )],
        )
        .await?;
    let sale_id = written
        .first()
        .and_then(|row| row.get("id").and_then(Value::as_i64))
        .ok_or_else(|| ApiError::NotFound("sales".to_string()))?;

    let children = items
        .iter()
        .map(|item| {
            record(json!({
                "sale_id": sale_id,
                "product_id": item.product_id,
                "amount": item.quantity,
                "price_pu": item.unit_price,
            }))
        })
        .collect();
    insert_children(api, "product_sale", "sales", sale_id, children).await?;
    Ok(sale_id)
}

async fn insert_children(
    api: &dyn TableApi,
    child_table: &str,
    parent_table: &str,
    parent_id: i64,
    children: Vec<Row>,
) -> Result<(), ApiError> {
    let total = children.len();
    let mut failed = 0;
    for child in children {
        if let Err(e) = api.insert(child_table, vec![child]).await {
            error!("failed to insert {child_table} row: {e}");
            failed += 1;
        }
    }
    if failed == 0 {
        return Ok(());
    }

    // The parent is incomplete; remove it so no half-written record
    // survives. The backend cascades the delete to children it accepted.
    if let Err(e) = delete_by_id(api, parent_table, parent_id).await {
        warn!("compensating delete of {parent_table} id={parent_id} failed: {e}");
    }
    Err(ApiError::PartialChildren { failed, total })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock::MemoryApi;
    use serde_json::json;

    fn seeded() -> MemoryApi {
        let api = MemoryApi::new();
        api.seed(
            "clients",
            vec![
                json!({ "id": 2, "name": "Berta", "last_name": "Núñez" }),
                json!({ "id": 1, "name": "Ana", "last_name": "Reyes" }),
            ],
        );
        api.seed(
            "sale_statuses",
            vec![
                json!({ "id": 1, "name": "Pendiente" }),
                json!({ "id": 2, "name": "Completada" }),
                json!({ "id": 3, "name": "Cotización" }),
            ],
        );
        api
    }

    #[tokio::test]
    async fn test_list_loads_sort_by_ascending_id() {
        let api = seeded();
        let clients = load_clients(&api).await.unwrap();
        assert_eq!(clients[0].name, "Ana");
        assert_eq!(clients[1].name, "Berta");
    }

    #[tokio::test]
    async fn test_quote_status_resolves_by_name() {
        let api = seeded();
        assert_eq!(quote_status_id(&api).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_sale_statuses_exclude_the_quote_status() {
        let api = seeded();
        let statuses = load_sale_statuses(&api).await.unwrap();
        assert!(statuses.iter().all(|s| s.name != QUOTE_STATUS_NAME));
        assert_eq!(statuses.len(), 2);
    }

    #[tokio::test]
    async fn test_sales_and_quotes_split_on_the_quote_status() {
        let api = seeded();
        api.seed(
            "sales",
            vec![
                json!({ "id": 1, "sale_status_id": 1, "client_id": 1 }),
                json!({ "id": 2, "sale_status_id": 3, "client_id": 1 }),
            ],
        );
        let sales = load_sales(&api, 3).await.unwrap();
        let quotes = load_quotes(&api, 3).await.unwrap();
        assert_eq!(sales.len(), 1);
        assert_eq!(sales[0].id, 1);
        assert_eq!(quotes.len(), 1);
        assert_eq!(quotes[0].id, 2);
    }

    #[tokio::test]
    async fn test_delete_by_id_removes_only_that_row() {
        let api = seeded();
        delete_by_id(&api, "clients", 1).await.unwrap();
        let rows = api.rows("clients");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["id"], json!(2));
    }

    #[tokio::test]
    async fn test_missing_detail_row_is_not_found() {
        let api = seeded();
        let err = load_client_with_locations(&api, 99).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    fn two_items() -> Vec<LineItem> {
        vec![
            LineItem {
                key: 0,
                product_id: 1,
                product_name: "Pistón".to_string(),
                quantity: 2,
                unit_price: Some(100.0),
            },
            LineItem {
                key: 1,
                product_id: 2,
                product_name: "Manguera".to_string(),
                quantity: 1,
                unit_price: Some(50.0),
            },
        ]
    }

    #[tokio::test]
    async fn test_sale_creation_writes_parent_then_children() {
        let api = seeded();
        let sale_id = create_sale_with_items(&api, 1, 1, &two_items()).await.unwrap();
        assert_eq!(api.rows("sales").len(), 1);
        let children = api.rows("product_sale");
        assert_eq!(children.len(), 2);
        assert!(children.iter().all(|c| c["sale_id"] == json!(sale_id)));
        assert_eq!(children[0]["price_pu"], json!(100.0));
    }

    #[tokio::test]
    async fn test_failed_child_insert_compensates_by_deleting_parent() {
        let api = seeded();
        api.fail_insert_after("product_sale", 1);

        let err = create_sale_with_items(&api, 1, 1, &two_items()).await.unwrap_err();
        assert!(matches!(
            err,
            ApiError::PartialChildren { failed: 1, total: 2 }
        ));
        // Compensation removed the half-written sale.
        assert!(api.rows("sales").is_empty());
        assert!(api
            .calls()
            .iter()
            .any(|c| c == "delete sales"));
    }

    #[tokio::test]
    async fn test_order_creation_compensates_too() {
        let api = seeded();
        api.fail_table("order_product");

        let items = vec![LineItem {
            key: 0,
            product_id: 1,
            product_name: "Pistón".to_string(),
            quantity: 3,
            unit_price: None,
        }];
        let err = create_order_with_items(&api, 1, &items).await.unwrap_err();
        assert!(matches!(err, ApiError::PartialChildren { failed: 1, total: 1 }));
        assert!(api.rows("orders").is_empty());
    }
}
