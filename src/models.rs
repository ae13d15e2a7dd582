//! Typed records mirrored from the backend schema.
//!
//! The backend owns these rows; the client only caches them per screen.
//! Raw rows move through the API layer as field-keyed JSON maps and are
//! decoded into these structs at the screen boundary.

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

use crate::api::ApiError;

/// One backend record surfaced to the UI as a field-keyed mapping.
pub type Row = serde_json::Map<String, Value>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Client {
    pub id: i64,
    pub name: String,
    pub last_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locations: Option<Vec<Location>>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Client {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.name, self.last_name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Location {
    pub id: i64,
    pub address: String,
    pub postal_code: String,
    #[serde(default)]
    pub notes: Option<String>,
    pub client_id: i64,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub container_key: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub order_status_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sale {
    pub id: i64,
    pub sale_status_id: i64,
    pub client_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client: Option<Client>,
    #[serde(default)]
    pub completed_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// A row of `order_statuses` or `sale_statuses`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Status {
    pub id: i64,
    pub name: String,
}

/// Status name reserved for quotes; sales carrying it are listed on the
/// quotes tab and nowhere else.
pub const QUOTE_STATUS_NAME: &str = "Cotización";

/// One product+quantity(+unit price) entry nested in a composite form.
///
/// `key` is generated locally when the item is appended and is the only
/// identity used for removal; positions are never used.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineItem {
    pub key: u64,
    pub product_id: i64,
    pub product_name: String,
    pub quantity: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_price: Option<f64>,
}

/// Line items of a composite form, keyed by a monotonic local counter.
#[derive(Debug, Default)]
pub struct LineItems {
    items: Vec<LineItem>,
    next_key: u64,
}

impl LineItems {
    pub fn push(&mut self, product_id: i64, product_name: String, quantity: i64, unit_price: Option<f64>) {
        let key = self.next_key;
        self.next_key += 1;
        self.items.push(LineItem {
            key,
            product_id,
            product_name,
            quantity,
            unit_price,
        });
    }

    pub fn remove_by_key(&mut self, key: u64) {
        self.items.retain(|item| item.key != key);
    }

    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Rows for the table renderer, one per item, carrying the stable key.
    pub fn to_rows(&self) -> Vec<Row> {
        self.items.iter().map(|item| to_row(item)).collect()
    }
}

/// Serialize a record into a field-keyed row for the table renderer.
pub fn to_row<T: Serialize>(record: &T) -> Row {
    match serde_json::to_value(record) {
        Ok(Value::Object(map)) => map,
        _ => Row::new(),
    }
}

pub fn to_rows<T: Serialize>(records: &[T]) -> Vec<Row> {
    records.iter().map(to_row).collect()
}

/// Decode raw backend rows into typed records.
pub fn from_rows<T: DeserializeOwned>(rows: Vec<Row>) -> Result<Vec<T>, ApiError> {
    rows.into_iter()
        .map(|row| serde_json::from_value(Value::Object(row)).map_err(ApiError::from))
        .collect()
}
