//! In-memory backend fake for exercising the load-edit-persist protocol
//! in tests without a network.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use super::table::{AuthApi, TableApi};
use super::{ApiError, Filter, Session};
use crate::models::Row;

#[derive(Default)]
pub struct MemoryApi {
    tables: Mutex<HashMap<String, Vec<Row>>>,
    fail_tables: Mutex<HashSet<String>>,
    fail_insert_after: Mutex<HashMap<String, usize>>,
    calls: Mutex<Vec<String>>,
    credentials: Option<(String, String)>,
    signed_in: Mutex<bool>,
}

impl MemoryApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_credentials(email: &str, password: &str) -> Self {
        Self {
            credentials: Some((email.to_string(), password.to_string())),
            ..Self::default()
        }
    }

    /// Seed a table from JSON literals.
    pub fn seed(&self, table: &str, rows: Vec<Value>) {
        let rows = rows
            .into_iter()
            .map(|v| v.as_object().expect("seed rows must be objects").clone())
            .collect();
        self.tables.lock().unwrap().insert(table.to_string(), rows);
    }

    /// Every operation against `table` fails from now on.
    pub fn fail_table(&self, table: &str) {
        self.fail_tables.lock().unwrap().insert(table.to_string());
    }

    /// Allow `n` successful inserts into `table`, then fail.
    pub fn fail_insert_after(&self, table: &str, n: usize) {
        self.fail_insert_after
            .lock()
            .unwrap()
            .insert(table.to_string(), n);
    }

    pub fn rows(&self, table: &str) -> Vec<Row> {
        self.tables
            .lock()
            .unwrap()
            .get(table)
            .cloned()
            .unwrap_or_default()
    }

    /// Operation log, one `"op table"` entry per call.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, op: &str, table: &str) {
        self.calls.lock().unwrap().push(format!("{op} {table}"));
    }

    fn check_failure(&self, table: &str) -> Result<(), ApiError> {
        if self.fail_tables.lock().unwrap().contains(table) {
            return Err(ApiError::Backend {
                status: 500,
                message: format!("injected failure for {table}"),
            });
        }
        Ok(())
    }

    fn next_id(rows: &[Row]) -> i64 {
        rows.iter()
            .filter_map(|r| r.get("id").and_then(Value::as_i64))
            .max()
            .unwrap_or(0)
            + 1
    }
}

#[async_trait]
impl TableApi for MemoryApi {
    async fn select(
        &self,
        table: &str,
        _projection: &str,
        filters: &[Filter],
    ) -> Result<Vec<Row>, ApiError> {
        self.record("select", table);
        self.check_failure(table)?;
        Ok(self
            .rows(table)
            .into_iter()
            .filter(|row| filters.iter().all(|f| f.matches(row)))
            .collect())
    }

    async fn insert(&self, table: &str, records: Vec<Row>) -> Result<Vec<Row>, ApiError> {
        self.record("insert", table);
        self.check_failure(table)?;

        if let Some(remaining) = self.fail_insert_after.lock().unwrap().get_mut(table) {
            if *remaining == 0 {
                return Err(ApiError::Backend {
                    status: 500,
                    message: format!("injected insert failure for {table}"),
                });
            }
            *remaining -= 1;
        }

        let mut tables = self.tables.lock().unwrap();
        let rows = tables.entry(table.to_string()).or_default();
        let mut written = Vec::new();
        for mut record in records {
            if !record.contains_key("id") {
                record.insert("id".to_string(), Value::from(Self::next_id(rows)));
            }
            rows.push(record.clone());
            written.push(record);
        }
        Ok(written)
    }

    async fn update(
        &self,
        table: &str,
        patch: Row,
        filters: &[Filter],
    ) -> Result<Vec<Row>, ApiError> {
        self.record("update", table);
        self.check_failure(table)?;

        let mut tables = self.tables.lock().unwrap();
        let rows = tables.entry(table.to_string()).or_default();
        let mut written = Vec::new();
        for row in rows.iter_mut() {
            if filters.iter().all(|f| f.matches(row)) {
                for (key, value) in &patch {
                    row.insert(key.clone(), value.clone());
                }
                written.push(row.clone());
            }
        }
        Ok(written)
    }

    async fn delete(&self, table: &str, filters: &[Filter]) -> Result<(), ApiError> {
        self.record("delete", table);
        self.check_failure(table)?;

        let mut tables = self.tables.lock().unwrap();
        let rows = tables.entry(table.to_string()).or_default();
        rows.retain(|row| !filters.iter().all(|f| f.matches(row)));
        Ok(())
    }
}

#[async_trait]
impl AuthApi for MemoryApi {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, ApiError> {
        match &self.credentials {
            Some((e, p)) if e == email && p == password => {
                *self.signed_in.lock().unwrap() = true;
                Ok(Session {
                    access_token: "test-token".to_string(),
                    email: Some(email.to_string()),
                })
            }
            _ => Err(ApiError::Auth("invalid email or password".to_string())),
        }
    }

    async fn sign_out(&self) -> Result<(), ApiError> {
        *self.signed_in.lock().unwrap() = false;
        Ok(())
    }

    fn has_session(&self) -> bool {
        *self.signed_in.lock().unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_insert_assigns_sequential_ids() {
        let api = MemoryApi::new();
        api.seed("products", vec![json!({ "id": 4, "name": "Pistón" })]);

        let written = api
            .insert(
                "products",
                vec![json!({ "name": "Manguera" }).as_object().unwrap().clone()],
            )
            .await
            .unwrap();
        assert_eq!(written[0]["id"], json!(5));
        assert_eq!(api.rows("products").len(), 2);
    }

    #[tokio::test]
    async fn test_select_applies_filters() {
        let api = MemoryApi::new();
        api.seed(
            "locations",
            vec![
                json!({ "id": 1, "client_id": 3 }),
                json!({ "id": 2, "client_id": 4 }),
            ],
        );
        let rows = api
            .select("locations", "*", &[Filter::eq("client_id", 3)])
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["id"], json!(1));
    }

    #[tokio::test]
    async fn test_sign_in_checks_credentials_and_tracks_the_session() {
        let api = MemoryApi::with_credentials("ana@taller.mx", "secreta");
        assert!(api.sign_in("ana@taller.mx", "mala").await.is_err());
        assert!(!api.has_session());

        let session = api.sign_in("ana@taller.mx", "secreta").await.unwrap();
        assert_eq!(session.access_token, "test-token");
        assert_eq!(session.email.as_deref(), Some("ana@taller.mx"));
        assert!(api.has_session());

        api.sign_out().await.unwrap();
        assert!(!api.has_session());
    }

    #[tokio::test]
    async fn test_injected_insert_failure_counts_down() {
        let api = MemoryApi::new();
        api.fail_insert_after("order_product", 1);

        let record = json!({ "order_id": 1 }).as_object().unwrap().clone();
        assert!(api.insert("order_product", vec![record.clone()]).await.is_ok());
        assert!(api.insert("order_product", vec![record]).await.is_err());
    }
}
