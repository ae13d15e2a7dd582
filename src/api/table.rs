//! The minimal data-access interface the screens depend on.

use async_trait::async_trait;

use super::{ApiError, Filter};
use crate::models::Row;

/// An authenticated backend session.
#[derive(Debug, Clone)]
pub struct Session {
    pub access_token: String,
    pub email: Option<String>,
}

/// Table-oriented reads and writes.
///
/// `projection` names the selected columns and may include joined
/// sub-records (`*, locations(*)`); filters are equality/inequality on a
/// single column. Inserts and updates return the written rows.
#[async_trait]
pub trait TableApi: Send + Sync {
    async fn select(
        &self,
        table: &str,
        projection: &str,
        filters: &[Filter],
    ) -> Result<Vec<Row>, ApiError>;

    async fn insert(&self, table: &str, records: Vec<Row>) -> Result<Vec<Row>, ApiError>;

    async fn update(
        &self,
        table: &str,
        patch: Row,
        filters: &[Filter],
    ) -> Result<Vec<Row>, ApiError>;

    async fn delete(&self, table: &str, filters: &[Filter]) -> Result<(), ApiError>;
}

/// Sign-in/sign-out, surfaced only at the login and logout screens.
#[async_trait]
pub trait AuthApi: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, ApiError>;

    async fn sign_out(&self) -> Result<(), ApiError>;

    /// Whether a session token is already held (restored or signed in).
    fn has_session(&self) -> bool;
}
