//! Production implementation of the data-access interface.
//!
//! Speaks the hosted backend's auto-generated REST conventions: table
//! endpoints under `rest/v1/`, filters as `column=op.value` query pairs,
//! `Prefer: return=representation` on writes, and a password-grant token
//! endpoint under `auth/v1/`.

use std::sync::RwLock;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Response, StatusCode};
use serde::Deserialize;
use tracing::debug;
use url::Url;

use super::{ApiError, Filter, Session};
use super::table::{AuthApi, TableApi};
use crate::config::Config;
use crate::models::Row;

pub struct RestApi {
    http: reqwest::Client,
    base: String,
    api_key: String,
    token: RwLock<Option<String>>,
}

impl RestApi {
    pub fn new(config: &Config) -> Result<Self, ApiError> {
        // Parse once so a malformed base URL fails at startup, not on the
        // first request.
        Url::parse(&config.api_url)?;

        let http = reqwest::Client::builder()
            .user_agent(&config.http.user_agent)
            .timeout(Duration::from_secs(config.http.timeout_seconds))
            .build()?;

        Ok(Self {
            http,
            base: config.api_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            token: RwLock::new(config.access_token.clone()),
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base, table)
    }

    fn auth_url(&self, endpoint: &str) -> String {
        format!("{}/auth/v1/{}", self.base, endpoint)
    }

    /// Bearer value: the session token once signed in, the anon key before.
    fn bearer(&self) -> String {
        self.token
            .read()
            .expect("token lock poisoned")
            .clone()
            .unwrap_or_else(|| self.api_key.clone())
    }

    fn request(&self, method: reqwest::Method, url: String) -> reqwest::RequestBuilder {
        self.http
            .request(method, url)
            .header("apikey", &self.api_key)
            .bearer_auth(self.bearer())
    }

    /// Map a non-2xx response onto the backend error, extracting the
    /// message field the service puts in its error bodies.
    async fn check(response: Response) -> Result<Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|v| {
                ["message", "msg", "error_description"]
                    .iter()
                    .find_map(|k| v.get(k).and_then(|m| m.as_str()).map(str::to_string))
            })
            .unwrap_or(body);

        Err(ApiError::Backend {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl TableApi for RestApi {
    async fn select(
        &self,
        table: &str,
        projection: &str,
        filters: &[Filter],
    ) -> Result<Vec<Row>, ApiError> {
        debug!(table, projection, "select");
        let mut query = vec![("select".to_string(), projection.to_string())];
        query.extend(filters.iter().map(Filter::to_query_pair));

        let response = self
            .request(reqwest::Method::GET, self.table_url(table))
            .query(&query)
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    async fn insert(&self, table: &str, records: Vec<Row>) -> Result<Vec<Row>, ApiError> {
        debug!(table, count = records.len(), "insert");
        let response = self
            .request(reqwest::Method::POST, self.table_url(table))
            .header("Prefer", "return=representation")
            .json(&records)
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    async fn update(
        &self,
        table: &str,
        patch: Row,
        filters: &[Filter],
    ) -> Result<Vec<Row>, ApiError> {
        debug!(table, "update");
        let query: Vec<_> = filters.iter().map(Filter::to_query_pair).collect();
        let response = self
            .request(reqwest::Method::PATCH, self.table_url(table))
            .header("Prefer", "return=representation")
            .query(&query)
            .json(&patch)
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    async fn delete(&self, table: &str, filters: &[Filter]) -> Result<(), ApiError> {
        debug!(table, "delete");
        let query: Vec<_> = filters.iter().map(Filter::to_query_pair).collect();
        let response = self
            .request(reqwest::Method::DELETE, self.table_url(table))
            .query(&query)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    user: Option<TokenUser>,
}

#[derive(Deserialize)]
struct TokenUser {
    #[serde(default)]
    email: Option<String>,
}

#[async_trait]
impl AuthApi for RestApi {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, ApiError> {
        let response = self
            .http
            .post(self.auth_url("token"))
            .query(&[("grant_type", "password")])
            .header("apikey", &self.api_key)
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await?;

        if response.status() == StatusCode::BAD_REQUEST
            || response.status() == StatusCode::UNAUTHORIZED
        {
            return Err(ApiError::Auth("invalid email or password".to_string()));
        }
        let token: TokenResponse = Self::check(response).await?.json().await?;

        *self.token.write().expect("token lock poisoned") = Some(token.access_token.clone());
        Ok(Session {
            access_token: token.access_token,
            email: token.user.and_then(|u| u.email),
        })
    }

    async fn sign_out(&self) -> Result<(), ApiError> {
        let response = self
            .request(reqwest::Method::POST, self.auth_url("logout"))
            .header(header::CONTENT_LENGTH, 0)
            .send()
            .await?;
        Self::check(response).await?;

        *self.token.write().expect("token lock poisoned") = None;
        Ok(())
    }

    fn has_session(&self) -> bool {
        self.token.read().expect("token lock poisoned").is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HttpConfig;

    fn config(url: &str) -> Config {
        Config {
            api_url: url.to_string(),
            api_key: "anon-key".to_string(),
            access_token: None,
            rows_per_page: 10,
            http: HttpConfig::default(),
            log_file: "gestor.log".to_string(),
        }
    }

    #[test]
    fn test_urls_are_joined_without_double_slashes() {
        let api = RestApi::new(&config("https://backend.test/")).unwrap();
        assert_eq!(api.table_url("clients"), "https://backend.test/rest/v1/clients");
        assert_eq!(api.auth_url("token"), "https://backend.test/auth/v1/token");
    }

    #[test]
    fn test_bearer_prefers_session_token() {
        let api = RestApi::new(&config("https://backend.test")).unwrap();
        assert_eq!(api.bearer(), "anon-key");
        assert!(!api.has_session());

        *api.token.write().unwrap() = Some("jwt".to_string());
        assert_eq!(api.bearer(), "jwt");
        assert!(api.has_session());
    }

    #[test]
    fn test_malformed_base_url_is_rejected() {
        assert!(RestApi::new(&config("not a url")).is_err());
    }
}
