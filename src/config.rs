//! Centralized configuration management for gestor

use anyhow::{bail, Context, Result};

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the hosted backend (e.g. `https://xyz.example.co`)
    pub api_url: String,
    /// Project API key sent with every request
    pub api_key: String,
    /// Access token of a previously established session, if any
    pub access_token: Option<String>,
    /// Rows shown per table page
    pub rows_per_page: usize,
    /// HTTP client configuration
    pub http: HttpConfig,
    /// Log file name (written next to the working directory)
    pub log_file: String,
}

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Request timeout in seconds
    pub timeout_seconds: u64,
    /// User agent string
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
            user_agent: concat!("gestor/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables and defaults
    pub fn from_env() -> Result<Self> {
        let api_url = std::env::var("GESTOR_API_URL").unwrap_or_default();
        let api_key = std::env::var("GESTOR_API_KEY").unwrap_or_default();
        let access_token = std::env::var("GESTOR_ACCESS_TOKEN").ok();

        let rows_per_page = parse_env_var("GESTOR_ROWS_PER_PAGE")?.unwrap_or(10);

        let http = HttpConfig {
            timeout_seconds: parse_env_var("GESTOR_HTTP_TIMEOUT_SECS")?.unwrap_or(30),
            ..Default::default()
        };

        let log_file =
            std::env::var("GESTOR_LOG_FILE").unwrap_or_else(|_| "gestor.log".to_string());

        Ok(Self {
            api_url,
            api_key,
            access_token,
            rows_per_page,
            http,
            log_file,
        })
    }

    /// Validate the configuration before the client starts
    pub fn validate(&self) -> Result<()> {
        if self.api_url.is_empty() {
            bail!("missing backend URL (set GESTOR_API_URL or pass --api-url)");
        }
        if self.api_key.is_empty() {
            bail!("missing backend API key (set GESTOR_API_KEY or pass --api-key)");
        }
        if self.rows_per_page == 0 {
            bail!("rows per page must be at least 1");
        }
        if self.http.timeout_seconds == 0 {
            bail!("HTTP timeout must be at least 1 second");
        }
        Ok(())
    }
}

/// Helper function to parse environment variable as a specific type
fn parse_env_var<T>(var_name: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display + Send + Sync + std::error::Error + 'static,
{
    match std::env::var(var_name) {
        Ok(val) => val.parse().map(Some).with_context(|| {
            format!("Failed to parse environment variable {} = '{}'", var_name, val)
        }),
        Err(_) => Ok(None),
    }
}
