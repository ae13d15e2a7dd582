use clap::Parser;

use crate::config::Config;

#[derive(Parser)]
#[command(name = "gestor")]
#[command(about = "Terminal client for managing clients, products, orders, sales and quotes")]
#[command(version)]
pub struct Cli {
    /// Base URL of the hosted backend (overrides GESTOR_API_URL)
    #[arg(long)]
    pub api_url: Option<String>,

    /// Backend API key (overrides GESTOR_API_KEY)
    #[arg(long)]
    pub api_key: Option<String>,

    /// Rows shown per table page (overrides GESTOR_ROWS_PER_PAGE)
    #[arg(long)]
    pub rows_per_page: Option<usize>,

    /// Log file path (overrides GESTOR_LOG_FILE)
    #[arg(long)]
    pub log_file: Option<String>,
}

impl Cli {
    /// Apply command-line overrides on top of the env-derived config
    pub fn apply_to(&self, config: &mut Config) {
        if let Some(ref url) = self.api_url {
            config.api_url = url.clone();
        }
        if let Some(ref key) = self.api_key {
            config.api_key = key.clone();
        }
        if let Some(rows) = self.rows_per_page {
            config.rows_per_page = rows;
        }
        if let Some(ref path) = self.log_file {
            config.log_file = path.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HttpConfig;

    #[test]
    fn test_cli_overrides_config() {
        let cli = Cli {
            api_url: Some("https://other.test".to_string()),
            api_key: None,
            rows_per_page: Some(25),
            log_file: None,
        };
        let mut config = Config {
            api_url: "https://backend.test".to_string(),
            api_key: "anon-key".to_string(),
            access_token: None,
            rows_per_page: 10,
            http: HttpConfig::default(),
            log_file: "gestor.log".to_string(),
        };
        cli.apply_to(&mut config);
        assert_eq!(config.api_url, "https://other.test");
        assert_eq!(config.api_key, "anon-key");
        assert_eq!(config.rows_per_page, 25);
    }
}
