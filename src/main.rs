use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tracing::info;

mod api;
mod cli;
mod config;
mod models;
mod operations;
mod tui;

use api::RestApi;
use cli::Cli;
use config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::from_env()?;
    cli.apply_to(&mut config);
    config.validate()?;

    // Set default log level to INFO if not specified
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "gestor=info");
    }

    // Log to a file only: stderr would corrupt the terminal UI.
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

    let file_appender = tracing_appender::rolling::never(".", &config.log_file);
    let (writer, _guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_filter(EnvFilter::from_default_env()),
        )
        .init();

    info!("Starting gestor against {}", config.api_url);

    let rest = Arc::new(RestApi::new(&config)?);
    let app = tui::App::new(&config, rest.clone(), rest);
    tui::run(app).await
}
