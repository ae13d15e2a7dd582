//! Terminal user interface
//!
//! Single event loop over a navigation stack of screens; all backend
//! calls are awaited inline from key handlers, so request/response
//! cycles never outlive the screen that issued them.

pub mod app;
pub mod components;
pub mod screens;
pub mod ui;

use std::io;

use anyhow::Result;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{error, info};

pub use app::App;

/// Set up the terminal, run the app, restore the terminal.
pub async fn run(mut app: App) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = app.run(&mut terminal).await;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    match result {
        Ok(()) => {
            info!("gestor exited");
            Ok(())
        }
        Err(e) => {
            error!("gestor exited with error: {e}");
            Err(e)
        }
    }
}
