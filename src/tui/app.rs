//! Application state: navigation stack, key dispatch, status bar.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout},
    widgets::{Block, Borders, Paragraph},
    Frame, Terminal,
};

use super::components::{ConfirmDialog, Toasts};
use super::screens::{
    ClientDetailScreen, ClientFormScreen, LocationFormScreen, LoginScreen, OrderFormScreen,
    ProductFormScreen, SaleFormScreen, TabsScreen,
};
use super::ui::Styles;
use crate::api::{AuthApi, TableApi};
use crate::config::Config;

/// Dependencies threaded into every screen; constructed once in `main`.
pub struct AppCtx {
    pub api: Arc<dyn TableApi>,
    pub auth: Arc<dyn AuthApi>,
    pub rows_per_page: usize,
}

/// What a screen asks the app to do after handling a key.
pub enum ScreenAction {
    None,
    Push(Box<Route>),
    Pop,
    Replace(Box<Route>),
    Confirm(ConfirmDialog),
    Quit,
}

/// One entry of the navigation stack.
pub enum Route {
    Login(LoginScreen),
    Workspace(TabsScreen),
    ClientDetail(ClientDetailScreen),
    ClientForm(ClientFormScreen),
    LocationForm(LocationFormScreen),
    ProductForm(ProductFormScreen),
    OrderForm(OrderFormScreen),
    SaleForm(SaleFormScreen),
}

impl Route {
    /// Called when the screen becomes visible (pushed, or uncovered by a
    /// pop): every screen issues its fetches here.
    async fn refresh(&mut self, ctx: &AppCtx, toasts: &mut Toasts) -> Result<()> {
        match self {
            Route::Login(s) => s.refresh(ctx, toasts).await,
            Route::Workspace(s) => s.refresh(ctx, toasts).await,
            Route::ClientDetail(s) => s.refresh(ctx, toasts).await,
            Route::ClientForm(s) => s.refresh(ctx, toasts).await,
            Route::LocationForm(s) => s.refresh(ctx, toasts).await,
            Route::ProductForm(s) => s.refresh(ctx, toasts).await,
            Route::OrderForm(s) => s.refresh(ctx, toasts).await,
            Route::SaleForm(s) => s.refresh(ctx, toasts).await,
        }
    }

    async fn handle_key(
        &mut self,
        key: KeyEvent,
        ctx: &AppCtx,
        toasts: &mut Toasts,
    ) -> Result<ScreenAction> {
        match self {
            Route::Login(s) => s.handle_key(key, ctx, toasts).await,
            Route::Workspace(s) => s.handle_key(key, ctx, toasts).await,
            Route::ClientDetail(s) => s.handle_key(key, ctx, toasts).await,
            Route::ClientForm(s) => s.handle_key(key, ctx, toasts).await,
            Route::LocationForm(s) => s.handle_key(key, ctx, toasts).await,
            Route::ProductForm(s) => s.handle_key(key, ctx, toasts).await,
            Route::OrderForm(s) => s.handle_key(key, ctx, toasts).await,
            Route::SaleForm(s) => s.handle_key(key, ctx, toasts).await,
        }
    }

    /// The active confirmation dialog was accepted.
    async fn on_confirm(&mut self, ctx: &AppCtx, toasts: &mut Toasts) -> Result<ScreenAction> {
        match self {
            Route::Workspace(s) => s.on_confirm(ctx, toasts).await,
            Route::ClientDetail(s) => s.on_confirm(ctx, toasts).await,
            _ => Ok(ScreenAction::None),
        }
    }

    /// The active confirmation dialog was declined: a no-op beyond
    /// dropping whatever was pending.
    fn on_cancel(&mut self) {
        match self {
            Route::Workspace(s) => s.on_cancel(),
            Route::ClientDetail(s) => s.on_cancel(),
            _ => {}
        }
    }

    fn draw(&mut self, f: &mut Frame, area: ratatui::layout::Rect) {
        match self {
            Route::Login(s) => s.draw(f, area),
            Route::Workspace(s) => s.draw(f, area),
            Route::ClientDetail(s) => s.draw(f, area),
            Route::ClientForm(s) => s.draw(f, area),
            Route::LocationForm(s) => s.draw(f, area),
            Route::ProductForm(s) => s.draw(f, area),
            Route::OrderForm(s) => s.draw(f, area),
            Route::SaleForm(s) => s.draw(f, area),
        }
    }

    fn hint(&self) -> String {
        match self {
            Route::Login(s) => s.hint(),
            Route::Workspace(s) => s.hint(),
            Route::ClientDetail(s) => s.hint(),
            Route::ClientForm(s) => s.hint(),
            Route::LocationForm(s) => s.hint(),
            Route::ProductForm(s) => s.hint(),
            Route::OrderForm(s) => s.hint(),
            Route::SaleForm(s) => s.hint(),
        }
    }
}

pub struct App {
    ctx: AppCtx,
    stack: Vec<Route>,
    toasts: Toasts,
    confirm: Option<ConfirmDialog>,
    should_quit: bool,
}

impl App {
    pub fn new(config: &Config, api: Arc<dyn TableApi>, auth: Arc<dyn AuthApi>) -> Self {
        let ctx = AppCtx {
            api,
            auth,
            rows_per_page: config.rows_per_page,
        };
        // A restored session skips the login screen.
        let initial = if ctx.auth.has_session() {
            Route::Workspace(TabsScreen::new(ctx.rows_per_page))
        } else {
            Route::Login(LoginScreen::new())
        };
        Self {
            ctx,
            stack: vec![initial],
            toasts: Toasts::new(),
            confirm: None,
            should_quit: false,
        }
    }

    /// Main event loop. Polls with a short tick so transient toasts
    /// expire even without input.
    pub async fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<()> {
        self.refresh_top().await?;

        loop {
            self.toasts.tick();
            terminal.draw(|f| self.draw(f))?;

            if event::poll(Duration::from_millis(200))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key).await?;
                    }
                }
            }

            if self.should_quit {
                break;
            }
        }
        Ok(())
    }

    async fn refresh_top(&mut self) -> Result<()> {
        if let Some(route) = self.stack.last_mut() {
            route.refresh(&self.ctx, &mut self.toasts).await?;
        }
        Ok(())
    }

    async fn handle_key(&mut self, key: KeyEvent) -> Result<()> {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return Ok(());
        }

        // An open confirmation dialog blocks everything else.
        if self.confirm.is_some() {
            match key.code {
                KeyCode::Enter => {
                    self.confirm = None;
                    let action = match self.stack.last_mut() {
                        Some(route) => route.on_confirm(&self.ctx, &mut self.toasts).await?,
                        None => ScreenAction::None,
                    };
                    self.apply(action).await?;
                }
                KeyCode::Esc => {
                    self.confirm = None;
                    if let Some(route) = self.stack.last_mut() {
                        route.on_cancel();
                    }
                }
                _ => {}
            }
            return Ok(());
        }

        let action = match self.stack.last_mut() {
            Some(route) => route.handle_key(key, &self.ctx, &mut self.toasts).await?,
            None => ScreenAction::Quit,
        };
        self.apply(action).await
    }

    async fn apply(&mut self, action: ScreenAction) -> Result<()> {
        match action {
            ScreenAction::None => {}
            ScreenAction::Push(route) => {
                self.stack.push(*route);
                self.refresh_top().await?;
            }
            ScreenAction::Pop => {
                if self.stack.len() > 1 {
                    self.stack.pop();
                    // The uncovered screen refetches, like a view
                    // regaining focus.
                    self.refresh_top().await?;
                }
            }
            ScreenAction::Replace(route) => {
                self.stack = vec![*route];
                self.refresh_top().await?;
            }
            ScreenAction::Confirm(dialog) => {
                self.confirm = Some(dialog);
            }
            ScreenAction::Quit => {
                self.should_quit = true;
            }
        }
        Ok(())
    }

    fn draw(&mut self, f: &mut Frame) {
        let size = f.size();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(3)])
            .split(size);

        if let Some(route) = self.stack.last_mut() {
            route.draw(f, chunks[0]);
        }

        // Status bar: active toast wins over the contextual hint.
        let (text, style) = match self.toasts.current() {
            Some(toast) => (toast.message.clone(), toast.style()),
            None => (
                self.stack.last().map(Route::hint).unwrap_or_default(),
                Styles::inactive(),
            ),
        };
        let status_bar = Paragraph::new(text)
            .style(style)
            .block(Block::default().borders(Borders::ALL));
        f.render_widget(status_bar, chunks[1]);

        if let Some(dialog) = &self.confirm {
            dialog.render(f, size);
        }
    }
}
