//! Tabbed workspace shown after sign-in

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    widgets::{Block, Borders, Tabs},
    Frame,
};
use tracing::error;

use crate::tui::app::{AppCtx, Route, ScreenAction};
use crate::tui::components::{ConfirmDialog, Toast, Toasts};
use crate::tui::screens::{
    ClientsTab, LoginScreen, OrdersTab, ProductsTab, QuotesTab, SalesTab,
};
use crate::tui::ui::Styles;

const TAB_TITLES: [&str; 5] = [
    "Productos",
    "Clientes",
    "Ordenes",
    "Ventas",
    "Cotizaciones",
];

pub struct TabsScreen {
    active: usize,
    products: ProductsTab,
    clients: ClientsTab,
    orders: OrdersTab,
    sales: SalesTab,
    quotes: QuotesTab,
    logout_pending: bool,
}

impl TabsScreen {
    pub fn new(rows_per_page: usize) -> Self {
        Self {
            active: 0,
            products: ProductsTab::new(rows_per_page),
            clients: ClientsTab::new(rows_per_page),
            orders: OrdersTab::new(rows_per_page),
            sales: SalesTab::new(rows_per_page),
            quotes: QuotesTab::new(rows_per_page),
            logout_pending: false,
        }
    }

    /// Only the visible tab refetches, like a view gaining focus.
    pub async fn refresh(&mut self, ctx: &AppCtx, toasts: &mut Toasts) -> Result<()> {
        match self.active {
            0 => self.products.refresh(ctx, toasts).await,
            1 => self.clients.refresh(ctx, toasts).await,
            2 => self.orders.refresh(ctx, toasts).await,
            3 => self.sales.refresh(ctx, toasts).await,
            _ => self.quotes.refresh(ctx, toasts).await,
        }
    }

    pub async fn handle_key(
        &mut self,
        key: KeyEvent,
        ctx: &AppCtx,
        toasts: &mut Toasts,
    ) -> Result<ScreenAction> {
        if key.code == KeyCode::Char('l') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.logout_pending = true;
            return Ok(ScreenAction::Confirm(ConfirmDialog::new(
                "Cerrar Sesión",
                "Tendrás que iniciar sesión de nuevo.",
            )));
        }

        match key.code {
            KeyCode::Tab => {
                self.active = (self.active + 1) % TAB_TITLES.len();
                self.refresh(ctx, toasts).await?;
            }
            KeyCode::BackTab => {
                self.active = if self.active == 0 {
                    TAB_TITLES.len() - 1
                } else {
                    self.active - 1
                };
                self.refresh(ctx, toasts).await?;
            }
            KeyCode::Char(c @ '1'..='5') => {
                self.active = (c as usize) - ('1' as usize);
                self.refresh(ctx, toasts).await?;
            }
            KeyCode::Char('q') => return Ok(ScreenAction::Quit),
            _ => {
                return match self.active {
                    0 => self.products.handle_key(key, ctx, toasts).await,
                    1 => self.clients.handle_key(key, ctx, toasts).await,
                    2 => self.orders.handle_key(key, ctx, toasts).await,
                    3 => self.sales.handle_key(key, ctx, toasts).await,
                    _ => self.quotes.handle_key(key, ctx, toasts).await,
                };
            }
        }
        Ok(ScreenAction::None)
    }

    pub async fn on_confirm(&mut self, ctx: &AppCtx, toasts: &mut Toasts) -> Result<ScreenAction> {
        if self.logout_pending {
            self.logout_pending = false;
            return match ctx.auth.sign_out().await {
                Ok(()) => {
                    toasts.show(Toast::info("La sesión se ha cerrado."));
                    Ok(ScreenAction::Replace(Box::new(Route::Login(
                        LoginScreen::new(),
                    ))))
                }
                Err(e) => {
                    error!("Logout error: {e}");
                    toasts.show(Toast::error("No se pudo cerrar la sesión."));
                    Ok(ScreenAction::None)
                }
            };
        }
        match self.active {
            0 => self.products.on_confirm(ctx, toasts).await,
            1 => self.clients.on_confirm(ctx, toasts).await,
            2 => self.orders.on_confirm(ctx, toasts).await,
            3 => self.sales.on_confirm(ctx, toasts).await,
            _ => self.quotes.on_confirm(ctx, toasts).await,
        }
    }

    pub fn on_cancel(&mut self) {
        if self.logout_pending {
            self.logout_pending = false;
            return;
        }
        match self.active {
            0 => self.products.on_cancel(),
            1 => self.clients.on_cancel(),
            2 => self.orders.on_cancel(),
            3 => self.sales.on_cancel(),
            _ => self.quotes.on_cancel(),
        }
    }

    pub fn draw(&mut self, f: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(0)])
            .split(area);

        let tabs = Tabs::new(TAB_TITLES.to_vec())
            .select(self.active)
            .highlight_style(Styles::selected())
            .block(Block::default().borders(Borders::ALL).title("gestor"));
        f.render_widget(tabs, chunks[0]);

        match self.active {
            0 => self.products.draw(f, chunks[1]),
            1 => self.clients.draw(f, chunks[1]),
            2 => self.orders.draw(f, chunks[1]),
            3 => self.sales.draw(f, chunks[1]),
            _ => self.quotes.draw(f, chunks[1]),
        }
    }

    pub fn hint(&self) -> String {
        let tab_hint = match self.active {
            0 => self.products.hint(),
            1 => self.clients.hint(),
            2 => self.orders.hint(),
            3 => self.sales.hint(),
            _ => self.quotes.hint(),
        };
        format!("{tab_hint} | Tab: pestaña | Ctrl+L: cerrar sesión | q: salir")
    }
}
