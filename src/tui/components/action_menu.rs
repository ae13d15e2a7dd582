//! Per-row action menu.
//!
//! A declarative list of actions rendered as a popup over the table.
//! Each action carries a zero-argument handler closure that captured the
//! row-identifying data it needs when the menu was built; the menu never
//! holds a reference to the row itself. Selecting an entry invokes its
//! handler exactly once and yields the handler's message for the screen
//! to act on.

use ratatui::{
    layout::Rect,
    widgets::{Block, Borders, Clear, List, ListItem, ListState},
    Frame,
};

use crate::tui::ui::{centered_rect, Styles};

pub struct Action<M> {
    id: &'static str,
    label: String,
    destructive: bool,
    handler: Box<dyn Fn() -> M>,
}

impl<M> Action<M> {
    pub fn new(id: &'static str, label: &str, handler: impl Fn() -> M + 'static) -> Self {
        Self {
            id,
            label: label.to_string(),
            destructive: false,
            handler: Box::new(handler),
        }
    }

    pub fn destructive(id: &'static str, label: &str, handler: impl Fn() -> M + 'static) -> Self {
        Self {
            destructive: true,
            ..Self::new(id, label, handler)
        }
    }

    pub fn id(&self) -> &'static str {
        self.id
    }
}

pub struct ActionMenu<M> {
    title: String,
    actions: Vec<Action<M>>,
    cursor: usize,
    state: ListState,
}

impl<M> ActionMenu<M> {
    pub fn new(title: impl Into<String>, actions: Vec<Action<M>>) -> Self {
        let mut state = ListState::default();
        if !actions.is_empty() {
            state.select(Some(0));
        }
        Self {
            title: title.into(),
            actions,
            cursor: 0,
            state,
        }
    }

    pub fn up(&mut self) {
        if self.actions.is_empty() {
            return;
        }
        self.cursor = if self.cursor == 0 {
            self.actions.len() - 1
        } else {
            self.cursor - 1
        };
        self.state.select(Some(self.cursor));
    }

    pub fn down(&mut self) {
        if self.actions.is_empty() {
            return;
        }
        self.cursor = (self.cursor + 1) % self.actions.len();
        self.state.select(Some(self.cursor));
    }

    /// Invoke the highlighted entry's handler.
    pub fn select(&self) -> Option<M> {
        self.actions.get(self.cursor).map(|a| (a.handler)())
    }

    /// Invoke the handler registered under `id`; an unknown identifier
    /// fires nothing.
    pub fn select_by_id(&self, id: &str) -> Option<M> {
        self.actions
            .iter()
            .find(|a| a.id == id)
            .map(|a| (a.handler)())
    }

    pub fn render(&mut self, f: &mut Frame, area: Rect) {
        let popup = centered_rect(30, 30, area);
        f.render_widget(Clear, popup);

        let items: Vec<ListItem> = self
            .actions
            .iter()
            .map(|a| {
                let style = if a.destructive {
                    Styles::destructive()
                } else {
                    Styles::default()
                };
                ListItem::new(a.label.clone()).style(style)
            })
            .collect();

        let list = List::new(items)
            .highlight_style(Styles::selected())
            .block(
                Block::default()
                    .title(self.title.clone())
                    .borders(Borders::ALL)
                    .border_style(Styles::active_border()),
            );
        f.render_stateful_widget(list, popup, &mut self.state);
    }
}
