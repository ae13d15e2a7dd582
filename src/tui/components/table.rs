//! Schema-driven paginated table renderer.
//!
//! The table knows nothing about domain semantics: it is handed a column
//! schema, a row set and a cell formatter, slices the rows into pages and
//! delegates every cell to the formatter. Screens customize rendering
//! (joined sub-records, the "more" column) entirely through that
//! indirection.

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    text::Line,
    widgets::{Block, Borders, Cell, Paragraph, Row as TableRow, Table, TableState},
    Frame,
};

use crate::models::Row;
use crate::tui::ui::Styles;

/// One table column: display name, row field key, relative width weight.
#[derive(Debug, Clone)]
pub struct Column {
    pub name: String,
    pub key: String,
    pub weight: u16,
}

impl Column {
    pub fn new(name: &str, key: &str, weight: u16) -> Self {
        Self {
            name: name.to_string(),
            key: key.to_string(),
            weight: weight.max(1),
        }
    }
}

/// Paginated table over an in-memory row set.
pub struct TableView {
    columns: Vec<Column>,
    rows: Vec<Row>,
    loading: bool,
    rows_per_page: usize,
    page: usize,
    cursor: usize,
    state: TableState,
}

impl TableView {
    /// Starts in the loading state; call [`TableView::set_rows`] once the
    /// fetch resolves.
    pub fn new(columns: Vec<Column>, rows_per_page: usize) -> Self {
        Self {
            columns,
            rows: Vec::new(),
            loading: true,
            rows_per_page: rows_per_page.max(1),
            page: 0,
            cursor: 0,
            state: TableState::default(),
        }
    }

    pub fn set_loading(&mut self) {
        self.loading = true;
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Replace the row set. Recomputes the page count and re-clamps the
    /// current page and cursor into the new valid range.
    pub fn set_rows(&mut self, rows: Vec<Row>) {
        self.rows = rows;
        self.loading = false;
        self.page = self.page.min(self.page_count() - 1);
        self.clamp_cursor();
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Always ≥ 1 so an empty row set still renders its empty-state page.
    pub fn page_count(&self) -> usize {
        if self.rows.is_empty() {
            1
        } else {
            (self.rows.len() + self.rows_per_page - 1) / self.rows_per_page
        }
    }

    pub fn current_page(&self) -> usize {
        self.page
    }

    pub fn can_previous(&self) -> bool {
        self.page > 0
    }

    pub fn can_next(&self) -> bool {
        self.page + 1 < self.page_count()
    }

    /// Move one page back; no-op at the first page.
    pub fn previous_page(&mut self) {
        if self.can_previous() {
            self.page -= 1;
            self.cursor = 0;
        }
    }

    /// Move one page forward; no-op at the last page.
    pub fn next_page(&mut self) {
        if self.can_next() {
            self.page += 1;
            self.cursor = 0;
        }
    }

    /// The slice of rows on the current page.
    pub fn page_rows(&self) -> &[Row] {
        let start = self.page * self.rows_per_page;
        let end = (start + self.rows_per_page).min(self.rows.len());
        if start < self.rows.len() {
            &self.rows[start..end]
        } else {
            &[]
        }
    }

    pub fn cursor_up(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn cursor_down(&mut self) {
        if self.cursor + 1 < self.page_rows().len() {
            self.cursor += 1;
        }
    }

    /// The row under the cursor, if any.
    pub fn selected(&self) -> Option<&Row> {
        self.page_rows().get(self.cursor)
    }

    fn clamp_cursor(&mut self) {
        let len = self.page_rows().len();
        if len == 0 {
            self.cursor = 0;
        } else if self.cursor >= len {
            self.cursor = len - 1;
        }
    }

    /// Render the table plus pager controls.
    ///
    /// While loading, a single indicator row is shown and the pager is
    /// suppressed; an empty row set shows a placeholder row with the
    /// pager still visible (page count is 1).
    pub fn render(
        &mut self,
        f: &mut Frame,
        area: Rect,
        cell_content: &dyn Fn(&Row, &str) -> Line<'static>,
    ) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(3), Constraint::Length(1)])
            .split(area);

        let widths: Vec<Constraint> = {
            let total: u32 = self.columns.iter().map(|c| c.weight as u32).sum();
            self.columns
                .iter()
                .map(|c| Constraint::Ratio(c.weight as u32, total.max(1)))
                .collect()
        };

        let header = TableRow::new(
            self.columns
                .iter()
                .map(|c| Cell::from(c.name.clone()))
                .collect::<Vec<_>>(),
        )
        .style(Styles::header());

        let body: Vec<TableRow> = if self.loading {
            vec![TableRow::new(vec![Cell::from("Cargando...")]).style(Styles::inactive())]
        } else if self.rows.is_empty() {
            vec![TableRow::new(vec![Cell::from("Sin datos...")]).style(Styles::inactive())]
        } else {
            self.page_rows()
                .iter()
                .map(|row| {
                    TableRow::new(
                        self.columns
                            .iter()
                            .map(|c| Cell::from(cell_content(row, &c.key)))
                            .collect::<Vec<_>>(),
                    )
                })
                .collect()
        };

        let highlight = if self.loading || self.rows.is_empty() {
            None
        } else {
            Some(self.cursor)
        };
        self.state.select(highlight);

        let table = Table::new(body, widths)
            .header(header)
            .highlight_style(Styles::selected())
            .block(Block::default().borders(Borders::ALL).border_style(Styles::inactive_border()));
        f.render_stateful_widget(table, chunks[0], &mut self.state);

        if !self.loading {
            let prev_style = if self.can_previous() {
                Styles::title()
            } else {
                Styles::inactive()
            };
            let next_style = if self.can_next() {
                Styles::title()
            } else {
                Styles::inactive()
            };
            let pager = Line::from(vec![
                format!("Página {} de {}  ", self.page + 1, self.page_count()).into(),
                ratatui::text::Span::styled("← Anterior", prev_style),
                "  ".into(),
                ratatui::text::Span::styled("Siguiente →", next_style),
            ]);
            f.render_widget(Paragraph::new(pager).alignment(Alignment::Right), chunks[1]);
        }
    }
}
