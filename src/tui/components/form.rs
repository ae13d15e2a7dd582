//! Form fields with per-field validation rules.
//!
//! Validation runs locally before any network call: a form that fails
//! its rules never reaches the submit path. Edit screens capture a
//! baseline of the loaded values and only surface save/discard once the
//! live values diverge from it.

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph},
    Frame,
};

use crate::tui::ui::Styles;

#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    Text,
    Password,
    Integer,
    Decimal,
    Select,
}

/// Validation rules, checked in order; the first failure wins.
#[derive(Debug, Clone)]
pub enum Rule {
    Required,
    MinLen(usize),
    MaxLen(usize),
    Email,
    Positive,
    NonNegative,
}

pub struct FormField {
    pub label: String,
    value: String,
    placeholder: String,
    kind: FieldKind,
    rules: Vec<Rule>,
    focused: bool,
    cursor: usize,
    options: Vec<(i64, String)>,
    selected: Option<usize>,
    highlight: usize,
    open: bool,
    error: Option<String>,
}

impl FormField {
    fn new(label: &str, kind: FieldKind) -> Self {
        Self {
            label: label.to_string(),
            value: String::new(),
            placeholder: String::new(),
            kind,
            rules: Vec::new(),
            focused: false,
            cursor: 0,
            options: Vec::new(),
            selected: None,
            highlight: 0,
            open: false,
            error: None,
        }
    }

    pub fn text(label: &str) -> Self {
        Self::new(label, FieldKind::Text)
    }

    pub fn password(label: &str) -> Self {
        Self::new(label, FieldKind::Password)
    }

    pub fn integer(label: &str) -> Self {
        Self::new(label, FieldKind::Integer)
    }

    pub fn decimal(label: &str) -> Self {
        Self::new(label, FieldKind::Decimal)
    }

    pub fn select(label: &str, options: Vec<(i64, String)>) -> Self {
        Self {
            options,
            ..Self::new(label, FieldKind::Select)
        }
    }

    pub fn with_placeholder(mut self, placeholder: &str) -> Self {
        self.placeholder = placeholder.to_string();
        self
    }

    pub fn with_rules(mut self, rules: Vec<Rule>) -> Self {
        self.rules = rules;
        self
    }

    pub fn with_value(mut self, value: &str) -> Self {
        self.set_value(value);
        self
    }

    pub fn set_value(&mut self, value: &str) {
        self.value = value.to_string();
        self.cursor = self.value.len();
        self.error = None;
    }

    pub fn set_options(&mut self, options: Vec<(i64, String)>) {
        self.options = options;
        self.selected = None;
        self.highlight = 0;
    }

    pub fn set_focus(&mut self, focused: bool) {
        self.focused = focused;
        if !focused {
            self.open = false;
        }
    }

    pub fn text_value(&self) -> &str {
        &self.value
    }

    pub fn integer_value(&self) -> Option<i64> {
        self.value.parse().ok()
    }

    pub fn decimal_value(&self) -> Option<f64> {
        self.value.parse().ok()
    }

    /// Backend id of the chosen option, for select fields.
    pub fn selected_id(&self) -> Option<i64> {
        self.selected.map(|i| self.options[i].0)
    }

    pub fn selected_label(&self) -> Option<&str> {
        self.selected.map(|i| self.options[i].1.as_str())
    }

    /// Choose the option carrying this backend id (preloads and tests).
    pub fn select_option_by_id(&mut self, id: i64) {
        if let Some(i) = self.options.iter().position(|(oid, _)| *oid == id) {
            self.selected = Some(i);
            self.highlight = i;
            self.error = None;
        }
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn clear(&mut self) {
        self.value.clear();
        self.cursor = 0;
        self.selected = None;
        self.highlight = 0;
        self.open = false;
        self.error = None;
    }

    /// Canonical text form used for dirty-check baselines.
    pub fn snapshot(&self) -> String {
        match self.kind {
            FieldKind::Select => self
                .selected_id()
                .map(|id| id.to_string())
                .unwrap_or_default(),
            _ => self.value.clone(),
        }
    }

    fn insert_char(&mut self, c: char) {
        let accepted = match self.kind {
            FieldKind::Select => false,
            FieldKind::Integer => c.is_ascii_digit(),
            FieldKind::Decimal => c.is_ascii_digit() || (c == '.' && !self.value.contains('.')),
            _ => !c.is_control(),
        };
        if accepted {
            self.value.insert(self.cursor, c);
            self.cursor += c.len_utf8();
            self.error = None;
        }
    }

    fn delete_char(&mut self) {
        if self.cursor > 0 {
            let prev = self.value[..self.cursor]
                .chars()
                .next_back()
                .map(char::len_utf8)
                .unwrap_or(0);
            self.cursor -= prev;
            self.value.remove(self.cursor);
            self.error = None;
        }
    }

    fn delete_char_forward(&mut self) {
        if self.cursor < self.value.len() {
            self.value.remove(self.cursor);
            self.error = None;
        }
    }

    fn move_cursor_left(&mut self) {
        if self.cursor > 0 {
            let prev = self.value[..self.cursor]
                .chars()
                .next_back()
                .map(char::len_utf8)
                .unwrap_or(0);
            self.cursor -= prev;
        }
    }

    fn move_cursor_right(&mut self) {
        if self.cursor < self.value.len() {
            let next = self.value[self.cursor..]
                .chars()
                .next()
                .map(char::len_utf8)
                .unwrap_or(0);
            self.cursor += next;
        }
    }

    fn dropdown_up(&mut self) {
        if self.options.is_empty() {
            return;
        }
        self.highlight = if self.highlight == 0 {
            self.options.len() - 1
        } else {
            self.highlight - 1
        };
    }

    fn dropdown_down(&mut self) {
        if self.options.is_empty() {
            return;
        }
        self.highlight = (self.highlight + 1) % self.options.len();
    }

    fn choose(&mut self) {
        if !self.options.is_empty() {
            self.selected = Some(self.highlight);
            self.error = None;
        }
        self.open = false;
    }

    /// Check all rules; sets the field error and reports the verdict.
    pub fn validate(&mut self) -> bool {
        self.error = None;

        // Numeric fields must parse before any rule can judge them.
        match self.kind {
            FieldKind::Integer if !self.value.is_empty() && self.integer_value().is_none() => {
                self.error = Some("Número inválido".to_string());
                return false;
            }
            FieldKind::Decimal if !self.value.is_empty() && self.decimal_value().is_none() => {
                self.error = Some("Número inválido".to_string());
                return false;
            }
            _ => {}
        }

        for rule in &self.rules {
            let failure = match rule {
                Rule::Required => match self.kind {
                    FieldKind::Select => self.selected.is_none(),
                    _ => self.value.trim().is_empty(),
                },
                Rule::MinLen(n) => self.value.chars().count() < *n,
                Rule::MaxLen(n) => self.value.chars().count() > *n,
                Rule::Email => {
                    let mut parts = self.value.splitn(2, '@');
                    let local = parts.next().unwrap_or_default();
                    let domain = parts.next().unwrap_or_default();
                    local.is_empty() || !domain.contains('.')
                }
                Rule::Positive => match self.kind {
                    FieldKind::Decimal => self.decimal_value().map_or(true, |v| v <= 0.0),
                    _ => self.integer_value().map_or(true, |v| v <= 0),
                },
                Rule::NonNegative => match self.kind {
                    FieldKind::Decimal => self.decimal_value().map_or(true, |v| v < 0.0),
                    _ => self.integer_value().map_or(true, |v| v < 0),
                },
            };
            if failure {
                self.error = Some(rule_message(rule));
                return false;
            }
        }
        true
    }

    fn render(&self, f: &mut Frame, area: Rect) {
        let display = match self.kind {
            FieldKind::Password => "•".repeat(self.value.chars().count()),
            FieldKind::Select => self
                .selected_label()
                .unwrap_or(if self.placeholder.is_empty() {
                    "Selecciona..."
                } else {
                    self.placeholder.as_str()
                })
                .to_string(),
            _ => {
                if self.value.is_empty() {
                    self.placeholder.clone()
                } else {
                    self.value.clone()
                }
            }
        };

        let border_style = if self.focused {
            Styles::active_border()
        } else if self.error.is_some() {
            Styles::error()
        } else {
            Styles::inactive_border()
        };
        let title = match &self.error {
            Some(error) => format!("{} - {}", self.label, error),
            None => self.label.clone(),
        };
        let text_style = if self.value.is_empty() && self.selected.is_none() {
            Styles::inactive()
        } else {
            Styles::default()
        };

        let paragraph = Paragraph::new(display).style(text_style).block(
            Block::default()
                .title(title)
                .borders(Borders::ALL)
                .border_style(border_style),
        );
        f.render_widget(paragraph, area);

        if self.focused && self.kind != FieldKind::Select {
            let cursor_x = area.x + 1 + self.value[..self.cursor].chars().count() as u16;
            if cursor_x < area.x + area.width - 1 {
                f.set_cursor(cursor_x, area.y + 1);
            }
        }
    }

    fn render_dropdown(&self, f: &mut Frame, field_area: Rect, bounds: Rect) {
        if !self.open || self.options.is_empty() {
            return;
        }
        let height = (self.options.len() as u16 + 2).min(8);
        let y = (field_area.y + 2).min(bounds.bottom().saturating_sub(height));
        let popup = Rect::new(field_area.x + 2, y, field_area.width.saturating_sub(4), height);
        f.render_widget(Clear, popup);

        let items: Vec<ListItem> = self
            .options
            .iter()
            .map(|(_, label)| ListItem::new(label.clone()))
            .collect();
        let mut state = ListState::default();
        state.select(Some(self.highlight));
        let list = List::new(items)
            .highlight_style(Styles::selected())
            .block(
                Block::default()
                    .title("Opciones")
                    .borders(Borders::ALL)
                    .border_style(Styles::active_border()),
            );
        f.render_stateful_widget(list, popup, &mut state);
    }
}

fn rule_message(rule: &Rule) -> String {
    match rule {
        Rule::Required => "Requerido".to_string(),
        Rule::MinLen(n) => format!("Mínimo {n} caracteres"),
        Rule::MaxLen(n) => format!("Máximo {n} caracteres"),
        Rule::Email => "Correo inválido".to_string(),
        Rule::Positive => "Debe ser mayor que cero".to_string(),
        Rule::NonNegative => "No puede ser negativo".to_string(),
    }
}

/// Form container managing focus across its fields.
pub struct Form {
    pub fields: Vec<FormField>,
    current: usize,
}

impl Form {
    pub fn new(fields: Vec<FormField>) -> Self {
        let mut form = Self { fields, current: 0 };
        form.update_focus();
        form
    }

    fn update_focus(&mut self) {
        for (i, field) in self.fields.iter_mut().enumerate() {
            field.set_focus(i == self.current);
        }
    }

    pub fn field(&self, index: usize) -> &FormField {
        &self.fields[index]
    }

    pub fn field_mut(&mut self, index: usize) -> &mut FormField {
        &mut self.fields[index]
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current_field(&self) -> &FormField {
        &self.fields[self.current]
    }

    pub fn current_field_mut(&mut self) -> &mut FormField {
        &mut self.fields[self.current]
    }

    pub fn next_field(&mut self) {
        self.current = (self.current + 1) % self.fields.len();
        self.update_focus();
    }

    pub fn previous_field(&mut self) {
        self.current = if self.current == 0 {
            self.fields.len() - 1
        } else {
            self.current - 1
        };
        self.update_focus();
    }

    /// Validate every field; all errors are set, the first failing field
    /// receives focus.
    pub fn validate_all(&mut self) -> bool {
        let mut first_invalid = None;
        for (i, field) in self.fields.iter_mut().enumerate() {
            if !field.validate() && first_invalid.is_none() {
                first_invalid = Some(i);
            }
        }
        if let Some(i) = first_invalid {
            self.current = i;
            self.update_focus();
            return false;
        }
        true
    }

    /// Canonical values of all fields, captured as the dirty baseline.
    pub fn snapshot(&self) -> Vec<String> {
        self.fields.iter().map(FormField::snapshot).collect()
    }

    /// Whether live values diverge from a captured baseline.
    pub fn is_dirty(&self, baseline: &[String]) -> bool {
        self.snapshot() != baseline
    }

    pub fn clear(&mut self) {
        for field in &mut self.fields {
            field.clear();
        }
        self.current = 0;
        self.update_focus();
    }

    /// Editing keys shared by every form screen. Returns true when the
    /// key was consumed (screens handle Tab/submit themselves).
    pub fn handle_edit_key(&mut self, key: KeyEvent) -> bool {
        let field = self.current_field_mut();
        match key.code {
            KeyCode::Char(c) => {
                field.insert_char(c);
                field.kind != FieldKind::Select
            }
            KeyCode::Backspace => {
                field.delete_char();
                true
            }
            KeyCode::Delete => {
                field.delete_char_forward();
                true
            }
            KeyCode::Left => {
                field.move_cursor_left();
                true
            }
            KeyCode::Right => {
                field.move_cursor_right();
                true
            }
            KeyCode::Up if field.open => {
                field.dropdown_up();
                true
            }
            KeyCode::Down if field.open => {
                field.dropdown_down();
                true
            }
            KeyCode::Enter if field.kind == FieldKind::Select => {
                if field.open {
                    field.choose();
                } else {
                    field.open = true;
                    if let Some(i) = field.selected {
                        field.highlight = i;
                    }
                }
                true
            }
            KeyCode::Esc if field.open => {
                field.open = false;
                true
            }
            _ => false,
        }
    }

    /// Render fields stacked top to bottom, three rows each, then the
    /// open dropdown (if any) above them.
    pub fn render(&self, f: &mut Frame, area: Rect) {
        let constraints: Vec<Constraint> = self
            .fields
            .iter()
            .map(|_| Constraint::Length(3))
            .chain([Constraint::Min(0)])
            .collect();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .split(area);

        for (i, field) in self.fields.iter().enumerate() {
            field.render(f, chunks[i]);
        }
        for (i, field) in self.fields.iter().enumerate() {
            field.render_dropdown(f, chunks[i], area);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client_form() -> Form {
        Form::new(vec![
            FormField::text("Nombre(s)").with_rules(vec![Rule::Required]),
            FormField::text("Apellido(s)").with_rules(vec![Rule::Required]),
        ])
    }

    fn type_text(form: &mut Form, text: &str) {
        for c in text.chars() {
            form.handle_edit_key(KeyEvent::from(KeyCode::Char(c)));
        }
    }

    #[test]
    fn test_empty_required_field_fails_validation() {
        let mut form = client_form();
        assert!(!form.validate_all());
        assert_eq!(form.field(0).error(), Some("Requerido"));

        type_text(&mut form, "Ana");
        form.next_field();
        type_text(&mut form, "Reyes");
        assert!(form.validate_all());
    }

    #[test]
    fn test_postal_code_length_bounds() {
        let mut field = FormField::text("Postal")
            .with_rules(vec![Rule::Required, Rule::MinLen(3), Rule::MaxLen(12)])
            .with_value("06");
        assert!(!field.validate());
        field.set_value("06000");
        assert!(field.validate());
        field.set_value("0600000000000");
        assert!(!field.validate());
    }

    #[test]
    fn test_email_rule() {
        let mut field = FormField::text("Correo").with_rules(vec![Rule::Required, Rule::Email]);
        field.set_value("ana");
        assert!(!field.validate());
        field.set_value("ana@taller");
        assert!(!field.validate());
        field.set_value("ana@taller.mx");
        assert!(field.validate());
    }

    #[test]
    fn test_quantity_must_be_a_positive_integer() {
        let mut field =
            FormField::integer("Cantidad").with_rules(vec![Rule::Required, Rule::Positive]);
        // Non-digits never reach the value.
        field.insert_char('x');
        assert_eq!(field.text_value(), "");
        field.insert_char('0');
        assert!(!field.validate());
        field.set_value("3");
        assert!(field.validate());
        assert_eq!(field.integer_value(), Some(3));
    }

    #[test]
    fn test_price_accepts_decimals_and_rejects_negative_shapes() {
        let mut field =
            FormField::decimal("Precio p/u").with_rules(vec![Rule::Required, Rule::NonNegative]);
        field.insert_char('1');
        field.insert_char('2');
        field.insert_char('.');
        field.insert_char('.');
        field.insert_char('5');
        assert_eq!(field.text_value(), "12.5");
        assert!(field.validate());
        assert_eq!(field.decimal_value(), Some(12.5));
    }

    #[test]
    fn test_select_requires_a_choice() {
        let mut field = FormField::select(
            "Cliente",
            vec![(1, "Ana Reyes".to_string()), (2, "Luis Mora".to_string())],
        )
        .with_rules(vec![Rule::Required]);
        assert!(!field.validate());

        field.open = true;
        field.dropdown_down();
        field.choose();
        assert_eq!(field.selected_id(), Some(2));
        assert!(field.validate());
    }

    #[test]
    fn test_dirty_gate_tracks_divergence_from_baseline() {
        let mut form = client_form();
        type_text(&mut form, "Ana");
        let baseline = form.snapshot();
        assert!(!form.is_dirty(&baseline));

        form.handle_edit_key(KeyEvent::from(KeyCode::Char('!')));
        assert!(form.is_dirty(&baseline));
        form.handle_edit_key(KeyEvent::from(KeyCode::Backspace));
        assert!(!form.is_dirty(&baseline));
    }

    #[test]
    fn test_focus_wraps_across_fields() {
        let mut form = client_form();
        form.next_field();
        form.next_field();
        assert_eq!(form.current_field().label, "Nombre(s)");
        form.previous_field();
        assert_eq!(form.current_field().label, "Apellido(s)");
    }
}
