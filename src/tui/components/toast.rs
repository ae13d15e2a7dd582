//! Transient status notifications shown in the status bar.

use std::time::{Duration, Instant};

use ratatui::style::Style;

use crate::tui::ui::Styles;

#[derive(Debug, Clone, PartialEq)]
pub enum ToastKind {
    Success,
    Error,
    Info,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Toast {
    pub kind: ToastKind,
    pub message: String,
}

impl Toast {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: ToastKind::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: ToastKind::Error,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            kind: ToastKind::Info,
            message: message.into(),
        }
    }

    pub fn style(&self) -> Style {
        match self.kind {
            ToastKind::Success => Styles::success(),
            ToastKind::Error => Styles::error(),
            ToastKind::Info => Styles::info(),
        }
    }
}

/// Holds at most one toast at a time; a new one replaces the current.
pub struct Toasts {
    current: Option<(Toast, Instant)>,
    ttl: Duration,
}

impl Default for Toasts {
    fn default() -> Self {
        Self {
            current: None,
            ttl: Duration::from_secs(2),
        }
    }
}

impl Toasts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn show(&mut self, toast: Toast) {
        self.current = Some((toast, Instant::now()));
    }

    /// Drop the toast once its display time has passed.
    pub fn tick(&mut self) {
        if let Some((_, since)) = &self.current {
            if since.elapsed() >= self.ttl {
                self.current = None;
            }
        }
    }

    pub fn current(&self) -> Option<&Toast> {
        self.current.as_ref().map(|(toast, _)| toast)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_toast_replaces_current() {
        let mut toasts = Toasts::new();
        toasts.show(Toast::success("creado"));
        toasts.show(Toast::error("falló"));
        assert_eq!(toasts.current().unwrap().kind, ToastKind::Error);
    }

    #[test]
    fn test_tick_expires_after_ttl() {
        let mut toasts = Toasts {
            ttl: Duration::from_millis(0),
            ..Toasts::new()
        };
        toasts.show(Toast::info("hola"));
        toasts.tick();
        assert!(toasts.current().is_none());
    }
}
