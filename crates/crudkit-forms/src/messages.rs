//! Toast notifications.
//!
//! A [`ToastQueue`] collects short user-facing notices (a saved document, a
//! failed submission) until the page drains and renders them.

use std::fmt;

use crudkit_core::utils::text::escape_html;
use serde::{Deserialize, Serialize};

/// Severity of a toast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastLevel {
    Info = 20,
    Success = 25,
    Warning = 30,
    Error = 40,
}

impl ToastLevel {
    /// Returns the CSS class for this level.
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }

    /// Returns the ARIA role screen readers should announce the toast with.
    pub const fn role(self) -> &'static str {
        match self {
            Self::Info | Self::Success => "status",
            Self::Warning | Self::Error => "alert",
        }
    }
}

impl fmt::Display for ToastLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// One notice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Toast {
    pub level: ToastLevel,
    pub text: String,
}

impl Toast {
    pub fn new(level: ToastLevel, text: impl Into<String>) -> Self {
        Self {
            level,
            text: text.into(),
        }
    }

    /// Renders the toast as an HTML element.
    pub fn render_html(&self) -> String {
        format!(
            r#"<div class="toast toast-{}" role="{}">{}</div>"#,
            self.level.tag(),
            self.level.role(),
            escape_html(&self.text)
        )
    }
}

impl fmt::Display for Toast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Pending toasts, oldest first.
///
/// # Examples
///
/// ```
/// use crudkit_forms::messages::ToastQueue;
///
/// let mut toasts = ToastQueue::new();
/// toasts.success("Saved.");
/// toasts.error("Could not reach the server.");
/// assert_eq!(toasts.drain().len(), 2);
/// assert!(toasts.is_empty());
/// ```
#[derive(Debug, Clone, Default)]
pub struct ToastQueue {
    toasts: Vec<Toast>,
}

impl ToastQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, level: ToastLevel, text: impl Into<String>) {
        self.toasts.push(Toast::new(level, text));
    }

    pub fn info(&mut self, text: impl Into<String>) {
        self.push(ToastLevel::Info, text);
    }

    pub fn success(&mut self, text: impl Into<String>) {
        self.push(ToastLevel::Success, text);
    }

    pub fn warning(&mut self, text: impl Into<String>) {
        self.push(ToastLevel::Warning, text);
    }

    pub fn error(&mut self, text: impl Into<String>) {
        self.push(ToastLevel::Error, text);
    }

    /// Removes and returns every pending toast.
    pub fn drain(&mut self) -> Vec<Toast> {
        std::mem::take(&mut self.toasts)
    }

    /// Returns the pending toasts without removing them.
    pub fn peek(&self) -> &[Toast] {
        &self.toasts
    }

    /// Returns the most severe pending level, if any.
    pub fn max_level(&self) -> Option<ToastLevel> {
        self.toasts.iter().map(|t| t.level).max()
    }

    pub fn len(&self) -> usize {
        self.toasts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.toasts.is_empty()
    }

    /// Drains the queue into one HTML region.
    pub fn render_html(&mut self) -> String {
        let body: String = self.drain().iter().map(Toast::render_html).collect();
        format!(r#"<div class="toasts">{body}</div>"#)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levels_order_by_severity() {
        assert!(ToastLevel::Error > ToastLevel::Warning);
        assert!(ToastLevel::Success > ToastLevel::Info);
    }

    #[test]
    fn test_roles() {
        assert_eq!(ToastLevel::Success.role(), "status");
        assert_eq!(ToastLevel::Error.role(), "alert");
    }

    #[test]
    fn test_drain_empties_queue() {
        let mut toasts = ToastQueue::new();
        toasts.info("a");
        toasts.error("b");
        assert_eq!(toasts.peek().len(), 2);
        assert_eq!(toasts.max_level(), Some(ToastLevel::Error));
        let drained = toasts.drain();
        assert_eq!(drained[0].text, "a");
        assert_eq!(drained[1].level, ToastLevel::Error);
        assert!(toasts.is_empty());
        assert_eq!(toasts.max_level(), None);
    }

    #[test]
    fn test_render_html_escapes() {
        let mut toasts = ToastQueue::new();
        toasts.warning("<b>careful</b>");
        let html = toasts.render_html();
        assert!(html.contains(r#"class="toast toast-warning" role="alert""#));
        assert!(html.contains("&lt;b&gt;careful&lt;/b&gt;"));
        assert!(toasts.is_empty());
    }

    #[test]
    fn test_serde_level_names() {
        let json = serde_json::to_string(&Toast::new(ToastLevel::Success, "ok")).unwrap();
        assert_eq!(json, r#"{"level":"success","text":"ok"}"#);
    }
}
