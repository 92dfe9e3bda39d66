//! Read-only display cells for table columns.
//!
//! Cells render server-shaped values (cents, E.164 numbers, ISO instants,
//! string arrays) for display. They are chosen by
//! [`crate::dispatch::cell_for`].

use std::collections::BTreeMap;
use std::fmt;

use chrono::FixedOffset;
use crudkit_core::settings::Settings;
use crudkit_core::utils::text::{escape_html, strip_tags, truncate_chars};
use serde_json::Value;

use crate::format;

/// Characters shown before long text is cut off.
pub const TEXT_PREVIEW_CHARS: usize = 80;

/// Shown in place of sensitive values.
pub const SENSITIVE_MASK: &str = "••••••••";

/// Enumerates the display cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellKind {
    Text,
    TextPreview,
    Number,
    Currency,
    Percentage,
    Boolean,
    Date,
    DateTime,
    Duration,
    Interval,
    RecurrenceRule,
    Email,
    Url,
    Domain,
    PhoneNumber,
    TimeZone,
    Option,
    Badges,
    Id,
    Reference,
    RichText,
    Markdown,
    Sensitive,
}

impl fmt::Display for CellKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Display settings shared by every cell of a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellProps {
    pub currency_symbol: String,
    pub utc_offset: FixedOffset,
    pub phone_region: String,
}

impl Default for CellProps {
    fn default() -> Self {
        Self::from(&Settings::default())
    }
}

impl From<&Settings> for CellProps {
    fn from(settings: &Settings) -> Self {
        Self {
            currency_symbol: settings.currency_symbol.clone(),
            utc_offset: format::offset_from_minutes(settings.utc_offset_minutes),
            phone_region: settings.default_phone_region.clone(),
        }
    }
}

/// A trait for display cells.
pub trait Cell: Send + Sync + fmt::Debug {
    /// Returns the cell kind.
    fn kind(&self) -> CellKind;

    /// Renders a server-shaped value as HTML. `null` renders as an empty string.
    fn render(&self, value: &Value) -> String;
}

/// Escaped text of a scalar, or `None` for `null`.
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(escape_html(s)),
        other => Some(escape_html(&other.to_string())),
    }
}

// ---------------------------------------------------------------------------
// Built-in cells
// ---------------------------------------------------------------------------

/// Plain text, optionally cut off after [`TEXT_PREVIEW_CHARS`].
#[derive(Debug, Clone)]
pub struct TextCell {
    kind: CellKind,
    preview: bool,
}

impl TextCell {
    pub const fn new(kind: CellKind) -> Self {
        Self {
            kind,
            preview: false,
        }
    }

    /// Creates a cell that truncates long values.
    pub const fn preview(kind: CellKind) -> Self {
        Self {
            kind,
            preview: true,
        }
    }
}

impl Cell for TextCell {
    fn kind(&self) -> CellKind {
        self.kind
    }

    fn render(&self, value: &Value) -> String {
        match value {
            Value::String(s) if self.preview => escape_html(&truncate_chars(s, TEXT_PREVIEW_CHARS)),
            _ => scalar_text(value).unwrap_or_default(),
        }
    }
}

/// Rich text shown as a plain-text preview.
#[derive(Debug, Clone)]
pub struct RichTextCell;

impl Cell for RichTextCell {
    fn kind(&self) -> CellKind {
        CellKind::RichText
    }

    fn render(&self, value: &Value) -> String {
        value
            .as_str()
            .map(|html| escape_html(&truncate_chars(strip_tags(html).trim(), TEXT_PREVIEW_CHARS)))
            .unwrap_or_default()
    }
}

/// A grouped number, right-aligned.
#[derive(Debug, Clone)]
pub struct NumberCell {
    max_fraction_digits: usize,
}

impl NumberCell {
    pub const fn new(max_fraction_digits: usize) -> Self {
        Self {
            max_fraction_digits,
        }
    }
}

impl Cell for NumberCell {
    fn kind(&self) -> CellKind {
        CellKind::Number
    }

    fn render(&self, value: &Value) -> String {
        value
            .as_f64()
            .and_then(|n| format::format_number(n, self.max_fraction_digits))
            .map(|s| format!(r#"<span class="numeric">{s}</span>"#))
            .unwrap_or_default()
    }
}

/// A money amount stored in cents.
#[derive(Debug, Clone)]
pub struct CurrencyCell {
    symbol: String,
}

impl CurrencyCell {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
        }
    }
}

impl Cell for CurrencyCell {
    fn kind(&self) -> CellKind {
        CellKind::Currency
    }

    fn render(&self, value: &Value) -> String {
        value
            .as_f64()
            .and_then(|cents| format::format_currency_cents(cents, &self.symbol))
            .map(|s| format!(r#"<span class="numeric">{}</span>"#, escape_html(&s)))
            .unwrap_or_default()
    }
}

/// A fraction shown as a percentage.
#[derive(Debug, Clone)]
pub struct PercentageCell;

impl Cell for PercentageCell {
    fn kind(&self) -> CellKind {
        CellKind::Percentage
    }

    fn render(&self, value: &Value) -> String {
        value
            .as_f64()
            .and_then(format::format_percentage)
            .map(|s| format!(r#"<span class="numeric">{s}</span>"#))
            .unwrap_or_default()
    }
}

/// "Yes" or "No".
#[derive(Debug, Clone)]
pub struct BooleanCell;

impl Cell for BooleanCell {
    fn kind(&self) -> CellKind {
        CellKind::Boolean
    }

    fn render(&self, value: &Value) -> String {
        match value.as_bool() {
            Some(true) => "Yes".to_string(),
            Some(false) => "No".to_string(),
            None => String::new(),
        }
    }
}

/// An ISO instant shown in local time.
#[derive(Debug, Clone)]
pub struct DateTimeCell {
    offset: FixedOffset,
}

impl DateTimeCell {
    pub const fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }
}

impl Cell for DateTimeCell {
    fn kind(&self) -> CellKind {
        CellKind::DateTime
    }

    fn render(&self, value: &Value) -> String {
        let Some(iso) = value.as_str() else {
            return String::new();
        };
        format::parse_instant(iso).map_or_else(
            || escape_html(iso),
            |instant| {
                let local = instant.with_timezone(&self.offset);
                format!(
                    r#"<time datetime="{}">{}</time>"#,
                    escape_html(iso),
                    local.format("%Y-%m-%d %H:%M")
                )
            },
        )
    }
}

/// An ISO-8601 duration described in words.
#[derive(Debug, Clone)]
pub struct DurationCell;

impl Cell for DurationCell {
    fn kind(&self) -> CellKind {
        CellKind::Duration
    }

    fn render(&self, value: &Value) -> String {
        value
            .as_str()
            .map(|iso| format::humanize_duration(iso).unwrap_or_else(|| escape_html(iso)))
            .unwrap_or_default()
    }
}

/// An ISO-8601 interval shown as `start to end`.
#[derive(Debug, Clone)]
pub struct IntervalCell;

impl Cell for IntervalCell {
    fn kind(&self) -> CellKind {
        CellKind::Interval
    }

    fn render(&self, value: &Value) -> String {
        let Some(text) = value.as_str() else {
            return String::new();
        };
        match text.split_once('/') {
            Some((start, end)) => format!("{} to {}", escape_html(start), escape_html(end)),
            None => escape_html(text),
        }
    }
}

/// A value rendered as a link.
#[derive(Debug, Clone)]
pub struct LinkCell {
    kind: CellKind,
    href_prefix: &'static str,
}

impl LinkCell {
    /// Links emails with `mailto:`.
    pub const fn email() -> Self {
        Self {
            kind: CellKind::Email,
            href_prefix: "mailto:",
        }
    }

    /// Links URLs as they are.
    pub const fn url() -> Self {
        Self {
            kind: CellKind::Url,
            href_prefix: "",
        }
    }

    /// Links domains over https.
    pub const fn domain() -> Self {
        Self {
            kind: CellKind::Domain,
            href_prefix: "https://",
        }
    }
}

impl Cell for LinkCell {
    fn kind(&self) -> CellKind {
        self.kind
    }

    fn render(&self, value: &Value) -> String {
        let Some(text) = value.as_str().filter(|s| !s.is_empty()) else {
            return String::new();
        };
        let escaped = escape_html(text);
        format!(r#"<a href="{}{escaped}">{escaped}</a>"#, self.href_prefix)
    }
}

/// An E.164 number shown in national format.
#[derive(Debug, Clone)]
pub struct PhoneNumberCell {
    region: String,
}

impl PhoneNumberCell {
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
        }
    }
}

impl Cell for PhoneNumberCell {
    fn kind(&self) -> CellKind {
        CellKind::PhoneNumber
    }

    fn render(&self, value: &Value) -> String {
        let Some(e164) = value.as_str() else {
            return String::new();
        };
        format!(
            r#"<a href="tel:{}">{}</a>"#,
            escape_html(e164),
            escape_html(&format::format_phone_national(e164, &self.region))
        )
    }
}

/// A single allowed value shown by its option label.
#[derive(Debug, Clone)]
pub struct OptionCell {
    labels: BTreeMap<String, String>,
}

impl OptionCell {
    pub const fn new(labels: BTreeMap<String, String>) -> Self {
        Self { labels }
    }
}

impl Cell for OptionCell {
    fn kind(&self) -> CellKind {
        CellKind::Option
    }

    fn render(&self, value: &Value) -> String {
        value
            .as_str()
            .map(|v| escape_html(self.labels.get(v).map_or(v, String::as_str)))
            .unwrap_or_default()
    }
}

/// A string array shown as badges.
#[derive(Debug, Clone)]
pub struct BadgesCell {
    labels: BTreeMap<String, String>,
}

impl BadgesCell {
    pub const fn new(labels: BTreeMap<String, String>) -> Self {
        Self { labels }
    }
}

impl Cell for BadgesCell {
    fn kind(&self) -> CellKind {
        CellKind::Badges
    }

    fn render(&self, value: &Value) -> String {
        let Some(items) = value.as_array() else {
            return String::new();
        };
        items
            .iter()
            .filter_map(Value::as_str)
            .map(|v| {
                let label = self.labels.get(v).map_or(v, String::as_str);
                format!(r#"<span class="badge">{}</span>"#, escape_html(label))
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// A document id, or a reference to one.
#[derive(Debug, Clone)]
pub struct IdCell {
    kind: CellKind,
    resources: Vec<String>,
}

impl IdCell {
    /// Shows the document's own id.
    pub const fn own() -> Self {
        Self {
            kind: CellKind::Id,
            resources: Vec::new(),
        }
    }

    /// Shows a reference into one of `resources`.
    pub const fn reference(resources: Vec<String>) -> Self {
        Self {
            kind: CellKind::Reference,
            resources,
        }
    }
}

impl Cell for IdCell {
    fn kind(&self) -> CellKind {
        self.kind
    }

    fn render(&self, value: &Value) -> String {
        let Some(id) = value.as_str() else {
            return String::new();
        };
        let id = escape_html(id);
        match self.resources.first() {
            Some(resource) if self.kind == CellKind::Reference => format!(
                r#"<code data-resource="{}">{id}</code>"#,
                escape_html(resource)
            ),
            _ => format!("<code>{id}</code>"),
        }
    }
}

/// Never shows the value.
#[derive(Debug, Clone)]
pub struct SensitiveCell;

impl Cell for SensitiveCell {
    fn kind(&self) -> CellKind {
        CellKind::Sensitive
    }

    fn render(&self, value: &Value) -> String {
        match value {
            Value::Null => String::new(),
            Value::String(s) if s.is_empty() => String::new(),
            _ => SENSITIVE_MASK.to_string(),
        }
    }
}
