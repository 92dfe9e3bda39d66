//! Input editors for form fields.
//!
//! An editor renders the HTML input for one field from its form-shaped
//! value. Editors are chosen by [`crate::dispatch::editor_for`]; each one is
//! configured once with the field's spec and the [`EditorProps`] shared by
//! every field of the form.

use std::collections::HashMap;
use std::fmt;

use crudkit_core::utils::text::escape_html;
use serde_json::Value;

use crate::format::PHONE_REGIONS;

/// Enumerates the editor components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EditorKind {
    /// `<input type="text">`.
    TextInput,
    /// A text input for formatted numbers.
    NumberInput,
    /// A text input for formatted money amounts.
    CurrencyInput,
    /// A text input for percentages.
    PercentageInput,
    /// `<textarea>`.
    Textarea,
    /// `<input type="checkbox">`.
    Checkbox,
    /// `<input type="date">`.
    DateInput,
    /// `<input type="datetime-local">`.
    DateTimeLocalInput,
    /// A text input for ISO-8601 durations.
    DurationInput,
    /// A pair of date-time inputs.
    IntervalInput,
    /// A text input for recurrence rules.
    RecurrenceRuleInput,
    /// `<input type="email">`.
    EmailInput,
    /// `<input type="url">`.
    UrlInput,
    /// A text input for domain names.
    DomainInput,
    /// `<input type="tel">` with an optional region picker.
    PhoneNumberInput,
    /// `<select>` over the known time zones.
    TimeZoneSelect,
    /// `<select>`.
    Select,
    /// `<select multiple>`.
    SelectMultiple,
    /// Editable rows with add and remove controls.
    ListInput,
    /// A read-only input showing a document id.
    IdInput,
    /// `<select>` over documents of other resources.
    ReferenceSelect,
    /// A rich text (HTML) editor.
    RichTextEditor,
    /// A markdown editor.
    MarkdownEditor,
    /// `<input type="password">`.
    PasswordInput,
}

impl fmt::Display for EditorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::TextInput => "TextInput",
            Self::NumberInput => "NumberInput",
            Self::CurrencyInput => "CurrencyInput",
            Self::PercentageInput => "PercentageInput",
            Self::Textarea => "Textarea",
            Self::Checkbox => "Checkbox",
            Self::DateInput => "DateInput",
            Self::DateTimeLocalInput => "DateTimeLocalInput",
            Self::DurationInput => "DurationInput",
            Self::IntervalInput => "IntervalInput",
            Self::RecurrenceRuleInput => "RecurrenceRuleInput",
            Self::EmailInput => "EmailInput",
            Self::UrlInput => "UrlInput",
            Self::DomainInput => "DomainInput",
            Self::PhoneNumberInput => "PhoneNumberInput",
            Self::TimeZoneSelect => "TimeZoneSelect",
            Self::Select => "Select",
            Self::SelectMultiple => "SelectMultiple",
            Self::ListInput => "ListInput",
            Self::IdInput => "IdInput",
            Self::ReferenceSelect => "ReferenceSelect",
            Self::RichTextEditor => "RichTextEditor",
            Self::MarkdownEditor => "MarkdownEditor",
            Self::PasswordInput => "PasswordInput",
        };
        write!(f, "{name}")
    }
}

/// A document offered by a reference editor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceOption {
    /// The document's `_id`.
    pub id: String,
    /// Text shown for the document.
    pub label: String,
}

impl ReferenceOption {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
        }
    }
}

/// Props shared by every editor of a form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorProps {
    /// Renders the input disabled (set while submitting).
    pub disabled: bool,
    pub placeholder: Option<String>,
    /// Marks the input `aria-invalid`.
    pub has_errors: bool,
    /// Region used by phone editors.
    pub phone_region: String,
    /// Documents offered by reference editors.
    pub reference_options: Vec<ReferenceOption>,
    /// Extra HTML attributes for the input.
    pub attrs: HashMap<String, String>,
}

impl Default for EditorProps {
    fn default() -> Self {
        Self {
            disabled: false,
            placeholder: None,
            has_errors: false,
            phone_region: "US".to_string(),
            reference_options: Vec::new(),
            attrs: HashMap::new(),
        }
    }
}

impl EditorProps {
    #[must_use]
    pub const fn disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    #[must_use]
    pub fn placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    #[must_use]
    pub const fn has_errors(mut self, has_errors: bool) -> Self {
        self.has_errors = has_errors;
        self
    }

    #[must_use]
    pub fn phone_region(mut self, region: impl Into<String>) -> Self {
        self.phone_region = region.into();
        self
    }

    #[must_use]
    pub fn reference_options(mut self, options: Vec<ReferenceOption>) -> Self {
        self.reference_options = options;
        self
    }

    #[must_use]
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(name.into(), value.into());
        self
    }

    /// Merges these props with per-render attributes; the latter win.
    fn merged_attrs(&self, attrs: &HashMap<String, String>) -> HashMap<String, String> {
        let mut merged = self.attrs.clone();
        if self.disabled {
            merged.insert("disabled".to_string(), "disabled".to_string());
        }
        if let Some(placeholder) = &self.placeholder {
            merged.insert("placeholder".to_string(), placeholder.clone());
        }
        if self.has_errors {
            merged.insert("aria-invalid".to_string(), "true".to_string());
        }
        merged.extend(attrs.iter().map(|(k, v)| (k.clone(), v.clone())));
        merged
    }
}

/// A trait for field editors.
///
/// Editors must be `Send + Sync` so forms can be rendered from any task.
pub trait Editor: Send + Sync + fmt::Debug {
    /// Returns the editor kind.
    fn kind(&self) -> EditorKind;

    /// Renders the editor as an HTML string.
    ///
    /// # Arguments
    /// - `name` - The HTML `name` attribute
    /// - `value` - The current form-shaped value
    /// - `attrs` - Additional HTML attributes
    fn render(&self, name: &str, value: &Value, attrs: &HashMap<String, String>) -> String;

    /// Returns the HTML `id` a `<label>` for this editor should target.
    fn id_for_label(&self, id: &str) -> String {
        id.to_string()
    }
}

/// Formats an attributes map as ` key="value"` pairs, sorted, values escaped.
fn render_attrs(attrs: &HashMap<String, String>) -> String {
    let mut parts: Vec<String> = attrs
        .iter()
        .map(|(k, v)| format!(r#" {k}="{}""#, escape_html(v)))
        .collect();
    parts.sort();
    parts.join("")
}

/// Text shown inside an input for a scalar form value.
fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

/// Values selected in a multi-valued field, from rows or plain strings.
fn selected_values(value: &Value) -> Vec<String> {
    value
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| {
                    item.as_str()
                        .or_else(|| item.get("value").and_then(Value::as_str))
                })
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn render_options(choices: &[(String, String)], selected: &[String], blank: bool) -> String {
    let mut options = String::new();
    if blank {
        options.push_str(r#"<option value="">---------</option>"#);
    }
    for (val, label) in choices {
        let mark = if selected.iter().any(|s| s == val) {
            " selected"
        } else {
            ""
        };
        options.push_str(&format!(
            r#"<option value="{}"{mark}>{}</option>"#,
            escape_html(val),
            escape_html(label)
        ));
    }
    options
}

// ---------------------------------------------------------------------------
// Built-in editors
// ---------------------------------------------------------------------------

/// A single `<input>` element.
///
/// Covers every kind whose editor is one input with a fixed `type`.
#[derive(Debug, Clone)]
pub struct InputEditor {
    kind: EditorKind,
    input_type: &'static str,
    extra: Vec<(&'static str, &'static str)>,
    render_value: bool,
    props: EditorProps,
}

impl InputEditor {
    /// Creates an input of the given `type`.
    pub fn new(kind: EditorKind, input_type: &'static str, props: EditorProps) -> Self {
        Self {
            kind,
            input_type,
            extra: Vec::new(),
            render_value: true,
            props,
        }
    }

    /// Adds a fixed attribute.
    #[must_use]
    pub fn with_attr(mut self, name: &'static str, value: &'static str) -> Self {
        self.extra.push((name, value));
        self
    }

    /// Never writes the current value back into the page.
    #[must_use]
    pub const fn hide_value(mut self) -> Self {
        self.render_value = false;
        self
    }
}

impl Editor for InputEditor {
    fn kind(&self) -> EditorKind {
        self.kind
    }

    fn render(&self, name: &str, value: &Value, attrs: &HashMap<String, String>) -> String {
        let mut merged = self.props.merged_attrs(attrs);
        for (k, v) in &self.extra {
            merged.entry((*k).to_string()).or_insert_with(|| (*v).to_string());
        }
        let val = if self.render_value {
            value_text(value)
        } else {
            String::new()
        };
        format!(
            r#"<input type="{}" name="{}" value="{}"{} />"#,
            self.input_type,
            escape_html(name),
            escape_html(&val),
            render_attrs(&merged)
        )
    }
}

/// A `<textarea>` element, optionally tagged with a content format.
#[derive(Debug, Clone)]
pub struct TextareaEditor {
    kind: EditorKind,
    format: Option<&'static str>,
    props: EditorProps,
}

impl TextareaEditor {
    pub const fn new(kind: EditorKind, format: Option<&'static str>, props: EditorProps) -> Self {
        Self {
            kind,
            format,
            props,
        }
    }
}

impl Editor for TextareaEditor {
    fn kind(&self) -> EditorKind {
        self.kind
    }

    fn render(&self, name: &str, value: &Value, attrs: &HashMap<String, String>) -> String {
        let mut merged = self.props.merged_attrs(attrs);
        if let Some(format) = self.format {
            merged.insert("data-format".to_string(), format.to_string());
        }
        format!(
            r#"<textarea name="{}"{}>{}</textarea>"#,
            escape_html(name),
            render_attrs(&merged),
            escape_html(&value_text(value))
        )
    }
}

/// A `<input type="checkbox">` element.
#[derive(Debug, Clone)]
pub struct CheckboxEditor {
    props: EditorProps,
}

impl CheckboxEditor {
    pub const fn new(props: EditorProps) -> Self {
        Self { props }
    }
}

impl Editor for CheckboxEditor {
    fn kind(&self) -> EditorKind {
        EditorKind::Checkbox
    }

    fn render(&self, name: &str, value: &Value, attrs: &HashMap<String, String>) -> String {
        let checked = match value {
            Value::Bool(b) => *b,
            Value::String(s) => matches!(s.as_str(), "true" | "on" | "1"),
            _ => false,
        };
        let checked_attr = if checked { " checked" } else { "" };
        format!(
            r#"<input type="checkbox" name="{}"{checked_attr}{} />"#,
            escape_html(name),
            render_attrs(&self.props.merged_attrs(attrs))
        )
    }
}

/// A `<select>` element over fixed choices.
#[derive(Debug, Clone)]
pub struct SelectEditor {
    kind: EditorKind,
    /// The available choices as `(value, display_label)` pairs.
    pub choices: Vec<(String, String)>,
    props: EditorProps,
}

impl SelectEditor {
    pub const fn new(kind: EditorKind, choices: Vec<(String, String)>, props: EditorProps) -> Self {
        Self {
            kind,
            choices,
            props,
        }
    }

    /// Creates a reference select over `props.reference_options`.
    pub fn reference(props: EditorProps) -> Self {
        let choices = props
            .reference_options
            .iter()
            .map(|o| (o.id.clone(), o.label.clone()))
            .collect();
        Self::new(EditorKind::ReferenceSelect, choices, props)
    }
}

impl Editor for SelectEditor {
    fn kind(&self) -> EditorKind {
        self.kind
    }

    fn render(&self, name: &str, value: &Value, attrs: &HashMap<String, String>) -> String {
        let current = value_text(value);
        let options = render_options(&self.choices, &[current], true);
        format!(
            r#"<select name="{}"{}>{options}</select>"#,
            escape_html(name),
            render_attrs(&self.props.merged_attrs(attrs))
        )
    }
}

/// A `<select multiple>` element.
///
/// The value is a list of rows or plain strings.
#[derive(Debug, Clone)]
pub struct MultiSelectEditor {
    /// The available choices as `(value, display_label)` pairs.
    pub choices: Vec<(String, String)>,
    props: EditorProps,
}

impl MultiSelectEditor {
    pub const fn new(choices: Vec<(String, String)>, props: EditorProps) -> Self {
        Self { choices, props }
    }
}

impl Editor for MultiSelectEditor {
    fn kind(&self) -> EditorKind {
        EditorKind::SelectMultiple
    }

    fn render(&self, name: &str, value: &Value, attrs: &HashMap<String, String>) -> String {
        let options = render_options(&self.choices, &selected_values(value), false);
        format!(
            r#"<select name="{}" multiple{}>{options}</select>"#,
            escape_html(name),
            render_attrs(&self.props.merged_attrs(attrs))
        )
    }
}

/// Editable list rows, each with a remove control, plus an add control.
///
/// Row inputs are named `{name}.{row id}` so that edits address rows by
/// their stable id rather than by position.
#[derive(Debug, Clone)]
pub struct ListEditor {
    props: EditorProps,
}

impl ListEditor {
    pub const fn new(props: EditorProps) -> Self {
        Self { props }
    }
}

impl Editor for ListEditor {
    fn kind(&self) -> EditorKind {
        EditorKind::ListInput
    }

    fn render(&self, name: &str, value: &Value, attrs: &HashMap<String, String>) -> String {
        let name = escape_html(name);
        let disabled = if self.props.disabled { " disabled" } else { "" };
        let mut row_props = self.props.clone();
        row_props.attrs.clear();
        let empty = HashMap::new();
        let row_attrs = render_attrs(&row_props.merged_attrs(&empty));

        let mut html = format!(
            r#"<div class="list-editor" data-name="{name}"{}>"#,
            render_attrs(&self.props.merged_attrs(attrs))
        );
        for row in value.as_array().map(Vec::as_slice).unwrap_or_default() {
            let id = escape_html(row.get("id").and_then(Value::as_str).unwrap_or_default());
            let val = escape_html(row.get("value").and_then(Value::as_str).unwrap_or_default());
            html.push_str(&format!(
                r#"<div class="list-row" data-row-id="{id}"><input type="text" name="{name}.{id}" value="{val}"{row_attrs} />"#
            ));
            html.push_str(&format!(
                r#"<button type="button" class="list-remove" value="{id}"{disabled}>Remove</button></div>"#
            ));
        }
        html.push_str(&format!(
            r#"<button type="button" class="list-add"{disabled}>Add</button></div>"#
        ));
        html
    }

    fn id_for_label(&self, _id: &str) -> String {
        String::new()
    }
}

/// A `<input type="tel">` with a region picker.
///
/// When locked, the region is fixed and no picker is rendered.
#[derive(Debug, Clone)]
pub struct PhoneNumberEditor {
    region: String,
    locked: bool,
    props: EditorProps,
}

impl PhoneNumberEditor {
    /// Creates a phone editor using the region from the props.
    pub fn new(props: EditorProps) -> Self {
        Self {
            region: props.phone_region.clone(),
            locked: false,
            props,
        }
    }

    /// Creates a phone editor fixed to one region.
    pub fn locked(region: impl Into<String>, props: EditorProps) -> Self {
        Self {
            region: region.into(),
            locked: true,
            props,
        }
    }

    /// Returns the region numbers are completed with.
    pub fn region(&self) -> &str {
        &self.region
    }
}

impl Editor for PhoneNumberEditor {
    fn kind(&self) -> EditorKind {
        EditorKind::PhoneNumberInput
    }

    fn render(&self, name: &str, value: &Value, attrs: &HashMap<String, String>) -> String {
        let escaped = escape_html(name);
        let input = format!(
            r#"<input type="tel" name="{escaped}" value="{}"{} />"#,
            escape_html(&value_text(value)),
            render_attrs(&self.props.merged_attrs(attrs))
        );
        if self.locked {
            return input;
        }
        let disabled = if self.props.disabled { " disabled" } else { "" };
        let choices: Vec<(String, String)> = PHONE_REGIONS
            .iter()
            .map(|(region, code, _)| ((*region).to_string(), format!("{region} +{code}")))
            .collect();
        let options = render_options(&choices, &[self.region.clone()], false);
        format!(
            r#"<div class="phone-number"><select name="{escaped}_region"{disabled}>{options}</select>{input}</div>"#
        )
    }
}

/// Two `<input type="datetime-local">` elements for an interval's ends.
///
/// The value is an ISO-8601 interval `start/end`.
#[derive(Debug, Clone)]
pub struct IntervalEditor {
    props: EditorProps,
}

impl IntervalEditor {
    pub const fn new(props: EditorProps) -> Self {
        Self { props }
    }
}

impl Editor for IntervalEditor {
    fn kind(&self) -> EditorKind {
        EditorKind::IntervalInput
    }

    fn render(&self, name: &str, value: &Value, attrs: &HashMap<String, String>) -> String {
        let text = value_text(value);
        let (start, end) = text.split_once('/').unwrap_or((text.as_str(), ""));
        let name = escape_html(name);
        let attrs = render_attrs(&self.props.merged_attrs(attrs));
        format!(
            concat!(
                r#"<div class="interval">"#,
                r#"<input type="datetime-local" name="{name}.start" value="{}"{attrs} />"#,
                r#"<input type="datetime-local" name="{name}.end" value="{}"{attrs} />"#,
                "</div>"
            ),
            escape_html(start),
            escape_html(end),
            name = name,
            attrs = attrs
        )
    }

    fn id_for_label(&self, id: &str) -> String {
        format!("{id}_start")
    }
}
