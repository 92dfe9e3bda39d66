//! Bound fields: a field spec paired with its current value and errors.
//!
//! A [`BoundField`] is created while rendering a form. It owns the editor the
//! dispatcher picked and renders one form row with the label, the input,
//! the help text, and any errors directly under the input.

use std::collections::HashMap;

use crudkit_core::utils::text::escape_html;
use serde_json::Value;

use crate::dispatch::editor_for;
use crate::editors::{Editor, EditorProps};
use crate::spec::FieldSpec;

/// A form field bound to its value and validation state.
pub struct BoundField {
    /// The field key, used as the HTML `name`.
    pub name: String,
    pub label: String,
    pub help_text: Option<String>,
    pub required: bool,
    /// The form-shaped value.
    pub value: Value,
    pub errors: Vec<String>,
    editor: Box<dyn Editor>,
}

impl BoundField {
    /// Binds a spec to a value and errors, selecting its editor.
    ///
    /// The editor is marked invalid when there are errors.
    pub fn new(spec: &FieldSpec, value: Value, errors: Vec<String>, props: &EditorProps) -> Self {
        let props = props.clone().has_errors(!errors.is_empty());
        Self {
            name: spec.key.clone(),
            label: spec.display_label(),
            help_text: spec.help_text.clone(),
            required: spec.required,
            value,
            errors,
            editor: editor_for(spec, &props),
        }
    }

    /// Returns the editor selected for this field.
    pub fn editor(&self) -> &dyn Editor {
        self.editor.as_ref()
    }

    /// Returns the auto-generated HTML `id` for this field.
    pub fn auto_id(&self) -> String {
        format!("id_{}", self.name)
    }

    /// Renders the editor HTML for this field.
    pub fn render(&self, extra_attrs: &HashMap<String, String>) -> String {
        let mut attrs = extra_attrs.clone();
        attrs.entry("id".to_string()).or_insert_with(|| self.auto_id());
        if self.has_errors() {
            attrs.insert(
                "aria-describedby".to_string(),
                format!("{}_errors", self.auto_id()),
            );
        }
        self.editor.render(&self.name, &self.value, &attrs)
    }

    /// Renders a `<label>` element for this field.
    pub fn label_tag(&self) -> String {
        let label_id = self.editor.id_for_label(&self.auto_id());
        let marker = if self.required {
            r#" <span class="required">*</span>"#
        } else {
            ""
        };
        let label = escape_html(&self.label);
        if label_id.is_empty() {
            format!("<label>{label}{marker}</label>")
        } else {
            format!(r#"<label for="{label_id}">{label}{marker}</label>"#)
        }
    }

    /// Returns `true` if this field has any errors.
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Renders the error list as an HTML `<ul>` element.
    pub fn errors_as_ul(&self) -> String {
        if self.errors.is_empty() {
            return String::new();
        }
        let items: String = self
            .errors
            .iter()
            .map(|e| format!("<li>{}</li>", escape_html(e)))
            .collect();
        format!(
            r#"<ul class="errorlist" id="{}_errors">{items}</ul>"#,
            self.auto_id()
        )
    }

    /// Renders the whole row: label, input, help text, then errors.
    pub fn as_row(&self) -> String {
        let help = self
            .help_text
            .as_deref()
            .map(|h| format!(r#"<p class="helptext">{}</p>"#, escape_html(h)))
            .unwrap_or_default();
        let class = if self.has_errors() {
            "field-row has-errors"
        } else {
            "field-row"
        };
        format!(
            r#"<div class="{class}">{}{}{help}{}</div>"#,
            self.label_tag(),
            self.render(&HashMap::new()),
            self.errors_as_ul()
        )
    }

    /// Renders the placeholder shown in place of a row while loading.
    pub fn skeleton_row(label: &str) -> String {
        format!(
            r#"<div class="field-row skeleton" aria-busy="true"><span class="skeleton-label">{}</span><span class="skeleton-input"></span></div>"#,
            escape_html(label)
        )
    }
}

impl std::fmt::Debug for BoundField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundField")
            .field("name", &self.name)
            .field("editor", &self.editor.kind())
            .field("errors", &self.errors)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::editors::EditorKind;
    use crate::kind::FieldKind;

    fn bind(spec: &FieldSpec, value: Value, errors: &[&str]) -> BoundField {
        BoundField::new(
            spec,
            value,
            errors.iter().map(|e| (*e).to_string()).collect(),
            &EditorProps::default(),
        )
    }

    #[test]
    fn test_bound_field_render() {
        let spec = FieldSpec::new("username", FieldKind::ShortText);
        let bf = bind(&spec, json!("alice"), &[]);
        let html = bf.render(&HashMap::new());
        assert!(html.contains(r#"name="username""#));
        assert!(html.contains(r#"value="alice""#));
        assert!(html.contains(r#"id="id_username""#));
        assert_eq!(bf.editor().kind(), EditorKind::TextInput);
    }

    #[test]
    fn test_label_tag() {
        let spec = FieldSpec::new("first_name", FieldKind::ShortText).required(true);
        let label = bind(&spec, Value::Null, &[]).label_tag();
        assert!(label.contains(r#"for="id_first_name""#));
        assert!(label.contains("First Name"));
        assert!(label.contains(r#"class="required""#));
    }

    #[test]
    fn test_list_label_has_no_target() {
        let spec = FieldSpec::new("tags", FieldKind::List);
        assert_eq!(bind(&spec, json!([]), &[]).label_tag(), "<label>Tags</label>");
    }

    #[test]
    fn test_errors_render_under_input() {
        let spec = FieldSpec::new("email", FieldKind::Email);
        let bf = bind(&spec, json!("x"), &["Enter a valid email address."]);
        let row = bf.as_row();
        let input_at = row.find("<input").unwrap();
        let errors_at = row.find("errorlist").unwrap();
        assert!(errors_at > input_at);
        assert!(row.contains("<li>Enter a valid email address.</li>"));
        assert!(row.contains(r#"aria-invalid="true""#));
        assert!(row.contains(r#"aria-describedby="id_email_errors""#));
        assert!(row.contains("has-errors"));
    }

    #[test]
    fn test_errors_as_ul_empty() {
        let spec = FieldSpec::new("email", FieldKind::Email);
        assert_eq!(bind(&spec, Value::Null, &[]).errors_as_ul(), "");
    }

    #[test]
    fn test_help_text_row() {
        let spec = FieldSpec::new("bio", FieldKind::LongText).help_text("A <short> bio");
        let row = bind(&spec, json!(""), &[]).as_row();
        assert!(row.contains(r#"<p class="helptext">A &lt;short&gt; bio</p>"#));
    }

    #[test]
    fn test_skeleton_row() {
        let html = BoundField::skeleton_row("Name");
        assert!(html.contains("skeleton"));
        assert!(html.contains("Name"));
        assert!(!html.contains("<input"));
    }
}
