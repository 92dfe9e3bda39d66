//! Field specifications.
//!
//! A [`FieldSpec`] describes one field of a resource: its [`FieldKind`],
//! whether it is required, its default, the values it may take, and how it is
//! labelled. Specs are built in code with the builder methods or parsed from
//! a JSON-schema-like property object with [`FieldSpec::from_schema`].

use std::collections::BTreeMap;

use crudkit_core::utils::text::title_from_key;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{FormError, FormResult};
use crate::kind::FieldKind;

/// Type name reported when a schema property has no `type`.
pub const MISSING_TYPE: &str = "<missing>";

/// Metadata that only some kinds use.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMeta {
    /// Resources an `id_reference` field may point at.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reference_resources: Vec<String>,
}

/// Describes a single field of a resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// The field key in documents and form records.
    pub key: String,
    /// The semantic kind.
    #[serde(rename = "type")]
    pub kind: FieldKind,
    /// Whether the field must have a value for the current operation.
    #[serde(default)]
    pub required: bool,
    /// Server-shaped default used when creating a document.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    /// Allowed values for select kinds.
    #[serde(default, rename = "oneOf", skip_serializing_if = "Vec::is_empty")]
    pub one_of: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub localized_label: Option<String>,
    /// Display text per allowed value.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub label_by_enum_option: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help_text: Option<String>,
    #[serde(default)]
    pub meta: FieldMeta,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum: Option<f64>,
    #[serde(default, rename = "maxLength", skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
}

impl FieldSpec {
    /// Creates an optional field with no constraints.
    pub fn new(key: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            key: key.into(),
            kind,
            required: false,
            default: None,
            one_of: Vec::new(),
            label: None,
            localized_label: None,
            label_by_enum_option: BTreeMap::new(),
            help_text: None,
            meta: FieldMeta::default(),
            minimum: None,
            maximum: None,
            max_length: None,
        }
    }

    /// Sets whether this field is required.
    #[must_use]
    pub const fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Sets the server-shaped default value.
    #[must_use]
    pub fn initial(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    /// Sets the allowed values.
    #[must_use]
    pub fn one_of<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.one_of = values.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the label.
    #[must_use]
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Sets the localized label, which takes precedence over the label.
    #[must_use]
    pub fn localized_label(mut self, label: impl Into<String>) -> Self {
        self.localized_label = Some(label.into());
        self
    }

    /// Sets the display text for one allowed value.
    #[must_use]
    pub fn label_option(mut self, value: impl Into<String>, label: impl Into<String>) -> Self {
        self.label_by_enum_option.insert(value.into(), label.into());
        self
    }

    /// Sets the help text.
    #[must_use]
    pub fn help_text(mut self, text: impl Into<String>) -> Self {
        self.help_text = Some(text.into());
        self
    }

    /// Sets the resources an `id_reference` field may point at.
    #[must_use]
    pub fn reference_resources<I, S>(mut self, resources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.meta.reference_resources = resources.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the inclusive numeric bounds.
    #[must_use]
    pub const fn bounds(mut self, minimum: Option<f64>, maximum: Option<f64>) -> Self {
        self.minimum = minimum;
        self.maximum = maximum;
        self
    }

    /// Sets the maximum length in characters.
    #[must_use]
    pub const fn max_length(mut self, max_length: usize) -> Self {
        self.max_length = Some(max_length);
        self
    }

    /// Returns the label shown next to the input.
    ///
    /// Prefers the localized label, then the label, then a title built from
    /// the key.
    pub fn display_label(&self) -> String {
        self.localized_label
            .clone()
            .or_else(|| self.label.clone())
            .unwrap_or_else(|| title_from_key(&self.key))
    }

    /// Returns the display text for one allowed value.
    pub fn option_label<'a>(&'a self, value: &'a str) -> &'a str {
        self.label_by_enum_option
            .get(value)
            .map_or(value, String::as_str)
    }

    /// Returns the server-shaped value a new document starts with.
    ///
    /// This is the declared default, or an empty value for the kind: an
    /// empty array for multi-valued kinds, `false` for booleans, `null`
    /// otherwise.
    pub fn initial_value(&self) -> Value {
        if let Some(default) = &self.default {
            return default.clone();
        }
        match self.kind {
            FieldKind::List | FieldKind::SelectMany => Value::Array(Vec::new()),
            FieldKind::Boolean => Value::Bool(false),
            _ => Value::Null,
        }
    }

    /// Parses a spec from a JSON-schema-like property object.
    ///
    /// Recognized keys: `type`, `default`, `oneOf` (or `enum`), `label`,
    /// `localized_label`, `label_by_enum_option`, `description` (or
    /// `help_text`), `meta.reference_resources`, `minimum`, `maximum`, and
    /// `maxLength`.
    ///
    /// # Errors
    ///
    /// Returns [`FormError::UnsupportedFieldType`] when `type` is missing or
    /// not a supported kind, and [`FormError::InvalidSpec`] when the property
    /// is malformed.
    pub fn from_schema(key: &str, schema: &Value, required: bool) -> FormResult<Self> {
        let obj = schema
            .as_object()
            .ok_or_else(|| invalid(key, "property schema must be an object"))?;

        let kind: FieldKind = match obj.get("type") {
            None | Some(Value::Null) => {
                return Err(FormError::UnsupportedFieldType(MISSING_TYPE.to_string()))
            }
            Some(Value::String(name)) => name.parse()?,
            Some(other) => return Err(FormError::UnsupportedFieldType(other.to_string())),
        };

        let mut spec = Self::new(key, kind).required(required);
        spec.default = obj.get("default").cloned();
        if let Some(values) = obj.get("oneOf").or_else(|| obj.get("enum")) {
            spec.one_of = string_list(key, "oneOf", values)?;
        }
        spec.label = optional_string(key, "label", obj.get("label"))?;
        spec.localized_label = optional_string(key, "localized_label", obj.get("localized_label"))?;
        spec.help_text = optional_string(
            key,
            "description",
            obj.get("description").or_else(|| obj.get("help_text")),
        )?;
        if let Some(labels) = obj.get("label_by_enum_option") {
            let labels = labels
                .as_object()
                .ok_or_else(|| invalid(key, "label_by_enum_option must be an object"))?;
            for (value, label) in labels {
                let label = label
                    .as_str()
                    .ok_or_else(|| invalid(key, "option labels must be strings"))?;
                spec.label_by_enum_option
                    .insert(value.clone(), label.to_string());
            }
        }
        if let Some(resources) = obj.get("meta").and_then(|m| m.get("reference_resources")) {
            spec.meta.reference_resources = string_list(key, "reference_resources", resources)?;
        }
        spec.minimum = optional_number(key, "minimum", obj.get("minimum"))?;
        spec.maximum = optional_number(key, "maximum", obj.get("maximum"))?;
        spec.max_length = match obj.get("maxLength") {
            None | Some(Value::Null) => None,
            Some(v) => Some(
                v.as_u64()
                    .and_then(|n| usize::try_from(n).ok())
                    .ok_or_else(|| invalid(key, "maxLength must be a non-negative integer"))?,
            ),
        };
        Ok(spec)
    }

    /// Parses every property of a `properties` object, in declaration order.
    ///
    /// A property is required when its key appears in `required`.
    ///
    /// # Errors
    ///
    /// Fails on the first property [`FieldSpec::from_schema`] rejects.
    pub fn from_schema_properties(properties: &Value, required: &[String]) -> FormResult<Vec<Self>> {
        let obj = properties
            .as_object()
            .ok_or_else(|| invalid("properties", "must be an object"))?;
        obj.iter()
            .map(|(key, schema)| Self::from_schema(key, schema, required.contains(key)))
            .collect()
    }
}

fn invalid(key: &str, reason: &str) -> FormError {
    FormError::InvalidSpec {
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

fn string_list(key: &str, what: &str, value: &Value) -> FormResult<Vec<String>> {
    let items = value
        .as_array()
        .ok_or_else(|| invalid(key, &format!("{what} must be an array")))?;
    items
        .iter()
        .map(|item| {
            item.as_str()
                .map(str::to_string)
                .ok_or_else(|| invalid(key, &format!("{what} entries must be strings")))
        })
        .collect()
}

fn optional_string(key: &str, what: &str, value: Option<&Value>) -> FormResult<Option<String>> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(invalid(key, &format!("{what} must be a string"))),
    }
}

fn optional_number(key: &str, what: &str, value: Option<&Value>) -> FormResult<Option<f64>> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(v) => v
            .as_f64()
            .map(Some)
            .ok_or_else(|| invalid(key, &format!("{what} must be a number"))),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_builder() {
        let spec = FieldSpec::new("status", FieldKind::SelectOne)
            .required(true)
            .one_of(["draft", "live"])
            .label_option("live", "Published")
            .initial(json!("draft"));
        assert!(spec.required);
        assert_eq!(spec.one_of, vec!["draft", "live"]);
        assert_eq!(spec.option_label("live"), "Published");
        assert_eq!(spec.option_label("draft"), "draft");
        assert_eq!(spec.initial_value(), json!("draft"));
    }

    #[test]
    fn test_display_label_precedence() {
        let spec = FieldSpec::new("first_name", FieldKind::ShortText);
        assert_eq!(spec.display_label(), "First Name");
        let spec = spec.label("Given name");
        assert_eq!(spec.display_label(), "Given name");
        let spec = spec.localized_label("Prénom");
        assert_eq!(spec.display_label(), "Prénom");
    }

    #[test]
    fn test_initial_value_by_kind() {
        assert_eq!(FieldSpec::new("a", FieldKind::List).initial_value(), json!([]));
        assert_eq!(FieldSpec::new("a", FieldKind::Boolean).initial_value(), json!(false));
        assert_eq!(FieldSpec::new("a", FieldKind::Email).initial_value(), Value::Null);
    }

    #[test]
    fn test_from_schema_full() {
        let schema = json!({
            "type": "id_reference",
            "label": "Owner",
            "description": "Who owns this",
            "meta": {"reference_resources": ["users"]},
        });
        let spec = FieldSpec::from_schema("owner", &schema, true).unwrap();
        assert_eq!(spec.kind, FieldKind::IdReference);
        assert!(spec.required);
        assert_eq!(spec.help_text.as_deref(), Some("Who owns this"));
        assert_eq!(spec.meta.reference_resources, vec!["users"]);
    }

    #[test]
    fn test_from_schema_bounds_and_enum() {
        let schema = json!({
            "type": "select_one",
            "enum": ["s", "m", "l"],
            "label_by_enum_option": {"s": "Small"},
        });
        let spec = FieldSpec::from_schema("size", &schema, false).unwrap();
        assert_eq!(spec.one_of.len(), 3);
        assert_eq!(spec.option_label("s"), "Small");

        let schema = json!({"type": "integer", "minimum": 0, "maximum": 10, "maxLength": 4});
        let spec = FieldSpec::from_schema("n", &schema, false).unwrap();
        assert_eq!(spec.minimum, Some(0.0));
        assert_eq!(spec.maximum, Some(10.0));
        assert_eq!(spec.max_length, Some(4));
    }

    #[test]
    fn test_from_schema_unknown_type() {
        let err = FieldSpec::from_schema("x", &json!({"type": "hologram"}), false).unwrap_err();
        assert!(err.to_string().contains("hologram"));
    }

    #[test]
    fn test_from_schema_missing_type() {
        let err = FieldSpec::from_schema("x", &json!({"label": "X"}), false).unwrap_err();
        assert!(matches!(err, FormError::UnsupportedFieldType(ref t) if t == MISSING_TYPE));
    }

    #[test]
    fn test_from_schema_malformed() {
        assert!(matches!(
            FieldSpec::from_schema("x", &json!("text"), false),
            Err(FormError::InvalidSpec { .. })
        ));
        assert!(matches!(
            FieldSpec::from_schema("x", &json!({"type": "select_one", "oneOf": [1]}), false),
            Err(FormError::InvalidSpec { .. })
        ));
        assert!(matches!(
            FieldSpec::from_schema("x", &json!({"type": "integer", "minimum": "0"}), false),
            Err(FormError::InvalidSpec { .. })
        ));
    }

    #[test]
    fn test_from_schema_properties_keeps_order() {
        let properties = json!({
            "title": {"type": "short_text"},
            "price": {"type": "usd"},
            "tags": {"type": "list"},
        });
        let specs =
            FieldSpec::from_schema_properties(&properties, &["title".to_string()]).unwrap();
        let keys: Vec<&str> = specs.iter().map(|s| s.key.as_str()).collect();
        assert_eq!(keys, vec!["title", "price", "tags"]);
        assert!(specs[0].required);
        assert!(!specs[1].required);
    }

    #[test]
    fn test_serde_shape() {
        let spec = FieldSpec::new("size", FieldKind::SelectOne).one_of(["s"]);
        let json = serde_json::to_value(&spec).unwrap();
        assert_eq!(json["type"], json!("select_one"));
        assert_eq!(json["oneOf"], json!(["s"]));
        let back: FieldSpec = serde_json::from_value(json).unwrap();
        assert_eq!(back, spec);
    }
}
