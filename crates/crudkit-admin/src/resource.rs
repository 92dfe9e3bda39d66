//! Resource specifications.
//!
//! A [`ResourceSpec`] describes one document collection: its fields, which of
//! them are required on create and on update, which keys an update may
//! change, the columns its table shows, and constant values stamped on every
//! new document. It is the static input the form orchestrator asks for
//! through [`crudkit_forms::ResourceSpecProvider`].

use std::collections::BTreeSet;

use crudkit_core::utils::text::title_from_key;
use crudkit_forms::backend::{Document, Operation};
use crudkit_forms::cells::CellProps;
use crudkit_forms::{FieldSpec, FormError, FormResult, ResourceTable, ValidationSchema};
use serde_json::Value;

/// Configuration of one resource shown in the admin.
///
/// # Examples
///
/// ```
/// use crudkit_admin::resource::ResourceSpec;
/// use crudkit_forms::{FieldKind, FieldSpec, Operation};
///
/// let people = ResourceSpec::new("people")
///     .field(FieldSpec::new("name", FieldKind::ShortText))
///     .field(FieldSpec::new("salary", FieldKind::Currency))
///     .required_on_create(["name"])
///     .update_keys(["salary"]);
///
/// assert_eq!(people.field_specs(&Operation::Create).len(), 2);
/// assert_eq!(people.field_specs(&Operation::update("p1")).len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct ResourceSpec {
    /// The resource name documents are stored under.
    pub name: String,
    /// The human-readable plural name.
    pub label: String,
    fields: Vec<FieldSpec>,
    required_on_create: BTreeSet<String>,
    required_on_update: BTreeSet<String>,
    /// `None` means every field is updatable.
    update_keys: Option<Vec<String>>,
    list_display: Vec<String>,
    ordering: Option<String>,
    constants: Document,
}

impl ResourceSpec {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            label: title_from_key(&name),
            name,
            fields: Vec::new(),
            required_on_create: BTreeSet::new(),
            required_on_update: BTreeSet::new(),
            update_keys: None,
            list_display: Vec::new(),
            ordering: None,
            constants: Document::new(),
        }
    }

    /// Sets the human-readable name.
    #[must_use]
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Adds a field. Its `required` flag is ignored; requiredness is set per
    /// operation.
    #[must_use]
    pub fn field(mut self, spec: FieldSpec) -> Self {
        self.fields.push(spec);
        self
    }

    #[must_use]
    pub fn required_on_create<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required_on_create = keys.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn required_on_update<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required_on_update = keys.into_iter().map(Into::into).collect();
        self
    }

    /// Restricts the keys an update may change.
    #[must_use]
    pub fn update_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.update_keys = Some(keys.into_iter().map(Into::into).collect());
        self
    }

    /// Sets the table columns. Defaults to every field.
    #[must_use]
    pub fn list_display<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.list_display = keys.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the default ordering (prefix with `-` for descending).
    #[must_use]
    pub fn ordering(mut self, field: impl Into<String>) -> Self {
        self.ordering = Some(field.into());
        self
    }

    /// Stamps a constant value on every created document.
    #[must_use]
    pub fn constant(mut self, key: impl Into<String>, value: Value) -> Self {
        self.constants.insert(key.into(), value);
        self
    }

    /// Builds a resource from a JSON-schema-like object.
    ///
    /// Recognized keys: `properties` (field specs, see
    /// [`FieldSpec::from_schema`]), `label`, `required` (required on create),
    /// `requiredOnUpdate`, `updateKeys`, `listDisplay`, `ordering`, and
    /// `constants`.
    ///
    /// # Errors
    ///
    /// Returns [`FormError::InvalidSpec`] when `properties` is missing and
    /// [`FormError::UnsupportedFieldType`] for any property of unknown type.
    pub fn from_json_schema(name: impl Into<String>, schema: &Value) -> FormResult<Self> {
        let name = name.into();
        let properties = schema.get("properties").ok_or_else(|| FormError::InvalidSpec {
            key: name.clone(),
            reason: "missing properties".into(),
        })?;

        let strings = |key: &str| -> Option<Vec<String>> {
            schema.get(key).and_then(Value::as_array).map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
        };

        let mut spec = Self::new(name);
        spec.fields = FieldSpec::from_schema_properties(properties, &[])?;
        if let Some(label) = schema.get("label").and_then(Value::as_str) {
            spec.label = label.to_string();
        }
        if let Some(keys) = strings("required") {
            spec.required_on_create = keys.into_iter().collect();
        }
        if let Some(keys) = strings("requiredOnUpdate") {
            spec.required_on_update = keys.into_iter().collect();
        }
        spec.update_keys = strings("updateKeys");
        if let Some(keys) = strings("listDisplay") {
            spec.list_display = keys;
        }
        spec.ordering = schema
            .get("ordering")
            .and_then(Value::as_str)
            .map(str::to_string);
        if let Some(constants) = schema.get("constants").and_then(Value::as_object) {
            spec.constants = constants.clone();
        }
        Ok(spec)
    }

    /// Returns every declared field.
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Returns `true` if `key` must be filled for `operation`.
    pub fn is_required(&self, key: &str, operation: &Operation) -> bool {
        match operation {
            Operation::Create => self.required_on_create.contains(key),
            Operation::Update { .. } => self.required_on_update.contains(key),
        }
    }

    /// Returns the keys an update may change.
    pub fn updatable_keys(&self) -> Vec<String> {
        self.update_keys
            .clone()
            .unwrap_or_else(|| self.fields.iter().map(|f| f.key.clone()).collect())
    }

    /// Returns the fields a form shows for `operation`, with `required`
    /// resolved for it.
    ///
    /// Updates only show updatable fields.
    pub fn field_specs(&self, operation: &Operation) -> Vec<FieldSpec> {
        let updatable = self.updatable_keys();
        self.fields
            .iter()
            .filter(|f| operation.is_create() || updatable.contains(&f.key))
            .cloned()
            .map(|f| {
                let required = self.is_required(&f.key, operation);
                f.required(required)
            })
            .collect()
    }

    /// Returns the validation schema of `operation`.
    pub fn validation_schema(&self, operation: &Operation) -> ValidationSchema {
        ValidationSchema::from_specs(&self.field_specs(operation))
    }

    /// Returns the declared defaults, server-shaped.
    pub fn defaults(&self) -> Document {
        self.fields
            .iter()
            .filter_map(|f| f.default.clone().map(|d| (f.key.clone(), d)))
            .collect()
    }

    /// Completes create params into a full document body.
    ///
    /// Fields missing from `params` get their initial value, then constants
    /// are applied over everything.
    pub fn merge_create_params(&self, mut params: Document) -> Document {
        for field in &self.fields {
            if !params.contains_key(&field.key) {
                params.insert(field.key.clone(), field.initial_value());
            }
        }
        for (key, value) in &self.constants {
            params.insert(key.clone(), value.clone());
        }
        params
    }

    /// Returns the default ordering, if any.
    pub fn default_ordering(&self) -> Option<&str> {
        self.ordering.as_deref()
    }

    /// Returns the fields shown as table columns.
    pub fn list_fields(&self) -> Vec<FieldSpec> {
        if self.list_display.is_empty() {
            return self.fields.clone();
        }
        self.list_display
            .iter()
            .filter_map(|key| self.fields.iter().find(|f| &f.key == key).cloned())
            .collect()
    }

    /// Builds the read-only table of this resource.
    pub fn table(&self, props: &CellProps) -> ResourceTable {
        ResourceTable::new(self.name.clone(), &self.list_fields(), props)
    }
}
