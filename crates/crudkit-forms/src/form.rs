//! The create/update form orchestrator.
//!
//! A [`ResourceForm`] drives one mount of a resource form:
//!
//! 1. **Loading**: field specs and, for updates, the target document are
//!    being resolved.
//! 2. **Initializing defaults**: create forms take the provider's defaults,
//!    update forms take the fetched document restricted to the update keys;
//!    both are converted to form shape.
//! 3. **Ready**: values can be edited and the form submitted.
//! 4. **Submitting**: a mutation is in flight and inputs are disabled.
//! 5. **Succeeded**: the success callback has run.
//!
//! Submission always converts to wire shape first and validates the result,
//! so rules see cents and E.164 numbers rather than display strings. Backend
//! rejections are mapped onto fields by key; anything without a field goes
//! into one general error. Every failure returns the form to **Ready**.
//!
//! Field spec errors (an unsupported type, a malformed property) are not
//! handled here. They propagate out of [`ResourceForm::load`].

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use chrono::FixedOffset;
use crudkit_core::logging::form_span;
use crudkit_core::settings::Settings;
use crudkit_core::utils::text::{escape_html, title_from_key};
use serde_json::Value;
use tracing::{debug, error, info, warn, Instrument};

use crate::backend::{
    restrict_to_keys, Document, DocumentSource, ErrorPayload, MutationError, MutationExecutor,
    Operation, ResourceSpecProvider,
};
use crate::bound_field::BoundField;
use crate::codec::{decode_value, encode_value, form_to_server, server_to_form, ConverterOptions, ListItem, Record};
use crate::editors::{EditorProps, ReferenceOption};
use crate::error::{FormError, FormResult};
use crate::format;
use crate::kind::FieldKind;
use crate::messages::ToastQueue;
use crate::schema::ValidationSchema;
use crate::spec::FieldSpec;

/// Label of the submit control.
pub const SAVE_LABEL: &str = "Save";

/// Label of the submit control while a mutation is in flight.
pub const SAVING_LABEL: &str = "Saving…";

/// General error shown when the backend gives no usable message.
pub const GENERIC_ERROR_MESSAGE: &str = "Something went wrong. Please try again.";

/// Toast shown after a successful save.
pub const SAVED_MESSAGE: &str = "Saved.";

/// Skeleton rows shown before the field specs are known.
const PLACEHOLDER_ROWS: usize = 3;

/// Lifecycle state of a [`ResourceForm`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormState {
    Loading,
    InitializingDefaults,
    Ready,
    Submitting,
    Succeeded,
}

impl fmt::Display for FormState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Loading => "loading",
            Self::InitializingDefaults => "initializing defaults",
            Self::Ready => "ready",
            Self::Submitting => "submitting",
            Self::Succeeded => "succeeded",
        };
        f.write_str(name)
    }
}

/// Locale settings a form formats values with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormConfig {
    pub utc_offset: FixedOffset,
    pub currency_symbol: String,
    pub phone_region: String,
}

impl Default for FormConfig {
    fn default() -> Self {
        Self::from(&Settings::default())
    }
}

impl From<&Settings> for FormConfig {
    fn from(settings: &Settings) -> Self {
        Self {
            utc_offset: format::offset_from_minutes(settings.utc_offset_minutes),
            currency_symbol: settings.currency_symbol.clone(),
            phone_region: settings.default_phone_region.clone(),
        }
    }
}

impl FormConfig {
    /// Builds converter options for `specs` with this locale.
    pub fn converter_for(&self, specs: &[FieldSpec]) -> ConverterOptions {
        ConverterOptions::from_field_specs(specs)
            .utc_offset(self.utc_offset)
            .currency_symbol(self.currency_symbol.clone())
            .phone_region(self.phone_region.clone())
    }
}

/// A validated, wire-shaped submission waiting to be sent.
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    pub resource: String,
    pub operation: Operation,
    pub params: Document,
}

/// How a submission ended.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// The backend stored the document.
    Succeeded(Document),
    /// Validation failed; the backend was not contacted.
    Invalid,
    /// The backend rejected the write.
    Rejected(ErrorPayload),
    /// The backend could not be reached.
    Failed(String),
}

/// Orchestrates one create or update form.
pub struct ResourceForm {
    resource: String,
    operation: Operation,
    provider: Arc<dyn ResourceSpecProvider>,
    executor: Arc<dyn MutationExecutor>,
    config: FormConfig,
    state: FormState,
    specs: Vec<FieldSpec>,
    converter: ConverterOptions,
    schema: ValidationSchema,
    values: Record,
    field_errors: BTreeMap<String, Vec<String>>,
    general_error: Option<String>,
    reference_options: HashMap<String, Vec<ReferenceOption>>,
    toasts: ToastQueue,
}

impl ResourceForm {
    /// Creates a form in the **Loading** state.
    pub fn new(
        resource: impl Into<String>,
        operation: Operation,
        provider: Arc<dyn ResourceSpecProvider>,
        executor: Arc<dyn MutationExecutor>,
    ) -> Self {
        Self {
            resource: resource.into(),
            operation,
            provider,
            executor,
            config: FormConfig::default(),
            state: FormState::Loading,
            specs: Vec::new(),
            converter: ConverterOptions::default(),
            schema: ValidationSchema::default(),
            values: Record::new(),
            field_errors: BTreeMap::new(),
            general_error: None,
            reference_options: HashMap::new(),
            toasts: ToastQueue::new(),
        }
    }

    /// Replaces the locale settings. Takes effect on [`ResourceForm::load`].
    #[must_use]
    pub fn with_config(mut self, config: FormConfig) -> Self {
        self.config = config;
        self
    }

    fn span(&self) -> tracing::Span {
        form_span(&self.resource, self.operation.name())
    }

    fn transition(&mut self, next: FormState) {
        debug!(
            resource = %self.resource,
            operation = %self.operation,
            from = %self.state,
            to = %next,
            "form state transition"
        );
        self.state = next;
    }

    fn expect_state(&self, expected: FormState, action: &str) -> FormResult<()> {
        if self.state == expected {
            Ok(())
        } else {
            Err(FormError::InvalidState {
                action: action.to_string(),
                state: self.state.to_string(),
            })
        }
    }

    fn spec(&self, key: &str) -> FormResult<&FieldSpec> {
        self.specs
            .iter()
            .find(|s| s.key == key)
            .ok_or_else(|| FormError::UnknownField(key.to_string()))
    }

    // ── Loading ─────────────────────────────────────────────────────

    /// Resolves field specs and initial values, ending in **Ready**.
    ///
    /// # Errors
    ///
    /// Spec provider errors propagate unchanged. If the document of an update
    /// cannot be fetched, the form records a general error, stays in
    /// **Loading**, and returns the fetch error; `load` may be retried.
    pub async fn load(&mut self, source: &dyn DocumentSource) -> FormResult<()> {
        self.expect_state(FormState::Loading, "load")?;
        let span = self.span();

        let specs = {
            let _enter = span.enter();
            self.provider.field_specs(&self.resource, &self.operation)?
        };

        let server = match &self.operation {
            Operation::Create => self.provider.defaults(&self.resource)?,
            Operation::Update { id } => {
                let fetched = source
                    .fetch(&self.resource, id)
                    .instrument(span.clone())
                    .await;
                match fetched {
                    Ok(document) => {
                        let keys = self.provider.update_keys(&self.resource)?;
                        restrict_to_keys(&document, &keys)
                    }
                    Err(err) => {
                        let _enter = span.enter();
                        error!(resource = %self.resource, id = %id, error = %err, "failed to load document");
                        self.general_error = Some(err.to_string());
                        return Err(err.into());
                    }
                }
            }
        };

        let _enter = span.enter();
        self.general_error = None;
        self.converter = self.config.converter_for(&specs);
        self.schema = ValidationSchema::from_specs(&specs);
        self.specs = specs;
        self.transition(FormState::InitializingDefaults);

        let mut values = server_to_form(&server, &self.converter);
        for spec in &self.specs {
            if !values.contains_key(&spec.key) {
                let initial = decode_value(&spec.key, &spec.initial_value(), &self.converter);
                values.insert(spec.key.clone(), initial);
            }
        }
        self.values = values;
        self.transition(FormState::Ready);
        Ok(())
    }

    // ── Editing ─────────────────────────────────────────────────────

    /// Sets a form-shaped value and clears that field's errors.
    ///
    /// # Errors
    ///
    /// Fails outside **Ready** and for keys without a field spec.
    pub fn set_value(&mut self, key: &str, value: Value) -> FormResult<()> {
        self.expect_state(FormState::Ready, "edit")?;
        self.spec(key)?;
        self.values.insert(key.to_string(), value);
        self.field_errors.remove(key);
        Ok(())
    }

    /// Returns the current form-shaped value of a field.
    pub fn value(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Returns every form-shaped value.
    pub fn values(&self) -> &Record {
        &self.values
    }

    fn with_rows<R>(
        &mut self,
        key: &str,
        action: &str,
        f: impl FnOnce(&mut Vec<Value>) -> R,
    ) -> FormResult<R> {
        self.expect_state(FormState::Ready, action)?;
        let spec = self.spec(key)?;
        if !spec.kind.is_multi_valued() {
            return Err(FormError::InvalidSpec {
                key: key.to_string(),
                reason: format!("{} fields have no rows", spec.kind),
            });
        }
        self.field_errors.remove(key);
        let mut rows = match self.values.remove(key) {
            Some(Value::Array(rows)) => rows,
            _ => Vec::new(),
        };
        let result = f(&mut rows);
        self.values.insert(key.to_string(), Value::Array(rows));
        Ok(result)
    }

    /// Appends a row to a list field and returns the row id.
    ///
    /// # Errors
    ///
    /// Fails outside **Ready** and for fields that are not multi-valued.
    pub fn push_list_item(&mut self, key: &str, value: impl Into<String>) -> FormResult<String> {
        let item = ListItem::new(value);
        self.with_rows(key, "add a row", |rows| rows.push(item.to_value()))?;
        Ok(item.id)
    }

    /// Changes the value of one row. Returns `false` if no row has that id.
    ///
    /// # Errors
    ///
    /// Fails outside **Ready** and for fields that are not multi-valued.
    pub fn set_list_item(
        &mut self,
        key: &str,
        row_id: &str,
        value: impl Into<String>,
    ) -> FormResult<bool> {
        let value = value.into();
        self.with_rows(key, "edit a row", |rows| {
            let row = rows
                .iter_mut()
                .find(|row| row.get("id").and_then(Value::as_str) == Some(row_id));
            if let Some(row) = row {
                row["value"] = Value::String(value);
                true
            } else {
                false
            }
        })
    }

    /// Removes one row by id. Returns `false` if no row has that id.
    ///
    /// # Errors
    ///
    /// Fails outside **Ready** and for fields that are not multi-valued.
    pub fn remove_list_item(&mut self, key: &str, row_id: &str) -> FormResult<bool> {
        self.with_rows(key, "remove a row", |rows| {
            let before = rows.len();
            rows.retain(|row| row.get("id").and_then(Value::as_str) != Some(row_id));
            rows.len() != before
        })
    }

    /// Switches the phone region, re-formatting phone values for it.
    ///
    /// `united_states_phone_number` fields are unaffected.
    ///
    /// # Errors
    ///
    /// Fails outside **Ready**.
    pub fn set_phone_region(&mut self, region: impl Into<String>) -> FormResult<()> {
        self.expect_state(FormState::Ready, "change the phone region")?;
        let previous = self.converter.clone();
        self.config.phone_region = region.into();
        self.converter = self.config.converter_for(&self.specs);
        for key in &previous.phone_number_field_keys {
            if let Some(value) = self.values.get(key) {
                let wire = encode_value(key, value, &previous);
                let display = decode_value(key, &wire, &self.converter);
                self.values.insert(key.clone(), display);
            }
        }
        Ok(())
    }

    /// Supplies the documents a reference field offers.
    pub fn set_reference_options(&mut self, key: impl Into<String>, options: Vec<ReferenceOption>) {
        self.reference_options.insert(key.into(), options);
    }

    /// Returns each reference field with the resources it may point at.
    pub fn reference_fields(&self) -> Vec<(&str, &[String])> {
        self.specs
            .iter()
            .filter(|s| s.kind == FieldKind::IdReference)
            .map(|s| (s.key.as_str(), s.meta.reference_resources.as_slice()))
            .collect()
    }

    // ── Validation and submission ───────────────────────────────────

    /// Converts the values to wire shape and validates them.
    ///
    /// Replaces the field errors with the validation result and never
    /// contacts the backend. Returns the wire-shaped record when valid.
    pub fn validate(&mut self) -> Option<Record> {
        self.field_errors.clear();
        let params = form_to_server(&self.values, &self.converter);
        match self.schema.validate(&params) {
            Ok(()) => Some(params),
            Err(err) => {
                self.field_errors = err.field_messages().into_iter().collect();
                None
            }
        }
    }

    /// Validates and moves to **Submitting**.
    ///
    /// Returns `None`, staying in **Ready**, when validation fails.
    ///
    /// # Errors
    ///
    /// Fails outside **Ready** and when the spec provider cannot complete the
    /// params.
    pub fn begin_submit(&mut self) -> FormResult<Option<Submission>> {
        self.expect_state(FormState::Ready, "submit")?;
        let _enter = self.span().entered();
        self.general_error = None;

        let Some(params) = self.validate() else {
            warn!(
                resource = %self.resource,
                fields = ?self.field_errors.keys().collect::<Vec<_>>(),
                "submission failed validation"
            );
            return Ok(None);
        };

        let params = match &self.operation {
            Operation::Create => self.provider.merge_create_params(&self.resource, params)?,
            Operation::Update { .. } => {
                restrict_to_keys(&params, &self.provider.update_keys(&self.resource)?)
            }
        };

        self.transition(FormState::Submitting);
        Ok(Some(Submission {
            resource: self.resource.clone(),
            operation: self.operation.clone(),
            params,
        }))
    }

    /// Applies the result of a submission started with [`Self::begin_submit`].
    ///
    /// On success the form moves to **Succeeded** and `on_success` runs with
    /// the stored document. On failure the form returns to **Ready** with the
    /// errors mapped.
    ///
    /// # Errors
    ///
    /// Fails outside **Submitting**.
    pub fn finish_submit<F>(
        &mut self,
        result: Result<Document, MutationError>,
        on_success: F,
    ) -> FormResult<SubmitOutcome>
    where
        F: FnOnce(&Document),
    {
        self.expect_state(FormState::Submitting, "finish a submission")?;
        let _enter = self.span().entered();
        match result {
            Ok(document) => {
                info!(resource = %self.resource, operation = %self.operation, "document saved");
                self.transition(FormState::Succeeded);
                self.toasts.success(SAVED_MESSAGE);
                on_success(&document);
                Ok(SubmitOutcome::Succeeded(document))
            }
            Err(MutationError::Rejected(payload)) => {
                warn!(
                    resource = %self.resource,
                    message = %payload.message,
                    fields = ?payload.data.keys().collect::<Vec<_>>(),
                    "submission rejected"
                );
                self.apply_error_payload(&payload);
                self.transition(FormState::Ready);
                Ok(SubmitOutcome::Rejected(payload))
            }
            Err(MutationError::Transport(message)) => {
                error!(resource = %self.resource, error = %message, "submission failed");
                self.general_error = Some(GENERIC_ERROR_MESSAGE.to_string());
                self.toasts.error(format!("Could not save: {message}"));
                self.transition(FormState::Ready);
                Ok(SubmitOutcome::Failed(message))
            }
        }
    }

    /// Validates, sends the mutation, and applies its result.
    ///
    /// `on_success` runs once with the stored document if the write succeeds.
    ///
    /// # Errors
    ///
    /// Fails outside **Ready** and when the spec provider fails. Validation
    /// failures and backend errors are reported through [`SubmitOutcome`]
    /// and the form's error accessors instead.
    pub async fn submit<F>(&mut self, on_success: F) -> FormResult<SubmitOutcome>
    where
        F: FnOnce(&Document),
    {
        let Some(submission) = self.begin_submit()? else {
            return Ok(SubmitOutcome::Invalid);
        };
        let executor = Arc::clone(&self.executor);
        let result = match &submission.operation {
            Operation::Create => {
                executor
                    .create(&submission.resource, submission.params)
                    .instrument(self.span())
                    .await
            }
            Operation::Update { id } => {
                executor
                    .update(&submission.resource, id, submission.params)
                    .instrument(self.span())
                    .await
            }
        };
        self.finish_submit(result, on_success)
    }

    /// Maps a backend error payload onto the form.
    ///
    /// Keys with a field spec get their messages attached to that field.
    /// Unknown keys, or a payload without field data, produce one general
    /// error: the payload message if there is one, otherwise the folded
    /// unknown-key messages, otherwise a generic message.
    pub fn apply_error_payload(&mut self, payload: &ErrorPayload) {
        let known: HashSet<&str> = self.specs.iter().map(|s| s.key.as_str()).collect();
        let mut folded = Vec::new();
        for (key, messages) in &payload.data {
            if known.contains(key.as_str()) {
                self.field_errors
                    .entry(key.clone())
                    .or_default()
                    .extend(messages.iter().cloned());
            } else {
                let label = title_from_key(key);
                folded.extend(messages.iter().map(|m| format!("{label}: {m}")));
            }
        }
        if payload.data.is_empty() || !folded.is_empty() {
            let message = if !payload.message.is_empty() {
                payload.message.clone()
            } else if !folded.is_empty() {
                folded.join(" ")
            } else {
                GENERIC_ERROR_MESSAGE.to_string()
            };
            self.general_error = Some(message);
        }
    }

    // ── Accessors ───────────────────────────────────────────────────

    pub fn state(&self) -> FormState {
        self.state
    }

    pub fn resource(&self) -> &str {
        &self.resource
    }

    pub fn operation(&self) -> &Operation {
        &self.operation
    }

    pub fn config(&self) -> &FormConfig {
        &self.config
    }

    /// Returns the field specs, empty until loaded.
    pub fn field_specs(&self) -> &[FieldSpec] {
        &self.specs
    }

    /// Returns the converter options derived from the field specs.
    pub fn converter(&self) -> &ConverterOptions {
        &self.converter
    }

    /// Returns the errors of every field that has any.
    pub fn field_errors(&self) -> &BTreeMap<String, Vec<String>> {
        &self.field_errors
    }

    /// Returns the errors of one field.
    pub fn errors_for(&self, key: &str) -> &[String] {
        self.field_errors.get(key).map_or(&[], Vec::as_slice)
    }

    pub fn general_error(&self) -> Option<&str> {
        self.general_error.as_deref()
    }

    /// Returns the pending toasts.
    pub fn toasts_mut(&mut self) -> &mut ToastQueue {
        &mut self.toasts
    }

    /// Returns `true` when inputs must not accept edits.
    pub fn is_disabled(&self) -> bool {
        self.state != FormState::Ready
    }

    pub fn submit_label(&self) -> &'static str {
        if self.state == FormState::Submitting {
            SAVING_LABEL
        } else {
            SAVE_LABEL
        }
    }

    // ── Rendering ───────────────────────────────────────────────────

    /// Returns the fields bound to their values and errors.
    pub fn bound_fields(&self) -> Vec<BoundField> {
        let base = EditorProps::default()
            .disabled(self.is_disabled())
            .phone_region(self.config.phone_region.clone());
        self.specs
            .iter()
            .map(|spec| {
                let props = self
                    .reference_options
                    .get(&spec.key)
                    .map_or_else(|| base.clone(), |o| base.clone().reference_options(o.clone()));
                BoundField::new(
                    spec,
                    self.values.get(&spec.key).cloned().unwrap_or(Value::Null),
                    self.errors_for(&spec.key).to_vec(),
                    &props,
                )
            })
            .collect()
    }

    /// Renders the form.
    ///
    /// While loading, rows are skeleton placeholders. Field errors appear
    /// under their inputs and the general error after the submit control.
    pub fn render_html(&self) -> String {
        let loading = matches!(
            self.state,
            FormState::Loading | FormState::InitializingDefaults
        );
        let mut html = format!(
            r#"<form class="resource-form" data-resource="{}" data-operation="{}"{}>"#,
            escape_html(&self.resource),
            self.operation,
            if loading { r#" aria-busy="true""# } else { "" }
        );

        if loading {
            if self.specs.is_empty() {
                for _ in 0..PLACEHOLDER_ROWS {
                    html.push_str(&BoundField::skeleton_row(""));
                }
            } else {
                for spec in &self.specs {
                    html.push_str(&BoundField::skeleton_row(&spec.display_label()));
                }
            }
        } else {
            for field in self.bound_fields() {
                html.push_str(&field.as_row());
            }
        }

        let disabled = if self.is_disabled() { " disabled" } else { "" };
        html.push_str(&format!(
            r#"<button type="submit"{disabled}>{}</button>"#,
            self.submit_label()
        ));
        if let Some(message) = &self.general_error {
            html.push_str(&format!(
                r#"<div class="general-error" role="alert">{}</div>"#,
                escape_html(message)
            ));
        }
        html.push_str("</form>");
        html
    }
}

impl fmt::Debug for ResourceForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceForm")
            .field("resource", &self.resource)
            .field("operation", &self.operation)
            .field("state", &self.state)
            .field("values", &self.values)
            .field("field_errors", &self.field_errors)
            .field("general_error", &self.general_error)
            .finish_non_exhaustive()
    }
}
