//! Collaborators the form orchestrator talks to.
//!
//! The forms layer never owns documents. It asks a [`ResourceSpecProvider`]
//! for field specs and defaults, reads existing documents through a
//! [`DocumentSource`], and writes through a [`MutationExecutor`]. All three
//! work with JSON records so they stay generic over every resource.

use std::collections::BTreeMap;
use std::fmt;

use async_trait::async_trait;
use crudkit_core::CrudResult;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::codec::Record;
use crate::error::FormResult;
use crate::spec::FieldSpec;

/// A stored document: a record with a string `_id`.
pub type Document = Record;

/// Key of the primary id in every document.
pub const ID_KEY: &str = "_id";

/// The mutation a form performs.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Operation {
    Create,
    Update { id: String },
}

impl Operation {
    /// Creates an update of the document with this id.
    pub fn update(id: impl Into<String>) -> Self {
        Self::Update { id: id.into() }
    }

    pub const fn name(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update { .. } => "update",
        }
    }

    pub const fn is_create(&self) -> bool {
        matches!(self, Self::Create)
    }

    /// Returns the id of the document being updated.
    pub fn document_id(&self) -> Option<&str> {
        match self {
            Self::Create => None,
            Self::Update { id } => Some(id.as_str()),
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The error body a backend returns for a rejected mutation.
///
/// `data` maps field keys to messages; keys may name fields the form does
/// not show.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub data: BTreeMap<String, Vec<String>>,
}

impl ErrorPayload {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            data: BTreeMap::new(),
        }
    }

    /// Adds a message for one field.
    #[must_use]
    pub fn with_field(mut self, key: impl Into<String>, message: impl Into<String>) -> Self {
        self.data.entry(key.into()).or_default().push(message.into());
        self
    }

    /// Reads a payload from loosely shaped JSON.
    ///
    /// A missing message becomes empty; string values in `data` are treated
    /// as one-message lists and non-string entries are dropped.
    pub fn from_value(value: &Value) -> Self {
        let message = value
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let mut data = BTreeMap::new();
        if let Some(fields) = value.get("data").and_then(Value::as_object) {
            for (key, messages) in fields {
                let list: Vec<String> = match messages {
                    Value::String(s) => vec![s.clone()],
                    Value::Array(items) => items
                        .iter()
                        .filter_map(Value::as_str)
                        .map(str::to_string)
                        .collect(),
                    _ => Vec::new(),
                };
                if !list.is_empty() {
                    data.insert(key.clone(), list);
                }
            }
        }
        Self { message, data }
    }
}

/// Why a mutation failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MutationError {
    /// The backend refused the write and explained why.
    #[error("mutation rejected: {}", .0.message)]
    Rejected(ErrorPayload),

    /// The backend could not be reached or failed unexpectedly.
    #[error("transport error: {0}")]
    Transport(String),
}

/// Supplies the static description of each resource.
///
/// Calls are synchronous; the output is trusted to be structurally valid.
pub trait ResourceSpecProvider: Send + Sync {
    /// Returns the field specs shown for `operation`, with `required` already
    /// resolved for it.
    fn field_specs(&self, resource: &str, operation: &Operation) -> FormResult<Vec<FieldSpec>>;

    /// Returns the server-shaped values a new document starts with.
    fn defaults(&self, resource: &str) -> FormResult<Document>;

    /// Returns the keys an update may change.
    fn update_keys(&self, resource: &str) -> FormResult<Vec<String>>;

    /// Completes create params into a full document body.
    fn merge_create_params(&self, resource: &str, params: Document) -> FormResult<Document>;
}

/// Writes documents.
#[async_trait]
pub trait MutationExecutor: Send + Sync {
    /// Creates a document and returns it with its `_id`.
    async fn create(&self, resource: &str, params: Document) -> Result<Document, MutationError>;

    /// Applies a partial update and returns the updated document.
    async fn update(
        &self,
        resource: &str,
        id: &str,
        params: Document,
    ) -> Result<Document, MutationError>;
}

/// Reads single documents.
#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// Fetches one document, or `CrudError::NotFound`.
    async fn fetch(&self, resource: &str, id: &str) -> CrudResult<Document>;
}

/// Keeps only the entries of `record` whose key is in `keys`.
pub fn restrict_to_keys(record: &Record, keys: &[String]) -> Record {
    record
        .iter()
        .filter(|(key, _)| keys.iter().any(|k| k == *key))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}
