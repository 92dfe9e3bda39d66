//! In-memory document store.
//!
//! [`InMemoryDocumentStore`] keeps documents per resource behind an
//! `Arc<RwLock<..>>` and implements every backend seam the forms layer and
//! pages use: [`MutationExecutor`], [`DocumentSource`], and [`PageQuery`].
//!
//! It behaves like a schemaless document backend. Create assigns a uuid
//! `_id`, update merges the given fields over the stored document (the last
//! write wins, nothing is detected), and required keys configured with
//! [`InMemoryDocumentStore::require`] are enforced on create by rejecting
//! with a `{message, data: {key: ["is required"]}}` payload.

use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use crudkit_core::{CrudError, CrudResult};
use crudkit_forms::backend::{
    Document, DocumentSource, ErrorPayload, MutationError, MutationExecutor, ID_KEY,
};
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use crate::page_query::{apply_filters, apply_ordering, paginate, PageQuery, PageQueryOptions, PageResult};

/// Message attached to a missing required key.
pub const REQUIRED_MESSAGE: &str = "is required";

/// Message of a rejected write with field errors.
pub const INVALID_MESSAGE: &str = "Invalid document.";

/// Transport error reported while the store is offline.
pub const OFFLINE_MESSAGE: &str = "backend unavailable";

/// A shared, in-memory document backend.
///
/// # Examples
///
/// ```
/// use crudkit_admin::store::InMemoryDocumentStore;
///
/// let store = InMemoryDocumentStore::new();
/// assert_eq!(store.count("people"), 0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemoryDocumentStore {
    /// Documents keyed by resource name, in insertion order.
    tables: Arc<RwLock<HashMap<String, Vec<Document>>>>,
    required: Arc<RwLock<HashMap<String, BTreeSet<String>>>>,
    offline: Arc<AtomicBool>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `keys` required when creating documents of `resource`.
    #[must_use]
    pub fn require<I, S>(self, resource: &str, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(resource.to_string(), keys.into_iter().map(Into::into).collect());
        self
    }

    /// While offline, every write fails with a transport error.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Stores a document as-is, assigning an `_id` if it has none. Returns
    /// the id.
    pub fn insert(&self, resource: &str, mut document: Document) -> String {
        let id = match document.get(ID_KEY).and_then(Value::as_str) {
            Some(id) => id.to_string(),
            None => {
                let id = Uuid::new_v4().to_string();
                document.insert(ID_KEY.to_string(), Value::String(id.clone()));
                id
            }
        };
        self.tables
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(resource.to_string())
            .or_default()
            .push(document);
        id
    }

    /// Returns one stored document.
    pub fn get(&self, resource: &str, id: &str) -> Option<Document> {
        self.tables
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(resource)?
            .iter()
            .find(|doc| has_id(doc, id))
            .cloned()
    }

    /// Returns every stored document of a resource.
    pub fn all(&self, resource: &str) -> Vec<Document> {
        self.tables
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(resource)
            .cloned()
            .unwrap_or_default()
    }

    pub fn count(&self, resource: &str) -> usize {
        self.tables
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(resource)
            .map_or(0, Vec::len)
    }

    /// Removes every document of every resource.
    pub fn clear(&self) {
        self.tables
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    fn ensure_online(&self) -> Result<(), MutationError> {
        if self.offline.load(Ordering::SeqCst) {
            Err(MutationError::Transport(OFFLINE_MESSAGE.to_string()))
        } else {
            Ok(())
        }
    }

    fn check_required(&self, resource: &str, params: &Document) -> Result<(), MutationError> {
        let required = self.required.read().unwrap_or_else(PoisonError::into_inner);
        let Some(keys) = required.get(resource) else {
            return Ok(());
        };
        let payload = keys
            .iter()
            .filter(|key| params.get(key.as_str()).map_or(true, is_blank))
            .fold(ErrorPayload::default(), |payload, key| {
                payload.with_field(key.clone(), REQUIRED_MESSAGE)
            });
        if payload.data.is_empty() {
            Ok(())
        } else {
            Err(MutationError::Rejected(payload))
        }
    }
}

fn has_id(document: &Document, id: &str) -> bool {
    document.get(ID_KEY).and_then(Value::as_str) == Some(id)
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

#[async_trait]
impl MutationExecutor for InMemoryDocumentStore {
    async fn create(&self, resource: &str, mut params: Document) -> Result<Document, MutationError> {
        self.ensure_online()?;
        self.check_required(resource, &params)?;
        // Ids are always assigned by the store.
        params.remove(ID_KEY);
        let id = self.insert(resource, params.clone());
        params.insert(ID_KEY.to_string(), Value::String(id.clone()));
        debug!(resource, id = %id, "document created");
        Ok(params)
    }

    #[allow(clippy::significant_drop_tightening)]
    async fn update(
        &self,
        resource: &str,
        id: &str,
        params: Document,
    ) -> Result<Document, MutationError> {
        self.ensure_online()?;
        let mut tables = self.tables.write().unwrap_or_else(PoisonError::into_inner);
        let document = tables
            .get_mut(resource)
            .and_then(|docs| docs.iter_mut().find(|doc| has_id(doc, id)))
            .ok_or_else(|| {
                MutationError::Rejected(ErrorPayload::new(format!(
                    "Document '{id}' not found in '{resource}'."
                )))
            })?;
        for (key, value) in params {
            if key != ID_KEY {
                document.insert(key, value);
            }
        }
        debug!(resource, id, "document updated");
        Ok(document.clone())
    }
}

#[async_trait]
impl DocumentSource for InMemoryDocumentStore {
    async fn fetch(&self, resource: &str, id: &str) -> CrudResult<Document> {
        self.get(resource, id)
            .ok_or_else(|| CrudError::NotFound(format!("document '{id}' in '{resource}'")))
    }
}

#[async_trait]
impl PageQuery for InMemoryDocumentStore {
    async fn query(&self, resource: &str, options: &PageQueryOptions) -> CrudResult<PageResult> {
        let documents = apply_filters(self.all(resource), &options.filters);
        let documents = apply_ordering(documents, options.ordering.as_deref());
        Ok(paginate(documents, options.page, options.page_size))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn doc(value: Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_create_assigns_id() {
        let store = InMemoryDocumentStore::new();
        let created = store
            .create("people", doc(json!({"name": "Ada", "_id": "forged"})))
            .await
            .unwrap();
        let id = created["_id"].as_str().unwrap();
        assert_ne!(id, "forged");
        assert!(Uuid::parse_str(id).is_ok());
        assert_eq!(store.count("people"), 1);
        assert_eq!(store.get("people", id).unwrap()["name"], json!("Ada"));
    }

    #[tokio::test]
    async fn test_create_rejects_missing_required() {
        let store = InMemoryDocumentStore::new().require("people", ["name", "email"]);
        let err = store
            .create("people", doc(json!({"name": "  ", "age": 3})))
            .await
            .unwrap_err();
        let MutationError::Rejected(payload) = err else {
            panic!("expected a rejection");
        };
        assert_eq!(payload.data["name"], vec![REQUIRED_MESSAGE]);
        assert_eq!(payload.data["email"], vec![REQUIRED_MESSAGE]);
        assert_eq!(store.count("people"), 0);
    }

    #[tokio::test]
    async fn test_update_merges_last_write_wins() {
        let store = InMemoryDocumentStore::new();
        let id = store.insert("people", doc(json!({"name": "Ada", "age": 36})));
        store
            .update("people", &id, doc(json!({"age": 37})))
            .await
            .unwrap();
        let updated = store
            .update("people", &id, doc(json!({"age": 38, "_id": "other"})))
            .await
            .unwrap();
        assert_eq!(updated["age"], json!(38));
        assert_eq!(updated["name"], json!("Ada"));
        assert_eq!(updated["_id"], json!(id));
    }

    #[tokio::test]
    async fn test_update_missing_document() {
        let store = InMemoryDocumentStore::new();
        let err = store
            .update("people", "nope", Document::new())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("nope"));
    }

    #[tokio::test]
    async fn test_offline_writes_fail() {
        let store = InMemoryDocumentStore::new();
        store.set_offline(true);
        let err = store.create("people", Document::new()).await.unwrap_err();
        assert_eq!(err, MutationError::Transport(OFFLINE_MESSAGE.into()));
        store.set_offline(false);
        assert!(store.create("people", Document::new()).await.is_ok());
    }

    #[tokio::test]
    async fn test_fetch() {
        let store = InMemoryDocumentStore::new();
        let id = store.insert("people", doc(json!({"name": "Ada"})));
        assert_eq!(store.fetch("people", &id).await.unwrap()["name"], json!("Ada"));
        let err = store.fetch("people", "nope").await.unwrap_err();
        assert!(matches!(err, CrudError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_query() {
        let store = InMemoryDocumentStore::new();
        for (name, team) in [("Ada", "core"), ("Grace", "ops"), ("Linus", "core")] {
            store.insert("people", doc(json!({"name": name, "team": team})));
        }
        let options = PageQueryOptions::new()
            .filter("team", json!("core"))
            .ordering("-name")
            .page_size(1);
        let page = store.query("people", &options).await.unwrap();
        assert_eq!(page.total, 2);
        assert!(page.has_next);
        assert_eq!(page.documents[0]["name"], json!("Linus"));
    }

    #[tokio::test]
    async fn test_clones_share_tables() {
        let store = InMemoryDocumentStore::new();
        let other = store.clone();
        store.insert("people", Document::new());
        assert_eq!(other.count("people"), 1);
        other.clear();
        assert_eq!(store.count("people"), 0);
    }
}
