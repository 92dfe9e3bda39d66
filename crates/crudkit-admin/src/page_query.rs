//! Paginated document queries.
//!
//! [`PageQuery`] is how pages list documents and how reference editors get
//! their options. The filtering, ordering, and pagination helpers here work
//! on plain JSON documents so any in-memory source can share them.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use async_trait::async_trait;
use crudkit_core::CrudResult;
use crudkit_forms::backend::{Document, ID_KEY};
use crudkit_forms::editors::ReferenceOption;
use crudkit_forms::ResourceForm;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Default number of documents per page.
pub const DEFAULT_PAGE_SIZE: usize = 25;

/// Fields tried, in order, when a document needs a human-readable label.
pub const LABEL_FIELDS: &[&str] = &["name", "title", "label", "email"];

/// Options for one page query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageQueryOptions {
    /// The page number (1-indexed).
    pub page: usize,
    pub page_size: usize,
    /// Field to order by (prefix with `-` for descending).
    pub ordering: Option<String>,
    /// Equality filters on field values.
    pub filters: BTreeMap<String, Value>,
}

impl Default for PageQueryOptions {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            ordering: None,
            filters: BTreeMap::new(),
        }
    }
}

impl PageQueryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn page(mut self, page: usize) -> Self {
        self.page = page;
        self
    }

    #[must_use]
    pub const fn page_size(mut self, size: usize) -> Self {
        self.page_size = size;
        self
    }

    #[must_use]
    pub fn ordering(mut self, field: impl Into<String>) -> Self {
        self.ordering = Some(field.into());
        self
    }

    #[must_use]
    pub fn filter(mut self, field: impl Into<String>, value: Value) -> Self {
        self.filters.insert(field.into(), value);
        self
    }
}

/// One page of documents.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageResult {
    /// `true` while the page has not arrived yet.
    pub loading: bool,
    pub documents: Vec<Document>,
    pub page: usize,
    /// Matching documents across all pages.
    pub total: usize,
    pub has_next: bool,
}

impl PageResult {
    /// The placeholder shown before a page arrives.
    pub fn pending() -> Self {
        Self {
            loading: true,
            ..Self::default()
        }
    }
}

/// Supplies paginated document lists.
#[async_trait]
pub trait PageQuery: Send + Sync {
    async fn query(&self, resource: &str, options: &PageQueryOptions) -> CrudResult<PageResult>;
}

/// Keeps documents whose fields equal every filter value.
pub fn apply_filters(documents: Vec<Document>, filters: &BTreeMap<String, Value>) -> Vec<Document> {
    if filters.is_empty() {
        return documents;
    }
    documents
        .into_iter()
        .filter(|doc| {
            filters.iter().all(|(field, expected)| {
                doc.get(field).map_or(expected.is_null(), |v| v == expected)
            })
        })
        .collect()
}

/// Sorts documents by one field. Missing values sort first.
pub fn apply_ordering(mut documents: Vec<Document>, ordering: Option<&str>) -> Vec<Document> {
    let Some(ordering) = ordering else {
        return documents;
    };
    let (field, descending) = ordering
        .strip_prefix('-')
        .map_or((ordering, false), |stripped| (stripped, true));
    documents.sort_by(|a, b| {
        let cmp = compare_values(a.get(field), b.get(field));
        if descending {
            cmp.reverse()
        } else {
            cmp
        }
    });
    documents
}

fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => {
            if let (Some(a), Some(b)) = (a.as_str(), b.as_str()) {
                a.cmp(b)
            } else if let (Some(a), Some(b)) = (a.as_f64(), b.as_f64()) {
                a.partial_cmp(&b).unwrap_or(Ordering::Equal)
            } else if let (Some(a), Some(b)) = (a.as_bool(), b.as_bool()) {
                a.cmp(&b)
            } else {
                a.to_string().cmp(&b.to_string())
            }
        }
    }
}

/// Cuts one page out of an ordered list. A page size of zero means one page
/// holding everything.
pub fn paginate(documents: Vec<Document>, page: usize, page_size: usize) -> PageResult {
    let total = documents.len();
    let page = page.max(1);
    let page_size = if page_size == 0 { total.max(1) } else { page_size };
    let start = (page - 1).saturating_mul(page_size).min(total);
    let end = start.saturating_add(page_size).min(total);
    PageResult {
        loading: false,
        documents: documents[start..end].to_vec(),
        page,
        total,
        has_next: end < total,
    }
}

/// Returns a human-readable label for a document.
pub fn document_label(document: &Document) -> String {
    LABEL_FIELDS
        .iter()
        .find_map(|field| document.get(*field).and_then(Value::as_str))
        .filter(|s| !s.is_empty())
        .or_else(|| document.get(ID_KEY).and_then(Value::as_str))
        .unwrap_or_default()
        .to_string()
}

/// Turns documents into reference options, skipping documents without an id.
pub fn reference_options(documents: &[Document]) -> Vec<ReferenceOption> {
    documents
        .iter()
        .filter_map(|doc| {
            let id = doc.get(ID_KEY)?.as_str()?;
            Some(ReferenceOption::new(id, document_label(doc)))
        })
        .collect()
}

/// Fills the options of every reference field of `form`.
///
/// Each field lists the documents of every resource it may point at, using
/// `options` for each query.
///
/// # Errors
///
/// Returns the first query error.
pub async fn load_reference_options(
    query: &dyn PageQuery,
    form: &mut ResourceForm,
    options: &PageQueryOptions,
) -> CrudResult<()> {
    let fields: Vec<(String, Vec<String>)> = form
        .reference_fields()
        .into_iter()
        .map(|(key, resources)| (key.to_string(), resources.to_vec()))
        .collect();
    for (key, resources) in fields {
        let mut found = Vec::new();
        for resource in &resources {
            let page = query.query(resource, options).await?;
            found.extend(reference_options(&page.documents));
        }
        form.set_reference_options(key, found);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn docs() -> Vec<Document> {
        [
            json!({"_id": "a", "name": "Ada", "age": 36, "team": "core"}),
            json!({"_id": "b", "name": "Grace", "age": 85, "team": "ops"}),
            json!({"_id": "c", "title": "Linus", "age": 54, "team": "core"}),
            json!({"_id": "d"}),
        ]
        .into_iter()
        .filter_map(|v| v.as_object().cloned())
        .collect()
    }

    fn ids(documents: &[Document]) -> Vec<&str> {
        documents
            .iter()
            .filter_map(|d| d.get("_id").and_then(Value::as_str))
            .collect()
    }

    #[test]
    fn test_filters() {
        let mut filters = BTreeMap::new();
        filters.insert("team".to_string(), json!("core"));
        assert_eq!(ids(&apply_filters(docs(), &filters)), ["a", "c"]);
    }

    #[test]
    fn test_null_filter_matches_missing() {
        let mut filters = BTreeMap::new();
        filters.insert("team".to_string(), Value::Null);
        assert_eq!(ids(&apply_filters(docs(), &filters)), ["d"]);
    }

    #[test]
    fn test_ordering() {
        assert_eq!(ids(&apply_ordering(docs(), Some("age"))), ["d", "a", "c", "b"]);
        assert_eq!(ids(&apply_ordering(docs(), Some("-age"))), ["b", "c", "a", "d"]);
        assert_eq!(ids(&apply_ordering(docs(), None)), ["a", "b", "c", "d"]);
    }

    #[test]
    fn test_paginate() {
        let page = paginate(docs(), 2, 3);
        assert_eq!(ids(&page.documents), ["d"]);
        assert_eq!(page.total, 4);
        assert!(!page.has_next);
        assert!(!page.loading);

        let first = paginate(docs(), 0, 3);
        assert_eq!(first.page, 1);
        assert!(first.has_next);

        let beyond = paginate(docs(), 9, 3);
        assert!(beyond.documents.is_empty());
    }

    #[test]
    fn test_paginate_zero_page_size() {
        assert_eq!(paginate(docs(), 1, 0).documents.len(), 4);
    }

    #[test]
    fn test_pending_page() {
        let page = PageResult::pending();
        assert!(page.loading);
        assert!(page.documents.is_empty());
    }

    #[test]
    fn test_labels() {
        let docs = docs();
        assert_eq!(document_label(&docs[0]), "Ada");
        assert_eq!(document_label(&docs[2]), "Linus");
        assert_eq!(document_label(&docs[3]), "d");
    }

    #[test]
    fn test_reference_options_skip_missing_ids() {
        let mut documents = docs();
        documents.push(json!({"name": "Orphan"}).as_object().cloned().unwrap());
        let options = reference_options(&documents);
        assert_eq!(options.len(), 4);
        assert_eq!(options[1].label, "Grace");
    }
}
