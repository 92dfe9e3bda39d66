//! Read-only document tables.
//!
//! A [`ResourceTable`] picks one display cell per field spec and renders a
//! page of server-shaped documents as an HTML table.

use std::fmt;

use crudkit_core::utils::text::escape_html;
use serde_json::Value;

use crate::backend::{Document, ID_KEY};
use crate::cells::{Cell, CellProps};
use crate::dispatch::cell_for;
use crate::spec::FieldSpec;

/// Shown in place of rows when a page has no documents.
pub const EMPTY_MESSAGE: &str = "No documents.";

/// One column: a field key, its header, and the cell that renders it.
pub struct Column {
    pub key: String,
    pub label: String,
    cell: Box<dyn Cell>,
}

impl Column {
    pub fn cell(&self) -> &dyn Cell {
        self.cell.as_ref()
    }

    /// Renders this column's value from `document`.
    pub fn render(&self, document: &Document) -> String {
        self.cell
            .render(document.get(&self.key).unwrap_or(&Value::Null))
    }
}

impl fmt::Debug for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Column")
            .field("key", &self.key)
            .field("cell", &self.cell.kind())
            .finish()
    }
}

/// A table of documents of one resource.
#[derive(Debug)]
pub struct ResourceTable {
    resource: String,
    columns: Vec<Column>,
}

impl ResourceTable {
    /// Builds one column per spec, in spec order.
    pub fn new(resource: impl Into<String>, specs: &[FieldSpec], props: &CellProps) -> Self {
        let columns = specs
            .iter()
            .map(|spec| Column {
                key: spec.key.clone(),
                label: spec.display_label(),
                cell: cell_for(spec, props),
            })
            .collect();
        Self {
            resource: resource.into(),
            columns,
        }
    }

    pub fn resource(&self) -> &str {
        &self.resource
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Renders every column of one document.
    pub fn render_row(&self, document: &Document) -> Vec<String> {
        self.columns.iter().map(|c| c.render(document)).collect()
    }

    fn header_html(&self) -> String {
        let cells: String = self
            .columns
            .iter()
            .map(|c| {
                format!(
                    r#"<th scope="col" data-key="{}">{}</th>"#,
                    escape_html(&c.key),
                    escape_html(&c.label)
                )
            })
            .collect();
        format!("<thead><tr>{cells}</tr></thead>")
    }

    fn open_tag(&self, busy: bool) -> String {
        format!(
            r#"<table class="resource-table" data-resource="{}"{}>"#,
            escape_html(&self.resource),
            if busy { r#" aria-busy="true""# } else { "" }
        )
    }

    /// Renders a page of documents.
    ///
    /// Rows carry the document id in `data-id` when it has one.
    pub fn render_html(&self, documents: &[Document]) -> String {
        let mut html = self.open_tag(false);
        html.push_str(&self.header_html());
        html.push_str("<tbody>");
        if documents.is_empty() {
            html.push_str(&format!(
                r#"<tr class="empty"><td colspan="{}">{EMPTY_MESSAGE}</td></tr>"#,
                self.columns.len().max(1)
            ));
        }
        for document in documents {
            match document.get(ID_KEY).and_then(Value::as_str) {
                Some(id) => html.push_str(&format!(r#"<tr data-id="{}">"#, escape_html(id))),
                None => html.push_str("<tr>"),
            }
            for cell in self.render_row(document) {
                html.push_str(&format!("<td>{cell}</td>"));
            }
            html.push_str("</tr>");
        }
        html.push_str("</tbody></table>");
        html
    }

    /// Renders placeholder rows shown while a page is loading.
    pub fn render_loading(&self, rows: usize) -> String {
        let mut html = self.open_tag(true);
        html.push_str(&self.header_html());
        html.push_str("<tbody>");
        let row: String = self
            .columns
            .iter()
            .map(|_| r#"<td><span class="skeleton-cell"></span></td>"#)
            .collect();
        for _ in 0..rows {
            html.push_str(&format!(r#"<tr class="skeleton">{row}</tr>"#));
        }
        html.push_str("</tbody></table>");
        html
    }
}
