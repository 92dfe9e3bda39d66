//! # crudkit-forms
//!
//! Schema-driven forms and tables for crudkit. Given a collection of
//! [`FieldSpec`]s this crate selects an editor or display cell per field,
//! converts values between the wire shape a backend stores and the shape the
//! editors work with, validates submissions, and drives create/update
//! mutations through [`ResourceForm`].
//!
//! ## Modules
//!
//! - [`kind`] - The closed set of semantic field kinds
//! - [`spec`] - Field specifications
//! - [`format`] - Number, currency, phone, and date formatting helpers
//! - [`codec`] - Server ⇄ form value conversion
//! - [`editors`] / [`cells`] - Input editors and read-only display cells
//! - [`dispatch`] - Kind-to-component dispatch
//! - [`schema`] - Validation of wire-shaped records
//! - [`bound_field`] - A field paired with its value and errors for rendering
//! - [`backend`] - Traits for the spec provider, mutation executor, and document source
//! - [`form`] - The create/update form orchestrator
//! - [`table`] - Read-only document tables
//! - [`messages`] - One-time notifications (toasts)

pub mod backend;
pub mod bound_field;
pub mod cells;
pub mod codec;
pub mod dispatch;
pub mod editors;
pub mod error;
pub mod form;
pub mod format;
pub mod kind;
pub mod messages;
pub mod schema;
pub mod spec;
pub mod table;

pub use backend::{
    Document, DocumentSource, ErrorPayload, MutationError, MutationExecutor, Operation,
    ResourceSpecProvider,
};
pub use codec::{form_to_server, server_to_form, Bucket, ConverterOptions, ListItem, Record};
pub use dispatch::{cell_for, cell_for_type_name, editor_for, editor_for_type_name};
pub use error::{FormError, FormResult};
pub use form::{FormConfig, FormState, ResourceForm, SubmitOutcome};
pub use kind::FieldKind;
pub use schema::ValidationSchema;
pub use spec::FieldSpec;
pub use table::ResourceTable;
