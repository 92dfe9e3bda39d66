//! # crudkit
//!
//! Schema-driven admin forms and tables for document backends.
//!
//! This is the meta-crate that re-exports the sub-crates. Depend on `crudkit`
//! to get everything, or on the individual crates for finer-grained control.
//!
//! ```
//! use crudkit::admin::{AdminSite, InMemoryDocumentStore, ResourceRegistry, ResourceSpec};
//! use crudkit::core::Settings;
//! use crudkit::forms::{FieldKind, FieldSpec};
//!
//! let registry = ResourceRegistry::new().with(
//!     ResourceSpec::new("people")
//!         .field(FieldSpec::new("name", FieldKind::ShortText))
//!         .required_on_create(["name"]),
//! );
//! let site = AdminSite::new(registry, InMemoryDocumentStore::new(), Settings::default());
//! assert!(site.registry().is_registered("people"));
//! ```

/// Errors, settings, logging, and text helpers.
pub use crudkit_core as core;

/// Field specs, editors, cells, value codecs, and the form orchestrator.
#[cfg(feature = "forms")]
pub use crudkit_forms as forms;

/// Resource registry, in-memory store, page queries, and preferences.
#[cfg(feature = "admin")]
pub use crudkit_admin as admin;

// Third-party crates used in crudkit's public API.
pub use async_trait::async_trait;
pub use serde;
pub use serde_json;
pub use tracing;

/// The types most pages need.
pub mod prelude {
    pub use crudkit_core::{CrudError, CrudResult, Settings};

    #[cfg(feature = "forms")]
    pub use crudkit_forms::{
        Document, FieldKind, FieldSpec, FormError, FormResult, FormState, Operation,
        ResourceForm, SubmitOutcome,
    };

    #[cfg(feature = "admin")]
    pub use crudkit_admin::{AdminSite, InMemoryDocumentStore, ResourceRegistry, ResourceSpec};
}
