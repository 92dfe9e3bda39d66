//! # crudkit-admin
//!
//! The admin layer of crudkit: resource definitions, the registry that serves
//! them to forms, an in-memory document backend, page queries for tables and
//! reference editors, and local user preferences.
//!
//! ## Modules
//!
//! - [`resource`] - Per-resource field, requiredness, and listing configuration
//! - [`registry`] - The resource registry (a `ResourceSpecProvider`)
//! - [`store`] - In-memory document store implementing every backend seam
//! - [`page_query`] - Paginated queries and reference option loading
//! - [`preferences`] - Local key/value preferences (phone region, page sizes)
//! - [`site`] - The admin site tying the above together

pub mod page_query;
pub mod preferences;
pub mod registry;
pub mod resource;
pub mod site;
pub mod store;

pub use page_query::{PageQuery, PageQueryOptions, PageResult};
pub use preferences::{InMemoryPreferences, JsonFilePreferences, PreferenceStore};
pub use registry::ResourceRegistry;
pub use resource::ResourceSpec;
pub use site::AdminSite;
pub use store::InMemoryDocumentStore;
