//! # crudkit-core
//!
//! Core types, settings, and error types for crudkit.
//! This crate has no dependency on the forms or admin layers and provides the
//! foundation for both.
//!
//! ## Modules
//!
//! - [`error`] - Error types and result aliases
//! - [`utils`] - Text helpers (labels, HTML escaping)
//! - [`settings`] - Library settings and global configuration
//! - [`settings_loader`] - Loading settings from TOML, JSON, and the environment
//! - [`logging`] - Tracing-based logging integration

pub mod error;
pub mod logging;
pub mod settings;
pub mod settings_loader;
pub mod utils;

// Re-export the most commonly used types at the crate root.
pub use error::{CrudError, CrudResult, ValidationError};
pub use settings::Settings;
