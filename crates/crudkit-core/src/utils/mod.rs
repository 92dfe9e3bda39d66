//! Utility functions for crudkit.
//!
//! - [`text`]: String helpers (labels from keys, HTML escaping, capfirst).

pub mod text;
