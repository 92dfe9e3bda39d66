//! Error types for the forms layer.

use crudkit_core::CrudError;
use thiserror::Error;

/// Result type for forms operations.
pub type FormResult<T> = Result<T, FormError>;

/// Errors raised while building or driving a form.
///
/// `UnsupportedFieldType` and `InvalidSpec` indicate a mismatch between a
/// resource specification and this library; they are not user-facing and
/// should be allowed to propagate.
#[derive(Debug, Error)]
pub enum FormError {
    /// A field declared a type outside the supported set.
    #[error("unsupported field type: {0}")]
    UnsupportedFieldType(String),

    /// A field specification is structurally invalid.
    #[error("invalid field spec for '{key}': {reason}")]
    InvalidSpec { key: String, reason: String },

    /// No resource with this name is known to the spec provider.
    #[error("unknown resource: {0}")]
    UnknownResource(String),

    /// The form has no field with this key.
    #[error("unknown field: {0}")]
    UnknownField(String),

    /// The operation is not allowed in the form's current state.
    #[error("cannot {action} while the form is {state}")]
    InvalidState { action: String, state: String },

    /// An error bubbled up from the core layer.
    #[error(transparent)]
    Core(#[from] CrudError),
}
