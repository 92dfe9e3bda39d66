//! Logging integration for crudkit.
//!
//! Provides helpers for configuring [`tracing`]-based logging from
//! [`Settings`](crate::settings::Settings) and for creating per-form spans.

use crate::settings::Settings;

/// Sets up the global tracing subscriber based on the given settings.
///
/// The filter is read from `settings.log_level` (e.g. "debug",
/// "crudkit_forms=trace"). In debug mode a pretty, human-readable format is
/// used; otherwise a structured JSON format is used. Installing a second
/// subscriber is a no-op.
pub fn setup_logging(settings: &Settings) {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_new(&settings.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    if settings.debug {
        fmt::Subscriber::builder()
            .with_env_filter(filter)
            .with_target(true)
            .with_thread_ids(false)
            .with_file(true)
            .with_line_number(true)
            .pretty()
            .try_init()
            .ok();
    } else {
        fmt::Subscriber::builder()
            .with_env_filter(filter)
            .with_target(true)
            .json()
            .try_init()
            .ok();
    }
}

/// Creates a tracing span for one mounted form.
///
/// Enter this span around form loading and submission so that every event
/// emitted on behalf of the form carries the resource and operation.
///
/// # Examples
///
/// ```
/// use crudkit_core::logging::form_span;
///
/// let span = form_span("users", "create");
/// let _guard = span.enter();
/// tracing::info!("submitting");
/// ```
pub fn form_span(resource: &str, operation: &str) -> tracing::Span {
    tracing::info_span!("form", resource = resource, operation = operation)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_setup_logging_twice_is_harmless() {
        let settings = Settings {
            debug: false,
            ..Settings::default()
        };
        setup_logging(&settings);
        setup_logging(&settings);
    }

    #[test]
    fn test_form_span_enter() {
        let span = form_span("users", "update");
        let _guard = span.enter();
        tracing::debug!("inside form span");
    }
}
