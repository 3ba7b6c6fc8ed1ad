//! Error types for crispy-ext.
//!
//! [`CrispyError`] covers configuration mistakes made while declaring a
//! layout, missing nested forms, malformed requests, template failures, and
//! persistence errors reported while saving nested formsets. None of these
//! are recovered inside the library; they propagate to whoever wired the
//! form or the view.

use thiserror::Error;

/// The error type for all crispy-ext operations.
#[derive(Error, Debug)]
pub enum CrispyError {
    // ── Configuration ────────────────────────────────────────────────

    /// A layout object was declared with missing or invalid options.
    #[error("Improperly configured: {0}")]
    ImproperlyConfigured(String),

    /// Settings could not be loaded or parsed.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    // ── Forms ────────────────────────────────────────────────────────

    /// A formset container has no save policy attached.
    #[error("Not implemented: {0}")]
    NotImplemented(String),

    /// A layout references a field the form does not declare.
    #[error("Could not resolve form field '{field}' on form '{form}'")]
    UnknownField {
        /// The field name referenced by the layout.
        field: String,
        /// A description of the form that was searched.
        form: String,
    },

    /// A nested form or formset was referenced but never attached.
    #[error("No nested form or formset named '{0}' is attached to the form")]
    MissingNested(String),

    // ── Requests ─────────────────────────────────────────────────────

    /// A request body or request-derived value could not be used.
    #[error("Bad request: {0}")]
    BadRequest(String),

    // ── Templates ────────────────────────────────────────────────────

    /// A template failed to parse or render.
    #[error("Template error: {0}")]
    TemplateError(String),

    // ── Persistence ──────────────────────────────────────────────────

    /// Saving a parent instance or a nested formset failed.
    #[error("Save failed: {0}")]
    SaveError(String),

    // ── IO ───────────────────────────────────────────────────────────

    /// An I/O error occurred.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<tera::Error> for CrispyError {
    fn from(err: tera::Error) -> Self {
        // tera keeps the useful detail in the source chain
        let mut message = err.to_string();
        let mut source = std::error::Error::source(&err);
        while let Some(inner) = source {
            message.push_str(": ");
            message.push_str(&inner.to_string());
            source = inner.source();
        }
        Self::TemplateError(message)
    }
}

/// A convenience type alias for `Result<T, CrispyError>`.
pub type CrispyResult<T> = Result<T, CrispyError>;
