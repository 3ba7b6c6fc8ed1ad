//! # crispy-ext-template
//!
//! The template engine used by crispy-ext layout objects.
//!
//! [`Engine`] wraps a [`tera::Tera`] instance pre-loaded with the bundled
//! `crispy_extensions/*` templates and the default template pack. Templates
//! found in configured directories take precedence over the bundled ones, so
//! projects can override any of them by name.

pub mod engine;
pub mod filters;

pub use engine::{Engine, BUNDLED_TEMPLATES};
