//! # crispy-ext-views
//!
//! View-level support for forms with nested formsets.
//!
//! - [`mixin`] - [`ModelFormFormsetMixin`] and [`FormOutcome`]
//! - [`request`] - [`FormRequest`] and redirect responses
//! - [`multipart`] - `multipart/form-data` body parsing

pub mod mixin;
pub mod multipart;
pub mod request;

pub use mixin::{FormOutcome, ModelFormFormsetMixin};
pub use request::{redirect, FormRequest, Response};
