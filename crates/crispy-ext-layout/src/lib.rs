//! # crispy-ext-layout
//!
//! Layout objects for rendering nested forms and formsets inside a parent
//! form's layout.
//!
//! ## Modules
//!
//! - [`basic`] - [`Div`] and [`Fieldset`]
//! - [`inline`] - [`InlineFormSet`] and [`InlineForm`]
//! - [`generic`] - [`GenericContainer`] and [`InlineTabularForm`]
//! - [`templatetags`] - column discovery and table headers for tabular formsets
//! - [`render`] - whole-form rendering

pub mod basic;
pub mod generic;
pub mod inline;
pub mod render;
pub mod templatetags;

pub use basic::{Div, Fieldset};
pub use generic::{ContainerOptions, GenericContainer, InlineTabularForm};
pub use inline::{FormStyle, InlineForm, InlineFormSet};
pub use render::{crispy, render_form};
pub use templatetags::{crispy_column_count, crispy_table_header, flattener, formset_context};
