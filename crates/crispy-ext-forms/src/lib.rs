//! Forms, formsets, and formset containers for crispy-ext.
//!
//! This crate holds the form model the layout objects render:
//!
//! - [`data`] - submitted form data and uploaded files
//! - [`widgets`] / [`fields`] / [`bound_field`] - field definitions and HTML widgets
//! - [`form`] - the [`Form`](form::Form) trait, [`BaseForm`](form::BaseForm), nested form registry
//! - [`formset`] - [`FormSet`](formset::FormSet) and [`FormsetFactory`](formset::FormsetFactory)
//! - [`container`] - [`FormsetContainer`](container::FormsetContainer) declarations
//! - [`layout`] / [`helper`] / [`render`] - the layout tree and field rendering
//! - [`model_form`] - model forms and [`ModelFormWithFormsets`](model_form::ModelFormWithFormsets)

pub mod bound_field;
pub mod container;
pub mod data;
pub mod fields;
pub mod form;
pub mod formset;
pub mod helper;
pub mod layout;
pub mod model_form;
pub mod render;
pub mod widgets;

pub use container::{DeclaredFormset, FormsetContainer, FormsetKwargs, FormsetSaver};
pub use data::{Files, FormData, UploadedFile};
pub use fields::{FieldDef, FieldType};
pub use form::{BaseForm, Form, Nested, NestedForms};
pub use formset::{FormSet, FormsetFactory};
pub use helper::FormHelper;
pub use layout::{Layout, LayoutNode, LayoutObject, RenderContext};
pub use model_form::{BaseModelForm, Instance, InstanceStore, ModelForm, ModelFormWithFormsets};
pub use widgets::WidgetType;
