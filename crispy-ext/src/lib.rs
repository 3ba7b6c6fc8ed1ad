//! # crispy-ext
//!
//! Nested forms and formsets for crispy-style form layouts.
//!
//! This is the meta-crate that re-exports the member crates. Depend on it to
//! get everything, or on individual crates for finer-grained control.
//!
//! ```
//! use crispy_ext::prelude::*;
//!
//! let phones = DeclaredFormset::new(
//!     "phones",
//!     FormsetFactory::new(|| Box::new(BaseForm::new(vec![FieldDef::char("number")]))),
//! );
//! let helper = FormHelper::new()
//!     .with_layout(Layout::new(vec![
//!         "name".into(),
//!         InlineFormSet::new("Phone numbers", "phones", vec![]).into_node(),
//!     ]))
//!     .with_formset(phones);
//! let mut form = BaseForm::new(vec![FieldDef::char("name")]).with_helper(helper);
//!
//! let formset = form.helper().unwrap().formsets[0]
//!     .construct(FormsetKwargs::default())
//!     .unwrap();
//! form.nested_mut().insert_formset("phones", formset);
//!
//! let engine = Engine::new().unwrap();
//! let html = crispy(&form, &engine).unwrap();
//! assert!(html.contains(r#"name="form-0-number""#));
//! ```

/// Errors, settings, and logging setup.
pub use crispy_ext_core as core;

/// The tera template engine and bundled templates.
pub use crispy_ext_template as template;

/// Forms, formsets, layouts, and formset containers.
pub use crispy_ext_forms as forms;

/// Layout objects and table helpers.
pub use crispy_ext_layout as layout;

/// The formset view mixin.
#[cfg(feature = "views")]
pub use crispy_ext_views as views;

pub use async_trait::async_trait;

/// The names most applications need.
pub mod prelude {
    pub use crispy_ext_core::{CrispyError, CrispyResult, CrispySettings};
    pub use crispy_ext_forms::{
        BaseForm, BaseModelForm, DeclaredFormset, FieldDef, FieldType, Files, Form, FormData,
        FormHelper, FormSet, FormsetContainer, FormsetFactory, FormsetKwargs, FormsetSaver,
        Instance, InstanceStore, Layout, LayoutNode, LayoutObject, ModelForm,
        ModelFormWithFormsets, RenderContext, UploadedFile, WidgetType,
    };
    pub use crispy_ext_layout::{
        crispy, crispy_column_count, crispy_table_header, flattener, ContainerOptions, Div,
        Fieldset, FormStyle, GenericContainer, InlineForm, InlineFormSet, InlineTabularForm,
    };
    pub use crispy_ext_template::Engine;
    #[cfg(feature = "views")]
    pub use crispy_ext_views::{FormOutcome, FormRequest, ModelFormFormsetMixin};
}
