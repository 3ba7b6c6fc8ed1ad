//! Formset containers: the binding between a name on a parent form and
//! the formset it holds.
//!
//! A [`FormHelper`](crate::helper::FormHelper) declares containers once per
//! form type. Each request, the view calls [`FormsetContainer::construct`]
//! with [`FormsetKwargs`] and attaches the result to the parent form's
//! [`NestedForms`](crate::form::NestedForms) under [`FormsetContainer::name`].

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crispy_ext_core::{CrispyError, CrispyResult};

use crate::data::{Files, FormData};
use crate::fields::FieldDef;
use crate::form::Form;
use crate::formset::{FormSet, FormsetFactory};
use crate::model_form::Instance;

/// Request-specific arguments for building a formset.
#[derive(Debug, Clone, Default)]
pub struct FormsetKwargs {
    /// Submitted form data; `None` builds an unbound formset.
    pub data: Option<FormData>,
    /// Uploaded files.
    pub files: Option<Files>,
    /// The parent record the child rows belong to.
    pub instance: Option<Instance>,
    /// HTML name prefix.
    pub prefix: Option<String>,
}

impl FormsetKwargs {
    /// Sets the submitted data.
    #[must_use]
    pub fn data(mut self, data: FormData) -> Self {
        self.data = Some(data);
        self
    }

    /// Sets the uploaded files.
    #[must_use]
    pub fn files(mut self, files: Files) -> Self {
        self.files = Some(files);
        self
    }

    /// Sets the parent instance.
    #[must_use]
    pub fn instance(mut self, instance: Instance) -> Self {
        self.instance = Some(instance);
        self
    }

    /// Sets the prefix.
    #[must_use]
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }
}

/// Stores a formset and knows how to persist it.
#[async_trait]
pub trait FormsetContainer: Send + Sync + fmt::Debug {
    /// Key of the nested formset on the parent form.
    fn name(&self) -> &str;

    /// The HTML prefix to build the formset with.
    fn prefix(&self) -> Option<&str>;

    /// Builds a new formset from request arguments.
    fn construct(&self, kwargs: FormsetKwargs) -> CrispyResult<FormSet>;

    /// Field definitions of the child form as declared, used when no
    /// formset is attached yet.
    fn declared_fields(&self) -> Vec<FieldDef>;

    /// Returns the formset attached to `form` under this container's name.
    fn get_bound<'a>(&self, form: &'a dyn Form) -> Option<&'a FormSet> {
        form.nested().formset(self.name())
    }

    /// Mutable variant of [`get_bound`](Self::get_bound).
    fn get_bound_mut<'a>(&self, form: &'a mut dyn Form) -> Option<&'a mut FormSet> {
        form.nested_mut().formset_mut(self.name())
    }

    /// Returns `true` if the child form has a field needing multipart
    /// encoding.
    ///
    /// Looks at the attached formset's first form (or its empty form when
    /// there are no rows). Falls back to the declared fields, so a form
    /// that has not been given its formset yet is fine.
    fn is_multipart(&self, form: &dyn Form) -> bool {
        match self.get_bound(form) {
            Some(formset) => formset
                .forms()
                .first()
                .map_or_else(|| formset.empty_form().is_multipart(), |f| f.is_multipart()),
            None => self
                .declared_fields()
                .iter()
                .any(|f| f.widget.needs_multipart_form()),
        }
    }

    /// Persists a bound formset against its parent instance.
    async fn save(&self, _formset: &FormSet, _instance: Option<&Instance>) -> CrispyResult<()> {
        Err(CrispyError::NotImplemented(format!(
            "formset container '{}' has no save policy",
            self.name()
        )))
    }
}

/// The save policy of a [`DeclaredFormset`].
#[async_trait]
pub trait FormsetSaver: Send + Sync {
    /// Persists the formset's rows for the given parent.
    async fn save(&self, formset: &FormSet, instance: Option<&Instance>) -> CrispyResult<()>;
}

/// A container declared from a [`FormsetFactory`] and an optional saver.
///
/// # Examples
///
/// ```
/// use crispy_ext_forms::container::{DeclaredFormset, FormsetContainer, FormsetKwargs};
/// use crispy_ext_forms::fields::FieldDef;
/// use crispy_ext_forms::form::BaseForm;
/// use crispy_ext_forms::formset::FormsetFactory;
///
/// let phones = DeclaredFormset::new(
///     "phones",
///     FormsetFactory::new(|| Box::new(BaseForm::new(vec![FieldDef::char("number")]))),
/// )
/// .with_prefix("phone");
/// assert_eq!(phones.name(), "phones");
/// assert_eq!(phones.prefix(), Some("phone"));
/// ```
#[derive(Clone)]
pub struct DeclaredFormset {
    name: String,
    prefix: Option<String>,
    factory: FormsetFactory,
    saver: Option<Arc<dyn FormsetSaver>>,
}

impl fmt::Debug for DeclaredFormset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeclaredFormset")
            .field("name", &self.name)
            .field("prefix", &self.prefix)
            .field("factory", &self.factory)
            .field("has_saver", &self.saver.is_some())
            .finish()
    }
}

impl DeclaredFormset {
    /// Declares a container.
    pub fn new(name: impl Into<String>, factory: FormsetFactory) -> Self {
        Self {
            name: name.into(),
            prefix: None,
            factory,
            saver: None,
        }
    }

    /// Sets the HTML prefix.
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Attaches a save policy.
    #[must_use]
    pub fn with_saver(mut self, saver: impl FormsetSaver + 'static) -> Self {
        self.saver = Some(Arc::new(saver));
        self
    }

    /// The factory formsets are built from.
    pub const fn factory(&self) -> &FormsetFactory {
        &self.factory
    }
}

#[async_trait]
impl FormsetContainer for DeclaredFormset {
    fn name(&self) -> &str {
        &self.name
    }

    fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    fn construct(&self, kwargs: FormsetKwargs) -> CrispyResult<FormSet> {
        tracing::debug!(container = %self.name, bound = kwargs.data.is_some(), "Constructing formset");
        self.factory.build(kwargs)
    }

    fn declared_fields(&self) -> Vec<FieldDef> {
        self.factory.declared_fields()
    }

    async fn save(&self, formset: &FormSet, instance: Option<&Instance>) -> CrispyResult<()> {
        match &self.saver {
            Some(saver) => {
                tracing::info!(
                    container = %self.name,
                    rows = formset.forms_to_save().len(),
                    deleted = formset.deleted_forms().len(),
                    "Saving formset"
                );
                saver.save(formset, instance).await
            }
            None => Err(CrispyError::NotImplemented(format!(
                "formset container '{}' has no save policy",
                self.name
            ))),
        }
    }
}
