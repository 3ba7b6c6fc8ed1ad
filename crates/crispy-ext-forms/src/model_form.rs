//! Model-backed forms and the formset-aware parent form.
//!
//! Model records are plain JSON objects ([`Instance`]); reading and writing
//! them goes through an [`InstanceStore`] the application provides.
//! [`ModelFormWithFormsets`] wraps any [`ModelForm`] and folds the nested
//! formsets declared on its helper into `is_multipart` and `is_valid`.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crispy_ext_core::{CrispyError, CrispyResult};

use crate::bound_field::BoundField;
use crate::container::FormsetContainer;
use crate::data::{Files, FormData};
use crate::fields::FieldDef;
use crate::form::{BaseForm, Form, NestedForms};
use crate::helper::FormHelper;

/// A model record.
pub type Instance = Value;

/// Persists model records.
#[async_trait]
pub trait InstanceStore: Send + Sync {
    /// Creates (`instance` is `None`) or updates a record from cleaned form
    /// data and returns the stored record.
    async fn save(&self, instance: Option<&Instance>, data: &Map<String, Value>) -> CrispyResult<Instance>;
}

/// A form bound to a model record.
#[async_trait]
pub trait ModelForm: Form {
    /// The record being edited, if any.
    fn instance(&self) -> Option<&Instance>;

    /// Saves the cleaned data and returns the stored record.
    async fn save(&mut self) -> CrispyResult<Instance>;
}

/// A [`ModelForm`] over a [`BaseForm`] and an [`InstanceStore`].
pub struct BaseModelForm {
    form: BaseForm,
    instance: Option<Instance>,
    store: Arc<dyn InstanceStore>,
}

impl fmt::Debug for BaseModelForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BaseModelForm")
            .field("form", &self.form)
            .field("instance", &self.instance)
            .finish_non_exhaustive()
    }
}

impl BaseModelForm {
    /// Creates a form for a new record.
    pub fn new(form: BaseForm, store: Arc<dyn InstanceStore>) -> Self {
        Self {
            form,
            instance: None,
            store,
        }
    }

    /// Edits an existing record. Its values for the form's fields become
    /// the initial data.
    #[must_use]
    pub fn with_instance(mut self, instance: Instance) -> Self {
        if let Value::Object(record) = &instance {
            let initial: Map<String, Value> = self
                .form
                .fields()
                .iter()
                .filter_map(|f| record.get(&f.name).map(|v| (f.name.clone(), v.clone())))
                .collect();
            self.form.set_initial(initial);
        }
        self.instance = Some(instance);
        self
    }
}

#[async_trait]
impl Form for BaseModelForm {
    fn form_name(&self) -> &str {
        self.form.form_name()
    }

    fn fields(&self) -> &[FieldDef] {
        self.form.fields()
    }

    fn add_field(&mut self, field: FieldDef) {
        self.form.add_field(field);
    }

    fn prefix(&self) -> Option<&str> {
        self.form.prefix()
    }

    fn set_prefix(&mut self, prefix: Option<String>) {
        self.form.set_prefix(prefix);
    }

    fn set_initial(&mut self, initial: Map<String, Value>) {
        self.form.set_initial(initial);
    }

    fn initial(&self) -> &Map<String, Value> {
        self.form.initial()
    }

    fn bind(&mut self, data: &FormData, files: &Files) {
        self.form.bind(data, files);
    }

    fn is_bound(&self) -> bool {
        self.form.is_bound()
    }

    fn raw_value(&self, name: &str) -> Option<&str> {
        self.form.raw_value(name)
    }

    async fn is_valid(&mut self) -> bool {
        self.form.is_valid().await
    }

    fn errors(&self) -> &HashMap<String, Vec<String>> {
        self.form.errors()
    }

    fn cleaned_data(&self) -> &Map<String, Value> {
        self.form.cleaned_data()
    }

    fn helper(&self) -> Option<&FormHelper> {
        self.form.helper()
    }

    fn nested(&self) -> &NestedForms {
        self.form.nested()
    }

    fn nested_mut(&mut self) -> &mut NestedForms {
        self.form.nested_mut()
    }
}

#[async_trait]
impl ModelForm for BaseModelForm {
    fn instance(&self) -> Option<&Instance> {
        self.instance.as_ref()
    }

    async fn save(&mut self) -> CrispyResult<Instance> {
        if !self.form.is_bound() || !self.form.errors().is_empty() {
            return Err(CrispyError::SaveError(format!(
                "{} could not be saved because the data didn't validate",
                self.form.form_name()
            )));
        }
        let saved = self
            .store
            .save(self.instance.as_ref(), self.form.cleaned_data())
            .await?;
        tracing::info!(form = self.form.form_name(), created = self.instance.is_none(), "Saved instance");
        self.instance = Some(saved.clone());
        Ok(saved)
    }
}

/// A parent form whose validity and encoding include the nested formsets
/// declared on its helper.
///
/// Every other method delegates to the wrapped form.
#[derive(Debug)]
pub struct ModelFormWithFormsets<F> {
    inner: F,
}

impl<F: ModelForm> ModelFormWithFormsets<F> {
    /// Wraps a model form.
    pub const fn new(inner: F) -> Self {
        Self { inner }
    }

    /// The wrapped form.
    pub const fn inner(&self) -> &F {
        &self.inner
    }

    /// Unwraps the form.
    pub fn into_inner(self) -> F {
        self.inner
    }

    fn containers(&self) -> Vec<Arc<dyn FormsetContainer>> {
        self.inner
            .helper()
            .map(|h| h.formsets.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl<F: ModelForm> Form for ModelFormWithFormsets<F> {
    fn form_name(&self) -> &str {
        self.inner.form_name()
    }

    fn fields(&self) -> &[FieldDef] {
        self.inner.fields()
    }

    fn field(&self, name: &str) -> Option<&FieldDef> {
        self.inner.field(name)
    }

    fn add_field(&mut self, field: FieldDef) {
        self.inner.add_field(field);
    }

    fn prefix(&self) -> Option<&str> {
        self.inner.prefix()
    }

    fn set_prefix(&mut self, prefix: Option<String>) {
        self.inner.set_prefix(prefix);
    }

    fn set_initial(&mut self, initial: Map<String, Value>) {
        self.inner.set_initial(initial);
    }

    fn initial(&self) -> &Map<String, Value> {
        self.inner.initial()
    }

    fn bind(&mut self, data: &FormData, files: &Files) {
        self.inner.bind(data, files);
    }

    fn is_bound(&self) -> bool {
        self.inner.is_bound()
    }

    fn raw_value(&self, name: &str) -> Option<&str> {
        self.inner.raw_value(name)
    }

    /// Validates every declared formset, then the base form.
    ///
    /// All formsets are validated even after one fails. A declared formset
    /// that was never attached counts as invalid.
    async fn is_valid(&mut self) -> bool {
        let mut valid = true;
        for container in self.containers() {
            match container.get_bound_mut(&mut self.inner) {
                Some(formset) => {
                    if !formset.is_valid().await {
                        valid = false;
                    }
                }
                None => {
                    tracing::warn!(
                        form = self.inner.form_name(),
                        container = container.name(),
                        "Declared formset is not attached"
                    );
                    valid = false;
                }
            }
        }
        self.inner.is_valid().await && valid
    }

    fn errors(&self) -> &HashMap<String, Vec<String>> {
        self.inner.errors()
    }

    fn non_field_errors(&self) -> &[String] {
        self.inner.non_field_errors()
    }

    fn cleaned_data(&self) -> &Map<String, Value> {
        self.inner.cleaned_data()
    }

    fn is_multipart(&self) -> bool {
        self.inner.is_multipart()
            || self
                .containers()
                .iter()
                .any(|c| c.is_multipart(&self.inner))
    }

    fn has_changed(&self) -> bool {
        self.inner.has_changed()
    }

    fn bound_field(&self, name: &str) -> Option<BoundField<'_>> {
        self.inner.bound_field(name)
    }

    fn helper(&self) -> Option<&FormHelper> {
        self.inner.helper()
    }

    fn nested(&self) -> &NestedForms {
        self.inner.nested()
    }

    fn nested_mut(&mut self) -> &mut NestedForms {
        self.inner.nested_mut()
    }

    async fn clean(&self) -> Result<(), HashMap<String, Vec<String>>> {
        self.inner.clean().await
    }
}

#[async_trait]
impl<F: ModelForm> ModelForm for ModelFormWithFormsets<F> {
    fn instance(&self) -> Option<&Instance> {
        self.inner.instance()
    }

    async fn save(&mut self) -> CrispyResult<Instance> {
        self.inner.save().await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use serde_json::json;

    use super::*;
    use crate::container::{DeclaredFormset, FormsetKwargs};
    use crate::fields::FieldType;
    use crate::formset::FormsetFactory;

    #[derive(Default)]
    struct MemoryStore {
        rows: Mutex<Vec<Instance>>,
    }

    #[async_trait]
    impl InstanceStore for MemoryStore {
        async fn save(
            &self,
            instance: Option<&Instance>,
            data: &Map<String, Value>,
        ) -> CrispyResult<Instance> {
            let mut rows = self.rows.lock().unwrap();
            let id = instance
                .and_then(|i| i.get("id"))
                .cloned()
                .unwrap_or_else(|| json!(rows.len() + 1));
            let mut record = data.clone();
            record.insert("id".into(), id);
            let record = Value::Object(record);
            rows.push(record.clone());
            Ok(record)
        }
    }

    fn phones() -> DeclaredFormset {
        let number = FieldDef::new(
            "number",
            FieldType::Integer {
                min_value: None,
                max_value: None,
            },
        );
        DeclaredFormset::new(
            "phones",
            FormsetFactory::new(move || Box::new(BaseForm::new(vec![number.clone()]))),
        )
        .with_prefix("phone")
    }

    fn emails() -> DeclaredFormset {
        DeclaredFormset::new(
            "emails",
            FormsetFactory::new(|| {
                Box::new(BaseForm::new(vec![FieldDef::new("address", FieldType::Email)]))
            }),
        )
        .with_prefix("email")
    }

    fn contact(helper: FormHelper) -> ModelFormWithFormsets<BaseModelForm> {
        let base = BaseForm::new(vec![FieldDef::char("name")])
            .with_name("ContactForm")
            .with_helper(helper);
        ModelFormWithFormsets::new(BaseModelForm::new(base, Arc::new(MemoryStore::default())))
    }

    fn attach(form: &mut ModelFormWithFormsets<BaseModelForm>, data: &FormData) {
        for container in form.helper().map(|h| h.formsets.clone()).unwrap_or_default() {
            let kwargs = FormsetKwargs {
                data: Some(data.clone()),
                prefix: container.prefix().map(str::to_string),
                ..FormsetKwargs::default()
            };
            let formset = container.construct(kwargs).unwrap();
            form.nested_mut().insert_formset(container.name(), formset);
        }
        form.bind(data, &Files::new());
    }

    fn payload(extra: &str) -> FormData {
        FormData::parse(&format!(
            "phone-TOTAL_FORMS=1&phone-INITIAL_FORMS=0&email-TOTAL_FORMS=1&email-INITIAL_FORMS=0&{extra}"
        ))
    }

    #[tokio::test]
    async fn test_without_containers_matches_base_form() {
        let mut form = contact(FormHelper::new());
        assert!(!form.is_multipart());
        form.bind(&FormData::parse("name=Ada"), &Files::new());
        assert!(form.is_valid().await);

        let mut form = contact(FormHelper::new());
        form.bind(&FormData::new(), &Files::new());
        assert!(!form.is_valid().await);
    }

    #[tokio::test]
    async fn test_valid_when_everything_is_valid() {
        let mut form = contact(FormHelper::new().with_formset(phones()).with_formset(emails()));
        attach(&mut form, &payload("name=Ada&phone-0-number=1&email-0-address=a%40b.co"));
        assert!(form.is_valid().await);
    }

    #[tokio::test]
    async fn test_every_formset_is_validated() {
        let mut form = contact(FormHelper::new().with_formset(phones()).with_formset(emails()));
        attach(&mut form, &payload("phone-0-number=abc&email-0-address=nope"));
        assert!(!form.is_valid().await);

        let phones = form.nested().formset("phones").unwrap();
        assert!(phones.forms()[0].errors().contains_key("number"));
        assert!(form.errors().contains_key("name"));
        let emails = form.nested().formset("emails").unwrap();
        assert!(emails.forms()[0].errors().contains_key("address"));
    }

    #[tokio::test]
    async fn test_invalid_formset_fails_valid_parent() {
        let mut form = contact(FormHelper::new().with_formset(emails()));
        attach(&mut form, &payload("name=Ada&email-0-address=nope"));
        assert!(!form.is_valid().await);
        assert!(form.errors().is_empty());
    }

    #[tokio::test]
    async fn test_unattached_formset_is_invalid() {
        let mut form = contact(FormHelper::new().with_formset(phones()));
        form.bind(&FormData::parse("name=Ada"), &Files::new());
        assert!(!form.is_valid().await);
    }

    #[test]
    fn test_is_multipart_from_container() {
        let photos = DeclaredFormset::new(
            "photos",
            FormsetFactory::new(|| Box::new(BaseForm::new(vec![FieldDef::new("image", FieldType::File)]))),
        );
        let form = contact(FormHelper::new().with_formset(phones()));
        assert!(!form.is_multipart());
        let form = contact(FormHelper::new().with_formset(phones()).with_formset(photos));
        assert!(form.is_multipart());
    }

    #[tokio::test]
    async fn test_save_creates_then_updates() {
        let mut form = contact(FormHelper::new());
        form.bind(&FormData::parse("name=Ada"), &Files::new());
        assert!(form.is_valid().await);
        let saved = form.save().await.unwrap();
        assert_eq!(saved, json!({"id": 1, "name": "Ada"}));
        assert_eq!(form.instance(), Some(&saved));

        let store = Arc::new(MemoryStore::default());
        let base = BaseForm::new(vec![FieldDef::char("name")]);
        let mut form = BaseModelForm::new(base, store).with_instance(json!({"id": 9, "name": "Old"}));
        assert_eq!(form.initial()["name"], json!("Old"));
        form.bind(&FormData::parse("name=New"), &Files::new());
        assert!(form.is_valid().await);
        assert_eq!(form.save().await.unwrap(), json!({"id": 9, "name": "New"}));
    }

    #[tokio::test]
    async fn test_save_refuses_invalid_data() {
        let mut form = contact(FormHelper::new());
        form.bind(&FormData::new(), &Files::new());
        assert!(!form.is_valid().await);
        assert!(matches!(form.save().await, Err(CrispyError::SaveError(_))));
    }
}
