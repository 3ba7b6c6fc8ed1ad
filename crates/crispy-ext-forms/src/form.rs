//! The [`Form`] trait, [`BaseForm`], and the nested-form registry.
//!
//! A parent form may carry nested forms and formsets under declared names
//! ([`NestedForms`]). Views attach them while building the form; layout
//! objects and formset containers look them up by key at render and
//! validation time.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::bound_field::{add_prefix, BoundField};
use crate::data::{Files, FormData};
use crate::fields::{clean_field_value, FieldDef};
use crate::formset::FormSet;
use crate::helper::FormHelper;

/// Key under which form-level (non-field) errors are stored.
pub const NON_FIELD_ERRORS: &str = "__all__";

/// The core form trait.
///
/// Validation is async so implementations may hit storage (uniqueness
/// checks and the like) while cleaning.
#[async_trait]
pub trait Form: Send + Sync {
    /// A short name used in diagnostics.
    fn form_name(&self) -> &str {
        "form"
    }

    /// Returns the form's field definitions in declaration order.
    fn fields(&self) -> &[FieldDef];

    /// Looks up a field definition by name.
    fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields().iter().find(|f| f.name == name)
    }

    /// Appends a field (used by formsets for the delete/order controls).
    fn add_field(&mut self, field: FieldDef);

    /// Returns the form prefix.
    fn prefix(&self) -> Option<&str>;

    /// Sets the form prefix.
    fn set_prefix(&mut self, prefix: Option<String>);

    /// Replaces the initial values.
    fn set_initial(&mut self, initial: Map<String, Value>);

    /// Returns the initial values.
    fn initial(&self) -> &Map<String, Value>;

    /// Binds submitted data and files.
    fn bind(&mut self, data: &FormData, files: &Files);

    /// Returns `true` if the form has been bound.
    fn is_bound(&self) -> bool;

    /// Returns the raw submitted value of a field (unprefixed name).
    fn raw_value(&self, name: &str) -> Option<&str>;

    /// Validates the form. Populates `errors()` and `cleaned_data()`.
    async fn is_valid(&mut self) -> bool;

    /// Per-field validation errors.
    fn errors(&self) -> &HashMap<String, Vec<String>>;

    /// Form-level errors.
    fn non_field_errors(&self) -> &[String] {
        self.errors()
            .get(NON_FIELD_ERRORS)
            .map_or(&[], Vec::as_slice)
    }

    /// Cleaned data, populated by a successful `is_valid()`.
    fn cleaned_data(&self) -> &Map<String, Value>;

    /// Returns `true` if a multipart-encoded submission is required.
    fn is_multipart(&self) -> bool {
        self.fields().iter().any(|f| f.widget.needs_multipart_form())
    }

    /// Returns `true` if any submitted value differs from the initial one.
    fn has_changed(&self) -> bool {
        self.is_bound()
            && self.fields().iter().any(|f| {
                let submitted = self.raw_value(&f.name).unwrap_or("");
                let initial = self
                    .initial()
                    .get(&f.name)
                    .or(f.initial.as_ref())
                    .map(value_to_string)
                    .unwrap_or_default();
                submitted != initial
            })
    }

    /// Returns the bound field for a name, if the form declares it.
    fn bound_field(&self, name: &str) -> Option<BoundField<'_>> {
        let field = self.field(name)?;
        let value = if self.is_bound() {
            self.raw_value(name).map(str::to_string)
        } else {
            self.initial()
                .get(name)
                .or(field.initial.as_ref())
                .map(value_to_string)
        };
        let errors = self.errors().get(name).cloned().unwrap_or_default();
        Some(BoundField::new(field, self.prefix(), value, errors))
    }

    /// The crispy helper carrying layout and formset declarations.
    fn helper(&self) -> Option<&FormHelper> {
        None
    }

    /// Nested forms and formsets attached to this form.
    fn nested(&self) -> &NestedForms;

    /// Mutable access to the nested registry.
    fn nested_mut(&mut self) -> &mut NestedForms;

    /// Cross-field validation hook.
    async fn clean(&self) -> Result<(), HashMap<String, Vec<String>>> {
        Ok(())
    }
}

/// Renders a JSON value the way a widget would show it.
pub fn value_to_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// One nested entry on a parent form.
pub enum Nested {
    /// A single inline form.
    Form(Box<dyn Form>),
    /// A formset.
    FormSet(FormSet),
}

/// Nested forms and formsets keyed by their declared name.
#[derive(Default)]
pub struct NestedForms {
    entries: HashMap<String, Nested>,
}

impl std::fmt::Debug for NestedForms {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&String> = self.entries.keys().collect();
        names.sort();
        f.debug_struct("NestedForms").field("names", &names).finish()
    }
}

impl NestedForms {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches a formset under a name, replacing any previous entry.
    pub fn insert_formset(&mut self, name: impl Into<String>, formset: FormSet) {
        self.entries.insert(name.into(), Nested::FormSet(formset));
    }

    /// Attaches a single form under a name, replacing any previous entry.
    pub fn insert_form(&mut self, name: impl Into<String>, form: Box<dyn Form>) {
        self.entries.insert(name.into(), Nested::Form(form));
    }

    /// Looks up any nested entry.
    pub fn get(&self, name: &str) -> Option<&Nested> {
        self.entries.get(name)
    }

    /// Looks up a nested formset.
    pub fn formset(&self, name: &str) -> Option<&FormSet> {
        match self.entries.get(name) {
            Some(Nested::FormSet(formset)) => Some(formset),
            _ => None,
        }
    }

    /// Looks up a nested formset mutably.
    pub fn formset_mut(&mut self, name: &str) -> Option<&mut FormSet> {
        match self.entries.get_mut(name) {
            Some(Nested::FormSet(formset)) => Some(formset),
            _ => None,
        }
    }

    /// Looks up a nested single form.
    pub fn form(&self, name: &str) -> Option<&dyn Form> {
        match self.entries.get(name) {
            Some(Nested::Form(form)) => Some(form.as_ref()),
            _ => None,
        }
    }

    /// Looks up a nested single form mutably.
    pub fn form_mut(&mut self, name: &str) -> Option<&mut Box<dyn Form>> {
        match self.entries.get_mut(name) {
            Some(Nested::Form(form)) => Some(form),
            _ => None,
        }
    }

    /// Returns `true` if an entry with this name is attached.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Number of attached entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is attached.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A general-purpose form built from a list of field definitions.
pub struct BaseForm {
    name: String,
    field_defs: Vec<FieldDef>,
    initial: Map<String, Value>,
    prefix: Option<String>,
    bound: bool,
    raw_data: HashMap<String, String>,
    files: Files,
    errors: HashMap<String, Vec<String>>,
    cleaned_data: Map<String, Value>,
    helper: Option<Arc<FormHelper>>,
    nested: NestedForms,
}

impl std::fmt::Debug for BaseForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BaseForm")
            .field("name", &self.name)
            .field("fields", &self.field_defs.len())
            .field("prefix", &self.prefix)
            .field("bound", &self.bound)
            .field("nested", &self.nested)
            .finish_non_exhaustive()
    }
}

impl BaseForm {
    /// Creates a form with the given field definitions.
    pub fn new(fields: Vec<FieldDef>) -> Self {
        Self {
            name: "form".to_string(),
            field_defs: fields,
            initial: Map::new(),
            prefix: None,
            bound: false,
            raw_data: HashMap::new(),
            files: Files::new(),
            errors: HashMap::new(),
            cleaned_data: Map::new(),
            helper: None,
            nested: NestedForms::new(),
        }
    }

    /// Sets the diagnostic name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets initial values.
    #[must_use]
    pub fn with_initial(mut self, initial: Map<String, Value>) -> Self {
        self.initial = initial;
        self
    }

    /// Sets the prefix.
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Attaches a crispy helper. Helpers are shared between instances of
    /// the same form, hence the `Arc`.
    #[must_use]
    pub fn with_helper(mut self, helper: impl Into<Arc<FormHelper>>) -> Self {
        self.helper = Some(helper.into());
        self
    }

    /// Returns the uploaded file bound to a field (unprefixed name).
    pub fn file(&self, name: &str) -> Option<&crate::data::UploadedFile> {
        self.files.get(name)
    }
}

#[async_trait]
impl Form for BaseForm {
    fn form_name(&self) -> &str {
        &self.name
    }

    fn fields(&self) -> &[FieldDef] {
        &self.field_defs
    }

    fn add_field(&mut self, field: FieldDef) {
        self.field_defs.retain(|f| f.name != field.name);
        self.field_defs.push(field);
    }

    fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    fn set_prefix(&mut self, prefix: Option<String>) {
        self.prefix = prefix;
    }

    fn set_initial(&mut self, initial: Map<String, Value>) {
        self.initial = initial;
    }

    fn initial(&self) -> &Map<String, Value> {
        &self.initial
    }

    fn bind(&mut self, data: &FormData, files: &Files) {
        self.bound = true;
        self.raw_data.clear();
        self.files.clear();
        self.errors.clear();
        self.cleaned_data.clear();

        for field in &self.field_defs {
            let html_name = add_prefix(self.prefix.as_deref(), &field.name);
            if let Some(value) = data.get(&html_name) {
                self.raw_data.insert(field.name.clone(), value.to_string());
            }
            if let Some(file) = files.get(&html_name) {
                self.files.insert(field.name.clone(), file.clone());
            }
        }
    }

    fn is_bound(&self) -> bool {
        self.bound
    }

    fn raw_value(&self, name: &str) -> Option<&str> {
        self.raw_data.get(name).map(String::as_str)
    }

    async fn is_valid(&mut self) -> bool {
        if !self.bound {
            return false;
        }

        self.errors.clear();
        self.cleaned_data.clear();

        for field in &self.field_defs {
            let raw = self.raw_data.get(&field.name).map(String::as_str);
            match clean_field_value(field, raw, self.files.get(&field.name)) {
                Ok(value) => {
                    self.cleaned_data.insert(field.name.clone(), value);
                }
                Err(messages) => {
                    self.errors.insert(field.name.clone(), messages);
                }
            }
        }

        if let Err(form_errors) = self.clean().await {
            for (key, messages) in form_errors {
                self.errors.entry(key).or_default().extend(messages);
            }
        }

        self.errors.is_empty()
    }

    fn errors(&self) -> &HashMap<String, Vec<String>> {
        &self.errors
    }

    fn cleaned_data(&self) -> &Map<String, Value> {
        &self.cleaned_data
    }

    fn helper(&self) -> Option<&FormHelper> {
        self.helper.as_deref()
    }

    fn nested(&self) -> &NestedForms {
        &self.nested
    }

    fn nested_mut(&mut self) -> &mut NestedForms {
        &mut self.nested
    }
}
