//! Formsets: collections of identical child forms on one page.
//!
//! A [`FormSet`] owns its child forms, an unbound "empty" template form,
//! and the management data (`TOTAL_FORMS`, `INITIAL_FORMS`, ...) that lets
//! a submission say how many rows it carries. [`FormsetFactory`] is the
//! reusable description a formset container builds formsets from.

use std::fmt;
use std::sync::Arc;

use serde_json::{json, Map, Value};

use crispy_ext_core::CrispyResult;

use crate::data::{Files, FormData};
use crate::fields::{FieldDef, FieldType};
use crate::form::Form;
use crate::model_form::Instance;
use crate::widgets::{is_checked, WidgetType};

/// Name of the per-form deletion checkbox.
pub const DELETION_FIELD_NAME: &str = "DELETE";
/// Name of the per-form ordering input.
pub const ORDERING_FIELD_NAME: &str = "ORDER";

/// Prefix used when none is given.
pub const DEFAULT_PREFIX: &str = "form";

/// Default `max_num`, and the headroom above `max_num` that a submission
/// may claim before the row count is capped.
pub const DEFAULT_MAX_NUM: usize = 1000;

const TOTAL_FORMS: &str = "TOTAL_FORMS";
const INITIAL_FORMS: &str = "INITIAL_FORMS";
const MIN_NUM_FORMS: &str = "MIN_NUM_FORMS";
const MAX_NUM_FORMS: &str = "MAX_NUM_FORMS";

/// Returns `true` for the control fields a formset adds to each form.
pub fn is_control_field(name: &str) -> bool {
    name == DELETION_FIELD_NAME || name == ORDERING_FIELD_NAME
}

/// A collection of child forms managed together.
pub struct FormSet {
    forms: Vec<Box<dyn Form>>,
    empty_form: Box<dyn Form>,
    prefix: String,
    initial_count: usize,
    min_num: usize,
    max_num: usize,
    absolute_max: usize,
    submitted_total: usize,
    can_delete: bool,
    can_order: bool,
    is_bound: bool,
    management_error: Option<String>,
    non_form_errors: Vec<String>,
}

impl fmt::Debug for FormSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormSet")
            .field("prefix", &self.prefix)
            .field("forms", &self.forms.len())
            .field("initial_count", &self.initial_count)
            .field("can_delete", &self.can_delete)
            .field("can_order", &self.can_order)
            .field("is_bound", &self.is_bound)
            .finish_non_exhaustive()
    }
}

impl FormSet {
    /// Creates an unbound formset from ready-made forms.
    ///
    /// Most callers go through [`FormsetFactory::build`] instead, which also
    /// handles prefixes, control fields, and binding.
    pub fn new(forms: Vec<Box<dyn Form>>, empty_form: Box<dyn Form>) -> Self {
        Self {
            forms,
            empty_form,
            prefix: DEFAULT_PREFIX.to_string(),
            initial_count: 0,
            min_num: 0,
            max_num: DEFAULT_MAX_NUM,
            absolute_max: 2 * DEFAULT_MAX_NUM,
            submitted_total: 0,
            can_delete: false,
            can_order: false,
            is_bound: false,
            management_error: None,
            non_form_errors: Vec::new(),
        }
    }

    /// The child forms.
    pub fn forms(&self) -> &[Box<dyn Form>] {
        &self.forms
    }

    /// The child forms, mutably.
    pub fn forms_mut(&mut self) -> &mut [Box<dyn Form>] {
        &mut self.forms
    }

    /// An unbound form with the `__prefix__` placeholder, used as a
    /// client-side template and for column discovery.
    pub fn empty_form(&self) -> &dyn Form {
        self.empty_form.as_ref()
    }

    /// The HTML name prefix.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Whether forms carry a deletion checkbox.
    pub const fn can_delete(&self) -> bool {
        self.can_delete
    }

    /// Whether forms carry an ordering input.
    pub const fn can_order(&self) -> bool {
        self.can_order
    }

    /// Returns `true` once bound to submitted data.
    pub const fn is_bound(&self) -> bool {
        self.is_bound
    }

    /// Total number of forms.
    pub fn total_form_count(&self) -> usize {
        self.forms.len()
    }

    /// Number of forms backed by existing records.
    pub const fn initial_form_count(&self) -> usize {
        self.initial_count
    }

    /// Formset-level errors.
    pub fn non_form_errors(&self) -> &[String] {
        &self.non_form_errors
    }

    /// Per-form errors, one map per child form.
    pub fn errors(&self) -> Vec<&std::collections::HashMap<String, Vec<String>>> {
        self.forms.iter().map(|f| f.errors()).collect()
    }

    /// Returns `true` if the form is marked for deletion.
    pub fn is_deleted(&self, form: &dyn Form) -> bool {
        self.can_delete && is_checked(form.raw_value(DELETION_FIELD_NAME))
    }

    /// Forms marked for deletion.
    pub fn deleted_forms(&self) -> Vec<&dyn Form> {
        self.forms
            .iter()
            .map(|f| &**f)
            .filter(|f| self.is_deleted(*f))
            .collect()
    }

    /// Forms whose data should be persisted: initial forms and changed
    /// extra forms, minus deletions.
    pub fn forms_to_save(&self) -> Vec<&dyn Form> {
        self.forms
            .iter()
            .enumerate()
            .filter(|(i, f)| !self.is_deleted(&***f) && !self.is_untouched_extra(*i, &***f))
            .map(|(_, f)| &**f)
            .collect()
    }

    /// [`forms_to_save`](Self::forms_to_save) sorted by their `ORDER`
    /// value; forms without one go last, keeping their relative order.
    pub fn ordered_forms(&self) -> Vec<&dyn Form> {
        let mut forms = self.forms_to_save();
        if self.can_order {
            forms.sort_by_key(|f| form_order(*f).map_or((1, 0), |n| (0, n)));
        }
        forms
    }

    /// Extra (non-initial) forms nobody filled in are ignored entirely.
    fn is_untouched_extra(&self, index: usize, form: &dyn Form) -> bool {
        index >= self.initial_count
            && !form.fields().iter().any(|f| {
                !is_control_field(&f.name)
                    && form.raw_value(&f.name).is_some_and(|v| !v.trim().is_empty())
            })
    }

    /// Binds submitted data to every child form.
    pub fn bind(&mut self, data: &FormData, files: &Files) {
        self.is_bound = true;
        for form in &mut self.forms {
            form.bind(data, files);
        }
    }

    /// Validates every child form and the formset-level constraints.
    ///
    /// Every form is validated even after a failure so all error states are
    /// available for display. Deleted forms and untouched extra forms are
    /// not validated.
    pub async fn is_valid(&mut self) -> bool {
        if !self.is_bound {
            return false;
        }

        self.non_form_errors.clear();
        let mut all_valid = true;
        if let Some(error) = &self.management_error {
            self.non_form_errors.push(error.clone());
            all_valid = false;
        }

        let mut skip = Vec::with_capacity(self.forms.len());
        for (i, form) in self.forms.iter().enumerate() {
            skip.push(self.is_deleted(&**form) || self.is_untouched_extra(i, &**form));
        }

        let mut filled = 0;
        for (form, skip) in self.forms.iter_mut().zip(skip) {
            if skip {
                continue;
            }
            filled += 1;
            if !form.is_valid().await {
                all_valid = false;
            }
        }

        if filled < self.min_num {
            self.non_form_errors
                .push(format!("Please submit at least {} forms.", self.min_num));
            all_valid = false;
        }
        if filled > self.max_num || self.submitted_total > self.absolute_max {
            self.non_form_errors
                .push(format!("Please submit at most {} forms.", self.max_num));
            all_valid = false;
        }

        all_valid
    }

    /// Management data rendered as hidden inputs.
    pub fn management_form_data(&self) -> Vec<(String, String)> {
        vec![
            (self.management_key(TOTAL_FORMS), self.total_form_count().to_string()),
            (self.management_key(INITIAL_FORMS), self.initial_count.to_string()),
            (self.management_key(MIN_NUM_FORMS), self.min_num.to_string()),
            (self.management_key(MAX_NUM_FORMS), self.max_num.to_string()),
        ]
    }

    /// Renders the management data as hidden inputs.
    pub fn management_form_html(&self) -> String {
        self.management_form_data()
            .into_iter()
            .map(|(name, value)| {
                WidgetType::HiddenInput.render(
                    &name,
                    Some(&value),
                    &[("id".to_string(), format!("id_{name}"))].into_iter().collect(),
                )
            })
            .collect()
    }

    fn management_key(&self, key: &str) -> String {
        format!("{}-{key}", self.prefix)
    }

    /// Template context with the formset's own state. Rendered child forms
    /// are added by the layout crate.
    pub fn as_context(&self) -> Value {
        json!({
            "prefix": self.prefix,
            "management_form": self.management_form_html(),
            "non_form_errors": self.non_form_errors,
            "total_form_count": self.total_form_count(),
            "initial_form_count": self.initial_count,
            "can_delete": self.can_delete,
            "can_order": self.can_order,
            "is_bound": self.is_bound,
        })
    }
}

type FormBuilder = dyn Fn() -> Box<dyn Form> + Send + Sync;
type InitialLoader = dyn Fn(Option<&Instance>) -> Vec<Map<String, Value>> + Send + Sync;

/// Describes how to build a formset: which form, how many extra rows, and
/// whether rows can be deleted or reordered.
///
/// # Examples
///
/// ```
/// use crispy_ext_forms::fields::FieldDef;
/// use crispy_ext_forms::form::BaseForm;
/// use crispy_ext_forms::formset::FormsetFactory;
/// use crispy_ext_forms::container::FormsetKwargs;
///
/// let factory = FormsetFactory::new(|| Box::new(BaseForm::new(vec![FieldDef::char("number")])))
///     .extra(2)
///     .can_delete(true);
/// let formset = factory.build(FormsetKwargs::default().prefix("phones")).unwrap();
/// assert_eq!(formset.total_form_count(), 2);
/// assert!(formset.forms()[0].field("DELETE").is_some());
/// ```
#[derive(Clone)]
pub struct FormsetFactory {
    form: Arc<FormBuilder>,
    initial_loader: Option<Arc<InitialLoader>>,
    extra: usize,
    min_num: usize,
    max_num: usize,
    absolute_max: Option<usize>,
    can_delete: bool,
    can_order: bool,
}

impl fmt::Debug for FormsetFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormsetFactory")
            .field("extra", &self.extra)
            .field("min_num", &self.min_num)
            .field("max_num", &self.max_num)
            .field("can_delete", &self.can_delete)
            .field("can_order", &self.can_order)
            .finish_non_exhaustive()
    }
}

impl FormsetFactory {
    /// Creates a factory for the given child form.
    pub fn new<F>(form: F) -> Self
    where
        F: Fn() -> Box<dyn Form> + Send + Sync + 'static,
    {
        Self {
            form: Arc::new(form),
            initial_loader: None,
            extra: 1,
            min_num: 0,
            max_num: DEFAULT_MAX_NUM,
            absolute_max: None,
            can_delete: false,
            can_order: false,
        }
    }

    /// Number of blank extra forms.
    #[must_use]
    pub const fn extra(mut self, extra: usize) -> Self {
        self.extra = extra;
        self
    }

    /// Minimum number of filled forms.
    #[must_use]
    pub const fn min_num(mut self, min_num: usize) -> Self {
        self.min_num = min_num;
        self
    }

    /// Maximum number of forms.
    #[must_use]
    pub const fn max_num(mut self, max_num: usize) -> Self {
        self.max_num = max_num;
        self
    }

    /// Hard cap on the number of rows built from a submission. Defaults to
    /// `max_num + 1000`. Never lower than `max_num`.
    #[must_use]
    pub const fn absolute_max(mut self, absolute_max: usize) -> Self {
        self.absolute_max = Some(absolute_max);
        self
    }

    fn effective_absolute_max(&self) -> usize {
        self.absolute_max
            .unwrap_or_else(|| self.max_num.saturating_add(DEFAULT_MAX_NUM))
            .max(self.max_num)
    }

    /// Adds a deletion checkbox to each form.
    #[must_use]
    pub const fn can_delete(mut self, can_delete: bool) -> Self {
        self.can_delete = can_delete;
        self
    }

    /// Adds an ordering input to each form.
    #[must_use]
    pub const fn can_order(mut self, can_order: bool) -> Self {
        self.can_order = can_order;
        self
    }

    /// Loads existing child records for a parent instance. Each record
    /// becomes the initial data of one form.
    #[must_use]
    pub fn initial_from<F>(mut self, loader: F) -> Self
    where
        F: Fn(Option<&Instance>) -> Vec<Map<String, Value>> + Send + Sync + 'static,
    {
        self.initial_loader = Some(Arc::new(loader));
        self
    }

    /// The field definitions of the child form, as declared.
    pub fn declared_fields(&self) -> Vec<FieldDef> {
        (self.form)().fields().to_vec()
    }

    /// Builds a formset.
    ///
    /// With `kwargs.data` present, the row count comes from the submitted
    /// management data and every form is bound. Otherwise the formset is
    /// unbound: one form per initial record plus `extra` blank forms.
    pub fn build(&self, kwargs: crate::container::FormsetKwargs) -> CrispyResult<FormSet> {
        let prefix = kwargs
            .prefix
            .unwrap_or_else(|| DEFAULT_PREFIX.to_string());
        let initial = self
            .initial_loader
            .as_ref()
            .map(|load| load(kwargs.instance.as_ref()))
            .unwrap_or_default();

        let absolute_max = self.effective_absolute_max();
        let mut management_error = None;
        let mut submitted_total = 0;
        let (total, initial_count) = match &kwargs.data {
            Some(data) => {
                let read = |key: &str| {
                    data.get(&format!("{prefix}-{key}"))
                        .and_then(|v| v.trim().parse::<usize>().ok())
                };
                if let (Some(total), Some(initial_count)) = (read(TOTAL_FORMS), read(INITIAL_FORMS)) {
                    submitted_total = total;
                    if total > absolute_max {
                        tracing::warn!(
                            prefix = %prefix,
                            submitted = total,
                            absolute_max,
                            "Formset submission exceeds the row cap"
                        );
                    }
                    let total = total.min(absolute_max);
                    (total, initial_count.min(total))
                } else {
                    tracing::warn!(prefix = %prefix, "Formset management data missing");
                    management_error =
                        Some("ManagementForm data is missing or has been tampered with.".to_string());
                    (0, 0)
                }
            }
            None => {
                let count = initial.len();
                ((count + self.extra).min(self.max_num.max(count)), count)
            }
        };

        let forms: Vec<Box<dyn Form>> = (0..total)
            .map(|i| {
                let mut form = self.construct_form(&format!("{prefix}-{i}"));
                if let Some(row) = initial.get(i) {
                    form.set_initial(row.clone());
                }
                form
            })
            .collect();
        let empty_form = self.construct_form(&format!("{prefix}-__prefix__"));

        let mut formset = FormSet::new(forms, empty_form);
        formset.prefix = prefix;
        formset.initial_count = initial_count;
        formset.min_num = self.min_num;
        formset.max_num = self.max_num;
        formset.absolute_max = absolute_max;
        formset.submitted_total = submitted_total;
        formset.can_delete = self.can_delete;
        formset.can_order = self.can_order;

        if let Some(data) = &kwargs.data {
            formset.bind(data, &kwargs.files.unwrap_or_default());
        }
        formset.non_form_errors = management_error.iter().cloned().collect();
        formset.management_error = management_error;

        tracing::debug!(
            prefix = %formset.prefix,
            forms = formset.total_form_count(),
            bound = formset.is_bound,
            "Built formset"
        );
        Ok(formset)
    }

    fn construct_form(&self, prefix: &str) -> Box<dyn Form> {
        let mut form = (self.form)();
        form.set_prefix(Some(prefix.to_string()));
        if self.can_order {
            form.add_field(
                FieldDef::new(
                    ORDERING_FIELD_NAME,
                    FieldType::Integer {
                        min_value: None,
                        max_value: None,
                    },
                )
                .required(false)
                .label("Order"),
            );
        }
        if self.can_delete {
            form.add_field(
                FieldDef::new(DELETION_FIELD_NAME, FieldType::Boolean)
                    .required(false)
                    .label("Delete"),
            );
        }
        form
    }
}

/// Reads the cleaned `ORDER` of a form, falling back to the raw input.
fn form_order(form: &dyn Form) -> Option<i64> {
    form.cleaned_data()
        .get(ORDERING_FIELD_NAME)
        .and_then(Value::as_i64)
        .or_else(|| {
            form.raw_value(ORDERING_FIELD_NAME)
                .and_then(|v| v.trim().parse().ok())
        })
}
