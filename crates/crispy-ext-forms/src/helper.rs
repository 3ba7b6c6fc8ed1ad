//! The crispy form helper.

use std::fmt;
use std::sync::Arc;

use crate::container::FormsetContainer;
use crate::layout::Layout;

/// Rendering options and nested formset declarations attached to a form.
///
/// # Examples
///
/// ```
/// use crispy_ext_forms::helper::FormHelper;
/// use crispy_ext_forms::layout::Layout;
///
/// let helper = FormHelper::new()
///     .with_layout(Layout::new(vec!["name".into()]))
///     .form_method("get")
///     .form_tag(false);
/// assert_eq!(helper.form_method, "get");
/// assert!(helper.layout.is_some());
/// ```
pub struct FormHelper {
    /// The layout; without one, every field renders in declaration order.
    pub layout: Option<Layout>,
    /// Nested formsets the parent form carries.
    pub formsets: Vec<Arc<dyn FormsetContainer>>,
    /// Whether to wrap the output in a `<form>` tag.
    pub form_tag: bool,
    /// The form's `method` attribute.
    pub form_method: String,
    /// The form's `action` attribute.
    pub form_action: Option<String>,
    /// The form's `class` attribute.
    pub form_class: Option<String>,
    /// The form's `id` attribute.
    pub form_id: Option<String>,
    /// Extra class added to every field wrapper.
    pub form_style: Option<String>,
}

impl Default for FormHelper {
    fn default() -> Self {
        Self {
            layout: None,
            formsets: Vec::new(),
            form_tag: true,
            form_method: "post".to_string(),
            form_action: None,
            form_class: None,
            form_id: None,
            form_style: None,
        }
    }
}

impl fmt::Debug for FormHelper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormHelper")
            .field("layout", &self.layout)
            .field("formsets", &self.formsets)
            .field("form_tag", &self.form_tag)
            .field("form_method", &self.form_method)
            .field("form_action", &self.form_action)
            .finish_non_exhaustive()
    }
}

impl FormHelper {
    /// Creates a helper with default options.
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_layout(mut self, layout: Layout) -> Self {
        self.layout = Some(layout);
        self
    }

    /// Declares a nested formset.
    #[must_use]
    pub fn with_formset(mut self, container: impl FormsetContainer + 'static) -> Self {
        self.formsets.push(Arc::new(container));
        self
    }

    #[must_use]
    pub const fn form_tag(mut self, form_tag: bool) -> Self {
        self.form_tag = form_tag;
        self
    }

    #[must_use]
    pub fn form_method(mut self, method: impl Into<String>) -> Self {
        self.form_method = method.into();
        self
    }

    #[must_use]
    pub fn form_action(mut self, action: impl Into<String>) -> Self {
        self.form_action = Some(action.into());
        self
    }

    #[must_use]
    pub fn form_class(mut self, class: impl Into<String>) -> Self {
        self.form_class = Some(class.into());
        self
    }

    #[must_use]
    pub fn form_id(mut self, id: impl Into<String>) -> Self {
        self.form_id = Some(id.into());
        self
    }

    #[must_use]
    pub fn form_style(mut self, style: impl Into<String>) -> Self {
        self.form_style = Some(style.into());
        self
    }

    /// Looks up a declared container by name.
    pub fn formset(&self, name: &str) -> Option<&Arc<dyn FormsetContainer>> {
        self.formsets.iter().find(|c| c.name() == name)
    }
}
