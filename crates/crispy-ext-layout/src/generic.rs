//! Template-driven containers.
//!
//! [`GenericContainer`] renders each child field through a per-field
//! template and hands the concatenated fragments to a container template.
//! [`InlineTabularForm`] is the table-row flavour used by tabular formsets.

use std::collections::BTreeMap;

use serde_json::{json, Map, Value};

use crispy_ext_core::{CrispyError, CrispyResult};
use crispy_ext_forms::form::Form;
use crispy_ext_forms::formset::DELETION_FIELD_NAME;
use crispy_ext_forms::layout::{LayoutNode, LayoutObject, RenderContext};
use crispy_ext_forms::render::render_field;

pub const TABULAR_INLINE_TEMPLATE: &str = "crispy_extensions/tabular-inline-form.html";
pub const TABULAR_FIELD_TEMPLATE: &str = "crispy_extensions/tabular-field.html";
pub const DELETE_BUTTON_TEMPLATE: &str = "crispy_extensions/formset-delete-button.html";

/// Construction options for [`GenericContainer`] and [`InlineTabularForm`].
#[derive(Debug, Clone, Default)]
pub struct ContainerOptions {
    /// The container template.
    pub template: Option<String>,
    /// Per-field template overrides.
    pub template_map: BTreeMap<String, String>,
    /// Template for every field without an entry in `template_map`.
    pub all_fields_template: Option<String>,
    /// Passed through to the container template as `extra`.
    pub extra: Map<String, Value>,
}

impl ContainerOptions {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn template(mut self, template: impl Into<String>) -> Self {
        self.template = Some(template.into());
        self
    }

    /// Renders `field` through `template`.
    #[must_use]
    pub fn map_field(mut self, field: impl Into<String>, template: impl Into<String>) -> Self {
        self.template_map.insert(field.into(), template.into());
        self
    }

    #[must_use]
    pub fn all_fields_template(mut self, template: impl Into<String>) -> Self {
        self.all_fields_template = Some(template.into());
        self
    }

    #[must_use]
    pub fn extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }
}

/// A layout object whose markup comes entirely from templates.
///
/// # Examples
///
/// ```
/// use crispy_ext_layout::generic::{ContainerOptions, GenericContainer};
///
/// assert!(GenericContainer::new(vec!["name".into()], ContainerOptions::new()).is_err());
///
/// let row = GenericContainer::new(
///     vec!["name".into()],
///     ContainerOptions::new().template("row.html").extra("css_class", "odd"),
/// )
/// .unwrap();
/// assert_eq!(row.template(), "row.html");
/// ```
#[derive(Debug)]
pub struct GenericContainer {
    fields: Vec<LayoutNode>,
    template: String,
    template_map: BTreeMap<String, String>,
    all_fields_template: Option<String>,
    extra: Map<String, Value>,
}

impl GenericContainer {
    /// Creates a container. Fails without a container template.
    pub fn new(fields: Vec<LayoutNode>, options: ContainerOptions) -> CrispyResult<Self> {
        match options.template.clone() {
            Some(template) if !template.is_empty() => Ok(Self::assemble(fields, template, options)),
            _ => Err(CrispyError::ImproperlyConfigured(
                "GenericContainer layout requires a template".to_string(),
            )),
        }
    }

    fn assemble(fields: Vec<LayoutNode>, template: String, options: ContainerOptions) -> Self {
        Self {
            fields,
            template,
            template_map: options.template_map,
            all_fields_template: options.all_fields_template,
            extra: options.extra,
        }
    }

    /// The container template.
    pub fn template(&self) -> &str {
        &self.template
    }

    /// The template a field renders through; `None` means the pack's
    /// default field template.
    pub fn template_for(&self, field: &str) -> Option<&str> {
        self.template_map
            .get(field)
            .or(self.all_fields_template.as_ref())
            .map(String::as_str)
    }

    pub const fn extra(&self) -> &Map<String, Value> {
        &self.extra
    }
}

impl LayoutObject for GenericContainer {
    fn children(&self) -> &[LayoutNode] {
        &self.fields
    }

    fn render(&self, form: &dyn Form, ctx: &RenderContext<'_>) -> CrispyResult<String> {
        let mut fields = String::new();
        for node in &self.fields {
            let html = match node {
                LayoutNode::Field(name) => render_field(name, form, ctx, self.template_for(name))?,
                LayoutNode::Object(object) => object.render(form, ctx)?,
            };
            fields.push_str(&html);
        }
        ctx.engine.render_to_string(
            &self.template,
            &json!({"fields": fields, "extra": self.extra}),
        )
    }
}

/// One formset form rendered as a table row.
///
/// With `can_delete` (the default) the formset's `DELETE` checkbox is
/// appended as the last cell, rendered as a delete button unless the
/// options already map it.
#[derive(Debug)]
pub struct InlineTabularForm {
    container: GenericContainer,
    can_delete: bool,
}

impl InlineTabularForm {
    pub fn new(fields: Vec<LayoutNode>) -> Self {
        Self::with_options(fields, true, ContainerOptions::default())
    }

    /// Creates a row; missing templates fall back to the tabular defaults.
    pub fn with_options(
        mut fields: Vec<LayoutNode>,
        can_delete: bool,
        mut options: ContainerOptions,
    ) -> Self {
        if can_delete {
            if !fields.iter().any(|n| n.field_name() == Some(DELETION_FIELD_NAME)) {
                fields.push(DELETION_FIELD_NAME.into());
            }
            options
                .template_map
                .entry(DELETION_FIELD_NAME.to_string())
                .or_insert_with(|| DELETE_BUTTON_TEMPLATE.to_string());
        }
        let template = options
            .template
            .take()
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| TABULAR_INLINE_TEMPLATE.to_string());
        if options.all_fields_template.is_none() {
            options.all_fields_template = Some(TABULAR_FIELD_TEMPLATE.to_string());
        }
        Self {
            container: GenericContainer::assemble(fields, template, options),
            can_delete,
        }
    }

    pub const fn can_delete(&self) -> bool {
        self.can_delete
    }

    /// The underlying container.
    pub const fn container(&self) -> &GenericContainer {
        &self.container
    }
}

impl LayoutObject for InlineTabularForm {
    fn children(&self) -> &[LayoutNode] {
        self.container.children()
    }

    fn render(&self, form: &dyn Form, ctx: &RenderContext<'_>) -> CrispyResult<String> {
        self.container.render(form, ctx)
    }
}
