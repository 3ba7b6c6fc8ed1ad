//! Plain grouping objects: [`Div`] and [`Fieldset`].

use serde_json::json;

use crispy_ext_core::CrispyResult;
use crispy_ext_forms::form::Form;
use crispy_ext_forms::layout::{render_nodes, LayoutNode, LayoutObject, RenderContext};

/// Wraps its children in a `<div>`.
#[derive(Debug, Default)]
pub struct Div {
    fields: Vec<LayoutNode>,
    css_id: Option<String>,
    css_class: Option<String>,
    template: Option<String>,
}

impl Div {
    pub fn new(fields: Vec<LayoutNode>) -> Self {
        Self {
            fields,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn css_id(mut self, css_id: impl Into<String>) -> Self {
        self.css_id = Some(css_id.into());
        self
    }

    #[must_use]
    pub fn css_class(mut self, css_class: impl Into<String>) -> Self {
        self.css_class = Some(css_class.into());
        self
    }

    /// Replaces the pack's `layout/div.html`.
    #[must_use]
    pub fn template(mut self, template: impl Into<String>) -> Self {
        self.template = Some(template.into());
        self
    }
}

impl LayoutObject for Div {
    fn children(&self) -> &[LayoutNode] {
        &self.fields
    }

    fn render(&self, form: &dyn Form, ctx: &RenderContext<'_>) -> CrispyResult<String> {
        let fields = render_nodes(&self.fields, form, ctx)?;
        let template = self
            .template
            .clone()
            .unwrap_or_else(|| ctx.engine.pack_template("layout/div.html"));
        ctx.engine.render_to_string(
            &template,
            &json!({
                "div": {"css_id": self.css_id, "css_class": self.css_class},
                "fields": fields,
            }),
        )
    }
}

/// Groups its children in a `<fieldset>` with an optional legend.
#[derive(Debug)]
pub struct Fieldset {
    legend: String,
    fields: Vec<LayoutNode>,
    css_id: Option<String>,
    css_class: Option<String>,
}

impl Fieldset {
    pub fn new(legend: impl Into<String>, fields: Vec<LayoutNode>) -> Self {
        Self {
            legend: legend.into(),
            fields,
            css_id: None,
            css_class: None,
        }
    }

    #[must_use]
    pub fn css_id(mut self, css_id: impl Into<String>) -> Self {
        self.css_id = Some(css_id.into());
        self
    }

    #[must_use]
    pub fn css_class(mut self, css_class: impl Into<String>) -> Self {
        self.css_class = Some(css_class.into());
        self
    }
}

impl LayoutObject for Fieldset {
    fn children(&self) -> &[LayoutNode] {
        &self.fields
    }

    fn render(&self, form: &dyn Form, ctx: &RenderContext<'_>) -> CrispyResult<String> {
        let fields = render_nodes(&self.fields, form, ctx)?;
        ctx.engine.render_to_string(
            &ctx.engine.pack_template("layout/fieldset.html"),
            &json!({
                "fieldset": {"css_id": self.css_id, "css_class": self.css_class},
                "legend": self.legend,
                "fields": fields,
            }),
        )
    }
}
