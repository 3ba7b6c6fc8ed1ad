//! Layout objects that render a nested form or formset inside the parent
//! form's layout.
//!
//! Both look the nested entry up on the parent form's
//! [`NestedForms`](crispy_ext_forms::form::NestedForms) by name. Attaching it
//! is the view's job; rendering an unattached name is an error.

use std::fmt;
use std::str::FromStr;

use serde_json::json;

use crispy_ext_core::{CrispyError, CrispyResult};
use crispy_ext_forms::form::Form;
use crispy_ext_forms::layout::{render_nodes, LayoutNode, LayoutObject, RenderContext};
use crispy_ext_forms::render::render_fields_template;
use crispy_ext_forms::widgets::escape;

use crate::templatetags::formset_context;

pub const FORMSET_TEMPLATE: &str = "crispy_extensions/formset.html";
pub const TABULAR_FORMSET_TEMPLATE: &str = "crispy_extensions/tabular-formset.html";

/// How an [`InlineFormSet`] lays out its forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormStyle {
    /// One block per form.
    #[default]
    Standard,
    /// One table row per form.
    Tabular,
}

impl FormStyle {
    /// The formset template for this style.
    pub const fn template(self) -> &'static str {
        match self {
            Self::Standard => FORMSET_TEMPLATE,
            Self::Tabular => TABULAR_FORMSET_TEMPLATE,
        }
    }
}

impl FromStr for FormStyle {
    type Err = CrispyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "standard" => Ok(Self::Standard),
            "tabular" => Ok(Self::Tabular),
            other => Err(CrispyError::ImproperlyConfigured(format!(
                "form_style can only be standard or tabular, got '{other}'"
            ))),
        }
    }
}

impl fmt::Display for FormStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Standard => f.write_str("standard"),
            Self::Tabular => f.write_str("tabular"),
        }
    }
}

/// Renders a nested formset in the middle of a parent form.
///
/// Any `fields` given are rendered after the formset, against the parent
/// form.
///
/// # Examples
///
/// ```
/// use crispy_ext_layout::inline::{FormStyle, InlineFormSet};
///
/// let phones = InlineFormSet::new("Phone numbers", "phones", vec![])
///     .form_style(FormStyle::Tabular);
/// assert_eq!(phones.template_name(), "crispy_extensions/tabular-formset.html");
/// ```
#[derive(Debug)]
pub struct InlineFormSet {
    title: String,
    formset_name: String,
    fields: Vec<LayoutNode>,
    css_class: String,
    group_css_class: String,
    form_style: FormStyle,
    template: Option<String>,
}

impl InlineFormSet {
    pub fn new(
        title: impl Into<String>,
        formset_name: impl Into<String>,
        fields: Vec<LayoutNode>,
    ) -> Self {
        Self {
            title: title.into(),
            formset_name: formset_name.into(),
            fields,
            css_class: "formset".to_string(),
            group_css_class: "formsetGroup".to_string(),
            form_style: FormStyle::Standard,
            template: None,
        }
    }

    #[must_use]
    pub fn css_class(mut self, css_class: impl Into<String>) -> Self {
        self.css_class = css_class.into();
        self
    }

    #[must_use]
    pub fn group_css_class(mut self, group_css_class: impl Into<String>) -> Self {
        self.group_css_class = group_css_class.into();
        self
    }

    #[must_use]
    pub const fn form_style(mut self, form_style: FormStyle) -> Self {
        self.form_style = form_style;
        self
    }

    /// Overrides the style's template.
    #[must_use]
    pub fn template(mut self, template: impl Into<String>) -> Self {
        self.template = Some(template.into());
        self
    }

    /// The formset template in use.
    pub fn template_name(&self) -> &str {
        self.template
            .as_deref()
            .unwrap_or(self.form_style.template())
    }

    /// Name of the nested formset on the parent form.
    pub fn formset_name(&self) -> &str {
        &self.formset_name
    }
}

impl LayoutObject for InlineFormSet {
    fn children(&self) -> &[LayoutNode] {
        &self.fields
    }

    fn render(&self, form: &dyn Form, ctx: &RenderContext<'_>) -> CrispyResult<String> {
        let formset = form
            .nested()
            .formset(&self.formset_name)
            .ok_or_else(|| CrispyError::MissingNested(self.formset_name.clone()))?;

        let mut html = ctx.engine.render_to_string(
            self.template_name(),
            &json!({
                "form_title": self.title,
                "css": self.css_class,
                "group_css": self.group_css_class,
                "formset": formset_context(formset, ctx)?,
            }),
        )?;
        html.push_str(&render_nodes(&self.fields, form, ctx)?);
        Ok(html)
    }
}

/// Renders a single nested form inside a `<div>`.
///
/// A nested form with a helper layout renders through that layout. Otherwise
/// the nested form goes through `template` (the pack's `uni_form.html` by
/// default), followed by `fields` rendered against the parent form.
#[derive(Debug)]
pub struct InlineForm {
    form_name: String,
    fields: Vec<LayoutNode>,
    css_class: String,
    template: Option<String>,
}

impl InlineForm {
    pub fn new(form_name: impl Into<String>, fields: Vec<LayoutNode>) -> Self {
        Self {
            form_name: form_name.into(),
            fields,
            css_class: String::new(),
            template: None,
        }
    }

    #[must_use]
    pub fn css_class(mut self, css_class: impl Into<String>) -> Self {
        self.css_class = css_class.into();
        self
    }

    #[must_use]
    pub fn template(mut self, template: impl Into<String>) -> Self {
        self.template = Some(template.into());
        self
    }

    pub fn form_name(&self) -> &str {
        &self.form_name
    }
}

impl LayoutObject for InlineForm {
    fn children(&self) -> &[LayoutNode] {
        &self.fields
    }

    fn render(&self, form: &dyn Form, ctx: &RenderContext<'_>) -> CrispyResult<String> {
        let inner = form
            .nested()
            .form(&self.form_name)
            .ok_or_else(|| CrispyError::MissingNested(self.form_name.clone()))?;

        let mut html = format!(r#"<div class="{}">"#, escape(&self.css_class));
        if let Some(layout) = inner.helper().and_then(|h| h.layout.as_ref()) {
            html.push_str(&layout.render(inner, ctx)?);
        } else {
            html.push_str(&render_fields_template(inner, ctx, self.template.as_deref())?);
            html.push_str(&render_nodes(&self.fields, form, ctx)?);
        }
        html.push_str("</div>");
        Ok(html)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basic::Div;
    use crate::generic::InlineTabularForm;
    use crispy_ext_forms::container::FormsetKwargs;
    use crispy_ext_forms::data::{Files, FormData};
    use crispy_ext_forms::fields::FieldDef;
    use crispy_ext_forms::form::BaseForm;
    use crispy_ext_forms::formset::FormsetFactory;
    use crispy_ext_forms::helper::FormHelper;
    use crispy_ext_forms::layout::Layout;
    use crispy_ext_template::Engine;

    fn parent() -> BaseForm {
        BaseForm::new(vec![FieldDef::char("name"), FieldDef::char("notes").required(false)])
            .with_name("ContactForm")
    }

    fn phone_factory(tabular: bool) -> FormsetFactory {
        FormsetFactory::new(move || {
            let layout = if tabular {
                Layout::new(vec![InlineTabularForm::new(vec!["number".into()]).into_node()])
            } else {
                Layout::new(vec![Div::new(vec!["number".into()]).css_class("phone").into_node()])
            };
            Box::new(
                BaseForm::new(vec![FieldDef::char("number")])
                    .with_helper(FormHelper::new().with_layout(layout).form_tag(false)),
            )
        })
        .can_delete(true)
    }

    #[test]
    fn test_form_style_parse() {
        assert_eq!("standard".parse::<FormStyle>().unwrap(), FormStyle::Standard);
        assert_eq!("tabular".parse::<FormStyle>().unwrap(), FormStyle::Tabular);
        let err = "grid".parse::<FormStyle>().unwrap_err();
        assert!(matches!(err, CrispyError::ImproperlyConfigured(_)));
        assert_eq!(FormStyle::Tabular.to_string(), "tabular");
    }

    #[test]
    fn test_inline_formset_defaults() {
        let node = InlineFormSet::new("Phones", "phones", vec![]);
        assert_eq!(node.template_name(), FORMSET_TEMPLATE);
        assert_eq!(node.formset_name(), "phones");
        let node = node.form_style(FormStyle::Tabular).template("mine.html");
        assert_eq!(node.template_name(), "mine.html");
    }

    #[test]
    fn test_inline_formset_missing() {
        let engine = Engine::new().unwrap();
        let ctx = RenderContext::new(&engine);
        let err = InlineFormSet::new("Phones", "phones", vec![])
            .render(&parent(), &ctx)
            .unwrap_err();
        assert!(matches!(err, CrispyError::MissingNested(ref n) if n == "phones"));
    }

    #[test]
    fn test_inline_formset_standard() {
        let engine = Engine::new().unwrap();
        let ctx = RenderContext::new(&engine);
        let mut form = parent();
        let formset = phone_factory(false)
            .extra(2)
            .build(FormsetKwargs::default().prefix("phones"))
            .unwrap();
        form.nested_mut().insert_formset("phones", formset);

        let html = InlineFormSet::new("Phone numbers", "phones", vec!["notes".into()])
            .render(&form, &ctx)
            .unwrap();
        assert!(html.starts_with(r#"<div class="formset">"#));
        assert!(html.contains("<h3>Phone numbers</h3>"));
        assert!(html.contains(r#"name="phones-TOTAL_FORMS" value="2""#));
        assert!(html.contains(r#"<div class="formsetGroup" id="phones-1">"#));
        assert!(html.contains(r#"<div class="phone">"#));
        assert!(html.contains(r#"name="phones-1-number""#));
        let formset_end = html.find(r#"name="phones-1-number""#).unwrap();
        let notes = html.find(r#"name="notes""#).unwrap();
        assert!(formset_end < notes);
    }

    #[test]
    fn test_inline_formset_tabular() {
        let engine = Engine::new().unwrap();
        let ctx = RenderContext::new(&engine);
        let mut form = parent();
        let formset = phone_factory(true)
            .extra(1)
            .build(FormsetKwargs::default().prefix("phones"))
            .unwrap();
        form.nested_mut().insert_formset("phones", formset);

        let html = InlineFormSet::new("Phones", "phones", vec![])
            .form_style(FormStyle::Tabular)
            .group_css_class("phones")
            .render(&form, &ctx)
            .unwrap();
        assert!(html.contains(r#"<table class="phones table">"#));
        assert!(html.contains(
            r#"<thead><tr><th class="number requiredField">Number</th><th class="delete">Delete</th></tr></thead>"#
        ));
        assert!(html.contains(r#"<tr><td class="number">"#));
        assert!(html.contains(r#"<label for="id_phones-0-DELETE">Delete</label>"#));
    }

    #[tokio::test]
    async fn test_inline_formset_shows_errors() {
        let engine = Engine::new().unwrap();
        let ctx = RenderContext::new(&engine);
        let data = FormData::parse("phones-TOTAL_FORMS=1&phones-INITIAL_FORMS=1");
        let mut formset = phone_factory(false)
            .build(FormsetKwargs::default().prefix("phones").data(data))
            .unwrap();
        assert!(!formset.is_valid().await);
        let mut form = parent();
        form.nested_mut().insert_formset("phones", formset);
        let html = InlineFormSet::new("Phones", "phones", vec![])
            .render(&form, &ctx)
            .unwrap();
        assert!(html.contains("This field is required."));
    }

    #[test]
    fn test_inline_form_with_layout() {
        let engine = Engine::new().unwrap();
        let ctx = RenderContext::new(&engine);
        let address = BaseForm::new(vec![FieldDef::char("street"), FieldDef::char("city")])
            .with_prefix("address")
            .with_helper(
                FormHelper::new()
                    .with_layout(Layout::new(vec!["city".into()]))
                    .form_tag(false),
            );
        let mut form = parent();
        form.nested_mut().insert_form("address", Box::new(address));

        let html = InlineForm::new("address", vec!["notes".into()])
            .css_class("address")
            .render(&form, &ctx)
            .unwrap();
        assert!(html.starts_with(r#"<div class="address">"#));
        assert!(html.ends_with("</div>"));
        assert!(html.contains(r#"name="address-city""#));
        assert!(!html.contains(r#"name="address-street""#));
        // parent fields only render in the fallback branch
        assert!(!html.contains(r#"name="notes""#));
    }

    #[test]
    fn test_inline_form_fallback_keeps_wrapper() {
        let engine = Engine::new().unwrap();
        let ctx = RenderContext::new(&engine);
        let mut form = parent();
        form.bind(&FormData::parse("notes=hello"), &Files::new());
        form.nested_mut().insert_form(
            "address",
            Box::new(BaseForm::new(vec![FieldDef::char("street")]).with_prefix("address")),
        );

        let html = InlineForm::new("address", vec!["notes".into()])
            .render(&form, &ctx)
            .unwrap();
        assert!(html.starts_with(r#"<div class="">"#));
        assert!(html.ends_with("</div>"));
        let street = html.find(r#"name="address-street""#).unwrap();
        let notes = html.find(r#"value="hello""#).unwrap();
        assert!(street < notes);
    }

    #[test]
    fn test_inline_form_missing() {
        let engine = Engine::new().unwrap();
        let ctx = RenderContext::new(&engine);
        let err = InlineForm::new("address", vec![]).render(&parent(), &ctx).unwrap_err();
        assert!(matches!(err, CrispyError::MissingNested(_)));
    }
}
