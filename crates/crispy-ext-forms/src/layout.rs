//! The layout tree.
//!
//! A [`Layout`] is an ordered list of [`LayoutNode`]s: plain field names or
//! boxed [`LayoutObject`]s that render their own markup and may hold
//! children of their own. Concrete layout objects live in the
//! `crispy-ext-layout` crate.

use std::fmt;

use crispy_ext_core::CrispyResult;
use crispy_ext_template::Engine;

use crate::form::Form;
use crate::render::render_field;

/// State shared by every node during one render.
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    /// The template engine.
    pub engine: &'a Engine,
    /// Extra CSS class added to every field wrapper.
    pub form_style: Option<&'a str>,
}

impl<'a> RenderContext<'a> {
    /// Creates a context over an engine.
    pub const fn new(engine: &'a Engine) -> Self {
        Self {
            engine,
            form_style: None,
        }
    }

    /// Sets the form style class.
    #[must_use]
    pub const fn with_form_style(mut self, form_style: Option<&'a str>) -> Self {
        self.form_style = form_style;
        self
    }
}

/// A node that renders itself against a form.
pub trait LayoutObject: Send + Sync + fmt::Debug {
    /// Child nodes, in layout order.
    fn children(&self) -> &[LayoutNode];

    /// Renders the node.
    fn render(&self, form: &dyn Form, ctx: &RenderContext<'_>) -> CrispyResult<String>;

    /// Wraps the object into a node.
    fn into_node(self) -> LayoutNode
    where
        Self: Sized + 'static,
    {
        LayoutNode::Object(Box::new(self))
    }
}

/// One entry of a layout.
#[derive(Debug)]
pub enum LayoutNode {
    /// A field of the form being rendered.
    Field(String),
    /// A layout object.
    Object(Box<dyn LayoutObject>),
}

impl LayoutNode {
    /// Renders the node: fields through the pack's field template, objects
    /// through their own `render`.
    pub fn render(&self, form: &dyn Form, ctx: &RenderContext<'_>) -> CrispyResult<String> {
        match self {
            Self::Field(name) => render_field(name, form, ctx, None),
            Self::Object(object) => object.render(form, ctx),
        }
    }

    /// Children of an object node; fields have none.
    pub fn children(&self) -> &[Self] {
        match self {
            Self::Field(_) => &[],
            Self::Object(object) => object.children(),
        }
    }

    /// The field name, for field nodes.
    pub fn field_name(&self) -> Option<&str> {
        match self {
            Self::Field(name) => Some(name.as_str()),
            Self::Object(_) => None,
        }
    }
}

impl From<&str> for LayoutNode {
    fn from(name: &str) -> Self {
        Self::Field(name.to_string())
    }
}

impl From<String> for LayoutNode {
    fn from(name: String) -> Self {
        Self::Field(name)
    }
}

impl From<Box<dyn LayoutObject>> for LayoutNode {
    fn from(object: Box<dyn LayoutObject>) -> Self {
        Self::Object(object)
    }
}

/// Renders a run of nodes and concatenates the output.
pub fn render_nodes(
    nodes: &[LayoutNode],
    form: &dyn Form,
    ctx: &RenderContext<'_>,
) -> CrispyResult<String> {
    let mut html = String::new();
    for node in nodes {
        html.push_str(&node.render(form, ctx)?);
    }
    Ok(html)
}

/// The root of a form's layout.
///
/// # Examples
///
/// ```
/// use crispy_ext_forms::layout::Layout;
///
/// let layout = Layout::new(vec!["first_name".into(), "last_name".into()]);
/// assert_eq!(layout.len(), 2);
/// ```
#[derive(Debug, Default)]
pub struct Layout {
    fields: Vec<LayoutNode>,
}

impl Layout {
    /// Creates a layout.
    pub fn new(fields: Vec<LayoutNode>) -> Self {
        Self { fields }
    }

    /// Appends a node.
    pub fn push(&mut self, node: impl Into<LayoutNode>) {
        self.fields.push(node.into());
    }

    /// Number of top-level nodes.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` if the layout has no nodes.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl LayoutObject for Layout {
    fn children(&self) -> &[LayoutNode] {
        &self.fields
    }

    fn render(&self, form: &dyn Form, ctx: &RenderContext<'_>) -> CrispyResult<String> {
        render_nodes(&self.fields, form, ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Files, FormData};
    use crate::fields::FieldDef;
    use crate::form::BaseForm;
    use crispy_ext_core::CrispyError;

    #[derive(Debug)]
    struct Bold(Vec<LayoutNode>);

    impl LayoutObject for Bold {
        fn children(&self) -> &[LayoutNode] {
            &self.0
        }

        fn render(&self, form: &dyn Form, ctx: &RenderContext<'_>) -> CrispyResult<String> {
            Ok(format!("<b>{}</b>", render_nodes(&self.0, form, ctx)?))
        }
    }

    fn name_form() -> BaseForm {
        BaseForm::new(vec![FieldDef::char("first"), FieldDef::char("last")])
    }

    #[test]
    fn test_node_conversions() {
        let node: LayoutNode = "first".into();
        assert_eq!(node.field_name(), Some("first"));
        assert!(node.children().is_empty());

        let node = Bold(vec!["a".into(), String::from("b").into()]).into_node();
        assert_eq!(node.field_name(), None);
        assert_eq!(node.children().len(), 2);
    }

    #[test]
    fn test_render_layout() {
        let engine = Engine::new().unwrap();
        let ctx = RenderContext::new(&engine);
        let mut form = name_form();
        form.bind(&FormData::parse("first=Ada&last=Lovelace"), &Files::new());

        let layout = Layout::new(vec![Bold(vec!["first".into()]).into_node(), "last".into()]);
        let html = layout.render(&form, &ctx).unwrap();
        assert!(html.starts_with("<b>"));
        assert!(html.contains(r#"name="first""#));
        assert!(html.contains(r#"value="Lovelace""#));
        let first = html.find(r#"name="first""#).unwrap();
        let last = html.find(r#"name="last""#).unwrap();
        assert!(first < last);
    }

    #[test]
    fn test_unknown_field() {
        let engine = Engine::new().unwrap();
        let ctx = RenderContext::new(&engine);
        let layout = Layout::new(vec!["middle".into()]);
        let err = layout.render(&name_form(), &ctx).unwrap_err();
        assert!(matches!(err, CrispyError::UnknownField { ref field, .. } if field == "middle"));
    }

    #[test]
    fn test_push() {
        let mut layout = Layout::default();
        assert!(layout.is_empty());
        layout.push("first");
        assert_eq!(layout.len(), 1);
    }
}
