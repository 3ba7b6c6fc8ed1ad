//! Helpers for rendering formsets as tables.
//!
//! Column discovery walks the child form's helper layout, so headers follow
//! the order fields are laid out in rather than the order they were
//! declared in. The same helpers back the `crispy_column_count` and
//! `crispy_table_header` template filters, which work on the value built
//! by [`formset_context`].

use serde_json::{json, Value};

use crispy_ext_core::CrispyResult;
use crispy_ext_forms::bound_field::BoundField;
use crispy_ext_forms::form::Form;
use crispy_ext_forms::formset::{is_control_field, FormSet};
use crispy_ext_forms::layout::{LayoutNode, LayoutObject, RenderContext};
use crispy_ext_forms::render::render_form_body;
use crispy_ext_template::filters::{count_columns, TABLE_HEADER_TEMPLATE};
use crispy_ext_template::Engine;

/// Field names of `form` in layout order, depth first.
///
/// Names the form does not declare are skipped. A form without a helper
/// layout yields nothing.
pub fn flattener(form: &dyn Form) -> Vec<String> {
    fn walk(nodes: &[LayoutNode], form: &dyn Form, out: &mut Vec<String>) {
        for node in nodes {
            match node {
                LayoutNode::Field(name) => {
                    if form.field(name).is_some() {
                        out.push(name.clone());
                    }
                }
                LayoutNode::Object(object) => walk(object.children(), form, out),
            }
        }
    }

    let mut out = Vec::new();
    if let Some(layout) = form.helper().and_then(|h| h.layout.as_ref()) {
        walk(layout.children(), form, &mut out);
    }
    out
}

/// Visible table columns of `form`: flattened fields minus hidden widgets
/// and the formset's own `DELETE`/`ORDER` controls.
pub fn visible_fields(form: &dyn Form) -> Vec<BoundField<'_>> {
    flattener(form)
        .iter()
        .filter(|name| !is_control_field(name))
        .filter_map(|name| form.bound_field(name))
        .filter(|bound| !bound.is_hidden())
        .collect()
}

/// Number of table columns for a formset.
///
/// # Examples
///
/// ```
/// use crispy_ext_forms::container::FormsetKwargs;
/// use crispy_ext_forms::fields::FieldDef;
/// use crispy_ext_forms::form::BaseForm;
/// use crispy_ext_forms::formset::FormsetFactory;
/// use crispy_ext_forms::helper::FormHelper;
/// use crispy_ext_forms::layout::Layout;
/// use crispy_ext_layout::templatetags::crispy_column_count;
///
/// let factory = FormsetFactory::new(|| {
///     Box::new(
///         BaseForm::new(vec![FieldDef::char("a"), FieldDef::char("b"), FieldDef::char("c")])
///             .with_helper(FormHelper::new().with_layout(Layout::new(vec![
///                 "a".into(),
///                 "b".into(),
///                 "c".into(),
///             ]))),
///     )
/// })
/// .can_delete(true);
/// let formset = factory.build(FormsetKwargs::default()).unwrap();
/// assert_eq!(crispy_column_count(&formset), 4);
/// ```
pub fn crispy_column_count(formset: &FormSet) -> usize {
    count_columns(
        visible_fields(formset.empty_form()).len(),
        formset.can_delete(),
        formset.can_order(),
    )
}

/// Renders the `<tr>` of column headers for a tabular formset.
pub fn crispy_table_header(engine: &Engine, formset: &FormSet) -> CrispyResult<String> {
    let headers = header_context(formset.empty_form());
    engine.render_to_string(
        TABLE_HEADER_TEMPLATE,
        &json!({
            "formset": formset.as_context(),
            "column_count": crispy_column_count(formset),
            "visible_fields": headers,
            "can_delete": formset.can_delete(),
            "can_order": formset.can_order(),
        }),
    )
}

fn header_context(form: &dyn Form) -> Vec<Value> {
    visible_fields(form)
        .iter()
        .map(BoundField::to_context)
        .collect()
}

/// The `formset` value handed to formset templates: the formset's own
/// state, each rendered form under `forms[].html`, the rendered empty form,
/// and the table columns read by the filters.
pub fn formset_context(formset: &FormSet, ctx: &RenderContext<'_>) -> CrispyResult<Value> {
    let forms = formset
        .forms()
        .iter()
        .map(|form| -> CrispyResult<Value> {
            Ok(json!({
                "prefix": form.prefix(),
                "html": render_form_body(&**form, ctx, None)?,
                "errors": form.errors(),
            }))
        })
        .collect::<CrispyResult<Vec<_>>>()?;

    let mut value = formset.as_context();
    if let Value::Object(map) = &mut value {
        map.insert("forms".into(), Value::Array(forms));
        map.insert(
            "empty_form".into(),
            json!({"html": render_form_body(formset.empty_form(), ctx, None)?}),
        );
        map.insert(
            "visible_fields".into(),
            Value::Array(header_context(formset.empty_form())),
        );
        map.insert("column_count".into(), json!(crispy_column_count(formset)));
    }
    Ok(value)
}
