//! Whole-form rendering.

use serde_json::json;

use crispy_ext_core::logging::render_span;
use crispy_ext_core::CrispyResult;
use crispy_ext_forms::form::Form;
use crispy_ext_forms::helper::FormHelper;
use crispy_ext_forms::layout::RenderContext;
use crispy_ext_forms::render::render_form_body;
use crispy_ext_template::Engine;

/// Renders a form the way its helper describes: the `<form>` tag and its
/// attributes, non-field errors, and the body.
///
/// Forms without a helper render with the default helper options and
/// every field in declaration order. The tag gets
/// `enctype="multipart/form-data"` whenever [`Form::is_multipart`] holds.
pub fn render_form(form: &dyn Form, engine: &Engine) -> CrispyResult<String> {
    let span = render_span(form.form_name());
    let _guard = span.enter();

    let default_helper = FormHelper::default();
    let helper = form.helper().unwrap_or(&default_helper);
    let ctx = RenderContext::new(engine).with_form_style(helper.form_style.as_deref());
    let body = render_form_body(form, &ctx, None)?;

    // the fallback body template already lists them
    let non_field_errors: &[String] = if helper.layout.is_some() {
        form.non_field_errors()
    } else {
        &[]
    };

    tracing::debug!(
        layout = helper.layout.is_some(),
        nested = form.nested().len(),
        "Rendering form"
    );
    engine.render_to_string(
        &engine.pack_template("whole_uni_form.html"),
        &json!({
            "form_tag": helper.form_tag,
            "form_id": helper.form_id,
            "form_class": helper.form_class,
            "form_method": helper.form_method,
            "form_action": helper.form_action,
            "is_multipart": form.is_multipart(),
            "form": {"non_field_errors": non_field_errors},
            "form_html": body,
        }),
    )
}

/// Alias of [`render_form`], named after the template tag.
pub fn crispy(form: &dyn Form, engine: &Engine) -> CrispyResult<String> {
    render_form(form, engine)
}
