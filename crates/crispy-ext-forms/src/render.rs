//! Field and form-body rendering.

use serde_json::{json, Value};

use crispy_ext_core::{CrispyError, CrispyResult};

use crate::form::Form;
use crate::layout::{LayoutObject, RenderContext};

/// Renders one field of `form` through a field template (the pack's
/// `field.html` unless `template` is given).
///
/// A field the form does not declare is an error, unless the engine runs
/// with `fail_silently`, in which case it renders as nothing.
pub fn render_field(
    field: &str,
    form: &dyn Form,
    ctx: &RenderContext<'_>,
    template: Option<&str>,
) -> CrispyResult<String> {
    let Some(bound) = form.bound_field(field) else {
        if ctx.engine.settings().fail_silently {
            tracing::warn!(field, form = form.form_name(), "Skipping unknown layout field");
            return Ok(String::new());
        }
        return Err(CrispyError::UnknownField {
            field: field.to_string(),
            form: form.form_name().to_string(),
        });
    };

    let template = template.map_or_else(|| ctx.engine.pack_template("field.html"), str::to_string);
    ctx.engine.render_to_string(
        &template,
        &json!({
            "field": bound.to_context(),
            "form_style": ctx.form_style,
        }),
    )
}

/// Serializes every field of `form`, each with its rendered markup under
/// `rendered`.
pub fn fields_context(form: &dyn Form, ctx: &RenderContext<'_>) -> CrispyResult<Vec<Value>> {
    form.fields()
        .iter()
        .filter_map(|f| form.bound_field(&f.name))
        .map(|bound| -> CrispyResult<Value> {
            let mut value = bound.to_context();
            let rendered = render_field(bound.name(), form, ctx, None)?;
            if let Value::Object(map) = &mut value {
                map.insert("rendered".to_string(), Value::String(rendered));
            }
            Ok(value)
        })
        .collect()
}

/// Renders the inside of a form: its helper layout if it has one,
/// otherwise `template` (the pack's `uni_form.html` by default) with every
/// field in declaration order.
pub fn render_form_body(
    form: &dyn Form,
    ctx: &RenderContext<'_>,
    template: Option<&str>,
) -> CrispyResult<String> {
    if let Some(layout) = form.helper().and_then(|h| h.layout.as_ref()) {
        return layout.render(form, ctx);
    }
    render_fields_template(form, ctx, template)
}

/// Renders `template` (the pack's `uni_form.html` by default) with every
/// field of `form`, ignoring any helper layout.
pub fn render_fields_template(
    form: &dyn Form,
    ctx: &RenderContext<'_>,
    template: Option<&str>,
) -> CrispyResult<String> {
    let template = template.map_or_else(|| ctx.engine.pack_template("uni_form.html"), str::to_string);
    ctx.engine.render_to_string(
        &template,
        &json!({
            "form": {
                "fields": fields_context(form, ctx)?,
                "non_field_errors": form.non_field_errors(),
            },
        }),
    )
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crispy_ext_core::CrispySettings;
    use crispy_ext_template::Engine;

    use super::*;
    use crate::data::{Files, FormData};
    use crate::fields::FieldDef;
    use crate::form::BaseForm;
    use crate::helper::FormHelper;
    use crate::layout::Layout;
    use crate::widgets::WidgetType;

    fn person_form() -> BaseForm {
        BaseForm::new(vec![
            FieldDef::char("name").help_text("Full name"),
            FieldDef::char("token").widget(WidgetType::HiddenInput).required(false),
        ])
        .with_name("PersonForm")
    }

    #[test]
    fn test_render_field() {
        let engine = Engine::new().unwrap();
        let ctx = RenderContext::new(&engine).with_form_style(Some("inline"));
        let html = render_field("name", &person_form(), &ctx, None).unwrap();
        assert!(html.contains(r#"id="div_id_name""#));
        assert!(html.contains("control-group inline"));
        assert!(html.contains("requiredField"));
        assert!(html.contains("Full name"));
    }

    #[test]
    fn test_hidden_field_has_no_wrapper() {
        let engine = Engine::new().unwrap();
        let ctx = RenderContext::new(&engine);
        let html = render_field("token", &person_form(), &ctx, None).unwrap();
        assert!(html.starts_with(r#"<input type="hidden""#));
    }

    #[test]
    fn test_custom_field_template() {
        let mut engine = Engine::new().unwrap();
        engine
            .add_raw_template("plain.html", "[{{ field.name }}]")
            .unwrap();
        let ctx = RenderContext::new(&engine);
        let html = render_field("name", &person_form(), &ctx, Some("plain.html")).unwrap();
        assert_eq!(html, "[name]");
    }

    #[test]
    fn test_unknown_field_fails() {
        let engine = Engine::new().unwrap();
        let ctx = RenderContext::new(&engine);
        let err = render_field("age", &person_form(), &ctx, None).unwrap_err();
        assert_eq!(
            err.to_string(),
            CrispyError::UnknownField {
                field: "age".into(),
                form: "PersonForm".into()
            }
            .to_string()
        );
    }

    #[test]
    fn test_unknown_field_fail_silently() {
        let settings = CrispySettings {
            fail_silently: true,
            ..CrispySettings::default()
        };
        let engine = Engine::from_settings(settings).unwrap();
        let ctx = RenderContext::new(&engine);
        assert_eq!(render_field("age", &person_form(), &ctx, None).unwrap(), "");
    }

    #[test]
    fn test_form_body_without_layout() {
        let engine = Engine::new().unwrap();
        let ctx = RenderContext::new(&engine);
        let mut form = person_form();
        form.bind(&FormData::parse("name=Ada"), &Files::new());
        let html = render_form_body(&form, &ctx, None).unwrap();
        let name = html.find(r#"name="name""#).unwrap();
        let token = html.find(r#"name="token""#).unwrap();
        assert!(name < token);
        assert!(html.contains(r#"value="Ada""#));
    }

    #[test]
    fn test_form_body_with_layout() {
        let engine = Engine::new().unwrap();
        let ctx = RenderContext::new(&engine);
        let form = person_form().with_helper(Arc::new(
            FormHelper::new().with_layout(Layout::new(vec!["token".into()])),
        ));
        let html = render_form_body(&form, &ctx, None).unwrap();
        assert!(html.contains(r#"name="token""#));
        assert!(!html.contains(r#"name="name""#));
    }
}
