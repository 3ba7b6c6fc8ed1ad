//! Integration tests for formsets and formset containers.

use std::sync::Arc;

use serde_json::{json, Map, Value};

use crispy_ext_forms::formset::{DELETION_FIELD_NAME, ORDERING_FIELD_NAME};
use crispy_ext_forms::{
    BaseForm, DeclaredFormset, FieldDef, FieldType, Form, FormData, FormHelper, FormsetContainer,
    FormsetFactory, FormsetKwargs,
};

fn line_factory() -> FormsetFactory {
    FormsetFactory::new(|| {
        Box::new(BaseForm::new(vec![
            FieldDef::char("title"),
            FieldDef::new(
                "qty",
                FieldType::Integer {
                    min_value: Some(1),
                    max_value: None,
                },
            )
            .required(false),
        ]))
    })
}

fn row(title: &str) -> Map<String, Value> {
    let mut map = Map::new();
    map.insert("title".into(), json!(title));
    map
}

fn kwargs(payload: &str) -> FormsetKwargs {
    FormsetKwargs::default()
        .data(FormData::parse(payload))
        .prefix("line")
}

#[test]
fn test_unbound_formset_uses_initial_rows_plus_extra() {
    let factory = line_factory()
        .extra(2)
        .initial_from(|_| vec![row("first"), row("second")]);
    let formset = factory
        .build(FormsetKwargs::default().prefix("line"))
        .unwrap();

    assert!(!formset.is_bound());
    assert_eq!(formset.total_form_count(), 4);
    assert_eq!(formset.initial_form_count(), 2);
    assert_eq!(formset.forms()[0].prefix(), Some("line-0"));
    assert_eq!(formset.empty_form().prefix(), Some("line-__prefix__"));
    assert_eq!(formset.forms()[1].initial().get("title"), Some(&json!("second")));
}

#[test]
fn test_management_form_describes_rows() {
    let formset = line_factory()
        .extra(3)
        .build(FormsetKwargs::default().prefix("line"))
        .unwrap();
    let data = formset.management_form_data();
    assert!(data.contains(&("line-TOTAL_FORMS".to_string(), "3".to_string())));
    assert!(data.contains(&("line-INITIAL_FORMS".to_string(), "0".to_string())));

    let html = formset.management_form_html();
    assert!(html.contains("name=\"line-TOTAL_FORMS\""));
    assert!(html.contains("type=\"hidden\""));
}

#[tokio::test]
async fn test_deleted_and_ordered_forms() {
    let factory = line_factory().can_delete(true).can_order(true);
    let mut formset = factory
        .build(kwargs(
            "line-TOTAL_FORMS=3&line-INITIAL_FORMS=3\
             &line-0-title=a&line-0-ORDER=3\
             &line-1-title=b&line-1-ORDER=1&line-1-DELETE=on\
             &line-2-title=c&line-2-ORDER=2",
        ))
        .unwrap();

    assert!(formset.forms()[0].field(DELETION_FIELD_NAME).is_some());
    assert!(formset.forms()[0].field(ORDERING_FIELD_NAME).is_some());
    assert!(formset.is_valid().await);

    let deleted: Vec<_> = formset
        .deleted_forms()
        .iter()
        .map(|f| f.raw_value("title").unwrap_or_default().to_string())
        .collect();
    assert_eq!(deleted, ["b"]);

    let ordered: Vec<_> = formset
        .ordered_forms()
        .iter()
        .map(|f| f.raw_value("title").unwrap_or_default().to_string())
        .collect();
    assert_eq!(ordered, ["c", "a"]);
}

#[tokio::test]
async fn test_untouched_extra_form_is_skipped() {
    let mut formset = line_factory()
        .build(kwargs(
            "line-TOTAL_FORMS=2&line-INITIAL_FORMS=1&line-0-title=kept&line-1-title=",
        ))
        .unwrap();

    assert!(formset.is_valid().await);
    assert_eq!(formset.forms_to_save().len(), 1);
}

#[tokio::test]
async fn test_min_num_is_enforced() {
    let mut formset = line_factory()
        .min_num(2)
        .build(kwargs("line-TOTAL_FORMS=2&line-INITIAL_FORMS=0&line-0-title=only"))
        .unwrap();

    assert!(!formset.is_valid().await);
    assert_eq!(
        formset.non_form_errors(),
        ["Please submit at least 2 forms.".to_string()]
    );
}

#[tokio::test]
async fn test_rows_past_max_num_fail_validation() {
    let mut formset = line_factory()
        .max_num(2)
        .build(kwargs(
            "line-TOTAL_FORMS=3&line-INITIAL_FORMS=0\
             &line-0-title=a&line-1-title=b&line-2-title=c",
        ))
        .unwrap();

    assert_eq!(formset.total_form_count(), 3);
    assert!(!formset.is_valid().await);
    assert_eq!(
        formset.non_form_errors(),
        ["Please submit at most 2 forms.".to_string()]
    );
}

#[tokio::test]
async fn test_child_errors_are_collected() {
    let mut formset = line_factory()
        .build(kwargs(
            "line-TOTAL_FORMS=2&line-INITIAL_FORMS=2&line-0-title=ok&line-0-qty=0&line-1-qty=4",
        ))
        .unwrap();

    assert!(!formset.is_valid().await);
    let errors = formset.errors();
    assert!(errors[0].contains_key("qty"));
    assert!(errors[1].contains_key("title"));
}

#[tokio::test]
async fn test_missing_management_data_invalidates() {
    let mut formset = line_factory()
        .build(kwargs("line-0-title=orphan"))
        .unwrap();

    assert_eq!(formset.total_form_count(), 0);
    assert!(!formset.is_valid().await);
    assert_eq!(
        formset.non_form_errors(),
        ["ManagementForm data is missing or has been tampered with.".to_string()]
    );
}

#[test]
fn test_helper_exposes_declared_containers() {
    let helper = FormHelper::new()
        .with_formset(DeclaredFormset::new("lines", line_factory()).with_prefix("line"));
    let container: &Arc<dyn FormsetContainer> = helper.formset("lines").unwrap();

    assert_eq!(container.name(), "lines");
    assert_eq!(container.prefix(), Some("line"));
    let names: Vec<_> = container
        .declared_fields()
        .into_iter()
        .map(|f| f.name)
        .collect();
    assert_eq!(names, ["title", "qty"]);
    assert!(helper.formset("missing").is_none());
}
