//! Bound fields: a field definition paired with a form's current state.
//!
//! Field templates receive a [`BoundField`] serialized under the `field`
//! key (see [`BoundField::to_context`]).

use std::collections::BTreeMap;

use serde_json::{json, Value};

use crate::fields::FieldDef;

/// A form field bound to its value and errors.
#[derive(Debug, Clone)]
pub struct BoundField<'a> {
    /// The field definition.
    pub field: &'a FieldDef,
    /// The HTML `name`, including the form prefix.
    pub html_name: String,
    /// The value to display: submitted data for bound forms, otherwise the
    /// initial value.
    pub value: Option<String>,
    /// Validation errors for this field.
    pub errors: Vec<String>,
}

impl<'a> BoundField<'a> {
    /// Creates a bound field.
    pub fn new(
        field: &'a FieldDef,
        prefix: Option<&str>,
        value: Option<String>,
        errors: Vec<String>,
    ) -> Self {
        Self {
            field,
            html_name: add_prefix(prefix, &field.name),
            value,
            errors,
        }
    }

    /// The unprefixed field name.
    pub fn name(&self) -> &str {
        &self.field.name
    }

    /// Returns the auto-generated HTML `id`.
    pub fn auto_id(&self) -> String {
        format!("id_{}", self.html_name)
    }

    /// Returns `true` if the widget renders nothing visible.
    pub fn is_hidden(&self) -> bool {
        self.field.widget.is_hidden()
    }

    /// Renders the widget HTML.
    pub fn render(&self) -> String {
        let mut attrs = BTreeMap::new();
        attrs.insert("id".to_string(), self.auto_id());
        self.field
            .widget
            .render(&self.html_name, self.value.as_deref(), &attrs)
    }

    /// Serializes the field for a template context.
    pub fn to_context(&self) -> Value {
        json!({
            "name": self.field.name,
            "html_name": self.html_name,
            "auto_id": self.auto_id(),
            "label": self.field.label,
            "help_text": self.field.help_text,
            "required": self.field.required,
            "is_hidden": self.is_hidden(),
            "widget": self.field.widget.to_string(),
            "value": self.value,
            "errors": self.errors,
            "html": self.render(),
        })
    }
}

/// Joins a form prefix and a field name the way formsets expect
/// (`phones-0` + `number` => `phones-0-number`).
pub fn add_prefix(prefix: Option<&str>, name: &str) -> String {
    match prefix {
        Some(p) if !p.is_empty() => format!("{p}-{name}"),
        _ => name.to_string(),
    }
}
