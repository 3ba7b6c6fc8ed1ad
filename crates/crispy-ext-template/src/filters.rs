//! Template filters for tabular formsets.
//!
//! Both filters take the serialized formset context (the `formset` value
//! handed to `crispy_extensions/tabular-formset.html`) and read its
//! `visible_fields`, `can_delete` and `can_order` keys.
//!
//! ```text
//! <thead>{{ formset | crispy_table_header | safe }}</thead>
//! <td colspan="{{ formset | crispy_column_count }}">...</td>
//! ```

use std::collections::HashMap;

use serde_json::json;
use tera::{Context, Tera, Value};

/// The template rendered by [`TableHeader`].
pub const TABLE_HEADER_TEMPLATE: &str = "crispy_extensions/tabular-form-header.html";

/// Counts the columns of a tabular formset: visible fields, plus one for the
/// delete checkbox and one for the ordering input when enabled.
pub fn count_columns(visible_fields: usize, can_delete: bool, can_order: bool) -> usize {
    visible_fields + usize::from(can_delete) + usize::from(can_order)
}

struct HeaderParts<'a> {
    visible_fields: &'a [Value],
    can_delete: bool,
    can_order: bool,
}

impl<'a> HeaderParts<'a> {
    fn from_value(value: &'a Value, filter: &str) -> tera::Result<Self> {
        let obj = value
            .as_object()
            .ok_or_else(|| tera::Error::msg(format!("{filter} filter requires a formset")))?;
        let visible_fields = obj
            .get("visible_fields")
            .and_then(Value::as_array)
            .map_or(&[][..], Vec::as_slice);
        Ok(Self {
            visible_fields,
            can_delete: obj.get("can_delete").and_then(Value::as_bool).unwrap_or(false),
            can_order: obj.get("can_order").and_then(Value::as_bool).unwrap_or(false),
        })
    }

    fn column_count(&self) -> usize {
        count_columns(self.visible_fields.len(), self.can_delete, self.can_order)
    }
}

/// `crispy_column_count` filter.
pub fn column_count(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    let parts = HeaderParts::from_value(value, "crispy_column_count")?;
    Ok(json!(parts.column_count()))
}

/// `crispy_table_header` filter.
///
/// Holds a snapshot of the template set so the header template can be
/// rendered from inside another render.
pub struct TableHeader {
    tera: Tera,
}

impl TableHeader {
    /// Creates the filter over a template set.
    pub const fn new(tera: Tera) -> Self {
        Self { tera }
    }
}

impl tera::Filter for TableHeader {
    fn filter(&self, value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
        let parts = HeaderParts::from_value(value, "crispy_table_header")?;
        let mut context = Context::new();
        context.insert("formset", value);
        context.insert("visible_fields", parts.visible_fields);
        context.insert("column_count", &parts.column_count());
        context.insert("can_delete", &parts.can_delete);
        context.insert("can_order", &parts.can_order);
        let html = self.tera.render(TABLE_HEADER_TEMPLATE, &context)?;
        Ok(Value::String(html))
    }

    fn is_safe(&self) -> bool {
        true
    }
}
