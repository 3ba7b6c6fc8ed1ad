//! Form field definitions and type-level cleaning.
//!
//! A [`FieldDef`] describes one field: its type, widget, and metadata.
//! [`clean_field_value`] coerces the raw submitted string into a JSON value.

use serde_json::Value;

use crate::data::UploadedFile;
use crate::widgets::{self, WidgetType};

/// The type of a form field with its type-specific parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldType {
    /// A character (string) field.
    Char {
        /// Maximum length in characters.
        max_length: Option<usize>,
    },
    /// An integer field.
    Integer {
        /// Minimum allowed value.
        min_value: Option<i64>,
        /// Maximum allowed value.
        max_value: Option<i64>,
    },
    /// A boolean field (checkbox).
    Boolean,
    /// An email address.
    Email,
    /// A date in `YYYY-MM-DD` form.
    Date,
    /// One value out of a fixed set of `(value, label)` choices.
    Choice(Vec<(String, String)>),
    /// An uploaded file.
    File,
}

/// Complete definition of a form field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDef {
    /// The field name, without any form prefix.
    pub name: String,
    /// The field type.
    pub field_type: FieldType,
    /// Whether this field is required.
    pub required: bool,
    /// Initial value shown on unbound forms.
    pub initial: Option<Value>,
    /// Help text displayed alongside the field.
    pub help_text: String,
    /// Human-readable label.
    pub label: String,
    /// The widget used for rendering.
    pub widget: WidgetType,
}

impl FieldDef {
    /// Creates a required field with the default widget for its type.
    ///
    /// The label defaults to the name with underscores replaced by spaces
    /// and the first letter capitalised.
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        let name = name.into();
        let widget = default_widget_for_field_type(&field_type);
        let label = pretty_name(&name);
        Self {
            name,
            field_type,
            required: true,
            initial: None,
            help_text: String::new(),
            label,
            widget,
        }
    }

    /// Shorthand for a `Char` field without a length limit.
    pub fn char(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Char { max_length: None })
    }

    /// Sets whether this field is required.
    #[must_use]
    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Sets the initial value.
    #[must_use]
    pub fn initial(mut self, value: impl Into<Value>) -> Self {
        self.initial = Some(value.into());
        self
    }

    /// Sets the help text.
    #[must_use]
    pub fn help_text(mut self, text: impl Into<String>) -> Self {
        self.help_text = text.into();
        self
    }

    /// Sets the label.
    #[must_use]
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Sets the widget.
    #[must_use]
    pub fn widget(mut self, widget: WidgetType) -> Self {
        self.widget = widget;
        self
    }
}

/// Returns the default widget for a field type.
pub fn default_widget_for_field_type(field_type: &FieldType) -> WidgetType {
    match field_type {
        FieldType::Char { .. } => WidgetType::TextInput,
        FieldType::Integer { .. } => WidgetType::NumberInput,
        FieldType::Boolean => WidgetType::CheckboxInput,
        FieldType::Email => WidgetType::EmailInput,
        FieldType::Date => WidgetType::DateInput,
        FieldType::Choice(choices) => WidgetType::Select(choices.clone()),
        FieldType::File => WidgetType::ClearableFileInput,
    }
}

fn pretty_name(name: &str) -> String {
    let spaced = name.replace('_', " ");
    let mut chars = spaced.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

/// Cleans a raw submitted value.
///
/// File fields look at `file` instead of `raw`. Returns the cleaned value or
/// the list of error messages.
pub fn clean_field_value(
    field: &FieldDef,
    raw: Option<&str>,
    file: Option<&UploadedFile>,
) -> Result<Value, Vec<String>> {
    match &field.field_type {
        FieldType::File => match file {
            Some(upload) if upload.size() > 0 => Ok(serde_json::json!({
                "name": upload.name,
                "content_type": upload.content_type,
                "size": upload.size(),
            })),
            Some(_) => Err(vec!["The submitted file is empty.".to_string()]),
            None if field.required => Err(vec![REQUIRED.to_string()]),
            None => Ok(Value::Null),
        },
        FieldType::Boolean => {
            let checked = widgets::is_checked(raw);
            if field.required && !checked {
                return Err(vec![REQUIRED.to_string()]);
            }
            Ok(Value::Bool(checked))
        }
        FieldType::Char { max_length } => {
            let Some(raw) = non_empty(field, raw)? else {
                return Ok(Value::Null);
            };
            let len = raw.chars().count();
            match max_length {
                Some(max) if len > *max => Err(vec![format!(
                    "Ensure this value has at most {max} characters (it has {len})."
                )]),
                _ => Ok(Value::String(raw.to_string())),
            }
        }
        FieldType::Integer {
            min_value,
            max_value,
        } => {
            let Some(raw) = non_empty(field, raw)? else {
                return Ok(Value::Null);
            };
            let n: i64 = raw
                .parse()
                .map_err(|_| vec!["Enter a whole number.".to_string()])?;
            let mut errors = Vec::new();
            if let Some(min) = min_value {
                if n < *min {
                    errors.push(format!("Ensure this value is greater than or equal to {min}."));
                }
            }
            if let Some(max) = max_value {
                if n > *max {
                    errors.push(format!("Ensure this value is less than or equal to {max}."));
                }
            }
            if errors.is_empty() {
                Ok(Value::from(n))
            } else {
                Err(errors)
            }
        }
        FieldType::Email => {
            let Some(raw) = non_empty(field, raw)? else {
                return Ok(Value::Null);
            };
            let valid = raw
                .split_once('@')
                .is_some_and(|(user, domain)| !user.is_empty() && domain.contains('.'));
            if valid {
                Ok(Value::String(raw.to_string()))
            } else {
                Err(vec!["Enter a valid email address.".to_string()])
            }
        }
        FieldType::Date => {
            let Some(raw) = non_empty(field, raw)? else {
                return Ok(Value::Null);
            };
            if is_iso_date(raw) {
                Ok(Value::String(raw.to_string()))
            } else {
                Err(vec!["Enter a valid date.".to_string()])
            }
        }
        FieldType::Choice(choices) => {
            let Some(raw) = non_empty(field, raw)? else {
                return Ok(Value::Null);
            };
            if choices.iter().any(|(value, _)| value == raw) {
                Ok(Value::String(raw.to_string()))
            } else {
                Err(vec![format!(
                    "Select a valid choice. {raw} is not one of the available choices."
                )])
            }
        }
    }
}

const REQUIRED: &str = "This field is required.";

/// Trims the raw value; `Ok(None)` means "empty but allowed".
fn non_empty<'a>(field: &FieldDef, raw: Option<&'a str>) -> Result<Option<&'a str>, Vec<String>> {
    match raw.map(str::trim) {
        Some(raw) if !raw.is_empty() => Ok(Some(raw)),
        _ if field.required => Err(vec![REQUIRED.to_string()]),
        _ => Ok(None),
    }
}

fn is_iso_date(raw: &str) -> bool {
    let parts: Vec<&str> = raw.split('-').collect();
    let [year, month, day] = parts.as_slice() else {
        return false;
    };
    let (Ok(_), Ok(month), Ok(day)) = (
        year.parse::<u16>(),
        month.parse::<u8>(),
        day.parse::<u8>(),
    ) else {
        return false;
    };
    year.len() == 4 && (1..=12).contains(&month) && (1..=31).contains(&day)
}
