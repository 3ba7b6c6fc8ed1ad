//! Widgets: the HTML representation of a form field.
//!
//! The layout renderer asks two questions of a widget besides how to draw
//! it: does it need a multipart-encoded form (file uploads), and is it
//! hidden (excluded from tabular columns).

use std::collections::BTreeMap;
use std::fmt;

/// Built-in widget types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WidgetType {
    /// `<input type="text">`.
    TextInput,
    /// `<input type="number">`.
    NumberInput,
    /// `<input type="email">`.
    EmailInput,
    /// `<input type="hidden">`.
    HiddenInput,
    /// `<textarea>`.
    Textarea,
    /// `<input type="checkbox">`.
    CheckboxInput,
    /// `<select>` over `(value, label)` choices.
    Select(Vec<(String, String)>),
    /// `<input type="date">`.
    DateInput,
    /// `<input type="file">`.
    FileInput,
    /// `<input type="file">` with a clear checkbox.
    ClearableFileInput,
}

impl fmt::Display for WidgetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::TextInput => "TextInput",
            Self::NumberInput => "NumberInput",
            Self::EmailInput => "EmailInput",
            Self::HiddenInput => "HiddenInput",
            Self::Textarea => "Textarea",
            Self::CheckboxInput => "CheckboxInput",
            Self::Select(_) => "Select",
            Self::DateInput => "DateInput",
            Self::FileInput => "FileInput",
            Self::ClearableFileInput => "ClearableFileInput",
        };
        write!(f, "{name}")
    }
}

impl WidgetType {
    /// Returns `true` if a form containing this widget must be submitted
    /// as `multipart/form-data`.
    pub const fn needs_multipart_form(&self) -> bool {
        matches!(self, Self::FileInput | Self::ClearableFileInput)
    }

    /// Returns `true` for widgets that render no visible control.
    pub const fn is_hidden(&self) -> bool {
        matches!(self, Self::HiddenInput)
    }

    /// Renders the widget.
    ///
    /// `attrs` are emitted sorted by name so output is deterministic.
    pub fn render(&self, name: &str, value: Option<&str>, attrs: &BTreeMap<String, String>) -> String {
        let attrs = render_attrs(attrs);
        let name = escape(name);
        let val = escape(value.unwrap_or(""));
        match self {
            Self::TextInput => format!(r#"<input type="text" name="{name}" value="{val}"{attrs} />"#),
            Self::NumberInput => {
                format!(r#"<input type="number" name="{name}" value="{val}"{attrs} />"#)
            }
            Self::EmailInput => {
                format!(r#"<input type="email" name="{name}" value="{val}"{attrs} />"#)
            }
            Self::HiddenInput => {
                format!(r#"<input type="hidden" name="{name}" value="{val}"{attrs} />"#)
            }
            Self::DateInput => format!(r#"<input type="date" name="{name}" value="{val}"{attrs} />"#),
            Self::Textarea => format!(r#"<textarea name="{name}"{attrs}>{val}</textarea>"#),
            Self::CheckboxInput => {
                let checked = if is_checked(value) { " checked" } else { "" };
                format!(r#"<input type="checkbox" name="{name}"{checked}{attrs} />"#)
            }
            Self::Select(choices) => {
                let mut html = format!(r#"<select name="{name}"{attrs}>"#);
                for (choice, label) in choices {
                    let selected = if value == Some(choice.as_str()) { " selected" } else { "" };
                    html.push_str(&format!(
                        r#"<option value="{}"{selected}>{}</option>"#,
                        escape(choice),
                        escape(label)
                    ));
                }
                html.push_str("</select>");
                html
            }
            // file inputs never echo a value back
            Self::FileInput => format!(r#"<input type="file" name="{name}"{attrs} />"#),
            Self::ClearableFileInput => {
                let mut html = String::new();
                if !val.is_empty() {
                    html.push_str(&format!(
                        r#"<span>Currently: {val}</span> <input type="checkbox" name="{name}-clear" /> Clear<br />"#
                    ));
                }
                html.push_str(&format!(r#"<input type="file" name="{name}"{attrs} />"#));
                html
            }
        }
    }
}

/// Interprets a checkbox submission.
pub fn is_checked(value: Option<&str>) -> bool {
    matches!(value, Some("on" | "true" | "True" | "1"))
}

fn render_attrs(attrs: &BTreeMap<String, String>) -> String {
    attrs
        .iter()
        .map(|(k, v)| format!(r#" {k}="{}""#, escape(v)))
        .collect()
}

/// Escapes text for use inside HTML attributes and element content.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_multipart_widgets() {
        assert!(WidgetType::FileInput.needs_multipart_form());
        assert!(WidgetType::ClearableFileInput.needs_multipart_form());
        assert!(!WidgetType::TextInput.needs_multipart_form());
        assert!(!WidgetType::HiddenInput.needs_multipart_form());
    }

    #[test]
    fn test_hidden_widget() {
        assert!(WidgetType::HiddenInput.is_hidden());
        assert!(!WidgetType::CheckboxInput.is_hidden());
    }

    #[test]
    fn test_text_input_render() {
        let html = WidgetType::TextInput.render("name", Some("Ada"), &attrs(&[("id", "id_name")]));
        assert_eq!(html, r#"<input type="text" name="name" value="Ada" id="id_name" />"#);
    }

    #[test]
    fn test_render_escapes_value() {
        let html = WidgetType::TextInput.render("name", Some(r#""><script>"#), &BTreeMap::new());
        assert!(html.contains("&quot;&gt;&lt;script&gt;"));
    }

    #[test]
    fn test_attrs_sorted() {
        let html = WidgetType::HiddenInput.render("x", None, &attrs(&[("id", "i"), ("class", "c")]));
        assert_eq!(html, r#"<input type="hidden" name="x" value="" class="c" id="i" />"#);
    }

    #[test]
    fn test_checkbox_render() {
        let checked = WidgetType::CheckboxInput.render("DELETE", Some("on"), &BTreeMap::new());
        assert!(checked.contains(" checked"));
        let unchecked = WidgetType::CheckboxInput.render("DELETE", None, &BTreeMap::new());
        assert!(!unchecked.contains("checked"));
    }

    #[test]
    fn test_select_render() {
        let widget = WidgetType::Select(vec![
            ("home".into(), "Home".into()),
            ("work".into(), "Work".into()),
        ]);
        let html = widget.render("kind", Some("work"), &BTreeMap::new());
        assert!(html.contains(r#"<option value="home">Home</option>"#));
        assert!(html.contains(r#"<option value="work" selected>Work</option>"#));
    }

    #[test]
    fn test_file_input_never_renders_value() {
        let html = WidgetType::FileInput.render("photo", Some("secret.png"), &BTreeMap::new());
        assert!(!html.contains("secret.png"));
    }

    #[test]
    fn test_display() {
        assert_eq!(WidgetType::Select(vec![]).to_string(), "Select");
        assert_eq!(WidgetType::FileInput.to_string(), "FileInput");
    }
}
