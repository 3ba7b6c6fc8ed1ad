//! Template engine.
//!
//! The engine owns a [`Tera`] instance and the [`CrispySettings`] it was
//! built from. Layout objects render through [`Engine::render_to_string`],
//! always passing a JSON context.

use std::path::Path;

use serde::Serialize;
use tera::{Context, Tera};

use crispy_ext_core::{CrispyError, CrispyResult, CrispySettings};

use crate::filters;

/// Templates that do not depend on the template pack.
pub const BUNDLED_TEMPLATES: &[(&str, &str)] = &[
    (
        "crispy_extensions/formset.html",
        include_str!("../templates/crispy_extensions/formset.html"),
    ),
    (
        "crispy_extensions/tabular-formset.html",
        include_str!("../templates/crispy_extensions/tabular-formset.html"),
    ),
    (
        "crispy_extensions/tabular-form-header.html",
        include_str!("../templates/crispy_extensions/tabular-form-header.html"),
    ),
    (
        "crispy_extensions/tabular-inline-form.html",
        include_str!("../templates/crispy_extensions/tabular-inline-form.html"),
    ),
    (
        "crispy_extensions/tabular-field.html",
        include_str!("../templates/crispy_extensions/tabular-field.html"),
    ),
    (
        "crispy_extensions/formset-delete-button.html",
        include_str!("../templates/crispy_extensions/formset-delete-button.html"),
    ),
];

/// Pack templates, registered under `{template_pack}/{name}`.
const PACK_TEMPLATES: &[(&str, &str)] = &[
    ("field.html", include_str!("../templates/pack/field.html")),
    ("uni_form.html", include_str!("../templates/pack/uni_form.html")),
    (
        "whole_uni_form.html",
        include_str!("../templates/pack/whole_uni_form.html"),
    ),
    ("layout/div.html", include_str!("../templates/pack/layout/div.html")),
    (
        "layout/fieldset.html",
        include_str!("../templates/pack/layout/fieldset.html"),
    ),
];

/// Renders named templates with JSON contexts.
///
/// # Examples
///
/// ```
/// use crispy_ext_template::Engine;
///
/// let mut engine = Engine::new().unwrap();
/// engine.add_raw_template("hello.html", "Hello {{ name }}!").unwrap();
/// let html = engine
///     .render_to_string("hello.html", &serde_json::json!({"name": "Ada"}))
///     .unwrap();
/// assert_eq!(html, "Hello Ada!");
/// ```
#[derive(Debug, Clone)]
pub struct Engine {
    tera: Tera,
    settings: CrispySettings,
}

impl Engine {
    /// Creates an engine with default settings and only the bundled templates.
    pub fn new() -> CrispyResult<Self> {
        Self::from_settings(CrispySettings::default())
    }

    /// Creates an engine from settings.
    ///
    /// Every directory in `settings.template_dirs` is scanned for `*.html`
    /// files. Bundled templates are only added where no directory template
    /// with the same name exists.
    pub fn from_settings(settings: CrispySettings) -> CrispyResult<Self> {
        let mut tera = Tera::default();
        for dir in &settings.template_dirs {
            let loaded = load_dir(dir)?;
            tracing::debug!(
                dir = %dir.display(),
                count = loaded.get_template_names().count(),
                "Loaded template directory"
            );
            // earlier directories win, like a template loader search path
            tera.extend(&loaded)?;
        }

        let mut bundled = Tera::default();
        let pack = settings.template_pack.trim_end_matches('/');
        let mut raw: Vec<(String, &str)> = BUNDLED_TEMPLATES
            .iter()
            .map(|(name, content)| ((*name).to_string(), *content))
            .collect();
        raw.extend(
            PACK_TEMPLATES
                .iter()
                .map(|(name, content)| (format!("{pack}/{name}"), *content)),
        );
        bundled.add_raw_templates(raw)?;

        tera.extend(&bundled)?;

        let mut engine = Self { tera, settings };
        engine.refresh_filters();
        Ok(engine)
    }

    /// Returns the settings this engine was built from.
    pub fn settings(&self) -> &CrispySettings {
        &self.settings
    }

    /// Returns the configured template pack.
    pub fn template_pack(&self) -> &str {
        &self.settings.template_pack
    }

    /// Returns the name of a template inside the configured pack.
    ///
    /// ```
    /// use crispy_ext_template::Engine;
    ///
    /// let engine = Engine::new().unwrap();
    /// assert_eq!(engine.pack_template("field.html"), "bootstrap/field.html");
    /// ```
    pub fn pack_template(&self, name: &str) -> String {
        format!("{}/{name}", self.settings.template_pack.trim_end_matches('/'))
    }

    /// Adds (or replaces) a template from a string.
    pub fn add_raw_template(&mut self, name: &str, content: &str) -> CrispyResult<()> {
        self.tera.add_raw_template(name, content)?;
        self.refresh_filters();
        Ok(())
    }

    /// Returns `true` if a template with this name is loaded.
    pub fn has_template(&self, name: &str) -> bool {
        self.tera.get_template_names().any(|n| n == name)
    }

    /// Renders a template with a serializable context.
    ///
    /// The context must serialize to a JSON object.
    pub fn render_to_string<C: Serialize>(&self, name: &str, context: &C) -> CrispyResult<String> {
        let context = Context::from_serialize(context)?;
        self.render_context(name, &context)
    }

    /// Renders a template with a prepared tera [`Context`].
    pub fn render_context(&self, name: &str, context: &Context) -> CrispyResult<String> {
        self.tera.render(name, context).map_err(CrispyError::from)
    }

    /// Registers an additional tera filter.
    pub fn register_filter<F: tera::Filter + 'static>(&mut self, name: &str, filter: F) {
        self.tera.register_filter(name, filter);
    }

    /// Re-registers the table filters so the header filter sees the current
    /// template set.
    fn refresh_filters(&mut self) {
        let snapshot = self.tera.clone();
        self.tera
            .register_filter("crispy_column_count", filters::column_count);
        self.tera.register_filter(
            "crispy_table_header",
            filters::TableHeader::new(snapshot),
        );
    }
}

fn load_dir(dir: &Path) -> CrispyResult<Tera> {
    if !dir.is_dir() {
        return Err(CrispyError::ConfigurationError(format!(
            "Template directory '{}' does not exist",
            dir.display()
        )));
    }
    let glob = dir.join("**").join("*.html");
    Tera::new(&glob.to_string_lossy()).map_err(CrispyError::from)
}
