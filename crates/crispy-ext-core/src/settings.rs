//! Settings for crispy-ext.
//!
//! [`CrispySettings`] carries the handful of knobs the layout renderer reads:
//! the template pack used for default field and form templates, whether
//! unknown layout fields are skipped or reported, and extra template
//! directories that may override the bundled templates.
//!
//! ## Loading Order
//!
//! 1. Start with default settings.
//! 2. Load from a TOML file or string (overriding defaults).
//! 3. Apply environment variable overrides (highest priority).
//!
//! | Env Var | Setting |
//! |---|---|
//! | `CRISPY_TEMPLATE_PACK` | `template_pack` |
//! | `CRISPY_FAIL_SILENTLY` | `fail_silently` |
//! | `CRISPY_TEMPLATE_DIRS` | `template_dirs` (comma-separated) |
//! | `CRISPY_DEBUG` | `debug` |
//! | `CRISPY_LOG_LEVEL` | `log_level` |

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::CrispyError;

/// Library-wide settings.
///
/// # Examples
///
/// ```
/// use crispy_ext_core::settings::CrispySettings;
///
/// let settings = CrispySettings::default();
/// assert_eq!(settings.template_pack, "bootstrap");
/// assert!(!settings.fail_silently);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrispySettings {
    /// Directory prefix of the default field and form templates.
    pub template_pack: String,
    /// When `true`, layout fields missing from the form are skipped with a
    /// warning instead of failing the render.
    pub fail_silently: bool,
    /// Directories searched for `*.html` templates that override or extend
    /// the bundled set.
    pub template_dirs: Vec<PathBuf>,
    /// Whether debug mode is enabled (pretty logs).
    pub debug: bool,
    /// The log level filter (e.g. "debug", "info", "warn").
    pub log_level: String,
}

impl Default for CrispySettings {
    fn default() -> Self {
        Self {
            template_pack: "bootstrap".to_string(),
            fail_silently: false,
            template_dirs: Vec::new(),
            debug: false,
            log_level: "info".to_string(),
        }
    }
}

/// Loads settings from a TOML string.
///
/// Keys not present in the TOML keep their default values.
pub fn from_toml_str(toml_str: &str) -> Result<CrispySettings, CrispyError> {
    toml::from_str(toml_str)
        .map_err(|e| CrispyError::ConfigurationError(format!("Failed to parse TOML: {e}")))
}

/// Loads settings from a TOML file.
pub fn from_toml_file(path: impl AsRef<Path>) -> Result<CrispySettings, CrispyError> {
    let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
        CrispyError::ConfigurationError(format!(
            "Failed to read TOML file '{}': {e}",
            path.as_ref().display()
        ))
    })?;
    from_toml_str(&content)
}

/// Loads settings from a TOML file and then applies environment variable overrides.
pub fn from_toml_file_with_env(path: impl AsRef<Path>) -> Result<CrispySettings, CrispyError> {
    let mut settings = from_toml_file(path)?;
    apply_env_overrides(&mut settings);
    Ok(settings)
}

/// Loads settings from just environment variables (starting from defaults).
pub fn from_env() -> CrispySettings {
    let mut settings = CrispySettings::default();
    apply_env_overrides(&mut settings);
    settings
}

/// Applies `CRISPY_*` environment variable overrides to a settings struct.
pub fn apply_env_overrides(settings: &mut CrispySettings) {
    apply_overrides_from(settings, |key| std::env::var(key).ok());
}

/// Applies overrides using an arbitrary key lookup.
///
/// [`apply_env_overrides`] calls this with the process environment.
pub fn apply_overrides_from<F>(settings: &mut CrispySettings, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(val) = lookup("CRISPY_TEMPLATE_PACK") {
        settings.template_pack = val;
    }

    if let Some(val) = lookup("CRISPY_FAIL_SILENTLY") {
        settings.fail_silently = parse_bool(&val);
    }

    if let Some(val) = lookup("CRISPY_TEMPLATE_DIRS") {
        settings.template_dirs = val
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(PathBuf::from)
            .collect();
    }

    if let Some(val) = lookup("CRISPY_DEBUG") {
        settings.debug = parse_bool(&val);
    }

    if let Some(val) = lookup("CRISPY_LOG_LEVEL") {
        settings.log_level = val;
    }
}

fn parse_bool(val: &str) -> bool {
    matches!(val.to_lowercase().as_str(), "true" | "1" | "yes")
}
