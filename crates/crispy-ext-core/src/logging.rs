//! Logging integration for crispy-ext.
//!
//! The library itself only emits [`tracing`] events. Applications that do not
//! install their own subscriber can call [`setup_logging`].

use crate::settings::CrispySettings;

/// Sets up the global tracing subscriber based on the given settings.
///
/// In debug mode a pretty, human-readable format is used; otherwise a
/// structured JSON format is used. Installing twice is a no-op.
pub fn setup_logging(settings: &CrispySettings) {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_new(&settings.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    if settings.debug {
        fmt::Subscriber::builder()
            .with_env_filter(filter)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .pretty()
            .try_init()
            .ok();
    } else {
        fmt::Subscriber::builder()
            .with_env_filter(filter)
            .with_target(true)
            .json()
            .try_init()
            .ok();
    }
}

/// Creates a span covering the rendering of one form.
///
/// # Examples
///
/// ```
/// use crispy_ext_core::logging::render_span;
///
/// let span = render_span("ContactForm");
/// let _guard = span.enter();
/// tracing::debug!("rendering layout");
/// ```
pub fn render_span(form: &str) -> tracing::Span {
    tracing::debug_span!("crispy_render", form = form)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_setup_logging_twice_is_harmless() {
        let settings = CrispySettings {
            log_level: "not a valid filter ===".to_string(),
            ..CrispySettings::default()
        };
        setup_logging(&settings);
        setup_logging(&CrispySettings::default());
    }
}
