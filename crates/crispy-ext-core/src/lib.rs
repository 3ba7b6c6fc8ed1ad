//! # crispy-ext-core
//!
//! Foundation types shared by every crispy-ext crate.
//!
//! ## Modules
//!
//! - [`error`] - Error taxonomy and result alias
//! - [`settings`] - Library settings, TOML loading, and environment overrides
//! - [`logging`] - Tracing subscriber setup

pub mod error;
pub mod logging;
pub mod settings;

pub use error::{CrispyError, CrispyResult};
pub use settings::CrispySettings;
