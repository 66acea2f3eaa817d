//! Source registry: the embedded report source definition.
//!
//! The TOML file in `packages/source/sources/` is baked into the binary at
//! compile time via [`include_str!`].

use crate::SourceError;
use crate::source_def::{SourceDefinition, parse_source_toml};

/// Environment variable that overrides the source's `base_url` (useful for
/// pointing the tool at a mirror or a local test server).
pub const BASE_URL_ENV: &str = "PLANNING_CASES_BASE_URL";

/// TOML config embedded at compile time.
const SOURCE_TOML: &str = include_str!("../sources/la_city_planning.toml");

/// Returns the embedded source definition without environment overrides.
///
/// # Errors
///
/// Returns [`SourceError::Config`] if the embedded TOML is invalid.
pub fn embedded_source() -> Result<SourceDefinition, SourceError> {
    parse_source_toml(SOURCE_TOML)
}

/// Returns the source definition with the [`BASE_URL_ENV`] override applied.
///
/// # Errors
///
/// Returns [`SourceError::Config`] if the embedded TOML is invalid.
pub fn load_source() -> Result<SourceDefinition, SourceError> {
    let definition = embedded_source()?;

    match std::env::var(BASE_URL_ENV) {
        Ok(url) if !url.trim().is_empty() => {
            log::info!("Using {BASE_URL_ENV}={url}");
            Ok(definition.with_base_url(url.trim()))
        }
        _ => Ok(definition),
    }
}
