//! Config-driven report source definition.
//!
//! [`SourceDefinition`] captures everything specific to the publishing
//! agency (endpoints, file naming, HTTP settings) in a serializable config
//! struct, so the rest of the pipeline never hard-codes a URL.

use serde::Deserialize;

use crate::SourceError;

/// Placeholder replaced by the queried year in [`SourceDefinition::index_path`].
const YEAR_PLACEHOLDER: &str = "{year}";

/// A report source, loaded from an embedded TOML file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SourceDefinition {
    /// Unique identifier (e.g., `"la_city_planning"`).
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Scheme and host of the agency website, without a trailing slash.
    pub base_url: String,
    /// Path of the per-year index endpoint, containing `{year}`.
    pub index_path: String,
    /// Prefix of downloaded PDF and CSV file names.
    pub file_prefix: String,
    /// First year reports were published. Used when no start year is given.
    pub earliest_year: i32,
    /// `User-Agent` header sent with every request.
    pub user_agent: String,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl SourceDefinition {
    /// Returns the index URL for `year`.
    #[must_use]
    pub fn index_url(&self, year: i32) -> String {
        format!(
            "{}{}",
            self.base_url.trim_end_matches('/'),
            self.index_path.replace(YEAR_PLACEHOLDER, &year.to_string())
        )
    }

    /// Returns a copy with `base_url` replaced.
    #[must_use]
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    fn validate(self) -> Result<Self, SourceError> {
        if !self.index_path.contains(YEAR_PLACEHOLDER) {
            return Err(SourceError::Config {
                message: format!(
                    "{}: index_path '{}' has no {YEAR_PLACEHOLDER} placeholder",
                    self.id, self.index_path
                ),
            });
        }
        if self.file_prefix.is_empty() {
            return Err(SourceError::Config {
                message: format!("{}: file_prefix is empty", self.id),
            });
        }
        Ok(self)
    }
}

/// Parses and validates a source definition.
///
/// # Errors
///
/// Returns [`SourceError::Config`] if the TOML is malformed or the
/// definition is inconsistent.
pub fn parse_source_toml(toml_str: &str) -> Result<SourceDefinition, SourceError> {
    let definition: SourceDefinition =
        toml::de::from_str(toml_str).map_err(|e| SourceError::Config {
            message: e.to_string(),
        })?;
    definition.validate()
}
