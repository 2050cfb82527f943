//! Error types for promote-core

use crate::version::NormalizeMode;
use thiserror::Error;

/// Result type alias using promote-core's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for promote
#[derive(Error, Debug)]
pub enum Error {
    /// Required input was not supplied
    #[error("Missing required input: {field}")]
    MissingInput { field: String },

    /// Input value is not acceptable for its field
    #[error("Invalid value `{value}` for input {field}: {reason}")]
    InvalidInput {
        field: String,
        value: String,
        reason: String,
    },

    /// Boolean-like input outside the accepted token set
    #[error(
        "Invalid boolean value `{value}` for input {field}. \
         Expected one of: true, enable, enabled, yes, on, 1, false, disable, disabled, no, off, 0"
    )]
    InvalidBoolean { field: String, value: String },

    /// Version source spec is not `label:<name>` or `env:<name>`
    #[error("Invalid version source `{input}`: expected `label:<name>` or `env:<name>`")]
    InvalidVersionSource { input: String },

    /// Manifest platform selector could not be parsed
    #[error("Invalid input manifest-platform: {0}")]
    InvalidPlatform(#[source] promote_registry::Error),

    /// Repository spec could not be parsed
    #[error("Failed to parse repository `{spec}`: {source}")]
    InvalidRepository {
        spec: String,
        #[source]
        source: promote_registry::Error,
    },

    /// Version source found nothing in an image config
    #[error("`{reference}` has no `{version_source}` in its image config")]
    VersionNotFound {
        reference: String,
        version_source: String,
    },

    /// Raw version could not be normalized
    #[error("Could not {mode} `{raw}` into a valid semver version")]
    InvalidVersion { raw: String, mode: NormalizeMode },

    /// Registry or transport failure
    #[error(transparent)]
    Registry(#[from] promote_registry::Error),

    /// CI output could not be written
    #[error("Failed to write output {name}: {source}")]
    Output {
        name: String,
        #[source]
        source: std::io::Error,
    },

    /// More than one repository failed
    #[error("Failed to update {failed}/{total} repositories.")]
    Aggregate { failed: usize, total: usize },
}

impl Error {
    /// Create a missing input error
    pub fn missing_input(field: impl Into<String>) -> Self {
        Self::MissingInput {
            field: field.into(),
        }
    }

    /// Create an invalid input error
    pub fn invalid_input(
        field: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidInput {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create an invalid boolean error
    pub fn invalid_boolean(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::InvalidBoolean {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Create an invalid version source error
    pub fn invalid_version_source(input: impl Into<String>) -> Self {
        Self::InvalidVersionSource {
            input: input.into(),
        }
    }

    /// Create a version not found error
    pub fn version_not_found(
        reference: impl Into<String>,
        version_source: impl Into<String>,
    ) -> Self {
        Self::VersionNotFound {
            reference: reference.into(),
            version_source: version_source.into(),
        }
    }

    /// Create an invalid version error
    pub fn invalid_version(raw: impl Into<String>, mode: NormalizeMode) -> Self {
        Self::InvalidVersion {
            raw: raw.into(),
            mode,
        }
    }

    /// Whether this error stems from invocation inputs rather than a repository
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            Self::MissingInput { .. }
                | Self::InvalidInput { .. }
                | Self::InvalidBoolean { .. }
                | Self::InvalidVersionSource { .. }
                | Self::InvalidPlatform(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aggregate_message() {
        let err = Error::Aggregate {
            failed: 2,
            total: 3,
        };
        assert_eq!(err.to_string(), "Failed to update 2/3 repositories.");
    }

    #[test]
    fn test_version_not_found_message() {
        let err = Error::version_not_found("ghcr.io/acme/app:rc", "APP_VERSION env var");
        assert_eq!(
            err.to_string(),
            "`ghcr.io/acme/app:rc` has no `APP_VERSION env var` in its image config"
        );
    }

    #[test]
    fn test_config_error_classification() {
        assert!(Error::missing_input("repository").is_config_error());
        assert!(Error::invalid_boolean("coerce-semver", "maybe").is_config_error());
        assert!(!Error::version_not_found("r", "s").is_config_error());
    }
}
