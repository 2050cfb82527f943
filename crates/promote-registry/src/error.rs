//! Error types for promote-registry

use thiserror::Error;

/// Result type alias using promote-registry's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while talking to a container registry
#[derive(Error, Debug)]
pub enum Error {
    /// Repository spec could not be parsed
    #[error("Invalid repository `{spec}`: {reason}")]
    InvalidRepository { spec: String, reason: String },

    /// Platform selector could not be parsed
    #[error("Invalid platform `{selector}`: expected os/arch[/variant]")]
    InvalidPlatform { selector: String },

    /// Transport-level HTTP failure
    #[error("Request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Registry answered with an unexpected status
    #[error("Registry returned {status} for {url}: {body}")]
    Status {
        status: u16,
        url: String,
        body: String,
    },

    /// Authentication against the registry failed
    #[error("Authentication to {registry} failed: {message}")]
    Auth { registry: String, message: String },

    /// No index entry matches the requested platform
    #[error("`{reference}` has no manifest for platform {platform}")]
    PlatformNotFound { reference: String, platform: String },

    /// Manifest media type is not one this client understands
    #[error("`{reference}` has unsupported manifest media type `{media_type}`")]
    UnsupportedMediaType {
        reference: String,
        media_type: String,
    },

    /// JSON document could not be decoded
    #[error("Failed to parse {what} from {url}: {source}")]
    Json {
        what: &'static str,
        url: String,
        #[source]
        source: serde_json::Error,
    },

    /// Docker credential store could not be read
    #[error("Failed to read credentials from {path}: {message}")]
    Credentials { path: String, message: String },

    /// HTTP client could not be constructed
    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

impl Error {
    /// Create an invalid repository error
    pub fn invalid_repository(spec: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidRepository {
            spec: spec.into(),
            reason: reason.into(),
        }
    }

    /// Create an HTTP transport error
    pub fn http(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Http {
            url: url.into(),
            source,
        }
    }

    /// Create an authentication error
    pub fn auth(registry: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Auth {
            registry: registry.into(),
            message: message.into(),
        }
    }

    /// Create a JSON decoding error
    pub fn json(what: &'static str, url: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Json {
            what,
            url: url.into(),
            source,
        }
    }

    /// Create a credential store error
    pub fn credentials(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Credentials {
            path: path.into(),
            message: message.into(),
        }
    }
}
