use crate::error::{Error, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

/// Registry used when a repository spec has no explicit host
pub const DEFAULT_REGISTRY: &str = "docker.io";

/// Host actually serving the Docker Hub registry API
const DOCKER_HUB_API_HOST: &str = "registry-1.docker.io";

static PATH_COMPONENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9]+(?:(?:[._]|__|-+)[a-z0-9]+)*$")
        .expect("path component regex is valid")
});

/// A container repository: registry host plus repository path
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Repository {
    /// Registry hostname, optionally with port (e.g., "ghcr.io", "localhost:5000")
    pub registry: String,
    /// Repository path (e.g., "acme/app")
    pub path: String,
}

impl Repository {
    /// Parse a repository spec like "ghcr.io/acme/app" or "acme/app"
    ///
    /// Tags and digests are rejected: a spec names a repository, never an image.
    pub fn parse(spec: &str) -> Result<Self> {
        let spec = spec.trim();
        if spec.is_empty() {
            return Err(Error::invalid_repository(spec, "repository spec is empty"));
        }
        if spec.contains('@') {
            return Err(Error::invalid_repository(
                spec,
                "digests are not allowed in a repository spec",
            ));
        }

        let (registry, path) = match spec.split_once('/') {
            Some((first, rest)) if is_registry_host(first) => (first.to_string(), rest.to_string()),
            _ => (DEFAULT_REGISTRY.to_string(), spec.to_string()),
        };

        if path.contains(':') {
            return Err(Error::invalid_repository(
                spec,
                "tags are not allowed in a repository spec",
            ));
        }

        for component in path.split('/') {
            if !PATH_COMPONENT_RE.is_match(component) {
                return Err(Error::invalid_repository(
                    spec,
                    format!("invalid path component '{}'", component),
                ));
            }
        }

        // Official Docker Hub images live under library/
        let path = if registry == DEFAULT_REGISTRY && !path.contains('/') {
            format!("library/{}", path)
        } else {
            path
        };

        Ok(Self { registry, path })
    }

    /// Reference to a tag within this repository
    pub fn tag(&self, tag: impl Into<String>) -> ImageReference {
        ImageReference {
            repository: self.clone(),
            tag: Some(tag.into()),
            digest: None,
        }
    }

    /// Reference to a digest within this repository
    pub fn digest(&self, digest: impl Into<String>) -> ImageReference {
        ImageReference {
            repository: self.clone(),
            tag: None,
            digest: Some(digest.into()),
        }
    }

    /// Host serving the registry HTTP API
    pub fn api_host(&self) -> &str {
        if self.registry == DEFAULT_REGISTRY {
            DOCKER_HUB_API_HOST
        } else {
            &self.registry
        }
    }

    /// Local registries are reached over plain HTTP
    pub fn uses_plain_http(&self) -> bool {
        let host = self
            .registry
            .rsplit_once(':')
            .map(|(host, _)| host)
            .unwrap_or(&self.registry);
        host == "localhost" || host == "127.0.0.1"
    }

    /// Base URL of the registry API, e.g. "https://ghcr.io/v2/acme/app"
    pub fn api_base(&self) -> String {
        let scheme = if self.uses_plain_http() { "http" } else { "https" };
        format!("{}://{}/v2/{}", scheme, self.api_host(), self.path)
    }
}

impl fmt::Display for Repository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.registry, self.path)
    }
}

fn is_registry_host(component: &str) -> bool {
    component.contains('.') || component.contains(':') || component == "localhost"
}

/// Container image reference: a repository plus a tag or digest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageReference {
    pub repository: Repository,
    /// Tag (e.g., "stable") - mutually exclusive with digest
    pub tag: Option<String>,
    /// Digest (e.g., "sha256:abc123...") - mutually exclusive with tag
    pub digest: Option<String>,
}

impl ImageReference {
    /// The tag or digest as used in a `/manifests/<reference>` URL
    pub fn manifest_reference(&self) -> &str {
        self.digest
            .as_deref()
            .or(self.tag.as_deref())
            .unwrap_or("latest")
    }
}

impl fmt::Display for ImageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(digest) = &self.digest {
            write!(f, "{}@{}", self.repository, digest)
        } else if let Some(tag) = &self.tag {
            write!(f, "{}:{}", self.repository, tag)
        } else {
            write!(f, "{}:latest", self.repository)
        }
    }
}

/// Platform selector for multi-arch images (e.g., "linux/arm64/v8")
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Platform {
    pub os: String,
    pub architecture: String,
    pub variant: Option<String>,
}

impl Platform {
    /// Parse an `os/arch[/variant]` selector
    pub fn parse(selector: &str) -> Result<Self> {
        let parts: Vec<&str> = selector.trim().split('/').collect();
        let valid = |s: &&str| !s.is_empty() && !s.chars().any(char::is_whitespace);

        match parts.as_slice() {
            [os, arch] if valid(os) && valid(arch) => Ok(Self {
                os: os.to_string(),
                architecture: arch.to_string(),
                variant: None,
            }),
            [os, arch, variant] if valid(os) && valid(arch) && valid(variant) => Ok(Self {
                os: os.to_string(),
                architecture: arch.to_string(),
                variant: Some(variant.to_string()),
            }),
            _ => Err(Error::InvalidPlatform {
                selector: selector.to_string(),
            }),
        }
    }

    /// Whether an index entry's platform satisfies this selector
    ///
    /// The variant is only compared when the selector names one.
    pub fn matches(&self, other: &IndexPlatform) -> bool {
        self.os == other.os
            && self.architecture == other.architecture
            && match &self.variant {
                Some(variant) => other.variant.as_deref() == Some(variant.as_str()),
                None => true,
            }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.os, self.architecture)?;
        if let Some(variant) = &self.variant {
            write!(f, "/{}", variant)?;
        }
        Ok(())
    }
}

/// Image configuration document (the config blob of an image manifest)
///
/// Only the fields needed to read version metadata are decoded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageConfig {
    #[serde(default)]
    pub config: Option<ContainerConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerConfig {
    #[serde(default, rename = "Labels")]
    pub labels: Option<HashMap<String, String>>,
    #[serde(default, rename = "Env")]
    pub env: Option<Vec<String>>,
}

impl ImageConfig {
    /// Label mapping, absent when the image declares none
    pub fn labels(&self) -> Option<&HashMap<String, String>> {
        self.config.as_ref().and_then(|c| c.labels.as_ref())
    }

    /// `NAME=value` environment entries, absent when the image declares none
    pub fn env(&self) -> Option<&[String]> {
        self.config.as_ref().and_then(|c| c.env.as_deref())
    }
}

// Manifest media types
pub const MEDIA_TYPE_OCI_MANIFEST: &str = "application/vnd.oci.image.manifest.v1+json";
pub const MEDIA_TYPE_OCI_INDEX: &str = "application/vnd.oci.image.index.v1+json";
pub const MEDIA_TYPE_DOCKER_MANIFEST: &str =
    "application/vnd.docker.distribution.manifest.v2+json";
pub const MEDIA_TYPE_DOCKER_MANIFEST_LIST: &str =
    "application/vnd.docker.distribution.manifest.list.v2+json";

/// Whether a media type denotes a multi-platform index
pub fn is_index_media_type(media_type: &str) -> bool {
    media_type == MEDIA_TYPE_OCI_INDEX || media_type == MEDIA_TYPE_DOCKER_MANIFEST_LIST
}

/// Single-platform image manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageManifest {
    pub schema_version: i32,
    #[serde(default)]
    pub media_type: Option<String>,
    pub config: Descriptor,
    #[serde(default)]
    pub layers: Vec<Descriptor>,
}

/// Multi-platform image index / manifest list
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageIndex {
    pub schema_version: i32,
    #[serde(default)]
    pub media_type: Option<String>,
    pub manifests: Vec<IndexEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Descriptor {
    pub media_type: String,
    pub size: u64,
    pub digest: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexEntry {
    pub media_type: String,
    pub size: u64,
    pub digest: String,
    #[serde(default)]
    pub platform: Option<IndexPlatform>,
}

/// Platform as recorded in an index entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexPlatform {
    pub os: String,
    pub architecture: String,
    #[serde(default)]
    pub variant: Option<String>,
}

/// A manifest exactly as served by the registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawManifest {
    pub media_type: String,
    pub body: Vec<u8>,
}
