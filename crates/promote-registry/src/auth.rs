//! Registry authentication
//!
//! Credentials are read from the Docker CLI config file, the same place
//! `docker login` writes them. Token negotiation follows the Docker
//! registry v2 token flow driven by `WWW-Authenticate` challenges.

use crate::error::{Error, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use regex::Regex;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::debug;

static CHALLENGE_PARAM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(\w+)="([^"]*)""#).expect("challenge regex is valid"));

/// Username/password pair for a registry
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Credentials keyed by registry host
#[derive(Debug, Clone, Default)]
pub struct CredentialStore {
    auths: HashMap<String, Credentials>,
}

impl CredentialStore {
    /// A store with no credentials (anonymous access everywhere)
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load the Docker CLI config from `$DOCKER_CONFIG` or `~/.docker`
    pub fn from_docker_config() -> Result<Self> {
        match docker_config_path() {
            Some(path) => Self::load(&path),
            None => {
                debug!("No home directory found, using anonymous registry access");
                Ok(Self::empty())
            }
        }
    }

    /// Load a Docker CLI `config.json`; a missing file yields an empty store
    pub fn load(path: &Path) -> Result<Self> {
        let location = path.display().to_string();
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No Docker config at {}, using anonymous access", location);
                return Ok(Self::empty());
            }
            Err(e) => return Err(Error::credentials(location, e.to_string())),
        };

        let config: DockerConfig = serde_json::from_str(&contents)
            .map_err(|e| Error::credentials(&location, e.to_string()))?;

        let mut store = Self::empty();
        for (key, entry) in config.auths {
            if let Some(credentials) = entry.credentials(&location)? {
                store.insert(&key, credentials);
            }
        }

        debug!(
            "Loaded credentials for {} registries from {}",
            store.auths.len(),
            location
        );
        Ok(store)
    }

    /// Add credentials for a registry host (or Docker config key)
    pub fn insert(&mut self, registry: &str, credentials: Credentials) {
        self.auths.insert(normalize_host(registry), credentials);
    }

    /// Look up credentials for a registry host
    pub fn get(&self, registry: &str) -> Option<&Credentials> {
        self.auths.get(&normalize_host(registry))
    }
}

fn docker_config_path() -> Option<PathBuf> {
    if let Some(dir) = std::env::var_os("DOCKER_CONFIG") {
        return Some(PathBuf::from(dir).join("config.json"));
    }
    dirs::home_dir().map(|home| home.join(".docker").join("config.json"))
}

/// Reduce a Docker config key or registry name to a bare host
///
/// Docker Hub is known under several names; they all collapse to `docker.io`.
fn normalize_host(key: &str) -> String {
    let host = key
        .trim_start_matches("https://")
        .trim_start_matches("http://");
    let host = host.split('/').next().unwrap_or(host);
    match host {
        "index.docker.io" | "registry-1.docker.io" => "docker.io".to_string(),
        other => other.to_string(),
    }
}

#[derive(Debug, Deserialize)]
struct DockerConfig {
    #[serde(default)]
    auths: HashMap<String, DockerAuthEntry>,
}

#[derive(Debug, Deserialize)]
struct DockerAuthEntry {
    #[serde(default)]
    auth: Option<String>,
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    password: Option<String>,
}

impl DockerAuthEntry {
    fn credentials(&self, path: &str) -> Result<Option<Credentials>> {
        if let Some(auth) = self.auth.as_deref().filter(|a| !a.is_empty()) {
            let decoded = STANDARD
                .decode(auth)
                .map_err(|e| Error::credentials(path, format!("invalid auth encoding: {}", e)))?;
            let decoded = String::from_utf8(decoded)
                .map_err(|_| Error::credentials(path, "auth is not valid UTF-8"))?;
            let (username, password) = decoded
                .split_once(':')
                .ok_or_else(|| Error::credentials(path, "auth is not user:password"))?;
            return Ok(Some(Credentials {
                username: username.to_string(),
                password: password.to_string(),
            }));
        }

        match (&self.username, &self.password) {
            (Some(username), Some(password)) => Ok(Some(Credentials {
                username: username.clone(),
                password: password.clone(),
            })),
            // Entries managed by credential helpers carry no secret here
            _ => Ok(None),
        }
    }
}

/// Parsed `WWW-Authenticate` challenge
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Challenge {
    Basic,
    Bearer {
        realm: String,
        service: Option<String>,
        scope: Option<String>,
    },
}

impl Challenge {
    /// Parse a `WWW-Authenticate` header value
    pub fn parse(header: &str) -> Option<Self> {
        let header = header.trim();
        let (scheme, params) = header.split_once(' ').unwrap_or((header, ""));

        if scheme.eq_ignore_ascii_case("basic") {
            return Some(Self::Basic);
        }
        if !scheme.eq_ignore_ascii_case("bearer") {
            return None;
        }

        let params: HashMap<String, String> = CHALLENGE_PARAM_RE
            .captures_iter(params)
            .map(|c| (c[1].to_ascii_lowercase(), c[2].to_string()))
            .collect();

        Some(Self::Bearer {
            realm: params.get("realm")?.clone(),
            service: params.get("service").cloned(),
            scope: params.get("scope").cloned(),
        })
    }
}

/// Token endpoint response; registries use either field name
#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    access_token: Option<String>,
}

impl TokenResponse {
    pub(crate) fn into_token(self) -> Option<String> {
        self.token
            .filter(|t| !t.is_empty())
            .or(self.access_token.filter(|t| !t.is_empty()))
    }
}
