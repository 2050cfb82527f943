use crate::auth::{Challenge, CredentialStore, TokenResponse};
use crate::error::{Error, Result};
use crate::types::{
    is_index_media_type, ImageConfig, ImageIndex, ImageManifest, ImageReference, Platform,
    RawManifest, Repository, MEDIA_TYPE_DOCKER_MANIFEST, MEDIA_TYPE_DOCKER_MANIFEST_LIST,
    MEDIA_TYPE_OCI_INDEX, MEDIA_TYPE_OCI_MANIFEST,
};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::header::{HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE, WWW_AUTHENTICATE};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::RwLock;
use tracing::{debug, trace};

/// Registry operations needed to promote an image between tags
///
/// Implementations must tolerate concurrent calls for unrelated references.
#[async_trait]
pub trait Registry: Send + Sync {
    /// Fetch the image configuration document for a reference
    ///
    /// When the reference resolves to a multi-platform index, the child
    /// manifest matching `platform` is used.
    async fn image_config(
        &self,
        reference: &ImageReference,
        platform: &Platform,
    ) -> Result<ImageConfig>;

    /// Point `target` at the manifest currently behind `source`
    ///
    /// Both references live in the same repository, so every blob and child
    /// manifest the copied manifest refers to is already present.
    async fn copy_manifest(&self, source: &ImageReference, target: &ImageReference) -> Result<()>;
}

/// Access level requested from a registry token service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Access {
    Pull,
    Push,
}

impl Access {
    fn scope(self, repository: &Repository) -> String {
        let actions = match self {
            Access::Pull => "pull",
            Access::Push => "pull,push",
        };
        format!("repository:{}:{}", repository.path, actions)
    }
}

/// Client for interacting with OCI-compatible container registries
pub struct RegistryClient {
    client: reqwest::Client,
    credentials: CredentialStore,
    /// Authorization header values keyed by registry and scope
    authorizations: RwLock<HashMap<String, String>>,
}

impl RegistryClient {
    /// Create a new registry client with anonymous access
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("promote/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(Error::Client)?;

        Ok(Self {
            client,
            credentials: CredentialStore::empty(),
            authorizations: RwLock::new(HashMap::new()),
        })
    }

    /// Use credentials from a store (e.g., the Docker CLI config)
    pub fn with_credentials(mut self, credentials: CredentialStore) -> Self {
        self.credentials = credentials;
        self
    }

    fn cached_authorization(&self, key: &str) -> Option<String> {
        let cache = self
            .authorizations
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        cache.get(key).cloned()
    }

    fn cache_authorization(&self, key: String, value: String) {
        let mut cache = self
            .authorizations
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        cache.insert(key, value);
    }

    /// Send a request, answering one authentication challenge if needed
    async fn send<F>(
        &self,
        repository: &Repository,
        access: Access,
        url: &str,
        build: F,
    ) -> Result<Response>
    where
        F: Fn() -> RequestBuilder + Send + Sync,
    {
        let scope = access.scope(repository);
        let cache_key = format!("{}|{}", repository.registry, scope);

        let mut request = build();
        if let Some(authorization) = self.cached_authorization(&cache_key) {
            request = request.header(AUTHORIZATION, authorization);
        }

        let response = request.send().await.map_err(|e| Error::http(url, e))?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        let challenge = response
            .headers()
            .get(WWW_AUTHENTICATE)
            .and_then(|h| h.to_str().ok())
            .and_then(Challenge::parse)
            .ok_or_else(|| {
                Error::auth(
                    &repository.registry,
                    format!("{} returned 401 without a usable challenge", url),
                )
            })?;

        let authorization = self.authorize(repository, &scope, &challenge).await?;
        self.cache_authorization(cache_key, authorization.clone());

        let response = build()
            .header(AUTHORIZATION, authorization)
            .send()
            .await
            .map_err(|e| Error::http(url, e))?;

        if response.status() == StatusCode::UNAUTHORIZED {
            return Err(Error::auth(
                &repository.registry,
                format!("{} rejected the credentials for {}", url, scope),
            ));
        }

        Ok(response)
    }

    /// Produce an Authorization header value answering a challenge
    async fn authorize(
        &self,
        repository: &Repository,
        scope: &str,
        challenge: &Challenge,
    ) -> Result<String> {
        let credentials = self.credentials.get(&repository.registry);

        match challenge {
            Challenge::Basic => {
                let credentials = credentials.ok_or_else(|| {
                    Error::auth(
                        &repository.registry,
                        "registry requires basic credentials but none are configured",
                    )
                })?;
                let encoded = STANDARD.encode(format!(
                    "{}:{}",
                    credentials.username, credentials.password
                ));
                Ok(format!("Basic {}", encoded))
            }
            Challenge::Bearer { realm, service, .. } => {
                let mut token_url = url::Url::parse(realm).map_err(|e| {
                    Error::auth(
                        &repository.registry,
                        format!("invalid token realm `{}`: {}", realm, e),
                    )
                })?;
                {
                    let mut query = token_url.query_pairs_mut();
                    if let Some(service) = service {
                        query.append_pair("service", service);
                    }
                    query.append_pair("scope", scope);
                }

                debug!("Requesting registry token from: {}", token_url);

                let mut request = self.client.get(token_url.as_str());
                if let Some(credentials) = credentials {
                    debug!("Using authenticated request for registry token");
                    request = request.basic_auth(&credentials.username, Some(&credentials.password));
                } else {
                    debug!("Using anonymous request for registry token");
                }

                let response = request
                    .send()
                    .await
                    .map_err(|e| Error::http(token_url.as_str(), e))?;

                if !response.status().is_success() {
                    let status = response.status();
                    let body = response.text().await.unwrap_or_default();
                    return Err(Error::auth(
                        &repository.registry,
                        format!("token request failed ({}): {}", status, body),
                    ));
                }

                let bytes = response
                    .bytes()
                    .await
                    .map_err(|e| Error::http(token_url.as_str(), e))?;
                let token: TokenResponse = serde_json::from_slice(&bytes)
                    .map_err(|e| Error::json("token response", token_url.as_str(), e))?;

                let token = token.into_token().ok_or_else(|| {
                    Error::auth(&repository.registry, "token response contained no token")
                })?;

                Ok(format!("Bearer {}", token))
            }
        }
    }

    /// Fetch a manifest or index exactly as the registry serves it
    pub async fn get_manifest(&self, reference: &ImageReference) -> Result<RawManifest> {
        let repository = &reference.repository;
        let url = format!(
            "{}/manifests/{}",
            repository.api_base(),
            reference.manifest_reference()
        );

        debug!("Fetching manifest from: {}", url);

        let accept = [
            MEDIA_TYPE_OCI_MANIFEST,
            MEDIA_TYPE_OCI_INDEX,
            MEDIA_TYPE_DOCKER_MANIFEST,
            MEDIA_TYPE_DOCKER_MANIFEST_LIST,
        ]
        .join(",");

        let response = self
            .send(repository, Access::Pull, &url, || {
                self.client.get(&url).header(ACCEPT, accept.as_str())
            })
            .await?;
        let response = ensure_success(response, &url).await?;

        let header_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.split(';').next())
            .map(|h| h.trim().to_string())
            .filter(|h| !h.is_empty() && h != "application/json");

        let body = response
            .bytes()
            .await
            .map_err(|e| Error::http(&url, e))?
            .to_vec();

        // Some registries only declare the type inside the document
        let media_type = match header_type {
            Some(media_type) => media_type,
            None => {
                let probe: MediaTypeProbe = decode("manifest", &url, &body)?;
                probe.media_type.ok_or_else(|| Error::UnsupportedMediaType {
                    reference: reference.to_string(),
                    media_type: "(none)".to_string(),
                })?
            }
        };

        trace!("Manifest {} has media type {}", reference, media_type);
        Ok(RawManifest { media_type, body })
    }

    /// Store a manifest under a reference
    pub async fn put_manifest(
        &self,
        reference: &ImageReference,
        manifest: &RawManifest,
    ) -> Result<()> {
        let repository = &reference.repository;
        let url = format!(
            "{}/manifests/{}",
            repository.api_base(),
            reference.manifest_reference()
        );

        debug!("Pushing manifest to: {}", url);

        let content_type = HeaderValue::from_str(&manifest.media_type).map_err(|_| {
            Error::UnsupportedMediaType {
                reference: reference.to_string(),
                media_type: manifest.media_type.clone(),
            }
        })?;

        let response = self
            .send(repository, Access::Push, &url, || {
                self.client
                    .put(&url)
                    .header(CONTENT_TYPE, content_type.clone())
                    .body(manifest.body.clone())
            })
            .await?;
        ensure_success(response, &url).await?;

        Ok(())
    }

    /// Fetch and decode a JSON blob
    async fn get_blob_json<T: DeserializeOwned>(
        &self,
        repository: &Repository,
        digest: &str,
        what: &'static str,
    ) -> Result<T> {
        let url = format!("{}/blobs/{}", repository.api_base(), digest);

        debug!("Fetching {} blob from: {}", what, url);

        let response = self
            .send(repository, Access::Pull, &url, || self.client.get(&url))
            .await?;
        let response = ensure_success(response, &url).await?;

        let body = response.bytes().await.map_err(|e| Error::http(&url, e))?;
        decode(what, &url, &body)
    }

    /// Resolve a reference to a single-platform manifest
    async fn resolve_platform_manifest(
        &self,
        reference: &ImageReference,
        platform: &Platform,
    ) -> Result<ImageManifest> {
        let manifest = self.get_manifest(reference).await?;

        let manifest = if is_index_media_type(&manifest.media_type) {
            let index: ImageIndex = decode("index", &reference.to_string(), &manifest.body)?;
            let entry = index
                .manifests
                .iter()
                .find(|entry| {
                    entry
                        .platform
                        .as_ref()
                        .is_some_and(|candidate| platform.matches(candidate))
                })
                .ok_or_else(|| Error::PlatformNotFound {
                    reference: reference.to_string(),
                    platform: platform.to_string(),
                })?;

            debug!(
                "Selected {} from index {} for platform {}",
                entry.digest, reference, platform
            );
            self.get_manifest(&reference.repository.digest(&entry.digest))
                .await?
        } else {
            manifest
        };

        if manifest.media_type != MEDIA_TYPE_OCI_MANIFEST
            && manifest.media_type != MEDIA_TYPE_DOCKER_MANIFEST
        {
            return Err(Error::UnsupportedMediaType {
                reference: reference.to_string(),
                media_type: manifest.media_type,
            });
        }

        decode("manifest", &reference.to_string(), &manifest.body)
    }
}

#[async_trait]
impl Registry for RegistryClient {
    async fn image_config(
        &self,
        reference: &ImageReference,
        platform: &Platform,
    ) -> Result<ImageConfig> {
        let manifest = self.resolve_platform_manifest(reference, platform).await?;
        self.get_blob_json(&reference.repository, &manifest.config.digest, "image config")
            .await
    }

    async fn copy_manifest(&self, source: &ImageReference, target: &ImageReference) -> Result<()> {
        let manifest = self.get_manifest(source).await?;
        self.put_manifest(target, &manifest).await?;
        debug!("Copied {} to {}", source, target);
        Ok(())
    }
}

/// Turn a non-success response into a status error
async fn ensure_success(response: Response, url: &str) -> Result<Response> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    Err(Error::Status {
        status: status.as_u16(),
        url: url.to_string(),
        body: if body.is_empty() {
            "(no response body)".to_string()
        } else {
            body
        },
    })
}

fn decode<T: DeserializeOwned>(what: &'static str, url: &str, body: &[u8]) -> Result<T> {
    serde_json::from_slice(body).map_err(|e| Error::json(what, url, e))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MediaTypeProbe {
    #[serde(default)]
    media_type: Option<String>,
}
