//! Common test infrastructure for promote-core tests
//!
//! - `FakeRegistry`: in-memory registry keyed by reference string
//! - `request`: builds a validated request from a handful of knobs
//! - `LogBuffer`: captures formatted tracing output

#![allow(dead_code)]

use async_trait::async_trait;
use promote_core::{Inputs, Request};
use promote_registry::{ContainerConfig, ImageConfig, ImageReference, Platform, Registry};
use std::collections::{HashMap, HashSet};
use std::io::Write;
use std::sync::{Arc, Mutex};
use tracing_subscriber::fmt::MakeWriter;

/// In-memory registry; copying a manifest copies the image config too
#[derive(Default)]
pub struct FakeRegistry {
    configs: Mutex<HashMap<String, ImageConfig>>,
    failing: Mutex<HashSet<String>>,
    copies: Mutex<Vec<(String, String)>>,
    fetches: Mutex<Vec<(String, String)>>,
}

impl FakeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Image whose config carries a single label
    pub fn with_label(self, reference: &str, name: &str, value: &str) -> Self {
        let config = ImageConfig {
            config: Some(ContainerConfig {
                labels: Some(HashMap::from([(name.to_string(), value.to_string())])),
                env: None,
            }),
        };
        self.configs
            .lock()
            .unwrap()
            .insert(reference.to_string(), config);
        self
    }

    /// Image whose config carries environment entries
    pub fn with_env(self, reference: &str, entries: &[&str]) -> Self {
        let config = ImageConfig {
            config: Some(ContainerConfig {
                labels: None,
                env: Some(entries.iter().map(|e| e.to_string()).collect()),
            }),
        };
        self.configs
            .lock()
            .unwrap()
            .insert(reference.to_string(), config);
        self
    }

    /// Fetching this reference fails with a registry error
    pub fn failing(self, reference: &str) -> Self {
        self.failing.lock().unwrap().insert(reference.to_string());
        self
    }

    /// (source, target) of every manifest copy, in order
    pub fn copies(&self) -> Vec<(String, String)> {
        self.copies.lock().unwrap().clone()
    }

    /// (reference, platform) of every config fetch, in order
    pub fn fetches(&self) -> Vec<(String, String)> {
        self.fetches.lock().unwrap().clone()
    }
}

#[async_trait]
impl Registry for FakeRegistry {
    async fn image_config(
        &self,
        reference: &ImageReference,
        platform: &Platform,
    ) -> promote_registry::Result<ImageConfig> {
        let key = reference.to_string();
        self.fetches
            .lock()
            .unwrap()
            .push((key.clone(), platform.to_string()));

        if self.failing.lock().unwrap().contains(&key) {
            return Err(promote_registry::Error::Status {
                status: 500,
                url: key,
                body: "internal error".to_string(),
            });
        }

        self.configs
            .lock()
            .unwrap()
            .get(&key)
            .cloned()
            .ok_or(promote_registry::Error::Status {
                status: 404,
                url: key,
                body: "MANIFEST_UNKNOWN".to_string(),
            })
    }

    async fn copy_manifest(
        &self,
        source: &ImageReference,
        target: &ImageReference,
    ) -> promote_registry::Result<()> {
        let (source, target) = (source.to_string(), target.to_string());
        let mut configs = self.configs.lock().unwrap();
        if let Some(config) = configs.get(&source).cloned() {
            configs.insert(target.clone(), config);
        }
        self.copies.lock().unwrap().push((source, target));
        Ok(())
    }
}

/// Knobs for building a request; tags are `rc` -> `stable`
pub struct RequestSpec<'a> {
    pub repositories: &'a [&'a str],
    pub version_source: &'a str,
    pub promote_prerelease: bool,
    pub coerce_semver: bool,
}

impl Default for RequestSpec<'_> {
    fn default() -> Self {
        Self {
            repositories: &["a/img"],
            version_source: "label:version",
            promote_prerelease: false,
            coerce_semver: false,
        }
    }
}

pub fn request(spec: RequestSpec<'_>) -> Request {
    Request::from_inputs(&Inputs {
        repository: spec.repositories.join("\n"),
        candidate_tag: "rc".to_string(),
        latest_tag: "stable".to_string(),
        version_source: spec.version_source.to_string(),
        promote_prerelease: spec.promote_prerelease.to_string(),
        coerce_semver: spec.coerce_semver.to_string(),
        manifest_platform: "linux/amd64".to_string(),
    })
    .unwrap()
}

/// Shared in-memory sink for formatted log output
#[derive(Clone, Default)]
pub struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).to_string()
    }
}

impl Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogBuffer {
    type Writer = LogBuffer;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Install a thread-local subscriber writing into a fresh buffer
pub fn capture_logs() -> (LogBuffer, tracing::subscriber::DefaultGuard) {
    let buffer = LogBuffer::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(buffer.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::INFO)
        .finish();
    let guard = tracing::subscriber::set_default(subscriber);
    (buffer, guard)
}
