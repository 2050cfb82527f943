//! Mock OCI registry helpers for promote-registry tests
//!
//! Wraps a wiremock server with the endpoints of the OCI distribution API
//! that the registry client touches: manifests, blobs, and a token service.

#![allow(dead_code)]

use promote_registry::Repository;
use serde_json::{json, Value};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const OCI_MANIFEST: &str = "application/vnd.oci.image.manifest.v1+json";
pub const OCI_INDEX: &str = "application/vnd.oci.image.index.v1+json";

/// Repository path used by every test
pub const REPO_PATH: &str = "acme/app";

/// Start a mock registry and the repository that points at it
pub async fn start_registry() -> (MockServer, Repository) {
    let server = MockServer::start().await;
    let host = server.uri().trim_start_matches("http://").to_string();
    let repo = Repository::parse(&format!("{}/{}", host, REPO_PATH)).unwrap();
    (server, repo)
}

/// Single-platform manifest document pointing at a config blob
pub fn manifest_json(config_digest: &str) -> Value {
    json!({
        "schemaVersion": 2,
        "mediaType": OCI_MANIFEST,
        "config": {
            "mediaType": "application/vnd.oci.image.config.v1+json",
            "size": 100,
            "digest": config_digest
        },
        "layers": []
    })
}

/// Index document with one entry per (digest, os, arch)
pub fn index_json(entries: &[(&str, &str, &str)]) -> Value {
    let manifests: Vec<Value> = entries
        .iter()
        .map(|(digest, os, arch)| {
            json!({
                "mediaType": OCI_MANIFEST,
                "size": 500,
                "digest": digest,
                "platform": {"os": os, "architecture": arch}
            })
        })
        .collect();
    json!({"schemaVersion": 2, "mediaType": OCI_INDEX, "manifests": manifests})
}

/// Image config document carrying labels and env entries
pub fn config_json(labels: &[(&str, &str)], env: &[&str]) -> Value {
    let labels: serde_json::Map<String, Value> = labels
        .iter()
        .map(|(k, v)| (k.to_string(), json!(v)))
        .collect();
    json!({
        "architecture": "amd64",
        "os": "linux",
        "config": {"Labels": labels, "Env": env}
    })
}

/// Serve a manifest (or index) under a tag or digest
pub async fn mock_manifest(server: &MockServer, reference: &str, media_type: &str, body: &Value) {
    Mock::given(method("GET"))
        .and(path(format!("/v2/{}/manifests/{}", REPO_PATH, reference)))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(body.to_string().into_bytes(), media_type),
        )
        .mount(server)
        .await;
}

/// Serve a JSON blob under a digest
pub async fn mock_blob(server: &MockServer, digest: &str, body: &Value) {
    Mock::given(method("GET"))
        .and(path(format!("/v2/{}/blobs/{}", REPO_PATH, digest)))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

/// Serve a bearer token for a scope at `/token`
pub async fn mock_token(server: &MockServer, scope: &str, token: &str) {
    Mock::given(method("GET"))
        .and(path("/token"))
        .and(query_param("scope", scope))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": token})))
        .mount(server)
        .await;
}

/// Require `Authorization: Bearer <token>` for a path, challenging otherwise
pub async fn mock_bearer_protected(
    server: &MockServer,
    http_method: &str,
    url_path: &str,
    token: &str,
    response: ResponseTemplate,
) {
    Mock::given(method(http_method))
        .and(path(url_path))
        .and(header("authorization", format!("Bearer {}", token).as_str()))
        .respond_with(response)
        .with_priority(1)
        .mount(server)
        .await;

    let challenge = format!(
        r#"Bearer realm="{}/token",service="mock-registry""#,
        server.uri()
    );
    Mock::given(method(http_method))
        .and(path(url_path))
        .respond_with(ResponseTemplate::new(401).insert_header("www-authenticate", challenge.as_str()))
        .with_priority(10)
        .mount(server)
        .await;
}
