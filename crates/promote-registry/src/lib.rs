//! Container registry access for promote
//!
//! This crate provides functionality for:
//! - Parsing repository specs into registry/path pairs
//! - Fetching image configuration documents, resolving multi-platform indexes
//! - Copying a manifest from one tag to another within a repository
//! - Authenticating with Docker CLI credentials and registry token services
//!
//! # Example
//!
//! ```no_run
//! use promote_registry::{CredentialStore, Platform, Registry, RegistryClient, Repository};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = RegistryClient::new()?.with_credentials(CredentialStore::from_docker_config()?);
//!
//!     let repo = Repository::parse("ghcr.io/acme/app")?;
//!     let platform = Platform::parse("linux/amd64")?;
//!     let config = client.image_config(&repo.tag("rc"), &platform).await?;
//!     println!("{:?}", config.labels());
//!
//!     client.copy_manifest(&repo.tag("rc"), &repo.tag("stable")).await?;
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod error;
pub mod registry;
pub mod types;

// Re-export main types for convenience
pub use auth::{CredentialStore, Credentials};
pub use error::{Error, Result};
pub use registry::{Registry, RegistryClient};
pub use types::{ContainerConfig, ImageConfig, ImageReference, Platform, RawManifest, Repository};
